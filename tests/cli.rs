use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn report_files(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("reconciliation_report_"))
        })
        .collect()
}

#[test]
fn reconciles_two_csv_files() {
    let dir = tempfile::tempdir().unwrap();
    let qb = write_file(
        dir.path(),
        "qb.csv",
        "date,description,amount\n2024-01-05,Coffee,-4.50\n2024-01-07,Books,-20.00\n",
    );
    let bank = write_file(
        dir.path(),
        "bank.csv",
        "date,description,amount\n2024-01-05,Coffee Shop,-4.50\n",
    );
    let out = tempfile::tempdir().unwrap();

    Command::cargo_bin("ledgermatch")
        .unwrap()
        .args(["reconcile", "--qb"])
        .arg(&qb)
        .arg("--bank")
        .arg(&bank)
        .arg("--output-dir")
        .arg(out.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Report saved to"));

    let reports = report_files(out.path());
    assert_eq!(reports.len(), 1);
    let content = std::fs::read_to_string(&reports[0]).unwrap();
    assert!(content.contains("Exact Match"));
    assert!(content.contains("Only in QuickBooks"));
}

#[test]
fn writes_json_report_when_requested() {
    let dir = tempfile::tempdir().unwrap();
    let qb = write_file(
        dir.path(),
        "qb.csv",
        "date,description,amount\n2024-01-05,Coffee,-4.50\n",
    );
    let bank = write_file(
        dir.path(),
        "bank.csv",
        "date,description,amount\n2024-01-05,Coffee,-4.50\n",
    );
    let out = tempfile::tempdir().unwrap();

    Command::cargo_bin("ledgermatch")
        .unwrap()
        .args(["reconcile", "--format", "json", "--qb"])
        .arg(&qb)
        .arg("--bank")
        .arg(&bank)
        .arg("--output-dir")
        .arg(out.path())
        .assert()
        .success();

    let reports = report_files(out.path());
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].extension().and_then(|e| e.to_str()), Some("json"));
    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&reports[0]).unwrap()).unwrap();
    assert_eq!(parsed[0]["status"], "Exact Match");
}

#[test]
fn header_only_inputs_still_produce_a_report() {
    let dir = tempfile::tempdir().unwrap();
    let qb = write_file(dir.path(), "qb.csv", "date,description,amount\n");
    let bank = write_file(dir.path(), "bank.csv", "date,description,amount\n");
    let out = tempfile::tempdir().unwrap();

    Command::cargo_bin("ledgermatch")
        .unwrap()
        .args(["reconcile", "--qb"])
        .arg(&qb)
        .arg("--bank")
        .arg(&bank)
        .arg("--output-dir")
        .arg(out.path())
        .assert()
        .success();

    let reports = report_files(out.path());
    assert_eq!(reports.len(), 1);
    let content = std::fs::read_to_string(&reports[0]).unwrap();
    assert_eq!(
        content.trim(),
        "date,amount,qb_description,bank_description,match_status,is_duplicate"
    );
}

#[test]
fn report_defaults_to_first_qb_file_directory() {
    let qb_dir = tempfile::tempdir().unwrap();
    let bank_dir = tempfile::tempdir().unwrap();
    let qb = write_file(
        qb_dir.path(),
        "qb.csv",
        "date,description,amount\n2024-01-05,Coffee,-4.50\n",
    );
    let bank = write_file(
        bank_dir.path(),
        "bank.csv",
        "date,description,amount\n2024-01-05,Coffee,-4.50\n",
    );

    Command::cargo_bin("ledgermatch")
        .unwrap()
        .args(["reconcile", "--qb"])
        .arg(&qb)
        .arg("--bank")
        .arg(&bank)
        .assert()
        .success();

    assert_eq!(report_files(qb_dir.path()).len(), 1);
    assert!(report_files(bank_dir.path()).is_empty());
}

#[test]
fn rejects_unsupported_extension() {
    let dir = tempfile::tempdir().unwrap();
    let qb = write_file(dir.path(), "qb.csv", "date,description,amount\n");
    let notes = write_file(dir.path(), "notes.txt", "not a statement");

    Command::cargo_bin("ledgermatch")
        .unwrap()
        .args(["reconcile", "--qb"])
        .arg(&qb)
        .arg("--bank")
        .arg(&notes)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported file format"));
}

#[test]
fn requires_both_sides() {
    let dir = tempfile::tempdir().unwrap();
    let qb = write_file(dir.path(), "qb.csv", "date,description,amount\n");

    Command::cargo_bin("ledgermatch")
        .unwrap()
        .args(["reconcile", "--qb"])
        .arg(&qb)
        .assert()
        .failure();
}
