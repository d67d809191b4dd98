use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use clap::ValueEnum;

use crate::error::Result;
use crate::fmt::date_cell;
use crate::models::ReconciledRow;

#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
pub enum ReportFormat {
    Csv,
    Json,
}

impl ReportFormat {
    fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

/// Report files are named by run timestamp so successive runs in the same
/// directory never clobber each other.
pub fn report_filename(run_at: NaiveDateTime, format: ReportFormat) -> String {
    format!(
        "reconciliation_report_{}.{}",
        run_at.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

/// Write the reconciled table to `dir`, returning the report path. The
/// schema is stable regardless of row count: an empty reconciliation still
/// produces a report with the full header (CSV) or an empty array (JSON).
pub fn write_report(
    rows: &[ReconciledRow],
    dir: &Path,
    format: ReportFormat,
    run_at: NaiveDateTime,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(report_filename(run_at, format));
    match format {
        ReportFormat::Csv => write_csv(rows, &path)?,
        ReportFormat::Json => write_json(rows, &path)?,
    }
    Ok(path)
}

fn write_csv(rows: &[ReconciledRow], path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record([
        "date",
        "amount",
        "qb_description",
        "bank_description",
        "match_status",
        "is_duplicate",
    ])?;
    for row in rows {
        wtr.write_record([
            date_cell(row.date),
            format!("{:.2}", row.amount),
            row.qb_description.clone().unwrap_or_default(),
            row.bank_description.clone().unwrap_or_default(),
            row.status.label().to_string(),
            row.is_duplicate.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_json(rows: &[ReconciledRow], path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(std::io::BufWriter::new(file), rows)
        .map_err(|e| crate::error::LedgerError::Other(format!("Failed to write JSON: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchStatus;
    use chrono::NaiveDate;

    fn sample_rows() -> Vec<ReconciledRow> {
        vec![
            ReconciledRow {
                date: NaiveDate::from_ymd_opt(2024, 1, 5),
                amount: -4.5,
                qb_description: Some("Coffee".to_string()),
                bank_description: Some("Coffee Shop".to_string()),
                status: MatchStatus::ExactMatch,
                is_duplicate: false,
            },
            ReconciledRow {
                date: None,
                amount: 0.0,
                qb_description: Some("Mystery".to_string()),
                bank_description: None,
                status: MatchStatus::OnlyInQuickBooks,
                is_duplicate: false,
            },
        ]
    }

    fn run_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(13, 45, 9)
            .unwrap()
    }

    #[test]
    fn test_report_filename_carries_timestamp() {
        assert_eq!(
            report_filename(run_at(), ReportFormat::Csv),
            "reconciliation_report_20240601_134509.csv"
        );
        assert_eq!(
            report_filename(run_at(), ReportFormat::Json),
            "reconciliation_report_20240601_134509.json"
        );
    }

    #[test]
    fn test_write_csv_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_report(&sample_rows(), dir.path(), ReportFormat::Csv, run_at()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("date,amount,qb_description,bank_description,match_status,is_duplicate")
        );
        assert_eq!(
            lines.next(),
            Some("2024-01-05,-4.50,Coffee,Coffee Shop,Exact Match,false")
        );
        // Invalid date renders as an empty cell, not a fake date.
        assert_eq!(
            lines.next(),
            Some(",0.00,Mystery,,Only in QuickBooks,false")
        );
    }

    #[test]
    fn test_empty_report_keeps_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_report(&[], dir.path(), ReportFormat::Csv, run_at()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content.trim(),
            "date,amount,qb_description,bank_description,match_status,is_duplicate"
        );
    }

    #[test]
    fn test_write_json_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_report(&sample_rows(), dir.path(), ReportFormat::Json, run_at()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
        assert_eq!(parsed[0]["status"], "Exact Match");
        assert_eq!(parsed[1]["date"], serde_json::Value::Null);
    }
}
