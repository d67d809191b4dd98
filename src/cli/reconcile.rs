use std::path::{Path, PathBuf};

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::error::{LedgerError, Result};
use crate::extractor::PageOcr;
use crate::fmt::money;
use crate::importer::load_sources;
use crate::models::{MatchStatus, ReconciledRow};
use crate::reconciler::reconcile;
use crate::reports::{self, ReportFormat};

#[cfg(feature = "ocr")]
fn ocr_engine() -> impl PageOcr {
    crate::extractor::TesseractOcr
}

#[cfg(not(feature = "ocr"))]
fn ocr_engine() -> impl PageOcr {
    crate::extractor::NoOcr
}

fn default_output_dir(qb_files: &[PathBuf]) -> PathBuf {
    qb_files
        .first()
        .and_then(|p| p.parent())
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn run(
    qb_files: &[PathBuf],
    bank_files: &[PathBuf],
    output_dir: Option<PathBuf>,
    format: ReportFormat,
) -> Result<()> {
    if qb_files.is_empty() {
        return Err(LedgerError::EmptySelection("QuickBooks"));
    }
    if bank_files.is_empty() {
        return Err(LedgerError::EmptySelection("bank statement"));
    }

    let ocr = ocr_engine();
    let qb = load_sources(qb_files, &ocr)?;
    let bank = load_sources(bank_files, &ocr)?;
    let rows = reconcile(&qb, &bank);

    let dir = output_dir.unwrap_or_else(|| default_output_dir(qb_files));
    let run_at = chrono::Local::now().naive_local();
    let report_path = reports::write_report(&rows, &dir, format, run_at)?;

    print_summary(&rows, qb.iter().map(|t| t.amount).sum(), bank.iter().map(|t| t.amount).sum());
    println!("Report saved to {}", report_path.display());
    Ok(())
}

fn count_status(rows: &[ReconciledRow], status: MatchStatus) -> usize {
    rows.iter().filter(|r| r.status == status).count()
}

fn print_summary(rows: &[ReconciledRow], qb_total: f64, bank_total: f64) {
    let duplicates = rows.iter().filter(|r| r.is_duplicate).count();

    let mut table = Table::new();
    table.set_header(vec!["", "Rows"]);
    table.add_row(vec![
        Cell::new(MatchStatus::ExactMatch.label().green().to_string()),
        Cell::new(count_status(rows, MatchStatus::ExactMatch)),
    ]);
    table.add_row(vec![
        Cell::new(MatchStatus::OnlyInQuickBooks.label().yellow().to_string()),
        Cell::new(count_status(rows, MatchStatus::OnlyInQuickBooks)),
    ]);
    table.add_row(vec![
        Cell::new(MatchStatus::OnlyInBankStatement.label().yellow().to_string()),
        Cell::new(count_status(rows, MatchStatus::OnlyInBankStatement)),
    ]);
    table.add_row(vec![
        Cell::new("Duplicate keys".red().to_string()),
        Cell::new(duplicates),
    ]);
    println!("{table}");
    println!(
        "QuickBooks total: {}   Bank total: {}",
        money(qb_total),
        money(bank_total)
    );
}
