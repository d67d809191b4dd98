pub mod reconcile;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::reports::ReportFormat;

#[derive(Parser)]
#[command(
    name = "ledgermatch",
    about = "Reconcile QuickBooks exports against bank statements."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Match QuickBooks transactions against bank statement transactions.
    Reconcile {
        /// QuickBooks-side file: CSV, XLSX, or PDF (repeatable)
        #[arg(long = "qb", value_name = "FILE", required = true)]
        qb_files: Vec<PathBuf>,
        /// Bank-side file: CSV, XLSX, or PDF (repeatable)
        #[arg(long = "bank", value_name = "FILE", required = true)]
        bank_files: Vec<PathBuf>,
        /// Directory for the report (default: alongside the first QuickBooks file)
        #[arg(long = "output-dir", value_name = "DIR")]
        output_dir: Option<PathBuf>,
        /// Report format
        #[arg(long, value_enum, default_value = "csv")]
        format: ReportFormat,
    },
}
