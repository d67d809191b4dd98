mod cli;
mod error;
mod extractor;
mod fmt;
mod importer;
mod models;
mod reconciler;
mod reports;

use clap::Parser;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Reconcile {
            qb_files,
            bank_files,
            output_dir,
            format,
        } => cli::reconcile::run(&qb_files, &bank_files, output_dir, format),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
