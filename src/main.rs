//! # chargeprep command-line entry point
//!
//! ```bash
//! chargeprep clean --input charges.csv
//! chargeprep register --file charges.csv --user acct_123
//! chargeprep process --id <upload id>
//! chargeprep classify amount_in_eur risk_level card_brand
//! ```
//!
//! `process` prints the JSON response body. A failed request prints the error body
//! and exits with status 1.

#![warn(clippy::all, rust_2018_idioms)]

mod cli;

use anyhow::Result;
use clap::Parser as _;
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    let cli = cli::Cli::parse();
    chargeprep::logging::init(cli.log_file)?;

    if cli::run_command(cli.command)? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
