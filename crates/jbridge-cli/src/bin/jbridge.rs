#![allow(clippy::print_stderr)]

use std::io::IsTerminal;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use jbridge_cli::args::{CliArgs, OutputFormat};
use jbridge_cli::driver;
use jbridge_cli::reporter::{Reporter, has_errors, render_json};

const EXIT_SUCCESS: u8 = 0;
const EXIT_ERRORS_REPORTED: u8 = 1;

fn main() -> Result<ExitCode> {
    // Installs a subscriber only when JBRIDGE_LOG or RUST_LOG is set.
    jbridge_core::init_tracing();

    let args = CliArgs::parse();
    let output = driver::run(&args).context("resolution failed")?;

    match args.format {
        OutputFormat::Json => {
            let json = render_json(&output.units, &output.keys).context("failed to serialize report")?;
            println!("{json}");
        }
        OutputFormat::Text => {
            let reporter = Reporter::new(std::io::stdout().is_terminal());
            print!("{}", reporter.render_units(&output.units));
            print!("{}", reporter.render_keys(&output.keys));
            if !output.units.is_empty() {
                eprintln!("{}", reporter.summary(&output.units));
            }
        }
    }

    Ok(ExitCode::from(if has_errors(&output.units) {
        EXIT_ERRORS_REPORTED
    } else {
        EXIT_SUCCESS
    }))
}
