//! `coder-brain` binary: one agent task cycle from the command line.
//!
//! Exit status: 0 on success, 1 on a provider or configuration error, 2 on a
//! usage error (reported by clap).

use std::process::ExitCode;

use clap::Parser;
use coder_brain_cli::{Cli, init_tracing, run};

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(report) => {
            println!("{report}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}
