//! Task list web server binary.
//!
//! A thin wrapper around [`tasklist_web::cli::run`].

use clap::Parser;
use std::process::ExitCode;
use tasklist_web::cli::{run, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
