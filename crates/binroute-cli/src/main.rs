//! Binroute - waste collection route tracking
//!
//! Drives collection routes bin by bin, resets bins each day, and exports
//! route reports.

mod cli;
mod commands;
mod output;

use clap::Parser;
use cli::Cli;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = commands::execute(cli) {
        eprintln!("Error: {}", e);
        if e.is_retryable() {
            eprintln!("Route writes made while unreachable are queued; run `binroute sync` to replay them.");
        }
        std::process::exit(1);
    }
}
