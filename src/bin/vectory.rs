//! Vectory CLI binary.

use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use vectory::cli::args::*;
use vectory::cli::commands::*;

fn main() {
    // Parse command line arguments using clap
    let args = VectoryArgs::parse();

    // RUST_LOG overrides the verbosity flags
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Execute the command
    if let Err(e) = execute_command(args) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
