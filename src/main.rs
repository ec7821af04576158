//! smellscan CLI entry point.

use clap::Parser;
use smellscan::cli::{self, Cli, EXIT_ERROR};
use tracing_subscriber::EnvFilter;

/// Worker stack size; lowering recurses once per nesting level.
const RAYON_STACK_SIZE: usize = 8 * 1024 * 1024;

fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .stack_size(RAYON_STACK_SIZE)
        .build_global()
    {
        tracing::debug!(error = %e, "thread pool already configured");
    }

    let exit_code = match cli::run_scan(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_ERROR
        }
    };

    std::process::exit(exit_code);
}
