use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod model;
mod normalize;
mod prompt;
mod sheet;
mod staging;
mod taxonomy;
mod util;
mod workflow;

use cli::{Command, RootArgs};

fn main() -> Result<()> {
    let args = RootArgs::parse();
    init_logging(args.verbose);

    match &args.command {
        Command::Classify(args) => workflow::run_classify(args),
        Command::Prompt(args) => workflow::run_prompt(args),
        Command::Labels(args) => workflow::run_labels(args),
    }
}

/// Log to stderr; `RUST_LOG` takes precedence over `--verbose`.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ftag={default_level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
