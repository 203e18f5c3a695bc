mod cli;
mod commands;
mod config;
mod engine;
mod model;
mod store;
mod util;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::Context;

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let ctx = Context::open(cli.config, cli.store_path)?;

    match cli.command {
        Commands::Import(args) => commands::import::run(args, &ctx),
        Commands::Delete(args) => commands::delete::run(args, &ctx),
        Commands::Documents(args) => commands::documents::run(args, &ctx),
        Commands::Rows(args) => commands::rows::run(args, &ctx),
        Commands::Stats(args) => commands::stats::run(args, &ctx),
        Commands::SetStatus(args) => commands::mark::set_status(args, &ctx),
        Commands::BulkStatus(args) => commands::mark::bulk_status(args, &ctx),
        Commands::ToggleFix(args) => commands::mark::toggle_fix(args, &ctx),
        Commands::Targets(command) => commands::targets::run(command, &ctx),
        Commands::Status => commands::status::run(&ctx),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
