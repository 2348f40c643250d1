use anyhow::Result;
use clap::Parser;

use telecue::config;

mod cli;
mod pipeline;
mod simulate;

fn main() -> Result<()> {
    let args = cli::Args::parse();

    let cfg = config::Config::load(args.config.as_deref())?;
    config::init_tracing(&cfg.logging, args.log_level.as_deref())?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "telecue starting");

    match args.command {
        cli::Command::Timeline(cmd) => pipeline::run_timeline(cmd, &cfg),
        cli::Command::Convert(cmd) => pipeline::run_convert(cmd, &cfg),
        cli::Command::Simulate(cmd) => simulate::run_simulate(cmd, &cfg),
        cli::Command::PrintDefaultConfig => {
            let s = cfg.to_toml_pretty()?;
            print!("{s}");
            Ok(())
        }
    }
}
