use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use calcshell::config::{CalculatorConfig, LogLevel};
use calcshell::{logging, repl, Calculator};

/// Interactive arithmetic calculator with history and undo.
#[derive(Debug, Parser)]
#[command(name = "calcshell", version, about)]
struct Cli {
    /// TOML configuration file (defaults to ./calcshell.toml, then the user config dir)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Skip the startup banner
    #[arg(long)]
    no_welcome: bool,

    /// Force debug-level logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config =
        CalculatorConfig::load(cli.config.as_deref()).context("could not load configuration")?;
    let level = cli.debug.then_some(LogLevel::Debug);
    for warning in logging::init(&config, level) {
        eprintln!("Warning: {warning}");
    }
    tracing::debug!(?config, "Configuration loaded");

    let mut calc = Calculator::from_config(config).context("could not start calculator")?;
    tracing::info!(
        observers = ?calc.observer_names(),
        restored = calc.history().len(),
        "Calculator ready"
    );
    repl::start_repl(&mut calc, !cli.no_welcome)
}
