mod cache;
mod commands;
mod config;
mod fakestore;
mod session;
mod shell;
mod state;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "shopfront")]
#[command(about = "A terminal client for the Fake Store API")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/shopfront/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: commands::Command,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;
  init_tracing();

  let args = Args::parse();

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;

  commands::run(args.command, config).await
}

/// Logs go to stderr so stdout stays parseable command output.
fn init_tracing() {
  let filter = tracing_subscriber::EnvFilter::try_from_env("SHOPFRONT_LOG")
    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .init();
}
