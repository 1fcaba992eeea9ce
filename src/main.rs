mod actions;
mod auth;
mod config;
mod db;
mod error;
mod export;
mod models;
mod recurring;
mod report;
mod run;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = run::Cli::parse();
    let config = config::Config::from_env()?;
    init_tracing(config.log_json);
    config.ensure_data_dir()?;
    tracing::debug!(db = %config.db_path.display(), "starting");
    run::as_cli(cli, &config)
}

/// Logs go to stderr so command output on stdout stays clean. `RUST_LOG`
/// overrides the default `warn` level.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
