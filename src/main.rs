//! Experiments CLI entry point.

use anyhow::Result;
use clap::Parser;

use experiments::cli::{self, Cli};
use experiments::domain::models::Config;
use experiments::infrastructure::config::ConfigLoader;
use experiments::infrastructure::logging::{LogConfig, LoggerImpl};

fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => cli::handle_error(err, cli.json),
    };

    let _logger = match LoggerImpl::init(&LogConfig::from(&config.logging)) {
        Ok(logger) => logger,
        Err(err) => cli::handle_error(err, cli.json),
    };

    if let Err(err) = cli::execute(cli.command, &config, cli.json).await {
        cli::handle_error(err, cli.json);
    }
}
