use clap::Parser;
use commands::Cli;
use config::ClientConfig;

mod client;
mod commands;
mod config;
mod models;
mod table;

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    let mut config = ClientConfig::new()?;

    if let Some(server_path) = cli.server_path {
        config.server_path = server_path;
    }

    commands::run(cli.command, &config)
}
