mod auth;
mod baskets;
mod birds;
mod events;
mod inventories;
mod payments;
mod races;

use auth::{login, register, whoami};

use std::time::Duration;

use clap::{Parser, Subcommand};
use indicatif::ProgressBar;
use time::{format_description::FormatItem, macros::format_description, OffsetDateTime};

use crate::{client::ApiClient, config::ClientConfig, table::Table};

const TIMESTAMP_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

#[derive(Parser)]
#[command(about)]
pub(crate) struct Cli {
    /// Custom server path, overrides the configured one.
    #[arg(long, global = true)]
    pub server_path: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Store an existing session token.
    Login {
        /// Session token issued by the server.
        token: String,
    },

    /// Register a new breeder account and log in with it.
    Register {
        /// Full name.
        name: String,

        /// Email address.
        email: String,

        /// Phone number.
        #[arg(short, long)]
        phone: Option<String>,
    },

    /// Show the current session user.
    Whoami,

    /// Manage birds.
    #[command(subcommand)]
    Birds(birds::BirdCommand),

    /// Browse events.
    #[command(subcommand)]
    Events(events::EventCommand),

    /// Manage event inventories.
    #[command(subcommand)]
    Inventories(inventories::InventoryCommand),

    /// Manage races and arrivals.
    #[command(subcommand)]
    Races(races::RaceCommand),

    /// Manage baskets.
    #[command(subcommand)]
    Baskets(baskets::BasketCommand),

    /// Manage payments.
    #[command(subcommand)]
    Payments(payments::PaymentCommand),
}

/// Execute a command that talks to the API with the configured session.
pub(crate) fn run(command: Commands, config: &ClientConfig) -> Result<(), anyhow::Error> {
    let client = ApiClient::new(config);

    match command {
        Commands::Login { token } => login(client, token)?,
        Commands::Register { name, email, phone } => register(client, name, email, phone)?,
        Commands::Whoami => whoami(&client)?,
        Commands::Birds(command) => birds::run(&client, command)?,
        Commands::Events(command) => events::run(&client, command)?,
        Commands::Inventories(command) => inventories::run(&client, command)?,
        Commands::Races(command) => races::run(&client, command)?,
        Commands::Baskets(command) => baskets::run(&client, command)?,
        Commands::Payments(command) => payments::run(&client, command)?,
    }

    Ok(())
}

/// Run a request behind a terminal spinner.
fn with_spinner<T, E>(message: &'static str, f: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
    let pg = ProgressBar::new_spinner();

    pg.enable_steady_tick(Duration::from_millis(150));
    pg.set_message(message);

    let result = f();
    pg.finish_and_clear();

    result
}

/// Print a table, or a notice when it has no rows.
fn print_table(table: &Table) {
    if table.is_empty() {
        println!("Nothing found.");
    } else {
        print!("{table}");
    }
}

/// Format a unix timestamp as a UTC date and time.
fn format_timestamp(timestamp: i64) -> String {
    OffsetDateTime::from_unix_timestamp(timestamp)
        .ok()
        .and_then(|time| time.format(TIMESTAMP_FORMAT).ok())
        .unwrap_or_else(|| timestamp.to_string())
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::{format_timestamp, Cli, Commands};

    #[test]
    fn command_definitions() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_server_path() {
        let cli = Cli::parse_from(["loft", "whoami", "--server-path", "http://loft.local"]);

        assert_eq!(cli.server_path.as_deref(), Some("http://loft.local"));
        assert!(matches!(cli.command, Commands::Whoami));
    }

    #[test]
    fn timestamps() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00");
        assert_eq!(format_timestamp(1709294400), "2024-03-01 12:00:00");
        assert_eq!(format_timestamp(1709164800), "2024-02-29 00:00:00");
    }
}
