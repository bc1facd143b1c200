use std::path::PathBuf;

use clap::Parser;
use sea_orm_cli::MigrateSubcommands;

/// Apply or roll back the loft database schema.
#[derive(Parser)]
pub(crate) struct Cli {
    /// Configuration file holding the database URL.
    #[clap(long, default_value = "Config.toml")]
    pub config: PathBuf,

    #[clap(subcommand)]
    pub command: Option<MigrateSubcommands>,
}
