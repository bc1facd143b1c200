use clap::{Subcommand, ValueEnum};
use serde::Serialize;

use super::print_table;
use crate::{
    client::{query, ApiClient, ClientError},
    models::{Bird, BirdResponse},
    table::{optional, Table},
};

#[derive(Clone, Copy, Serialize, ValueEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(crate) enum Sex {
    Unknown,
    Cock,
    Hen,
}

#[derive(Subcommand)]
pub(crate) enum BirdCommand {
    /// List visible birds.
    List {
        /// Only list birds of the provided breeder.
        #[arg(short, long)]
        breeder_id: Option<i64>,

        /// Only list lost birds.
        #[arg(short, long)]
        lost: bool,

        /// Page number.
        #[arg(short, long)]
        page: Option<u64>,
    },

    /// Register a bird.
    Add(BirdArgs),
}

#[derive(clap::Args, Serialize)]
pub(crate) struct BirdArgs {
    /// Band country code.
    band_country: String,

    /// Band year.
    band_year: String,

    /// Band club code.
    band_club: String,

    /// Band serial number.
    band_serial: String,

    #[arg(short, long)]
    name: Option<String>,

    #[arg(short, long)]
    color: Option<String>,

    #[arg(short, long, value_enum, default_value = "unknown")]
    sex: Sex,

    /// RFID tag value.
    #[arg(short, long)]
    rfid: Option<String>,

    /// Owning breeder, defaults to the current user.
    #[arg(short, long)]
    breeder_id: Option<i64>,
}

pub(crate) fn run(client: &ApiClient, command: BirdCommand) -> Result<(), ClientError> {
    match command {
        BirdCommand::List {
            breeder_id,
            lost,
            page,
        } => {
            let path = query(
                "/birds",
                [
                    ("breeder_id", breeder_id.map(|id| id.to_string())),
                    ("lost", lost.then(|| String::from("true"))),
                    ("page", page.map(|page| page.to_string())),
                ],
            );

            print_table(&bird_table(&client.get::<Vec<Bird>>(&path)?));
        }
        BirdCommand::Add(bird) => {
            let response: BirdResponse = client.post("/birds", &bird)?;

            println!("{} Bird #{} ({}).", response.message, response.bird.id, response.bird.band);
        }
    }

    Ok(())
}

fn bird_table(birds: &[Bird]) -> Table {
    let mut table = Table::new(["ID", "Band", "Name", "Sex", "RFID", "Breeder", "Status"]);

    for bird in birds {
        let status = match (bird.is_active, bird.is_lost) {
            (_, true) => "lost",
            (true, false) => "active",
            (false, false) => "inactive",
        };

        table.row([
            bird.id.to_string(),
            bird.band.clone(),
            optional(bird.name.as_ref()),
            bird.sex.to_lowercase(),
            optional(bird.rfid.as_ref()),
            bird.breeder_id.to_string(),
            status.to_string(),
        ]);
    }

    table
}
