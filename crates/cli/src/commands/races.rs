use clap::Subcommand;
use serde::Serialize;

use super::{format_timestamp, print_table, with_spinner};
use crate::{
    client::{query, ApiClient, ClientError},
    models::{Race, RaceResponse, RaceResult, ScanResponse},
    table::{optional, Table},
};

#[derive(Subcommand)]
pub(crate) enum RaceCommand {
    /// List races.
    List {
        /// Only list races of the provided event.
        #[arg(short, long)]
        event_id: Option<i64>,
    },

    /// Show race results with prizes.
    Results {
        /// Race identifier.
        race_id: i64,
    },

    /// Start accepting arrival scans.
    Start {
        /// Race identifier.
        race_id: i64,
    },

    /// Stop accepting arrival scans and assign finishing positions.
    Close {
        /// Race identifier.
        race_id: i64,
    },

    /// Submit an arrival scan.
    Scan {
        /// Race identifier.
        race_id: i64,

        /// Band or RFID tag of the scanned bird.
        ring_no: String,

        /// Scanner timestamp in the YYYYMMDDHHMMSS format, UTC.
        timestamp: String,

        /// Scanner antenna name.
        #[arg(short, long)]
        antenna: Option<String>,
    },
}

#[derive(Serialize)]
struct ScanRequest {
    ring_no: String,
    timestamp: String,
    antenna: Option<String>,
}

pub(crate) fn run(client: &ApiClient, command: RaceCommand) -> Result<(), ClientError> {
    match command {
        RaceCommand::List { event_id } => {
            let races: Vec<Race> = client.get(&query(
                "/races",
                [("event_id", event_id.map(|id| id.to_string()))],
            ))?;

            let mut table = Table::new(["ID", "Event", "Name", "Distance", "State"]);

            for race in races {
                table.row([
                    race.id.to_string(),
                    race.event_id.to_string(),
                    race.name.clone(),
                    optional(race.distance_km.map(|distance| format!("{distance:.1} km"))),
                    race.state().to_string(),
                ]);
            }

            print_table(&table);
        }
        RaceCommand::Results { race_id } => {
            let results: Vec<RaceResult> = client.get(&format!("/races/{race_id}/results"))?;

            let mut table = Table::new(["Position", "Bird", "Band", "Arrived", "Prize"]);

            for result in results {
                table.row([
                    optional(result.item.position),
                    result.item.bird_id.to_string(),
                    optional(result.band),
                    optional(result.item.arrived_at.map(format_timestamp)),
                    format!("{:.2}", result.prize),
                ]);
            }

            print_table(&table);
        }
        RaceCommand::Start { race_id } => {
            let response: RaceResponse =
                client.post(&format!("/races/{race_id}/start"), &())?;

            println!("{} Race #{} is {}.", response.message, response.race.id, response.race.state());
        }
        RaceCommand::Close { race_id } => {
            let response: RaceResponse = with_spinner("Closing race...", || {
                client.post(&format!("/races/{race_id}/close"), &())
            })?;

            println!("{} Race #{} is {}.", response.message, response.race.id, response.race.state());
        }
        RaceCommand::Scan {
            race_id,
            ring_no,
            timestamp,
            antenna,
        } => {
            let response: ScanResponse = client.post(
                &format!("/races/{race_id}/scan"),
                &ScanRequest {
                    ring_no,
                    timestamp,
                    antenna,
                },
            )?;

            let arrived = optional(response.race_item.arrived_at.map(format_timestamp));

            if response.is_new_arrival {
                println!("{} Bird #{} arrived at {arrived}.", response.message, response.race_item.bird_id);
            } else {
                println!("{} First arrival at {arrived}.", response.message);
            }
        }
    }

    Ok(())
}
