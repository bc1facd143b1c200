use clap::Subcommand;

use super::{format_timestamp, print_table};
use crate::{
    client::{query, ApiClient, ClientError},
    models::Event,
    table::Table,
};

#[derive(Subcommand)]
pub(crate) enum EventCommand {
    /// List events, most recent first.
    List {
        /// Only list events that accept registrations.
        #[arg(short, long)]
        open: bool,

        /// Page number.
        #[arg(short, long)]
        page: Option<u64>,
    },
}

pub(crate) fn run(client: &ApiClient, command: EventCommand) -> Result<(), ClientError> {
    match command {
        EventCommand::List { open, page } => {
            let path = query(
                "/events",
                [
                    ("open", open.then(|| String::from("true"))),
                    ("page", page.map(|page| page.to_string())),
                ],
            );

            let events: Vec<Event> = client.get(&path)?;

            let mut table = Table::new(["ID", "Name", "Starts", "Ends", "Registration"]);

            for event in events {
                table.row([
                    event.id.to_string(),
                    event.name,
                    format_timestamp(event.starts_at),
                    format_timestamp(event.ends_at),
                    String::from(if event.is_open { "open" } else { "closed" }),
                ]);
            }

            print_table(&table);
        }
    }

    Ok(())
}
