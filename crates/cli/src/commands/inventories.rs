use clap::Subcommand;
use serde::Serialize;

use super::{print_table, with_spinner};
use crate::{
    client::{ApiClient, ClientError},
    models::{InventoryItem, InventoryItemCreationResponse},
    table::{optional, Table},
};

#[derive(Subcommand)]
pub(crate) enum InventoryCommand {
    /// List birds registered in an inventory.
    Items {
        /// Event inventory identifier.
        inventory_id: i64,
    },

    /// Register a bird in an inventory and print the created fee payments.
    AddBird {
        /// Event inventory identifier.
        inventory_id: i64,

        /// Bird identifier.
        bird_id: i64,

        /// Register the bird as a backup.
        #[arg(long)]
        backup: bool,
    },
}

#[derive(Serialize)]
struct InventoryItemRequest {
    bird_id: i64,
    is_backup: bool,
}

pub(crate) fn run(client: &ApiClient, command: InventoryCommand) -> Result<(), ClientError> {
    match command {
        InventoryCommand::Items { inventory_id } => {
            let items: Vec<InventoryItem> =
                client.get(&format!("/eventInventories/{inventory_id}/items"))?;

            let mut table = Table::new(["Item", "Bird", "Band", "Backup"]);

            for item in items {
                table.row([
                    item.id.to_string(),
                    item.bird_id.to_string(),
                    optional(item.bird.map(|bird| bird.band)),
                    String::from(if item.is_backup { "yes" } else { "no" }),
                ]);
            }

            print_table(&table);
        }
        InventoryCommand::AddBird {
            inventory_id,
            bird_id,
            backup,
        } => {
            let response: InventoryItemCreationResponse =
                with_spinner("Registering bird...", || {
                    client.post(
                        &format!("/eventInventories/{inventory_id}/items"),
                        &InventoryItemRequest {
                            bird_id,
                            is_backup: backup,
                        },
                    )
                })?;

            println!(
                "{} Item #{} for bird {}.",
                response.message, response.item.id, response.bird.band
            );

            let mut table = Table::new(["Payment", "Type", "Amount", "Status", "Description"]);

            for payment in response.payments {
                table.row([
                    payment.id.to_string(),
                    payment.payment_type,
                    format!("{:.2} {}", payment.amount_to_pay, payment.currency),
                    payment.status,
                    optional(payment.description),
                ]);
            }

            print_table(&table);
        }
    }

    Ok(())
}
