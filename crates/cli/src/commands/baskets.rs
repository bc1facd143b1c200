use clap::{Subcommand, ValueEnum};
use itertools::Itertools;
use serde::Serialize;

use crate::{
    client::{ApiClient, ClientError},
    models::BasketAssignmentResponse,
};

#[derive(Clone, Copy, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub(crate) enum BasketType {
    Race,
    Loft,
}

#[derive(Subcommand)]
pub(crate) enum BasketCommand {
    /// Put race items into a basket.
    Assign {
        /// Basket identifier.
        basket_id: i64,

        #[arg(short, long, value_enum)]
        basket_type: BasketType,

        /// Race item identifiers.
        #[arg(required = true, num_args = 1..)]
        race_item_ids: Vec<i64>,
    },

    /// Take race items out of their baskets.
    Unassign {
        #[arg(short, long, value_enum)]
        basket_type: BasketType,

        /// Race item identifiers.
        #[arg(required = true, num_args = 1..)]
        race_item_ids: Vec<i64>,
    },
}

#[derive(Serialize)]
struct AssignmentRequest {
    race_item_ids: Vec<i64>,
    basket_type: BasketType,
}

pub(crate) fn run(client: &ApiClient, command: BasketCommand) -> Result<(), ClientError> {
    let (path, request) = match command {
        BasketCommand::Assign {
            basket_id,
            basket_type,
            race_item_ids,
        } => (
            format!("/baskets/{basket_id}/assign"),
            AssignmentRequest {
                race_item_ids,
                basket_type,
            },
        ),
        BasketCommand::Unassign {
            basket_type,
            race_item_ids,
        } => (
            String::from("/baskets/unassign"),
            AssignmentRequest {
                race_item_ids,
                basket_type,
            },
        ),
    };

    let ids = request.race_item_ids.iter().join(", ");
    let response: BasketAssignmentResponse = client.post(&path, &request)?;

    println!("{} Updated {} of race items {ids}.", response.message, response.updated);

    Ok(())
}
