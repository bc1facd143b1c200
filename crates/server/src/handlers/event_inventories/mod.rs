//! Breeder registrations into events.
//!
//! An inventory reserves a number of slots for a breeder inside of an event.
//! The `registered_birds` counter is kept in lock-step with the inventory
//! items and never exceeds `reserved_birds`.

/// Inventory item routes.
mod items;

/// Inventory list route.
mod list;

/// Inventory management routes.
mod manage;

use std::sync::Arc;

use aide::axum::{
    routing::{get_with, put_with},
    ApiRouter,
};
use db::{
    event, event_inventory, event_inventory_item, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait,
};
use schemars::JsonSchema;
use serde::Serialize;

use crate::policy::Owner;

/// Event inventory information.
#[derive(Serialize, JsonSchema)]
pub(super) struct InventoryData {
    #[schemars(example = "crate::schema::example_database_identifier")]
    id: i64,

    #[schemars(example = "crate::schema::example_database_identifier")]
    event_id: i64,

    #[schemars(example = "crate::schema::example_database_identifier")]
    breeder_id: i64,

    /// Number of birds the breeder may register.
    #[schemars(example = "crate::schema::example_reserved_birds")]
    reserved_birds: i32,

    /// Number of birds currently registered.
    #[schemars(example = "crate::schema::example_reserved_birds")]
    registered_birds: i32,

    #[schemars(example = "crate::schema::example_timestamp")]
    created_at: i64,
}

impl From<event_inventory::Model> for InventoryData {
    fn from(model: event_inventory::Model) -> Self {
        Self {
            id: model.id,
            event_id: model.event_id,
            breeder_id: model.breeder_id,
            reserved_birds: model.reserved_birds,
            registered_birds: model.registered_birds,
            created_at: db::unix_timestamp(model.created_at),
        }
    }
}

#[derive(Serialize, JsonSchema)]
pub(super) struct InventoryResponse {
    event_inventory: InventoryData,

    #[schemars(example = "crate::schema::example_message")]
    message: String,
}

/// Single bird registered in an inventory.
#[derive(Serialize, JsonSchema)]
pub(super) struct InventoryItemData {
    #[schemars(example = "crate::schema::example_database_identifier")]
    id: i64,

    #[schemars(example = "crate::schema::example_database_identifier")]
    event_inventory_id: i64,

    #[schemars(example = "crate::schema::example_database_identifier")]
    event_id: i64,

    #[schemars(example = "crate::schema::example_database_identifier")]
    bird_id: i64,

    /// Time the bird arrived at the loft.
    #[schemars(example = "crate::schema::example_optional_timestamp")]
    arrived_at: Option<i64>,

    /// Time the bird left the loft.
    #[schemars(example = "crate::schema::example_optional_timestamp")]
    departed_at: Option<i64>,

    is_backup: bool,

    bet_standard: bool,

    bet_show_low: bool,

    bet_show_mid: bool,

    bet_show_high: bool,

    bet_winner_takes_all: bool,

    #[schemars(example = "crate::schema::example_timestamp")]
    created_at: i64,
}

impl From<event_inventory_item::Model> for InventoryItemData {
    fn from(model: event_inventory_item::Model) -> Self {
        Self {
            id: model.id,
            event_inventory_id: model.event_inventory_id,
            event_id: model.event_id,
            bird_id: model.bird_id,
            arrived_at: model.arrived_at.map(db::unix_timestamp),
            departed_at: model.departed_at.map(db::unix_timestamp),
            is_backup: model.is_backup,
            bet_standard: model.bet_standard,
            bet_show_low: model.bet_show_low,
            bet_show_mid: model.bet_show_mid,
            bet_show_high: model.bet_show_high,
            bet_winner_takes_all: model.bet_winner_takes_all,
            created_at: db::unix_timestamp(model.created_at),
        }
    }
}

/// Find an inventory together with the event it belongs to.
async fn find_inventory<C: ConnectionTrait>(
    db: &C,
    id: i64,
) -> Result<Option<(event_inventory::Model, event::Model)>, DbErr> {
    let found = event_inventory::Entity::find_by_id(id)
        .find_also_related(event::Entity)
        .one(db)
        .await?;

    Ok(match found {
        Some((inventory, Some(event))) => Some((inventory, event)),
        _ => None,
    })
}

/// Inventories are owned both by their breeder and by the event creator.
fn owner_of(inventory: &event_inventory::Model, event: &event::Model) -> Owner {
    Owner::both(inventory.breeder_id, event.created_by)
}

/// Create an [`ApiRouter`] that provides an API server with event inventory routes.
pub(crate) fn routes() -> ApiRouter<Arc<DatabaseConnection>> {
    ApiRouter::new()
        .api_route(
            "/",
            get_with(list::list, list::docs).post_with(manage::create, manage::create_docs),
        )
        .api_route(
            "/:id",
            put_with(manage::update, manage::update_docs)
                .delete_with(manage::delete, manage::delete_docs),
        )
        .api_route(
            "/:id/items",
            get_with(items::list, items::list_docs).post_with(items::add, items::add_docs),
        )
        .api_route(
            "/items/:item_id",
            put_with(items::update, items::update_docs)
                .delete_with(items::remove, items::remove_docs),
        )
        .with_path_items(|op| op.tag("Event inventories"))
}
