//! Races of an event.
//!
//! A race moves from created to live to closed, and never back. Enrolled
//! birds get their arrival times from loft scanners while the race is live,
//! and finishing positions once it is closed.

/// Race enrollment, results and arrival correction routes.
mod items;

/// Race start and close routes.
mod lifecycle;

/// Race list and details routes.
mod list;

/// Race management routes.
mod manage;

/// Arrival scan ingestion route.
mod scan;

use std::sync::Arc;

use aide::axum::{
    routing::{get_with, post_with, put_with},
    ApiRouter,
};
use db::{event, race, race_item, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait};
use schemars::JsonSchema;
use serde::Serialize;

use crate::policy::Owner;

/// Race information.
#[derive(Serialize, JsonSchema)]
pub(super) struct RaceData {
    #[schemars(example = "crate::schema::example_database_identifier")]
    id: i64,

    #[schemars(example = "crate::schema::example_database_identifier")]
    event_id: i64,

    #[schemars(example = "crate::schema::example_database_identifier")]
    race_type_id: i64,

    #[schemars(example = "crate::schema::example_race_name")]
    name: String,

    /// Release time of the birds.
    #[schemars(example = "crate::schema::example_optional_timestamp")]
    release_at: Option<i64>,

    #[schemars(example = "crate::schema::example_distance")]
    distance_km: Option<f64>,

    is_live: bool,

    is_closed: bool,

    #[schemars(example = "crate::schema::example_database_identifier")]
    created_by: i64,

    #[schemars(example = "crate::schema::example_timestamp")]
    created_at: i64,
}

impl From<race::Model> for RaceData {
    fn from(model: race::Model) -> Self {
        Self {
            id: model.id,
            event_id: model.event_id,
            race_type_id: model.race_type_id,
            name: model.name,
            release_at: model.release_at.map(db::unix_timestamp),
            distance_km: model.distance_km,
            is_live: model.is_live,
            is_closed: model.is_closed,
            created_by: model.created_by,
            created_at: db::unix_timestamp(model.created_at),
        }
    }
}

#[derive(Serialize, JsonSchema)]
pub(super) struct RaceResponse {
    race: RaceData,

    #[schemars(example = "crate::schema::example_message")]
    message: String,
}

/// Bird participation in a race.
#[derive(Serialize, JsonSchema)]
pub(super) struct RaceItemData {
    #[schemars(example = "crate::schema::example_database_identifier")]
    id: i64,

    #[schemars(example = "crate::schema::example_database_identifier")]
    race_id: i64,

    #[schemars(example = "crate::schema::example_database_identifier")]
    bird_id: i64,

    /// Time the bird was scanned at its loft.
    #[schemars(example = "crate::schema::example_optional_timestamp")]
    arrived_at: Option<i64>,

    /// Finishing position, assigned when the race is closed.
    #[schemars(example = "crate::schema::example_position")]
    position: Option<i32>,

    #[schemars(example = "crate::schema::example_optional_database_identifier")]
    loft_basket_id: Option<i64>,

    is_loft_basketed: bool,

    #[schemars(example = "crate::schema::example_optional_database_identifier")]
    race_basket_id: Option<i64>,

    is_race_basketed: bool,

    #[schemars(example = "crate::schema::example_optional_timestamp")]
    race_basketed_at: Option<i64>,

    #[schemars(example = "crate::schema::example_timestamp")]
    created_at: i64,
}

impl From<race_item::Model> for RaceItemData {
    fn from(model: race_item::Model) -> Self {
        Self {
            id: model.id,
            race_id: model.race_id,
            bird_id: model.bird_id,
            arrived_at: model.arrived_at.map(db::unix_timestamp),
            position: model.position,
            loft_basket_id: model.loft_basket_id,
            is_loft_basketed: model.is_loft_basketed,
            race_basket_id: model.race_basket_id,
            is_race_basketed: model.is_race_basketed,
            race_basketed_at: model.race_basketed_at.map(db::unix_timestamp),
            created_at: db::unix_timestamp(model.created_at),
        }
    }
}

/// Find a race together with its event.
async fn find_race<C: ConnectionTrait>(
    db: &C,
    id: i64,
) -> Result<Option<(race::Model, event::Model)>, DbErr> {
    let found = race::Entity::find_by_id(id)
        .find_also_related(event::Entity)
        .one(db)
        .await?;

    Ok(found.and_then(|(race, event)| event.map(|event| (race, event))))
}

/// Races are managed by the creator of their event.
fn owner_of(event: &event::Model) -> Owner {
    Owner::creator(event.created_by)
}

/// Create an [`ApiRouter`] that provides an API server with race routes.
pub(crate) fn routes() -> ApiRouter<Arc<DatabaseConnection>> {
    ApiRouter::new()
        .api_route(
            "/",
            get_with(list::list, list::list_docs).post_with(manage::create, manage::create_docs),
        )
        .api_route(
            "/:id",
            get_with(list::details, list::details_docs)
                .put_with(manage::update, manage::update_docs)
                .delete_with(manage::delete, manage::delete_docs),
        )
        .api_route(
            "/:id/start",
            post_with(lifecycle::start, lifecycle::start_docs),
        )
        .api_route(
            "/:id/close",
            post_with(lifecycle::close, lifecycle::close_docs),
        )
        .api_route(
            "/:id/items",
            get_with(items::list, items::list_docs).post_with(items::enroll, items::enroll_docs),
        )
        .api_route(
            "/:id/items/:item_id/arrival",
            put_with(items::correct_arrival, items::correct_arrival_docs),
        )
        .api_route("/:id/results", get_with(items::results, items::results_docs))
        .api_route("/:id/scan", post_with(scan::scan, scan::docs))
        .with_path_items(|op| op.tag("Races"))
}
