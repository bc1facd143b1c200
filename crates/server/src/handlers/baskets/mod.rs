//! Numbered bird baskets of a race.
//!
//! Race items are placed into baskets in bulk. A race item can be in one
//! loft basket and one race basket at the same time.

/// Bird assignment routes.
mod assign;

/// Basket list and details routes.
mod list;

/// Basket management routes.
mod manage;

use std::sync::Arc;

use aide::axum::{
    routing::{get_with, post_with},
    ApiRouter,
};
use db::{basket, event, race, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait};
use schemars::JsonSchema;
use serde::Serialize;

use crate::policy::Owner;

/// Basket information.
#[derive(Serialize, JsonSchema)]
pub(super) struct BasketData {
    #[schemars(example = "crate::schema::example_database_identifier")]
    id: i64,

    #[schemars(example = "crate::schema::example_database_identifier")]
    race_id: i64,

    /// Basket number, unique per race and basket type.
    #[schemars(example = "crate::schema::example_basket_number")]
    number: i32,

    #[schemars(example = "crate::schema::example_basket_type")]
    basket_type: basket::BasketType,

    /// Maximum number of birds, if limited.
    capacity: Option<i32>,

    #[schemars(example = "crate::schema::example_database_identifier")]
    created_by: i64,

    #[schemars(example = "crate::schema::example_timestamp")]
    created_at: i64,
}

impl From<basket::Model> for BasketData {
    fn from(model: basket::Model) -> Self {
        Self {
            basket_type: model.basket_type(),
            id: model.id,
            race_id: model.race_id,
            number: model.number,
            capacity: model.capacity,
            created_by: model.created_by,
            created_at: db::unix_timestamp(model.created_at),
        }
    }
}

#[derive(Serialize, JsonSchema)]
pub(super) struct BasketResponse {
    basket: BasketData,

    #[schemars(example = "crate::schema::example_message")]
    message: String,
}

/// Find a race together with its event.
async fn find_race<C: ConnectionTrait>(
    db: &C,
    race_id: i64,
) -> Result<Option<(race::Model, event::Model)>, DbErr> {
    let found = race::Entity::find_by_id(race_id)
        .find_also_related(event::Entity)
        .one(db)
        .await?;

    Ok(found.and_then(|(race, event)| event.map(|event| (race, event))))
}

/// Find a basket together with the event of its race.
async fn find_basket<C: ConnectionTrait>(
    db: &C,
    id: i64,
) -> Result<Option<(basket::Model, event::Model)>, DbErr> {
    let Some(basket) = basket::Entity::find_by_id(id).one(db).await? else {
        return Ok(None);
    };

    let event = find_race(db, basket.race_id)
        .await?
        .map(|(_, event)| event);

    Ok(event.map(|event| (basket, event)))
}

/// Baskets are managed by the creator of the race event.
fn owner_of(event: &event::Model) -> Owner {
    Owner::creator(event.created_by)
}

/// Create an [`ApiRouter`] that provides an API server with basket routes.
pub(crate) fn routes() -> ApiRouter<Arc<DatabaseConnection>> {
    ApiRouter::new()
        .api_route(
            "/",
            get_with(list::list, list::list_docs).post_with(manage::create, manage::create_docs),
        )
        .api_route(
            "/unassign",
            post_with(assign::unassign, assign::unassign_docs),
        )
        .api_route(
            "/:id",
            get_with(list::details, list::details_docs)
                .put_with(manage::update, manage::update_docs)
                .delete_with(manage::delete, manage::delete_docs),
        )
        .api_route("/:id/assign", post_with(assign::assign, assign::assign_docs))
        .with_path_items(|op| op.tag("Baskets"))
}
