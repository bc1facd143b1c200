/// Event type list route.
mod list;

/// Event type management routes.
mod manage;

use std::sync::Arc;

use aide::axum::{
    routing::{get_with, put_with},
    ApiRouter,
};
use db::{event_type, DatabaseConnection};
use schemars::JsonSchema;
use serde::Serialize;

/// Event type reference record.
#[derive(Serialize, JsonSchema)]
pub(super) struct EventTypeData {
    #[schemars(example = "crate::schema::example_database_identifier")]
    id: i64,

    #[schemars(example = "crate::schema::example_reference_name")]
    name: String,

    #[schemars(example = "crate::schema::example_timestamp")]
    created_at: i64,
}

impl From<event_type::Model> for EventTypeData {
    fn from(model: event_type::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            created_at: db::unix_timestamp(model.created_at),
        }
    }
}

/// Single event type mutation response.
#[derive(Serialize, JsonSchema)]
pub(super) struct EventTypeResponse {
    event_type: EventTypeData,

    #[schemars(example = "crate::schema::example_message")]
    message: String,
}

/// Create an [`ApiRouter`] that provides an API server with event type routes.
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
        .with_path_items(|op| op.tag("Event types"))
}
