/// Event list and details routes.
mod list;

/// Event management routes.
mod manage;

use std::sync::Arc;

use aide::axum::{routing::get_with, ApiRouter};
use db::{event, DatabaseConnection};
use schemars::JsonSchema;
use serde::Serialize;

/// Event information.
#[derive(Serialize, JsonSchema)]
pub(super) struct EventData {
    #[schemars(example = "crate::schema::example_database_identifier")]
    id: i64,

    #[schemars(example = "crate::schema::example_event_name")]
    name: String,

    #[schemars(example = "crate::schema::example_database_identifier")]
    event_type_id: i64,

    #[schemars(example = "crate::schema::example_database_identifier")]
    fee_scheme_id: i64,

    #[schemars(example = "crate::schema::example_database_identifier")]
    prize_scheme_id: i64,

    #[schemars(example = "crate::schema::example_database_identifier")]
    betting_scheme_id: i64,

    /// Whether breeders can still register for the event.
    is_open: bool,

    #[schemars(example = "crate::schema::example_timestamp")]
    starts_at: i64,

    #[schemars(example = "crate::schema::example_timestamp")]
    ends_at: i64,

    #[schemars(example = "crate::schema::example_database_identifier")]
    created_by: i64,

    #[schemars(example = "crate::schema::example_timestamp")]
    created_at: i64,
}

impl From<event::Model> for EventData {
    fn from(model: event::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            event_type_id: model.event_type_id,
            fee_scheme_id: model.fee_scheme_id,
            prize_scheme_id: model.prize_scheme_id,
            betting_scheme_id: model.betting_scheme_id,
            is_open: model.is_open,
            starts_at: db::unix_timestamp(model.starts_at),
            ends_at: db::unix_timestamp(model.ends_at),
            created_by: model.created_by,
            created_at: db::unix_timestamp(model.created_at),
        }
    }
}

#[derive(Serialize, JsonSchema)]
pub(super) struct EventResponse {
    event: EventData,

    #[schemars(example = "crate::schema::example_message")]
    message: String,
}

/// Create an [`ApiRouter`] that provides an API server with event routes.
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
        .with_path_items(|op| op.tag("Events"))
}
