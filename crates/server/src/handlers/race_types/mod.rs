/// Race type list route.
mod list;

/// Race type management routes.
mod manage;

/// Race type scheme link routes.
mod schemes;

use std::sync::Arc;

use aide::axum::{
    routing::{get_with, put_with},
    ApiRouter,
};
use db::{race_type, DatabaseConnection};
use schemars::JsonSchema;
use serde::Serialize;

/// Race type reference record.
#[derive(Serialize, JsonSchema)]
pub(super) struct RaceTypeData {
    #[schemars(example = "crate::schema::example_database_identifier")]
    id: i64,

    #[schemars(example = "crate::schema::example_reference_name")]
    name: String,

    description: Option<String>,

    #[schemars(example = "crate::schema::example_timestamp")]
    created_at: i64,
}

impl From<race_type::Model> for RaceTypeData {
    fn from(model: race_type::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            created_at: db::unix_timestamp(model.created_at),
        }
    }
}

/// Single race type mutation response.
#[derive(Serialize, JsonSchema)]
pub(super) struct RaceTypeResponse {
    race_type: RaceTypeData,

    #[schemars(example = "crate::schema::example_message")]
    message: String,
}

/// Create an [`ApiRouter`] that provides an API server with race type routes.
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
            "/:id/schemes",
            get_with(schemes::details, schemes::details_docs)
                .put_with(schemes::replace, schemes::replace_docs),
        )
        .with_path_items(|op| op.tag("Race types"))
}
