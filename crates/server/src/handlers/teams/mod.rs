/// Team list route.
mod list;

/// Team creation, update and deletion routes.
mod manage;

use std::sync::Arc;

use aide::axum::{
    routing::{get_with, put_with},
    ApiRouter,
};
use db::{team, DatabaseConnection};
use schemars::JsonSchema;
use serde::Serialize;

/// Information about a single team.
#[derive(Serialize, JsonSchema)]
pub(crate) struct TeamData {
    /// Team identifier.
    #[schemars(example = "crate::schema::example_database_identifier")]
    pub id: i64,

    /// Owning breeder identifier.
    #[schemars(example = "crate::schema::example_database_identifier")]
    pub breeder_id: i64,

    /// Team name.
    #[schemars(example = "crate::schema::example_team_name")]
    pub name: String,

    /// Team creation time.
    #[schemars(example = "crate::schema::example_timestamp")]
    pub created_at: i64,
}

impl From<team::Model> for TeamData {
    fn from(model: team::Model) -> Self {
        Self {
            id: model.id,
            breeder_id: model.breeder_id,
            name: model.name,
            created_at: db::unix_timestamp(model.created_at),
        }
    }
}

/// Single team mutation response.
#[derive(Serialize, JsonSchema)]
pub(super) struct TeamResponse {
    team: TeamData,

    /// Human-readable operation result.
    #[schemars(example = "crate::schema::example_message")]
    message: String,
}

/// Create an [`ApiRouter`] that provides an API server with team routes.
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
        .with_path_items(|op| op.tag("Teams"))
}
