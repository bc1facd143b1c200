/// Betting scheme list and details routes.
mod list;

/// Betting scheme management routes.
mod manage;

use std::sync::Arc;

use aide::axum::{routing::get_with, ApiRouter};
use db::{betting_scheme, DatabaseConnection};
use schemars::JsonSchema;
use serde::Serialize;

/// Betting amounts and house cut of an event.
#[derive(Serialize, JsonSchema)]
pub(super) struct BettingSchemeData {
    #[schemars(example = "crate::schema::example_database_identifier")]
    id: i64,

    #[schemars(example = "crate::schema::example_scheme_name")]
    name: String,

    /// Share of the betting pool kept by the organizer, in percent.
    #[schemars(example = "crate::schema::example_percentage")]
    cut_percentage: f64,

    #[schemars(example = "crate::schema::example_amount")]
    standard_amount: f64,

    #[schemars(example = "crate::schema::example_amount")]
    show_low_amount: f64,

    #[schemars(example = "crate::schema::example_amount")]
    show_mid_amount: f64,

    #[schemars(example = "crate::schema::example_amount")]
    show_high_amount: f64,

    #[schemars(example = "crate::schema::example_amount")]
    winner_takes_all_amount: f64,

    #[schemars(example = "crate::schema::example_database_identifier")]
    created_by: i64,

    #[schemars(example = "crate::schema::example_timestamp")]
    created_at: i64,
}

impl From<betting_scheme::Model> for BettingSchemeData {
    fn from(model: betting_scheme::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            cut_percentage: model.cut_percentage,
            standard_amount: model.standard_amount,
            show_low_amount: model.show_low_amount,
            show_mid_amount: model.show_mid_amount,
            show_high_amount: model.show_high_amount,
            winner_takes_all_amount: model.winner_takes_all_amount,
            created_by: model.created_by,
            created_at: db::unix_timestamp(model.created_at),
        }
    }
}

#[derive(Serialize, JsonSchema)]
pub(super) struct BettingSchemeResponse {
    betting_scheme: BettingSchemeData,

    #[schemars(example = "crate::schema::example_message")]
    message: String,
}

/// Create an [`ApiRouter`] that provides an API server with betting scheme routes.
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
        .with_path_items(|op| op.tag("Betting schemes"))
}
