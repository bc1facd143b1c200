/// Prize scheme details route.
mod details;

/// Prize scheme list route.
mod list;

/// Prize scheme management routes.
mod manage;

use std::sync::Arc;

use aide::axum::{routing::get_with, ApiRouter};
use db::{
    prize_scheme, prize_scheme_item, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder,
};
use schemars::JsonSchema;
use serde::Serialize;

#[derive(Serialize, JsonSchema)]
pub(super) struct PrizeSchemeData {
    #[schemars(example = "crate::schema::example_database_identifier")]
    id: i64,

    #[schemars(example = "crate::schema::example_scheme_name")]
    name: String,

    #[schemars(example = "crate::schema::example_database_identifier")]
    created_by: i64,

    #[schemars(example = "crate::schema::example_timestamp")]
    created_at: i64,
}

impl From<prize_scheme::Model> for PrizeSchemeData {
    fn from(model: prize_scheme::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            created_by: model.created_by,
            created_at: db::unix_timestamp(model.created_at),
        }
    }
}

/// Prize for an inclusive range of finishing positions in a race type.
#[derive(Serialize, JsonSchema)]
pub(super) struct PrizeSchemeItemData {
    #[schemars(example = "crate::schema::example_database_identifier")]
    id: i64,

    #[schemars(example = "crate::schema::example_database_identifier")]
    race_type_id: i64,

    #[schemars(example = "crate::schema::example_bird_no")]
    from_position: i32,

    #[schemars(example = "crate::schema::example_bird_no")]
    to_position: i32,

    #[schemars(example = "crate::schema::example_amount")]
    prize: f64,
}

/// Prize scheme with its line items.
#[derive(Serialize, JsonSchema)]
pub(super) struct PrizeSchemeDetails {
    #[serde(flatten)]
    scheme: PrizeSchemeData,

    items: Vec<PrizeSchemeItemData>,
}

impl PrizeSchemeDetails {
    async fn load<C: ConnectionTrait>(
        db: &C,
        scheme: prize_scheme::Model,
    ) -> Result<Self, DbErr> {
        let items = prize_scheme_item::Entity::find()
            .filter(prize_scheme_item::Column::PrizeSchemeId.eq(scheme.id))
            .order_by_asc(prize_scheme_item::Column::RaceTypeId)
            .order_by_asc(prize_scheme_item::Column::FromPosition)
            .all(db)
            .await?
            .into_iter()
            .map(|item| PrizeSchemeItemData {
                id: item.id,
                race_type_id: item.race_type_id,
                from_position: item.from_position,
                to_position: item.to_position,
                prize: item.prize,
            })
            .collect();

        Ok(Self {
            scheme: scheme.into(),
            items,
        })
    }
}

#[derive(Serialize, JsonSchema)]
pub(super) struct PrizeSchemeResponse {
    prize_scheme: PrizeSchemeDetails,

    #[schemars(example = "crate::schema::example_message")]
    message: String,
}

/// Create an [`ApiRouter`] that provides an API server with prize scheme routes.
pub(crate) fn routes() -> ApiRouter<Arc<DatabaseConnection>> {
    ApiRouter::new()
        .api_route(
            "/",
            get_with(list::list, list::docs).post_with(manage::create, manage::create_docs),
        )
        .api_route(
            "/:id",
            get_with(details::details, details::docs)
                .put_with(manage::update, manage::update_docs)
                .delete_with(manage::delete, manage::delete_docs),
        )
        .with_path_items(|op| op.tag("Prize schemes"))
}
