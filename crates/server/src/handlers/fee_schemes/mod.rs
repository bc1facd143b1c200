/// Fee scheme details route.
mod details;

/// Fee scheme list route.
mod list;

/// Fee scheme management routes.
mod manage;

use std::sync::Arc;

use aide::axum::{routing::get_with, ApiRouter};
use db::{
    fee_scheme, perch_fee_item, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder,
};
use schemars::JsonSchema;
use serde::Serialize;

/// Fee scheme information without line items.
#[derive(Serialize, JsonSchema)]
pub(super) struct FeeSchemeData {
    #[schemars(example = "crate::schema::example_database_identifier")]
    id: i64,

    #[schemars(example = "crate::schema::example_scheme_name")]
    name: String,

    /// Fee charged once per inventory registration.
    #[schemars(example = "crate::schema::example_amount")]
    perch_fee: f64,

    #[schemars(example = "crate::schema::example_database_identifier")]
    created_by: i64,

    #[schemars(example = "crate::schema::example_timestamp")]
    created_at: i64,
}

impl From<fee_scheme::Model> for FeeSchemeData {
    fn from(model: fee_scheme::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            perch_fee: model.perch_fee,
            created_by: model.created_by,
            created_at: db::unix_timestamp(model.created_at),
        }
    }
}

/// Fee charged for the Nth bird registered in an inventory.
#[derive(Serialize, JsonSchema)]
pub(super) struct PerchFeeItemData {
    #[schemars(example = "crate::schema::example_database_identifier")]
    id: i64,

    #[schemars(example = "crate::schema::example_bird_no")]
    bird_no: i32,

    #[schemars(example = "crate::schema::example_amount")]
    fee: f64,
}

/// Fee scheme with its line items.
#[derive(Serialize, JsonSchema)]
pub(super) struct FeeSchemeDetails {
    #[serde(flatten)]
    scheme: FeeSchemeData,

    items: Vec<PerchFeeItemData>,
}

impl FeeSchemeDetails {
    async fn load<C: ConnectionTrait>(
        db: &C,
        scheme: fee_scheme::Model,
    ) -> Result<Self, DbErr> {
        let items = perch_fee_item::Entity::find()
            .filter(perch_fee_item::Column::FeeSchemeId.eq(scheme.id))
            .order_by_asc(perch_fee_item::Column::BirdNo)
            .all(db)
            .await?
            .into_iter()
            .map(|item| PerchFeeItemData {
                id: item.id,
                bird_no: item.bird_no,
                fee: item.fee,
            })
            .collect();

        Ok(Self {
            scheme: scheme.into(),
            items,
        })
    }
}

/// Single fee scheme mutation response.
#[derive(Serialize, JsonSchema)]
pub(super) struct FeeSchemeResponse {
    fee_scheme: FeeSchemeDetails,

    #[schemars(example = "crate::schema::example_message")]
    message: String,
}

/// Create an [`ApiRouter`] that provides an API server with fee scheme routes.
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
        .with_path_items(|op| op.tag("Fee schemes"))
}
