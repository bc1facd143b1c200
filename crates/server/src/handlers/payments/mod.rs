/// Payment list route.
mod list;

/// Manual payment management routes.
mod manage;

use std::sync::Arc;

use aide::axum::{
    routing::{get_with, put_with},
    ApiRouter,
};
use db::{payment, DatabaseConnection};
use schemars::JsonSchema;
use serde::Serialize;

/// Payment ledger row.
#[derive(Serialize, JsonSchema)]
pub(crate) struct PaymentData {
    #[schemars(example = "crate::schema::example_database_identifier")]
    pub id: i64,

    #[schemars(example = "crate::schema::example_database_identifier")]
    pub event_inventory_id: i64,

    #[schemars(example = "crate::schema::example_database_identifier")]
    pub breeder_id: i64,

    #[schemars(example = "crate::schema::example_amount")]
    pub amount_to_pay: f64,

    #[schemars(example = "crate::schema::example_amount")]
    pub amount_paid: f64,

    #[schemars(example = "crate::schema::example_currency")]
    pub currency: String,

    /// Payment method, such as cash or a bank transfer.
    pub method: Option<String>,

    #[schemars(example = "crate::schema::example_payment_type")]
    pub payment_type: payment::PaymentType,

    #[schemars(example = "crate::schema::example_payment_status")]
    pub status: payment::PaymentStatus,

    pub description: Option<String>,

    #[schemars(example = "crate::schema::example_optional_timestamp")]
    pub paid_at: Option<i64>,

    #[schemars(example = "crate::schema::example_timestamp")]
    pub created_at: i64,
}

impl From<payment::Model> for PaymentData {
    fn from(model: payment::Model) -> Self {
        Self {
            id: model.id,
            event_inventory_id: model.event_inventory_id,
            breeder_id: model.breeder_id,
            amount_to_pay: model.amount_to_pay,
            amount_paid: model.amount_paid,
            currency: model.currency,
            method: model.method,
            payment_type: model.payment_type,
            status: model.status,
            description: model.description,
            paid_at: model.paid_at.map(db::unix_timestamp),
            created_at: db::unix_timestamp(model.created_at),
        }
    }
}

#[derive(Serialize, JsonSchema)]
pub(super) struct PaymentResponse {
    payment: PaymentData,

    #[schemars(example = "crate::schema::example_message")]
    message: String,
}

/// Create an [`ApiRouter`] that provides an API server with payment routes.
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
        .with_path_items(|op| op.tag("Payments"))
}
