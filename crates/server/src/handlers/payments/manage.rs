use std::sync::Arc;

use aide::{transform::TransformOperation, OperationIo};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{
    event, event_inventory, payment, ActiveModelTrait, ActiveValue, ConnectionTrait,
    DatabaseConnection, DbErr, EntityTrait, PrimitiveDateTime, TransactionErrorExt,
    TransactionTrait,
};
use derive_more::{Display, Error, From};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;
use validator::Validate;

use super::PaymentResponse;
use crate::{
    auth::SessionContext,
    handlers::MessageResponse,
    policy::{Access, Forbidden, Grant, Owner, Resource},
    schema::example_error,
    validation::ValidatedJson,
};

#[derive(ErrorResponse, Display, From, Error, OperationIo)]
#[aide(output)]
pub(super) enum PaymentManagementError {
    DatabaseError(DbErr),

    #[status(StatusCode::FORBIDDEN)]
    Forbidden(Forbidden),

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "payment not found")]
    PaymentNotFound,

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "event inventory not found")]
    InventoryNotFound,
}

/// Check that the current user may manage payments of an inventory.
async fn authorize_inventory<C: ConnectionTrait>(
    db: &C,
    grant: &Grant,
    event_inventory_id: i64,
) -> Result<event_inventory::Model, PaymentManagementError> {
    let (inventory, event) = event_inventory::Entity::find_by_id(event_inventory_id)
        .find_also_related(event::Entity)
        .one(db)
        .await?
        .and_then(|(inventory, event)| event.map(|event| (inventory, event)))
        .ok_or(PaymentManagementError::InventoryNotFound)?;

    grant.check(Owner::both(inventory.breeder_id, event.created_by))?;

    Ok(inventory)
}

/// Time a payment was settled at, given its new status.
///
/// Settled payments keep their original settlement time.
fn settlement_time(
    status: payment::PaymentStatus,
    previous: Option<PrimitiveDateTime>,
) -> Option<PrimitiveDateTime> {
    match status {
        payment::PaymentStatus::Paid => Some(previous.unwrap_or_else(db::now)),
        payment::PaymentStatus::Pending | payment::PaymentStatus::Partial => None,
        payment::PaymentStatus::Failed | payment::PaymentStatus::Refunded => previous,
    }
}

fn default_currency() -> String {
    String::from(payment::DEFAULT_CURRENCY)
}

fn default_payment_type() -> payment::PaymentType {
    payment::PaymentType::Other
}

/// Manual payment creation request.
#[derive(Deserialize, Validate, JsonSchema)]
pub(super) struct PaymentCreationRequest {
    #[schemars(example = "crate::schema::example_database_identifier")]
    event_inventory_id: i64,

    #[validate(range(min = 0.0))]
    #[schemars(example = "crate::schema::example_amount")]
    amount_to_pay: f64,

    #[serde(default)]
    #[validate(range(min = 0.0))]
    #[schemars(example = "crate::schema::example_amount")]
    amount_paid: f64,

    #[serde(default = "default_currency")]
    #[validate(regex = "crate::validation::CURRENCY_REGEX")]
    #[schemars(example = "crate::schema::example_currency")]
    currency: String,

    #[serde(default)]
    #[validate(length(min = 1, max = 64))]
    method: Option<String>,

    #[serde(default = "default_payment_type")]
    #[schemars(example = "crate::schema::example_payment_type")]
    payment_type: payment::PaymentType,

    /// Requested status. Only `FAILED` and `REFUNDED` are kept as is,
    /// any other status is derived from the amounts.
    #[serde(default)]
    status: Option<payment::PaymentStatus>,

    #[serde(default)]
    #[validate(length(max = 255))]
    description: Option<String>,
}

/// Generate OAPI documentation for the [`create`] handler.
pub(super) fn create_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Record a payment.")
        .description("Payment status is derived from the paid and owed amounts.")
        .response::<200, Json<PaymentResponse>>()
        .response_with::<404, Json<Value>, _>(|op| {
            op.description("Event inventory not found.")
                .example(example_error(PaymentManagementError::InventoryNotFound))
        })
}

/// Manual payment creation handler.
pub(super) async fn create(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    ValidatedJson(request): ValidatedJson<PaymentCreationRequest>,
) -> Result<Json<PaymentResponse>, PaymentManagementError> {
    let grant = session.authorize(Resource::Payment, Access::Write)?;

    let inventory = authorize_inventory(&*db, &grant, request.event_inventory_id).await?;

    let status = payment::derive_status(
        request.status,
        request.amount_paid,
        request.amount_to_pay,
    );

    let model = payment::ActiveModel {
        event_inventory_id: ActiveValue::Set(inventory.id),
        breeder_id: ActiveValue::Set(inventory.breeder_id),
        amount_to_pay: ActiveValue::Set(request.amount_to_pay),
        amount_paid: ActiveValue::Set(request.amount_paid),
        currency: ActiveValue::Set(request.currency),
        method: ActiveValue::Set(request.method),
        payment_type: ActiveValue::Set(request.payment_type),
        status: ActiveValue::Set(status),
        description: ActiveValue::Set(request.description),
        paid_at: ActiveValue::Set(settlement_time(status, None)),
        ..Default::default()
    }
    .insert(&*db)
    .await?;

    info!(
        payment_id = model.id,
        inventory_id = inventory.id,
        status = ?model.status,
        "payment recorded"
    );

    Ok(Json(PaymentResponse {
        payment: model.into(),
        message: String::from("Payment created successfully"),
    }))
}

/// Payment update request.
///
/// Omitted fields are left unchanged. Status is derived again on every update.
#[derive(Deserialize, Validate, JsonSchema)]
pub(super) struct PaymentUpdateRequest {
    #[validate(range(min = 0.0))]
    #[schemars(example = "crate::schema::example_amount")]
    amount_to_pay: Option<f64>,

    #[validate(range(min = 0.0))]
    #[schemars(example = "crate::schema::example_amount")]
    amount_paid: Option<f64>,

    #[validate(regex = "crate::validation::CURRENCY_REGEX")]
    currency: Option<String>,

    #[serde(default, deserialize_with = "crate::validation::deserialize_present")]
    method: Option<Option<String>>,

    /// Status override, see [`PaymentCreationRequest::status`].
    status: Option<payment::PaymentStatus>,

    #[validate(length(max = 255))]
    description: Option<String>,
}

/// Generate OAPI documentation for the [`update`] handler.
pub(super) fn update_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Update payment amounts and status.")
        .response::<200, Json<PaymentResponse>>()
        .response_with::<404, Json<Value>, _>(|op| {
            op.description("Payment not found.")
                .example(example_error(PaymentManagementError::PaymentNotFound))
        })
}

/// Payment update handler.
pub(super) async fn update(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<PaymentUpdateRequest>,
) -> Result<Json<PaymentResponse>, PaymentManagementError> {
    let grant = session.authorize(Resource::Payment, Access::Write)?;

    db.transaction(|txn| {
        Box::pin(async move {
            let payment = payment::Entity::find_by_id(id)
                .one(txn)
                .await?
                .ok_or(PaymentManagementError::PaymentNotFound)?;

            authorize_inventory(txn, &grant, payment.event_inventory_id).await?;

            let amount_to_pay = request.amount_to_pay.unwrap_or(payment.amount_to_pay);
            let amount_paid = request.amount_paid.unwrap_or(payment.amount_paid);

            // Without a new override, a failed or refunded payment stays as is.
            let requested = request
                .status
                .or_else(|| payment.status.is_override().then_some(payment.status));
            let status = payment::derive_status(requested, amount_paid, amount_to_pay);
            let paid_at = settlement_time(status, payment.paid_at);

            let mut model: payment::ActiveModel = payment.into();

            model.amount_to_pay = ActiveValue::Set(amount_to_pay);
            model.amount_paid = ActiveValue::Set(amount_paid);
            model.status = ActiveValue::Set(status);
            model.paid_at = ActiveValue::Set(paid_at);

            if let Some(currency) = request.currency {
                model.currency = ActiveValue::Set(currency);
            }

            if let Some(method) = request.method {
                model.method = ActiveValue::Set(method);
            }

            if let Some(description) = request.description {
                model.description = ActiveValue::Set(Some(description));
            }

            let model = model.update(txn).await?;

            Ok(Json(PaymentResponse {
                payment: model.into(),
                message: String::from("Payment updated successfully"),
            }))
        })
    })
    .await
    .into_raw_result()
}

/// Generate OAPI documentation for the [`delete`] handler.
pub(super) fn delete_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Delete payment.")
        .response::<200, Json<MessageResponse>>()
        .response_with::<404, Json<Value>, _>(|op| {
            op.description("Payment not found.")
                .example(example_error(PaymentManagementError::PaymentNotFound))
        })
}

/// Payment deletion handler.
pub(super) async fn delete(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, PaymentManagementError> {
    let grant = session.authorize(Resource::Payment, Access::Write)?;

    let payment = payment::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or(PaymentManagementError::PaymentNotFound)?;

    authorize_inventory(&*db, &grant, payment.event_inventory_id).await?;

    payment::Entity::delete_by_id(id).exec(&*db).await?;

    Ok(Json(MessageResponse::new("Payment deleted successfully")))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_json::assert_json;
    use axum::http::StatusCode;
    use db::{payment, user::Role, EntityTrait};
    use serde_json::json;
    use tower::Service;

    use crate::testing::{
        authorized, authorized_json, create_database, create_inventory, create_payment,
        create_simple_event, create_user, test_router, ResponseBodyExt,
    };

    #[tokio::test]
    async fn status_is_derived() {
        let db = Arc::new(create_database().await);

        let (admin, token) = create_user(&db, Role::Admin).await;
        let (breeder, _) = create_user(&db, Role::Breeder).await;
        let event = create_simple_event(&db, admin.id).await;
        let inventory = create_inventory(&db, event.id, breeder.id, 5).await;

        let mut service = test_router(db.clone());

        let response = service
            .call(authorized_json(
                "POST",
                "/payments",
                &token,
                json!({
                    "event_inventory_id": inventory.id,
                    "amount_to_pay": 100.0,
                    "amount_paid": 40.0,
                    "status": "PAID",
                    "method": "cash",
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.json().await;
        let id = body["payment"]["id"].as_i64().unwrap();
        assert_eq!(body["payment"]["status"], "PARTIAL");
        assert_eq!(body["payment"]["currency"], "USD");
        assert_eq!(body["payment"]["breeder_id"], breeder.id);
        assert_eq!(body["payment"]["payment_type"], "OTHER");
        assert!(body["payment"]["paid_at"].is_null());

        let response = service
            .call(authorized_json(
                "PUT",
                &format!("/payments/{id}"),
                &token,
                json!({ "amount_paid": 100.0 }),
            ))
            .await
            .unwrap();

        let body = response.json().await;
        assert_eq!(body["payment"]["status"], "PAID");
        assert!(body["payment"]["paid_at"].is_i64());
        assert_eq!(body["payment"]["method"], "cash");

        let response = service
            .call(authorized_json(
                "PUT",
                &format!("/payments/{id}"),
                &token,
                json!({ "status": "REFUNDED", "method": null }),
            ))
            .await
            .unwrap();

        let body = response.json().await;
        assert_eq!(body["payment"]["status"], "REFUNDED");
        assert!(body["payment"]["method"].is_null());

        let response = service
            .call(authorized_json(
                "PUT",
                &format!("/payments/{id}"),
                &token,
                json!({ "amount_paid": 50.0 }),
            ))
            .await
            .unwrap();

        let body = response.json().await;
        assert_eq!(body["payment"]["status"], "REFUNDED");
    }

    #[tokio::test]
    async fn invalid_payments() {
        let db = Arc::new(create_database().await);

        let (admin, token) = create_user(&db, Role::Admin).await;
        let (breeder, breeder_token) = create_user(&db, Role::Breeder).await;
        let event = create_simple_event(&db, admin.id).await;
        let inventory = create_inventory(&db, event.id, breeder.id, 5).await;

        let mut service = test_router(db.clone());

        let response = service
            .call(authorized_json(
                "POST",
                "/payments",
                &token,
                json!({
                    "event_inventory_id": inventory.id,
                    "amount_to_pay": 10.0,
                    "currency": "usd",
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response = service
            .call(authorized_json(
                "POST",
                "/payments",
                &token,
                json!({ "event_inventory_id": 999, "amount_to_pay": 10.0 }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_json!(response.json().await, {
            "code": 404,
            "error": "event inventory not found",
        });

        let response = service
            .call(authorized_json(
                "POST",
                "/payments",
                &breeder_token,
                json!({ "event_inventory_id": inventory.id, "amount_to_pay": 10.0 }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn delete_payment() {
        let db = Arc::new(create_database().await);

        let (admin, token) = create_user(&db, Role::Admin).await;
        let (_, other_token) = create_user(&db, Role::Admin).await;
        let (breeder, _) = create_user(&db, Role::Breeder).await;
        let event = create_simple_event(&db, admin.id).await;
        let inventory = create_inventory(&db, event.id, breeder.id, 5).await;
        let payment = create_payment(&db, &inventory, 10.0).await;

        let mut service = test_router(db.clone());
        let uri = format!("/payments/{}", payment.id);

        let response = service
            .call(authorized("DELETE", &uri, &other_token))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = service
            .call(authorized("DELETE", &uri, &token))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(payment::Entity::find_by_id(payment.id)
            .one(&*db)
            .await
            .unwrap()
            .is_none());
    }
}
