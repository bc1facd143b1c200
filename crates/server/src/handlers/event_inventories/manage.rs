use std::sync::Arc;

use aide::{transform::TransformOperation, OperationIo};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{
    event, event_inventory, payment, user, ActiveModelTrait, ActiveValue, ColumnTrait,
    ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QuerySelect, SelectExt,
    TransactionErrorExt, TransactionTrait,
};
use derive_more::{Display, Error, From};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;
use validator::Validate;

use super::{find_inventory, owner_of, InventoryResponse};
use crate::{
    auth::SessionContext,
    handlers::MessageResponse,
    policy::{Access, Forbidden, Owner, Resource},
    schema::example_error,
    validation::ValidatedJson,
};

#[derive(ErrorResponse, Display, From, Error, OperationIo)]
#[aide(output)]
pub(super) enum InventoryManagementError {
    DatabaseError(DbErr),

    #[status(StatusCode::FORBIDDEN)]
    Forbidden(Forbidden),

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "event inventory not found")]
    InventoryNotFound,

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "event not found")]
    EventNotFound,

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "breeder not found")]
    BreederNotFound,

    #[status(StatusCode::BAD_REQUEST)]
    #[display(fmt = "event is not open for registration")]
    EventClosed,

    /// Reserved slot count is lower than the number of registered birds.
    #[status(StatusCode::BAD_REQUEST)]
    #[display(fmt = "reserved birds can not be lower than registered birds")]
    BelowRegistered,

    #[status(StatusCode::CONFLICT)]
    #[display(fmt = "breeder is already registered for the event")]
    AlreadyRegistered,

    #[status(StatusCode::CONFLICT)]
    #[display(fmt = "event inventory still has registered birds or payments")]
    InventoryNotEmpty,
}

/// Event inventory creation request.
#[derive(Deserialize, Validate, JsonSchema)]
pub(super) struct InventoryCreationRequest {
    #[schemars(example = "crate::schema::example_database_identifier")]
    event_id: i64,

    /// Registered breeder, defaults to the current user.
    #[serde(default)]
    #[schemars(example = "crate::schema::example_optional_database_identifier")]
    breeder_id: Option<i64>,

    #[validate(range(min = 1))]
    #[schemars(example = "crate::schema::example_reserved_birds")]
    reserved_birds: i32,
}

/// Generate OAPI documentation for the [`create`] handler.
pub(super) fn create_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Register breeder for an event.")
        .response::<200, Json<InventoryResponse>>()
        .response_with::<400, Json<Value>, _>(|op| {
            op.description("Event is not open for registration.")
                .example(example_error(InventoryManagementError::EventClosed))
        })
        .response_with::<409, Json<Value>, _>(|op| {
            op.description("Breeder is already registered for the event.")
                .example(example_error(InventoryManagementError::AlreadyRegistered))
        })
}

/// Event inventory creation handler.
pub(super) async fn create(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    ValidatedJson(request): ValidatedJson<InventoryCreationRequest>,
) -> Result<Json<InventoryResponse>, InventoryManagementError> {
    let grant = session.authorize(Resource::EventInventory, Access::Write)?;
    let breeder_id = request.breeder_id.unwrap_or(session.user_id());

    db.transaction(|txn| {
        Box::pin(async move {
            let event = event::Entity::find_by_id(request.event_id)
                .one(txn)
                .await?
                .ok_or(InventoryManagementError::EventNotFound)?;

            grant.check(Owner::both(breeder_id, event.created_by))?;

            if !event.is_open {
                return Err(InventoryManagementError::EventClosed);
            }

            let breeder_exists = user::Entity::find_by_id(breeder_id)
                .select_only()
                .exists(txn)
                .await?;

            if !breeder_exists {
                return Err(InventoryManagementError::BreederNotFound);
            }

            let already_registered = event_inventory::Entity::find()
                .select_only()
                .filter(event_inventory::Column::EventId.eq(event.id))
                .filter(event_inventory::Column::BreederId.eq(breeder_id))
                .exists(txn)
                .await?;

            if already_registered {
                return Err(InventoryManagementError::AlreadyRegistered);
            }

            let model = event_inventory::ActiveModel {
                event_id: ActiveValue::Set(event.id),
                breeder_id: ActiveValue::Set(breeder_id),
                reserved_birds: ActiveValue::Set(request.reserved_birds),
                registered_birds: ActiveValue::Set(0),
                ..Default::default()
            }
            .insert(txn)
            .await?;

            info!(
                event_id = event.id,
                breeder_id,
                reserved_birds = model.reserved_birds,
                "breeder registered for an event"
            );

            Ok(Json(InventoryResponse {
                event_inventory: model.into(),
                message: String::from("Event inventory created successfully"),
            }))
        })
    })
    .await
    .into_raw_result()
}

/// Event inventory update request.
#[derive(Deserialize, Validate, JsonSchema)]
pub(super) struct InventoryUpdateRequest {
    #[validate(range(min = 1))]
    #[schemars(example = "crate::schema::example_reserved_birds")]
    reserved_birds: i32,
}

/// Generate OAPI documentation for the [`update`] handler.
pub(super) fn update_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Change number of reserved birds.")
        .response::<200, Json<InventoryResponse>>()
        .response_with::<400, Json<Value>, _>(|op| {
            op.description("Reserved birds are lower than registered birds.")
                .example(example_error(InventoryManagementError::BelowRegistered))
        })
}

/// Set the inventory capacity, unless more birds are already registered.
///
/// Returns `false` when the capacity was left unchanged.
async fn resize<C: ConnectionTrait>(db: &C, id: i64, reserved_birds: i32) -> Result<bool, DbErr> {
    let updated = event_inventory::Entity::update_many()
        .col_expr(event_inventory::Column::ReservedBirds, reserved_birds.into())
        .filter(event_inventory::Column::Id.eq(id))
        .filter(event_inventory::Column::RegisteredBirds.lte(reserved_birds))
        .exec(db)
        .await?
        .rows_affected;

    Ok(updated > 0)
}

/// Event inventory update handler.
pub(super) async fn update(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<InventoryUpdateRequest>,
) -> Result<Json<InventoryResponse>, InventoryManagementError> {
    let grant = session.authorize(Resource::EventInventory, Access::Write)?;

    db.transaction(|txn| {
        Box::pin(async move {
            let (inventory, event) = find_inventory(txn, id)
                .await?
                .ok_or(InventoryManagementError::InventoryNotFound)?;

            grant.check(owner_of(&inventory, &event))?;

            if !resize(txn, inventory.id, request.reserved_birds).await? {
                return Err(InventoryManagementError::BelowRegistered);
            }

            let model = event_inventory::Entity::find_by_id(inventory.id)
                .one(txn)
                .await?
                .ok_or(InventoryManagementError::InventoryNotFound)?;

            Ok(Json(InventoryResponse {
                event_inventory: model.into(),
                message: String::from("Event inventory updated successfully"),
            }))
        })
    })
    .await
    .into_raw_result()
}

/// Generate OAPI documentation for the [`delete`] handler.
pub(super) fn delete_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Delete event inventory.")
        .description("Only inventories without registered birds and payments can be deleted.")
        .response::<200, Json<MessageResponse>>()
        .response_with::<409, Json<Value>, _>(|op| {
            op.description("Event inventory is not empty.")
                .example(example_error(InventoryManagementError::InventoryNotEmpty))
        })
}

/// Event inventory deletion handler.
pub(super) async fn delete(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, InventoryManagementError> {
    let grant = session.authorize(Resource::EventInventory, Access::Write)?;

    db.transaction(|txn| {
        Box::pin(async move {
            let (inventory, event) = find_inventory(txn, id)
                .await?
                .ok_or(InventoryManagementError::InventoryNotFound)?;

            grant.check(owner_of(&inventory, &event))?;

            let has_payments = payment::Entity::find()
                .select_only()
                .filter(payment::Column::EventInventoryId.eq(id))
                .exists(txn)
                .await?;

            if inventory.registered_birds > 0 || has_payments {
                return Err(InventoryManagementError::InventoryNotEmpty);
            }

            event_inventory::Entity::delete_by_id(id).exec(txn).await?;

            Ok(Json(MessageResponse::new(
                "Event inventory deleted successfully",
            )))
        })
    })
    .await
    .into_raw_result()
}
