use std::sync::Arc;

use aide::{transform::TransformOperation, OperationIo};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{
    bird, event_inventory, event_inventory_item, fee_scheme, payment, perch_fee_item, race,
    race_item, sea_query::Expr, ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection,
    DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, QueryTrait,
    SelectExt, TransactionErrorExt, TransactionTrait,
};
use derive_more::{Display, Error, From};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::error::ComponentRange;
use tracing::info;
use validator::Validate;

use super::{find_inventory, owner_of, InventoryItemData};
use crate::{
    auth::SessionContext,
    handlers::{
        birds::{insert_bird, BirdCreationRequest, BirdData, ForeignTeam, IdentityConflict},
        payments::PaymentData,
        MessageResponse,
    },
    policy::{Access, Forbidden, Resource},
    schema::example_error,
    validation::ValidatedJson,
};

/// Inventory has no free slots left.
#[derive(Debug, Display, Error)]
#[display(fmt = "inventory is full: {reserved} of {reserved} birds registered")]
pub(super) struct CapacityError {
    reserved: i32,
}

#[derive(ErrorResponse, Display, From, Error, OperationIo)]
#[aide(output)]
pub(super) enum InventoryItemError {
    DatabaseError(DbErr),

    #[status(StatusCode::FORBIDDEN)]
    Forbidden(Forbidden),

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "event inventory not found")]
    InventoryNotFound,

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "event inventory item not found")]
    ItemNotFound,

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "bird not found")]
    BirdNotFound,

    /// Fee scheme of the event is missing.
    #[display(fmt = "event fee scheme not found")]
    FeeSchemeNotFound,

    #[status(StatusCode::BAD_REQUEST)]
    #[display(fmt = "either bird_id or bird must be provided")]
    BirdSelection,

    #[status(StatusCode::BAD_REQUEST)]
    #[display(fmt = "bird does not belong to the inventory breeder")]
    ForeignBird,

    #[status(StatusCode::BAD_REQUEST)]
    ForeignTeam(ForeignTeam),

    #[status(StatusCode::BAD_REQUEST)]
    InventoryFull(CapacityError),

    #[status(StatusCode::BAD_REQUEST)]
    #[display(fmt = "invalid timestamp: {_0}")]
    InvalidTimestamp(ComponentRange),

    #[status(StatusCode::CONFLICT)]
    #[display(fmt = "bird is already registered for the event")]
    AlreadyRegistered,

    #[status(StatusCode::CONFLICT)]
    Conflict(IdentityConflict),

    /// Bird takes part in a race of the event.
    #[status(StatusCode::CONFLICT)]
    #[display(fmt = "bird is enrolled in a race of the event")]
    BirdRacing,
}

/// Inventory item together with the registered bird.
#[derive(Serialize, JsonSchema)]
pub(super) struct InventoryItemWithBird {
    #[serde(flatten)]
    item: InventoryItemData,

    bird: Option<BirdData>,
}

/// Generate OAPI documentation for the [`list`] handler.
pub(super) fn list_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get birds registered in an event inventory.")
        .response::<200, Json<Vec<InventoryItemWithBird>>>()
        .response_with::<404, Json<Value>, _>(|op| {
            op.description("Event inventory not found.")
                .example(example_error(InventoryItemError::InventoryNotFound))
        })
}

/// Inventory item list request handler.
pub(super) async fn list(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<InventoryItemWithBird>>, InventoryItemError> {
    let grant = session.authorize(Resource::EventInventory, Access::Read)?;

    let (inventory, event) = find_inventory(&*db, id)
        .await?
        .ok_or(InventoryItemError::InventoryNotFound)?;

    grant.check(owner_of(&inventory, &event))?;

    let items = event_inventory_item::Entity::find()
        .find_also_related(bird::Entity)
        .filter(event_inventory_item::Column::EventInventoryId.eq(id))
        .order_by_asc(event_inventory_item::Column::Id)
        .all(&*db)
        .await?;

    Ok(Json(
        items
            .into_iter()
            .map(|(item, bird)| InventoryItemWithBird {
                item: item.into(),
                bird: bird.map(BirdData::from),
            })
            .collect(),
    ))
}

/// Bird registration request.
///
/// Either an existing bird or a new one has to be provided.
#[derive(Deserialize, Validate, JsonSchema)]
pub(super) struct InventoryItemCreationRequest {
    /// Existing bird of the inventory breeder.
    #[serde(default)]
    #[schemars(example = "crate::schema::example_optional_database_identifier")]
    bird_id: Option<i64>,

    /// New bird to register for the inventory breeder.
    #[serde(default)]
    #[validate]
    bird: Option<BirdCreationRequest>,

    #[serde(default)]
    is_backup: bool,

    #[serde(default)]
    bet_standard: bool,

    #[serde(default)]
    bet_show_low: bool,

    #[serde(default)]
    bet_show_mid: bool,

    #[serde(default)]
    bet_show_high: bool,

    #[serde(default)]
    bet_winner_takes_all: bool,
}

/// Bird registration response.
#[derive(Serialize, JsonSchema)]
pub(super) struct InventoryItemCreationResponse {
    item: InventoryItemData,

    bird: BirdData,

    /// Fee payments derived from the event fee scheme.
    payments: Vec<PaymentData>,

    #[schemars(example = "crate::schema::example_message")]
    message: String,
}

/// Pending fee payment for the inventory breeder.
fn fee_payment(
    inventory: &event_inventory::Model,
    payment_type: payment::PaymentType,
    amount: f64,
    description: String,
) -> payment::ActiveModel {
    payment::ActiveModel {
        event_inventory_id: ActiveValue::Set(inventory.id),
        breeder_id: ActiveValue::Set(inventory.breeder_id),
        amount_to_pay: ActiveValue::Set(amount),
        amount_paid: ActiveValue::Set(0.0),
        currency: ActiveValue::Set(String::from(payment::DEFAULT_CURRENCY)),
        method: ActiveValue::Set(None),
        payment_type: ActiveValue::Set(payment_type),
        status: ActiveValue::Set(payment::PaymentStatus::Pending),
        description: ActiveValue::Set(Some(description)),
        paid_at: ActiveValue::Set(None),
        ..Default::default()
    }
}

/// Generate OAPI documentation for the [`add`] handler.
pub(super) fn add_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Register bird in an event inventory.")
        .description(
            "Registration creates pending perch fee and bird fee payments \
            according to the fee scheme of the event.",
        )
        .response::<200, Json<InventoryItemCreationResponse>>()
        .response_with::<400, Json<Value>, _>(|op| {
            op.description("Inventory is full.")
                .example(example_error(InventoryItemError::InventoryFull(
                    CapacityError { reserved: 10 },
                )))
        })
        .response_with::<409, Json<Value>, _>(|op| {
            op.description("Bird is already registered for the event.")
                .example(example_error(InventoryItemError::AlreadyRegistered))
        })
}

/// Bird registration handler.
pub(super) async fn add(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<InventoryItemCreationRequest>,
) -> Result<Json<InventoryItemCreationResponse>, InventoryItemError> {
    let grant = session.authorize(Resource::EventInventory, Access::Write)?;

    db.transaction(|txn| {
        Box::pin(async move {
            let (inventory, event) = find_inventory(txn, id)
                .await?
                .ok_or(InventoryItemError::InventoryNotFound)?;

            grant.check(owner_of(&inventory, &event))?;

            let bird = match (request.bird_id, request.bird) {
                (Some(bird_id), None) => {
                    let bird = bird::Entity::find_by_id(bird_id)
                        .one(txn)
                        .await?
                        .ok_or(InventoryItemError::BirdNotFound)?;

                    if bird.breeder_id != inventory.breeder_id {
                        return Err(InventoryItemError::ForeignBird);
                    }

                    let already_registered = event_inventory_item::Entity::find()
                        .select_only()
                        .filter(event_inventory_item::Column::EventId.eq(event.id))
                        .filter(event_inventory_item::Column::BirdId.eq(bird.id))
                        .exists(txn)
                        .await?;

                    if already_registered {
                        return Err(InventoryItemError::AlreadyRegistered);
                    }

                    bird
                }
                (None, Some(new_bird)) => {
                    insert_bird::<_, InventoryItemError>(txn, inventory.breeder_id, new_bird)
                        .await?
                }
                _ => return Err(InventoryItemError::BirdSelection),
            };

            let reserved = event_inventory::Entity::update_many()
                .col_expr(
                    event_inventory::Column::RegisteredBirds,
                    Expr::col(event_inventory::Column::RegisteredBirds).add(1),
                )
                .filter(event_inventory::Column::Id.eq(inventory.id))
                .filter(
                    Expr::col(event_inventory::Column::RegisteredBirds)
                        .lt(Expr::col(event_inventory::Column::ReservedBirds)),
                )
                .exec(txn)
                .await?;

            if reserved.rows_affected == 0 {
                return Err(InventoryItemError::InventoryFull(CapacityError {
                    reserved: inventory.reserved_birds,
                }));
            }

            let item = event_inventory_item::ActiveModel {
                event_inventory_id: ActiveValue::Set(inventory.id),
                event_id: ActiveValue::Set(event.id),
                bird_id: ActiveValue::Set(bird.id),
                is_backup: ActiveValue::Set(request.is_backup),
                bet_standard: ActiveValue::Set(request.bet_standard),
                bet_show_low: ActiveValue::Set(request.bet_show_low),
                bet_show_mid: ActiveValue::Set(request.bet_show_mid),
                bet_show_high: ActiveValue::Set(request.bet_show_high),
                bet_winner_takes_all: ActiveValue::Set(request.bet_winner_takes_all),
                ..Default::default()
            }
            .insert(txn)
            .await?;

            let fee_scheme = fee_scheme::Entity::find_by_id(event.fee_scheme_id)
                .one(txn)
                .await?
                .ok_or(InventoryItemError::FeeSchemeNotFound)?;

            // Sequence number of the new bird, counting the new item itself.
            let bird_no = event_inventory_item::Entity::find()
                .filter(event_inventory_item::Column::EventInventoryId.eq(inventory.id))
                .count(txn)
                .await?;
            let bird_no = i32::try_from(bird_no).unwrap_or(i32::MAX);

            let mut payments = Vec::new();

            if fee_scheme.perch_fee > 0.0 {
                let perch_fee = fee_payment(
                    &inventory,
                    payment::PaymentType::PerchFee,
                    fee_scheme.perch_fee,
                    String::from("Perch fee"),
                )
                .insert(txn)
                .await?;

                payments.push(perch_fee);
            }

            let bird_fee = perch_fee_item::Entity::find()
                .filter(perch_fee_item::Column::FeeSchemeId.eq(fee_scheme.id))
                .filter(perch_fee_item::Column::BirdNo.eq(bird_no))
                .one(txn)
                .await?;

            if let Some(bird_fee) = bird_fee {
                let bird_fee = fee_payment(
                    &inventory,
                    payment::PaymentType::BirdFee,
                    bird_fee.fee,
                    format!("Fee for bird #{bird_no}"),
                )
                .insert(txn)
                .await?;

                payments.push(bird_fee);
            }

            info!(
                event_id = event.id,
                inventory_id = inventory.id,
                bird_id = bird.id,
                bird_no,
                payments = payments.len(),
                "bird registered for an event"
            );

            Ok(Json(InventoryItemCreationResponse {
                item: item.into(),
                bird: bird.into(),
                payments: payments.into_iter().map(PaymentData::from).collect(),
                message: String::from("Bird added to inventory successfully"),
            }))
        })
    })
    .await
    .into_raw_result()
}

/// Inventory item update request.
///
/// Omitted fields are left unchanged, times can be cleared with an explicit `null`.
#[derive(Deserialize, Validate, JsonSchema)]
pub(super) struct InventoryItemUpdateRequest {
    is_backup: Option<bool>,

    bet_standard: Option<bool>,

    bet_show_low: Option<bool>,

    bet_show_mid: Option<bool>,

    bet_show_high: Option<bool>,

    bet_winner_takes_all: Option<bool>,

    /// Loft arrival time as a UNIX timestamp.
    #[serde(default, deserialize_with = "crate::validation::deserialize_present")]
    #[schemars(example = "crate::schema::example_optional_timestamp")]
    arrived_at: Option<Option<i64>>,

    /// Loft departure time as a UNIX timestamp.
    #[serde(default, deserialize_with = "crate::validation::deserialize_present")]
    #[schemars(example = "crate::schema::example_optional_timestamp")]
    departed_at: Option<Option<i64>>,
}

/// Inventory item mutation response.
#[derive(Serialize, JsonSchema)]
pub(super) struct InventoryItemResponse {
    item: InventoryItemData,

    #[schemars(example = "crate::schema::example_message")]
    message: String,
}

/// Generate OAPI documentation for the [`update`] handler.
pub(super) fn update_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Update registered bird flags and loft times.")
        .response::<200, Json<InventoryItemResponse>>()
        .response_with::<404, Json<Value>, _>(|op| {
            op.description("Event inventory item not found.")
                .example(example_error(InventoryItemError::ItemNotFound))
        })
}

/// Inventory item update handler.
pub(super) async fn update(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(item_id): Path<i64>,
    ValidatedJson(request): ValidatedJson<InventoryItemUpdateRequest>,
) -> Result<Json<InventoryItemResponse>, InventoryItemError> {
    let grant = session.authorize(Resource::EventInventory, Access::Write)?;

    let arrived_at = request
        .arrived_at
        .map(|value| value.map(db::from_unix_timestamp).transpose())
        .transpose()?;
    let departed_at = request
        .departed_at
        .map(|value| value.map(db::from_unix_timestamp).transpose())
        .transpose()?;

    db.transaction(|txn| {
        Box::pin(async move {
            let item = event_inventory_item::Entity::find_by_id(item_id)
                .one(txn)
                .await?
                .ok_or(InventoryItemError::ItemNotFound)?;

            let (inventory, event) = find_inventory(txn, item.event_inventory_id)
                .await?
                .ok_or(InventoryItemError::InventoryNotFound)?;

            grant.check(owner_of(&inventory, &event))?;

            let mut item: event_inventory_item::ActiveModel = item.into();

            let flags = [
                (&mut item.is_backup, request.is_backup),
                (&mut item.bet_standard, request.bet_standard),
                (&mut item.bet_show_low, request.bet_show_low),
                (&mut item.bet_show_mid, request.bet_show_mid),
                (&mut item.bet_show_high, request.bet_show_high),
                (&mut item.bet_winner_takes_all, request.bet_winner_takes_all),
            ];

            for (field, value) in flags {
                if let Some(value) = value {
                    *field = ActiveValue::Set(value);
                }
            }

            if let Some(arrived_at) = arrived_at {
                item.arrived_at = ActiveValue::Set(arrived_at);
            }

            if let Some(departed_at) = departed_at {
                item.departed_at = ActiveValue::Set(departed_at);
            }

            let item = item.update(txn).await?;

            Ok(Json(InventoryItemResponse {
                item: item.into(),
                message: String::from("Inventory item updated successfully"),
            }))
        })
    })
    .await
    .into_raw_result()
}

/// Generate OAPI documentation for the [`remove`] handler.
pub(super) fn remove_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Remove bird from an event inventory.")
        .description("Fee payments created during registration are kept.")
        .response::<200, Json<MessageResponse>>()
        .response_with::<409, Json<Value>, _>(|op| {
            op.description("Bird is enrolled in a race of the event.")
                .example(example_error(InventoryItemError::BirdRacing))
        })
}

/// Inventory item removal handler.
pub(super) async fn remove(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(item_id): Path<i64>,
) -> Result<Json<MessageResponse>, InventoryItemError> {
    let grant = session.authorize(Resource::EventInventory, Access::Write)?;

    db.transaction(|txn| {
        Box::pin(async move {
            let item = event_inventory_item::Entity::find_by_id(item_id)
                .one(txn)
                .await?
                .ok_or(InventoryItemError::ItemNotFound)?;

            let (inventory, event) = find_inventory(txn, item.event_inventory_id)
                .await?
                .ok_or(InventoryItemError::InventoryNotFound)?;

            grant.check(owner_of(&inventory, &event))?;

            let racing = race_item::Entity::find()
                .select_only()
                .filter(race_item::Column::BirdId.eq(item.bird_id))
                .filter(
                    race_item::Column::RaceId.in_subquery(
                        race::Entity::find()
                            .select_only()
                            .column(race::Column::Id)
                            .filter(race::Column::EventId.eq(event.id))
                            .into_query(),
                    ),
                )
                .exists(txn)
                .await?;

            if racing {
                return Err(InventoryItemError::BirdRacing);
            }

            event_inventory_item::Entity::delete_by_id(item_id)
                .exec(txn)
                .await?;

            event_inventory::Entity::update_many()
                .col_expr(
                    event_inventory::Column::RegisteredBirds,
                    Expr::col(event_inventory::Column::RegisteredBirds).sub(1),
                )
                .filter(event_inventory::Column::Id.eq(inventory.id))
                .filter(event_inventory::Column::RegisteredBirds.gt(0))
                .exec(txn)
                .await?;

            Ok(Json(MessageResponse::new(
                "Bird removed from inventory successfully",
            )))
        })
    })
    .await
    .into_raw_result()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_json::assert_json;
    use axum::http::StatusCode;
    use db::{event_inventory, payment, user::Role, EntityTrait};
    use serde_json::json;
    use tower::Service;

    use crate::testing::{
        authorized, authorized_json, create_bird, create_database, create_event,
        create_fee_scheme, create_inventory, create_prize_scheme, create_race,
        create_race_item, create_race_type, create_simple_event, create_user, register_bird,
        test_router, ResponseBodyExt,
    };

    #[tokio::test]
    async fn first_bird_fee() {
        let db = Arc::new(create_database().await);

        let (admin, _) = create_user(&db, Role::Admin).await;
        let (breeder, token) = create_user(&db, Role::Breeder).await;
        let fees = create_fee_scheme(&db, admin.id, 0.0, &[(1, 10.0)]).await;
        let prizes = create_prize_scheme(&db, admin.id, &[]).await;
        let event = create_event(&db, admin.id, fees.id, prizes.id).await;
        let inventory = create_inventory(&db, event.id, breeder.id, 5).await;
        let bird = create_bird(&db, breeder.id, "00001").await;

        let mut service = test_router(db.clone());

        let response = service
            .call(authorized_json(
                "POST",
                &format!("/eventInventories/{}/items", inventory.id),
                &token,
                json!({ "bird_id": bird.id, "bet_standard": true }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.json().await;
        assert_eq!(body["item"]["bird_id"], bird.id);
        assert_eq!(body["item"]["bet_standard"], true);
        assert_eq!(body["payments"].as_array().unwrap().len(), 1);
        assert_eq!(body["payments"][0]["payment_type"], "BIRD_FEE");
        assert_eq!(body["payments"][0]["amount_to_pay"], 10.0);
        assert_eq!(body["payments"][0]["amount_paid"], 0.0);
        assert_eq!(body["payments"][0]["status"], "PENDING");
        assert_eq!(body["payments"][0]["breeder_id"], breeder.id);

        let stored = payment::Entity::find().all(&*db).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].status, payment::PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn perch_fee_for_every_bird() {
        let db = Arc::new(create_database().await);

        let (admin, token) = create_user(&db, Role::Admin).await;
        let (breeder, _) = create_user(&db, Role::Breeder).await;
        let fees = create_fee_scheme(&db, admin.id, 25.0, &[(1, 10.0)]).await;
        let prizes = create_prize_scheme(&db, admin.id, &[]).await;
        let event = create_event(&db, admin.id, fees.id, prizes.id).await;
        let inventory = create_inventory(&db, event.id, breeder.id, 5).await;

        let first = create_bird(&db, breeder.id, "00001").await;
        let second = create_bird(&db, breeder.id, "00002").await;

        let mut service = test_router(db.clone());
        let uri = format!("/eventInventories/{}/items", inventory.id);

        let response = service
            .call(authorized_json(
                "POST",
                &uri,
                &token,
                json!({ "bird_id": first.id }),
            ))
            .await
            .unwrap();

        let body = response.json().await;
        assert_eq!(body["payments"].as_array().unwrap().len(), 2);
        assert_eq!(body["payments"][0]["payment_type"], "PERCH_FEE");
        assert_eq!(body["payments"][0]["amount_to_pay"], 25.0);

        let response = service
            .call(authorized_json(
                "POST",
                &uri,
                &token,
                json!({ "bird_id": second.id }),
            ))
            .await
            .unwrap();

        let body = response.json().await;
        assert_eq!(body["payments"].as_array().unwrap().len(), 1);
        assert_eq!(body["payments"][0]["payment_type"], "PERCH_FEE");
    }

    #[tokio::test]
    async fn capacity_is_enforced() {
        let db = Arc::new(create_database().await);

        let (admin, _) = create_user(&db, Role::Admin).await;
        let (breeder, token) = create_user(&db, Role::Breeder).await;
        let event = create_simple_event(&db, admin.id).await;
        let inventory = create_inventory(&db, event.id, breeder.id, 1).await;

        let first = create_bird(&db, breeder.id, "00001").await;
        let second = create_bird(&db, breeder.id, "00002").await;

        let mut service = test_router(db.clone());
        let uri = format!("/eventInventories/{}/items", inventory.id);

        let response = service
            .call(authorized_json(
                "POST",
                &uri,
                &token,
                json!({ "bird_id": first.id }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let response = service
            .call(authorized_json(
                "POST",
                &uri,
                &token,
                json!({ "bird_id": second.id }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_json!(response.json().await, {
            "code": 400,
            "error": "inventory is full: 1 of 1 birds registered",
        });

        let stored = event_inventory::Entity::find_by_id(inventory.id)
            .one(&*db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.registered_birds, 1);

        let response = service.call(authorized("GET", &uri, &token)).await.unwrap();

        let body = response.json().await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["bird"]["id"], first.id);
    }

    #[tokio::test]
    async fn inline_bird_registration() {
        let db = Arc::new(create_database().await);

        let (admin, _) = create_user(&db, Role::Admin).await;
        let (breeder, token) = create_user(&db, Role::Breeder).await;
        let event = create_simple_event(&db, admin.id).await;
        let inventory = create_inventory(&db, event.id, breeder.id, 5).await;

        let mut service = test_router(db.clone());
        let uri = format!("/eventInventories/{}/items", inventory.id);

        let response = service
            .call(authorized_json(
                "POST",
                &uri,
                &token,
                json!({
                    "bird": {
                        "band_country": "PHA",
                        "band_year": "2024",
                        "band_club": "MNL",
                        "band_serial": "07777",
                    },
                    "is_backup": true,
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.json().await;
        assert_eq!(body["bird"]["band"], "PHA-2024-MNL-07777");
        assert_eq!(body["bird"]["breeder_id"], breeder.id);
        assert_eq!(body["item"]["is_backup"], true);

        let response = service
            .call(authorized_json("POST", &uri, &token, json!({})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn duplicate_and_foreign_birds() {
        let db = Arc::new(create_database().await);

        let (admin, _) = create_user(&db, Role::Admin).await;
        let (breeder, token) = create_user(&db, Role::Breeder).await;
        let (other, _) = create_user(&db, Role::Breeder).await;
        let event = create_simple_event(&db, admin.id).await;
        let inventory = create_inventory(&db, event.id, breeder.id, 5).await;

        let bird = create_bird(&db, breeder.id, "00001").await;
        let foreign = create_bird(&db, other.id, "00002").await;
        register_bird(&db, &inventory, bird.id).await;

        let mut service = test_router(db.clone());
        let uri = format!("/eventInventories/{}/items", inventory.id);

        let response = service
            .call(authorized_json("POST", &uri, &token, json!({ "bird_id": bird.id })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = service
            .call(authorized_json(
                "POST",
                &uri,
                &token,
                json!({ "bird_id": foreign.id }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_and_remove_items() {
        let db = Arc::new(create_database().await);

        let (admin, _) = create_user(&db, Role::Admin).await;
        let (breeder, token) = create_user(&db, Role::Breeder).await;
        let event = create_simple_event(&db, admin.id).await;
        let inventory = create_inventory(&db, event.id, breeder.id, 5).await;

        let free = create_bird(&db, breeder.id, "00001").await;
        let racing = create_bird(&db, breeder.id, "00002").await;
        let free_item = register_bird(&db, &inventory, free.id).await;
        let racing_item = register_bird(&db, &inventory, racing.id).await;

        let race_type = create_race_type(&db, "Sprint").await;
        let race = create_race(&db, event.id, race_type.id, admin.id, false).await;
        create_race_item(&db, race.id, racing.id).await;

        let mut service = test_router(db.clone());

        let response = service
            .call(authorized_json(
                "PUT",
                &format!("/eventInventories/items/{}", free_item.id),
                &token,
                json!({ "arrived_at": 1709294400, "bet_show_high": true }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.json().await;
        assert_eq!(body["item"]["arrived_at"], 1709294400);
        assert_eq!(body["item"]["bet_show_high"], true);
        assert_eq!(body["item"]["departed_at"], serde_json::Value::Null);

        let response = service
            .call(authorized(
                "DELETE",
                &format!("/eventInventories/items/{}", racing_item.id),
                &token,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = service
            .call(authorized(
                "DELETE",
                &format!("/eventInventories/items/{}", free_item.id),
                &token,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let stored = event_inventory::Entity::find_by_id(inventory.id)
            .one(&*db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.registered_birds, 1);
    }
}
