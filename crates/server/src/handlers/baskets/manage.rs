use std::sync::Arc;

use aide::{transform::TransformOperation, OperationIo};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{
    basket, race_item, sea_query::Condition, ActiveModelTrait, ActiveValue, ColumnTrait,
    ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QuerySelect, SelectExt,
    TransactionErrorExt, TransactionTrait,
};
use derive_more::{Display, Error, From};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use super::{find_basket, find_race, owner_of, BasketResponse};
use crate::{
    auth::SessionContext,
    handlers::MessageResponse,
    policy::{Access, Forbidden, Resource},
    schema::example_error,
    validation::ValidatedJson,
};

#[derive(ErrorResponse, Display, From, Error, OperationIo)]
#[aide(output)]
pub(super) enum BasketManagementError {
    DatabaseError(DbErr),

    #[status(StatusCode::FORBIDDEN)]
    Forbidden(Forbidden),

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "basket not found")]
    BasketNotFound,

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "race not found")]
    RaceNotFound,

    #[status(StatusCode::CONFLICT)]
    #[display(fmt = "basket number is already used in the race")]
    DuplicateNumber,

    /// Birds are still placed into the basket.
    #[status(StatusCode::CONFLICT)]
    #[display(fmt = "basket still contains birds")]
    BasketInUse,
}

/// Check if a basket number is taken inside of a race.
async fn number_taken<C: ConnectionTrait + Send>(
    db: &C,
    race_id: i64,
    number: i32,
    is_race_basket: bool,
    exclude_id: Option<i64>,
) -> Result<bool, DbErr> {
    let mut query = basket::Entity::find()
        .select_only()
        .filter(basket::Column::RaceId.eq(race_id))
        .filter(basket::Column::Number.eq(number))
        .filter(basket::Column::IsRaceBasket.eq(is_race_basket));

    if let Some(id) = exclude_id {
        query = query.filter(basket::Column::Id.ne(id));
    }

    query.exists(db).await
}

/// Basket creation request.
#[derive(Deserialize, Validate, JsonSchema)]
pub(super) struct BasketCreationRequest {
    #[schemars(example = "crate::schema::example_database_identifier")]
    race_id: i64,

    #[validate(range(min = 1))]
    #[schemars(example = "crate::schema::example_basket_number")]
    number: i32,

    #[schemars(example = "crate::schema::example_basket_type")]
    basket_type: basket::BasketType,

    #[serde(default)]
    #[validate(range(min = 1))]
    capacity: Option<i32>,
}

/// Generate OAPI documentation for the [`create`] handler.
pub(super) fn create_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Create new basket.")
        .response::<200, Json<BasketResponse>>()
        .response_with::<409, Json<Value>, _>(|op| {
            op.description("Basket number is already used.")
                .example(example_error(BasketManagementError::DuplicateNumber))
        })
}

/// Basket creation handler.
pub(super) async fn create(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    ValidatedJson(request): ValidatedJson<BasketCreationRequest>,
) -> Result<Json<BasketResponse>, BasketManagementError> {
    let grant = session.authorize(Resource::Basket, Access::Write)?;
    let created_by = session.user_id();
    let is_race_basket = request.basket_type.is_race_basket();

    db.transaction(|txn| {
        Box::pin(async move {
            let (race, event) = find_race(txn, request.race_id)
                .await?
                .ok_or(BasketManagementError::RaceNotFound)?;

            grant.check(owner_of(&event))?;

            if number_taken(txn, race.id, request.number, is_race_basket, None).await? {
                return Err(BasketManagementError::DuplicateNumber);
            }

            let model = basket::ActiveModel {
                race_id: ActiveValue::Set(race.id),
                number: ActiveValue::Set(request.number),
                is_race_basket: ActiveValue::Set(is_race_basket),
                capacity: ActiveValue::Set(request.capacity),
                created_by: ActiveValue::Set(created_by),
                ..Default::default()
            }
            .insert(txn)
            .await?;

            Ok(Json(BasketResponse {
                basket: model.into(),
                message: String::from("Basket created successfully"),
            }))
        })
    })
    .await
    .into_raw_result()
}

/// Basket update request.
#[derive(Deserialize, Validate, JsonSchema)]
pub(super) struct BasketUpdateRequest {
    #[validate(range(min = 1))]
    #[schemars(example = "crate::schema::example_basket_number")]
    number: i32,

    #[serde(default)]
    #[validate(range(min = 1))]
    capacity: Option<i32>,
}

/// Generate OAPI documentation for the [`update`] handler.
pub(super) fn update_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Update basket number and capacity.")
        .response::<200, Json<BasketResponse>>()
        .response_with::<409, Json<Value>, _>(|op| {
            op.description("Basket number is already used.")
                .example(example_error(BasketManagementError::DuplicateNumber))
        })
}

/// Basket update handler.
pub(super) async fn update(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<BasketUpdateRequest>,
) -> Result<Json<BasketResponse>, BasketManagementError> {
    let grant = session.authorize(Resource::Basket, Access::Write)?;

    db.transaction(|txn| {
        Box::pin(async move {
            let (basket, event) = find_basket(txn, id)
                .await?
                .ok_or(BasketManagementError::BasketNotFound)?;

            grant.check(owner_of(&event))?;

            if number_taken(
                txn,
                basket.race_id,
                request.number,
                basket.is_race_basket,
                Some(basket.id),
            )
            .await?
            {
                return Err(BasketManagementError::DuplicateNumber);
            }

            let mut model: basket::ActiveModel = basket.into();
            model.number = ActiveValue::Set(request.number);
            model.capacity = ActiveValue::Set(request.capacity);
            let model = model.update(txn).await?;

            Ok(Json(BasketResponse {
                basket: model.into(),
                message: String::from("Basket updated successfully"),
            }))
        })
    })
    .await
    .into_raw_result()
}

/// Generate OAPI documentation for the [`delete`] handler.
pub(super) fn delete_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Delete basket.")
        .response::<200, Json<MessageResponse>>()
        .response_with::<409, Json<Value>, _>(|op| {
            op.description("Basket still contains birds.")
                .example(example_error(BasketManagementError::BasketInUse))
        })
}

/// Basket deletion handler.
pub(super) async fn delete(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, BasketManagementError> {
    let grant = session.authorize(Resource::Basket, Access::Write)?;

    db.transaction(|txn| {
        Box::pin(async move {
            let (_, event) = find_basket(txn, id)
                .await?
                .ok_or(BasketManagementError::BasketNotFound)?;

            grant.check(owner_of(&event))?;

            let in_use = race_item::Entity::find()
                .select_only()
                .filter(
                    Condition::any()
                        .add(race_item::Column::LoftBasketId.eq(id))
                        .add(race_item::Column::RaceBasketId.eq(id)),
                )
                .exists(txn)
                .await?;

            if in_use {
                return Err(BasketManagementError::BasketInUse);
            }

            basket::Entity::delete_by_id(id).exec(txn).await?;

            Ok(Json(MessageResponse::new("Basket deleted successfully")))
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
    use db::{race_item, user::Role, ActiveModelTrait, ActiveValue};
    use serde_json::json;
    use tower::Service;

    use crate::testing::{
        authorized, authorized_json, create_basket, create_bird, create_database, create_race,
        create_race_item, create_race_type, create_simple_event, create_user, test_router,
        ResponseBodyExt,
    };

    #[tokio::test]
    async fn numbers_are_unique_per_type() {
        let db = Arc::new(create_database().await);

        let (admin, token) = create_user(&db, Role::Admin).await;
        let race_type = create_race_type(&db, "Sprint").await;
        let event = create_simple_event(&db, admin.id).await;
        let race = create_race(&db, event.id, race_type.id, admin.id, false).await;

        let mut service = test_router(db.clone());

        let response = service
            .call(authorized_json(
                "POST",
                "/baskets",
                &token,
                json!({ "race_id": race.id, "number": 1, "basket_type": "race", "capacity": 20 }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.json().await;
        assert_eq!(body["basket"]["basket_type"], "race");
        assert_eq!(body["basket"]["capacity"], 20);

        let response = service
            .call(authorized_json(
                "POST",
                "/baskets",
                &token,
                json!({ "race_id": race.id, "number": 1, "basket_type": "race" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_json!(response.json().await, {
            "code": 409,
            "error": "basket number is already used in the race",
        });

        let response = service
            .call(authorized_json(
                "POST",
                "/baskets",
                &token,
                json!({ "race_id": race.id, "number": 1, "basket_type": "loft" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let loft_id = response.json().await["basket"]["id"].as_i64().unwrap();

        create_basket(&db, race.id, 2, false, admin.id).await;

        let response = service
            .call(authorized_json(
                "PUT",
                &format!("/baskets/{loft_id}"),
                &token,
                json!({ "number": 2 }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = service
            .call(authorized_json(
                "PUT",
                &format!("/baskets/{loft_id}"),
                &token,
                json!({ "number": 3 }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.json().await["basket"]["number"], 3);
    }

    #[tokio::test]
    async fn baskets_in_use() {
        let db = Arc::new(create_database().await);

        let (admin, token) = create_user(&db, Role::Admin).await;
        let (breeder, _) = create_user(&db, Role::Breeder).await;
        let race_type = create_race_type(&db, "Sprint").await;
        let event = create_simple_event(&db, admin.id).await;
        let race = create_race(&db, event.id, race_type.id, admin.id, false).await;
        let used = create_basket(&db, race.id, 1, false, admin.id).await;
        let empty = create_basket(&db, race.id, 2, false, admin.id).await;
        let bird = create_bird(&db, breeder.id, "00001").await;
        let item = create_race_item(&db, race.id, bird.id).await;

        race_item::ActiveModel {
            id: ActiveValue::Unchanged(item.id),
            loft_basket_id: ActiveValue::Set(Some(used.id)),
            is_loft_basketed: ActiveValue::Set(true),
            ..Default::default()
        }
        .update(&*db)
        .await
        .unwrap();

        let mut service = test_router(db.clone());

        let response = service
            .call(authorized("DELETE", &format!("/baskets/{}", used.id), &token))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = service
            .call(authorized("DELETE", &format!("/baskets/{}", empty.id), &token))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
