use std::{collections::BTreeSet, sync::Arc};

use aide::{transform::TransformOperation, OperationIo};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{
    basket::BasketType, race_item, sea_query::SimpleExpr, ColumnTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QuerySelect, TransactionErrorExt, TransactionTrait,
};
use derive_more::{Display, Error, From};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use validator::Validate;

use super::{find_basket, owner_of};
use crate::{
    auth::SessionContext,
    policy::{Access, Forbidden, Resource},
    schema::example_error,
    validation::ValidatedJson,
};

/// Requested race items that do not exist.
#[derive(Debug, Display, Error)]
#[display(fmt = "race items not found: {ids:?}")]
pub(super) struct MissingItems {
    ids: Vec<i64>,
}

/// Requested race items that belong to another race.
#[derive(Debug, Display, Error)]
#[display(fmt = "race items do not belong to the basket race: {ids:?}")]
pub(super) struct ForeignItems {
    ids: Vec<i64>,
}

#[derive(ErrorResponse, Display, From, Error, OperationIo)]
#[aide(output)]
pub(super) enum BasketAssignmentError {
    DatabaseError(DbErr),

    #[status(StatusCode::FORBIDDEN)]
    Forbidden(Forbidden),

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "basket not found")]
    BasketNotFound,

    #[status(StatusCode::BAD_REQUEST)]
    #[display(fmt = "basket type does not match")]
    TypeMismatch,

    #[status(StatusCode::NOT_FOUND)]
    MissingItems(MissingItems),

    #[status(StatusCode::BAD_REQUEST)]
    ForeignItems(ForeignItems),
}

/// Basket assignment request.
#[derive(Deserialize, Validate, JsonSchema)]
pub(super) struct BasketAssignmentRequest {
    #[validate(length(min = 1, max = 1000))]
    race_item_ids: Vec<i64>,

    #[schemars(example = "crate::schema::example_basket_type")]
    basket_type: BasketType,
}

#[derive(Serialize, JsonSchema)]
pub(super) struct BasketAssignmentResponse {
    /// Number of updated race items.
    updated: u64,

    #[schemars(example = "crate::schema::example_message")]
    message: String,
}

/// Columns written by an assignment of the provided basket type.
///
/// Race basket assignments are timestamped.
fn assignment_columns(
    basket_type: BasketType,
    basket_id: Option<i64>,
) -> Vec<(race_item::Column, SimpleExpr)> {
    let assigned = basket_id.is_some();

    match basket_type {
        BasketType::Loft => vec![
            (race_item::Column::LoftBasketId, basket_id.into()),
            (race_item::Column::IsLoftBasketed, assigned.into()),
        ],
        BasketType::Race => vec![
            (race_item::Column::RaceBasketId, basket_id.into()),
            (race_item::Column::IsRaceBasketed, assigned.into()),
            (
                race_item::Column::RaceBasketedAt,
                basket_id.map(|_| db::now()).into(),
            ),
        ],
    }
}

/// Generate OAPI documentation for the [`assign`] handler.
pub(super) fn assign_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Place race items into a basket.")
        .description("Every race item has to belong to the basket race.")
        .response::<200, Json<BasketAssignmentResponse>>()
        .response_with::<400, Json<Value>, _>(|op| {
            op.description("Basket type does not match, or items belong to another race.")
                .example(example_error(BasketAssignmentError::TypeMismatch))
        })
        .response_with::<404, Json<Value>, _>(|op| {
            op.description("Basket or race items not found.")
                .example(example_error(BasketAssignmentError::MissingItems(
                    MissingItems { ids: vec![1, 2] },
                )))
        })
}

/// Basket assignment handler.
pub(super) async fn assign(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<BasketAssignmentRequest>,
) -> Result<Json<BasketAssignmentResponse>, BasketAssignmentError> {
    let grant = session.authorize(Resource::Basket, Access::Write)?;

    db.transaction(|txn| {
        Box::pin(async move {
            let (basket, event) = find_basket(txn, id)
                .await?
                .ok_or(BasketAssignmentError::BasketNotFound)?;

            if basket.basket_type() != request.basket_type {
                return Err(BasketAssignmentError::TypeMismatch);
            }

            grant.check(owner_of(&event))?;

            let requested = request.race_item_ids.into_iter().collect::<BTreeSet<_>>();

            let found = race_item::Entity::find()
                .select_only()
                .column(race_item::Column::Id)
                .column(race_item::Column::RaceId)
                .filter(race_item::Column::Id.is_in(requested.iter().copied()))
                .into_tuple::<(i64, i64)>()
                .all(txn)
                .await?;

            let found_ids = found.iter().map(|(id, _)| *id).collect::<BTreeSet<_>>();
            let missing = requested.difference(&found_ids).copied().collect::<Vec<_>>();

            if !missing.is_empty() {
                return Err(MissingItems { ids: missing }.into());
            }

            let foreign = found
                .iter()
                .filter(|(_, race_id)| *race_id != basket.race_id)
                .map(|(id, _)| *id)
                .collect::<Vec<_>>();

            if !foreign.is_empty() {
                return Err(ForeignItems { ids: foreign }.into());
            }

            let mut update = race_item::Entity::update_many();

            for (column, value) in assignment_columns(request.basket_type, Some(basket.id)) {
                update = update.col_expr(column, value);
            }

            let result = update
                .filter(race_item::Column::Id.is_in(requested))
                .exec(txn)
                .await?;

            info!(
                basket_id = basket.id,
                race_id = basket.race_id,
                updated = result.rows_affected,
                "race items placed into a basket"
            );

            Ok(Json(BasketAssignmentResponse {
                updated: result.rows_affected,
                message: String::from("Birds assigned to basket successfully"),
            }))
        })
    })
    .await
    .into_raw_result()
}

/// Generate OAPI documentation for the [`unassign`] handler.
pub(super) fn unassign_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Remove race items from their baskets.")
        .response::<200, Json<BasketAssignmentResponse>>()
}

/// Basket unassignment handler.
pub(super) async fn unassign(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    ValidatedJson(request): ValidatedJson<BasketAssignmentRequest>,
) -> Result<Json<BasketAssignmentResponse>, BasketAssignmentError> {
    session.authorize(Resource::Basket, Access::Write)?;

    let mut update = race_item::Entity::update_many();

    for (column, value) in assignment_columns(request.basket_type, None) {
        update = update.col_expr(column, value);
    }

    let result = update
        .filter(race_item::Column::Id.is_in(request.race_item_ids))
        .exec(&*db)
        .await?;

    Ok(Json(BasketAssignmentResponse {
        updated: result.rows_affected,
        message: String::from("Birds removed from basket successfully"),
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_json::assert_json;
    use axum::http::StatusCode;
    use db::{race_item, user::Role, EntityTrait};
    use serde_json::json;
    use tower::Service;

    use crate::testing::{
        authorized_json, create_basket, create_bird, create_database, create_race,
        create_race_item, create_race_type, create_simple_event, create_user, test_router,
        ResponseBodyExt,
    };

    #[tokio::test]
    async fn assign_and_unassign() {
        let db = Arc::new(create_database().await);

        let (admin, token) = create_user(&db, Role::Admin).await;
        let (breeder, _) = create_user(&db, Role::Breeder).await;
        let race_type = create_race_type(&db, "Sprint").await;
        let event = create_simple_event(&db, admin.id).await;
        let race = create_race(&db, event.id, race_type.id, admin.id, false).await;
        let basket = create_basket(&db, race.id, 1, true, admin.id).await;

        let first = create_bird(&db, breeder.id, "00001").await;
        let second = create_bird(&db, breeder.id, "00002").await;
        let first = create_race_item(&db, race.id, first.id).await;
        let second = create_race_item(&db, race.id, second.id).await;

        let mut service = test_router(db.clone());

        let response = service
            .call(authorized_json(
                "POST",
                &format!("/baskets/{}/assign", basket.id),
                &token,
                json!({ "race_item_ids": [first.id, second.id], "basket_type": "race" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.json().await["updated"], 2);

        let stored = race_item::Entity::find_by_id(first.id)
            .one(&*db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.race_basket_id, Some(basket.id));
        assert!(stored.is_race_basketed);
        assert!(stored.race_basketed_at.is_some());
        assert_eq!(stored.loft_basket_id, None);

        let response = service
            .call(authorized_json(
                "POST",
                "/baskets/unassign",
                &token,
                json!({ "race_item_ids": [first.id], "basket_type": "race" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let stored = race_item::Entity::find_by_id(first.id)
            .one(&*db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.race_basket_id, None);
        assert!(!stored.is_race_basketed);
        assert!(stored.race_basketed_at.is_none());

        let stored = race_item::Entity::find_by_id(second.id)
            .one(&*db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.race_basket_id, Some(basket.id));
    }

    #[tokio::test]
    async fn rejected_assignments() {
        let db = Arc::new(create_database().await);

        let (admin, token) = create_user(&db, Role::Admin).await;
        let (_, other_token) = create_user(&db, Role::Admin).await;
        let (breeder, _) = create_user(&db, Role::Breeder).await;
        let race_type = create_race_type(&db, "Sprint").await;
        let event = create_simple_event(&db, admin.id).await;
        let race = create_race(&db, event.id, race_type.id, admin.id, false).await;
        let other_race = create_race(&db, event.id, race_type.id, admin.id, false).await;
        let basket = create_basket(&db, race.id, 1, false, admin.id).await;

        let bird = create_bird(&db, breeder.id, "00001").await;
        let own = create_race_item(&db, race.id, bird.id).await;
        let foreign = create_race_item(&db, other_race.id, bird.id).await;

        let mut service = test_router(db.clone());
        let uri = format!("/baskets/{}/assign", basket.id);

        let response = service
            .call(authorized_json(
                "POST",
                "/baskets/999/assign",
                &token,
                json!({ "race_item_ids": [own.id], "basket_type": "loft" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = service
            .call(authorized_json(
                "POST",
                &uri,
                &token,
                json!({ "race_item_ids": [own.id], "basket_type": "race" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_json!(response.json().await, {
            "code": 400,
            "error": "basket type does not match",
        });

        let response = service
            .call(authorized_json(
                "POST",
                &uri,
                &other_token,
                json!({ "race_item_ids": [own.id], "basket_type": "loft" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = service
            .call(authorized_json(
                "POST",
                &uri,
                &token,
                json!({ "race_item_ids": [own.id, 999], "basket_type": "loft" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_json!(response.json().await, {
            "code": 404,
            "error": "race items not found: [999]",
        });

        let response = service
            .call(authorized_json(
                "POST",
                &uri,
                &token,
                json!({ "race_item_ids": [own.id, foreign.id], "basket_type": "loft" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let stored = race_item::Entity::find_by_id(own.id)
            .one(&*db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.loft_basket_id, None);
        assert!(!stored.is_loft_basketed);
    }
}
