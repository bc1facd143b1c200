use std::{collections::HashSet, sync::Arc};

use aide::{transform::TransformOperation, OperationIo};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{
    event, prize_scheme, prize_scheme_item, race_type, race_type_prize_scheme, ActiveModelTrait,
    ActiveValue, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QuerySelect, SelectExt, TransactionErrorExt, TransactionTrait,
};
use derive_more::{Display, Error, From};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use super::{PrizeSchemeDetails, PrizeSchemeResponse};
use crate::{
    auth::SessionContext,
    handlers::MessageResponse,
    policy::{Access, Forbidden, Owner, Resource},
    schema::example_error,
    validation::ValidatedJson,
};

#[derive(ErrorResponse, Display, From, Error, OperationIo)]
#[aide(output)]
pub(super) enum PrizeSchemeManagementError {
    DatabaseError(DbErr),

    #[status(StatusCode::FORBIDDEN)]
    Forbidden(Forbidden),

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "prize scheme not found")]
    PrizeSchemeNotFound,

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "race type not found")]
    RaceTypeNotFound,

    #[status(StatusCode::BAD_REQUEST)]
    #[display(fmt = "from_position must not be greater than to_position")]
    InvalidRange,

    /// Two items of the same race type cover the same position.
    #[status(StatusCode::BAD_REQUEST)]
    #[display(fmt = "position ranges of a race type must not overlap")]
    OverlappingRanges,

    #[status(StatusCode::CONFLICT)]
    #[display(fmt = "prize scheme is used by existing events")]
    PrizeSchemeInUse,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub(super) struct PrizeSchemeItemRequest {
    #[schemars(example = "crate::schema::example_database_identifier")]
    race_type_id: i64,

    #[validate(range(min = 1))]
    #[schemars(example = "crate::schema::example_bird_no")]
    from_position: i32,

    #[validate(range(min = 1))]
    #[schemars(example = "crate::schema::example_bird_no")]
    to_position: i32,

    #[validate(range(min = 0.0))]
    #[schemars(example = "crate::schema::example_amount")]
    prize: f64,
}

/// Prize scheme creation and replacement request.
#[derive(Deserialize, Validate, JsonSchema)]
pub(super) struct PrizeSchemeRequest {
    #[validate(length(min = 1, max = 128))]
    #[schemars(example = "crate::schema::example_scheme_name")]
    name: String,

    #[serde(default)]
    #[validate]
    items: Vec<PrizeSchemeItemRequest>,
}

impl PrizeSchemeRequest {
    /// Check position ranges of every race type.
    fn check_ranges(&self) -> Result<(), PrizeSchemeManagementError> {
        if self
            .items
            .iter()
            .any(|item| item.from_position > item.to_position)
        {
            return Err(PrizeSchemeManagementError::InvalidRange);
        }

        let mut ranges: Vec<_> = self
            .items
            .iter()
            .map(|item| (item.race_type_id, item.from_position, item.to_position))
            .collect();
        ranges.sort_unstable();

        let overlapping = ranges.windows(2).any(|pair| {
            let (left_type, _, left_to) = pair[0];
            let (right_type, right_from, _) = pair[1];

            left_type == right_type && right_from <= left_to
        });

        if overlapping {
            return Err(PrizeSchemeManagementError::OverlappingRanges);
        }

        Ok(())
    }
}

async fn insert_items(
    txn: &DatabaseTransaction,
    prize_scheme_id: i64,
    items: Vec<PrizeSchemeItemRequest>,
) -> Result<(), PrizeSchemeManagementError> {
    if items.is_empty() {
        return Ok(());
    }

    let race_type_ids: HashSet<i64> = items.iter().map(|item| item.race_type_id).collect();

    let found = race_type::Entity::find()
        .filter(race_type::Column::Id.is_in(race_type_ids.iter().copied()))
        .count(txn)
        .await?;

    if found != race_type_ids.len() as u64 {
        return Err(PrizeSchemeManagementError::RaceTypeNotFound);
    }

    prize_scheme_item::Entity::insert_many(items.into_iter().map(|item| {
        prize_scheme_item::ActiveModel {
            prize_scheme_id: ActiveValue::Set(prize_scheme_id),
            race_type_id: ActiveValue::Set(item.race_type_id),
            from_position: ActiveValue::Set(item.from_position),
            to_position: ActiveValue::Set(item.to_position),
            prize: ActiveValue::Set(item.prize),
            ..Default::default()
        }
    }))
    .exec_without_returning(txn)
    .await?;

    Ok(())
}

/// Generate OAPI documentation for the [`create`] handler.
pub(super) fn create_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Create new prize scheme with line items.")
        .response::<200, Json<PrizeSchemeResponse>>()
        .response_with::<400, Json<Value>, _>(|op| {
            op.description("Invalid position ranges.")
                .example(example_error(PrizeSchemeManagementError::OverlappingRanges))
        })
}

/// Prize scheme creation handler.
pub(super) async fn create(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    ValidatedJson(request): ValidatedJson<PrizeSchemeRequest>,
) -> Result<Json<PrizeSchemeResponse>, PrizeSchemeManagementError> {
    session.authorize(Resource::Scheme, Access::Write)?;

    request.check_ranges()?;

    let created_by = session.user_id();

    db.transaction(|txn| {
        Box::pin(async move {
            let scheme = prize_scheme::ActiveModel {
                name: ActiveValue::Set(request.name),
                created_by: ActiveValue::Set(created_by),
                ..Default::default()
            }
            .insert(txn)
            .await?;

            insert_items(txn, scheme.id, request.items).await?;

            Ok(Json(PrizeSchemeResponse {
                prize_scheme: PrizeSchemeDetails::load(txn, scheme).await?,
                message: String::from("Prize scheme created successfully"),
            }))
        })
    })
    .await
    .into_raw_result()
}

/// Generate OAPI documentation for the [`update`] handler.
pub(super) fn update_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Replace prize scheme.")
        .description("All existing line items are replaced with the provided ones.")
        .response::<200, Json<PrizeSchemeResponse>>()
}

/// Prize scheme replacement handler.
pub(super) async fn update(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<PrizeSchemeRequest>,
) -> Result<Json<PrizeSchemeResponse>, PrizeSchemeManagementError> {
    let grant = session.authorize(Resource::Scheme, Access::Write)?;

    request.check_ranges()?;

    db.transaction(|txn| {
        Box::pin(async move {
            let scheme = prize_scheme::Entity::find_by_id(id)
                .one(txn)
                .await?
                .ok_or(PrizeSchemeManagementError::PrizeSchemeNotFound)?;

            grant.check(Owner::creator(scheme.created_by))?;

            let mut scheme: prize_scheme::ActiveModel = scheme.into();
            scheme.name = ActiveValue::Set(request.name);
            let scheme = scheme.update(txn).await?;

            prize_scheme_item::Entity::delete_many()
                .filter(prize_scheme_item::Column::PrizeSchemeId.eq(id))
                .exec(txn)
                .await?;

            insert_items(txn, id, request.items).await?;

            Ok(Json(PrizeSchemeResponse {
                prize_scheme: PrizeSchemeDetails::load(txn, scheme).await?,
                message: String::from("Prize scheme updated successfully"),
            }))
        })
    })
    .await
    .into_raw_result()
}

/// Generate OAPI documentation for the [`delete`] handler.
pub(super) fn delete_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Delete prize scheme.")
        .response::<200, Json<MessageResponse>>()
        .response_with::<409, Json<Value>, _>(|op| {
            op.description("Prize scheme is used by existing events.")
                .example(example_error(PrizeSchemeManagementError::PrizeSchemeInUse))
        })
}

/// Prize scheme deletion handler.
pub(super) async fn delete(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, PrizeSchemeManagementError> {
    let grant = session.authorize(Resource::Scheme, Access::Write)?;

    db.transaction(|txn| {
        Box::pin(async move {
            let scheme = prize_scheme::Entity::find_by_id(id)
                .one(txn)
                .await?
                .ok_or(PrizeSchemeManagementError::PrizeSchemeNotFound)?;

            grant.check(Owner::creator(scheme.created_by))?;

            let in_use = event::Entity::find()
                .select_only()
                .filter(event::Column::PrizeSchemeId.eq(id))
                .exists(txn)
                .await?;

            if in_use {
                return Err(PrizeSchemeManagementError::PrizeSchemeInUse);
            }

            prize_scheme_item::Entity::delete_many()
                .filter(prize_scheme_item::Column::PrizeSchemeId.eq(id))
                .exec(txn)
                .await?;

            race_type_prize_scheme::Entity::delete_many()
                .filter(race_type_prize_scheme::Column::PrizeSchemeId.eq(id))
                .exec(txn)
                .await?;

            prize_scheme::Entity::delete_by_id(id).exec(txn).await?;

            Ok(Json(MessageResponse::new("Prize scheme deleted successfully")))
        })
    })
    .await
    .into_raw_result()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use db::user::Role;
    use serde_json::json;
    use tower::Service;

    use crate::testing::{
        authorized, authorized_json, create_database, create_race_type, create_user,
        test_router, ResponseBodyExt,
    };

    #[tokio::test]
    async fn replace_with_empty_set() {
        let db = Arc::new(create_database().await);

        let (_, token) = create_user(&db, Role::Admin).await;
        let sprint = create_race_type(&db, "Sprint").await;
        let marathon = create_race_type(&db, "Marathon").await;

        let mut service = test_router(db.clone());

        let response = service
            .call(authorized_json(
                "POST",
                "/prizeSchemes",
                &token,
                json!({
                    "name": "2024 Season",
                    "items": [
                        { "race_type_id": sprint.id, "from_position": 1, "to_position": 1, "prize": 1000.0 },
                        { "race_type_id": sprint.id, "from_position": 2, "to_position": 10, "prize": 100.0 },
                        { "race_type_id": marathon.id, "from_position": 1, "to_position": 5, "prize": 500.0 },
                    ],
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.json().await;
        assert_eq!(body["prize_scheme"]["items"].as_array().unwrap().len(), 3);
        let id = body["prize_scheme"]["id"].as_i64().unwrap();

        let response = service
            .call(authorized_json(
                "PUT",
                &format!("/prizeSchemes/{id}"),
                &token,
                json!({ "name": "Cancelled", "items": [] }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let response = service
            .call(authorized("GET", &format!("/prizeSchemes/{id}"), &token))
            .await
            .unwrap();

        let body = response.json().await;
        assert_eq!(body["name"], "Cancelled");
        assert_eq!(body["items"], json!([]));
    }

    #[tokio::test]
    async fn invalid_ranges() {
        let db = Arc::new(create_database().await);

        let (_, token) = create_user(&db, Role::Admin).await;
        let sprint = create_race_type(&db, "Sprint").await;

        let mut service = test_router(db.clone());

        for items in [
            json!([{ "race_type_id": sprint.id, "from_position": 5, "to_position": 1, "prize": 1.0 }]),
            json!([
                { "race_type_id": sprint.id, "from_position": 1, "to_position": 5, "prize": 1.0 },
                { "race_type_id": sprint.id, "from_position": 5, "to_position": 9, "prize": 1.0 },
            ]),
        ] {
            let response = service
                .call(authorized_json(
                    "POST",
                    "/prizeSchemes",
                    &token,
                    json!({ "name": "Broken", "items": items }),
                ))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }

        let response = service
            .call(authorized_json(
                "POST",
                "/prizeSchemes",
                &token,
                json!({
                    "name": "Unknown type",
                    "items": [{ "race_type_id": 100, "from_position": 1, "to_position": 1, "prize": 1.0 }],
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
