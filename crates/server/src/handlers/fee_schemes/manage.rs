use std::{collections::HashSet, sync::Arc};

use aide::{transform::TransformOperation, OperationIo};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{
    event, fee_scheme, perch_fee_item, race_type_fee_scheme, ActiveModelTrait, ActiveValue,
    ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, QueryFilter,
    QuerySelect, SelectExt, TransactionErrorExt, TransactionTrait,
};
use derive_more::{Display, Error, From};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use super::{FeeSchemeDetails, FeeSchemeResponse};
use crate::{
    auth::SessionContext,
    handlers::MessageResponse,
    policy::{Access, Forbidden, Owner, Resource},
    schema::example_error,
    validation::ValidatedJson,
};

#[derive(ErrorResponse, Display, From, Error, OperationIo)]
#[aide(output)]
pub(super) enum FeeSchemeManagementError {
    DatabaseError(DbErr),

    #[status(StatusCode::FORBIDDEN)]
    Forbidden(Forbidden),

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "fee scheme not found")]
    FeeSchemeNotFound,

    /// Two line items share the same bird number.
    #[status(StatusCode::BAD_REQUEST)]
    #[display(fmt = "duplicate bird number in fee items")]
    DuplicateBirdNo,

    #[status(StatusCode::CONFLICT)]
    #[display(fmt = "fee scheme is used by existing events")]
    FeeSchemeInUse,
}

/// Single fee line item.
#[derive(Deserialize, Validate, JsonSchema)]
pub(super) struct PerchFeeItemRequest {
    /// Sequence number of the bird inside of an inventory, starting from 1.
    #[validate(range(min = 1))]
    #[schemars(example = "crate::schema::example_bird_no")]
    bird_no: i32,

    #[validate(range(min = 0.0))]
    #[schemars(example = "crate::schema::example_amount")]
    fee: f64,
}

/// Fee scheme creation and replacement request.
#[derive(Deserialize, Validate, JsonSchema)]
pub(super) struct FeeSchemeRequest {
    #[validate(length(min = 1, max = 128))]
    #[schemars(example = "crate::schema::example_scheme_name")]
    name: String,

    #[validate(range(min = 0.0))]
    #[schemars(example = "crate::schema::example_amount")]
    perch_fee: f64,

    #[serde(default)]
    #[validate]
    items: Vec<PerchFeeItemRequest>,
}

impl FeeSchemeRequest {
    fn has_unique_bird_numbers(&self) -> bool {
        let numbers: HashSet<i32> = self.items.iter().map(|item| item.bird_no).collect();

        numbers.len() == self.items.len()
    }
}

async fn insert_items(
    txn: &DatabaseTransaction,
    fee_scheme_id: i64,
    items: Vec<PerchFeeItemRequest>,
) -> Result<(), DbErr> {
    if items.is_empty() {
        return Ok(());
    }

    perch_fee_item::Entity::insert_many(items.into_iter().map(|item| {
        perch_fee_item::ActiveModel {
            fee_scheme_id: ActiveValue::Set(fee_scheme_id),
            bird_no: ActiveValue::Set(item.bird_no),
            fee: ActiveValue::Set(item.fee),
            ..Default::default()
        }
    }))
    .exec_without_returning(txn)
    .await?;

    Ok(())
}

/// Generate OAPI documentation for the [`create`] handler.
pub(super) fn create_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Create new fee scheme with line items.")
        .response::<200, Json<FeeSchemeResponse>>()
        .response_with::<400, Json<Value>, _>(|op| {
            op.description("Duplicate bird number.")
                .example(example_error(FeeSchemeManagementError::DuplicateBirdNo))
        })
}

/// Fee scheme creation handler.
pub(super) async fn create(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    ValidatedJson(request): ValidatedJson<FeeSchemeRequest>,
) -> Result<Json<FeeSchemeResponse>, FeeSchemeManagementError> {
    session.authorize(Resource::Scheme, Access::Write)?;

    if !request.has_unique_bird_numbers() {
        return Err(FeeSchemeManagementError::DuplicateBirdNo);
    }

    let created_by = session.user_id();

    db.transaction(|txn| {
        Box::pin(async move {
            let scheme = fee_scheme::ActiveModel {
                name: ActiveValue::Set(request.name),
                perch_fee: ActiveValue::Set(request.perch_fee),
                created_by: ActiveValue::Set(created_by),
                ..Default::default()
            }
            .insert(txn)
            .await?;

            insert_items(txn, scheme.id, request.items).await?;

            Ok(Json(FeeSchemeResponse {
                fee_scheme: FeeSchemeDetails::load(txn, scheme).await?,
                message: String::from("Fee scheme created successfully"),
            }))
        })
    })
    .await
    .into_raw_result()
}

/// Generate OAPI documentation for the [`update`] handler.
pub(super) fn update_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Replace fee scheme.")
        .description("All existing line items are replaced with the provided ones.")
        .response::<200, Json<FeeSchemeResponse>>()
        .response_with::<404, Json<Value>, _>(|op| {
            op.description("Fee scheme not found.")
                .example(example_error(FeeSchemeManagementError::FeeSchemeNotFound))
        })
}

/// Fee scheme replacement handler.
pub(super) async fn update(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<FeeSchemeRequest>,
) -> Result<Json<FeeSchemeResponse>, FeeSchemeManagementError> {
    let grant = session.authorize(Resource::Scheme, Access::Write)?;

    if !request.has_unique_bird_numbers() {
        return Err(FeeSchemeManagementError::DuplicateBirdNo);
    }

    db.transaction(|txn| {
        Box::pin(async move {
            let scheme = fee_scheme::Entity::find_by_id(id)
                .one(txn)
                .await?
                .ok_or(FeeSchemeManagementError::FeeSchemeNotFound)?;

            grant.check(Owner::creator(scheme.created_by))?;

            let mut scheme: fee_scheme::ActiveModel = scheme.into();
            scheme.name = ActiveValue::Set(request.name);
            scheme.perch_fee = ActiveValue::Set(request.perch_fee);
            let scheme = scheme.update(txn).await?;

            perch_fee_item::Entity::delete_many()
                .filter(perch_fee_item::Column::FeeSchemeId.eq(id))
                .exec(txn)
                .await?;

            insert_items(txn, id, request.items).await?;

            Ok(Json(FeeSchemeResponse {
                fee_scheme: FeeSchemeDetails::load(txn, scheme).await?,
                message: String::from("Fee scheme updated successfully"),
            }))
        })
    })
    .await
    .into_raw_result()
}

/// Generate OAPI documentation for the [`delete`] handler.
pub(super) fn delete_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Delete fee scheme.")
        .response::<200, Json<MessageResponse>>()
        .response_with::<409, Json<Value>, _>(|op| {
            op.description("Fee scheme is used by existing events.")
                .example(example_error(FeeSchemeManagementError::FeeSchemeInUse))
        })
}

/// Fee scheme deletion handler.
pub(super) async fn delete(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, FeeSchemeManagementError> {
    let grant = session.authorize(Resource::Scheme, Access::Write)?;

    db.transaction(|txn| {
        Box::pin(async move {
            let scheme = fee_scheme::Entity::find_by_id(id)
                .one(txn)
                .await?
                .ok_or(FeeSchemeManagementError::FeeSchemeNotFound)?;

            grant.check(Owner::creator(scheme.created_by))?;

            let in_use = event::Entity::find()
                .select_only()
                .filter(event::Column::FeeSchemeId.eq(id))
                .exists(txn)
                .await?;

            if in_use {
                return Err(FeeSchemeManagementError::FeeSchemeInUse);
            }

            perch_fee_item::Entity::delete_many()
                .filter(perch_fee_item::Column::FeeSchemeId.eq(id))
                .exec(txn)
                .await?;

            race_type_fee_scheme::Entity::delete_many()
                .filter(race_type_fee_scheme::Column::FeeSchemeId.eq(id))
                .exec(txn)
                .await?;

            fee_scheme::Entity::delete_by_id(id).exec(txn).await?;

            Ok(Json(MessageResponse::new("Fee scheme deleted successfully")))
        })
    })
    .await
    .into_raw_result()
}
