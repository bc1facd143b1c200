use std::sync::Arc;

use aide::{transform::TransformOperation, OperationIo};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{
    betting_scheme, event, ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QuerySelect, SelectExt, TransactionErrorExt, TransactionTrait,
};
use derive_more::{Display, Error, From};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use super::BettingSchemeResponse;
use crate::{
    auth::SessionContext,
    handlers::MessageResponse,
    policy::{Access, Forbidden, Owner, Resource},
    schema::example_error,
    validation::ValidatedJson,
};

#[derive(ErrorResponse, Display, From, Error, OperationIo)]
#[aide(output)]
pub(super) enum BettingSchemeManagementError {
    DatabaseError(DbErr),

    #[status(StatusCode::FORBIDDEN)]
    Forbidden(Forbidden),

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "betting scheme not found")]
    BettingSchemeNotFound,

    #[status(StatusCode::CONFLICT)]
    #[display(fmt = "betting scheme is used by existing events")]
    BettingSchemeInUse,
}

/// Betting scheme creation and update request.
#[derive(Deserialize, Validate, JsonSchema)]
pub(super) struct BettingSchemeRequest {
    #[validate(length(min = 1, max = 128))]
    #[schemars(example = "crate::schema::example_scheme_name")]
    name: String,

    #[validate(range(min = 0.0, max = 100.0))]
    #[schemars(example = "crate::schema::example_percentage")]
    cut_percentage: f64,

    #[validate(range(min = 0.0))]
    #[schemars(example = "crate::schema::example_amount")]
    standard_amount: f64,

    #[validate(range(min = 0.0))]
    #[schemars(example = "crate::schema::example_amount")]
    show_low_amount: f64,

    #[validate(range(min = 0.0))]
    #[schemars(example = "crate::schema::example_amount")]
    show_mid_amount: f64,

    #[validate(range(min = 0.0))]
    #[schemars(example = "crate::schema::example_amount")]
    show_high_amount: f64,

    #[validate(range(min = 0.0))]
    #[schemars(example = "crate::schema::example_amount")]
    winner_takes_all_amount: f64,
}

impl BettingSchemeRequest {
    fn apply(self, model: &mut betting_scheme::ActiveModel) {
        model.name = ActiveValue::Set(self.name);
        model.cut_percentage = ActiveValue::Set(self.cut_percentage);
        model.standard_amount = ActiveValue::Set(self.standard_amount);
        model.show_low_amount = ActiveValue::Set(self.show_low_amount);
        model.show_mid_amount = ActiveValue::Set(self.show_mid_amount);
        model.show_high_amount = ActiveValue::Set(self.show_high_amount);
        model.winner_takes_all_amount = ActiveValue::Set(self.winner_takes_all_amount);
    }
}

/// Generate OAPI documentation for the [`create`] handler.
pub(super) fn create_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Create new betting scheme.")
        .response::<200, Json<BettingSchemeResponse>>()
}

/// Betting scheme creation handler.
pub(super) async fn create(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    ValidatedJson(request): ValidatedJson<BettingSchemeRequest>,
) -> Result<Json<BettingSchemeResponse>, BettingSchemeManagementError> {
    session.authorize(Resource::Scheme, Access::Write)?;

    let mut model = betting_scheme::ActiveModel {
        created_by: ActiveValue::Set(session.user_id()),
        ..Default::default()
    };
    request.apply(&mut model);

    let model = model.insert(&*db).await?;

    Ok(Json(BettingSchemeResponse {
        betting_scheme: model.into(),
        message: String::from("Betting scheme created successfully"),
    }))
}

/// Generate OAPI documentation for the [`update`] handler.
pub(super) fn update_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Update betting scheme.")
        .response::<200, Json<BettingSchemeResponse>>()
        .response_with::<404, Json<Value>, _>(|op| {
            op.description("Betting scheme not found.")
                .example(example_error(
                    BettingSchemeManagementError::BettingSchemeNotFound,
                ))
        })
}

/// Betting scheme update handler.
pub(super) async fn update(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<BettingSchemeRequest>,
) -> Result<Json<BettingSchemeResponse>, BettingSchemeManagementError> {
    let grant = session.authorize(Resource::Scheme, Access::Write)?;

    let model = betting_scheme::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or(BettingSchemeManagementError::BettingSchemeNotFound)?;

    grant.check(Owner::creator(model.created_by))?;

    let mut model: betting_scheme::ActiveModel = model.into();
    request.apply(&mut model);
    let model = model.update(&*db).await?;

    Ok(Json(BettingSchemeResponse {
        betting_scheme: model.into(),
        message: String::from("Betting scheme updated successfully"),
    }))
}

/// Generate OAPI documentation for the [`delete`] handler.
pub(super) fn delete_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Delete betting scheme.")
        .response::<200, Json<MessageResponse>>()
        .response_with::<409, Json<Value>, _>(|op| {
            op.description("Betting scheme is used by existing events.")
                .example(example_error(BettingSchemeManagementError::BettingSchemeInUse))
        })
}

/// Betting scheme deletion handler.
pub(super) async fn delete(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, BettingSchemeManagementError> {
    let grant = session.authorize(Resource::Scheme, Access::Write)?;

    db.transaction(|txn| {
        Box::pin(async move {
            let model = betting_scheme::Entity::find_by_id(id)
                .one(txn)
                .await?
                .ok_or(BettingSchemeManagementError::BettingSchemeNotFound)?;

            grant.check(Owner::creator(model.created_by))?;

            let in_use = event::Entity::find()
                .select_only()
                .filter(event::Column::BettingSchemeId.eq(id))
                .exists(txn)
                .await?;

            if in_use {
                return Err(BettingSchemeManagementError::BettingSchemeInUse);
            }

            betting_scheme::Entity::delete_by_id(id).exec(txn).await?;

            Ok(Json(MessageResponse::new(
                "Betting scheme deleted successfully",
            )))
        })
    })
    .await
    .into_raw_result()
}
