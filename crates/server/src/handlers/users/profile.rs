use std::sync::Arc;

use aide::{transform::TransformOperation, OperationIo};
use axum::{extract::State, http::StatusCode, Extension, Json};
use axum_derive_error::ErrorResponse;
use db::{
    user, ActiveModelTrait, ActiveValue, DatabaseConnection, DbErr, EntityTrait,
    TransactionErrorExt, TransactionTrait,
};
use derive_more::{Display, Error, From};
use schemars::JsonSchema;
use serde::Deserialize;
use validator::Validate;

use super::{UserData, UserResponse};
use crate::{
    auth::SessionContext,
    policy::{Access, Forbidden, Owner, Resource},
    validation::ValidatedJson,
};

/// Errors that may occur during the profile request handling.
#[derive(ErrorResponse, Display, From, Error, OperationIo)]
#[aide(output)]
pub(super) enum ProfileError {
    /// Database-related error.
    DatabaseError(DbErr),

    /// Current user is not allowed to access the profile.
    #[status(StatusCode::FORBIDDEN)]
    Forbidden(Forbidden),

    /// Session user no longer exists.
    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "user not found")]
    UserNotFound,
}

/// Generate OAPI documentation for the [`me`] handler.
pub(super) fn me_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get current user profile.")
        .response::<200, Json<UserData>>()
}

/// Current user profile handler.
pub(super) async fn me(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
) -> Result<Json<UserData>, ProfileError> {
    session
        .authorize(Resource::User, Access::Read)?
        .check(Owner::account(session.user_id()))?;

    let model = user::Entity::find_by_id(session.user_id())
        .one(&*db)
        .await?
        .ok_or(ProfileError::UserNotFound)?;

    Ok(Json(model.into()))
}

/// Profile update request.
#[derive(Deserialize, Validate, JsonSchema)]
pub(super) struct ProfileUpdateRequest {
    /// New full name.
    #[validate(length(min = 1, max = 128))]
    #[schemars(example = "crate::schema::example_user_name")]
    name: Option<String>,

    /// New postal address.
    #[validate(length(max = 256))]
    address: Option<String>,

    /// New phone number.
    #[validate(length(min = 3, max = 32))]
    phone: Option<String>,
}

/// Generate OAPI documentation for the [`update`] handler.
pub(super) fn update_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Update current user profile.")
        .description("Fields that are missing from the request are left unchanged.")
        .response::<200, Json<UserResponse>>()
}

/// Profile update handler.
pub(super) async fn update(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    ValidatedJson(request): ValidatedJson<ProfileUpdateRequest>,
) -> Result<Json<UserResponse>, ProfileError> {
    session
        .authorize(Resource::User, Access::Write)?
        .check(Owner::account(session.user_id()))?;

    db.transaction(|txn| {
        Box::pin(async move {
            let model = user::Entity::find_by_id(session.user_id())
                .one(txn)
                .await?
                .ok_or(ProfileError::UserNotFound)?;

            let mut model: user::ActiveModel = model.into();

            if let Some(name) = request.name {
                model.name = ActiveValue::Set(name);
            }

            if let Some(address) = request.address {
                model.address = ActiveValue::Set(Some(address));
            }

            if let Some(phone) = request.phone {
                model.phone = ActiveValue::Set(Some(phone));
            }

            let model = model.update(txn).await?;

            Ok(Json(UserResponse {
                user: model.into(),
                message: String::from("Profile updated successfully"),
            }))
        })
    })
    .await
    .into_raw_result()
}
