use std::sync::Arc;

use aide::{transform::TransformOperation, OperationIo};
use axum::{extract::State, http::StatusCode, Json};
use axum_derive_error::ErrorResponse;
use db::{
    session, user, ActiveValue, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QuerySelect, SelectExt, TransactionErrorExt, TransactionTrait,
};
use derive_more::{Display, Error, From};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use validator::Validate;

use crate::{handlers::users::UserData, schema::example_error, validation::ValidatedJson};

/// User registration request.
#[derive(Deserialize, Validate, JsonSchema)]
pub(super) struct UserRegistrationRequest {
    /// Full name.
    #[validate(length(min = 1, max = 128))]
    #[schemars(example = "crate::schema::example_user_name")]
    name: String,

    /// Email address, unique across all users.
    #[validate(email)]
    #[schemars(example = "crate::schema::example_email")]
    email: String,

    /// Postal address.
    #[validate(length(max = 256))]
    address: Option<String>,

    /// Phone number.
    #[validate(length(min = 3, max = 32))]
    phone: Option<String>,
}

/// Errors that may occur during the user registration process.
#[derive(ErrorResponse, Display, From, Error, OperationIo)]
#[aide(output)]
pub(super) enum UserRegistrationError {
    /// Database-related error.
    DatabaseError(DbErr),

    /// Provided email address is already registered.
    #[status(StatusCode::CONFLICT)]
    #[display(fmt = "email address is already registered")]
    EmailTaken,
}

/// Registered user's authentication token response.
#[derive(Serialize, JsonSchema)]
pub(super) struct UserRegistrationResponse {
    /// Newly registered user.
    user: UserData,

    /// Session token.
    #[schemars(example = "crate::schema::example_token")]
    token: String,

    /// Human-readable operation result.
    #[schemars(example = "crate::schema::example_message")]
    message: String,
}

/// Generate OAPI documentation for the [`register`] handler.
pub(super) fn docs(op: TransformOperation) -> TransformOperation {
    op.summary("Register new breeder.")
        .description(
            r#"Credentials are verified by an external authentication service,
thus this route only creates a breeder account and its first session."#,
        )
        .response::<200, Json<UserRegistrationResponse>>()
        .response_with::<409, Json<Value>, _>(|op| {
            op.description("Email address is already registered.")
                .example(example_error(UserRegistrationError::EmailTaken))
        })
}

/// User registration handler.
pub(super) async fn register(
    State(db): State<Arc<DatabaseConnection>>,
    ValidatedJson(request): ValidatedJson<UserRegistrationRequest>,
) -> Result<Json<UserRegistrationResponse>, UserRegistrationError> {
    db.transaction(|txn| {
        Box::pin(async move {
            let email_taken = user::Entity::find()
                .select_only()
                .filter(user::Column::Email.eq(&*request.email))
                .exists(txn)
                .await?;

            if email_taken {
                return Err(UserRegistrationError::EmailTaken);
            }

            let user = user::Entity::insert(user::ActiveModel {
                name: ActiveValue::Set(request.name),
                email: ActiveValue::Set(request.email),
                role: ActiveValue::Set(user::Role::Breeder),
                address: ActiveValue::Set(request.address),
                phone: ActiveValue::Set(request.phone),
                ..Default::default()
            })
            .exec_with_returning(txn)
            .await?;

            let (model, token) = session::generate_session(user.id);

            session::Entity::insert(model)
                .exec_without_returning(txn)
                .await?;

            info!(user_id = user.id, "new breeder registered");

            Ok(Json(UserRegistrationResponse {
                user: user.into(),
                token,
                message: String::from("Registration successful"),
            }))
        })
    })
    .await
    .into_raw_result()
}
