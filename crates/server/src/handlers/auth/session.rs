use std::sync::Arc;

use aide::{transform::TransformOperation, OperationIo};
use axum::{extract::State, http::StatusCode, Extension, Json};
use axum_derive_error::ErrorResponse;
use db::{user, DatabaseConnection, DbErr, EntityTrait};
use derive_more::{Display, Error, From};
use schemars::JsonSchema;
use serde::Serialize;

use crate::auth::SessionContext;

/// Session user summary.
#[derive(Serialize, JsonSchema)]
pub(super) struct SessionUser {
    /// User identifier.
    #[schemars(example = "crate::schema::example_database_identifier")]
    id: i64,

    /// User role.
    #[schemars(example = "crate::schema::example_role")]
    role: user::Role,

    /// Full name.
    #[schemars(example = "crate::schema::example_user_name")]
    name: String,

    /// Email address.
    #[schemars(example = "crate::schema::example_email")]
    email: String,

    /// Profile image URL.
    #[schemars(example = "crate::schema::example_image_url")]
    image: Option<String>,
}

/// Current session response.
#[derive(Serialize, JsonSchema)]
pub(super) struct SessionResponse {
    user: SessionUser,
}

/// Errors that may occur during the session introspection.
#[derive(ErrorResponse, Display, From, Error, OperationIo)]
#[aide(output)]
pub(super) enum SessionError {
    /// Database-related error.
    DatabaseError(DbErr),

    /// Session user no longer exists.
    #[status(StatusCode::UNAUTHORIZED)]
    #[display(fmt = "invalid or expired session token")]
    UserNotFound,
}

/// Generate OAPI documentation for the [`session`] handler.
pub(super) fn docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get current session.")
        .response::<200, Json<SessionResponse>>()
}

/// Session introspection handler.
pub(super) async fn session(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
) -> Result<Json<SessionResponse>, SessionError> {
    let user = user::Entity::find_by_id(session.user_id())
        .one(&*db)
        .await?
        .ok_or(SessionError::UserNotFound)?;

    Ok(Json(SessionResponse {
        user: SessionUser {
            id: user.id,
            role: user.role,
            name: user.name,
            email: user.email,
            image: user.image_url,
        },
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use db::user::Role;
    use serde_json::json;
    use tower::ServiceExt;

    use crate::testing::{authorized, create_database, create_user, test_router, ResponseBodyExt};

    #[tokio::test]
    async fn current_session() {
        let db = create_database().await;

        let (user, token) = create_user(&db, Role::Admin).await;

        let response = test_router(Arc::new(db))
            .oneshot(authorized("GET", "/auth/session", &token))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.json().await,
            json!({
                "user": {
                    "id": user.id,
                    "role": "ADMIN",
                    "name": user.name,
                    "email": user.email,
                    "image": null,
                }
            })
        );
    }
}
