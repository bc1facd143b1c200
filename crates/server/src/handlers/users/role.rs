use std::sync::Arc;

use aide::{transform::TransformOperation, OperationIo};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{
    user, ActiveModelTrait, ActiveValue, DatabaseConnection, DbErr, EntityTrait,
    TransactionErrorExt, TransactionTrait,
};
use derive_more::{Display, Error, From};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::UserResponse;
use crate::{
    auth::SessionContext,
    policy::{Access, Forbidden, Resource},
    schema::example_error,
};

/// Role change request.
#[derive(Deserialize, JsonSchema)]
pub(super) struct RoleUpdateRequest {
    /// New user role.
    #[schemars(example = "crate::schema::example_role")]
    role: user::Role,
}

/// Errors that may occur during the role change.
#[derive(ErrorResponse, Display, From, Error, OperationIo)]
#[aide(output)]
pub(super) enum RoleUpdateError {
    /// Database-related error.
    DatabaseError(DbErr),

    /// Only super administrators may change roles.
    #[status(StatusCode::FORBIDDEN)]
    Forbidden(Forbidden),

    /// Requested user was not found.
    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "user not found")]
    UserNotFound,
}

/// Generate OAPI documentation for the [`update_role`] handler.
pub(super) fn docs(op: TransformOperation) -> TransformOperation {
    op.summary("Change user role.")
        .description("Only super administrators are allowed to change user roles.")
        .response::<200, Json<UserResponse>>()
        .response_with::<404, Json<Value>, _>(|op| {
            op.description("User not found.")
                .example(example_error(RoleUpdateError::UserNotFound))
        })
}

/// User role change handler.
pub(super) async fn update_role(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
    Json(request): Json<RoleUpdateRequest>,
) -> Result<Json<UserResponse>, RoleUpdateError> {
    session.authorize(Resource::UserRole, Access::Write)?;

    db.transaction(|txn| {
        Box::pin(async move {
            let model = user::Entity::find_by_id(id)
                .one(txn)
                .await?
                .ok_or(RoleUpdateError::UserNotFound)?;

            let mut model: user::ActiveModel = model.into();
            model.role = ActiveValue::Set(request.role);
            let model = model.update(txn).await?;

            info!(user_id = model.id, role = ?model.role, changed_by = session.user_id(), "user role changed");

            Ok(Json(UserResponse {
                user: model.into(),
                message: String::from("User role updated successfully"),
            }))
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

    use crate::testing::{authorized_json, create_database, create_user, test_router, ResponseBodyExt};

    #[tokio::test]
    async fn superadmin_promotes_breeder() {
        let db = create_database().await;

        let (breeder, breeder_token) = create_user(&db, Role::Breeder).await;
        let (_, admin_token) = create_user(&db, Role::Admin).await;
        let (_, superadmin_token) = create_user(&db, Role::Superadmin).await;

        let mut service = test_router(Arc::new(db));
        let uri = format!("/users/{}/role", breeder.id);

        for token in [&breeder_token, &admin_token] {
            let response = service
                .call(authorized_json("PUT", &uri, token, json!({ "role": "ADMIN" })))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::FORBIDDEN);
        }

        let response = service
            .call(authorized_json(
                "PUT",
                &uri,
                &superadmin_token,
                json!({ "role": "ADMIN" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.json().await["user"]["role"], "ADMIN");

        let response = service
            .call(authorized_json(
                "PUT",
                "/users/100/role",
                &superadmin_token,
                json!({ "role": "ADMIN" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
