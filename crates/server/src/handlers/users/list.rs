use std::sync::Arc;

use aide::{transform::TransformOperation, OperationIo};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{
    user, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use derive_more::{Display, Error, From};
use schemars::JsonSchema;
use serde::Deserialize;

use super::UserData;
use crate::{
    auth::SessionContext,
    pagination::Pagination,
    policy::{Access, Forbidden, Resource},
};

/// User list filters.
#[derive(Deserialize, JsonSchema)]
pub(super) struct UserListQuery {
    /// Only list users with the provided role.
    #[serde(default)]
    role: Option<user::Role>,
}

/// Errors that may occur during the user list request handling.
#[derive(ErrorResponse, Display, From, Error, OperationIo)]
#[aide(output)]
pub(super) enum UserListError {
    /// Database-related error.
    DatabaseError(DbErr),

    /// Current user is not allowed to list users.
    #[status(StatusCode::FORBIDDEN)]
    Forbidden(Forbidden),
}

/// Generate OAPI documentation for the [`list`] handler.
pub(super) fn docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get list of users.")
        .description("Breeders only see their own account.")
        .response::<200, Json<Vec<UserData>>>()
}

/// List users visible to the current user.
pub(super) async fn list(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Query(pagination): Query<Pagination>,
    Query(filter): Query<UserListQuery>,
) -> Result<Json<Vec<UserData>>, UserListError> {
    let grant = session.authorize(Resource::User, Access::Read)?;

    let mut query = user::Entity::find();

    if grant.owned_by().is_some() {
        query = query.filter(user::Column::Id.eq(session.user_id()));
    }

    if let Some(role) = filter.role {
        query = query.filter(user::Column::Role.eq(role));
    }

    let users = query
        .order_by_asc(user::Column::Id)
        .limit(pagination.limit())
        .offset(pagination.offset())
        .all(&*db)
        .await?;

    Ok(Json(users.into_iter().map(UserData::from).collect()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use db::user::Role;
    use tower::Service;

    use crate::testing::{authorized, create_database, create_user, test_router, ResponseBodyExt};

    #[tokio::test]
    async fn scoped_by_role() {
        let db = create_database().await;

        let (breeder, breeder_token) = create_user(&db, Role::Breeder).await;
        let (_, admin_token) = create_user(&db, Role::Admin).await;
        create_user(&db, Role::Breeder).await;

        let mut service = test_router(Arc::new(db));

        let response = service
            .call(authorized("GET", "/users", &breeder_token))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let users = response.json().await;
        assert_eq!(users.as_array().unwrap().len(), 1);
        assert_eq!(users[0]["id"], breeder.id);

        let response = service
            .call(authorized("GET", "/users", &admin_token))
            .await
            .unwrap();

        assert_eq!(response.json().await.as_array().unwrap().len(), 3);

        let response = service
            .call(authorized("GET", "/users?role=BREEDER", &admin_token))
            .await
            .unwrap();

        let users = response.json().await;
        assert_eq!(users.as_array().unwrap().len(), 2);
        assert_eq!(users[0]["role"], "BREEDER");
    }
}
