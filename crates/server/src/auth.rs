use std::sync::Arc;

use axum::{
    extract::State,
    headers::{authorization::Bearer, Authorization},
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
    TypedHeader,
};
use axum_derive_error::ErrorResponse;
use db::{
    session, user, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
};
use derive_more::{Display, Error, From};
use tracing::debug;

use crate::policy::{self, Access, Forbidden, Grant, Ownership, Resource};

/// Resolved session of the current request.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SessionContext {
    session_id: i64,
    user_id: i64,
    role: user::Role,
}

impl SessionContext {
    /// Get raw session identifier value.
    pub fn session_id(&self) -> i64 {
        self.session_id
    }

    /// Get raw user identifier value.
    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn role(&self) -> user::Role {
        self.role
    }

    /// Authorize access to a resource using the [`POLICY`](policy::POLICY) table.
    pub fn authorize(&self, resource: Resource, access: Access) -> Result<Grant, Forbidden> {
        let scope = policy::scope_for(self.role, resource, access).ok_or(Forbidden)?;

        Ok(Grant {
            scope,
            user_id: self.user_id,
            ownership: Ownership::of(self.role),
        })
    }
}

#[derive(ErrorResponse, Display, From, Error)]
pub(super) enum AuthenticationError {
    DatabaseError(DbErr),

    #[status(StatusCode::UNAUTHORIZED)]
    #[display(fmt = "authentication is required")]
    MissingSession,

    #[status(StatusCode::UNAUTHORIZED)]
    #[display(fmt = "invalid or expired session token")]
    InvalidSession,
}

/// Resolve a bearer session token into a [`SessionContext`] request extension.
pub(super) async fn require_authentication<B>(
    State(db): State<Arc<DatabaseConnection>>,
    authorization: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request<B>,
    next: Next<B>,
) -> Result<Response, AuthenticationError> {
    let TypedHeader(authorization) = authorization.ok_or(AuthenticationError::MissingSession)?;

    let (session, user) = session::Entity::find()
        .find_also_related(user::Entity)
        .filter(session::Column::Token.eq(authorization.token()))
        .one(&*db)
        .await?
        .ok_or(AuthenticationError::InvalidSession)?;

    let user = user.ok_or(AuthenticationError::InvalidSession)?;

    if session.is_expired_at(db::now()) {
        debug!(session_id = session.id, "expired session token was provided");
        return Err(AuthenticationError::InvalidSession);
    }

    req.extensions_mut().insert(SessionContext {
        session_id: session.id,
        user_id: user.id,
        role: user.role,
    });

    Ok(next.run(req).await)
}

#[cfg(test)]
impl SessionContext {
    pub(crate) fn for_tests(user_id: i64, role: user::Role) -> Self {
        Self {
            session_id: 0,
            user_id,
            role,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_json::assert_json;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use db::{session, user::Role, ActiveValue, EntityTrait, PrimitiveDateTime};
    use time::{Duration, OffsetDateTime};
    use tower::ServiceExt;

    use super::SessionContext;
    use crate::{
        policy::{Access, Resource, Scope},
        testing::{create_database, create_user, test_router, ResponseBodyExt},
    };

    #[test]
    fn authorize_uses_policy() {
        let breeder = SessionContext::for_tests(1, Role::Breeder);

        assert_eq!(
            breeder
                .authorize(Resource::Bird, Access::Write)
                .unwrap()
                .scope,
            Scope::Owned
        );
        assert!(breeder.authorize(Resource::Race, Access::Write).is_err());
    }

    #[tokio::test]
    async fn missing_header() {
        let db = create_database().await;

        let response = test_router(Arc::new(db))
            .oneshot(
                Request::builder()
                    .uri("/users/me")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_json!(response.json().await, {
            "code": 401,
            "error": "authentication is required",
        });
    }

    #[tokio::test]
    async fn unknown_token() {
        let db = create_database().await;

        let response = test_router(Arc::new(db))
            .oneshot(
                Request::builder()
                    .uri("/users/me")
                    .header("Authorization", "Bearer unknown")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn expired_token() {
        let db = create_database().await;

        let (user, _) = create_user(&db, Role::Breeder).await;

        let created_at = OffsetDateTime::now_utc() - Duration::weeks(13);

        session::Entity::insert(session::ActiveModel {
            user_id: ActiveValue::Set(user.id),
            token: ActiveValue::Set(String::from("expired")),
            created_at: ActiveValue::Set(PrimitiveDateTime::new(
                created_at.date(),
                created_at.time(),
            )),
            ..Default::default()
        })
        .exec_without_returning(&db)
        .await
        .expect("unable to insert session");

        let response = test_router(Arc::new(db))
            .oneshot(
                Request::builder()
                    .uri("/users/me")
                    .header("Authorization", "Bearer expired")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
