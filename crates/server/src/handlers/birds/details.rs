use std::sync::Arc;

use aide::{transform::TransformOperation, OperationIo};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{bird, DatabaseConnection, DbErr, EntityTrait};
use derive_more::{Display, Error, From};
use serde_json::Value;

use super::BirdData;
use crate::{
    auth::SessionContext,
    policy::{Access, Forbidden, Owner, Resource},
    schema::example_error,
};

#[derive(ErrorResponse, Display, From, Error, OperationIo)]
#[aide(output)]
pub(super) enum BirdDetailsError {
    DatabaseError(DbErr),

    #[status(StatusCode::FORBIDDEN)]
    Forbidden(Forbidden),

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "bird not found")]
    BirdNotFound,
}

/// Generate OAPI documentation for the [`details`] handler.
pub(super) fn docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get bird details.")
        .response::<200, Json<BirdData>>()
        .response_with::<404, Json<Value>, _>(|op| {
            op.description("Bird not found.")
                .example(example_error(BirdDetailsError::BirdNotFound))
        })
}

/// Bird details request handler.
pub(super) async fn details(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
) -> Result<Json<BirdData>, BirdDetailsError> {
    let grant = session.authorize(Resource::Bird, Access::Read)?;

    let model = bird::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or(BirdDetailsError::BirdNotFound)?;

    grant.check(Owner::breeder(model.breeder_id))?;

    Ok(Json(model.into()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use db::user::Role;
    use tower::Service;

    use crate::testing::{
        authorized, create_bird, create_database, create_user, test_router, ResponseBodyExt,
    };

    #[tokio::test]
    async fn details() {
        let db = Arc::new(create_database().await);

        let (breeder, token) = create_user(&db, Role::Breeder).await;
        let (_, other_token) = create_user(&db, Role::Breeder).await;
        let bird = create_bird(&db, breeder.id, "00001").await;

        let mut service = test_router(db.clone());

        let response = service
            .call(authorized("GET", &format!("/birds/{}", bird.id), &token))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.json().await;
        assert_eq!(body["band"], "PHA-2024-MNL-00001");
        assert_eq!(body["rfid"], "RFID00001");
        assert_eq!(body["sex"], "UNKNOWN");

        let response = service
            .call(authorized("GET", &format!("/birds/{}", bird.id), &other_token))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = service
            .call(authorized("GET", "/birds/100", &token))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
