use std::sync::Arc;

use aide::{transform::TransformOperation, OperationIo};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{
    bird, event_inventory_item, race_item, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QuerySelect, SelectExt, TransactionErrorExt, TransactionTrait,
};
use derive_more::{Display, Error, From};
use serde_json::Value;

use crate::{
    auth::SessionContext,
    handlers::MessageResponse,
    policy::{Access, Forbidden, Owner, Resource},
    schema::example_error,
};

#[derive(ErrorResponse, Display, From, Error, OperationIo)]
#[aide(output)]
pub(super) enum BirdDeletionError {
    DatabaseError(DbErr),

    #[status(StatusCode::FORBIDDEN)]
    Forbidden(Forbidden),

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "bird not found")]
    BirdNotFound,

    /// Bird takes part in an event or a race.
    #[status(StatusCode::CONFLICT)]
    #[display(fmt = "bird is registered in an event or a race")]
    BirdInUse,
}

/// Generate OAPI documentation for the [`delete`] handler.
pub(super) fn docs(op: TransformOperation) -> TransformOperation {
    op.summary("Delete bird.")
        .response::<200, Json<MessageResponse>>()
        .response_with::<409, Json<Value>, _>(|op| {
            op.description("Bird is registered in an event or a race.")
                .example(example_error(BirdDeletionError::BirdInUse))
        })
}

/// Bird deletion handler.
pub(super) async fn delete(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, BirdDeletionError> {
    let grant = session.authorize(Resource::Bird, Access::Write)?;

    db.transaction(|txn| {
        Box::pin(async move {
            let model = bird::Entity::find_by_id(id)
                .one(txn)
                .await?
                .ok_or(BirdDeletionError::BirdNotFound)?;

            grant.check(Owner::breeder(model.breeder_id))?;

            let registered = event_inventory_item::Entity::find()
                .select_only()
                .filter(event_inventory_item::Column::BirdId.eq(id))
                .exists(txn)
                .await?;

            let racing = race_item::Entity::find()
                .select_only()
                .filter(race_item::Column::BirdId.eq(id))
                .exists(txn)
                .await?;

            if registered || racing {
                return Err(BirdDeletionError::BirdInUse);
            }

            bird::Entity::delete_by_id(id).exec(txn).await?;

            Ok(Json(MessageResponse::new("Bird deleted successfully")))
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
    use tower::Service;

    use crate::testing::{
        authorized, create_bird, create_database, create_inventory, create_simple_event,
        create_user, register_bird, test_router,
    };

    #[tokio::test]
    async fn delete_unused_bird() {
        let db = Arc::new(create_database().await);

        let (breeder, token) = create_user(&db, Role::Breeder).await;
        let bird = create_bird(&db, breeder.id, "00001").await;

        let mut service = test_router(db.clone());

        let response = service
            .call(authorized("DELETE", &format!("/birds/{}", bird.id), &token))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let response = service
            .call(authorized("GET", &format!("/birds/{}", bird.id), &token))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn registered_bird_is_kept() {
        let db = Arc::new(create_database().await);

        let (admin, _) = create_user(&db, Role::Admin).await;
        let (breeder, token) = create_user(&db, Role::Breeder).await;
        let bird = create_bird(&db, breeder.id, "00001").await;

        let event = create_simple_event(&db, admin.id).await;
        let inventory = create_inventory(&db, event.id, breeder.id, 5).await;
        register_bird(&db, &inventory, bird.id).await;

        let mut service = test_router(db.clone());

        let response = service
            .call(authorized("DELETE", &format!("/birds/{}", bird.id), &token))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
