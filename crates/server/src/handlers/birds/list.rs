use std::sync::Arc;

use aide::{transform::TransformOperation, OperationIo};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{
    bird, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use derive_more::{Display, Error, From};
use schemars::JsonSchema;
use serde::Deserialize;

use super::BirdData;
use crate::{
    auth::SessionContext,
    pagination::Pagination,
    policy::{Access, Forbidden, Resource},
};

/// Bird list filters.
#[derive(Deserialize, JsonSchema)]
pub(super) struct BirdListQuery {
    /// Only list birds of the provided breeder.
    #[serde(default)]
    breeder_id: Option<i64>,

    /// Only list lost (or found) birds.
    #[serde(default)]
    lost: Option<bool>,
}

#[derive(ErrorResponse, Display, From, Error, OperationIo)]
#[aide(output)]
pub(super) enum BirdListError {
    DatabaseError(DbErr),

    #[status(StatusCode::FORBIDDEN)]
    Forbidden(Forbidden),
}

/// Generate OAPI documentation for the [`list`] handler.
pub(super) fn docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get list of birds.")
        .description("Breeders only see their own birds.")
        .response::<200, Json<Vec<BirdData>>>()
}

/// List birds visible to the current user.
pub(super) async fn list(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Query(pagination): Query<Pagination>,
    Query(filter): Query<BirdListQuery>,
) -> Result<Json<Vec<BirdData>>, BirdListError> {
    let grant = session.authorize(Resource::Bird, Access::Read)?;

    let mut query = bird::Entity::find();

    if grant.owned_by().is_some() {
        query = query.filter(bird::Column::BreederId.eq(session.user_id()));
    }

    if let Some(breeder_id) = filter.breeder_id {
        query = query.filter(bird::Column::BreederId.eq(breeder_id));
    }

    if let Some(lost) = filter.lost {
        query = query.filter(bird::Column::IsLost.eq(lost));
    }

    let birds = query
        .order_by_asc(bird::Column::Band)
        .limit(pagination.limit())
        .offset(pagination.offset())
        .all(&*db)
        .await?;

    Ok(Json(birds.into_iter().map(BirdData::from).collect()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use db::{bird, user::Role, ActiveModelTrait, ActiveValue};
    use tower::Service;

    use crate::testing::{
        authorized, create_bird, create_database, create_user, test_router, ResponseBodyExt,
    };

    #[tokio::test]
    async fn breeders_see_own_birds() {
        let db = Arc::new(create_database().await);

        let (breeder, token) = create_user(&db, Role::Breeder).await;
        let (other, _) = create_user(&db, Role::Breeder).await;
        let (_, admin_token) = create_user(&db, Role::Admin).await;

        create_bird(&db, breeder.id, "00001").await;
        let lost = create_bird(&db, breeder.id, "00002").await;
        create_bird(&db, other.id, "00003").await;

        bird::ActiveModel {
            id: ActiveValue::Unchanged(lost.id),
            is_lost: ActiveValue::Set(true),
            ..Default::default()
        }
        .update(&*db)
        .await
        .unwrap();

        let mut service = test_router(db.clone());

        let response = service
            .call(authorized("GET", "/birds", &token))
            .await
            .unwrap();

        let body = response.json().await;
        let birds = body.as_array().unwrap();
        assert_eq!(birds.len(), 2);
        assert!(birds.iter().all(|bird| bird["breeder_id"] == breeder.id));

        let response = service
            .call(authorized("GET", "/birds", &admin_token))
            .await
            .unwrap();

        assert_eq!(response.json().await.as_array().unwrap().len(), 3);

        let response = service
            .call(authorized("GET", "/birds?lost=true", &admin_token))
            .await
            .unwrap();

        let body = response.json().await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["id"], lost.id);
        assert_eq!(body[0]["band"], "PHA-2024-MNL-00002");
    }
}
