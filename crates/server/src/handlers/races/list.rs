use std::sync::Arc;

use aide::{transform::TransformOperation, OperationIo};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{
    event, race, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, QueryTrait,
};
use derive_more::{Display, Error, From};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::{find_race, owner_of, RaceData};
use crate::{
    auth::SessionContext,
    pagination::Pagination,
    policy::{Access, Forbidden, OwnedBy, Resource},
    schema::example_error,
};

#[derive(ErrorResponse, Display, From, Error, OperationIo)]
#[aide(output)]
pub(super) enum RaceQueryError {
    DatabaseError(DbErr),

    #[status(StatusCode::FORBIDDEN)]
    Forbidden(Forbidden),

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "race not found")]
    RaceNotFound,
}

/// Race list filters.
#[derive(Deserialize, JsonSchema)]
pub(super) struct RaceListQuery {
    /// Only list races of the provided event.
    #[serde(default)]
    event_id: Option<i64>,
}

/// Generate OAPI documentation for the [`list`] handler.
pub(super) fn list_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get list of races.")
        .response::<200, Json<Vec<RaceData>>>()
}

/// Race list request handler.
pub(super) async fn list(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Query(pagination): Query<Pagination>,
    Query(filter): Query<RaceListQuery>,
) -> Result<Json<Vec<RaceData>>, RaceQueryError> {
    let grant = session.authorize(Resource::Race, Access::Read)?;

    let mut query = race::Entity::find();

    if let Some(OwnedBy::Creator(user_id)) = grant.owned_by() {
        query = query.filter(
            race::Column::EventId.in_subquery(
                event::Entity::find()
                    .select_only()
                    .column(event::Column::Id)
                    .filter(event::Column::CreatedBy.eq(user_id))
                    .into_query(),
            ),
        );
    }

    if let Some(event_id) = filter.event_id {
        query = query.filter(race::Column::EventId.eq(event_id));
    }

    let races = query
        .order_by_asc(race::Column::Id)
        .limit(pagination.limit())
        .offset(pagination.offset())
        .all(&*db)
        .await?;

    Ok(Json(races.into_iter().map(RaceData::from).collect()))
}

/// Generate OAPI documentation for the [`details`] handler.
pub(super) fn details_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get race details.")
        .response::<200, Json<RaceData>>()
        .response_with::<404, Json<Value>, _>(|op| {
            op.description("Race not found.")
                .example(example_error(RaceQueryError::RaceNotFound))
        })
}

/// Race details request handler.
pub(super) async fn details(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
) -> Result<Json<RaceData>, RaceQueryError> {
    let grant = session.authorize(Resource::Race, Access::Read)?;

    let (race, event) = find_race(&*db, id)
        .await?
        .ok_or(RaceQueryError::RaceNotFound)?;

    grant.check(owner_of(&event))?;

    Ok(Json(race.into()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use db::user::Role;
    use tower::Service;

    use crate::testing::{
        authorized, create_database, create_race, create_race_type, create_simple_event,
        create_user, test_router, ResponseBodyExt,
    };

    #[tokio::test]
    async fn race_visibility() {
        let db = Arc::new(create_database().await);

        let (admin, admin_token) = create_user(&db, Role::Admin).await;
        let (other, _) = create_user(&db, Role::Admin).await;
        let (_, breeder_token) = create_user(&db, Role::Breeder).await;

        let race_type = create_race_type(&db, "Sprint").await;
        let event = create_simple_event(&db, admin.id).await;
        let other_event = create_simple_event(&db, other.id).await;

        let own = create_race(&db, event.id, race_type.id, admin.id, false).await;
        let foreign = create_race(&db, other_event.id, race_type.id, other.id, false).await;

        let mut service = test_router(db.clone());

        let response = service
            .call(authorized("GET", "/races", &admin_token))
            .await
            .unwrap();

        let body = response.json().await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["id"], own.id);

        let response = service
            .call(authorized("GET", "/races", &breeder_token))
            .await
            .unwrap();

        assert_eq!(response.json().await.as_array().unwrap().len(), 2);

        let response = service
            .call(authorized(
                "GET",
                &format!("/races/{}", foreign.id),
                &admin_token,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = service
            .call(authorized("GET", "/races/999", &admin_token))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
