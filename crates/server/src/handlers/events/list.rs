use std::sync::Arc;

use aide::{transform::TransformOperation, OperationIo};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{
    event, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use derive_more::{Display, Error, From};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::EventData;
use crate::{
    auth::SessionContext,
    pagination::Pagination,
    policy::{Access, Forbidden, OwnedBy, Owner, Resource},
    schema::example_error,
};

#[derive(ErrorResponse, Display, From, Error, OperationIo)]
#[aide(output)]
pub(super) enum EventQueryError {
    DatabaseError(DbErr),

    #[status(StatusCode::FORBIDDEN)]
    Forbidden(Forbidden),

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "event not found")]
    EventNotFound,
}

/// Event list filters.
#[derive(Deserialize, JsonSchema)]
pub(super) struct EventListQuery {
    /// Only list events open (or closed) for registration.
    #[serde(default)]
    open: Option<bool>,
}

/// Generate OAPI documentation for the [`list`] handler.
pub(super) fn list_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get list of events.")
        .description("Events are sorted by their start time, most recent first.")
        .response::<200, Json<Vec<EventData>>>()
}

/// Event list request handler.
pub(super) async fn list(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Query(pagination): Query<Pagination>,
    Query(filter): Query<EventListQuery>,
) -> Result<Json<Vec<EventData>>, EventQueryError> {
    let grant = session.authorize(Resource::Event, Access::Read)?;

    let mut query = event::Entity::find();

    if let Some(OwnedBy::Creator(user_id)) = grant.owned_by() {
        query = query.filter(event::Column::CreatedBy.eq(user_id));
    }

    if let Some(open) = filter.open {
        query = query.filter(event::Column::IsOpen.eq(open));
    }

    let events = query
        .order_by_desc(event::Column::StartsAt)
        .order_by_desc(event::Column::Id)
        .limit(pagination.limit())
        .offset(pagination.offset())
        .all(&*db)
        .await?;

    Ok(Json(events.into_iter().map(EventData::from).collect()))
}

/// Generate OAPI documentation for the [`details`] handler.
pub(super) fn details_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get event details.")
        .response::<200, Json<EventData>>()
        .response_with::<404, Json<Value>, _>(|op| {
            op.description("Event not found.")
                .example(example_error(EventQueryError::EventNotFound))
        })
}

/// Event details request handler.
pub(super) async fn details(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
) -> Result<Json<EventData>, EventQueryError> {
    let grant = session.authorize(Resource::Event, Access::Read)?;

    let model = event::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or(EventQueryError::EventNotFound)?;

    grant.check(Owner::creator(model.created_by))?;

    Ok(Json(model.into()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use db::{event, user::Role, ActiveModelTrait, ActiveValue};
    use tower::Service;

    use crate::testing::{
        authorized, create_database, create_simple_event, create_user, test_router,
        ResponseBodyExt,
    };

    #[tokio::test]
    async fn visibility_and_filters() {
        let db = Arc::new(create_database().await);

        let (admin, admin_token) = create_user(&db, Role::Admin).await;
        let (other, _) = create_user(&db, Role::Admin).await;
        let (_, breeder_token) = create_user(&db, Role::Breeder).await;

        let own = create_simple_event(&db, admin.id).await;
        let closed = create_simple_event(&db, other.id).await;

        event::ActiveModel {
            id: ActiveValue::Unchanged(closed.id),
            is_open: ActiveValue::Set(false),
            ..Default::default()
        }
        .update(&*db)
        .await
        .unwrap();

        let mut service = test_router(db.clone());

        let response = service
            .call(authorized("GET", "/events", &admin_token))
            .await
            .unwrap();

        let body = response.json().await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["id"], own.id);

        let response = service
            .call(authorized("GET", "/events", &breeder_token))
            .await
            .unwrap();

        assert_eq!(response.json().await.as_array().unwrap().len(), 2);

        let response = service
            .call(authorized("GET", "/events?open=true", &breeder_token))
            .await
            .unwrap();

        let body = response.json().await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["id"], own.id);
    }
}
