use std::sync::Arc;

use aide::{transform::TransformOperation, OperationIo};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{event_type, DatabaseConnection, DbErr, EntityTrait, QueryOrder, QuerySelect};
use derive_more::{Display, Error, From};

use super::EventTypeData;
use crate::{
    auth::SessionContext,
    pagination::Pagination,
    policy::{Access, Forbidden, Resource},
};

#[derive(ErrorResponse, Display, From, Error, OperationIo)]
#[aide(output)]
pub(super) enum EventTypeListError {
    DatabaseError(DbErr),

    #[status(StatusCode::FORBIDDEN)]
    Forbidden(Forbidden),
}

/// Generate OAPI documentation for the [`list`] handler.
pub(super) fn docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get list of event types.")
        .response::<200, Json<Vec<EventTypeData>>>()
}

/// Event type list request handler.
pub(super) async fn list(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<EventTypeData>>, EventTypeListError> {
    session.authorize(Resource::EventType, Access::Read)?;

    let event_types = event_type::Entity::find()
        .order_by_asc(event_type::Column::Name)
        .limit(pagination.limit())
        .offset(pagination.offset())
        .all(&*db)
        .await?;

    Ok(Json(
        event_types.into_iter().map(EventTypeData::from).collect(),
    ))
}
