use std::sync::Arc;

use aide::{transform::TransformOperation, OperationIo};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{
    prize_scheme, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use derive_more::{Display, Error, From};

use super::PrizeSchemeData;
use crate::{
    auth::SessionContext,
    pagination::Pagination,
    policy::{Access, Forbidden, OwnedBy, Resource},
};

#[derive(ErrorResponse, Display, From, Error, OperationIo)]
#[aide(output)]
pub(super) enum PrizeSchemeListError {
    DatabaseError(DbErr),

    #[status(StatusCode::FORBIDDEN)]
    Forbidden(Forbidden),
}

/// Generate OAPI documentation for the [`list`] handler.
pub(super) fn docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get list of prize schemes.")
        .response::<200, Json<Vec<PrizeSchemeData>>>()
}

/// Prize scheme list request handler.
pub(super) async fn list(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<PrizeSchemeData>>, PrizeSchemeListError> {
    let grant = session.authorize(Resource::Scheme, Access::Read)?;

    let mut query = prize_scheme::Entity::find();

    if let Some(OwnedBy::Creator(user_id)) = grant.owned_by() {
        query = query.filter(prize_scheme::Column::CreatedBy.eq(user_id));
    }

    let schemes = query
        .order_by_desc(prize_scheme::Column::Id)
        .limit(pagination.limit())
        .offset(pagination.offset())
        .all(&*db)
        .await?;

    Ok(Json(
        schemes.into_iter().map(PrizeSchemeData::from).collect(),
    ))
}
