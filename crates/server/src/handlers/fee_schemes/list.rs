use std::sync::Arc;

use aide::{transform::TransformOperation, OperationIo};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{
    fee_scheme, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use derive_more::{Display, Error, From};

use super::FeeSchemeData;
use crate::{
    auth::SessionContext,
    pagination::Pagination,
    policy::{Access, Forbidden, OwnedBy, Resource},
};

#[derive(ErrorResponse, Display, From, Error, OperationIo)]
#[aide(output)]
pub(super) enum FeeSchemeListError {
    DatabaseError(DbErr),

    #[status(StatusCode::FORBIDDEN)]
    Forbidden(Forbidden),
}

/// Generate OAPI documentation for the [`list`] handler.
pub(super) fn docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get list of fee schemes.")
        .description("Administrators only see schemes created by them.")
        .response::<200, Json<Vec<FeeSchemeData>>>()
}

/// Fee scheme list request handler.
pub(super) async fn list(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<FeeSchemeData>>, FeeSchemeListError> {
    let grant = session.authorize(Resource::Scheme, Access::Read)?;

    let mut query = fee_scheme::Entity::find();

    if let Some(OwnedBy::Creator(user_id)) = grant.owned_by() {
        query = query.filter(fee_scheme::Column::CreatedBy.eq(user_id));
    }

    let schemes = query
        .order_by_desc(fee_scheme::Column::CreatedAt)
        .order_by_desc(fee_scheme::Column::Id)
        .limit(pagination.limit())
        .offset(pagination.offset())
        .all(&*db)
        .await?;

    Ok(Json(schemes.into_iter().map(FeeSchemeData::from).collect()))
}
