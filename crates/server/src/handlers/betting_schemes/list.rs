use std::sync::Arc;

use aide::{transform::TransformOperation, OperationIo};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{
    betting_scheme, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use derive_more::{Display, Error, From};
use serde_json::Value;

use super::BettingSchemeData;
use crate::{
    auth::SessionContext,
    pagination::Pagination,
    policy::{Access, Forbidden, OwnedBy, Owner, Resource},
    schema::example_error,
};

#[derive(ErrorResponse, Display, From, Error, OperationIo)]
#[aide(output)]
pub(super) enum BettingSchemeQueryError {
    DatabaseError(DbErr),

    #[status(StatusCode::FORBIDDEN)]
    Forbidden(Forbidden),

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "betting scheme not found")]
    BettingSchemeNotFound,
}

/// Generate OAPI documentation for the [`list`] handler.
pub(super) fn list_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get list of betting schemes.")
        .response::<200, Json<Vec<BettingSchemeData>>>()
}

/// Betting scheme list request handler.
pub(super) async fn list(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<BettingSchemeData>>, BettingSchemeQueryError> {
    let grant = session.authorize(Resource::Scheme, Access::Read)?;

    let mut query = betting_scheme::Entity::find();

    if let Some(OwnedBy::Creator(user_id)) = grant.owned_by() {
        query = query.filter(betting_scheme::Column::CreatedBy.eq(user_id));
    }

    let schemes = query
        .order_by_desc(betting_scheme::Column::Id)
        .limit(pagination.limit())
        .offset(pagination.offset())
        .all(&*db)
        .await?;

    Ok(Json(
        schemes.into_iter().map(BettingSchemeData::from).collect(),
    ))
}

/// Generate OAPI documentation for the [`details`] handler.
pub(super) fn details_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get betting scheme details.")
        .response::<200, Json<BettingSchemeData>>()
        .response_with::<404, Json<Value>, _>(|op| {
            op.description("Betting scheme not found.")
                .example(example_error(BettingSchemeQueryError::BettingSchemeNotFound))
        })
}

/// Betting scheme details request handler.
pub(super) async fn details(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
) -> Result<Json<BettingSchemeData>, BettingSchemeQueryError> {
    let grant = session.authorize(Resource::Scheme, Access::Read)?;

    let scheme = betting_scheme::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or(BettingSchemeQueryError::BettingSchemeNotFound)?;

    grant.check(Owner::creator(scheme.created_by))?;

    Ok(Json(scheme.into()))
}
