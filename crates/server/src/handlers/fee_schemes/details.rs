use std::sync::Arc;

use aide::{transform::TransformOperation, OperationIo};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{fee_scheme, DatabaseConnection, DbErr, EntityTrait};
use derive_more::{Display, Error, From};
use serde_json::Value;

use super::FeeSchemeDetails;
use crate::{
    auth::SessionContext,
    policy::{Access, Forbidden, Owner, Resource},
    schema::example_error,
};

#[derive(ErrorResponse, Display, From, Error, OperationIo)]
#[aide(output)]
pub(super) enum FeeSchemeDetailsError {
    DatabaseError(DbErr),

    #[status(StatusCode::FORBIDDEN)]
    Forbidden(Forbidden),

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "fee scheme not found")]
    FeeSchemeNotFound,
}

/// Generate OAPI documentation for the [`details`] handler.
pub(super) fn docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get fee scheme details with its line items.")
        .response::<200, Json<FeeSchemeDetails>>()
        .response_with::<404, Json<Value>, _>(|op| {
            op.description("Fee scheme not found.")
                .example(example_error(FeeSchemeDetailsError::FeeSchemeNotFound))
        })
}

/// Fee scheme details request handler.
pub(super) async fn details(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
) -> Result<Json<FeeSchemeDetails>, FeeSchemeDetailsError> {
    let grant = session.authorize(Resource::Scheme, Access::Read)?;

    let scheme = fee_scheme::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or(FeeSchemeDetailsError::FeeSchemeNotFound)?;

    grant.check(Owner::creator(scheme.created_by))?;

    Ok(Json(FeeSchemeDetails::load(&*db, scheme).await?))
}
