use std::sync::Arc;

use aide::{transform::TransformOperation, OperationIo};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{prize_scheme, DatabaseConnection, DbErr, EntityTrait};
use derive_more::{Display, Error, From};
use serde_json::Value;

use super::PrizeSchemeDetails;
use crate::{
    auth::SessionContext,
    policy::{Access, Forbidden, Owner, Resource},
    schema::example_error,
};

#[derive(ErrorResponse, Display, From, Error, OperationIo)]
#[aide(output)]
pub(super) enum PrizeSchemeDetailsError {
    DatabaseError(DbErr),

    #[status(StatusCode::FORBIDDEN)]
    Forbidden(Forbidden),

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "fee scheme not found")]
    PrizeSchemeNotFound,
}

/// Generate OAPI documentation for the [`details`] handler.
pub(super) fn docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get fee scheme details with its line items.")
        .response::<200, Json<PrizeSchemeDetails>>()
        .response_with::<404, Json<Value>, _>(|op| {
            op.description("Prize scheme not found.")
                .example(example_error(PrizeSchemeDetailsError::PrizeSchemeNotFound))
        })
}

/// Prize scheme details request handler.
pub(super) async fn details(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
) -> Result<Json<PrizeSchemeDetails>, PrizeSchemeDetailsError> {
    let grant = session.authorize(Resource::Scheme, Access::Read)?;

    let scheme = prize_scheme::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or(PrizeSchemeDetailsError::PrizeSchemeNotFound)?;

    grant.check(Owner::creator(scheme.created_by))?;

    Ok(Json(PrizeSchemeDetails::load(&*db, scheme).await?))
}
