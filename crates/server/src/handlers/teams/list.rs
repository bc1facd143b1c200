use std::sync::Arc;

use aide::{transform::TransformOperation, OperationIo};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{
    team, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use derive_more::{Display, Error, From};
use schemars::JsonSchema;
use serde::Deserialize;

use super::TeamData;
use crate::{
    auth::SessionContext,
    pagination::Pagination,
    policy::{Access, Forbidden, Resource},
};

/// Team list filters.
#[derive(Deserialize, JsonSchema)]
pub(super) struct TeamListQuery {
    /// Only list teams of the provided breeder.
    #[serde(default)]
    breeder_id: Option<i64>,
}

#[derive(ErrorResponse, Display, From, Error, OperationIo)]
#[aide(output)]
pub(super) enum TeamListError {
    DatabaseError(DbErr),

    #[status(StatusCode::FORBIDDEN)]
    Forbidden(Forbidden),
}

/// Generate OAPI documentation for the [`list`] handler.
pub(super) fn docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get list of teams.")
        .response::<200, Json<Vec<TeamData>>>()
}

/// List teams visible to the current user.
pub(super) async fn list(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Query(pagination): Query<Pagination>,
    Query(filter): Query<TeamListQuery>,
) -> Result<Json<Vec<TeamData>>, TeamListError> {
    let grant = session.authorize(Resource::Team, Access::Read)?;

    let mut query = team::Entity::find();

    if grant.owned_by().is_some() {
        query = query.filter(team::Column::BreederId.eq(session.user_id()));
    }

    if let Some(breeder_id) = filter.breeder_id {
        query = query.filter(team::Column::BreederId.eq(breeder_id));
    }

    let teams = query
        .order_by_asc(team::Column::Name)
        .limit(pagination.limit())
        .offset(pagination.offset())
        .all(&*db)
        .await?;

    Ok(Json(teams.into_iter().map(TeamData::from).collect()))
}
