use std::{collections::HashSet, sync::Arc};

use aide::{transform::TransformOperation, OperationIo};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{
    fee_scheme, prize_scheme, race_type, race_type_fee_scheme, race_type_prize_scheme,
    ActiveValue, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QuerySelect, SelectExt, TransactionErrorExt, TransactionTrait,
};
use derive_more::{Display, Error, From};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::{
    auth::SessionContext,
    policy::{Access, Forbidden, Resource},
    schema::example_error,
    validation::ValidatedJson,
};

#[derive(ErrorResponse, Display, From, Error, OperationIo)]
#[aide(output)]
pub(super) enum RaceTypeSchemesError {
    DatabaseError(DbErr),

    #[status(StatusCode::FORBIDDEN)]
    Forbidden(Forbidden),

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "race type not found")]
    RaceTypeNotFound,

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "fee scheme not found")]
    FeeSchemeNotFound,

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "prize scheme not found")]
    PrizeSchemeNotFound,

    /// The same scheme is linked more than once.
    #[status(StatusCode::BAD_REQUEST)]
    #[display(fmt = "scheme is linked more than once")]
    DuplicateLink,
}

/// Fee scheme link with a per-race-type fee.
#[derive(Serialize, Deserialize, Validate, JsonSchema)]
pub(super) struct FeeSchemeLink {
    #[schemars(example = "crate::schema::example_database_identifier")]
    fee_scheme_id: i64,

    #[validate(range(min = 0.0))]
    #[schemars(example = "crate::schema::example_amount")]
    fee: f64,
}

/// Prize scheme link with a per-race-type prize.
#[derive(Serialize, Deserialize, Validate, JsonSchema)]
pub(super) struct PrizeSchemeLink {
    #[schemars(example = "crate::schema::example_database_identifier")]
    prize_scheme_id: i64,

    #[validate(range(min = 0.0))]
    #[schemars(example = "crate::schema::example_amount")]
    prize: f64,
}

/// Scheme links of a race type.
#[derive(Serialize, JsonSchema)]
pub(super) struct RaceTypeSchemes {
    #[schemars(example = "crate::schema::example_database_identifier")]
    race_type_id: i64,

    fee_schemes: Vec<FeeSchemeLink>,

    prize_schemes: Vec<PrizeSchemeLink>,
}

/// Scheme link replacement response.
#[derive(Serialize, JsonSchema)]
pub(super) struct RaceTypeSchemesResponse {
    schemes: RaceTypeSchemes,

    #[schemars(example = "crate::schema::example_message")]
    message: String,
}

async fn load_links<C: ConnectionTrait>(
    db: &C,
    race_type_id: i64,
) -> Result<RaceTypeSchemes, DbErr> {
    let fee_schemes = race_type_fee_scheme::Entity::find()
        .filter(race_type_fee_scheme::Column::RaceTypeId.eq(race_type_id))
        .all(db)
        .await?
        .into_iter()
        .map(|link| FeeSchemeLink {
            fee_scheme_id: link.fee_scheme_id,
            fee: link.fee,
        })
        .collect();

    let prize_schemes = race_type_prize_scheme::Entity::find()
        .filter(race_type_prize_scheme::Column::RaceTypeId.eq(race_type_id))
        .all(db)
        .await?
        .into_iter()
        .map(|link| PrizeSchemeLink {
            prize_scheme_id: link.prize_scheme_id,
            prize: link.prize,
        })
        .collect();

    Ok(RaceTypeSchemes {
        race_type_id,
        fee_schemes,
        prize_schemes,
    })
}

/// Generate OAPI documentation for the [`details`] handler.
pub(super) fn details_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get fee and prize scheme links of a race type.")
        .response::<200, Json<RaceTypeSchemes>>()
        .response_with::<404, Json<Value>, _>(|op| {
            op.description("Race type not found.")
                .example(example_error(RaceTypeSchemesError::RaceTypeNotFound))
        })
}

/// Race type scheme links request handler.
pub(super) async fn details(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
) -> Result<Json<RaceTypeSchemes>, RaceTypeSchemesError> {
    session.authorize(Resource::RaceType, Access::Read)?;

    let exists = race_type::Entity::find_by_id(id)
        .select_only()
        .exists(&*db)
        .await?;

    if !exists {
        return Err(RaceTypeSchemesError::RaceTypeNotFound);
    }

    Ok(Json(load_links(&*db, id).await?))
}

/// Scheme link replacement request.
#[derive(Deserialize, Validate, JsonSchema)]
pub(super) struct RaceTypeSchemesRequest {
    #[serde(default)]
    #[validate]
    fee_schemes: Vec<FeeSchemeLink>,

    #[serde(default)]
    #[validate]
    prize_schemes: Vec<PrizeSchemeLink>,
}

/// Generate OAPI documentation for the [`replace`] handler.
pub(super) fn replace_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Replace fee and prize scheme links of a race type.")
        .description("Existing links are removed and the provided ones are stored instead.")
        .response::<200, Json<RaceTypeSchemesResponse>>()
        .response_with::<400, Json<Value>, _>(|op| {
            op.description("The same scheme is linked more than once.")
                .example(example_error(RaceTypeSchemesError::DuplicateLink))
        })
}

/// Race type scheme link replacement handler.
pub(super) async fn replace(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<RaceTypeSchemesRequest>,
) -> Result<Json<RaceTypeSchemesResponse>, RaceTypeSchemesError> {
    session.authorize(Resource::RaceType, Access::Write)?;

    let fee_scheme_ids: HashSet<i64> = request
        .fee_schemes
        .iter()
        .map(|link| link.fee_scheme_id)
        .collect();
    let prize_scheme_ids: HashSet<i64> = request
        .prize_schemes
        .iter()
        .map(|link| link.prize_scheme_id)
        .collect();

    if fee_scheme_ids.len() != request.fee_schemes.len()
        || prize_scheme_ids.len() != request.prize_schemes.len()
    {
        return Err(RaceTypeSchemesError::DuplicateLink);
    }

    db.transaction(|txn| {
        Box::pin(async move {
            let exists = race_type::Entity::find_by_id(id)
                .select_only()
                .exists(txn)
                .await?;

            if !exists {
                return Err(RaceTypeSchemesError::RaceTypeNotFound);
            }

            let found_fee_schemes = fee_scheme::Entity::find()
                .filter(fee_scheme::Column::Id.is_in(fee_scheme_ids.iter().copied()))
                .count(txn)
                .await?;

            if found_fee_schemes != fee_scheme_ids.len() as u64 {
                return Err(RaceTypeSchemesError::FeeSchemeNotFound);
            }

            let found_prize_schemes = prize_scheme::Entity::find()
                .filter(prize_scheme::Column::Id.is_in(prize_scheme_ids.iter().copied()))
                .count(txn)
                .await?;

            if found_prize_schemes != prize_scheme_ids.len() as u64 {
                return Err(RaceTypeSchemesError::PrizeSchemeNotFound);
            }

            race_type_fee_scheme::Entity::delete_many()
                .filter(race_type_fee_scheme::Column::RaceTypeId.eq(id))
                .exec(txn)
                .await?;

            race_type_prize_scheme::Entity::delete_many()
                .filter(race_type_prize_scheme::Column::RaceTypeId.eq(id))
                .exec(txn)
                .await?;

            if !request.fee_schemes.is_empty() {
                race_type_fee_scheme::Entity::insert_many(request.fee_schemes.iter().map(
                    |link| race_type_fee_scheme::ActiveModel {
                        race_type_id: ActiveValue::Set(id),
                        fee_scheme_id: ActiveValue::Set(link.fee_scheme_id),
                        fee: ActiveValue::Set(link.fee),
                    },
                ))
                .exec_without_returning(txn)
                .await?;
            }

            if !request.prize_schemes.is_empty() {
                race_type_prize_scheme::Entity::insert_many(request.prize_schemes.iter().map(
                    |link| race_type_prize_scheme::ActiveModel {
                        race_type_id: ActiveValue::Set(id),
                        prize_scheme_id: ActiveValue::Set(link.prize_scheme_id),
                        prize: ActiveValue::Set(link.prize),
                    },
                ))
                .exec_without_returning(txn)
                .await?;
            }

            Ok(Json(RaceTypeSchemesResponse {
                schemes: load_links(txn, id).await?,
                message: String::from("Race type schemes updated successfully"),
            }))
        })
    })
    .await
    .into_raw_result()
}
