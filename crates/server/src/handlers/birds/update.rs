use std::sync::Arc;

use aide::{transform::TransformOperation, OperationIo};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use axum_derive_error::ErrorResponse;
use db::{
    bird, ActiveModelTrait, ActiveValue, DatabaseConnection, DbErr, EntityTrait,
    TransactionErrorExt, TransactionTrait,
};
use derive_more::{Display, Error, From};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use super::{find_identity_conflict, team_belongs_to, BirdResponse, ForeignTeam, IdentityConflict};
use crate::{
    auth::SessionContext,
    policy::{Access, Forbidden, Owner, Resource},
    schema::example_error,
    validation::ValidatedJson,
};

#[derive(ErrorResponse, Display, From, Error, OperationIo)]
#[aide(output)]
pub(super) enum BirdUpdateError {
    DatabaseError(DbErr),

    #[status(StatusCode::FORBIDDEN)]
    Forbidden(Forbidden),

    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "bird not found")]
    BirdNotFound,

    #[status(StatusCode::BAD_REQUEST)]
    ForeignTeam(ForeignTeam),

    #[status(StatusCode::CONFLICT)]
    Conflict(IdentityConflict),
}

/// Bird update request.
///
/// Omitted fields are left unchanged. Nullable fields can be cleared with
/// an explicit `null`.
#[derive(Deserialize, Validate, JsonSchema)]
pub(super) struct BirdUpdateRequest {
    #[serde(default, deserialize_with = "crate::validation::deserialize_present")]
    #[schemars(example = "crate::schema::example_optional_database_identifier")]
    team_id: Option<Option<i64>>,

    #[validate(length(min = 1, max = 8), regex = "crate::validation::BAND_FRAGMENT_REGEX")]
    #[schemars(example = "crate::schema::example_band_country")]
    band_country: Option<String>,

    #[validate(length(min = 1, max = 8), regex = "crate::validation::BAND_FRAGMENT_REGEX")]
    #[schemars(example = "crate::schema::example_band_year")]
    band_year: Option<String>,

    #[validate(length(min = 1, max = 16), regex = "crate::validation::BAND_FRAGMENT_REGEX")]
    #[schemars(example = "crate::schema::example_band_club")]
    band_club: Option<String>,

    #[validate(length(min = 1, max = 16), regex = "crate::validation::BAND_FRAGMENT_REGEX")]
    #[schemars(example = "crate::schema::example_band_serial")]
    band_serial: Option<String>,

    #[validate(length(max = 128))]
    name: Option<String>,

    #[validate(length(max = 64))]
    color: Option<String>,

    #[schemars(example = "crate::schema::example_sex")]
    sex: Option<bird::Sex>,

    #[serde(default, deserialize_with = "crate::validation::deserialize_present")]
    #[schemars(example = "crate::schema::example_rfid")]
    rfid: Option<Option<String>>,

    is_lost: Option<bool>,

    is_active: Option<bool>,
}

/// Generate OAPI documentation for the [`update`] handler.
pub(super) fn docs(op: TransformOperation) -> TransformOperation {
    op.summary("Update bird.")
        .description("Changing any band fragment recomposes the composite band.")
        .response::<200, Json<BirdResponse>>()
        .response_with::<404, Json<Value>, _>(|op| {
            op.description("Bird not found.")
                .example(example_error(BirdUpdateError::BirdNotFound))
        })
        .response_with::<409, Json<Value>, _>(|op| {
            op.description("Band or RFID tag is already in use.")
                .example(example_error(BirdUpdateError::Conflict(IdentityConflict::Rfid)))
        })
}

/// Bird update handler.
pub(super) async fn update(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<BirdUpdateRequest>,
) -> Result<Json<BirdResponse>, BirdUpdateError> {
    let grant = session.authorize(Resource::Bird, Access::Write)?;

    db.transaction(|txn| {
        Box::pin(async move {
            let model = bird::Entity::find_by_id(id)
                .one(txn)
                .await?
                .ok_or(BirdUpdateError::BirdNotFound)?;

            grant.check(Owner::breeder(model.breeder_id))?;

            let band_country = request.band_country.unwrap_or(model.band_country.clone());
            let band_year = request.band_year.unwrap_or(model.band_year.clone());
            let band_club = request.band_club.unwrap_or(model.band_club.clone());
            let band_serial = request.band_serial.unwrap_or(model.band_serial.clone());
            let band = bird::compose_band(&band_country, &band_year, &band_club, &band_serial);

            let rfid = request
                .rfid
                .map(|rfid| rfid.filter(|value| !value.is_empty()))
                .unwrap_or(model.rfid.clone());
            let is_active = request.is_active.unwrap_or(model.is_active);

            let checked_rfid = rfid.as_deref().filter(|_| is_active);

            if let Some(conflict) = find_identity_conflict(txn, &band, checked_rfid, Some(id)).await? {
                return Err(conflict.into());
            }

            if let Some(Some(team_id)) = request.team_id {
                if !team_belongs_to(txn, team_id, model.breeder_id).await? {
                    return Err(ForeignTeam.into());
                }
            }

            let mut active: bird::ActiveModel = model.into();

            active.band_country = ActiveValue::Set(band_country);
            active.band_year = ActiveValue::Set(band_year);
            active.band_club = ActiveValue::Set(band_club);
            active.band_serial = ActiveValue::Set(band_serial);
            active.band = ActiveValue::Set(band);
            active.rfid = ActiveValue::Set(rfid);
            active.is_active = ActiveValue::Set(is_active);

            if let Some(team_id) = request.team_id {
                active.team_id = ActiveValue::Set(team_id);
            }

            if let Some(name) = request.name {
                active.name = ActiveValue::Set(Some(name));
            }

            if let Some(color) = request.color {
                active.color = ActiveValue::Set(Some(color));
            }

            if let Some(sex) = request.sex {
                active.sex = ActiveValue::Set(sex);
            }

            if let Some(is_lost) = request.is_lost {
                active.is_lost = ActiveValue::Set(is_lost);
            }

            let model = active.update(txn).await?;

            Ok(Json(BirdResponse {
                bird: model.into(),
                message: String::from("Bird updated successfully"),
            }))
        })
    })
    .await
    .into_raw_result()
}
