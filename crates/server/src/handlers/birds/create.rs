use std::sync::Arc;

use aide::{transform::TransformOperation, OperationIo};
use axum::{extract::State, http::StatusCode, Extension, Json};
use axum_derive_error::ErrorResponse;
use db::{
    bird, user, ActiveModelTrait, ActiveValue, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QuerySelect, SelectExt, TransactionErrorExt, TransactionTrait,
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

/// Errors that may occur during bird registration.
#[derive(ErrorResponse, Display, From, Error, OperationIo)]
#[aide(output)]
pub(super) enum BirdCreationError {
    /// Database-related error.
    DatabaseError(DbErr),

    #[status(StatusCode::FORBIDDEN)]
    Forbidden(Forbidden),

    /// Provided breeder does not exist.
    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "breeder not found")]
    BreederNotFound,

    #[status(StatusCode::BAD_REQUEST)]
    ForeignTeam(ForeignTeam),

    /// Band or RFID tag is already in use.
    #[status(StatusCode::CONFLICT)]
    Conflict(IdentityConflict),
}

/// New bird information.
#[derive(Deserialize, Validate, JsonSchema)]
pub(crate) struct BirdCreationRequest {
    /// Team to assign the bird to.
    #[serde(default)]
    #[schemars(example = "crate::schema::example_optional_database_identifier")]
    team_id: Option<i64>,

    /// Band country code.
    #[validate(length(min = 1, max = 8), regex = "crate::validation::BAND_FRAGMENT_REGEX")]
    #[schemars(example = "crate::schema::example_band_country")]
    band_country: String,

    /// Band year.
    #[validate(length(min = 1, max = 8), regex = "crate::validation::BAND_FRAGMENT_REGEX")]
    #[schemars(example = "crate::schema::example_band_year")]
    band_year: String,

    /// Band club code.
    #[validate(length(min = 1, max = 16), regex = "crate::validation::BAND_FRAGMENT_REGEX")]
    #[schemars(example = "crate::schema::example_band_club")]
    band_club: String,

    /// Band serial number.
    #[validate(length(min = 1, max = 16), regex = "crate::validation::BAND_FRAGMENT_REGEX")]
    #[schemars(example = "crate::schema::example_band_serial")]
    band_serial: String,

    #[serde(default)]
    #[validate(length(max = 128))]
    name: Option<String>,

    #[serde(default)]
    #[validate(length(max = 64))]
    color: Option<String>,

    #[serde(default)]
    #[schemars(example = "crate::schema::example_sex")]
    sex: bird::Sex,

    /// RFID tag value.
    #[serde(default)]
    #[validate(length(min = 1, max = 64))]
    #[schemars(example = "crate::schema::example_rfid")]
    rfid: Option<String>,

    #[serde(default)]
    is_lost: bool,

    #[serde(default = "default_active")]
    is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Insert a new bird owned by the provided breeder.
///
/// The band has to be unique across all birds, while RFID tags only
/// collide with other active birds.
pub(crate) async fn insert_bird<C, E>(
    db: &C,
    breeder_id: i64,
    request: BirdCreationRequest,
) -> Result<bird::Model, E>
where
    C: ConnectionTrait + Send,
    E: From<DbErr> + From<IdentityConflict> + From<ForeignTeam>,
{
    let band = bird::compose_band(
        &request.band_country,
        &request.band_year,
        &request.band_club,
        &request.band_serial,
    );

    let checked_rfid = request.rfid.as_deref().filter(|_| request.is_active);

    if let Some(conflict) = find_identity_conflict(db, &band, checked_rfid, None).await? {
        return Err(conflict.into());
    }

    if let Some(team_id) = request.team_id {
        if !team_belongs_to(db, team_id, breeder_id).await? {
            return Err(ForeignTeam.into());
        }
    }

    let model = bird::ActiveModel {
        breeder_id: ActiveValue::Set(breeder_id),
        team_id: ActiveValue::Set(request.team_id),
        band_country: ActiveValue::Set(request.band_country),
        band_year: ActiveValue::Set(request.band_year),
        band_club: ActiveValue::Set(request.band_club),
        band_serial: ActiveValue::Set(request.band_serial),
        band: ActiveValue::Set(band),
        name: ActiveValue::Set(request.name),
        color: ActiveValue::Set(request.color),
        sex: ActiveValue::Set(request.sex),
        rfid: ActiveValue::Set(request.rfid),
        is_lost: ActiveValue::Set(request.is_lost),
        is_active: ActiveValue::Set(request.is_active),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(model)
}

/// Bird registration request.
#[derive(Deserialize, Validate, JsonSchema)]
pub(super) struct BirdRegistrationRequest {
    /// Owning breeder, defaults to the current user.
    #[serde(default)]
    #[schemars(example = "crate::schema::example_optional_database_identifier")]
    breeder_id: Option<i64>,

    #[serde(flatten)]
    #[validate]
    bird: BirdCreationRequest,
}

/// Generate OAPI documentation for the [`create`] handler.
pub(super) fn docs(op: TransformOperation) -> TransformOperation {
    op.summary("Register new bird.")
        .description("The composite band is derived from the provided band fragments.")
        .response::<200, Json<BirdResponse>>()
        .response_with::<409, Json<Value>, _>(|op| {
            op.description("Band or RFID tag is already in use.")
                .example(example_error(BirdCreationError::Conflict(
                    IdentityConflict::Band,
                )))
        })
}

/// Bird registration handler.
pub(super) async fn create(
    Extension(session): Extension<SessionContext>,
    State(db): State<Arc<DatabaseConnection>>,
    ValidatedJson(request): ValidatedJson<BirdRegistrationRequest>,
) -> Result<Json<BirdResponse>, BirdCreationError> {
    let breeder_id = request.breeder_id.unwrap_or(session.user_id());

    session
        .authorize(Resource::Bird, Access::Write)?
        .check(Owner::breeder(breeder_id))?;

    db.transaction(|txn| {
        Box::pin(async move {
            let breeder_exists = user::Entity::find_by_id(breeder_id)
                .select_only()
                .exists(txn)
                .await?;

            if !breeder_exists {
                return Err(BirdCreationError::BreederNotFound);
            }

            let model = insert_bird::<_, BirdCreationError>(txn, breeder_id, request.bird).await?;

            Ok(Json(BirdResponse {
                bird: model.into(),
                message: String::from("Bird created successfully"),
            }))
        })
    })
    .await
    .into_raw_result()
}
