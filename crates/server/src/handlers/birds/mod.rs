/// Bird registration route.
mod create;

/// Bird deletion route.
mod delete;

/// Bird details route.
mod details;

/// Bird list route.
mod list;

/// Bird update route.
mod update;

use std::sync::Arc;

use aide::axum::{
    routing::get_with,
    ApiRouter,
};
use db::{
    bird, team, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QuerySelect, SelectExt,
};
use derive_more::{Display, Error};
use schemars::JsonSchema;
use serde::Serialize;

pub(crate) use create::{insert_bird, BirdCreationRequest};

/// Information about a single bird.
#[derive(Serialize, JsonSchema)]
pub(crate) struct BirdData {
    /// Bird identifier.
    #[schemars(example = "crate::schema::example_database_identifier")]
    pub id: i64,

    /// Owning breeder identifier.
    #[schemars(example = "crate::schema::example_database_identifier")]
    pub breeder_id: i64,

    /// Team identifier.
    #[schemars(example = "crate::schema::example_optional_database_identifier")]
    pub team_id: Option<i64>,

    /// Band country code.
    #[schemars(example = "crate::schema::example_band_country")]
    pub band_country: String,

    /// Band year.
    #[schemars(example = "crate::schema::example_band_year")]
    pub band_year: String,

    /// Band club code.
    #[schemars(example = "crate::schema::example_band_club")]
    pub band_club: String,

    /// Band serial number.
    #[schemars(example = "crate::schema::example_band_serial")]
    pub band_serial: String,

    /// Composite band string.
    #[schemars(example = "crate::schema::example_band")]
    pub band: String,

    pub name: Option<String>,

    pub color: Option<String>,

    #[schemars(example = "crate::schema::example_sex")]
    pub sex: bird::Sex,

    /// RFID tag value.
    #[schemars(example = "crate::schema::example_rfid")]
    pub rfid: Option<String>,

    pub is_lost: bool,

    pub is_active: bool,

    /// Registration time.
    #[schemars(example = "crate::schema::example_timestamp")]
    pub created_at: i64,
}

impl From<bird::Model> for BirdData {
    fn from(model: bird::Model) -> Self {
        Self {
            id: model.id,
            breeder_id: model.breeder_id,
            team_id: model.team_id,
            band_country: model.band_country,
            band_year: model.band_year,
            band_club: model.band_club,
            band_serial: model.band_serial,
            band: model.band,
            name: model.name,
            color: model.color,
            sex: model.sex,
            rfid: model.rfid,
            is_lost: model.is_lost,
            is_active: model.is_active,
            created_at: db::unix_timestamp(model.created_at),
        }
    }
}

/// Single bird mutation response.
#[derive(Serialize, JsonSchema)]
pub(super) struct BirdResponse {
    bird: BirdData,

    /// Human-readable operation result.
    #[schemars(example = "crate::schema::example_message")]
    message: String,
}

/// Provided team does not belong to the bird owner.
#[derive(Debug, Display, Error)]
#[display(fmt = "team does not belong to the bird owner")]
pub(crate) struct ForeignTeam;

/// Bird identity collision with another registered bird.
#[derive(Debug, Display, Error)]
pub(crate) enum IdentityConflict {
    #[display(fmt = "band is already registered")]
    Band,

    #[display(fmt = "RFID is already used by an active bird")]
    Rfid,
}

/// Check that a band and an RFID tag are not used by any other bird.
///
/// RFID tags only have to be unique among active birds.
pub(crate) async fn find_identity_conflict<C: ConnectionTrait + Send>(
    db: &C,
    band: &str,
    rfid: Option<&str>,
    exclude_id: Option<i64>,
) -> Result<Option<IdentityConflict>, DbErr> {
    let mut band_query = bird::Entity::find()
        .select_only()
        .filter(bird::Column::Band.eq(band));

    if let Some(id) = exclude_id {
        band_query = band_query.filter(bird::Column::Id.ne(id));
    }

    if band_query.exists(db).await? {
        return Ok(Some(IdentityConflict::Band));
    }

    let Some(rfid) = rfid else {
        return Ok(None);
    };

    let mut rfid_query = bird::Entity::find()
        .select_only()
        .filter(bird::Column::Rfid.eq(rfid))
        .filter(bird::Column::IsActive.eq(true));

    if let Some(id) = exclude_id {
        rfid_query = rfid_query.filter(bird::Column::Id.ne(id));
    }

    if rfid_query.exists(db).await? {
        return Ok(Some(IdentityConflict::Rfid));
    }

    Ok(None)
}

/// Check that a team exists and belongs to the provided breeder.
pub(crate) async fn team_belongs_to<C: ConnectionTrait + Send>(
    db: &C,
    team_id: i64,
    breeder_id: i64,
) -> Result<bool, DbErr> {
    team::Entity::find_by_id(team_id)
        .select_only()
        .filter(team::Column::BreederId.eq(breeder_id))
        .exists(db)
        .await
}

/// Create an [`ApiRouter`] that provides an API server with bird routes.
pub(crate) fn routes() -> ApiRouter<Arc<DatabaseConnection>> {
    ApiRouter::new()
        .api_route(
            "/",
            get_with(list::list, list::docs).post_with(create::create, create::docs),
        )
        .api_route(
            "/:id",
            get_with(details::details, details::docs)
                .put_with(update::update, update::docs)
                .delete_with(delete::delete, delete::docs),
        )
        .with_path_items(|op| op.tag("Birds"))
}
