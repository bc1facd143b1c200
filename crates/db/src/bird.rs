//! Registered bird.
//!
//! Every bird is owned by exactly one breeder and is identified by its leg
//! band. The band is stored both as four separate fragments and as a
//! composite string, which is used for lookups by arrival scanners.
//! Use [`compose_band`] whenever any fragment changes to keep both
//! representations consistent.

use schemars::JsonSchema;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Separator used between band fragments in the composite band string.
pub const BAND_SEPARATOR: char = '-';

/// Bird model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "birds")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub breeder_id: i64,
    pub team_id: Option<i64>,
    pub band_country: String,
    pub band_year: String,
    pub band_club: String,
    pub band_serial: String,
    pub band: String,
    pub name: Option<String>,
    pub color: Option<String>,
    pub sex: Sex,
    pub rfid: Option<String>,
    pub is_lost: bool,
    pub is_active: bool,
    pub created_at: TimeDateTime,
}

#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[sea_orm(rs_type = "i16", db_type = "Integer")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sex {
    #[default]
    #[sea_orm(num_value = 0)]
    Unknown,
    #[sea_orm(num_value = 1)]
    Cock,
    #[sea_orm(num_value = 2)]
    Hen,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::BreederId",
        to = "super::user::Column::Id"
    )]
    Breeder,

    #[sea_orm(
        belongs_to = "super::team::Entity",
        from = "Column::TeamId",
        to = "super::team::Column::Id"
    )]
    Team,

    #[sea_orm(has_many = "super::race_item::Entity")]
    RaceItems,

    #[sea_orm(has_many = "super::event_inventory_item::Entity")]
    EventInventoryItems,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Breeder.def()
    }
}

impl Related<super::team::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Team.def()
    }
}

impl Related<super::race_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RaceItems.def()
    }
}

impl Related<super::event_inventory_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EventInventoryItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Build a composite band string out of its fragments.
///
/// ## Example
///
/// ```
/// use db::bird::compose_band;
///
/// assert_eq!(compose_band("PHA", "2024", "MNL", "01234"), "PHA-2024-MNL-01234");
/// ```
pub fn compose_band(country: &str, year: &str, club: &str, serial: &str) -> String {
    [country, year, club, serial].join(&BAND_SEPARATOR.to_string())
}

impl Model {
    /// Composite band string derived from the currently stored fragments.
    pub fn derived_band(&self) -> String {
        compose_band(
            &self.band_country,
            &self.band_year,
            &self.band_club,
            &self.band_serial,
        )
    }
}
