//! A single race of an event.
//!
//! Race lifecycle is linear: a newly created race is neither live nor closed,
//! starting the race makes it live, and closing it clears the live flag and
//! fixes finishing positions. Arrival scans are only accepted for live races.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "races")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub event_id: i64,
    pub race_type_id: i64,
    pub name: String,
    pub release_at: Option<TimeDateTime>,
    pub distance_km: Option<f64>,
    pub is_live: bool,
    pub is_closed: bool,
    pub created_by: i64,
    pub created_at: TimeDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::event::Entity",
        from = "Column::EventId",
        to = "super::event::Column::Id"
    )]
    Event,

    #[sea_orm(
        belongs_to = "super::race_type::Entity",
        from = "Column::RaceTypeId",
        to = "super::race_type::Column::Id"
    )]
    RaceType,

    #[sea_orm(has_many = "super::race_item::Entity")]
    Items,

    #[sea_orm(has_many = "super::basket::Entity")]
    Baskets,
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
}

impl Related<super::race_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RaceType.def()
    }
}

impl Related<super::race_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl Related<super::basket::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Baskets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
