//! Competition period.
//!
//! An event binds one fee scheme, one prize scheme and one betting scheme
//! together, and owns races and breeder registrations (event inventories).
//! Breeders may only register into open events.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub event_type_id: i64,
    pub fee_scheme_id: i64,
    pub prize_scheme_id: i64,
    pub betting_scheme_id: i64,
    pub is_open: bool,
    pub starts_at: TimeDateTime,
    pub ends_at: TimeDateTime,
    pub created_by: i64,
    pub created_at: TimeDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::event_type::Entity",
        from = "Column::EventTypeId",
        to = "super::event_type::Column::Id"
    )]
    EventType,

    #[sea_orm(
        belongs_to = "super::fee_scheme::Entity",
        from = "Column::FeeSchemeId",
        to = "super::fee_scheme::Column::Id"
    )]
    FeeScheme,

    #[sea_orm(
        belongs_to = "super::prize_scheme::Entity",
        from = "Column::PrizeSchemeId",
        to = "super::prize_scheme::Column::Id"
    )]
    PrizeScheme,

    #[sea_orm(
        belongs_to = "super::betting_scheme::Entity",
        from = "Column::BettingSchemeId",
        to = "super::betting_scheme::Column::Id"
    )]
    BettingScheme,

    #[sea_orm(has_many = "super::event_inventory::Entity")]
    Inventories,

    #[sea_orm(has_many = "super::race::Entity")]
    Races,
}

impl Related<super::event_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EventType.def()
    }
}

impl Related<super::fee_scheme::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FeeScheme.def()
    }
}

impl Related<super::prize_scheme::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PrizeScheme.def()
    }
}

impl Related<super::betting_scheme::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BettingScheme.def()
    }
}

impl Related<super::event_inventory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Inventories.def()
    }
}

impl Related<super::race::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Races.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
