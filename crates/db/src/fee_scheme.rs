//! Reusable fee configuration.
//!
//! A fee scheme charges an optional flat perch fee per event registration,
//! and a per-bird fee indexed by the bird sequence number inside an event
//! inventory (see [`perch_fee_item`]).
//!
//! [`perch_fee_item`]: super::perch_fee_item

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "fee_schemes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub perch_fee: f64,
    pub created_by: i64,
    pub created_at: TimeDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::perch_fee_item::Entity")]
    Items,

    #[sea_orm(has_many = "super::event::Entity")]
    Events,
}

impl Related<super::perch_fee_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Events.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
