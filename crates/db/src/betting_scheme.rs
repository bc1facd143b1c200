//! Betting configuration.
//!
//! Each betting class an event inventory item can be entered into
//! has a fixed entry amount, and the organizer keeps `cut_percentage`
//! of the collected pool.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "betting_schemes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub cut_percentage: f64,
    pub standard_amount: f64,
    pub show_low_amount: f64,
    pub show_mid_amount: f64,
    pub show_high_amount: f64,
    pub winner_takes_all_amount: f64,
    pub created_by: i64,
    pub created_at: TimeDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::event::Entity")]
    Events,
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Events.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
