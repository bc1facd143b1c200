//! A single bird registered into an event inventory.
//!
//! Betting class flags select the sub-competitions the bird is entered in.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "event_inventory_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub event_inventory_id: i64,
    pub event_id: i64,
    pub bird_id: i64,
    pub arrived_at: Option<TimeDateTime>,
    pub departed_at: Option<TimeDateTime>,
    pub is_backup: bool,
    pub bet_standard: bool,
    pub bet_show_low: bool,
    pub bet_show_mid: bool,
    pub bet_show_high: bool,
    pub bet_winner_takes_all: bool,
    pub created_at: TimeDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::event_inventory::Entity",
        from = "Column::EventInventoryId",
        to = "super::event_inventory::Column::Id"
    )]
    EventInventory,

    #[sea_orm(
        belongs_to = "super::bird::Entity",
        from = "Column::BirdId",
        to = "super::bird::Column::Id"
    )]
    Bird,
}

impl Related<super::event_inventory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EventInventory.def()
    }
}

impl Related<super::bird::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bird.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
