//! Breeder registration into an event.
//!
//! `reserved_birds` is the capacity of the registration, while
//! `registered_birds` counts the inventory items created so far.
//! The counter is the only capacity guard, thus it must be changed
//! in the same transaction as the items it counts.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "event_inventories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub event_id: i64,
    pub breeder_id: i64,
    pub reserved_birds: i32,
    pub registered_birds: i32,
    pub created_at: TimeDateTime,
}

impl Model {
    /// Check if no more birds can be registered.
    pub fn is_full(&self) -> bool {
        self.registered_birds >= self.reserved_birds
    }
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
        belongs_to = "super::user::Entity",
        from = "Column::BreederId",
        to = "super::user::Column::Id"
    )]
    Breeder,

    #[sea_orm(has_many = "super::event_inventory_item::Entity")]
    Items,

    #[sea_orm(has_many = "super::payment::Entity")]
    Payments,
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Breeder.def()
    }
}

impl Related<super::event_inventory_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
