//! Prize amount for an inclusive finishing position range of a race type.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "prize_scheme_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub prize_scheme_id: i64,
    pub race_type_id: i64,
    pub from_position: i32,
    pub to_position: i32,
    pub prize: f64,
}

impl Model {
    /// Check if the provided finishing position falls into this item range.
    pub fn covers(&self, position: i32) -> bool {
        (self.from_position..=self.to_position).contains(&position)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::prize_scheme::Entity",
        from = "Column::PrizeSchemeId",
        to = "super::prize_scheme::Column::Id"
    )]
    PrizeScheme,

    #[sea_orm(
        belongs_to = "super::race_type::Entity",
        from = "Column::RaceTypeId",
        to = "super::race_type::Column::Id"
    )]
    RaceType,
}

impl Related<super::prize_scheme::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PrizeScheme.def()
    }
}

impl Related<super::race_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RaceType.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
