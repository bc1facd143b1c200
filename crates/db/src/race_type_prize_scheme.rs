//! Link between a race type and a prize scheme with a per-type prize override.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "race_type_prize_schemes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub race_type_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub prize_scheme_id: i64,
    pub prize: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::race_type::Entity",
        from = "Column::RaceTypeId",
        to = "super::race_type::Column::Id"
    )]
    RaceType,

    #[sea_orm(
        belongs_to = "super::prize_scheme::Entity",
        from = "Column::PrizeSchemeId",
        to = "super::prize_scheme::Column::Id"
    )]
    PrizeScheme,
}

impl Related<super::race_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RaceType.def()
    }
}

impl Related<super::prize_scheme::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PrizeScheme.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
