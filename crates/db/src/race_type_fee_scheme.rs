//! Link between a race type and a fee scheme with a per-type fee override.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "race_type_fee_schemes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub race_type_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub fee_scheme_id: i64,
    pub fee: f64,
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
        belongs_to = "super::fee_scheme::Entity",
        from = "Column::FeeSchemeId",
        to = "super::fee_scheme::Column::Id"
    )]
    FeeScheme,
}

impl Related<super::race_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RaceType.def()
    }
}

impl Related<super::fee_scheme::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FeeScheme.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
