//! Race type reference data, managed by super administrators.
//!
//! Race types can be linked with fee and prize schemes using the
//! [`race_type_fee_scheme`] and [`race_type_prize_scheme`] join tables,
//! each carrying a per-type override value.
//!
//! [`race_type_fee_scheme`]: super::race_type_fee_scheme
//! [`race_type_prize_scheme`]: super::race_type_prize_scheme

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "race_types")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: TimeDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::race::Entity")]
    Races,

    #[sea_orm(has_many = "super::race_type_fee_scheme::Entity")]
    FeeSchemeLinks,

    #[sea_orm(has_many = "super::race_type_prize_scheme::Entity")]
    PrizeSchemeLinks,
}

impl Related<super::race::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Races.def()
    }
}

impl Related<super::race_type_fee_scheme::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FeeSchemeLinks.def()
    }
}

impl Related<super::race_type_prize_scheme::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PrizeSchemeLinks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
