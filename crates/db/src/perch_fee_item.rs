//! Fee charged for the N-th bird registered into an event inventory.
//!
//! At most one item exists per bird number inside a single fee scheme.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "perch_fee_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub fee_scheme_id: i64,
    pub bird_no: i32,
    pub fee: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::fee_scheme::Entity",
        from = "Column::FeeSchemeId",
        to = "super::fee_scheme::Column::Id"
    )]
    FeeScheme,
}

impl Related<super::fee_scheme::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FeeScheme.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
