//! Named grouping of birds owned by a single breeder.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "teams")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub breeder_id: i64,
    pub name: String,
    pub created_at: TimeDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::BreederId",
        to = "super::user::Column::Id"
    )]
    Breeder,

    #[sea_orm(has_many = "super::bird::Entity")]
    Birds,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Breeder.def()
    }
}

impl Related<super::bird::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Birds.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
