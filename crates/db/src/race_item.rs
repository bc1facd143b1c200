//! Participation of a single bird in a race.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "race_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub race_id: i64,
    pub bird_id: i64,
    pub arrived_at: Option<TimeDateTime>,
    pub position: Option<i32>,
    pub loft_basket_id: Option<i64>,
    pub is_loft_basketed: bool,
    pub race_basket_id: Option<i64>,
    pub is_race_basketed: bool,
    pub race_basketed_at: Option<TimeDateTime>,
    pub created_at: TimeDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::race::Entity",
        from = "Column::RaceId",
        to = "super::race::Column::Id"
    )]
    Race,

    #[sea_orm(
        belongs_to = "super::bird::Entity",
        from = "Column::BirdId",
        to = "super::bird::Column::Id"
    )]
    Bird,

    #[sea_orm(
        belongs_to = "super::basket::Entity",
        from = "Column::LoftBasketId",
        to = "super::basket::Column::Id"
    )]
    LoftBasket,

    #[sea_orm(
        belongs_to = "super::basket::Entity",
        from = "Column::RaceBasketId",
        to = "super::basket::Column::Id"
    )]
    RaceBasket,
}

impl Related<super::race::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Race.def()
    }
}

impl Related<super::bird::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bird.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
