//! Numbered bird container scoped to a race.
//!
//! Loft baskets carry birds for transport to the release point, while race
//! baskets are used for race-day handling. Basket numbers are unique per
//! race and basket type.

use schemars::JsonSchema;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "baskets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub race_id: i64,
    pub number: i32,
    pub is_race_basket: bool,
    pub capacity: Option<i32>,
    pub created_by: i64,
    pub created_at: TimeDateTime,
}

impl Model {
    /// Kind of this basket.
    pub fn basket_type(&self) -> BasketType {
        BasketType::from_flag(self.is_race_basket)
    }
}

/// Basket kind as used by the assignment workflow.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BasketType {
    Race,
    Loft,
}

impl BasketType {
    /// Convert the stored `is_race_basket` flag into a basket type.
    pub fn from_flag(is_race_basket: bool) -> Self {
        if is_race_basket {
            BasketType::Race
        } else {
            BasketType::Loft
        }
    }

    /// Value of the `is_race_basket` flag for this basket type.
    pub fn is_race_basket(self) -> bool {
        matches!(self, BasketType::Race)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::race::Entity",
        from = "Column::RaceId",
        to = "super::race::Column::Id"
    )]
    Race,
}

impl Related<super::race::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Race.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
