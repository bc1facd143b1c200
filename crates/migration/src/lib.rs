pub use sea_orm_migration::prelude::*;

mod m20240301_000001_create_users_table;
mod m20240301_000002_create_sessions_table;
mod m20240301_000003_create_teams_table;
mod m20240301_000004_create_birds_table;
mod m20240301_000005_create_reference_tables;
mod m20240301_000006_create_fee_schemes_table;
mod m20240301_000007_create_prize_schemes_table;
mod m20240301_000008_create_betting_schemes_table;
mod m20240301_000009_create_race_type_scheme_links;
mod m20240301_000010_create_events_table;
mod m20240301_000011_create_event_inventories_table;
mod m20240301_000012_create_races_table;
mod m20240301_000013_create_baskets_table;
mod m20240301_000014_create_race_items_table;
mod m20240301_000015_create_payments_table;

pub(crate) use m20240301_000001_create_users_table::Users;
pub(crate) use m20240301_000003_create_teams_table::Teams;
pub(crate) use m20240301_000004_create_birds_table::Birds;
pub(crate) use m20240301_000005_create_reference_tables::{EventTypes, RaceTypes};
pub(crate) use m20240301_000006_create_fee_schemes_table::FeeSchemes;
pub(crate) use m20240301_000007_create_prize_schemes_table::PrizeSchemes;
pub(crate) use m20240301_000008_create_betting_schemes_table::BettingSchemes;
pub(crate) use m20240301_000010_create_events_table::Events;
pub(crate) use m20240301_000011_create_event_inventories_table::EventInventories;
pub(crate) use m20240301_000012_create_races_table::Races;
pub(crate) use m20240301_000013_create_baskets_table::Baskets;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_users_table::Migration),
            Box::new(m20240301_000002_create_sessions_table::Migration),
            Box::new(m20240301_000003_create_teams_table::Migration),
            Box::new(m20240301_000004_create_birds_table::Migration),
            Box::new(m20240301_000005_create_reference_tables::Migration),
            Box::new(m20240301_000006_create_fee_schemes_table::Migration),
            Box::new(m20240301_000007_create_prize_schemes_table::Migration),
            Box::new(m20240301_000008_create_betting_schemes_table::Migration),
            Box::new(m20240301_000009_create_race_type_scheme_links::Migration),
            Box::new(m20240301_000010_create_events_table::Migration),
            Box::new(m20240301_000011_create_event_inventories_table::Migration),
            Box::new(m20240301_000012_create_races_table::Migration),
            Box::new(m20240301_000013_create_baskets_table::Migration),
            Box::new(m20240301_000014_create_race_items_table::Migration),
            Box::new(m20240301_000015_create_payments_table::Migration),
        ]
    }
}
