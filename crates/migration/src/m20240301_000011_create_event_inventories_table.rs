use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EventInventories::Table)
                    .col(
                        ColumnDef::new(EventInventories::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(EventInventories::EventId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EventInventories::BreederId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EventInventories::ReservedBirds)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EventInventories::RegisteredBirds)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(EventInventories::CreatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(EventInventories::Table, EventInventories::EventId)
                            .to(crate::Events::Table, crate::Events::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(EventInventories::Table, EventInventories::BreederId)
                            .to(crate::Users::Table, crate::Users::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_event_inventories_event_breeder")
                    .table(EventInventories::Table)
                    .col(EventInventories::EventId)
                    .col(EventInventories::BreederId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EventInventoryItems::Table)
                    .col(
                        ColumnDef::new(EventInventoryItems::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(EventInventoryItems::EventInventoryId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EventInventoryItems::EventId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EventInventoryItems::BirdId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(EventInventoryItems::ArrivedAt).timestamp())
                    .col(ColumnDef::new(EventInventoryItems::DepartedAt).timestamp())
                    .col(
                        ColumnDef::new(EventInventoryItems::IsBackup)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(EventInventoryItems::BetStandard)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(EventInventoryItems::BetShowLow)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(EventInventoryItems::BetShowMid)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(EventInventoryItems::BetShowHigh)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(EventInventoryItems::BetWinnerTakesAll)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(EventInventoryItems::CreatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(
                                EventInventoryItems::Table,
                                EventInventoryItems::EventInventoryId,
                            )
                            .to(EventInventories::Table, EventInventories::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(EventInventoryItems::Table, EventInventoryItems::EventId)
                            .to(crate::Events::Table, crate::Events::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(EventInventoryItems::Table, EventInventoryItems::BirdId)
                            .to(crate::Birds::Table, crate::Birds::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_event_inventory_items_event_bird")
                    .table(EventInventoryItems::Table)
                    .col(EventInventoryItems::EventId)
                    .col(EventInventoryItems::BirdId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EventInventoryItems::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(EventInventories::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
pub(crate) enum EventInventories {
    Table,
    Id,
    EventId,
    BreederId,
    ReservedBirds,
    RegisteredBirds,
    CreatedAt,
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
enum EventInventoryItems {
    Table,
    Id,
    EventInventoryId,
    EventId,
    BirdId,
    ArrivedAt,
    DepartedAt,
    IsBackup,
    BetStandard,
    BetShowLow,
    BetShowMid,
    BetShowHigh,
    BetWinnerTakesAll,
    CreatedAt,
}
