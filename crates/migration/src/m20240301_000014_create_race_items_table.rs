use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RaceItems::Table)
                    .col(
                        ColumnDef::new(RaceItems::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RaceItems::RaceId).big_integer().not_null())
                    .col(ColumnDef::new(RaceItems::BirdId).big_integer().not_null())
                    .col(ColumnDef::new(RaceItems::ArrivedAt).timestamp())
                    .col(ColumnDef::new(RaceItems::Position).integer())
                    .col(ColumnDef::new(RaceItems::LoftBasketId).big_integer())
                    .col(
                        ColumnDef::new(RaceItems::IsLoftBasketed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(RaceItems::RaceBasketId).big_integer())
                    .col(
                        ColumnDef::new(RaceItems::IsRaceBasketed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(RaceItems::RaceBasketedAt).timestamp())
                    .col(
                        ColumnDef::new(RaceItems::CreatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(RaceItems::Table, RaceItems::RaceId)
                            .to(crate::Races::Table, crate::Races::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(RaceItems::Table, RaceItems::BirdId)
                            .to(crate::Birds::Table, crate::Birds::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(RaceItems::Table, RaceItems::LoftBasketId)
                            .to(crate::Baskets::Table, crate::Baskets::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(RaceItems::Table, RaceItems::RaceBasketId)
                            .to(crate::Baskets::Table, crate::Baskets::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_race_items_race_bird")
                    .table(RaceItems::Table)
                    .col(RaceItems::RaceId)
                    .col(RaceItems::BirdId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RaceItems::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
enum RaceItems {
    Table,
    Id,
    RaceId,
    BirdId,
    ArrivedAt,
    Position,
    LoftBasketId,
    IsLoftBasketed,
    RaceBasketId,
    IsRaceBasketed,
    RaceBasketedAt,
    CreatedAt,
}
