use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RaceTypeFeeSchemes::Table)
                    .col(
                        ColumnDef::new(RaceTypeFeeSchemes::RaceTypeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RaceTypeFeeSchemes::FeeSchemeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RaceTypeFeeSchemes::Fee).double().not_null())
                    .primary_key(
                        Index::create()
                            .col(RaceTypeFeeSchemes::RaceTypeId)
                            .col(RaceTypeFeeSchemes::FeeSchemeId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(RaceTypeFeeSchemes::Table, RaceTypeFeeSchemes::RaceTypeId)
                            .to(crate::RaceTypes::Table, crate::RaceTypes::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(RaceTypeFeeSchemes::Table, RaceTypeFeeSchemes::FeeSchemeId)
                            .to(crate::FeeSchemes::Table, crate::FeeSchemes::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RaceTypePrizeSchemes::Table)
                    .col(
                        ColumnDef::new(RaceTypePrizeSchemes::RaceTypeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RaceTypePrizeSchemes::PrizeSchemeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RaceTypePrizeSchemes::Prize)
                            .double()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(RaceTypePrizeSchemes::RaceTypeId)
                            .col(RaceTypePrizeSchemes::PrizeSchemeId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(
                                RaceTypePrizeSchemes::Table,
                                RaceTypePrizeSchemes::RaceTypeId,
                            )
                            .to(crate::RaceTypes::Table, crate::RaceTypes::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(
                                RaceTypePrizeSchemes::Table,
                                RaceTypePrizeSchemes::PrizeSchemeId,
                            )
                            .to(crate::PrizeSchemes::Table, crate::PrizeSchemes::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RaceTypePrizeSchemes::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(RaceTypeFeeSchemes::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
enum RaceTypeFeeSchemes {
    Table,
    RaceTypeId,
    FeeSchemeId,
    Fee,
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
enum RaceTypePrizeSchemes {
    Table,
    RaceTypeId,
    PrizeSchemeId,
    Prize,
}
