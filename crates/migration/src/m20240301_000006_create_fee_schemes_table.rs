use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FeeSchemes::Table)
                    .col(
                        ColumnDef::new(FeeSchemes::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FeeSchemes::Name).string().not_null())
                    .col(
                        ColumnDef::new(FeeSchemes::PerchFee)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(FeeSchemes::CreatedBy)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FeeSchemes::CreatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(FeeSchemes::Table, FeeSchemes::CreatedBy)
                            .to(crate::Users::Table, crate::Users::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PerchFeeItems::Table)
                    .col(
                        ColumnDef::new(PerchFeeItems::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PerchFeeItems::FeeSchemeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PerchFeeItems::BirdNo).integer().not_null())
                    .col(ColumnDef::new(PerchFeeItems::Fee).double().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(PerchFeeItems::Table, PerchFeeItems::FeeSchemeId)
                            .to(FeeSchemes::Table, FeeSchemes::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_perch_fee_items_scheme_bird_no")
                    .table(PerchFeeItems::Table)
                    .col(PerchFeeItems::FeeSchemeId)
                    .col(PerchFeeItems::BirdNo)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PerchFeeItems::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(FeeSchemes::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
pub(crate) enum FeeSchemes {
    Table,
    Id,
    Name,
    PerchFee,
    CreatedBy,
    CreatedAt,
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
enum PerchFeeItems {
    Table,
    Id,
    FeeSchemeId,
    BirdNo,
    Fee,
}
