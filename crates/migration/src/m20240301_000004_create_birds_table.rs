use db::bird::Sex;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Birds::Table)
                    .col(
                        ColumnDef::new(Birds::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Birds::BreederId).big_integer().not_null())
                    .col(ColumnDef::new(Birds::TeamId).big_integer())
                    .col(ColumnDef::new(Birds::BandCountry).string().not_null())
                    .col(ColumnDef::new(Birds::BandYear).string().not_null())
                    .col(ColumnDef::new(Birds::BandClub).string().not_null())
                    .col(ColumnDef::new(Birds::BandSerial).string().not_null())
                    .col(ColumnDef::new(Birds::Band).string().not_null().unique_key())
                    .col(ColumnDef::new(Birds::Name).string())
                    .col(ColumnDef::new(Birds::Color).string())
                    .col(
                        ColumnDef::new(Birds::Sex)
                            .small_integer()
                            .not_null()
                            .default(Sex::Unknown),
                    )
                    .col(ColumnDef::new(Birds::Rfid).string())
                    .col(
                        ColumnDef::new(Birds::IsLost)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Birds::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Birds::CreatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Birds::Table, Birds::BreederId)
                            .to(crate::Users::Table, crate::Users::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Birds::Table, Birds::TeamId)
                            .to(crate::Teams::Table, crate::Teams::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // RFID uniqueness only applies to active birds, thus it is
        // checked by the API server instead of a unique index.
        manager
            .create_index(
                Index::create()
                    .name("idx_birds_rfid")
                    .table(Birds::Table)
                    .col(Birds::Rfid)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Birds::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
pub(crate) enum Birds {
    Table,
    Id,
    BreederId,
    TeamId,
    BandCountry,
    BandYear,
    BandClub,
    BandSerial,
    Band,
    Name,
    Color,
    Sex,
    Rfid,
    IsLost,
    IsActive,
    CreatedAt,
}
