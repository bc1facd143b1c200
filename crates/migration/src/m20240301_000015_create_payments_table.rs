use db::payment::{PaymentStatus, DEFAULT_CURRENCY};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .col(
                        ColumnDef::new(Payments::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Payments::EventInventoryId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Payments::BreederId).big_integer().not_null())
                    .col(ColumnDef::new(Payments::AmountToPay).double().not_null())
                    .col(
                        ColumnDef::new(Payments::AmountPaid)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Payments::Currency)
                            .string_len(3)
                            .not_null()
                            .default(DEFAULT_CURRENCY),
                    )
                    .col(ColumnDef::new(Payments::Method).string())
                    .col(
                        ColumnDef::new(Payments::PaymentType)
                            .small_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Payments::Status)
                            .small_integer()
                            .not_null()
                            .default(PaymentStatus::Pending),
                    )
                    .col(ColumnDef::new(Payments::Description).string())
                    .col(ColumnDef::new(Payments::PaidAt).timestamp())
                    .col(
                        ColumnDef::new(Payments::CreatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Payments::Table, Payments::EventInventoryId)
                            .to(crate::EventInventories::Table, crate::EventInventories::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Payments::Table, Payments::BreederId)
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
                    .name("idx_payments_event_inventory_id")
                    .table(Payments::Table)
                    .col(Payments::EventInventoryId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
enum Payments {
    Table,
    Id,
    EventInventoryId,
    BreederId,
    AmountToPay,
    AmountPaid,
    Currency,
    Method,
    PaymentType,
    Status,
    Description,
    PaidAt,
    CreatedAt,
}
