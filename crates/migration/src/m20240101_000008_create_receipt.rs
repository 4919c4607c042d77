//! Create `receipt` table: proof of payment, optionally tied to a capital call.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Receipt::Table)
                    .if_not_exists()
                    .col(uuid(Receipt::Id).primary_key())
                    .col(uuid(Receipt::TenantId).not_null())
                    .col(uuid_null(Receipt::CapitalCallId))
                    .col(uuid(Receipt::ClientId).not_null())
                    .col(big_integer(Receipt::AmountCents).not_null())
                    .col(string_len(Receipt::Currency, 3).not_null())
                    .col(date(Receipt::ReceivedOn).not_null())
                    .col(string_len(Receipt::Source, 16).not_null())
                    .col(string_len(Receipt::DocumentKey, 512).not_null())
                    .col(timestamp_with_time_zone(Receipt::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_receipt_tenant")
                            .from(Receipt::Table, Receipt::TenantId)
                            .to(Tenant::Table, Tenant::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_receipt_capital_call")
                            .from(Receipt::Table, Receipt::CapitalCallId)
                            .to(CapitalCall::Table, CapitalCall::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Receipt::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Receipt {
    Table,
    Id,
    TenantId,
    CapitalCallId,
    ClientId,
    AmountCents,
    Currency,
    ReceivedOn,
    Source,
    DocumentKey,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Tenant { Table, Id }

#[derive(DeriveIden)]
enum CapitalCall { Table, Id }
