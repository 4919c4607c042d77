//! Create `capital_call` table: payment requests against a signed subscription.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CapitalCall::Table)
                    .if_not_exists()
                    .col(uuid(CapitalCall::Id).primary_key())
                    .col(uuid(CapitalCall::TenantId).not_null())
                    .col(uuid(CapitalCall::SubscriptionId).not_null())
                    .col(uuid(CapitalCall::ClientId).not_null())
                    .col(uuid(CapitalCall::ProductId).not_null())
                    .col(big_integer(CapitalCall::AmountCents).not_null())
                    .col(string_len(CapitalCall::Currency, 3).not_null())
                    .col(date(CapitalCall::DueDate).not_null())
                    .col(json_binary(CapitalCall::BankDetails).not_null())
                    .col(string_len(CapitalCall::Status, 16).not_null())
                    .col(string_len(CapitalCall::DocumentKey, 512).not_null())
                    .col(timestamp_with_time_zone(CapitalCall::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(CapitalCall::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_capital_call_tenant")
                            .from(CapitalCall::Table, CapitalCall::TenantId)
                            .to(Tenant::Table, Tenant::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_capital_call_subscription")
                            .from(CapitalCall::Table, CapitalCall::SubscriptionId)
                            .to(Subscription::Table, Subscription::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(CapitalCall::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum CapitalCall {
    Table,
    Id,
    TenantId,
    SubscriptionId,
    ClientId,
    ProductId,
    AmountCents,
    Currency,
    DueDate,
    BankDetails,
    Status,
    DocumentKey,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Tenant { Table, Id }

#[derive(DeriveIden)]
enum Subscription { Table, Id }
