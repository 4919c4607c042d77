//! Create `subscription` table.
//!
//! One row per accepted commitment; carries the signed agreement reference.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Subscription::Table)
                    .if_not_exists()
                    .col(uuid(Subscription::Id).primary_key())
                    .col(uuid(Subscription::TenantId).not_null())
                    .col(uuid(Subscription::CommitmentId).unique_key().not_null())
                    .col(uuid(Subscription::ProductId).not_null())
                    .col(uuid(Subscription::ClientId).not_null())
                    .col(big_integer(Subscription::AmountCents).not_null())
                    .col(string_len(Subscription::Currency, 3).not_null())
                    .col(text(Subscription::Terms).not_null())
                    .col(string_len(Subscription::Status, 24).not_null())
                    .col(text_null(Subscription::SignatureDataUrl))
                    .col(string_len_null(Subscription::DocumentKey, 512))
                    .col(string_len_null(Subscription::DocumentSha256, 64))
                    .col(timestamp_with_time_zone_null(Subscription::SignedAt))
                    .col(timestamp_with_time_zone(Subscription::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Subscription::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_subscription_tenant")
                            .from(Subscription::Table, Subscription::TenantId)
                            .to(Tenant::Table, Tenant::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_subscription_commitment")
                            .from(Subscription::Table, Subscription::CommitmentId)
                            .to(Commitment::Table, Commitment::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Subscription::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Subscription {
    Table,
    Id,
    TenantId,
    CommitmentId,
    ProductId,
    ClientId,
    AmountCents,
    Currency,
    Terms,
    Status,
    SignatureDataUrl,
    DocumentKey,
    DocumentSha256,
    SignedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Tenant { Table, Id }

#[derive(DeriveIden)]
enum Commitment { Table, Id }
