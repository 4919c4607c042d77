//! Create `commitment` table: a client's intent to invest in a product.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Commitment::Table)
                    .if_not_exists()
                    .col(uuid(Commitment::Id).primary_key())
                    .col(uuid(Commitment::TenantId).not_null())
                    .col(uuid(Commitment::ProductId).not_null())
                    .col(uuid(Commitment::ClientId).not_null())
                    .col(big_integer(Commitment::AmountCents).not_null())
                    .col(string_len(Commitment::Currency, 3).not_null())
                    .col(string_len(Commitment::Status, 16).not_null())
                    .col(text_null(Commitment::Note))
                    .col(uuid(Commitment::CreatedBy).not_null())
                    .col(timestamp_with_time_zone(Commitment::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Commitment::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_commitment_tenant")
                            .from(Commitment::Table, Commitment::TenantId)
                            .to(Tenant::Table, Tenant::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_commitment_product")
                            .from(Commitment::Table, Commitment::ProductId)
                            .to(Product::Table, Product::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_commitment_client")
                            .from(Commitment::Table, Commitment::ClientId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Commitment::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Commitment {
    Table,
    Id,
    TenantId,
    ProductId,
    ClientId,
    AmountCents,
    Currency,
    Status,
    Note,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Tenant { Table, Id }

#[derive(DeriveIden)]
enum Product { Table, Id }

#[derive(DeriveIden)]
enum User { Table, Id }
