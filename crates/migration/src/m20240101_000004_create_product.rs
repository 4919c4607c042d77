//! Create `product` table.
//!
//! Investment listings; `code` is the generated human-readable identifier.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Product::Table)
                    .if_not_exists()
                    .col(uuid(Product::Id).primary_key())
                    .col(uuid(Product::TenantId).not_null())
                    .col(string_len(Product::Code, 32).not_null())
                    .col(string_len(Product::Name, 200).not_null())
                    .col(string_len(Product::Category, 32).not_null())
                    .col(text(Product::Description).not_null())
                    .col(string_len(Product::Currency, 3).not_null())
                    .col(big_integer(Product::MinInvestmentCents).not_null())
                    .col(big_integer_null(Product::TargetSizeCents))
                    .col(json_binary(Product::FeeSchedule).not_null())
                    .col(json_binary(Product::MediaUrls).not_null())
                    .col(string_len(Product::Status, 16).not_null())
                    .col(timestamp_with_time_zone(Product::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Product::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_tenant")
                            .from(Product::Table, Product::TenantId)
                            .to(Tenant::Table, Tenant::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Product::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Product {
    Table,
    Id,
    TenantId,
    Code,
    Name,
    Category,
    Description,
    Currency,
    MinInvestmentCents,
    TargetSizeCents,
    FeeSchedule,
    MediaUrls,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Tenant { Table, Id }
