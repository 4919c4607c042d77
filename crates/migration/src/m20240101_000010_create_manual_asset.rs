//! Create `manual_asset` table: admin-entered holdings merged into the portfolio view.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ManualAsset::Table)
                    .if_not_exists()
                    .col(uuid(ManualAsset::Id).primary_key())
                    .col(uuid(ManualAsset::TenantId).not_null())
                    .col(uuid(ManualAsset::ClientId).not_null())
                    .col(string_len(ManualAsset::Category, 128).not_null())
                    .col(string_len(ManualAsset::Subcategory, 128).not_null())
                    .col(string_len(ManualAsset::AssetName, 200).not_null())
                    .col(big_integer(ManualAsset::ClosingBalanceCents).not_null())
                    .col(string_len(ManualAsset::Currency, 3).not_null())
                    .col(date(ManualAsset::AsOf).not_null())
                    .col(timestamp_with_time_zone(ManualAsset::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(ManualAsset::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_manual_asset_client")
                            .from(ManualAsset::Table, ManualAsset::ClientId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ManualAsset::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum ManualAsset {
    Table,
    Id,
    TenantId,
    ClientId,
    Category,
    Subcategory,
    AssetName,
    ClosingBalanceCents,
    Currency,
    AsOf,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum User { Table, Id }
