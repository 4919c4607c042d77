//! Create the document-distribution tables: `statement`, `kyc_document`, `newsletter`.
//!
//! The three workflows are independent; they share a migration because none
//! references another.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Statement::Table)
                    .if_not_exists()
                    .col(uuid(Statement::Id).primary_key())
                    .col(uuid(Statement::TenantId).not_null())
                    .col(uuid(Statement::ClientId).not_null())
                    .col(string_len(Statement::Title, 200).not_null())
                    .col(string_len(Statement::Month, 16).not_null())
                    .col(integer(Statement::Year).not_null())
                    .col(string_len(Statement::FileKey, 512).not_null())
                    .col(timestamp_with_time_zone(Statement::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_statement_client")
                            .from(Statement::Table, Statement::ClientId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(KycDocument::Table)
                    .if_not_exists()
                    .col(uuid(KycDocument::Id).primary_key())
                    .col(uuid(KycDocument::TenantId).not_null())
                    .col(uuid(KycDocument::ClientId).not_null())
                    .col(string_len(KycDocument::DocType, 64).not_null())
                    .col(string_len(KycDocument::FileKey, 512).not_null())
                    .col(string_len(KycDocument::Status, 16).not_null())
                    .col(text_null(KycDocument::ReviewNote))
                    .col(timestamp_with_time_zone(KycDocument::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(KycDocument::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_kyc_document_client")
                            .from(KycDocument::Table, KycDocument::ClientId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Newsletter::Table)
                    .if_not_exists()
                    .col(uuid(Newsletter::Id).primary_key())
                    .col(uuid(Newsletter::TenantId).not_null())
                    .col(string_len(Newsletter::Title, 200).not_null())
                    .col(text(Newsletter::Summary).not_null())
                    .col(string_len_null(Newsletter::FileKey, 512))
                    .col(boolean(Newsletter::Published).not_null())
                    .col(timestamp_with_time_zone_null(Newsletter::PublishedAt))
                    .col(timestamp_with_time_zone(Newsletter::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_newsletter_tenant")
                            .from(Newsletter::Table, Newsletter::TenantId)
                            .to(Tenant::Table, Tenant::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Newsletter::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(KycDocument::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Statement::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Statement { Table, Id, TenantId, ClientId, Title, Month, Year, FileKey, CreatedAt }

#[derive(DeriveIden)]
enum KycDocument { Table, Id, TenantId, ClientId, DocType, FileKey, Status, ReviewNote, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum Newsletter { Table, Id, TenantId, Title, Summary, FileKey, Published, PublishedAt, CreatedAt }

#[derive(DeriveIden)]
enum Tenant { Table, Id }

#[derive(DeriveIden)]
enum User { Table, Id }
