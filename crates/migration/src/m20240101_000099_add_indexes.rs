use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const INDEXES: &[(&str, &str, &[&str], bool)] = &[
    ("uniq_user_tenant_email", "user", &["tenant_id", "email"], true),
    ("uniq_product_tenant_code", "product", &["tenant_id", "code"], true),
    ("idx_product_tenant_status", "product", &["tenant_id", "status"], false),
    ("idx_commitment_tenant_product", "commitment", &["tenant_id", "product_id"], false),
    ("idx_commitment_client", "commitment", &["client_id"], false),
    ("idx_subscription_client", "subscription", &["client_id"], false),
    ("idx_capital_call_subscription", "capital_call", &["subscription_id"], false),
    ("idx_receipt_capital_call", "receipt", &["capital_call_id"], false),
    ("idx_statement_client_period", "statement", &["client_id", "year"], false),
    ("idx_kyc_document_client", "kyc_document", &["client_id"], false),
    ("idx_newsletter_tenant_published", "newsletter", &["tenant_id", "published"], false),
    ("idx_manual_asset_client", "manual_asset", &["client_id"], false),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, table, cols, unique) in INDEXES {
            let mut idx = Index::create();
            idx.name(*name).table(Alias::new(*table)).if_not_exists();
            for col in cols.iter() {
                idx.col(Alias::new(*col));
            }
            if *unique {
                idx.unique();
            }
            manager.create_index(idx.to_owned()).await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, table, _, _) in INDEXES.iter().rev() {
            manager
                .drop_index(Index::drop().name(*name).table(Alias::new(*table)).to_owned())
                .await?;
        }
        Ok(())
    }
}
