//! Migrator registering entity-specific migrations in dependency order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_tenant;
mod m20240101_000002_create_user;
mod m20240101_000003_create_user_credentials;
mod m20240101_000004_create_product;
mod m20240101_000005_create_commitment;
mod m20240101_000006_create_subscription;
mod m20240101_000007_create_capital_call;
mod m20240101_000008_create_receipt;
mod m20240101_000009_create_documents;
mod m20240101_000010_create_manual_asset;
mod m20240101_000099_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_tenant::Migration),
            Box::new(m20240101_000002_create_user::Migration),
            Box::new(m20240101_000003_create_user_credentials::Migration),
            Box::new(m20240101_000004_create_product::Migration),
            Box::new(m20240101_000005_create_commitment::Migration),
            Box::new(m20240101_000006_create_subscription::Migration),
            Box::new(m20240101_000007_create_capital_call::Migration),
            Box::new(m20240101_000008_create_receipt::Migration),
            Box::new(m20240101_000009_create_documents::Migration),
            Box::new(m20240101_000010_create_manual_asset::Migration),
            // Indexes should always be applied last
            Box::new(m20240101_000099_add_indexes::Migration),
        ]
    }
}
