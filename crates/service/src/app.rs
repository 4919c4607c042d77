//! Wiring of every business service over one set of backends.

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::auth::{repo::seaorm::SeaOrmAuthRepository, repository::AuthRepository, service::AuthConfig, AuthService};
use crate::notify::{Notifications, Notifier};
use crate::portfolio::{PortfolioProvider, PortfolioService};
use crate::repository::{AssetRepository, CatalogRepository, DocumentRepository, LifecycleRepository, MemoryRepository, SeaOrmRepository};
use crate::services::{
    CapitalCallService, CommitmentService, KycService, NewsletterService, ProductService, ReceiptService,
    StatementService, SubscriptionService,
};
use crate::storage::FileStore;

/// Persistence backends behind the services.
#[derive(Clone)]
pub struct Backends {
    pub directory: Arc<dyn AuthRepository>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub lifecycle: Arc<dyn LifecycleRepository>,
    pub documents: Arc<dyn DocumentRepository>,
    pub assets: Arc<dyn AssetRepository>,
}

impl Backends {
    pub fn database(db: DatabaseConnection) -> Self {
        let repo = Arc::new(SeaOrmRepository::new(db.clone()));
        Self {
            directory: Arc::new(SeaOrmAuthRepository { db }),
            catalog: repo.clone(),
            lifecycle: repo.clone(),
            documents: repo.clone(),
            assets: repo,
        }
    }

    pub fn in_memory(directory: Arc<dyn AuthRepository>) -> Self {
        let repo = Arc::new(MemoryRepository::default());
        Self {
            directory,
            catalog: repo.clone(),
            lifecycle: repo.clone(),
            documents: repo.clone(),
            assets: repo,
        }
    }
}

pub struct Services {
    pub auth: AuthService,
    pub products: ProductService,
    pub commitments: CommitmentService,
    pub subscriptions: SubscriptionService,
    pub capital_calls: CapitalCallService,
    pub receipts: ReceiptService,
    pub statements: StatementService,
    pub kyc: KycService,
    pub newsletters: NewsletterService,
    pub portfolio: PortfolioService,
    pub files: Arc<dyn FileStore>,
}

impl Services {
    pub fn new(
        backends: Backends,
        auth: AuthConfig,
        files: Arc<dyn FileStore>,
        notifier: Arc<dyn Notifier>,
        provider: Option<Arc<dyn PortfolioProvider>>,
    ) -> Self {
        let Backends { directory, catalog, lifecycle, documents, assets } = backends;
        let notifications = Notifications::new(notifier, directory.clone());
        Self {
            auth: AuthService::new(directory.clone(), auth),
            products: ProductService::new(catalog.clone(), lifecycle.clone()),
            commitments: CommitmentService::new(lifecycle.clone(), catalog.clone(), directory.clone(), notifications.clone()),
            subscriptions: SubscriptionService::new(
                lifecycle.clone(),
                catalog.clone(),
                directory.clone(),
                files.clone(),
                notifications.clone(),
            ),
            capital_calls: CapitalCallService::new(
                lifecycle.clone(),
                catalog.clone(),
                directory.clone(),
                files.clone(),
                notifications.clone(),
            ),
            receipts: ReceiptService::new(lifecycle, catalog, directory.clone(), files.clone(), notifications.clone()),
            statements: StatementService::new(documents.clone(), directory.clone(), files.clone(), notifications.clone()),
            kyc: KycService::new(documents.clone(), directory.clone(), files.clone(), notifications.clone()),
            newsletters: NewsletterService::new(documents, files.clone(), notifications),
            portfolio: PortfolioService::new(assets, directory, provider),
            files,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::domain::{BootstrapInput, Principal, RegisterInput, Role};
    use crate::notify::mock::RecordingNotifier;
    use crate::pagination::Pagination;
    use crate::repository::{CommitmentFilter, ProductFilter};
    use crate::services::commitment::CreateCommitmentInput;
    use crate::services::product::CreateProductInput;
    use crate::services::subscription::CreateSubscriptionInput;
    use crate::storage::MemoryFileStore;
    use crate::test_support::get_db;
    use models::commitment::CommitmentStatus;
    use models::product::{ProductCategory, ProductStatus};
    use uuid::Uuid;

    #[tokio::test]
    async fn database_backends_run_the_commitment_flow() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let services = Services::new(
            Backends::database(db),
            AuthConfig { jwt_secret: Some("db-test-secret-0123456789".into()), ..AuthConfig::default() },
            Arc::new(MemoryFileStore::default()),
            Arc::new(RecordingNotifier::default()),
            None,
        );

        let admin = services
            .auth
            .bootstrap(BootstrapInput {
                tenant_name: format!("db flow {}", Uuid::new_v4()),
                email: "admin@dbflow.io".into(),
                name: "Admin".into(),
                password: "Passw0rd!".into(),
            })
            .await?;
        let client = services
            .auth
            .register(RegisterInput {
                tenant_id: admin.tenant_id,
                email: "client@dbflow.io".into(),
                name: "Client".into(),
                password: "Passw0rd!".into(),
                role: Role::Client,
            })
            .await?;
        let admin = Principal::from(&admin);
        let client = Principal::from(&client);

        let product = services
            .products
            .create(
                &admin,
                CreateProductInput {
                    name: "Infra Fund".into(),
                    category: ProductCategory::Infrastructure,
                    description: String::new(),
                    currency: "EUR".into(),
                    min_investment_cents: 1_000_000,
                    target_size_cents: None,
                    fee_schedule: Default::default(),
                    media_urls: Vec::new(),
                },
            )
            .await?;
        assert!(product.code.starts_with("IN"));
        services.products.set_status(&admin, product.id, ProductStatus::Open).await?;

        let c = services
            .commitments
            .create(
                &client,
                CreateCommitmentInput { product_id: product.id, amount_cents: 2_500_000, client_id: None, note: None },
            )
            .await?;
        services.commitments.accept(&admin, c.id).await?;
        let sub = services
            .subscriptions
            .create_from_commitment(&admin, CreateSubscriptionInput { commitment_id: c.id, terms: None })
            .await?;
        assert_eq!(sub.amount_cents, 2_500_000);

        let mine = services.commitments.list(&client, CommitmentFilter::default(), Pagination { page: 1, per_page: 20 }).await?;
        assert_eq!(mine.items.len(), 1);
        assert_eq!(mine.items[0].status, CommitmentStatus::Subscribed);

        let visible = services.products.list(&client, ProductFilter::default(), Pagination { page: 1, per_page: 20 }).await?;
        assert_eq!(visible.total, 1);
        Ok(())
    }
}
