use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use common::types::Page;
use models::commitment::CommitmentStatus;
use models::subscription::{self, SubscriptionStatus};

use super::{discard_file, lookup_client, now, owned};
use crate::auth::{domain::Principal, repository::AuthRepository};
use crate::errors::ServiceError;
use crate::metrics;
use crate::notify::{Notice, Notifications};
use crate::pagination::Pagination;
use crate::render::{self, format_money, Party};
use crate::repository::{CatalogRepository, LifecycleRepository, SubscriptionFilter};
use crate::storage::FileStore;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSubscriptionInput {
    pub commitment_id: Uuid,
    /// Defaults to the standard terms derived from the product.
    #[serde(default)]
    pub terms: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignInput {
    pub signature_data_url: String,
}

fn default_terms(product_name: &str, code: &str, amount: &str) -> String {
    format!(
        "The subscriber irrevocably subscribes {amount} to {product_name} ({code}) and agrees to fund \
capital calls issued against this subscription up to that amount, subject to the fee schedule \
stated above and the offering documents of the product."
    )
}

pub struct SubscriptionService {
    lifecycle: Arc<dyn LifecycleRepository>,
    catalog: Arc<dyn CatalogRepository>,
    directory: Arc<dyn AuthRepository>,
    files: Arc<dyn FileStore>,
    notifications: Notifications,
}

impl SubscriptionService {
    pub fn new(
        lifecycle: Arc<dyn LifecycleRepository>,
        catalog: Arc<dyn CatalogRepository>,
        directory: Arc<dyn AuthRepository>,
        files: Arc<dyn FileStore>,
        notifications: Notifications,
    ) -> Self {
        Self { lifecycle, catalog, directory, files, notifications }
    }

    /// Admin turns an accepted commitment into a subscription awaiting signature.
    #[instrument(skip(self, principal, input), fields(tenant = %principal.tenant_id))]
    pub async fn create_from_commitment(
        &self,
        principal: &Principal,
        input: CreateSubscriptionInput,
    ) -> Result<subscription::Model, ServiceError> {
        principal.require_admin()?;
        let tenant_id = principal.tenant_id;
        let mut commitment = self
            .lifecycle
            .get_commitment(tenant_id, input.commitment_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("commitment"))?;
        if self.lifecycle.find_subscription_by_commitment(tenant_id, commitment.id).await?.is_some() {
            return Err(ServiceError::Conflict("commitment already has a subscription".into()));
        }
        if commitment.status != CommitmentStatus::Accepted {
            return Err(ServiceError::invalid_state("commitment", commitment.status, "subscribe"));
        }
        let product = self
            .catalog
            .get_product(tenant_id, commitment.product_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("product"))?;

        let amount = format_money(commitment.amount_cents, &commitment.currency);
        let terms = match input.terms.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) {
            Some(t) => t,
            None => default_terms(&product.name, &product.code, &amount),
        };
        let ts = now();
        let row = subscription::Model {
            id: Uuid::new_v4(),
            tenant_id,
            commitment_id: commitment.id,
            product_id: product.id,
            client_id: commitment.client_id,
            amount_cents: commitment.amount_cents,
            currency: commitment.currency.clone(),
            terms,
            status: SubscriptionStatus::PendingSignature,
            signature_data_url: None,
            document_key: None,
            document_sha256: None,
            signed_at: None,
            created_at: ts,
            updated_at: ts,
        };
        commitment.status = CommitmentStatus::Subscribed;
        commitment.updated_at = ts;
        let created = self.lifecycle.insert_subscription(row, commitment).await?;
        metrics::record("subscription", "created");
        info!(event = "subscription_created", subscription_id = %created.id, commitment_id = %created.commitment_id);

        let notice = Notice::new(
            "subscription_ready",
            created.id,
            format!("Subscription ready to sign: {}", product.name),
            format!("Your subscription of {amount} to {} is ready for your signature.", product.name),
        );
        self.notifications.user(tenant_id, created.client_id, &notice).await;
        Ok(created)
    }

    pub async fn get(&self, principal: &Principal, id: Uuid) -> Result<subscription::Model, ServiceError> {
        let row = self.lifecycle.get_subscription(principal.tenant_id, id).await?;
        owned(principal, row, |s| s.client_id, "subscription")
    }

    pub async fn list(
        &self,
        principal: &Principal,
        mut filter: SubscriptionFilter,
        page: Pagination,
    ) -> Result<Page<subscription::Model>, ServiceError> {
        filter.client_id = principal.scope_client(filter.client_id);
        let rows = self.lifecycle.list_subscriptions(principal.tenant_id, &filter).await?;
        Ok(page.apply(rows))
    }

    /// The owning client signs; the agreement is rendered with the signature and stored.
    #[instrument(skip(self, principal, input), fields(tenant = %principal.tenant_id))]
    pub async fn sign(&self, principal: &Principal, id: Uuid, input: SignInput) -> Result<subscription::Model, ServiceError> {
        let mut sub = self.get(principal, id).await?;
        if sub.client_id != principal.user_id {
            return Err(ServiceError::Forbidden("only the subscribing client may sign".into()));
        }
        if sub.status != SubscriptionStatus::PendingSignature {
            return Err(ServiceError::invalid_state("subscription", sub.status, "sign"));
        }
        render::validate_signature(&input.signature_data_url)?;

        let product = self
            .catalog
            .get_product(sub.tenant_id, sub.product_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("product"))?;
        let client = lookup_client(&self.directory, sub.tenant_id, sub.client_id).await?;
        let signed_at = now();
        let html = render::subscription_agreement(
            &product,
            &sub,
            &Party { name: &client.name, email: &client.email },
            &input.signature_data_url,
            signed_at,
        );
        let stored = self
            .files
            .put(sub.tenant_id, &format!("subscription-{}.html", sub.id), html.into_bytes())
            .await?;

        sub.signature_data_url = Some(input.signature_data_url.trim().to_string());
        sub.document_key = Some(stored.key.clone());
        sub.document_sha256 = Some(stored.sha256);
        sub.signed_at = Some(signed_at);
        sub.status = SubscriptionStatus::Signed;
        sub.updated_at = signed_at;
        let saved = match self.lifecycle.update_subscription(sub).await {
            Ok(saved) => saved,
            Err(e) => {
                discard_file(&self.files, &stored.key).await;
                return Err(e);
            }
        };
        metrics::record("subscription", "signed");
        info!(event = "subscription_signed", subscription_id = %saved.id);

        let notice = Notice::new(
            "subscription_signed",
            saved.id,
            format!("Subscription signed: {}", product.name),
            format!(
                "{} signed a subscription of {} to {}.",
                client.name,
                format_money(saved.amount_cents, &saved.currency),
                product.name
            ),
        );
        self.notifications.admins(saved.tenant_id, &notice).await;
        Ok(saved)
    }

    #[instrument(skip(self, principal), fields(tenant = %principal.tenant_id))]
    pub async fn cancel(&self, principal: &Principal, id: Uuid) -> Result<subscription::Model, ServiceError> {
        principal.require_admin()?;
        let mut sub = self.get(principal, id).await?;
        if sub.status != SubscriptionStatus::PendingSignature {
            return Err(ServiceError::invalid_state("subscription", sub.status, "cancel"));
        }
        sub.status = SubscriptionStatus::Cancelled;
        sub.updated_at = now();
        let saved = self.lifecycle.update_subscription(sub).await?;
        metrics::record("subscription", "cancelled");
        Ok(saved)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::services::commitment::{CommitmentService, CreateCommitmentInput};
    use crate::services::product::{CreateProductInput, ProductService};
    use crate::services::testkit::Kit;
    use models::product::{ProductCategory, ProductStatus};

    pub const SIGNATURE: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    pub fn service(kit: &Kit) -> SubscriptionService {
        SubscriptionService::new(
            kit.repo.clone(),
            kit.repo.clone(),
            kit.directory.clone(),
            kit.files.clone(),
            kit.notifications(),
        )
    }

    /// Open product plus an accepted commitment of the kit's client.
    pub async fn accepted_commitment(kit: &Kit, amount_cents: i64) -> Uuid {
        let products = ProductService::new(kit.repo.clone(), kit.repo.clone());
        let p = products
            .create(
                &kit.admin,
                CreateProductInput {
                    name: "Harbour Real Estate".into(),
                    category: ProductCategory::RealEstate,
                    description: String::new(),
                    currency: "USD".into(),
                    min_investment_cents: 100_000,
                    target_size_cents: None,
                    fee_schedule: Default::default(),
                    media_urls: vec![],
                },
            )
            .await
            .unwrap();
        products.set_status(&kit.admin, p.id, ProductStatus::Open).await.unwrap();
        let commitments = CommitmentService::new(kit.repo.clone(), kit.repo.clone(), kit.directory.clone(), kit.notifications());
        let c = commitments
            .create(&kit.client, CreateCommitmentInput { product_id: p.id, amount_cents, client_id: None, note: None })
            .await
            .unwrap();
        commitments.accept(&kit.admin, c.id).await.unwrap();
        c.id
    }

    pub async fn signed_subscription(kit: &Kit, amount_cents: i64) -> subscription::Model {
        let commitment_id = accepted_commitment(kit, amount_cents).await;
        let svc = service(kit);
        let sub = svc
            .create_from_commitment(&kit.admin, CreateSubscriptionInput { commitment_id, terms: None })
            .await
            .unwrap();
        svc.sign(&kit.client, sub.id, SignInput { signature_data_url: SIGNATURE.into() }).await.unwrap()
    }

    #[tokio::test]
    async fn accepted_commitment_becomes_subscription_once() {
        let kit = Kit::new().await;
        let commitment_id = accepted_commitment(&kit, 500_000).await;
        let svc = service(&kit);
        let sub = svc
            .create_from_commitment(&kit.admin, CreateSubscriptionInput { commitment_id, terms: None })
            .await
            .unwrap();
        assert_eq!(sub.status, SubscriptionStatus::PendingSignature);
        assert!(sub.terms.contains("USD 5,000.00"));
        let c = kit.repo.get_commitment(kit.tenant_id, commitment_id).await.unwrap().unwrap();
        assert_eq!(c.status, CommitmentStatus::Subscribed);

        let again = svc
            .create_from_commitment(&kit.admin, CreateSubscriptionInput { commitment_id, terms: None })
            .await;
        assert!(matches!(again, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn signing_stores_agreement_and_notifies_admins() {
        let kit = Kit::new().await;
        let sub = signed_subscription(&kit, 750_000).await;
        assert_eq!(sub.status, SubscriptionStatus::Signed);
        assert!(sub.signed_at.is_some());
        let key = sub.document_key.clone().unwrap();
        let bytes = kit.files.get(&key).await.unwrap().unwrap();
        let html = String::from_utf8(bytes).unwrap();
        assert!(html.contains("Subscription Agreement"));
        assert!(html.contains(SIGNATURE));
        assert_eq!(sub.document_sha256.as_deref(), Some(crate::storage::sha256_hex(html.as_bytes()).as_str()));
        assert!(!kit.notifier.emails_to("admin@acme.io").is_empty());

        let svc = service(&kit);
        let twice = svc.sign(&kit.client, sub.id, SignInput { signature_data_url: SIGNATURE.into() }).await;
        assert!(matches!(twice, Err(ServiceError::InvalidState(_))));
        assert!(matches!(svc.cancel(&kit.admin, sub.id).await, Err(ServiceError::InvalidState(_))));
    }

    #[tokio::test]
    async fn only_owner_signs_with_valid_image() {
        let kit = Kit::new().await;
        let commitment_id = accepted_commitment(&kit, 500_000).await;
        let svc = service(&kit);
        let sub = svc
            .create_from_commitment(&kit.admin, CreateSubscriptionInput { commitment_id, terms: Some("Custom".into()) })
            .await
            .unwrap();
        let bad = svc.sign(&kit.client, sub.id, SignInput { signature_data_url: "data:text/plain;base64,aGk=".into() }).await;
        assert!(matches!(bad, Err(ServiceError::Validation(_))));
        let admin = svc.sign(&kit.admin, sub.id, SignInput { signature_data_url: SIGNATURE.into() }).await;
        assert!(matches!(admin, Err(ServiceError::Forbidden(_))));
        let other = svc.sign(&kit.other_client, sub.id, SignInput { signature_data_url: SIGNATURE.into() }).await;
        assert!(matches!(other, Err(ServiceError::NotFound(_))));
        let cancelled = svc.cancel(&kit.admin, sub.id).await.unwrap();
        assert_eq!(cancelled.status, SubscriptionStatus::Cancelled);
    }
}
