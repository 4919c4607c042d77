//! Persistence seams for the business services.
//!
//! Every method is tenant-scoped. Lists come back newest first; services
//! re-order where a domain ordering applies (statements by period, products by code).

pub mod memory;
pub mod seaorm;

use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use models::{
    capital_call::{self, CapitalCallStatus},
    commitment::{self, CommitmentStatus},
    kyc_document::{self, KycStatus},
    manual_asset, newsletter,
    product::{self, ProductCategory, ProductStatus},
    receipt, statement,
    subscription::{self, SubscriptionStatus},
};

use crate::errors::ServiceError;
use crate::render::format_money;

pub use memory::MemoryRepository;
pub use seaorm::SeaOrmRepository;

/// Parses the sequence that follows `prefix` in a product code.
pub(crate) fn code_sequence(code: &str, prefix: &str) -> Option<u64> {
    code.strip_prefix(prefix)?.parse().ok()
}

/// Rejects `amount_cents` when, added to the non-cancelled `calls`, it would exceed `cap_cents`.
pub(crate) fn check_call_cap<'a>(
    calls: impl IntoIterator<Item = &'a capital_call::Model>,
    amount_cents: i64,
    cap_cents: i64,
    currency: &str,
) -> Result<(), ServiceError> {
    let called = calls
        .into_iter()
        .filter(|c| c.status != CapitalCallStatus::Cancelled)
        .try_fold(0i64, |acc, c| acc.checked_add(c.amount_cents));
    let within = called
        .and_then(|called| called.checked_add(amount_cents))
        .map_or(false, |total| total <= cap_cents);
    if within {
        return Ok(());
    }
    Err(ServiceError::Validation(format!(
        "capital calls would exceed the subscription amount ({} already called of {})",
        called.map_or_else(|| "more than the cap".to_string(), |c| format_money(c, currency)),
        format_money(cap_cents, currency)
    )))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    pub status: Option<ProductStatus>,
    pub category: Option<ProductCategory>,
    /// Hide drafts.
    #[serde(skip)]
    pub client_visible: bool,
}

impl ProductFilter {
    pub fn matches(&self, p: &product::Model) -> bool {
        self.status.map_or(true, |s| p.status == s)
            && self.category.map_or(true, |c| p.category == c)
            && (!self.client_visible || p.status.visible_to_clients())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommitmentFilter {
    pub product_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub status: Option<CommitmentStatus>,
}

impl CommitmentFilter {
    pub fn matches(&self, c: &commitment::Model) -> bool {
        self.product_id.map_or(true, |id| c.product_id == id)
            && self.client_id.map_or(true, |id| c.client_id == id)
            && self.status.map_or(true, |s| c.status == s)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionFilter {
    pub product_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub status: Option<SubscriptionStatus>,
}

impl SubscriptionFilter {
    pub fn matches(&self, s: &subscription::Model) -> bool {
        self.product_id.map_or(true, |id| s.product_id == id)
            && self.client_id.map_or(true, |id| s.client_id == id)
            && self.status.map_or(true, |st| s.status == st)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CapitalCallFilter {
    pub subscription_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub status: Option<CapitalCallStatus>,
}

impl CapitalCallFilter {
    pub fn matches(&self, c: &capital_call::Model) -> bool {
        self.subscription_id.map_or(true, |id| c.subscription_id == id)
            && self.client_id.map_or(true, |id| c.client_id == id)
            && self.status.map_or(true, |s| c.status == s)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReceiptFilter {
    pub client_id: Option<Uuid>,
    pub capital_call_id: Option<Uuid>,
}

impl ReceiptFilter {
    pub fn matches(&self, r: &receipt::Model) -> bool {
        self.client_id.map_or(true, |id| r.client_id == id)
            && self.capital_call_id.map_or(true, |id| r.capital_call_id == Some(id))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KycFilter {
    pub client_id: Option<Uuid>,
    pub status: Option<KycStatus>,
}

impl KycFilter {
    pub fn matches(&self, k: &kyc_document::Model) -> bool {
        self.client_id.map_or(true, |id| k.client_id == id) && self.status.map_or(true, |s| k.status == s)
    }
}

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn insert_product(&self, p: product::Model) -> Result<product::Model, ServiceError>;
    async fn get_product(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<product::Model>, ServiceError>;
    async fn list_products(&self, tenant_id: Uuid, filter: &ProductFilter) -> Result<Vec<product::Model>, ServiceError>;
    async fn update_product(&self, p: product::Model) -> Result<product::Model, ServiceError>;
    async fn delete_product(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, ServiceError>;
    /// Highest numeric suffix among tenant product codes starting with `prefix`, 0 when none.
    async fn max_code_sequence(&self, tenant_id: Uuid, prefix: &str) -> Result<u64, ServiceError>;
}

#[async_trait]
pub trait LifecycleRepository: Send + Sync {
    async fn insert_commitment(&self, c: commitment::Model) -> Result<commitment::Model, ServiceError>;
    async fn get_commitment(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<commitment::Model>, ServiceError>;
    async fn list_commitments(&self, tenant_id: Uuid, filter: &CommitmentFilter) -> Result<Vec<commitment::Model>, ServiceError>;
    async fn update_commitment(&self, c: commitment::Model) -> Result<commitment::Model, ServiceError>;
    async fn count_commitments_for_product(&self, tenant_id: Uuid, product_id: Uuid) -> Result<u64, ServiceError>;

    /// Inserts the subscription and stores the updated commitment atomically.
    async fn insert_subscription(&self, s: subscription::Model, commitment: commitment::Model) -> Result<subscription::Model, ServiceError>;
    async fn get_subscription(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<subscription::Model>, ServiceError>;
    async fn find_subscription_by_commitment(&self, tenant_id: Uuid, commitment_id: Uuid) -> Result<Option<subscription::Model>, ServiceError>;
    async fn list_subscriptions(&self, tenant_id: Uuid, filter: &SubscriptionFilter) -> Result<Vec<subscription::Model>, ServiceError>;
    async fn update_subscription(&self, s: subscription::Model) -> Result<subscription::Model, ServiceError>;

    /// Inserts the call unless the non-cancelled calls on its subscription would exceed
    /// `cap_cents`. The check and the insert are atomic per subscription.
    async fn insert_capital_call(&self, c: capital_call::Model, cap_cents: i64) -> Result<capital_call::Model, ServiceError>;
    async fn get_capital_call(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<capital_call::Model>, ServiceError>;
    async fn list_capital_calls(&self, tenant_id: Uuid, filter: &CapitalCallFilter) -> Result<Vec<capital_call::Model>, ServiceError>;
    async fn update_capital_call(&self, c: capital_call::Model) -> Result<capital_call::Model, ServiceError>;

    /// Inserts the receipt and, when given, stores the paid capital call atomically.
    async fn insert_receipt(&self, r: receipt::Model, paid_call: Option<capital_call::Model>) -> Result<receipt::Model, ServiceError>;
    async fn get_receipt(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<receipt::Model>, ServiceError>;
    async fn list_receipts(&self, tenant_id: Uuid, filter: &ReceiptFilter) -> Result<Vec<receipt::Model>, ServiceError>;
}

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn insert_statement(&self, s: statement::Model) -> Result<statement::Model, ServiceError>;
    async fn get_statement(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<statement::Model>, ServiceError>;
    async fn list_statements(&self, tenant_id: Uuid, client_id: Option<Uuid>) -> Result<Vec<statement::Model>, ServiceError>;
    async fn delete_statement(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, ServiceError>;

    async fn insert_kyc(&self, k: kyc_document::Model) -> Result<kyc_document::Model, ServiceError>;
    async fn get_kyc(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<kyc_document::Model>, ServiceError>;
    async fn list_kyc(&self, tenant_id: Uuid, filter: &KycFilter) -> Result<Vec<kyc_document::Model>, ServiceError>;
    async fn update_kyc(&self, k: kyc_document::Model) -> Result<kyc_document::Model, ServiceError>;
    async fn delete_kyc(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, ServiceError>;

    async fn insert_newsletter(&self, n: newsletter::Model) -> Result<newsletter::Model, ServiceError>;
    async fn get_newsletter(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<newsletter::Model>, ServiceError>;
    async fn list_newsletters(&self, tenant_id: Uuid, published_only: bool) -> Result<Vec<newsletter::Model>, ServiceError>;
    async fn update_newsletter(&self, n: newsletter::Model) -> Result<newsletter::Model, ServiceError>;
    async fn delete_newsletter(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, ServiceError>;
}

#[async_trait]
pub trait AssetRepository: Send + Sync {
    async fn insert_asset(&self, a: manual_asset::Model) -> Result<manual_asset::Model, ServiceError>;
    async fn get_asset(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<manual_asset::Model>, ServiceError>;
    async fn list_assets(&self, tenant_id: Uuid, client_id: Option<Uuid>) -> Result<Vec<manual_asset::Model>, ServiceError>;
    async fn update_asset(&self, a: manual_asset::Model) -> Result<manual_asset::Model, ServiceError>;
    async fn delete_asset(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, ServiceError>;
}
