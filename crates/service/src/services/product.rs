use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use common::types::Page;
use models::product::{self, FeeSchedule, MediaUrls, ProductCategory, ProductStatus};
use models::validate::{validate_currency, validate_name, validate_positive_amount};

use super::now;
use crate::auth::domain::Principal;
use crate::errors::ServiceError;
use crate::metrics;
use crate::pagination::Pagination;
use crate::repository::{CatalogRepository, LifecycleRepository, ProductFilter};

const CODE_ATTEMPTS: u64 = 3;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductInput {
    pub name: String,
    pub category: ProductCategory,
    #[serde(default)]
    pub description: String,
    pub currency: String,
    pub min_investment_cents: i64,
    #[serde(default)]
    pub target_size_cents: Option<i64>,
    #[serde(default)]
    pub fee_schedule: FeeSchedule,
    #[serde(default)]
    pub media_urls: Vec<String>,
}

/// Partial update; the product code never changes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub min_investment_cents: Option<i64>,
    pub target_size_cents: Option<Option<i64>>,
    pub fee_schedule: Option<FeeSchedule>,
    pub media_urls: Option<Vec<String>>,
}

/// `<PREFIX><YYYY><MM><SEQ:03>`, e.g. `PE202403007`.
pub fn generate_code(category: ProductCategory, date: NaiveDate, sequence: u64) -> String {
    format!("{}{:03}", code_prefix(category, date), sequence)
}

fn code_prefix(category: ProductCategory, date: NaiveDate) -> String {
    format!("{}{:04}{:02}", category.prefix(), date.year(), date.month())
}

fn validate_target(min: i64, target: Option<i64>) -> Result<(), ServiceError> {
    if let Some(t) = target {
        if t < min {
            return Err(ServiceError::Validation("target size must not be below minimum investment".into()));
        }
    }
    Ok(())
}

pub struct ProductService {
    catalog: Arc<dyn CatalogRepository>,
    lifecycle: Arc<dyn LifecycleRepository>,
}

impl ProductService {
    pub fn new(catalog: Arc<dyn CatalogRepository>, lifecycle: Arc<dyn LifecycleRepository>) -> Self {
        Self { catalog, lifecycle }
    }

    #[instrument(skip(self, principal, input), fields(tenant = %principal.tenant_id))]
    pub async fn create(&self, principal: &Principal, input: CreateProductInput) -> Result<product::Model, ServiceError> {
        principal.require_admin()?;
        validate_name(&input.name)?;
        let currency = validate_currency(&input.currency)?;
        validate_positive_amount("min_investment_cents", input.min_investment_cents)?;
        validate_target(input.min_investment_cents, input.target_size_cents)?;
        input.fee_schedule.validate()?;
        let media = MediaUrls(input.media_urls);
        media.validate()?;

        let prefix = code_prefix(input.category, Utc::now().date_naive());
        let ts = now();
        let mut row = product::Model {
            id: Uuid::new_v4(),
            tenant_id: principal.tenant_id,
            code: String::new(),
            name: input.name.trim().to_string(),
            category: input.category,
            description: input.description,
            currency,
            min_investment_cents: input.min_investment_cents,
            target_size_cents: input.target_size_cents,
            fee_schedule: input.fee_schedule,
            media_urls: media,
            status: ProductStatus::Draft,
            created_at: ts,
            updated_at: ts,
        };
        // Two admins creating in the same month can race for a sequence number.
        for attempt in 0..CODE_ATTEMPTS {
            let last = self.catalog.max_code_sequence(principal.tenant_id, &prefix).await?;
            row.code = format!("{prefix}{:03}", last + 1 + attempt);
            match self.catalog.insert_product(row.clone()).await {
                Ok(created) => {
                    metrics::record("product", "created");
                    info!(event = "product_created", product_id = %created.id, code = %created.code);
                    return Ok(created);
                }
                Err(ServiceError::Conflict(_)) => warn!(code = %row.code, "product code taken, retrying"),
                Err(e) => return Err(e),
            }
        }
        Err(ServiceError::Conflict("could not allocate a product code".into()))
    }

    /// Drafts are invisible to clients.
    pub async fn get(&self, principal: &Principal, id: Uuid) -> Result<product::Model, ServiceError> {
        match self.catalog.get_product(principal.tenant_id, id).await? {
            Some(p) if principal.is_admin() || p.status.visible_to_clients() => Ok(p),
            _ => Err(ServiceError::not_found("product")),
        }
    }

    pub async fn list(
        &self,
        principal: &Principal,
        mut filter: ProductFilter,
        page: Pagination,
    ) -> Result<Page<product::Model>, ServiceError> {
        filter.client_visible = !principal.is_admin();
        let rows = self.catalog.list_products(principal.tenant_id, &filter).await?;
        Ok(page.apply(rows))
    }

    #[instrument(skip(self, principal, input), fields(tenant = %principal.tenant_id))]
    pub async fn update(&self, principal: &Principal, id: Uuid, input: UpdateProductInput) -> Result<product::Model, ServiceError> {
        principal.require_admin()?;
        let mut p = self.get(principal, id).await?;
        if let Some(name) = input.name {
            validate_name(&name)?;
            p.name = name.trim().to_string();
        }
        if let Some(d) = input.description {
            p.description = d;
        }
        if let Some(min) = input.min_investment_cents {
            validate_positive_amount("min_investment_cents", min)?;
            p.min_investment_cents = min;
        }
        if let Some(target) = input.target_size_cents {
            p.target_size_cents = target;
        }
        validate_target(p.min_investment_cents, p.target_size_cents)?;
        if let Some(fees) = input.fee_schedule {
            fees.validate()?;
            p.fee_schedule = fees;
        }
        if let Some(urls) = input.media_urls {
            let media = MediaUrls(urls);
            media.validate()?;
            p.media_urls = media;
        }
        p.updated_at = now();
        self.catalog.update_product(p).await
    }

    #[instrument(skip(self, principal), fields(tenant = %principal.tenant_id))]
    pub async fn set_status(&self, principal: &Principal, id: Uuid, status: ProductStatus) -> Result<product::Model, ServiceError> {
        principal.require_admin()?;
        let mut p = self.get(principal, id).await?;
        if !p.status.can_transition_to(status) {
            return Err(ServiceError::invalid_state("product", p.status, &format!("move to {status:?}")));
        }
        p.status = status;
        p.updated_at = now();
        let saved = self.catalog.update_product(p).await?;
        metrics::record("product", "status_changed");
        info!(event = "product_status", product_id = %saved.id, status = ?saved.status);
        Ok(saved)
    }

    #[instrument(skip(self, principal), fields(tenant = %principal.tenant_id))]
    pub async fn delete(&self, principal: &Principal, id: Uuid) -> Result<(), ServiceError> {
        principal.require_admin()?;
        self.get(principal, id).await?;
        if self.lifecycle.count_commitments_for_product(principal.tenant_id, id).await? > 0 {
            return Err(ServiceError::Conflict("product has commitments".into()));
        }
        if !self.catalog.delete_product(principal.tenant_id, id).await? {
            return Err(ServiceError::not_found("product"));
        }
        metrics::record("product", "deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testkit::Kit;

    fn input(name: &str) -> CreateProductInput {
        CreateProductInput {
            name: name.into(),
            category: ProductCategory::PrivateEquity,
            description: "Buyout fund".into(),
            currency: "usd".into(),
            min_investment_cents: 10_000_000,
            target_size_cents: Some(5_000_000_000),
            fee_schedule: FeeSchedule { management_fee_bps: 200, performance_fee_bps: 2000, ..Default::default() },
            media_urls: vec!["https://cdn.example.com/deck.pdf".into()],
        }
    }

    fn service(kit: &Kit) -> ProductService {
        ProductService::new(kit.repo.clone(), kit.repo.clone())
    }

    #[test]
    fn code_format() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(generate_code(ProductCategory::PrivateEquity, d, 7), "PE202403007");
        assert_eq!(generate_code(ProductCategory::HedgeFund, d, 112), "HF202403112");
    }

    #[tokio::test]
    async fn codes_are_sequential_per_prefix() {
        let kit = Kit::new().await;
        let svc = service(&kit);
        let a = svc.create(&kit.admin, input("Fund A")).await.unwrap();
        let b = svc.create(&kit.admin, input("Fund B")).await.unwrap();
        assert!(a.code.starts_with("PE"));
        assert!(a.code.ends_with("001"));
        assert!(b.code.ends_with("002"));
        assert_eq!(a.currency, "USD");
        assert_eq!(a.status, ProductStatus::Draft);
    }

    #[tokio::test]
    async fn codes_continue_after_deleted_drafts() {
        let kit = Kit::new().await;
        let svc = service(&kit);
        let mut created = Vec::new();
        for i in 0..6 {
            created.push(svc.create(&kit.admin, input(&format!("Fund {i}"))).await.unwrap());
        }
        for p in &created[..3] {
            svc.delete(&kit.admin, p.id).await.unwrap();
        }
        let next = svc.create(&kit.admin, input("Fund 7")).await.unwrap();
        assert!(next.code.ends_with("007"), "{}", next.code);
    }

    #[tokio::test]
    async fn clients_cannot_create_or_see_drafts() {
        let kit = Kit::new().await;
        let svc = service(&kit);
        assert!(matches!(svc.create(&kit.client, input("X")).await, Err(ServiceError::Forbidden(_))));
        let p = svc.create(&kit.admin, input("Fund A")).await.unwrap();
        assert!(matches!(svc.get(&kit.client, p.id).await, Err(ServiceError::NotFound(_))));
        let page = svc.list(&kit.client, ProductFilter::default(), Pagination::default()).await.unwrap();
        assert_eq!(page.total, 0);

        svc.set_status(&kit.admin, p.id, ProductStatus::Open).await.unwrap();
        let page = svc.list(&kit.client, ProductFilter::default(), Pagination::default()).await.unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn status_machine_is_enforced() {
        let kit = Kit::new().await;
        let svc = service(&kit);
        let p = svc.create(&kit.admin, input("Fund A")).await.unwrap();
        let err = svc.set_status(&kit.admin, p.id, ProductStatus::Closed).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        svc.set_status(&kit.admin, p.id, ProductStatus::Open).await.unwrap();
        svc.set_status(&kit.admin, p.id, ProductStatus::Closed).await.unwrap();
        let reopened = svc.set_status(&kit.admin, p.id, ProductStatus::Open).await.unwrap();
        assert_eq!(reopened.status, ProductStatus::Open);
    }

    #[tokio::test]
    async fn rejects_invalid_input() {
        let kit = Kit::new().await;
        let svc = service(&kit);
        let mut bad = input("Fund");
        bad.currency = "US".into();
        assert!(matches!(svc.create(&kit.admin, bad).await, Err(ServiceError::Model(_))));
        let mut bad = input("Fund");
        bad.min_investment_cents = 0;
        assert!(svc.create(&kit.admin, bad).await.is_err());
        let mut bad = input("Fund");
        bad.fee_schedule.management_fee_bps = 20_000;
        assert!(svc.create(&kit.admin, bad).await.is_err());
    }

    #[tokio::test]
    async fn update_keeps_code() {
        let kit = Kit::new().await;
        let svc = service(&kit);
        let p = svc.create(&kit.admin, input("Fund A")).await.unwrap();
        let upd = UpdateProductInput { name: Some("Fund A II".into()), ..Default::default() };
        let saved = svc.update(&kit.admin, p.id, upd).await.unwrap();
        assert_eq!(saved.name, "Fund A II");
        assert_eq!(saved.code, p.code);
    }
}
