use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use common::types::Page;
use models::commitment::{self, CommitmentStatus};
use models::product::ProductStatus;
use models::validate::validate_positive_amount;

use super::{acting_client, lookup_client, now, owned};
use crate::auth::{domain::Principal, repository::AuthRepository};
use crate::errors::ServiceError;
use crate::metrics;
use crate::notify::{Notice, Notifications};
use crate::pagination::Pagination;
use crate::render::format_money;
use crate::repository::{CatalogRepository, CommitmentFilter, LifecycleRepository};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCommitmentInput {
    pub product_id: Uuid,
    pub amount_cents: i64,
    /// Required when an admin commits on behalf of a client.
    #[serde(default)]
    pub client_id: Option<Uuid>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductStatusTotal {
    pub product_id: Uuid,
    pub status: CommitmentStatus,
    pub count: u64,
    pub total_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthTotal {
    pub year: i32,
    pub month: u32,
    pub count: u64,
    pub total_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitmentSummary {
    pub by_product: Vec<ProductStatusTotal>,
    pub by_month: Vec<MonthTotal>,
}

/// Group commitments per (product, status) and per calendar month of creation.
/// Totals saturate at `i64::MAX`.
pub fn summarize(rows: &[commitment::Model]) -> CommitmentSummary {
    let mut by_product: BTreeMap<(Uuid, &'static str), ProductStatusTotal> = BTreeMap::new();
    let mut by_month: BTreeMap<(i32, u32), MonthTotal> = BTreeMap::new();
    for c in rows {
        let e = by_product.entry((c.product_id, c.status.as_str())).or_insert(ProductStatusTotal {
            product_id: c.product_id,
            status: c.status,
            count: 0,
            total_cents: 0,
        });
        e.count += 1;
        e.total_cents = e.total_cents.saturating_add(c.amount_cents);

        let (year, month) = (c.created_at.year(), c.created_at.month());
        let m = by_month.entry((year, month)).or_insert(MonthTotal { year, month, count: 0, total_cents: 0 });
        m.count += 1;
        m.total_cents = m.total_cents.saturating_add(c.amount_cents);
    }
    CommitmentSummary {
        by_product: by_product.into_values().collect(),
        by_month: by_month.into_values().collect(),
    }
}

pub struct CommitmentService {
    lifecycle: Arc<dyn LifecycleRepository>,
    catalog: Arc<dyn CatalogRepository>,
    directory: Arc<dyn AuthRepository>,
    notifications: Notifications,
}

impl CommitmentService {
    pub fn new(
        lifecycle: Arc<dyn LifecycleRepository>,
        catalog: Arc<dyn CatalogRepository>,
        directory: Arc<dyn AuthRepository>,
        notifications: Notifications,
    ) -> Self {
        Self { lifecycle, catalog, directory, notifications }
    }

    #[instrument(skip(self, principal, input), fields(tenant = %principal.tenant_id))]
    pub async fn create(&self, principal: &Principal, input: CreateCommitmentInput) -> Result<commitment::Model, ServiceError> {
        let client_id = acting_client(principal, input.client_id)?;
        let client = lookup_client(&self.directory, principal.tenant_id, client_id).await?;
        let product = self
            .catalog
            .get_product(principal.tenant_id, input.product_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("product"))?;
        if product.status != ProductStatus::Open {
            return Err(ServiceError::InvalidState("product is not open for commitments".into()));
        }
        validate_positive_amount("amount_cents", input.amount_cents)?;
        if input.amount_cents < product.min_investment_cents {
            return Err(ServiceError::Validation(format!(
                "amount below minimum investment of {}",
                format_money(product.min_investment_cents, &product.currency)
            )));
        }
        let ts = now();
        let row = commitment::Model {
            id: Uuid::new_v4(),
            tenant_id: principal.tenant_id,
            product_id: product.id,
            client_id,
            amount_cents: input.amount_cents,
            currency: product.currency.clone(),
            status: CommitmentStatus::Pending,
            note: input.note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            created_by: principal.user_id,
            created_at: ts,
            updated_at: ts,
        };
        let created = self.lifecycle.insert_commitment(row).await?;
        metrics::record("commitment", "created");
        info!(event = "commitment_created", commitment_id = %created.id, product_id = %product.id);

        let notice = Notice::new(
            "commitment_created",
            created.id,
            format!("New commitment for {}", product.name),
            format!(
                "{} committed {} to {} ({}).",
                client.name,
                format_money(created.amount_cents, &created.currency),
                product.name,
                product.code
            ),
        );
        self.notifications.admins(principal.tenant_id, &notice).await;
        Ok(created)
    }

    pub async fn get(&self, principal: &Principal, id: Uuid) -> Result<commitment::Model, ServiceError> {
        let row = self.lifecycle.get_commitment(principal.tenant_id, id).await?;
        owned(principal, row, |c| c.client_id, "commitment")
    }

    pub async fn list(
        &self,
        principal: &Principal,
        mut filter: CommitmentFilter,
        page: Pagination,
    ) -> Result<Page<commitment::Model>, ServiceError> {
        filter.client_id = principal.scope_client(filter.client_id);
        let rows = self.lifecycle.list_commitments(principal.tenant_id, &filter).await?;
        Ok(page.apply(rows))
    }

    pub async fn accept(&self, principal: &Principal, id: Uuid) -> Result<commitment::Model, ServiceError> {
        self.decide(principal, id, CommitmentStatus::Accepted).await
    }

    pub async fn reject(&self, principal: &Principal, id: Uuid) -> Result<commitment::Model, ServiceError> {
        self.decide(principal, id, CommitmentStatus::Rejected).await
    }

    #[instrument(skip(self, principal), fields(tenant = %principal.tenant_id))]
    async fn decide(&self, principal: &Principal, id: Uuid, next: CommitmentStatus) -> Result<commitment::Model, ServiceError> {
        principal.require_admin()?;
        let mut c = self.get(principal, id).await?;
        if c.status != CommitmentStatus::Pending {
            return Err(ServiceError::invalid_state("commitment", c.status, next.as_str()));
        }
        c.status = next;
        c.updated_at = now();
        let saved = self.lifecycle.update_commitment(c).await?;
        metrics::record("commitment", next.as_str());
        info!(event = "commitment_decided", commitment_id = %saved.id, status = next.as_str());

        let notice = Notice::new(
            "commitment_decided",
            saved.id,
            format!("Your commitment was {}", next.as_str()),
            format!(
                "Your commitment of {} has been {}.",
                format_money(saved.amount_cents, &saved.currency),
                next.as_str()
            ),
        );
        self.notifications.user(principal.tenant_id, saved.client_id, &notice).await;
        Ok(saved)
    }

    /// Only the owning client may withdraw, and only while pending.
    #[instrument(skip(self, principal), fields(tenant = %principal.tenant_id))]
    pub async fn withdraw(&self, principal: &Principal, id: Uuid) -> Result<commitment::Model, ServiceError> {
        let mut c = self.get(principal, id).await?;
        if c.client_id != principal.user_id {
            return Err(ServiceError::Forbidden("only the committing client may withdraw".into()));
        }
        if c.status != CommitmentStatus::Pending {
            return Err(ServiceError::invalid_state("commitment", c.status, "withdraw"));
        }
        c.status = CommitmentStatus::Withdrawn;
        c.updated_at = now();
        let saved = self.lifecycle.update_commitment(c).await?;
        metrics::record("commitment", "withdrawn");
        Ok(saved)
    }

    pub async fn summary(&self, principal: &Principal, product_id: Option<Uuid>) -> Result<CommitmentSummary, ServiceError> {
        let filter = CommitmentFilter {
            product_id,
            client_id: principal.scope_client(None),
            status: None,
        };
        let rows = self.lifecycle.list_commitments(principal.tenant_id, &filter).await?;
        Ok(summarize(&rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::product::{CreateProductInput, ProductService};
    use crate::services::testkit::Kit;
    use chrono::{FixedOffset, TimeZone};
    use models::product::{self, ProductCategory};

    async fn open_product(kit: &Kit) -> product::Model {
        let svc = ProductService::new(kit.repo.clone(), kit.repo.clone());
        let p = svc
            .create(
                &kit.admin,
                CreateProductInput {
                    name: "Growth Fund".into(),
                    category: ProductCategory::VentureCapital,
                    description: String::new(),
                    currency: "EUR".into(),
                    min_investment_cents: 1_000_000,
                    target_size_cents: None,
                    fee_schedule: Default::default(),
                    media_urls: vec![],
                },
            )
            .await
            .unwrap();
        svc.set_status(&kit.admin, p.id, ProductStatus::Open).await.unwrap()
    }

    fn service(kit: &Kit) -> CommitmentService {
        CommitmentService::new(kit.repo.clone(), kit.repo.clone(), kit.directory.clone(), kit.notifications())
    }

    fn commit(product_id: Uuid, amount_cents: i64) -> CreateCommitmentInput {
        CreateCommitmentInput { product_id, amount_cents, client_id: None, note: None }
    }

    #[tokio::test]
    async fn client_commits_and_admins_are_emailed() {
        let kit = Kit::new().await;
        let p = open_product(&kit).await;
        let svc = service(&kit);
        let c = svc.create(&kit.client, commit(p.id, 2_500_000)).await.unwrap();
        assert_eq!(c.client_id, kit.client.user_id);
        assert_eq!(c.currency, "EUR");
        assert_eq!(c.status, CommitmentStatus::Pending);
        assert_eq!(kit.notifier.emails_to("admin@acme.io").len(), 1);
    }

    #[tokio::test]
    async fn minimum_and_open_status_enforced() {
        let kit = Kit::new().await;
        let p = open_product(&kit).await;
        let svc = service(&kit);
        assert!(matches!(svc.create(&kit.client, commit(p.id, 999_999)).await, Err(ServiceError::Validation(_))));
        let at_min = svc.create(&kit.client, commit(p.id, 1_000_000)).await.unwrap();
        assert_eq!(at_min.amount_cents, p.min_investment_cents);
        assert!(matches!(svc.create(&kit.client, commit(p.id, i64::MAX)).await, Err(ServiceError::Validation(_))));

        ProductService::new(kit.repo.clone(), kit.repo.clone())
            .set_status(&kit.admin, p.id, ProductStatus::Closed)
            .await
            .unwrap();
        assert!(matches!(svc.create(&kit.client, commit(p.id, 2_000_000)).await, Err(ServiceError::InvalidState(_))));
    }

    #[tokio::test]
    async fn admin_commits_on_behalf_of_client() {
        let kit = Kit::new().await;
        let p = open_product(&kit).await;
        let svc = service(&kit);
        assert!(matches!(svc.create(&kit.admin, commit(p.id, 2_000_000)).await, Err(ServiceError::Validation(_))));
        let mut input = commit(p.id, 2_000_000);
        input.client_id = Some(kit.client.user_id);
        let c = svc.create(&kit.admin, input).await.unwrap();
        assert_eq!(c.client_id, kit.client.user_id);
        assert_eq!(c.created_by, kit.admin.user_id);
    }

    #[tokio::test]
    async fn decisions_only_from_pending() {
        let kit = Kit::new().await;
        let p = open_product(&kit).await;
        let svc = service(&kit);
        let c = svc.create(&kit.client, commit(p.id, 2_000_000)).await.unwrap();
        assert!(matches!(svc.accept(&kit.client, c.id).await, Err(ServiceError::Forbidden(_))));
        let accepted = svc.accept(&kit.admin, c.id).await.unwrap();
        assert_eq!(accepted.status, CommitmentStatus::Accepted);
        assert_eq!(kit.notifier.pushes_for(kit.client.user_id).len(), 1);
        assert!(matches!(svc.reject(&kit.admin, c.id).await, Err(ServiceError::InvalidState(_))));
        assert!(matches!(svc.withdraw(&kit.client, c.id).await, Err(ServiceError::InvalidState(_))));
    }

    #[tokio::test]
    async fn withdraw_is_owner_only_and_clients_are_isolated() {
        let kit = Kit::new().await;
        let p = open_product(&kit).await;
        let svc = service(&kit);
        let c = svc.create(&kit.client, commit(p.id, 2_000_000)).await.unwrap();
        assert!(matches!(svc.get(&kit.other_client, c.id).await, Err(ServiceError::NotFound(_))));
        let page = svc.list(&kit.other_client, CommitmentFilter::default(), Pagination::default()).await.unwrap();
        assert_eq!(page.total, 0);
        let w = svc.withdraw(&kit.client, c.id).await.unwrap();
        assert_eq!(w.status, CommitmentStatus::Withdrawn);
    }

    #[test]
    fn summary_groups_by_product_status_and_month() {
        let tz = FixedOffset::east_opt(0).unwrap();
        let product_id = Uuid::new_v4();
        let mk = |amount: i64, status: CommitmentStatus, y: i32, m: u32| {
            let ts = tz.with_ymd_and_hms(y, m, 10, 12, 0, 0).unwrap();
            commitment::Model {
                id: Uuid::new_v4(),
                tenant_id: Uuid::nil(),
                product_id,
                client_id: Uuid::new_v4(),
                amount_cents: amount,
                currency: "USD".into(),
                status,
                note: None,
                created_by: Uuid::nil(),
                created_at: ts,
                updated_at: ts,
            }
        };
        let rows = vec![
            mk(100, CommitmentStatus::Pending, 2024, 5),
            mk(200, CommitmentStatus::Pending, 2023, 11),
            mk(300, CommitmentStatus::Accepted, 2024, 5),
        ];
        let s = summarize(&rows);
        assert_eq!(s.by_product.len(), 2);
        let pending = s.by_product.iter().find(|t| t.status == CommitmentStatus::Pending).unwrap();
        assert_eq!((pending.count, pending.total_cents), (2, 300));
        assert_eq!(
            s.by_month.iter().map(|m| (m.year, m.month, m.total_cents)).collect::<Vec<_>>(),
            vec![(2023, 11, 200), (2024, 5, 400)]
        );

        let huge = vec![
            mk(i64::MAX, CommitmentStatus::Pending, 2024, 5),
            mk(i64::MAX, CommitmentStatus::Pending, 2024, 5),
        ];
        let s = summarize(&huge);
        assert_eq!(s.by_product[0].total_cents, i64::MAX);
        assert_eq!(s.by_month[0].count, 2);
    }
}
