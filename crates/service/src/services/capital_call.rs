use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use common::types::Page;
use models::capital_call::{self, BankDetails, CapitalCallStatus};
use models::subscription::SubscriptionStatus;
use models::validate::validate_positive_amount;

use super::{discard_file, lookup_client, now, owned};
use crate::auth::{domain::Principal, repository::AuthRepository};
use crate::errors::ServiceError;
use crate::metrics;
use crate::notify::{Notice, Notifications};
use crate::pagination::Pagination;
use crate::render::{self, format_money, Party};
use crate::repository::{CapitalCallFilter, CatalogRepository, LifecycleRepository};
use crate::storage::FileStore;

#[derive(Debug, Clone, Deserialize)]
pub struct IssueCapitalCallInput {
    pub subscription_id: Uuid,
    pub amount_cents: i64,
    pub due_date: NaiveDate,
    pub bank_details: BankDetails,
}

pub struct CapitalCallService {
    lifecycle: Arc<dyn LifecycleRepository>,
    catalog: Arc<dyn CatalogRepository>,
    directory: Arc<dyn AuthRepository>,
    files: Arc<dyn FileStore>,
    notifications: Notifications,
}

impl CapitalCallService {
    pub fn new(
        lifecycle: Arc<dyn LifecycleRepository>,
        catalog: Arc<dyn CatalogRepository>,
        directory: Arc<dyn AuthRepository>,
        files: Arc<dyn FileStore>,
        notifications: Notifications,
    ) -> Self {
        Self { lifecycle, catalog, directory, files, notifications }
    }

    /// Calls against one subscription never exceed its amount (cancelled calls excluded).
    #[instrument(skip(self, principal, input), fields(tenant = %principal.tenant_id))]
    pub async fn issue(&self, principal: &Principal, input: IssueCapitalCallInput) -> Result<capital_call::Model, ServiceError> {
        principal.require_admin()?;
        let tenant_id = principal.tenant_id;
        validate_positive_amount("amount_cents", input.amount_cents)?;
        input.bank_details.validate()?;
        let sub = self
            .lifecycle
            .get_subscription(tenant_id, input.subscription_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("subscription"))?;
        if sub.status != SubscriptionStatus::Signed {
            return Err(ServiceError::invalid_state("subscription", sub.status, "issue a capital call on"));
        }
        let product = self
            .catalog
            .get_product(tenant_id, sub.product_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("product"))?;
        let client = lookup_client(&self.directory, tenant_id, sub.client_id).await?;

        let ts = now();
        let mut bank_details = input.bank_details;
        bank_details.swift = bank_details.swift.map(|s| s.trim().to_ascii_uppercase());
        let mut row = capital_call::Model {
            id: Uuid::new_v4(),
            tenant_id,
            subscription_id: sub.id,
            client_id: sub.client_id,
            product_id: sub.product_id,
            amount_cents: input.amount_cents,
            currency: sub.currency.clone(),
            due_date: input.due_date,
            bank_details,
            status: CapitalCallStatus::Issued,
            document_key: String::new(),
            created_at: ts,
            updated_at: ts,
        };
        let html = render::capital_call_notice(&product, &row, &Party { name: &client.name, email: &client.email });
        let stored = self
            .files
            .put(tenant_id, &format!("capital-call-{}.html", row.id), html.into_bytes())
            .await?;
        row.document_key = stored.key.clone();
        let created = match self.lifecycle.insert_capital_call(row, sub.amount_cents).await {
            Ok(created) => created,
            Err(e) => {
                discard_file(&self.files, &stored.key).await;
                return Err(e);
            }
        };
        metrics::record("capital_call", "issued");
        info!(event = "capital_call_issued", capital_call_id = %created.id, subscription_id = %sub.id);

        let notice = Notice::new(
            "capital_call_issued",
            created.id,
            format!("Capital call for {}", product.name),
            format!(
                "A capital call of {} is due on {}.",
                format_money(created.amount_cents, &created.currency),
                created.due_date.format("%Y-%m-%d")
            ),
        );
        self.notifications.user(tenant_id, created.client_id, &notice).await;
        Ok(created)
    }

    pub async fn get(&self, principal: &Principal, id: Uuid) -> Result<capital_call::Model, ServiceError> {
        let row = self.lifecycle.get_capital_call(principal.tenant_id, id).await?;
        owned(principal, row, |c| c.client_id, "capital call")
    }

    pub async fn list(
        &self,
        principal: &Principal,
        mut filter: CapitalCallFilter,
        page: Pagination,
    ) -> Result<Page<capital_call::Model>, ServiceError> {
        filter.client_id = principal.scope_client(filter.client_id);
        let rows = self.lifecycle.list_capital_calls(principal.tenant_id, &filter).await?;
        Ok(page.apply(rows))
    }

    #[instrument(skip(self, principal), fields(tenant = %principal.tenant_id))]
    pub async fn cancel(&self, principal: &Principal, id: Uuid) -> Result<capital_call::Model, ServiceError> {
        principal.require_admin()?;
        let mut call = self.get(principal, id).await?;
        if call.status != CapitalCallStatus::Issued {
            return Err(ServiceError::invalid_state("capital call", call.status, "cancel"));
        }
        call.status = CapitalCallStatus::Cancelled;
        call.updated_at = now();
        let saved = self.lifecycle.update_capital_call(call).await?;
        metrics::record("capital_call", "cancelled");
        Ok(saved)
    }
}
