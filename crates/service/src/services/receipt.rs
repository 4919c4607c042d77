use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use common::types::Page;
use models::capital_call::{self, CapitalCallStatus};
use models::receipt::{self, ReceiptSource};
use models::validate::{validate_currency, validate_positive_amount};

use super::{check_file_key, discard_file, lookup_client, now, owned};
use crate::auth::{domain::Principal, repository::AuthRepository};
use crate::errors::ServiceError;
use crate::metrics;
use crate::notify::{Notice, Notifications};
use crate::pagination::Pagination;
use crate::render::{self, format_money, Party};
use crate::repository::{CatalogRepository, LifecycleRepository, ReceiptFilter};
use crate::storage::FileStore;

/// Receipt for a file already placed in the file store.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadReceiptInput {
    pub file_key: String,
    /// When set, the call must be Issued and becomes Paid.
    #[serde(default)]
    pub capital_call_id: Option<Uuid>,
    /// Taken from the capital call when omitted.
    #[serde(default)]
    pub client_id: Option<Uuid>,
    /// Must equal the call amount when a capital call is given; partial payments are not recorded.
    #[serde(default)]
    pub amount_cents: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub received_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateReceiptInput {
    #[serde(default)]
    pub received_on: Option<NaiveDate>,
}

pub struct ReceiptService {
    lifecycle: Arc<dyn LifecycleRepository>,
    catalog: Arc<dyn CatalogRepository>,
    directory: Arc<dyn AuthRepository>,
    files: Arc<dyn FileStore>,
    notifications: Notifications,
}

impl ReceiptService {
    pub fn new(
        lifecycle: Arc<dyn LifecycleRepository>,
        catalog: Arc<dyn CatalogRepository>,
        directory: Arc<dyn AuthRepository>,
        files: Arc<dyn FileStore>,
        notifications: Notifications,
    ) -> Self {
        Self { lifecycle, catalog, directory, files, notifications }
    }

    async fn issued_call(&self, tenant_id: Uuid, id: Uuid) -> Result<capital_call::Model, ServiceError> {
        let call = self
            .lifecycle
            .get_capital_call(tenant_id, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("capital call"))?;
        if call.status != CapitalCallStatus::Issued {
            return Err(ServiceError::invalid_state("capital call", call.status, "record a payment for"));
        }
        Ok(call)
    }

    #[instrument(skip(self, principal, input), fields(tenant = %principal.tenant_id))]
    pub async fn upload(&self, principal: &Principal, input: UploadReceiptInput) -> Result<receipt::Model, ServiceError> {
        principal.require_admin()?;
        let tenant_id = principal.tenant_id;
        let document_key = check_file_key(principal, &input.file_key)?;
        let received_on = input.received_on.unwrap_or_else(|| Utc::now().date_naive());

        let (client_id, amount_cents, currency, paid_call) = match input.capital_call_id {
            Some(call_id) => {
                let mut call = self.issued_call(tenant_id, call_id).await?;
                if input.client_id.is_some_and(|c| c != call.client_id) {
                    return Err(ServiceError::Validation("client does not match the capital call".into()));
                }
                let amount = input.amount_cents.unwrap_or(call.amount_cents);
                if amount != call.amount_cents {
                    return Err(ServiceError::Validation(format!(
                        "receipt amount must equal the capital call amount of {}",
                        format_money(call.amount_cents, &call.currency)
                    )));
                }
                let currency = call.currency.clone();
                call.status = CapitalCallStatus::Paid;
                call.updated_at = now();
                (call.client_id, amount, currency, Some(call))
            }
            None => {
                let client_id = input
                    .client_id
                    .ok_or_else(|| ServiceError::Validation("client_id is required without a capital call".into()))?;
                lookup_client(&self.directory, tenant_id, client_id).await?;
                let amount = input
                    .amount_cents
                    .ok_or_else(|| ServiceError::Validation("amount_cents is required without a capital call".into()))?;
                let currency = validate_currency(input.currency.as_deref().unwrap_or_default())?;
                (client_id, amount, currency, None)
            }
        };
        validate_positive_amount("amount_cents", amount_cents)?;

        let row = receipt::Model {
            id: Uuid::new_v4(),
            tenant_id,
            capital_call_id: paid_call.as_ref().map(|c| c.id),
            client_id,
            amount_cents,
            currency,
            received_on,
            source: ReceiptSource::Uploaded,
            document_key,
            created_at: now(),
        };
        let created = self.lifecycle.insert_receipt(row, paid_call).await?;
        metrics::record("receipt", "uploaded");
        info!(event = "receipt_uploaded", receipt_id = %created.id);
        self.notify(&created).await;
        Ok(created)
    }

    /// Render a receipt for an issued call and mark the call paid.
    #[instrument(skip(self, principal, input), fields(tenant = %principal.tenant_id))]
    pub async fn generate_from_capital_call(
        &self,
        principal: &Principal,
        capital_call_id: Uuid,
        input: GenerateReceiptInput,
    ) -> Result<receipt::Model, ServiceError> {
        principal.require_admin()?;
        let tenant_id = principal.tenant_id;
        let mut call = self.issued_call(tenant_id, capital_call_id).await?;
        let product = self
            .catalog
            .get_product(tenant_id, call.product_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("product"))?;
        let client = lookup_client(&self.directory, tenant_id, call.client_id).await?;
        let received_on = input.received_on.unwrap_or_else(|| Utc::now().date_naive());
        let receipt_id = Uuid::new_v4();

        let html = render::payment_receipt(
            &product,
            &call,
            &Party { name: &client.name, email: &client.email },
            received_on,
            receipt_id,
        );
        let stored = self
            .files
            .put(tenant_id, &format!("receipt-{receipt_id}.html"), html.into_bytes())
            .await?;

        let ts = now();
        let row = receipt::Model {
            id: receipt_id,
            tenant_id,
            capital_call_id: Some(call.id),
            client_id: call.client_id,
            amount_cents: call.amount_cents,
            currency: call.currency.clone(),
            received_on,
            source: ReceiptSource::Generated,
            document_key: stored.key.clone(),
            created_at: ts,
        };
        call.status = CapitalCallStatus::Paid;
        call.updated_at = ts;
        let created = match self.lifecycle.insert_receipt(row, Some(call)).await {
            Ok(created) => created,
            Err(e) => {
                discard_file(&self.files, &stored.key).await;
                return Err(e);
            }
        };
        metrics::record("receipt", "generated");
        metrics::record("capital_call", "paid");
        info!(event = "receipt_generated", receipt_id = %created.id, capital_call_id = %capital_call_id);
        self.notify(&created).await;
        Ok(created)
    }

    async fn notify(&self, r: &receipt::Model) {
        let notice = Notice::new(
            "receipt_recorded",
            r.id,
            "Payment received",
            format!(
                "We received your payment of {} on {}.",
                format_money(r.amount_cents, &r.currency),
                r.received_on.format("%Y-%m-%d")
            ),
        );
        self.notifications.user(r.tenant_id, r.client_id, &notice).await;
    }

    pub async fn get(&self, principal: &Principal, id: Uuid) -> Result<receipt::Model, ServiceError> {
        let row = self.lifecycle.get_receipt(principal.tenant_id, id).await?;
        owned(principal, row, |r| r.client_id, "receipt")
    }

    pub async fn list(
        &self,
        principal: &Principal,
        mut filter: ReceiptFilter,
        page: Pagination,
    ) -> Result<Page<receipt::Model>, ServiceError> {
        filter.client_id = principal.scope_client(filter.client_id);
        let rows = self.lifecycle.list_receipts(principal.tenant_id, &filter).await?;
        Ok(page.apply(rows))
    }
}
