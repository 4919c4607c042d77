use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use models::manual_asset;
use models::validate::{validate_currency, validate_required, MAX_AMOUNT_CENTS};

use super::{aggregate, CategoryTotal, Holding, PortfolioProvider};
use crate::auth::{domain::Principal, repository::AuthRepository};
use crate::errors::ServiceError;
use crate::metrics;
use crate::repository::AssetRepository;
use crate::services::{lookup_client, now};

#[derive(Debug, Clone, Deserialize)]
pub struct AssetInput {
    pub client_id: Uuid,
    pub category: String,
    pub subcategory: String,
    pub asset_name: String,
    pub closing_balance_cents: i64,
    pub currency: String,
    pub as_of: NaiveDate,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAssetInput {
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub asset_name: Option<String>,
    pub closing_balance_cents: Option<i64>,
    pub currency: Option<String>,
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioView {
    pub client_id: Uuid,
    pub holdings: Vec<Holding>,
    pub categories: Vec<CategoryTotal>,
    pub total_cents: i64,
    /// False when the external provider is disabled or could not be reached.
    pub external_available: bool,
}

fn check_taxonomy(category: &str, subcategory: &str, asset_name: &str) -> Result<(), ServiceError> {
    validate_required("category", category)?;
    validate_required("subcategory", subcategory)?;
    validate_required("asset_name", asset_name)?;
    Ok(())
}

fn check_balance(cents: i64) -> Result<(), ServiceError> {
    if cents < 0 {
        return Err(ServiceError::Validation("closing balance must not be negative".into()));
    }
    if cents > MAX_AMOUNT_CENTS {
        return Err(ServiceError::Validation(format!("closing balance exceeds {MAX_AMOUNT_CENTS}")));
    }
    Ok(())
}

pub struct PortfolioService {
    assets: Arc<dyn AssetRepository>,
    directory: Arc<dyn AuthRepository>,
    provider: Option<Arc<dyn PortfolioProvider>>,
}

impl PortfolioService {
    pub fn new(
        assets: Arc<dyn AssetRepository>,
        directory: Arc<dyn AuthRepository>,
        provider: Option<Arc<dyn PortfolioProvider>>,
    ) -> Self {
        Self { assets, directory, provider }
    }

    #[instrument(skip(self, principal, input), fields(tenant = %principal.tenant_id))]
    pub async fn create_asset(&self, principal: &Principal, input: AssetInput) -> Result<manual_asset::Model, ServiceError> {
        principal.require_admin()?;
        check_taxonomy(&input.category, &input.subcategory, &input.asset_name)?;
        check_balance(input.closing_balance_cents)?;
        let currency = validate_currency(&input.currency)?;
        lookup_client(&self.directory, principal.tenant_id, input.client_id).await?;
        let ts = now();
        let row = manual_asset::Model {
            id: Uuid::new_v4(),
            tenant_id: principal.tenant_id,
            client_id: input.client_id,
            category: input.category.trim().to_string(),
            subcategory: input.subcategory.trim().to_string(),
            asset_name: input.asset_name.trim().to_string(),
            closing_balance_cents: input.closing_balance_cents,
            currency,
            as_of: input.as_of,
            created_at: ts,
            updated_at: ts,
        };
        let created = self.assets.insert_asset(row).await?;
        metrics::record("manual_asset", "created");
        Ok(created)
    }

    pub async fn list_assets(&self, principal: &Principal, client_id: Option<Uuid>) -> Result<Vec<manual_asset::Model>, ServiceError> {
        self.assets.list_assets(principal.tenant_id, principal.scope_client(client_id)).await
    }

    pub async fn update_asset(&self, principal: &Principal, id: Uuid, input: UpdateAssetInput) -> Result<manual_asset::Model, ServiceError> {
        principal.require_admin()?;
        let mut a = self
            .assets
            .get_asset(principal.tenant_id, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("asset"))?;
        if let Some(v) = input.category {
            a.category = v.trim().to_string();
        }
        if let Some(v) = input.subcategory {
            a.subcategory = v.trim().to_string();
        }
        if let Some(v) = input.asset_name {
            a.asset_name = v.trim().to_string();
        }
        check_taxonomy(&a.category, &a.subcategory, &a.asset_name)?;
        if let Some(v) = input.closing_balance_cents {
            check_balance(v)?;
            a.closing_balance_cents = v;
        }
        if let Some(v) = input.currency {
            a.currency = validate_currency(&v)?;
        }
        if let Some(v) = input.as_of {
            a.as_of = v;
        }
        a.updated_at = now();
        self.assets.update_asset(a).await
    }

    pub async fn delete_asset(&self, principal: &Principal, id: Uuid) -> Result<(), ServiceError> {
        principal.require_admin()?;
        if !self.assets.delete_asset(principal.tenant_id, id).await? {
            return Err(ServiceError::not_found("asset"));
        }
        Ok(())
    }

    /// External holdings merged with manual assets. Provider failures degrade the view, never fail it.
    #[instrument(skip(self, principal), fields(tenant = %principal.tenant_id))]
    pub async fn view(&self, principal: &Principal, client_id: Uuid) -> Result<PortfolioView, ServiceError> {
        principal.require_client_access(client_id)?;
        lookup_client(&self.directory, principal.tenant_id, client_id).await?;

        let (external, mut external_available) = match &self.provider {
            None => {
                metrics::PORTFOLIO_FETCH_TOTAL.with_label_values(&["disabled"]).inc();
                (Vec::new(), false)
            }
            Some(p) => match p.holdings(client_id).await {
                Ok(h) => {
                    metrics::PORTFOLIO_FETCH_TOTAL.with_label_values(&["ok"]).inc();
                    info!(%client_id, count = h.len(), "external holdings fetched");
                    (h, true)
                }
                Err(e) => {
                    metrics::PORTFOLIO_FETCH_TOTAL.with_label_values(&["error"]).inc();
                    warn!(%client_id, error = %e, "portfolio provider unavailable");
                    (Vec::new(), false)
                }
            },
        };
        let manual: Vec<Holding> = self
            .assets
            .list_assets(principal.tenant_id, Some(client_id))
            .await?
            .iter()
            .map(Holding::from)
            .collect();
        let mut holdings = external;
        holdings.extend(manual.iter().cloned());

        let (categories, total_cents) = match aggregate(&holdings) {
            Some(totals) => totals,
            None => {
                // Provider balances are untrusted; drop them like an unreadable payload.
                metrics::PORTFOLIO_FETCH_TOTAL.with_label_values(&["error"]).inc();
                warn!(%client_id, "external balances overflow the portfolio totals; ignoring them");
                external_available = false;
                holdings = manual;
                aggregate(&holdings)
                    .ok_or_else(|| ServiceError::Validation("manual asset balances overflow the portfolio total".into()))?
            }
        };

        let currencies: BTreeSet<&str> = holdings.iter().map(|h| h.currency.as_str()).collect();
        if currencies.len() > 1 {
            warn!(%client_id, ?currencies, "portfolio mixes currencies; totals are not converted");
        }
        Ok(PortfolioView { client_id, holdings, categories, total_cents, external_available })
    }
}
