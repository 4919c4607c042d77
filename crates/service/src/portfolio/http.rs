use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use uuid::Uuid;

use super::{Holding, HoldingSource, PortfolioProvider, ProviderError};

#[derive(Debug, Deserialize)]
struct HoldingsResponse {
    holdings: Vec<ExternalHolding>,
}

#[derive(Debug, Deserialize)]
struct ExternalHolding {
    category: String,
    #[serde(default)]
    subcategory: Option<String>,
    asset_name: String,
    closing_balance_cents: i64,
    currency: String,
    as_of: NaiveDate,
}

impl From<ExternalHolding> for Holding {
    fn from(h: ExternalHolding) -> Self {
        Holding {
            category: h.category,
            subcategory: h.subcategory.unwrap_or_else(|| "Other".into()),
            asset_name: h.asset_name,
            closing_balance_cents: h.closing_balance_cents,
            currency: h.currency.to_ascii_uppercase(),
            as_of: h.as_of,
            source: HoldingSource::External,
        }
    }
}

/// `GET {base_url}/users/{client_id}/holdings` with a bearer API key.
pub struct HttpPortfolioProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpPortfolioProvider {
    /// `None` when no base URL is configured.
    pub fn from_config(cfg: &configs::PortfolioConfig) -> Result<Option<Self>, ProviderError> {
        let Some(base_url) = cfg.base_url.as_deref().map(|u| u.trim().trim_end_matches('/').to_string()) else {
            return Ok(None);
        };
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        Ok(Some(Self { client, base_url, api_key: cfg.api_key.clone() }))
    }

    fn url(&self, client_id: Uuid) -> String {
        format!("{}/users/{}/holdings", self.base_url, client_id)
    }
}

#[async_trait]
impl PortfolioProvider for HttpPortfolioProvider {
    async fn holdings(&self, client_id: Uuid) -> Result<Vec<Holding>, ProviderError> {
        let mut req = self.client.get(self.url(client_id));
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send().await.map_err(|e| ProviderError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(ProviderError::Status(resp.status().as_u16()));
        }
        let body: HoldingsResponse = resp.json().await.map_err(|e| ProviderError::Decode(e.to_string()))?;
        Ok(body.holdings.into_iter().map(Holding::from).collect())
    }
}
