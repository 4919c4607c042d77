//! Consolidated client portfolio: holdings from the external portfolio
//! provider merged with admin-entered assets, aggregated by category.

pub mod aggregate;
pub mod http;
pub mod service;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use aggregate::{aggregate, CategoryTotal, SubcategoryTotal};
pub use http::HttpPortfolioProvider;
pub use service::{AssetInput, PortfolioService, PortfolioView, UpdateAssetInput};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("provider returned status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldingSource {
    External,
    Manual,
}

/// One line of the consolidated view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub category: String,
    pub subcategory: String,
    pub asset_name: String,
    pub closing_balance_cents: i64,
    pub currency: String,
    pub as_of: NaiveDate,
    pub source: HoldingSource,
}

impl From<&models::manual_asset::Model> for Holding {
    fn from(a: &models::manual_asset::Model) -> Self {
        Holding {
            category: a.category.clone(),
            subcategory: a.subcategory.clone(),
            asset_name: a.asset_name.clone(),
            closing_balance_cents: a.closing_balance_cents,
            currency: a.currency.clone(),
            as_of: a.as_of,
            source: HoldingSource::Manual,
        }
    }
}

#[async_trait]
pub trait PortfolioProvider: Send + Sync {
    async fn holdings(&self, client_id: Uuid) -> Result<Vec<Holding>, ProviderError>;
}

/// Fixed answers for tests and demos.
pub mod mock {
    use super::*;

    pub struct StaticPortfolioProvider {
        pub holdings: Vec<Holding>,
        pub fail: bool,
    }

    impl StaticPortfolioProvider {
        pub fn new(holdings: Vec<Holding>) -> Self { Self { holdings, fail: false } }

        pub fn unavailable() -> Self { Self { holdings: Vec::new(), fail: true } }
    }

    #[async_trait]
    impl PortfolioProvider for StaticPortfolioProvider {
        async fn holdings(&self, _client_id: Uuid) -> Result<Vec<Holding>, ProviderError> {
            if self.fail {
                return Err(ProviderError::Transport("connection refused".into()));
            }
            Ok(self.holdings.clone())
        }
    }
}
