use sea_orm::{entity::prelude::*, FromJsonQueryResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{errors::ModelError, tenant};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    #[sea_orm(string_value = "private_equity")]
    PrivateEquity,
    #[sea_orm(string_value = "venture_capital")]
    VentureCapital,
    #[sea_orm(string_value = "real_estate")]
    RealEstate,
    #[sea_orm(string_value = "private_credit")]
    PrivateCredit,
    #[sea_orm(string_value = "hedge_fund")]
    HedgeFund,
    #[sea_orm(string_value = "infrastructure")]
    Infrastructure,
    #[sea_orm(string_value = "other")]
    Other,
}

impl ProductCategory {
    /// Two-letter prefix used in generated product codes.
    pub fn prefix(&self) -> &'static str {
        match self {
            ProductCategory::PrivateEquity => "PE",
            ProductCategory::VentureCapital => "VC",
            ProductCategory::RealEstate => "RE",
            ProductCategory::PrivateCredit => "PC",
            ProductCategory::HedgeFund => "HF",
            ProductCategory::Infrastructure => "IN",
            ProductCategory::Other => "OT",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "open")]
    Open,
    #[sea_orm(string_value = "closed")]
    Closed,
}

impl ProductStatus {
    /// Draft -> Open, Open -> Closed, Closed -> Open.
    pub fn can_transition_to(&self, next: ProductStatus) -> bool {
        matches!(
            (self, next),
            (ProductStatus::Draft, ProductStatus::Open)
                | (ProductStatus::Open, ProductStatus::Closed)
                | (ProductStatus::Closed, ProductStatus::Open)
        )
    }

    pub fn visible_to_clients(&self) -> bool {
        !matches!(self, ProductStatus::Draft)
    }
}

/// Fee schedule in basis points (1 bp = 0.01%).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct FeeSchedule {
    #[serde(default)]
    pub management_fee_bps: u32,
    #[serde(default)]
    pub performance_fee_bps: u32,
    #[serde(default)]
    pub entry_fee_bps: u32,
    #[serde(default)]
    pub hurdle_rate_bps: u32,
}

impl FeeSchedule {
    pub fn validate(&self) -> Result<(), ModelError> {
        let fields = [
            ("management_fee_bps", self.management_fee_bps),
            ("performance_fee_bps", self.performance_fee_bps),
            ("entry_fee_bps", self.entry_fee_bps),
            ("hurdle_rate_bps", self.hurdle_rate_bps),
        ];
        for (name, v) in fields {
            if v > 10_000 {
                return Err(ModelError::Validation(format!("{name} must be within 0..=10000")));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct MediaUrls(pub Vec<String>);

impl MediaUrls {
    pub fn validate(&self) -> Result<(), ModelError> {
        for url in &self.0 {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(ModelError::Validation(format!("media url must be http(s): {url}")));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub code: String,
    pub name: String,
    pub category: ProductCategory,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub currency: String,
    pub min_investment_cents: i64,
    pub target_size_cents: Option<i64>,
    #[sea_orm(column_type = "JsonBinary")]
    pub fee_schedule: FeeSchedule,
    #[sea_orm(column_type = "JsonBinary")]
    pub media_urls: MediaUrls,
    pub status: ProductStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Tenant }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Tenant => Entity::belongs_to(tenant::Entity)
                .from(Column::TenantId)
                .to(tenant::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_transitions() {
        assert!(ProductStatus::Draft.can_transition_to(ProductStatus::Open));
        assert!(ProductStatus::Open.can_transition_to(ProductStatus::Closed));
        assert!(ProductStatus::Closed.can_transition_to(ProductStatus::Open));
        assert!(!ProductStatus::Open.can_transition_to(ProductStatus::Draft));
        assert!(!ProductStatus::Draft.can_transition_to(ProductStatus::Closed));
    }

    #[test]
    fn fee_schedule_bounds() {
        let ok = FeeSchedule { management_fee_bps: 200, performance_fee_bps: 2000, ..Default::default() };
        assert!(ok.validate().is_ok());
        let bad = FeeSchedule { entry_fee_bps: 10_001, ..Default::default() };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn category_serializes_snake_case() {
        let v = serde_json::to_value(ProductCategory::PrivateEquity).unwrap();
        assert_eq!(v, "private_equity");
        assert_eq!(ProductCategory::RealEstate.prefix(), "RE");
    }
}
