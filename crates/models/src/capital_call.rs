use sea_orm::{entity::prelude::*, FromJsonQueryResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{errors::ModelError, subscription, validate::validate_required};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum CapitalCallStatus {
    #[sea_orm(string_value = "issued")]
    Issued,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

/// Where the client should wire the called capital.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct BankDetails {
    pub bank_name: String,
    pub account_name: String,
    pub account_number: String,
    #[serde(default)]
    pub iban: Option<String>,
    #[serde(default)]
    pub swift: Option<String>,
    pub reference: String,
}

impl BankDetails {
    pub fn validate(&self) -> Result<(), ModelError> {
        validate_required("bank_name", &self.bank_name)?;
        validate_required("account_name", &self.account_name)?;
        validate_required("account_number", &self.account_number)?;
        validate_required("reference", &self.reference)?;
        if let Some(swift) = &self.swift {
            let len = swift.trim().len();
            if len != 8 && len != 11 {
                return Err(ModelError::Validation("swift must be 8 or 11 characters".into()));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "capital_call")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub subscription_id: Uuid,
    pub client_id: Uuid,
    pub product_id: Uuid,
    pub amount_cents: i64,
    pub currency: String,
    pub due_date: Date,
    #[sea_orm(column_type = "JsonBinary")]
    pub bank_details: BankDetails,
    pub status: CapitalCallStatus,
    pub document_key: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Subscription }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Subscription => Entity::belongs_to(subscription::Entity)
                .from(Column::SubscriptionId)
                .to(subscription::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}
