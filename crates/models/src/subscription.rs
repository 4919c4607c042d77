use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::commitment;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(24))")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    #[sea_orm(string_value = "pending_signature")]
    PendingSignature,
    #[sea_orm(string_value = "signed")]
    Signed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscription")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub commitment_id: Uuid,
    pub product_id: Uuid,
    pub client_id: Uuid,
    pub amount_cents: i64,
    pub currency: String,
    #[sea_orm(column_type = "Text")]
    pub terms: String,
    pub status: SubscriptionStatus,
    #[sea_orm(column_type = "Text", nullable)]
    #[serde(skip_serializing)]
    pub signature_data_url: Option<String>,
    pub document_key: Option<String>,
    pub document_sha256: Option<String>,
    pub signed_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Commitment }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Commitment => Entity::belongs_to(commitment::Entity)
                .from(Column::CommitmentId)
                .to(commitment::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}
