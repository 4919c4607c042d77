use async_trait::async_trait;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use models::{capital_call, commitment, kyc_document, manual_asset, newsletter, product, receipt, statement, subscription};

use super::{
    check_call_cap, code_sequence, AssetRepository, CapitalCallFilter, CatalogRepository, CommitmentFilter, DocumentRepository, KycFilter,
    LifecycleRepository, ProductFilter, ReceiptFilter, SubscriptionFilter,
};
use crate::errors::ServiceError;

/// SeaORM-backed implementation of every repository trait.
#[derive(Clone)]
pub struct SeaOrmRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

async fn insert_row<A, C>(db: &C, am: A) -> Result<<A::Entity as EntityTrait>::Model, ServiceError>
where
    A: ActiveModelTrait + ActiveModelBehavior + Send,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    C: ConnectionTrait,
{
    Ok(am.reset_all().insert(db).await?)
}

async fn update_row<A, C>(db: &C, am: A) -> Result<<A::Entity as EntityTrait>::Model, ServiceError>
where
    A: ActiveModelTrait + ActiveModelBehavior + Send,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    C: ConnectionTrait,
{
    Ok(am.reset_all().update(db).await?)
}

#[async_trait]
impl CatalogRepository for SeaOrmRepository {
    async fn insert_product(&self, p: product::Model) -> Result<product::Model, ServiceError> {
        insert_row(&self.db, product::ActiveModel::from(p)).await
    }

    async fn get_product(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<product::Model>, ServiceError> {
        Ok(product::Entity::find_by_id(id)
            .filter(product::Column::TenantId.eq(tenant_id))
            .one(&self.db)
            .await?)
    }

    async fn list_products(&self, tenant_id: Uuid, filter: &ProductFilter) -> Result<Vec<product::Model>, ServiceError> {
        let mut q = product::Entity::find().filter(product::Column::TenantId.eq(tenant_id));
        if let Some(s) = filter.status {
            q = q.filter(product::Column::Status.eq(s));
        }
        if let Some(c) = filter.category {
            q = q.filter(product::Column::Category.eq(c));
        }
        if filter.client_visible {
            q = q.filter(product::Column::Status.ne(product::ProductStatus::Draft));
        }
        Ok(q.order_by_desc(product::Column::CreatedAt).all(&self.db).await?)
    }

    async fn update_product(&self, p: product::Model) -> Result<product::Model, ServiceError> {
        update_row(&self.db, product::ActiveModel::from(p)).await
    }

    async fn delete_product(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, ServiceError> {
        let res = product::Entity::delete_many()
            .filter(product::Column::TenantId.eq(tenant_id))
            .filter(product::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected > 0)
    }

    async fn max_code_sequence(&self, tenant_id: Uuid, prefix: &str) -> Result<u64, ServiceError> {
        let codes: Vec<String> = product::Entity::find()
            .select_only()
            .column(product::Column::Code)
            .filter(product::Column::TenantId.eq(tenant_id))
            .filter(product::Column::Code.starts_with(prefix))
            .into_tuple()
            .all(&self.db)
            .await?;
        Ok(codes.iter().filter_map(|c| code_sequence(c, prefix)).max().unwrap_or(0))
    }
}

#[async_trait]
impl LifecycleRepository for SeaOrmRepository {
    async fn insert_commitment(&self, c: commitment::Model) -> Result<commitment::Model, ServiceError> {
        insert_row(&self.db, commitment::ActiveModel::from(c)).await
    }

    async fn get_commitment(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<commitment::Model>, ServiceError> {
        Ok(commitment::Entity::find_by_id(id)
            .filter(commitment::Column::TenantId.eq(tenant_id))
            .one(&self.db)
            .await?)
    }

    async fn list_commitments(&self, tenant_id: Uuid, filter: &CommitmentFilter) -> Result<Vec<commitment::Model>, ServiceError> {
        let mut q = commitment::Entity::find().filter(commitment::Column::TenantId.eq(tenant_id));
        if let Some(id) = filter.product_id {
            q = q.filter(commitment::Column::ProductId.eq(id));
        }
        if let Some(id) = filter.client_id {
            q = q.filter(commitment::Column::ClientId.eq(id));
        }
        if let Some(s) = filter.status {
            q = q.filter(commitment::Column::Status.eq(s));
        }
        Ok(q.order_by_desc(commitment::Column::CreatedAt).all(&self.db).await?)
    }

    async fn update_commitment(&self, c: commitment::Model) -> Result<commitment::Model, ServiceError> {
        update_row(&self.db, commitment::ActiveModel::from(c)).await
    }

    async fn count_commitments_for_product(&self, tenant_id: Uuid, product_id: Uuid) -> Result<u64, ServiceError> {
        Ok(commitment::Entity::find()
            .filter(commitment::Column::TenantId.eq(tenant_id))
            .filter(commitment::Column::ProductId.eq(product_id))
            .count(&self.db)
            .await?)
    }

    async fn insert_subscription(&self, s: subscription::Model, c: commitment::Model) -> Result<subscription::Model, ServiceError> {
        let txn = self.db.begin().await?;
        let created = insert_row(&txn, subscription::ActiveModel::from(s)).await?;
        update_row(&txn, commitment::ActiveModel::from(c)).await?;
        txn.commit().await?;
        Ok(created)
    }

    async fn get_subscription(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<subscription::Model>, ServiceError> {
        Ok(subscription::Entity::find_by_id(id)
            .filter(subscription::Column::TenantId.eq(tenant_id))
            .one(&self.db)
            .await?)
    }

    async fn find_subscription_by_commitment(&self, tenant_id: Uuid, commitment_id: Uuid) -> Result<Option<subscription::Model>, ServiceError> {
        Ok(subscription::Entity::find()
            .filter(subscription::Column::TenantId.eq(tenant_id))
            .filter(subscription::Column::CommitmentId.eq(commitment_id))
            .one(&self.db)
            .await?)
    }

    async fn list_subscriptions(&self, tenant_id: Uuid, filter: &SubscriptionFilter) -> Result<Vec<subscription::Model>, ServiceError> {
        let mut q = subscription::Entity::find().filter(subscription::Column::TenantId.eq(tenant_id));
        if let Some(id) = filter.product_id {
            q = q.filter(subscription::Column::ProductId.eq(id));
        }
        if let Some(id) = filter.client_id {
            q = q.filter(subscription::Column::ClientId.eq(id));
        }
        if let Some(s) = filter.status {
            q = q.filter(subscription::Column::Status.eq(s));
        }
        Ok(q.order_by_desc(subscription::Column::CreatedAt).all(&self.db).await?)
    }

    async fn update_subscription(&self, s: subscription::Model) -> Result<subscription::Model, ServiceError> {
        update_row(&self.db, subscription::ActiveModel::from(s)).await
    }

    async fn insert_capital_call(&self, c: capital_call::Model, cap_cents: i64) -> Result<capital_call::Model, ServiceError> {
        let txn = self.db.begin().await?;
        // Row lock serialises concurrent issues against the same subscription.
        subscription::Entity::find_by_id(c.subscription_id)
            .filter(subscription::Column::TenantId.eq(c.tenant_id))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("subscription"))?;
        let existing = capital_call::Entity::find()
            .filter(capital_call::Column::SubscriptionId.eq(c.subscription_id))
            .all(&txn)
            .await?;
        check_call_cap(&existing, c.amount_cents, cap_cents, &c.currency)?;
        let created = insert_row(&txn, capital_call::ActiveModel::from(c)).await?;
        txn.commit().await?;
        Ok(created)
    }

    async fn get_capital_call(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<capital_call::Model>, ServiceError> {
        Ok(capital_call::Entity::find_by_id(id)
            .filter(capital_call::Column::TenantId.eq(tenant_id))
            .one(&self.db)
            .await?)
    }

    async fn list_capital_calls(&self, tenant_id: Uuid, filter: &CapitalCallFilter) -> Result<Vec<capital_call::Model>, ServiceError> {
        let mut q = capital_call::Entity::find().filter(capital_call::Column::TenantId.eq(tenant_id));
        if let Some(id) = filter.subscription_id {
            q = q.filter(capital_call::Column::SubscriptionId.eq(id));
        }
        if let Some(id) = filter.client_id {
            q = q.filter(capital_call::Column::ClientId.eq(id));
        }
        if let Some(s) = filter.status {
            q = q.filter(capital_call::Column::Status.eq(s));
        }
        Ok(q.order_by_desc(capital_call::Column::CreatedAt).all(&self.db).await?)
    }

    async fn update_capital_call(&self, c: capital_call::Model) -> Result<capital_call::Model, ServiceError> {
        update_row(&self.db, capital_call::ActiveModel::from(c)).await
    }

    async fn insert_receipt(&self, r: receipt::Model, paid_call: Option<capital_call::Model>) -> Result<receipt::Model, ServiceError> {
        let txn = self.db.begin().await?;
        let created = insert_row(&txn, receipt::ActiveModel::from(r)).await?;
        if let Some(call) = paid_call {
            update_row(&txn, capital_call::ActiveModel::from(call)).await?;
        }
        txn.commit().await?;
        Ok(created)
    }

    async fn get_receipt(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<receipt::Model>, ServiceError> {
        Ok(receipt::Entity::find_by_id(id)
            .filter(receipt::Column::TenantId.eq(tenant_id))
            .one(&self.db)
            .await?)
    }

    async fn list_receipts(&self, tenant_id: Uuid, filter: &ReceiptFilter) -> Result<Vec<receipt::Model>, ServiceError> {
        let mut q = receipt::Entity::find().filter(receipt::Column::TenantId.eq(tenant_id));
        if let Some(id) = filter.client_id {
            q = q.filter(receipt::Column::ClientId.eq(id));
        }
        if let Some(id) = filter.capital_call_id {
            q = q.filter(receipt::Column::CapitalCallId.eq(id));
        }
        Ok(q.order_by_desc(receipt::Column::CreatedAt).all(&self.db).await?)
    }
}

#[async_trait]
impl DocumentRepository for SeaOrmRepository {
    async fn insert_statement(&self, s: statement::Model) -> Result<statement::Model, ServiceError> {
        insert_row(&self.db, statement::ActiveModel::from(s)).await
    }

    async fn get_statement(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<statement::Model>, ServiceError> {
        Ok(statement::Entity::find_by_id(id)
            .filter(statement::Column::TenantId.eq(tenant_id))
            .one(&self.db)
            .await?)
    }

    async fn list_statements(&self, tenant_id: Uuid, client_id: Option<Uuid>) -> Result<Vec<statement::Model>, ServiceError> {
        let mut q = statement::Entity::find().filter(statement::Column::TenantId.eq(tenant_id));
        if let Some(id) = client_id {
            q = q.filter(statement::Column::ClientId.eq(id));
        }
        Ok(q.order_by_desc(statement::Column::CreatedAt).all(&self.db).await?)
    }

    async fn delete_statement(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, ServiceError> {
        let res = statement::Entity::delete_many()
            .filter(statement::Column::TenantId.eq(tenant_id))
            .filter(statement::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected > 0)
    }

    async fn insert_kyc(&self, k: kyc_document::Model) -> Result<kyc_document::Model, ServiceError> {
        insert_row(&self.db, kyc_document::ActiveModel::from(k)).await
    }

    async fn get_kyc(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<kyc_document::Model>, ServiceError> {
        Ok(kyc_document::Entity::find_by_id(id)
            .filter(kyc_document::Column::TenantId.eq(tenant_id))
            .one(&self.db)
            .await?)
    }

    async fn list_kyc(&self, tenant_id: Uuid, filter: &KycFilter) -> Result<Vec<kyc_document::Model>, ServiceError> {
        let mut q = kyc_document::Entity::find().filter(kyc_document::Column::TenantId.eq(tenant_id));
        if let Some(id) = filter.client_id {
            q = q.filter(kyc_document::Column::ClientId.eq(id));
        }
        if let Some(s) = filter.status {
            q = q.filter(kyc_document::Column::Status.eq(s));
        }
        Ok(q.order_by_desc(kyc_document::Column::CreatedAt).all(&self.db).await?)
    }

    async fn update_kyc(&self, k: kyc_document::Model) -> Result<kyc_document::Model, ServiceError> {
        update_row(&self.db, kyc_document::ActiveModel::from(k)).await
    }

    async fn delete_kyc(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, ServiceError> {
        let res = kyc_document::Entity::delete_many()
            .filter(kyc_document::Column::TenantId.eq(tenant_id))
            .filter(kyc_document::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected > 0)
    }

    async fn insert_newsletter(&self, n: newsletter::Model) -> Result<newsletter::Model, ServiceError> {
        insert_row(&self.db, newsletter::ActiveModel::from(n)).await
    }

    async fn get_newsletter(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<newsletter::Model>, ServiceError> {
        Ok(newsletter::Entity::find_by_id(id)
            .filter(newsletter::Column::TenantId.eq(tenant_id))
            .one(&self.db)
            .await?)
    }

    async fn list_newsletters(&self, tenant_id: Uuid, published_only: bool) -> Result<Vec<newsletter::Model>, ServiceError> {
        let mut q = newsletter::Entity::find().filter(newsletter::Column::TenantId.eq(tenant_id));
        if published_only {
            q = q.filter(newsletter::Column::Published.eq(true));
        }
        Ok(q.order_by_desc(newsletter::Column::CreatedAt).all(&self.db).await?)
    }

    async fn update_newsletter(&self, n: newsletter::Model) -> Result<newsletter::Model, ServiceError> {
        update_row(&self.db, newsletter::ActiveModel::from(n)).await
    }

    async fn delete_newsletter(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, ServiceError> {
        let res = newsletter::Entity::delete_many()
            .filter(newsletter::Column::TenantId.eq(tenant_id))
            .filter(newsletter::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected > 0)
    }
}

#[async_trait]
impl AssetRepository for SeaOrmRepository {
    async fn insert_asset(&self, a: manual_asset::Model) -> Result<manual_asset::Model, ServiceError> {
        insert_row(&self.db, manual_asset::ActiveModel::from(a)).await
    }

    async fn get_asset(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<manual_asset::Model>, ServiceError> {
        Ok(manual_asset::Entity::find_by_id(id)
            .filter(manual_asset::Column::TenantId.eq(tenant_id))
            .one(&self.db)
            .await?)
    }

    async fn list_assets(&self, tenant_id: Uuid, client_id: Option<Uuid>) -> Result<Vec<manual_asset::Model>, ServiceError> {
        let mut q = manual_asset::Entity::find().filter(manual_asset::Column::TenantId.eq(tenant_id));
        if let Some(id) = client_id {
            q = q.filter(manual_asset::Column::ClientId.eq(id));
        }
        Ok(q.order_by_asc(manual_asset::Column::Category)
            .order_by_asc(manual_asset::Column::AssetName)
            .all(&self.db)
            .await?)
    }

    async fn update_asset(&self, a: manual_asset::Model) -> Result<manual_asset::Model, ServiceError> {
        update_row(&self.db, manual_asset::ActiveModel::from(a)).await
    }

    async fn delete_asset(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, ServiceError> {
        let res = manual_asset::Entity::delete_many()
            .filter(manual_asset::Column::TenantId.eq(tenant_id))
            .filter(manual_asset::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected > 0)
    }
}
