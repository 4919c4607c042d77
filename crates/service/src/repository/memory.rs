//! In-memory repository for tests and local experiments.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use models::{capital_call, commitment, kyc_document, manual_asset, newsletter, product, receipt, statement, subscription};

use super::{
    check_call_cap, code_sequence, AssetRepository, CapitalCallFilter, CatalogRepository, CommitmentFilter, DocumentRepository, KycFilter,
    LifecycleRepository, ProductFilter, ReceiptFilter, SubscriptionFilter,
};
use crate::errors::ServiceError;

#[derive(Default)]
pub struct MemoryRepository {
    products: Mutex<HashMap<Uuid, product::Model>>,
    commitments: Mutex<HashMap<Uuid, commitment::Model>>,
    subscriptions: Mutex<HashMap<Uuid, subscription::Model>>,
    capital_calls: Mutex<HashMap<Uuid, capital_call::Model>>,
    receipts: Mutex<HashMap<Uuid, receipt::Model>>,
    statements: Mutex<HashMap<Uuid, statement::Model>>,
    kyc: Mutex<HashMap<Uuid, kyc_document::Model>>,
    newsletters: Mutex<HashMap<Uuid, newsletter::Model>>,
    assets: Mutex<HashMap<Uuid, manual_asset::Model>>,
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn select<T: Clone, K: Ord>(
    table: &Mutex<HashMap<Uuid, T>>,
    keep: impl Fn(&T) -> bool,
    sort_key: impl Fn(&T) -> K,
) -> Vec<T> {
    let mut rows: Vec<T> = lock(table).values().filter(|r| keep(r)).cloned().collect();
    rows.sort_by_key(|r| sort_key(r));
    rows
}

fn replace<T: Clone>(table: &Mutex<HashMap<Uuid, T>>, id: Uuid, row: T, entity: &str) -> Result<T, ServiceError> {
    let mut t = lock(table);
    match t.get_mut(&id) {
        Some(slot) => {
            *slot = row.clone();
            Ok(row)
        }
        None => Err(ServiceError::not_found(entity)),
    }
}

fn remove_if<T>(table: &Mutex<HashMap<Uuid, T>>, id: Uuid, owned: impl Fn(&T) -> bool) -> bool {
    let mut t = lock(table);
    if t.get(&id).map_or(false, owned) {
        t.remove(&id);
        true
    } else {
        false
    }
}

#[async_trait]
impl CatalogRepository for MemoryRepository {
    async fn insert_product(&self, p: product::Model) -> Result<product::Model, ServiceError> {
        let mut t = lock(&self.products);
        if t.values().any(|x| x.tenant_id == p.tenant_id && x.code == p.code) {
            return Err(ServiceError::Conflict(format!("product code {} already exists", p.code)));
        }
        t.insert(p.id, p.clone());
        Ok(p)
    }

    async fn get_product(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<product::Model>, ServiceError> {
        Ok(lock(&self.products).get(&id).filter(|p| p.tenant_id == tenant_id).cloned())
    }

    async fn list_products(&self, tenant_id: Uuid, filter: &ProductFilter) -> Result<Vec<product::Model>, ServiceError> {
        Ok(select(
            &self.products,
            |p| p.tenant_id == tenant_id && filter.matches(p),
            |p| std::cmp::Reverse(p.created_at),
        ))
    }

    async fn update_product(&self, p: product::Model) -> Result<product::Model, ServiceError> {
        replace(&self.products, p.id, p, "product")
    }

    async fn delete_product(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, ServiceError> {
        Ok(remove_if(&self.products, id, |p| p.tenant_id == tenant_id))
    }

    async fn max_code_sequence(&self, tenant_id: Uuid, prefix: &str) -> Result<u64, ServiceError> {
        Ok(lock(&self.products)
            .values()
            .filter(|p| p.tenant_id == tenant_id)
            .filter_map(|p| code_sequence(&p.code, prefix))
            .max()
            .unwrap_or(0))
    }
}

#[async_trait]
impl LifecycleRepository for MemoryRepository {
    async fn insert_commitment(&self, c: commitment::Model) -> Result<commitment::Model, ServiceError> {
        lock(&self.commitments).insert(c.id, c.clone());
        Ok(c)
    }

    async fn get_commitment(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<commitment::Model>, ServiceError> {
        Ok(lock(&self.commitments).get(&id).filter(|c| c.tenant_id == tenant_id).cloned())
    }

    async fn list_commitments(&self, tenant_id: Uuid, filter: &CommitmentFilter) -> Result<Vec<commitment::Model>, ServiceError> {
        Ok(select(
            &self.commitments,
            |c| c.tenant_id == tenant_id && filter.matches(c),
            |c| std::cmp::Reverse(c.created_at),
        ))
    }

    async fn update_commitment(&self, c: commitment::Model) -> Result<commitment::Model, ServiceError> {
        replace(&self.commitments, c.id, c, "commitment")
    }

    async fn count_commitments_for_product(&self, tenant_id: Uuid, product_id: Uuid) -> Result<u64, ServiceError> {
        Ok(lock(&self.commitments)
            .values()
            .filter(|c| c.tenant_id == tenant_id && c.product_id == product_id)
            .count() as u64)
    }

    async fn insert_subscription(&self, s: subscription::Model, c: commitment::Model) -> Result<subscription::Model, ServiceError> {
        let mut subs = lock(&self.subscriptions);
        if subs.values().any(|x| x.commitment_id == s.commitment_id) {
            return Err(ServiceError::Conflict("commitment already has a subscription".into()));
        }
        let mut commitments = lock(&self.commitments);
        if !commitments.contains_key(&c.id) {
            return Err(ServiceError::not_found("commitment"));
        }
        commitments.insert(c.id, c);
        subs.insert(s.id, s.clone());
        Ok(s)
    }

    async fn get_subscription(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<subscription::Model>, ServiceError> {
        Ok(lock(&self.subscriptions).get(&id).filter(|s| s.tenant_id == tenant_id).cloned())
    }

    async fn find_subscription_by_commitment(&self, tenant_id: Uuid, commitment_id: Uuid) -> Result<Option<subscription::Model>, ServiceError> {
        Ok(lock(&self.subscriptions)
            .values()
            .find(|s| s.tenant_id == tenant_id && s.commitment_id == commitment_id)
            .cloned())
    }

    async fn list_subscriptions(&self, tenant_id: Uuid, filter: &SubscriptionFilter) -> Result<Vec<subscription::Model>, ServiceError> {
        Ok(select(
            &self.subscriptions,
            |s| s.tenant_id == tenant_id && filter.matches(s),
            |s| std::cmp::Reverse(s.created_at),
        ))
    }

    async fn update_subscription(&self, s: subscription::Model) -> Result<subscription::Model, ServiceError> {
        replace(&self.subscriptions, s.id, s, "subscription")
    }

    async fn insert_capital_call(&self, c: capital_call::Model, cap_cents: i64) -> Result<capital_call::Model, ServiceError> {
        let mut calls = lock(&self.capital_calls);
        check_call_cap(
            calls.values().filter(|x| x.subscription_id == c.subscription_id),
            c.amount_cents,
            cap_cents,
            &c.currency,
        )?;
        calls.insert(c.id, c.clone());
        Ok(c)
    }

    async fn get_capital_call(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<capital_call::Model>, ServiceError> {
        Ok(lock(&self.capital_calls).get(&id).filter(|c| c.tenant_id == tenant_id).cloned())
    }

    async fn list_capital_calls(&self, tenant_id: Uuid, filter: &CapitalCallFilter) -> Result<Vec<capital_call::Model>, ServiceError> {
        Ok(select(
            &self.capital_calls,
            |c| c.tenant_id == tenant_id && filter.matches(c),
            |c| std::cmp::Reverse(c.created_at),
        ))
    }

    async fn update_capital_call(&self, c: capital_call::Model) -> Result<capital_call::Model, ServiceError> {
        replace(&self.capital_calls, c.id, c, "capital call")
    }

    async fn insert_receipt(&self, r: receipt::Model, paid_call: Option<capital_call::Model>) -> Result<receipt::Model, ServiceError> {
        if let Some(call) = paid_call {
            replace(&self.capital_calls, call.id, call, "capital call")?;
        }
        lock(&self.receipts).insert(r.id, r.clone());
        Ok(r)
    }

    async fn get_receipt(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<receipt::Model>, ServiceError> {
        Ok(lock(&self.receipts).get(&id).filter(|r| r.tenant_id == tenant_id).cloned())
    }

    async fn list_receipts(&self, tenant_id: Uuid, filter: &ReceiptFilter) -> Result<Vec<receipt::Model>, ServiceError> {
        Ok(select(
            &self.receipts,
            |r| r.tenant_id == tenant_id && filter.matches(r),
            |r| std::cmp::Reverse(r.created_at),
        ))
    }
}

#[async_trait]
impl DocumentRepository for MemoryRepository {
    async fn insert_statement(&self, s: statement::Model) -> Result<statement::Model, ServiceError> {
        lock(&self.statements).insert(s.id, s.clone());
        Ok(s)
    }

    async fn get_statement(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<statement::Model>, ServiceError> {
        Ok(lock(&self.statements).get(&id).filter(|s| s.tenant_id == tenant_id).cloned())
    }

    async fn list_statements(&self, tenant_id: Uuid, client_id: Option<Uuid>) -> Result<Vec<statement::Model>, ServiceError> {
        Ok(select(
            &self.statements,
            |s| s.tenant_id == tenant_id && client_id.map_or(true, |id| s.client_id == id),
            |s| std::cmp::Reverse(s.created_at),
        ))
    }

    async fn delete_statement(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, ServiceError> {
        Ok(remove_if(&self.statements, id, |s| s.tenant_id == tenant_id))
    }

    async fn insert_kyc(&self, k: kyc_document::Model) -> Result<kyc_document::Model, ServiceError> {
        lock(&self.kyc).insert(k.id, k.clone());
        Ok(k)
    }

    async fn get_kyc(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<kyc_document::Model>, ServiceError> {
        Ok(lock(&self.kyc).get(&id).filter(|k| k.tenant_id == tenant_id).cloned())
    }

    async fn list_kyc(&self, tenant_id: Uuid, filter: &KycFilter) -> Result<Vec<kyc_document::Model>, ServiceError> {
        Ok(select(
            &self.kyc,
            |k| k.tenant_id == tenant_id && filter.matches(k),
            |k| std::cmp::Reverse(k.created_at),
        ))
    }

    async fn update_kyc(&self, k: kyc_document::Model) -> Result<kyc_document::Model, ServiceError> {
        replace(&self.kyc, k.id, k, "kyc document")
    }

    async fn delete_kyc(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, ServiceError> {
        Ok(remove_if(&self.kyc, id, |k| k.tenant_id == tenant_id))
    }

    async fn insert_newsletter(&self, n: newsletter::Model) -> Result<newsletter::Model, ServiceError> {
        lock(&self.newsletters).insert(n.id, n.clone());
        Ok(n)
    }

    async fn get_newsletter(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<newsletter::Model>, ServiceError> {
        Ok(lock(&self.newsletters).get(&id).filter(|n| n.tenant_id == tenant_id).cloned())
    }

    async fn list_newsletters(&self, tenant_id: Uuid, published_only: bool) -> Result<Vec<newsletter::Model>, ServiceError> {
        Ok(select(
            &self.newsletters,
            |n| n.tenant_id == tenant_id && (!published_only || n.published),
            |n| std::cmp::Reverse(n.created_at),
        ))
    }

    async fn update_newsletter(&self, n: newsletter::Model) -> Result<newsletter::Model, ServiceError> {
        replace(&self.newsletters, n.id, n, "newsletter")
    }

    async fn delete_newsletter(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, ServiceError> {
        Ok(remove_if(&self.newsletters, id, |n| n.tenant_id == tenant_id))
    }
}

#[async_trait]
impl AssetRepository for MemoryRepository {
    async fn insert_asset(&self, a: manual_asset::Model) -> Result<manual_asset::Model, ServiceError> {
        lock(&self.assets).insert(a.id, a.clone());
        Ok(a)
    }

    async fn get_asset(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<manual_asset::Model>, ServiceError> {
        Ok(lock(&self.assets).get(&id).filter(|a| a.tenant_id == tenant_id).cloned())
    }

    async fn list_assets(&self, tenant_id: Uuid, client_id: Option<Uuid>) -> Result<Vec<manual_asset::Model>, ServiceError> {
        Ok(select(
            &self.assets,
            |a| a.tenant_id == tenant_id && client_id.map_or(true, |id| a.client_id == id),
            |a| (a.category.clone(), a.asset_name.clone()),
        ))
    }

    async fn update_asset(&self, a: manual_asset::Model) -> Result<manual_asset::Model, ServiceError> {
        replace(&self.assets, a.id, a, "asset")
    }

    async fn delete_asset(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, ServiceError> {
        Ok(remove_if(&self.assets, id, |a| a.tenant_id == tenant_id))
    }
}
