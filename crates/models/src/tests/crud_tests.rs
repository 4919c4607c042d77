use anyhow::Result;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, Set};
use uuid::Uuid;

use crate::commitment::{self, CommitmentStatus};
use crate::product::{self, FeeSchedule, MediaUrls, ProductCategory, ProductStatus};
use crate::user::{self, Role};
use crate::tenant;

use super::setup_test_db;

fn product_row(tenant_id: Uuid, code: &str) -> product::ActiveModel {
    let now = Utc::now().into();
    product::ActiveModel {
        id: Set(Uuid::new_v4()),
        tenant_id: Set(tenant_id),
        code: Set(code.to_string()),
        name: Set("Growth Fund I".into()),
        category: Set(ProductCategory::PrivateEquity),
        description: Set(String::new()),
        currency: Set("USD".into()),
        min_investment_cents: Set(10_000_000),
        target_size_cents: Set(None),
        fee_schedule: Set(FeeSchedule { management_fee_bps: 200, performance_fee_bps: 2000, ..Default::default() }),
        media_urls: Set(MediaUrls::default()),
        status: Set(ProductStatus::Open),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

/// tenant -> users -> product -> commitment, then update and cascade
#[tokio::test]
async fn test_investment_workflow() -> Result<()> {
    let Some(db) = setup_test_db().await? else { return Ok(()) };

    let t = tenant::create(&db, &format!("crud_tenant_{}", Uuid::new_v4())).await?;
    let admin = user::create(&db, t.id, "admin@crud.io", "Admin", Role::Admin).await?;
    let client = user::create(&db, t.id, "Client@Crud.io", "Client", Role::Client).await?;
    assert_eq!(client.email, "client@crud.io");

    let p = product_row(t.id, "PE202401001").insert(&db).await?;
    assert_eq!(p.fee_schedule.performance_fee_bps, 2000);

    let now = Utc::now().into();
    let c = commitment::ActiveModel {
        id: Set(Uuid::new_v4()),
        tenant_id: Set(t.id),
        product_id: Set(p.id),
        client_id: Set(client.id),
        amount_cents: Set(25_000_000),
        currency: Set("USD".into()),
        status: Set(CommitmentStatus::Pending),
        note: Set(None),
        created_by: Set(admin.id),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&db)
    .await?;

    let mut am = c.clone().into_active_model();
    am.status = Set(CommitmentStatus::Accepted);
    let updated = am.update(&db).await?;
    assert_eq!(updated.status, CommitmentStatus::Accepted);

    let for_product = commitment::Entity::find()
        .filter(commitment::Column::ProductId.eq(p.id))
        .all(&db)
        .await?;
    assert_eq!(for_product.len(), 1);
    assert_eq!(for_product[0].amount_cents, 25_000_000);

    // commitments reference the product with RESTRICT
    assert!(product::Entity::delete_by_id(p.id).exec(&db).await.is_err());

    commitment::Entity::delete_by_id(c.id).exec(&db).await?;
    tenant::Entity::delete_by_id(t.id).exec(&db).await?;
    assert!(user::Entity::find_by_id(client.id).one(&db).await?.is_none());
    assert!(product::Entity::find_by_id(p.id).one(&db).await?.is_none());
    Ok(())
}

/// Product codes are unique per tenant only
#[tokio::test]
async fn test_product_code_unique_per_tenant() -> Result<()> {
    let Some(db) = setup_test_db().await? else { return Ok(()) };

    let a = tenant::create(&db, &format!("code_a_{}", Uuid::new_v4())).await?;
    let b = tenant::create(&db, &format!("code_b_{}", Uuid::new_v4())).await?;

    product_row(a.id, "VC202405001").insert(&db).await?;
    let dup = product_row(a.id, "VC202405001").insert(&db).await;
    assert!(dup.is_err());
    product_row(b.id, "VC202405001").insert(&db).await?;

    tenant::Entity::delete_by_id(a.id).exec(&db).await?;
    tenant::Entity::delete_by_id(b.id).exec(&db).await?;
    Ok(())
}

/// Email is unique within a tenant
#[tokio::test]
async fn test_user_email_unique_per_tenant() -> Result<()> {
    let Some(db) = setup_test_db().await? else { return Ok(()) };

    let t = tenant::create(&db, &format!("email_{}", Uuid::new_v4())).await?;
    user::create(&db, t.id, "dup@crud.io", "First", Role::Client).await?;
    assert!(user::create(&db, t.id, "dup@crud.io", "Second", Role::Client).await.is_err());
    assert!(user::create(&db, t.id, "not-an-email", "Bad", Role::Client).await.is_err());

    tenant::Entity::delete_by_id(t.id).exec(&db).await?;
    Ok(())
}
