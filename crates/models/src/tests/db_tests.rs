use crate::db::{connect_with_config, DatabaseConfig, DATABASE_URL};
use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};
use std::time::{Duration, Instant};
use anyhow::Result;

use super::setup_test_db;

/// Test basic database connection
#[tokio::test]
async fn test_basic_connection() -> Result<()> {
    let start = Instant::now();
    let Some(db) = setup_test_db().await? else { return Ok(()) };
    let elapsed = start.elapsed();

    let stmt = Statement::from_string(DatabaseBackend::Postgres, "SELECT 1 as test".to_string());
    let row = db.query_one(stmt).await?.expect("one row");
    let test_value: i32 = row.try_get("", "test")?;
    assert_eq!(test_value, 1);
    assert!(elapsed < Duration::from_secs(30), "connect + migrate took {:?}", elapsed);
    Ok(())
}

/// Test connection with explicit pool settings
#[tokio::test]
async fn test_custom_config_connection() -> Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(());
    }

    let config = DatabaseConfig {
        url: DATABASE_URL.clone(),
        max_connections: 5,
        min_connections: 1,
        connect_timeout_secs: 10,
        idle_timeout_secs: 60,
        max_lifetime_secs: 300,
        acquire_timeout_secs: 10,
        sqlx_logging: false,
    };
    let db = connect_with_config(&config).await?;

    let stmt = Statement::from_string(DatabaseBackend::Postgres, "SELECT current_database()".to_string());
    assert!(db.query_one(stmt).await?.is_some());
    Ok(())
}

/// Every table the services use exists after migrating
#[tokio::test]
async fn test_schema_tables_present() -> Result<()> {
    let Some(db) = setup_test_db().await? else { return Ok(()) };

    for table in [
        "tenant", "user", "user_credentials", "product", "commitment", "subscription",
        "capital_call", "receipt", "statement", "kyc_document", "newsletter", "manual_asset",
    ] {
        let sql = format!("SELECT to_regclass('public.\"{table}\"')::text AS name");
        let row = db
            .query_one(Statement::from_string(DatabaseBackend::Postgres, sql))
            .await?
            .expect("one row");
        let name: Option<String> = row.try_get("", "name")?;
        assert!(name.is_some(), "missing table {table}");
    }
    Ok(())
}
