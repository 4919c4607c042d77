/// Database connection and migration tests
pub mod db_tests;

/// CRUD operations on the investment entities
pub mod crud_tests;


use sea_orm::DatabaseConnection;

/// Connect and migrate; `None` when `SKIP_DB_TESTS` is set.
pub(crate) async fn setup_test_db() -> anyhow::Result<Option<DatabaseConnection>> {
    use migration::MigratorTrait;

    if std::env::var("SKIP_DB_TESTS").is_ok() {
        println!("Skipping database tests (SKIP_DB_TESTS is set)");
        return Ok(None);
    }
    let db = crate::db::connect().await?;
    migration::Migrator::up(&db, None).await?;
    Ok(Some(db))
}
