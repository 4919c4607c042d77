use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use configs::AppConfig;
use migration::{Migrator, MigratorTrait};
use service::auth::service::AuthConfig;
use service::notify::{HttpNotifier, LogNotifier, Notifier};
use service::portfolio::{HttpPortfolioProvider, PortfolioProvider};
use service::storage::LocalFileStore;
use service::{Backends, Services};

use crate::errors::StartupError;
use crate::routes;
use crate::state::AppState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("server address: {e}")))
}

fn build_notifier(cfg: &AppConfig) -> anyhow::Result<Arc<dyn Notifier>> {
    if cfg.notify.email_endpoint.is_none() && cfg.notify.push_endpoint.is_none() {
        warn!(event = "notifier_log_only", "no notification endpoints configured; notifications are logged only");
        return Ok(Arc::new(LogNotifier));
    }
    Ok(Arc::new(HttpNotifier::from_config(&cfg.notify)?))
}

fn build_provider(cfg: &AppConfig) -> anyhow::Result<Option<Arc<dyn PortfolioProvider>>> {
    match HttpPortfolioProvider::from_config(&cfg.portfolio)? {
        Some(p) => Ok(Some(Arc::new(p))),
        None => {
            info!(event = "portfolio_provider_disabled", "portfolio.base_url not set; showing manual assets only");
            Ok(None)
        }
    }
}

/// Wire database, storage, notifier and portfolio provider into the router.
pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let db = models::db::connect_with_config(&cfg.database).await?;
    Migrator::up(&db, None).await?;
    info!(event = "migrations_applied", "database schema up to date");

    common::env::ensure_storage_dir(&cfg.storage.root).await?;
    let files = Arc::new(LocalFileStore::new(cfg.storage.root.clone()).await?);

    let auth = AuthConfig {
        jwt_secret: Some(cfg.auth.jwt_secret.clone()),
        token_ttl_hours: cfg.auth.token_ttl_hours,
        ..AuthConfig::default()
    };
    let services = Services::new(Backends::database(db), auth, files, build_notifier(cfg)?, build_provider(cfg)?);
    Ok(routes::build_router(AppState::new(services), build_cors()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!(event = "shutdown_signal", "received Ctrl+C, draining connections");
}

/// Public entry: load config, build the app and serve until Ctrl+C.
pub async fn run() -> anyhow::Result<()> {
    let cfg = AppConfig::load_or_env()?;
    let app = build_app(&cfg).await?;

    let addr = bind_addr(&cfg)?;
    info!(%addr, "starting capital-m server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}
