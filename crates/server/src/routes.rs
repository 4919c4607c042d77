pub mod auth;
pub mod commitments;
pub mod documents;
pub mod files;
pub mod lifecycle;
pub mod portfolio;
pub mod products;
pub mod system;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use service::storage::MAX_FILE_BYTES;

use crate::middleware::require_bearer_token_state;
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Build the full application router: public system routes, then the
/// authenticated business API behind the bearer middleware.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let api = Router::new()
        .route("/auth/bootstrap", post(auth::bootstrap))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/register", post(auth::register))
        .route("/auth/me", get(auth::me))
        .route("/users", get(auth::list_users).post(auth::create_user))
        .route("/products", get(products::list).post(products::create))
        .route("/products/:id", get(products::get).patch(products::update).delete(products::delete))
        .route("/products/:id/status", post(products::set_status))
        .route("/commitments", get(commitments::list).post(commitments::create))
        .route("/commitments/summary", get(commitments::summary))
        .route("/commitments/:id", get(commitments::get))
        .route("/commitments/:id/accept", post(commitments::accept))
        .route("/commitments/:id/reject", post(commitments::reject))
        .route("/commitments/:id/withdraw", post(commitments::withdraw))
        .route("/subscriptions", get(lifecycle::list_subscriptions).post(lifecycle::create_subscription))
        .route("/subscriptions/:id", get(lifecycle::get_subscription))
        .route("/subscriptions/:id/sign", post(lifecycle::sign_subscription))
        .route("/subscriptions/:id/cancel", post(lifecycle::cancel_subscription))
        .route("/capital-calls", get(lifecycle::list_capital_calls).post(lifecycle::issue_capital_call))
        .route("/capital-calls/:id", get(lifecycle::get_capital_call))
        .route("/capital-calls/:id/cancel", post(lifecycle::cancel_capital_call))
        .route("/capital-calls/:id/receipt", post(lifecycle::generate_receipt))
        .route("/receipts", get(lifecycle::list_receipts).post(lifecycle::upload_receipt))
        .route("/receipts/:id", get(lifecycle::get_receipt))
        .route("/statements", get(documents::list_statements).post(documents::create_statement))
        .route("/statements/timeline", get(documents::statement_timeline))
        .route("/statements/:id", get(documents::get_statement).delete(documents::delete_statement))
        .route("/kyc", get(documents::list_kyc).post(documents::submit_kyc))
        .route("/kyc/:id", get(documents::get_kyc).delete(documents::delete_kyc))
        .route("/kyc/:id/review", post(documents::review_kyc))
        .route("/newsletters", get(documents::list_newsletters).post(documents::create_newsletter))
        .route(
            "/newsletters/:id",
            get(documents::get_newsletter).patch(documents::update_newsletter).delete(documents::delete_newsletter),
        )
        .route("/newsletters/:id/publish", post(documents::publish_newsletter))
        .route("/portfolio/:client_id", get(portfolio::view))
        .route("/assets", get(portfolio::list_assets).post(portfolio::create_asset))
        .route("/assets/:id", axum::routing::patch(portfolio::update_asset).delete(portfolio::delete_asset))
        .route("/files/*path", get(files::download).post(files::upload))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer_token_state));

    Router::new()
        .route("/health", get(system::health))
        .route("/metrics", get(system::metrics))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api)
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_FILE_BYTES))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
