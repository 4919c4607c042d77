use axum::{extract::{Path, Query, State}, http::StatusCode, Extension, Json};
use uuid::Uuid;

use models::manual_asset;
use service::auth::domain::Principal;
use service::portfolio::{AssetInput, PortfolioView, UpdateAssetInput};

use crate::errors::JsonApiError;
use crate::routes::documents::ClientQuery;
use crate::state::AppState;

/// Consolidated holdings: external provider merged with manual assets.
#[utoipa::path(get, path = "/portfolio/{client_id}", tag = "portfolio", params(("client_id" = Uuid, Path,)),
    responses((status = 200, description = "Aggregated view"), (status = 403, description = "Another client's portfolio")))]
pub async fn view(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(client_id): Path<Uuid>,
) -> Result<Json<PortfolioView>, JsonApiError> {
    Ok(Json(state.services.portfolio.view(&principal, client_id).await?))
}

pub async fn create_asset(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(input): Json<AssetInput>,
) -> Result<(StatusCode, Json<manual_asset::Model>), JsonApiError> {
    let a = state.services.portfolio.create_asset(&principal, input).await?;
    Ok((StatusCode::CREATED, Json(a)))
}

pub async fn list_assets(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(q): Query<ClientQuery>,
) -> Result<Json<Vec<manual_asset::Model>>, JsonApiError> {
    Ok(Json(state.services.portfolio.list_assets(&principal, q.client_id).await?))
}

pub async fn update_asset(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateAssetInput>,
) -> Result<Json<manual_asset::Model>, JsonApiError> {
    Ok(Json(state.services.portfolio.update_asset(&principal, id, input).await?))
}

pub async fn delete_asset(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, JsonApiError> {
    state.services.portfolio.delete_asset(&principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
