use axum::{extract::{Path, Query, State}, http::StatusCode, Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use common::types::Page;
use models::commitment;
use service::auth::domain::Principal;
use service::pagination::Pagination;
use service::repository::CommitmentFilter;
use service::services::commitment::{CommitmentSummary, CreateCommitmentInput};

use crate::errors::JsonApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    pub product_id: Option<Uuid>,
}

#[utoipa::path(post, path = "/commitments", tag = "commitments", request_body = crate::openapi::CommitmentRequest,
    responses((status = 201, description = "Created"), (status = 400, description = "Below minimum or product not open")))]
pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(input): Json<CreateCommitmentInput>,
) -> Result<(StatusCode, Json<commitment::Model>), JsonApiError> {
    let c = state.services.commitments.create(&principal, input).await?;
    Ok((StatusCode::CREATED, Json(c)))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(filter): Query<CommitmentFilter>,
    Query(page): Query<Pagination>,
) -> Result<Json<Page<commitment::Model>>, JsonApiError> {
    Ok(Json(state.services.commitments.list(&principal, filter, page).await?))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Json<commitment::Model>, JsonApiError> {
    Ok(Json(state.services.commitments.get(&principal, id).await?))
}

pub async fn accept(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Json<commitment::Model>, JsonApiError> {
    Ok(Json(state.services.commitments.accept(&principal, id).await?))
}

pub async fn reject(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Json<commitment::Model>, JsonApiError> {
    Ok(Json(state.services.commitments.reject(&principal, id).await?))
}

pub async fn withdraw(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Json<commitment::Model>, JsonApiError> {
    Ok(Json(state.services.commitments.withdraw(&principal, id).await?))
}

#[utoipa::path(get, path = "/commitments/summary", tag = "commitments",
    params(("product_id" = Option<Uuid>, Query,)),
    responses((status = 200, description = "Totals per product/status and per month")))]
pub async fn summary(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(q): Query<SummaryQuery>,
) -> Result<Json<CommitmentSummary>, JsonApiError> {
    Ok(Json(state.services.commitments.summary(&principal, q.product_id).await?))
}
