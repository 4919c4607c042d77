use axum::{extract::{Path, Query, State}, http::StatusCode, Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use common::types::Page;
use models::product::{self, ProductStatus};
use service::auth::domain::Principal;
use service::pagination::Pagination;
use service::repository::ProductFilter;
use service::services::product::{CreateProductInput, UpdateProductInput};

use crate::errors::JsonApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: ProductStatus,
}

#[utoipa::path(post, path = "/products", tag = "products", request_body = crate::openapi::ProductRequest,
    responses((status = 201, description = "Created"), (status = 400, description = "Bad Request"), (status = 403, description = "Forbidden")))]
pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(input): Json<CreateProductInput>,
) -> Result<(StatusCode, Json<product::Model>), JsonApiError> {
    let p = state.services.products.create(&principal, input).await?;
    Ok((StatusCode::CREATED, Json(p)))
}

#[utoipa::path(get, path = "/products", tag = "products",
    params(("status" = Option<String>, Query, description = "draft | open | closed"),
           ("page" = Option<u32>, Query,), ("per_page" = Option<u32>, Query,)),
    responses((status = 200, description = "One page of products")))]
pub async fn list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(filter): Query<ProductFilter>,
    Query(page): Query<Pagination>,
) -> Result<Json<Page<product::Model>>, JsonApiError> {
    Ok(Json(state.services.products.list(&principal, filter, page).await?))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Json<product::Model>, JsonApiError> {
    Ok(Json(state.services.products.get(&principal, id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> Result<Json<product::Model>, JsonApiError> {
    Ok(Json(state.services.products.update(&principal, id, input).await?))
}

pub async fn set_status(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(body): Json<StatusBody>,
) -> Result<Json<product::Model>, JsonApiError> {
    Ok(Json(state.services.products.set_status(&principal, id, body.status).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, JsonApiError> {
    state.services.products.delete(&principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
