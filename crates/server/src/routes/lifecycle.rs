//! Subscriptions, capital calls and receipts.

use axum::{extract::{Path, Query, State}, http::StatusCode, Extension, Json};
use uuid::Uuid;

use common::types::Page;
use models::{capital_call, receipt, subscription};
use service::auth::domain::Principal;
use service::pagination::Pagination;
use service::repository::{CapitalCallFilter, ReceiptFilter, SubscriptionFilter};
use service::services::capital_call::IssueCapitalCallInput;
use service::services::receipt::{GenerateReceiptInput, UploadReceiptInput};
use service::services::subscription::{CreateSubscriptionInput, SignInput};

use crate::errors::JsonApiError;
use crate::state::AppState;

#[utoipa::path(post, path = "/subscriptions", tag = "subscriptions", request_body = crate::openapi::SubscriptionRequest,
    responses((status = 201, description = "Awaiting signature"), (status = 409, description = "Commitment not accepted or already subscribed")))]
pub async fn create_subscription(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(input): Json<CreateSubscriptionInput>,
) -> Result<(StatusCode, Json<subscription::Model>), JsonApiError> {
    let s = state.services.subscriptions.create_from_commitment(&principal, input).await?;
    Ok((StatusCode::CREATED, Json(s)))
}

pub async fn list_subscriptions(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(filter): Query<SubscriptionFilter>,
    Query(page): Query<Pagination>,
) -> Result<Json<Page<subscription::Model>>, JsonApiError> {
    Ok(Json(state.services.subscriptions.list(&principal, filter, page).await?))
}

pub async fn get_subscription(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Json<subscription::Model>, JsonApiError> {
    Ok(Json(state.services.subscriptions.get(&principal, id).await?))
}

#[utoipa::path(post, path = "/subscriptions/{id}/sign", tag = "subscriptions", request_body = crate::openapi::SignRequest,
    params(("id" = Uuid, Path,)),
    responses((status = 200, description = "Signed; agreement stored"), (status = 400, description = "Bad signature")))]
pub async fn sign_subscription(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(input): Json<SignInput>,
) -> Result<Json<subscription::Model>, JsonApiError> {
    Ok(Json(state.services.subscriptions.sign(&principal, id, input).await?))
}

pub async fn cancel_subscription(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Json<subscription::Model>, JsonApiError> {
    Ok(Json(state.services.subscriptions.cancel(&principal, id).await?))
}

#[utoipa::path(post, path = "/capital-calls", tag = "capital_calls", request_body = crate::openapi::CapitalCallRequest,
    responses((status = 201, description = "Issued"), (status = 400, description = "Exceeds subscription amount")))]
pub async fn issue_capital_call(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(input): Json<IssueCapitalCallInput>,
) -> Result<(StatusCode, Json<capital_call::Model>), JsonApiError> {
    let c = state.services.capital_calls.issue(&principal, input).await?;
    Ok((StatusCode::CREATED, Json(c)))
}

pub async fn list_capital_calls(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(filter): Query<CapitalCallFilter>,
    Query(page): Query<Pagination>,
) -> Result<Json<Page<capital_call::Model>>, JsonApiError> {
    Ok(Json(state.services.capital_calls.list(&principal, filter, page).await?))
}

pub async fn get_capital_call(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Json<capital_call::Model>, JsonApiError> {
    Ok(Json(state.services.capital_calls.get(&principal, id).await?))
}

pub async fn cancel_capital_call(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Json<capital_call::Model>, JsonApiError> {
    Ok(Json(state.services.capital_calls.cancel(&principal, id).await?))
}

pub async fn generate_receipt(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(input): Json<GenerateReceiptInput>,
) -> Result<(StatusCode, Json<receipt::Model>), JsonApiError> {
    let r = state.services.receipts.generate_from_capital_call(&principal, id, input).await?;
    Ok((StatusCode::CREATED, Json(r)))
}

pub async fn upload_receipt(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(input): Json<UploadReceiptInput>,
) -> Result<(StatusCode, Json<receipt::Model>), JsonApiError> {
    let r = state.services.receipts.upload(&principal, input).await?;
    Ok((StatusCode::CREATED, Json(r)))
}

pub async fn list_receipts(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(filter): Query<ReceiptFilter>,
    Query(page): Query<Pagination>,
) -> Result<Json<Page<receipt::Model>>, JsonApiError> {
    Ok(Json(state.services.receipts.list(&principal, filter, page).await?))
}

pub async fn get_receipt(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Json<receipt::Model>, JsonApiError> {
    Ok(Json(state.services.receipts.get(&principal, id).await?))
}
