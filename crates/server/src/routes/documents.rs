//! Statements, KYC documents and newsletters.

use axum::{extract::{Path, Query, State}, http::StatusCode, Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use models::{kyc_document, newsletter, statement};
use service::auth::domain::Principal;
use service::repository::KycFilter;
use service::services::kyc::{ReviewKycInput, SubmitKycInput};
use service::services::newsletter::{CreateNewsletterInput, UpdateNewsletterInput};
use service::services::statement::{CreateStatementInput, StatementYear};

use crate::errors::JsonApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ClientQuery {
    pub client_id: Option<Uuid>,
}

pub async fn create_statement(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(input): Json<CreateStatementInput>,
) -> Result<(StatusCode, Json<statement::Model>), JsonApiError> {
    let s = state.services.statements.create(&principal, input).await?;
    Ok((StatusCode::CREATED, Json(s)))
}

#[utoipa::path(get, path = "/statements", tag = "documents", params(("client_id" = Option<Uuid>, Query,)),
    responses((status = 200, description = "Newest period first")))]
pub async fn list_statements(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(q): Query<ClientQuery>,
) -> Result<Json<Vec<statement::Model>>, JsonApiError> {
    Ok(Json(state.services.statements.list(&principal, q.client_id).await?))
}

pub async fn statement_timeline(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(q): Query<ClientQuery>,
) -> Result<Json<Vec<StatementYear>>, JsonApiError> {
    Ok(Json(state.services.statements.timeline(&principal, q.client_id).await?))
}

pub async fn get_statement(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Json<statement::Model>, JsonApiError> {
    Ok(Json(state.services.statements.get(&principal, id).await?))
}

pub async fn delete_statement(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, JsonApiError> {
    state.services.statements.delete(&principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn submit_kyc(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(input): Json<SubmitKycInput>,
) -> Result<(StatusCode, Json<kyc_document::Model>), JsonApiError> {
    let k = state.services.kyc.submit(&principal, input).await?;
    Ok((StatusCode::CREATED, Json(k)))
}

pub async fn list_kyc(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(filter): Query<KycFilter>,
) -> Result<Json<Vec<kyc_document::Model>>, JsonApiError> {
    Ok(Json(state.services.kyc.list(&principal, filter).await?))
}

pub async fn get_kyc(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Json<kyc_document::Model>, JsonApiError> {
    Ok(Json(state.services.kyc.get(&principal, id).await?))
}

pub async fn review_kyc(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(input): Json<ReviewKycInput>,
) -> Result<Json<kyc_document::Model>, JsonApiError> {
    Ok(Json(state.services.kyc.review(&principal, id, input).await?))
}

pub async fn delete_kyc(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, JsonApiError> {
    state.services.kyc.delete(&principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_newsletter(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(input): Json<CreateNewsletterInput>,
) -> Result<(StatusCode, Json<newsletter::Model>), JsonApiError> {
    let n = state.services.newsletters.create(&principal, input).await?;
    Ok((StatusCode::CREATED, Json(n)))
}

pub async fn list_newsletters(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<newsletter::Model>>, JsonApiError> {
    Ok(Json(state.services.newsletters.list(&principal).await?))
}

pub async fn get_newsletter(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Json<newsletter::Model>, JsonApiError> {
    Ok(Json(state.services.newsletters.get(&principal, id).await?))
}

pub async fn update_newsletter(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateNewsletterInput>,
) -> Result<Json<newsletter::Model>, JsonApiError> {
    Ok(Json(state.services.newsletters.update(&principal, id, input).await?))
}

pub async fn publish_newsletter(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Json<newsletter::Model>, JsonApiError> {
    Ok(Json(state.services.newsletters.publish(&principal, id).await?))
}

pub async fn delete_newsletter(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, JsonApiError> {
    state.services.newsletters.delete(&principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
