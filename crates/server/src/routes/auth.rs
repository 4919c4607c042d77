use axum::{extract::{Query, State}, http::StatusCode, Extension, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use service::auth::domain::{AuthUser, BootstrapInput, LoginInput, Principal, RegisterInput, Role};

use crate::errors::JsonApiError;
use crate::middleware::AUTH_COOKIE;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct NewUserBody {
    pub email: String,
    pub name: String,
    pub password: String,
    #[serde(default = "client_role")]
    pub role: Role,
}

fn client_role() -> Role { Role::Client }

#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub role: Option<Role>,
}

#[derive(Serialize)]
pub struct LoginOutput {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub token: String,
}

#[utoipa::path(post, path = "/auth/bootstrap", tag = "auth", request_body = crate::openapi::BootstrapRequest,
    responses((status = 201, description = "Tenant and first admin created"), (status = 400, description = "Bad Request")))]
pub async fn bootstrap(
    State(state): State<AppState>,
    Json(input): Json<BootstrapInput>,
) -> Result<(StatusCode, Json<AuthUser>), JsonApiError> {
    let user = state.services.auth.bootstrap(input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(post, path = "/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest,
    responses((status = 200, description = "Logged in, auth_token cookie set"), (status = 401, description = "Unauthorized")))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(input): Json<LoginInput>,
) -> Result<(CookieJar, Json<LoginOutput>), JsonApiError> {
    let session = state.services.auth.login(input).await?;
    let token = session
        .token
        .ok_or_else(|| JsonApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "token generation failed"))?;
    let mut cookie = Cookie::new(AUTH_COOKIE, token.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(state.secure_cookies);
    cookie.set_same_site(SameSite::Lax);
    let user = session.user;
    let out = LoginOutput {
        user_id: user.id,
        tenant_id: user.tenant_id,
        email: user.email,
        name: user.name,
        role: user.role,
        token,
    };
    Ok((jar.add(cookie), Json(out)))
}

pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let mut cookie = Cookie::from(AUTH_COOKIE);
    cookie.set_path("/");
    (jar.remove(cookie), StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/auth/me", tag = "auth",
    responses((status = 200, description = "Current user"), (status = 401, description = "Unauthorized")))]
pub async fn me(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<AuthUser>, JsonApiError> {
    Ok(Json(state.services.auth.me(&principal).await?))
}

/// Admin-only; the new user joins the caller's tenant.
#[utoipa::path(post, path = "/auth/register", tag = "auth", request_body = crate::openapi::NewUserRequest,
    responses((status = 201, description = "Registered"), (status = 403, description = "Forbidden"), (status = 409, description = "Conflict")))]
pub async fn register(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(body): Json<NewUserBody>,
) -> Result<(StatusCode, Json<AuthUser>), JsonApiError> {
    if !principal.is_admin() {
        return Err(JsonApiError::new(StatusCode::FORBIDDEN, "forbidden", "admin role required"));
    }
    let input = RegisterInput {
        tenant_id: principal.tenant_id,
        email: body.email,
        name: body.name,
        password: body.password,
        role: body.role,
    };
    let user = state.services.auth.register(input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn create_user(
    state: State<AppState>,
    principal: Extension<Principal>,
    body: Json<NewUserBody>,
) -> Result<(StatusCode, Json<AuthUser>), JsonApiError> {
    register(state, principal, body).await
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(q): Query<UserQuery>,
) -> Result<Json<Vec<AuthUser>>, JsonApiError> {
    Ok(Json(state.services.auth.list_users(&principal, q.role).await?))
}
