use axum::{
    extract::{Request, State},
    http::{header, Method, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::state::AppState;

pub const AUTH_COOKIE: &str = "auth_token";

fn is_public(method: &Method, path: &str) -> bool {
    *method == Method::OPTIONS
        || path == "/health"
        || path == "/metrics"
        || path == "/auth/login"
        || path == "/auth/bootstrap"
        || path.starts_with("/docs")
        || path.starts_with("/api-docs")
}

fn cookie_token(raw: &str) -> Option<String> {
    raw.split(';')
        .filter_map(|part| part.trim().strip_prefix("auth_token="))
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

/// Bearer header or `auth_token` cookie; missing -> 400, invalid or expired -> 401.
/// On success the caller's `Principal` goes into the request extensions.
pub async fn require_bearer_token_state(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let path = req.uri().path().to_string();
    if is_public(req.method(), &path) {
        return Ok(next.run(req).await);
    }

    let authz = req.headers().get(header::AUTHORIZATION).and_then(|v| v.to_str().ok());
    let token = match authz {
        Some(h) => match h.strip_prefix("Bearer ") {
            Some(t) if !t.trim().is_empty() => t.trim().to_string(),
            _ => {
                tracing::warn!(path = %path, "invalid Authorization format (expect Bearer)");
                return Err(StatusCode::UNAUTHORIZED);
            }
        },
        None => {
            let cookies = req.headers().get(header::COOKIE).and_then(|v| v.to_str().ok()).unwrap_or("");
            match cookie_token(cookies) {
                Some(t) => t,
                None => {
                    tracing::warn!(path = %path, "missing Authorization header and auth_token cookie");
                    return Err(StatusCode::BAD_REQUEST);
                }
            }
        }
    };

    match state.services.auth.verify_token(&token) {
        Ok(principal) => {
            req.extensions_mut().insert(principal);
            Ok(next.run(req).await)
        }
        Err(e) => {
            tracing::warn!(path = %path, err = %e, "token validation failed");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_paths() {
        assert!(is_public(&Method::GET, "/health"));
        assert!(is_public(&Method::POST, "/auth/login"));
        assert!(is_public(&Method::OPTIONS, "/products"));
        assert!(is_public(&Method::GET, "/docs/index.html"));
        assert!(!is_public(&Method::POST, "/auth/register"));
        assert!(!is_public(&Method::GET, "/products"));
    }

    #[test]
    fn reads_token_from_cookie_header() {
        assert_eq!(cookie_token("theme=dark; auth_token=abc.def"), Some("abc.def".into()));
        assert_eq!(cookie_token("auth_token="), None);
        assert_eq!(cookie_token(""), None);
    }
}
