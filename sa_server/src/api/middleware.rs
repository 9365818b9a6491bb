//! Authentication middleware for protected endpoints.
//!
//! Reads the session token from the `token` cookie (or an
//! `Authorization: Bearer` header), verifies it, and inserts the resulting
//! [`VerifiedIdentity`] into request extensions. Handlers never see an
//! unverified identity.
//!
//! ```rust,no_run
//! use axum::extract::Extension;
//! use session_auth::auth::VerifiedIdentity;
//!
//! async fn protected_handler(Extension(identity): Extension<VerifiedIdentity>) -> String {
//!     format!("Authenticated as {}", identity.email)
//! }
//! # let _ = protected_handler;
//! ```

use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use session_auth::auth::SESSION_COOKIE_NAME;

use super::{AppState, auth::ErrorResponse};
use crate::{logging, metrics};

/// Session token sent by the client, cookie first
fn extract_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE_NAME) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: "Not authenticated".to_string(),
        }),
    )
        .into_response()
}

/// Authentication middleware that validates session tokens and injects the identity.
///
/// # Behavior
///
/// - **Success**: Token valid → Injects `VerifiedIdentity` into request extensions → Calls next handler
/// - **Missing token**: Returns `401 Unauthorized`
/// - **Invalid/expired token**: Returns `401 Unauthorized`
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_token(request.headers()) else {
        return unauthorized();
    };

    match state.auth_manager.verify_token(&token) {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(e) => {
            metrics::invalid_tokens_total();
            logging::log_security_event("invalid_token", None, None, &e.to_string());
            unauthorized()
        }
    }
}
