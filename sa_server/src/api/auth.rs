//! Authentication API handlers.
//!
//! This module provides HTTP REST endpoints for:
//! - Signup with username, email and password
//! - Login, which sets the `token` session cookie
//! - Logout, which clears it
//! - Fetching the current user's profile
//!
//! # Examples
//!
//! Sign up:
//! ```bash
//! curl -X POST http://localhost:8080/api/v1/auth/signup \
//!   -H "Content-Type: application/json" \
//!   -d '{"username": "alice", "email": "a@x.com", "password": "pw1"}'
//! ```
//!
//! Login:
//! ```bash
//! curl -X POST http://localhost:8080/api/v1/auth/login -c cookies.txt \
//!   -H "Content-Type: application/json" \
//!   -d '{"email": "a@x.com", "password": "pw1"}'
//! ```

use axum::{
    Json,
    extract::{Extension, State},
    http::StatusCode,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use session_auth::auth::{
    AuthError, LoginRequest, RegisterRequest, SESSION_COOKIE_NAME, SESSION_COOKIE_PATH,
    SessionArtifact, User, VerifiedIdentity,
};
use time::OffsetDateTime;

use super::{AppState, request_id::RequestId};
use crate::{logging, metrics};

#[derive(Debug, Deserialize)]
pub struct SignupPayload {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub user: User,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map a service error to a response; infrastructure failures are logged
/// and their details withheld from the client.
fn reject(err: AuthError, request_id: &RequestId) -> ApiError {
    let status = match &err {
        AuthError::DuplicateAccount
        | AuthError::AccountNotFound
        | AuthError::InvalidCredentials => StatusCode::BAD_REQUEST,
        AuthError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
        _ => {
            tracing::error!(
                request_id = %request_id.as_str(),
                error = %err,
                "Auth operation failed"
            );
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (
        status,
        Json(ErrorResponse {
            error: err.client_message(),
        }),
    )
}

/// Apply a session artifact to the cookie jar.
///
/// Set cookies are `HttpOnly`, `SameSite=Lax`, scoped to `/`, and expire
/// when the artifact says.
fn apply_artifact(jar: CookieJar, artifact: SessionArtifact) -> CookieJar {
    match artifact {
        SessionArtifact::Set { value, expires_at } => {
            let mut cookie = Cookie::build((SESSION_COOKIE_NAME, value))
                .path(SESSION_COOKIE_PATH)
                .http_only(true)
                .same_site(SameSite::Lax);
            if let Ok(expires) = OffsetDateTime::from_unix_timestamp(expires_at.timestamp()) {
                cookie = cookie.expires(expires);
            }
            jar.add(cookie)
        }
        // Always emitted, whether or not the request carried the cookie
        SessionArtifact::Clear => jar.add(
            Cookie::build((SESSION_COOKIE_NAME, ""))
                .path(SESSION_COOKIE_PATH)
                .http_only(true)
                .same_site(SameSite::Lax)
                .max_age(time::Duration::ZERO)
                .expires(OffsetDateTime::UNIX_EPOCH),
        ),
    }
}

/// Register a new account.
///
/// # Request Body
///
/// ```json
/// { "username": "alice", "email": "a@x.com", "password": "pw1" }
/// ```
///
/// # Response
///
/// `201 Created` with `{ "user": { ... } }`. The password hash is never returned.
///
/// # Errors
///
/// - `400 Bad Request`: Email already registered
/// - `500 Internal Server Error`: Store or hashing failure
pub async fn signup(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(payload): Json<SignupPayload>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let request = RegisterRequest {
        username: payload.username,
        email: payload.email,
        password: payload.password,
    };

    match state.auth_manager.register(request).await {
        Ok(user) => {
            metrics::registrations_total("created");
            Ok((StatusCode::CREATED, Json(UserResponse { user })))
        }
        Err(e) => {
            metrics::registrations_total(if e.is_user_facing() { "rejected" } else { "failed" });
            Err(reject(e, &request_id))
        }
    }
}

/// Authenticate and start a session.
///
/// # Request Body
///
/// ```json
/// { "email": "a@x.com", "password": "pw1" }
/// ```
///
/// # Response
///
/// `200 OK` with `{ "user": { ... }, "token": "eyJ..." }` and a
/// `Set-Cookie: token=...; HttpOnly; SameSite=Lax; Path=/; Expires=<+24h>` header.
///
/// # Errors
///
/// - `400 Bad Request`: Unknown email or incorrect password
/// - `500 Internal Server Error`: Store, hashing or signing failure
pub async fn login(
    State(state): State<AppState>,
    request_id: RequestId,
    jar: CookieJar,
    Json(payload): Json<LoginPayload>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let email = payload.email.clone();
    let request = LoginRequest {
        email: payload.email,
        password: payload.password,
    };

    match state.auth_manager.authenticate(request).await {
        Ok((user, token)) => {
            metrics::login_attempts_total(true);
            let jar = apply_artifact(jar, token.artifact());
            Ok((
                jar,
                Json(LoginResponse {
                    user,
                    token: token.value,
                }),
            ))
        }
        Err(e) => {
            metrics::login_attempts_total(false);
            if e.is_user_facing() {
                logging::log_security_event("failed_login", None, Some(&email), &e.to_string());
            }
            Err(reject(e, &request_id))
        }
    }
}

/// End the session by clearing the `token` cookie.
///
/// Tokens are not revoked server-side; a copy of the token stays valid until
/// it expires.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    let jar = apply_artifact(jar, state.auth_manager.invalidate());
    (
        jar,
        Json(MessageResponse {
            message: "Logged out".to_string(),
        }),
    )
}

/// Current user's profile. Requires [`super::middleware::auth_middleware`].
///
/// # Errors
///
/// - `401 Unauthorized`: Missing or invalid token (from the middleware)
/// - `404 Not Found`: Account deleted since the token was issued
pub async fn me(
    State(state): State<AppState>,
    request_id: RequestId,
    Extension(identity): Extension<VerifiedIdentity>,
) -> Result<Json<UserResponse>, ApiError> {
    match state.auth_manager.current_user(&identity).await {
        Ok(user) => Ok(Json(UserResponse { user })),
        Err(AuthError::AccountNotFound) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: AuthError::AccountNotFound.client_message(),
            }),
        )),
        Err(e) => Err(reject(e, &request_id)),
    }
}
