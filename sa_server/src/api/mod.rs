//! HTTP API for the auth server.
//!
//! # Modules
//!
//! - [`auth`]: Signup, login, logout and current-user handlers
//! - [`middleware`]: Session token verification for protected endpoints
//! - [`request_id`]: Request correlation IDs and request logging
//!
//! # Endpoints Overview
//!
//! ## Authentication (No Auth Required)
//! - `POST /api/v1/auth/signup` - Register new user
//! - `POST /api/v1/auth/login` - Login, sets the `token` cookie
//! - `POST /api/v1/auth/logout` - Clear the `token` cookie
//!
//! ## Authenticated
//! - `GET /api/v1/auth/me` - Current user's profile
//!
//! ## Health Check
//! - `GET /health` - Server and account store health
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use sa_server::api::{create_router, AppState};
//! use session_auth::auth::{AuthConfig, AuthManager};
//! use session_auth::db::MemoryUserRepository;
//! use std::sync::Arc;
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!
//! let auth_manager = AuthManager::new(
//!     Arc::new(MemoryUserRepository::new()),
//!     AuthConfig::new("jwt_secret_at_least_32_characters_long"),
//! )?;
//! let state = AppState {
//!     auth_manager: Arc::new(auth_manager),
//! };
//!
//! let app = create_router(state);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod middleware;
pub mod request_id;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use serde_json::json;
use session_auth::AuthManager;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers.
///
/// Cloned per request; the manager sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub auth_manager: Arc<AuthManager>,
}

/// Create the complete API router with all endpoints and middleware.
///
/// ```text
/// GET  /health                         - Health check (public)
/// POST /api/v1/auth/signup             - Register user (public)
/// POST /api/v1/auth/login              - Login (public)
/// POST /api/v1/auth/logout             - Logout (public)
/// GET  /api/v1/auth/me                 - Current user (auth required)
/// ```
///
/// ## Legacy Routes (Deprecated)
/// ```text
/// POST /api/auth/signup                - Use /api/v1/auth/signup
/// POST /api/auth/login                 - Use /api/v1/auth/login
/// POST /api/auth/logout                - Use /api/v1/auth/logout
/// GET  /api/auth/me                    - Use /api/v1/auth/me
/// ```
pub fn create_router(state: AppState) -> Router {
    let v1_routes = create_v1_router(state.clone());
    // Legacy routes (deprecated), same handlers without the version prefix
    let legacy_routes = create_v1_router(state.clone());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", v1_routes)
        .nest("/api", legacy_routes)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Create API v1 router with all versioned endpoints.
fn create_v1_router(state: AppState) -> Router<AppState> {
    // Public routes (no authentication middleware)
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout));

    // Protected routes (require authentication middleware)
    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me))
        .layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth_middleware,
        ));

    Router::new().merge(public_routes).merge(protected_routes)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the account store answers, `503 Service Unavailable`
/// otherwise.
///
/// ```bash
/// curl http://localhost:8080/health
/// # {"status":"healthy","store":true,"version":"0.1.0","timestamp":"2026-10-19T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let store_healthy = match state.auth_manager.health_check().await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            false
        }
    };

    let status_code = if store_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if store_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "store": store_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
