//! Authentication module providing user registration, login, and session management.
//!
//! This module implements:
//! - Argon2id password hashing with per-hash random salt
//! - HS256 JWT session tokens carrying `{user id, email}` (24-hour expiry by default)
//! - Random avatar assignment from a fixed catalog
//! - Stateless logout: the transport layer clears the cookie, nothing is revoked
//!
//! ## Example
//!
//! ```no_run
//! use session_auth::auth::{AuthConfig, AuthManager, RegisterRequest};
//! use session_auth::db::Database;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&Default::default()).await?;
//!     let auth = AuthManager::new(
//!         Arc::new(db.user_repository()),
//!         AuthConfig::new("jwt_secret_at_least_32_characters_long"),
//!     )?;
//!
//!     let request = RegisterRequest {
//!         username: "player1".to_string(),
//!         email: "player@example.com".to_string(),
//!         password: "SecurePass123".to_string(),
//!     };
//!
//!     let user = auth.register(request).await?;
//!     println!("Registered user: {}", user.username);
//!     Ok(())
//! }
//! ```

pub mod avatar;
pub mod errors;
pub mod hasher;
pub mod manager;
pub mod models;
pub mod tokens;

pub use avatar::{AvatarCatalog, AvatarPicker, DEFAULT_AVATAR_URLS, RandomPicker, SeededPicker};
pub use errors::{AuthError, AuthResult};
pub use hasher::{CredentialHasher, HashCost, HashError};
pub use manager::{AuthConfig, AuthManager, DEFAULT_TOKEN_TTL_SECS};
pub use models::{
    LoginRequest, NewUser, RegisterRequest, SESSION_COOKIE_NAME, SESSION_COOKIE_PATH,
    SESSION_COOKIE_TTL_SECS, SessionArtifact, SessionClaims, SessionToken, User, UserId,
    UserRecord, VerifiedIdentity,
};
pub use tokens::{MAX_TOKEN_TTL_SECS, MIN_SECRET_LEN, TokenIssuer};
