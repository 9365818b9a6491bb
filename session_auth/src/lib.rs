//! # Session Auth
//!
//! Account registration, credential verification and stateless session
//! tokens for a web application.
//!
//! ## Architecture
//!
//! The crate is split leaf-first:
//!
//! - **Credential hasher**: Argon2id password hashing with embedded salt
//! - **Token issuer**: HS256-signed session tokens carrying `{user id, email}`
//! - **Account store**: [`db::UserRepository`] with PostgreSQL and in-memory backends
//! - **Session service**: [`auth::AuthManager`] orchestrating register, login,
//!   logout and current-user lookups
//!
//! HTTP routing, cookies and request parsing live in the server crate; this
//! library only hands back a [`auth::SessionArtifact`] describing what the
//! transport layer must do with the client-side cookie.
//!
//! ## Example
//!
//! ```no_run
//! use session_auth::auth::{AuthConfig, AuthManager, LoginRequest, RegisterRequest};
//! use session_auth::db::MemoryUserRepository;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryUserRepository::new());
//!     let auth = AuthManager::new(store, AuthConfig::new("a-32-character-or-longer-secret!!"))?;
//!
//!     auth.register(RegisterRequest {
//!         username: "alice".to_string(),
//!         email: "a@x.com".to_string(),
//!         password: "pw1".to_string(),
//!     })
//!     .await?;
//!
//!     let (user, token) = auth
//!         .authenticate(LoginRequest {
//!             email: "a@x.com".to_string(),
//!             password: "pw1".to_string(),
//!         })
//!         .await?;
//!     println!("{} logged in with {}", user.username, token.value);
//!     Ok(())
//! }
//! ```

/// Credential hashing, session tokens and the session service.
pub mod auth;

/// Account store contract and its backends.
pub mod db;

pub use auth::{AuthError, AuthManager, AuthResult, User, UserId};
