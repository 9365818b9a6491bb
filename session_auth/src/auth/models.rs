//! Authentication data models.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User ID type
pub type UserId = Uuid;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE_NAME: &str = "token";

/// Path the session cookie is scoped to
pub const SESSION_COOKIE_PATH: &str = "/";

/// Lifetime of the session cookie in seconds, counted from token issuance
pub const SESSION_COOKIE_TTL_SECS: i64 = 24 * 60 * 60;

/// Stored account record, including the password hash
#[derive(Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub picture_url: String,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .field("picture_url", &self.picture_url)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Account data handed to the store on creation
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub picture_url: String,
}

/// Public user profile. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub picture_url: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            email: record.email,
            username: record.username,
            picture_url: record.picture_url,
            created_at: record.created_at,
        }
    }
}

/// User registration request
#[derive(Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// User login request
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// JWT claims for a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: UserId,           // User ID
    pub email: String,
    pub iat: i64,              // Issued at timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,      // Expiration timestamp, absent when expiry is disabled
}

impl SessionClaims {
    /// Identity carried by verified claims
    pub fn identity(&self) -> VerifiedIdentity {
        VerifiedIdentity {
            user_id: self.sub,
            email: self.email.clone(),
        }
    }
}

/// Identity carried by a session token.
///
/// [`super::AuthManager::verify_token`] returns one only after the signature
/// and expiry check. The type itself is plain data and proves nothing, so
/// callers must take it from verification, never from request input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub user_id: UserId,
    pub email: String,
}

/// Signed session token returned by a successful login
#[derive(Debug, Clone)]
pub struct SessionToken {
    pub value: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl SessionToken {
    /// Cookie instruction for transmitting this token to the client
    pub fn artifact(&self) -> SessionArtifact {
        SessionArtifact::Set {
            value: self.value.clone(),
            expires_at: self.issued_at + Duration::seconds(SESSION_COOKIE_TTL_SECS),
        }
    }
}

/// What the transport layer must do with the client-side session cookie.
///
/// The cookie is always named [`SESSION_COOKIE_NAME`], scoped to
/// [`SESSION_COOKIE_PATH`], `HttpOnly` and `SameSite=Lax`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionArtifact {
    /// Store the token, expiring at the given instant
    Set {
        value: String,
        expires_at: DateTime<Utc>,
    },
    /// Discard the cookie
    Clear,
}
