//! Authentication error types.

use thiserror::Error;

use crate::db::StoreError;

use super::hasher::HashError;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// An account with this email already exists
    #[error("User already exists")]
    DuplicateAccount,

    /// No account matches the email or id
    #[error("No registered user found")]
    AccountNotFound,

    /// Password did not match the stored hash
    #[error("Incorrect password")]
    InvalidCredentials,

    /// Session token failed signature, format or expiry checks
    #[error("Invalid session token")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),

    /// Session token could not be signed
    #[error("Token signing failed: {0}")]
    TokenSigning(#[source] jsonwebtoken::errors::Error),

    /// Password hashing failed
    #[error("Password hashing failed: {0}")]
    Hashing(#[from] HashError),

    /// Account store failure
    #[error("Account store error: {0}")]
    Store(#[from] StoreError),

    /// Service misconfiguration detected at construction
    #[error("Invalid auth configuration: {0}")]
    Config(String),
}

impl AuthError {
    /// Whether the error is an expected outcome of user input rather than
    /// an infrastructure failure.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            AuthError::DuplicateAccount
                | AuthError::AccountNotFound
                | AuthError::InvalidCredentials
                | AuthError::InvalidToken(_)
        )
    }

    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Store, hashing and signing errors collapse into a generic message so
    /// internal details never reach the client.
    pub fn client_message(&self) -> String {
        match self {
            AuthError::InvalidToken(_) => "Not authenticated".to_string(),
            AuthError::TokenSigning(_)
            | AuthError::Hashing(_)
            | AuthError::Store(_)
            | AuthError::Config(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;
