//! Session token issuing and verification.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use super::{
    errors::{AuthError, AuthResult},
    models::{SessionClaims, SessionToken, UserId},
};

/// Minimum accepted length of the signing secret
pub const MIN_SECRET_LEN: usize = 32;

/// Longest accepted token lifetime in seconds (10 years)
pub const MAX_TOKEN_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Signs and verifies HS256 session tokens
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Option<Duration>,
}

impl TokenIssuer {
    /// Create an issuer for the given secret
    ///
    /// # Arguments
    ///
    /// * `secret` - Process-wide signing secret
    /// * `ttl` - Token validity, `None` issues tokens without an `exp` claim
    ///
    /// # Errors
    ///
    /// * `AuthError::Config` - Secret shorter than [`MIN_SECRET_LEN`], or
    ///   `ttl` not in `1..=MAX_TOKEN_TTL_SECS` seconds
    pub fn new(secret: &str, ttl: Option<Duration>) -> AuthResult<Self> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(AuthError::Config(format!(
                "signing secret must be at least {MIN_SECRET_LEN} characters"
            )));
        }

        if let Some(ttl) = ttl {
            if ttl <= Duration::zero() || ttl.num_seconds() > MAX_TOKEN_TTL_SECS {
                return Err(AuthError::Config(format!(
                    "token lifetime must be between 1 and {MAX_TOKEN_TTL_SECS} seconds"
                )));
            }
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        })
    }

    /// Configured token lifetime
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Issue a token carrying `{user_id, email}`
    pub fn issue(&self, user_id: UserId, email: &str) -> AuthResult<SessionToken> {
        self.issue_at(user_id, email, Utc::now())
    }

    fn issue_at(
        &self,
        user_id: UserId,
        email: &str,
        issued_at: DateTime<Utc>,
    ) -> AuthResult<SessionToken> {
        let expires_at = match self.ttl {
            Some(ttl) => Some(issued_at.checked_add_signed(ttl).ok_or_else(|| {
                AuthError::Config("token expiry out of range".to_string())
            })?),
            None => None,
        };
        let claims = SessionClaims {
            sub: user_id,
            email: email.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.map(|at| at.timestamp()),
        };

        let value = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(AuthError::TokenSigning)?;

        Ok(SessionToken {
            value,
            issued_at,
            expires_at,
        })
    }

    /// Verify a token and return its claims
    ///
    /// # Errors
    ///
    /// * `AuthError::InvalidToken` - Bad signature, malformed token, or expired
    pub fn verify(&self, token: &str) -> AuthResult<SessionClaims> {
        let token_data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation())
            .map_err(AuthError::InvalidToken)?;

        Ok(token_data.claims)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::default();
        if self.ttl.is_none() {
            // Tokens without `exp` are accepted; one that has it is still checked.
            validation.required_spec_claims.clear();
        }
        validation
    }
}
