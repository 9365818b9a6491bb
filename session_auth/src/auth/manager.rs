//! Session service: registration, login, logout and profile lookup.

use chrono::Duration;
use std::sync::Arc;

use super::{
    avatar::{AvatarCatalog, AvatarPicker, RandomPicker},
    errors::{AuthError, AuthResult},
    hasher::{CredentialHasher, HashCost, HashError},
    models::{
        LoginRequest, NewUser, RegisterRequest, SESSION_COOKIE_TTL_SECS, SessionArtifact,
        SessionToken, User, VerifiedIdentity,
    },
    tokens::TokenIssuer,
};
use crate::db::{
    StoreError, UserRepository,
    timeouts::{DEFAULT_QUERY_TIMEOUT, with_timeout},
};

/// Default token lifetime in seconds, equal to the session cookie lifetime
pub const DEFAULT_TOKEN_TTL_SECS: i64 = SESSION_COOKIE_TTL_SECS;

/// Session service configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// Token signing secret
    pub jwt_secret: String,
    /// Token lifetime; `None` issues tokens that never expire
    pub token_ttl: Option<Duration>,
    /// Argon2 cost
    pub hash_cost: HashCost,
    /// Avatars assigned on registration
    pub avatars: AvatarCatalog,
    /// Deadline for each account store call
    pub store_timeout: std::time::Duration,
}

impl AuthConfig {
    /// Configuration with defaults for everything but the secret
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            token_ttl: Some(Duration::seconds(DEFAULT_TOKEN_TTL_SECS)),
            hash_cost: HashCost::default(),
            avatars: AvatarCatalog::default(),
            store_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("hash_cost", &self.hash_cost)
            .field("avatars", &self.avatars)
            .field("store_timeout", &self.store_timeout)
            .finish()
    }
}

/// Authentication manager
///
/// Holds no per-session state; clone it or share it behind an `Arc` across
/// request handlers.
#[derive(Clone)]
pub struct AuthManager {
    store: Arc<dyn UserRepository>,
    hasher: Arc<CredentialHasher>,
    issuer: TokenIssuer,
    avatars: AvatarCatalog,
    picker: Arc<dyn AvatarPicker>,
    store_timeout: std::time::Duration,
}

impl AuthManager {
    /// Create a new authentication manager
    ///
    /// # Arguments
    ///
    /// * `store` - Account store
    /// * `config` - Secret, token lifetime, hash cost and avatar catalog
    ///
    /// # Errors
    ///
    /// * `AuthError::Config` - Secret too short or token lifetime out of range
    /// * `AuthError::Hashing` - Hash cost rejected
    pub fn new(store: Arc<dyn UserRepository>, config: AuthConfig) -> AuthResult<Self> {
        let issuer = TokenIssuer::new(&config.jwt_secret, config.token_ttl)?;
        let hasher = CredentialHasher::new(config.hash_cost)?;

        Ok(Self {
            store,
            hasher: Arc::new(hasher),
            issuer,
            avatars: config.avatars,
            picker: Arc::new(RandomPicker),
            store_timeout: config.store_timeout,
        })
    }

    /// Replace the avatar picker
    pub fn with_picker(mut self, picker: Arc<dyn AvatarPicker>) -> Self {
        self.picker = picker;
        self
    }

    /// Register a new user
    ///
    /// # Errors
    ///
    /// * `AuthError::DuplicateAccount` - Email already registered
    /// * `AuthError::Store` - Store unavailable or timed out
    /// * `AuthError::Hashing` - Password hashing failed
    pub async fn register(&self, request: RegisterRequest) -> AuthResult<User> {
        self.register_inner(request)
            .await
            .inspect_err(|e| log_failure("register", e))
    }

    async fn register_inner(&self, request: RegisterRequest) -> AuthResult<User> {
        let existing = with_timeout(self.store_timeout, self.store.find_by_email(&request.email))
            .await?;
        if existing.is_some() {
            return Err(AuthError::DuplicateAccount);
        }

        let password_hash = self.hash_password(request.password).await?;
        let picture_url = self.avatars.choose(self.picker.as_ref()).to_string();

        let new_user = NewUser {
            email: request.email,
            username: request.username,
            password_hash,
            picture_url,
        };

        // The store may still report a duplicate created by a concurrent request
        let record = match with_timeout(self.store_timeout, self.store.create(new_user)).await {
            Ok(record) => record,
            Err(StoreError::DuplicateKey(_)) => return Err(AuthError::DuplicateAccount),
            Err(e) => return Err(e.into()),
        };

        log::info!("Registered user {}", record.id);
        Ok(User::from(record))
    }

    /// Verify credentials and issue a session token
    ///
    /// # Errors
    ///
    /// * `AuthError::AccountNotFound` - No account for this email
    /// * `AuthError::InvalidCredentials` - Wrong password
    /// * `AuthError::TokenSigning` - Token could not be signed
    pub async fn authenticate(&self, request: LoginRequest) -> AuthResult<(User, SessionToken)> {
        self.authenticate_inner(request)
            .await
            .inspect_err(|e| log_failure("authenticate", e))
    }

    async fn authenticate_inner(&self, request: LoginRequest) -> AuthResult<(User, SessionToken)> {
        let found = with_timeout(self.store_timeout, self.store.find_by_email(&request.email))
            .await?;

        let Some(record) = found else {
            self.verify_decoy(request.password).await?;
            return Err(AuthError::AccountNotFound);
        };

        let matched = self
            .verify_password(request.password, record.password_hash.clone())
            .await?;
        if !matched {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.issuer.issue(record.id, &record.email)?;
        log::debug!("Issued session token for user {}", record.id);

        Ok((User::from(record), token))
    }

    /// Log out
    ///
    /// Tokens are self-contained, so there is nothing to revoke server-side:
    /// the caller must clear the client cookie, and a copied token remains
    /// valid until its `exp`.
    pub fn invalidate(&self) -> SessionArtifact {
        SessionArtifact::Clear
    }

    /// Verify a session token and return the identity it carries
    pub fn verify_token(&self, token: &str) -> AuthResult<VerifiedIdentity> {
        Ok(self.issuer.verify(token)?.identity())
    }

    /// Fetch the profile of a verified identity
    ///
    /// # Errors
    ///
    /// * `AuthError::AccountNotFound` - Account was deleted after the token was issued
    pub async fn current_user(&self, identity: &VerifiedIdentity) -> AuthResult<User> {
        let found = with_timeout(self.store_timeout, self.store.find_by_id(identity.user_id))
            .await
            .map_err(AuthError::from)
            .inspect_err(|e| log_failure("current_user", e))?;

        found.map(User::from).ok_or(AuthError::AccountNotFound)
    }

    /// Check that the account store is reachable
    pub async fn health_check(&self) -> AuthResult<()> {
        with_timeout(self.store_timeout, self.store.health_check()).await?;
        Ok(())
    }

    /// Token issuer used by this manager
    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    async fn hash_password(&self, password: String) -> AuthResult<String> {
        let hasher = Arc::clone(&self.hasher);
        let hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| HashError::Compute(e.to_string()))??;
        Ok(hash)
    }

    async fn verify_password(&self, password: String, hash: String) -> AuthResult<bool> {
        let hasher = Arc::clone(&self.hasher);
        let matched = tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| HashError::Compute(e.to_string()))??;
        Ok(matched)
    }

    async fn verify_decoy(&self, password: String) -> AuthResult<()> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.verify_decoy(&password))
            .await
            .map_err(|e| HashError::Compute(e.to_string()))?;
        Ok(())
    }
}

fn log_failure(operation: &str, err: &AuthError) {
    if err.is_user_facing() {
        log::debug!("{} rejected: {}", operation, err);
    } else {
        log::error!("{} failed: {}", operation, err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{UserRecord, avatar::SeededPicker};
    use crate::db::{MemoryUserRepository, StoreResult};
    use async_trait::async_trait;
    use uuid::Uuid;

    const SECRET: &str = "test_secret_key_for_testing_only_0123456789";

    fn config() -> AuthConfig {
        AuthConfig {
            hash_cost: HashCost::minimal(),
            ..AuthConfig::new(SECRET)
        }
    }

    fn manager_with(store: Arc<dyn UserRepository>) -> AuthManager {
        AuthManager::new(store, config()).unwrap()
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            username: "alice".to_string(),
            email: email.to_string(),
            password: "pw1".to_string(),
        }
    }

    /// Store whose existence check misses, simulating a concurrent create
    struct RacingStore {
        inner: MemoryUserRepository,
    }

    #[async_trait]
    impl UserRepository for RacingStore {
        async fn find_by_email(&self, _email: &str) -> StoreResult<Option<UserRecord>> {
            Ok(None)
        }

        async fn find_by_id(&self, user_id: Uuid) -> StoreResult<Option<UserRecord>> {
            self.inner.find_by_id(user_id).await
        }

        async fn create(&self, user: NewUser) -> StoreResult<UserRecord> {
            self.inner.create(user).await
        }
    }

    /// Store that never answers
    struct StalledStore;

    #[async_trait]
    impl UserRepository for StalledStore {
        async fn find_by_email(&self, _email: &str) -> StoreResult<Option<UserRecord>> {
            std::future::pending().await
        }

        async fn find_by_id(&self, _user_id: Uuid) -> StoreResult<Option<UserRecord>> {
            std::future::pending().await
        }

        async fn create(&self, _user: NewUser) -> StoreResult<UserRecord> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_register_returns_profile() {
        let manager = manager_with(Arc::new(MemoryUserRepository::new()));

        let user = manager.register(register_request("a@x.com")).await.unwrap();

        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.username, "alice");
        assert!(AvatarCatalog::default().urls().contains(&user.picture_url));
    }

    #[tokio::test]
    async fn test_register_stores_hash_not_plaintext() {
        let store = MemoryUserRepository::new();
        let manager = manager_with(Arc::new(store.clone()));

        manager.register(register_request("a@x.com")).await.unwrap();

        let record = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_ne!(record.password_hash, "pw1");
        assert!(record.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_duplicate_from_store_race_maps_to_duplicate_account() {
        let inner = MemoryUserRepository::new();
        let manager = manager_with(Arc::new(RacingStore {
            inner: inner.clone(),
        }));

        manager.register(register_request("a@x.com")).await.unwrap();
        let result = manager.register(register_request("a@x.com")).await;

        assert!(matches!(result, Err(AuthError::DuplicateAccount)));
        assert_eq!(inner.len(), 1);
    }

    #[tokio::test]
    async fn test_seeded_picker_forces_avatar() {
        let catalog = AvatarCatalog::default();
        let expected = catalog.choose(&SeededPicker::new(3)).to_string();

        let manager = manager_with(Arc::new(MemoryUserRepository::new()))
            .with_picker(Arc::new(SeededPicker::new(3)));
        let user = manager.register(register_request("a@x.com")).await.unwrap();

        assert_eq!(user.picture_url, expected);
    }

    #[tokio::test]
    async fn test_authenticate_unknown_email() {
        let manager = manager_with(Arc::new(MemoryUserRepository::new()));

        let result = manager
            .authenticate(LoginRequest {
                email: "nobody@x.com".to_string(),
                password: "pw".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AuthError::AccountNotFound)));
    }

    #[tokio::test]
    async fn test_current_user_for_deleted_account() {
        let store = MemoryUserRepository::new();
        let manager = manager_with(Arc::new(store.clone()));

        manager.register(register_request("a@x.com")).await.unwrap();
        let (user, token) = manager
            .authenticate(LoginRequest {
                email: "a@x.com".to_string(),
                password: "pw1".to_string(),
            })
            .await
            .unwrap();

        store.remove(user.id);

        let identity = manager.verify_token(&token.value).unwrap();
        let result = manager.current_user(&identity).await;
        assert!(matches!(result, Err(AuthError::AccountNotFound)));
    }

    #[tokio::test]
    async fn test_stalled_store_times_out() {
        let manager = AuthManager::new(
            Arc::new(StalledStore),
            AuthConfig {
                store_timeout: std::time::Duration::from_millis(20),
                ..config()
            },
        )
        .unwrap();

        let result = manager.register(register_request("a@x.com")).await;
        match result {
            Err(err @ AuthError::Store(StoreError::Timeout(_))) => {
                assert!(!err.is_user_facing());
            }
            other => panic!("expected store timeout, got {:?}", other.map(|u| u.id)),
        }
    }

    #[test]
    fn test_invalidate_clears_cookie() {
        let manager = manager_with(Arc::new(MemoryUserRepository::new()));
        assert_eq!(manager.invalidate(), SessionArtifact::Clear);
    }

    #[test]
    fn test_short_secret_fails_construction() {
        let result = AuthManager::new(
            Arc::new(MemoryUserRepository::new()),
            AuthConfig {
                jwt_secret: "short".to_string(),
                ..config()
            },
        );
        assert!(matches!(result, Err(AuthError::Config(_))));
    }

    #[test]
    fn test_out_of_range_ttl_fails_construction() {
        let result = AuthManager::new(
            Arc::new(MemoryUserRepository::new()),
            AuthConfig {
                token_ttl: Some(Duration::seconds(10_000_000_000_000)),
                ..config()
            },
        );
        assert!(matches!(result, Err(AuthError::Config(_))));
    }

    #[test]
    fn test_config_debug_redacts_secret() {
        let debug = format!("{:?}", config());
        assert!(!debug.contains(SECRET));
    }
}
