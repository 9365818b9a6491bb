//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use chrono::Duration;
use session_auth::auth::{AuthConfig, AvatarCatalog, HashCost, MAX_TOKEN_TTL_SECS, MIN_SECRET_LEN};
use session_auth::db::DatabaseConfig;
use std::net::SocketAddr;

/// Where accounts are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// PostgreSQL via `DATABASE_URL`
    Postgres,
    /// Process memory; accounts vanish on restart
    Memory,
}

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Account store backend
    pub store: StoreBackend,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Security configuration
    pub security: SecurityConfig,
    /// Session configuration
    pub session: SessionConfig,
    /// Prometheus exporter address, disabled when unset
    pub metrics_bind: Option<SocketAddr>,
}

/// Security-related configuration
#[derive(Clone)]
pub struct SecurityConfig {
    /// JWT signing secret (required)
    pub jwt_secret: String,
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("jwt_secret", &"<redacted>")
            .finish()
    }
}

/// Session and account settings
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Token lifetime in seconds; `None` disables the `exp` claim
    pub token_ttl_secs: Option<i64>,
    /// Deadline for each account store call, in seconds
    pub store_timeout_secs: u64,
    /// Avatar catalog override
    pub avatar_urls: Option<Vec<String>>,
}

/// Command-line overrides, applied on top of the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub bind: Option<SocketAddr>,
    pub database_url: Option<String>,
    pub in_memory: bool,
    pub metrics_bind: Option<SocketAddr>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(overrides: Overrides) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok(), overrides)
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F, overrides: Overrides) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind = match overrides.bind {
            Some(bind) => bind,
            None => parse_or(&lookup, "SERVER_BIND", default_bind())?,
        };

        let store = if overrides.in_memory {
            StoreBackend::Memory
        } else {
            match lookup("STORE_BACKEND").as_deref() {
                None | Some("postgres") => StoreBackend::Postgres,
                Some("memory") => StoreBackend::Memory,
                Some(other) => {
                    return Err(ConfigError::Invalid {
                        var: "STORE_BACKEND".to_string(),
                        reason: format!("Unknown backend '{}', expected postgres or memory", other),
                    });
                }
            }
        };

        // Database configuration
        let database_url = overrides
            .database_url
            .or_else(|| lookup("DATABASE_URL"))
            .unwrap_or_else(|| DatabaseConfig::development().database_url);

        let database = DatabaseConfig {
            database_url,
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 20)?,
            min_connections: parse_or(&lookup, "DB_MIN_CONNECTIONS", 1)?,
            connection_timeout_secs: parse_or(&lookup, "DB_CONNECTION_TIMEOUT_SECS", 5)?,
            idle_timeout_secs: parse_or(&lookup, "DB_IDLE_TIMEOUT_SECS", 300)?,
            max_lifetime_secs: parse_or(&lookup, "DB_MAX_LIFETIME_SECS", 1800)?,
        };

        // Security configuration (REQUIRED)
        let jwt_secret = lookup("JWT_SECRET").ok_or_else(|| ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Generate with: openssl rand -hex 32".to_string(),
        })?;

        let ttl: i64 = parse_or(
            &lookup,
            "SESSION_TOKEN_TTL_SECS",
            session_auth::auth::DEFAULT_TOKEN_TTL_SECS,
        )?;
        let token_ttl_secs = if ttl == 0 { None } else { Some(ttl) };

        let avatar_urls = lookup("AVATAR_URLS").map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(String::from)
                .collect::<Vec<_>>()
        });

        let session = SessionConfig {
            token_ttl_secs,
            store_timeout_secs: parse_or(&lookup, "STORE_TIMEOUT_SECS", 5)?,
            avatar_urls,
        };

        let metrics_bind = match overrides.metrics_bind {
            Some(addr) => Some(addr),
            None => lookup("METRICS_BIND")
                .map(|raw| {
                    raw.parse().map_err(|_| ConfigError::Invalid {
                        var: "METRICS_BIND".to_string(),
                        reason: format!("'{}' is not a socket address", raw),
                    })
                })
                .transpose()?,
        };

        Ok(ServerConfig {
            bind,
            store,
            database,
            security: SecurityConfig { jwt_secret },
            session,
            metrics_bind,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET".to_string(),
                reason: format!("Must be at least {} characters", MIN_SECRET_LEN),
            });
        }

        if let Some(ttl) = self.session.token_ttl_secs {
            if !(1..=MAX_TOKEN_TTL_SECS).contains(&ttl) {
                return Err(ConfigError::Invalid {
                    var: "SESSION_TOKEN_TTL_SECS".to_string(),
                    reason: format!("Must be 0 (no expiry) or between 1 and {}", MAX_TOKEN_TTL_SECS),
                });
            }
        }

        if self.session.store_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "STORE_TIMEOUT_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if matches!(&self.session.avatar_urls, Some(urls) if urls.is_empty()) {
            return Err(ConfigError::Invalid {
                var: "AVATAR_URLS".to_string(),
                reason: "Must list at least one URL".to_string(),
            });
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!(
                    "Cannot exceed max connections ({})",
                    self.database.max_connections
                ),
            });
        }

        Ok(())
    }

    /// Session service configuration derived from this server configuration
    pub fn auth_config(&self) -> Result<AuthConfig, ConfigError> {
        let avatars = match &self.session.avatar_urls {
            Some(urls) => AvatarCatalog::new(urls.clone()).map_err(|e| ConfigError::Invalid {
                var: "AVATAR_URLS".to_string(),
                reason: e.to_string(),
            })?,
            None => AvatarCatalog::default(),
        };

        let token_ttl = match self.session.token_ttl_secs {
            Some(secs) => Some(Duration::try_seconds(secs).ok_or_else(|| ConfigError::Invalid {
                var: "SESSION_TOKEN_TTL_SECS".to_string(),
                reason: format!("{} seconds is out of range", secs),
            })?),
            None => None,
        };

        Ok(AuthConfig {
            jwt_secret: self.security.jwt_secret.clone(),
            token_ttl,
            hash_cost: HashCost::default(),
            avatars,
            store_timeout: std::time::Duration::from_secs(self.session.store_timeout_secs),
        })
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

/// Parse a variable, falling back to `default` when unset
fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("'{}' could not be parsed", raw),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn load(vars: &[(&str, &str)], overrides: Overrides) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned(), overrides)
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Use openssl".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("JWT_SECRET"));
        assert!(msg.contains("Use openssl"));
    }

    #[test]
    fn test_missing_secret_fails() {
        let err = load(&[], Overrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { ref var, .. } if var == "JWT_SECRET"));
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("JWT_SECRET", SECRET)], Overrides::default()).unwrap();

        assert_eq!(config.bind, default_bind());
        assert_eq!(config.store, StoreBackend::Postgres);
        assert_eq!(config.session.token_ttl_secs, Some(86_400));
        assert_eq!(config.session.store_timeout_secs, 5);
        assert!(config.metrics_bind.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn test_short_secret_rejected() {
        let config = load(&[("JWT_SECRET", "short")], Overrides::default()).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "JWT_SECRET"));
    }

    #[test]
    fn test_zero_ttl_disables_expiry() {
        let config = load(
            &[("JWT_SECRET", SECRET), ("SESSION_TOKEN_TTL_SECS", "0")],
            Overrides::default(),
        )
        .unwrap();

        assert_eq!(config.session.token_ttl_secs, None);
        assert!(config.auth_config().unwrap().token_ttl.is_none());
    }

    #[test]
    fn test_out_of_range_ttl_rejected_at_startup() {
        for raw in ["-1", "315360001", "10000000000000", "9223372036854775807"] {
            let config = load(
                &[("JWT_SECRET", SECRET), ("SESSION_TOKEN_TTL_SECS", raw)],
                Overrides::default(),
            )
            .unwrap();

            let err = config.validate().unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { ref var, .. } if var == "SESSION_TOKEN_TTL_SECS"),
                "{} should be rejected",
                raw
            );
        }
    }

    #[test]
    fn test_huge_ttl_fails_auth_config_without_panicking() {
        let config = load(
            &[("JWT_SECRET", SECRET), ("SESSION_TOKEN_TTL_SECS", "9223372036854775807")],
            Overrides::default(),
        )
        .unwrap();

        assert!(config.auth_config().is_err());
    }

    #[test]
    fn test_longest_ttl_accepted() {
        let config = load(
            &[("JWT_SECRET", SECRET), ("SESSION_TOKEN_TTL_SECS", "315360000")],
            Overrides::default(),
        )
        .unwrap();

        config.validate().unwrap();
        let auth = config.auth_config().unwrap();
        assert_eq!(auth.token_ttl.map(|ttl| ttl.num_seconds()), Some(MAX_TOKEN_TTL_SECS));
    }

    #[test]
    fn test_unparsable_value_rejected() {
        let err = load(
            &[("JWT_SECRET", SECRET), ("STORE_TIMEOUT_SECS", "soon")],
            Overrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "STORE_TIMEOUT_SECS"));
    }

    #[test]
    fn test_overrides_win() {
        let config = load(
            &[
                ("JWT_SECRET", SECRET),
                ("SERVER_BIND", "0.0.0.0:1"),
                ("DATABASE_URL", "postgres://env"),
            ],
            Overrides {
                bind: Some("127.0.0.1:9000".parse().unwrap()),
                database_url: Some("postgres://cli".to_string()),
                in_memory: true,
                metrics_bind: None,
            },
        )
        .unwrap();

        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.database.database_url, "postgres://cli");
        assert_eq!(config.store, StoreBackend::Memory);
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let err = load(
            &[("JWT_SECRET", SECRET), ("STORE_BACKEND", "redis")],
            Overrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_avatar_override() {
        let config = load(
            &[
                ("JWT_SECRET", SECRET),
                ("AVATAR_URLS", "https://a.png, https://b.png"),
            ],
            Overrides::default(),
        )
        .unwrap();

        let auth = config.auth_config().unwrap();
        assert_eq!(auth.avatars.urls(), ["https://a.png", "https://b.png"]);
    }

    #[test]
    fn test_empty_avatar_override_rejected() {
        let config = load(
            &[("JWT_SECRET", SECRET), ("AVATAR_URLS", " , ")],
            Overrides::default(),
        )
        .unwrap();
        assert!(config.validate().is_err());
        assert!(config.auth_config().is_err());
    }

    #[test]
    fn test_secret_not_in_debug_output() {
        let config = load(&[("JWT_SECRET", SECRET)], Overrides::default()).unwrap();
        assert!(!format!("{:?}", config).contains(SECRET));
    }
}
