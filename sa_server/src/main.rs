//! Auth server: signup, login, logout and profile endpoints over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Error;
use log::info;
use pico_args::Arguments;
use sa_server::{
    api,
    config::{Overrides, ServerConfig, StoreBackend},
    logging, metrics,
};
use session_auth::{
    AuthManager,
    db::{Database, MemoryUserRepository, UserRepository},
};

const HELP: &str = "\
Run the session auth server

USAGE:
  sa_server [OPTIONS]

OPTIONS:
  --bind          IP:PORT  Server socket bind address   [default: env SERVER_BIND or 127.0.0.1:8080]
  --db-url        URL      Database connection string   [default: env DATABASE_URL]
  --metrics-bind  IP:PORT  Prometheus exporter address  [default: env METRICS_BIND, disabled if unset]

FLAGS:
  --in-memory              Keep accounts in memory instead of PostgreSQL
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  DATABASE_URL             PostgreSQL connection string
  JWT_SECRET               Session token signing secret (required, 32+ characters)
  SESSION_TOKEN_TTL_SECS   Token lifetime in seconds, 0 disables expiry [default: 86400]
  STORE_TIMEOUT_SECS       Deadline per account store call [default: 5]
  AVATAR_URLS              Comma-separated avatar catalog override
  (See .env file for all configuration options)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let overrides = Overrides {
        bind: pargs.opt_value_from_str::<_, SocketAddr>("--bind")?,
        database_url: pargs.opt_value_from_str("--db-url")?,
        in_memory: pargs.contains("--in-memory"),
        metrics_bind: pargs.opt_value_from_str::<_, SocketAddr>("--metrics-bind")?,
    };

    logging::init();

    let config = ServerConfig::from_env(overrides)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(|e| anyhow::anyhow!(e))?;
        info!("Prometheus metrics exported on {}", addr);
    }

    let store: Arc<dyn UserRepository> = match config.store {
        StoreBackend::Memory => {
            info!("Using in-memory account store; accounts are lost on restart");
            Arc::new(MemoryUserRepository::new())
        }
        StoreBackend::Postgres => {
            info!("Connecting to database");
            let db = Database::new(&config.database)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;
            db.migrate()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;
            info!("Database connected successfully");
            Arc::new(db.user_repository())
        }
    };

    let auth_manager = Arc::new(AuthManager::new(store, config.auth_config()?)?);

    let app = api::create_router(api::AppState { auth_manager });

    info!("Starting HTTP server on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
}
