//! Structured logging configuration.
//!
//! `tracing` for the server, with `log` records from the core library routed
//! into the same subscriber.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels come from `RUST_LOG`, defaulting to `info,sqlx=warn,hyper=warn`.
///
/// # Example
///
/// ```no_run
/// use sa_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,hyper=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log security event with structured data
///
/// # Arguments
///
/// * `event_type` - Type of security event
/// * `user_id` - Optional user ID
/// * `email` - Optional account email the event concerns
/// * `message` - Event message
///
/// # Example
///
/// ```
/// use sa_server::logging::log_security_event;
///
/// log_security_event(
///     "failed_login",
///     None,
///     Some("a@x.com"),
///     "Incorrect password",
/// );
/// ```
pub fn log_security_event(
    event_type: &str,
    user_id: Option<&str>,
    email: Option<&str>,
    message: &str,
) {
    tracing::warn!(
        event_type = event_type,
        user_id = user_id,
        email = email,
        "SECURITY: {}",
        message
    );
}

/// Log API request/response
pub fn log_api_request(request_id: &str, method: &str, path: &str, status_code: u16, duration_ms: u64) {
    tracing::info!(
        request_id = request_id,
        http_method = method,
        http_path = path,
        http_status = status_code,
        duration_ms = duration_ms,
        "API request completed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_security_event() {
        // Just ensure it doesn't panic
        log_security_event("test_event", Some("1"), Some("a@x.com"), "Test message");
        log_security_event("test_event", None, None, "Test message");
    }

    #[test]
    fn test_log_api_request() {
        log_api_request("req-1", "GET", "/api/v1/auth/me", 200, 45);
        log_api_request("req-2", "POST", "/api/v1/auth/login", 400, 120);
    }
}
