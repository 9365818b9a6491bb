//! HTTP front end for the `session_auth` session service.
//!
//! Exposes signup, login, logout and current-user endpoints, carrying the
//! session token in an `HttpOnly` cookie.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
