#![forbid(unsafe_code)]

pub mod auth;
mod config;
mod error;
pub mod handler;
mod request_log;
mod router;

pub use auth::{AuthGate, Principal};
pub use config::ServerConfig;
pub use error::ApiError;
pub use request_log::RequestLog;
pub use router::{AppState, router};
