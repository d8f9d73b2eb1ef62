#![forbid(unsafe_code)]

mod error;

pub use error::*;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_URL: &str = "http://127.0.0.1:5000";

/// Header que carrega a chave de API em toda requisição protegida.
pub const API_KEY_HEADER: &str = "x-api-key";

pub const DEFAULT_REAP_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_REAP_BATCH: usize = 256;
pub const MAX_BODY_BYTES: usize = 1024 * 1024; // 1 MB
pub const REQUEST_LOG_CAPACITY: usize = 1_000;
/// Quantidade de entradas devolvidas por `/logs`.
pub const RECENT_LOGS: usize = 50;
