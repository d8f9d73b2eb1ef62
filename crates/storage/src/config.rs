use std::time::Duration;

use tidekv_common::{DEFAULT_REAP_BATCH, DEFAULT_REAP_INTERVAL_MS};

/// Configuração do store e do reaper de chaves expiradas.
///
/// ```rust
/// use std::time::Duration;
/// use tidekv_storage::StoreConfig;
///
/// let config = StoreConfig::default()
///     .with_reap_interval(Duration::from_millis(500))
///     .with_reap_batch(64);
/// assert_eq!(config.reap_batch, 64);
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Intervalo entre varreduras do reaper (default: 1s).
    pub reap_interval: Duration,
    /// Máximo de chaves removidas por lote antes de ceder a vez (default: 256).
    pub reap_batch: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            reap_interval: Duration::from_millis(DEFAULT_REAP_INTERVAL_MS),
            reap_batch: DEFAULT_REAP_BATCH,
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reap_interval(mut self, interval: Duration) -> Self {
        self.reap_interval = interval;
        self
    }

    /// Lote mínimo de 1 para que a varredura sempre progrida.
    pub fn with_reap_batch(mut self, batch: usize) -> Self {
        self.reap_batch = batch.max(1);
        self
    }
}
