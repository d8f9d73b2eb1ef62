use tokio::time::Duration;

use tidekv_common::{
    DEFAULT_HOST, DEFAULT_PORT, DEFAULT_REAP_BATCH, DEFAULT_REAP_INTERVAL_MS, MAX_BODY_BYTES,
    REQUEST_LOG_CAPACITY,
};
use tidekv_storage::StoreConfig;

/// Configuração do processo servidor, montada a partir das flags do CLI.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub admin_keys: Vec<String>,
    pub user_keys: Vec<String>,
    pub reap_interval: Duration,
    pub reap_batch: usize,
    pub max_body_bytes: usize,
    pub request_log_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            admin_keys: Vec::new(),
            user_keys: Vec::new(),
            reap_interval: Duration::from_millis(DEFAULT_REAP_INTERVAL_MS),
            reap_batch: DEFAULT_REAP_BATCH,
            max_body_bytes: MAX_BODY_BYTES,
            request_log_capacity: REQUEST_LOG_CAPACITY,
        }
    }
}

impl ServerConfig {
    pub fn with_admin_key(mut self, key: impl Into<String>) -> Self {
        self.admin_keys.push(key.into());
        self
    }

    pub fn with_user_key(mut self, key: impl Into<String>) -> Self {
        self.user_keys.push(key.into());
        self
    }

    pub fn with_reap_interval(mut self, interval: Duration) -> Self {
        self.reap_interval = interval;
        self
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new()
            .with_reap_interval(self.reap_interval)
            .with_reap_batch(self.reap_batch)
    }

    /// Sem nenhuma chave o gate negaria toda requisição.
    pub fn validate(&self) -> anyhow::Result<()> {
        let has_key = self
            .admin_keys
            .iter()
            .chain(&self.user_keys)
            .any(|key| !key.is_empty());
        if !has_key {
            anyhow::bail!("nenhuma chave de API configurada (use --admin-key ou --user-key)");
        }
        if self.reap_interval.is_zero() {
            anyhow::bail!("--reap-interval-ms deve ser maior que zero");
        }
        Ok(())
    }
}
