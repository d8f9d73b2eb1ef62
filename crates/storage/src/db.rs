use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::time::{Duration, Instant};
use tracing::debug;

use tidekv_common::StorageError;

use crate::config::StoreConfig;
use crate::entry::{Entry, Value};
use crate::reaper::{self, ExpiryIndex};

/// Teto para TTLs, evita overflow de `Instant`.
const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Resultado de uma consulta de TTL em chave existente.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlStatus {
    /// Segundos restantes, arredondados para o inteiro mais próximo.
    Remaining(u64),
    /// Chave existe mas não expira.
    NoExpiry,
}

/// Estado compartilhado entre todas as requisições.
pub(crate) struct SharedState {
    pub(crate) data: DashMap<String, Entry>,
    pub(crate) expiry: ExpiryIndex,
    reap_batch: usize,
}

/// Handle para o key-value store in-memory.
///
/// Toda leitura confere o `expires_at` da entrada (expiração lógica); o
/// reaper em background apenas devolve memória e nunca decide visibilidade.
#[derive(Clone)]
pub struct Db {
    shared: Arc<SharedState>,
}

impl Db {
    /// Cria o store e dispara o reaper. Precisa de um runtime tokio ativo.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        let db = Db {
            shared: Arc::new(SharedState {
                data: DashMap::new(),
                expiry: ExpiryIndex::default(),
                reap_batch: config.reap_batch,
            }),
        };

        // Spawn background task para purgar keys expiradas
        let shared = Arc::downgrade(&db.shared);
        tokio::spawn(reaper::run(shared, config.reap_interval, config.reap_batch));

        db
    }

    // --- String operations ---

    pub fn get(&self, key: &str) -> Result<String, StorageError> {
        let entry = self
            .shared
            .data
            .get(key)
            .ok_or(StorageError::KeyNotFound)?;
        if entry.is_expired() {
            drop(entry);
            self.evict_expired(key);
            return Err(StorageError::KeyNotFound);
        }
        match &entry.value {
            Value::String(data) => Ok(data.clone()),
            Value::Hash(_) => Err(StorageError::WrongType),
        }
    }

    /// Upsert incondicional. Sem `ttl` a chave fica permanente, mesmo que
    /// tivesse TTL antes.
    pub fn set(&self, key: String, value: String, ttl: Option<Duration>) {
        let expires_at = ttl.map(|ttl| deadline(Instant::now(), ttl));

        let entry = Entry::new(Value::String(value), expires_at);
        self.shared.data.insert(key.clone(), entry);

        match expires_at {
            Some(when) => self.shared.expiry.schedule(when, key),
            None => self.shared.expiry.unschedule(&key),
        }
    }

    /// Remove a chave. Retorna se havia uma entrada viva; apagar chave
    /// inexistente não é erro.
    pub fn del(&self, key: &str) -> bool {
        let removed = self.shared.data.remove(key);
        self.shared.expiry.unschedule(key);
        match removed {
            Some((_, entry)) => !entry.is_expired(),
            None => false,
        }
    }

    /// Define `expires_at = agora + ttl_secs`. TTL não positivo expira a
    /// chave imediatamente.
    pub fn expire(&self, key: &str, ttl_secs: i64) -> Result<(), StorageError> {
        let now = Instant::now();
        let mut entry = self
            .shared
            .data
            .get_mut(key)
            .ok_or(StorageError::KeyNotFound)?;

        if entry.is_expired_at(now) {
            drop(entry);
            self.evict_expired(key);
            return Err(StorageError::KeyNotFound);
        }

        let when = if ttl_secs <= 0 {
            now
        } else {
            deadline(now, Duration::from_secs(ttl_secs as u64))
        };
        entry.expires_at = Some(when);
        drop(entry);

        self.shared.expiry.schedule(when, key.to_string());
        Ok(())
    }

    pub fn ttl(&self, key: &str) -> Result<TtlStatus, StorageError> {
        let now = Instant::now();
        let entry = self
            .shared
            .data
            .get(key)
            .ok_or(StorageError::KeyNotFound)?;

        if entry.is_expired_at(now) {
            drop(entry);
            self.evict_expired(key);
            return Err(StorageError::KeyNotFound);
        }

        Ok(match entry.expires_at {
            Some(when) => TtlStatus::Remaining(round_secs(when.saturating_duration_since(now))),
            None => TtlStatus::NoExpiry,
        })
    }

    /// Todas as chaves logicamente vivas, em ordem lexicográfica.
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .shared
            .data
            .iter()
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort_unstable();
        keys
    }

    pub fn incr(&self, key: &str) -> Result<i64, StorageError> {
        self.incr_by(key, 1)
    }

    pub fn decr(&self, key: &str) -> Result<i64, StorageError> {
        self.incr_by(key, -1)
    }

    fn incr_by(&self, key: &str, delta: i64) -> Result<i64, StorageError> {
        // Usar entry API do DashMap para atomicidade
        let mut entry = self
            .shared
            .data
            .entry(key.to_string())
            .or_insert_with(|| Entry::new(Value::String("0".into()), None));

        if entry.is_expired() {
            entry.value = Value::String("0".into());
            entry.expires_at = None;
        }

        match &entry.value {
            Value::String(data) => {
                let n: i64 = data.parse().map_err(|_| StorageError::NotAnInteger)?;
                let new_val = n.checked_add(delta).ok_or(StorageError::NotAnInteger)?;
                entry.value = Value::String(new_val.to_string());
                Ok(new_val)
            }
            Value::Hash(_) => Err(StorageError::WrongType),
        }
    }

    // --- Hash operations ---

    /// Grava um campo no hash. Retorna `true` se o campo é novo.
    pub fn hset(&self, hash: &str, field: String, value: String) -> Result<bool, StorageError> {
        let mut entry = self
            .shared
            .data
            .entry(hash.to_string())
            .or_insert_with(|| Entry::new(Value::Hash(HashMap::new()), None));

        if entry.is_expired() {
            entry.value = Value::Hash(HashMap::new());
            entry.expires_at = None;
        }

        match &mut entry.value {
            Value::Hash(fields) => Ok(fields.insert(field, value).is_none()),
            Value::String(_) => Err(StorageError::WrongType),
        }
    }

    pub fn hget(&self, hash: &str, field: &str) -> Result<String, StorageError> {
        let entry = self
            .shared
            .data
            .get(hash)
            .ok_or(StorageError::KeyNotFound)?;
        if entry.is_expired() {
            drop(entry);
            self.evict_expired(hash);
            return Err(StorageError::KeyNotFound);
        }
        match &entry.value {
            Value::Hash(fields) => fields.get(field).cloned().ok_or(StorageError::FieldNotFound),
            Value::String(_) => Err(StorageError::WrongType),
        }
    }

    // --- Manutenção ---

    /// Entradas fisicamente presentes, incluindo expiradas ainda não
    /// removidas.
    pub fn len(&self) -> usize {
        self.shared.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.data.is_empty()
    }

    /// Chaves logicamente vivas, sem copiar nem ordenar.
    pub fn live_count(&self) -> usize {
        let now = Instant::now();
        self.shared
            .data
            .iter()
            .filter(|entry| !entry.is_expired_at(now))
            .count()
    }

    /// Executa uma varredura do reaper agora. Retorna quantas chaves foram
    /// removidas.
    pub async fn reap_expired(&self) -> usize {
        reaper::sweep(&self.shared, self.shared.reap_batch).await
    }

    /// Remoção condicional: uma escrita concorrente que trouxe a chave de
    /// volta não é apagada.
    fn evict_expired(&self, key: &str) {
        if self
            .shared
            .data
            .remove_if(key, |_, entry| entry.is_expired())
            .is_some()
        {
            debug!("key expirada removida no acesso: {key}");
        }
    }
}

impl Default for Db {
    fn default() -> Self {
        Self::new()
    }
}

fn deadline(now: Instant, ttl: Duration) -> Instant {
    now + ttl.min(MAX_TTL)
}

/// Meio segundo arredonda para cima: `expire k 1` lido logo em seguida
/// ainda mostra 1.
fn round_secs(remaining: Duration) -> u64 {
    let secs = (remaining.as_millis() + 500) / 1000;
    u64::try_from(secs).unwrap_or(u64::MAX)
}
