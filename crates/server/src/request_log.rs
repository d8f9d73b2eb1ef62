use std::collections::VecDeque;

use parking_lot::Mutex;

use tidekv_protocol::wire::LogEntry;

use crate::Principal;

/// Quantos caracteres da chave aparecem no log.
const VISIBLE_KEY_CHARS: usize = 4;

/// Ring buffer das requisições autorizadas.
///
/// Quando cheio, a entrada mais antiga é descartada.
pub struct RequestLog {
    entries: Mutex<VecDeque<LogEntry>>,
    capacity: usize,
}

impl RequestLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn record(&self, principal: &Principal, api_key: &str, endpoint: &str) {
        let entry = LogEntry {
            user_id: principal.user_id.clone(),
            api_key: mask_key(api_key),
            endpoint: endpoint.to_string(),
            timestamp: chrono::Utc::now().timestamp(),
        };

        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// As `n` entradas mais recentes, da mais antiga para a mais nova.
    pub fn recent(&self, n: usize) -> Vec<LogEntry> {
        let entries = self.entries.lock();
        let skip = entries.len().saturating_sub(n);
        entries.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

fn mask_key(key: &str) -> String {
    let visible: String = key.chars().take(VISIBLE_KEY_CHARS).collect();
    format!("{visible}****")
}
