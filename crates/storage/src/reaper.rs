use std::collections::{BTreeSet, HashMap};
use std::sync::Weak;

use parking_lot::Mutex;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval_at};
use tracing::debug;

use crate::db::SharedState;

/// Índice de expiração: (instante, chave), ordenado por instante.
///
/// Cada chave tem no máximo um agendamento: reagendar substitui o anterior.
/// A remoção ainda confere o `expires_at` real da entrada, porque a escrita
/// no mapa e no índice não é atômica.
#[derive(Debug, Default)]
pub(crate) struct ExpiryIndex {
    inner: Mutex<Schedule>,
}

#[derive(Debug, Default)]
struct Schedule {
    by_time: BTreeSet<(Instant, String)>,
    by_key: HashMap<String, Instant>,
}

impl ExpiryIndex {
    pub(crate) fn schedule(&self, when: Instant, key: String) {
        let mut index = self.inner.lock();
        if let Some(previous) = index.by_key.insert(key.clone(), when) {
            index.by_time.remove(&(previous, key.clone()));
        }
        index.by_time.insert((when, key));
    }

    pub(crate) fn unschedule(&self, key: &str) {
        let mut index = self.inner.lock();
        if let Some(previous) = index.by_key.remove(key) {
            index.by_time.remove(&(previous, key.to_string()));
        }
    }

    /// Retira até `limit` chaves vencidas em `now`. O lock dura só a retirada.
    pub(crate) fn pop_due(&self, now: Instant, limit: usize) -> Vec<String> {
        let mut index = self.inner.lock();
        let mut due = Vec::new();
        while due.len() < limit {
            let is_due = matches!(index.by_time.first(), Some((when, _)) if *when <= now);
            if !is_due {
                break;
            }
            if let Some((_, key)) = index.by_time.pop_first() {
                index.by_key.remove(&key);
                due.push(key);
            }
        }
        due
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        let index = self.inner.lock();
        debug_assert_eq!(index.by_time.len(), index.by_key.len());
        index.by_time.len()
    }
}

/// Background task que purga chaves expiradas a cada `every`. A primeira
/// varredura acontece só depois de um intervalo completo.
///
/// Guarda só uma referência fraca ao estado: termina quando o último `Db`
/// é dropado.
pub(crate) async fn run(shared: Weak<SharedState>, every: Duration, batch: usize) {
    let mut tick = interval_at(Instant::now() + every, every);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tick.tick().await;

        let Some(state) = shared.upgrade() else {
            debug!("store dropado, reaper encerrado");
            return;
        };

        let removed = sweep(&state, batch).await;
        if removed > 0 {
            debug!("{removed} chaves expiradas removidas");
        }
    }
}

/// Uma varredura completa, em lotes de no máximo `batch` chaves.
pub(crate) async fn sweep(state: &SharedState, batch: usize) -> usize {
    let mut removed = 0;

    loop {
        let due = state.expiry.pop_due(Instant::now(), batch);
        if due.is_empty() {
            break;
        }

        for key in &due {
            // Só remove se realmente expirou (pode ter sido re-setado)
            if state
                .data
                .remove_if(key, |_, entry| entry.is_expired())
                .is_some()
            {
                removed += 1;
            }
        }

        tokio::task::yield_now().await;
    }

    removed
}
