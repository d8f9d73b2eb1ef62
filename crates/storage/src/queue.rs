use std::collections::VecDeque;
use std::sync::Arc;

use dashmap::DashMap;

/// Filas FIFO nomeadas.
///
/// Uma fila nasce no primeiro `enqueue` e é descartada quando esvazia, então
/// fila vazia e fila inexistente seguem o mesmo caminho de código.
#[derive(Clone, Default)]
pub struct QueueStore {
    queues: Arc<DashMap<String, VecDeque<String>>>,
}

impl QueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adiciona ao final da fila, criando-a se preciso. Retorna o novo
    /// tamanho.
    pub fn enqueue(&self, queue: &str, value: String) -> usize {
        let mut items = self.queues.entry(queue.to_string()).or_default();
        items.push_back(value);
        items.len()
    }

    /// Remove e retorna o item mais antigo. `None` para fila vazia ou
    /// inexistente.
    pub fn dequeue(&self, queue: &str) -> Option<String> {
        let mut items = self.queues.get_mut(queue)?;
        let item = items.pop_front();
        let now_empty = items.is_empty();
        drop(items);

        // Limpar a fila se ficou vazia; um enqueue concorrente a mantém viva
        if now_empty {
            self.queues.remove_if(queue, |_, items| items.is_empty());
        }
        item
    }

    /// Quantidade de itens na fila.
    pub fn len(&self, queue: &str) -> usize {
        self.queues.get(queue).map(|items| items.len()).unwrap_or(0)
    }

    /// Nomes das filas com ao menos um item, em ordem lexicográfica.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .queues
            .iter()
            .filter(|entry| !entry.value().is_empty())
            .map(|entry| entry.key().clone())
            .collect();
        names.sort_unstable();
        names
    }

    /// Número de filas não vazias.
    pub fn count(&self) -> usize {
        self.queues
            .iter()
            .filter(|entry| !entry.value().is_empty())
            .count()
    }
}
