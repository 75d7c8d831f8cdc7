// src/common/generation.rs

//! Contador de geração para operações assíncronas interrompíveis.
//!
//! Quem começa uma operação pega um ticket antes do `.await`; ao voltar,
//! só aplica o resultado se nenhum ticket mais novo foi emitido no meio.
//! Respostas antigas são simplesmente descartadas.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Default)]
pub struct Generation {
    current: Arc<AtomicU64>,
}

#[derive(Debug, Clone)]
pub struct GenerationTicket {
    id: u64,
    current: Arc<AtomicU64>,
}

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emite um novo ticket, invalidando todos os anteriores.
    pub fn begin(&self) -> GenerationTicket {
        let id = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        GenerationTicket {
            id,
            current: Arc::clone(&self.current),
        }
    }

    /// Invalida os tickets em andamento sem começar nada novo.
    pub fn cancel_all(&self) {
        self.current.fetch_add(1, Ordering::SeqCst);
    }
}

impl GenerationTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_ticket_invalidates_older_one() {
        let generation = Generation::new();
        let first = generation.begin();
        assert!(first.is_current());

        let second = generation.begin();
        assert!(!first.is_current());
        assert!(second.is_current());
        assert!(second.id() > first.id());
    }

    #[test]
    fn cancel_all_invalidates_everything() {
        let generation = Generation::new();
        let ticket = generation.begin();
        generation.cancel_all();
        assert!(!ticket.is_current());
    }
}
