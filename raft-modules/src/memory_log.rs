use async_trait::async_trait;
use parking_lot::RwLock;
use raft::{new_err, AuditTrail, ErrorKind, Result, Term};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// In-memory log which keeps only the entry terms. Entry indices start at 1,
/// index 0 has term 0.
#[derive(Clone, Debug, Default)]
pub struct MemoryAuditTrail {
    terms: Arc<RwLock<Vec<Term>>>,
}

impl MemoryAuditTrail {
    pub fn new() -> MemoryAuditTrail {
        MemoryAuditTrail::default()
    }

    pub fn with_terms(terms: Vec<Term>) -> MemoryAuditTrail {
        MemoryAuditTrail {
            terms: Arc::new(RwLock::new(terms)),
        }
    }

    /// Appends an entry and returns its index.
    pub fn append(&self, term: Term) -> u64 {
        let mut terms = self.terms.write();
        terms.push(term);

        terms.len() as u64
    }

    pub fn last_entry_index(&self) -> u64 {
        self.terms.read().len() as u64
    }

    pub fn last_entry_term(&self) -> Term {
        self.terms.read().last().cloned().unwrap_or(0)
    }

    pub fn entry_term(&self, index: u64) -> Option<Term> {
        if index == 0 {
            return Some(0);
        }

        self.terms.read().get(index as usize - 1).cloned()
    }
}

#[async_trait]
impl AuditTrail for MemoryAuditTrail {
    fn last_uncommitted_index(&self) -> u64 {
        self.last_entry_index()
    }

    async fn term_at(&self, index: u64, token: &CancellationToken) -> Result<Term> {
        if token.is_cancelled() {
            return Err(raft::RaftError::canceled("Log read canceled"));
        }

        match self.entry_term(index) {
            Some(term) => Ok(term),
            None => new_err(
                ErrorKind::Storage,
                format!("Log entry {} not found", index),
                String::new(),
            ),
        }
    }
}
