use crate::memory_log::MemoryAuditTrail;

use async_trait::async_trait;
use parking_lot::Mutex;
use raft::{ClusterMember, RaftError, Result, Term, VoteResponse};
use tokio_util::sync::CancellationToken;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Vote request processor of a single in-process node. Grants at most one vote per term
/// and only to candidates whose log is at least as up-to-date as the local one.
#[derive(Debug)]
pub struct InProcVoter {
    node_id: u64,
    audit_trail: MemoryAuditTrail,
    state: Mutex<VoterState>,
    available: AtomicBool,
    response_delay: Mutex<Duration>,
}

#[derive(Debug)]
struct VoterState {
    current_term: Term,
    last_voted_term: Option<Term>,
}

impl InProcVoter {
    pub fn new(node_id: u64, audit_trail: MemoryAuditTrail) -> Arc<InProcVoter> {
        Arc::new(InProcVoter {
            node_id,
            audit_trail,
            state: Mutex::new(VoterState {
                current_term: 0,
                last_voted_term: None,
            }),
            available: AtomicBool::new(true),
            response_delay: Mutex::new(Duration::from_millis(0)),
        })
    }

    pub fn node_id(&self) -> u64 {
        self.node_id
    }

    /// Unavailable voter fails every request as a broken transport would.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Release);
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }

    pub fn set_response_delay(&self, delay: Duration) {
        *self.response_delay.lock() = delay;
    }

    pub fn response_delay(&self) -> Duration {
        *self.response_delay.lock()
    }

    pub fn current_term(&self) -> Term {
        self.state.lock().current_term
    }

    pub fn observe_term(&self, term: Term) {
        let mut state = self.state.lock();
        if term > state.current_term {
            state.current_term = term;
        }
    }

    pub fn request_vote(&self, term: Term, last_log_index: u64, last_log_term: Term) -> VoteResponse {
        let mut state = self.state.lock();
        if term < state.current_term {
            debug!(
                "Node {} rejects vote for stale term {}, current term {}",
                self.node_id, term, state.current_term
            );
            return VoteResponse {
                term: state.current_term,
                vote_granted: false,
            };
        }
        state.current_term = term;

        let already_voted = state.last_voted_term.map_or(false, |voted| voted >= term);
        let log_is_current = (last_log_term, last_log_index)
            >= (self.audit_trail.last_entry_term(), self.audit_trail.last_entry_index());

        let vote_granted = !already_voted && log_is_current;
        if vote_granted {
            state.last_voted_term = Some(term);
        }

        debug!(
            "Node {} vote for term {}: granted={}, already voted={}, log is current={}",
            self.node_id, term, vote_granted, already_voted, log_is_current
        );
        VoteResponse { term, vote_granted }
    }
}

/// Cluster member backed by an in-process voter.
#[derive(Debug, Clone)]
pub struct InProcMember {
    voter: Arc<InProcVoter>,
    remote: bool,
    endpoint: String,
}

impl InProcMember {
    pub fn new(voter: Arc<InProcVoter>, remote: bool) -> InProcMember {
        let endpoint = format!("inproc://node-{}", voter.node_id());

        InProcMember {
            voter,
            remote,
            endpoint,
        }
    }

    pub fn voter(&self) -> &Arc<InProcVoter> {
        &self.voter
    }
}

#[async_trait]
impl ClusterMember for InProcMember {
    fn id(&self) -> u64 {
        self.voter.node_id()
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn is_remote(&self) -> bool {
        self.remote
    }

    async fn vote(
        &self,
        term: Term,
        last_log_index: u64,
        last_log_term: Term,
        token: &CancellationToken,
    ) -> Result<VoteResponse> {
        let delay = self.voter.response_delay();
        if delay > Duration::from_millis(0) {
            tokio::select! {
                _ = token.cancelled() => return Err(RaftError::canceled("Vote request canceled")),
                _ = tokio::time::sleep(delay) => {},
            }
        }

        if !self.voter.is_available() {
            return Err(RaftError::member_unavailable(&self.endpoint, "node is down".to_string()));
        }

        Ok(self.voter.request_vote(term, last_log_index, last_log_term))
    }
}
