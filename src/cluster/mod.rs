use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::errors::Result;
use crate::leadership::Term;

/// Reply to a vote request.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct VoteResponse {
    pub term: Term,
    pub vote_granted: bool,
}

/// Cluster member as seen by the election subsystem. The local node is a member too,
/// answering its own vote request without going through the network.
#[async_trait]
pub trait ClusterMember: Debug + Send + Sync + 'static {
    fn id(&self) -> u64;

    fn endpoint(&self) -> &str;

    /// False for the local node.
    fn is_remote(&self) -> bool;

    /// Requests a vote. Transport failures are reported as `ErrorKind::MemberUnavailable`,
    /// cancellation through `token` as `ErrorKind::Canceled`.
    async fn vote(
        &self,
        term: Term,
        last_log_index: u64,
        last_log_term: Term,
        token: &CancellationToken,
    ) -> Result<VoteResponse>;
}

pub type MemberRef = Arc<dyn ClusterMember>;

/// Current cluster membership, the local member included.
pub trait Cluster: Clone + Send + Sync + 'static {
    fn members(&self) -> Vec<MemberRef>;
}

/// Read-only view of the local log used to build vote requests.
#[async_trait]
pub trait AuditTrail: Clone + Send + Sync + 'static {
    fn last_uncommitted_index(&self) -> u64;

    async fn term_at(&self, index: u64, token: &CancellationToken) -> Result<Term>;
}
