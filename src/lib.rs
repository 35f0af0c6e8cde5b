#![warn(missing_debug_implementations, unsafe_code)]

#[macro_use] extern crate log;


mod common;
mod leadership;
mod cluster;
mod errors;


pub use cluster::{AuditTrail, Cluster, ClusterMember, MemberRef, VoteResponse};
pub use common::completion_pipe::{CompletionPipe, Consumer};
pub use errors::{ErrorKind, RaftError, Result, new_err};
pub use leadership::{ElectionTimer, ElectionTimings, FollowerMetrics, Term, UNAVAILABLE_TERM};
pub use leadership::node_leadership_fsm::{ElectionManagerParams, NodeLeadershipFsm};
pub use leadership::state::{CandidateState, FollowerState, HeartbeatSink, LeaderState, RaftState, Role, TransitionSuppressionScope};
pub use leadership::state::candidate::VotingResult;
pub use leadership::status::{CandidateInfo, FollowerInfo, LeaderElectionEvent, LeaderInfo, NodeStatus};
pub use leadership::status::administrator::{RaftElections, RaftElectionsAdministrator};


/// Starts the leader election state machine of a node. The node begins as a follower.
pub fn start_node<Cl, Log, Et>(params: ElectionManagerParams<Cl, Log, Et>) -> NodeLeadershipFsm<Cl, Log, Et>
where Cl: Cluster,
	  Log: AuditTrail,
	  Et: ElectionTimer {

	NodeLeadershipFsm::start(params)
}
