use derive_more::Display;

use crate::cluster::MemberRef;
use crate::leadership::Term;

pub mod administrator;

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Hash)]
pub enum NodeStatus {
    Follower,
    Candidate,
    Leader,
}

/// Transition requested by the active role. `generation` identifies the role
/// instance, so requests of a role the driver already left are ignored.
#[derive(Debug)]
pub enum LeaderElectionEvent {
    PromoteNodeToCandidate(CandidateInfo),
    PromoteNodeToLeader(LeaderInfo),
    ResetNodeToFollower(FollowerInfo),
}

impl LeaderElectionEvent {
    pub fn generation(&self) -> u64 {
        match self {
            LeaderElectionEvent::PromoteNodeToCandidate(info) => info.generation,
            LeaderElectionEvent::PromoteNodeToLeader(info) => info.generation,
            LeaderElectionEvent::ResetNodeToFollower(info) => info.generation,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CandidateInfo {
    pub generation: u64,
}

#[derive(Clone, Debug)]
pub struct LeaderInfo {
    pub generation: u64,
    pub leader: MemberRef,
    /// Term the election was won for.
    pub term: Term,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FollowerInfo {
    pub generation: u64,
    pub randomize_timeout: bool,
    /// Higher term observed by the role, if any.
    pub term: Option<Term>,
}
