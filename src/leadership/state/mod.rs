use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::cluster::MemberRef;
use crate::leadership::status::administrator::RaftElections;
use crate::leadership::status::{CandidateInfo, FollowerInfo, LeaderInfo, NodeStatus};
use crate::leadership::Term;

pub mod candidate;
pub mod follower;
pub mod leader;

pub use self::candidate::CandidateState;
pub use self::follower::{FollowerState, HeartbeatSink, TransitionSuppressionScope};
pub use self::leader::LeaderState;

/// Part shared by every role: the way back to the state machine driver and the
/// disposal flag.
#[derive(Debug, Clone)]
pub struct RaftState<Re: RaftElections> {
    elections: Re,
    generation: u64,
    disposing: Arc<AtomicBool>,
}

impl<Re: RaftElections> RaftState<Re> {
    pub fn new(elections: Re, generation: u64) -> RaftState<Re> {
        RaftState {
            elections,
            generation,
            disposing: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn move_to_follower_state(&self, randomize_timeout: bool, term: Option<Term>) {
        self.elections.reset_node_to_follower(FollowerInfo {
            generation: self.generation,
            randomize_timeout,
            term,
        });
    }

    pub(crate) fn move_to_candidate_state(&self) {
        self.elections.promote_node_to_candidate(CandidateInfo {
            generation: self.generation,
        });
    }

    pub(crate) fn move_to_leader_state(&self, leader: MemberRef, term: Term) {
        self.elections.promote_node_to_leader(LeaderInfo {
            generation: self.generation,
            leader,
            term,
        });
    }

    pub(crate) fn is_disposing(&self) -> bool {
        self.disposing.load(Ordering::Acquire)
    }

    /// Returns false if disposal has already started.
    pub(crate) fn begin_dispose(&self) -> bool {
        !self.disposing.swap(true, Ordering::AcqRel)
    }
}

/// The role occupying the state machine slot.
#[derive(Debug)]
pub enum Role<Re: RaftElections> {
    Follower(FollowerState<Re>),
    Candidate(CandidateState<Re>),
    Leader(LeaderState<Re>),
}

impl<Re: RaftElections> Role<Re> {
    pub fn status(&self) -> NodeStatus {
        match self {
            Role::Follower(_) => NodeStatus::Follower,
            Role::Candidate(_) => NodeStatus::Candidate,
            Role::Leader(_) => NodeStatus::Leader,
        }
    }

    pub async fn dispose(self) {
        match self {
            Role::Follower(follower) => follower.dispose().await,
            Role::Candidate(candidate) => candidate.dispose().await,
            Role::Leader(leader) => leader.dispose(),
        }
    }
}
