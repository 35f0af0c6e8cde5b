use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::leadership::status::{CandidateInfo, FollowerInfo, LeaderElectionEvent, LeaderInfo};

/// Transition entry points of the leadership state machine.
pub trait RaftElections: Clone + Send + Sync + 'static {
    fn reset_node_to_follower(&self, info: FollowerInfo);
    fn promote_node_to_leader(&self, info: LeaderInfo);
    fn promote_node_to_candidate(&self, info: CandidateInfo);
}

/// Forwards transition requests to the state machine driver as events.
#[derive(Debug, Clone)]
pub struct RaftElectionsAdministrator {
    leader_election_tx: UnboundedSender<LeaderElectionEvent>,
}

impl RaftElectionsAdministrator {
    pub fn new() -> (RaftElectionsAdministrator, UnboundedReceiver<LeaderElectionEvent>) {
        let (leader_election_tx, leader_election_rx) = unbounded_channel();

        (
            RaftElectionsAdministrator { leader_election_tx },
            leader_election_rx,
        )
    }

    fn send(&self, event: LeaderElectionEvent) {
        if let Err(err) = self.leader_election_tx.send(event) {
            warn!("Leader election event dropped, state machine is stopped: {:?}", err.0);
        }
    }
}

impl RaftElections for RaftElectionsAdministrator {
    fn reset_node_to_follower(&self, info: FollowerInfo) {
        self.send(LeaderElectionEvent::ResetNodeToFollower(info));
    }

    fn promote_node_to_leader(&self, info: LeaderInfo) {
        self.send(LeaderElectionEvent::PromoteNodeToLeader(info));
    }

    fn promote_node_to_candidate(&self, info: CandidateInfo) {
        self.send(LeaderElectionEvent::PromoteNodeToCandidate(info));
    }
}
