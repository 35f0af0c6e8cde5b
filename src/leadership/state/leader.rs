use crate::cluster::MemberRef;
use crate::leadership::state::RaftState;
use crate::leadership::status::administrator::RaftElections;
use crate::leadership::Term;

/// Occupies the slot once the election is won. Log replication is driven elsewhere;
/// this role only records which member leads and for which term.
#[derive(Debug)]
pub struct LeaderState<Re: RaftElections> {
    state: RaftState<Re>,
    leader: MemberRef,
    term: Term,
}

impl<Re: RaftElections> LeaderState<Re> {
    pub fn new(state: RaftState<Re>, leader: MemberRef, term: Term) -> LeaderState<Re> {
        info!("Node {} ({}) is the leader for term {}", leader.id(), leader.endpoint(), term);

        LeaderState { state, leader, term }
    }

    pub fn leader(&self) -> &MemberRef {
        &self.leader
    }

    pub fn term(&self) -> Term {
        self.term
    }

    /// Leaves leadership after a higher term was observed.
    pub fn step_down(&self, term: Term) {
        if term > self.term {
            self.state.move_to_follower_state(false, Some(term));
        }
    }

    pub fn dispose(self) {
        self.state.begin_dispose();
    }
}
