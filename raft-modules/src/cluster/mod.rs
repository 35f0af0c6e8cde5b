use parking_lot::Mutex;
use raft::{Cluster, MemberRef};
use std::sync::Arc;

/// Basic in-memory implementation of the Cluster trait. It manages the current cluster
/// membership shared by every clone.
#[derive(Clone, Debug)]
pub struct ClusterConfiguration {
    members: Arc<Mutex<Vec<MemberRef>>>,
}

impl Cluster for ClusterConfiguration {
    fn members(&self) -> Vec<MemberRef> {
        self.members.lock().clone()
    }
}

impl ClusterConfiguration {
    /// Creates an instance of ClusterConfiguration initialized with provided member list.
    pub fn new(members: Vec<MemberRef>) -> ClusterConfiguration {
        let cluster = ClusterConfiguration {
            members: Arc::new(Mutex::new(Vec::new())),
        };

        for member in members {
            cluster.add_member(member);
        }

        cluster
    }

    /// Adds a member to the cluster configuration. Duplicates by id are ignored.
    pub fn add_member(&self, member: MemberRef) {
        let mut members = self.members.lock();
        if members.iter().any(|m| m.id() == member.id()) {
            warn!("Cluster configuration - add duplicate member:{}", member.id());
            return;
        }

        members.push(member);
    }
}
