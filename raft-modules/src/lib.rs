#[macro_use]
extern crate log;
extern crate raft;

mod cluster;
mod communication;
mod election;
mod memory_log;
mod metrics;

pub use cluster::ClusterConfiguration;
pub use communication::inproc_member::{InProcMember, InProcVoter};
pub use election::fixed_election_timer::FixedElectionTimer;
pub use election::randomized_election_timer::RandomizedElectionTimer;
pub use memory_log::MemoryAuditTrail;
pub use metrics::HeartbeatCounter;
