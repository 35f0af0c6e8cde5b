pub mod failover;
pub mod higher_term;
pub mod leader_election;
pub mod no_quorum;
pub mod suppression;
