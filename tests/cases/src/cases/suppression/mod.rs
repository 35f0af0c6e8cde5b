use crate::steps;
use raft::NodeStatus;
use raft_modules::FixedElectionTimer;
use std::time::Duration;

pub fn run() {
	steps::create_runtime().block_on(suppress_elections());
}

async fn suppress_elections() {
	let node_ids = vec![1, 2, 3];

	let cluster = steps::cluster::start_initial_cluster(node_ids, |node_id| {
		if node_id == 1 { Duration::from_millis(300) } else { Duration::from_secs(30) }
	}, FixedElectionTimer::new(400));

	steps::sleep_ms(50).await;
	let scope = cluster.node(1).fsm.suppress_transitions();

	steps::sleep_ms(1000).await;
	assert!(cluster.find_a_leader().is_none());
	assert_eq!(NodeStatus::Follower, cluster.node(1).fsm.status());
	assert_eq!(0, cluster.node(1).fsm.current_term());

	drop(scope);
	steps::sleep_ms(700).await;

	let leader = cluster.find_a_leader().expect("leader is elected");
	assert_eq!(1, leader.id);
	assert_eq!(1, leader.fsm.current_term());

	// nothing to suppress on a leader
	let scope = leader.fsm.suppress_transitions();
	drop(scope);

	cluster.terminate().await;
}
