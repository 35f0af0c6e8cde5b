use crate::steps;
use raft::NodeStatus;
use raft_modules::RandomizedElectionTimer;
use std::time::Duration;

pub fn run() {
	steps::create_runtime().block_on(elect_without_quorum());
}

async fn elect_without_quorum() {
	let node_ids = vec![1, 2, 3, 4];

	let cluster = steps::cluster::start_initial_cluster(node_ids, |node_id| {
		if node_id == 1 { Duration::from_millis(300) } else { Duration::from_secs(30) }
	}, RandomizedElectionTimer::new(300, 600));

	// a granted vote and two unreachable members leave no majority
	cluster.node(3).voter.set_available(false);
	cluster.node(4).voter.set_available(false);

	steps::sleep_ms(1500).await;

	assert!(cluster.find_a_leader().is_none());

	let candidate = cluster.node(1);
	assert_ne!(NodeStatus::Leader, candidate.fsm.status());
	assert!(candidate.fsm.current_term() >= 1);
	assert!(candidate.fsm.leader().is_none());

	cluster.terminate().await;
}
