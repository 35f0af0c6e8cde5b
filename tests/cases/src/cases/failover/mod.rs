use crate::steps;
use raft::NodeStatus;
use raft_modules::FixedElectionTimer;
use std::time::Duration;

pub fn run() {
	steps::create_runtime().block_on(replace_failed_leader());
}

async fn replace_failed_leader() {
	let node_ids = vec![1, 2, 3];

	let mut cluster = steps::cluster::start_initial_cluster(node_ids, |node_id| {
		match node_id {
			1 => Duration::from_millis(300),
			2 => Duration::from_millis(1500),
			_ => Duration::from_millis(5000),
		}
	}, FixedElectionTimer::new(400));

	steps::sleep_ms(800).await;
	let leader = cluster.find_a_leader().expect("leader is elected");
	assert_eq!(1, leader.id);
	cluster.send_heartbeats(1);

	cluster.stop_node(1).await;

	// node 2 times out first and wins with its own vote and the vote of node 3
	steps::sleep_ms(2000).await;

	let leader = cluster.find_a_leader().expect("new leader is elected");
	assert_eq!(2, leader.id);
	assert_eq!(2, leader.fsm.current_term());
	assert_eq!(NodeStatus::Follower, cluster.node(3).fsm.status());

	cluster.terminate().await;
}
