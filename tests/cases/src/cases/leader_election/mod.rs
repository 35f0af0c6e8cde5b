use crate::steps;
use raft::NodeStatus;
use raft_modules::FixedElectionTimer;
use std::time::Duration;

pub fn run() {
	steps::create_runtime().block_on(elect_leader());
}

async fn elect_leader() {
	let node_ids = vec![1, 2, 3];

	// node 1 runs the first election, the others wait for its heartbeats
	let cluster = steps::cluster::start_initial_cluster(node_ids, |node_id| {
		if node_id == 1 { Duration::from_millis(300) } else { Duration::from_millis(1500) }
	}, FixedElectionTimer::new(400));

	steps::sleep_ms(800).await;

	//find elected leader
	let leader = cluster.find_a_leader().expect("leader is elected");
	assert_eq!(1, leader.id);
	assert_eq!(1, leader.fsm.current_term());
	assert_eq!(1, leader.fsm.leader().expect("leader member is known").id());

	cluster.keep_leader_alive(1, Duration::from_millis(2000)).await;

	assert_eq!(NodeStatus::Leader, cluster.node(1).fsm.status());
	for node_id in [2, 3].iter() {
		let node = cluster.node(*node_id);
		assert_eq!(NodeStatus::Follower, node.fsm.status());
		assert_eq!(1, node.fsm.current_term());
		assert!(node.metrics.heartbeats() > 0);
	}

	cluster.terminate().await;
}
