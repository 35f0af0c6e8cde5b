use crate::steps;
use raft::NodeStatus;
use raft_modules::FixedElectionTimer;
use std::time::Duration;

pub fn run() {
	steps::create_runtime().block_on(adopt_higher_term());
}

async fn adopt_higher_term() {
	let node_ids = vec![1, 2, 3];

	let cluster = steps::cluster::start_initial_cluster(node_ids, |node_id| {
		if node_id == 1 { Duration::from_millis(300) } else { Duration::from_secs(30) }
	}, FixedElectionTimer::new(400));

	// node 3 has already seen term 10, the first election of node 1 fails
	cluster.node(3).voter.observe_term(10);

	steps::sleep_ms(1500).await;

	let leader = cluster.find_a_leader().expect("leader is elected");
	assert_eq!(1, leader.id);
	assert_eq!(11, leader.fsm.current_term());
	assert_eq!(11, cluster.node(3).voter.current_term());

	// a stale term does not affect the leader
	leader.fsm.observe_term(5);
	steps::sleep_ms(50).await;
	assert_eq!(NodeStatus::Leader, leader.fsm.status());

	// a higher one makes it step down
	leader.fsm.observe_term(20);
	steps::sleep_ms(50).await;
	assert_eq!(NodeStatus::Follower, cluster.node(1).fsm.status());
	assert_eq!(20, cluster.node(1).fsm.current_term());

	cluster.terminate().await;
}
