use crate::steps::{self, CaseNode};
use raft::{ElectionTimer, NodeStatus};
use std::time::Duration;
use tokio::time::Instant;

pub struct CaseCluster<Et: ElectionTimer> {
	pub nodes: Vec<CaseNode<Et>>,
}

/// Starts every node with its initial heartbeat timeout, so the test picks who runs
/// the first election.
pub fn start_initial_cluster<F, Et>(node_ids: Vec<u64>, initial_timeout: F, election_timer: Et) -> CaseCluster<Et>
where F: Fn(u64) -> Duration,
	  Et: ElectionTimer + Clone {
	let voters = steps::create_voters(&node_ids);

	let nodes = node_ids.iter()
		.map(|node_id| steps::create_node_inproc(*node_id, &voters, initial_timeout(*node_id), election_timer.clone()))
		.collect();

	CaseCluster { nodes }
}

impl<Et: ElectionTimer> CaseCluster<Et> {
	pub fn node(&self, node_id: u64) -> &CaseNode<Et> {
		self.nodes.iter()
			.find(|node| node.id == node_id)
			.expect("node is running")
	}

	pub fn find_a_leader(&self) -> Option<&CaseNode<Et>> {
		let leaders: Vec<&CaseNode<Et>> = self.nodes.iter()
			.filter(|node| node.fsm.status() == NodeStatus::Leader)
			.collect();

		if leaders.len() > 1 {
			let terms: Vec<(u64, i64)> = leaders.iter().map(|node| (node.id, node.fsm.current_term())).collect();
			error!("Multiple leaders found: {:?}", terms);
		}

		leaders.into_iter().max_by_key(|node| node.fsm.current_term())
	}

	/// Delivers a single round of heartbeats from the leader to every other node.
	pub fn send_heartbeats(&self, leader_id: u64) {
		let term = self.node(leader_id).fsm.current_term();

		for node in self.nodes.iter().filter(|node| node.id != leader_id) {
			node.voter.observe_term(term);
			node.fsm.observe_term(term);
			node.fsm.refresh();
		}
	}

	pub async fn keep_leader_alive(&self, leader_id: u64, duration: Duration) {
		let deadline = Instant::now() + duration;
		while Instant::now() < deadline {
			self.send_heartbeats(leader_id);
			tokio::time::sleep(steps::get_heartbeat_interval()).await;
		}
	}

	/// Stops the node and makes it unreachable for the rest of the cluster.
	pub async fn stop_node(&mut self, node_id: u64) {
		let position = self.nodes.iter()
			.position(|node| node.id == node_id)
			.expect("node is running");

		let node = self.nodes.remove(position);
		node.voter.set_available(false);
		node.fsm.shutdown().await;

		info!("Node {} stopped", node_id);
	}

	pub async fn terminate(self) {
		for node in self.nodes {
			node.fsm.shutdown().await;
		}
	}
}
