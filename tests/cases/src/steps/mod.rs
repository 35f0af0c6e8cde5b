use raft::{ElectionManagerParams, ElectionTimer, ElectionTimings, MemberRef, NodeLeadershipFsm};
use raft_modules::{ClusterConfiguration, HeartbeatCounter, InProcMember, InProcVoter, MemoryAuditTrail};
use std::sync::Arc;
use std::time::Duration;

pub mod cluster;

pub type CaseFsm<Et> = NodeLeadershipFsm<ClusterConfiguration, MemoryAuditTrail, Et>;

pub struct CaseNode<Et: ElectionTimer> {
	pub id: u64,
	pub voter: Arc<InProcVoter>,
	pub fsm: CaseFsm<Et>,
	pub metrics: Arc<HeartbeatCounter>,
}

pub fn create_runtime() -> tokio::runtime::Runtime {
	tokio::runtime::Runtime::new().expect("can create tokio runtime")
}

pub async fn sleep_ms(millis: u64) {
	tokio::time::sleep(Duration::from_millis(millis)).await;
}

pub fn get_heartbeat_interval() -> Duration {
	Duration::from_millis(50)
}

pub fn create_voters(node_ids: &[u64]) -> Vec<Arc<InProcVoter>> {
	node_ids.iter()
		.map(|node_id| InProcVoter::new(*node_id, MemoryAuditTrail::new()))
		.collect()
}

/// Starts a node which sees every voter as a member, its own voter as the local one.
pub fn create_node_inproc<Et>(node_id: u64, voters: &[Arc<InProcVoter>], initial_heartbeat_timeout: Duration, election_timer: Et) -> CaseNode<Et>
where Et: ElectionTimer {
	let members: Vec<MemberRef> = voters.iter()
		.map(|voter| Arc::new(InProcMember::new(voter.clone(), voter.node_id() != node_id)) as MemberRef)
		.collect();

	let voter = voters.iter()
		.find(|voter| voter.node_id() == node_id)
		.expect("node voter exists")
		.clone();

	let metrics = Arc::new(HeartbeatCounter::new());
	let params = ElectionManagerParams {
		cluster: ClusterConfiguration::new(members),
		audit_trail: MemoryAuditTrail::new(),
		election_timer,
		metrics: Some(metrics.clone()),
		timings: ElectionTimings {
			initial_heartbeat_timeout,
			shutdown_timeout: Duration::from_millis(500),
		},
		initial_term: 0,
	};

	let fsm = raft::start_node(params);

	CaseNode {
		id: node_id,
		voter,
		fsm,
		metrics,
	}
}
