use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::cluster::{AuditTrail, Cluster, MemberRef};
use crate::leadership::state::{
    CandidateState, FollowerState, LeaderState, RaftState, Role, TransitionSuppressionScope,
};
use crate::leadership::status::administrator::{RaftElections, RaftElectionsAdministrator};
use crate::leadership::status::{FollowerInfo, LeaderElectionEvent, LeaderInfo, NodeStatus};
use crate::leadership::{ElectionTimer, ElectionTimings, FollowerMetrics, Term};

pub struct ElectionManagerParams<Cl, Log, Et>
where
    Cl: Cluster,
    Log: AuditTrail,
    Et: ElectionTimer,
{
    pub cluster: Cl,
    pub audit_trail: Log,
    pub election_timer: Et,
    pub metrics: Option<Arc<dyn FollowerMetrics>>,
    pub timings: ElectionTimings,
    pub initial_term: Term,
}

impl<Cl, Log, Et> std::fmt::Debug for ElectionManagerParams<Cl, Log, Et>
where
    Cl: Cluster,
    Log: AuditTrail,
    Et: ElectionTimer,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElectionManagerParams")
            .field("timings", &self.timings)
            .field("initial_term", &self.initial_term)
            .finish()
    }
}

/// Leadership state machine. Holds the only active role and switches it on the
/// requests the roles make through [`RaftElectionsAdministrator`].
pub struct NodeLeadershipFsm<Cl, Log, Et>
where
    Cl: Cluster,
    Log: AuditTrail,
    Et: ElectionTimer,
{
    shared: Arc<Shared<Cl, Log, Et>>,
    worker: Option<JoinHandle<()>>,
}

struct Shared<Cl, Log, Et> {
    cluster: Cl,
    audit_trail: Log,
    election_timer: Et,
    metrics: Option<Arc<dyn FollowerMetrics>>,
    timings: ElectionTimings,
    administrator: RaftElectionsAdministrator,
    current_term: AtomicI64,
    slot: Mutex<Slot>,
    shutdown: CancellationToken,
}

struct Slot {
    generation: u64,
    role: Option<Role<RaftElectionsAdministrator>>,
    status: NodeStatus,
    election_timeout: Duration,
}

impl<Cl, Log, Et> NodeLeadershipFsm<Cl, Log, Et>
where
    Cl: Cluster,
    Log: AuditTrail,
    Et: ElectionTimer,
{
    /// Starts as a follower. Must be called from within a tokio runtime.
    pub fn start(params: ElectionManagerParams<Cl, Log, Et>) -> NodeLeadershipFsm<Cl, Log, Et> {
        let (administrator, leader_election_event_rx) = RaftElectionsAdministrator::new();

        let shared = Arc::new(Shared {
            cluster: params.cluster,
            audit_trail: params.audit_trail,
            election_timer: params.election_timer,
            metrics: params.metrics,
            timings: params.timings,
            administrator,
            current_term: AtomicI64::new(params.initial_term),
            slot: Mutex::new(Slot {
                generation: 0,
                role: None,
                status: NodeStatus::Follower,
                election_timeout: params.timings.initial_heartbeat_timeout,
            }),
            shutdown: CancellationToken::new(),
        });

        let worker = tokio::spawn(run_node_status_watcher(
            shared.clone(),
            leader_election_event_rx,
        ));

        NodeLeadershipFsm {
            shared,
            worker: Some(worker),
        }
    }

    pub fn status(&self) -> NodeStatus {
        self.shared.slot.lock().status
    }

    pub fn current_term(&self) -> Term {
        self.shared.current_term.load(Ordering::Acquire)
    }

    pub fn leader(&self) -> Option<MemberRef> {
        match &self.shared.slot.lock().role {
            Some(Role::Leader(leader)) => Some(leader.leader().clone()),
            _ => None,
        }
    }

    /// Heartbeat from the leader received. Metrics are reported outside the slot lock.
    pub fn refresh(&self) {
        let sink = match &self.shared.slot.lock().role {
            Some(Role::Follower(follower)) => Some(follower.heartbeat_sink()),
            _ => None,
        };

        if let Some(sink) = sink {
            sink.refresh();
        }
    }

    /// Adopts a term seen in any incoming message. A leader or candidate steps
    /// down when the term is higher than its own.
    pub fn observe_term(&self, term: Term) {
        let previous = self.shared.current_term.fetch_max(term, Ordering::AcqRel);
        if term <= previous {
            return;
        }

        let slot = self.shared.slot.lock();
        match &slot.role {
            Some(Role::Follower(_)) | None => {}
            Some(Role::Leader(leader)) => {
                info!("Higher term {} observed. Leader steps down", term);
                leader.step_down(term);
            }
            Some(Role::Candidate(_)) => {
                info!("Higher term {} observed. Candidate steps down", term);
                self.shared.administrator.reset_node_to_follower(FollowerInfo {
                    generation: slot.generation,
                    randomize_timeout: false,
                    term: Some(term),
                });
            }
        }
    }

    /// Pauses the heartbeat timeout while the scope is alive. Does nothing unless
    /// the node is a follower.
    pub fn suppress_transitions(&self) -> TransitionSuppressionScope {
        match &self.shared.slot.lock().role {
            Some(Role::Follower(follower)) => follower.suppress_transition(),
            _ => TransitionSuppressionScope::empty(),
        }
    }

    /// Stops the state machine and disposes the active role.
    pub async fn shutdown(mut self) {
        self.shared.shutdown.cancel();

        if let Some(worker) = self.worker.take() {
            match tokio::time::timeout(self.shared.timings.shutdown_timeout, worker).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => error!("Leader election status watcher failed: {}", err),
                Err(_) => warn!("Leader election status watcher did not stop in time"),
            }
        }
    }
}

impl<Cl, Log, Et> Drop for NodeLeadershipFsm<Cl, Log, Et>
where
    Cl: Cluster,
    Log: AuditTrail,
    Et: ElectionTimer,
{
    fn drop(&mut self) {
        self.shared.shutdown.cancel();
    }
}

impl<Cl, Log, Et> std::fmt::Debug for NodeLeadershipFsm<Cl, Log, Et>
where
    Cl: Cluster,
    Log: AuditTrail,
    Et: ElectionTimer,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeLeadershipFsm")
            .field("status", &self.status())
            .field("term", &self.current_term())
            .finish()
    }
}

async fn run_node_status_watcher<Cl, Log, Et>(
    shared: Arc<Shared<Cl, Log, Et>>,
    mut leader_election_event_rx: UnboundedReceiver<LeaderElectionEvent>,
) where
    Cl: Cluster,
    Log: AuditTrail,
    Et: ElectionTimer,
{
    info!("Leader election status watcher worker started");

    shared
        .change_node_leadership_state(LeaderElectionEvent::ResetNodeToFollower(FollowerInfo {
            generation: 0,
            randomize_timeout: false,
            term: None,
        }))
        .await;

    loop {
        tokio::select! {
            _ = shared.shutdown.cancelled() => break,
            event = leader_election_event_rx.recv() => match event {
                Some(event) => shared.change_node_leadership_state(event).await,
                None => break,
            },
        }
    }

    let role = shared.slot.lock().role.take();
    if let Some(role) = role {
        role.dispose().await;
    }

    info!("Leader election status watcher worker stopped");
}

impl<Cl, Log, Et> Shared<Cl, Log, Et>
where
    Cl: Cluster,
    Log: AuditTrail,
    Et: ElectionTimer,
{
    async fn change_node_leadership_state(&self, event: LeaderElectionEvent) {
        let generation = event.generation();
        let previous = {
            let mut slot = self.slot.lock();
            if slot.generation != generation {
                debug!(
                    "Leader election event of generation {} ignored, current is {}",
                    generation, slot.generation
                );
                return;
            }

            slot.generation += 1;
            slot.role.take()
        };

        // the previous role is fully stopped before the next one starts
        if let Some(previous) = previous {
            previous.dispose().await;
        }

        let state = RaftState::new(self.administrator.clone(), generation + 1);
        let role = match event {
            LeaderElectionEvent::ResetNodeToFollower(info) => self.become_follower(state, info),
            LeaderElectionEvent::PromoteNodeToCandidate(_) => self.become_candidate(state),
            LeaderElectionEvent::PromoteNodeToLeader(info) => self.become_leader(state, info),
        };

        let mut slot = self.slot.lock();
        slot.status = role.status();
        slot.role = Some(role);
    }

    fn become_follower(
        &self,
        state: RaftState<RaftElectionsAdministrator>,
        info: FollowerInfo,
    ) -> Role<RaftElectionsAdministrator> {
        if let Some(term) = info.term {
            self.current_term.fetch_max(term, Ordering::AcqRel);
        }

        let timeout = {
            let mut slot = self.slot.lock();
            if info.randomize_timeout {
                slot.election_timeout = self.election_timer.next_elections_timeout();
            }
            slot.election_timeout
        };

        let mut follower = FollowerState::new(state, self.metrics.clone());
        follower.start_serving(timeout, &self.shutdown);

        info!(
            "Status changed to Follower for term {}",
            self.current_term.load(Ordering::Acquire)
        );
        Role::Follower(follower)
    }

    // A term adopted after the election was won voids the promotion.
    fn become_leader(
        &self,
        state: RaftState<RaftElectionsAdministrator>,
        info: LeaderInfo,
    ) -> Role<RaftElectionsAdministrator> {
        let current_term = self.current_term.load(Ordering::Acquire);
        if info.term != current_term {
            info!(
                "Election won for term {} is outdated by term {}",
                info.term, current_term
            );
            return self.become_follower(
                state,
                FollowerInfo {
                    generation: info.generation,
                    randomize_timeout: false,
                    term: None,
                },
            );
        }

        Role::Leader(LeaderState::new(state, info.leader, info.term))
    }

    fn become_candidate(&self, state: RaftState<RaftElectionsAdministrator>) -> Role<RaftElectionsAdministrator> {
        let term = self.current_term.fetch_add(1, Ordering::AcqRel) + 1;
        let timeout = self.slot.lock().election_timeout;
        let generation = state.generation();

        info!("Status changed to Candidate for term {}", term);

        let mut candidate = CandidateState::new(state, term);
        let voting = candidate.start_voting(timeout, self.cluster.members(), self.audit_trail.clone());
        if let Err(err) = voting {
            error!("Cannot start voting for term {}: {}", term, err);
            self.administrator.reset_node_to_follower(FollowerInfo {
                generation,
                randomize_timeout: true,
                term: None,
            });
        }

        Role::Candidate(candidate)
    }
}
