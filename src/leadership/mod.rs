use std::time::Duration;

pub mod node_leadership_fsm;
pub mod state;
pub mod status;

/// Election epoch. Never decreases on a node.
pub type Term = i64;

/// Term reported for members which could not be reached.
pub const UNAVAILABLE_TERM: Term = -1;

pub trait ElectionTimer: Send + Sync + 'static {
    fn next_elections_timeout(&self) -> Duration;
}

/// Receives follower activity reports.
pub trait FollowerMetrics: Send + Sync + 'static {
    fn report_heartbeat(&self);
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct ElectionTimings {
    /// Heartbeat timeout of the first follower, before any timeout was randomized.
    pub initial_heartbeat_timeout: Duration,
    /// How long shutdown waits for the active role to be disposed.
    pub shutdown_timeout: Duration,
}

impl Default for ElectionTimings {
    fn default() -> Self {
        ElectionTimings {
            initial_heartbeat_timeout: Duration::from_millis(800),
            shutdown_timeout: Duration::from_millis(1000),
        }
    }
}
