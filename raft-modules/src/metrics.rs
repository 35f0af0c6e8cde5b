use raft::FollowerMetrics;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counts the heartbeats received by the follower.
#[derive(Debug, Default)]
pub struct HeartbeatCounter {
    heartbeats: AtomicU64,
}

impl HeartbeatCounter {
    pub fn new() -> HeartbeatCounter {
        HeartbeatCounter::default()
    }

    pub fn heartbeats(&self) -> u64 {
        self.heartbeats.load(Ordering::Relaxed)
    }
}

impl FollowerMetrics for HeartbeatCounter {
    fn report_heartbeat(&self) {
        trace!("Heartbeat reported");
        self.heartbeats.fetch_add(1, Ordering::Relaxed);
    }
}
