use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::common::cancelled_any;
use crate::errors::{ErrorKind, RaftError, Result};
use crate::leadership::state::RaftState;
use crate::leadership::status::administrator::RaftElections;
use crate::leadership::FollowerMetrics;

/// Watches the leader heartbeats and proposes an election once they stop.
pub struct FollowerState<Re: RaftElections> {
    state: RaftState<Re>,
    signals: Arc<TrackingSignals>,
    tracker_cancellation: CancellationToken,
    tracker: Option<JoinHandle<Result<()>>>,
    metrics: Option<Arc<dyn FollowerMetrics>>,
}

struct TrackingSignals {
    refresh: Notify,
    // number of active suppression scopes, tracking resumes at zero
    suppression: watch::Sender<usize>,
    timed_out: AtomicBool,
}

impl TrackingSignals {
    fn suspend_tracking(&self) {
        self.suppression.send_modify(|scopes| *scopes += 1);
        self.refresh.notify_one();
    }

    fn resume_tracking(&self) {
        self.suppression
            .send_modify(|scopes| *scopes = scopes.saturating_sub(1));
    }
}

impl<Re: RaftElections> FollowerState<Re> {
    pub fn new(state: RaftState<Re>, metrics: Option<Arc<dyn FollowerMetrics>>) -> FollowerState<Re> {
        let (suppression, _) = watch::channel(0);

        FollowerState {
            state,
            signals: Arc::new(TrackingSignals {
                refresh: Notify::new(),
                suppression,
                timed_out: AtomicBool::new(false),
            }),
            tracker_cancellation: CancellationToken::new(),
            tracker: None,
            metrics,
        }
    }

    /// Starts the heartbeat timeout tracking. Nothing is tracked if `token` is
    /// already canceled.
    pub fn start_serving(&mut self, timeout: Duration, token: &CancellationToken) {
        if token.is_cancelled() {
            self.tracker_cancellation.cancel();
            self.tracker = None;
            return;
        }

        self.signals.timed_out.store(false, Ordering::Release);
        self.tracker = Some(tokio::spawn(track(
            self.state.clone(),
            timeout,
            self.signals.clone(),
            token.clone(),
            self.tracker_cancellation.clone(),
        )));
    }

    /// Restarts the heartbeat timeout window.
    pub fn refresh(&self) {
        refresh_window(&self.signals, &self.metrics);
    }

    /// Refresh entry point which does not borrow the follower.
    pub fn heartbeat_sink(&self) -> HeartbeatSink {
        HeartbeatSink {
            signals: self.signals.clone(),
            metrics: self.metrics.clone(),
        }
    }

    /// True if tracking stopped because the heartbeat timeout elapsed.
    pub fn is_expired(&self) -> bool {
        self.signals.timed_out.load(Ordering::Acquire)
    }

    /// Pauses the timeout until the returned scope is dropped.
    pub fn suppress_transition(&self) -> TransitionSuppressionScope {
        TransitionSuppressionScope::new(Some(self.signals.clone()))
    }

    pub async fn dispose(mut self) {
        self.state.begin_dispose();
        self.tracker_cancellation.cancel();

        if let Some(tracker) = self.tracker.take() {
            match tracker.await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => error!("Follower state exited with error: {}", err),
                Err(err) => error!("Follower state tracker failed: {}", err),
            }
        }
    }
}

impl<Re: RaftElections> Drop for FollowerState<Re> {
    fn drop(&mut self) {
        self.tracker_cancellation.cancel();
    }
}

impl<Re: RaftElections> std::fmt::Debug for FollowerState<Re> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FollowerState")
            .field("generation", &self.state.generation())
            .field("serving", &self.tracker.is_some())
            .field("expired", &self.is_expired())
            .finish()
    }
}

fn refresh_window(signals: &TrackingSignals, metrics: &Option<Arc<dyn FollowerMetrics>>) {
    trace!("Heartbeat timeout reset");
    signals.refresh.notify_one();

    if let Some(metrics) = metrics {
        metrics.report_heartbeat();
    }
}

/// Detached heartbeat handle of a follower. Refreshing it after the follower was
/// disposed has no effect on the timeout.
#[derive(Clone)]
pub struct HeartbeatSink {
    signals: Arc<TrackingSignals>,
    metrics: Option<Arc<dyn FollowerMetrics>>,
}

impl HeartbeatSink {
    pub fn refresh(&self) {
        refresh_window(&self.signals, &self.metrics);
    }
}

impl std::fmt::Debug for HeartbeatSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeartbeatSink")
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

async fn track<Re: RaftElections>(
    state: RaftState<Re>,
    timeout: Duration,
    signals: Arc<TrackingSignals>,
    token: CancellationToken,
    tracker_cancellation: CancellationToken,
) -> Result<()> {
    let mut suppression = signals.suppression.subscribe();

    loop {
        let refreshed = tokio::select! {
            _ = cancelled_any(&token, &tracker_cancellation) => return Ok(()),
            result = tokio::time::timeout(timeout, signals.refresh.notified()) => result.is_ok(),
        };

        let suppressed = *suppression.borrow() > 0;
        if !refreshed && !suppressed {
            break;
        }

        // parks here while a suppression scope is alive, then the window restarts
        tokio::select! {
            _ = cancelled_any(&token, &tracker_cancellation) => return Ok(()),
            opened = async { suppression.wait_for(|scopes| *scopes == 0).await.is_ok() } => {
                if !opened {
                    return Err(RaftError::new(
                        ErrorKind::Internal,
                        "Suppression gate is gone".to_string(),
                        String::new(),
                    ));
                }
            }
        }
    }

    signals.timed_out.store(true, Ordering::Release);
    info!("Leader heartbeat timeout of {:?} elapsed. Starting new election", timeout);

    state.move_to_candidate_state();
    Ok(())
}

/// Keeps the follower timeout paused while alive, for example during a long
/// local operation which would otherwise miss heartbeats.
#[must_use]
pub struct TransitionSuppressionScope {
    signals: Option<Arc<TrackingSignals>>,
}

impl TransitionSuppressionScope {
    fn new(signals: Option<Arc<TrackingSignals>>) -> TransitionSuppressionScope {
        if let Some(signals) = &signals {
            signals.suspend_tracking();
        }

        TransitionSuppressionScope { signals }
    }

    /// Scope for a node which is not a follower: nothing to suppress.
    pub fn empty() -> TransitionSuppressionScope {
        TransitionSuppressionScope::new(None)
    }
}

impl Drop for TransitionSuppressionScope {
    fn drop(&mut self) {
        if let Some(signals) = self.signals.take() {
            signals.resume_tracking();
        }
    }
}

impl std::fmt::Debug for TransitionSuppressionScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionSuppressionScope")
            .field("active", &self.signals.is_some())
            .finish()
    }
}
