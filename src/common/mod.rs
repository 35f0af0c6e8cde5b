use std::time::Duration;

use tokio_util::sync::CancellationToken;

pub mod completion_pipe;

/// Cancels `token` once `delay` elapses, unless it gets canceled earlier.
pub(crate) fn cancel_after(token: &CancellationToken, delay: Duration) {
    let token = token.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {},
            _ = tokio::time::sleep(delay) => token.cancel(),
        }
    });
}

/// Resolves when either token gets canceled.
pub(crate) async fn cancelled_any(first: &CancellationToken, second: &CancellationToken) {
    tokio::select! {
        _ = first.cancelled() => {},
        _ = second.cancelled() => {},
    }
}
