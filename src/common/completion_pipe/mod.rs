//! Multi-producer, single-consumer aggregation of asynchronous operations.
//!
//! Every operation registered with [`CompletionPipe::add`] runs as an independent task.
//! Its output becomes visible to the consumer the moment it completes, so the consumer
//! observes results in completion order rather than in submission order.

mod wait_queue;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use crossbeam_channel::{Receiver, Sender};
use futures::Stream;
use parking_lot::Mutex;
use tokio::task::AbortHandle;

use self::wait_queue::{SignalHandle, WaitQueue};
use crate::errors::{new_err, ErrorKind, Result};

pub struct CompletionPipe<T> {
    shared: Arc<Shared<T>>,
}

struct Shared<T> {
    ready_tx: Sender<T>,
    ready_rx: Receiver<T>,
    state: Mutex<PipeState>,
}

struct PipeState {
    waiters: WaitQueue,
    producers: Vec<AbortHandle>,
    pending: usize,
    completed: bool,
    torn_down: bool,
}

impl<T: Send + 'static> CompletionPipe<T> {
    pub fn new() -> CompletionPipe<T> {
        CompletionPipe::with_capacity(0)
    }

    /// Creates a pipe expecting about `capacity` producers.
    pub fn with_capacity(capacity: usize) -> CompletionPipe<T> {
        let (ready_tx, ready_rx) = crossbeam_channel::unbounded();

        CompletionPipe {
            shared: Arc::new(Shared {
                ready_tx,
                ready_rx,
                state: Mutex::new(PipeState {
                    waiters: WaitQueue::with_capacity(1),
                    producers: Vec::with_capacity(capacity),
                    pending: 0,
                    completed: false,
                    torn_down: false,
                }),
            }),
        }
    }

    /// Registers a producer. Must be called from within a tokio runtime.
    pub fn add<F>(&self, operation: F) -> Result<()>
    where
        F: Future<Output = T> + Send + 'static,
    {
        let mut state = self.shared.state.lock();
        if state.completed || state.torn_down {
            return new_err(
                ErrorKind::InvalidOperation,
                "Cannot add a producer to a completed pipe".to_string(),
                String::new(),
            );
        }

        state.pending += 1;
        let shared = self.shared.clone();
        let producer = tokio::spawn(async move {
            let result = operation.await;
            shared.deliver(result);
        });
        state.producers.push(producer.abort_handle());

        Ok(())
    }

    /// Marks the end of producers. Already added operations still deliver their results.
    pub fn complete(&self) {
        let mut state = self.shared.state.lock();
        if state.completed {
            return;
        }

        state.completed = true;
        if state.pending == 0 {
            state.waiters.drain_wait_queue(true);
        }
    }

    /// Tears the pipe down: pending producers are aborted, undelivered results are
    /// discarded and every suspended consumer observes the end of its stream.
    pub fn cancel(&self) {
        self.shared.tear_down();
    }

    /// Returns a new consumer over the delivered results.
    pub fn consumer(&self) -> Consumer<T> {
        Consumer {
            shared: self.shared.clone(),
            signal: None,
        }
    }
}

impl<T: Send + 'static> Default for CompletionPipe<T> {
    fn default() -> Self {
        CompletionPipe::new()
    }
}

impl<T> Drop for CompletionPipe<T> {
    fn drop(&mut self) {
        self.shared.tear_down();
    }
}

impl<T> std::fmt::Debug for CompletionPipe<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("CompletionPipe")
            .field("pending", &state.pending)
            .field("completed", &state.completed)
            .field("torn_down", &state.torn_down)
            .field("has_waiters", &!state.waiters.is_empty())
            .finish()
    }
}

impl<T> Shared<T> {
    fn deliver(&self, result: T) {
        if self.state.lock().torn_down {
            return;
        }

        // the receiver lives as long as `self`
        let _ = self.ready_tx.send(result);

        let mut state = self.state.lock();
        state.pending = state.pending.saturating_sub(1);
        if state.torn_down {
            return;
        }

        state.waiters.notify();
        if state.completed && state.pending == 0 {
            state.waiters.drain_wait_queue(true);
        }
    }

    fn tear_down(&self) {
        let mut state = self.state.lock();
        if state.torn_down {
            return;
        }

        state.torn_down = true;
        for producer in state.producers.drain(..) {
            producer.abort();
        }
        state.waiters.drain_wait_queue(false);
    }
}

/// Single-pass stream of results in completion order.
///
/// The stream ends when every producer of a completed pipe has delivered, or as soon
/// as the pipe is torn down.
pub struct Consumer<T> {
    shared: Arc<Shared<T>>,
    signal: Option<SignalHandle>,
}

impl<T> Stream for Consumer<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        let this = self.get_mut();
        let mut state = this.shared.state.lock();

        if let Some(signal) = this.signal {
            match state.waiters.poll_signal(signal, cx.waker()) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(_) => this.signal = None,
            }
        }

        if state.torn_down {
            return Poll::Ready(None);
        }

        if let Ok(item) = this.shared.ready_rx.try_recv() {
            return Poll::Ready(Some(item));
        }

        if state.completed && state.pending == 0 {
            return Poll::Ready(None);
        }

        this.signal = Some(state.waiters.enqueue_node(cx.waker().clone()));
        Poll::Pending
    }
}

impl<T> Drop for Consumer<T> {
    fn drop(&mut self) {
        if let Some(signal) = self.signal.take() {
            self.shared.state.lock().waiters.release(signal);
        }
    }
}

impl<T> std::fmt::Debug for Consumer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Consumer")
            .field("waiting", &self.signal.is_some())
            .finish()
    }
}
