use std::mem;
use std::task::{Poll, Waker};

/// Handle of a pooled waiter node. Only the consumer that enqueued the node
/// holds it, so a node index is never reused while its handle is alive.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct SignalHandle(usize);

#[derive(Debug)]
enum SignalState {
    Waiting(Waker),
    Signaled(bool),
    Free,
}

#[derive(Debug)]
struct Signal {
    state: SignalState,
    previous: Option<usize>,
    next: Option<usize>,
    linked: bool,
}

impl Signal {
    fn new(waker: Waker) -> Signal {
        Signal {
            state: SignalState::Waiting(waker),
            previous: None,
            next: None,
            linked: false,
        }
    }
}

/// Doubly linked list of waiting consumers backed by an arena of reusable nodes.
///
/// A node leaves the list either when it gets signaled (`notify`, `drain_wait_queue`)
/// or when its consumer gives up waiting (`release`). It goes back to the pool exactly
/// once: when the consumer observes the signal or drops the handle.
#[derive(Debug, Default)]
pub(crate) struct WaitQueue {
    nodes: Vec<Signal>,
    pool: Vec<usize>,
    first: Option<usize>,
    last: Option<usize>,
}

impl WaitQueue {
    pub(crate) fn with_capacity(capacity: usize) -> WaitQueue {
        WaitQueue {
            nodes: Vec::with_capacity(capacity),
            pool: Vec::with_capacity(capacity),
            first: None,
            last: None,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.first.is_none()
    }

    pub(crate) fn enqueue_node(&mut self, waker: Waker) -> SignalHandle {
        let index = match self.pool.pop() {
            Some(index) => {
                self.nodes[index] = Signal::new(waker);
                index
            }
            None => {
                self.nodes.push(Signal::new(waker));
                self.nodes.len() - 1
            }
        };

        match self.last {
            None => {
                self.first = Some(index);
            }
            Some(last) => {
                self.nodes[last].next = Some(index);
                self.nodes[index].previous = Some(last);
            }
        }
        self.last = Some(index);
        self.nodes[index].linked = true;

        SignalHandle(index)
    }

    fn remove_node(&mut self, index: usize) {
        let previous = self.nodes[index].previous.take();
        let next = self.nodes[index].next.take();

        if self.first == Some(index) {
            self.first = next;
        }
        if self.last == Some(index) {
            self.last = previous;
        }

        if let Some(previous) = previous {
            self.nodes[previous].next = next;
        }
        if let Some(next) = next {
            self.nodes[next].previous = previous;
        }

        self.nodes[index].linked = false;
    }

    // Returns false when the node is no longer waiting for a signal.
    fn try_set_result(&mut self, index: usize, value: bool) -> bool {
        let node = &mut self.nodes[index];
        match mem::replace(&mut node.state, SignalState::Signaled(value)) {
            SignalState::Waiting(waker) => {
                waker.wake();
                true
            }
            previous => {
                node.state = previous;
                false
            }
        }
    }

    /// Signals the first waiter which still accepts a signal. Returns false if no
    /// waiter was woken.
    pub(crate) fn notify(&mut self) -> bool {
        let mut current = self.first;
        while let Some(index) = current {
            current = self.nodes[index].next;

            self.remove_node(index);
            if self.try_set_result(index, true) {
                return true;
            }
        }

        false
    }

    /// Unlinks every waiter and completes it with `value`.
    pub(crate) fn drain_wait_queue(&mut self, value: bool) {
        let mut current = self.first;
        while let Some(index) = current {
            current = self.nodes[index].next;

            self.remove_node(index);
            self.try_set_result(index, value);
        }

        self.first = None;
        self.last = None;
    }

    /// Checks the node state. A delivered signal is consumed and the node returns to the pool.
    pub(crate) fn poll_signal(&mut self, handle: SignalHandle, waker: &Waker) -> Poll<bool> {
        let node = &mut self.nodes[handle.0];
        match &mut node.state {
            SignalState::Signaled(value) => {
                let value = *value;
                self.release(handle);
                Poll::Ready(value)
            }
            SignalState::Waiting(current) => {
                if !current.will_wake(waker) {
                    *current = waker.clone();
                }
                Poll::Pending
            }
            SignalState::Free => Poll::Ready(false),
        }
    }

    pub(crate) fn release(&mut self, handle: SignalHandle) {
        let index = handle.0;
        if self.nodes[index].linked {
            self.remove_node(index);
        }

        if let SignalState::Free = self.nodes[index].state {
            return;
        }
        self.nodes[index].state = SignalState::Free;
        self.pool.push(index);
    }

    #[cfg(test)]
    fn allocated(&self) -> usize {
        self.nodes.len()
    }

    #[cfg(test)]
    fn linked_indices(&self) -> Vec<usize> {
        let mut result = Vec::new();
        let mut current = self.first;
        while let Some(index) = current {
            result.push(index);
            current = self.nodes[index].next;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::task::noop_waker;

    fn poll(queue: &mut WaitQueue, handle: SignalHandle) -> Poll<bool> {
        queue.poll_signal(handle, &noop_waker())
    }

    #[test]
    fn notify_signals_first_waiter_only() {
        let mut queue = WaitQueue::default();
        let first = queue.enqueue_node(noop_waker());
        let second = queue.enqueue_node(noop_waker());

        assert!(queue.notify());

        assert_eq!(Poll::Ready(true), poll(&mut queue, first));
        assert_eq!(Poll::Pending, poll(&mut queue, second));
        assert_eq!(vec![second.0], queue.linked_indices());
    }

    #[test]
    fn notify_on_empty_queue_reports_no_waiter() {
        let mut queue = WaitQueue::default();

        assert!(!queue.notify());
        assert!(queue.is_empty());
    }

    #[test]
    fn released_waiter_is_skipped() {
        let mut queue = WaitQueue::default();
        let first = queue.enqueue_node(noop_waker());
        let second = queue.enqueue_node(noop_waker());
        let third = queue.enqueue_node(noop_waker());

        queue.release(second);
        assert_eq!(vec![first.0, third.0], queue.linked_indices());

        assert!(queue.notify());
        assert!(queue.notify());
        assert!(!queue.notify());

        assert_eq!(Poll::Ready(true), poll(&mut queue, first));
        assert_eq!(Poll::Ready(true), poll(&mut queue, third));
    }

    #[test]
    fn drain_abandons_every_waiter() {
        let mut queue = WaitQueue::default();
        let handles: Vec<_> = (0..4).map(|_| queue.enqueue_node(noop_waker())).collect();

        queue.drain_wait_queue(false);

        assert!(queue.is_empty());
        for handle in handles {
            assert_eq!(Poll::Ready(false), poll(&mut queue, handle));
        }
    }

    #[test]
    fn consumed_nodes_are_reused() {
        let mut queue = WaitQueue::with_capacity(2);

        for _ in 0..10 {
            let handle = queue.enqueue_node(noop_waker());
            queue.notify();
            assert_eq!(Poll::Ready(true), poll(&mut queue, handle));
        }

        assert_eq!(1, queue.allocated());
    }

    #[test]
    fn head_and_tail_follow_removals() {
        let mut queue = WaitQueue::default();
        let first = queue.enqueue_node(noop_waker());
        let second = queue.enqueue_node(noop_waker());

        queue.release(second);
        assert_eq!(vec![first.0], queue.linked_indices());

        queue.release(first);
        assert!(queue.is_empty());

        let third = queue.enqueue_node(noop_waker());
        assert_eq!(vec![third.0], queue.linked_indices());
    }
}
