//! Bounded drop-oldest subscriber queues.

use mcadmin_core::{ServerEvent, Topic};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct QueueState {
    items: VecDeque<ServerEvent>,
    closed: bool,
}

/// Queue shared between the dispatcher (producer) and one [`Subscription`].
#[derive(Debug)]
pub(crate) struct SubscriberQueue {
    state: Mutex<QueueState>,
    notify: Notify,
    capacity: usize,
}

impl SubscriberQueue {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            notify: Notify::new(),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueue without blocking. When full, exactly the oldest item is
    /// dropped to make room. Returns `true` if an item was dropped.
    pub(crate) fn push(&self, item: ServerEvent) -> bool {
        let mut state = self.lock();
        if state.closed {
            return false;
        }

        let dropped = state.items.len() >= self.capacity && state.items.pop_front().is_some();
        state.items.push_back(item);
        drop(state);

        self.notify.notify_one();
        dropped
    }

    /// Mark the queue closed. Buffered items are abandoned.
    pub(crate) fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        state.items.clear();
        drop(state);

        self.notify.notify_one();
    }

    fn try_pop(&self) -> Result<ServerEvent, bool> {
        let mut state = self.lock();
        state.items.pop_front().ok_or(state.closed)
    }

    fn len(&self) -> usize {
        self.lock().items.len()
    }
}

/// Receiving end of a dispatcher subscription.
///
/// Dropping it does not unregister it; call
/// [`EventDispatcher::unsubscribe`](super::EventDispatcher::unsubscribe).
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    topic: Option<Topic>,
    queue: Arc<SubscriberQueue>,
}

impl Subscription {
    pub(crate) const fn new(id: u64, topic: Option<Topic>, queue: Arc<SubscriberQueue>) -> Self {
        Self { id, topic, queue }
    }

    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Topic filter; `None` receives every topic.
    pub const fn topic(&self) -> Option<Topic> {
        self.topic
    }

    /// Wait for the next event. Returns `None` once the dispatcher has
    /// closed this subscription.
    pub async fn recv(&mut self) -> Option<ServerEvent> {
        loop {
            match self.queue.try_pop() {
                Ok(item) => return Some(item),
                Err(true) => return None,
                Err(false) => self.queue.notify.notified().await,
            }
        }
    }

    /// Next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<ServerEvent> {
        self.queue.try_pop().ok()
    }

    /// Number of events waiting.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.queue.lock().closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(n: usize) -> ServerEvent {
        ServerEvent::log(format!("line {n}"))
    }

    #[test]
    fn test_full_queue_drops_oldest() {
        let queue = Arc::new(SubscriberQueue::new(2));
        let mut sub = Subscription::new(1, None, Arc::clone(&queue));

        assert!(!queue.push(log(1)));
        assert!(!queue.push(log(2)));
        assert!(queue.push(log(3)));

        assert_eq!(sub.len(), 2);
        assert_eq!(sub.try_recv(), Some(log(2)));
        assert_eq!(sub.try_recv(), Some(log(3)));
        assert_eq!(sub.try_recv(), None);
    }

    #[tokio::test]
    async fn test_recv_wakes_on_push_and_close() {
        let queue = Arc::new(SubscriberQueue::new(4));
        let mut sub = Subscription::new(1, Some(Topic::Logs), Arc::clone(&queue));

        let producer = Arc::clone(&queue);
        tokio::spawn(async move {
            producer.push(log(1));
            producer.close();
        });

        // The close may win the race and abandon the item.
        match sub.recv().await {
            Some(event) => {
                assert_eq!(event, log(1));
                assert_eq!(sub.recv().await, None);
            }
            None => assert!(sub.is_closed()),
        }
        assert!(!queue.push(log(2)));
    }
}
