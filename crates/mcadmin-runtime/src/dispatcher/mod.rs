//! Fan-out of server events to any number of live observers.
//!
//! Producers push into one unbounded queue through an [`EventPublisher`] and
//! never block. A single fan-out task drains that queue, copies every event
//! into each matching subscriber queue (dropping the subscriber's oldest
//! item when it is full) and keeps a short per-topic scrollback buffer that
//! new subscribers can ask to have replayed.

mod queue;

pub use queue::Subscription;

use mcadmin_core::{
    DispatcherSettings, ServerEvent, ServerEventSink, SettingsError, Topic,
    validate_dispatcher_settings,
};
use queue::SubscriberQueue;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::DispatcherError;

/// Producer handle for the dispatcher queue.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    tx: mpsc::UnboundedSender<ServerEvent>,
}

impl ServerEventSink for EventPublisher {
    fn publish(&self, event: ServerEvent) {
        // Only fails once the dispatcher itself is gone.
        if self.tx.send(event).is_err() {
            debug!("Event dropped: dispatcher is gone");
        }
    }
}

#[derive(Debug)]
struct Subscriber {
    topic: Option<Topic>,
    queue: Arc<SubscriberQueue>,
}

#[derive(Debug, Default)]
struct DispatcherState {
    next_id: u64,
    subscribers: HashMap<u64, Subscriber>,
    buffers: HashMap<Topic, VecDeque<ServerEvent>>,
}

enum Worker {
    Idle(mpsc::UnboundedReceiver<ServerEvent>),
    Running {
        cancel: CancellationToken,
        handle: JoinHandle<mpsc::UnboundedReceiver<ServerEvent>>,
    },
    /// The fan-out task panicked and took the receiver with it.
    Lost,
}

/// Topic-aware fan-out dispatcher with scrollback.
pub struct EventDispatcher {
    settings: DispatcherSettings,
    publisher: EventPublisher,
    state: Arc<Mutex<DispatcherState>>,
    worker: tokio::sync::Mutex<Worker>,
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("settings", &self.settings)
            .field("subscribers", &self.subscriber_count())
            .finish_non_exhaustive()
    }
}

impl EventDispatcher {
    pub fn new(settings: DispatcherSettings) -> Result<Self, DispatcherError> {
        validate_dispatcher_settings(&settings).map_err(|e| match e {
            SettingsError::BufferLargerThanQueue {
                buffer_size,
                capacity,
            } => DispatcherError::InvalidBufferSize {
                buffer_size,
                capacity,
            },
            _ => DispatcherError::ZeroCapacity,
        })?;

        let (tx, rx) = mpsc::unbounded_channel();
        Ok(Self {
            settings,
            publisher: EventPublisher { tx },
            state: Arc::new(Mutex::new(DispatcherState::default())),
            worker: tokio::sync::Mutex::new(Worker::Idle(rx)),
        })
    }

    pub const fn settings(&self) -> DispatcherSettings {
        self.settings
    }

    /// Handle for producers. Cheap to clone.
    pub fn publisher(&self) -> EventPublisher {
        self.publisher.clone()
    }

    /// Register a subscriber.
    ///
    /// `topic = None` receives every topic and gets no scrollback. Otherwise
    /// the last `scrollback` buffered events of that topic are queued before
    /// any live event, atomically with registration.
    pub fn subscribe(
        &self,
        topic: Option<Topic>,
        scrollback: usize,
    ) -> Result<Subscription, DispatcherError> {
        if scrollback > self.settings.buffer_size {
            return Err(DispatcherError::ScrollbackTooLarge {
                requested: scrollback,
                buffer_size: self.settings.buffer_size,
            });
        }

        let queue = Arc::new(SubscriberQueue::new(self.settings.subscriber_capacity));

        let mut state = self.lock_state();
        let id = state.next_id;
        state.next_id += 1;

        if let Some(buffer) = topic.and_then(|t| state.buffers.get(&t)) {
            let skip = buffer.len().saturating_sub(scrollback);
            for item in buffer.iter().skip(skip) {
                queue.push(item.clone());
            }
        }

        state.subscribers.insert(
            id,
            Subscriber {
                topic,
                queue: Arc::clone(&queue),
            },
        );
        debug!(
            subscriber = id,
            topic = ?topic,
            total = state.subscribers.len(),
            "New subscriber added"
        );

        Ok(Subscription::new(id, topic, queue))
    }

    /// Remove a subscriber and close its queue. Unknown handles are ignored.
    pub fn unsubscribe(&self, subscription: &Subscription) {
        let mut state = self.lock_state();
        let Some(subscriber) = state.subscribers.remove(&subscription.id()) else {
            warn!(subscriber = subscription.id(), "Attempted to unsubscribe a non-subscriber");
            return;
        };
        subscriber.queue.close();
        debug!(total = state.subscribers.len(), "Subscriber removed");
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock_state().subscribers.len()
    }

    /// Spawn the fan-out task. No-op when already running.
    pub async fn start(&self) {
        let mut worker = self.worker.lock().await;
        let rx = match std::mem::replace(&mut *worker, Worker::Lost) {
            Worker::Idle(rx) => rx,
            running @ Worker::Running { .. } => {
                *worker = running;
                return;
            }
            Worker::Lost => {
                warn!("Cannot start dispatcher: fan-out task was lost");
                return;
            }
        };

        info!("Starting event dispatcher");
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(fan_out_loop(
            rx,
            Arc::clone(&self.state),
            self.settings.buffer_size,
            cancel.clone(),
        ));
        *worker = Worker::Running { cancel, handle };
    }

    /// Stop the fan-out task, drop every subscriber and close their queues.
    ///
    /// Events published while stopped stay queued and are delivered after
    /// the next [`start`](Self::start).
    pub async fn stop(&self) {
        let mut worker = self.worker.lock().await;
        if !matches!(*worker, Worker::Running { .. }) {
            return;
        }
        let Worker::Running { cancel, handle } = std::mem::replace(&mut *worker, Worker::Lost)
        else {
            return;
        };

        info!("Stopping event dispatcher");
        cancel.cancel();
        match handle.await {
            Ok(rx) => *worker = Worker::Idle(rx),
            Err(e) => warn!(error = %e, "Fan-out task ended abnormally"),
        }
        drop(worker);

        let mut state = self.lock_state();
        for (_, subscriber) in state.subscribers.drain() {
            subscriber.queue.close();
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, DispatcherState> {
        lock(&self.state)
    }
}

fn lock(state: &Mutex<DispatcherState>) -> MutexGuard<'_, DispatcherState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn fan_out_loop(
    mut rx: mpsc::UnboundedReceiver<ServerEvent>,
    state: Arc<Mutex<DispatcherState>>,
    buffer_size: usize,
    cancel: CancellationToken,
) -> mpsc::UnboundedReceiver<ServerEvent> {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            event = rx.recv() => match event {
                Some(event) => fan_out(&mut lock(&state), event, buffer_size),
                None => break,
            },
        }
    }
    debug!("Fan-out task exiting");
    rx
}

/// Deliver one event to matching subscribers, then record it for scrollback.
fn fan_out(state: &mut DispatcherState, event: ServerEvent, buffer_size: usize) {
    let topic = event.topic();

    for (id, subscriber) in &state.subscribers {
        if subscriber.topic.is_some_and(|t| t != topic) {
            continue;
        }
        if subscriber.queue.push(event.clone()) {
            debug!(subscriber = id, "Subscriber queue full; dropped oldest event");
        }
    }

    if buffer_size == 0 {
        return;
    }
    let buffer = state.buffers.entry(topic).or_default();
    if buffer.len() >= buffer_size {
        buffer.pop_front();
    }
    buffer.push_back(event);
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcadmin_core::StatsSnapshot;

    fn dispatcher(buffer_size: usize, subscriber_capacity: usize) -> EventDispatcher {
        EventDispatcher::new(DispatcherSettings {
            buffer_size,
            subscriber_capacity,
        })
        .unwrap()
    }

    fn log(n: usize) -> ServerEvent {
        ServerEvent::log(format!("line {n}"))
    }

    fn feed(d: &EventDispatcher, events: impl IntoIterator<Item = ServerEvent>) {
        let mut state = d.lock_state();
        for event in events {
            fan_out(&mut state, event, d.settings.buffer_size);
        }
    }

    #[test]
    fn test_buffer_larger_than_queue_is_rejected() {
        let err = EventDispatcher::new(DispatcherSettings {
            buffer_size: 10,
            subscriber_capacity: 5,
        })
        .unwrap_err();
        assert_eq!(
            err,
            DispatcherError::InvalidBufferSize {
                buffer_size: 10,
                capacity: 5
            }
        );
    }

    #[test]
    fn test_scrollback_replays_most_recent() {
        let d = dispatcher(3, 10);
        feed(&d, (1..=5).map(log));

        let mut sub = d.subscribe(Some(Topic::Logs), 2).unwrap();
        assert_eq!(sub.try_recv(), Some(log(4)));
        assert_eq!(sub.try_recv(), Some(log(5)));
        assert_eq!(sub.try_recv(), None);
    }

    #[test]
    fn test_scrollback_larger_than_buffer_is_rejected() {
        let d = dispatcher(3, 10);
        let err = d.subscribe(Some(Topic::Logs), 4).unwrap_err();
        assert!(matches!(err, DispatcherError::ScrollbackTooLarge { .. }));
        assert_eq!(d.subscriber_count(), 0);
    }

    #[test]
    fn test_topic_filter() {
        let d = dispatcher(5, 10);
        let mut logs = d.subscribe(Some(Topic::Logs), 0).unwrap();
        let mut stats = d.subscribe(Some(Topic::Stats), 0).unwrap();
        let mut all = d.subscribe(None, 0).unwrap();

        let snapshot = ServerEvent::Stats(StatsSnapshot::Starting);
        feed(&d, [log(1), snapshot.clone()]);

        assert_eq!(logs.try_recv(), Some(log(1)));
        assert_eq!(logs.try_recv(), None);
        assert_eq!(stats.try_recv(), Some(snapshot.clone()));
        assert_eq!(stats.try_recv(), None);
        assert_eq!(all.try_recv(), Some(log(1)));
        assert_eq!(all.try_recv(), Some(snapshot));
    }

    #[test]
    fn test_all_topics_subscriber_gets_no_scrollback() {
        let d = dispatcher(5, 10);
        feed(&d, [log(1)]);
        let mut all = d.subscribe(None, 5).unwrap();
        assert_eq!(all.try_recv(), None);
    }

    #[test]
    fn test_slow_subscriber_drops_oldest() {
        let d = dispatcher(2, 3);
        let mut sub = d.subscribe(Some(Topic::Logs), 0).unwrap();
        feed(&d, (1..=5).map(log));

        let received: Vec<_> = std::iter::from_fn(|| sub.try_recv()).collect();
        assert_eq!(received, vec![log(3), log(4), log(5)]);
    }

    #[test]
    fn test_unsubscribe_twice_is_harmless() {
        let d = dispatcher(2, 3);
        let sub = d.subscribe(Some(Topic::Logs), 0).unwrap();
        d.unsubscribe(&sub);
        d.unsubscribe(&sub);
        assert!(sub.is_closed());
        assert_eq!(d.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_live_delivery_through_publisher() {
        let d = dispatcher(5, 10);
        d.start().await;
        let mut sub = d.subscribe(Some(Topic::Logs), 0).unwrap();

        let publisher = d.publisher();
        for n in 1..=3 {
            publisher.publish(log(n));
        }

        for n in 1..=3 {
            assert_eq!(sub.recv().await, Some(log(n)));
        }
        d.stop().await;
    }

    #[tokio::test]
    async fn test_stop_closes_subscribers_and_restart_resumes() {
        let d = dispatcher(5, 10);
        d.start().await;
        let mut sub = d.subscribe(Some(Topic::Logs), 0).unwrap();

        d.stop().await;
        assert_eq!(sub.recv().await, None);
        assert_eq!(d.subscriber_count(), 0);

        // Published while stopped, delivered after restart.
        d.publisher().publish(log(7));
        let mut late = d.subscribe(Some(Topic::Logs), 0).unwrap();
        d.start().await;
        d.publisher().publish(log(8));

        assert_eq!(late.recv().await, Some(log(7)));
        assert_eq!(late.recv().await, Some(log(8)));
        d.stop().await;
    }
}
