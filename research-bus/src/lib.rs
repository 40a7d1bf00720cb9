#![deny(missing_docs)]
//! In-process implementation of [`layer0::EventBus`].
//!
//! `LocalEventBus` fans events out to subscribers over bounded
//! `tokio::sync::mpsc` channels. Delivery is best-effort: a subscriber whose
//! channel is full silently drops that event rather than back-pressuring the
//! publisher — the bus is a coordination/telemetry fabric, not a durable
//! queue.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use layer0::{Event, EventBus, EventSubscription, EventType};
use tokio::sync::mpsc;

/// Default per-subscriber channel capacity.
pub const DEFAULT_CAPACITY: usize = 256;

struct Subscriber {
    types: HashSet<EventType>,
    sender: mpsc::Sender<Event>,
}

/// A process-local, typed pub/sub hub over [`EventType`].
pub struct LocalEventBus {
    capacity: usize,
    subscribers: Mutex<Vec<Subscriber>>,
    closed: AtomicBool,
}

impl LocalEventBus {
    /// Create a bus whose subscriber channels each buffer [`DEFAULT_CAPACITY`] events.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a bus whose subscriber channels each buffer `capacity` events.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { capacity, subscribers: Mutex::new(Vec::new()), closed: AtomicBool::new(false) }
    }
}

impl Default for LocalEventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// A live subscription returned by [`LocalEventBus::subscribe`].
struct LocalSubscription {
    receiver: mpsc::Receiver<Event>,
}

#[async_trait]
impl EventSubscription for LocalSubscription {
    async fn recv(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }
}

#[async_trait]
impl EventBus for LocalEventBus {
    async fn subscribe(&self, types: &[EventType]) -> Box<dyn EventSubscription> {
        let (sender, receiver) = mpsc::channel(self.capacity);
        if !self.closed.load(Ordering::Acquire) {
            let mut subscribers = self.subscribers.lock().unwrap();
            subscribers.push(Subscriber { types: types.iter().copied().collect(), sender });
        }
        Box::new(LocalSubscription { receiver })
    }

    fn publish(&self, event: Event) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        let subscribers = self.subscribers.lock().unwrap();
        let event_type = event.event_type();
        for subscriber in
            subscribers.iter().filter(|s| s.types.is_empty() || s.types.contains(&event_type))
        {
            // Non-blocking: a full or closed channel silently drops this event
            // for that subscriber only.
            let _ = subscriber.sender.try_send(event.clone());
        }
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.subscribers.lock().unwrap().clear();
    }
}
