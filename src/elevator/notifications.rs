/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::{Direction, ElevatorState, SignalKind};

/***************************************/
/*       Public data structures        */
/***************************************/

/// A single attribute change published by the controller or the signal registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    StateChanged { old: ElevatorState, new: ElevatorState },
    DirectionChanged { old: Direction, new: Direction },
    FloorChanged { old: i32, new: i32 },
    SignalChanged { kind: SignalKind, floor: i32, old: bool, new: bool },
}

impl Notification {
    /// Name of the attribute that changed, e.g. `state` or `callDown3`.
    pub fn property_name(&self) -> String {
        match self {
            Notification::StateChanged { .. } => "state".to_string(),
            Notification::DirectionChanged { .. } => "direction".to_string(),
            Notification::FloorChanged { .. } => "currentFloor".to_string(),
            Notification::SignalChanged { kind, floor, .. } => kind.property_name(*floor),
        }
    }
}

pub type Listener = Arc<dyn Fn(&Notification) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

// Where a subscription delivers. A channel whose receiver is gone is dropped from the bus.
#[derive(Clone)]
enum Target {
    Listener(Listener),
    Channel(cbc::Sender<Notification>),
}

struct Subscription {
    id: SubscriptionId,
    property: Option<String>,
    target: Target,
}

/**
 * Synchronous publish/subscribe fan-out for attribute changes.
 *
 * Listeners run on the thread that performed the change, in subscription order. They must
 * return quickly and must not call back into the controller that published the change.
 */
pub struct NotificationBus {
    subscriptions: Mutex<Vec<Subscription>>,
    next_id: AtomicU64,
}

impl NotificationBus {
    pub fn new() -> NotificationBus {
        NotificationBus {
            subscriptions: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Registers a listener for every notification.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.add(None, Target::Listener(Arc::new(listener)))
    }

    /// Registers a listener that only sees changes of the attribute named `property`.
    pub fn subscribe_to<F>(&self, property: &str, listener: F) -> SubscriptionId
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.add(Some(property.to_string()), Target::Listener(Arc::new(listener)))
    }

    /// Forwards every notification into a channel, for consumers living on another thread.
    ///
    /// Dropping the receiver ends the subscription at the next publish.
    pub fn subscribe_channel(&self) -> (SubscriptionId, cbc::Receiver<Notification>) {
        let (notification_tx, notification_rx) = cbc::unbounded::<Notification>();
        let id = self.add(None, Target::Channel(notification_tx));
        (id, notification_rx)
    }

    /// Returns `false` when `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self.lock();
        let before = subscriptions.len();
        subscriptions.retain(|subscription| subscription.id != id);
        subscriptions.len() != before
    }

    pub fn publish(&self, notification: Notification) {
        // Snapshot the listeners so a listener may (un)subscribe without deadlocking
        let targets: Vec<(SubscriptionId, Target)> = {
            let property = notification.property_name();
            self.lock()
                .iter()
                .filter(|subscription| match &subscription.property {
                    Some(wanted) => *wanted == property,
                    None => true,
                })
                .map(|subscription| (subscription.id, subscription.target.clone()))
                .collect()
        };

        let mut disconnected = Vec::new();
        for (id, target) in targets {
            match target {
                Target::Listener(listener) => listener(&notification),
                Target::Channel(notification_tx) => {
                    if notification_tx.send(notification.clone()).is_err() {
                        disconnected.push(id);
                    }
                }
            }
        }

        if !disconnected.is_empty() {
            debug!("Dropping {} subscription(s) with a closed channel", disconnected.len());
            self.lock()
                .retain(|subscription| !disconnected.contains(&subscription.id));
        }
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn add(&self, property: Option<String>, target: Target) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push(Subscription {
            id,
            property,
            target,
        });
        id
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Subscription>> {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        NotificationBus::new()
    }
}

/***************************************/
/*             Unit tests              */
/***************************************/
