//! Domain events and the synchronous event bus.
//!
//! Events decouple domain logic from telemetry and accounting. The event set
//! is closed ([`SimEvent`]); dispatch is keyed by [`EventKind`], so `emit`
//! with no subscribers costs a single map lookup. Handlers run synchronously
//! in subscription order — asynchronous handling would break determinism.
//!
//! Whether an event also produces energy-delta records is the
//! [`EnergyLedger`](crate::ledger::EnergyLedger)'s decision, not the bus's.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::entity::EntityHandle;

// ---------------------------------------------------------------------------
// SimEvent
// ---------------------------------------------------------------------------

/// A domain event emitted during a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    /// An agent consumed a food entity. Yields one positive energy delta.
    AteFood {
        entity: EntityHandle,
        food: EntityHandle,
        food_type: String,
        energy_gained: f64,
    },
    /// An agent moved. Yields one negative energy delta for the cost.
    Moved {
        entity: EntityHandle,
        distance: f64,
        energy_cost: f64,
        speed: f64,
    },
    /// Telemetry broadcast of energy already applied by the emitting
    /// component. Yields no delta — the ledger returning one here would
    /// double-account.
    EnergyBurned {
        entity: EntityHandle,
        amount: f64,
        reason: String,
    },
    /// An agent finished a proximity contest. Yields one signed delta.
    GamePlayed {
        entity: EntityHandle,
        opponent_type: String,
        energy_change: f64,
        won: bool,
    },
    /// Telemetry: an entity died. Yields no delta.
    EntityDied {
        entity: EntityHandle,
        cause: String,
    },
    /// Telemetry: a spawn was declined by a capacity policy. Not an error.
    SpawnRejected {
        entity_type: String,
        reason: String,
    },
}

/// Discriminant of [`SimEvent`], used as the subscription key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    AteFood,
    Moved,
    EnergyBurned,
    GamePlayed,
    EntityDied,
    SpawnRejected,
}

impl SimEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            SimEvent::AteFood { .. } => EventKind::AteFood,
            SimEvent::Moved { .. } => EventKind::Moved,
            SimEvent::EnergyBurned { .. } => EventKind::EnergyBurned,
            SimEvent::GamePlayed { .. } => EventKind::GamePlayed,
            SimEvent::EntityDied { .. } => EventKind::EntityDied,
            SimEvent::SpawnRejected { .. } => EventKind::SpawnRejected,
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Opaque token returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId {
    kind: EventKind,
    id: u64,
}

type Handler = Box<dyn FnMut(&SimEvent)>;

/// Synchronous pub/sub for domain events.
pub struct EventBus {
    handlers: HashMap<EventKind, Vec<(u64, Handler)>>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            next_id: 0,
        }
    }

    /// Dispatch an event to its kind's handlers in subscription order.
    /// With no subscribers this is a single map lookup.
    pub fn emit(&mut self, event: &SimEvent) {
        if let Some(handlers) = self.handlers.get_mut(&event.kind()) {
            for (_, handler) in handlers.iter_mut() {
                handler(event);
            }
        }
    }

    /// Register a handler for one event kind.
    pub fn subscribe(
        &mut self,
        kind: EventKind,
        handler: impl FnMut(&SimEvent) + 'static,
    ) -> SubscriptionId {
        let id = self.next_id;
        self.next_id += 1;
        self.handlers
            .entry(kind)
            .or_default()
            .push((id, Box::new(handler)));
        SubscriptionId { kind, id }
    }

    /// Remove a previously registered handler. Returns whether it was found.
    pub fn unsubscribe(&mut self, token: SubscriptionId) -> bool {
        let Some(handlers) = self.handlers.get_mut(&token.kind) else {
            return false;
        };
        let before = handlers.len();
        handlers.retain(|(id, _)| *id != token.id);
        handlers.len() != before
    }

    /// Hot-path gate: whether anyone listens for `kind`.
    pub fn has_subscribers(&self, kind: EventKind) -> bool {
        self.handlers.get(&kind).map_or(false, |h| !h.is_empty())
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.handlers.get(&kind).map_or(0, |h| h.len())
    }

    /// Drop every handler. Useful between simulations in tests.
    pub fn clear_subscribers(&mut self) {
        self.handlers.clear();
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn died(index: u32) -> SimEvent {
        SimEvent::EntityDied {
            entity: EntityHandle::new(index, 0),
            cause: "starvation".to_owned(),
        }
    }

    #[test]
    fn emit_reaches_subscriber() {
        let mut bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        bus.subscribe(EventKind::EntityDied, move |e| {
            sink.borrow_mut().push(e.clone());
        });

        bus.emit(&died(1));
        bus.emit(&died(2));
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn emit_without_subscribers_is_noop() {
        let mut bus = EventBus::new();
        bus.emit(&died(1)); // must not panic or allocate handler state
        assert!(!bus.has_subscribers(EventKind::EntityDied));
    }

    #[test]
    fn handlers_run_in_subscription_order() {
        let mut bus = EventBus::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let sink = Rc::clone(&order);
            bus.subscribe(EventKind::EntityDied, move |_| {
                sink.borrow_mut().push(tag);
            });
        }
        bus.emit(&died(1));
        assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn unsubscribe_removes_handler() {
        let mut bus = EventBus::new();
        let count = Rc::new(RefCell::new(0u32));
        let sink = Rc::clone(&count);
        let token = bus.subscribe(EventKind::EntityDied, move |_| {
            *sink.borrow_mut() += 1;
        });

        bus.emit(&died(1));
        assert!(bus.unsubscribe(token));
        bus.emit(&died(2));
        assert_eq!(*count.borrow(), 1);
        assert!(!bus.unsubscribe(token), "double unsubscribe returns false");
    }

    #[test]
    fn subscription_is_per_kind() {
        let mut bus = EventBus::new();
        let count = Rc::new(RefCell::new(0u32));
        let sink = Rc::clone(&count);
        bus.subscribe(EventKind::AteFood, move |_| {
            *sink.borrow_mut() += 1;
        });

        bus.emit(&died(1));
        assert_eq!(*count.borrow(), 0);
        assert_eq!(bus.subscriber_count(EventKind::AteFood), 1);
        assert_eq!(bus.subscriber_count(EventKind::EntityDied), 0);
    }

    #[test]
    fn event_kind_matches_variant() {
        let e = SimEvent::SpawnRejected {
            entity_type: "fish".to_owned(),
            reason: "at capacity".to_owned(),
        };
        assert_eq!(e.kind(), EventKind::SpawnRejected);
    }
}
