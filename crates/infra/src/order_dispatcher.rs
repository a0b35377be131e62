//! Command execution pipeline for the `Order` aggregate.
//!
//! ```text
//! OrderCommand
//!   ↓
//! 1. Load the stored order (or an empty aggregate for placement)
//!   ↓
//! 2. Handle the command (pure decision, produces events)
//!   ↓
//! 3. Apply the events to the loaded copy
//!   ↓
//! 4. Save against the loaded version (Absent for a new order)
//!   ↓
//! 5. Publish the events on the bus
//! ```
//!
//! The orchestrator and the monitoring engine both change order status
//! through this dispatcher, so a race between them surfaces as a version
//! conflict instead of a lost update. A conflict is retried once against a
//! fresh copy; same-status changes are no-ops, which makes most races benign.

use thiserror::Error;
use tracing::{debug, warn};

use logiflow_agents::{OrderRepository, StoreError};
use logiflow_core::{Aggregate, AggregateRoot, DomainError, ExpectedVersion};
use logiflow_events::{Event, EventBus};
use logiflow_orders::{Order, OrderCommand, OrderEvent};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Optimistic concurrency failure (stale order version).
    #[error("concurrency conflict: {0}")]
    Concurrency(String),
    /// Domain validation failure (deterministic).
    #[error("validation failed: {0}")]
    Validation(String),
    /// Domain invariant failure, e.g. an illegal status transition.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
    #[error("order not found")]
    NotFound,
    #[error("store failure: {0}")]
    Store(StoreError),
}

impl From<StoreError> for DispatchError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict(msg) => DispatchError::Concurrency(msg),
            StoreError::NotFound(_) => DispatchError::NotFound,
            other => DispatchError::Store(other),
        }
    }
}

impl From<DomainError> for DispatchError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => DispatchError::Validation(msg),
            DomainError::InvariantViolation(msg) => DispatchError::InvariantViolation(msg),
            DomainError::Conflict(msg) => DispatchError::Concurrency(msg),
            DomainError::NotFound => DispatchError::NotFound,
            DomainError::InvalidId(msg) => DispatchError::Validation(msg),
        }
    }
}

#[derive(Debug)]
pub struct OrderDispatcher<R, B> {
    orders: R,
    bus: B,
}

impl<R, B> OrderDispatcher<R, B> {
    pub fn new(orders: R, bus: B) -> Self {
        Self { orders, bus }
    }

    pub fn orders(&self) -> &R {
        &self.orders
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }
}

impl<R, B> OrderDispatcher<R, B>
where
    R: OrderRepository,
    B: EventBus<OrderEvent>,
{
    /// Execute `command` and return the order as persisted.
    ///
    /// When the command decides no events (e.g. a status change to the
    /// current status) the stored order is returned unchanged.
    pub fn dispatch(&self, command: OrderCommand) -> Result<Order, DispatchError> {
        match self.try_dispatch(&command) {
            Err(DispatchError::Concurrency(msg)) if !matches!(command, OrderCommand::PlaceOrder(_)) => {
                debug!(order_id = %command.order_id(), conflict = %msg, "retrying order command after conflict");
                self.try_dispatch(&command)
            }
            other => other,
        }
    }

    fn try_dispatch(&self, command: &OrderCommand) -> Result<Order, DispatchError> {
        let order_id = command.order_id();

        // 1) Load
        let current = self
            .orders
            .get(order_id)?
            .unwrap_or_else(|| Order::empty(order_id));
        let expected = ExpectedVersion::of(current.version());

        // 2+3) Decide and evolve
        let mut next = current;
        let decided = next.execute(command)?;
        if decided.is_empty() {
            return Ok(next);
        }

        // 4) Persist
        self.orders.save(&next, expected)?;

        // 5) Publish (the change is already durable; a bus failure is logged only)
        for event in decided {
            let event_type = event.event_type();
            if let Err(e) = self.bus.publish(event) {
                warn!(order_id = %order_id, event_type, error = ?e, "failed to publish order event");
            }
        }

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Duration;
    use logiflow_core::OrderId;
    use logiflow_events::InMemoryEventBus;
    use logiflow_orders::{CancelOrder, ChangeStatus, OrderStatus, PlaceOrder};

    use crate::store::InMemoryOrderStore;
    use crate::test_support::test_time;

    type TestDispatcher = OrderDispatcher<Arc<InMemoryOrderStore>, Arc<InMemoryEventBus<OrderEvent>>>;

    fn setup() -> (TestDispatcher, Arc<InMemoryOrderStore>, Arc<InMemoryEventBus<OrderEvent>>) {
        let store = Arc::new(InMemoryOrderStore::new());
        let bus = Arc::new(InMemoryEventBus::new());
        (OrderDispatcher::new(store.clone(), bus.clone()), store, bus)
    }

    fn place(order_id: OrderId) -> OrderCommand {
        OrderCommand::PlaceOrder(PlaceOrder {
            order_id,
            client_id: "CLIENT-9".into(),
            client_name: "Dach & Co".into(),
            delivery_address: "Elbchaussee 1, Hamburg".into(),
            requested_delivery: test_time() + Duration::days(4),
            items: vec![],
            occurred_at: test_time(),
        })
    }

    fn change(order_id: OrderId, to: OrderStatus) -> OrderCommand {
        OrderCommand::ChangeStatus(ChangeStatus {
            order_id,
            to,
            note: None,
            occurred_at: test_time(),
        })
    }

    #[test]
    fn place_persists_and_publishes() {
        let (dispatcher, store, bus) = setup();
        let sub = bus.subscribe();
        let id = OrderId::new();

        let order = dispatcher.dispatch(place(id)).unwrap();
        assert_eq!(order.status(), OrderStatus::Received);
        assert_eq!(store.get(id).unwrap().unwrap().version(), 1);

        let published = sub.drain();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].event_type(), "orders.order.placed");
    }

    #[test]
    fn placing_twice_is_a_conflict() {
        let (dispatcher, _, _) = setup();
        let id = OrderId::new();
        dispatcher.dispatch(place(id)).unwrap();
        assert!(matches!(
            dispatcher.dispatch(place(id)),
            Err(DispatchError::Concurrency(_))
        ));
    }

    #[test]
    fn same_status_change_is_a_silent_no_op() {
        let (dispatcher, store, bus) = setup();
        let id = OrderId::new();
        dispatcher.dispatch(place(id)).unwrap();
        dispatcher.dispatch(change(id, OrderStatus::Validated)).unwrap();

        let sub = bus.subscribe();
        let order = dispatcher.dispatch(change(id, OrderStatus::Validated)).unwrap();
        assert_eq!(order.version(), 2);
        assert_eq!(store.get(id).unwrap().unwrap().version(), 2);
        assert!(sub.drain().is_empty());
    }

    #[test]
    fn illegal_transition_maps_to_invariant_violation() {
        let (dispatcher, _, _) = setup();
        let id = OrderId::new();
        dispatcher.dispatch(place(id)).unwrap();
        assert!(matches!(
            dispatcher.dispatch(change(id, OrderStatus::Delivered)),
            Err(DispatchError::InvariantViolation(_))
        ));
    }

    #[test]
    fn commands_on_unknown_orders_are_not_found() {
        let (dispatcher, _, _) = setup();
        let err = dispatcher
            .dispatch(OrderCommand::CancelOrder(CancelOrder {
                order_id: OrderId::new(),
                reason: "nope".into(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert_eq!(err, DispatchError::NotFound);
    }
}
