//! Shared wiring handed to the orchestrator, warehouse operations and the
//! monitoring engine.

use std::sync::Arc;

use logiflow_agents::{Notifier, OrderRepository, ProductRepository, ShipmentRepository};
use logiflow_core::{Clock, SystemClock};
use logiflow_events::InMemoryEventBus;
use logiflow_observability::{MetricsSink, NoopMetrics};
use logiflow_orders::{Order, OrderCommand, OrderEvent};

use crate::notify::TracingNotifier;
use crate::order_dispatcher::{DispatchError, OrderDispatcher};
use crate::store::{InMemoryOrderStore, InMemoryProductStore, InMemoryShipmentStore};

pub type OrderBus = Arc<InMemoryEventBus<OrderEvent>>;

/// Collaborators of the fulfillment core, all behind trait objects.
#[derive(Clone)]
pub struct FulfillmentContext {
    pub orders: Arc<dyn OrderRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub shipments: Arc<dyn ShipmentRepository>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
    pub metrics: Arc<dyn MetricsSink>,
    dispatcher: Arc<OrderDispatcher<Arc<dyn OrderRepository>, OrderBus>>,
}

impl FulfillmentContext {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        products: Arc<dyn ProductRepository>,
        shipments: Arc<dyn ShipmentRepository>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        let bus: OrderBus = Arc::new(InMemoryEventBus::new());
        let dispatcher = Arc::new(OrderDispatcher::new(orders.clone(), bus));
        Self {
            orders,
            products,
            shipments,
            notifier,
            clock,
            metrics,
            dispatcher,
        }
    }

    /// In-memory stores, wall clock, log notifier, no metrics.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryOrderStore::new()),
            Arc::new(InMemoryProductStore::new()),
            Arc::new(InMemoryShipmentStore::new()),
            Arc::new(TracingNotifier),
            Arc::new(SystemClock),
            Arc::new(NoopMetrics),
        )
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Run an order command through the versioned dispatcher.
    pub fn dispatch(&self, command: OrderCommand) -> Result<Order, DispatchError> {
        self.dispatcher.dispatch(command)
    }

    /// Bus carrying every persisted order event.
    pub fn events(&self) -> &OrderBus {
        self.dispatcher.bus()
    }
}

impl core::fmt::Debug for FulfillmentContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FulfillmentContext")
            .field("subscribers", &self.events().subscriber_count())
            .finish_non_exhaustive()
    }
}
