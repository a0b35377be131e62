//! Fixtures shared by the infra unit and integration tests.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use logiflow_agents::{ProductRepository, ValidationRules};
use logiflow_core::{Aggregate, ManualClock, OrderId, ProductId, ShipmentId};
use logiflow_inventory::{NewProduct, Product, ProductCategory};
use logiflow_observability::InMemoryMetrics;
use logiflow_orders::{Order, OrderCommand, OrderItem, PlaceOrder};
use logiflow_shipping::{NewShipment, Shipment};

use crate::context::FulfillmentContext;
use crate::monitoring::MonitoringEngine;
use crate::notify::RecordingNotifier;
use crate::orchestrator::{OrderLine, Orchestrator, SubmitOrder};
use crate::store::{InMemoryOrderStore, InMemoryProductStore, InMemoryShipmentStore};
use crate::warehouse_ops::WarehouseOperations;

/// Tuesday morning, inside business hours.
pub fn test_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 4, 10, 0, 0).unwrap()
}

pub fn product(sku: &str, category: ProductCategory, weight: f64, stock: u32) -> Product {
    Product::new(
        ProductId::new(),
        NewProduct {
            sku: sku.to_string(),
            name: format!("Product {sku}"),
            category,
            unit_weight_kg: weight,
            unit_volume_m3: 0.05,
            unit_price: 1_250,
            stock,
            location: format!("A-{}", sku.len()),
        },
    )
    .unwrap()
}

pub fn placed_order(items: &[OrderItem]) -> Order {
    let order_id = OrderId::new();
    let mut order = Order::empty(order_id);
    order
        .execute(&OrderCommand::PlaceOrder(PlaceOrder {
            order_id,
            client_id: "CLIENT-1".into(),
            client_name: "Bau AG".into(),
            delivery_address: "Hauptstraße 5, 10115 Berlin, Germany".into(),
            requested_delivery: test_time() + Duration::days(3),
            items: items.to_vec(),
            occurred_at: test_time(),
        }))
        .unwrap();
    order
}

pub fn schedule_for(order: &Order) -> Shipment {
    Shipment::schedule(
        ShipmentId::new(),
        NewShipment {
            order_id: order.id_typed(),
            truck_id: "TRUCK_SMALL_004".into(),
            driver_id: "DRIVER_GENERAL_004".into(),
            delivery_address: order.delivery_address().to_string(),
            scheduled_pickup: test_time() + Duration::hours(3),
            estimated_delivery: test_time() + Duration::hours(13),
            picking_instructions: "PICKING ROUTE".into(),
            estimated_picking_minutes: 12,
            requires_special_handling: false,
        },
    )
    .unwrap()
}

/// Everything wired in memory with a pinned clock and recording notifier.
pub struct Harness {
    pub ctx: FulfillmentContext,
    pub orders: Arc<InMemoryOrderStore>,
    pub products: Arc<InMemoryProductStore>,
    pub shipments: Arc<InMemoryShipmentStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: ManualClock,
    pub metrics: Arc<InMemoryMetrics>,
}

impl Harness {
    pub fn new() -> Self {
        let orders = Arc::new(InMemoryOrderStore::new());
        let products = Arc::new(InMemoryProductStore::new());
        let shipments = Arc::new(InMemoryShipmentStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let clock = ManualClock::new(test_time());
        let metrics = Arc::new(InMemoryMetrics::new());
        let ctx = FulfillmentContext::new(
            orders.clone(),
            products.clone(),
            shipments.clone(),
            notifier.clone(),
            Arc::new(clock.clone()),
            metrics.clone(),
        );
        Self {
            ctx,
            orders,
            products,
            shipments,
            notifier,
            clock,
            metrics,
        }
    }

    pub fn stock(&self, sku: &str, category: ProductCategory, weight: f64, stock: u32) -> Product {
        self.products.insert(product(sku, category, weight, stock)).unwrap()
    }

    pub fn orchestrator(&self) -> Arc<Orchestrator> {
        Arc::new(Orchestrator::new(self.ctx.clone(), ValidationRules::default()))
    }

    pub fn engine(&self) -> MonitoringEngine {
        MonitoringEngine::new(self.ctx.clone(), ValidationRules::default(), Some(42))
    }

    pub fn warehouse_ops(&self) -> WarehouseOperations {
        WarehouseOperations::new(self.ctx.clone())
    }

    /// Submission for delivery three days out to Berlin.
    pub fn submission(&self, lines: &[(&str, u32)]) -> SubmitOrder {
        SubmitOrder {
            client_id: "CLIENT-1".into(),
            client_name: "Bau AG".into(),
            delivery_address: "Hauptstraße 5, 10115 Berlin, Germany".into(),
            requested_delivery: test_time() + Duration::days(3),
            lines: lines
                .iter()
                .map(|(sku, quantity)| OrderLine {
                    sku: sku.to_string(),
                    quantity: *quantity,
                })
                .collect(),
        }
    }
}
