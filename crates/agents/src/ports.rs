//! Storage and notification contracts the agents and the monitoring engine
//! are written against.
//!
//! Implementations live in `logiflow-infra`. All methods are synchronous: the
//! in-memory stores guard their maps with `RwLock`s, and the async orchestrator
//! calls into them from its own tasks.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use logiflow_core::{DomainError, ExpectedVersion, OrderId, ProductId, ShipmentId};
use logiflow_inventory::Product;
use logiflow_orders::{Order, OrderStatus};
use logiflow_shipping::{Shipment, ShipmentStatus};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("optimistic concurrency conflict: {0}")]
    Conflict(String),

    #[error("Insufficient stock for SKU {sku} ({name}). Available: {available}, Requested: {requested}")]
    InsufficientStock {
        sku: String,
        name: String,
        available: u32,
        requested: u32,
    },

    #[error("storage failure: {0}")]
    Storage(String),
}

impl StoreError {
    /// Shortfall of `product` against `requested` units.
    pub fn insufficient_stock(product: &Product, requested: u32) -> Self {
        StoreError::InsufficientStock {
            sku: product.sku().to_string(),
            name: product.name().to_string(),
            available: product.stock(),
            requested,
        }
    }

    pub fn check_version(expected: ExpectedVersion, actual: u64) -> Result<(), StoreError> {
        expected.check(actual).map_err(|e| match e {
            DomainError::Conflict(msg) => StoreError::Conflict(msg),
            other => StoreError::Storage(other.to_string()),
        })
    }
}

/// One line of an all-or-nothing stock reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub product_id: ProductId,
    pub sku: String,
    pub quantity: u32,
}

pub trait OrderRepository: Send + Sync {
    fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    /// Persist `order` if the stored copy is still at `expected`.
    fn save(&self, order: &Order, expected: ExpectedVersion) -> Result<(), StoreError>;

    fn list(&self) -> Result<Vec<Order>, StoreError>;

    fn by_status(&self, status: OrderStatus) -> Result<Vec<Order>, StoreError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|o| o.status() == status)
            .collect())
    }

    fn by_client(&self, client_id: &str) -> Result<Vec<Order>, StoreError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|o| o.client_id() == client_id)
            .collect())
    }

    /// Non-terminal orders that entered their current status before `cutoff`.
    fn status_older_than(&self, cutoff: DateTime<Utc>) -> Result<Vec<Order>, StoreError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|o| !o.is_terminal() && o.status_changed_at() < cutoff)
            .collect())
    }

    /// Orders placed at or after `since`.
    fn placed_since(&self, since: DateTime<Utc>) -> Result<Vec<Order>, StoreError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|o| o.order_date() >= since)
            .collect())
    }
}

pub trait ProductRepository: Send + Sync {
    fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    fn find_by_sku(&self, sku: &str) -> Result<Option<Product>, StoreError>;

    /// Register a new product; SKUs are unique.
    fn insert(&self, product: Product) -> Result<Product, StoreError>;

    fn list(&self) -> Result<Vec<Product>, StoreError>;

    fn below_stock(&self, threshold: u32) -> Result<Vec<Product>, StoreError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|p| p.stock() < threshold)
            .collect())
    }

    /// Decrement every line or none of them.
    ///
    /// Implementations must check and apply all lines under a single critical
    /// section so concurrent reservations can never drive stock below zero.
    fn reserve_all(&self, lines: &[Reservation]) -> Result<Vec<Product>, StoreError>;

    fn restock(&self, id: ProductId, quantity: u32) -> Result<Product, StoreError>;
}

pub trait ShipmentRepository: Send + Sync {
    fn get(&self, id: ShipmentId) -> Result<Option<Shipment>, StoreError>;

    fn for_order(&self, order_id: OrderId) -> Result<Option<Shipment>, StoreError>;

    /// Store a new shipment; an order may only ever have one.
    fn insert(&self, shipment: Shipment) -> Result<Shipment, StoreError>;

    /// Persist a mutated shipment, returning it with its new version.
    fn save(&self, shipment: &Shipment, expected: ExpectedVersion) -> Result<Shipment, StoreError>;

    fn list(&self) -> Result<Vec<Shipment>, StoreError>;

    fn by_status(&self, status: ShipmentStatus) -> Result<Vec<Shipment>, StoreError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|s| s.status() == status)
            .collect())
    }

    fn in_transit(&self) -> Result<Vec<Shipment>, StoreError> {
        self.by_status(ShipmentStatus::InTransit)
    }

    /// Scheduled shipments whose pickup time has passed.
    fn overdue_pickups(&self, now: DateTime<Utc>) -> Result<Vec<Shipment>, StoreError> {
        Ok(self
            .by_status(ShipmentStatus::Scheduled)?
            .into_iter()
            .filter(|s| s.scheduled_pickup() < now)
            .collect())
    }

    fn requiring_special_handling(&self) -> Result<Vec<Shipment>, StoreError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|s| s.requires_special_handling() && !s.status().is_terminal())
            .collect())
    }
}

/// Internal recipients of notifications and alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Department {
    OrderProcessing,
    Validation,
    Fulfillment,
    Warehouse,
    Logistics,
    Delivery,
    DeliveryManagement,
    OrderManagement,
    AiAutomation,
    Inventory,
    Operations,
    DemandAnalysis,
}

impl Department {
    pub fn as_str(self) -> &'static str {
        match self {
            Department::OrderProcessing => "ORDER_PROCESSING",
            Department::Validation => "VALIDATION",
            Department::Fulfillment => "FULFILLMENT",
            Department::Warehouse => "WAREHOUSE",
            Department::Logistics => "LOGISTICS",
            Department::Delivery => "DELIVERY",
            Department::DeliveryManagement => "DELIVERY_MANAGEMENT",
            Department::OrderManagement => "ORDER_MANAGEMENT",
            Department::AiAutomation => "AI_AUTOMATION",
            Department::Inventory => "INVENTORY",
            Department::Operations => "OPERATIONS",
            Department::DemandAnalysis => "DEMAND_ANALYSIS",
        }
    }
}

impl core::fmt::Display for Department {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fire-and-forget notification sink. Delivery is not guaranteed.
pub trait Notifier: Send + Sync {
    fn notify_client(&self, client_id: &str, message: &str);

    fn notify_internal(&self, department: Department, message: &str);

    fn notify_urgent(&self, recipient: Department, message: &str);
}

impl<T: OrderRepository + ?Sized> OrderRepository for Arc<T> {
    fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        (**self).get(id)
    }

    fn save(&self, order: &Order, expected: ExpectedVersion) -> Result<(), StoreError> {
        (**self).save(order, expected)
    }

    fn list(&self) -> Result<Vec<Order>, StoreError> {
        (**self).list()
    }

    fn status_older_than(&self, cutoff: DateTime<Utc>) -> Result<Vec<Order>, StoreError> {
        (**self).status_older_than(cutoff)
    }
}

impl<T: ProductRepository + ?Sized> ProductRepository for Arc<T> {
    fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        (**self).get(id)
    }

    fn find_by_sku(&self, sku: &str) -> Result<Option<Product>, StoreError> {
        (**self).find_by_sku(sku)
    }

    fn insert(&self, product: Product) -> Result<Product, StoreError> {
        (**self).insert(product)
    }

    fn list(&self) -> Result<Vec<Product>, StoreError> {
        (**self).list()
    }

    fn reserve_all(&self, lines: &[Reservation]) -> Result<Vec<Product>, StoreError> {
        (**self).reserve_all(lines)
    }

    fn restock(&self, id: ProductId, quantity: u32) -> Result<Product, StoreError> {
        (**self).restock(id, quantity)
    }
}

impl<T: ShipmentRepository + ?Sized> ShipmentRepository for Arc<T> {
    fn get(&self, id: ShipmentId) -> Result<Option<Shipment>, StoreError> {
        (**self).get(id)
    }

    fn for_order(&self, order_id: OrderId) -> Result<Option<Shipment>, StoreError> {
        (**self).for_order(order_id)
    }

    fn insert(&self, shipment: Shipment) -> Result<Shipment, StoreError> {
        (**self).insert(shipment)
    }

    fn save(&self, shipment: &Shipment, expected: ExpectedVersion) -> Result<Shipment, StoreError> {
        (**self).save(shipment, expected)
    }

    fn list(&self) -> Result<Vec<Shipment>, StoreError> {
        (**self).list()
    }
}

impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    fn notify_client(&self, client_id: &str, message: &str) {
        (**self).notify_client(client_id, message)
    }

    fn notify_internal(&self, department: Department, message: &str) {
        (**self).notify_internal(department, message)
    }

    fn notify_urgent(&self, recipient: Department, message: &str) {
        (**self).notify_urgent(recipient, message)
    }
}
