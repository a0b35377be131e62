use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use serde::Serialize;

use logiflow_agents::{OrderRepository, ProductRepository, Reservation, ShipmentRepository, StoreError};
use logiflow_core::{AggregateRoot, Entity, ExpectedVersion, OrderId, ProductId, ShipmentId};
use logiflow_inventory::Product;
use logiflow_orders::{Order, OrderStatus};
use logiflow_shipping::Shipment;

fn poisoned() -> StoreError {
    StoreError::Storage("lock poisoned".to_string())
}

/// Order counts per status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrderStats {
    pub total: usize,
    pub by_status: BTreeMap<OrderStatus, usize>,
}

impl OrderStats {
    pub fn count(&self, status: OrderStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}

/// In-memory order store.
///
/// Intended for tests/dev. Orders are stored as snapshots; the stored copy's
/// aggregate version is what `ExpectedVersion` is checked against.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<OrderId, Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> Result<OrderStats, StoreError> {
        let orders = self.orders.read().map_err(|_| poisoned())?;
        let mut stats = OrderStats {
            total: orders.len(),
            by_status: OrderStatus::ALL.iter().map(|s| (*s, 0)).collect(),
        };
        for order in orders.values() {
            *stats.by_status.entry(order.status()).or_default() += 1;
        }
        Ok(stats)
    }
}

impl OrderRepository for InMemoryOrderStore {
    fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let orders = self.orders.read().map_err(|_| poisoned())?;
        Ok(orders.get(&id).cloned())
    }

    fn save(&self, order: &Order, expected: ExpectedVersion) -> Result<(), StoreError> {
        let mut orders = self.orders.write().map_err(|_| poisoned())?;
        let current = orders
            .get(&order.id_typed())
            .map(|o| o.version())
            .unwrap_or(0);
        StoreError::check_version(expected, current)?;
        if order.version() <= current {
            return Err(StoreError::Conflict(format!(
                "order {} at version {} does not advance stored version {current}",
                order.id_typed(),
                order.version()
            )));
        }
        orders.insert(order.id_typed(), order.clone());
        Ok(())
    }

    fn list(&self) -> Result<Vec<Order>, StoreError> {
        let orders = self.orders.read().map_err(|_| poisoned())?;
        let mut all: Vec<Order> = orders.values().cloned().collect();
        all.sort_by_key(|o| (o.order_date(), o.id_typed()));
        Ok(all)
    }
}

#[derive(Debug, Default)]
struct ProductTable {
    rows: HashMap<ProductId, Product>,
    by_sku: HashMap<String, ProductId>,
}

/// In-memory product catalogue.
///
/// Every stock mutation happens under the table's write lock, so a
/// reservation's check and decrement can never interleave with another.
#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    table: RwLock<ProductTable>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProductRepository for InMemoryProductStore {
    fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let table = self.table.read().map_err(|_| poisoned())?;
        Ok(table.rows.get(&id).cloned())
    }

    fn find_by_sku(&self, sku: &str) -> Result<Option<Product>, StoreError> {
        let table = self.table.read().map_err(|_| poisoned())?;
        Ok(table
            .by_sku
            .get(sku)
            .and_then(|id| table.rows.get(id))
            .cloned())
    }

    fn insert(&self, mut product: Product) -> Result<Product, StoreError> {
        let mut table = self.table.write().map_err(|_| poisoned())?;
        if table.by_sku.contains_key(product.sku()) {
            return Err(StoreError::AlreadyExists(format!("sku {}", product.sku())));
        }
        if table.rows.contains_key(product.id()) {
            return Err(StoreError::AlreadyExists(format!("product {}", product.id())));
        }
        product.set_version(1);
        table.by_sku.insert(product.sku().to_string(), *product.id());
        table.rows.insert(*product.id(), product.clone());
        Ok(product)
    }

    fn list(&self) -> Result<Vec<Product>, StoreError> {
        let table = self.table.read().map_err(|_| poisoned())?;
        let mut all: Vec<Product> = table.rows.values().cloned().collect();
        all.sort_by(|a, b| a.sku().cmp(b.sku()));
        Ok(all)
    }

    fn reserve_all(&self, lines: &[Reservation]) -> Result<Vec<Product>, StoreError> {
        let mut table = self.table.write().map_err(|_| poisoned())?;

        // Phase 1: every line must be satisfiable before anything changes.
        let mut requested: BTreeMap<ProductId, u32> = BTreeMap::new();
        for line in lines {
            let product = table
                .rows
                .get(&line.product_id)
                .ok_or_else(|| StoreError::NotFound(line.sku.clone()))?;
            let total = requested.entry(line.product_id).or_default();
            *total = total.saturating_add(line.quantity);
            if !product.can_supply(*total) {
                return Err(StoreError::insufficient_stock(product, *total));
            }
        }

        // Phase 2: apply. Cannot fail after phase 1 short of a domain bug.
        let mut updated = Vec::with_capacity(requested.len());
        for (id, quantity) in requested {
            let Some(product) = table.rows.get_mut(&id) else {
                return Err(StoreError::Storage(format!("product {id} vanished under lock")));
            };
            product
                .reserve(quantity)
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            let next = product.version() + 1;
            product.set_version(next);
            updated.push(product.clone());
        }
        Ok(updated)
    }

    fn restock(&self, id: ProductId, quantity: u32) -> Result<Product, StoreError> {
        let mut table = self.table.write().map_err(|_| poisoned())?;
        let product = table
            .rows
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("product {id}")))?;
        product
            .restock(quantity)
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        let next = product.version() + 1;
        product.set_version(next);
        Ok(product.clone())
    }
}

#[derive(Debug, Default)]
struct ShipmentTable {
    rows: HashMap<ShipmentId, Shipment>,
    by_order: HashMap<OrderId, ShipmentId>,
}

/// In-memory shipment store; at most one shipment per order.
#[derive(Debug, Default)]
pub struct InMemoryShipmentStore {
    table: RwLock<ShipmentTable>,
}

impl InMemoryShipmentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ShipmentRepository for InMemoryShipmentStore {
    fn get(&self, id: ShipmentId) -> Result<Option<Shipment>, StoreError> {
        let table = self.table.read().map_err(|_| poisoned())?;
        Ok(table.rows.get(&id).cloned())
    }

    fn for_order(&self, order_id: OrderId) -> Result<Option<Shipment>, StoreError> {
        let table = self.table.read().map_err(|_| poisoned())?;
        Ok(table
            .by_order
            .get(&order_id)
            .and_then(|id| table.rows.get(id))
            .cloned())
    }

    fn insert(&self, mut shipment: Shipment) -> Result<Shipment, StoreError> {
        let mut table = self.table.write().map_err(|_| poisoned())?;
        if table.by_order.contains_key(&shipment.order_id()) {
            return Err(StoreError::AlreadyExists(format!(
                "shipment for order {}",
                shipment.order_id()
            )));
        }
        shipment.set_version(1);
        table.by_order.insert(shipment.order_id(), *shipment.id());
        table.rows.insert(*shipment.id(), shipment.clone());
        Ok(shipment)
    }

    fn save(&self, shipment: &Shipment, expected: ExpectedVersion) -> Result<Shipment, StoreError> {
        let mut table = self.table.write().map_err(|_| poisoned())?;
        let stored = table
            .rows
            .get_mut(shipment.id())
            .ok_or_else(|| StoreError::NotFound(format!("shipment {}", shipment.id())))?;
        StoreError::check_version(expected, stored.version())?;

        let mut next = shipment.clone();
        next.set_version(stored.version() + 1);
        *stored = next.clone();
        Ok(next)
    }

    fn list(&self) -> Result<Vec<Shipment>, StoreError> {
        let table = self.table.read().map_err(|_| poisoned())?;
        let mut all: Vec<Shipment> = table.rows.values().cloned().collect();
        all.sort_by_key(|s| (s.scheduled_pickup(), *s.id()));
        Ok(all)
    }
}
