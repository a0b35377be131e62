//! Shared fixtures for the agent unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, TimeZone, Utc};

use logiflow_core::{Aggregate, Entity, ExpectedVersion, OrderId, ProductId, ShipmentId};
use logiflow_inventory::{NewProduct, Product, ProductCategory};
use logiflow_orders::{
    CancelOrder, ChangeStatus, Order, OrderCommand, OrderItem, OrderStatus, PlaceOrder,
    ProductSnapshot,
};
use logiflow_shipping::Shipment;

use crate::ports::{ProductRepository, Reservation, ShipmentRepository, StoreError};

/// Tuesday morning, inside business hours.
pub fn test_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 4, 10, 0, 0).unwrap()
}

pub fn snapshot(sku: &str, category: ProductCategory, weight: f64, location: &str) -> ProductSnapshot {
    ProductSnapshot {
        product_id: ProductId::new(),
        sku: sku.to_string(),
        name: format!("Product {sku}"),
        category,
        unit_weight_kg: weight,
        unit_volume_m3: 0.1,
        location: location.to_string(),
    }
}

pub fn product(sku: &str, category: ProductCategory, weight: f64, stock: u32) -> Product {
    Product::new(
        ProductId::new(),
        NewProduct {
            sku: sku.to_string(),
            name: format!("Product {sku}"),
            category,
            unit_weight_kg: weight,
            unit_volume_m3: 0.1,
            unit_price: 500,
            stock,
            location: "A-1".to_string(),
        },
    )
    .unwrap()
}

pub fn item_for(product: &Product, quantity: u32) -> OrderItem {
    OrderItem::new(product, quantity)
}

/// A placed order with sensible defaults; `tweak` adjusts the placement.
pub fn order_with(items: Vec<OrderItem>, tweak: impl FnOnce(&mut PlaceOrder)) -> Order {
    let order_id = OrderId::new();
    let mut cmd = PlaceOrder {
        order_id,
        client_id: "CLIENT-1".into(),
        client_name: "Bau AG".into(),
        delivery_address: "Hauptstraße 5, 10115 Berlin, Germany".into(),
        requested_delivery: test_time() + Duration::days(3),
        items,
        occurred_at: test_time(),
    };
    tweak(&mut cmd);

    let mut order = Order::empty(order_id);
    order.execute(&OrderCommand::PlaceOrder(cmd)).unwrap();
    order
}

/// Placed order walked along the lifecycle to `status` (at `test_time()`).
pub fn order_at_status(items: Vec<OrderItem>, status: OrderStatus) -> Order {
    use OrderStatus::*;

    let mut order = order_with(items, |_| {});
    let path: &[OrderStatus] = match status {
        Received => &[],
        Scheduled => &[Scheduled],
        Validated => &[Validated],
        InventoryChecked => &[Validated, InventoryChecked],
        Fulfilled => &[Validated, InventoryChecked, Fulfilled],
        ReadyForPickup => &[Validated, InventoryChecked, Fulfilled, ReadyForPickup],
        Loading => &[Validated, InventoryChecked, Fulfilled, ReadyForPickup, Loading],
        InTransit => &[Validated, InventoryChecked, Fulfilled, ReadyForPickup, InTransit],
        Delivered => &[Validated, InventoryChecked, Fulfilled, ReadyForPickup, InTransit, Delivered],
        Cancelled => &[],
    };

    for to in path {
        let cmd = OrderCommand::ChangeStatus(ChangeStatus {
            order_id: order.id_typed(),
            to: *to,
            note: None,
            occurred_at: test_time(),
        });
        order.execute(&cmd).unwrap();
    }
    if status == Cancelled {
        let cmd = OrderCommand::CancelOrder(CancelOrder {
            order_id: order.id_typed(),
            reason: "test".into(),
            occurred_at: test_time(),
        });
        order.execute(&cmd).unwrap();
    }
    order
}

#[derive(Default)]
pub struct FakeProducts {
    rows: Mutex<HashMap<ProductId, Product>>,
}

impl FakeProducts {
    pub fn add(&self, product: Product) -> Product {
        self.rows.lock().unwrap().insert(*product.id(), product.clone());
        product
    }

    pub fn stock_of(&self, id: ProductId) -> u32 {
        self.rows.lock().unwrap()[&id].stock()
    }
}

impl ProductRepository for FakeProducts {
    fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    fn find_by_sku(&self, sku: &str) -> Result<Option<Product>, StoreError> {
        Ok(self.rows.lock().unwrap().values().find(|p| p.sku() == sku).cloned())
    }

    fn insert(&self, product: Product) -> Result<Product, StoreError> {
        Ok(self.add(product))
    }

    fn list(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self.rows.lock().unwrap().values().cloned().collect())
    }

    fn reserve_all(&self, lines: &[Reservation]) -> Result<Vec<Product>, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        for line in lines {
            let p = rows
                .get(&line.product_id)
                .ok_or_else(|| StoreError::NotFound(line.sku.clone()))?;
            if p.stock() < line.quantity {
                return Err(StoreError::insufficient_stock(p, line.quantity));
            }
        }
        let mut out = Vec::new();
        for line in lines {
            let p = rows.get_mut(&line.product_id).unwrap();
            p.reserve(line.quantity).unwrap();
            out.push(p.clone());
        }
        Ok(out)
    }

    fn restock(&self, id: ProductId, quantity: u32) -> Result<Product, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        let p = rows.get_mut(&id).ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        p.restock(quantity).unwrap();
        Ok(p.clone())
    }
}

#[derive(Default)]
pub struct FakeShipments {
    rows: Mutex<HashMap<ShipmentId, Shipment>>,
}

impl ShipmentRepository for FakeShipments {
    fn get(&self, id: ShipmentId) -> Result<Option<Shipment>, StoreError> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    fn for_order(&self, order_id: OrderId) -> Result<Option<Shipment>, StoreError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|s| s.order_id() == order_id)
            .cloned())
    }

    fn insert(&self, shipment: Shipment) -> Result<Shipment, StoreError> {
        if self.for_order(shipment.order_id())?.is_some() {
            return Err(StoreError::AlreadyExists(shipment.order_id().to_string()));
        }
        self.rows.lock().unwrap().insert(shipment.id_typed(), shipment.clone());
        Ok(shipment)
    }

    fn save(&self, shipment: &Shipment, _expected: ExpectedVersion) -> Result<Shipment, StoreError> {
        self.rows.lock().unwrap().insert(shipment.id_typed(), shipment.clone());
        Ok(shipment.clone())
    }

    fn list(&self) -> Result<Vec<Shipment>, StoreError> {
        Ok(self.rows.lock().unwrap().values().cloned().collect())
    }
}
