use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use logiflow_core::{AggregateRoot, Entity};
use logiflow_infra::OrderLine;
use logiflow_inventory::Product;
use logiflow_orders::Order;
use logiflow_shipping::{Shipment, ShipmentStatus};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct SubmitOrderRequest {
    pub client_id: String,
    pub client_name: String,
    pub delivery_address: String,
    pub requested_delivery: DateTime<Utc>,
    pub items: Vec<OrderLine>,
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<String>,
    pub client_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub sku: String,
    pub name: String,
    pub category: String,
    pub unit_weight_kg: f64,
    #[serde(default)]
    pub unit_volume_m3: f64,
    /// Minor currency units.
    pub unit_price: i64,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub location: String,
}

#[derive(Debug, Deserialize)]
pub struct RestockRequest {
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct ListShipmentsQuery {
    pub status: Option<ShipmentStatus>,
}

#[derive(Debug, Deserialize)]
pub struct ReportProblemRequest {
    pub description: String,
    pub new_eta: Option<DateTime<Utc>>,
}

// -------------------------
// Response mapping
// -------------------------

pub fn order_to_json(order: &Order) -> serde_json::Value {
    json!({
        "id": order.id_typed().to_string(),
        "client_id": order.client_id(),
        "client_name": order.client_name(),
        "delivery_address": order.delivery_address(),
        "requested_delivery": order.requested_delivery(),
        "order_date": order.order_date(),
        "status": order.status(),
        "status_changed_at": order.status_changed_at(),
        "total_weight_kg": order.total_weight_kg(),
        "total_amount": order.total_amount(),
        "requires_special_handling": order.requires_special_handling(),
        "cancellation_reason": order.cancellation_reason(),
        "items": order.items().iter().map(|i| json!({
            "product_id": i.product.product_id.to_string(),
            "sku": i.product.sku,
            "name": i.product.name,
            "quantity": i.quantity,
            "unit_price": i.unit_price,
        })).collect::<Vec<_>>(),
        "version": order.version(),
    })
}

pub fn product_to_json(product: &Product) -> serde_json::Value {
    json!({
        "id": product.id().to_string(),
        "sku": product.sku(),
        "name": product.name(),
        "category": product.category().as_str(),
        "unit_weight_kg": product.unit_weight_kg(),
        "unit_price": product.unit_price(),
        "stock": product.stock(),
        "safety_stock": product.safety_stock(),
        "location": product.location(),
    })
}

pub fn shipment_to_json(shipment: &Shipment) -> serde_json::Value {
    json!({
        "id": shipment.id_typed().to_string(),
        "order_id": shipment.order_id().to_string(),
        "status": shipment.status(),
        "truck_id": shipment.truck_id(),
        "driver_id": shipment.driver_id(),
        "delivery_address": shipment.delivery_address(),
        "scheduled_pickup": shipment.scheduled_pickup(),
        "actual_pickup": shipment.actual_pickup(),
        "estimated_delivery": shipment.estimated_delivery(),
        "actual_delivery": shipment.actual_delivery(),
        "estimated_picking_minutes": shipment.estimated_picking_minutes(),
        "requires_special_handling": shipment.requires_special_handling(),
        "picking_instructions": shipment.picking_instructions(),
        "last_problem": shipment.last_problem(),
    })
}
