//! Shipping domain module: the physical transport record for an order.

pub mod shipment;

pub use shipment::{NewShipment, Shipment, ShipmentStatus};
