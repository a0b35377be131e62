//! `logiflow-agents`
//!
//! The fulfillment pipeline's decision steps and the monitoring heuristics.
//!
//! Agents are plain structs with no background state. They read the current
//! time from their caller and reach storage and notification only through the
//! ports in [`ports`], which keeps them runnable against in-memory fakes.

pub mod automation;
pub mod error;
pub mod fulfillment;
pub mod inventory;
pub mod ports;
pub mod shipping;
pub mod validation;
pub mod warehouse;

#[cfg(test)]
mod test_support;

pub use error::AgentError;
pub use fulfillment::{FulfillmentAgent, FulfillmentOutcome};
pub use inventory::{AvailabilityReport, InventoryAgent, StockWarning};
pub use ports::{
    Department, Notifier, OrderRepository, ProductRepository, Reservation, ShipmentRepository,
    StoreError,
};
pub use shipping::{DriverPool, ShippingAgent, TruckClass};
pub use validation::{ValidationAgent, ValidationOutcome, ValidationRules};
pub use warehouse::{PickStop, PickingPlan, WarehouseAgent};
