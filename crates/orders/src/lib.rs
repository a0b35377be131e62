//! Orders domain module.
//!
//! The order lifecycle is a command/event aggregate: `handle` decides, `apply`
//! evolves. Every status change flows through [`OrderStatus::can_transition_to`],
//! so the pipeline and the monitoring engine share one state machine.

pub mod item;
pub mod order;
pub mod status;

pub use item::{OrderItem, ProductSnapshot};
pub use order::{
    AddItem, CancelOrder, ChangeStatus, ItemAdded, Order, OrderCancelled, OrderCommand, OrderEvent,
    OrderPlaced, PlaceOrder, StatusChanged,
};
pub use status::OrderStatus;
