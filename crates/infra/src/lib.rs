//! Infrastructure layer: stores, dispatch, the order pipeline, warehouse
//! operations, autonomous monitoring and configuration.

pub mod config;
pub mod context;
pub mod event_worker;
pub mod monitoring;
pub mod notify;
pub mod orchestrator;
pub mod order_dispatcher;
pub mod store;
pub mod warehouse_ops;

#[cfg(test)]
mod test_support;

pub use config::LogiflowConfig;
pub use context::FulfillmentContext;
pub use monitoring::{MonitoringEngine, MonitoringHandle, MonitoringRunner, Sweep, SweepReport};
pub use orchestrator::{Orchestrator, OrderLine, PipelineOutcome, SubmitError, SubmitOrder};
pub use order_dispatcher::{DispatchError, OrderDispatcher};
pub use warehouse_ops::{OperationError, WarehouseOperations};
