//! Per-order pipeline: Validation → Inventory → Fulfillment → Warehouse → Shipping.
//!
//! Each submitted order gets one task. Every stage either advances the order
//! one status forward or ends it in `Cancelled` with a reason the client can
//! read; a panic inside a stage is caught at the task boundary and treated the
//! same way. If a stage after fulfillment fails, the shipment (if any) is
//! cancelled and the reserved stock handed back before the order is cancelled.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

use logiflow_agents::{
    AgentError, Department, FulfillmentAgent, InventoryAgent, ShippingAgent, StoreError,
    ValidationAgent, ValidationRules, WarehouseAgent,
};
use logiflow_core::{Entity, ExpectedVersion, OrderId, ShipmentId};
use logiflow_orders::{
    CancelOrder, ChangeStatus, Order, OrderCommand, OrderItem, OrderStatus, PlaceOrder,
};
use logiflow_shipping::Shipment;

use crate::context::FulfillmentContext;
use crate::order_dispatcher::DispatchError;

/// One requested line of a new order, by SKU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub sku: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitOrder {
    pub client_id: String,
    pub client_name: String,
    pub delivery_address: String,
    pub requested_delivery: DateTime<Utc>,
    pub lines: Vec<OrderLine>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Product not found: {0}")]
    UnknownSku(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PipelineOutcome {
    Completed { shipment_id: ShipmentId },
    Cancelled { reason: String },
    /// The order was missing or no longer `Received` when the task started.
    Skipped { status: Option<OrderStatus> },
}

/// Why a stage stopped the pipeline.
#[derive(Debug)]
enum StageError {
    /// Business rejection; the message goes to the client verbatim.
    Rejected(String),
    /// The order left the pipeline's hands (cancelled elsewhere).
    Abandoned(OrderStatus),
    Unexpected(String),
}

impl From<AgentError> for StageError {
    fn from(value: AgentError) -> Self {
        StageError::Unexpected(value.to_string())
    }
}

impl From<DispatchError> for StageError {
    fn from(value: DispatchError) -> Self {
        StageError::Unexpected(value.to_string())
    }
}

impl From<StoreError> for StageError {
    fn from(value: StoreError) -> Self {
        StageError::Unexpected(value.to_string())
    }
}

pub struct Orchestrator {
    ctx: FulfillmentContext,
    validation: ValidationAgent,
    inventory: InventoryAgent,
    fulfillment: FulfillmentAgent,
    warehouse: WarehouseAgent,
    shipping: ShippingAgent,
}

impl Orchestrator {
    pub fn new(ctx: FulfillmentContext, rules: ValidationRules) -> Self {
        Self {
            ctx,
            validation: ValidationAgent::new(rules),
            inventory: InventoryAgent::new(),
            fulfillment: FulfillmentAgent::new(),
            warehouse: WarehouseAgent::new(),
            shipping: ShippingAgent::new(),
        }
    }

    pub fn context(&self) -> &FulfillmentContext {
        &self.ctx
    }

    /// Record a new order in `Received` and acknowledge it.
    ///
    /// SKUs are resolved against the catalogue so each item carries a
    /// snapshot of the product it was ordered from.
    pub fn submit(&self, input: SubmitOrder) -> Result<Order, SubmitError> {
        let mut items = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            let product = self
                .ctx
                .products
                .find_by_sku(&line.sku)?
                .ok_or_else(|| SubmitError::UnknownSku(line.sku.clone()))?;
            items.push(OrderItem::new(&product, line.quantity));
        }

        let order = self.ctx.dispatch(OrderCommand::PlaceOrder(PlaceOrder {
            order_id: OrderId::new(),
            client_id: input.client_id,
            client_name: input.client_name,
            delivery_address: input.delivery_address,
            requested_delivery: input.requested_delivery,
            items,
            occurred_at: self.ctx.clock.now(),
        }))?;

        info!(order_id = %order.id_typed(), client_id = %order.client_id(), items = order.items().len(), "order received");
        self.ctx.notifier.notify_client(
            order.client_id(),
            &format!(
                "Order #{} received and is being processed. Requested delivery: {}",
                order.id_typed(),
                order.requested_delivery().format("%Y-%m-%d")
            ),
        );
        self.ctx.notifier.notify_internal(
            Department::OrderProcessing,
            &format!(
                "New order {} from {} ({} item(s), {:.1} kg)",
                order.id_typed(),
                order.client_name(),
                order.items().len(),
                order.total_weight_kg()
            ),
        );
        Ok(order)
    }

    /// Run the pipeline for `order_id` on its own task.
    ///
    /// Stages block on the stores, so the work runs on the blocking pool; the
    /// outer task only waits for it and cancels the order if it panicked.
    pub fn spawn(self: &Arc<Self>, order_id: OrderId) -> tokio::task::JoinHandle<PipelineOutcome> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let worker = Arc::clone(&this);
            match tokio::task::spawn_blocking(move || worker.process(order_id)).await {
                Ok(outcome) => outcome,
                Err(join_err) => {
                    error!(order_id = %order_id, error = %join_err, "order pipeline aborted");
                    this.ctx.metrics.incr("orders.failed");
                    let reason = "Unexpected error during processing".to_string();
                    this.cancel(order_id, &reason);
                    PipelineOutcome::Cancelled { reason }
                }
            }
        })
    }

    /// Run the pipeline synchronously.
    pub fn process(&self, order_id: OrderId) -> PipelineOutcome {
        let started = Instant::now();
        let outcome = self.run_pipeline(order_id);
        self.ctx
            .metrics
            .observe_ms("orders.pipeline_ms", started.elapsed().as_millis() as u64);
        outcome
    }

    fn run_pipeline(&self, order_id: OrderId) -> PipelineOutcome {
        let order = match self.ctx.orders.get(order_id) {
            Ok(Some(order)) => order,
            Ok(None) => {
                warn!(order_id = %order_id, "order vanished before processing");
                return PipelineOutcome::Skipped { status: None };
            }
            Err(e) => {
                error!(order_id = %order_id, error = %e, "failed to load order");
                self.ctx.metrics.incr("orders.failed");
                let reason = format!("Unexpected error during processing: {e}");
                self.cancel(order_id, &reason);
                return PipelineOutcome::Cancelled { reason };
            }
        };
        if order.status() != OrderStatus::Received {
            info!(order_id = %order_id, status = %order.status(), "order already past intake, skipping");
            return PipelineOutcome::Skipped {
                status: Some(order.status()),
            };
        }

        let mut reserved = false;
        let failure = match self.run_stages(order, &mut reserved) {
            Ok((order, shipment)) => {
                self.ctx.metrics.incr("orders.processed");
                info!(
                    order_id = %order_id,
                    shipment_id = %shipment.id_typed(),
                    truck = shipment.truck_id(),
                    "order ready for pickup"
                );
                self.ctx.notifier.notify_client(
                    order.client_id(),
                    &format!(
                        "Order #{} processed successfully. Shipment {} scheduled for pickup at {}. Truck: {}",
                        order_id,
                        shipment.id_typed(),
                        shipment.scheduled_pickup().format("%Y-%m-%d %H:%M UTC"),
                        shipment.truck_id()
                    ),
                );
                return PipelineOutcome::Completed {
                    shipment_id: shipment.id_typed(),
                };
            }
            Err(failure) => failure,
        };

        let reason = match failure {
            StageError::Abandoned(status) => {
                info!(order_id = %order_id, status = %status, "order left the pipeline");
                if reserved {
                    self.cancel_shipment(order_id);
                    self.release_stock(order_id);
                }
                return PipelineOutcome::Skipped {
                    status: Some(status),
                };
            }
            StageError::Rejected(reason) => reason,
            StageError::Unexpected(detail) => {
                error!(order_id = %order_id, error = %detail, "order pipeline failed");
                self.ctx.metrics.incr("orders.failed");
                format!("Unexpected error during processing: {detail}")
            }
        };
        if reserved {
            self.cancel_shipment(order_id);
            self.release_stock(order_id);
        }
        self.cancel(order_id, &reason);
        PipelineOutcome::Cancelled { reason }
    }

    fn run_stages(&self, order: Order, reserved: &mut bool) -> Result<(Order, Shipment), StageError> {
        let order_id = order.id_typed();

        // Validation
        let verdict = self.validation.validate(&order, self.ctx.clock.now());
        if !verdict.valid {
            let reason = verdict.reason.unwrap_or_else(|| "Validation failed".to_string());
            info!(order_id = %order_id, reason = %reason, "order rejected by validation");
            return Err(StageError::Rejected(reason));
        }
        let order = self.advance(order_id, OrderStatus::Validated, "validation passed")?;
        self.ctx.notifier.notify_internal(
            Department::Validation,
            &format!("Order {order_id} validated for {}", order.client_name()),
        );

        // Inventory
        let report = self
            .inventory
            .check_availability(self.ctx.products.as_ref(), &order)?;
        if !report.available {
            return Err(StageError::Rejected(report.message));
        }
        let order = self.advance(order_id, OrderStatus::InventoryChecked, "inventory available")?;

        // Fulfillment
        let fulfilled = self.fulfillment.fulfill(self.ctx.products.as_ref(), &order)?;
        if !fulfilled.success {
            return Err(StageError::Rejected(fulfilled.message));
        }
        *reserved = true;
        let order = self.advance(order_id, OrderStatus::Fulfilled, "stock reserved")?;
        self.ctx.notifier.notify_internal(
            Department::Fulfillment,
            &format!(
                "Order {order_id} fulfilled: {}",
                fulfilled
                    .reserved
                    .iter()
                    .map(|(sku, qty)| format!("{sku} x{qty}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        );

        // Warehouse + Shipping. The monitor may already have scheduled the
        // shipment for an order it found stuck in Fulfilled.
        let shipment = match self.ctx.shipments.for_order(order_id)? {
            Some(existing) => existing,
            None => {
                let picking = self.warehouse.generate_instructions(&order);
                self.shipping.schedule_shipment(
                    self.ctx.shipments.as_ref(),
                    &order,
                    &picking,
                    self.ctx.clock.now(),
                )?
            }
        };
        let order = self.advance(order_id, OrderStatus::ReadyForPickup, "shipment scheduled")?;

        Ok((order, shipment))
    }

    /// Move the order forward, tolerating a monitor that got there first.
    fn advance(&self, order_id: OrderId, to: OrderStatus, note: &str) -> Result<Order, StageError> {
        let result = self.ctx.dispatch(OrderCommand::ChangeStatus(ChangeStatus {
            order_id,
            to,
            note: Some(note.to_string()),
            occurred_at: self.ctx.clock.now(),
        }));

        match result {
            Ok(order) => Ok(order),
            Err(DispatchError::InvariantViolation(msg)) => {
                let current = self
                    .ctx
                    .orders
                    .get(order_id)?
                    .ok_or_else(|| StageError::Unexpected(format!("order {order_id} disappeared")))?;
                match current.status() {
                    OrderStatus::Cancelled => Err(StageError::Abandoned(OrderStatus::Cancelled)),
                    status if status > to => Ok(current),
                    _ => Err(StageError::Unexpected(msg)),
                }
            }
            Err(other) => Err(other.into()),
        }
    }

    /// A shipment scheduled before the failure must not outlive its order.
    fn cancel_shipment(&self, order_id: OrderId) {
        let mut shipment = match self.ctx.shipments.for_order(order_id) {
            Ok(Some(shipment)) if !shipment.status().is_terminal() => shipment,
            Ok(_) => return,
            Err(e) => {
                error!(order_id = %order_id, error = %e, "failed to load shipment for cancellation");
                return;
            }
        };
        let expected = ExpectedVersion::Exact(shipment.version());
        if let Err(e) = shipment.cancel() {
            error!(order_id = %order_id, error = %e, "shipment refused cancellation");
            return;
        }
        match self.ctx.shipments.save(&shipment, expected) {
            Ok(_) => warn!(order_id = %order_id, shipment_id = %shipment.id_typed(), "shipment cancelled with its order"),
            Err(e) => error!(order_id = %order_id, error = %e, "failed to cancel shipment"),
        }
    }

    fn release_stock(&self, order_id: OrderId) {
        let Ok(Some(order)) = self.ctx.orders.get(order_id) else {
            return;
        };
        for item in order.items() {
            if let Err(e) = self.ctx.products.restock(item.product.product_id, item.quantity) {
                error!(order_id = %order_id, sku = %item.product.sku, error = %e, "failed to release reserved stock");
            }
        }
        warn!(order_id = %order_id, "reserved stock released after late pipeline failure");
    }

    fn cancel(&self, order_id: OrderId, reason: &str) {
        let result = self.ctx.dispatch(OrderCommand::CancelOrder(CancelOrder {
            order_id,
            reason: reason.to_string(),
            occurred_at: self.ctx.clock.now(),
        }));

        match result {
            Ok(order) => {
                self.ctx.metrics.incr("orders.cancelled");
                info!(order_id = %order_id, reason, "order cancelled");
                self.ctx.notifier.notify_client(
                    order.client_id(),
                    &format!("Order #{order_id} cancelled: {reason}"),
                );
            }
            Err(e) => {
                error!(order_id = %order_id, error = %e, "failed to cancel order");
            }
        }
    }
}

impl core::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("rules", self.validation.rules())
            .finish_non_exhaustive()
    }
}
