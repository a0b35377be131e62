//! Loading, dispatch and delivery of scheduled shipments.
//!
//! Each operation moves the shipment and its order together. The order
//! transition is checked before the shipment is saved, so a rejected
//! operation leaves both untouched.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;

use logiflow_agents::{Department, StoreError};
use logiflow_core::{DomainError, Entity, ExpectedVersion, ShipmentId};
use logiflow_orders::{ChangeStatus, Order, OrderCommand, OrderStatus};
use logiflow_shipping::Shipment;

use crate::context::FulfillmentContext;
use crate::order_dispatcher::DispatchError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OperationError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

#[derive(Debug, Clone)]
pub struct WarehouseOperations {
    ctx: FulfillmentContext,
}

impl WarehouseOperations {
    pub fn new(ctx: FulfillmentContext) -> Self {
        Self { ctx }
    }

    pub fn start_loading(&self, shipment_id: ShipmentId) -> Result<Shipment, OperationError> {
        let (mut shipment, order) = self.load(shipment_id)?;
        ensure_order_can_move(&order, OrderStatus::Loading)?;

        shipment.start_loading()?;
        let shipment = self.save(&shipment)?;
        self.move_order(&order, OrderStatus::Loading, "loading started")?;

        info!(shipment_id = %shipment_id, order_id = %order.id_typed(), "loading started");
        self.ctx.notifier.notify_internal(
            Department::Warehouse,
            &format!(
                "Loading started for order {} on {} (est. picking {} min)",
                order.id_typed(),
                shipment.truck_id(),
                shipment.estimated_picking_minutes()
            ),
        );
        Ok(shipment)
    }

    pub fn complete_loading(&self, shipment_id: ShipmentId) -> Result<Shipment, OperationError> {
        let (mut shipment, order) = self.load(shipment_id)?;
        let now = self.ctx.clock.now();

        shipment.complete_loading(now)?;
        let shipment = self.save(&shipment)?;

        info!(shipment_id = %shipment_id, order_id = %order.id_typed(), "loading completed");
        self.ctx.notifier.notify_client(
            order.client_id(),
            &format!(
                "Order #{} has been loaded onto {} and will depart shortly",
                order.id_typed(),
                shipment.truck_id()
            ),
        );
        self.ctx.notifier.notify_internal(
            Department::Logistics,
            &format!(
                "Shipment {} loaded at {}, ready for dispatch",
                shipment_id,
                now.format("%Y-%m-%d %H:%M UTC")
            ),
        );
        Ok(shipment)
    }

    pub fn dispatch(&self, shipment_id: ShipmentId) -> Result<Shipment, OperationError> {
        let (mut shipment, order) = self.load(shipment_id)?;
        ensure_order_can_move(&order, OrderStatus::InTransit)?;

        shipment.dispatch()?;
        let shipment = self.save(&shipment)?;
        self.move_order(&order, OrderStatus::InTransit, "dispatched")?;

        info!(shipment_id = %shipment_id, order_id = %order.id_typed(), driver = shipment.driver_id(), "shipment dispatched");
        self.ctx.notifier.notify_client(
            order.client_id(),
            &format!(
                "Order #{} is on its way. Estimated delivery: {}",
                order.id_typed(),
                shipment.estimated_delivery().format("%Y-%m-%d %H:%M UTC")
            ),
        );
        Ok(shipment)
    }

    pub fn mark_delivered(&self, shipment_id: ShipmentId) -> Result<Shipment, OperationError> {
        let (mut shipment, order) = self.load(shipment_id)?;
        ensure_order_can_move(&order, OrderStatus::Delivered)?;
        let now = self.ctx.clock.now();

        shipment.mark_delivered(now)?;
        let shipment = self.save(&shipment)?;
        self.move_order(&order, OrderStatus::Delivered, "delivered")?;

        info!(shipment_id = %shipment_id, order_id = %order.id_typed(), "shipment delivered");
        self.ctx.notifier.notify_client(
            order.client_id(),
            &format!(
                "Order #{} delivered at {}. Thank you for your business!",
                order.id_typed(),
                now.format("%Y-%m-%d %H:%M UTC")
            ),
        );
        self.ctx.notifier.notify_internal(
            Department::Delivery,
            &format!("Shipment {shipment_id} delivered to {}", shipment.delivery_address()),
        );
        Ok(shipment)
    }

    /// Record a driver-reported problem, optionally moving the ETA.
    pub fn report_delivery_problem(
        &self,
        shipment_id: ShipmentId,
        description: &str,
        new_eta: Option<DateTime<Utc>>,
    ) -> Result<Shipment, OperationError> {
        let (mut shipment, order) = self.load(shipment_id)?;
        if let Some(eta) = new_eta {
            if eta <= self.ctx.clock.now() {
                return Err(DomainError::validation("new estimated delivery must be in the future").into());
            }
        }

        shipment.report_problem(description, new_eta)?;
        let shipment = self.save(&shipment)?;

        info!(shipment_id = %shipment_id, order_id = %order.id_typed(), problem = description, "delivery problem reported");
        let eta_note = new_eta
            .map(|eta| format!(" New estimated delivery: {}", eta.format("%Y-%m-%d %H:%M UTC")))
            .unwrap_or_default();
        self.ctx.notifier.notify_client(
            order.client_id(),
            &format!(
                "Delivery of order #{} is affected by a problem: {description}.{eta_note}",
                order.id_typed()
            ),
        );
        self.ctx.notifier.notify_urgent(
            Department::DeliveryManagement,
            &format!(
                "Delivery problem on shipment {shipment_id} (truck {}, driver {}): {description}",
                shipment.truck_id(),
                shipment.driver_id()
            ),
        );
        Ok(shipment)
    }

    fn load(&self, shipment_id: ShipmentId) -> Result<(Shipment, Order), OperationError> {
        let shipment = self
            .ctx
            .shipments
            .get(shipment_id)?
            .ok_or_else(|| OperationError::NotFound(format!("shipment {shipment_id}")))?;
        let order = self
            .ctx
            .orders
            .get(shipment.order_id())?
            .ok_or_else(|| OperationError::NotFound(format!("order {}", shipment.order_id())))?;
        Ok((shipment, order))
    }

    fn save(&self, shipment: &Shipment) -> Result<Shipment, OperationError> {
        Ok(self
            .ctx
            .shipments
            .save(shipment, ExpectedVersion::Exact(shipment.version()))?)
    }

    fn move_order(&self, order: &Order, to: OrderStatus, note: &str) -> Result<Order, OperationError> {
        Ok(self.ctx.dispatch(OrderCommand::ChangeStatus(ChangeStatus {
            order_id: order.id_typed(),
            to,
            note: Some(note.to_string()),
            occurred_at: self.ctx.clock.now(),
        }))?)
    }
}

fn ensure_order_can_move(order: &Order, to: OrderStatus) -> Result<(), DomainError> {
    if order.status() == to || order.status().can_transition_to(to) {
        Ok(())
    } else {
        Err(DomainError::invariant(format!(
            "order {} cannot move from {} to {}",
            order.id_typed(),
            order.status(),
            to
        )))
    }
}
