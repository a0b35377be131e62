use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use logiflow_core::{DomainError, DomainResult, Entity, OrderId, ShipmentId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    Scheduled,
    Loading,
    Loaded,
    InTransit,
    Delivered,
    Cancelled,
}

impl ShipmentStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ShipmentStatus::Delivered | ShipmentStatus::Cancelled)
    }

    pub fn can_transition_to(self, next: ShipmentStatus) -> bool {
        use ShipmentStatus::*;

        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (Scheduled, Loading)
                | (Loading, Loaded)
                | (Loaded, InTransit)
                | (InTransit, Delivered)
                | (_, Cancelled)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ShipmentStatus::Scheduled => "SCHEDULED",
            ShipmentStatus::Loading => "LOADING",
            ShipmentStatus::Loaded => "LOADED",
            ShipmentStatus::InTransit => "IN_TRANSIT",
            ShipmentStatus::Delivered => "DELIVERED",
            ShipmentStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the shipping agent decides for a new shipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewShipment {
    pub order_id: OrderId,
    pub truck_id: String,
    pub driver_id: String,
    pub delivery_address: String,
    pub scheduled_pickup: DateTime<Utc>,
    pub estimated_delivery: DateTime<Utc>,
    pub picking_instructions: String,
    pub estimated_picking_minutes: u32,
    pub requires_special_handling: bool,
}

/// Shipment: one per order, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    id: ShipmentId,
    order_id: OrderId,
    truck_id: String,
    driver_id: String,
    delivery_address: String,
    scheduled_pickup: DateTime<Utc>,
    actual_pickup: Option<DateTime<Utc>>,
    estimated_delivery: DateTime<Utc>,
    actual_delivery: Option<DateTime<Utc>>,
    status: ShipmentStatus,
    picking_instructions: String,
    estimated_picking_minutes: u32,
    requires_special_handling: bool,
    last_problem: Option<String>,
    version: u64,
}

impl Shipment {
    pub fn schedule(id: ShipmentId, input: NewShipment) -> DomainResult<Self> {
        if input.truck_id.trim().is_empty() || input.driver_id.trim().is_empty() {
            return Err(DomainError::validation("truck and driver must be assigned"));
        }
        if input.estimated_delivery < input.scheduled_pickup {
            return Err(DomainError::invariant(
                "estimated delivery cannot precede scheduled pickup",
            ));
        }

        Ok(Self {
            id,
            order_id: input.order_id,
            truck_id: input.truck_id,
            driver_id: input.driver_id,
            delivery_address: input.delivery_address,
            scheduled_pickup: input.scheduled_pickup,
            actual_pickup: None,
            estimated_delivery: input.estimated_delivery,
            actual_delivery: None,
            status: ShipmentStatus::Scheduled,
            picking_instructions: input.picking_instructions,
            estimated_picking_minutes: input.estimated_picking_minutes,
            requires_special_handling: input.requires_special_handling,
            last_problem: None,
            version: 0,
        })
    }

    pub fn id_typed(&self) -> ShipmentId {
        self.id
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn truck_id(&self) -> &str {
        &self.truck_id
    }

    pub fn driver_id(&self) -> &str {
        &self.driver_id
    }

    pub fn delivery_address(&self) -> &str {
        &self.delivery_address
    }

    pub fn scheduled_pickup(&self) -> DateTime<Utc> {
        self.scheduled_pickup
    }

    pub fn actual_pickup(&self) -> Option<DateTime<Utc>> {
        self.actual_pickup
    }

    pub fn estimated_delivery(&self) -> DateTime<Utc> {
        self.estimated_delivery
    }

    pub fn actual_delivery(&self) -> Option<DateTime<Utc>> {
        self.actual_delivery
    }

    pub fn status(&self) -> ShipmentStatus {
        self.status
    }

    pub fn picking_instructions(&self) -> &str {
        &self.picking_instructions
    }

    pub fn estimated_picking_minutes(&self) -> u32 {
        self.estimated_picking_minutes
    }

    pub fn requires_special_handling(&self) -> bool {
        self.requires_special_handling
    }

    pub fn last_problem(&self) -> Option<&str> {
        self.last_problem.as_deref()
    }

    fn transition(&mut self, next: ShipmentStatus) -> DomainResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::illegal_transition("shipment", self.status, next));
        }
        self.status = next;
        Ok(())
    }

    pub fn start_loading(&mut self) -> DomainResult<()> {
        self.transition(ShipmentStatus::Loading)
    }

    pub fn complete_loading(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        self.transition(ShipmentStatus::Loaded)?;
        self.actual_pickup = Some(at);
        Ok(())
    }

    pub fn dispatch(&mut self) -> DomainResult<()> {
        self.transition(ShipmentStatus::InTransit)
    }

    pub fn mark_delivered(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        self.transition(ShipmentStatus::Delivered)?;
        self.actual_delivery = Some(at);
        Ok(())
    }

    pub fn cancel(&mut self) -> DomainResult<()> {
        self.transition(ShipmentStatus::Cancelled)
    }

    /// Move the delivery estimate of a live shipment.
    pub fn reschedule_delivery(&mut self, eta: DateTime<Utc>) -> DomainResult<()> {
        if self.status.is_terminal() {
            return Err(DomainError::invariant(format!(
                "cannot reschedule a {} shipment",
                self.status
            )));
        }
        self.estimated_delivery = eta;
        Ok(())
    }

    /// Record a problem reported by the driver; only valid while in transit.
    pub fn report_problem(
        &mut self,
        description: impl Into<String>,
        new_eta: Option<DateTime<Utc>>,
    ) -> DomainResult<()> {
        if self.status != ShipmentStatus::InTransit {
            return Err(DomainError::invariant(
                "delivery problems can only be reported for shipments in transit",
            ));
        }
        let description = description.into();
        if description.trim().is_empty() {
            return Err(DomainError::validation("problem description cannot be empty"));
        }
        self.last_problem = Some(description);
        if let Some(eta) = new_eta {
            self.estimated_delivery = eta;
        }
        Ok(())
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == ShipmentStatus::InTransit && self.estimated_delivery < now
    }

    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

impl Entity for Shipment {
    type Id = ShipmentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}
