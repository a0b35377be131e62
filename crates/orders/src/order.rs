use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use logiflow_core::{Aggregate, AggregateRoot, DomainError, OrderId};
use logiflow_events::Event;

use crate::item::OrderItem;
use crate::status::OrderStatus;

/// Aggregate root: Order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    client_id: String,
    client_name: String,
    delivery_address: String,
    requested_delivery: DateTime<Utc>,
    order_date: DateTime<Utc>,
    items: Vec<OrderItem>,
    status: OrderStatus,
    status_changed_at: DateTime<Utc>,
    total_weight_kg: f64,
    total_volume_m3: f64,
    total_amount: i64,
    cancellation_reason: Option<String>,
    version: u64,
    created: bool,
}

impl Order {
    /// Create an empty, not-yet-placed aggregate instance.
    pub fn empty(id: OrderId) -> Self {
        Self {
            id,
            client_id: String::new(),
            client_name: String::new(),
            delivery_address: String::new(),
            requested_delivery: DateTime::<Utc>::default(),
            order_date: DateTime::<Utc>::default(),
            items: Vec::new(),
            status: OrderStatus::Received,
            status_changed_at: DateTime::<Utc>::default(),
            total_weight_kg: 0.0,
            total_volume_m3: 0.0,
            total_amount: 0,
            cancellation_reason: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    pub fn delivery_address(&self) -> &str {
        &self.delivery_address
    }

    pub fn requested_delivery(&self) -> DateTime<Utc> {
        self.requested_delivery
    }

    pub fn order_date(&self) -> DateTime<Utc> {
        self.order_date
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// When the order entered its current status.
    pub fn status_changed_at(&self) -> DateTime<Utc> {
        self.status_changed_at
    }

    pub fn time_in_status(&self, now: DateTime<Utc>) -> Duration {
        now - self.status_changed_at
    }

    pub fn total_weight_kg(&self) -> f64 {
        self.total_weight_kg
    }

    pub fn total_volume_m3(&self) -> f64 {
        self.total_volume_m3
    }

    /// Order value in smallest currency unit.
    pub fn total_amount(&self) -> i64 {
        self.total_amount
    }

    pub fn cancellation_reason(&self) -> Option<&str> {
        self.cancellation_reason.as_deref()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn has_fragile_items(&self) -> bool {
        self.items.iter().any(|i| i.product.is_fragile())
    }

    pub fn has_heavy_items(&self) -> bool {
        self.items.iter().any(|i| i.product.is_heavy())
    }

    pub fn requires_special_handling(&self) -> bool {
        self.has_fragile_items() || self.has_heavy_items()
    }

    fn recompute_totals(&mut self) {
        self.total_weight_kg = self.items.iter().map(OrderItem::weight_kg).sum();
        self.total_volume_m3 = self.items.iter().map(OrderItem::volume_m3).sum();
        self.total_amount = self
            .items
            .iter()
            .map(OrderItem::line_total)
            .fold(0i64, i64::saturating_add);
    }
}

impl AggregateRoot for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: PlaceOrder.
///
/// Placement records the order as submitted; business validation is the
/// validation agent's job, so an empty item list is accepted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub order_id: OrderId,
    pub client_id: String,
    pub client_name: String,
    pub delivery_address: String,
    pub requested_delivery: DateTime<Utc>,
    pub items: Vec<OrderItem>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AddItem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddItem {
    pub order_id: OrderId,
    pub item: OrderItem,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ChangeStatus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeStatus {
    pub order_id: OrderId,
    pub to: OrderStatus,
    /// Free-text note carried on the event (e.g. "auto-advanced by monitor").
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CancelOrder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelOrder {
    pub order_id: OrderId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrderCommand {
    PlaceOrder(PlaceOrder),
    AddItem(AddItem),
    ChangeStatus(ChangeStatus),
    CancelOrder(CancelOrder),
}

impl OrderCommand {
    pub fn order_id(&self) -> OrderId {
        match self {
            OrderCommand::PlaceOrder(c) => c.order_id,
            OrderCommand::AddItem(c) => c.order_id,
            OrderCommand::ChangeStatus(c) => c.order_id,
            OrderCommand::CancelOrder(c) => c.order_id,
        }
    }
}

/// Event: OrderPlaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPlaced {
    pub order_id: OrderId,
    pub client_id: String,
    pub client_name: String,
    pub delivery_address: String,
    pub requested_delivery: DateTime<Utc>,
    pub items: Vec<OrderItem>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemAdded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemAdded {
    pub order_id: OrderId,
    pub item: OrderItem,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StatusChanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChanged {
    pub order_id: OrderId,
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderCancelled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCancelled {
    pub order_id: OrderId,
    pub from: OrderStatus,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrderEvent {
    OrderPlaced(OrderPlaced),
    ItemAdded(ItemAdded),
    StatusChanged(StatusChanged),
    OrderCancelled(OrderCancelled),
}

impl OrderEvent {
    pub fn order_id(&self) -> OrderId {
        match self {
            OrderEvent::OrderPlaced(e) => e.order_id,
            OrderEvent::ItemAdded(e) => e.order_id,
            OrderEvent::StatusChanged(e) => e.order_id,
            OrderEvent::OrderCancelled(e) => e.order_id,
        }
    }
}

impl Event for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderPlaced(_) => "orders.order.placed",
            OrderEvent::ItemAdded(_) => "orders.order.item_added",
            OrderEvent::StatusChanged(_) => "orders.order.status_changed",
            OrderEvent::OrderCancelled(_) => "orders.order.cancelled",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::OrderPlaced(e) => e.occurred_at,
            OrderEvent::ItemAdded(e) => e.occurred_at,
            OrderEvent::StatusChanged(e) => e.occurred_at,
            OrderEvent::OrderCancelled(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Order {
    type Command = OrderCommand;
    type Event = OrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            OrderEvent::OrderPlaced(e) => {
                self.id = e.order_id;
                self.client_id = e.client_id.clone();
                self.client_name = e.client_name.clone();
                self.delivery_address = e.delivery_address.clone();
                self.requested_delivery = e.requested_delivery;
                self.order_date = e.occurred_at;
                self.items = e.items.clone();
                self.status = OrderStatus::Received;
                self.status_changed_at = e.occurred_at;
                self.cancellation_reason = None;
                self.created = true;
                self.recompute_totals();
            }
            OrderEvent::ItemAdded(e) => {
                self.items.push(e.item.clone());
                self.recompute_totals();
            }
            OrderEvent::StatusChanged(e) => {
                self.status = e.to;
                self.status_changed_at = e.occurred_at;
            }
            OrderEvent::OrderCancelled(e) => {
                self.status = OrderStatus::Cancelled;
                self.status_changed_at = e.occurred_at;
                self.cancellation_reason = Some(e.reason.clone());
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            OrderCommand::PlaceOrder(cmd) => self.handle_place(cmd),
            OrderCommand::AddItem(cmd) => self.handle_add_item(cmd),
            OrderCommand::ChangeStatus(cmd) => self.handle_change_status(cmd),
            OrderCommand::CancelOrder(cmd) => self.handle_cancel(cmd),
        }
    }
}

impl Order {
    fn ensure_order_id(&self, order_id: OrderId) -> Result<(), DomainError> {
        if self.id != order_id {
            return Err(DomainError::invariant("order_id mismatch"));
        }
        Ok(())
    }

    fn ensure_created(&self, order_id: OrderId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_order_id(order_id)
    }

    fn handle_place(&self, cmd: &PlaceOrder) -> Result<Vec<OrderEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("order already exists"));
        }
        self.ensure_order_id(cmd.order_id)?;

        Ok(vec![OrderEvent::OrderPlaced(OrderPlaced {
            order_id: cmd.order_id,
            client_id: cmd.client_id.trim().to_string(),
            client_name: cmd.client_name.trim().to_string(),
            delivery_address: cmd.delivery_address.trim().to_string(),
            requested_delivery: cmd.requested_delivery,
            items: cmd.items.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_add_item(&self, cmd: &AddItem) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_created(cmd.order_id)?;

        if !self.status.allows_item_changes() {
            return Err(DomainError::invariant(format!(
                "items cannot change once the order is {}",
                self.status
            )));
        }
        if cmd.item.quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }

        Ok(vec![OrderEvent::ItemAdded(ItemAdded {
            order_id: cmd.order_id,
            item: cmd.item.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_change_status(&self, cmd: &ChangeStatus) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_created(cmd.order_id)?;

        if cmd.to == OrderStatus::Cancelled {
            return Err(DomainError::validation(
                "cancellation requires a reason; use CancelOrder",
            ));
        }
        // Re-applying the current status is a no-op so racing writers converge.
        if self.status == cmd.to {
            return Ok(Vec::new());
        }
        if !self.status.can_transition_to(cmd.to) {
            return Err(DomainError::illegal_transition("order", self.status, cmd.to));
        }

        Ok(vec![OrderEvent::StatusChanged(StatusChanged {
            order_id: cmd.order_id,
            from: self.status,
            to: cmd.to,
            note: cmd.note.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_cancel(&self, cmd: &CancelOrder) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_created(cmd.order_id)?;

        match self.status {
            OrderStatus::Cancelled => return Ok(Vec::new()),
            OrderStatus::Delivered => {
                return Err(DomainError::invariant("delivered orders cannot be cancelled"));
            }
            _ => {}
        }
        if cmd.reason.trim().is_empty() {
            return Err(DomainError::validation("cancellation reason cannot be empty"));
        }

        Ok(vec![OrderEvent::OrderCancelled(OrderCancelled {
            order_id: cmd.order_id,
            from: self.status,
            reason: cmd.reason.trim().to_string(),
            occurred_at: cmd.occurred_at,
        })])
    }
}
