use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use logiflow_core::DomainError;

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Received,
    Scheduled,
    Validated,
    InventoryChecked,
    Fulfilled,
    ReadyForPickup,
    Loading,
    InTransit,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 10] = [
        OrderStatus::Received,
        OrderStatus::Scheduled,
        OrderStatus::Validated,
        OrderStatus::InventoryChecked,
        OrderStatus::Fulfilled,
        OrderStatus::ReadyForPickup,
        OrderStatus::Loading,
        OrderStatus::InTransit,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Whether `self -> next` is an edge of the lifecycle graph.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;

        if self.is_terminal() {
            return false;
        }
        if next == Cancelled {
            return true;
        }
        matches!(
            (self, next),
            (Received, Validated)
                | (Received, Scheduled)
                | (Scheduled, Validated)
                | (Validated, InventoryChecked)
                | (InventoryChecked, Fulfilled)
                | (Fulfilled, ReadyForPickup)
                | (ReadyForPickup, Loading)
                | (ReadyForPickup, InTransit)
                | (Loading, InTransit)
                | (InTransit, Delivered)
        )
    }

    /// Single forward step the monitoring engine may take on a stuck order.
    pub fn auto_advance_target(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Received => Some(OrderStatus::Scheduled),
            OrderStatus::Scheduled => Some(OrderStatus::Validated),
            OrderStatus::Validated => Some(OrderStatus::InventoryChecked),
            OrderStatus::Fulfilled => Some(OrderStatus::ReadyForPickup),
            _ => None,
        }
    }

    /// Items may change only before validation has looked at them.
    pub fn allows_item_changes(self) -> bool {
        matches!(self, OrderStatus::Received | OrderStatus::Scheduled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Received => "RECEIVED",
            OrderStatus::Scheduled => "SCHEDULED",
            OrderStatus::Validated => "VALIDATED",
            OrderStatus::InventoryChecked => "INVENTORY_CHECKED",
            OrderStatus::Fulfilled => "FULFILLED",
            OrderStatus::ReadyForPickup => "READY_FOR_PICKUP",
            OrderStatus::Loading => "LOADING",
            OrderStatus::InTransit => "IN_TRANSIT",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| DomainError::validation(format!("unknown order status: {s}")))
    }
}
