//! Stock reservation for an order.
//!
//! The whole order is reserved through a single `reserve_all` call: every
//! line is checked before any stock moves, so a failed order never leaves
//! inventory partially decremented.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use logiflow_orders::Order;

use crate::error::AgentError;
use crate::inventory::demand_by_product;
use crate::ports::{ProductRepository, Reservation, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillmentOutcome {
    pub success: bool,
    pub message: String,
    /// `(sku, quantity)` pairs that were decremented; empty on failure.
    pub reserved: Vec<(String, u32)>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FulfillmentAgent;

impl FulfillmentAgent {
    pub fn new() -> Self {
        Self
    }

    pub fn fulfill<P>(&self, products: &P, order: &Order) -> Result<FulfillmentOutcome, AgentError>
    where
        P: ProductRepository + ?Sized,
    {
        let lines: Vec<Reservation> = demand_by_product(order)
            .into_iter()
            .map(|(product_id, (sku, quantity))| Reservation {
                product_id,
                sku,
                quantity,
            })
            .collect();

        if lines.is_empty() {
            return Err(AgentError::InvalidInput(
                "cannot fulfill an order without items".to_string(),
            ));
        }

        match products.reserve_all(&lines) {
            Ok(updated) => {
                for p in &updated {
                    debug!(order_id = %order.id_typed(), sku = %p.sku(), stock = p.stock(), "stock reserved");
                }
                info!(order_id = %order.id_typed(), lines = lines.len(), "order fulfilled");
                Ok(FulfillmentOutcome {
                    success: true,
                    message: format!("Reserved {} product line(s)", lines.len()),
                    reserved: lines.into_iter().map(|l| (l.sku, l.quantity)).collect(),
                })
            }
            Err(err @ StoreError::InsufficientStock { .. }) => Ok(FulfillmentOutcome {
                success: false,
                message: err.to_string(),
                reserved: Vec::new(),
            }),
            Err(StoreError::NotFound(what)) => Ok(FulfillmentOutcome {
                success: false,
                message: format!("Product not found: {what}"),
                reserved: Vec::new(),
            }),
            Err(other) => Err(other.into()),
        }
    }
}
