//! Read-only availability check with the safety-stock advisory.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use logiflow_core::ProductId;
use logiflow_orders::Order;

use crate::error::AgentError;
use crate::ports::{ProductRepository, StoreError};

/// Advisory raised when a reservation would dip below safety stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockWarning {
    pub sku: String,
    pub remaining: u32,
    pub safety_stock: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityReport {
    pub available: bool,
    pub message: String,
    pub warnings: Vec<StockWarning>,
}

impl AvailabilityReport {
    fn unavailable(message: String, warnings: Vec<StockWarning>) -> Self {
        Self {
            available: false,
            message,
            warnings,
        }
    }
}

/// Groups order lines by product so repeated SKUs are checked against their
/// combined quantity.
pub(crate) fn demand_by_product(order: &Order) -> BTreeMap<ProductId, (String, u32)> {
    let mut demand: BTreeMap<ProductId, (String, u32)> = BTreeMap::new();
    for item in order.items() {
        let entry = demand
            .entry(item.product.product_id)
            .or_insert_with(|| (item.product.sku.clone(), 0));
        entry.1 = entry.1.saturating_add(item.quantity);
    }
    demand
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InventoryAgent;

impl InventoryAgent {
    pub fn new() -> Self {
        Self
    }

    /// Fails fast on the first missing product or shortfall. Safety-stock
    /// warnings never fail the check.
    pub fn check_availability<P>(
        &self,
        products: &P,
        order: &Order,
    ) -> Result<AvailabilityReport, AgentError>
    where
        P: ProductRepository + ?Sized,
    {
        let mut warnings = Vec::new();

        for (product_id, (sku, requested)) in demand_by_product(order) {
            let Some(product) = products.get(product_id)? else {
                return Ok(AvailabilityReport::unavailable(
                    format!("Product not found: {sku}"),
                    warnings,
                ));
            };

            if !product.can_supply(requested) {
                return Ok(AvailabilityReport::unavailable(
                    StoreError::insufficient_stock(&product, requested).to_string(),
                    warnings,
                ));
            }

            let remaining = product.stock() - requested;
            let safety_stock = product.safety_stock();
            if remaining < safety_stock {
                warn!(
                    order_id = %order.id_typed(),
                    sku = %product.sku(),
                    remaining,
                    safety_stock,
                    "reservation would fall below safety stock"
                );
                warnings.push(StockWarning {
                    sku: product.sku().to_string(),
                    remaining,
                    safety_stock,
                });
            }
        }

        Ok(AvailabilityReport {
            available: true,
            message: "All items available".to_string(),
            warnings,
        })
    }
}
