use serde::{Deserialize, Serialize};

use logiflow_core::{Entity, ProductId};
use logiflow_inventory::{HEAVY_ITEM_THRESHOLD_KG, Product, ProductCategory};

/// Product attributes captured when the item was ordered.
///
/// Weight, volume and handling class are frozen on the order so totals stay
/// stable; stock is always read live from the product store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub product_id: ProductId,
    pub sku: String,
    pub name: String,
    pub category: ProductCategory,
    pub unit_weight_kg: f64,
    pub unit_volume_m3: f64,
    pub location: String,
}

impl ProductSnapshot {
    pub fn of(product: &Product) -> Self {
        Self {
            product_id: *product.id(),
            sku: product.sku().to_string(),
            name: product.name().to_string(),
            category: product.category().clone(),
            unit_weight_kg: product.unit_weight_kg(),
            unit_volume_m3: product.unit_volume_m3(),
            location: product.location().to_string(),
        }
    }

    pub fn is_heavy(&self) -> bool {
        self.unit_weight_kg > HEAVY_ITEM_THRESHOLD_KG
    }

    pub fn is_fragile(&self) -> bool {
        self.category.is_fragile()
    }
}

/// Order line: product, quantity, unit price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product: ProductSnapshot,
    pub quantity: u32,
    /// Price in smallest currency unit (e.g., cents).
    pub unit_price: i64,
}

impl OrderItem {
    pub fn new(product: &Product, quantity: u32) -> Self {
        Self {
            product: ProductSnapshot::of(product),
            quantity,
            unit_price: product.unit_price(),
        }
    }

    pub fn weight_kg(&self) -> f64 {
        self.product.unit_weight_kg * f64::from(self.quantity)
    }

    pub fn volume_m3(&self) -> f64 {
        self.product.unit_volume_m3 * f64::from(self.quantity)
    }

    pub fn line_total(&self) -> i64 {
        self.unit_price.saturating_mul(i64::from(self.quantity))
    }
}
