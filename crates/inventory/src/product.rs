use serde::{Deserialize, Serialize};

use logiflow_core::{DomainError, DomainResult, Entity, ProductId};

use crate::category::ProductCategory;

/// Unit weight above which a product needs lifting equipment.
pub const HEAVY_ITEM_THRESHOLD_KG: f64 = 50.0;

pub const BASE_SAFETY_STOCK: u32 = 10;
pub const TILES_SAFETY_BONUS: u32 = 20;
pub const CONSTRUCTION_SAFETY_BONUS: u32 = 15;
pub const HEAVY_SAFETY_BONUS: u32 = 10;

/// Input for registering a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub category: ProductCategory,
    pub unit_weight_kg: f64,
    pub unit_volume_m3: f64,
    /// Unit price in minor currency units.
    pub unit_price: i64,
    pub stock: u32,
    pub location: String,
}

/// A stocked product.
///
/// `stock` is unsigned: a reservation that would take it below zero is
/// rejected, never clamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    sku: String,
    name: String,
    category: ProductCategory,
    unit_weight_kg: f64,
    unit_volume_m3: f64,
    unit_price: i64,
    stock: u32,
    location: String,
    version: u64,
}

impl Product {
    pub fn new(id: ProductId, input: NewProduct) -> DomainResult<Self> {
        let sku = input.sku.trim().to_string();
        if sku.is_empty() {
            return Err(DomainError::validation("sku cannot be empty"));
        }
        if input.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if !input.unit_weight_kg.is_finite() || input.unit_weight_kg < 0.0 {
            return Err(DomainError::validation("unit weight must be a non-negative number"));
        }
        if !input.unit_volume_m3.is_finite() || input.unit_volume_m3 < 0.0 {
            return Err(DomainError::validation("unit volume must be a non-negative number"));
        }
        if input.unit_price < 0 {
            return Err(DomainError::validation("unit price cannot be negative"));
        }

        Ok(Self {
            id,
            sku,
            name: input.name.trim().to_string(),
            category: input.category,
            unit_weight_kg: input.unit_weight_kg,
            unit_volume_m3: input.unit_volume_m3,
            unit_price: input.unit_price,
            stock: input.stock,
            location: input.location.trim().to_string(),
            version: 0,
        })
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &ProductCategory {
        &self.category
    }

    pub fn unit_weight_kg(&self) -> f64 {
        self.unit_weight_kg
    }

    pub fn unit_volume_m3(&self) -> f64 {
        self.unit_volume_m3
    }

    pub fn unit_price(&self) -> i64 {
        self.unit_price
    }

    pub fn stock(&self) -> u32 {
        self.stock
    }

    /// Warehouse location code, e.g. `A-12-3`.
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn is_heavy(&self) -> bool {
        self.unit_weight_kg > HEAVY_ITEM_THRESHOLD_KG
    }

    pub fn is_fragile(&self) -> bool {
        self.category.is_fragile()
    }

    /// Minimum buffer below which a reservation raises an advisory warning.
    pub fn safety_stock(&self) -> u32 {
        let mut threshold = BASE_SAFETY_STOCK;
        match self.category {
            ProductCategory::Tiles => threshold += TILES_SAFETY_BONUS,
            ProductCategory::ConstructionMaterials => threshold += CONSTRUCTION_SAFETY_BONUS,
            _ => {}
        }
        if self.is_heavy() {
            threshold += HEAVY_SAFETY_BONUS;
        }
        threshold
    }

    pub fn can_supply(&self, quantity: u32) -> bool {
        self.stock >= quantity
    }

    /// Decrement stock by `quantity`, refusing to go below zero.
    pub fn reserve(&mut self, quantity: u32) -> DomainResult<()> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        self.stock = self.stock.checked_sub(quantity).ok_or_else(|| {
            DomainError::invariant(format!(
                "stock cannot go negative (sku: {}, available: {}, requested: {})",
                self.sku, self.stock, quantity
            ))
        })?;
        Ok(())
    }

    pub fn restock(&mut self, quantity: u32) -> DomainResult<()> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        self.stock = self
            .stock
            .checked_add(quantity)
            .ok_or_else(|| DomainError::invariant("stock overflow"))?;
        Ok(())
    }

    /// Set by the store when a row is persisted.
    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(category: ProductCategory, weight: f64, stock: u32) -> NewProduct {
        NewProduct {
            sku: "TIL-001".into(),
            name: "Ceramic floor tile".into(),
            category,
            unit_weight_kg: weight,
            unit_volume_m3: 0.02,
            unit_price: 1_250,
            stock,
            location: "A-01-1".into(),
        }
    }

    fn product(category: ProductCategory, weight: f64, stock: u32) -> Product {
        Product::new(ProductId::new(), input(category, weight, stock)).unwrap()
    }

    #[test]
    fn rejects_blank_sku_and_negative_weight() {
        let mut bad = input(ProductCategory::Tiles, 1.0, 5);
        bad.sku = "  ".into();
        assert!(matches!(
            Product::new(ProductId::new(), bad),
            Err(DomainError::Validation(_))
        ));

        let bad = input(ProductCategory::Tiles, -1.0, 5);
        assert!(Product::new(ProductId::new(), bad).is_err());
    }

    #[test]
    fn safety_stock_stacks_category_and_weight_bonuses() {
        assert_eq!(product(ProductCategory::PlumbingSupplies, 5.0, 0).safety_stock(), 10);
        assert_eq!(product(ProductCategory::Tiles, 5.0, 0).safety_stock(), 30);
        assert_eq!(product(ProductCategory::ConstructionMaterials, 60.0, 0).safety_stock(), 35);
        assert_eq!(product(ProductCategory::RoofingMaterials, 50.0, 0).safety_stock(), 10);
    }

    #[test]
    fn heavy_threshold_is_strict() {
        assert!(!product(ProductCategory::Tiles, 50.0, 0).is_heavy());
        assert!(product(ProductCategory::Tiles, 50.5, 0).is_heavy());
    }

    #[test]
    fn reserve_refuses_to_go_negative() {
        let mut p = product(ProductCategory::Tiles, 1.0, 3);
        p.reserve(2).unwrap();
        match p.reserve(2) {
            Err(DomainError::InvariantViolation(msg)) => assert!(msg.contains("available: 1")),
            other => panic!("expected invariant violation, got {other:?}"),
        }
        assert_eq!(p.stock(), 1);
    }

    #[test]
    fn zero_quantities_are_rejected() {
        let mut p = product(ProductCategory::Tiles, 1.0, 3);
        assert!(p.reserve(0).is_err());
        assert!(p.restock(0).is_err());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Reserve(u32),
            Restock(u32),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (1u32..200).prop_map(Op::Reserve),
                (1u32..200).prop_map(Op::Restock),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Property: stock equals the start value plus every accepted change, never below zero.
            #[test]
            fn stock_tracks_accepted_operations(
                start in 0u32..500,
                ops in prop::collection::vec(op(), 0..40)
            ) {
                let mut p = product(ProductCategory::Other("MISC".into()), 2.0, start);
                let mut expected = start as i64;

                for op in ops {
                    match op {
                        Op::Reserve(q) => {
                            let ok = p.reserve(q).is_ok();
                            prop_assert_eq!(ok, expected >= q as i64);
                            if ok {
                                expected -= q as i64;
                            }
                        }
                        Op::Restock(q) => {
                            p.restock(q).unwrap();
                            expected += q as i64;
                        }
                    }
                    prop_assert!(expected >= 0);
                    prop_assert_eq!(p.stock() as i64, expected);
                }
            }
        }
    }
}
