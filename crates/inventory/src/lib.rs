//! Inventory domain module.
//!
//! Products are plain versioned entities: stock is mutated in place by the
//! fulfillment and reorder paths, and the product store is responsible for
//! making those mutations atomic. The rules here (what a reservation may do,
//! what counts as heavy or fragile, the safety-stock buffer) are pure.

pub mod category;
pub mod product;

pub use category::ProductCategory;
pub use product::{
    BASE_SAFETY_STOCK, CONSTRUCTION_SAFETY_BONUS, HEAVY_ITEM_THRESHOLD_KG, HEAVY_SAFETY_BONUS,
    NewProduct, Product, TILES_SAFETY_BONUS,
};
