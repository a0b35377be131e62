//! Picking and loading instructions for warehouse staff.
//!
//! Locations are visited in lexicographic order of their code, which stands
//! in for a real walk through the warehouse graph.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use logiflow_orders::{Order, OrderItem};

pub const BASE_ITEM_MINUTES: u32 = 3;
pub const LARGE_QUANTITY_ITEM_MINUTES: u32 = 2;
pub const HEAVY_ITEM_MINUTES: u32 = 3;
pub const FRAGILE_ITEM_MINUTES: u32 = 2;
/// Quantity above which picking an item takes longer.
pub const LARGE_QUANTITY_THRESHOLD: u32 = 5;
/// Quantity above which a pallet is suggested.
pub const BULK_QUANTITY_THRESHOLD: u32 = 10;
pub const WEIGHT_ALERT_THRESHOLD_KG: f64 = 1000.0;

const LOADING_SEQUENCE: [&str; 5] = [
    "LOADING SEQUENCE:",
    "1. Heavy construction materials first (truck floor)",
    "2. Medium weight items in the middle sections",
    "3. Fragile tiles last, on top with extra protection",
    "4. Small items fill the remaining space",
];

const SPECIAL_HANDLING_NOTES: [&str; 3] = [
    "SPECIAL HANDLING REQUIRED:",
    "- Fragile or heavy items on this order",
    "- Extra packaging material may be needed",
];

/// Walking time from dispatch to a location, keyed by its zone letter.
pub fn travel_minutes(location: &str) -> u32 {
    match location.chars().next() {
        Some('A') => 2,
        Some('B') => 4,
        Some('C') => 6,
        Some('D') => 8,
        _ => 5,
    }
}

pub fn item_picking_minutes(item: &OrderItem) -> u32 {
    let mut minutes = BASE_ITEM_MINUTES;
    if item.quantity > LARGE_QUANTITY_THRESHOLD {
        minutes += LARGE_QUANTITY_ITEM_MINUTES;
    }
    if item.product.is_heavy() {
        minutes += HEAVY_ITEM_MINUTES;
    }
    if item.product.is_fragile() {
        minutes += FRAGILE_ITEM_MINUTES;
    }
    minutes
}

/// One location on the picking route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickStop {
    pub location: String,
    pub travel_minutes: u32,
    /// `(sku, quantity)` in order of appearance on the order.
    pub picks: Vec<(String, u32)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickingPlan {
    pub text: String,
    pub requires_special_handling: bool,
    pub estimated_picking_minutes: u32,
    pub route: Vec<PickStop>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WarehouseAgent;

impl WarehouseAgent {
    pub fn new() -> Self {
        Self
    }

    /// Pure function of the order: calling it twice yields the same plan.
    pub fn generate_instructions(&self, order: &Order) -> PickingPlan {
        let mut by_location: BTreeMap<&str, Vec<&OrderItem>> = BTreeMap::new();
        for item in order.items() {
            by_location
                .entry(item.product.location.as_str())
                .or_default()
                .push(item);
        }

        let mut lines = vec![
            format!("PICKING INSTRUCTIONS FOR ORDER #{}", order.id_typed()),
            format!("Client: {}", order.client_name()),
            format!("Delivery: {}", order.delivery_address()),
            String::new(),
            "PICKING ROUTE:".to_string(),
            "Visit locations in the order listed.".to_string(),
            String::new(),
        ];

        let mut route = Vec::with_capacity(by_location.len());
        let mut total_minutes = 0u32;
        let mut line_no = 1usize;

        for (location, items) in &by_location {
            let travel = travel_minutes(location);
            total_minutes += travel;

            let shown = if location.is_empty() { "(unassigned)" } else { location };
            lines.push(format!("Location: {shown}"));
            lines.push(format!("Estimated travel time: {travel} minutes"));

            let mut picks = Vec::with_capacity(items.len());
            for item in items {
                let product = &item.product;
                lines.push(format!(
                    "{line_no}. Pick {} x {} (SKU: {})",
                    item.quantity, product.name, product.sku
                ));
                if product.is_heavy() {
                    lines.push(format!(
                        "    HEAVY ITEM ({:.1}kg) - Use forklift or lifting equipment",
                        product.unit_weight_kg
                    ));
                }
                if product.is_fragile() {
                    lines.push("    FRAGILE - Handle with care, use protective packaging".to_string());
                }
                if item.quantity > BULK_QUANTITY_THRESHOLD {
                    lines.push("    LARGE QUANTITY - Consider using pallet".to_string());
                }

                total_minutes += item_picking_minutes(item);
                picks.push((product.sku.clone(), item.quantity));
                line_no += 1;
            }
            lines.push(String::new());

            route.push(PickStop {
                location: location.to_string(),
                travel_minutes: travel,
                picks,
            });
        }

        lines.extend(LOADING_SEQUENCE.iter().map(|l| l.to_string()));
        lines.push(String::new());

        let total_weight = order.total_weight_kg();
        if total_weight > WEIGHT_ALERT_THRESHOLD_KG {
            lines.push(format!(
                "WEIGHT ALERT: Total order weight is {total_weight:.1}kg - check truck capacity and weight distribution"
            ));
            lines.push(String::new());
        }

        let requires_special_handling = order.requires_special_handling();
        if requires_special_handling {
            lines.extend(SPECIAL_HANDLING_NOTES.iter().map(|l| l.to_string()));
            lines.push(String::new());
        }

        lines.push(format!("Estimated total picking time: {total_minutes} minutes"));
        lines.push(format!(
            "Order summary: {} items, {:.1}kg, {:.2}m³",
            order.items().len(),
            total_weight,
            order.total_volume_m3()
        ));
        lines.push(String::new());
        let text = lines.join("\n");

        PickingPlan {
            text,
            requires_special_handling,
            estimated_picking_minutes: total_minutes,
            route,
        }
    }
}
