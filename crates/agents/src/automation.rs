//! Heuristics behind the monitoring sweeps.
//!
//! Everything here is a pure function of its inputs. Randomised estimates take
//! the RNG as a parameter so a seeded generator gives reproducible runs.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use logiflow_core::{ProductId, ShipmentId};
use logiflow_inventory::ProductCategory;
use logiflow_orders::{Order, OrderStatus};

pub const AUTO_ADVANCE_MAX_WEIGHT_KG: f64 = 100.0;
pub const AUTO_ADVANCE_MAX_ITEMS: usize = 3;
/// Live stock must cover this multiple of the ordered quantity.
pub const AUTO_ADVANCE_STOCK_FACTOR: u32 = 2;

/// Orders older than this multiple of their expected time are anomalous.
pub const ANOMALY_FACTOR: i32 = 2;
pub const DEMAND_SPIKE_FACTOR: u64 = 2;

pub const OVERDUE_RESCHEDULE_LIMIT_HOURS: i64 = 4;
pub const OVERDUE_RESCHEDULE_HOURS: i64 = 2;

pub const SIGNIFICANT_ETA_CHANGE_MINUTES: i64 = 30;

pub const LOW_STOCK_THRESHOLD: u32 = 50;
pub const DEMAND_JITTER: i64 = 12;
pub const REORDER_COVER_FACTOR: u32 = 3;

pub const ROUTE_FIRST_STOP_HOURS: i64 = 2;

/// How long an order is expected to sit in `status`. Terminal statuses have
/// no expectation.
pub fn expected_processing_time(status: OrderStatus) -> Option<Duration> {
    let hours = match status {
        OrderStatus::Received => 2,
        OrderStatus::Scheduled => 1,
        OrderStatus::Validated => 1,
        OrderStatus::InventoryChecked => 1,
        OrderStatus::Fulfilled => 3,
        OrderStatus::ReadyForPickup => 6,
        OrderStatus::Loading => 4,
        OrderStatus::InTransit => 24,
        OrderStatus::Delivered | OrderStatus::Cancelled => return None,
    };
    Some(Duration::hours(hours))
}

pub fn is_stuck(order: &Order, now: DateTime<Utc>) -> bool {
    expected_processing_time(order.status())
        .is_some_and(|expected| order.time_in_status(now) > expected)
}

/// Facts gathered by the engine that the stuck-order rules need.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvanceSignals {
    /// Result of re-running validation; consulted for `Scheduled` orders.
    pub validation_passed: Option<bool>,
    /// Current stock per product on the order.
    pub live_stock: BTreeMap<ProductId, u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StuckDecision {
    Advance { to: OrderStatus },
    Escalate { reason: String },
}

/// Decide what to do with a stuck order.
///
/// Every non-terminal status yields a decision; only terminal orders return
/// `None`.
pub fn decide_stuck_order(order: &Order, signals: &AdvanceSignals) -> Option<StuckDecision> {
    if order.is_terminal() {
        return None;
    }

    let Some(target) = order.status().auto_advance_target() else {
        return Some(StuckDecision::Escalate {
            reason: format!("no automatic successor for {}", order.status()),
        });
    };

    let (safe, why_not) = match order.status() {
        OrderStatus::Received => (
            order.total_weight_kg() < AUTO_ADVANCE_MAX_WEIGHT_KG
                && order.items().len() <= AUTO_ADVANCE_MAX_ITEMS,
            "order too large for automatic scheduling",
        ),
        OrderStatus::Scheduled => (
            signals.validation_passed == Some(true),
            "order does not pass validation",
        ),
        OrderStatus::Validated => (
            order.items().iter().all(|item| {
                signals
                    .live_stock
                    .get(&item.product.product_id)
                    .is_some_and(|stock| *stock > item.quantity.saturating_mul(AUTO_ADVANCE_STOCK_FACTOR))
            }),
            "stock margin too thin for automatic inventory check",
        ),
        OrderStatus::Fulfilled => (
            !order.requires_special_handling(),
            "order contains fragile or heavy items",
        ),
        _ => (false, "no automatic rule"),
    };

    Some(if safe {
        StuckDecision::Advance { to: target }
    } else {
        StuckDecision::Escalate {
            reason: why_not.to_string(),
        }
    })
}

/// Processing has taken more than twice the expected time since the order
/// was placed.
pub fn is_processing_anomalous(order: &Order, now: DateTime<Utc>) -> bool {
    match expected_processing_time(order.status()) {
        Some(expected) => now - order.order_date() > expected * ANOMALY_FACTOR,
        None => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverdueAction {
    Reschedule { new_eta: DateTime<Utc> },
    Escalate { hours_overdue: i64 },
}

/// What to do with an in-transit shipment whose ETA is already past.
pub fn overdue_action(eta: DateTime<Utc>, now: DateTime<Utc>) -> OverdueAction {
    let hours_overdue = (now - eta).num_hours();
    if hours_overdue < OVERDUE_RESCHEDULE_LIMIT_HOURS {
        OverdueAction::Reschedule {
            new_eta: now + Duration::hours(OVERDUE_RESCHEDULE_HOURS),
        }
    } else {
        OverdueAction::Escalate { hours_overdue }
    }
}

/// Simulated live factors applied to a delivery estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtaPrediction {
    pub traffic_minutes: i64,
    pub weather_minutes: i64,
    pub savings_minutes: i64,
    pub new_eta: DateTime<Utc>,
}

impl EtaPrediction {
    pub fn delta_minutes(&self) -> i64 {
        self.traffic_minutes + self.weather_minutes - self.savings_minutes
    }
}

/// Placeholder model: traffic 0..60, weather 0..30, optimisation savings
/// 0..20 minutes.
pub fn predict_delivery<R: Rng + ?Sized>(current_eta: DateTime<Utc>, rng: &mut R) -> EtaPrediction {
    let traffic_minutes = rng.gen_range(0..60);
    let weather_minutes = rng.gen_range(0..30);
    let savings_minutes = rng.gen_range(0..20);
    let delta = traffic_minutes + weather_minutes - savings_minutes;

    EtaPrediction {
        traffic_minutes,
        weather_minutes,
        savings_minutes,
        new_eta: current_eta + Duration::minutes(delta),
    }
}

pub fn is_significant_change(old: DateTime<Utc>, new: DateTime<Utc>) -> bool {
    (new - old).num_minutes().abs() > SIGNIFICANT_ETA_CHANGE_MINUTES
}

/// Base daily demand used for reorder planning.
pub fn base_daily_demand(category: &ProductCategory) -> u32 {
    match category {
        ProductCategory::Tiles => 50,
        ProductCategory::ConstructionMaterials => 75,
        ProductCategory::RoofingMaterials => 40,
        ProductCategory::PlumbingSupplies => 30,
        ProductCategory::Other(_) => 25,
    }
}

/// Baseline daily demand used to spot spikes.
pub fn historical_daily_demand(category: &ProductCategory) -> u64 {
    match category {
        ProductCategory::Tiles => 200,
        ProductCategory::ConstructionMaterials => 150,
        ProductCategory::RoofingMaterials => 100,
        ProductCategory::PlumbingSupplies => 75,
        ProductCategory::Other(_) => 50,
    }
}

pub fn predict_demand<R: Rng + ?Sized>(category: &ProductCategory, rng: &mut R) -> u32 {
    let jitter = rng.gen_range(-DEMAND_JITTER..=DEMAND_JITTER);
    let demand = i64::from(base_daily_demand(category)) + jitter;
    u32::try_from(demand.max(0)).unwrap_or(0)
}

/// Units to order, or `None` while stock still covers half a day of demand.
pub fn reorder_quantity(predicted_demand: u32, current_stock: u32) -> Option<u32> {
    if current_stock >= predicted_demand / 2 {
        return None;
    }
    let target = predicted_demand.saturating_mul(REORDER_COVER_FACTOR);
    match target.saturating_sub(current_stock) {
        0 => None,
        qty => Some(qty),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandSpike {
    pub category: ProductCategory,
    pub demand: u64,
    pub normal: u64,
}

/// Units ordered per category across `orders`.
pub fn category_demand(orders: &[Order]) -> BTreeMap<String, (ProductCategory, u64)> {
    let mut totals: BTreeMap<String, (ProductCategory, u64)> = BTreeMap::new();
    for item in orders.iter().flat_map(|o| o.items()) {
        let entry = totals
            .entry(item.product.category.as_str().to_string())
            .or_insert_with(|| (item.product.category.clone(), 0));
        entry.1 += u64::from(item.quantity);
    }
    totals
}

pub fn demand_spikes(orders: &[Order]) -> Vec<DemandSpike> {
    category_demand(orders)
        .into_values()
        .filter_map(|(category, demand)| {
            let normal = historical_daily_demand(&category);
            (demand > normal * DEMAND_SPIKE_FACTOR).then_some(DemandSpike {
                category,
                demand,
                normal,
            })
        })
        .collect()
}

/// Order the stops of one truck by address and give stop `i` an ETA of
/// `now + (2 + i)` hours. Address order is a proxy for proximity.
pub fn reoptimize_route(
    stops: &[(ShipmentId, String)],
    now: DateTime<Utc>,
) -> Vec<(ShipmentId, DateTime<Utc>)> {
    let mut ordered: Vec<&(ShipmentId, String)> = stops.iter().collect();
    ordered.sort_by(|a, b| a.1.cmp(&b.1));
    ordered
        .into_iter()
        .enumerate()
        .map(|(i, (id, _))| (*id, now + Duration::hours(ROUTE_FIRST_STOP_HOURS + i as i64)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{order_at_status, order_with, snapshot, test_time};
    use logiflow_orders::OrderItem;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn item(category: ProductCategory, weight: f64, quantity: u32) -> OrderItem {
        OrderItem {
            product: snapshot("SKU", category, weight, "A-1"),
            quantity,
            unit_price: 10,
        }
    }

    #[test]
    fn expected_times_cover_every_non_terminal_status() {
        for status in OrderStatus::ALL {
            assert_eq!(expected_processing_time(status).is_none(), status.is_terminal());
        }
    }

    #[test]
    fn received_small_orders_advance_large_ones_escalate() {
        let small = order_with(vec![item(ProductCategory::PlumbingSupplies, 10.0, 2)], |_| {});
        assert_eq!(
            decide_stuck_order(&small, &AdvanceSignals::default()),
            Some(StuckDecision::Advance { to: OrderStatus::Scheduled })
        );

        let heavy = order_with(vec![item(ProductCategory::PlumbingSupplies, 60.0, 2)], |_| {});
        assert!(matches!(
            decide_stuck_order(&heavy, &AdvanceSignals::default()),
            Some(StuckDecision::Escalate { .. })
        ));
    }

    #[test]
    fn scheduled_requires_passing_validation() {
        let order = order_at_status(vec![item(ProductCategory::Tiles, 1.0, 1)], OrderStatus::Scheduled);
        let mut signals = AdvanceSignals::default();
        assert!(matches!(
            decide_stuck_order(&order, &signals),
            Some(StuckDecision::Escalate { .. })
        ));
        signals.validation_passed = Some(true);
        assert_eq!(
            decide_stuck_order(&order, &signals),
            Some(StuckDecision::Advance { to: OrderStatus::Validated })
        );
    }

    #[test]
    fn validated_requires_double_stock_cover() {
        let order = order_at_status(vec![item(ProductCategory::Tiles, 1.0, 5)], OrderStatus::Validated);
        let pid = order.items()[0].product.product_id;

        let mut signals = AdvanceSignals::default();
        signals.live_stock.insert(pid, 10);
        assert!(matches!(
            decide_stuck_order(&order, &signals),
            Some(StuckDecision::Escalate { .. })
        ));

        signals.live_stock.insert(pid, 11);
        assert_eq!(
            decide_stuck_order(&order, &signals),
            Some(StuckDecision::Advance { to: OrderStatus::InventoryChecked })
        );
    }

    #[test]
    fn fulfilled_with_special_handling_escalates() {
        let order = order_at_status(vec![item(ProductCategory::Tiles, 1.0, 1)], OrderStatus::Fulfilled);
        assert!(matches!(
            decide_stuck_order(&order, &AdvanceSignals::default()),
            Some(StuckDecision::Escalate { .. })
        ));
        let plain = order_at_status(
            vec![item(ProductCategory::PlumbingSupplies, 1.0, 1)],
            OrderStatus::Fulfilled,
        );
        assert_eq!(
            decide_stuck_order(&plain, &AdvanceSignals::default()),
            Some(StuckDecision::Advance { to: OrderStatus::ReadyForPickup })
        );
    }

    #[test]
    fn decision_is_total_over_non_terminal_statuses() {
        for status in OrderStatus::ALL {
            let order = order_at_status(vec![item(ProductCategory::PlumbingSupplies, 1.0, 1)], status);
            let decision = decide_stuck_order(&order, &AdvanceSignals::default());
            assert_eq!(decision.is_none(), status.is_terminal(), "{status}");
        }
    }

    #[test]
    fn stuck_and_anomalous_thresholds() {
        let order = order_with(vec![item(ProductCategory::Tiles, 1.0, 1)], |_| {});
        assert!(!is_stuck(&order, test_time() + Duration::hours(2)));
        assert!(is_stuck(&order, test_time() + Duration::hours(2) + Duration::seconds(1)));
        assert!(!is_processing_anomalous(&order, test_time() + Duration::hours(4)));
        assert!(is_processing_anomalous(&order, test_time() + Duration::hours(5)));
    }

    #[test]
    fn overdue_deliveries() {
        let eta = test_time();
        assert_eq!(
            overdue_action(eta, eta + Duration::minutes(90)),
            OverdueAction::Reschedule { new_eta: eta + Duration::minutes(90) + Duration::hours(2) }
        );
        assert_eq!(
            overdue_action(eta, eta + Duration::hours(5)),
            OverdueAction::Escalate { hours_overdue: 5 }
        );
    }

    #[test]
    fn predictions_stay_in_bounds_and_are_reproducible() {
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let p = predict_delivery(test_time(), &mut a);
            assert_eq!(p, predict_delivery(test_time(), &mut b));
            assert!((0..60).contains(&p.traffic_minutes));
            assert!((0..30).contains(&p.weather_minutes));
            assert!((0..20).contains(&p.savings_minutes));
            assert_eq!(p.new_eta, test_time() + Duration::minutes(p.delta_minutes()));
        }
    }

    #[test]
    fn significance_threshold_is_strict() {
        assert!(!is_significant_change(test_time(), test_time() + Duration::minutes(30)));
        assert!(is_significant_change(test_time(), test_time() + Duration::minutes(31)));
        assert!(is_significant_change(test_time(), test_time() - Duration::minutes(45)));
    }

    #[test]
    fn demand_prediction_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..200 {
            let d = predict_demand(&ProductCategory::ConstructionMaterials, &mut rng);
            assert!((63..=87).contains(&d));
        }
    }

    #[test]
    fn reorder_gate_and_quantity() {
        assert_eq!(reorder_quantity(50, 25), None);
        assert_eq!(reorder_quantity(50, 24), Some(126));
        assert_eq!(reorder_quantity(0, 0), None);
    }

    #[test]
    fn demand_spikes_compare_against_baseline() {
        let orders = vec![
            order_with(vec![item(ProductCategory::PlumbingSupplies, 1.0, 100)], |_| {}),
            order_with(vec![item(ProductCategory::PlumbingSupplies, 1.0, 51)], |_| {}),
            order_with(vec![item(ProductCategory::Tiles, 1.0, 400)], |_| {}),
        ];
        let spikes = demand_spikes(&orders);
        assert_eq!(
            spikes,
            vec![DemandSpike {
                category: ProductCategory::PlumbingSupplies,
                demand: 151,
                normal: 75
            }]
        );
    }

    #[test]
    fn route_stops_are_sorted_by_address() {
        let (a, b, c) = (ShipmentId::new(), ShipmentId::new(), ShipmentId::new());
        let plan = reoptimize_route(
            &[
                (a, "Zeil 1, Frankfurt".into()),
                (b, "Alexanderplatz 1, Berlin".into()),
                (c, "Marienplatz 1, Munich".into()),
            ],
            test_time(),
        );
        assert_eq!(
            plan,
            vec![
                (b, test_time() + Duration::hours(2)),
                (c, test_time() + Duration::hours(3)),
                (a, test_time() + Duration::hours(4)),
            ]
        );
    }
}
