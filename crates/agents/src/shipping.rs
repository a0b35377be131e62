//! Carrier assignment and pickup/delivery windows.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use tracing::info;

use logiflow_core::ShipmentId;
use logiflow_orders::Order;
use logiflow_shipping::{NewShipment, Shipment};

use crate::error::AgentError;
use crate::ports::ShipmentRepository;
use crate::warehouse::PickingPlan;

pub const LARGE_TRUCK_WEIGHT_KG: f64 = 2000.0;
pub const LARGE_TRUCK_VOLUME_M3: f64 = 25.0;
pub const MEDIUM_TRUCK_WEIGHT_KG: f64 = 800.0;
pub const MEDIUM_TRUCK_VOLUME_M3: f64 = 15.0;

pub const HEAVY_LOAD_DRIVER_WEIGHT_KG: f64 = 1500.0;
/// Deliveries requested within this window go to the express pool.
pub const URGENT_WINDOW_HOURS: i64 = 48;

pub const BASE_PREPARATION_HOURS: i64 = 2;
pub const SPECIAL_HANDLING_PREPARATION_HOURS: i64 = 1;

pub const BUSINESS_OPEN_HOUR: u32 = 8;
pub const BUSINESS_CLOSE_HOUR: u32 = 18;

pub const BASE_TRANSIT_HOURS: i64 = 4;
pub const HEAVY_ORDER_TRANSIT_WEIGHT_KG: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TruckClass {
    Large,
    Medium,
    Fragile,
    Small,
}

impl TruckClass {
    /// Weight/volume tiers win over fragility: a fragile load that is too big
    /// for the fragile truck still needs a large or medium one.
    pub fn select(total_weight_kg: f64, total_volume_m3: f64, has_fragile_items: bool) -> Self {
        if total_weight_kg > LARGE_TRUCK_WEIGHT_KG || total_volume_m3 > LARGE_TRUCK_VOLUME_M3 {
            TruckClass::Large
        } else if total_weight_kg > MEDIUM_TRUCK_WEIGHT_KG || total_volume_m3 > MEDIUM_TRUCK_VOLUME_M3 {
            TruckClass::Medium
        } else if has_fragile_items {
            TruckClass::Fragile
        } else {
            TruckClass::Small
        }
    }

    pub fn truck_id(self) -> &'static str {
        match self {
            TruckClass::Large => "TRUCK_LARGE_001",
            TruckClass::Medium => "TRUCK_MEDIUM_002",
            TruckClass::Fragile => "TRUCK_FRAGILE_003",
            TruckClass::Small => "TRUCK_SMALL_004",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriverPool {
    FragileSpecialist,
    HeavyLoads,
    Express,
    General,
}

impl DriverPool {
    pub fn select(order: &Order, now: DateTime<Utc>) -> Self {
        if order.has_fragile_items() {
            DriverPool::FragileSpecialist
        } else if order.total_weight_kg() > HEAVY_LOAD_DRIVER_WEIGHT_KG {
            DriverPool::HeavyLoads
        } else if order.requested_delivery() < now + Duration::hours(URGENT_WINDOW_HOURS) {
            DriverPool::Express
        } else {
            DriverPool::General
        }
    }

    pub fn driver_id(self) -> &'static str {
        match self {
            DriverPool::FragileSpecialist => "DRIVER_FRAGILE_SPECIALIST_001",
            DriverPool::HeavyLoads => "DRIVER_HEAVY_LOADS_002",
            DriverPool::Express => "DRIVER_EXPRESS_003",
            DriverPool::General => "DRIVER_GENERAL_004",
        }
    }
}

/// Roll `at` forward to the next instant inside business hours (UTC,
/// Monday to Friday).
pub fn clamp_to_business_hours(at: DateTime<Utc>) -> DateTime<Utc> {
    let open = NaiveTime::from_hms_opt(BUSINESS_OPEN_HOUR, 0, 0).unwrap_or(NaiveTime::MIN);
    let mut candidate = at;

    loop {
        let is_weekend = matches!(candidate.weekday(), Weekday::Sat | Weekday::Sun);
        if is_weekend || candidate.hour() >= BUSINESS_CLOSE_HOUR {
            let next_day = candidate.date_naive() + Duration::days(1);
            candidate = next_day.and_time(open).and_utc();
        } else if candidate.hour() < BUSINESS_OPEN_HOUR {
            candidate = candidate.date_naive().and_time(open).and_utc();
        } else {
            return candidate;
        }
    }
}

/// Estimated road time for the order, driven by weight, fragility and the
/// destination city found in the address.
pub fn transit_hours(order: &Order) -> i64 {
    let mut hours = BASE_TRANSIT_HOURS;
    if order.total_weight_kg() > HEAVY_ORDER_TRANSIT_WEIGHT_KG {
        hours += 1;
    }
    if order.has_fragile_items() {
        hours += 1;
    }

    let address = order.delivery_address().to_lowercase();
    hours += if address.contains("hamburg") {
        2
    } else if address.contains("berlin") || address.contains("munich") || address.contains("münchen") {
        6
    } else {
        4
    };
    hours
}

pub fn preparation_hours(plan: &PickingPlan) -> i64 {
    let mut hours = BASE_PREPARATION_HOURS + i64::from(plan.estimated_picking_minutes / 60);
    if plan.requires_special_handling {
        hours += SPECIAL_HANDLING_PREPARATION_HOURS;
    }
    hours
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ShippingAgent;

impl ShippingAgent {
    pub fn new() -> Self {
        Self
    }

    /// Decide truck, driver and timing without persisting anything.
    pub fn plan(&self, order: &Order, picking: &PickingPlan, now: DateTime<Utc>) -> NewShipment {
        let truck = TruckClass::select(
            order.total_weight_kg(),
            order.total_volume_m3(),
            order.has_fragile_items(),
        );
        let driver = DriverPool::select(order, now);

        let transit = Duration::hours(transit_hours(order));
        let earliest = clamp_to_business_hours(now + Duration::hours(preparation_hours(picking)));
        let latest = order.requested_delivery() - transit;
        let scheduled_pickup = earliest.max(latest);

        NewShipment {
            order_id: order.id_typed(),
            truck_id: truck.truck_id().to_string(),
            driver_id: driver.driver_id().to_string(),
            delivery_address: order.delivery_address().to_string(),
            scheduled_pickup,
            estimated_delivery: scheduled_pickup + transit,
            picking_instructions: picking.text.clone(),
            estimated_picking_minutes: picking.estimated_picking_minutes,
            requires_special_handling: picking.requires_special_handling,
        }
    }

    /// Plan and persist the shipment for `order`.
    pub fn schedule_shipment<S>(
        &self,
        shipments: &S,
        order: &Order,
        picking: &PickingPlan,
        now: DateTime<Utc>,
    ) -> Result<Shipment, AgentError>
    where
        S: ShipmentRepository + ?Sized,
    {
        let shipment = Shipment::schedule(ShipmentId::new(), self.plan(order, picking, now))?;
        let stored = shipments.insert(shipment)?;

        info!(
            order_id = %order.id_typed(),
            shipment_id = %stored.id_typed(),
            truck = stored.truck_id(),
            driver = stored.driver_id(),
            pickup = %stored.scheduled_pickup(),
            "shipment scheduled"
        );
        Ok(stored)
    }
}
