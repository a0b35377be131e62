//! Autonomous monitoring: periodic sweeps over orders, shipments and
//! products that self-heal stuck work, adjust delivery estimates, reorder
//! stock and raise anomaly alerts.
//!
//! [`MonitoringEngine`] runs each sweep synchronously; [`MonitoringRunner`]
//! schedules them independently on tokio.

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod engine;
pub mod runner;

pub use engine::MonitoringEngine;
pub use runner::{MonitoringHandle, MonitoringRunner};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sweep {
    StuckOrders,
    DeliveryPredictions,
    Reorder,
    AnomalyDetection,
    RouteOptimization,
}

impl Sweep {
    pub const ALL: [Sweep; 5] = [
        Sweep::StuckOrders,
        Sweep::DeliveryPredictions,
        Sweep::Reorder,
        Sweep::AnomalyDetection,
        Sweep::RouteOptimization,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Sweep::StuckOrders => "stuck_orders",
            Sweep::DeliveryPredictions => "delivery_predictions",
            Sweep::Reorder => "reorder",
            Sweep::AnomalyDetection => "anomaly_detection",
            Sweep::RouteOptimization => "route_optimization",
        }
    }
}

impl fmt::Display for Sweep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sweep {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Sweep::ALL
            .into_iter()
            .find(|sweep| sweep.as_str() == normalized)
            .ok_or_else(|| format!("unknown sweep: {s}"))
    }
}

/// What one sweep did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub sweep: Sweep,
    pub started_at: DateTime<Utc>,
    /// Entities looked at.
    pub examined: usize,
    /// Entities changed automatically (advanced, rescheduled, restocked).
    pub acted: usize,
    /// Alerts raised for manual follow-up.
    pub escalated: usize,
    /// Per-entity failures that were logged and skipped.
    pub errors: usize,
}

impl SweepReport {
    pub fn new(sweep: Sweep, started_at: DateTime<Utc>) -> Self {
        Self {
            sweep,
            started_at,
            examined: 0,
            acted: 0,
            escalated: 0,
            errors: 0,
        }
    }
}
