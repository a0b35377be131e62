//! Order validation: rejects malformed or non-compliant orders before any
//! stock is touched.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use logiflow_orders::Order;

pub const DEFAULT_MAX_ITEMS: usize = 50;
pub const DEFAULT_MIN_LEAD_TIME_HOURS: i64 = 24;

/// Address keywords that place a delivery inside the service region.
pub const DEFAULT_REGION_KEYWORDS: [&str; 6] =
    ["germany", "deutschland", "hamburg", "berlin", "munich", "köln"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRules {
    pub max_items: usize,
    pub min_lead_time_hours: i64,
    pub region_keywords: Vec<String>,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            max_items: DEFAULT_MAX_ITEMS,
            min_lead_time_hours: DEFAULT_MIN_LEAD_TIME_HOURS,
            region_keywords: DEFAULT_REGION_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub reason: Option<String>,
}

impl ValidationOutcome {
    pub fn valid() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationAgent {
    rules: ValidationRules,
}

impl ValidationAgent {
    pub fn new(rules: ValidationRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    /// First failing rule wins; the order of checks is part of the contract
    /// because the reason string is shown to the client.
    pub fn validate(&self, order: &Order, now: DateTime<Utc>) -> ValidationOutcome {
        if order.items().is_empty() {
            return ValidationOutcome::rejected("Order contains no items");
        }
        if order.delivery_address().trim().is_empty() {
            return ValidationOutcome::rejected("Invalid delivery address");
        }
        if order.requested_delivery() < now + Duration::hours(self.rules.min_lead_time_hours) {
            return ValidationOutcome::rejected(format!(
                "Delivery date must be at least {} in advance",
                describe_lead_time(self.rules.min_lead_time_hours)
            ));
        }
        if order.client_id().trim().is_empty() {
            return ValidationOutcome::rejected("Client ID is required");
        }
        if order.client_name().trim().is_empty() {
            return ValidationOutcome::rejected("Client name is required");
        }
        if order.items().len() > self.rules.max_items {
            return ValidationOutcome::rejected(format!(
                "Order too large - maximum {} items per order",
                self.rules.max_items
            ));
        }
        if order.items().iter().any(|i| i.quantity == 0) {
            return ValidationOutcome::rejected("Item quantity must be positive");
        }
        if !self.in_service_region(order.delivery_address()) {
            return ValidationOutcome::rejected("Delivery address must be in Germany");
        }

        ValidationOutcome::valid()
    }

    fn in_service_region(&self, address: &str) -> bool {
        let address = address.to_lowercase();
        self.rules
            .region_keywords
            .iter()
            .any(|k| address.contains(&k.to_lowercase()))
    }
}

fn describe_lead_time(hours: i64) -> String {
    match hours {
        24 => "1 day".to_string(),
        h if h % 24 == 0 => format!("{} days", h / 24),
        1 => "1 hour".to_string(),
        h => format!("{h} hours"),
    }
}
