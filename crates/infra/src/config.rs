//! Configuration loading.
//!
//! Sources, later ones winning:
//! 1. built-in defaults (every section is `#[serde(default)]`)
//! 2. `config/default.toml` (optional)
//! 3. `config/<LOGIFLOW_ENV>.toml` (optional, `LOGIFLOW_ENV` defaults to `development`)
//! 4. `LOGIFLOW__SECTION__KEY` environment variables

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use logiflow_agents::ValidationRules;
use logiflow_agents::validation::{
    DEFAULT_MAX_ITEMS, DEFAULT_MIN_LEAD_TIME_HOURS, DEFAULT_REGION_KEYWORDS,
};
use logiflow_observability::LogFormat;

use crate::monitoring::Sweep;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogiflowConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Sweep cadences in seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Fixed seed for the simulated traffic/weather/demand draws.
    #[serde(default)]
    pub rng_seed: Option<u64>,
    #[serde(default = "default_stuck_orders_secs")]
    pub stuck_orders_secs: u64,
    #[serde(default = "default_delivery_predictions_secs")]
    pub delivery_predictions_secs: u64,
    #[serde(default = "default_anomaly_detection_secs")]
    pub anomaly_detection_secs: u64,
    #[serde(default = "default_route_optimization_secs")]
    pub route_optimization_secs: u64,
    #[serde(default = "default_reorder_secs")]
    pub reorder_secs: u64,
}

impl MonitoringConfig {
    pub fn interval(&self, sweep: Sweep) -> Duration {
        let secs = match sweep {
            Sweep::StuckOrders => self.stuck_orders_secs,
            Sweep::DeliveryPredictions => self.delivery_predictions_secs,
            Sweep::AnomalyDetection => self.anomaly_detection_secs,
            Sweep::RouteOptimization => self.route_optimization_secs,
            Sweep::Reorder => self.reorder_secs,
        };
        Duration::from_secs(secs.max(1))
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rng_seed: None,
            stuck_orders_secs: default_stuck_orders_secs(),
            delivery_predictions_secs: default_delivery_predictions_secs(),
            anomaly_detection_secs: default_anomaly_detection_secs(),
            route_optimization_secs: default_route_optimization_secs(),
            reorder_secs: default_reorder_secs(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_stuck_orders_secs() -> u64 {
    120
}

fn default_delivery_predictions_secs() -> u64 {
    300
}

fn default_anomaly_detection_secs() -> u64 {
    600
}

fn default_route_optimization_secs() -> u64 {
    900
}

fn default_reorder_secs() -> u64 {
    3600
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    #[serde(default = "default_min_lead_time_hours")]
    pub min_lead_time_hours: i64,
    #[serde(default = "default_region_keywords")]
    pub region_keywords: Vec<String>,
}

impl ValidationConfig {
    pub fn rules(&self) -> ValidationRules {
        ValidationRules {
            max_items: self.max_items,
            min_lead_time_hours: self.min_lead_time_hours,
            region_keywords: self.region_keywords.clone(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_items: default_max_items(),
            min_lead_time_hours: default_min_lead_time_hours(),
            region_keywords: default_region_keywords(),
        }
    }
}

fn default_max_items() -> usize {
    DEFAULT_MAX_ITEMS
}

fn default_min_lead_time_hours() -> i64 {
    DEFAULT_MIN_LEAD_TIME_HOURS
}

fn default_region_keywords() -> Vec<String> {
    DEFAULT_REGION_KEYWORDS.iter().map(|k| k.to_string()).collect()
}

impl LogiflowConfig {
    /// Load from `./config` and the process environment.
    pub fn load() -> anyhow::Result<Self> {
        let env_name =
            std::env::var("LOGIFLOW_ENV").unwrap_or_else(|_| "development".to_string());
        Self::load_from(Path::new("config"), &env_name)
    }

    pub fn load_from(config_dir: &Path, env_name: &str) -> anyhow::Result<Self> {
        let settings = Config::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{env_name}.toml"))).required(false))
            .add_source(
                Environment::with_prefix("LOGIFLOW")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("logiflow-config-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_files_fall_back_to_defaults() {
        let dir = scratch_dir("empty");
        let cfg = LogiflowConfig::load_from(&dir, "test").unwrap();

        assert_eq!(cfg.server.bind_addr, "0.0.0.0:8080");
        assert!(cfg.monitoring.enabled);
        assert_eq!(cfg.monitoring.interval(Sweep::StuckOrders), Duration::from_secs(120));
        assert_eq!(cfg.monitoring.interval(Sweep::Reorder), Duration::from_secs(3600));
        assert_eq!(cfg.validation.rules(), ValidationRules::default());
        assert_eq!(cfg.logging.format, LogFormat::Json);
    }

    #[test]
    fn environment_file_overrides_default_file() {
        let dir = scratch_dir("layered");
        fs::write(
            dir.join("default.toml"),
            "[monitoring]\nstuck_orders_secs = 30\nrng_seed = 7\n\n[validation]\nmax_items = 10\n",
        )
        .unwrap();
        fs::write(
            dir.join("staging.toml"),
            "[monitoring]\nstuck_orders_secs = 45\nenabled = false\n\n[logging]\nformat = \"pretty\"\n",
        )
        .unwrap();

        let cfg = LogiflowConfig::load_from(&dir, "staging").unwrap();
        assert_eq!(cfg.monitoring.stuck_orders_secs, 45);
        assert!(!cfg.monitoring.enabled);
        assert_eq!(cfg.monitoring.rng_seed, Some(7));
        assert_eq!(cfg.validation.max_items, 10);
        assert_eq!(cfg.validation.min_lead_time_hours, DEFAULT_MIN_LEAD_TIME_HOURS);
        assert_eq!(cfg.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn zero_interval_is_clamped_to_one_second() {
        let cfg = MonitoringConfig {
            route_optimization_secs: 0,
            ..MonitoringConfig::default()
        };
        assert_eq!(cfg.interval(Sweep::RouteOptimization), Duration::from_secs(1));
    }
}
