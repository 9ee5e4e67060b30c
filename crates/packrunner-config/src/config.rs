//! The unified configuration value.
//!
//! The source this engine is modeled on kept two parallel configuration
//! hierarchies (an "engine" config and a "bidirectional navigation" config)
//! that duplicated several keys. This crate unifies them into one value;
//! where both hierarchies set the same concept, `bidirectional_navigation`
//! wins (see `Config::effective_performance_monitoring`).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSection {
    #[serde(default = "default_sim_name")]
    pub name: String,
    #[serde(default = "default_sim_version")]
    pub version: String,
    #[serde(default)]
    pub description: String,
}

fn default_sim_name() -> String {
    "packrunner".to_string()
}

fn default_sim_version() -> String {
    "1.0".to_string()
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            name: default_sim_name(),
            version: default_sim_version(),
            description: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingSection {
    pub target_fps: u32,
    pub tick_interval: f64,
    pub simulation_speed: f64,
    pub max_delta_time: f64,
}

impl Default for TimingSection {
    fn default() -> Self {
        Self {
            target_fps: 60,
            tick_interval: 1.0 / 60.0,
            simulation_speed: 1.0,
            max_delta_time: 0.25,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineSection {
    pub event_queue_size: u32,
    pub max_concurrent_events: u32,
    pub performance_monitoring: bool,
    pub debug_prints: bool,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            event_queue_size: 1_000,
            max_concurrent_events: 100,
            performance_monitoring: true,
            debug_prints: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSection {
    pub target_frame_time_ms: f64,
    pub warning_frame_time_ms: f64,
    pub critical_frame_time_ms: f64,
}

impl Default for PerformanceSection {
    fn default() -> Self {
        Self {
            target_frame_time_ms: 1000.0 / 60.0,
            warning_frame_time_ms: 50.0,
            critical_frame_time_ms: 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseLocation {
    pub aisle: u32,
    pub rack: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WarehouseSection {
    pub aisles: u32,
    pub racks: u32,
    pub base_location: BaseLocation,
}

impl Default for WarehouseSection {
    fn default() -> Self {
        Self {
            aisles: 25,
            racks: 20,
            base_location: BaseLocation { aisle: 1, rack: 1 },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RobotSection {
    pub movement_speed: f64,
    pub animation_smoothing: f64,
    pub state_change_delay: f64,
}

impl Default for RobotSection {
    fn default() -> Self {
        Self {
            movement_speed: 1.0,
            animation_smoothing: 0.2,
            state_change_delay: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrdersSection {
    pub generation_interval: f64,
    pub max_items_per_order: u32,
    pub continuous_assignment: bool,
}

impl Default for OrdersSection {
    fn default() -> Self {
        Self {
            generation_interval: 30.0,
            max_items_per_order: 4,
            continuous_assignment: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathOptimizationSection {
    pub enable_shortest_path: bool,
    pub enable_direction_optimization: bool,
    pub enable_snake_pattern_integrity: bool,
    pub max_path_calculation_time: f64,
}

impl Default for PathOptimizationSection {
    fn default() -> Self {
        Self {
            enable_shortest_path: true,
            enable_direction_optimization: true,
            enable_snake_pattern_integrity: true,
            max_path_calculation_time: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavPerformanceMonitoringSection {
    pub enabled: bool,
    pub warning_threshold: f64,
    pub ratio_threshold: f64,
}

impl Default for NavPerformanceMonitoringSection {
    fn default() -> Self {
        Self {
            enabled: true,
            warning_threshold: 0.05,
            ratio_threshold: 0.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebuggingSection {
    pub log_level: String,
}

impl Default for DebuggingSection {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidirectionalNavigationSection {
    pub aisle_traversal_time: f64,
    pub direction_change_cooldown: f64,
    pub path_optimization: PathOptimizationSection,
    pub performance_monitoring: NavPerformanceMonitoringSection,
    pub debugging: DebuggingSection,
}

impl Default for BidirectionalNavigationSection {
    fn default() -> Self {
        Self {
            aisle_traversal_time: 7.0,
            direction_change_cooldown: 0.5,
            path_optimization: PathOptimizationSection::default(),
            performance_monitoring: NavPerformanceMonitoringSection::default(),
            debugging: DebuggingSection::default(),
        }
    }
}

/// The unified configuration value loaded from (or defaulted for) the JSON
/// configuration file described in §6.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub simulation: SimulationSection,
    #[serde(default)]
    pub timing: TimingSection,
    #[serde(default)]
    pub engine: EngineSection,
    #[serde(default)]
    pub performance: PerformanceSection,
    #[serde(default)]
    pub warehouse: WarehouseSection,
    #[serde(default)]
    pub robot: RobotSection,
    #[serde(default)]
    pub orders: OrdersSection,
    #[serde(default)]
    pub bidirectional_navigation: BidirectionalNavigationSection,
}

impl Config {
    /// §9: overlapping keys favor `bidirectional_navigation` when both
    /// sections set them. `engine.performance_monitoring` and
    /// `bidirectional_navigation.performance_monitoring.enabled` is the one
    /// concrete overlap carried into this unified value.
    pub fn effective_performance_monitoring(&self) -> bool {
        self.bidirectional_navigation.performance_monitoring.enabled
    }

    pub fn effective_aisle_traversal_time(&self) -> f64 {
        self.bidirectional_navigation.aisle_traversal_time
    }

    pub fn effective_direction_change_cooldown(&self) -> f64 {
        self.bidirectional_navigation.direction_change_cooldown
    }

    /// Names of the top-level sections that differ between `self` and
    /// `other`, in declaration order. Used to build the `CONFIG_CHANGED`
    /// event payload on `reload()`.
    pub fn changed_sections(&self, other: &Config) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if self.simulation != other.simulation {
            changed.push("simulation");
        }
        if self.timing != other.timing {
            changed.push("timing");
        }
        if self.engine != other.engine {
            changed.push("engine");
        }
        if self.performance != other.performance {
            changed.push("performance");
        }
        if self.warehouse != other.warehouse {
            changed.push("warehouse");
        }
        if self.robot != other.robot {
            changed.push("robot");
        }
        if self.orders != other.orders {
            changed.push("orders");
        }
        if self.bidirectional_navigation != other.bidirectional_navigation {
            changed.push("bidirectional_navigation");
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_spec_defaults() {
        let config = Config::default();
        assert_eq!(config.timing.target_fps, 60);
        assert_eq!(config.warehouse.aisles, 25);
        assert_eq!(config.warehouse.racks, 20);
        assert_eq!(config.orders.max_items_per_order, 4);
        assert_eq!(config.bidirectional_navigation.aisle_traversal_time, 7.0);
    }

    #[test]
    fn test_round_trips_through_json() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn test_changed_sections_detects_single_section() {
        let a = Config::default();
        let mut b = a.clone();
        b.orders.generation_interval = 60.0;
        assert_eq!(a.changed_sections(&b), vec!["orders"]);
    }

    #[test]
    fn test_changed_sections_empty_when_identical() {
        let a = Config::default();
        let b = a.clone();
        assert!(a.changed_sections(&b).is_empty());
    }

    #[test]
    fn test_effective_prefers_bidirectional_navigation() {
        let mut config = Config::default();
        config.engine.performance_monitoring = false;
        config.bidirectional_navigation.performance_monitoring.enabled = true;
        assert!(config.effective_performance_monitoring());
    }
}
