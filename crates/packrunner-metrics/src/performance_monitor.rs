//! The Performance Monitor (§4.11): bounded samples of planner cost,
//! direction-change cooldown compliance, and movement efficiency.

use serde::{Deserialize, Serialize};

use packrunner_core::SimTime;

use crate::ring_buffer::RingBuffer;

const SAMPLE_CAPACITY: usize = 100;

/// Which planner strategy produced a path, carried through from the
/// planner's own accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizationLevel {
    ShortestPath,
    DirectionOptimized,
    CooldownLimited,
}

impl OptimizationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ShortestPath => "shortest_path",
            Self::DirectionOptimized => "direction_optimized",
            Self::CooldownLimited => "cooldown_limited",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PathCalcSample {
    pub calc_time: f64,
    pub path_length: usize,
    pub direction_changes: usize,
    pub optimization_level: OptimizationLevel,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DirectionChangeSample {
    pub old: Option<packrunner_grid::TravelDirection>,
    pub new: packrunner_grid::TravelDirection,
    pub cooldown_respected: bool,
    pub at: SimTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MovementEfficiencySample {
    pub traveled: f64,
    pub optimal: f64,
    pub ratio: f64,
    pub movement_time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PerformanceWarning {
    PathCalcTimeExceeded { calc_time: f64, threshold: f64 },
    MovementEfficiencyLow { ratio: f64, threshold: f64 },
}

#[derive(Debug, Clone, Copy)]
pub struct PerformanceMonitorConfig {
    pub calc_time_warning_threshold: f64,
    pub efficiency_ratio_threshold: f64,
}

impl Default for PerformanceMonitorConfig {
    fn default() -> Self {
        Self {
            calc_time_warning_threshold: 0.05,
            efficiency_ratio_threshold: 0.8,
        }
    }
}

pub struct PerformanceMonitor {
    config: PerformanceMonitorConfig,
    path_calc_samples: RingBuffer<PathCalcSample>,
    direction_change_samples: RingBuffer<DirectionChangeSample>,
    movement_efficiency_samples: RingBuffer<MovementEfficiencySample>,
    cooldown_violations: u64,
}

impl PerformanceMonitor {
    pub fn new(config: PerformanceMonitorConfig) -> Self {
        Self {
            config,
            path_calc_samples: RingBuffer::new(SAMPLE_CAPACITY),
            direction_change_samples: RingBuffer::new(SAMPLE_CAPACITY),
            movement_efficiency_samples: RingBuffer::new(SAMPLE_CAPACITY),
            cooldown_violations: 0,
        }
    }

    /// Records a path calculation, returning a warning if it exceeded the
    /// configured budget.
    pub fn record_path_calc(
        &mut self,
        calc_time: f64,
        path_length: usize,
        direction_changes: usize,
        optimization_level: OptimizationLevel,
    ) -> Option<PerformanceWarning> {
        self.path_calc_samples.push(PathCalcSample {
            calc_time,
            path_length,
            direction_changes,
            optimization_level,
        });

        if calc_time > self.config.calc_time_warning_threshold {
            Some(PerformanceWarning::PathCalcTimeExceeded {
                calc_time,
                threshold: self.config.calc_time_warning_threshold,
            })
        } else {
            None
        }
    }

    pub fn record_direction_change(
        &mut self,
        old: Option<packrunner_grid::TravelDirection>,
        new: packrunner_grid::TravelDirection,
        cooldown_respected: bool,
        at: SimTime,
    ) {
        if !cooldown_respected {
            self.cooldown_violations += 1;
        }
        self.direction_change_samples.push(DirectionChangeSample {
            old,
            new,
            cooldown_respected,
            at,
        });
    }

    /// Records a movement efficiency sample, returning a warning if the
    /// ratio fell below the configured threshold.
    pub fn record_movement_efficiency(
        &mut self,
        traveled: f64,
        optimal: f64,
        movement_time: f64,
    ) -> Option<PerformanceWarning> {
        let ratio = if traveled <= 0.0 { 1.0 } else { (optimal / traveled).min(1.0) };
        self.movement_efficiency_samples.push(MovementEfficiencySample {
            traveled,
            optimal,
            ratio,
            movement_time,
        });

        if ratio < self.config.efficiency_ratio_threshold {
            Some(PerformanceWarning::MovementEfficiencyLow {
                ratio,
                threshold: self.config.efficiency_ratio_threshold,
            })
        } else {
            None
        }
    }

    pub fn cooldown_violations(&self) -> u64 {
        self.cooldown_violations
    }

    pub fn path_calc_samples(&self) -> &RingBuffer<PathCalcSample> {
        &self.path_calc_samples
    }

    pub fn direction_change_samples(&self) -> &RingBuffer<DirectionChangeSample> {
        &self.direction_change_samples
    }

    pub fn movement_efficiency_samples(&self) -> &RingBuffer<MovementEfficiencySample> {
        &self.movement_efficiency_samples
    }

    pub fn avg_path_calc_time(&self) -> f64 {
        average(self.path_calc_samples.iter().map(|s| s.calc_time))
    }

    pub fn avg_movement_efficiency(&self) -> f64 {
        average(self.movement_efficiency_samples.iter().map(|s| s.ratio))
    }
}

fn average(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values {
        sum += v;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use packrunner_grid::TravelDirection;

    #[test]
    fn test_path_calc_warning_above_threshold() {
        let mut monitor = PerformanceMonitor::new(PerformanceMonitorConfig::default());
        let warning = monitor.record_path_calc(0.2, 10, 2, OptimizationLevel::ShortestPath);
        assert!(matches!(warning, Some(PerformanceWarning::PathCalcTimeExceeded { .. })));
    }

    #[test]
    fn test_path_calc_no_warning_within_budget() {
        let mut monitor = PerformanceMonitor::new(PerformanceMonitorConfig::default());
        let warning = monitor.record_path_calc(0.01, 10, 2, OptimizationLevel::ShortestPath);
        assert!(warning.is_none());
    }

    #[test]
    fn test_movement_efficiency_warning_below_threshold() {
        let mut monitor = PerformanceMonitor::new(PerformanceMonitorConfig::default());
        let warning = monitor.record_movement_efficiency(20.0, 10.0, 5.0);
        assert!(matches!(
            warning,
            Some(PerformanceWarning::MovementEfficiencyLow { .. })
        ));
    }

    #[test]
    fn test_cooldown_violation_tracked() {
        let mut monitor = PerformanceMonitor::new(PerformanceMonitorConfig::default());
        monitor.record_direction_change(
            Some(TravelDirection::Forward),
            TravelDirection::Reverse,
            false,
            SimTime::ZERO,
        );
        assert_eq!(monitor.cooldown_violations(), 1);
    }

    #[test]
    fn test_ring_buffer_capacity_enforced() {
        let mut monitor = PerformanceMonitor::new(PerformanceMonitorConfig::default());
        for _ in 0..150 {
            monitor.record_path_calc(0.01, 1, 0, OptimizationLevel::ShortestPath);
        }
        assert_eq!(monitor.path_calc_samples().len(), SAMPLE_CAPACITY);
    }
}
