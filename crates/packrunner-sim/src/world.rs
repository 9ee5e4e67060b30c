//! The World (§5): the aggregate of mutable state the tick loop owns.
//!
//! Everything the Simulator mutates per tick — the single robot, the order
//! queue, the assignment slot, the runtime state machine, and the rolling
//! analytics — lives here. Nothing outside the tick-loop task ever holds a
//! `&mut World`; other tasks only ever see [`crate::push::Snapshot`]s built
//! from it.

use packrunner_config::Config;
use packrunner_core::SimRng;
use packrunner_entities::{ItemPool, OrderQueue, Robot};
use packrunner_grid::{GridDimensions, TravelDirection};
use packrunner_metrics::{PerformanceMonitor, PerformanceMonitorConfig, StatusTracker};

use crate::assigner::RobotAssigner;
use crate::generator::{OrderGenerator, OrderGeneratorConfig};
use crate::runtime::{RobotRuntime, RuntimeConfig};

/// §4.6's default queue capacity and §4.8's default robot capacity are not
/// exposed as config keys (§6 names no such fields); they're fixed here the
/// way the spec's defaults are fixed.
const DEFAULT_QUEUE_CAPACITY: usize = 100;
const DEFAULT_ROBOT_CAPACITY: usize = 5;

pub struct World {
    pub rng: SimRng,
    pub grid: GridDimensions,
    pub item_pool: ItemPool,
    pub queue: OrderQueue,
    pub robot: Robot,
    pub assigner: RobotAssigner,
    pub generator: OrderGenerator,
    pub runtime: RobotRuntime,
    pub monitor: PerformanceMonitor,
    pub tracker: StatusTracker,
}

impl World {
    pub fn new(config: &Config, seed: u64) -> Self {
        let grid = GridDimensions::new(config.warehouse.aisles, config.warehouse.racks);
        let item_pool = ItemPool::for_grid(&grid);
        let base = packrunner_grid::Coordinate::new(
            config.warehouse.base_location.aisle,
            config.warehouse.base_location.rack,
        );

        let planner = packrunner_grid::PlannerConfig {
            aisle_traversal_time: config.effective_aisle_traversal_time(),
            direction_change_cooldown: config.effective_direction_change_cooldown(),
            max_path_calculation_time: config.bidirectional_navigation.path_optimization.max_path_calculation_time,
        };
        let runtime_config = RuntimeConfig {
            planner,
            collection_duration: 3.0,
            snake_integrity: config.bidirectional_navigation.path_optimization.enable_snake_pattern_integrity,
        };

        let monitor_config = PerformanceMonitorConfig {
            calc_time_warning_threshold: config.bidirectional_navigation.performance_monitoring.warning_threshold,
            efficiency_ratio_threshold: config.bidirectional_navigation.performance_monitoring.ratio_threshold,
        };

        let generator_config = OrderGeneratorConfig {
            generation_interval: config.orders.generation_interval,
            min_items: 1,
            max_items: config.orders.max_items_per_order,
        };

        Self {
            rng: SimRng::new(seed),
            grid,
            item_pool,
            queue: OrderQueue::new(DEFAULT_QUEUE_CAPACITY),
            robot: Robot::new("robot-0", base, DEFAULT_ROBOT_CAPACITY),
            assigner: RobotAssigner::new(),
            generator: OrderGenerator::new(generator_config),
            runtime: RobotRuntime::new(grid, TravelDirection::Forward, runtime_config),
            monitor: PerformanceMonitor::new(monitor_config),
            tracker: StatusTracker::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_world_has_idle_robot_at_base() {
        let config = Config::default();
        let world = World::new(&config, 1);
        assert!(world.robot.is_idle());
        assert_eq!(world.robot.current_coordinate().aisle, config.warehouse.base_location.aisle);
        assert_eq!(world.robot.current_coordinate().rack, config.warehouse.base_location.rack);
    }

    #[test]
    fn test_item_pool_sized_to_grid() {
        let config = Config::default();
        let world = World::new(&config, 1);
        assert_eq!(
            world.item_pool.len(),
            (config.warehouse.aisles * config.warehouse.racks) as usize - 1
        );
    }
}
