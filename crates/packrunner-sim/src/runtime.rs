//! The Robot Runtime (§4.8): drives movement, collection, and order
//! progress for the single robot, leg by leg along the planned path.

use std::collections::VecDeque;

use packrunner_core::{
    Event as _, EventBus, EventType, ItemId, OrderId, Priority, SimError, SimResult, SimTime,
};
use packrunner_entities::{CollectionState, FloatPosition, MovementState, Robot, RobotState};
use packrunner_grid::{Coordinate, GridDimensions, PathPlanner, PathRequest, PlannerConfig, TravelDirection};
use packrunner_metrics::{OptimizationLevel, PerformanceMonitor};

#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    pub planner: PlannerConfig,
    pub collection_duration: f64,
    pub snake_integrity: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            planner: PlannerConfig::default(),
            collection_duration: 3.0,
            snake_integrity: true,
        }
    }
}

struct Mission {
    order_id: OrderId,
    remaining_items: VecDeque<(ItemId, Coordinate)>,
    current_path: VecDeque<Coordinate>,
    total_distance: f64,
    /// Set when the return leg was entered after a mid-mission failure
    /// (capacity exceeded, invalid collection position). Arrival at
    /// packout then settles the robot back to idle without re-emitting
    /// `ORDER_COMPLETED` for an order the assigner already failed.
    failed: bool,
    /// Start/goal of the leg in progress, for a once-per-leg efficiency
    /// sample rather than one that's trivially 1.0 per single-cell hop.
    leg_start: Coordinate,
    leg_goal: Coordinate,
    leg_traveled: f64,
    leg_time: f64,
}

/// Outcome of a single `tick`, for the caller (the Simulator) to react to:
/// writing collected items back to the order, completing/failing it in the
/// queue, and emitting the corresponding events.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    None,
    ItemCollected(ItemId),
    Completed { total_distance: f64 },
    Failed { total_distance: f64, reason: String },
}

pub struct RobotRuntime {
    config: RuntimeConfig,
    grid: GridDimensions,
    direction: TravelDirection,
    mission: Option<Mission>,
}

impl RobotRuntime {
    pub fn new(grid: GridDimensions, direction: TravelDirection, config: RuntimeConfig) -> Self {
        Self {
            config,
            grid,
            direction,
            mission: None,
        }
    }

    /// `assign` requires the robot be idle and unassigned; sets navigation
    /// targets in ascending aisle-then-rack order and starts the first leg.
    pub fn assign(
        &mut self,
        robot: &mut Robot,
        order_id: OrderId,
        mut items: Vec<(ItemId, Coordinate)>,
        now: SimTime,
        bus: &mut EventBus,
        monitor: &mut PerformanceMonitor,
    ) -> SimResult<()> {
        if !robot.is_idle() {
            return Err(SimError::fatal("assign called on a non-idle or already-assigned robot"));
        }
        items.sort_by_key(|(_, c)| (c.aisle, c.rack));
        let remaining_items: VecDeque<_> = items.into_iter().collect();
        let Some(&(_, first_target)) = remaining_items.front() else {
            return Err(SimError::validation("order has no items to collect"));
        };

        let mut mission = Mission {
            order_id,
            remaining_items,
            current_path: VecDeque::new(),
            total_distance: 0.0,
            failed: false,
            leg_start: first_target,
            leg_goal: first_target,
            leg_traveled: 0.0,
            leg_time: 0.0,
        };

        robot.transition_to(RobotState::MovingToItem)?;
        self.begin_leg(robot, &mut mission, first_target, now, bus, monitor)?;
        self.mission = Some(mission);
        Ok(())
    }

    pub fn has_mission(&self) -> bool {
        self.mission.is_some()
    }

    /// Computes the path to `target` and starts the first movement segment
    /// towards its first waypoint (or, if already adjacent/at the target,
    /// marks the leg immediately arrived).
    fn begin_leg(
        &mut self,
        robot: &mut Robot,
        mission: &mut Mission,
        target: Coordinate,
        now: SimTime,
        bus: &mut EventBus,
        monitor: &mut PerformanceMonitor,
    ) -> SimResult<()> {
        let start = robot.current_coordinate();
        mission.leg_start = start;
        mission.leg_goal = target;
        mission.leg_traveled = 0.0;
        mission.leg_time = 0.0;
        let calc_start = std::time::Instant::now();
        let req = PathRequest {
            start,
            goal: target,
            direction: self.direction,
            snake_integrity: self.config.snake_integrity,
        };
        let planned = PathPlanner::plan(&self.grid, &req, &self.config.planner)?;
        let calc_time = calc_start.elapsed().as_secs_f64();

        let optimization_level = if planned.cooldown_violations > 0 {
            OptimizationLevel::CooldownLimited
        } else if planned.direction_changes > 0 {
            OptimizationLevel::DirectionOptimized
        } else {
            OptimizationLevel::ShortestPath
        };

        if let Some(warning) = monitor.record_path_calc(
            calc_time,
            planned.path.len(),
            planned.direction_changes as usize,
            optimization_level,
        ) {
            emit_performance_warning(bus, now, &warning);
        }
        monitor.record_direction_change(
            None,
            self.direction,
            planned.cooldown_violations == 0,
            now,
        );

        mission.current_path = planned.path.into_iter().skip(1).collect();
        self.advance_to_next_waypoint(robot, mission, now)
    }

    fn advance_to_next_waypoint(
        &self,
        robot: &mut Robot,
        mission: &mut Mission,
        now: SimTime,
    ) -> SimResult<()> {
        match mission.current_path.pop_front() {
            Some(next) => {
                let start = robot.current_coordinate();
                let duration = start.manhattan_distance(&next) as f64 * self.config.planner.aisle_traversal_time;
                robot.movement = Some(MovementState::new(start, next, now, duration.max(f64::EPSILON)));
                Ok(())
            }
            None => {
                // Already at the destination cell; nothing left to traverse.
                robot.movement = None;
                Ok(())
            }
        }
    }

    /// Advances the robot's state machine by one tick.
    pub fn tick(
        &mut self,
        robot: &mut Robot,
        now: SimTime,
        bus: &mut EventBus,
        monitor: &mut PerformanceMonitor,
    ) -> SimResult<TickOutcome> {
        match robot.state {
            RobotState::Idle => Ok(TickOutcome::None),
            RobotState::MovingToItem => self.tick_moving(robot, now, bus, monitor, false),
            RobotState::Returning => self.tick_moving(robot, now, bus, monitor, true),
            RobotState::CollectingItem => self.tick_collecting(robot, now, bus, monitor),
        }
    }

    fn tick_moving(
        &mut self,
        robot: &mut Robot,
        now: SimTime,
        bus: &mut EventBus,
        monitor: &mut PerformanceMonitor,
        returning: bool,
    ) -> SimResult<TickOutcome> {
        let Some(mut movement) = robot.movement else {
            return Ok(TickOutcome::None);
        };
        movement.advance(now);
        robot.position = movement.position();

        if !movement.is_complete() {
            robot.movement = Some(movement);
            return Ok(TickOutcome::None);
        }

        robot.position = FloatPosition::from_coordinate(movement.target);
        emit_robot_moved(bus, now, &robot.id, movement.target);

        let hop_distance = movement.start.manhattan_distance(&movement.target) as f64;
        if let Some(mission) = self.mission.as_mut() {
            mission.total_distance += hop_distance;
            mission.leg_traveled += hop_distance;
            mission.leg_time += movement.duration;
        }

        let Some(mission) = self.mission.as_mut() else {
            robot.movement = None;
            return Ok(TickOutcome::None);
        };

        if !mission.current_path.is_empty() {
            self.advance_to_next_waypoint(robot, mission, now)?;
            return Ok(TickOutcome::None);
        }

        // Leg complete: one efficiency sample per leg, comparing the full
        // path actually walked against the leg's straight-line optimum.
        let optimal = mission.leg_start.manhattan_distance(&mission.leg_goal) as f64;
        let leg_traveled = mission.leg_traveled;
        let leg_time = mission.leg_time;
        if let Some(warning) = monitor.record_movement_efficiency(leg_traveled.max(1.0), optimal, leg_time) {
            emit_performance_warning(bus, now, &warning);
        }

        robot.movement = None;
        if returning {
            let total_distance = mission.total_distance;
            let order_id = mission.order_id.clone();
            let failed = mission.failed;
            self.mission = None;
            robot.transition_to(RobotState::Idle)?;
            robot.reset_for_next_order();
            if failed {
                // The order was already failed and removed at the point of
                // failure (§4.8); this leg only settles the robot back to
                // idle, it must not re-report the order as completed.
                Ok(TickOutcome::None)
            } else {
                emit_order_completed(bus, now, &order_id);
                Ok(TickOutcome::Completed { total_distance })
            }
        } else {
            let Some((item_id, _)) = current_item(mission) else {
                return Err(SimError::fatal("arrived with no active item target"));
            };
            robot.collection.start(item_id, now, self.config.collection_duration);
            robot.transition_to(RobotState::CollectingItem)?;
            Ok(TickOutcome::None)
        }
    }

    fn tick_collecting(
        &mut self,
        robot: &mut Robot,
        now: SimTime,
        bus: &mut EventBus,
        monitor: &mut PerformanceMonitor,
    ) -> SimResult<TickOutcome> {
        if !robot.collection.is_done(now) {
            return Ok(TickOutcome::None);
        }

        let Some(item_id) = robot.collection.item_id.clone() else {
            return Ok(TickOutcome::None);
        };
        robot.collection.clear();

        if let Err(e) = robot.collect_item(item_id.clone()) {
            let Some(mission) = self.mission.take() else {
                return Err(e);
            };
            let total_distance = mission.total_distance;
            emit_system_error(bus, now, &e);
            self.begin_return_leg_failed(robot, mission, now, bus, monitor)?;
            return Ok(TickOutcome::Failed {
                total_distance,
                reason: e.to_string(),
            });
        }

        emit_item_collected(bus, now, &robot.id, &item_id);

        let Some(mut mission) = self.mission.take() else {
            return Ok(TickOutcome::ItemCollected(item_id));
        };
        mission.remaining_items.pop_front();

        if let Some((_, next_target)) = mission.remaining_items.front().copied() {
            robot.transition_to(RobotState::MovingToItem)?;
            self.begin_leg(robot, &mut mission, next_target, now, bus, monitor)?;
            self.mission = Some(mission);
        } else {
            self.begin_return_leg(robot, mission, now, bus, monitor)?;
        }

        Ok(TickOutcome::ItemCollected(item_id))
    }

    fn begin_return_leg(
        &mut self,
        robot: &mut Robot,
        mission: Mission,
        now: SimTime,
        bus: &mut EventBus,
        monitor: &mut PerformanceMonitor,
    ) -> SimResult<()> {
        self.begin_return_leg_inner(robot, mission, now, bus, monitor, false)
    }

    /// Like [`Self::begin_return_leg`], but the mission is marked failed so
    /// arrival at packout settles the robot to idle without re-emitting
    /// `ORDER_COMPLETED` for an order the assigner already failed.
    fn begin_return_leg_failed(
        &mut self,
        robot: &mut Robot,
        mission: Mission,
        now: SimTime,
        bus: &mut EventBus,
        monitor: &mut PerformanceMonitor,
    ) -> SimResult<()> {
        self.begin_return_leg_inner(robot, mission, now, bus, monitor, true)
    }

    fn begin_return_leg_inner(
        &mut self,
        robot: &mut Robot,
        mut mission: Mission,
        now: SimTime,
        bus: &mut EventBus,
        monitor: &mut PerformanceMonitor,
        failed: bool,
    ) -> SimResult<()> {
        mission.failed = failed;
        robot.transition_to(RobotState::Returning)?;
        self.begin_leg(robot, &mut mission, packrunner_grid::PACKOUT, now, bus, monitor)?;
        self.mission = Some(mission);
        Ok(())
    }
}

fn current_item(mission: &Mission) -> Option<(ItemId, Coordinate)> {
    mission.remaining_items.front().copied().map(|(id, c)| (id, c))
}

fn emit_robot_moved(bus: &mut EventBus, now: SimTime, robot_id: &str, target: Coordinate) {
    bus.emit(
        EventType::RobotMoved,
        serde_json::json!({ "robot_id": robot_id, "aisle": target.aisle, "rack": target.rack, "progress": 1.0 }),
        "robot_runtime",
        now,
        None,
    );
}

fn emit_item_collected(bus: &mut EventBus, now: SimTime, robot_id: &str, item_id: &ItemId) {
    bus.emit(
        EventType::ItemCollected,
        serde_json::json!({ "robot_id": robot_id, "item_id": item_id.as_str() }),
        "robot_runtime",
        now,
        None,
    );
}

fn emit_order_completed(bus: &mut EventBus, now: SimTime, order_id: &OrderId) {
    bus.emit(
        EventType::OrderCompleted,
        serde_json::json!({ "order_id": order_id.as_str() }),
        "robot_runtime",
        now,
        None,
    );
}

fn emit_system_error(bus: &mut EventBus, now: SimTime, error: &SimError) {
    bus.emit(
        EventType::SystemError,
        serde_json::json!({ "error": error.to_string() }),
        "robot_runtime",
        now,
        Some(Priority::High),
    );
}

fn emit_performance_warning(bus: &mut EventBus, now: SimTime, warning: &packrunner_metrics::PerformanceWarning) {
    bus.emit(
        EventType::PerformanceWarning,
        serde_json::to_value(warning).unwrap_or(serde_json::Value::Null),
        "robot_runtime",
        now,
        Some(Priority::High),
    );
}
