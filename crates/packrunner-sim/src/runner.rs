//! The Simulator (§5): owns the Clock, the Event Bus, and the [`World`],
//! and drives the phase-ordered tick loop (drain events → generator →
//! assigner → robot tick → analytics roll-up).

use packrunner_config::Config;
use packrunner_core::{
    Clock, EventBus, EventType, IdMinter, Priority, RingBufferLogger, SimResult, SimTime,
    SpeedSet, Validator,
};
use packrunner_entities::Order;
use packrunner_grid::Coordinate;

use crate::push::{
    InventoryDataFrame, KpiDataFrame, OrderDataFrame, RobotDataFrame, SimulationStateFrame,
    Snapshot, WarehouseDataFrame,
};
use crate::runtime::TickOutcome;
use crate::world::World;

const EVENT_HISTORY_CAPACITY: usize = 256;

/// Mirrors the Order Generator's RUNNING/PAUSED/STOPPED states (§4.5) one
/// level up: this is the state of the whole simulation, not just order
/// generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationState {
    Stopped,
    Running,
    Paused,
}

pub struct Simulator {
    clock: Clock,
    bus: EventBus,
    world: World,
    config: Config,
    state: SimulationState,
    event_budget: usize,
}

impl Simulator {
    pub fn new(config: Config, seed: u64) -> Self {
        let mut clock = Clock::new(config.timing.target_fps, config.timing.max_delta_time);
        clock.set_speed(config.timing.simulation_speed);

        let mut bus = EventBus::new(config.engine.event_queue_size as usize);
        bus.add_middleware(Box::new(RingBufferLogger::new(EVENT_HISTORY_CAPACITY)));
        bus.add_middleware(Box::new(Validator::new()));

        let event_budget = config.engine.max_concurrent_events as usize;
        let world = World::new(&config, seed);

        Self {
            clock,
            bus,
            world,
            config,
            state: SimulationState::Stopped,
            event_budget,
        }
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn now(&self) -> SimTime {
        self.clock.now()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Idempotent: a no-op from any state other than `Stopped`.
    pub fn start(&mut self) {
        if self.state != SimulationState::Stopped {
            return;
        }
        self.state = SimulationState::Running;
        self.world.generator.start();
        self.world.generator.reset_clock(self.clock.now());
        self.bus.emit(
            EventType::SimulationStart,
            serde_json::json!({}),
            "simulator",
            self.clock.now(),
            None,
        );
    }

    /// Idempotent: a no-op if already stopped.
    pub fn stop(&mut self) {
        if self.state == SimulationState::Stopped {
            return;
        }
        self.state = SimulationState::Stopped;
        self.world.generator.stop();
        self.bus.emit(
            EventType::SimulationStop,
            serde_json::json!({}),
            "simulator",
            self.clock.now(),
            Some(Priority::High),
        );
    }

    /// Idempotent: a no-op unless currently `Running`.
    pub fn pause(&mut self) {
        if self.state != SimulationState::Running {
            return;
        }
        self.state = SimulationState::Paused;
        self.clock.pause();
        self.world.generator.pause();
        self.bus.emit(
            EventType::SimulationPause,
            serde_json::json!({}),
            "simulator",
            self.clock.now(),
            None,
        );
    }

    /// Idempotent: a no-op unless currently `Paused`.
    pub fn resume(&mut self) {
        if self.state != SimulationState::Paused {
            return;
        }
        self.state = SimulationState::Running;
        self.clock.resume();
        self.world.generator.resume();
        self.bus.emit(
            EventType::SimulationResume,
            serde_json::json!({}),
            "simulator",
            self.clock.now(),
            None,
        );
    }

    /// Re-initializes the world (fresh robot, empty queue, reseeded rng)
    /// without tearing down the event bus or loaded configuration.
    pub fn reset(&mut self, seed: u64) {
        self.state = SimulationState::Stopped;
        self.clock = Clock::new(self.config.timing.target_fps, self.config.timing.max_delta_time);
        self.clock.set_speed(self.config.timing.simulation_speed);
        self.world = World::new(&self.config, seed);
    }

    /// Clamps `x` to `[0.1, 10.0]`; emits `SYSTEM_WARNING` when clamping
    /// actually changed the requested value (§8's boundary behaviour).
    pub fn set_speed(&mut self, x: f64) -> SpeedSet {
        let result = self.clock.set_speed(x);
        if result.clamped {
            self.bus.emit(
                EventType::SystemWarning,
                serde_json::json!({ "requested_speed": x, "applied_speed": result.speed }),
                "simulator",
                self.clock.now(),
                None,
            );
        }
        result
    }

    /// Advances the clock by one frame, drains the event bus, and — only
    /// while `Running` — runs generation, assignment, and the robot tick in
    /// that order (§5). The bus is drained every call regardless of
    /// simulation state, so a HIGH-priority control event lands even while
    /// paused or stopped.
    pub fn tick(&mut self) -> SimResult<()> {
        self.clock.update();
        let now = self.clock.now();

        self.bus.emit(
            EventType::Tick,
            serde_json::json!({ "frame_count": self.clock.frame_count() }),
            "simulator",
            now,
            Some(Priority::Low),
        );
        self.bus.process(self.event_budget);

        if self.state == SimulationState::Running {
            let state_before = self.world.robot.state;

            self.run_generation(now);
            self.run_assignment(now);
            self.run_robot_tick(now)?;

            if self.world.robot.state != state_before {
                self.bus.emit(
                    EventType::RobotStateChanged,
                    serde_json::json!({
                        "from": format!("{:?}", state_before),
                        "to": format!("{:?}", self.world.robot.state),
                    }),
                    "simulator",
                    now,
                    None,
                );
            }

            self.bus.emit(
                EventType::FrameUpdate,
                serde_json::json!({ "frame_count": self.clock.frame_count() }),
                "simulator",
                now,
                Some(Priority::Low),
            );
        }

        Ok(())
    }

    fn run_generation(&mut self, now: SimTime) {
        let Some(items) = self
            .world
            .generator
            .maybe_generate(now, &self.world.item_pool, &mut self.world.rng)
        else {
            return;
        };
        if items.is_empty() {
            // Boundary behaviour (§8): an empty pool draw is not an error.
            return;
        }

        let order_id = IdMinter::order_id(&mut self.world.rng);
        let order = Order::new(order_id, items, now);
        let payload = serde_json::to_value(&order).unwrap_or(serde_json::Value::Null);

        match self.world.queue.add(order) {
            Ok(()) => {
                self.bus.emit(EventType::OrderCreated, payload, "simulator", now, None);
                self.bus.emit(
                    EventType::InventoryUpdated,
                    serde_json::json!({ "items_available": self.world.item_pool.len() }),
                    "simulator",
                    now,
                    None,
                );
            }
            Err(e) => {
                // Boundary behaviour (§8): a full queue fails without mutation.
                self.world.tracker.record_warning();
                tracing::warn!(error = %e, "order generated but queue rejected it");
            }
        }
    }

    fn run_assignment(&mut self, now: SimTime) {
        let Some(order) = self
            .world
            .assigner
            .try_assign(self.world.robot.is_idle(), &mut self.world.queue, now)
        else {
            return;
        };
        self.world.queue.update(order.clone());
        self.world.robot.current_order = Some(order.id.clone());

        let targets: Vec<(packrunner_core::ItemId, Coordinate)> =
            order.items.iter().map(|i| (i.id.clone(), i.location)).collect();

        match self.world.runtime.assign(
            &mut self.world.robot,
            order.id.clone(),
            targets,
            now,
            &mut self.bus,
            &mut self.world.monitor,
        ) {
            Ok(()) => {
                let payload = serde_json::to_value(&order).unwrap_or(serde_json::Value::Null);
                self.bus.emit(EventType::OrderAssigned, payload, "simulator", now, None);
            }
            Err(e) => {
                self.world.tracker.record_error();
                self.world.assigner.fail_current(&mut self.world.queue, order, now, 0.0);
                self.bus.emit(
                    EventType::SystemError,
                    serde_json::json!({ "error": e.to_string() }),
                    "simulator",
                    now,
                    Some(Priority::High),
                );
            }
        }
    }

    fn run_robot_tick(&mut self, now: SimTime) -> SimResult<()> {
        let outcome = self.world.runtime.tick(
            &mut self.world.robot,
            now,
            &mut self.bus,
            &mut self.world.monitor,
        )?;

        match outcome {
            TickOutcome::None => {}
            TickOutcome::ItemCollected(item_id) => {
                if let Some(mut order) = self.current_order().cloned() {
                    self.world.assigner.on_item_collected(&mut order, item_id);
                    self.world.queue.update(order);
                }
            }
            TickOutcome::Completed { total_distance } => {
                if let Some(order) = self.current_order().cloned() {
                    let assigned_ts = order.assigned_ts;
                    self.world
                        .assigner
                        .complete_current(&mut self.world.queue, order, now, total_distance);
                    if let Some(completed) = self.world.queue.completed().last() {
                        let fulfillment_time =
                            assigned_ts.map(|a| (now - a).as_seconds()).unwrap_or(0.0);
                        self.world.tracker.record_completion(
                            now,
                            completed.efficiency,
                            completed.total_distance,
                            fulfillment_time,
                        );
                    }
                }
            }
            TickOutcome::Failed { total_distance, reason } => {
                if let Some(order) = self.current_order().cloned() {
                    let assigned_ts = order.assigned_ts;
                    let order_id = order.id.clone();
                    self.world
                        .assigner
                        .fail_current(&mut self.world.queue, order, now, total_distance);
                    if let Some(failed) = self.world.queue.failed().last() {
                        let fulfillment_time =
                            assigned_ts.map(|a| (now - a).as_seconds()).unwrap_or(0.0);
                        self.world.tracker.record_failure(
                            now,
                            failed.efficiency,
                            failed.total_distance,
                            fulfillment_time,
                        );
                    }
                    self.world.tracker.record_failed_event();
                    self.bus.emit(
                        EventType::OrderFailed,
                        serde_json::json!({ "order_id": order_id.as_str(), "reason": reason }),
                        "simulator",
                        now,
                        None,
                    );
                }
            }
        }
        Ok(())
    }

    fn current_order(&self) -> Option<&Order> {
        let order_id = self.world.assigner.current_order_id()?;
        self.world.queue.get(order_id.as_str())
    }

    /// Reloads the configuration file, diffing it against the currently
    /// loaded one for the `CONFIG_CHANGED` payload (§5, SPEC_FULL §C.5).
    /// The new values take effect on the next `tick()`, never mid-tick.
    pub fn reload_config(&mut self, path: &std::path::Path) -> SimResult<()> {
        let (next, changed) = packrunner_config::reload(path, &self.config)?;
        if changed.is_empty() {
            return Ok(());
        }
        self.config = next;
        self.bus.emit(
            EventType::ConfigChanged,
            serde_json::json!({ "changed_sections": changed }),
            "simulator",
            self.clock.now(),
            None,
        );
        Ok(())
    }

    /// A value-typed deep copy for the Push Adapter (§4.10): safe to publish
    /// and read from another task without any shared-mutability hazard.
    pub fn snapshot(&self) -> Snapshot {
        let robot = &self.world.robot;
        let pos = robot.current_coordinate();
        let queue_stats = self.world.queue.stats();
        let cumulative = self.world.tracker.cumulative();
        let current = self.world.tracker.current();

        Snapshot {
            simulation_state: SimulationStateFrame {
                running: self.state == SimulationState::Running,
                paused: self.state == SimulationState::Paused,
                sim_time_s: self.clock.now().as_seconds(),
                speed: self.clock.speed(),
                frame_count: self.clock.frame_count(),
            },
            robot: RobotDataFrame {
                id: robot.id.clone(),
                state: format!("{:?}", robot.state),
                aisle: pos.aisle as f64,
                rack: pos.rack as f64,
                direction: format!("{:?}", robot.direction),
                held_items: robot.held_items.len(),
                capacity: robot.capacity,
                current_order: robot.current_order.as_ref().map(|o| o.as_str().to_string()),
            },
            order: OrderDataFrame {
                pending: self.world.queue.len(),
                completed: queue_stats.total_completed,
                failed: queue_stats.total_failed,
                peak_size: queue_stats.peak_size,
                avg_wait_time_s: queue_stats.avg_wait_time(),
            },
            kpi: KpiDataFrame {
                avg_efficiency: cumulative.avg_efficiency,
                recent_trend: current.recent_trend,
                orders_completed: cumulative.orders_completed,
                orders_failed: cumulative.orders_failed,
                avg_fulfillment_time_s: cumulative.avg_fulfillment_time,
            },
            inventory: InventoryDataFrame {
                total_cells: self.world.item_pool.len(),
                items_available: self.world.item_pool.len(),
            },
            warehouse: WarehouseDataFrame {
                aisles: self.world.grid.aisles,
                racks: self.world.grid.racks,
                base_aisle: self.config.warehouse.base_location.aisle,
                base_rack: self.config.warehouse.base_location.rack,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        let mut c = Config::default();
        c.orders.generation_interval = 1.0;
        c
    }

    #[test]
    fn test_start_stop_idempotent() {
        let mut sim = Simulator::new(config(), 1);
        assert_eq!(sim.state(), SimulationState::Stopped);
        sim.start();
        assert_eq!(sim.state(), SimulationState::Running);
        sim.start();
        assert_eq!(sim.state(), SimulationState::Running);
        sim.stop();
        assert_eq!(sim.state(), SimulationState::Stopped);
        sim.stop();
        assert_eq!(sim.state(), SimulationState::Stopped);
    }

    #[test]
    fn test_pause_resume_freezes_and_resumes_clock() {
        let mut sim = Simulator::new(config(), 1);
        sim.start();
        sim.tick().unwrap();
        sim.pause();
        let paused_time = sim.now();
        sim.tick().unwrap();
        assert_eq!(sim.now(), paused_time);
        sim.resume();
        assert_eq!(sim.state(), SimulationState::Running);
    }

    #[test]
    fn test_tick_generates_and_assigns_order() {
        let mut sim = Simulator::new(config(), 7);
        sim.start();
        for _ in 0..5 {
            sim.tick().unwrap();
        }
        assert!(sim.world().queue.len() > 0 || sim.world().assigner.has_current());
    }

    #[test]
    fn test_speed_clamped_and_warns() {
        let mut sim = Simulator::new(config(), 1);
        let result = sim.set_speed(50.0);
        assert_eq!(result.speed, 10.0);
        assert!(result.clamped);
    }

    #[test]
    fn test_reset_reinitializes_world() {
        let mut sim = Simulator::new(config(), 1);
        sim.start();
        sim.tick().unwrap();
        sim.reset(2);
        assert_eq!(sim.state(), SimulationState::Stopped);
        assert_eq!(sim.now(), SimTime::ZERO);
        assert!(sim.world().queue.is_empty());
    }
}
