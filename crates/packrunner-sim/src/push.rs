//! The Push Adapter (§4.10): fixed-cadence, value-typed snapshots for an
//! external push channel, plus the inbound command surface (§6).
//!
//! `packrunner-sim` defines the snapshot shape and the `PushSink` trait
//! boundary only; it never opens a socket. A host process implements
//! `PushSink` to forward frames over its own transport.

use serde::{Deserialize, Serialize};

use packrunner_core::SimTime;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationStateFrame {
    pub running: bool,
    pub paused: bool,
    pub sim_time_s: f64,
    pub speed: f64,
    pub frame_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotDataFrame {
    pub id: String,
    pub state: String,
    pub aisle: f64,
    pub rack: f64,
    pub direction: String,
    pub held_items: usize,
    pub capacity: usize,
    pub current_order: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDataFrame {
    pub pending: usize,
    pub completed: u64,
    pub failed: u64,
    pub peak_size: usize,
    pub avg_wait_time_s: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiDataFrame {
    pub avg_efficiency: f64,
    pub recent_trend: f64,
    pub orders_completed: u64,
    pub orders_failed: u64,
    pub avg_fulfillment_time_s: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryDataFrame {
    pub total_cells: usize,
    pub items_available: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseDataFrame {
    pub aisles: u32,
    pub racks: u32,
    pub base_aisle: u32,
    pub base_rack: u32,
}

/// A single, value-typed deep copy of everything the push channel cares
/// about. Producers must not mutate shared structures after handing a
/// snapshot off — every field here is owned, not borrowed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub simulation_state: SimulationStateFrame,
    pub robot: RobotDataFrame,
    pub order: OrderDataFrame,
    pub kpi: KpiDataFrame,
    pub inventory: InventoryDataFrame,
    pub warehouse: WarehouseDataFrame,
}

/// Implemented by whatever host process actually owns the transport
/// (HTTP/WS/etc.) — out of scope here by design.
pub trait PushSink {
    fn publish(&mut self, snapshot: &Snapshot);
}

/// Commands accepted from the inbound command channel (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    Play,
    Pause,
    Resume,
    Reset,
    Step,
    Speed,
    Stop,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandFrame {
    pub command: Command,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Paces snapshot emission independently of the tick rate.
pub struct PushAdapter {
    cadence_hz: f64,
    last_push_ts: Option<SimTime>,
}

impl PushAdapter {
    pub fn new(cadence_hz: f64) -> Self {
        Self {
            cadence_hz,
            last_push_ts: None,
        }
    }

    fn interval(&self) -> f64 {
        if self.cadence_hz <= 0.0 {
            f64::INFINITY
        } else {
            1.0 / self.cadence_hz
        }
    }

    /// Pushes `snapshot` to `sink` if the cadence interval has elapsed
    /// since the last push, returning whether it did.
    pub fn maybe_push(&mut self, now: SimTime, snapshot: Snapshot, sink: &mut dyn PushSink) -> bool {
        let due = match self.last_push_ts {
            None => true,
            Some(last) => (now - last).as_seconds() >= self.interval(),
        };
        if due {
            sink.publish(&snapshot);
            self.last_push_ts = Some(now);
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingSink {
        received: Vec<Snapshot>,
    }

    impl PushSink for RecordingSink {
        fn publish(&mut self, snapshot: &Snapshot) {
            self.received.push(snapshot.clone());
        }
    }

    fn snapshot() -> Snapshot {
        Snapshot {
            simulation_state: SimulationStateFrame {
                running: true,
                paused: false,
                sim_time_s: 0.0,
                speed: 1.0,
                frame_count: 0,
            },
            robot: RobotDataFrame {
                id: "R1".into(),
                state: "IDLE".into(),
                aisle: 1.0,
                rack: 1.0,
                direction: "FORWARD".into(),
                held_items: 0,
                capacity: 5,
                current_order: None,
            },
            order: OrderDataFrame {
                pending: 0,
                completed: 0,
                failed: 0,
                peak_size: 0,
                avg_wait_time_s: 0.0,
            },
            kpi: KpiDataFrame {
                avg_efficiency: 0.0,
                recent_trend: 0.0,
                orders_completed: 0,
                orders_failed: 0,
                avg_fulfillment_time_s: 0.0,
            },
            inventory: InventoryDataFrame {
                total_cells: 499,
                items_available: 499,
            },
            warehouse: WarehouseDataFrame {
                aisles: 25,
                racks: 20,
                base_aisle: 1,
                base_rack: 1,
            },
        }
    }

    #[test]
    fn test_first_push_always_fires() {
        let mut adapter = PushAdapter::new(10.0);
        let mut sink = RecordingSink { received: Vec::new() };
        assert!(adapter.maybe_push(SimTime::ZERO, snapshot(), &mut sink));
        assert_eq!(sink.received.len(), 1);
    }

    #[test]
    fn test_respects_cadence_interval() {
        let mut adapter = PushAdapter::new(10.0); // 0.1s interval
        let mut sink = RecordingSink { received: Vec::new() };
        adapter.maybe_push(SimTime::ZERO, snapshot(), &mut sink);
        assert!(!adapter.maybe_push(SimTime::from_seconds(0.05), snapshot(), &mut sink));
        assert!(adapter.maybe_push(SimTime::from_seconds(0.11), snapshot(), &mut sink));
        assert_eq!(sink.received.len(), 2);
    }

    #[test]
    fn test_command_frame_parses_wire_names() {
        let frame: CommandFrame =
            serde_json::from_str(r#"{"command": "pause", "params": {}}"#).unwrap();
        assert_eq!(frame.command, Command::Pause);
    }
}
