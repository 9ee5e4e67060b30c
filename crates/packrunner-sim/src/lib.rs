//! Packrunner Sim - the tick-driven simulator: order generation,
//! assignment, the robot runtime, the push adapter, and the Simulator
//! that owns and drives all of it.

pub mod assigner;
pub mod generator;
pub mod push;
pub mod runner;
pub mod runtime;
pub mod world;

pub use assigner::RobotAssigner;
pub use generator::{GeneratorState, OrderGenerator, OrderGeneratorConfig};
pub use push::{Command, CommandFrame, PushAdapter, PushSink, Snapshot};
pub use runner::{SimulationState, Simulator};
pub use runtime::{RobotRuntime, RuntimeConfig, TickOutcome};
pub use world::World;
