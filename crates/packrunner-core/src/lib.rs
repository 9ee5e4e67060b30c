//! Packrunner Core - core types and tick-driven primitives for the
//! warehouse robot simulation engine.
//!
//! This crate provides the clock, the prioritized event bus, id minting,
//! seeded randomness, and the error taxonomy shared by every other crate
//! in the workspace.

pub mod clock;
pub mod error;
pub mod event;
pub mod id;
pub mod rng;
pub mod time;

pub use clock::{Clock, SpeedSet};
pub use error::{SimError, SimResult};
pub use event::{
    Event, EventBus, EventType, Filter, HandlerId, Middleware, Priority, RingBufferLogger,
    Validator,
};
pub use id::{EventId, IdMinter, ItemId, OrderId};
pub use rng::SimRng;
pub use time::SimTime;
