//! Order, item, queue, and robot entities for the warehouse simulation.

pub mod item;
pub mod order;
pub mod queue;
pub mod robot;

pub use item::{Item, ItemPool};
pub use order::{Order, OrderStatus};
pub use queue::{OrderQueue, QueueStats};
pub use robot::{CollectionState, FloatPosition, MovementState, Robot, RobotState};
