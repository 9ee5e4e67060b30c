//! The robot state machine, its interpolated movement, and collection dwell.

use packrunner_core::{ItemId, OrderId, SimError, SimResult, SimTime};
use packrunner_grid::{Coordinate, TravelDirection};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RobotState {
    Idle,
    MovingToItem,
    CollectingItem,
    Returning,
}

impl RobotState {
    /// §3's transition table. Setting the same state is always legal
    /// (a no-op); every other pair not listed here is illegal.
    pub fn can_transition_to(self, next: RobotState) -> bool {
        use RobotState::*;
        if self == next {
            return true;
        }
        matches!(
            (self, next),
            (Idle, MovingToItem)
                | (MovingToItem, CollectingItem)
                | (MovingToItem, Returning)
                | (CollectingItem, MovingToItem)
                | (CollectingItem, Returning)
                | (Returning, Idle)
        )
    }
}

/// Position during interpolated travel; snaps back to integer coordinates
/// at path nodes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloatPosition {
    pub aisle: f64,
    pub rack: f64,
}

impl FloatPosition {
    pub fn from_coordinate(c: Coordinate) -> Self {
        Self {
            aisle: c.aisle as f64,
            rack: c.rack as f64,
        }
    }

    pub fn lerp(start: Coordinate, end: Coordinate, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            aisle: start.aisle as f64 + (end.aisle as f64 - start.aisle as f64) * t,
            rack: start.rack as f64 + (end.rack as f64 - start.rack as f64) * t,
        }
    }

    pub fn to_coordinate_rounded(self) -> Coordinate {
        Coordinate::new(self.aisle.round() as u32, self.rack.round() as u32)
    }
}

/// Interpolated movement between two adjacent (or path-neighbour) cells.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MovementState {
    pub start: Coordinate,
    pub target: Coordinate,
    pub t_start: SimTime,
    pub duration: f64,
    pub progress: f64,
}

impl MovementState {
    pub fn new(start: Coordinate, target: Coordinate, t_start: SimTime, duration: f64) -> Self {
        Self {
            start,
            target,
            t_start,
            duration,
            progress: 0.0,
        }
    }

    pub fn advance(&mut self, now: SimTime) -> f64 {
        let elapsed = (now - self.t_start).as_seconds();
        self.progress = if self.duration <= 0.0 {
            1.0
        } else {
            (elapsed / self.duration).min(1.0)
        };
        self.progress
    }

    pub fn is_complete(&self) -> bool {
        self.progress >= 1.0
    }

    pub fn position(&self) -> FloatPosition {
        FloatPosition::lerp(self.start, self.target, self.progress)
    }
}

/// Dwell timer while the robot is stationary collecting an item.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CollectionState {
    pub item_id: Option<ItemId>,
    pub t_start: Option<SimTime>,
    pub duration: f64,
}

impl CollectionState {
    pub fn start(&mut self, item_id: ItemId, t_start: SimTime, duration: f64) {
        self.item_id = Some(item_id);
        self.t_start = Some(t_start);
        self.duration = duration;
    }

    pub fn elapsed(&self, now: SimTime) -> f64 {
        self.t_start.map(|t| (now - t).as_seconds()).unwrap_or(0.0)
    }

    pub fn is_done(&self, now: SimTime) -> bool {
        self.t_start.is_some() && self.elapsed(now) >= self.duration
    }

    pub fn clear(&mut self) {
        self.item_id = None;
        self.t_start = None;
        self.duration = 0.0;
    }
}

/// The single robot in the simulation (§3: exactly one robot exists).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Robot {
    pub id: String,
    pub state: RobotState,
    pub position: FloatPosition,
    pub direction: TravelDirection,
    pub held_items: Vec<ItemId>,
    pub capacity: usize,
    pub current_order: Option<OrderId>,
    pub movement: Option<MovementState>,
    pub collection: CollectionState,
}

impl Robot {
    pub fn new(id: impl Into<String>, start: Coordinate, capacity: usize) -> Self {
        Self {
            id: id.into(),
            state: RobotState::Idle,
            position: FloatPosition::from_coordinate(start),
            direction: TravelDirection::Forward,
            held_items: Vec::new(),
            capacity,
            current_order: None,
            movement: None,
            collection: CollectionState::default(),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state == RobotState::Idle && self.current_order.is_none()
    }

    /// Enforces §3's transition table; a no-op for a same-state "change".
    pub fn transition_to(&mut self, next: RobotState) -> SimResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(SimError::fatal(format!(
                "illegal robot state transition {:?} -> {:?}",
                self.state, next
            )));
        }
        self.state = next;
        Ok(())
    }

    /// §4.8: attempting to collect beyond capacity is an error.
    pub fn collect_item(&mut self, item_id: ItemId) -> SimResult<()> {
        if self.held_items.len() >= self.capacity {
            return Err(SimError::capacity(format!(
                "robot {} at capacity ({})",
                self.id, self.capacity
            )));
        }
        self.held_items.push(item_id);
        Ok(())
    }

    pub fn current_coordinate(&self) -> Coordinate {
        match &self.movement {
            Some(m) if !m.is_complete() => self.position.to_coordinate_rounded(),
            _ => self.position.to_coordinate_rounded(),
        }
    }

    pub fn reset_for_next_order(&mut self) {
        self.current_order = None;
        self.held_items.clear();
        self.movement = None;
        self.collection.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_transitions() {
        use RobotState::*;
        assert!(Idle.can_transition_to(MovingToItem));
        assert!(MovingToItem.can_transition_to(CollectingItem));
        assert!(MovingToItem.can_transition_to(Returning));
        assert!(CollectingItem.can_transition_to(MovingToItem));
        assert!(CollectingItem.can_transition_to(Returning));
        assert!(Returning.can_transition_to(Idle));
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        use RobotState::*;
        assert!(!Idle.can_transition_to(CollectingItem));
        assert!(!Idle.can_transition_to(Returning));
        assert!(!Returning.can_transition_to(MovingToItem));
    }

    #[test]
    fn test_same_state_is_noop() {
        use RobotState::*;
        assert!(Idle.can_transition_to(Idle));
        let mut robot = Robot::new("R1", Coordinate::new(1, 1), 5);
        assert!(robot.transition_to(RobotState::Idle).is_ok());
        assert_eq!(robot.state, RobotState::Idle);
    }

    #[test]
    fn test_transition_to_enforces_table() {
        let mut robot = Robot::new("R1", Coordinate::new(1, 1), 5);
        assert!(robot.transition_to(RobotState::CollectingItem).is_err());
        assert!(robot.transition_to(RobotState::MovingToItem).is_ok());
    }

    #[test]
    fn test_capacity_enforced() {
        let mut robot = Robot::new("R1", Coordinate::new(1, 1), 1);
        assert!(robot
            .collect_item(ItemId::for_location(1, 2))
            .is_ok());
        assert!(robot
            .collect_item(ItemId::for_location(1, 3))
            .is_err());
    }

    #[test]
    fn test_movement_interpolation() {
        let start = Coordinate::new(1, 1);
        let target = Coordinate::new(1, 8);
        let mut movement = MovementState::new(start, target, SimTime::ZERO, 7.0);
        movement.advance(SimTime::from_seconds(3.5));
        assert!((movement.progress - 0.5).abs() < 1e-9);
        let pos = movement.position();
        assert!((pos.rack - 4.5).abs() < 1e-9);
    }

    #[test]
    fn test_collection_dwell_completion() {
        let mut collection = CollectionState::default();
        collection.start(ItemId::for_location(1, 2), SimTime::ZERO, 3.0);
        assert!(!collection.is_done(SimTime::from_seconds(2.0)));
        assert!(collection.is_done(SimTime::from_seconds(3.0)));
    }
}
