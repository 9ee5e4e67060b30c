//! The Robot Assigner (§4.7): matches exactly one order to the single
//! robot at a time, strict FIFO by queue position.

use packrunner_core::{ItemId, OrderId, SimTime};
use packrunner_entities::{Order, OrderQueue};

#[derive(Default)]
pub struct RobotAssigner {
    current_order_id: Option<OrderId>,
}

impl RobotAssigner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_current(&self) -> bool {
        self.current_order_id.is_some()
    }

    pub fn current_order_id(&self) -> Option<&OrderId> {
        self.current_order_id.as_ref()
    }

    /// Succeeds only when the robot is idle and no assignment is held. The
    /// queue's FIFO head is already the oldest pending order; `next` records
    /// its wait time as observed at `now`.
    pub fn try_assign(&mut self, robot_is_idle: bool, queue: &mut OrderQueue, now: SimTime) -> Option<Order> {
        if !robot_is_idle || self.current_order_id.is_some() {
            return None;
        }
        let mut order = queue.next(now)?.clone();
        let robot_marker = "robot-0";
        order.assign(robot_marker, now);
        self.current_order_id = Some(order.id.clone());
        Some(order)
    }

    /// Marks an item collected on the in-progress order; returns whether
    /// the order is now fully collected.
    pub fn on_item_collected(&self, order: &mut Order, item_id: ItemId) -> bool {
        order.mark_collected(item_id);
        order.is_fully_collected()
    }

    pub fn complete_current(&mut self, queue: &mut OrderQueue, mut order: Order, now: SimTime, total_distance: f64) {
        order.complete(now, total_distance);
        queue.complete(order);
        self.current_order_id = None;
    }

    pub fn fail_current(&mut self, queue: &mut OrderQueue, mut order: Order, now: SimTime, total_distance: f64) {
        order.fail(now, total_distance);
        queue.fail(order);
        self.current_order_id = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use packrunner_core::SimTime;
    use packrunner_entities::Item;
    use packrunner_grid::Coordinate;

    fn order(id: &str) -> Order {
        Order::new(
            OrderId(id.to_string()),
            vec![Item {
                id: ItemId::for_location(1, 2),
                location: Coordinate::new(1, 2),
            }],
            SimTime::ZERO,
        )
    }

    #[test]
    fn test_assign_requires_idle_robot() {
        let mut assigner = RobotAssigner::new();
        let mut queue = OrderQueue::new(10);
        queue.add(order("A")).unwrap();
        assert!(assigner.try_assign(false, &mut queue, SimTime::ZERO).is_none());
    }

    #[test]
    fn test_assign_blocked_while_current_held() {
        let mut assigner = RobotAssigner::new();
        let mut queue = OrderQueue::new(10);
        queue.add(order("A")).unwrap();
        queue.add(order("B")).unwrap();
        assigner.try_assign(true, &mut queue, SimTime::ZERO).unwrap();
        assert!(assigner.try_assign(true, &mut queue, SimTime::ZERO).is_none());
    }

    #[test]
    fn test_assign_picks_fifo_head() {
        let mut assigner = RobotAssigner::new();
        let mut queue = OrderQueue::new(10);
        queue.add(order("A")).unwrap();
        queue.add(order("B")).unwrap();
        let assigned = assigner.try_assign(true, &mut queue, SimTime::ZERO).unwrap();
        assert_eq!(assigned.id.as_str(), "A");
    }

    #[test]
    fn test_complete_clears_slot_for_next_assignment() {
        let mut assigner = RobotAssigner::new();
        let mut queue = OrderQueue::new(10);
        queue.add(order("A")).unwrap();
        let assigned = assigner.try_assign(true, &mut queue, SimTime::ZERO).unwrap();
        assigner.complete_current(&mut queue, assigned, SimTime::from_seconds(10.0), 5.0);
        assert!(!assigner.has_current());
        assert_eq!(queue.completed().len(), 1);
    }
}
