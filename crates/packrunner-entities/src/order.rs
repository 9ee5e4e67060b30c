//! Order entity and its lifecycle.

use std::collections::HashSet;

use packrunner_core::{ItemId, OrderId, SimTime};
use serde::{Deserialize, Serialize};

use crate::item::Item;

/// §9 collapses the source's `ASSIGNED` into `IN_PROGRESS`; `assigned_ts`
/// on [`Order`] is the moment the Assigner takes the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub items: Vec<Item>,
    pub status: OrderStatus,
    pub created_ts: SimTime,
    pub assigned_ts: Option<SimTime>,
    pub completed_ts: Option<SimTime>,
    pub robot_id: Option<String>,
    pub collected: HashSet<ItemId>,
    /// Path-length-based distance actually traversed while fulfilling the
    /// order (§9's resolution of the source's heuristic-vs-actual question).
    pub total_distance: f64,
    /// `items * 10.0`, retained for downstream analytics that still expect
    /// the source's heuristic (§9, SPEC_FULL §D); never used for efficiency.
    pub legacy_distance_estimate: f64,
    pub efficiency: f64,
}

impl Order {
    pub fn new(id: OrderId, items: Vec<Item>, created_ts: SimTime) -> Self {
        let legacy_distance_estimate = items.len() as f64 * 10.0;
        Self {
            id,
            items,
            status: OrderStatus::Pending,
            created_ts,
            assigned_ts: None,
            completed_ts: None,
            robot_id: None,
            collected: HashSet::new(),
            total_distance: 0.0,
            legacy_distance_estimate,
            efficiency: 0.0,
        }
    }

    pub fn assign(&mut self, robot_id: impl Into<String>, ts: SimTime) {
        self.status = OrderStatus::InProgress;
        self.assigned_ts = Some(ts);
        self.robot_id = Some(robot_id.into());
    }

    pub fn mark_collected(&mut self, item_id: ItemId) {
        self.collected.insert(item_id);
    }

    pub fn is_fully_collected(&self) -> bool {
        self.items.iter().all(|i| self.collected.contains(&i.id))
    }

    /// `collected/|items| * 0.7 + time_efficiency * 0.3`, §4.9.
    pub fn compute_efficiency(&self, completion_time_s: f64) -> f64 {
        let collection_ratio = if self.items.is_empty() {
            0.0
        } else {
            self.collected.len() as f64 / self.items.len() as f64
        };
        let time_efficiency = (1.0 - completion_time_s / 300.0).max(0.0);
        collection_ratio * 0.7 + time_efficiency * 0.3
    }

    pub fn complete(&mut self, ts: SimTime, total_distance: f64) {
        self.status = OrderStatus::Completed;
        self.completed_ts = Some(ts);
        self.total_distance = total_distance;
        let completion_time = self.assigned_ts.map(|a| (ts - a).as_seconds()).unwrap_or(0.0);
        self.efficiency = self.compute_efficiency(completion_time);
    }

    pub fn fail(&mut self, ts: SimTime, total_distance: f64) {
        self.status = OrderStatus::Failed;
        self.completed_ts = Some(ts);
        self.total_distance = total_distance;
        let completion_time = self.assigned_ts.map(|a| (ts - a).as_seconds()).unwrap_or(0.0);
        self.efficiency = self.compute_efficiency(completion_time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use packrunner_grid::Coordinate;

    fn item(aisle: u32, rack: u32) -> Item {
        Item {
            id: ItemId::for_location(aisle, rack),
            location: Coordinate::new(aisle, rack),
        }
    }

    #[test]
    fn test_new_order_is_pending() {
        let order = Order::new(OrderId("ORD_TEST".into()), vec![item(1, 2)], SimTime::ZERO);
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.assigned_ts.is_none());
        assert_eq!(order.legacy_distance_estimate, 10.0);
    }

    #[test]
    fn test_assign_sets_in_progress_and_timestamp() {
        let mut order = Order::new(OrderId("ORD_TEST".into()), vec![item(1, 2)], SimTime::ZERO);
        order.assign("robot-1", SimTime::from_seconds(1.0));
        assert_eq!(order.status, OrderStatus::InProgress);
        assert_eq!(order.assigned_ts, Some(SimTime::from_seconds(1.0)));
    }

    #[test]
    fn test_fully_collected_requires_all_items() {
        let i1 = item(1, 2);
        let i2 = item(1, 3);
        let mut order = Order::new(OrderId("ORD_TEST".into()), vec![i1.clone(), i2.clone()], SimTime::ZERO);
        assert!(!order.is_fully_collected());
        order.mark_collected(i1.id.clone());
        assert!(!order.is_fully_collected());
        order.mark_collected(i2.id.clone());
        assert!(order.is_fully_collected());
    }

    #[test]
    fn test_efficiency_formula() {
        let i1 = item(1, 2);
        let mut order = Order::new(OrderId("ORD_TEST".into()), vec![i1.clone()], SimTime::ZERO);
        order.mark_collected(i1.id.clone());
        // Fast completion (0s): time_efficiency = 1.0, collection_ratio = 1.0
        let eff = order.compute_efficiency(0.0);
        assert!((eff - 1.0).abs() < 1e-9);
        // At 300s: time_efficiency = 0.0
        let eff_slow = order.compute_efficiency(300.0);
        assert!((eff_slow - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_complete_sets_terminal_fields() {
        let mut order = Order::new(OrderId("ORD_TEST".into()), vec![item(1, 2)], SimTime::ZERO);
        order.assign("robot-1", SimTime::ZERO);
        order.complete(SimTime::from_seconds(10.0), 42.0);
        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(order.total_distance, 42.0);
        assert_eq!(order.completed_ts, Some(SimTime::from_seconds(10.0)));
    }
}
