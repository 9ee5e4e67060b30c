//! Snake-path planner: shortest valid path between two cells respecting
//! the snake discipline and the direction-change cooldown.

use std::collections::{BinaryHeap, HashMap};
use std::time::Instant;

use packrunner_core::error::{SimError, SimResult};

use crate::coordinate::{Coordinate, GridDimensions};
use crate::snake::{SnakeOracle, TravelDirection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Axis {
    Rack,
    Aisle,
}

/// The last move made on the way into a cell: `None` at the path's origin.
type Move = Option<(Axis, i64)>;

/// Lexicographic cost: fewer steps wins, ties broken by fewer direction
/// changes (§4.4: "minimises direction changes as the primary tie-break
/// after length").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Cost {
    steps: u32,
    changes: u32,
}

impl Cost {
    const ZERO: Cost = Cost {
        steps: 0,
        changes: 0,
    };

    fn extend(self, changed: bool) -> Cost {
        Cost {
            steps: self.steps + 1,
            changes: self.changes + changed as u32,
        }
    }
}

/// Min-heap entry; `Ord` is reversed so `BinaryHeap` pops the cheapest cost.
#[derive(PartialEq, Eq)]
struct HeapEntry {
    cost: Cost,
    node: Coordinate,
    last_move: Move,
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other.cost.cmp(&self.cost)
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Parameters a [`PathPlanner::plan`] call is evaluated against.
pub struct PathRequest {
    pub start: Coordinate,
    pub goal: Coordinate,
    pub direction: TravelDirection,
    pub snake_integrity: bool,
}

/// Timing knobs from `bidirectional_navigation` (§6).
#[derive(Debug, Clone, Copy)]
pub struct PlannerConfig {
    /// Seconds of simulated travel time attributed to a single grid step.
    pub aisle_traversal_time: f64,
    pub direction_change_cooldown: f64,
    pub max_path_calculation_time: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            aisle_traversal_time: 7.0,
            direction_change_cooldown: 0.5,
            max_path_calculation_time: 0.1,
        }
    }
}

/// Result of a [`PathPlanner::plan`] call (§4.4).
#[derive(Debug, Clone)]
pub struct PlannedPath {
    pub path: Vec<Coordinate>,
    pub direction_changes: u32,
    pub est_duration_s: f64,
    /// Cooldown violations recorded because no detour was possible
    /// (the robot was at a grid boundary when a change was forced).
    pub cooldown_violations: u32,
    /// Set when `max_path_calculation_time` was exceeded; `path` is the
    /// best candidate found before the budget ran out.
    pub timed_out: bool,
}

pub struct PathPlanner;

impl PathPlanner {
    /// Plan a path from `req.start` to `req.goal`. Pure function: no side
    /// effects, no event emission (the caller surfaces `PERFORMANCE_WARNING`
    /// and cooldown-violation telemetry from the returned data).
    pub fn plan(
        grid: &GridDimensions,
        req: &PathRequest,
        cfg: &PlannerConfig,
    ) -> SimResult<PlannedPath> {
        if !grid.contains(&req.start) {
            return Err(SimError::path(
                (req.start.aisle as i32, req.start.rack as i32),
                (req.goal.aisle as i32, req.goal.rack as i32),
            ));
        }
        if !grid.contains(&req.goal) {
            return Err(SimError::path(
                (req.start.aisle as i32, req.start.rack as i32),
                (req.goal.aisle as i32, req.goal.rack as i32),
            ));
        }

        let deadline = Instant::now();
        let budget = cfg.max_path_calculation_time;

        if req.start == req.goal {
            return Ok(PlannedPath {
                path: vec![req.start],
                direction_changes: 0,
                est_duration_s: 0.0,
                cooldown_violations: 0,
                timed_out: false,
            });
        }

        let (mut path, timed_out) = Self::dijkstra(grid, req, deadline, budget)
            .ok_or_else(|| {
                SimError::path(
                    (req.start.aisle as i32, req.start.rack as i32),
                    (req.goal.aisle as i32, req.goal.rack as i32),
                )
            })?;

        let mut violations = 0u32;
        if !timed_out {
            violations = Self::apply_cooldown(grid, req, cfg, &mut path, deadline, budget);
        }

        let (direction_changes, est_duration_s) = Self::summarize(&path, cfg);

        Ok(PlannedPath {
            path,
            direction_changes,
            est_duration_s,
            cooldown_violations: violations,
            timed_out,
        })
    }

    fn neighbors(
        grid: &GridDimensions,
        node: Coordinate,
        direction: TravelDirection,
        snake_integrity: bool,
    ) -> Vec<(Coordinate, Axis, i64)> {
        let mut out = Vec::with_capacity(4);

        for delta in [-1i64, 1i64] {
            let new_rack = node.rack as i64 + delta;
            if new_rack >= 1 {
                let candidate = Coordinate::new(node.aisle, new_rack as u32);
                if grid.contains(&candidate) {
                    let allowed = if snake_integrity {
                        SnakeOracle::rack_order(node.aisle, direction).step() == delta
                    } else {
                        true
                    };
                    if allowed {
                        out.push((candidate, Axis::Rack, delta));
                    }
                }
            }
        }

        for delta in [-1i64, 1i64] {
            let new_aisle = node.aisle as i64 + delta;
            if new_aisle >= 1 {
                let candidate = Coordinate::new(new_aisle as u32, node.rack);
                if grid.contains(&candidate) {
                    out.push((candidate, Axis::Aisle, delta));
                }
            }
        }

        out
    }

    fn is_change(prev: Move, axis: Axis, delta: i64) -> bool {
        match prev {
            None => false,
            Some((paxis, pdelta)) => paxis != axis || pdelta != delta,
        }
    }

    /// Dijkstra over (cell, last-move) states, minimizing `(steps, changes)`.
    /// Returns `(path, timed_out)`; on timeout, `path` is the best partial
    /// route towards the goal found before the budget elapsed.
    fn dijkstra(
        grid: &GridDimensions,
        req: &PathRequest,
        deadline: Instant,
        budget: f64,
    ) -> Option<(Vec<Coordinate>, bool)> {
        let mut dist: HashMap<(Coordinate, Move), Cost> = HashMap::new();
        let mut prev: HashMap<(Coordinate, Move), (Coordinate, Move)> = HashMap::new();
        let mut heap = BinaryHeap::new();

        let start_state = (req.start, None);
        dist.insert(start_state, Cost::ZERO);
        heap.push(HeapEntry {
            cost: Cost::ZERO,
            node: req.start,
            last_move: None,
        });

        let mut best_reached: (Coordinate, Move) = start_state;
        let mut best_remaining = req.start.manhattan_distance(&req.goal);
        let mut timed_out = false;
        let mut checked = 0u32;

        while let Some(HeapEntry {
            cost,
            node,
            last_move,
        }) = heap.pop()
        {
            checked += 1;
            if checked % 64 == 0 && deadline.elapsed().as_secs_f64() > budget {
                timed_out = true;
                break;
            }

            let state = (node, last_move);
            if dist.get(&state).is_some_and(|&d| cost > d) {
                continue;
            }

            let remaining = node.manhattan_distance(&req.goal);
            if remaining < best_remaining {
                best_remaining = remaining;
                best_reached = state;
            }

            if node == req.goal {
                best_reached = state;
                break;
            }

            for (neighbor, axis, delta) in
                Self::neighbors(grid, node, req.direction, req.snake_integrity)
            {
                let changed = Self::is_change(last_move, axis, delta);
                let next_cost = cost.extend(changed);
                let next_state = (neighbor, Some((axis, delta)));

                if dist.get(&next_state).is_none_or(|&d| next_cost < d) {
                    dist.insert(next_state, next_cost);
                    prev.insert(next_state, state);
                    heap.push(HeapEntry {
                        cost: next_cost,
                        node: neighbor,
                        last_move: Some((axis, delta)),
                    });
                }
            }
        }

        let mut path = vec![best_reached.0];
        let mut current = best_reached;
        while let Some(&p) = prev.get(&current) {
            path.push(p.0);
            current = p;
        }
        path.reverse();

        if path.first() != Some(&req.start) {
            return None;
        }

        Some((path, timed_out))
    }

    /// Walks the computed path, inserting a one-cell straight detour ahead
    /// of any direction change that would land sooner than
    /// `direction_change_cooldown` after the previous one. Returns the
    /// number of violations recorded where no detour was possible.
    fn apply_cooldown(
        grid: &GridDimensions,
        req: &PathRequest,
        cfg: &PlannerConfig,
        path: &mut Vec<Coordinate>,
        deadline: Instant,
        budget: f64,
    ) -> u32 {
        let mut violations = 0u32;
        let mut last_change_time = 0.0f64;
        let mut last_move: Move = None;
        let mut i = 1usize;
        let max_iterations = grid.cell_count() * 4 + path.len() * 4;
        let mut iterations = 0usize;

        while i < path.len() {
            iterations += 1;
            if iterations > max_iterations || deadline.elapsed().as_secs_f64() > budget {
                break;
            }

            let prev_cell = path[i - 1];
            let cell = path[i];
            let axis = if prev_cell.aisle == cell.aisle {
                Axis::Rack
            } else {
                Axis::Aisle
            };
            let delta = if axis == Axis::Rack {
                cell.rack as i64 - prev_cell.rack as i64
            } else {
                cell.aisle as i64 - prev_cell.aisle as i64
            };

            let changed = Self::is_change(last_move, axis, delta);
            let change_time = (i as f64) * cfg.aisle_traversal_time;

            if changed {
                if last_move.is_some() && change_time - last_change_time < cfg.direction_change_cooldown
                {
                    let (prev_axis, prev_delta) = last_move.unwrap();
                    let detour = match prev_axis {
                        Axis::Rack => {
                            let new_rack = prev_cell.rack as i64 + prev_delta;
                            (new_rack >= 1).then(|| Coordinate::new(prev_cell.aisle, new_rack as u32))
                        }
                        Axis::Aisle => {
                            let new_aisle = prev_cell.aisle as i64 + prev_delta;
                            (new_aisle >= 1).then(|| Coordinate::new(new_aisle as u32, prev_cell.rack))
                        }
                    }
                    .filter(|c| grid.contains(c))
                    .filter(|c| {
                        prev_axis != Axis::Rack
                            || !req.snake_integrity
                            || SnakeOracle::rack_order(prev_cell.aisle, req.direction).step()
                                == prev_delta
                    });

                    if let Some(detour_cell) = detour {
                        // Re-route the suffix from the detour cell; this is
                        // the "up to one extra cell" cost of honoring the
                        // cooldown.
                        let sub_req = PathRequest {
                            start: detour_cell,
                            goal: req.goal,
                            direction: req.direction,
                            snake_integrity: req.snake_integrity,
                        };
                        if let Some((suffix, _)) = Self::dijkstra(grid, &sub_req, deadline, budget)
                        {
                            path.truncate(i);
                            path.extend(suffix);
                            last_move = Some((prev_axis, prev_delta));
                            last_change_time = change_time;
                            i += 1;
                            continue;
                        }
                    }

                    violations += 1;
                }
                last_change_time = change_time;
            }

            last_move = Some((axis, delta));
            i += 1;
        }

        violations
    }

    fn summarize(path: &[Coordinate], cfg: &PlannerConfig) -> (u32, f64) {
        let mut changes = 0u32;
        let mut last_move: Move = None;
        for window in path.windows(2) {
            let (prev_cell, cell) = (window[0], window[1]);
            let axis = if prev_cell.aisle == cell.aisle {
                Axis::Rack
            } else {
                Axis::Aisle
            };
            let delta = if axis == Axis::Rack {
                cell.rack as i64 - prev_cell.rack as i64
            } else {
                cell.aisle as i64 - prev_cell.aisle as i64
            };
            if Self::is_change(last_move, axis, delta) {
                changes += 1;
            }
            last_move = Some((axis, delta));
        }

        let steps = path.len().saturating_sub(1) as f64;
        (changes, steps * cfg.aisle_traversal_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> GridDimensions {
        GridDimensions::new(25, 20)
    }

    #[test]
    fn test_same_cell_returns_single_node_path() {
        let req = PathRequest {
            start: Coordinate::new(3, 4),
            goal: Coordinate::new(3, 4),
            direction: TravelDirection::Forward,
            snake_integrity: true,
        };
        let result = PathPlanner::plan(&grid(), &req, &PlannerConfig::default()).unwrap();
        assert_eq!(result.path, vec![Coordinate::new(3, 4)]);
        assert_eq!(result.direction_changes, 0);
    }

    #[test]
    fn test_out_of_bounds_is_error() {
        let req = PathRequest {
            start: Coordinate::new(1, 1),
            goal: Coordinate::new(999, 1),
            direction: TravelDirection::Forward,
            snake_integrity: true,
        };
        assert!(PathPlanner::plan(&grid(), &req, &PlannerConfig::default()).is_err());
    }

    #[test]
    fn test_path_is_contiguous() {
        let req = PathRequest {
            start: Coordinate::new(1, 1),
            goal: Coordinate::new(5, 10),
            direction: TravelDirection::Forward,
            snake_integrity: true,
        };
        let result = PathPlanner::plan(&grid(), &req, &PlannerConfig::default()).unwrap();
        for window in result.path.windows(2) {
            assert_eq!(window[0].manhattan_distance(&window[1]), 1);
        }
        assert_eq!(result.path.first(), Some(&req.start));
        assert_eq!(result.path.last(), Some(&req.goal));
    }

    #[test]
    fn test_snake_integrity_respects_oracle_within_aisle() {
        // Odd aisle 1 traverses ascending rack order forward; a path that
        // starts mid-aisle-1 and must reach a lower rack in aisle 1 without
        // leaving the aisle is impossible under integrity, so the planner
        // must detour through an adjacent aisle instead of violating order.
        let req = PathRequest {
            start: Coordinate::new(1, 5),
            goal: Coordinate::new(1, 2),
            direction: TravelDirection::Forward,
            snake_integrity: true,
        };
        let result = PathPlanner::plan(&grid(), &req, &PlannerConfig::default()).unwrap();
        // Every in-aisle-1 rack move in the realized path must be ascending.
        for window in result.path.windows(2) {
            let (a, b) = (window[0], window[1]);
            if a.aisle == b.aisle && a.aisle == 1 {
                assert!(b.rack as i64 - a.rack as i64 >= 0);
            }
        }
    }

    #[test]
    fn test_direction_change_cooldown_forces_detour_or_violation() {
        let cfg = PlannerConfig {
            aisle_traversal_time: 1.0,
            direction_change_cooldown: 5.0,
            max_path_calculation_time: 0.1,
        };
        let req = PathRequest {
            start: Coordinate::new(1, 1),
            goal: Coordinate::new(3, 3),
            direction: TravelDirection::Forward,
            snake_integrity: false,
        };
        let result = PathPlanner::plan(&grid(), &req, &cfg).unwrap();
        // With a long cooldown relative to per-cell time, at least one of
        // the zig-zag's direction changes must have been deferred or
        // recorded as a violation.
        assert!(result.direction_changes >= 1 || result.cooldown_violations >= 1);
    }
}
