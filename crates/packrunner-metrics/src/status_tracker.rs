//! The Status Tracker (§4.9): per-order completion analytics.
//!
//! Exposes the same `status`/`stats` split as the source's controls
//! surface — `current()` is the most recent completion plus a short-term
//! trend, `cumulative()` is the running totals since the simulation started.

use packrunner_core::SimTime;
use serde::{Deserialize, Serialize};

use crate::ring_buffer::RingBuffer;

const EFFICIENCY_WINDOW: usize = 50;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrderCompletionRecord {
    pub completed_at: SimTime,
    pub efficiency: f64,
    pub total_distance: f64,
    pub fulfillment_time: f64,
    pub succeeded: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CurrentStatus {
    pub last_completion: Option<f64>,
    pub recent_trend: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CumulativeStats {
    pub orders_completed: u64,
    pub orders_failed: u64,
    pub total_distance: f64,
    pub avg_efficiency: f64,
    pub avg_fulfillment_time: f64,
    pub error_count: u64,
    pub warning_count: u64,
    pub failed_events: u64,
    pub dropped_frames: u64,
}

#[derive(Default)]
pub struct StatusTracker {
    orders_completed: u64,
    orders_failed: u64,
    total_distance: f64,
    efficiency_sum: f64,
    fulfillment_time_sum: f64,
    efficiency_window: Option<RingBuffer<f64>>,
    last_completion: Option<OrderCompletionRecord>,
    error_count: u64,
    warning_count: u64,
    failed_events: u64,
    dropped_frames: u64,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self {
            efficiency_window: Some(RingBuffer::new(EFFICIENCY_WINDOW)),
            ..Default::default()
        }
    }

    fn window(&mut self) -> &mut RingBuffer<f64> {
        self.efficiency_window.get_or_insert_with(|| RingBuffer::new(EFFICIENCY_WINDOW))
    }

    pub fn record_completion(
        &mut self,
        completed_at: SimTime,
        efficiency: f64,
        total_distance: f64,
        fulfillment_time: f64,
    ) {
        self.orders_completed += 1;
        self.total_distance += total_distance;
        self.efficiency_sum += efficiency;
        self.fulfillment_time_sum += fulfillment_time;
        self.window().push(efficiency);
        self.last_completion = Some(OrderCompletionRecord {
            completed_at,
            efficiency,
            total_distance,
            fulfillment_time,
            succeeded: true,
        });
    }

    pub fn record_failure(
        &mut self,
        completed_at: SimTime,
        efficiency: f64,
        total_distance: f64,
        fulfillment_time: f64,
    ) {
        self.orders_failed += 1;
        self.last_completion = Some(OrderCompletionRecord {
            completed_at,
            efficiency,
            total_distance,
            fulfillment_time,
            succeeded: false,
        });
    }

    pub fn record_error(&mut self) {
        self.error_count += 1;
    }

    pub fn record_warning(&mut self) {
        self.warning_count += 1;
    }

    pub fn record_failed_event(&mut self) {
        self.failed_events += 1;
    }

    pub fn record_dropped_frame(&mut self) {
        self.dropped_frames += 1;
    }

    pub fn current(&self) -> CurrentStatus {
        let window = self.efficiency_window.as_ref();
        let recent_trend = window
            .map(|w| {
                let sum: f64 = w.iter().sum();
                if w.len() == 0 {
                    0.0
                } else {
                    sum / w.len() as f64
                }
            })
            .unwrap_or(0.0);
        CurrentStatus {
            last_completion: self.last_completion.map(|r| r.efficiency),
            recent_trend,
        }
    }

    pub fn cumulative(&self) -> CumulativeStats {
        let completed = self.orders_completed.max(1) as f64;
        CumulativeStats {
            orders_completed: self.orders_completed,
            orders_failed: self.orders_failed,
            total_distance: self.total_distance,
            avg_efficiency: if self.orders_completed == 0 {
                0.0
            } else {
                self.efficiency_sum / completed
            },
            avg_fulfillment_time: if self.orders_completed == 0 {
                0.0
            } else {
                self.fulfillment_time_sum / completed
            },
            error_count: self.error_count,
            warning_count: self.warning_count,
            failed_events: self.failed_events,
            dropped_frames: self.dropped_frames,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avg_efficiency_running_average() {
        let mut tracker = StatusTracker::new();
        tracker.record_completion(SimTime::from_seconds(1.0), 1.0, 10.0, 5.0);
        tracker.record_completion(SimTime::from_seconds(2.0), 0.5, 10.0, 5.0);
        let stats = tracker.cumulative();
        assert_eq!(stats.orders_completed, 2);
        assert!((stats.avg_efficiency - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_failures_tracked_separately_from_completions() {
        let mut tracker = StatusTracker::new();
        tracker.record_completion(SimTime::ZERO, 1.0, 10.0, 5.0);
        tracker.record_failure(SimTime::from_seconds(1.0), 0.2, 5.0, 2.0);
        let stats = tracker.cumulative();
        assert_eq!(stats.orders_completed, 1);
        assert_eq!(stats.orders_failed, 1);
    }

    #[test]
    fn test_recent_trend_bounded_to_last_50() {
        let mut tracker = StatusTracker::new();
        for i in 0..60 {
            tracker.record_completion(SimTime::from_seconds(i as f64), 1.0, 1.0, 1.0);
        }
        tracker.record_completion(SimTime::from_seconds(60.0), 0.0, 1.0, 1.0);
        // 50 ones + 1 zero averaged over the last 50 samples, not all 61.
        let trend = tracker.current().recent_trend;
        assert!(trend > 0.9);
    }

    #[test]
    fn test_error_counters_independent() {
        let mut tracker = StatusTracker::new();
        tracker.record_error();
        tracker.record_warning();
        tracker.record_failed_event();
        tracker.record_dropped_frame();
        let stats = tracker.cumulative();
        assert_eq!(stats.error_count, 1);
        assert_eq!(stats.warning_count, 1);
        assert_eq!(stats.failed_events, 1);
        assert_eq!(stats.dropped_frames, 1);
    }
}
