//! Performance monitoring and order-completion analytics.

pub mod performance_monitor;
pub mod ring_buffer;
pub mod status_tracker;

pub use performance_monitor::{
    DirectionChangeSample, MovementEfficiencySample, OptimizationLevel, PathCalcSample,
    PerformanceMonitor, PerformanceMonitorConfig, PerformanceWarning,
};
pub use ring_buffer::RingBuffer;
pub use status_tracker::{CumulativeStats, CurrentStatus, OrderCompletionRecord, StatusTracker};
