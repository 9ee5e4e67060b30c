//! JSON configuration loading, defaulting, and aggregate validation.

pub mod config;
pub mod loader;
pub mod validation;

pub use config::{
    BaseLocation, BidirectionalNavigationSection, Config, DebuggingSection, EngineSection,
    NavPerformanceMonitoringSection, OrdersSection, PathOptimizationSection, PerformanceSection,
    RobotSection, SimulationSection, TimingSection, WarehouseSection,
};
pub use loader::{load, reload, save};
pub use validation::{validate, FieldPath, ValidationError, ValidationErrorKind};
