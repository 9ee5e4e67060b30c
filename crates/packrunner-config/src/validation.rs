//! Aggregate configuration validation, modeled on a field-path-scoped error
//! collector: every problem is recorded, not just the first one found.

use std::fmt;

use crate::config::Config;

#[derive(Debug, Clone)]
pub struct FieldPath(pub String);

impl FieldPath {
    pub fn root() -> Self {
        Self(String::new())
    }

    pub fn field(&self, name: &str) -> Self {
        if self.0.is_empty() {
            Self(name.to_string())
        } else {
            Self(format!("{}.{}", self.0, name))
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub enum ValidationErrorKind {
    OutOfRange { field: String, value: f64, min: f64, max: f64 },
    MustBePositive { field: String, value: f64 },
    InvalidLogLevel { value: String },
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { field, value, min, max } => write!(
                f,
                "{} must be within [{}, {}], got {}",
                field, min, max, value
            ),
            Self::MustBePositive { field, value } => {
                write!(f, "{} must be positive, got {}", field, value)
            }
            Self::InvalidLogLevel { value } => write!(
                f,
                "invalid log level '{}', expected one of: debug, info, warning, error",
                value
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub path: FieldPath,
    pub kind: ValidationErrorKind,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.path, self.kind)
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Default)]
struct Collector {
    errors: Vec<ValidationError>,
}

impl Collector {
    fn range(&mut self, path: &FieldPath, field: &str, value: f64, min: f64, max: f64) {
        if value < min || value > max {
            self.errors.push(ValidationError {
                path: path.field(field),
                kind: ValidationErrorKind::OutOfRange {
                    field: field.to_string(),
                    value,
                    min,
                    max,
                },
            });
        }
    }

    fn positive(&mut self, path: &FieldPath, field: &str, value: f64) {
        if value <= 0.0 {
            self.errors.push(ValidationError {
                path: path.field(field),
                kind: ValidationErrorKind::MustBePositive {
                    field: field.to_string(),
                    value,
                },
            });
        }
    }
}

/// Validates every section, aggregating all violations rather than
/// short-circuiting on the first (§6: "validation errors aggregate and
/// fail load").
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut ctx = Collector::default();
    let root = FieldPath::root();

    let timing = root.field("timing");
    ctx.range(&timing, "target_fps", config.timing.target_fps as f64, 1.0, 240.0);
    ctx.range(&timing, "tick_interval", config.timing.tick_interval, 0.001, 1.0);
    ctx.range(&timing, "simulation_speed", config.timing.simulation_speed, 0.1, 10.0);
    ctx.range(&timing, "max_delta_time", config.timing.max_delta_time, 0.01, 1.0);

    let engine = root.field("engine");
    ctx.range(
        &engine,
        "event_queue_size",
        config.engine.event_queue_size as f64,
        100.0,
        10_000.0,
    );
    ctx.range(
        &engine,
        "max_concurrent_events",
        config.engine.max_concurrent_events as f64,
        10.0,
        1_000.0,
    );

    let warehouse = root.field("warehouse");
    ctx.range(&warehouse, "aisles", config.warehouse.aisles as f64, 1.0, 100.0);
    ctx.range(&warehouse, "racks", config.warehouse.racks as f64, 1.0, 100.0);

    let orders = root.field("orders");
    ctx.range(
        &orders,
        "generation_interval",
        config.orders.generation_interval,
        1.0,
        300.0,
    );
    ctx.range(
        &orders,
        "max_items_per_order",
        config.orders.max_items_per_order as f64,
        1.0,
        20.0,
    );

    let nav = root.field("bidirectional_navigation");
    ctx.positive(&nav, "aisle_traversal_time", config.bidirectional_navigation.aisle_traversal_time);
    ctx.positive(
        &nav,
        "direction_change_cooldown",
        config.bidirectional_navigation.direction_change_cooldown,
    );
    ctx.positive(
        &nav.field("path_optimization"),
        "max_path_calculation_time",
        config.bidirectional_navigation.path_optimization.max_path_calculation_time,
    );

    let level = config.bidirectional_navigation.debugging.log_level.as_str();
    if !matches!(level, "debug" | "info" | "warning" | "error") {
        ctx.errors.push(ValidationError {
            path: nav.field("debugging").field("log_level"),
            kind: ValidationErrorKind::InvalidLogLevel {
                value: level.to_string(),
            },
        });
    }

    if ctx.errors.is_empty() {
        Ok(())
    } else {
        Err(ctx.errors)
    }
}
