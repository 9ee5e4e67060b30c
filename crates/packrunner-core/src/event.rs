//! Priority-ordered event bus with middleware.
//!
//! Events drain HIGH before MEDIUM before LOW within a single [`EventBus::process`]
//! call. Each priority lane has its own bounded capacity so a burst of low-priority
//! chatter cannot starve high-priority delivery; `emit` never blocks, it drops on
//! overflow and counts the drop.

use std::collections::{HashMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};

use crate::id::{EventId, IdMinter};
use crate::time::SimTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    fn lane(self) -> usize {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    SimulationStart,
    SimulationStop,
    SimulationPause,
    SimulationResume,
    Tick,
    ConfigLoaded,
    ConfigChanged,
    FrameUpdate,
    PerformanceWarning,
    RobotMoved,
    RobotStateChanged,
    OrderCreated,
    OrderAssigned,
    OrderCompleted,
    OrderFailed,
    InventoryUpdated,
    DirectionChanged,
    ItemCollected,
    SimulationCompleted,
    SystemError,
    SystemWarning,
}

impl EventType {
    /// The wire name used on the push channel and in logs.
    pub fn wire_name(self) -> &'static str {
        match self {
            EventType::SimulationStart => "simulation_start",
            EventType::SimulationStop => "simulation_stop",
            EventType::SimulationPause => "simulation_pause",
            EventType::SimulationResume => "simulation_resume",
            EventType::Tick => "tick",
            EventType::ConfigLoaded => "config_loaded",
            EventType::ConfigChanged => "config_changed",
            EventType::FrameUpdate => "frame_update",
            EventType::PerformanceWarning => "performance_warning",
            EventType::RobotMoved => "robot_moved",
            EventType::RobotStateChanged => "robot_state_changed",
            EventType::OrderCreated => "order_created",
            EventType::OrderAssigned => "order_assigned",
            EventType::OrderCompleted => "order_completed",
            EventType::OrderFailed => "order_failed",
            EventType::InventoryUpdated => "inventory_updated",
            EventType::DirectionChanged => "direction_changed",
            EventType::ItemCollected => "item_collected",
            EventType::SimulationCompleted => "simulation_completed",
            EventType::SystemError => "system_error",
            EventType::SystemWarning => "system_warning",
        }
    }

    /// Priority used by `emit` when the caller does not pick one explicitly.
    pub fn default_priority(self) -> Priority {
        use EventType::*;
        match self {
            SimulationStop | SystemError | PerformanceWarning => Priority::High,
            SimulationStart | SimulationPause | SimulationResume | ConfigLoaded
            | ConfigChanged | OrderAssigned | OrderCompleted | RobotStateChanged => {
                Priority::Medium
            }
            _ => Priority::Low,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Event {
    pub id: EventId,
    pub event_type: EventType,
    pub ts: SimTime,
    pub priority: Priority,
    pub source: String,
    pub payload: serde_json::Value,
    pub processed: bool,
}

pub type HandlerId = u64;

type Handler = Box<dyn FnMut(&Event)>;

/// Optional predicate used by [`EventBus::subscribe_filtered`] to further
/// restrict delivery beyond the event type.
pub struct Filter {
    pub source: Option<String>,
    pub priority: Option<Priority>,
    pub predicate: Option<Box<dyn Fn(&Event) -> bool>>,
}

impl Filter {
    pub fn new() -> Self {
        Filter {
            source: None,
            priority: None,
            predicate: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_predicate(mut self, predicate: impl Fn(&Event) -> bool + 'static) -> Self {
        self.predicate = Some(Box::new(predicate));
        self
    }

    fn matches(&self, event: &Event) -> bool {
        if let Some(source) = &self.source {
            if source != &event.source {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if priority != event.priority {
                return false;
            }
        }
        if let Some(predicate) = &self.predicate {
            if !predicate(event) {
                return false;
            }
        }
        true
    }
}

impl Default for Filter {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs before and after each drained event. `before_process` may drop the
/// event by returning `None`.
pub trait Middleware {
    fn name(&self) -> &str;
    fn before_process(&mut self, event: Event) -> Option<Event>;
    fn after_process(&mut self, event: &Event);
}

/// Bounded ring-buffer of recently processed events, for diagnostics.
pub struct RingBufferLogger {
    history: VecDeque<Event>,
    capacity: usize,
}

impl RingBufferLogger {
    pub fn new(capacity: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn history(&self) -> impl Iterator<Item = &Event> {
        self.history.iter()
    }
}

impl Middleware for RingBufferLogger {
    fn name(&self) -> &str {
        "ring_buffer_logger"
    }

    fn before_process(&mut self, event: Event) -> Option<Event> {
        if self.history.len() >= self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(event.clone());
        Some(event)
    }

    fn after_process(&mut self, _event: &Event) {}
}

/// Per-type predicates; a failing predicate drops the event silently
/// (a warning is counted, not printed, to keep the hot path allocation-free).
pub struct Validator {
    predicates: HashMap<EventType, Box<dyn Fn(&Event) -> bool>>,
    pub rejected: u64,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            predicates: HashMap::new(),
            rejected: 0,
        }
    }

    pub fn set_predicate(
        &mut self,
        event_type: EventType,
        predicate: impl Fn(&Event) -> bool + 'static,
    ) {
        self.predicates.insert(event_type, Box::new(predicate));
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for Validator {
    fn name(&self) -> &str {
        "validator"
    }

    fn before_process(&mut self, event: Event) -> Option<Event> {
        if let Some(pred) = self.predicates.get(&event.event_type) {
            if !pred(&event) {
                self.rejected += 1;
                return None;
            }
        }
        Some(event)
    }

    fn after_process(&mut self, _event: &Event) {}
}

/// Priority-ordered fan-out of typed events to handlers.
pub struct EventBus {
    queues: [VecDeque<Event>; 3],
    capacities: [usize; 3],
    handlers: HashMap<EventType, Vec<(HandlerId, Handler)>>,
    filtered_handlers: Vec<(HandlerId, EventType, Filter, Handler)>,
    middleware: Vec<(String, Box<dyn Middleware>)>,
    next_handler_id: HandlerId,
    pub failed_events: u64,
    pub dropped_events: u64,
}

impl EventBus {
    /// `max_capacity` is split 25% / 50% / 100% across HIGH / MEDIUM / LOW,
    /// so low-priority chatter (the bulk of traffic) gets the full budget
    /// while the rarer high-priority lane stays small and cheap to drain.
    pub fn new(max_capacity: usize) -> Self {
        Self {
            queues: [VecDeque::new(), VecDeque::new(), VecDeque::new()],
            capacities: [max_capacity / 4, max_capacity / 2, max_capacity],
            handlers: HashMap::new(),
            filtered_handlers: Vec::new(),
            middleware: Vec::new(),
            next_handler_id: 0,
            failed_events: 0,
            dropped_events: 0,
        }
    }

    pub fn subscribe(
        &mut self,
        event_type: EventType,
        handler: impl FnMut(&Event) + 'static,
    ) -> HandlerId {
        let id = self.next_handler_id;
        self.next_handler_id += 1;
        self.handlers
            .entry(event_type)
            .or_default()
            .push((id, Box::new(handler)));
        id
    }

    pub fn subscribe_filtered(
        &mut self,
        event_type: EventType,
        filter: Filter,
        handler: impl FnMut(&Event) + 'static,
    ) -> HandlerId {
        let id = self.next_handler_id;
        self.next_handler_id += 1;
        self.filtered_handlers
            .push((id, event_type, filter, Box::new(handler)));
        id
    }

    pub fn unsubscribe(&mut self, event_type: EventType, id: HandlerId) {
        if let Some(list) = self.handlers.get_mut(&event_type) {
            list.retain(|(hid, _)| *hid != id);
        }
        self.filtered_handlers.retain(|(hid, _, _, _)| *hid != id);
    }

    pub fn add_middleware(&mut self, middleware: Box<dyn Middleware>) {
        let name = middleware.name().to_string();
        self.middleware.push((name, middleware));
    }

    pub fn remove_middleware(&mut self, name: &str) {
        self.middleware.retain(|(n, _)| n != name);
    }

    pub fn middleware_mut(&mut self, name: &str) -> Option<&mut Box<dyn Middleware>> {
        self.middleware
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, m)| m)
    }

    /// Enqueue an event. Never blocks: if the target priority lane is at
    /// capacity, the event is dropped and `dropped_events`/`failed_events`
    /// are incremented.
    pub fn emit(
        &mut self,
        event_type: EventType,
        payload: serde_json::Value,
        source: impl Into<String>,
        ts: SimTime,
        priority: Option<Priority>,
    ) {
        let priority = priority.unwrap_or_else(|| event_type.default_priority());
        let lane = priority.lane();

        if self.queues[lane].len() >= self.capacities[lane] {
            self.dropped_events += 1;
            self.failed_events += 1;
            return;
        }

        let event = Event {
            id: IdMinter::event_id(event_type.wire_name(), ts),
            event_type,
            ts,
            priority,
            source: source.into(),
            payload,
            processed: false,
        };
        self.queues[lane].push_back(event);
    }

    pub fn has_events(&self) -> bool {
        self.queues.iter().any(|q| !q.is_empty())
    }

    pub fn pending_count(&self) -> usize {
        self.queues.iter().map(|q| q.len()).sum()
    }

    /// Drain at most `budget_n` events, HIGH lane first, then MEDIUM, then LOW.
    pub fn process(&mut self, budget_n: usize) {
        let mut remaining = budget_n;
        for lane in 0..3 {
            while remaining > 0 {
                let Some(event) = self.queues[lane].pop_front() else {
                    break;
                };
                self.dispatch_one(event);
                remaining -= 1;
            }
            if remaining == 0 {
                break;
            }
        }
    }

    fn dispatch_one(&mut self, mut event: Event) {
        for (_, mw) in self.middleware.iter_mut() {
            match mw.before_process(event) {
                Some(e) => event = e,
                None => return,
            }
        }

        event.processed = true;

        if let Some(list) = self.handlers.get_mut(&event.event_type) {
            for (_, handler) in list.iter_mut() {
                if panic::catch_unwind(AssertUnwindSafe(|| handler(&event))).is_err() {
                    self.failed_events += 1;
                }
            }
        }

        for (_, etype, filter, handler) in self.filtered_handlers.iter_mut() {
            if *etype == event.event_type && filter.matches(&event) {
                if panic::catch_unwind(AssertUnwindSafe(|| handler(&event))).is_err() {
                    self.failed_events += 1;
                }
            }
        }

        for (_, mw) in self.middleware.iter_mut() {
            mw.after_process(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn evt(payload: serde_json::Value) -> serde_json::Value {
        payload
    }

    #[test]
    fn test_priority_drain_order() {
        let mut bus = EventBus::new(1000);
        bus.emit(
            EventType::OrderCreated,
            evt(serde_json::json!({})),
            "test",
            SimTime::ZERO,
            Some(Priority::Low),
        );
        bus.emit(
            EventType::SystemError,
            evt(serde_json::json!({})),
            "test",
            SimTime::ZERO,
            Some(Priority::High),
        );
        bus.emit(
            EventType::OrderAssigned,
            evt(serde_json::json!({})),
            "test",
            SimTime::ZERO,
            Some(Priority::Medium),
        );

        let order: Rc<RefCell<Vec<EventType>>> = Rc::new(RefCell::new(Vec::new()));
        for t in [
            EventType::OrderCreated,
            EventType::SystemError,
            EventType::OrderAssigned,
        ] {
            let order = order.clone();
            bus.subscribe(t, move |e| order.borrow_mut().push(e.event_type));
        }

        bus.process(10);
        let observed = order.borrow().clone();
        assert_eq!(
            observed,
            vec![
                EventType::SystemError,
                EventType::OrderAssigned,
                EventType::OrderCreated
            ]
        );
    }

    #[test]
    fn test_overflow_drops_and_counts() {
        let mut bus = EventBus::new(4); // LOW lane capacity == 4
        for _ in 0..5 {
            bus.emit(
                EventType::Tick,
                serde_json::json!({}),
                "clock",
                SimTime::ZERO,
                Some(Priority::Low),
            );
        }
        assert_eq!(bus.pending_count(), 4);
        assert_eq!(bus.dropped_events, 1);
        assert_eq!(bus.failed_events, 1);
    }

    #[test]
    fn test_validator_drops_silently() {
        let mut bus = EventBus::new(100);
        let mut validator = Validator::new();
        validator.set_predicate(EventType::OrderCreated, |e| {
            e.payload.get("items").is_some()
        });
        bus.add_middleware(Box::new(validator));

        bus.emit(
            EventType::OrderCreated,
            serde_json::json!({}),
            "gen",
            SimTime::ZERO,
            None,
        );

        let seen = Rc::new(RefCell::new(0));
        let seen2 = seen.clone();
        bus.subscribe(EventType::OrderCreated, move |_| {
            *seen2.borrow_mut() += 1;
        });
        bus.process(10);
        assert_eq!(*seen.borrow(), 0);
    }

    #[test]
    fn test_handler_panic_is_isolated() {
        let mut bus = EventBus::new(100);
        bus.emit(
            EventType::Tick,
            serde_json::json!({}),
            "clock",
            SimTime::ZERO,
            None,
        );

        let survived = Rc::new(RefCell::new(false));
        let survived2 = survived.clone();
        bus.subscribe(EventType::Tick, |_| panic!("boom"));
        bus.subscribe(EventType::Tick, move |_| {
            *survived2.borrow_mut() = true;
        });

        bus.process(10);
        assert!(*survived.borrow());
        assert_eq!(bus.failed_events, 1);
    }

    #[test]
    fn test_ring_buffer_logger_bounds_history() {
        let mut bus = EventBus::new(100);
        bus.add_middleware(Box::new(RingBufferLogger::new(2)));
        for _ in 0..3 {
            bus.emit(
                EventType::Tick,
                serde_json::json!({}),
                "clock",
                SimTime::ZERO,
                None,
            );
        }
        bus.process(10);
        let logger = bus.middleware_mut("ring_buffer_logger").unwrap();
        // downcast isn't available without Any; just confirm no panic and
        // that processing drained everything.
        let _ = logger;
        assert_eq!(bus.pending_count(), 0);
    }
}
