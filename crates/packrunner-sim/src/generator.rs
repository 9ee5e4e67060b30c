//! The Order Generator (§4.5): emits one order per `generation_interval`
//! while running.

use packrunner_core::{SimRng, SimTime};
use packrunner_entities::Item;

/// `start`/`stop`/`pause`/`resume` are idempotent setters; the only
/// observable effect of repeating one is none at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    Running,
    Paused,
    Stopped,
}

#[derive(Debug, Clone, Copy)]
pub struct OrderGeneratorConfig {
    pub generation_interval: f64,
    pub min_items: u32,
    pub max_items: u32,
}

impl Default for OrderGeneratorConfig {
    fn default() -> Self {
        Self {
            generation_interval: 30.0,
            min_items: 1,
            max_items: 4,
        }
    }
}

pub struct OrderGenerator {
    state: GeneratorState,
    last_emit_ts: SimTime,
    config: OrderGeneratorConfig,
}

impl OrderGenerator {
    pub fn new(config: OrderGeneratorConfig) -> Self {
        let max_items = config.max_items.min(10);
        Self {
            state: GeneratorState::Stopped,
            last_emit_ts: SimTime::ZERO,
            config: OrderGeneratorConfig { max_items, ..config },
        }
    }

    pub fn start(&mut self) {
        self.state = GeneratorState::Running;
    }

    pub fn stop(&mut self) {
        self.state = GeneratorState::Stopped;
    }

    pub fn pause(&mut self) {
        self.state = GeneratorState::Paused;
    }

    pub fn resume(&mut self) {
        if self.state == GeneratorState::Paused {
            self.state = GeneratorState::Running;
        }
    }

    pub fn state(&self) -> GeneratorState {
        self.state
    }

    /// Seeds `last_emit_ts` so the first order isn't emitted immediately on
    /// `start()` unless the interval has genuinely already elapsed.
    pub fn reset_clock(&mut self, now: SimTime) {
        self.last_emit_ts = now;
    }

    /// Draws a random item count in `[min_items, max_items]` and the items
    /// to match, without replacement, if generation is due.
    pub fn maybe_generate(
        &mut self,
        now: SimTime,
        pool: &packrunner_entities::ItemPool,
        rng: &mut SimRng,
    ) -> Option<Vec<Item>> {
        if self.state != GeneratorState::Running {
            return None;
        }
        if (now - self.last_emit_ts).as_seconds() < self.config.generation_interval {
            return None;
        }

        self.last_emit_ts = now;
        let count = if self.config.max_items <= self.config.min_items {
            self.config.min_items
        } else {
            rng.gen_range(self.config.min_items..=self.config.max_items)
        };
        Some(pool.draw(rng, count as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use packrunner_grid::GridDimensions;

    fn pool() -> packrunner_entities::ItemPool {
        packrunner_entities::ItemPool::for_grid(&GridDimensions::new(25, 20))
    }

    #[test]
    fn test_does_not_generate_while_stopped() {
        let mut gen = OrderGenerator::new(OrderGeneratorConfig::default());
        let mut rng = SimRng::new(1);
        assert!(gen.maybe_generate(SimTime::from_seconds(100.0), &pool(), &mut rng).is_none());
    }

    #[test]
    fn test_generates_after_interval_elapses() {
        let mut gen = OrderGenerator::new(OrderGeneratorConfig::default());
        gen.start();
        let mut rng = SimRng::new(1);
        assert!(gen.maybe_generate(SimTime::from_seconds(10.0), &pool(), &mut rng).is_none());
        let items = gen.maybe_generate(SimTime::from_seconds(31.0), &pool(), &mut rng);
        assert!(items.is_some());
        let items = items.unwrap();
        assert!(items.len() >= 1 && items.len() <= 4);
    }

    #[test]
    fn test_pause_stops_generation_idempotently() {
        let mut gen = OrderGenerator::new(OrderGeneratorConfig::default());
        gen.start();
        gen.pause();
        gen.pause();
        let mut rng = SimRng::new(1);
        assert!(gen.maybe_generate(SimTime::from_seconds(100.0), &pool(), &mut rng).is_none());
        gen.resume();
        assert_eq!(gen.state(), GeneratorState::Running);
    }

    #[test]
    fn test_max_items_clamped_at_ten() {
        let gen = OrderGenerator::new(OrderGeneratorConfig {
            generation_interval: 1.0,
            min_items: 1,
            max_items: 50,
        });
        assert_eq!(gen.config.max_items, 10);
    }
}
