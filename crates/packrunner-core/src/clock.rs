//! Clock & Frame Controller: paces ticks to a target rate and produces
//! monotonically increasing simulation time.

use std::time::Instant;

use crate::time::SimTime;

const MIN_SPEED: f64 = 0.1;
const MAX_SPEED: f64 = 10.0;

/// Result of a [`Clock::set_speed`] call: the clamped value, and whether
/// clamping actually happened (so the caller can emit a warning).
pub struct SpeedSet {
    pub speed: f64,
    pub clamped: bool,
}

pub struct Clock {
    target_fps: u32,
    max_delta_time: f64,
    speed: f64,
    paused: bool,
    frame_count: u64,
    sim_time: SimTime,
    last_tick: Option<Instant>,
}

impl Clock {
    pub fn new(target_fps: u32, max_delta_time: f64) -> Self {
        Self {
            target_fps: target_fps.max(1),
            max_delta_time,
            speed: 1.0,
            paused: false,
            frame_count: 0,
            sim_time: SimTime::ZERO,
            last_tick: None,
        }
    }

    fn base_tick_interval(&self) -> f64 {
        1.0 / self.target_fps as f64
    }

    /// Advance the clock by the wall-time elapsed since the previous call
    /// (clamped, speed-scaled), and return that delta.
    ///
    /// The very first call returns exactly `1/target_fps` rather than an
    /// elapsed duration, since there is no previous call to measure from.
    pub fn update(&mut self) -> SimTime {
        if self.paused {
            self.last_tick = Some(Instant::now());
            return SimTime::ZERO;
        }

        let now = Instant::now();
        let delta = match self.last_tick {
            None => self.base_tick_interval(),
            Some(prev) => now.duration_since(prev).as_secs_f64().min(self.max_delta_time),
        };
        self.last_tick = Some(now);

        let scaled = delta * self.speed;
        self.sim_time += SimTime::from_seconds(scaled);
        self.frame_count += 1;
        SimTime::from_seconds(scaled)
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
        self.last_tick = Some(Instant::now());
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Scale effective simulation time by `x`, clamped to `[0.1, 10.0]`.
    pub fn set_speed(&mut self, x: f64) -> SpeedSet {
        let clamped_value = x.clamp(MIN_SPEED, MAX_SPEED);
        let was_clamped = (clamped_value - x).abs() > f64::EPSILON;
        self.speed = clamped_value;
        SpeedSet {
            speed: clamped_value,
            clamped: was_clamped,
        }
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn now(&self) -> SimTime {
        self.sim_time
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn target_fps(&self) -> u32 {
        self.target_fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_update_returns_base_interval() {
        let mut clock = Clock::new(60, 0.1);
        let dt = clock.update();
        assert!((dt.as_seconds() - 1.0 / 60.0).abs() < 1e-9);
        assert_eq!(clock.frame_count(), 1);
    }

    #[test]
    fn paused_update_returns_zero_and_freezes_frame_count() {
        let mut clock = Clock::new(60, 0.1);
        clock.update();
        clock.pause();
        let dt = clock.update();
        assert_eq!(dt.as_seconds(), 0.0);
        assert_eq!(clock.frame_count(), 1);
    }

    #[test]
    fn speed_clamps_out_of_range_values() {
        let mut clock = Clock::new(60, 0.1);
        let result = clock.set_speed(20.0);
        assert_eq!(result.speed, 10.0);
        assert!(result.clamped);

        let result = clock.set_speed(0.01);
        assert_eq!(result.speed, 0.1);
        assert!(result.clamped);

        let result = clock.set_speed(2.0);
        assert_eq!(result.speed, 2.0);
        assert!(!result.clamped);
    }

    #[test]
    fn time_is_non_decreasing() {
        let mut clock = Clock::new(60, 0.1);
        let mut last = clock.now();
        for _ in 0..5 {
            clock.update();
            let now = clock.now();
            assert!(now.as_seconds() >= last.as_seconds());
            last = now;
        }
    }
}
