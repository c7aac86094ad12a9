//! Tick scheduler - splits one real-time delta into fast and slow ticks
//!
//! The fast tick carries `real_delta × speed` and fires on every call. The
//! slow tick accumulates unscaled real time and fires once for every interval
//! boundary crossed. Pausing suspends both.

use crate::core::config::SchedulerConfig;

/// What the caller should run for one scheduler invocation
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickPlan {
    /// Scaled game-time delta, None while paused
    pub fast_delta: Option<f64>,
    pub slow_ticks: u32,
}

impl TickPlan {
    pub fn is_idle(&self) -> bool {
        self.fast_delta.is_none() && self.slow_ticks == 0
    }
}

#[derive(Debug, Clone)]
pub struct TickScheduler {
    config: SchedulerConfig,
    speed: f64,
    paused: bool,
    slow_accumulator: f64,
}

impl TickScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            speed: 1.0,
            paused: false,
            slow_accumulator: 0.0,
        }
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Clamp into the configured speed range. Non-finite input is ignored.
    pub fn set_speed(&mut self, speed: f64) -> f64 {
        if !speed.is_finite() {
            tracing::warn!(speed, "rejected non-finite speed");
            return self.speed;
        }
        self.speed = speed.clamp(self.config.min_speed, self.config.max_speed);
        self.speed
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    pub fn advance(&mut self, real_delta: f64) -> TickPlan {
        if self.paused {
            return TickPlan::default();
        }

        let real_delta = if real_delta.is_finite() && real_delta >= 0.0 {
            real_delta
        } else {
            tracing::warn!(real_delta, "rejected scheduler delta, treating as 0");
            0.0
        };

        let interval = self.config.slow_tick_interval;
        self.slow_accumulator += real_delta;
        let mut slow_ticks = 0;
        if interval > 0.0 {
            while self.slow_accumulator >= interval {
                self.slow_accumulator -= interval;
                slow_ticks += 1;
            }
        }

        TickPlan {
            fast_delta: Some(real_delta * self.speed),
            slow_ticks,
        }
    }
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fast_tick_is_scaled_by_speed() {
        let mut s = TickScheduler::default();
        s.set_speed(4.0);
        let plan = s.advance(0.25);
        assert_eq!(plan.fast_delta, Some(1.0));
    }

    #[test]
    fn test_speed_has_a_floor() {
        let mut s = TickScheduler::default();
        assert_eq!(s.set_speed(0.0), 0.1);
        assert_eq!(s.set_speed(-3.0), 0.1);
        assert_eq!(s.set_speed(f64::NAN), 0.1);
    }

    #[test]
    fn test_slow_tick_fires_once_per_boundary() {
        let mut s = TickScheduler::default();
        let mut slow = 0;
        for _ in 0..25 {
            slow += s.advance(0.1).slow_ticks;
        }
        assert_eq!(slow, 2);

        // One large step crosses several boundaries
        assert_eq!(s.advance(3.0).slow_ticks, 3);
    }

    #[test]
    fn test_slow_tick_uses_unscaled_time() {
        let mut s = TickScheduler::default();
        s.set_speed(16.0);
        assert_eq!(s.advance(0.5).slow_ticks, 0);
        assert_eq!(s.advance(0.5).slow_ticks, 1);
    }

    #[test]
    fn test_pause_stops_everything() {
        let mut s = TickScheduler::default();
        s.advance(0.9);
        s.pause();
        let plan = s.advance(5.0);
        assert!(plan.is_idle());

        s.resume();
        // Paused time was not accumulated
        assert_eq!(s.advance(0.2).slow_ticks, 1);
        assert_eq!(s.advance(0.2).slow_ticks, 0);
    }

    #[test]
    fn test_negative_delta_is_zero() {
        let mut s = TickScheduler::default();
        let plan = s.advance(-1.0);
        assert_eq!(plan.fast_delta, Some(0.0));
        assert_eq!(plan.slow_ticks, 0);
    }
}
