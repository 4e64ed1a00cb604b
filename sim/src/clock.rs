//! Fixed-timestep accumulator.
//!
//! Frame deltas are clamped to `max_frame_dt` so a stall cannot trigger a catch-up spiral, and
//! at most `max_steps_per_frame` ticks run per frame. Leftover backlog beyond that is dropped.

use crate::config::TickConfig;

#[derive(Clone, Debug)]
pub struct FixedStepClock {
    step: f32,
    max_frame_dt: f32,
    max_steps: u32,
    accumulator: f32,
}

impl Default for FixedStepClock {
    fn default() -> Self {
        Self::new(&TickConfig::default())
    }
}

impl FixedStepClock {
    pub fn new(config: &TickConfig) -> Self {
        Self {
            step: config.step(),
            max_frame_dt: config.max_frame_dt,
            max_steps: config.max_steps_per_frame,
            accumulator: 0.0,
        }
    }

    /// Fixed tick length (seconds).
    pub fn step(&self) -> f32 {
        self.step
    }

    /// Feed one frame delta; returns how many fixed ticks to run now.
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        let dt = if frame_dt.is_finite() {
            frame_dt.clamp(0.0, self.max_frame_dt)
        } else {
            0.0
        };
        self.accumulator += dt;

        let mut steps = 0;
        while self.accumulator >= self.step && steps < self.max_steps {
            self.accumulator -= self.step;
            steps += 1;
        }
        if steps == self.max_steps {
            self.accumulator = self.accumulator.min(self.step);
        }
        steps
    }

    /// Fraction of a tick left in the accumulator, for presentation interpolation.
    pub fn alpha(&self) -> f32 {
        (self.accumulator / self.step).clamp(0.0, 1.0)
    }
}
