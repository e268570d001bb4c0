//! Time management utilities

use std::time::Instant;

/// High-precision timer for frame timing
pub struct Timer {
    last_frame: Instant,
    delta_time: f64,
    total_time: f64,
    frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Update the timer (should be called once per frame)
    pub fn update(&mut self) {
        let now = Instant::now();
        self.delta_time = now.duration_since(self.last_frame).as_secs_f64();
        self.total_time += self.delta_time;
        self.last_frame = now;
        self.frame_count += 1;
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f64 {
        self.delta_time
    }

    /// Get the total elapsed time since timer creation
    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// Fixed-step accumulator driving `fixed_update`
///
/// Variable frame deltas are accumulated and drained in whole fixed steps.
/// At most `max_steps` are produced per frame; any backlog beyond that is
/// dropped so a long stall cannot trigger a spiral of catch-up work.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    step: f64,
    max_steps: u32,
    accumulator: f64,
}

impl FixedTimestep {
    /// Create an accumulator with the given step length in seconds
    pub fn new(step: f64, max_steps: u32) -> Self {
        Self {
            step,
            max_steps,
            accumulator: 0.0,
        }
    }

    /// Fixed step length in seconds
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Add a frame delta and return how many fixed steps are due
    pub fn advance(&mut self, delta: f64) -> u32 {
        if self.step <= 0.0 {
            return 0;
        }

        self.accumulator += delta.max(0.0);
        let mut steps = 0;
        while self.accumulator >= self.step && steps < self.max_steps {
            self.accumulator -= self.step;
            steps += 1;
        }

        if steps == self.max_steps && self.accumulator >= self.step {
            log::warn!(
                "Fixed timestep fell behind; dropping {:.4}s of simulation time",
                self.accumulator
            );
            self.accumulator %= self.step;
        }

        steps
    }

    /// Fraction of a step currently accumulated, in `[0, 1)`
    pub fn alpha(&self) -> f64 {
        if self.step > 0.0 {
            self.accumulator / self.step
        } else {
            0.0
        }
    }
}
