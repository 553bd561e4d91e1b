//! Fixed timestep accumulator.
//!
//! Turns variable frame times into a whole number of fixed simulation
//! ticks so the gameplay timers see the same deltas at any frame rate.

/// Fixed timestep accumulator.
#[derive(Debug, Clone)]
pub struct FixedStep {
    /// Simulation delta per tick
    dt: f32,
    /// Unsimulated time carried between frames
    accumulator: f32,
    /// Maximum frame delta accepted (prevents spiral of death)
    max_frame: f32,
    /// Maximum ticks run for one frame
    max_ticks: u32,
}

impl FixedStep {
    /// Creates an accumulator ticking `rate` times per second.
    #[must_use]
    pub fn new(rate: u32) -> Self {
        Self {
            dt: 1.0 / rate.max(1) as f32,
            accumulator: 0.0,
            max_frame: 0.25,
            max_ticks: 10,
        }
    }

    /// Simulation delta per tick.
    #[must_use]
    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Adds a frame's elapsed time and returns how many ticks to run.
    pub fn accumulate(&mut self, frame: f32) -> u32 {
        self.accumulator += frame.clamp(0.0, self.max_frame);
        let mut count = 0;

        while self.accumulator >= self.dt && count < self.max_ticks {
            self.accumulator -= self.dt;
            count += 1;
        }

        // Still behind: drop the backlog
        if self.accumulator > self.dt * 2.0 {
            self.accumulator = 0.0;
        }

        count
    }

    /// Fraction of a tick left over, for interpolation.
    #[must_use]
    pub fn alpha(&self) -> f32 {
        self.accumulator / self.dt
    }
}

impl Default for FixedStep {
    fn default() -> Self {
        Self::new(60)
    }
}
