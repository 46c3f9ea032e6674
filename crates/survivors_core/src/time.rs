//! Simulation clock
//!
//! Fixed 60Hz tick rate by default. Systems never read wall-clock time; they
//! receive a [`TickTime`] snapshot taken at the start of the tick.

/// Default simulation tick rate (60 Hz = 16.666ms per tick)
pub const TICK_RATE_HZ: u32 = 60;

/// Time view handed to systems for a single tick.
///
/// `elapsed` is the simulation time at which this tick happens (the first
/// tick runs at `0.0`); `delta` is the step that will be added once the
/// tick completes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickTime {
    pub tick: u64,
    pub elapsed: f64,
    pub delta: f32,
}

impl TickTime {
    pub fn new(tick: u64, elapsed: f64, delta: f32) -> Self {
        Self {
            tick,
            elapsed,
            delta,
        }
    }
}

/// Simulation time tracker
pub struct SimulationTime {
    tick_count: u64,
    elapsed: f64,
}

impl SimulationTime {
    pub fn new() -> Self {
        Self {
            tick_count: 0,
            elapsed: 0.0,
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed
    }

    /// Snapshot for the tick about to run with step `delta`.
    pub fn current(&self, delta: f32) -> TickTime {
        TickTime::new(self.tick_count, self.elapsed, delta)
    }

    pub fn advance_tick(&mut self, delta: f32) {
        self.tick_count += 1;
        self.elapsed += f64::from(delta);
    }
}

impl Default for SimulationTime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_runs_at_zero() {
        let time = SimulationTime::new();
        let now = time.current(0.5);
        assert_eq!(now.tick, 0);
        assert_eq!(now.elapsed, 0.0);
        assert_eq!(now.delta, 0.5);
    }

    #[test]
    fn advancing_accumulates_elapsed_time() {
        let mut time = SimulationTime::new();
        time.advance_tick(0.5);
        time.advance_tick(0.25);
        assert_eq!(time.tick_count(), 2);
        assert!((time.elapsed_secs() - 0.75).abs() < 1e-9);
    }
}
