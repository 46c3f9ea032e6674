//! Per-system timings collected by the scheduler

use super::ring_buffer::RingBuffer;
use std::collections::HashMap;
use std::time::{Duration, Instant};

const WINDOW: usize = 120;

struct Timing {
    total: Duration,
    recent: RingBuffer<Duration>,
}

#[derive(Default)]
pub struct SystemProfiler {
    timings: HashMap<String, Timing>,
}

impl SystemProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, name: &str, elapsed: Duration) {
        let timing = self
            .timings
            .entry(name.to_string())
            .or_insert_with(|| Timing {
                total: Duration::ZERO,
                recent: RingBuffer::new(WINDOW),
            });
        timing.total += elapsed;
        timing.recent.push(elapsed);
    }

    pub fn time_system<F, R>(&mut self, name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        self.record(name, start.elapsed());
        result
    }

    /// Accumulated time since the last reset.
    pub fn total(&self, name: &str) -> Duration {
        self.timings
            .get(name)
            .map_or(Duration::ZERO, |timing| timing.total)
    }

    /// Rolling average over the most recent runs.
    pub fn average(&self, name: &str) -> Duration {
        self.timings
            .get(name)
            .map_or(Duration::ZERO, |timing| timing.recent.average())
    }

    pub fn reset(&mut self) {
        self.timings.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Duration)> {
        self.timings
            .iter()
            .map(|(name, timing)| (name.as_str(), timing.total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_totals_and_rolling_average() {
        let mut profiler = SystemProfiler::new();
        profiler.record("move", Duration::from_micros(10));
        profiler.record("move", Duration::from_micros(30));
        assert_eq!(profiler.total("move"), Duration::from_micros(40));
        assert_eq!(profiler.average("move"), Duration::from_micros(20));
        assert_eq!(profiler.total("other"), Duration::ZERO);
    }
}
