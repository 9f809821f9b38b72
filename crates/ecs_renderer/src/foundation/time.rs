//! Frame timing

use std::time::Instant;

/// Frame clock driven by the host-supplied delta time.
///
/// The engine never samples wall time to advance a frame; the host loop
/// reports the delta and the clock accumulates it, so `u_Time` and every
/// system see the same value within one frame.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
}

impl FrameClock {
    /// Create a new clock at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by one frame
    pub fn advance(&mut self, delta_time: f32) {
        self.delta_time = delta_time.max(0.0);
        self.total_time += self.delta_time;
        self.frame_count += 1;
    }

    /// Time since the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Accumulated time in seconds
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Number of frames advanced
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Average frames per second over the accumulated time
    pub fn average_fps(&self) -> f32 {
        if self.total_time > 0.0 {
            self.frame_count as f32 / self.total_time
        } else {
            0.0
        }
    }
}

/// Wall-clock delta source for hosts that do not report their own
pub struct Stopwatch {
    last: Instant,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    /// Start measuring now
    pub fn new() -> Self {
        Self { last: Instant::now() }
    }

    /// Seconds elapsed since the previous lap (or construction)
    pub fn lap(&mut self) -> f32 {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last).as_secs_f32();
        self.last = now;
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_accumulates_deltas() {
        let mut clock = FrameClock::new();
        clock.advance(0.5);
        clock.advance(0.25);
        assert_eq!(clock.frame_count(), 2);
        assert!((clock.total_time() - 0.75).abs() < f32::EPSILON);
        assert!((clock.delta_time() - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn test_negative_delta_is_clamped() {
        let mut clock = FrameClock::new();
        clock.advance(-1.0);
        assert_eq!(clock.total_time(), 0.0);
    }
}
