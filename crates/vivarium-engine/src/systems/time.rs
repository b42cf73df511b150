//! Day/night cycle.
//!
//! Time of day is a pure function of the frame counter — the system holds
//! only the cycle length and a day counter for debug output, never an
//! accumulated float. That keeps interleaved multi-engine runs and
//! snapshot/restore trivially consistent.

use serde_json::json;

// ---------------------------------------------------------------------------
// TimeSystem
// ---------------------------------------------------------------------------

/// Tracks the simulation's day/night cycle and derives activity modifiers.
///
/// The engine owns this directly and advances it in the `time_update` step;
/// it is not registered with the system registry.
#[derive(Debug, Clone)]
pub struct TimeSystem {
    cycle_frames: u32,
    /// Activity floor at deep night. Daytime peaks at 1.0.
    night_floor: f64,
    days_elapsed: u64,
}

impl TimeSystem {
    pub fn new(cycle_frames: u32) -> Self {
        Self {
            cycle_frames: cycle_frames.max(1),
            night_floor: 0.45,
            days_elapsed: 0,
        }
    }

    /// Advance to `frame`, tracking elapsed days.
    pub fn advance(&mut self, frame: u64) {
        self.days_elapsed = frame / u64::from(self.cycle_frames);
    }

    /// Normalized time of day in `[0, 1)`: 0 = midnight, 0.25 = dawn,
    /// 0.5 = noon, 0.75 = dusk.
    pub fn time_of_day(&self, frame: u64) -> f64 {
        (frame % u64::from(self.cycle_frames)) as f64 / f64::from(self.cycle_frames)
    }

    /// Activity modifier: 1.0 at noon, `night_floor` at midnight, smooth
    /// cosine ramp between.
    pub fn activity_modifier(&self, frame: u64) -> f64 {
        let tod = self.time_of_day(frame);
        let daylight = 0.5 - 0.5 * (std::f64::consts::TAU * tod).cos();
        self.night_floor + (1.0 - self.night_floor) * daylight
    }

    /// Whether it is daytime (between dawn and dusk).
    pub fn is_day(&self, frame: u64) -> bool {
        let tod = self.time_of_day(frame);
        (0.25..0.75).contains(&tod)
    }

    pub fn days_elapsed(&self) -> u64 {
        self.days_elapsed
    }

    pub fn cycle_frames(&self) -> u32 {
        self.cycle_frames
    }

    pub fn debug_info(&self, frame: u64) -> serde_json::Value {
        json!({
            "time_of_day": self.time_of_day(frame),
            "is_day": self.is_day(frame),
            "days_elapsed": self.days_elapsed,
            "cycle_frames": self.cycle_frames,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_of_day_wraps_with_cycle() {
        let time = TimeSystem::new(100);
        assert_eq!(time.time_of_day(0), 0.0);
        assert_eq!(time.time_of_day(50), 0.5);
        assert_eq!(time.time_of_day(100), 0.0);
        assert_eq!(time.time_of_day(150), 0.5);
    }

    #[test]
    fn activity_peaks_at_noon_and_bottoms_at_midnight() {
        let time = TimeSystem::new(100);
        let noon = time.activity_modifier(50);
        let midnight = time.activity_modifier(0);
        assert!((noon - 1.0).abs() < 1e-12);
        assert!((midnight - 0.45).abs() < 1e-12);
        assert!(time.activity_modifier(25) > midnight);
        assert!(time.activity_modifier(25) < noon);
    }

    #[test]
    fn day_window_is_dawn_to_dusk() {
        let time = TimeSystem::new(100);
        assert!(!time.is_day(0)); // midnight
        assert!(time.is_day(25)); // dawn
        assert!(time.is_day(50)); // noon
        assert!(!time.is_day(75)); // dusk
    }

    #[test]
    fn days_elapsed_counts_full_cycles() {
        let mut time = TimeSystem::new(100);
        time.advance(99);
        assert_eq!(time.days_elapsed(), 0);
        time.advance(250);
        assert_eq!(time.days_elapsed(), 2);
    }

    #[test]
    fn derivation_is_pure_in_frame() {
        // Two instances at different advance states agree on derived values.
        let mut a = TimeSystem::new(360);
        let b = TimeSystem::new(360);
        a.advance(1000);
        assert_eq!(a.time_of_day(123), b.time_of_day(123));
        assert_eq!(a.activity_modifier(123), b.activity_modifier(123));
    }
}
