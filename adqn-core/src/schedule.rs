//! Linear schedules of the exploration rate and the importance sampling exponent.
use serde::{Deserialize, Serialize};

/// Linear interpolation from `start` to `end` over `duration` steps, clamped at `end`.
///
/// The clamp follows the direction of the schedule: a decreasing schedule never goes
/// below `end` and an increasing one never goes above it. Steps at or after
/// `duration` return exactly `end`.
///
/// ```rust
/// use adqn_core::schedule::linear_schedule;
///
/// assert_eq!(linear_schedule(1.0, 0.02, 100.0, 0), 1.0);
/// assert_eq!(linear_schedule(1.0, 0.02, 100.0, 200), 0.02);
/// ```
pub fn linear_schedule(start: f64, end: f64, duration: f64, t: u64) -> f64 {
    let t = t as f64;
    if !(duration > 0.0) || t >= duration {
        return end;
    }
    let slope = (end - start) / duration;
    let v = slope * t + start;
    if end < start {
        v.max(end)
    } else {
        v.min(end)
    }
}

/// [`linear_schedule`] with fixed parameters.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct LinearSchedule {
    /// Value at step 0.
    pub start: f64,

    /// Value at and after `duration`.
    pub end: f64,

    /// The number of steps from `start` to `end`.
    pub duration: f64,
}

impl LinearSchedule {
    /// Creates a schedule.
    pub fn new(start: f64, end: f64, duration: f64) -> Self {
        Self {
            start,
            end,
            duration,
        }
    }

    /// Value at step `t`.
    pub fn value(&self, t: u64) -> f64 {
        linear_schedule(self.start, self.end, self.duration, t)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_decreasing_schedule() {
        assert_eq!(linear_schedule(1.0, 0.02, 100.0, 0), 1.0);
        assert_eq!(linear_schedule(1.0, 0.02, 100.0, 100), 0.02);
        assert_eq!(linear_schedule(1.0, 0.02, 100.0, 200), 0.02);
        assert!((linear_schedule(1.0, 0.02, 100.0, 50) - 0.51).abs() < 1e-12);
    }

    #[test]
    fn test_increasing_schedule() {
        let beta = LinearSchedule::new(0.4, 1.0, 1000.0);
        assert_eq!(beta.value(0), 0.4);
        assert!((beta.value(500) - 0.7).abs() < 1e-12);
        assert_eq!(beta.value(1000), 1.0);
        assert_eq!(beta.value(5000), 1.0);
    }

    #[test]
    fn test_zero_duration() {
        assert_eq!(linear_schedule(1.0, 0.02, 0.0, 0), 0.02);
    }
}
