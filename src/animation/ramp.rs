//! Time-boxed linear 0..1 ramp that flips direction after each run.

/// Click-triggered progress value.
///
/// A trigger while a ramp is running is ignored, so the direction flips
/// exactly once per completed ramp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressRamp {
    duration: f64,
    start: Option<f64>,
    reversed: bool,
    value: f32,
}

impl ProgressRamp {
    /// Ramp lasting `duration` seconds, starting at 0 going up.
    pub fn new(duration: f64) -> Self {
        Self {
            duration: duration.max(f64::EPSILON),
            start: None,
            reversed: false,
            value: 0.0,
        }
    }

    /// Start a ramp at `now` seconds. Returns false while one is running.
    pub fn trigger(&mut self, now: f64) -> bool {
        if self.start.is_some() {
            return false;
        }
        self.start = Some(now);
        true
    }

    /// Whether a ramp is in flight.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.start.is_some()
    }

    /// Whether the next (or current) ramp goes from 1 to 0.
    #[inline]
    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    /// Last computed value.
    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Advance to `now` seconds and return the current value.
    pub fn update(&mut self, now: f64) -> f32 {
        let Some(start) = self.start else {
            return self.value;
        };
        let p = ((now - start) / self.duration).max(0.0);
        if p >= 1.0 {
            self.value = if self.reversed { 0.0 } else { 1.0 };
            self.start = None;
            self.reversed = !self.reversed;
        } else {
            let p = p as f32;
            self.value = if self.reversed { 1.0 - p } else { p };
        }
        self.value
    }
}

impl Default for ProgressRamp {
    fn default() -> Self {
        Self::new(0.6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramp_runs_up_then_down() {
        let mut ramp = ProgressRamp::default();
        assert!(ramp.trigger(1.0));
        assert!((ramp.update(1.3) - 0.5).abs() < 1e-5);
        assert_eq!(ramp.update(2.0), 1.0);
        assert!(!ramp.is_running());

        assert!(ramp.trigger(3.0));
        assert!((ramp.update(3.15) - 0.75).abs() < 1e-5);
        assert_eq!(ramp.update(4.0), 0.0);
    }

    #[test]
    fn test_double_trigger_reverses_once() {
        let mut ramp = ProgressRamp::default();
        assert!(ramp.trigger(0.0));
        assert!(!ramp.trigger(0.05));
        ramp.update(0.1);
        assert!(!ramp.trigger(0.2));
        ramp.update(0.7);
        assert!(ramp.is_reversed());
        assert_eq!(ramp.value(), 1.0);
    }

    #[test]
    fn test_idle_ramp_keeps_value() {
        let mut ramp = ProgressRamp::default();
        assert_eq!(ramp.update(100.0), 0.0);
    }
}
