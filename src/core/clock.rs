//! Frame clock driven by host timestamps.

/// Time values for one frame, in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameTime {
    /// Time since the first tick.
    pub elapsed: f64,
    /// Time since the previous tick.
    pub delta: f64,
}

impl FrameTime {
    /// Elapsed time as `f32`.
    #[inline]
    pub fn elapsed_f32(&self) -> f32 {
        self.elapsed as f32
    }

    /// Delta time as `f32`.
    #[inline]
    pub fn delta_f32(&self) -> f32 {
        self.delta as f32
    }
}

/// A clock for measuring elapsed time and delta time.
///
/// The clock does not read a time source itself: the host passes its frame
/// timestamp (for example `requestAnimationFrame`'s argument) to
/// [`Clock::tick`]. Elapsed time starts at zero on the first tick and never
/// decreases; NaN and backwards timestamps produce a zero delta.
#[derive(Debug, Clone, Default)]
pub struct Clock {
    /// Host time of the first tick.
    start_time: Option<f64>,
    /// Host time of the last accepted tick.
    old_time: f64,
    /// Total elapsed time.
    elapsed_time: f64,
    /// Delta of the last tick.
    delta: f64,
}

impl Clock {
    /// Create a new clock (not started).
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the clock has seen its first tick.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.start_time.is_some()
    }

    /// Advance to the host timestamp `now` (seconds).
    pub fn tick(&mut self, now: f64) -> FrameTime {
        let Some(_) = self.start_time else {
            if now.is_finite() {
                self.start_time = Some(now);
                self.old_time = now;
            }
            self.delta = 0.0;
            return self.frame_time();
        };

        let diff = now - self.old_time;
        if diff.is_finite() && diff > 0.0 {
            self.old_time = now;
            self.elapsed_time += diff;
            self.delta = diff;
        } else {
            self.delta = 0.0;
        }
        self.frame_time()
    }

    /// Advance by a delta instead of an absolute timestamp.
    pub fn advance(&mut self, delta: f64) -> FrameTime {
        if self.start_time.is_none() {
            self.start_time = Some(0.0);
            self.old_time = 0.0;
        }
        let now = self.old_time + if delta.is_finite() { delta.max(0.0) } else { 0.0 };
        self.tick(now)
    }

    /// Time of the last tick.
    #[inline]
    pub fn frame_time(&self) -> FrameTime {
        FrameTime {
            elapsed: self.elapsed_time,
            delta: self.delta,
        }
    }

    /// Get the elapsed time since the first tick (in seconds).
    #[inline]
    pub fn elapsed_time(&self) -> f64 {
        self.elapsed_time
    }

    /// Reset the clock; the next tick starts again at zero.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Host time in seconds, from `performance.now()` on the web.
#[cfg(feature = "web")]
pub fn now_seconds() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now() / 1000.0)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_starts_stopped() {
        let clock = Clock::new();
        assert!(!clock.is_running());
    }

    #[test]
    fn test_first_tick_is_zero() {
        let mut clock = Clock::new();
        let t = clock.tick(1234.5);
        assert!(clock.is_running());
        assert_eq!(t.elapsed, 0.0);
        assert_eq!(t.delta, 0.0);
        let t = clock.tick(1235.0);
        assert!((t.elapsed - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_backwards_and_nan_are_clamped() {
        let mut clock = Clock::new();
        clock.tick(10.0);
        clock.tick(11.0);
        let t = clock.tick(9.0);
        assert_eq!(t.delta, 0.0);
        assert!((t.elapsed - 1.0).abs() < 1e-9);
        let t = clock.tick(f64::NAN);
        assert_eq!(t.delta, 0.0);
        assert!((t.elapsed - 1.0).abs() < 1e-9);
        let t = clock.tick(11.5);
        assert!((t.elapsed - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_nan_first_tick_does_not_start() {
        let mut clock = Clock::new();
        clock.tick(f64::NAN);
        assert!(!clock.is_running());
        assert_eq!(clock.elapsed_time(), 0.0);
    }

    #[test]
    fn test_advance_by_delta() {
        let mut clock = Clock::new();
        clock.advance(0.016);
        clock.advance(-1.0);
        let t = clock.advance(0.5);
        assert!((t.elapsed - 0.516).abs() < 1e-9);
    }
}
