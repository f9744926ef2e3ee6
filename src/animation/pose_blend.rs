//! Distance-driven blend between idle, walk and run clips.

use serde::{Deserialize, Serialize};

/// Weights for the three blended clips.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendWeights {
    /// First clip (standing).
    pub idle: f32,
    /// Second clip.
    pub walk: f32,
    /// Third clip.
    pub run: f32,
}

impl BlendWeights {
    /// All weight on the first clip.
    pub const IDLE: Self = Self { idle: 1.0, walk: 0.0, run: 0.0 };

    /// Weights in clip order.
    #[inline]
    pub fn to_array(self) -> [f32; 3] {
        [self.idle, self.walk, self.run]
    }

    /// Sum of all weights.
    #[inline]
    pub fn total(self) -> f32 {
        self.idle + self.walk + self.run
    }
}

impl Default for BlendWeights {
    fn default() -> Self {
        Self::IDLE
    }
}

/// Piecewise-linear blend and seek parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseBlend {
    /// Distance at which the actor is fully walking.
    pub near: f32,
    /// Distance beyond which the actor is fully running.
    pub far: f32,
    /// Distances at or below this count as arrived.
    pub epsilon: f32,
    /// Fraction of the remaining distance covered per frame.
    pub gain: f32,
    /// Largest step per frame.
    pub max_step: f32,
}

impl Default for PoseBlend {
    fn default() -> Self {
        Self {
            near: 1.0,
            far: 5.0,
            epsilon: 0.001,
            gain: 0.05,
            max_step: 0.5,
        }
    }
}

impl PoseBlend {
    /// Blend weights for a distance to the target.
    ///
    /// Beyond `far` only the run clip plays, between `near` and `far` walk
    /// fades into run, and below `near` idle fades into walk.
    pub fn weights(&self, distance: f32) -> BlendWeights {
        if !distance.is_finite() && distance != f32::INFINITY {
            return BlendWeights::IDLE;
        }
        if distance > self.far {
            BlendWeights { idle: 0.0, walk: 0.0, run: 1.0 }
        } else if distance > self.near {
            let w = (distance - self.near) / (self.far - self.near);
            BlendWeights { idle: 0.0, walk: 1.0 - w, run: w }
        } else {
            let w = if distance > self.epsilon { distance / self.near } else { 0.0 };
            BlendWeights { idle: 1.0 - w, walk: w, run: 0.0 }
        }
    }

    /// Distance to move toward the target this frame.
    pub fn step(&self, distance: f32) -> f32 {
        if !(distance > self.epsilon) {
            return 0.0;
        }
        (distance * self.gain).min(self.max_step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_stay_in_range() {
        let blend = PoseBlend::default();
        for i in 0..1000 {
            let d = i as f32 * 0.01;
            let w = blend.weights(d);
            for v in w.to_array() {
                assert!((0.0..=1.0).contains(&v), "d = {}", d);
            }
            assert!(w.total() <= 1.0 + 1e-6);
        }
    }

    #[test]
    fn test_weights_are_continuous_at_boundaries() {
        let blend = PoseBlend::default();
        for edge in [1.0f32, 5.0] {
            let below = blend.weights(edge - 1e-4).to_array();
            let at = blend.weights(edge).to_array();
            let above = blend.weights(edge + 1e-4).to_array();
            for k in 0..3 {
                assert!((below[k] - at[k]).abs() < 1e-3);
                assert!((above[k] - at[k]).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn test_weights_per_segment() {
        let blend = PoseBlend::default();
        assert_eq!(blend.weights(10.0).to_array(), [0.0, 0.0, 1.0]);
        let mid = blend.weights(3.0);
        assert!((mid.walk - 0.5).abs() < 1e-6 && (mid.run - 0.5).abs() < 1e-6);
        assert_eq!(blend.weights(0.0005), BlendWeights::IDLE);
        assert_eq!(blend.weights(f32::NAN), BlendWeights::IDLE);
    }

    #[test]
    fn test_step_is_capped_and_stops_near_target() {
        let blend = PoseBlend::default();
        assert!((blend.step(4.0) - 0.2).abs() < 1e-6);
        assert_eq!(blend.step(40.0), 0.5);
        assert_eq!(blend.step(0.0001), 0.0);
        assert_eq!(blend.step(f32::NAN), 0.0);
    }
}
