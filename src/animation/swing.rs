//! Fan blade spin and head swing.

use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_3;

/// Rotation deltas for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FanStep {
    /// Amount to add to the blade rotation about z.
    pub spin: f32,
    /// New swing angle about y.
    pub yaw: f32,
}

/// Running / swinging toggles of a desk fan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FanMotion {
    /// Blades turn while running.
    pub running: bool,
    /// Head sweeps left and right while running.
    pub swinging: bool,
    /// Blade rotation per frame.
    pub spin_step: f32,
    /// Swing rotation per frame.
    pub swing_step: f32,
    /// Largest swing angle either side.
    pub swing_limit: f32,
    #[serde(skip)]
    forward: bool,
}

impl Default for FanMotion {
    fn default() -> Self {
        Self {
            running: false,
            swinging: false,
            spin_step: 0.3,
            swing_step: 0.01,
            swing_limit: FRAC_PI_3,
            forward: true,
        }
    }
}

impl FanMotion {
    /// Flip the running switch.
    pub fn toggle_running(&mut self) -> bool {
        self.running = !self.running;
        self.running
    }

    /// Flip the swing switch.
    pub fn toggle_swinging(&mut self) -> bool {
        self.swinging = !self.swinging;
        self.swinging
    }

    /// Compute the next frame from the current swing angle.
    pub fn advance(&mut self, yaw: f32) -> FanStep {
        if !self.running {
            return FanStep { spin: 0.0, yaw };
        }
        let mut yaw = yaw;
        if self.swinging {
            if yaw > self.swing_limit {
                self.forward = false;
            } else if yaw < -self.swing_limit {
                self.forward = true;
            }
            yaw += if self.forward { self.swing_step } else { -self.swing_step };
        }
        FanStep { spin: self.spin_step, yaw }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stopped_fan_does_not_move() {
        let mut fan = FanMotion::default();
        assert_eq!(fan.advance(0.2), FanStep { spin: 0.0, yaw: 0.2 });
    }

    #[test]
    fn test_swing_reverses_past_limit() {
        let mut fan = FanMotion::default();
        fan.toggle_running();
        fan.toggle_swinging();
        let mut yaw = 0.0;
        let mut max = 0.0f32;
        let mut min = 0.0f32;
        for _ in 0..1000 {
            yaw = fan.advance(yaw).yaw;
            max = max.max(yaw);
            min = min.min(yaw);
        }
        assert!(max > FRAC_PI_3 && max < FRAC_PI_3 + 0.03);
        assert!(min < -FRAC_PI_3 && min > -FRAC_PI_3 - 0.03);
    }

    #[test]
    fn test_running_without_swing_only_spins() {
        let mut fan = FanMotion::default();
        fan.toggle_running();
        let step = fan.advance(0.4);
        assert_eq!(step.yaw, 0.4);
        assert!((step.spin - 0.3).abs() < 1e-6);
    }
}
