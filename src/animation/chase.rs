//! Followers trailing a point that travels a closed curve on a sphere.
//!
//! Positions are a pure function of time. Orientation is not: each frame
//! the rotation from the previous heading to the new one is premultiplied
//! into the accumulated quaternion, so small numerical drift builds up and
//! is accepted.

use crate::math::rotation_between;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Closed parametric curve, normalized onto the unit sphere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChaseCurve {
    /// `(cos t, sin t, sin 2t)`
    #[default]
    CosSinSin2,
    /// `(sin 2t, cos t, sin t)`
    Sin2CosSin,
    /// `(sin t, sin 2t, cos t)`
    SinSin2Cos,
}

impl ChaseCurve {
    /// Unit vector on the curve at parameter `t`.
    pub fn point(&self, t: f32) -> Vec3 {
        let (s, c, s2) = (t.sin(), t.cos(), (2.0 * t).sin());
        let v = match self {
            ChaseCurve::CosSinSin2 => Vec3::new(c, s, s2),
            ChaseCurve::Sin2CosSin => Vec3::new(s2, c, s),
            ChaseCurve::SinSin2Cos => Vec3::new(s, s2, c),
        };
        // sin and cos never vanish together, so the length is at least 1.
        v.normalize()
    }
}

/// One trailing entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Follower {
    /// Current position.
    pub position: Vec3,
    /// Heading used last frame.
    pub direction: Vec3,
    /// Accumulated orientation.
    pub orientation: Quat,
}

/// A lead point and its chain of followers.
#[derive(Debug, Clone, PartialEq)]
pub struct ChaseSwarm {
    /// Curve the swarm travels.
    pub curve: ChaseCurve,
    /// Radius of the sphere carrying the lead light.
    pub radius: f32,
    /// Extra height of the lead target and followers above `radius`.
    pub altitude: f32,
    /// Curve-parameter gap between consecutive followers.
    pub spacing: f32,
    followers: Vec<Follower>,
    lead: Vec3,
}

impl ChaseSwarm {
    /// Create `count` followers, all initially heading along `initial_direction`.
    pub fn new(curve: ChaseCurve, count: usize, radius: f32, altitude: f32, spacing: f32, initial_direction: Vec3) -> Self {
        let direction = initial_direction.try_normalize().unwrap_or(Vec3::Y);
        Self {
            curve,
            radius,
            altitude,
            spacing,
            followers: vec![
                Follower {
                    position: Vec3::ZERO,
                    direction,
                    orientation: Quat::IDENTITY,
                };
                count
            ],
            lead: Vec3::ZERO,
        }
    }

    /// Followers in chain order.
    #[inline]
    pub fn followers(&self) -> &[Follower] {
        &self.followers
    }

    /// Lead target position from the last update.
    #[inline]
    pub fn lead(&self) -> Vec3 {
        self.lead
    }

    /// Position of the lead light at time `t`.
    pub fn light_position(&self, t: f32) -> Vec3 {
        self.curve.point(t) * self.radius
    }

    /// Position of the lead target at time `t`.
    pub fn target_position(&self, t: f32) -> Vec3 {
        self.curve.point(t) * (self.radius + self.altitude)
    }

    /// Position of follower `index` at time `t`.
    pub fn follower_position(&self, index: usize, t: f32) -> Vec3 {
        let lag = self.spacing * (index as f32 + 1.0);
        self.curve.point(t - lag) * (self.radius + self.altitude)
    }

    /// Advance every follower to time `t`.
    ///
    /// Follower 0 heads for the lead target, follower `i` for follower
    /// `i - 1` at its new position.
    pub fn update(&mut self, t: f32) {
        self.lead = self.target_position(t);
        let mut ahead = self.lead;

        for index in 0..self.followers.len() {
            let position = self.follower_position(index, t);
            let follower = &mut self.followers[index];
            let previous = follower.direction;
            let direction = (ahead - position).try_normalize().unwrap_or(previous);

            // Renormalizing rescales the product back to unit length and leaves
            // the rotation it encodes unchanged.
            follower.orientation = (rotation_between(previous, direction) * follower.orientation).normalize();
            follower.direction = direction;
            follower.position = position;
            ahead = position;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn swarm() -> ChaseSwarm {
        ChaseSwarm::new(ChaseCurve::CosSinSin2, 33, 3.01, 0.5, 0.1, Vec3::Y)
    }

    #[test]
    fn test_followers_stay_on_sphere() {
        let mut swarm = swarm();
        for frame in 0..200 {
            let t = frame as f32 * 0.016;
            swarm.update(t);
            for f in swarm.followers() {
                assert!((f.position.length() - 3.51).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_every_curve_is_normalized() {
        for curve in [ChaseCurve::CosSinSin2, ChaseCurve::Sin2CosSin, ChaseCurve::SinSin2Cos] {
            for i in 0..100 {
                let p = curve.point(i as f32 * 0.37);
                assert!((p.length() - 1.0).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_orientation_turns_initial_heading_toward_leader() {
        let mut swarm = swarm();
        swarm.update(1.0);
        for (i, f) in swarm.followers().iter().enumerate() {
            let ahead = if i == 0 { swarm.lead() } else { swarm.followers()[i - 1].position };
            let heading = f.orientation * Vec3::Y;
            let expected = (ahead - f.position).normalize();
            assert!((heading - expected).length() < 1e-3, "follower {}", i);
        }
    }

    #[test]
    fn test_orientation_accumulates_across_frames() {
        let mut swarm = swarm();
        for frame in 0..120 {
            swarm.update(frame as f32 * 0.016);
        }
        let f = swarm.followers()[5];
        assert!((f.orientation.length() - 1.0).abs() < 1e-4);
        assert!(((f.orientation * Vec3::Y) - f.direction).length() < 1e-2);
    }

    #[test]
    fn test_long_runs_keep_unit_orientation_on_heading() {
        let mut swarm = swarm();
        for frame in 0..2000 {
            swarm.update(frame as f32 * 0.016);
        }
        for (i, f) in swarm.followers().iter().enumerate() {
            assert!((f.orientation.length() - 1.0).abs() < 1e-5, "follower {}", i);
            assert!(((f.orientation * Vec3::Y) - f.direction).length() < 1e-2, "follower {}", i);
        }
    }

    #[test]
    fn test_first_follower_chases_lead_target() {
        let mut swarm = swarm();
        swarm.update(2.0);
        let f = swarm.followers()[0];
        let expected = (swarm.target_position(2.0) - f.position).normalize();
        assert!((f.direction - expected).length() < 1e-5);
    }
}
