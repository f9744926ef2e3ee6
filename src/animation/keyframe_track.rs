//! Keyframe tracks animating one transform property of one node.

use glam::{Quat, Vec3};

/// Interpolation mode between keyframes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationMode {
    /// Hold the previous keyframe.
    Step,
    /// Linear (slerp for rotations).
    #[default]
    Linear,
}

/// Transform property a track writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackProperty {
    /// Local translation.
    Translation,
    /// Local rotation.
    Rotation,
    /// Local scale.
    Scale,
}

/// Keyframe values, one per time.
#[derive(Debug, Clone)]
pub enum TrackValues {
    /// Translation or scale keyframes.
    Vector(Vec<Vec3>),
    /// Rotation keyframes.
    Quaternion(Vec<Quat>),
}

/// A value sampled from a track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackSample {
    /// Translation or scale.
    Vector(Vec3),
    /// Rotation.
    Quaternion(Quat),
}

/// Keyframes for one property of one target node.
#[derive(Debug, Clone)]
pub struct KeyframeTrack {
    /// Index of the animated node in the model.
    pub target: usize,
    /// Property being animated.
    pub property: TrackProperty,
    /// Interpolation mode.
    pub interpolation: InterpolationMode,
    /// Keyframe times in seconds, ascending.
    times: Vec<f32>,
    /// Keyframe values, same length as `times`.
    values: TrackValues,
}

impl KeyframeTrack {
    /// Create a track. Extra times or values beyond the shorter list are dropped.
    pub fn new(target: usize, property: TrackProperty, times: Vec<f32>, values: TrackValues) -> Self {
        let mut times = times;
        let mut values = values;
        let len = match &values {
            TrackValues::Vector(v) => v.len(),
            TrackValues::Quaternion(v) => v.len(),
        }
        .min(times.len());
        times.truncate(len);
        match &mut values {
            TrackValues::Vector(v) => v.truncate(len),
            TrackValues::Quaternion(v) => v.truncate(len),
        }
        Self {
            target,
            property,
            interpolation: InterpolationMode::Linear,
            times,
            values,
        }
    }

    /// Set the interpolation mode.
    pub fn with_interpolation(mut self, interpolation: InterpolationMode) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Time of the last keyframe.
    pub fn duration(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// Number of keyframes.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Whether the track has no keyframes.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Keyframe pair and blend factor around `time`.
    fn locate(&self, time: f32) -> (usize, usize, f32) {
        let last = self.times.len() - 1;
        if time <= self.times[0] {
            return (0, 0, 0.0);
        }
        if time >= self.times[last] {
            return (last, last, 0.0);
        }
        let next = self.times.partition_point(|&t| t <= time).min(last);
        let prev = next - 1;
        let span = self.times[next] - self.times[prev];
        let t = if span > 0.0 { (time - self.times[prev]) / span } else { 0.0 };
        match self.interpolation {
            InterpolationMode::Step => (prev, prev, 0.0),
            InterpolationMode::Linear => (prev, next, t),
        }
    }

    /// Sample the track at a given time.
    pub fn sample(&self, time: f32) -> Option<TrackSample> {
        if self.times.is_empty() {
            return None;
        }
        let (a, b, t) = self.locate(time);
        Some(match &self.values {
            TrackValues::Vector(v) => TrackSample::Vector(v[a].lerp(v[b], t)),
            TrackValues::Quaternion(v) => TrackSample::Quaternion(v[a].slerp(v[b], t)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_track_interpolates() {
        let track = KeyframeTrack::new(
            0,
            TrackProperty::Translation,
            vec![0.0, 1.0, 2.0],
            TrackValues::Vector(vec![Vec3::ZERO, Vec3::X, Vec3::new(1.0, 2.0, 0.0)]),
        );
        assert_eq!(track.duration(), 2.0);
        assert_eq!(track.sample(0.5), Some(TrackSample::Vector(Vec3::new(0.5, 0.0, 0.0))));
        assert_eq!(track.sample(1.5), Some(TrackSample::Vector(Vec3::new(1.0, 1.0, 0.0))));
        assert_eq!(track.sample(5.0), Some(TrackSample::Vector(Vec3::new(1.0, 2.0, 0.0))));
        assert_eq!(track.sample(-1.0), Some(TrackSample::Vector(Vec3::ZERO)));
    }

    #[test]
    fn test_step_track_holds_previous() {
        let track = KeyframeTrack::new(
            0,
            TrackProperty::Scale,
            vec![0.0, 1.0],
            TrackValues::Vector(vec![Vec3::ONE, Vec3::splat(2.0)]),
        )
        .with_interpolation(InterpolationMode::Step);
        assert_eq!(track.sample(0.99), Some(TrackSample::Vector(Vec3::ONE)));
    }

    #[test]
    fn test_mismatched_lengths_are_truncated() {
        let track = KeyframeTrack::new(
            0,
            TrackProperty::Rotation,
            vec![0.0, 1.0, 2.0],
            TrackValues::Quaternion(vec![Quat::IDENTITY]),
        );
        assert_eq!(track.len(), 1);
        assert_eq!(track.sample(3.0), Some(TrackSample::Quaternion(Quat::IDENTITY)));
    }
}
