//! Animation mixer: advances actions and blends them by weight.

use super::{AnimationAction, AnimationClip, TrackProperty, TrackSample};
use crate::scene::{ObjectId, Scene};
use glam::{Quat, Vec3};
use std::collections::HashMap;
use std::sync::Arc;

/// Handle of an action inside its mixer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionId(usize);

/// Blended transform values per animated node.
#[derive(Debug, Clone, Default)]
pub struct Pose {
    /// Translations by node index.
    pub translations: HashMap<usize, Vec3>,
    /// Rotations by node index.
    pub rotations: HashMap<usize, Quat>,
    /// Scales by node index.
    pub scales: HashMap<usize, Vec3>,
}

impl Pose {
    /// Clear all values.
    pub fn clear(&mut self) {
        self.translations.clear();
        self.rotations.clear();
        self.scales.clear();
    }

    /// Write the pose into scene objects; `nodes[i]` is the object for node `i`.
    pub fn apply(&self, scene: &mut Scene, nodes: &[ObjectId]) {
        for (&node, &t) in &self.translations {
            if let Some(&id) = nodes.get(node) {
                scene.transform_mut(id).position = t;
            }
        }
        for (&node, &q) in &self.rotations {
            if let Some(&id) = nodes.get(node) {
                scene.transform_mut(id).set_quaternion(q);
            }
        }
        for (&node, &s) in &self.scales {
            if let Some(&id) = nodes.get(node) {
                scene.transform_mut(id).scale = s;
            }
        }
    }
}

#[derive(Default)]
struct Accumulator {
    vectors: HashMap<(usize, TrackProperty), (f32, Vec3)>,
    rotations: HashMap<usize, (f32, Quat)>,
}

impl Accumulator {
    fn add(&mut self, target: usize, property: TrackProperty, sample: TrackSample, weight: f32) {
        match sample {
            TrackSample::Vector(v) => {
                let entry = self.vectors.entry((target, property)).or_insert((0.0, Vec3::ZERO));
                entry.0 += weight;
                entry.1 += v * weight;
            }
            TrackSample::Quaternion(q) => {
                let entry = self.rotations.entry(target).or_insert((0.0, Quat::from_xyzw(0.0, 0.0, 0.0, 0.0)));
                // Keep all contributions in the same hemisphere before summing.
                let q = if entry.0 > 0.0 && entry.1.dot(q) < 0.0 { -q } else { q };
                entry.0 += weight;
                entry.1 = entry.1 + q * weight;
            }
        }
    }
}

/// Animation mixer manages multiple animation actions and blends them.
#[derive(Debug)]
pub struct AnimationMixer {
    /// Actions in creation order.
    actions: Vec<AnimationAction>,
    /// Global time scale.
    pub time_scale: f32,
    /// Last blended pose.
    output: Pose,
}

impl AnimationMixer {
    /// Create a new animation mixer.
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
            time_scale: 1.0,
            output: Pose::default(),
        }
    }

    /// Create and add an action for a clip.
    pub fn clip_action(&mut self, clip: Arc<AnimationClip>) -> ActionId {
        self.actions.push(AnimationAction::new(clip));
        ActionId(self.actions.len() - 1)
    }

    /// Get all actions.
    #[inline]
    pub fn actions(&self) -> &[AnimationAction] {
        &self.actions
    }

    /// Borrow an action.
    pub fn action(&self, id: ActionId) -> Option<&AnimationAction> {
        self.actions.get(id.0)
    }

    /// Borrow an action mutably.
    pub fn action_mut(&mut self, id: ActionId) -> Option<&mut AnimationAction> {
        self.actions.get_mut(id.0)
    }

    /// Action at creation index.
    pub fn action_at(&self, index: usize) -> Option<ActionId> {
        (index < self.actions.len()).then_some(ActionId(index))
    }

    /// Stop all actions.
    pub fn stop_all(&mut self) {
        for action in &mut self.actions {
            action.stop();
        }
    }

    /// Advance all actions by delta time.
    pub fn update(&mut self, delta_time: f32) {
        let scaled_delta = delta_time * self.time_scale;
        for action in &mut self.actions {
            action.update(scaled_delta);
        }
    }

    /// Blend all weighted actions into a pose.
    ///
    /// Each property is the weight-normalized average of the actions that
    /// animate it; rotations use a normalized quaternion sum.
    pub fn sample(&mut self) -> &Pose {
        self.output.clear();
        let mut acc = Accumulator::default();

        for action in &self.actions {
            let weight = action.effective_weight();
            if weight <= 0.0 {
                continue;
            }
            let time = action.time();
            for track in action.clip().tracks() {
                if let Some(sample) = track.sample(time) {
                    acc.add(track.target, track.property, sample, weight);
                }
            }
        }

        for ((target, property), (w, sum)) in acc.vectors {
            let value = sum / w;
            match property {
                TrackProperty::Scale => self.output.scales.insert(target, value),
                _ => self.output.translations.insert(target, value),
            };
        }
        for (target, (_, sum)) in acc.rotations {
            let len = sum.length();
            if len > 1e-6 {
                self.output.rotations.insert(target, sum / len);
            }
        }

        &self.output
    }

    /// Get the last sampled pose.
    #[inline]
    pub fn output(&self) -> &Pose {
        &self.output
    }

    /// Check if any animations are playing.
    pub fn is_playing(&self) -> bool {
        self.actions.iter().any(|a| a.is_playing())
    }
}

impl Default for AnimationMixer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{KeyframeTrack, TrackValues};

    fn constant_clip(name: &str, position: Vec3) -> Arc<AnimationClip> {
        let mut clip = AnimationClip::new(name);
        clip.add_track(KeyframeTrack::new(
            0,
            TrackProperty::Translation,
            vec![0.0, 1.0],
            TrackValues::Vector(vec![position, position]),
        ));
        Arc::new(clip)
    }

    #[test]
    fn test_weighted_blend() {
        let mut mixer = AnimationMixer::new();
        let a = mixer.clip_action(constant_clip("a", Vec3::ZERO));
        let b = mixer.clip_action(constant_clip("b", Vec3::new(4.0, 0.0, 0.0)));
        for (id, w) in [(a, 0.75), (b, 0.25)] {
            let action = mixer.action_mut(id).unwrap();
            action.set_weight(w);
            action.play();
        }
        mixer.update(0.1);
        let pose = mixer.sample();
        assert!((pose.translations[&0].x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_zero_weight_actions_are_ignored() {
        let mut mixer = AnimationMixer::new();
        let a = mixer.clip_action(constant_clip("a", Vec3::ONE));
        let b = mixer.clip_action(constant_clip("b", Vec3::splat(9.0)));
        mixer.action_mut(a).unwrap().play();
        let action = mixer.action_mut(b).unwrap();
        action.set_weight(0.0);
        action.play();
        assert_eq!(mixer.sample().translations[&0], Vec3::ONE);
    }

    #[test]
    fn test_rotation_blend_is_normalized() {
        let mut mixer = AnimationMixer::new();
        for angle in [0.0f32, 1.0] {
            let mut clip = AnimationClip::new("r");
            let q = Quat::from_rotation_y(angle);
            clip.add_track(KeyframeTrack::new(
                0,
                TrackProperty::Rotation,
                vec![0.0],
                TrackValues::Quaternion(vec![q]),
            ));
            let id = mixer.clip_action(Arc::new(clip));
            let action = mixer.action_mut(id).unwrap();
            action.set_weight(0.5);
            action.play();
        }
        let q = mixer.sample().rotations[&0];
        assert!((q.length() - 1.0).abs() < 1e-5);
        assert!(q.abs_diff_eq(Quat::from_rotation_y(0.5), 1e-4));
    }
}
