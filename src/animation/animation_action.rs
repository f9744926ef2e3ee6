//! Animation action - playback state of one clip.

use super::AnimationClip;
use std::sync::Arc;

/// Loop mode for animations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    /// Play once and hold the last frame.
    Once,
    /// Wrap around at the end.
    #[default]
    Repeat,
    /// Forward then backward.
    PingPong,
}

/// State of an animation action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionState {
    /// Not playing.
    #[default]
    Stopped,
    /// Currently playing.
    Playing,
    /// Paused.
    Paused,
}

/// Controls playback of an animation clip.
#[derive(Debug, Clone)]
pub struct AnimationAction {
    /// The animation clip being played.
    clip: Arc<AnimationClip>,
    /// Current playback time in seconds.
    time: f32,
    /// Playback speed multiplier.
    pub time_scale: f32,
    /// Blend weight (0.0 - 1.0).
    weight: f32,
    /// Loop mode.
    pub loop_mode: LoopMode,
    /// Current playback state.
    state: ActionState,
    /// Playing backwards (ping-pong).
    is_reversed: bool,
}

impl AnimationAction {
    /// Create a stopped action for a clip.
    pub fn new(clip: Arc<AnimationClip>) -> Self {
        Self {
            clip,
            time: 0.0,
            time_scale: 1.0,
            weight: 1.0,
            loop_mode: LoopMode::Repeat,
            state: ActionState::Stopped,
            is_reversed: false,
        }
    }

    /// Get the animation clip.
    #[inline]
    pub fn clip(&self) -> &AnimationClip {
        &self.clip
    }

    /// Get the current time.
    #[inline]
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Get the current state.
    #[inline]
    pub fn state(&self) -> ActionState {
        self.state
    }

    /// Check if playing.
    #[inline]
    pub fn is_playing(&self) -> bool {
        self.state == ActionState::Playing
    }

    /// Blend weight.
    #[inline]
    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// Set the blend weight, clamped to `[0, 1]`. NaN becomes 0.
    pub fn set_weight(&mut self, weight: f32) {
        self.weight = if weight.is_nan() { 0.0 } else { weight.clamp(0.0, 1.0) };
    }

    /// Start playing the animation.
    pub fn play(&mut self) {
        self.state = ActionState::Playing;
    }

    /// Stop the animation and reset to start.
    pub fn stop(&mut self) {
        self.state = ActionState::Stopped;
        self.time = 0.0;
        self.is_reversed = false;
    }

    /// Pause the animation.
    pub fn pause(&mut self) {
        if self.state == ActionState::Playing {
            self.state = ActionState::Paused;
        }
    }

    /// Weight that takes part in blending: zero unless playing or paused.
    pub fn effective_weight(&self) -> f32 {
        match self.state {
            ActionState::Stopped => 0.0,
            ActionState::Playing | ActionState::Paused => self.weight,
        }
    }

    /// Advance by `delta_time` seconds. Returns true while the action is active.
    pub fn update(&mut self, delta_time: f32) -> bool {
        if self.state != ActionState::Playing {
            return self.state != ActionState::Stopped;
        }

        let duration = self.clip.duration();
        if duration <= 0.0 {
            return true;
        }

        let direction = if self.is_reversed { -1.0 } else { 1.0 };
        self.time += delta_time.max(0.0) * self.time_scale * direction;

        match self.loop_mode {
            LoopMode::Once => {
                if self.time >= duration {
                    self.time = duration;
                    self.state = ActionState::Paused;
                }
            }
            LoopMode::Repeat => {
                self.time = self.time.rem_euclid(duration);
            }
            LoopMode::PingPong => {
                if !self.is_reversed && self.time >= duration {
                    self.time = duration - (self.time - duration).min(duration);
                    self.is_reversed = true;
                } else if self.is_reversed && self.time <= 0.0 {
                    self.time = (-self.time).min(duration);
                    self.is_reversed = false;
                }
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{KeyframeTrack, TrackProperty, TrackValues};
    use glam::Vec3;

    fn clip(duration: f32) -> Arc<AnimationClip> {
        let mut clip = AnimationClip::new("walk");
        clip.add_track(KeyframeTrack::new(
            0,
            TrackProperty::Translation,
            vec![0.0, duration],
            TrackValues::Vector(vec![Vec3::ZERO, Vec3::X]),
        ));
        Arc::new(clip)
    }

    #[test]
    fn test_repeat_wraps() {
        let mut action = AnimationAction::new(clip(2.0));
        action.play();
        action.update(2.5);
        assert!((action.time() - 0.5).abs() < 1e-6);
        assert!(action.is_playing());
    }

    #[test]
    fn test_once_holds_last_frame() {
        let mut action = AnimationAction::new(clip(1.0));
        action.loop_mode = LoopMode::Once;
        action.play();
        action.update(3.0);
        assert_eq!(action.time(), 1.0);
        assert_eq!(action.state(), ActionState::Paused);
    }

    #[test]
    fn test_weight_is_clamped() {
        let mut action = AnimationAction::new(clip(1.0));
        action.set_weight(1.5);
        assert_eq!(action.weight(), 1.0);
        action.set_weight(f32::NAN);
        assert_eq!(action.weight(), 0.0);
        assert_eq!(action.effective_weight(), 0.0);
    }
}
