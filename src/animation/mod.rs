//! Animation: time-driven motion patterns and keyframe clips.
//!
//! The pattern modules compute transforms from elapsed time and a small
//! amount of per-entity state. Keyframe clips imported from models are
//! played through [`AnimationAction`]s and blended by [`AnimationMixer`].

mod animation_action;
mod animation_clip;
mod animation_mixer;
mod chase;
mod keyframe_track;
mod orbit;
mod pose_blend;
mod ramp;
mod swing;

pub use animation_action::{ActionState, AnimationAction, LoopMode};
pub use animation_clip::AnimationClip;
pub use animation_mixer::{ActionId, AnimationMixer, Pose};
pub use chase::{ChaseCurve, ChaseSwarm, Follower};
pub use keyframe_track::{InterpolationMode, KeyframeTrack, TrackProperty, TrackSample, TrackValues};
pub use orbit::{OrbitPattern, OrbitSlot};
pub use pose_blend::{BlendWeights, PoseBlend};
pub use ramp::ProgressRamp;
pub use swing::{FanMotion, FanStep};
