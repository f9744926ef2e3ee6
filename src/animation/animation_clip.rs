//! Animation clip containing keyframe tracks.

use super::KeyframeTrack;
use crate::core::Id;

/// A named motion: a set of tracks sharing one timeline.
#[derive(Debug, Clone)]
pub struct AnimationClip {
    /// Unique identifier.
    id: Id,
    /// Name of the animation.
    pub name: String,
    /// Duration in seconds (longest track).
    duration: f32,
    /// Tracks in this clip.
    tracks: Vec<KeyframeTrack>,
}

impl AnimationClip {
    /// Create a new empty animation clip.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Id::new(),
            name: name.into(),
            duration: 0.0,
            tracks: Vec::new(),
        }
    }

    /// Get the unique ID.
    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Get the duration in seconds.
    #[inline]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Get the tracks.
    #[inline]
    pub fn tracks(&self) -> &[KeyframeTrack] {
        &self.tracks
    }

    /// Add a track to the clip.
    pub fn add_track(&mut self, track: KeyframeTrack) {
        self.duration = self.duration.max(track.duration());
        self.tracks.push(track);
    }
}
