//! Pointer picking over a fixed set of tiles.
//!
//! At most one tile is selected and at most one other tile is hovered.
//! Hovering never overrides the selected highlight, and clicking empty
//! space leaves the selection as it was.

use crate::scene::ObjectId;
use glam::Vec2;

/// Convert a pointer position in pixels to normalized device coordinates
/// (x right, y up, both in `[-1, 1]`).
pub fn pointer_to_ndc(x: f32, y: f32, width: f32, height: f32) -> Vec2 {
    if width <= 0.0 || height <= 0.0 {
        return Vec2::ZERO;
    }
    Vec2::new((x / width) * 2.0 - 1.0, -(y / height) * 2.0 + 1.0)
}

/// Highlight state of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileState {
    /// Not hovered, not selected.
    Default,
    /// Under the pointer.
    Hit,
    /// Committed by a click.
    Selected,
}

/// Hovered and selected tiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileSelection {
    selected: Option<ObjectId>,
    hovered: Option<ObjectId>,
}

impl TileSelection {
    /// Nothing hovered or selected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently selected tile.
    #[inline]
    pub fn selected(&self) -> Option<ObjectId> {
        self.selected
    }

    /// Tile under the pointer, if it is not the selected one.
    #[inline]
    pub fn hovered(&self) -> Option<ObjectId> {
        self.hovered
    }

    /// Record the closest tile under the pointer (or none).
    pub fn hover(&mut self, hit: Option<ObjectId>) {
        self.hovered = hit.filter(|&tile| Some(tile) != self.selected);
    }

    /// Commit the hovered tile as the selection. Returns whether the
    /// selection changed.
    pub fn click(&mut self) -> bool {
        match self.hovered.take() {
            Some(tile) => {
                let changed = self.selected != Some(tile);
                self.selected = Some(tile);
                changed
            }
            None => false,
        }
    }

    /// Drop the selection.
    pub fn clear(&mut self) {
        self.selected = None;
        self.hovered = None;
    }

    /// Highlight a tile should show.
    pub fn state_of(&self, tile: ObjectId) -> TileState {
        if self.selected == Some(tile) {
            TileState::Selected
        } else if self.hovered == Some(tile) {
            TileState::Hit
        } else {
            TileState::Default
        }
    }
}
