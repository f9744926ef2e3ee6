//! Decoded RGBA8 image shared between materials.

use crate::core::Id;
use crate::math::Color;
use std::sync::Arc;

/// A decoded RGBA8 image.
///
/// Images are created once at load time and shared by reference; the GPU
/// renderer uploads each image once, keyed by [`Image::id`].
#[derive(Debug, Clone)]
pub struct Image {
    id: Id,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Tightly packed RGBA8 pixels, row-major, top row first.
    pub pixels: Vec<u8>,
}

impl Image {
    /// Create an image from raw RGBA8 pixels.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self { id: Id::new(), width, height, pixels }
    }

    /// Create a 1x1 image of a single color.
    pub fn solid(color: Color) -> Arc<Self> {
        let [r, g, b] = color.to_array().map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
        Arc::new(Self::new(1, 1, vec![r, g, b, 255]))
    }

    /// Unique ID.
    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Pixel at (x, y) as linear 0-1 color, clamped to the edges.
    pub fn pixel(&self, x: u32, y: u32) -> [f32; 4] {
        if self.width == 0 || self.height == 0 {
            return [1.0; 4];
        }
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        let i = ((y * self.width + x) * 4) as usize;
        match self.pixels.get(i..i + 4) {
            Some(p) => [p[0], p[1], p[2], p[3]].map(|c| c as f32 / 255.0),
            None => [1.0; 4],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_pixel() {
        let img = Image::solid(Color::from_hex(0xff0000));
        assert_eq!(img.pixel(0, 0), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(img.pixel(5, 5), [1.0, 0.0, 0.0, 1.0]);
    }
}
