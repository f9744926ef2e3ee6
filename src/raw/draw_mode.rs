//! Primitive topology selected by name.
//!
//! `LINE_LOOP` and `TRIANGLE_FAN` have no GPU topology of their own; they
//! draw through an index list built by [`DrawMode::emulated_indices`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Draw mode name that cannot be used.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DrawModeError {
    /// Not a draw mode name at all.
    #[error("unknown draw mode {0:?}")]
    Unknown(String),
}

/// How the vertex stream is assembled into primitives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DrawMode {
    /// One point per vertex.
    Points,
    /// Independent segments from vertex pairs.
    Lines,
    /// Connected segments.
    LineStrip,
    /// Connected segments closed back to the first vertex.
    LineLoop,
    /// Independent triangles.
    #[default]
    Triangles,
    /// Triangles sharing an edge with the previous one.
    TriangleStrip,
    /// Triangles sharing the first vertex.
    TriangleFan,
}

impl DrawMode {
    /// Every mode, in selector order.
    pub const ALL: [DrawMode; 7] = [
        DrawMode::Points,
        DrawMode::Lines,
        DrawMode::LineStrip,
        DrawMode::LineLoop,
        DrawMode::Triangles,
        DrawMode::TriangleStrip,
        DrawMode::TriangleFan,
    ];

    /// Upper-case name as shown in the mode selector.
    pub fn name(self) -> &'static str {
        match self {
            DrawMode::Points => "POINTS",
            DrawMode::Lines => "LINES",
            DrawMode::LineStrip => "LINE_STRIP",
            DrawMode::LineLoop => "LINE_LOOP",
            DrawMode::Triangles => "TRIANGLES",
            DrawMode::TriangleStrip => "TRIANGLE_STRIP",
            DrawMode::TriangleFan => "TRIANGLE_FAN",
        }
    }

    /// GPU topology.
    pub fn topology(self) -> wgpu::PrimitiveTopology {
        match self {
            DrawMode::Points => wgpu::PrimitiveTopology::PointList,
            DrawMode::Lines => wgpu::PrimitiveTopology::LineList,
            DrawMode::LineStrip | DrawMode::LineLoop => wgpu::PrimitiveTopology::LineStrip,
            DrawMode::Triangles | DrawMode::TriangleFan => wgpu::PrimitiveTopology::TriangleList,
            DrawMode::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        }
    }

    /// Whether the GPU topology is a strip.
    pub fn is_strip(self) -> bool {
        self.topology().is_strip()
    }

    /// Whether the mode draws through [`DrawMode::emulated_indices`].
    pub fn is_emulated(self) -> bool {
        matches!(self, DrawMode::LineLoop | DrawMode::TriangleFan)
    }

    /// Index list that draws `elements` (the mesh's indices, or `0..n` for
    /// an unindexed mesh) in this mode on the mapped topology.
    ///
    /// `None` for modes the GPU draws directly.
    pub fn emulated_indices(self, elements: &[u16]) -> Option<Vec<u16>> {
        match self {
            DrawMode::LineLoop => {
                let mut indices = elements.to_vec();
                if let Some(&first) = elements.first() {
                    indices.push(first);
                }
                Some(indices)
            }
            DrawMode::TriangleFan => {
                let Some((&hub, rim)) = elements.split_first() else {
                    return Some(Vec::new());
                };
                Some(rim.windows(2).flat_map(|pair| [hub, pair[0], pair[1]]).collect())
            }
            _ => None,
        }
    }
}

impl fmt::Display for DrawMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DrawMode {
    type Err = DrawModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_uppercase();
        DrawMode::ALL
            .into_iter()
            .find(|m| m.name() == name)
            .ok_or_else(|| DrawModeError::Unknown(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_supported_modes() {
        for mode in DrawMode::ALL {
            assert_eq!(mode.name().parse::<DrawMode>(), Ok(mode));
        }
        assert_eq!("line_strip".parse::<DrawMode>(), Ok(DrawMode::LineStrip));
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        assert!(matches!("QUADS".parse::<DrawMode>(), Err(DrawModeError::Unknown(_))));
    }

    #[test]
    fn test_line_loop_closes_back_to_first_element() {
        assert_eq!(DrawMode::LineLoop.emulated_indices(&[0, 1, 2, 3]), Some(vec![0, 1, 2, 3, 0]));
        assert_eq!(DrawMode::LineLoop.emulated_indices(&[4, 2, 7]), Some(vec![4, 2, 7, 4]));
        assert_eq!(DrawMode::LineLoop.topology(), wgpu::PrimitiveTopology::LineStrip);
    }

    #[test]
    fn test_triangle_fan_shares_first_element() {
        assert_eq!(
            DrawMode::TriangleFan.emulated_indices(&[0, 1, 2, 3, 4]),
            Some(vec![0, 1, 2, 0, 2, 3, 0, 3, 4])
        );
        assert_eq!(DrawMode::TriangleFan.emulated_indices(&[0, 1]), Some(vec![]));
        assert_eq!(DrawMode::TriangleFan.topology(), wgpu::PrimitiveTopology::TriangleList);
    }

    #[test]
    fn test_native_modes_are_not_emulated() {
        for mode in DrawMode::ALL {
            assert_eq!(mode.emulated_indices(&[0, 1, 2]).is_some(), mode.is_emulated());
        }
    }

    #[test]
    fn test_serde_uses_selector_names() {
        let json = serde_json::to_string(&DrawMode::TriangleStrip).unwrap();
        assert_eq!(json, "\"TRIANGLE_STRIP\"");
    }
}
