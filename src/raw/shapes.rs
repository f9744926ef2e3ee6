//! Shapes for the raw pipeline.

use super::{MeshData, VertexAttribute};
use std::f32::consts::PI;

const RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];
const GREEN: [f32; 4] = [0.0, 1.0, 0.0, 1.0];
const BLUE: [f32; 4] = [0.0, 0.0, 1.0, 1.0];
const YELLOW: [f32; 4] = [1.0, 1.0, 0.0, 1.0];
const PURPLE: [f32; 4] = [1.0, 0.0, 1.0, 1.0];

/// Unit pentagon as three unindexed triangles fanned from the 18° corner,
/// with a color per vertex.
pub fn pentagon() -> MeshData {
    let corner = |degrees: f32| {
        let a = degrees * PI / 180.0;
        [a.cos(), a.sin(), 0.0]
    };
    let [n1, n2, n3, n4, n5] = [90.0, 162.0, 234.0, 306.0, 18.0].map(corner);

    let position = vec![n1, n2, n5, n2, n3, n5, n3, n4, n5];
    let color = vec![RED, GREEN, PURPLE, GREEN, YELLOW, PURPLE, YELLOW, BLUE, PURPLE];

    MeshData {
        attributes: vec![
            ("position", VertexAttribute::Vec3(position)),
            ("color", VertexAttribute::Vec4(color)),
        ],
        indices: None,
    }
}

/// XY plane facing +Z with position, normal, color and texCoord.
/// texCoord (0, 0) is the top-left corner of the image.
pub fn plane(width: f32, height: f32, color: [f32; 4]) -> MeshData {
    let w = width / 2.0;
    let h = height / 2.0;
    MeshData {
        attributes: vec![
            (
                "position",
                VertexAttribute::Vec3(vec![[-w, h, 0.0], [w, h, 0.0], [-w, -h, 0.0], [w, -h, 0.0]]),
            ),
            ("normal", VertexAttribute::Vec3(vec![[0.0, 0.0, 1.0]; 4])),
            ("color", VertexAttribute::Vec4(vec![color; 4])),
            (
                "texCoord",
                VertexAttribute::Vec2(vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]),
            ),
        ],
        indices: Some(vec![0, 2, 1, 1, 2, 3]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pentagon_is_three_triangles_on_unit_circle() {
        let data = pentagon();
        assert_eq!(data.element_count(), 9);
        let Some(VertexAttribute::Vec3(position)) = data.attribute("position") else {
            panic!("missing position");
        };
        for p in position {
            assert!(((p[0] * p[0] + p[1] * p[1]).sqrt() - 1.0).abs() < 1e-5);
        }
        // Apex straight up.
        assert!(position[0][0].abs() < 1e-6 && (position[0][1] - 1.0).abs() < 1e-6);
        // Every triangle shares the 18° corner.
        assert_eq!(position[2], position[5]);
        assert_eq!(position[5], position[8]);
    }

    #[test]
    fn test_plane_layout() {
        let data = plane(2.0, 2.0, [1.0; 4]);
        let names: Vec<_> = data.attributes.iter().map(|(n, a)| (*n, a.stride())).collect();
        assert_eq!(names, vec![("position", 3), ("normal", 3), ("color", 4), ("texCoord", 2)]);
        assert_eq!(data.vertex_count(), 4);
        assert_eq!(data.element_count(), 6);
    }

    #[test]
    fn test_plane_faces_positive_z() {
        let data = plane(2.0, 2.0, [1.0; 4]);
        let Some(VertexAttribute::Vec3(p)) = data.attribute("position") else {
            panic!("missing position");
        };
        let indices = data.indices.as_ref().unwrap();
        for tri in indices.chunks(3) {
            let [a, b, c] = [p[tri[0] as usize], p[tri[1] as usize], p[tri[2] as usize]];
            let cross_z = (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0]);
            assert!(cross_z > 0.0);
        }
    }
}
