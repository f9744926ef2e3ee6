//! Directional light shadows.

use super::{DirectionalLight, Light, MAX_LIGHTS};
use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Orthographic shadow camera of a [`DirectionalLight`], looking from the
/// light's position at its target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionalShadow {
    /// Half extent of the square frustum.
    pub size: f32,
    /// Near plane, measured from the light position.
    pub near: f32,
    /// Far plane, measured from the light position.
    pub far: f32,
    /// Depth offset in world units that keeps surfaces from shadowing themselves.
    pub bias: f32,
    /// Side of the shadow map in texels.
    pub map_size: u32,
}

impl Default for DirectionalShadow {
    fn default() -> Self {
        Self {
            size: 5.0,
            near: 0.5,
            far: 500.0,
            bias: 0.05,
            map_size: 512,
        }
    }
}

impl DirectionalShadow {
    /// Shadow camera with a half extent of `size`.
    pub fn new(size: f32) -> Self {
        Self { size, ..Self::default() }
    }

    /// World to light clip space.
    pub fn view_projection(&self, light: &DirectionalLight) -> Mat4 {
        let up = if light.direction().cross(Vec3::Y).length_squared() < 1e-6 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let view = Mat4::look_at_rh(light.position, light.target, up);
        let proj = Mat4::orthographic_rh(-self.size, self.size, -self.size, self.size, self.near, self.far);
        proj * view
    }

    /// [`DirectionalShadow::bias`] in normalized depth units.
    pub fn depth_bias(&self) -> f32 {
        self.bias / (self.far - self.near).max(f32::EPSILON)
    }
}

/// The shadow-casting light of a scene, resolved for a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowView {
    /// Index of the light in [`super::LightsUniform::lights`].
    pub light_index: usize,
    /// World to light clip space.
    pub view_proj: Mat4,
    /// Shadow camera settings.
    pub shadow: DirectionalShadow,
}

impl ShadowView {
    /// First directional light with a shadow camera. Only one light casts.
    pub fn find<'a>(lights: impl IntoIterator<Item = &'a Light>) -> Option<Self> {
        let mut packed = 0;
        for light in lights {
            match light {
                Light::Ambient(_) => continue,
                Light::Directional(light) => {
                    if let Some(shadow) = light.shadow {
                        return (packed < MAX_LIGHTS).then(|| Self {
                            light_index: packed,
                            view_proj: shadow.view_projection(light),
                            shadow,
                        });
                    }
                }
                Light::Point(_) => {}
            }
            packed += 1;
        }
        None
    }

    /// Shadow map coordinates (origin top-left) and depth of a world
    /// point, or `None` outside the shadow camera.
    pub fn project(&self, world: Vec3) -> Option<(Vec2, f32)> {
        let clip = self.view_proj * world.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        if ndc.x.abs() > 1.0 || ndc.y.abs() > 1.0 || !(0.0..=1.0).contains(&ndc.z) {
            return None;
        }
        Some((Vec2::new(ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5), ndc.z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::light::AmbientLight;
    use crate::math::Color;

    fn sun() -> DirectionalLight {
        DirectionalLight::new(Color::WHITE, 1.0, Vec3::new(0.0, 10.0, 0.0)).with_shadow(DirectionalShadow::new(15.0))
    }

    #[test]
    fn test_nearer_points_have_smaller_depth() {
        let view = ShadowView::find(&[Light::from(sun())]).unwrap();
        let (uv, ground) = view.project(Vec3::ZERO).unwrap();
        let (_, raised) = view.project(Vec3::new(0.0, 2.0, 0.0)).unwrap();
        assert!((uv - Vec2::splat(0.5)).length() < 1e-5);
        assert!(raised < ground);
    }

    #[test]
    fn test_frustum_covers_size() {
        let view = ShadowView::find(&[Light::from(sun())]).unwrap();
        assert!(view.project(Vec3::new(14.0, 0.0, -14.0)).is_some());
        assert!(view.project(Vec3::new(16.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn test_light_index_skips_ambient() {
        let lights = [
            Light::from(AmbientLight::new(Color::WHITE, 0.1)),
            Light::from(DirectionalLight::new(Color::WHITE, 1.0, Vec3::X)),
            Light::from(sun()),
        ];
        assert_eq!(ShadowView::find(&lights).map(|v| v.light_index), Some(1));
        assert!(ShadowView::find(&lights[..2]).is_none());
    }
}
