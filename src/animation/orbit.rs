//! Boxes circling a vertical axis in stacked rows.

use crate::math::consts::TWO_PI;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Immutable placement of one orbiting entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitSlot {
    /// Row index, 0 at the top.
    pub row: usize,
    /// Position within the row.
    pub sub_index: usize,
    /// Height of the row.
    pub y: f32,
}

/// Orbit motion shared by every slot.
///
/// Angles grow without bound with time; trigonometric periodicity takes
/// care of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitPattern {
    /// Radians per second.
    pub angular_speed: f32,
    /// Orbit radius.
    pub radius: f32,
    /// Entities per row, spread evenly around the circle.
    pub per_row: usize,
}

impl Default for OrbitPattern {
    fn default() -> Self {
        // One radian every 400 ms.
        Self {
            angular_speed: 2.5,
            radius: 1.0,
            per_row: 3,
        }
    }
}

impl OrbitPattern {
    /// Slots for `rows` rows centered vertically around y = 0.
    pub fn slots(&self, rows: usize) -> Vec<OrbitSlot> {
        let top = (rows as f32 - 1.0) / 2.0;
        (0..rows)
            .flat_map(|row| {
                (0..self.per_row).map(move |sub_index| OrbitSlot {
                    row,
                    sub_index,
                    y: top - row as f32,
                })
            })
            .collect()
    }

    /// Base angle of a slot before time is added.
    pub fn phase(&self, slot: &OrbitSlot) -> f32 {
        let spacing = TWO_PI / self.per_row.max(1) as f32;
        slot.row as f32 + spacing * slot.sub_index as f32
    }

    /// Position of a slot at elapsed time `t`.
    pub fn position(&self, slot: &OrbitSlot, t: f32) -> Vec3 {
        let angle = self.phase(slot) + t * self.angular_speed;
        Vec3::new(angle.cos() * self.radius, slot.y, angle.sin() * self.radius)
    }

    /// Euler rotation of a slot at elapsed time `t`: x and y spin with the
    /// row index plus time, z stays level.
    pub fn rotation(&self, slot: &OrbitSlot, t: f32) -> Vec3 {
        let angle = t * self.angular_speed + slot.row as f32;
        Vec3::new(angle, angle, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_box_at_time_zero() {
        let pattern = OrbitPattern::default();
        let slots = pattern.slots(33);
        assert_eq!(slots.len(), 99);
        let first = slots[0];
        assert_eq!((first.row, first.sub_index), (0, 0));
        let p = pattern.position(&first, 0.0);
        assert!((p - Vec3::new(1.0, 16.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_row_boxes_are_120_degrees_apart() {
        let pattern = OrbitPattern::default();
        let slots = pattern.slots(1);
        let a = pattern.position(&slots[0], 1.3);
        let b = pattern.position(&slots[1], 1.3);
        let cos = a.dot(b) / (a.length() * b.length());
        assert!((cos - (TWO_PI / 3.0).cos()).abs() < 1e-5);
    }

    #[test]
    fn test_position_is_pure_function_of_time() {
        let pattern = OrbitPattern::default();
        let slot = pattern.slots(33)[40];
        let first = pattern.position(&slot, 12.5);
        let _ = pattern.position(&slot, 3.0);
        assert_eq!(pattern.position(&slot, 12.5), first);
        assert_eq!(slot.y, 16.0 - 13.0);
    }

    #[test]
    fn test_rotation_adds_row_index() {
        let pattern = OrbitPattern::default();
        let slot = OrbitSlot { row: 4, sub_index: 2, y: 0.0 };
        assert_eq!(pattern.rotation(&slot, 0.0), Vec3::new(4.0, 4.0, 0.0));
    }
}
