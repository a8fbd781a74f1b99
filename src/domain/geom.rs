/// Axis-aligned geometry queries.
///
/// Everything spatial in the core — collision shapes, sensor zones, ladder
/// regions — is an axis-aligned rectangle. Containment tests both axes;
/// overlap reports per-axis penetration so callers can pick the minimal
/// separation axis or the magnitude relevant to their sensor.

use glam::Vec2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Aabb { min, max }
    }

    /// Rect from top-left corner + size (authored-data convention).
    pub fn from_xywh(x: f32, y: f32, w: f32, h: f32) -> Self {
        Aabb { min: Vec2::new(x, y), max: Vec2::new(x + w, y + h) }
    }

    /// Rect from center + half extents (body-part convention).
    pub fn from_center_half(center: Vec2, half: Vec2) -> Self {
        Aabb { min: center - half, max: center + half }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Point containment. Both axes are tested; a point matching only the
    /// x-range of a tall region is outside it.
    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Per-axis penetration depths if the rects overlap, `None` otherwise.
    /// Touching edges (zero depth) do not count as overlap.
    #[inline]
    pub fn overlap(&self, other: &Aabb) -> Option<Vec2> {
        let ox = self.max.x.min(other.max.x) - self.min.x.max(other.min.x);
        let oy = self.max.y.min(other.max.y) - self.min.y.max(other.min.y);
        if ox > 0.0 && oy > 0.0 {
            Some(Vec2::new(ox, oy))
        } else {
            None
        }
    }

    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.overlap(other).is_some()
    }
}
