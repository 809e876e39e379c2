//! Axis-aligned bounds of a point set

use crate::core::types::Vec3;

/// Axis-aligned bounding box defined by min and max corners
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Create AABB from min and max corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Tightest box around `points`, or None for an empty slice
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut aabb = Aabb::new(*first, *first);
        for p in rest {
            aabb.expand(*p);
        }
        Some(aabb)
    }

    /// Get center point
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get size (max - min)
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Range of the widest axis
    pub fn largest_extent(&self) -> f32 {
        self.size().max_element()
    }

    /// Check if point is inside AABB (inclusive)
    pub fn contains_point(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Expand AABB to include point
    pub fn expand(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points() {
        let aabb = Aabb::from_points(&[
            Vec3::new(1.0, -2.0, 0.0),
            Vec3::new(-1.0, 4.0, 0.5),
            Vec3::new(0.0, 0.0, 3.0),
        ])
        .unwrap();
        assert_eq!(aabb.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 4.0, 3.0));
        assert_eq!(aabb.largest_extent(), 6.0);
        assert_eq!(aabb.center(), Vec3::new(0.0, 1.0, 1.5));
    }

    #[test]
    fn test_empty_points() {
        assert!(Aabb::from_points(&[]).is_none());
    }

    #[test]
    fn test_contains_point() {
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        assert!(aabb.contains_point(Vec3::splat(0.5)));
        assert!(aabb.contains_point(Vec3::ONE));
        assert!(!aabb.contains_point(Vec3::splat(2.0)));
    }
}
