//! Axis-aligned extents and bounding spheres.

use nalgebra::{Point3, Vector3};

/// An axis-aligned box given by its minimum and maximum corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extents {
    pub mins: Point3<f32>,
    pub maxs: Point3<f32>,
}

impl Default for Extents {
    fn default() -> Self {
        Self::empty()
    }
}

impl Extents {
    pub fn new(mins: Point3<f32>, maxs: Point3<f32>) -> Self {
        Self { mins, maxs }
    }

    /// An inverted box that any point expands into.
    pub fn empty() -> Self {
        Self {
            mins: Point3::new(f32::MAX, f32::MAX, f32::MAX),
            maxs: Point3::new(-f32::MAX, -f32::MAX, -f32::MAX),
        }
    }

    /// Tight bounds of a set of points. Empty input gives [`Extents::empty`].
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<f32>>) -> Self {
        let mut extents = Self::empty();
        for point in points {
            extents.expand_to_point(point);
        }
        extents
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        (0..3).any(|axis| self.mins[axis] > self.maxs[axis])
    }

    pub fn expand_to_point(&mut self, point: &Point3<f32>) {
        for axis in 0..3 {
            self.mins[axis] = self.mins[axis].min(point[axis]);
            self.maxs[axis] = self.maxs[axis].max(point[axis]);
        }
    }

    pub fn expand_to_extents(&mut self, other: &Extents) {
        for axis in 0..3 {
            self.mins[axis] = self.mins[axis].min(other.mins[axis]);
            self.maxs[axis] = self.maxs[axis].max(other.maxs[axis]);
        }
    }

    /// Overlap of two boxes. The result is empty if they do not touch.
    pub fn intersection(&self, other: &Extents) -> Extents {
        let mut result = *self;
        for axis in 0..3 {
            result.mins[axis] = self.mins[axis].max(other.mins[axis]);
            result.maxs[axis] = self.maxs[axis].min(other.maxs[axis]);
        }
        result
    }

    /// True if the boxes overlap or share a boundary.
    pub fn touches(&self, other: &Extents) -> bool {
        (0..3).all(|axis| {
            self.mins[axis] <= other.maxs[axis] && self.maxs[axis] >= other.mins[axis]
        })
    }

    /// True if `other` lies entirely within this box.
    pub fn contains(&self, other: &Extents) -> bool {
        (0..3).all(|axis| {
            self.mins[axis] <= other.mins[axis] && self.maxs[axis] >= other.maxs[axis]
        })
    }

    pub fn contains_point(&self, point: &Point3<f32>) -> bool {
        (0..3).all(|axis| self.mins[axis] <= point[axis] && self.maxs[axis] >= point[axis])
    }

    /// Grows the box by `amount` on every side.
    pub fn puffed(&self, amount: f32) -> Extents {
        let pad = Vector3::repeat(amount);
        Extents::new(self.mins - pad, self.maxs + pad)
    }

    #[inline]
    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.mins, &self.maxs)
    }

    #[inline]
    pub fn size(&self) -> Vector3<f32> {
        self.maxs - self.mins
    }

    /// Corner furthest along `normal` and corner furthest against it.
    ///
    /// Returns `(inside, outside)`: the corner with the largest signed
    /// distance to a plane with this normal, then the one with the smallest.
    pub fn corners_along(&self, normal: &Vector3<f32>) -> (Point3<f32>, Point3<f32>) {
        let mut inside = self.mins;
        let mut outside = self.maxs;
        for axis in 0..3 {
            if normal[axis] >= 0.0 {
                inside[axis] = self.maxs[axis];
                outside[axis] = self.mins[axis];
            } else {
                inside[axis] = self.mins[axis];
                outside[axis] = self.maxs[axis];
            }
        }
        (inside, outside)
    }
}

/// A sphere stored as center and squared radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Point3<f32>,
    pub radius_squared: f32,
}

impl BoundingSphere {
    pub fn new(center: Point3<f32>, radius: f32) -> Self {
        Self {
            center,
            radius_squared: radius * radius,
        }
    }

    /// Sphere centered on the mean of `points`, wide enough to hold them all.
    pub fn from_points(points: &[Point3<f32>]) -> Self {
        if points.is_empty() {
            return Self::new(Point3::origin(), 0.0);
        }
        let sum = points
            .iter()
            .fold(Vector3::zeros(), |acc, point| acc + point.coords);
        let center = Point3::from(sum / points.len() as f32);
        let radius_squared = points
            .iter()
            .map(|point| nalgebra::distance_squared(&center, point))
            .fold(0.0, f32::max);
        Self {
            center,
            radius_squared,
        }
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius_squared.sqrt()
    }

    /// Axis-aligned box around the sphere.
    pub fn extents(&self) -> Extents {
        let radius = Vector3::repeat(self.radius());
        Extents::new(self.center - radius, self.center + radius)
    }
}
