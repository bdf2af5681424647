//! Oriented planes and point classification.

use nalgebra::{Point3, Vector3};

/// Tolerance for plane construction and general classification.
pub const PLANE_EPSILON: f32 = 1e-5;

/// Vertices closer than this to a splitting plane are treated as lying on it.
///
/// Splitting works on world-sized geometry in `f32`, so the tolerance is
/// much coarser than [`PLANE_EPSILON`].
pub const SPLIT_EPSILON: f32 = 1e-3;

/// Which side of a plane a point lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneSide {
    /// Positive side of the normal
    Front,
    /// Negative side of the normal
    Back,
    /// Within epsilon of the plane
    OnPlane,
}

/// Classification of a polygon relative to a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Front,
    Back,
    Coplanar,
    Spanning,
}

/// A plane in 3D space, represented as `normal · point = offset`.
///
/// The normal is always unit length, so [`Plane3D::signed_distance`] is a
/// true distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane3D {
    normal: Vector3<f32>,
    offset: f32,
}

impl Plane3D {
    /// Creates a plane from a normal and offset, normalizing both.
    ///
    /// # Panics
    /// Panics if the normal vector has zero length.
    pub fn new(normal: Vector3<f32>, offset: f32) -> Self {
        Self::try_new(normal, offset).expect("Plane normal cannot be zero")
    }

    /// Like [`Plane3D::new`], but returns `None` for a zero-length normal.
    pub fn try_new(normal: Vector3<f32>, offset: f32) -> Option<Self> {
        let norm = normal.norm();
        if norm <= f32::EPSILON {
            return None;
        }
        Some(Self {
            normal: normal / norm,
            offset: offset / norm,
        })
    }

    /// Creates a plane from a point on the plane and a normal vector.
    ///
    /// # Panics
    /// Panics if the normal vector has zero length.
    pub fn from_point_and_normal(point: Point3<f32>, normal: Vector3<f32>) -> Self {
        let norm = normal.norm();
        assert!(norm > f32::EPSILON, "Plane normal cannot be zero");
        let unit_normal = normal / norm;
        Self {
            normal: unit_normal,
            offset: unit_normal.dot(&point.coords),
        }
    }

    /// Creates a plane from three points wound counter-clockwise when seen
    /// from the front: the normal is `(b - a) × (c - a)`.
    ///
    /// Returns `None` if the points are collinear.
    pub fn from_three_points(a: Point3<f32>, b: Point3<f32>, c: Point3<f32>) -> Option<Self> {
        let normal = (b - a).cross(&(c - a));
        if normal.norm_squared() <= f32::EPSILON * f32::EPSILON {
            return None;
        }
        Some(Self::from_point_and_normal(a, normal))
    }

    #[inline]
    pub fn normal(&self) -> Vector3<f32> {
        self.normal
    }

    #[inline]
    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Signed distance from a point to the plane, positive in front.
    #[inline]
    pub fn signed_distance(&self, point: Point3<f32>) -> f32 {
        self.normal.dot(&point.coords) - self.offset
    }

    /// Classifies a point using [`PLANE_EPSILON`].
    #[inline]
    pub fn classify_point(&self, point: Point3<f32>) -> PlaneSide {
        self.classify_point_with_epsilon(point, PLANE_EPSILON)
    }

    pub fn classify_point_with_epsilon(&self, point: Point3<f32>, epsilon: f32) -> PlaneSide {
        let dist = self.signed_distance(point);
        if dist > epsilon {
            PlaneSide::Front
        } else if dist < -epsilon {
            PlaneSide::Back
        } else {
            PlaneSide::OnPlane
        }
    }

    /// Returns the same plane facing the opposite direction.
    #[inline]
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            offset: -self.offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn signed_distance_and_classification() {
        let plane = Plane3D::from_point_and_normal(Point3::new(0.0, 0.0, 2.0), Vector3::z());

        assert_relative_eq!(plane.signed_distance(Point3::new(5.0, -3.0, 5.0)), 3.0);
        assert_eq!(plane.classify_point(Point3::new(0.0, 0.0, 3.0)), PlaneSide::Front);
        assert_eq!(plane.classify_point(Point3::new(0.0, 0.0, 1.0)), PlaneSide::Back);
        assert_eq!(plane.classify_point(Point3::new(9.0, 9.0, 2.0)), PlaneSide::OnPlane);
    }

    #[test]
    fn new_normalizes_offset() {
        let plane = Plane3D::new(Vector3::new(0.0, 2.0, 0.0), 4.0);

        assert_relative_eq!(plane.normal(), Vector3::y());
        assert_relative_eq!(plane.offset(), 2.0);
    }

    #[test]
    fn from_three_points_winding() {
        let plane = Plane3D::from_three_points(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        )
        .unwrap();
        assert_relative_eq!(plane.normal(), Vector3::z());

        let collinear = Plane3D::from_three_points(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        );
        assert!(collinear.is_none());
    }

    #[test]
    fn flipped_swaps_sides() {
        let plane = Plane3D::new(Vector3::x(), 1.0);
        let flipped = plane.flipped();
        let point = Point3::new(3.0, 0.0, 0.0);

        assert_relative_eq!(flipped.signed_distance(point), -plane.signed_distance(point));
        assert_relative_eq!(flipped.normal(), -plane.normal());
    }
}
