//! Box, polygon and plane-set intersection tests used for culling.

use nalgebra::{Point3, Vector3};

use crate::bounds::Extents;
use crate::frustum::ViewFrustum;
use crate::plane::Plane3D;

/// How much of a volume lies inside a culling region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntersectLevel {
    Outside,
    Partial,
    Contained,
}

/// Distance a box may poke outside a frustum plane and still count as inside.
pub const FRUSTUM_SLACK: f32 = 1.0;

/// Distance a box must sit behind every occluder plane to count as hidden.
pub const OCCLUSION_MARGIN: f32 = 0.1;

/// Tests an axis box against a set of inward-facing planes.
///
/// A box is outside if its most-inside corner is further than `slack`
/// behind any plane, and contained if even its most-outside corner is
/// within `slack` of every plane. An empty plane set contains everything.
pub fn test_axis_box_in_planes(extents: &Extents, planes: &[Plane3D], slack: f32) -> IntersectLevel {
    let mut result = IntersectLevel::Contained;
    for plane in planes {
        let (inside, outside) = extents.corners_along(&plane.normal());
        if plane.signed_distance(inside) < -slack {
            return IntersectLevel::Outside;
        }
        if plane.signed_distance(outside) < -slack {
            result = IntersectLevel::Partial;
        }
    }
    result
}

/// Tests an axis box against every plane of a view frustum.
pub fn test_axis_box_in_frustum(extents: &Extents, frustum: &ViewFrustum) -> IntersectLevel {
    test_axis_box_in_planes(extents, frustum.planes(), FRUSTUM_SLACK)
}

/// Tests an axis box against a frustum as if the box were an infinitely
/// tall column.
///
/// Only vertical planes can exclude a column, so planes with any vertical
/// tilt are skipped. Radar frustums are built from vertical planes only.
pub fn test_axis_box_in_frustum_2d(extents: &Extents, frustum: &ViewFrustum) -> IntersectLevel {
    let mut result = IntersectLevel::Contained;
    for plane in frustum.planes() {
        let normal = plane.normal();
        if normal.z.abs() > 1e-4 {
            result = IntersectLevel::Partial;
            continue;
        }
        let (mut inside, mut outside) = extents.corners_along(&normal);
        inside.z = 0.0;
        outside.z = 0.0;
        if plane.signed_distance(inside) < -FRUSTUM_SLACK {
            return IntersectLevel::Outside;
        }
        if plane.signed_distance(outside) < -FRUSTUM_SLACK {
            result = IntersectLevel::Partial;
        }
    }
    result
}

/// Tests whether an axis box is hidden by an occluder's planes.
///
/// Planes face into the hidden region. The box must clear every plane by
/// [`OCCLUSION_MARGIN`] to be `Contained`.
pub fn test_axis_box_occlusion(extents: &Extents, planes: &[Plane3D]) -> IntersectLevel {
    let mut result = IntersectLevel::Contained;
    for plane in planes {
        let (inside, outside) = extents.corners_along(&plane.normal());
        if plane.signed_distance(inside) < OCCLUSION_MARGIN {
            return IntersectLevel::Outside;
        }
        if plane.signed_distance(outside) < OCCLUSION_MARGIN {
            result = IntersectLevel::Partial;
        }
    }
    result
}

/// True if a convex polygon on `plane` intersects an axis box.
///
/// The polygon's plane must pass through the box, and no axis formed by
/// crossing a polygon edge with a box axis may separate them. Callers are
/// expected to have checked the polygon's own extents against the box.
pub fn test_polygon_in_axis_box(points: &[Point3<f32>], plane: &Plane3D, extents: &Extents) -> bool {
    let (inside, outside) = extents.corners_along(&plane.normal());
    let inside_distance = plane.signed_distance(inside);
    let outside_distance = plane.signed_distance(outside);
    if inside_distance * outside_distance > 0.0 {
        return false;
    }

    let axes = [Vector3::x(), Vector3::y(), Vector3::z()];
    for (index, point) in points.iter().enumerate() {
        let next = &points[(index + 1) % points.len()];
        let edge = next - point;
        for axis in &axes {
            let cross = edge.cross(axis);
            if cross.norm_squared() < 0.001 {
                continue;
            }
            let (box_min, box_max) = project_axis_box(&cross, extents);
            let (poly_min, poly_max) = project_points(&cross, points);
            if box_min > poly_max || box_max < poly_min {
                return false;
            }
        }
    }
    true
}

fn project_axis_box(axis: &Vector3<f32>, extents: &Extents) -> (f32, f32) {
    let (far, near) = extents.corners_along(axis);
    (axis.dot(&near.coords), axis.dot(&far.coords))
}

fn project_points(axis: &Vector3<f32>, points: &[Point3<f32>]) -> (f32, f32) {
    points.iter().fold((f32::MAX, f32::MIN), |(min, max), point| {
        let distance = axis.dot(&point.coords);
        (min.min(distance), max.max(distance))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_box(mins: [f32; 3], maxs: [f32; 3]) -> Extents {
        Extents::new(Point3::from(mins), Point3::from(maxs))
    }

    fn make_slab_planes() -> Vec<Plane3D> {
        // 0 <= x <= 10
        vec![
            Plane3D::new(Vector3::x(), 0.0),
            Plane3D::new(-Vector3::x(), -10.0),
        ]
    }

    #[test]
    fn box_levels_against_planes() {
        let planes = make_slab_planes();

        let inside = make_box([2.0, 0.0, 0.0], [3.0, 1.0, 1.0]);
        let straddling = make_box([8.0, 0.0, 0.0], [14.0, 1.0, 1.0]);
        let outside = make_box([20.0, 0.0, 0.0], [21.0, 1.0, 1.0]);

        assert_eq!(test_axis_box_in_planes(&inside, &planes, 1.0), IntersectLevel::Contained);
        assert_eq!(test_axis_box_in_planes(&straddling, &planes, 1.0), IntersectLevel::Partial);
        assert_eq!(test_axis_box_in_planes(&outside, &planes, 1.0), IntersectLevel::Outside);
    }

    #[test]
    fn slack_keeps_boxes_just_outside() {
        let planes = make_slab_planes();
        let near_miss = make_box([10.5, 0.0, 0.0], [11.0, 1.0, 1.0]);

        assert_eq!(test_axis_box_in_planes(&near_miss, &planes, 1.0), IntersectLevel::Contained);
        assert_eq!(test_axis_box_in_planes(&near_miss, &planes, 0.0), IntersectLevel::Outside);
    }

    #[test]
    fn no_planes_contain_everything() {
        let extents = make_box([-1e6, -1e6, -1e6], [1e6, 1e6, 1e6]);
        assert_eq!(test_axis_box_in_planes(&extents, &[], 0.0), IntersectLevel::Contained);
        assert_eq!(test_axis_box_occlusion(&extents, &[]), IntersectLevel::Contained);
    }

    #[test]
    fn occlusion_requires_margin() {
        let planes = vec![Plane3D::new(Vector3::y(), 10.0)];

        let behind = make_box([0.0, 11.0, 0.0], [1.0, 12.0, 1.0]);
        let touching = make_box([0.0, 10.05, 0.0], [1.0, 12.0, 1.0]);
        let straddling = make_box([0.0, 9.0, 0.0], [1.0, 12.0, 1.0]);

        assert_eq!(test_axis_box_occlusion(&behind, &planes), IntersectLevel::Contained);
        assert_eq!(test_axis_box_occlusion(&touching, &planes), IntersectLevel::Partial);
        assert_eq!(test_axis_box_occlusion(&straddling, &planes), IntersectLevel::Partial);
    }

    #[test]
    fn radar_test_ignores_height() {
        let view = ViewFrustum::new();
        let radar = ViewFrustum::radar(&view, 10.0, 10.0);

        let high = make_box([0.0, 0.0, 900.0], [1.0, 1.0, 901.0]);
        let far = make_box([50.0, 0.0, 0.0], [51.0, 1.0, 1.0]);

        assert_eq!(test_axis_box_in_frustum_2d(&high, &radar), IntersectLevel::Contained);
        assert_eq!(test_axis_box_in_frustum_2d(&far, &radar), IntersectLevel::Outside);
    }

    #[test]
    fn polygon_in_axis_box() {
        // Triangle in the z = 0 plane.
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(0.0, 4.0, 0.0),
        ];
        let plane = Plane3D::new(Vector3::z(), 0.0);

        let hit = make_box([0.5, 0.5, -1.0], [1.0, 1.0, 1.0]);
        let above = make_box([0.5, 0.5, 1.0], [1.0, 1.0, 2.0]);
        // Inside the triangle's extents but past its hypotenuse.
        let past_edge = make_box([3.0, 3.0, -1.0], [3.5, 3.5, 1.0]);

        assert!(test_polygon_in_axis_box(&points, &plane, &hit));
        assert!(!test_polygon_in_axis_box(&points, &plane, &above));
        assert!(!test_polygon_in_axis_box(&points, &plane, &past_edge));
    }
}
