//! View frustums for perspective views and the overhead radar.
//!
//! The world is Z-up. Every plane faces into the viewing volume, so a point
//! is visible when its signed distance to each plane is non-negative.

use std::f32::consts::FRAC_PI_4;

use nalgebra::{Point3, Vector3};

use crate::plane::Plane3D;

/// A convex viewing volume bounded by inward-facing planes.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewFrustum {
    eye: Point3<f32>,
    direction: Vector3<f32>,
    right: Vector3<f32>,
    up: Vector3<f32>,
    fov_x: f32,
    near: f32,
    far: f32,
    aspect: f32,
    far_culling: bool,
    planes: Vec<Plane3D>,
}

impl Default for ViewFrustum {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewFrustum {
    /// A 45 degree perspective frustum at the origin looking along +y.
    pub fn new() -> Self {
        let mut frustum = Self {
            eye: Point3::origin(),
            direction: Vector3::y(),
            right: Vector3::x(),
            up: Vector3::z(),
            fov_x: FRAC_PI_4,
            near: 1.0,
            far: 1000.0,
            aspect: 1.0,
            far_culling: false,
            planes: Vec::new(),
        };
        frustum.make_planes();
        frustum
    }

    /// A frustum bounded by arbitrary planes, for custom culling volumes.
    pub fn from_planes(eye: Point3<f32>, direction: Vector3<f32>, planes: Vec<Plane3D>) -> Self {
        let (direction, right, up) = view_basis(&direction);
        Self {
            eye,
            direction,
            right,
            up,
            planes,
            ..Self::new()
        }
    }

    /// Orthographic culling volume for the radar: two vertical slabs
    /// `width` to either side of the eye and `breadth` ahead and behind,
    /// aligned with the view's heading.
    pub fn radar(view: &ViewFrustum, width: f32, breadth: f32) -> Self {
        let heading = Vector3::new(view.direction.x, view.direction.y, 0.0);
        let front = heading
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::y);
        let left = Vector3::new(-front.y, front.x, 0.0);
        let eye = view.eye;

        let slab = |normal: Vector3<f32>, half: f32| {
            Plane3D::new(normal, normal.dot(&eye.coords) - half)
        };
        let planes = vec![
            slab(left, width),
            slab(-left, width),
            slab(front, breadth),
            slab(-front, breadth),
        ];

        Self {
            planes,
            far_culling: false,
            ..view.clone()
        }
    }

    /// Points the frustum from `eye` toward `target` with Z up.
    pub fn set_view(&mut self, eye: Point3<f32>, target: Point3<f32>) {
        self.eye = eye;
        let (direction, right, up) = view_basis(&(target - eye));
        self.direction = direction;
        self.right = right;
        self.up = up;
        self.make_planes();
    }

    /// Sets the horizontal field of view in radians, the clip distances and
    /// the width/height ratio of the viewport.
    pub fn set_projection(&mut self, fov_x: f32, near: f32, far: f32, aspect: f32) {
        self.fov_x = fov_x;
        self.near = near;
        self.far = far;
        self.aspect = aspect;
        self.make_planes();
    }

    /// Whether the far plane takes part in culling.
    pub fn set_far_plane_cull(&mut self, enabled: bool) {
        self.far_culling = enabled;
        self.make_planes();
    }

    fn make_planes(&mut self) {
        let half_width = (self.fov_x * 0.5).tan();
        let half_height = half_width / self.aspect;
        let d = self.direction;
        let r = self.right * half_width;
        let u = self.up * half_height;

        // Corner rays: bottom-left, bottom-right, top-right, top-left.
        let edges = [d - r - u, d + r - u, d + r + u, d - r + u];
        let eye = self.eye;
        let side = |a: &Vector3<f32>, b: &Vector3<f32>| {
            let normal = a.cross(b);
            Plane3D::try_new(normal, normal.dot(&eye.coords))
        };

        let mut planes = Vec::with_capacity(6);
        planes.push(Plane3D::new(d, d.dot(&eye.coords) + self.near));
        planes.extend(
            [
                side(&edges[0], &edges[3]),
                side(&edges[2], &edges[1]),
                side(&edges[1], &edges[0]),
                side(&edges[3], &edges[2]),
            ]
            .into_iter()
            .flatten(),
        );
        if self.far_culling {
            planes.push(Plane3D::new(-d, -d.dot(&eye.coords) - self.far));
        }
        self.planes = planes;
    }

    #[inline]
    pub fn eye(&self) -> Point3<f32> {
        self.eye
    }

    #[inline]
    pub fn direction(&self) -> Vector3<f32> {
        self.direction
    }

    #[inline]
    pub fn right(&self) -> Vector3<f32> {
        self.right
    }

    #[inline]
    pub fn up(&self) -> Vector3<f32> {
        self.up
    }

    #[inline]
    pub fn near(&self) -> f32 {
        self.near
    }

    #[inline]
    pub fn far(&self) -> f32 {
        self.far
    }

    /// All culling planes, facing inward.
    #[inline]
    pub fn planes(&self) -> &[Plane3D] {
        &self.planes
    }

    /// Planes bounding the sides of the view, without near and far.
    pub fn side_planes(&self) -> &[Plane3D] {
        if self.planes.len() >= 5 {
            &self.planes[1..5]
        } else {
            &self.planes
        }
    }

    /// True if `point` is on the inner side of every plane.
    pub fn contains_point(&self, point: Point3<f32>) -> bool {
        self.planes.iter().all(|plane| plane.signed_distance(point) >= 0.0)
    }
}

/// Unit direction, right and up vectors for a Z-up view along `direction`.
fn view_basis(direction: &Vector3<f32>) -> (Vector3<f32>, Vector3<f32>, Vector3<f32>) {
    let direction = direction
        .try_normalize(f32::EPSILON)
        .unwrap_or_else(Vector3::y);
    let right = Vector3::new(direction.y, -direction.x, 0.0)
        .try_normalize(f32::EPSILON)
        .unwrap_or_else(Vector3::x);
    let up = right.cross(&direction);
    (direction, right, up)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn make_frustum() -> ViewFrustum {
        let mut frustum = ViewFrustum::new();
        frustum.set_view(Point3::new(0.0, 0.0, 2.0), Point3::new(0.0, 10.0, 2.0));
        frustum.set_projection(FRAC_PI_4 * 2.0, 1.0, 100.0, 1.0);
        frustum
    }

    #[test]
    fn view_basis_is_z_up() {
        let frustum = make_frustum();

        assert_relative_eq!(frustum.direction(), Vector3::y());
        assert_relative_eq!(frustum.right(), Vector3::x());
        assert_relative_eq!(frustum.up(), Vector3::z());
    }

    #[test]
    fn points_ahead_are_inside() {
        let frustum = make_frustum();

        assert!(frustum.contains_point(Point3::new(0.0, 10.0, 2.0)));
        assert!(frustum.contains_point(Point3::new(4.0, 10.0, 5.0)));
    }

    #[test]
    fn points_behind_or_aside_are_outside() {
        let frustum = make_frustum();

        assert!(!frustum.contains_point(Point3::new(0.0, -5.0, 2.0)), "Behind the eye");
        assert!(!frustum.contains_point(Point3::new(0.0, 0.5, 2.0)), "Closer than near plane");
        assert!(!frustum.contains_point(Point3::new(20.0, 10.0, 2.0)), "Right of view");
        assert!(!frustum.contains_point(Point3::new(-20.0, 10.0, 2.0)), "Left of view");
        assert!(!frustum.contains_point(Point3::new(0.0, 10.0, 30.0)), "Above view");
    }

    #[test]
    fn far_plane_is_optional() {
        let mut frustum = make_frustum();
        let distant = Point3::new(0.0, 500.0, 2.0);

        assert_eq!(frustum.planes().len(), 5);
        assert!(frustum.contains_point(distant));

        frustum.set_far_plane_cull(true);
        assert_eq!(frustum.planes().len(), 6);
        assert!(!frustum.contains_point(distant));
    }

    #[test]
    fn radar_is_a_vertical_box_around_the_eye() {
        let view = make_frustum();
        let radar = ViewFrustum::radar(&view, 50.0, 80.0);

        assert_eq!(radar.planes().len(), 4);
        assert!(radar.contains_point(Point3::new(-40.0, -70.0, 500.0)));
        assert!(!radar.contains_point(Point3::new(60.0, 0.0, 0.0)));
        assert!(!radar.contains_point(Point3::new(0.0, 90.0, 0.0)));
    }
}
