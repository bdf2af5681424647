//! Culling volume for ground shadows cast by a distant light.

use nalgebra::{Point3, Vector3};

use crate::frustum::ViewFrustum;
use crate::plane::Plane3D;

/// Views steeper than this (measured on the frustum's up vector) get no
/// shadow volume.
const LEVEL_VIEW_UP_Z: f32 = 0.999_999;

/// Minimum eye height before the bottom of the view bounds the shadow volume.
const BOTTOM_PLANE_MIN_HEIGHT: f32 = 20.0;

/// Planes bounding the region whose occupants can cast a visible shadow.
///
/// The volume is the visible ground footprint of the view, extruded toward
/// the sun. An empty plane set accepts everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShadowVolume {
    planes: Vec<Plane3D>,
}

impl ShadowVolume {
    pub fn from_planes(planes: Vec<Plane3D>) -> Self {
        Self { planes }
    }

    /// Builds the volume for a view lit from direction `sun` (pointing
    /// toward the light).
    ///
    /// Only level views are handled: the left and right sides of the view
    /// are extruded along the sun, and once the eye is high enough the
    /// ground line seen by the bottom of the view closes the volume.
    pub fn from_frustum(frustum: &ViewFrustum, sun: Vector3<f32>) -> Self {
        let mut planes = Vec::with_capacity(3);
        if frustum.up().z <= LEVEL_VIEW_UP_Z {
            return Self { planes };
        }
        let sides = frustum.side_planes();
        if sides.len() < 4 {
            return Self { planes };
        }
        let eye = frustum.eye();

        for side in &sides[0..2] {
            let n = side.normal();
            let edge = Vector3::new(-n.y, n.x, 0.0);
            if let Some(plane) = extruded_edge(edge, &sun, Point3::new(eye.x, eye.y, 0.0)) {
                planes.push(plane);
            }
        }

        if eye.z > BOTTOM_PLANE_MIN_HEIGHT {
            let n = sides[2].normal();
            let horizontal = (n.x * n.x + n.y * n.y).sqrt();
            if horizontal > f32::EPSILON {
                let slope = n.z / horizontal;
                let ground = Point3::new(
                    eye.x + eye.z * n.x * slope,
                    eye.y + eye.z * n.y * slope,
                    0.0,
                );
                let edge = Vector3::new(-n.y, n.x, 0.0);
                if let Some(plane) = extruded_edge(edge, &sun, ground) {
                    planes.push(plane);
                }
            }
        }

        log::trace!("shadow volume has {} planes", planes.len());
        Self { planes }
    }

    #[inline]
    pub fn planes(&self) -> &[Plane3D] {
        &self.planes
    }
}

/// Plane through a ground point that contains both the ground edge
/// direction and the sun direction.
fn extruded_edge(edge: Vector3<f32>, sun: &Vector3<f32>, ground: Point3<f32>) -> Option<Plane3D> {
    let normal = Vector3::new(
        edge.y * sun.z,
        -edge.x * sun.z,
        edge.x * sun.y - edge.y * sun.x,
    );
    Plane3D::try_new(normal, normal.x * ground.x + normal.y * ground.y)
}
