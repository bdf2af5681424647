//! The drawable interface and the concrete scene nodes.
//!
//! A drawable is anything a scene database can hold: it knows its bounds,
//! optionally lies on a plane, can be cut by a plane, and emits itself (or
//! its pieces) to a [`SceneRenderer`].

mod bolt_node;
mod polygon_node;
mod shell_node;
mod sphere_node;

use std::fmt;

use nalgebra::Point3;

pub use bolt_node::BoltNode;
pub use polygon_node::PolygonNode;
pub use shell_node::ShellNode;
pub use sphere_node::{SphereNode, SPHERE_LOW_RES};

use crate::bounds::{BoundingSphere, Extents};
use crate::cuttable::Cut;
use crate::frustum::ViewFrustum;
use crate::plane::Plane3D;
use crate::renderer::SceneRenderer;

/// Visibility cached on a drawable by the last octree query.
///
/// Queries only report drawables that are `Culled` on entry, which keeps a
/// drawable listed in several cells from being reported twice. The database
/// that ran the query resets the state once it has consumed the results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OctreeState {
    #[default]
    Culled,
    /// Found in a partially visible cell; needs its own bounds test.
    Partial,
    /// Found in a fully visible cell; no further bounds test needed.
    Visible,
}

/// Opaque graphics-state token handed to the renderer with each node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GState(pub u32);

/// A point light emitted by dynamic nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub position: Point3<f32>,
    pub color: [f32; 3],
    /// Constant, linear and quadratic attenuation.
    pub attenuation: [f32; 3],
}

impl Light {
    pub fn new(position: Point3<f32>, color: [f32; 3]) -> Self {
        Self {
            position,
            color,
            attenuation: [1.0, 0.0, 0.0],
        }
    }
}

/// A renderable element of the scene.
pub trait Drawable: fmt::Debug {
    fn sphere(&self) -> &BoundingSphere;

    fn extents(&self) -> &Extents;

    fn gstate(&self) -> GState;

    /// The plane a flat drawable lies on.
    ///
    /// Drawables without a plane cannot be used to partition a BSP tree.
    fn plane(&self) -> Option<&Plane3D> {
        None
    }

    /// Whether a planar drawable is visible from behind its plane.
    fn is_double_sided(&self) -> bool {
        false
    }

    fn octree_state(&self) -> OctreeState;

    fn set_octree_state(&self, state: OctreeState);

    /// Returns true if the drawable cannot be seen through `frustum`.
    fn cull(&self, frustum: &ViewFrustum) -> bool {
        if self.octree_state() == OctreeState::Visible {
            return false;
        }
        sphere_outside_planes(self.sphere(), frustum.planes())
    }

    /// True if any part of the drawable lies in `extents`.
    fn in_axis_box(&self, extents: &Extents) -> bool {
        self.extents().touches(extents)
    }

    fn vertices(&self) -> &[Point3<f32>] {
        &[]
    }

    /// Cuts the drawable by a plane.
    ///
    /// Fragments carry the original's plane and graphics state. Drawables
    /// that cannot be cut are placed whole by their center.
    fn split(&self, plane: &Plane3D) -> Cut<Box<dyn Drawable>> {
        if plane.signed_distance(self.sphere().center) >= 0.0 {
            Cut::Front
        } else {
            Cut::Back
        }
    }

    /// Squared distance from `eye`, used to order dynamic drawables.
    fn distance(&self, eye: Point3<f32>) -> f32 {
        nalgebra::distance_squared(&self.sphere().center, &eye)
    }

    /// Flat pieces that can stand in for this drawable in an ordered
    /// database. `None` means the drawable has no decomposition.
    fn parts(&self) -> Option<Vec<Box<dyn Drawable>>> {
        None
    }

    /// Whether this drawable is a candidate for hiding what lies behind it.
    fn is_occluder(&self) -> bool {
        false
    }

    fn add_render_nodes(&self, renderer: &mut dyn SceneRenderer);

    fn add_shadow_nodes(&self, _renderer: &mut dyn SceneRenderer) {}

    fn add_light(&self, _renderer: &mut dyn SceneRenderer) {}

    fn render_radar(&self, _renderer: &mut dyn SceneRenderer) {}
}

/// True if the sphere lies entirely behind any of the inward-facing planes.
pub(crate) fn sphere_outside_planes(sphere: &BoundingSphere, planes: &[Plane3D]) -> bool {
    planes.iter().any(|plane| {
        let distance = plane.signed_distance(sphere.center);
        distance < 0.0 && distance * distance > sphere.radius_squared
    })
}
