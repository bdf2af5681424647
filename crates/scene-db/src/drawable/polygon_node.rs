//! Flat polygonal drawables: walls, mesh faces and their fragments.

use std::cell::Cell;

use nalgebra::{Point3, Vector3};

use crate::bounds::{BoundingSphere, Extents};
use crate::cuttable::{Cut, Cuttable};
use crate::drawable::{Drawable, GState, OctreeState};
use crate::error::GeometryError;
use crate::frustum::ViewFrustum;
use crate::intersect::test_polygon_in_axis_box;
use crate::plane::Plane3D;
use crate::polygon::Polygon;
use crate::renderer::SceneRenderer;

/// A convex polygon drawn with a single graphics state.
///
/// Walls are one-sided unless marked double sided: seen from behind their
/// plane they are culled.
#[derive(Debug, Clone)]
pub struct PolygonNode {
    polygon: Polygon,
    plane: Plane3D,
    sphere: BoundingSphere,
    extents: Extents,
    gstate: GState,
    double_sided: bool,
    occluder: bool,
    no_radar: bool,
    no_shadow: bool,
    octree_state: Cell<OctreeState>,
}

impl PolygonNode {
    /// Wraps a polygon, taking its plane from the vertex winding.
    pub fn new(polygon: Polygon, gstate: GState) -> Result<Self, GeometryError> {
        let plane = polygon.plane().ok_or(GeometryError::DegeneratePlane)?;
        Ok(Self::with_plane(polygon, plane, gstate))
    }

    /// Wraps a polygon with an explicit plane.
    ///
    /// Fragments keep their parent's plane rather than recomputing one from
    /// vertices that may have been pulled onto it by a cut.
    pub fn with_plane(polygon: Polygon, plane: Plane3D, gstate: GState) -> Self {
        let sphere = BoundingSphere::from_points(polygon.vertices());
        let extents = polygon.extents();
        Self {
            polygon,
            plane,
            sphere,
            extents,
            gstate,
            double_sided: false,
            occluder: false,
            no_radar: false,
            no_shadow: false,
            octree_state: Cell::new(OctreeState::Culled),
        }
    }

    /// A rectangular wall spanned by `u` and `v` from `origin`, facing `u × v`.
    pub fn wall(
        origin: Point3<f32>,
        u: Vector3<f32>,
        v: Vector3<f32>,
        gstate: GState,
    ) -> Result<Self, GeometryError> {
        Self::new(Polygon::quad(origin, u, v), gstate)
    }

    pub fn double_sided(mut self) -> Self {
        self.double_sided = true;
        self
    }

    /// Marks the node as able to hide what lies behind it.
    pub fn occluder(mut self) -> Self {
        self.occluder = true;
        self
    }

    pub fn without_radar(mut self) -> Self {
        self.no_radar = true;
        self
    }

    pub fn without_shadow(mut self) -> Self {
        self.no_shadow = true;
        self
    }

    pub fn polygon(&self) -> &Polygon {
        &self.polygon
    }

    /// A node for a piece of this one, with the same plane and style.
    fn fragment(&self, polygon: Polygon) -> PolygonNode {
        let mut node = Self::with_plane(polygon, self.plane, self.gstate);
        node.double_sided = self.double_sided;
        node.no_radar = self.no_radar;
        node.no_shadow = self.no_shadow;
        // Occluders are picked whole; a fragment would hide too little.
        node.occluder = false;
        node
    }
}

impl Drawable for PolygonNode {
    fn sphere(&self) -> &BoundingSphere {
        &self.sphere
    }

    fn extents(&self) -> &Extents {
        &self.extents
    }

    fn gstate(&self) -> GState {
        self.gstate
    }

    fn plane(&self) -> Option<&Plane3D> {
        Some(&self.plane)
    }

    fn is_double_sided(&self) -> bool {
        self.double_sided
    }

    fn octree_state(&self) -> OctreeState {
        self.octree_state.get()
    }

    fn set_octree_state(&self, state: OctreeState) {
        self.octree_state.set(state);
    }

    fn cull(&self, frustum: &ViewFrustum) -> bool {
        if !self.double_sided && self.plane.signed_distance(frustum.eye()) <= 0.0 {
            return true;
        }
        if self.octree_state.get() == OctreeState::Visible {
            return false;
        }

        let center = self.sphere.center;
        let radius_squared = self.sphere.radius_squared;
        let mut behind = Vec::new();
        for side in frustum.planes() {
            let distance = side.signed_distance(center);
            if distance < 0.0 {
                if distance * distance > radius_squared {
                    return true;
                }
                behind.push((side, distance * distance));
            }
        }

        // The polygon is flat, so the part of its sphere it can reach past a
        // side shrinks with the angle between the side and the polygon.
        behind.into_iter().any(|(side, distance_squared)| {
            let cos = side.normal().dot(&self.plane.normal());
            distance_squared > radius_squared * (1.0 - cos * cos)
        })
    }

    fn in_axis_box(&self, extents: &Extents) -> bool {
        self.extents.touches(extents)
            && test_polygon_in_axis_box(self.polygon.vertices(), &self.plane, extents)
    }

    fn vertices(&self) -> &[Point3<f32>] {
        self.polygon.vertices()
    }

    fn split(&self, plane: &Plane3D) -> Cut<Box<dyn Drawable>> {
        self.polygon
            .cut(plane)
            .map(|piece| Box::new(self.fragment(piece)) as Box<dyn Drawable>)
    }

    /// Squared distance from `eye` to the node's plane.
    fn distance(&self, eye: Point3<f32>) -> f32 {
        let distance = self.plane.signed_distance(eye);
        distance * distance
    }

    fn is_occluder(&self) -> bool {
        self.occluder
    }

    fn add_render_nodes(&self, renderer: &mut dyn SceneRenderer) {
        renderer.add_render_node(self, self.gstate);
    }

    fn add_shadow_nodes(&self, renderer: &mut dyn SceneRenderer) {
        if !self.no_shadow {
            renderer.add_shadow_node(self);
        }
    }

    fn render_radar(&self, renderer: &mut dyn SceneRenderer) {
        if !self.no_radar {
            renderer.add_radar_node(self);
        }
    }
}
