//! Shared fixtures for unit tests.

use std::cell::Cell;

use nalgebra::{Point3, Vector3};

use crate::bounds::{BoundingSphere, Extents};
use crate::drawable::{Drawable, GState, OctreeState, PolygonNode};
use crate::renderer::SceneRenderer;

/// An axis-aligned box drawable with no plane.
#[derive(Debug)]
pub struct CubeNode {
    sphere: BoundingSphere,
    extents: Extents,
    gstate: GState,
    octree_state: Cell<OctreeState>,
}

impl CubeNode {
    pub fn new(center: Point3<f32>, size: f32, gstate: GState) -> Self {
        let half = Vector3::repeat(size * 0.5);
        let extents = Extents::new(center - half, center + half);
        Self {
            sphere: BoundingSphere::new(center, half.norm()),
            extents,
            gstate,
            octree_state: Cell::new(OctreeState::Culled),
        }
    }
}

impl Drawable for CubeNode {
    fn sphere(&self) -> &BoundingSphere {
        &self.sphere
    }

    fn extents(&self) -> &Extents {
        &self.extents
    }

    fn gstate(&self) -> GState {
        self.gstate
    }

    fn octree_state(&self) -> OctreeState {
        self.octree_state.get()
    }

    fn set_octree_state(&self, state: OctreeState) {
        self.octree_state.set(state);
    }

    fn add_render_nodes(&self, renderer: &mut dyn SceneRenderer) {
        renderer.add_render_node(self, self.gstate);
    }

    fn add_shadow_nodes(&self, renderer: &mut dyn SceneRenderer) {
        renderer.add_shadow_node(self);
    }

    fn render_radar(&self, renderer: &mut dyn SceneRenderer) {
        renderer.add_radar_node(self);
    }
}

/// Unit cube centered at `center`, tagged with `GState(id)`.
pub fn make_cube(center: [f32; 3], id: u32) -> CubeNode {
    CubeNode::new(Point3::from(center), 1.0, GState(id))
}

/// Double-sided 10 x 5 wall in the plane y = `y`, facing -y.
pub fn make_wall(y: f32, id: u32) -> PolygonNode {
    PolygonNode::wall(
        Point3::new(-5.0, y, 0.0),
        Vector3::new(10.0, 0.0, 0.0),
        Vector3::new(0.0, 0.0, 5.0),
        GState(id),
    )
    .unwrap()
    .double_sided()
}
