//! Small glowing projectiles.

use std::cell::Cell;

use nalgebra::Point3;

use crate::bounds::{BoundingSphere, Extents};
use crate::drawable::{Drawable, GState, Light, OctreeState};
use crate::renderer::SceneRenderer;

/// A shot in flight: a small sprite that may light its surroundings.
#[derive(Debug, Clone)]
pub struct BoltNode {
    sphere: BoundingSphere,
    extents: Extents,
    gstate: GState,
    light: Option<Light>,
    octree_state: Cell<OctreeState>,
}

impl BoltNode {
    pub fn new(position: Point3<f32>, radius: f32, gstate: GState) -> Self {
        let sphere = BoundingSphere::new(position, radius);
        Self {
            extents: sphere.extents(),
            sphere,
            gstate,
            light: None,
            octree_state: Cell::new(OctreeState::Culled),
        }
    }

    /// Attaches a light that follows the bolt.
    pub fn with_light(mut self, color: [f32; 3]) -> Self {
        self.light = Some(Light::new(self.sphere.center, color));
        self
    }

    pub fn light(&self) -> Option<&Light> {
        self.light.as_ref()
    }
}

impl Drawable for BoltNode {
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

    fn add_light(&self, renderer: &mut dyn SceneRenderer) {
        if let Some(light) = &self.light {
            renderer.add_light(light);
        }
    }
}
