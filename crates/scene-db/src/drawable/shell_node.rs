//! Drawables wrapped in an alternate rendering style.

use std::cell::Cell;

use nalgebra::Point3;

use crate::bounds::{BoundingSphere, Extents};
use crate::drawable::{Drawable, GState, OctreeState};
use crate::renderer::SceneRenderer;

/// Renders another drawable's geometry with its own graphics state, seen
/// from either side.
///
/// Used for volumes the viewer can be inside of. A shell has no plane, so
/// it never partitions an ordered database.
#[derive(Debug)]
pub struct ShellNode {
    inner: Box<dyn Drawable>,
    gstate: GState,
    octree_state: Cell<OctreeState>,
}

impl ShellNode {
    pub fn new(inner: Box<dyn Drawable>, gstate: GState) -> Self {
        Self {
            inner,
            gstate,
            octree_state: Cell::new(OctreeState::Culled),
        }
    }

    pub fn inner(&self) -> &dyn Drawable {
        self.inner.as_ref()
    }
}

impl Drawable for ShellNode {
    fn sphere(&self) -> &BoundingSphere {
        self.inner.sphere()
    }

    fn extents(&self) -> &Extents {
        self.inner.extents()
    }

    fn gstate(&self) -> GState {
        self.gstate
    }

    fn is_double_sided(&self) -> bool {
        true
    }

    fn octree_state(&self) -> OctreeState {
        self.octree_state.get()
    }

    fn set_octree_state(&self, state: OctreeState) {
        self.octree_state.set(state);
    }

    fn in_axis_box(&self, extents: &Extents) -> bool {
        self.inner.in_axis_box(extents)
    }

    fn vertices(&self) -> &[Point3<f32>] {
        self.inner.vertices()
    }

    fn add_render_nodes(&self, renderer: &mut dyn SceneRenderer) {
        renderer.add_render_node(self, self.gstate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawable::PolygonNode;
    use crate::frustum::ViewFrustum;
    use crate::renderer::CollectingRenderer;
    use nalgebra::Vector3;

    fn make_shell() -> ShellNode {
        let wall = PolygonNode::wall(
            Point3::new(-5.0, 10.0, 0.0),
            Vector3::new(10.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, 5.0),
            GState(1),
        )
        .unwrap();
        ShellNode::new(Box::new(wall), GState(9))
    }

    #[test]
    fn shell_renders_with_own_state() {
        let shell = make_shell();
        let mut renderer = CollectingRenderer::new();

        shell.add_render_nodes(&mut renderer);

        assert_eq!(renderer.render_states(), vec![GState(9)]);
        assert_eq!(shell.vertices().len(), 4);
        assert!(shell.plane().is_none());
    }

    #[test]
    fn shell_is_visible_from_behind() {
        let shell = make_shell();
        let mut frustum = ViewFrustum::new();
        frustum.set_view(Point3::new(0.0, 20.0, 2.0), Point3::new(0.0, 10.0, 2.0));

        assert!(shell.inner().cull(&frustum), "Inner wall faces away");
        assert!(!shell.cull(&frustum));
    }
}
