//! Unordered scene database for renderers with a depth buffer.

use nalgebra::Point3;

use crate::config::{RadarSortMode, SceneConfig};
use crate::database::{InsertResult, Ownership, SceneDatabase};
use crate::drawable::{Drawable, OctreeState};
use crate::frustum::ViewFrustum;
use crate::intersect::{test_axis_box_in_frustum, test_axis_box_occlusion, IntersectLevel};
use crate::octree::{OccluderManager, Octree, OctreeSettings};
use crate::renderer::SceneRenderer;
use crate::shadow::ShadowVolume;

/// What the current octree was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BuildStamp {
    settings: OctreeSettings,
    generation: u64,
}

/// Statics and dynamics in two plain lists, with an octree over the
/// statics for culling.
///
/// Output order is unspecified. The octree is rebuilt on demand whenever
/// the static list or the octree settings changed since the last build.
#[derive(Debug)]
pub struct FlatSceneDatabase {
    statics: Vec<Box<dyn Drawable>>,
    dynamics: Vec<Box<dyn Drawable>>,
    octree: Octree,
    stamp: Option<BuildStamp>,
    /// Bumped on every change to the static list.
    generation: u64,
    occluders: OccluderManager,
    config: SceneConfig,
}

impl Default for FlatSceneDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl FlatSceneDatabase {
    pub fn new() -> Self {
        Self::with_config(SceneConfig::default())
    }

    pub fn with_config(config: SceneConfig) -> Self {
        Self {
            statics: Vec::new(),
            dynamics: Vec::new(),
            octree: Octree::new(),
            stamp: None,
            generation: 0,
            occluders: OccluderManager::new(),
            config,
        }
    }

    /// The octree as of the last query or finalize; may be stale.
    pub fn octree(&self) -> &Octree {
        &self.octree
    }

    pub fn occluders(&self) -> &OccluderManager {
        &self.occluders
    }

    fn ensure_octree(&mut self) {
        let stamp = BuildStamp {
            settings: OctreeSettings::from(&self.config),
            generation: self.generation,
        };
        if self.stamp == Some(stamp) {
            return;
        }

        let mut order: Vec<usize> = (0..self.statics.len()).collect();
        order.sort_by(|&a, &b| {
            let a = self.statics[a].extents().mins.x;
            let b = self.statics[b].extents().mins.x;
            a.total_cmp(&b)
        });
        self.octree = Octree::build(&self.statics, &order, stamp.settings);
        self.occluders.clear();
        self.stamp = Some(stamp);
        log::debug!(
            "rebuilt octree over {} static nodes (depth {}, leaf size {})",
            self.statics.len(),
            stamp.settings.max_depth,
            stamp.settings.max_leaf_size,
        );
    }

    /// Statics the frustum may see, using occluders when configured.
    fn visible_statics(&mut self, frustum: &ViewFrustum) -> Vec<usize> {
        if self.config.cull_occluders == 0 {
            if !self.occluders.is_empty() {
                self.occluders.clear();
            }
            return self.octree.frustum_query(&self.statics, frustum);
        }
        self.occluders.set_max_occluders(self.config.cull_occluders);
        self.octree
            .occluded_frustum_query(&self.statics, frustum, &mut self.occluders)
    }
}

/// True if the eye sees the back of a one-sided planar drawable.
fn faces_away(drawable: &dyn Drawable, eye: Point3<f32>) -> bool {
    match drawable.plane() {
        Some(plane) => !drawable.is_double_sided() && plane.signed_distance(eye) <= 0.0,
        None => false,
    }
}

impl SceneDatabase for FlatSceneDatabase {
    /// Appends a static drawable. Nothing is ever split, so the result is
    /// always empty and `ownership` has no effect.
    fn add_static(&mut self, node: Box<dyn Drawable>, _ownership: Ownership) -> InsertResult {
        self.statics.push(node);
        self.generation += 1;
        InsertResult::default()
    }

    fn add_dynamic(&mut self, node: Box<dyn Drawable>) {
        self.dynamics.push(node);
    }

    /// Depth buffering draws compound bodies correctly whole.
    fn add_dynamic_compound(&mut self, node: Box<dyn Drawable>) {
        self.dynamics.push(node);
    }

    fn finalize_statics(&mut self) {
        self.ensure_octree();
    }

    fn remove_dynamics(&mut self) {
        self.dynamics.clear();
    }

    fn remove_all(&mut self) {
        self.statics.clear();
        self.dynamics.clear();
        self.octree.clear();
        self.occluders.clear();
        self.stamp = None;
        self.generation += 1;
    }

    /// Culling reads the eye from each frustum, so nothing is stored.
    fn set_eye(&mut self, _eye: Point3<f32>) {}

    fn set_config(&mut self, config: &SceneConfig) {
        self.config = config.clone();
    }

    fn is_ordered(&self) -> bool {
        false
    }

    fn static_count(&self) -> usize {
        self.statics.len()
    }

    fn dynamic_count(&self) -> usize {
        self.dynamics.len()
    }

    fn add_lights(&self, renderer: &mut dyn SceneRenderer) {
        for node in &self.dynamics {
            node.add_light(renderer);
        }
    }

    fn add_shadow_nodes(&mut self, renderer: &mut dyn SceneRenderer, shadow: &ShadowVolume) {
        self.ensure_octree();
        let found = self.octree.shadow_query(&self.statics, shadow.planes());
        for &index in &found {
            self.statics[index].add_shadow_nodes(renderer);
        }
        Octree::reset_states(&self.statics, &found);

        for node in &self.dynamics {
            if test_axis_box_occlusion(node.extents(), shadow.planes()) != IntersectLevel::Outside {
                node.add_shadow_nodes(renderer);
            }
        }
    }

    fn add_render_nodes(&mut self, renderer: &mut dyn SceneRenderer, frustum: &ViewFrustum) {
        self.ensure_octree();
        let eye = frustum.eye();
        let found = self.visible_statics(frustum);

        let mut emitted = 0;
        for &index in &found {
            let node = self.statics[index].as_ref();
            if faces_away(node, eye) {
                continue;
            }
            if node.octree_state() != OctreeState::Visible
                && test_axis_box_in_frustum(node.extents(), frustum) == IntersectLevel::Outside
            {
                continue;
            }
            node.add_render_nodes(renderer);
            emitted += 1;
        }
        Octree::reset_states(&self.statics, &found);
        log::trace!("rendered {emitted} of {} statics", self.statics.len());

        for node in &self.dynamics {
            if !node.cull(frustum) {
                node.add_render_nodes(renderer);
            }
        }
    }

    fn render_radar(&mut self, renderer: &mut dyn SceneRenderer, radar: &ViewFrustum) {
        self.ensure_octree();
        let mut found = self.octree.radar_query(&self.statics, radar);
        Octree::reset_states(&self.statics, &found);

        match self.config.radar_sort {
            RadarSortMode::Insertion => found.sort_unstable(),
            RadarSortMode::Height => found.sort_by(|&a, &b| {
                let a = self.statics[a].extents().maxs.z;
                let b = self.statics[b].extents().maxs.z;
                a.total_cmp(&b)
            }),
        }
        for index in found {
            self.statics[index].render_radar(renderer);
        }
    }
}
