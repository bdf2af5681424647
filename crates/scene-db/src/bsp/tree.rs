//! Ordered scene database built on a BSP tree.

use nalgebra::Point3;
use slotmap::SlotMap;

use crate::config::{RadarSortMode, SceneConfig};
use crate::cuttable::Cut;
use crate::database::{InsertResult, Ownership, SceneDatabase};
use crate::drawable::Drawable;
use crate::frustum::ViewFrustum;
use crate::intersect::{test_axis_box_in_frustum_2d, test_axis_box_occlusion, IntersectLevel};
use crate::renderer::SceneRenderer;
use crate::shadow::ShadowVolume;

use super::node::{BspNode, NodeKey, Side};

/// A scene database that emits drawables in back-to-front order.
///
/// Static drawables with a plane partition space as they are inserted:
/// each one is cut by the planes of the nodes it passes, and the pieces
/// are stored on either side. Traversal from any eye point then visits the
/// far side of every plane first, which is what a renderer without a depth
/// buffer needs.
///
/// # Static drawables without a plane
///
/// These cannot partition anything. They are queued and folded into the
/// finished tree by [`SceneDatabase::finalize_statics`], or on the first
/// dynamic insertion or traversal after the statics were added.
///
/// # Dynamic drawables
///
/// Dynamic drawables are placed by the side of the static planes their
/// centers lie on, and among each other by distance from the eye set with
/// [`SceneDatabase::set_eye`]. They are never cut and never partition
/// later insertions. All of them are dropped by
/// [`SceneDatabase::remove_dynamics`].
#[derive(Debug)]
pub struct BspSceneDatabase {
    nodes: SlotMap<NodeKey, BspNode>,
    root: Option<NodeKey>,
    pending: Vec<Box<dyn Drawable>>,
    eye: Point3<f32>,
    depth: usize,
    static_count: usize,
    dynamic_count: usize,
    config: SceneConfig,
}

impl Default for BspSceneDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl BspSceneDatabase {
    pub fn new() -> Self {
        Self::with_config(SceneConfig::default())
    }

    pub fn with_config(config: SceneConfig) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root: None,
            pending: Vec::new(),
            eye: Point3::origin(),
            depth: 0,
            static_count: 0,
            dynamic_count: 0,
            config,
        }
    }

    /// Returns `true` if the database holds no drawables.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none() && self.pending.is_empty()
    }

    #[inline]
    pub fn root(&self) -> Option<&BspNode> {
        self.root.and_then(|key| self.nodes.get(key))
    }

    #[inline]
    pub fn node(&self, key: NodeKey) -> Option<&BspNode> {
        self.nodes.get(key)
    }

    /// Number of nodes in the tree, not counting queued statics.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the maximum depth of the tree (0 for empty tree).
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn eye(&self) -> Point3<f32> {
        self.eye
    }

    fn note_depth(&mut self, depth: usize) {
        self.depth = self.depth.max(depth);
    }

    fn insert_root(&mut self, drawable: Box<dyn Drawable>, dynamic: bool) {
        self.root = Some(self.nodes.insert(BspNode::new(drawable, dynamic)));
        self.note_depth(1);
    }

    /// Recursively inserts a static drawable below `at`, cutting it by
    /// every partitioning plane it spans.
    ///
    /// `original` is set while `drawable` is still the caller's node, so a
    /// cut can report what happened to it.
    fn insert_static(
        &mut self,
        at: NodeKey,
        level: usize,
        drawable: Box<dyn Drawable>,
        original: Option<Ownership>,
        result: &mut InsertResult,
    ) {
        let cut = match self.nodes[at].drawable().plane() {
            Some(plane) => drawable.split(plane),
            None => match unpartitioned_side(self.nodes[at].drawable(), drawable.as_ref()) {
                Side::Front => Cut::Front,
                Side::Back => Cut::Back,
            },
        };

        match cut {
            Cut::Front => self.place_static(at, Side::Front, level, drawable, original, result),
            Cut::Back => self.place_static(at, Side::Back, level, drawable, original, result),
            Cut::Split { front, back } => {
                result.fragments_created = true;
                if let Some(ownership) = original {
                    result.original_would_be_freed = true;
                    if ownership == Ownership::Caller {
                        result.original = Some(drawable);
                    }
                }
                log::trace!("static node split at depth {level}");
                self.place_static(at, Side::Front, level, front, None, result);
                self.place_static(at, Side::Back, level, back, None, result);
            }
        }
    }

    fn place_static(
        &mut self,
        at: NodeKey,
        side: Side,
        level: usize,
        drawable: Box<dyn Drawable>,
        original: Option<Ownership>,
        result: &mut InsertResult,
    ) {
        self.nodes[at].increment_count();
        match self.nodes[at].child(side) {
            Some(child) => self.insert_static(child, level + 1, drawable, original, result),
            None => {
                let key = self.nodes.insert(BspNode::new(drawable, false));
                self.nodes[at].set_child(side, Some(key));
                self.static_count += 1;
                self.note_depth(level + 1);
            }
        }
    }

    /// Moves queued plane-less statics into the tree.
    fn fold_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.pending);
        log::debug!("folding {} plane-less static nodes into BSP tree", pending.len());
        for drawable in pending {
            self.insert_unpartitioned(drawable);
        }
    }

    fn insert_unpartitioned(&mut self, drawable: Box<dyn Drawable>) {
        self.static_count += 1;
        let Some(mut at) = self.root else {
            self.insert_root(drawable, false);
            return;
        };
        let mut level = 1;
        loop {
            let side = match self.nodes[at].drawable().plane() {
                Some(plane) if plane.signed_distance(drawable.sphere().center) < 0.0 => Side::Back,
                Some(_) => Side::Front,
                None => unpartitioned_side(self.nodes[at].drawable(), drawable.as_ref()),
            };
            self.nodes[at].increment_count();
            match self.nodes[at].child(side) {
                Some(child) => {
                    at = child;
                    level += 1;
                }
                None => {
                    let key = self.nodes.insert(BspNode::new(drawable, false));
                    self.nodes[at].set_child(side, Some(key));
                    self.note_depth(level + 1);
                    return;
                }
            }
        }
    }

    fn insert_dynamic(&mut self, drawable: Box<dyn Drawable>) {
        self.fold_pending();
        self.dynamic_count += 1;
        let eye = self.eye;
        let Some(mut at) = self.root else {
            self.insert_root(drawable, true);
            return;
        };
        let mut level = 1;
        loop {
            let node = &self.nodes[at];
            let distance = match node.drawable().plane() {
                Some(plane) if node.partitions() => plane.signed_distance(drawable.sphere().center),
                _ => node.drawable().distance(eye) - drawable.distance(eye),
            };
            // Ties go in front so equally distant nodes draw in insertion order.
            let side = if distance >= 0.0 { Side::Front } else { Side::Back };
            match node.child(side) {
                Some(child) => {
                    at = child;
                    level += 1;
                }
                None => {
                    let key = self.nodes.insert(BspNode::new(drawable, true));
                    self.nodes[at].set_child(side, Some(key));
                    self.note_depth(level + 1);
                    return;
                }
            }
        }
    }

    fn remove_dynamic_children(&mut self, key: NodeKey) {
        for side in [Side::Front, Side::Back] {
            let Some(child) = self.nodes[key].child(side) else {
                continue;
            };
            if self.nodes[child].is_dynamic() {
                self.release(child);
                self.nodes[key].set_child(side, None);
            } else {
                self.remove_dynamic_children(child);
            }
        }
    }

    /// Drops a subtree.
    fn release(&mut self, key: NodeKey) {
        if let Some(node) = self.nodes.remove(key) {
            for child in [node.front(), node.back()].into_iter().flatten() {
                self.release(child);
            }
        }
    }

    fn subtree_depth(&self, key: Option<NodeKey>) -> usize {
        key.map_or(0, |key| {
            let node = &self.nodes[key];
            1 + self.subtree_depth(node.front()).max(self.subtree_depth(node.back()))
        })
    }

    /// Children of `node` in drawing order: farther side first.
    fn drawing_order(node: &BspNode, eye: Point3<f32>) -> [Option<NodeKey>; 2] {
        match node.drawable().plane() {
            Some(plane) if node.partitions() && plane.signed_distance(eye) < 0.0 => {
                [node.front(), node.back()]
            }
            _ => [node.back(), node.front()],
        }
    }

    fn render_subtree(&self, key: NodeKey, frustum: &ViewFrustum, renderer: &mut dyn SceneRenderer) {
        let node = &self.nodes[key];
        let [first, second] = Self::drawing_order(node, frustum.eye());

        if let Some(first) = first {
            self.render_subtree(first, frustum, renderer);
        }
        if !node.drawable().cull(frustum) {
            node.drawable().add_render_nodes(renderer);
        }
        if let Some(second) = second {
            self.render_subtree(second, frustum, renderer);
        }
    }

    /// Visits every node, parents before children.
    fn for_each_node<'a>(&'a self, key: Option<NodeKey>, visit: &mut impl FnMut(&'a BspNode)) {
        if let Some(key) = key {
            let node = &self.nodes[key];
            visit(node);
            self.for_each_node(node.back(), visit);
            self.for_each_node(node.front(), visit);
        }
    }
}

/// Side of an unpartitioned node that a static drawable goes to.
///
/// Larger drawables go behind so they are drawn first.
fn unpartitioned_side(at: &dyn Drawable, drawable: &dyn Drawable) -> Side {
    if drawable.sphere().radius_squared > at.sphere().radius_squared {
        Side::Back
    } else {
        Side::Front
    }
}

impl SceneDatabase for BspSceneDatabase {
    /// Inserts a static drawable, cutting it where it spans stored planes.
    ///
    /// Adding statics while dynamic drawables are present removes the
    /// dynamics first, since statics may not be placed under them.
    fn add_static(&mut self, node: Box<dyn Drawable>, ownership: Ownership) -> InsertResult {
        if self.dynamic_count > 0 {
            log::warn!("static node added while dynamic nodes are present, removing dynamics");
            self.remove_dynamics();
        }

        let mut result = InsertResult::default();
        if node.plane().is_none() {
            self.pending.push(node);
            return result;
        }
        match self.root {
            None => {
                self.static_count += 1;
                self.insert_root(node, false);
            }
            Some(root) => self.insert_static(root, 1, node, Some(ownership), &mut result),
        }
        result
    }

    fn add_dynamic(&mut self, node: Box<dyn Drawable>) {
        self.insert_dynamic(node);
    }

    fn add_dynamic_compound(&mut self, node: Box<dyn Drawable>) {
        match node.parts() {
            Some(parts) => {
                for part in parts {
                    self.insert_dynamic(part);
                }
            }
            None => self.insert_dynamic(node),
        }
    }

    fn finalize_statics(&mut self) {
        self.fold_pending();
        log::debug!(
            "BSP scene database holds {} static nodes, depth {}",
            self.static_count,
            self.depth
        );
    }

    fn remove_dynamics(&mut self) {
        if self.dynamic_count == 0 {
            return;
        }
        if let Some(root) = self.root {
            if self.nodes[root].is_dynamic() {
                self.release(root);
                self.root = None;
            } else {
                self.remove_dynamic_children(root);
            }
        }
        self.dynamic_count = 0;
        self.depth = self.subtree_depth(self.root);
    }

    fn remove_all(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.pending.clear();
        self.depth = 0;
        self.static_count = 0;
        self.dynamic_count = 0;
    }

    fn set_eye(&mut self, eye: Point3<f32>) {
        self.eye = eye;
    }

    fn set_config(&mut self, config: &SceneConfig) {
        self.config = config.clone();
    }

    fn is_ordered(&self) -> bool {
        true
    }

    fn static_count(&self) -> usize {
        self.static_count + self.pending.len()
    }

    fn dynamic_count(&self) -> usize {
        self.dynamic_count
    }

    fn add_lights(&self, renderer: &mut dyn SceneRenderer) {
        for node in self.nodes.values().filter(|node| node.is_dynamic()) {
            node.drawable().add_light(renderer);
        }
    }

    fn add_shadow_nodes(&mut self, renderer: &mut dyn SceneRenderer, shadow: &ShadowVolume) {
        self.fold_pending();
        self.for_each_node(self.root, &mut |node| {
            let drawable = node.drawable();
            if test_axis_box_occlusion(drawable.extents(), shadow.planes()) != IntersectLevel::Outside {
                drawable.add_shadow_nodes(renderer);
            }
        });
    }

    fn add_render_nodes(&mut self, renderer: &mut dyn SceneRenderer, frustum: &ViewFrustum) {
        self.fold_pending();
        if let Some(root) = self.root {
            self.render_subtree(root, frustum, renderer);
        }
    }

    fn render_radar(&mut self, renderer: &mut dyn SceneRenderer, radar: &ViewFrustum) {
        self.fold_pending();
        let mut visible: Vec<&dyn Drawable> = Vec::new();
        self.for_each_node(self.root, &mut |node| {
            let drawable = node.drawable();
            if !node.is_dynamic()
                && test_axis_box_in_frustum_2d(drawable.extents(), radar) != IntersectLevel::Outside
            {
                visible.push(drawable);
            }
        });
        if self.config.radar_sort == RadarSortMode::Height {
            visible.sort_by(|a, b| a.extents().maxs.z.total_cmp(&b.extents().maxs.z));
        }
        for drawable in visible {
            drawable.render_radar(renderer);
        }
    }
}
