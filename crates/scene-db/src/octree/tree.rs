use nalgebra::Point3;

use crate::bounds::Extents;
use crate::config::SceneConfig;
use crate::drawable::{Drawable, OctreeState};
use crate::frustum::ViewFrustum;
use crate::intersect::{
    test_axis_box_in_frustum, test_axis_box_in_frustum_2d, test_axis_box_occlusion,
    IntersectLevel,
};
use crate::plane::Plane3D;

use super::occluder::OcclusionCuller;

/// Branch cells keep their element list every this many levels.
pub const FULL_LIST_BREAK: u32 = 3;

/// Elements are matched against cell bounds grown by this much.
const CELL_PUFF: f32 = 0.1;

/// Subdivision limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OctreeSettings {
    pub max_depth: u32,
    pub max_leaf_size: usize,
}

impl Default for OctreeSettings {
    fn default() -> Self {
        Self {
            max_depth: 6,
            max_leaf_size: 16,
        }
    }
}

impl From<&SceneConfig> for OctreeSettings {
    fn from(config: &SceneConfig) -> Self {
        Self {
            max_depth: config.octree_max_depth,
            max_leaf_size: config.octree_max_leaf_size.max(1),
        }
    }
}

/// Counts gathered while building.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OctreeStats {
    pub elements: usize,
    pub total_cells: usize,
    pub leaf_cells: usize,
    /// Sum of list lengths over every cell that keeps a list.
    pub listed_elements: usize,
}

#[derive(Debug)]
struct OctreeCell {
    level: u32,
    /// Tight bounds of the contents, clipped to the cell.
    extents: Extents,
    /// Elements intersecting the cell, whether or not the list is kept.
    count: usize,
    children: Vec<usize>,
    /// Empty on branches that dropped their list.
    elements: Vec<usize>,
    keeps_list: bool,
}

impl OctreeCell {
    fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Bounding-volume hierarchy over a static drawable list.
///
/// The tree stores indices into the list it was built from; every query must
/// be handed that same list. Queries report an element only if its cached
/// [`OctreeState`] is `Culled` on entry and leave the state set, so callers
/// reset the states with [`Octree::reset_states`] once done with the results.
#[derive(Debug, Default)]
pub struct Octree {
    cells: Vec<OctreeCell>,
    root: Option<usize>,
    stats: OctreeStats,
}

/// Decides how a query treats cells and the elements of partial leaves.
trait CellTest {
    fn test_cell(&mut self, extents: &Extents, count: usize) -> IntersectLevel;

    fn test_element(&self, extents: &Extents) -> IntersectLevel;
}

struct FrustumTest<'a>(&'a ViewFrustum);

impl CellTest for FrustumTest<'_> {
    fn test_cell(&mut self, extents: &Extents, _count: usize) -> IntersectLevel {
        test_axis_box_in_frustum(extents, self.0)
    }

    fn test_element(&self, extents: &Extents) -> IntersectLevel {
        test_axis_box_in_frustum(extents, self.0)
    }
}

struct OccludedTest<'a> {
    frustum: &'a ViewFrustum,
    culler: &'a mut dyn OcclusionCuller,
}

impl CellTest for OccludedTest<'_> {
    fn test_cell(&mut self, extents: &Extents, count: usize) -> IntersectLevel {
        let level = test_axis_box_in_frustum(extents, self.frustum);
        if level == IntersectLevel::Outside {
            return level;
        }
        if self.culler.occlude(extents, count) == IntersectLevel::Contained {
            return IntersectLevel::Outside;
        }
        level
    }

    fn test_element(&self, extents: &Extents) -> IntersectLevel {
        test_axis_box_in_frustum(extents, self.frustum)
    }
}

struct ShadowTest<'a>(&'a [Plane3D]);

impl CellTest for ShadowTest<'_> {
    fn test_cell(&mut self, extents: &Extents, _count: usize) -> IntersectLevel {
        test_axis_box_occlusion(extents, self.0)
    }

    fn test_element(&self, extents: &Extents) -> IntersectLevel {
        test_axis_box_occlusion(extents, self.0)
    }
}

struct RadarTest<'a>(&'a ViewFrustum);

impl CellTest for RadarTest<'_> {
    fn test_cell(&mut self, extents: &Extents, _count: usize) -> IntersectLevel {
        test_axis_box_in_frustum_2d(extents, self.0)
    }

    fn test_element(&self, extents: &Extents) -> IntersectLevel {
        test_axis_box_in_frustum_2d(extents, self.0)
    }
}

impl Octree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the tree over `nodes`, inserting them in the sequence given by
    /// `order` (indices into `nodes`).
    ///
    /// Every element's state is reset to `Culled`.
    pub fn build(nodes: &[Box<dyn Drawable>], order: &[usize], settings: OctreeSettings) -> Self {
        let mut octree = Self::new();
        for node in nodes {
            node.set_octree_state(OctreeState::Culled);
        }
        if order.is_empty() {
            return octree;
        }

        let bounds = cubic_bounds(nodes, order);
        octree.stats.elements = order.len();
        octree.root = octree.build_cell(nodes, settings, 0, bounds, order);

        log::debug!(
            "octree built: {} elements, {} cells, {} leaves, {} listed, root {:?}",
            octree.stats.elements,
            octree.stats.total_cells,
            octree.stats.leaf_cells,
            octree.stats.listed_elements,
            octree.root_extents(),
        );
        octree
    }

    fn build_cell(
        &mut self,
        nodes: &[Box<dyn Drawable>],
        settings: OctreeSettings,
        level: u32,
        bounds: Extents,
        candidates: &[usize],
    ) -> Option<usize> {
        let test_box = bounds.puffed(CELL_PUFF);
        let elements: Vec<usize> = candidates
            .iter()
            .copied()
            .filter(|&index| nodes[index].in_axis_box(&test_box))
            .collect();
        if elements.is_empty() && level > 0 {
            return None;
        }

        let mut extents = Extents::empty();
        for &index in &elements {
            extents.expand_to_extents(nodes[index].extents());
        }
        let extents = extents.intersection(&test_box);
        let count = elements.len();
        self.stats.total_cells += 1;

        if level >= settings.max_depth || count <= settings.max_leaf_size {
            self.stats.leaf_cells += 1;
            self.stats.listed_elements += count;
            return Some(self.push_cell(OctreeCell {
                level,
                extents,
                count,
                children: Vec::new(),
                elements,
                keeps_list: true,
            }));
        }

        let children: Vec<usize> = (0..8)
            .filter_map(|octant| {
                let child_bounds = octant_bounds(&bounds, octant);
                self.build_cell(nodes, settings, level + 1, child_bounds, &elements)
            })
            .collect();

        let keeps_list = level % FULL_LIST_BREAK == 1;
        if keeps_list {
            self.stats.listed_elements += count;
        }
        Some(self.push_cell(OctreeCell {
            level,
            extents,
            count,
            children,
            elements: if keeps_list { elements } else { Vec::new() },
            keeps_list,
        }))
    }

    fn push_cell(&mut self, cell: OctreeCell) -> usize {
        self.cells.push(cell);
        self.cells.len() - 1
    }

    /// Elements that may be inside `frustum`.
    pub fn frustum_query(&self, nodes: &[Box<dyn Drawable>], frustum: &ViewFrustum) -> Vec<usize> {
        self.run_query(nodes, &mut FrustumTest(frustum))
    }

    /// Frustum query that also skips cells hidden by the culler's occluders.
    ///
    /// The culler is updated for the frustum's eye before the walk and
    /// handed the results afterwards to pick next frame's occluders.
    pub fn occluded_frustum_query(
        &self,
        nodes: &[Box<dyn Drawable>],
        frustum: &ViewFrustum,
        culler: &mut dyn OcclusionCuller,
    ) -> Vec<usize> {
        culler.update(frustum);
        let visible = self.run_query(nodes, &mut OccludedTest { frustum, culler: &mut *culler });
        culler.select(nodes, &visible);
        visible
    }

    /// Elements inside a shadow volume; no planes selects everything.
    pub fn shadow_query(&self, nodes: &[Box<dyn Drawable>], planes: &[Plane3D]) -> Vec<usize> {
        self.run_query(nodes, &mut ShadowTest(planes))
    }

    /// Elements inside the frustum's vertical planes, regardless of height.
    pub fn radar_query(&self, nodes: &[Box<dyn Drawable>], frustum: &ViewFrustum) -> Vec<usize> {
        self.run_query(nodes, &mut RadarTest(frustum))
    }

    /// Returns queried elements to `Culled`.
    pub fn reset_states(nodes: &[Box<dyn Drawable>], indices: &[usize]) {
        for &index in indices {
            nodes[index].set_octree_state(OctreeState::Culled);
        }
    }

    fn run_query(&self, nodes: &[Box<dyn Drawable>], test: &mut dyn CellTest) -> Vec<usize> {
        let mut found = Vec::new();
        if let Some(root) = self.root {
            self.query_cell(root, nodes, test, &mut found);
        }
        log::trace!("octree query found {} of {}", found.len(), self.stats.elements);
        found
    }

    fn query_cell(
        &self,
        index: usize,
        nodes: &[Box<dyn Drawable>],
        test: &mut dyn CellTest,
        found: &mut Vec<usize>,
    ) {
        let cell = &self.cells[index];
        match test.test_cell(&cell.extents, cell.count) {
            IntersectLevel::Outside => {}
            IntersectLevel::Contained => self.grab_all(index, nodes, found),
            IntersectLevel::Partial if cell.is_leaf() => {
                for &element in &cell.elements {
                    let node = &nodes[element];
                    if node.octree_state() != OctreeState::Culled {
                        continue;
                    }
                    let state = match test.test_element(node.extents()) {
                        IntersectLevel::Outside => continue,
                        IntersectLevel::Partial => OctreeState::Partial,
                        IntersectLevel::Contained => OctreeState::Visible,
                    };
                    node.set_octree_state(state);
                    found.push(element);
                }
            }
            IntersectLevel::Partial => {
                for &child in &cell.children {
                    self.query_cell(child, nodes, test, found);
                }
            }
        }
    }

    fn grab_all(&self, index: usize, nodes: &[Box<dyn Drawable>], found: &mut Vec<usize>) {
        let cell = &self.cells[index];
        if !cell.keeps_list {
            for &child in &cell.children {
                self.grab_all(child, nodes, found);
            }
            return;
        }
        for &element in &cell.elements {
            let node = &nodes[element];
            if node.octree_state() == OctreeState::Culled {
                found.push(element);
            }
            node.set_octree_state(OctreeState::Visible);
        }
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.root = None;
        self.stats = OctreeStats::default();
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    #[inline]
    pub fn stats(&self) -> OctreeStats {
        self.stats
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Deepest level any cell reached.
    pub fn depth(&self) -> u32 {
        self.cells.iter().map(|cell| cell.level).max().unwrap_or(0)
    }

    /// Tight bounds of the root cell.
    pub fn root_extents(&self) -> Option<Extents> {
        self.root.map(|root| self.cells[root].extents)
    }
}

/// Bounds of all elements, grown into a cube. X and Y grow evenly about
/// their middle; Z grows upward from its minimum.
fn cubic_bounds(nodes: &[Box<dyn Drawable>], order: &[usize]) -> Extents {
    let mut bounds = Extents::empty();
    for &index in order {
        bounds.expand_to_extents(nodes[index].extents());
    }
    let size = bounds.size();
    let width = size.x.max(size.y).max(size.z);
    for axis in 0..2 {
        let adjust = 0.5 * (width - size[axis]);
        bounds.mins[axis] -= adjust;
        bounds.maxs[axis] += adjust;
    }
    bounds.maxs.z = bounds.mins.z + width;
    bounds
}

/// One eighth of `bounds`. Bit `axis` of `octant` selects the upper half
/// along that axis.
fn octant_bounds(bounds: &Extents, octant: usize) -> Extents {
    let center = bounds.center();
    let mut mins = Point3::origin();
    let mut maxs = Point3::origin();
    for axis in 0..3 {
        if octant & (1 << axis) == 0 {
            mins[axis] = bounds.mins[axis];
            maxs[axis] = center[axis];
        } else {
            mins[axis] = center[axis];
            maxs[axis] = bounds.maxs[axis];
        }
    }
    Extents::new(mins, maxs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawable::{GState, PolygonNode};
    use crate::octree::OccluderManager;
    use crate::test_support::make_cube;
    use nalgebra::Vector3;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::HashSet;

    fn make_nodes(centers: &[[f32; 3]]) -> Vec<Box<dyn Drawable>> {
        centers
            .iter()
            .enumerate()
            .map(|(id, center)| Box::new(make_cube(*center, id as u32)) as Box<dyn Drawable>)
            .collect()
    }

    fn make_random_cubes(count: usize, seed: u64) -> Vec<Box<dyn Drawable>> {
        let mut rng = StdRng::seed_from_u64(seed);
        let centers: Vec<[f32; 3]> = (0..count)
            .map(|_| {
                [
                    rng.random_range(0.0..100.0),
                    rng.random_range(0.0..100.0),
                    rng.random_range(0.0..100.0),
                ]
            })
            .collect();
        make_nodes(&centers)
    }

    /// Six inward-facing planes around `region`.
    fn make_box_frustum(region: &Extents) -> ViewFrustum {
        let mut planes = Vec::new();
        for axis in 0..3 {
            let normal = Vector3::ith(axis, 1.0);
            planes.push(Plane3D::new(normal, region.mins[axis]));
            planes.push(Plane3D::new(-normal, -region.maxs[axis]));
        }
        ViewFrustum::from_planes(region.center(), Vector3::y(), planes)
    }

    fn build_all(nodes: &[Box<dyn Drawable>], settings: OctreeSettings) -> Octree {
        let order: Vec<usize> = (0..nodes.len()).collect();
        Octree::build(nodes, &order, settings)
    }

    #[test]
    fn empty_octree_finds_nothing() {
        let octree = Octree::build(&[], &[], OctreeSettings::default());

        assert!(octree.is_empty());
        assert!(octree.frustum_query(&[], &ViewFrustum::new()).is_empty());
        assert!(octree.root_extents().is_none());
    }

    #[test]
    fn small_list_is_single_leaf() {
        let nodes = make_nodes(&[[0.0, 0.0, 0.0], [5.0, 5.0, 5.0]]);
        let octree = build_all(&nodes, OctreeSettings::default());
        let stats = octree.stats();

        assert_eq!(stats.total_cells, 1);
        assert_eq!(stats.leaf_cells, 1);
        assert_eq!(stats.listed_elements, 2);
        assert_eq!(octree.depth(), 0);
    }

    #[test]
    fn random_cubes_in_one_octant() {
        let nodes = make_random_cubes(1000, 42);
        let octree = build_all(
            &nodes,
            OctreeSettings {
                max_depth: 6,
                max_leaf_size: 16,
            },
        );
        let region = Extents::new(Point3::origin(), Point3::new(50.0, 50.0, 50.0));
        let frustum = make_box_frustum(&region);

        let found = octree.frustum_query(&nodes, &frustum);
        let found_set: HashSet<usize> = found.iter().copied().collect();

        assert!(octree.stats().leaf_cells > 1);
        assert_eq!(found.len(), found_set.len(), "No element is reported twice");
        for (index, node) in nodes.iter().enumerate() {
            if node.extents().touches(&region) {
                assert!(found_set.contains(&index), "Missed element {index}");
            }
        }
        let loose = region.puffed(1.5);
        for &index in &found {
            assert!(
                nodes[index].extents().touches(&loose),
                "Element {index} is nowhere near the region"
            );
        }
    }

    #[test]
    fn contained_cells_mark_elements_visible() {
        let nodes = make_random_cubes(200, 7);
        let octree = build_all(
            &nodes,
            OctreeSettings {
                max_depth: 4,
                max_leaf_size: 4,
            },
        );
        let everything = Extents::new(Point3::new(-10.0, -10.0, -10.0), Point3::new(110.0, 110.0, 110.0));

        let found = octree.frustum_query(&nodes, &make_box_frustum(&everything));

        assert_eq!(found.len(), nodes.len());
        assert!(nodes.iter().all(|node| node.octree_state() == OctreeState::Visible));

        Octree::reset_states(&nodes, &found);
        assert!(nodes.iter().all(|node| node.octree_state() == OctreeState::Culled));
    }

    #[test]
    fn shadow_query_without_planes_selects_all() {
        let nodes = make_random_cubes(50, 3);
        let octree = build_all(&nodes, OctreeSettings::default());

        let found = octree.shadow_query(&nodes, &[]);

        assert_eq!(found.len(), nodes.len());
    }

    #[test]
    fn shadow_query_clips_by_plane() {
        let nodes = make_nodes(&[[0.0, 0.0, 0.0], [10.0, 0.0, 0.0], [20.0, 0.0, 0.0]]);
        let octree = build_all(
            &nodes,
            OctreeSettings {
                max_depth: 3,
                max_leaf_size: 1,
            },
        );
        let plane = Plane3D::new(Vector3::x(), 5.0);

        let mut found = octree.shadow_query(&nodes, &[plane]);
        found.sort_unstable();

        assert_eq!(found, vec![1, 2]);
    }

    #[test]
    fn radar_query_ignores_height() {
        let nodes = make_nodes(&[[0.0, 0.0, 0.0], [0.0, 0.0, 500.0], [40.0, 0.0, 0.0]]);
        let octree = build_all(
            &nodes,
            OctreeSettings {
                max_depth: 4,
                max_leaf_size: 1,
            },
        );
        let planes = vec![
            Plane3D::new(Vector3::x(), -5.0),
            Plane3D::new(-Vector3::x(), -5.0),
            Plane3D::new(Vector3::y(), -5.0),
            Plane3D::new(-Vector3::y(), -5.0),
        ];
        let radar = ViewFrustum::from_planes(Point3::origin(), Vector3::y(), planes);

        let mut found = octree.radar_query(&nodes, &radar);
        found.sort_unstable();

        assert_eq!(found, vec![0, 1]);
    }

    #[test]
    fn occluder_hides_cell_behind_it() {
        let wall = PolygonNode::wall(
            Point3::new(-1.0, 10.0, -1.0),
            Vector3::new(2.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, 2.0),
            GState(0),
        )
        .unwrap()
        .occluder();
        let nodes: Vec<Box<dyn Drawable>> =
            vec![Box::new(wall), Box::new(make_cube([0.0, 30.0, 0.0], 1))];
        let octree = build_all(
            &nodes,
            OctreeSettings {
                max_depth: 4,
                max_leaf_size: 1,
            },
        );
        let frustum = ViewFrustum::new();
        let mut manager = OccluderManager::seeded(11);
        manager.set_max_occluders(2);

        let first = octree.occluded_frustum_query(&nodes, &frustum, &mut manager);
        Octree::reset_states(&nodes, &first);
        let second = octree.occluded_frustum_query(&nodes, &frustum, &mut manager);

        assert_eq!(first.len(), 2, "No occluders exist on the first frame");
        assert_eq!(second, vec![0]);
    }

    #[test]
    fn settings_follow_config() {
        let config = SceneConfig {
            octree_max_depth: 3,
            octree_max_leaf_size: 0,
            ..SceneConfig::default()
        };

        let settings = OctreeSettings::from(&config);

        assert_eq!(settings.max_depth, 3);
        assert_eq!(settings.max_leaf_size, 1);
    }
}
