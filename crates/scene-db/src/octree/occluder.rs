//! Occlusion culling with a handful of large static polygons.
//!
//! Each frame a few visible static drawables flagged as occluders are
//! turned into view volumes: the region behind the polygon, bounded by
//! planes through the eye and each of its edges. Octree cells inside such a
//! volume are skipped. Occluders earn score for every element they hide;
//! weak ones are retired and random new candidates tried.

use nalgebra::Point3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::bounds::Extents;
use crate::drawable::Drawable;
use crate::frustum::ViewFrustum;
use crate::intersect::{test_axis_box_occlusion, IntersectLevel};
use crate::plane::Plane3D;

/// Upper limit on tracked occluders.
pub const MAX_OCCLUDERS: usize = 8;

/// Eyes closer than this to an occluder's front face cannot use it.
const MIN_EYE_DISTANCE: f32 = 0.1;

/// Hook used by octree queries to skip hidden cells.
pub trait OcclusionCuller {
    /// Rebuilds occluder volumes for a new viewpoint.
    fn update(&mut self, frustum: &ViewFrustum);

    /// Tests a cell holding `score` elements; a hit credits the occluder.
    fn occlude(&mut self, extents: &Extents, score: usize) -> IntersectLevel;

    /// Retires, ranks and replenishes occluders from the drawables just
    /// found visible.
    fn select(&mut self, nodes: &[Box<dyn Drawable>], visible: &[usize]);
}

/// A static polygon used to hide what lies behind it.
#[derive(Debug, Clone)]
pub struct Occluder {
    /// Index of the source drawable in the static list.
    source: usize,
    vertices: Vec<Point3<f32>>,
    plane: Plane3D,
    /// Empty until the first successful [`Occluder::make_planes`].
    planes: Vec<Plane3D>,
    score: u32,
}

impl Occluder {
    /// Returns `None` unless the drawable is a flagged, planar polygon.
    pub fn new(source: usize, drawable: &dyn Drawable) -> Option<Self> {
        if !drawable.is_occluder() || drawable.vertices().len() < 3 {
            return None;
        }
        let plane = *drawable.plane()?;
        Some(Self {
            source,
            vertices: drawable.vertices().to_vec(),
            plane,
            planes: Vec::new(),
            score: 0,
        })
    }

    #[inline]
    pub fn source(&self) -> usize {
        self.source
    }

    #[inline]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[inline]
    pub fn planes(&self) -> &[Plane3D] {
        &self.planes
    }

    /// Builds the hidden volume as seen from `eye`.
    ///
    /// Fails if the eye is not clearly in front of the polygon or an edge
    /// is seen end-on.
    pub fn make_planes(&mut self, eye: Point3<f32>) -> bool {
        self.planes.clear();
        if self.plane.signed_distance(eye) < MIN_EYE_DISTANCE {
            return false;
        }

        let mut planes = Vec::with_capacity(self.vertices.len() + 1);
        planes.push(self.plane.flipped());
        let count = self.vertices.len();
        for (i, vertex) in self.vertices.iter().enumerate() {
            let previous = &self.vertices[(i + count - 1) % count];
            let normal = (*vertex - eye).cross(&(*previous - eye));
            if normal.norm_squared() < 0.001 {
                return false;
            }
            planes.push(Plane3D::from_point_and_normal(eye, normal));
        }
        self.planes = planes;
        true
    }

    pub fn test_axis_box(&self, extents: &Extents) -> IntersectLevel {
        if self.planes.is_empty() {
            return IntersectLevel::Outside;
        }
        test_axis_box_occlusion(extents, &self.planes)
    }
}

/// Keeps the best few occluders across frames.
#[derive(Debug)]
pub struct OccluderManager {
    occluders: Vec<Occluder>,
    allowed: usize,
    rng: StdRng,
}

impl Default for OccluderManager {
    fn default() -> Self {
        Self::new()
    }
}

impl OccluderManager {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// A manager with reproducible candidate picks.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            occluders: Vec::with_capacity(MAX_OCCLUDERS),
            allowed: 0,
            rng,
        }
    }

    /// Sets how many occluders to track.
    ///
    /// Clamped to [`MAX_OCCLUDERS`]. One is raised to two, so there is
    /// always a slot left to try new candidates in.
    pub fn set_max_occluders(&mut self, size: usize) {
        self.allowed = match size {
            1 => 2,
            size => size.min(MAX_OCCLUDERS),
        };
        self.occluders.truncate(self.allowed);
    }

    #[inline]
    pub fn max_occluders(&self) -> usize {
        self.allowed
    }

    #[inline]
    pub fn occluders(&self) -> &[Occluder] {
        &self.occluders
    }

    pub fn len(&self) -> usize {
        self.occluders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occluders.is_empty()
    }

    pub fn clear(&mut self) {
        self.occluders.clear();
    }

}

impl OcclusionCuller for OccluderManager {
    fn update(&mut self, frustum: &ViewFrustum) {
        let eye = frustum.eye();
        let before = self.occluders.len();
        self.occluders.retain_mut(|occluder| occluder.make_planes(eye));
        if self.occluders.len() < before {
            log::trace!("dropped {} occluders facing away", before - self.occluders.len());
        }
    }

    fn occlude(&mut self, extents: &Extents, score: usize) -> IntersectLevel {
        let mut level = IntersectLevel::Outside;
        for occluder in &mut self.occluders {
            match occluder.test_axis_box(extents) {
                IntersectLevel::Contained => {
                    occluder.score = occluder.score.saturating_add(score as u32);
                    return IntersectLevel::Contained;
                }
                IntersectLevel::Partial => level = IntersectLevel::Partial,
                IntersectLevel::Outside => {}
            }
        }
        level
    }

    fn select(&mut self, nodes: &[Box<dyn Drawable>], visible: &[usize]) {
        if self.allowed == 0 {
            self.occluders.clear();
            return;
        }
        self.occluders.truncate(visible.len());

        // The last slot is always recycled so a fresh candidate gets a try.
        let spare = self.allowed - 1;
        let mut slot = 0;
        self.occluders.retain(|occluder| {
            let keep = occluder.score > 0 && slot != spare;
            slot += 1;
            keep
        });
        self.occluders.sort_by(|a, b| b.score.cmp(&a.score));

        let mut target = self.allowed.min(visible.len());
        while self.occluders.len() < target {
            let index = visible[self.rng.random_range(0..visible.len())];
            if self.occluders.iter().any(|occluder| occluder.source == index) {
                target -= 1;
                continue;
            }
            match Occluder::new(index, nodes[index].as_ref()) {
                Some(occluder) => self.occluders.push(occluder),
                // Guards against a visible list with no usable candidates.
                None => {
                    log::trace!("drawable {index} is not an occluder");
                    target -= 1;
                }
            }
        }

        for occluder in &mut self.occluders {
            occluder.score /= 2;
        }
    }
}
