//! Octree spatial index over a static drawable list, plus the occluder
//! manager that lets frustum queries skip hidden cells.
//!
//! The root cell is the bounding box of every element grown into a cube.
//! Cells are split into octants until they hold few enough elements or
//! reach the depth limit; empty octants are discarded and every cell is
//! shrunk to the bounds of what it holds.

mod occluder;
mod tree;

pub use occluder::{OcclusionCuller, Occluder, OccluderManager, MAX_OCCLUDERS};
pub use tree::{Octree, OctreeSettings, OctreeStats, FULL_LIST_BREAK};
