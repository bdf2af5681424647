//! Scene databases for a 3D renderer.
//!
//! A scene database holds the drawables of a world and hands the visible
//! ones to a [`SceneRenderer`] each frame. Two implementations share the
//! [`SceneDatabase`] interface:
//!
//! - [`BspSceneDatabase`] splits static polygons into a BSP tree and emits
//!   everything back to front, for renderers without a depth buffer.
//! - [`FlatSceneDatabase`] keeps plain lists and culls statics through an
//!   [`Octree`], optionally skipping what large occluders hide.
//!
//! [`select_database`] picks one for a device.

mod bounds;
mod bsp;
mod config;
mod cuttable;
mod database;
mod drawable;
mod error;
mod flat;
mod frustum;
mod intersect;
mod octree;
mod plane;
mod polygon;
mod renderer;
mod shadow;
#[cfg(test)]
mod test_support;

pub use bounds::{BoundingSphere, Extents};
pub use bsp::{BspNode, BspSceneDatabase, NodeKey, Side};
pub use config::{RadarSortMode, SceneConfig};
pub use cuttable::{split_polygon, Cut, Cuttable};
pub use database::{select_database, DeviceCaps, InsertResult, Ownership, SceneDatabase};
pub use drawable::{
    BoltNode, Drawable, GState, Light, OctreeState, PolygonNode, ShellNode, SphereNode,
    SPHERE_LOW_RES,
};
pub use error::{ConfigError, GeometryError};
pub use flat::FlatSceneDatabase;
pub use frustum::ViewFrustum;
pub use intersect::{
    test_axis_box_in_frustum, test_axis_box_in_frustum_2d, test_axis_box_in_planes,
    test_axis_box_occlusion, test_polygon_in_axis_box, IntersectLevel, FRUSTUM_SLACK,
    OCCLUSION_MARGIN,
};
pub use octree::{
    OcclusionCuller, Occluder, OccluderManager, Octree, OctreeSettings, OctreeStats,
    FULL_LIST_BREAK, MAX_OCCLUDERS,
};
pub use plane::{Classification, Plane3D, PlaneSide, PLANE_EPSILON, SPLIT_EPSILON};
pub use polygon::Polygon;
pub use renderer::{CollectingRenderer, DrawRecord, FnRenderer, SceneRenderer};
pub use shadow::ShadowVolume;
