//! Binary Space Partitioning scene database.
//!
//! Used when the renderer has no depth buffer: every frame the tree is
//! walked from the eye's point of view, and drawables come out farthest
//! first so later ones paint over earlier ones.
//!
//! # Example
//!
//! ```
//! use nalgebra::{Point3, Vector3};
//! use scene_db::{
//!     BspSceneDatabase, CollectingRenderer, GState, Ownership, PolygonNode, SceneDatabase,
//!     ViewFrustum,
//! };
//!
//! let mut database = BspSceneDatabase::new();
//! for (id, y) in [(1, 10.0), (2, 20.0)] {
//!     let wall = PolygonNode::wall(
//!         Point3::new(-5.0, y, 0.0),
//!         Vector3::new(10.0, 0.0, 0.0),
//!         Vector3::new(0.0, 0.0, 5.0),
//!         GState(id),
//!     )
//!     .unwrap();
//!     database.add_static(Box::new(wall), Ownership::Database);
//! }
//! database.finalize_statics();
//!
//! let mut frustum = ViewFrustum::new();
//! frustum.set_view(Point3::new(0.0, 0.0, 2.0), Point3::new(0.0, 10.0, 2.0));
//! let mut renderer = CollectingRenderer::new();
//! database.add_render_nodes(&mut renderer, &frustum);
//!
//! assert_eq!(renderer.render_states(), vec![GState(2), GState(1)]);
//! ```
//!
//! # Architecture
//!
//! - [`BspSceneDatabase`]: the tree and its insertion and traversal logic
//! - [`BspNode`]: one drawable plus its front and back children, stored in
//!   a slot map and linked by [`NodeKey`]

mod node;
mod tree;

pub use node::{BspNode, NodeKey, Side};
pub use tree::BspSceneDatabase;
