//! The common interface of the scene databases, and choosing one.

use std::fmt;

use nalgebra::Point3;

use crate::bsp::BspSceneDatabase;
use crate::config::SceneConfig;
use crate::drawable::Drawable;
use crate::flat::FlatSceneDatabase;
use crate::frustum::ViewFrustum;
use crate::renderer::SceneRenderer;
use crate::shadow::ShadowVolume;

/// Who keeps a static drawable whose insertion replaced it with fragments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Ownership {
    /// The database drops the original once it has been split.
    #[default]
    Database,
    /// The original is handed back in [`InsertResult::original`].
    Caller,
}

/// Report from adding a static drawable.
#[derive(Debug, Default)]
pub struct InsertResult {
    /// The drawable was cut and the database now holds fragments of it.
    pub fragments_created: bool,
    /// The database no longer holds the original drawable itself.
    pub original_would_be_freed: bool,
    /// The replaced original, returned under [`Ownership::Caller`].
    pub original: Option<Box<dyn Drawable>>,
}

/// A store of drawables that emits the visible ones each frame.
///
/// Static drawables are added once while a world is built. Dynamic
/// drawables are added every frame after the statics and are all removed
/// together before the next frame.
pub trait SceneDatabase: fmt::Debug {
    fn add_static(&mut self, node: Box<dyn Drawable>, ownership: Ownership) -> InsertResult;

    fn add_dynamic(&mut self, node: Box<dyn Drawable>);

    /// Adds a compound drawable, broken into its parts where the database
    /// needs flat pieces.
    fn add_dynamic_compound(&mut self, node: Box<dyn Drawable>);

    /// Signals that no more statics are coming, so deferred work can run.
    fn finalize_statics(&mut self);

    fn remove_dynamics(&mut self);

    fn remove_all(&mut self);

    /// Viewpoint used to order dynamic drawables as they are added.
    fn set_eye(&mut self, eye: Point3<f32>);

    fn set_config(&mut self, config: &SceneConfig);

    /// True if render output is ordered back to front.
    fn is_ordered(&self) -> bool;

    fn static_count(&self) -> usize;

    fn dynamic_count(&self) -> usize;

    fn add_lights(&self, renderer: &mut dyn SceneRenderer);

    fn add_shadow_nodes(&mut self, renderer: &mut dyn SceneRenderer, shadow: &ShadowVolume);

    fn add_render_nodes(&mut self, renderer: &mut dyn SceneRenderer, frustum: &ViewFrustum);

    fn render_radar(&mut self, renderer: &mut dyn SceneRenderer, radar: &ViewFrustum);
}

/// What the rendering device can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCaps {
    pub depth_buffer: bool,
}

/// Picks the database implementation suited to the device.
///
/// With a depth buffer, draw order does not matter and the octree-backed
/// [`FlatSceneDatabase`] is used. Without one, painter's order is needed
/// and a [`BspSceneDatabase`] is built.
pub fn select_database(caps: DeviceCaps, config: &SceneConfig) -> Box<dyn SceneDatabase> {
    if caps.depth_buffer {
        log::debug!("depth buffer available, using octree scene database");
        Box::new(FlatSceneDatabase::with_config(config.clone()))
    } else {
        log::debug!("no depth buffer, using BSP scene database");
        Box::new(BspSceneDatabase::with_config(config.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_buffer_selects_unordered_database() {
        let database = select_database(DeviceCaps { depth_buffer: true }, &SceneConfig::default());
        assert!(!database.is_ordered());
    }

    #[test]
    fn no_depth_buffer_selects_ordered_database() {
        let database = select_database(DeviceCaps { depth_buffer: false }, &SceneConfig::default());
        assert!(database.is_ordered());
    }
}
