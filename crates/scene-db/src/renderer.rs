//! Receivers for the nodes a scene database emits each frame.
//!
//! A database never draws anything itself. It walks its contents and hands
//! each surviving drawable to a [`SceneRenderer`], which records whatever
//! it needs for the actual draw.

use nalgebra::Point3;

use crate::drawable::{Drawable, GState, Light};

/// Sink for render, shadow, light and radar output.
///
/// Only `add_render_node` is required; a renderer that does not draw
/// shadows, lights or radar can ignore those calls.
pub trait SceneRenderer {
    /// A drawable to render with the given graphics state, in the order
    /// received.
    fn add_render_node(&mut self, node: &dyn Drawable, gstate: GState);

    fn add_shadow_node(&mut self, _node: &dyn Drawable) {}

    fn add_light(&mut self, _light: &Light) {}

    fn add_radar_node(&mut self, _node: &dyn Drawable) {}
}

/// What a [`CollectingRenderer`] keeps of each emitted drawable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawRecord {
    pub gstate: GState,
    pub center: Point3<f32>,
}

impl DrawRecord {
    fn new(node: &dyn Drawable, gstate: GState) -> Self {
        Self {
            gstate,
            center: node.sphere().center,
        }
    }
}

/// A renderer that records everything it receives, in order.
#[derive(Debug, Default)]
pub struct CollectingRenderer {
    render: Vec<DrawRecord>,
    shadows: Vec<DrawRecord>,
    lights: Vec<Light>,
    radar: Vec<DrawRecord>,
}

impl CollectingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render_nodes(&self) -> &[DrawRecord] {
        &self.render
    }

    pub fn shadow_nodes(&self) -> &[DrawRecord] {
        &self.shadows
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn radar_nodes(&self) -> &[DrawRecord] {
        &self.radar
    }

    /// Graphics states of the render nodes, in emission order.
    pub fn render_states(&self) -> Vec<GState> {
        self.render.iter().map(|record| record.gstate).collect()
    }

    pub fn clear(&mut self) {
        self.render.clear();
        self.shadows.clear();
        self.lights.clear();
        self.radar.clear();
    }
}

impl SceneRenderer for CollectingRenderer {
    fn add_render_node(&mut self, node: &dyn Drawable, gstate: GState) {
        self.render.push(DrawRecord::new(node, gstate));
    }

    fn add_shadow_node(&mut self, node: &dyn Drawable) {
        self.shadows.push(DrawRecord::new(node, node.gstate()));
    }

    fn add_light(&mut self, light: &Light) {
        self.lights.push(*light);
    }

    fn add_radar_node(&mut self, node: &dyn Drawable) {
        self.radar.push(DrawRecord::new(node, node.gstate()));
    }
}

/// A renderer that calls a closure for each render node.
pub struct FnRenderer<F>
where
    F: FnMut(&dyn Drawable, GState),
{
    func: F,
}

impl<F> FnRenderer<F>
where
    F: FnMut(&dyn Drawable, GState),
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> SceneRenderer for FnRenderer<F>
where
    F: FnMut(&dyn Drawable, GState),
{
    fn add_render_node(&mut self, node: &dyn Drawable, gstate: GState) {
        (self.func)(node, gstate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::make_cube;

    #[test]
    fn collecting_renderer_empty() {
        let renderer = CollectingRenderer::new();
        assert!(renderer.render_nodes().is_empty());
        assert!(renderer.lights().is_empty());
    }

    #[test]
    fn collecting_renderer_keeps_order_and_channels() {
        let mut renderer = CollectingRenderer::new();
        let first = make_cube([0.0, 0.0, 0.0], 1);
        let second = make_cube([5.0, 0.0, 0.0], 2);

        renderer.add_render_node(&first, GState(10));
        renderer.add_render_node(&second, GState(20));
        renderer.add_shadow_node(&second);
        renderer.add_radar_node(&first);

        assert_eq!(renderer.render_states(), vec![GState(10), GState(20)]);
        assert_eq!(renderer.render_nodes()[1].center, Point3::new(5.0, 0.0, 0.0));
        assert_eq!(renderer.shadow_nodes()[0].gstate, GState(2));
        assert_eq!(renderer.radar_nodes()[0].gstate, GState(1));

        renderer.clear();
        assert!(renderer.render_nodes().is_empty());
        assert!(renderer.shadow_nodes().is_empty());
    }

    #[test]
    fn fn_renderer_calls_closure() {
        let mut seen = Vec::new();
        {
            let mut renderer = FnRenderer::new(|_node: &dyn Drawable, gstate: GState| {
                seen.push(gstate);
            });
            let cube = make_cube([0.0, 0.0, 0.0], 7);
            renderer.add_render_node(&cube, GState(7));
            // Optional channels are ignored.
            renderer.add_shadow_node(&cube);
        }
        assert_eq!(seen, vec![GState(7)]);
    }
}
