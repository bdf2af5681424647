//! Spheres, and their faceted decomposition for ordered databases.

use std::cell::Cell;
use std::f32::consts::PI;

use nalgebra::{Point3, Vector2, Vector3};

use crate::bounds::{BoundingSphere, Extents};
use crate::drawable::{Drawable, GState, OctreeState, PolygonNode};
use crate::polygon::Polygon;
use crate::renderer::SceneRenderer;

/// Latitude bands and longitude slices used for sphere fragments.
pub const SPHERE_LOW_RES: usize = 6;

/// Fragments whose top ring is below this height are dropped.
const GROUND_CUTOFF: f32 = 0.01;

#[derive(Debug, Clone)]
pub struct SphereNode {
    radius: f32,
    sphere: BoundingSphere,
    extents: Extents,
    gstate: GState,
    octree_state: Cell<OctreeState>,
}

impl SphereNode {
    pub fn new(center: Point3<f32>, radius: f32, gstate: GState) -> Self {
        let sphere = BoundingSphere::new(center, radius);
        Self {
            radius,
            extents: sphere.extents(),
            sphere,
            gstate,
            octree_state: Cell::new(OctreeState::Culled),
        }
    }

    #[inline]
    pub fn center(&self) -> Point3<f32> {
        self.sphere.center
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Unit direction to the vertex at latitude ring `ring`, slice `slice`.
    fn ring_direction(ring: usize, slice: usize) -> Vector3<f32> {
        let phi = PI * (0.5 - ring as f32 / SPHERE_LOW_RES as f32);
        let theta = 2.0 * PI * slice as f32 / SPHERE_LOW_RES as f32;
        Vector3::new(theta.cos() * phi.cos(), theta.sin() * phi.cos(), phi.sin())
    }

    /// Number of latitude bands, counted from the top, that reach above the
    /// ground.
    fn bands_above_ground(&self) -> usize {
        (0..SPHERE_LOW_RES)
            .take_while(|&ring| {
                self.radius * Self::ring_direction(ring, 0).z + self.center().z >= GROUND_CUTOFF
            })
            .count()
    }

    /// One facet of the band below `ring`, wound counter-clockwise from
    /// outside.
    fn facet(&self, ring: usize, slice: usize) -> Option<PolygonNode> {
        let corners = [
            (ring + 1, slice),
            (ring + 1, slice + 1),
            (ring, slice + 1),
            (ring, slice),
        ];
        let min_gap = 1e-8 * self.radius * self.radius;

        let mut vertices: Vec<Point3<f32>> = Vec::with_capacity(4);
        let mut normals = Vec::with_capacity(4);
        let mut texcoords = Vec::with_capacity(4);
        for (r, s) in corners {
            let direction = Self::ring_direction(r, s);
            let vertex = self.center() + direction * self.radius;
            // Pole rings collapse to a point.
            if vertices
                .last()
                .is_some_and(|last| (vertex - last).norm_squared() <= min_gap)
            {
                continue;
            }
            vertices.push(vertex);
            normals.push(direction);
            texcoords.push(Vector2::new(
                s as f32 / SPHERE_LOW_RES as f32,
                r as f32 / SPHERE_LOW_RES as f32,
            ));
        }
        if vertices.len() > 3 && (vertices[0] - vertices[vertices.len() - 1]).norm_squared() <= min_gap {
            vertices.pop();
            normals.pop();
            texcoords.pop();
        }
        if vertices.len() < 3 {
            return None;
        }

        let polygon = Polygon::from_parts(vertices, Some(normals), Some(texcoords));
        PolygonNode::new(polygon, self.gstate).ok()
    }
}

impl Drawable for SphereNode {
    fn sphere(&self) -> &BoundingSphere {
        &self.sphere
    }

    fn extents(&self) -> &Extents {
        &self.extents
    }

    fn gstate(&self) -> GState {
        self.gstate
    }

    fn octree_state(&self) -> OctreeState {
        self.octree_state.get()
    }

    fn set_octree_state(&self, state: OctreeState) {
        self.octree_state.set(state);
    }

    /// Low resolution facets, skipping bands entirely below the ground.
    fn parts(&self) -> Option<Vec<Box<dyn Drawable>>> {
        let bands = self.bands_above_ground();
        let parts = (0..bands)
            .flat_map(|ring| (0..SPHERE_LOW_RES).map(move |slice| (ring, slice)))
            .filter_map(|(ring, slice)| self.facet(ring, slice))
            .map(|facet| Box::new(facet) as Box<dyn Drawable>)
            .collect();
        Some(parts)
    }

    fn add_render_nodes(&self, renderer: &mut dyn SceneRenderer) {
        renderer.add_render_node(self, self.gstate);
    }

    fn add_shadow_nodes(&self, renderer: &mut dyn SceneRenderer) {
        renderer.add_shadow_node(self);
    }
}
