//! Convex polygons with optional per-vertex attributes.

use nalgebra::{Point3, Vector2, Vector3};

use crate::bounds::Extents;
use crate::error::GeometryError;
use crate::plane::{Classification, Plane3D, PlaneSide, SPLIT_EPSILON};

/// A convex polygon in 3D space, defined by an ordered list of vertices.
///
/// Vertices should be coplanar and in counter-clockwise winding order
/// when viewed from the front (the direction the normal points).
/// Normals and texture coordinates, when present, have one entry per vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<Point3<f32>>,
    normals: Option<Vec<Vector3<f32>>>,
    texcoords: Option<Vec<Vector2<f32>>>,
}

impl Polygon {
    /// Creates a new polygon from a list of vertices.
    ///
    /// # Panics (debug builds only)
    /// - Panics if fewer than 3 vertices are provided.
    /// - Panics if vertices are not coplanar.
    pub fn new(vertices: Vec<Point3<f32>>) -> Self {
        debug_assert!(
            vertices.len() >= 3,
            "Polygon must have at least 3 vertices"
        );
        debug_assert!(
            Self::are_coplanar(&vertices),
            "Polygon vertices must be coplanar"
        );
        Self {
            vertices,
            normals: None,
            texcoords: None,
        }
    }

    /// Checked constructor for vertex data coming from outside the crate.
    pub fn try_new(vertices: Vec<Point3<f32>>) -> Result<Self, GeometryError> {
        if vertices.len() < 3 {
            return Err(GeometryError::TooFewVertices(vertices.len()));
        }
        if !Self::are_coplanar(&vertices) {
            return Err(GeometryError::DegeneratePlane);
        }
        Ok(Self {
            vertices,
            normals: None,
            texcoords: None,
        })
    }

    /// Attaches one normal per vertex.
    pub fn with_normals(mut self, normals: Vec<Vector3<f32>>) -> Result<Self, GeometryError> {
        self.check_attribute("normal", normals.len())?;
        self.normals = Some(normals);
        Ok(self)
    }

    /// Attaches one texture coordinate per vertex.
    pub fn with_texcoords(mut self, texcoords: Vec<Vector2<f32>>) -> Result<Self, GeometryError> {
        self.check_attribute("texcoord", texcoords.len())?;
        self.texcoords = Some(texcoords);
        Ok(self)
    }

    fn check_attribute(&self, attribute: &'static str, found: usize) -> Result<(), GeometryError> {
        if found != self.vertices.len() {
            return Err(GeometryError::AttributeCountMismatch {
                attribute,
                expected: self.vertices.len(),
                found,
            });
        }
        Ok(())
    }

    /// Assembles a polygon from parts the caller has already validated.
    pub(crate) fn from_parts(
        vertices: Vec<Point3<f32>>,
        normals: Option<Vec<Vector3<f32>>>,
        texcoords: Option<Vec<Vector2<f32>>>,
    ) -> Self {
        Self {
            vertices,
            normals,
            texcoords,
        }
    }

    pub fn triangle(a: Point3<f32>, b: Point3<f32>, c: Point3<f32>) -> Self {
        Self::new(vec![a, b, c])
    }

    /// A parallelogram spanned by `u` and `v` from `origin`, facing `u × v`.
    ///
    /// Texture coordinates run from (0, 0) at `origin` to (1, 1) at the
    /// opposite corner.
    pub fn quad(origin: Point3<f32>, u: Vector3<f32>, v: Vector3<f32>) -> Self {
        Self {
            vertices: vec![origin, origin + u, origin + u + v, origin + v],
            normals: None,
            texcoords: Some(vec![
                Vector2::new(0.0, 0.0),
                Vector2::new(1.0, 0.0),
                Vector2::new(1.0, 1.0),
                Vector2::new(0.0, 1.0),
            ]),
        }
    }

    /// Checks if all vertices lie on the same plane.
    fn are_coplanar(vertices: &[Point3<f32>]) -> bool {
        if vertices.len() < 3 {
            return true;
        }
        let Some(plane) = Plane3D::from_three_points(vertices[0], vertices[1], vertices[2]) else {
            return false;
        };
        vertices[3..].iter().all(|v| {
            plane.classify_point_with_epsilon(*v, SPLIT_EPSILON) == PlaneSide::OnPlane
        })
    }

    #[inline]
    pub fn vertices(&self) -> &[Point3<f32>] {
        &self.vertices
    }

    #[inline]
    pub fn normals(&self) -> Option<&[Vector3<f32>]> {
        self.normals.as_deref()
    }

    #[inline]
    pub fn texcoords(&self) -> Option<&[Vector2<f32>]> {
        self.texcoords.as_deref()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Unnormalized normal of the first three vertices.
    pub fn normal(&self) -> Vector3<f32> {
        let a = &self.vertices[0];
        let b = &self.vertices[1];
        let c = &self.vertices[2];
        (b - a).cross(&(c - a))
    }

    /// Returns `None` if the first three vertices are collinear.
    pub fn unit_normal(&self) -> Option<Vector3<f32>> {
        let n = self.normal();
        let len = n.norm();
        if len > f32::EPSILON {
            Some(n / len)
        } else {
            None
        }
    }

    /// The plane this polygon lies on, or `None` if it is degenerate.
    pub fn plane(&self) -> Option<Plane3D> {
        Plane3D::from_three_points(self.vertices[0], self.vertices[1], self.vertices[2])
    }

    /// Surface area, from the fan of triangles around the first vertex.
    pub fn area(&self) -> f32 {
        let origin = self.vertices[0];
        let twice: Vector3<f32> = self
            .vertices
            .windows(2)
            .skip(1)
            .map(|pair| (pair[0] - origin).cross(&(pair[1] - origin)))
            .sum();
        twice.norm() * 0.5
    }

    pub fn extents(&self) -> Extents {
        Extents::from_points(&self.vertices)
    }

    /// Classifies this polygon relative to a plane using [`SPLIT_EPSILON`].
    pub fn classify(&self, plane: &Plane3D) -> Classification {
        let mut front = 0;
        let mut back = 0;

        for vertex in &self.vertices {
            match plane.classify_point_with_epsilon(*vertex, SPLIT_EPSILON) {
                PlaneSide::Front => front += 1,
                PlaneSide::Back => back += 1,
                PlaneSide::OnPlane => {}
            }
        }

        match (front, back) {
            (0, 0) => Classification::Coplanar,
            (_, 0) => Classification::Front,
            (0, _) => Classification::Back,
            _ => Classification::Spanning,
        }
    }
}
