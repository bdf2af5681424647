//! Cutting convex polygons by a plane.

use nalgebra::{Point3, Vector2, Vector3};

use crate::plane::{Classification, Plane3D, PlaneSide, SPLIT_EPSILON};
use crate::polygon::Polygon;

/// Outcome of cutting something by a plane.
#[derive(Debug, Clone, PartialEq)]
pub enum Cut<T> {
    /// Entirely on the front side; the input is kept as is.
    Front,
    /// Entirely on the back side; the input is kept as is.
    Back,
    /// Spans the plane and was cut in two.
    Split { front: T, back: T },
}

impl<T> Cut<T> {
    /// Transforms both fragments of a split, leaving one-sided results alone.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Cut<U> {
        match self {
            Cut::Front => Cut::Front,
            Cut::Back => Cut::Back,
            Cut::Split { front, back } => Cut::Split {
                front: f(front),
                back: f(back),
            },
        }
    }
}

/// Geometry that can be cut by a plane.
pub trait Cuttable: Sized {
    fn cut(&self, plane: &Plane3D) -> Cut<Self>;
}

impl Cuttable for Polygon {
    fn cut(&self, plane: &Plane3D) -> Cut<Polygon> {
        split_polygon(self, plane)
    }
}

/// Vertex lists being assembled for one side of the cut.
#[derive(Default)]
struct Fragment {
    vertices: Vec<Point3<f32>>,
    normals: Vec<Vector3<f32>>,
    texcoords: Vec<Vector2<f32>>,
}

impl Fragment {
    fn with_capacity(n: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(n),
            normals: Vec::with_capacity(n),
            texcoords: Vec::with_capacity(n),
        }
    }

    fn push(&mut self, vertex: Point3<f32>, normal: Option<Vector3<f32>>, texcoord: Option<Vector2<f32>>) {
        self.vertices.push(vertex);
        if let Some(normal) = normal {
            self.normals.push(normal);
        }
        if let Some(texcoord) = texcoord {
            self.texcoords.push(texcoord);
        }
    }

    fn into_polygon(self, has_normals: bool, has_texcoords: bool) -> Polygon {
        Polygon::from_parts(
            self.vertices,
            has_normals.then_some(self.normals),
            has_texcoords.then_some(self.texcoords),
        )
    }
}

/// Cuts a convex polygon by a plane.
///
/// Vertices within [`SPLIT_EPSILON`] of the plane belong to both sides.
/// A polygon with no vertex strictly on one side is returned whole on the
/// other; one lying in the plane goes to the side its normal faces.
/// Each crossing edge gets a single interpolated vertex that both fragments
/// share, so the fragments meet exactly. Interpolated normals are
/// renormalized.
pub fn split_polygon(polygon: &Polygon, plane: &Plane3D) -> Cut<Polygon> {
    let vertices = polygon.vertices();
    let normals = polygon.normals();
    let texcoords = polygon.texcoords();
    let n = vertices.len();

    match polygon.classify(plane) {
        Classification::Coplanar => {
            let facing = polygon
                .unit_normal()
                .is_none_or(|normal| normal.dot(&plane.normal()) >= 0.0);
            return if facing { Cut::Front } else { Cut::Back };
        }
        Classification::Front => return Cut::Front,
        Classification::Back => return Cut::Back,
        Classification::Spanning => {}
    }

    let distances: Vec<f32> = vertices
        .iter()
        .map(|v| plane.signed_distance(*v))
        .collect();
    let sides: Vec<PlaneSide> = vertices
        .iter()
        .map(|v| plane.classify_point_with_epsilon(*v, SPLIT_EPSILON))
        .collect();

    let mut front = Fragment::with_capacity(n + 1);
    let mut back = Fragment::with_capacity(n + 1);

    for i in 0..n {
        let next = (i + 1) % n;
        let normal = normals.map(|ns| ns[i]);
        let texcoord = texcoords.map(|ts| ts[i]);

        match sides[i] {
            PlaneSide::Front => front.push(vertices[i], normal, texcoord),
            PlaneSide::Back => back.push(vertices[i], normal, texcoord),
            PlaneSide::OnPlane => {
                front.push(vertices[i], normal, texcoord);
                back.push(vertices[i], normal, texcoord);
            }
        }

        let crosses = matches!(
            (sides[i], sides[next]),
            (PlaneSide::Front, PlaneSide::Back) | (PlaneSide::Back, PlaneSide::Front)
        );
        if crosses {
            let t = distances[i] / (distances[i] - distances[next]);
            let vertex = vertices[i] + (vertices[next] - vertices[i]) * t;
            let normal = normals.map(|ns| renormalize(ns[i].lerp(&ns[next], t)));
            let texcoord = texcoords.map(|ts| ts[i].lerp(&ts[next], t));
            front.push(vertex, normal, texcoord);
            back.push(vertex, normal, texcoord);
        }
    }

    // Slivers that collapse below a triangle are not worth a fragment.
    if front.vertices.len() < 3 {
        log::trace!("split produced a degenerate front fragment, keeping polygon behind");
        return Cut::Back;
    }
    if back.vertices.len() < 3 {
        log::trace!("split produced a degenerate back fragment, keeping polygon in front");
        return Cut::Front;
    }

    let has_normals = normals.is_some();
    let has_texcoords = texcoords.is_some();
    Cut::Split {
        front: front.into_polygon(has_normals, has_texcoords),
        back: back.into_polygon(has_normals, has_texcoords),
    }
}

fn renormalize(normal: Vector3<f32>) -> Vector3<f32> {
    let len_squared = normal.norm_squared();
    if len_squared > 1e-20 {
        normal / len_squared.sqrt()
    } else {
        normal
    }
}
