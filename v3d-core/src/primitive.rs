/// Render-facing primitives built from surfaces: filled faces and edge outlines
use std::collections::HashMap;

use nalgebra::{Point3, Vector3};

use crate::model::{Surface, SurfaceKind};

/// Interior edges between faces bent by more than this many degrees are outlined
pub const DEFAULT_EDGE_THRESHOLD_DEG: f64 = 1.0;

/// A triangulated planar facet
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    pub surface: u32,
    pub kind: SurfaceKind,
    pub emissivity: f64,
    /// Corner positions in winding order (3 or 4)
    pub positions: Vec<Point3<f64>>,
    /// Indices into `positions`
    pub triangles: Vec<[usize; 3]>,
    /// Unit normal, zero for a degenerate facet
    pub normal: Vector3<f64>,
}

impl Face {
    pub fn is_degenerate(&self) -> bool {
        self.normal == Vector3::zeros()
    }

    /// Corner positions of each triangle
    pub fn triangle_positions(&self) -> impl Iterator<Item = [Point3<f64>; 3]> + '_ {
        self.triangles
            .iter()
            .map(|t| [self.positions[t[0]], self.positions[t[1]], self.positions[t[2]]])
    }

    /// Area of the facet
    pub fn area(&self) -> f64 {
        self.triangle_positions()
            .map(|[a, b, c]| (b - a).cross(&(c - a)).norm() * 0.5)
            .sum()
    }
}

/// Wireframe overlay for a face
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeOutline {
    pub surface: u32,
    pub positions: Vec<Point3<f64>>,
    /// Index pairs into `positions`
    pub edges: Vec<[usize; 2]>,
}

impl EdgeOutline {
    pub fn segments(&self) -> impl Iterator<Item = (Point3<f64>, Point3<f64>)> + '_ {
        self.edges
            .iter()
            .map(|e| (self.positions[e[0]], self.positions[e[1]]))
    }
}

/// Anything a render host can hold in its scene
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Face(Face),
    Outline(EdgeOutline),
}

impl Primitive {
    pub fn surface(&self) -> u32 {
        match self {
            Primitive::Face(face) => face.surface,
            Primitive::Outline(outline) => outline.surface,
        }
    }

    pub fn as_face(&self) -> Option<&Face> {
        match self {
            Primitive::Face(face) => Some(face),
            Primitive::Outline(_) => None,
        }
    }

    pub fn as_outline(&self) -> Option<&EdgeOutline> {
        match self {
            Primitive::Outline(outline) => Some(outline),
            Primitive::Face(_) => None,
        }
    }
}

/// Triangle indices for a polygon with `corners` vertices.
///
/// Quads always split along the (v1, v3) diagonal into (v1, v2, v3) and
/// (v3, v4, v1).
pub fn triangulate(corners: usize) -> Vec<[usize; 3]> {
    match corners {
        0..=2 => Vec::new(),
        3 => vec![[0, 1, 2]],
        4 => vec![[0, 1, 2], [2, 3, 0]],
        n => (1..n - 1).map(|i| [0, i, i + 1]).collect(),
    }
}

/// Polygon normal by Newell's method; zero when the polygon has no area
pub fn polygon_normal(points: &[Point3<f64>]) -> Vector3<f64> {
    let mut normal = Vector3::zeros();
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        normal.x += (p.y - q.y) * (p.z + q.z);
        normal.y += (p.z - q.z) * (p.x + q.x);
        normal.z += (p.x - q.x) * (p.y + q.y);
    }
    normal.try_normalize(1e-12).unwrap_or_else(Vector3::zeros)
}

/// Build the filled face for a surface from its resolved corner positions
pub fn create_face(surface: &Surface, positions: Vec<Point3<f64>>) -> Face {
    Face {
        surface: surface.key,
        kind: surface.kind,
        emissivity: surface.emissivity,
        triangles: triangulate(positions.len()),
        normal: polygon_normal(&positions),
        positions,
    }
}

/// Outline a face using [`DEFAULT_EDGE_THRESHOLD_DEG`]
pub fn create_edge_outline(face: &Face) -> EdgeOutline {
    create_edge_outline_with_threshold(face, DEFAULT_EDGE_THRESHOLD_DEG)
}

/// Collect the boundary edges of a face plus any interior edge whose two
/// triangles meet at more than `threshold_deg`.
pub fn create_edge_outline_with_threshold(face: &Face, threshold_deg: f64) -> EdgeOutline {
    let cos_threshold = threshold_deg.to_radians().cos();
    let normals: Vec<Vector3<f64>> = face
        .triangle_positions()
        .map(|t| polygon_normal(&t))
        .collect();

    // Edge key -> triangles sharing it, in first-seen order
    let mut order: Vec<[usize; 2]> = Vec::new();
    let mut adjacent: HashMap<[usize; 2], Vec<usize>> = HashMap::new();
    for (t, tri) in face.triangles.iter().enumerate() {
        for k in 0..3 {
            let (a, b) = (tri[k], tri[(k + 1) % 3]);
            let key = [a.min(b), a.max(b)];
            adjacent
                .entry(key)
                .or_insert_with(|| {
                    order.push(key);
                    Vec::new()
                })
                .push(t);
        }
    }

    let edges = order
        .into_iter()
        .filter(|key| match adjacent[key].as_slice() {
            [a, b] => {
                let (na, nb) = (normals[*a], normals[*b]);
                na == Vector3::zeros() || nb == Vector3::zeros() || na.dot(&nb) <= cos_threshold
            }
            _ => true,
        })
        .collect();

    EdgeOutline {
        surface: face.surface,
        positions: face.positions.clone(),
        edges,
    }
}
