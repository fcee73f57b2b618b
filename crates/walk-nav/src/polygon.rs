//! Polygon type and the stateless geometry queries the navigation graph is built from.
//!
//! Polygons are closed (the last vertex connects back to the first), may be concave and may use
//! either winding. Self-intersecting or zero-area input is a caller error and is not detected.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{NavError, Result, Vec2};

/// Distance under which a point counts as lying on a polygon edge.
pub const EDGE_TOLERANCE: f32 = 1e-3;

/// Pieces of a sight segment shorter than this (in parameter space) are not sampled.
const MIN_SPLIT_SPAN: f32 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<Vec2>", into = "Vec<Vec2>"))]
pub struct Polygon {
    vertices: Vec<Vec2>,
}

impl Polygon {
    pub fn new(vertices: Vec<Vec2>) -> Result<Self> {
        if vertices.len() < 3 {
            return Err(NavError::TooFewVertices(vertices.len()));
        }
        Ok(Self { vertices })
    }

    /// Build from a flat `[x0, y0, x1, y1, ...]` list.
    pub fn from_coords(coords: &[f32]) -> Result<Self> {
        if coords.len() % 2 != 0 {
            return Err(NavError::OddCoordinateCount(coords.len()));
        }
        Self::new(
            coords
                .chunks_exact(2)
                .map(|c| Vec2::new(c[0], c[1]))
                .collect(),
        )
    }

    /// Axis-aligned rectangle (counter-clockwise), e.g. an actor bounding box.
    pub fn rect(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            vertices: vec![
                Vec2::new(x, y),
                Vec2::new(x + width, y),
                Vec2::new(x + width, y + height),
                Vec2::new(x, y + height),
            ],
        }
    }

    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Vertex at `index`, wrapping around.
    pub fn vertex(&self, index: usize) -> Vec2 {
        self.vertices[index % self.vertices.len()]
    }

    /// Edges in vertex order, `(vertices[i], vertices[i + 1])`, closing back to the first vertex.
    pub fn edges(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Shoelace area; positive for counter-clockwise winding.
    pub fn signed_area(&self) -> f32 {
        self.edges().map(|(a, b)| a.cross(b)).sum::<f32>() * 0.5
    }

    pub fn is_clockwise(&self) -> bool {
        self.signed_area() < 0.0
    }

    pub fn reversed(&self) -> Self {
        let mut vertices = self.vertices.clone();
        vertices.reverse();
        Self { vertices }
    }

    pub fn translated(&self, offset: Vec2) -> Self {
        Self {
            vertices: self.vertices.iter().map(|&v| v + offset).collect(),
        }
    }

    /// `(min, max)` corners of the axis-aligned bounding box.
    pub fn bounds(&self) -> (Vec2, Vec2) {
        let first = self.vertices[0];
        self.vertices
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }
}

impl TryFrom<Vec<Vec2>> for Polygon {
    type Error = NavError;

    fn try_from(vertices: Vec<Vec2>) -> Result<Self> {
        Self::new(vertices)
    }
}

impl From<Polygon> for Vec<Vec2> {
    fn from(polygon: Polygon) -> Self {
        polygon.vertices
    }
}

/// How a polygon constrains a sight segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolygonRole {
    /// The segment must stay inside (the boundary counts as inside).
    WalkZone,
    /// The segment must stay out of the interior (grazing the boundary is allowed).
    Obstacle,
}

/// Point-in-polygon test.
///
/// Points within [`EDGE_TOLERANCE`] of an edge (vertices included) report `edge_inclusive`.
pub fn is_point_inside(polygon: &Polygon, p: Vec2, edge_inclusive: bool) -> bool {
    if polygon
        .edges()
        .any(|(a, b)| distance_to_segment(p, a, b) <= EDGE_TOLERANCE)
    {
        return edge_inclusive;
    }

    let mut inside = false;
    for (a, b) in polygon.edges() {
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x {
                inside = !inside;
            }
        }
    }
    inside
}

/// Nearest point on the polygon boundary to `p`.
///
/// If rounding leaves the projected point outside the polygon, the nearest vertex is returned
/// instead.
pub fn clamped_point(polygon: &Polygon, p: Vec2) -> Vec2 {
    let mut best_point = p;
    let mut best_d2 = f32::INFINITY;

    for (a, b) in polygon.edges() {
        let q = closest_point_on_segment(p, a, b);
        let d2 = q.distance_squared(p);
        if d2 < best_d2 {
            best_d2 = d2;
            best_point = q;
        }
    }

    if is_point_inside(polygon, best_point, true) {
        return best_point;
    }

    tracing::debug!(x = p.x, y = p.y, "clamped point left the polygon, using nearest vertex");
    let mut best_d2 = f32::INFINITY;
    for &v in polygon.vertices() {
        let d2 = v.distance_squared(p);
        if d2 < best_d2 {
            best_d2 = d2;
            best_point = v;
        }
    }
    best_point
}

/// True when the interior angle at vertex `index` exceeds 180 degrees.
///
/// The turn direction is compared against the polygon's own winding, so the answer does not
/// depend on translation or on whether the polygon is stored clockwise.
pub fn is_vertex_concave(polygon: &Polygon, index: usize) -> bool {
    let n = polygon.vertex_count();
    let prev = polygon.vertex(index + n - 1);
    let current = polygon.vertex(index);
    let next = polygon.vertex(index + 1);

    let turn = (current - prev).cross(next - current);
    turn * polygon.signed_area() < 0.0
}

/// Whether the segment `p1`-`p2` is unobstructed with respect to `polygon`.
pub fn in_line_of_sight(p1: Vec2, p2: Vec2, polygon: &Polygon, role: PolygonRole) -> bool {
    if polygon.edges().any(|(a, b)| segments_cross(p1, p2, a, b)) {
        return false;
    }

    let dir = p2 - p1;
    let len2 = dir.length_squared();
    if len2 <= f32::EPSILON {
        return sample_clear(polygon, p1, role);
    }

    // Without proper crossings the segment only meets the boundary at vertices (or at its own
    // endpoints), so every piece between two contacts is entirely inside or entirely outside.
    let mut splits = vec![0.0_f32, 1.0];
    for &v in polygon.vertices() {
        if distance_to_segment(v, p1, p2) <= EDGE_TOLERANCE {
            splits.push(((v - p1).dot(dir) / len2).clamp(0.0, 1.0));
        }
    }
    splits.sort_by(f32::total_cmp);

    splits
        .windows(2)
        .filter(|w| w[1] - w[0] > MIN_SPLIT_SPAN)
        .all(|w| sample_clear(polygon, p1.lerp(p2, (w[0] + w[1]) * 0.5), role))
}

fn sample_clear(polygon: &Polygon, p: Vec2, role: PolygonRole) -> bool {
    match role {
        PolygonRole::WalkZone => is_point_inside(polygon, p, true),
        PolygonRole::Obstacle => !is_point_inside(polygon, p, false),
    }
}

/// Proper crossing test: the segments intersect at a point farther than [`EDGE_TOLERANCE`]
/// from all four endpoints. Touching, endpoint contact and collinear overlap do not count.
pub fn segments_cross(a: Vec2, b: Vec2, c: Vec2, d: Vec2) -> bool {
    let r = b - a;
    let s = d - c;
    let len_r = r.length();
    let len_s = s.length();
    if len_r <= f32::EPSILON || len_s <= f32::EPSILON {
        return false;
    }

    let denom = r.cross(s);
    if denom.abs() <= 1e-6 * len_r * len_s {
        return false;
    }

    let ca = c - a;
    let t = ca.cross(s) / denom;
    let u = ca.cross(r) / denom;

    let inside = |param: f32, len: f32| {
        param * len > EDGE_TOLERANCE && (1.0 - param) * len > EDGE_TOLERANCE
    };
    inside(t, len_r) && inside(u, len_s)
}

pub fn closest_point_on_segment(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let denom = ab.dot(ab);
    if denom <= f32::EPSILON {
        return a;
    }
    let t = (p - a).dot(ab) / denom;
    a + ab * t.clamp(0.0, 1.0)
}

pub fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    closest_point_on_segment(p, a, b).distance(p)
}
