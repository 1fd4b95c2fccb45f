//! Integer-micrometer point and polygon primitives.
//!
//! All lengths downstream of mesh loading are integer micrometers; the
//! miter/area/containment math below drops to `f64` internally and rounds
//! back to `i64` on the way out, per the unit-mixing invariant.

use serde::{Deserialize, Serialize};

/// A point in the XY plane, in micrometers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate (µm).
    pub x: i64,
    /// Y coordinate (µm).
    pub y: i64,
}

impl Point {
    /// Construct a point from micrometer coordinates.
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Origin.
    pub fn origin() -> Self {
        Self { x: 0, y: 0 }
    }

    fn as_f64(self) -> (f64, f64) {
        (self.x as f64, self.y as f64)
    }

    fn from_f64(x: f64, y: f64) -> Self {
        Self {
            x: x.round() as i64,
            y: y.round() as i64,
        }
    }

    /// Euclidean distance to another point, in µm (computed in f64).
    pub fn distance(self, other: Point) -> f64 {
        let (ax, ay) = self.as_f64();
        let (bx, by) = other.as_f64();
        ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
    }
}

impl std::ops::Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

/// A closed polygon: an ordered sequence of points with an implicit
/// wrap-around edge from the last point back to the first.
///
/// Outers are wound CCW (positive signed area); holes are wound CW
/// (negative signed area).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Polygon {
    /// Vertices, in order.
    pub points: Vec<Point>,
}

impl Polygon {
    /// Construct a polygon from points.
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// True if the polygon has fewer than 3 vertices.
    pub fn is_empty(&self) -> bool {
        self.points.len() < 3
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Signed area in µm². Positive for CCW, negative for CW.
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut area = 0.0;
        for i in 0..n {
            let j = (i + 1) % n;
            let (xi, yi) = (self.points[i].x as f64, self.points[i].y as f64);
            let (xj, yj) = (self.points[j].x as f64, self.points[j].y as f64);
            area += xi * yj - xj * yi;
        }
        area / 2.0
    }

    /// Is this polygon wound counter-clockwise?
    pub fn is_ccw(&self) -> bool {
        self.signed_area() > 0.0
    }

    /// Reverse winding order in place.
    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    /// Ensure CCW winding (outer-contour convention).
    pub fn ensure_ccw(&mut self) {
        if !self.is_ccw() {
            self.reverse();
        }
    }

    /// Ensure CW winding (hole convention).
    pub fn ensure_cw(&mut self) {
        if self.is_ccw() {
            self.reverse();
        }
    }

    /// Perimeter length in µm.
    pub fn perimeter_um(&self) -> f64 {
        let n = self.points.len();
        if n < 2 {
            return 0.0;
        }
        let mut length = 0.0;
        for i in 0..n {
            let j = (i + 1) % n;
            length += self.points[i].distance(self.points[j]);
        }
        length
    }

    /// Axis-aligned bounding box: (min, max).
    pub fn bounds(&self) -> Option<(Point, Point)> {
        let mut iter = self.points.iter();
        let first = *iter.next()?;
        let mut min = first;
        let mut max = first;
        for p in iter {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some((min, max))
    }

    /// Centroid (arithmetic mean of vertices — adequate for the seam-start
    /// and overlap heuristics used here; not the area centroid).
    pub fn centroid(&self) -> Point {
        if self.points.is_empty() {
            return Point::origin();
        }
        let (sx, sy) = self
            .points
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x as f64, sy + p.y as f64));
        Point::from_f64(sx / self.points.len() as f64, sy / self.points.len() as f64)
    }

    /// Offset the polygon by `distance_um`: positive shrinks a CCW outer
    /// inward (and grows a CW hole inward too, since winding flips the
    /// normal), negative expands. Returns `None` if the polygon collapses.
    ///
    /// Per-vertex miter offset along the angle bisector of the two
    /// adjacent edges, clamped at sharp corners to avoid spikes.
    pub fn offset(&self, distance_um: f64) -> Option<Polygon> {
        let n = self.points.len();
        if n < 3 {
            return None;
        }

        let sign = if self.is_ccw() { 1.0 } else { -1.0 };
        let mut out = Vec::with_capacity(n);

        for i in 0..n {
            let prev = (i + n - 1) % n;
            let next = (i + 1) % n;

            let p0 = self.points[prev];
            let p1 = self.points[i];
            let p2 = self.points[next];

            let e1 = normalize(sub_f64(p1, p0));
            let e2 = normalize(sub_f64(p2, p1));

            let n1 = (-e1.1 * sign, e1.0 * sign);
            let n2 = (-e2.1 * sign, e2.0 * sign);

            let bisector = normalize((n1.0 + n2.0, n1.1 + n2.1));
            let dot = n1.0 * bisector.0 + n1.1 * bisector.1;

            let offset_dist = if dot.abs() > 0.001 {
                distance_um / dot
            } else {
                distance_um
            };
            let max_offset = distance_um.abs() * 3.0;
            let clamped = offset_dist.clamp(-max_offset, max_offset);

            out.push(Point::from_f64(
                p1.x as f64 + bisector.0 * clamped,
                p1.y as f64 + bisector.1 * clamped,
            ));
        }

        let result = Polygon::new(out);
        if result.signed_area().abs() < 1.0 {
            return None;
        }
        Some(result)
    }
}

fn sub_f64(a: Point, b: Point) -> (f64, f64) {
    ((a.x - b.x) as f64, (a.y - b.y) as f64)
}

fn normalize(v: (f64, f64)) -> (f64, f64) {
    let len = (v.0 * v.0 + v.1 * v.1).sqrt();
    if len < 1e-12 {
        (0.0, 0.0)
    } else {
        (v.0 / len, v.1 / len)
    }
}

/// An ordered collection of polygons, treated as an even-odd region for
/// boolean operations (see `polygon_ops`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolygonSet {
    /// Member polygons.
    pub polygons: Vec<Polygon>,
}

impl PolygonSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct directly from a vector of polygons.
    pub fn from_polygons(polygons: Vec<Polygon>) -> Self {
        Self { polygons }
    }

    /// True if there are no polygons, or all are degenerate.
    pub fn is_empty(&self) -> bool {
        self.polygons.iter().all(|p| p.is_empty())
    }

    /// Total unsigned area in µm² (outers add, holes subtract via their
    /// own negative signed area).
    pub fn total_area(&self) -> f64 {
        self.polygons.iter().map(|p| p.signed_area()).sum()
    }

    /// Offset every member polygon by `distance_um`, dropping collapses.
    pub fn offset(&self, distance_um: f64) -> PolygonSet {
        PolygonSet::from_polygons(
            self.polygons
                .iter()
                .filter_map(|p| p.offset(distance_um))
                .collect(),
        )
    }
}

/// Even-odd point-in-polygon test (ray casting).
pub fn point_in_polygon(point: Point, polygon: &Polygon) -> bool {
    let n = polygon.points.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let pi = polygon.points[i];
        let pj = polygon.points[j];
        if ((pi.y > point.y) != (pj.y > point.y))
            && ((point.x as f64)
                < (pj.x - pi.x) as f64 * (point.y - pi.y) as f64 / (pj.y - pi.y) as f64
                    + pi.x as f64)
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Is `point` inside the region described by `set` (inside an outer,
/// outside every hole)?
pub fn point_in_set(point: Point, set: &PolygonSet) -> bool {
    let mut inside_outer = false;
    for poly in &set.polygons {
        let contains = point_in_polygon(point, poly);
        if poly.is_ccw() {
            if contains {
                inside_outer = true;
            }
        } else if contains {
            return false;
        }
    }
    inside_outer
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side: i64) -> Polygon {
        Polygon::new(vec![
            Point::new(0, 0),
            Point::new(side, 0),
            Point::new(side, side),
            Point::new(0, side),
        ])
    }

    #[test]
    fn square_is_ccw_with_positive_area() {
        let sq = square(10_000);
        assert!(sq.is_ccw());
        assert!((sq.signed_area() - 100_000_000.0).abs() < 1.0);
    }

    #[test]
    fn offset_shrinks_square() {
        let sq = square(10_000);
        let inset = sq.offset(1_000.0).unwrap();
        let area = inset.signed_area().abs();
        // 8mm square in um^2 == 64_000_000
        assert!((area - 64_000_000.0).abs() < 10_000.0);
    }

    #[test]
    fn point_in_polygon_basic() {
        let sq = square(10_000);
        assert!(point_in_polygon(Point::new(5_000, 5_000), &sq));
        assert!(!point_in_polygon(Point::new(15_000, 5_000), &sq));
    }
}
