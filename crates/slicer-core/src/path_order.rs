//! PathOrderOptimizer: nearest-neighbor print-order optimization
//! plus per-polygon seam/start-vertex selection.

use crate::geometry::{Point, Polygon};

/// A polygon paired with the vertex index its print path should start
/// from.
#[derive(Debug, Clone)]
pub struct OrderedPolygon {
    /// The polygon, unchanged.
    pub polygon: Polygon,
    /// Index into `polygon.points` where the extruder should start (and
    /// end) this loop.
    pub start_vertex: usize,
}

/// Seam placement strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeamMode {
    /// Always the polygon's first vertex (legacy / teacher default).
    FixedFirst,
    /// The vertex nearest the previous path's end point, minimizing
    /// travel onto the seam.
    Nearest,
    /// The sharpest convex corner, hiding the seam in a natural break.
    SharpestCorner,
}

/// Pick a seam vertex for `polygon` given where the extruder currently
/// is and the requested strategy.
fn select_seam(polygon: &Polygon, current_pos: Point, mode: SeamMode) -> usize {
    match mode {
        SeamMode::FixedFirst => 0,
        SeamMode::Nearest => polygon
            .points
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                current_pos
                    .distance(**a)
                    .partial_cmp(&current_pos.distance(**b))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(i, _)| i)
            .unwrap_or(0),
        SeamMode::SharpestCorner => {
            let n = polygon.points.len();
            if n < 3 {
                return 0;
            }
            (0..n)
                .min_by(|&a, &b| {
                    corner_angle(polygon, a)
                        .partial_cmp(&corner_angle(polygon, b))
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .unwrap_or(0)
        }
    }
}

/// Interior angle at vertex `i`, in radians (smaller = sharper corner).
fn corner_angle(polygon: &Polygon, i: usize) -> f64 {
    let n = polygon.points.len();
    let prev = polygon.points[(i + n - 1) % n];
    let cur = polygon.points[i];
    let next = polygon.points[(i + 1) % n];

    let (ax, ay) = ((prev.x - cur.x) as f64, (prev.y - cur.y) as f64);
    let (bx, by) = ((next.x - cur.x) as f64, (next.y - cur.y) as f64);
    let dot = ax * bx + ay * by;
    let mag = ((ax * ax + ay * ay).sqrt() * (bx * bx + by * by).sqrt()).max(1e-9);
    (dot / mag).clamp(-1.0, 1.0).acos()
}

/// Reorder `polygons` by nearest-neighbor travel distance starting from
/// `start`, picking a seam vertex per polygon along the way. Returns the
/// ordered polygons plus the extruder position after the last one.
pub fn optimize_polygon_order(
    polygons: &[Polygon],
    start: Point,
    seam_mode: SeamMode,
) -> (Vec<OrderedPolygon>, Point) {
    if polygons.is_empty() {
        return (Vec::new(), start);
    }

    let mut remaining: Vec<usize> = (0..polygons.len()).collect();
    let mut current_pos = start;
    let mut ordered = Vec::with_capacity(polygons.len());

    while !remaining.is_empty() {
        let (ri, &best_idx) = remaining
            .iter()
            .enumerate()
            .min_by(|(_, &a), (_, &b)| {
                let da = nearest_vertex_distance(&polygons[a], current_pos);
                let db = nearest_vertex_distance(&polygons[b], current_pos);
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap();
        remaining.remove(ri);

        let poly = &polygons[best_idx];
        let start_vertex = select_seam(poly, current_pos, seam_mode);
        if let Some(p) = poly.points.get(start_vertex) {
            current_pos = *p;
        }
        ordered.push(OrderedPolygon {
            polygon: poly.clone(),
            start_vertex,
        });
    }

    (ordered, current_pos)
}

fn nearest_vertex_distance(polygon: &Polygon, from: Point) -> f64 {
    polygon
        .points
        .iter()
        .map(|p| from.distance(*p))
        .fold(f64::MAX, f64::min)
}

/// Reorder open polylines (e.g. infill lines) by nearest-endpoint travel,
/// flipping each line if its far endpoint is actually closer.
pub fn optimize_polyline_order(lines: &[Vec<Point>], start: Point) -> (Vec<Vec<Point>>, Point) {
    if lines.is_empty() {
        return (Vec::new(), start);
    }

    let mut remaining: Vec<usize> = (0..lines.len()).collect();
    let mut current_pos = start;
    let mut ordered = Vec::with_capacity(lines.len());

    while !remaining.is_empty() {
        let (ri, &best_idx) = remaining
            .iter()
            .enumerate()
            .min_by(|(_, &a), (_, &b)| {
                let da = endpoint_distance(&lines[a], current_pos);
                let db = endpoint_distance(&lines[b], current_pos);
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap();
        remaining.remove(ri);

        let mut line = lines[best_idx].clone();
        let (Some(&first), Some(&last)) = (line.first(), line.last()) else {
            continue;
        };
        if current_pos.distance(last) < current_pos.distance(first) {
            line.reverse();
        }
        current_pos = *line.last().unwrap();
        ordered.push(line);
    }

    (ordered, current_pos)
}

fn endpoint_distance(line: &[Point], from: Point) -> f64 {
    let (Some(&first), Some(&last)) = (line.first(), line.last()) else {
        return f64::MAX;
    };
    from.distance(first).min(from.distance(last))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_at(x: i64, y: i64, side: i64) -> Polygon {
        Polygon::new(vec![
            Point::new(x, y),
            Point::new(x + side, y),
            Point::new(x + side, y + side),
            Point::new(x, y + side),
        ])
    }

    #[test]
    fn visits_nearest_polygon_first() {
        let far = square_at(100_000, 100_000, 1_000);
        let near = square_at(1_000, 1_000, 1_000);
        let (ordered, _) =
            optimize_polygon_order(&[far.clone(), near.clone()], Point::origin(), SeamMode::FixedFirst);
        assert_eq!(ordered[0].polygon.points[0], near.points[0]);
    }

    #[test]
    fn nearest_seam_picks_closest_vertex() {
        let poly = square_at(0, 0, 10_000);
        let (ordered, _) = optimize_polygon_order(&[poly], Point::new(10_000, 10_000), SeamMode::Nearest);
        assert_eq!(ordered[0].start_vertex, 2);
    }

    #[test]
    fn polyline_order_flips_to_nearest_endpoint() {
        let lines = vec![vec![Point::new(0, 0), Point::new(10_000, 0)]];
        let (ordered, end) = optimize_polyline_order(&lines, Point::new(10_000, 0));
        assert_eq!(ordered[0][0], Point::new(10_000, 0));
        assert_eq!(end, Point::new(0, 0));
    }
}
