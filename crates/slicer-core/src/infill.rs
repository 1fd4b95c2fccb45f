//! InfillGenerator: parallel-line scan fill of a boundary region,
//! at an integer-degree angle, with an optional bridge-angle override.

use serde::{Deserialize, Serialize};

use crate::geometry::{point_in_set, Point, PolygonSet};
use crate::path_order::optimize_polyline_order;

/// Infill pattern types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InfillPattern {
    /// Rectilinear grid (alternating 0°/90°).
    #[default]
    Grid,
    /// Single direction lines (alternating 45°/-45°).
    Lines,
    /// Triangular pattern (0°/60°/-60° alternating).
    Triangles,
    /// Hexagonal honeycomb (approximated as alternating angled lines).
    Honeycomb,
    /// Gyroid (approximated as phase-shifting lines).
    Gyroid,
}

/// Settings for infill generation.
#[derive(Debug, Clone, Copy)]
pub struct InfillSettings {
    /// Infill pattern.
    pub pattern: InfillPattern,
    /// Infill density (0.0 to 1.0).
    pub density: f64,
    /// Line width, in µm.
    pub line_width_um: i64,
    /// Layer index (for alternating patterns).
    pub layer_index: usize,
    /// Explicit line angle override for bridging layers, in integer
    /// degrees. `None` falls back to the pattern's own angle rule
    /// to print.
    pub bridge_angle_deg: Option<i32>,
    /// Extend each line's endpoints into the surrounding perimeter by
    /// this many µm, so the infill bonds to the wall instead of
    /// stopping exactly at its inner edge.
    pub extend_into_perimeter_um: i64,
}

impl Default for InfillSettings {
    fn default() -> Self {
        Self {
            pattern: InfillPattern::Grid,
            density: 0.15,
            line_width_um: 450,
            layer_index: 0,
            bridge_angle_deg: None,
            extend_into_perimeter_um: 0,
        }
    }
}

/// Infill fill lines for one region.
#[derive(Debug, Clone, Default)]
pub struct InfillResult {
    /// Open polylines, each a single pass across the region.
    pub lines: Vec<Vec<Point>>,
}

/// Generate infill lines for the given boundary region.
///
/// Grid is the one pattern that is not a single scan direction: it
/// superposes two perpendicular passes on the same layer, each spaced
/// twice as far apart as a single-direction fill at the same density
/// would be, so the combined crossing lines still average out to the
/// requested density.
pub fn generate_infill(boundary: &PolygonSet, settings: &InfillSettings) -> InfillResult {
    if boundary.is_empty() || settings.density <= 0.0 {
        return InfillResult::default();
    }

    let spacing_um = settings.line_width_um as f64 / settings.density;

    if settings.bridge_angle_deg.is_none() && settings.pattern == InfillPattern::Grid {
        let angle = pattern_angle_deg(InfillPattern::Grid, settings.layer_index).to_radians();
        let mut lines = scan_lines(boundary, spacing_um * 2.0, angle, settings.extend_into_perimeter_um);
        lines.extend(scan_lines(
            boundary,
            spacing_um * 2.0,
            angle + std::f64::consts::FRAC_PI_2,
            settings.extend_into_perimeter_um,
        ));
        let (ordered, _) = optimize_polyline_order(&lines, Point::origin());
        return InfillResult { lines: ordered };
    }

    let angle_deg = settings
        .bridge_angle_deg
        .map(|d| d as f64)
        .unwrap_or_else(|| pattern_angle_deg(settings.pattern, settings.layer_index));

    generate_parallel_lines(
        boundary,
        spacing_um,
        angle_deg.to_radians(),
        settings.extend_into_perimeter_um,
    )
}

fn pattern_angle_deg(pattern: InfillPattern, layer_index: usize) -> f64 {
    match pattern {
        // Both directions of a grid are emitted on every layer (see
        // `generate_infill`); this angle is just the first of the pair.
        InfillPattern::Grid => 0.0,
        InfillPattern::Lines => {
            if layer_index.is_multiple_of(2) {
                45.0
            } else {
                -45.0
            }
        }
        InfillPattern::Triangles => match layer_index % 3 {
            0 => 0.0,
            1 => 60.0,
            _ => -60.0,
        },
        InfillPattern::Honeycomb => {
            if layer_index.is_multiple_of(2) {
                30.0
            } else {
                -30.0
            }
        }
        InfillPattern::Gyroid => {
            45.0 + (layer_index as f64 * 0.5).sin() * 0.1 * 180.0 / std::f64::consts::PI
        }
    }
}

fn generate_parallel_lines(
    boundary: &PolygonSet,
    spacing_um: f64,
    angle: f64,
    extend_into_perimeter_um: i64,
) -> InfillResult {
    let lines = scan_lines(boundary, spacing_um, angle, extend_into_perimeter_um);
    let (ordered, _) = optimize_polyline_order(&lines, Point::origin());
    InfillResult { lines: ordered }
}

/// Raw (unordered) set of parallel scan-line segments clipped to
/// `boundary`, each endpoint pushed outward along the scan direction by
/// `extend_into_perimeter_um` so the fill overlaps the wall it meets.
fn scan_lines(
    boundary: &PolygonSet,
    spacing_um: f64,
    angle: f64,
    extend_into_perimeter_um: i64,
) -> Vec<Vec<Point>> {
    let Some((min, max)) = bounds(boundary) else {
        return Vec::new();
    };

    let cos_a = angle.cos();
    let sin_a = angle.sin();
    let dir = (cos_a, sin_a);
    let perp = (-sin_a, cos_a);
    let extend = extend_into_perimeter_um as f64;

    let corners = [
        (min.x as f64, min.y as f64),
        (max.x as f64, min.y as f64),
        (max.x as f64, max.y as f64),
        (min.x as f64, max.y as f64),
    ];
    let mut perp_min = f64::MAX;
    let mut perp_max = f64::MIN;
    for (cx, cy) in corners {
        let proj = cx * perp.0 + cy * perp.1;
        perp_min = perp_min.min(proj);
        perp_max = perp_max.max(proj);
    }

    let mut lines: Vec<Vec<Point>> = Vec::new();
    let mut offset = perp_min + spacing_um / 2.0;

    while offset < perp_max {
        let origin = (offset * perp.0, offset * perp.1);
        let mut ts = line_boundary_intersections(origin, dir, boundary);
        ts.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        for pair in ts.chunks(2) {
            if pair.len() != 2 {
                continue;
            }
            let (t0, t1) = (pair[0] - extend, pair[1] + extend);
            let p0 = Point::new(
                (origin.0 + t0 * dir.0).round() as i64,
                (origin.1 + t0 * dir.1).round() as i64,
            );
            let p1 = Point::new(
                (origin.0 + t1 * dir.0).round() as i64,
                (origin.1 + t1 * dir.1).round() as i64,
            );
            let mid_t = (pair[0] + pair[1]) / 2.0;
            let mid = Point::new(
                (origin.0 + mid_t * dir.0).round() as i64,
                (origin.1 + mid_t * dir.1).round() as i64,
            );
            if point_in_set(mid, boundary) {
                lines.push(vec![p0, p1]);
            }
        }

        offset += spacing_um;
    }

    lines
}

fn bounds(set: &PolygonSet) -> Option<(Point, Point)> {
    let mut min = Point::new(i64::MAX, i64::MAX);
    let mut max = Point::new(i64::MIN, i64::MIN);
    let mut any = false;
    for poly in &set.polygons {
        for p in &poly.points {
            any = true;
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
    }
    any.then_some((min, max))
}

fn line_boundary_intersections(origin: (f64, f64), dir: (f64, f64), set: &PolygonSet) -> Vec<f64> {
    let mut ts = Vec::new();
    let eps = 1e-9;

    for poly in &set.polygons {
        let n = poly.points.len();
        for i in 0..n {
            let j = (i + 1) % n;
            let a = poly.points[i];
            let b = poly.points[j];
            let seg = ((b.x - a.x) as f64, (b.y - a.y) as f64);

            let cross = dir.0 * seg.1 - dir.1 * seg.0;
            if cross.abs() < eps {
                continue;
            }

            let diff = (a.x as f64 - origin.0, a.y as f64 - origin.1);
            let t = (diff.0 * seg.1 - diff.1 * seg.0) / cross;
            let s = (diff.0 * dir.1 - diff.1 * dir.0) / cross;

            if (-eps..=1.0 + eps).contains(&s) {
                ts.push(t);
            }
        }
    }

    ts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Polygon;

    fn square(side: i64) -> PolygonSet {
        PolygonSet::from_polygons(vec![Polygon::new(vec![
            Point::new(0, 0),
            Point::new(side, 0),
            Point::new(side, side),
            Point::new(0, side),
        ])])
    }

    #[test]
    fn grid_infill_produces_lines() {
        let settings = InfillSettings {
            pattern: InfillPattern::Grid,
            density: 0.2,
            line_width_um: 450,
            layer_index: 0,
            bridge_angle_deg: None,
            extend_into_perimeter_um: 0,
        };
        let result = generate_infill(&square(10_000), &settings);
        assert!(!result.lines.is_empty());
    }

    #[test]
    fn grid_infill_superposes_both_directions() {
        let settings = InfillSettings {
            pattern: InfillPattern::Grid,
            density: 0.2,
            line_width_um: 450,
            layer_index: 3, // odd layer — would have been 90-only under the old alternation
            bridge_angle_deg: None,
            extend_into_perimeter_um: 0,
        };
        let result = generate_infill(&square(10_000), &settings);
        let mostly_horizontal = result
            .lines
            .iter()
            .filter(|l| (l[0].y - l[1].y).abs() < (l[0].x - l[1].x).abs())
            .count();
        let mostly_vertical = result.lines.len() - mostly_horizontal;
        assert!(mostly_horizontal > 0);
        assert!(mostly_vertical > 0);
    }

    #[test]
    fn extend_into_perimeter_lengthens_each_segment() {
        let base = InfillSettings {
            pattern: InfillPattern::Lines,
            density: 0.2,
            line_width_um: 450,
            layer_index: 0,
            bridge_angle_deg: None,
            extend_into_perimeter_um: 0,
        };
        let extended = InfillSettings {
            extend_into_perimeter_um: 300,
            ..base
        };
        let plain = generate_infill(&square(10_000), &base);
        let stretched = generate_infill(&square(10_000), &extended);
        assert_eq!(plain.lines.len(), stretched.lines.len());
        let plain_len: i64 = plain.lines[0][0].x.abs_diff(plain.lines[0][1].x) as i64;
        let stretched_len: i64 = stretched.lines[0][0].x.abs_diff(stretched.lines[0][1].x) as i64;
        assert!(stretched_len > plain_len);
    }

    #[test]
    fn bridge_angle_override_ignores_pattern_rule() {
        let settings = InfillSettings {
            pattern: InfillPattern::Grid,
            density: 0.2,
            line_width_um: 450,
            layer_index: 0,
            bridge_angle_deg: Some(17),
            extend_into_perimeter_um: 0,
        };
        // Just confirm it doesn't panic and still produces some fill.
        let result = generate_infill(&square(10_000), &settings);
        assert!(!result.lines.is_empty());
    }

    #[test]
    fn infill_avoids_hole() {
        let mut hole = Polygon::new(vec![
            Point::new(4_000, 4_000),
            Point::new(4_000, 6_000),
            Point::new(6_000, 6_000),
            Point::new(6_000, 4_000),
        ]);
        hole.ensure_cw();
        let mut boundary = square(10_000);
        boundary.polygons.push(hole);

        let settings = InfillSettings {
            pattern: InfillPattern::Lines,
            density: 0.2,
            line_width_um: 450,
            layer_index: 0,
            bridge_angle_deg: None,
            extend_into_perimeter_um: 0,
        };
        let result = generate_infill(&boundary, &settings);
        for line in &result.lines {
            for p in line {
                assert!(!(p.x > 4_000 && p.x < 6_000 && p.y > 4_000 && p.y < 6_000));
            }
        }
    }
}
