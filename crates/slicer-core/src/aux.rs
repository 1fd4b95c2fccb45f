//! Auxiliary print structures: skirt, raft, wipe tower, wipe
//! shield. Built from the same offset primitive as everything else in
//! this crate, in the profile-driven settings-struct style `printer.rs`
//! uses for machine profiles.

use serde::{Deserialize, Serialize};
use crate::geometry::{Point, Polygon, PolygonSet};

/// Skirt settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SkirtSettings {
    /// Number of skirt loops.
    pub line_count: u32,
    /// Gap between the model's first-layer footprint and the innermost
    /// skirt loop, in µm.
    pub distance_um: i64,
    /// Extrusion line width, in µm.
    pub line_width_um: i64,
}

impl Default for SkirtSettings {
    fn default() -> Self {
        Self {
            line_count: 1,
            distance_um: 3_000,
            line_width_um: 450,
        }
    }
}

/// Generate concentric skirt loops around the first layer's footprint.
pub fn generate_skirt(first_layer_footprint: &PolygonSet, settings: &SkirtSettings) -> Vec<Polygon> {
    if settings.line_count == 0 || first_layer_footprint.is_empty() {
        return Vec::new();
    }

    let hull = convex_hull_of_set(first_layer_footprint);
    let mut loops = Vec::with_capacity(settings.line_count as usize);
    let mut current = hull;
    for i in 0..settings.line_count {
        let step = if i == 0 {
            settings.distance_um as f64
        } else {
            settings.line_width_um as f64
        };
        match current.offset(-step) {
            Some(grown) => {
                loops.push(grown.clone());
                current = grown;
            }
            None => break,
        }
    }
    loops
}

/// Raft settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RaftSettings {
    /// Margin the raft extends beyond the model footprint, in µm.
    pub margin_um: i64,
}

impl Default for RaftSettings {
    fn default() -> Self {
        Self { margin_um: 5_000 }
    }
}

/// Generate the raft's single outline (the raft itself is later filled
/// solid by the infill generator at each of its base/interface layers).
pub fn generate_raft_outline(model_footprint: &PolygonSet, settings: &RaftSettings) -> Option<Polygon> {
    if model_footprint.is_empty() {
        return None;
    }
    let hull = convex_hull_of_set(model_footprint);
    hull.offset(-(settings.margin_um as f64))
}

/// Wipe tower settings. Per the size-based disable convention this
/// crate uses throughout (`size_um <= 1` means "no wipe tower" rather
/// than a separate `enabled` flag), a wipe tower is generated only when
/// `size_um > 1`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WipeTowerSettings {
    /// Side length of the square wipe tower footprint, in µm. `<= 1`
    /// disables the wipe tower entirely.
    pub size_um: i64,
    /// Tower's placement corner, in µm.
    pub position_um: (i64, i64),
}

impl Default for WipeTowerSettings {
    fn default() -> Self {
        Self {
            size_um: 0,
            position_um: (0, 0),
        }
    }
}

/// Generate the wipe tower's footprint, or `None` when disabled.
pub fn generate_wipe_tower(settings: &WipeTowerSettings) -> Option<Polygon> {
    if settings.size_um <= 1 {
        return None;
    }
    let (x, y) = settings.position_um;
    let s = settings.size_um;
    Some(Polygon::new(vec![
        Point::new(x, y),
        Point::new(x + s, y),
        Point::new(x + s, y + s),
        Point::new(x, y + s),
    ]))
}

/// Wipe shield settings — a thin wall printed alongside the model to
/// wipe an idle nozzle on before resuming extrusion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WipeShieldSettings {
    /// Distance from the model footprint to the shield wall, in µm.
    pub distance_um: i64,
}

/// Generate the wipe shield outline around the model's footprint.
pub fn generate_wipe_shield(model_footprint: &PolygonSet, settings: &WipeShieldSettings) -> Option<Polygon> {
    if model_footprint.is_empty() {
        return None;
    }
    let hull = convex_hull_of_set(model_footprint);
    hull.offset(-(settings.distance_um as f64))
}

/// A coarse convex hull (gift wrapping) over every vertex in `set`,
/// used as the basis for outward-only auxiliary structures where exact
/// concavity doesn't matter.
fn convex_hull_of_set(set: &PolygonSet) -> Polygon {
    let points: Vec<Point> = set.polygons.iter().flat_map(|p| p.points.clone()).collect();
    Polygon::new(convex_hull(&points))
}

fn convex_hull(points: &[Point]) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let mut pts = points.to_vec();
    pts.sort_by(|a, b| a.x.cmp(&b.x).then(a.y.cmp(&b.y)));
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    fn cross(o: Point, a: Point, b: Point) -> i64 {
        (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
    }

    let mut lower: Vec<Point> = Vec::new();
    for &p in &pts {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<Point> = Vec::new();
    for &p in pts.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0 {
            upper.pop();
        }
        upper.push(p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side: i64) -> PolygonSet {
        PolygonSet::from_polygons(vec![Polygon::new(vec![
            Point::new(0, 0),
            Point::new(side, 0),
            Point::new(side, side),
            Point::new(0, side),
        ])])
    }

    #[test]
    fn skirt_grows_outward_from_footprint() {
        let footprint = square(10_000);
        let settings = SkirtSettings::default();
        let loops = generate_skirt(&footprint, &settings);
        assert_eq!(loops.len(), 1);
        assert!(loops[0].signed_area().abs() > footprint.total_area().abs());
    }

    #[test]
    fn wipe_tower_disabled_at_zero_size() {
        let settings = WipeTowerSettings::default();
        assert!(generate_wipe_tower(&settings).is_none());
    }

    #[test]
    fn wipe_tower_disabled_at_size_one() {
        let settings = WipeTowerSettings {
            size_um: 1,
            position_um: (0, 0),
        };
        assert!(generate_wipe_tower(&settings).is_none());
    }

    #[test]
    fn wipe_tower_enabled_above_threshold() {
        let settings = WipeTowerSettings {
            size_um: 20_000,
            position_um: (0, 0),
        };
        assert!(generate_wipe_tower(&settings).is_some());
    }
}
