//! SkinGenerator: split each part's infill boundary into solid
//! top/bottom skin and a sparse interior region, by comparing against
//! the boundaries of the neighboring layers above and below.

use serde::{Deserialize, Serialize};
use crate::geometry::PolygonSet;
use crate::polygon_ops;

/// Settings controlling how many layers form a solid skin.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SkinSettings {
    /// Number of solid layers required above open air before infill can
    /// resume being sparse.
    pub top_layers: usize,
    /// Same, looking downward.
    pub bottom_layers: usize,
}

impl Default for SkinSettings {
    fn default() -> Self {
        Self {
            top_layers: 3,
            bottom_layers: 3,
        }
    }
}

/// The solid/sparse split of one part's infill boundary.
#[derive(Debug, Clone, Default)]
pub struct SkinRegions {
    /// Region requiring 100% solid fill.
    pub solid: PolygonSet,
    /// Region that can be filled at the configured sparse density.
    pub sparse: PolygonSet,
}

/// Compute skin regions for `boundary`, given the same boundary on the
/// `top_layers` layers above and `bottom_layers` layers below.
///
/// Wherever every layer in one of those windows fully covers the current
/// boundary, material continues uninterrupted and sparse infill is
/// correct; wherever any of them exposes open air (the window is shorter
/// than required, e.g. near the model's top or a part that just
/// vanished), that area must print solid to cap the cavity.
pub fn compute_skin(
    boundary: &PolygonSet,
    above: &[PolygonSet],
    below: &[PolygonSet],
    settings: &SkinSettings,
) -> SkinRegions {
    if boundary.is_empty() {
        return SkinRegions::default();
    }

    let solid_top = solid_from_window(boundary, above, settings.top_layers);
    let solid_bottom = solid_from_window(boundary, below, settings.bottom_layers);
    let solid = polygon_ops::union(&[solid_top, solid_bottom]);
    let sparse = polygon_ops::difference(boundary, &solid);

    SkinRegions { solid, sparse }
}

/// Area of `boundary` not covered by every layer in `window` (truncated
/// to `required` layers; a window shorter than `required` means the
/// model ends within that span, so the whole boundary is solid there).
fn solid_from_window(boundary: &PolygonSet, window: &[PolygonSet], required: usize) -> PolygonSet {
    if required == 0 {
        return PolygonSet::new();
    }
    if window.len() < required {
        return boundary.clone();
    }

    let mut covered = boundary.clone();
    for layer in window.iter().take(required) {
        covered = polygon_ops::intersection(&covered, layer);
        if covered.is_empty() {
            break;
        }
    }

    polygon_ops::difference(boundary, &covered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Polygon};

    fn square(side: i64) -> PolygonSet {
        PolygonSet::from_polygons(vec![Polygon::new(vec![
            Point::new(0, 0),
            Point::new(side, 0),
            Point::new(side, side),
            Point::new(0, side),
        ])])
    }

    #[test]
    fn fully_surrounded_layer_is_entirely_sparse() {
        let boundary = square(10_000);
        let above = vec![square(10_000); 3];
        let below = vec![square(10_000); 3];
        let settings = SkinSettings::default();
        let regions = compute_skin(&boundary, &above, &below, &settings);
        assert!(regions.solid.is_empty());
        assert!(!regions.sparse.is_empty());
    }

    #[test]
    fn top_layer_with_no_layers_above_is_entirely_solid() {
        let boundary = square(10_000);
        let below = vec![square(10_000); 3];
        let settings = SkinSettings::default();
        let regions = compute_skin(&boundary, &[], &below, &settings);
        assert!(!regions.solid.is_empty());
    }
}
