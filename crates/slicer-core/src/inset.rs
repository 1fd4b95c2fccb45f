//! InsetGenerator: generate a numbered array of wall insets per
//! part, with optional spiralize (vase) mode.

use serde::{Deserialize, Serialize};
use crate::geometry::Polygon;
use crate::partition::LayerPart;

/// Settings for inset generation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct InsetSettings {
    /// Number of perimeter walls.
    pub wall_count: u32,
    /// Extrusion line width, in µm.
    pub line_width_um: i64,
    /// Continuously interpolate Z across a single-walled outline instead
    /// of discrete layers (spiralize/vase mode).
    pub spiralize: bool,
}

impl Default for InsetSettings {
    fn default() -> Self {
        Self {
            wall_count: 3,
            line_width_um: 450,
            spiralize: false,
        }
    }
}

/// The numbered inset array for a single `LayerPart`, indexed
/// outside-in. `insets[0]` is the outer wall loop; the last entry is the
/// innermost wall, whose inward offset by half a line width bounds the
/// skin/infill region.
#[derive(Debug, Clone)]
pub struct PartInsets {
    /// `insets[i]` is every loop (outline + holes) making up wall `i`.
    pub insets: Vec<Vec<Polygon>>,
    /// Boundary remaining after the innermost wall — feeds SkinGenerator.
    pub infill_boundary: Vec<Polygon>,
}

/// Generate insets for one `LayerPart`.
///
/// In spiralize mode only a single wall is produced and no infill
/// boundary is computed — the part prints as one continuously rising
/// outer loop.
pub fn generate_insets(part: &LayerPart, settings: &InsetSettings) -> PartInsets {
    if settings.wall_count == 0 {
        let mut boundary = vec![part.outline.clone()];
        boundary.extend(part.holes.iter().cloned());
        return PartInsets {
            insets: Vec::new(),
            infill_boundary: boundary,
        };
    }

    let wall_count = if settings.spiralize { 1 } else { settings.wall_count };
    let half = settings.line_width_um as f64 / 2.0;
    let full = settings.line_width_um as f64;

    let mut insets: Vec<Vec<Polygon>> = Vec::with_capacity(wall_count as usize);
    let mut current_outline = part.outline.clone();
    let mut current_holes = part.holes.clone();

    for i in 0..wall_count {
        let step = if i == 0 { half } else { full };
        let Some(next_outline) = current_outline.offset(step) else {
            break;
        };
        let next_holes: Vec<Polygon> = current_holes
            .iter()
            .filter_map(|h| h.offset(step))
            .collect();

        let mut loops = vec![next_outline.clone()];
        loops.extend(next_holes.iter().cloned());
        insets.push(loops);

        current_outline = next_outline;
        current_holes = next_holes;
    }

    if settings.spiralize {
        return PartInsets {
            insets,
            infill_boundary: Vec::new(),
        };
    }

    let infill_boundary = match current_outline.offset(half) {
        Some(inner) => {
            let mut b = vec![inner];
            b.extend(current_holes.iter().filter_map(|h| h.offset(half)));
            b
        }
        None => Vec::new(),
    };

    PartInsets {
        insets,
        infill_boundary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn square(side: i64) -> Polygon {
        Polygon::new(vec![
            Point::new(0, 0),
            Point::new(side, 0),
            Point::new(side, side),
            Point::new(0, side),
        ])
    }

    fn part(side: i64) -> LayerPart {
        LayerPart {
            outline: square(side),
            holes: Vec::new(),
            comb_boundary: square(side),
        }
    }

    #[test]
    fn produces_requested_wall_count() {
        let p = part(20_000);
        let settings = InsetSettings {
            wall_count: 3,
            line_width_um: 450,
            spiralize: false,
        };
        let result = generate_insets(&p, &settings);
        assert_eq!(result.insets.len(), 3);
        assert!(!result.infill_boundary.is_empty());
    }

    #[test]
    fn spiralize_yields_single_wall_no_infill() {
        let p = part(20_000);
        let settings = InsetSettings {
            wall_count: 3,
            line_width_um: 450,
            spiralize: true,
        };
        let result = generate_insets(&p, &settings);
        assert_eq!(result.insets.len(), 1);
        assert!(result.infill_boundary.is_empty());
    }

    #[test]
    fn zero_walls_uses_whole_outline_as_infill_boundary() {
        let p = part(20_000);
        let settings = InsetSettings {
            wall_count: 0,
            line_width_um: 450,
            spiralize: false,
        };
        let result = generate_insets(&p, &settings);
        assert!(result.insets.is_empty());
        assert_eq!(result.infill_boundary.len(), 1);
    }
}
