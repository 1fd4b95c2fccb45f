//! LayerPartitioner: union raw slice contours into `LayerPart`s
//! (an outer boundary plus its nested holes) and compute each part's
//! combing boundary.

use crate::geometry::{point_in_polygon, Point, Polygon, PolygonSet};
use crate::polygon_ops;
use crate::slice::SliceLayer;

/// One connected region of a layer: an outer boundary and the holes
/// nested directly inside it.
#[derive(Debug, Clone)]
pub struct LayerPart {
    /// CCW outer boundary.
    pub outline: Polygon,
    /// CW holes nested in `outline`.
    pub holes: Vec<Polygon>,
    /// Boundary combing moves are allowed to travel within — the outline
    /// eroded inward by half a line width, so combing never crosses a
    /// wall.
    pub comb_boundary: Polygon,
}

impl LayerPart {
    /// All polygons belonging to this part (outline first, then holes).
    pub fn polygons(&self) -> PolygonSet {
        let mut polys = vec![self.outline.clone()];
        polys.extend(self.holes.iter().cloned());
        PolygonSet::from_polygons(polys)
    }
}

/// Partition a layer's raw contours into `LayerPart`s: union same-sign
/// duplicates away, then associate each hole with the outer it nests in.
pub fn partition_layer(layer: &SliceLayer, line_width_um: i64) -> Vec<LayerPart> {
    let unioned = polygon_ops::union(&[PolygonSet::from_polygons(layer.contours.clone())]);

    let mut outers: Vec<Polygon> = Vec::new();
    let mut holes: Vec<Polygon> = Vec::new();
    for poly in unioned.polygons {
        if poly.is_empty() {
            continue;
        }
        if poly.is_ccw() {
            outers.push(poly);
        } else {
            holes.push(poly);
        }
    }

    let mut parts: Vec<LayerPart> = outers
        .into_iter()
        .map(|outline| LayerPart {
            comb_boundary: outline
                .offset(line_width_um as f64 / 2.0)
                .unwrap_or_else(|| outline.clone()),
            outline,
            holes: Vec::new(),
        })
        .collect();

    for hole in holes {
        let Some(rep) = hole.points.first().copied() else {
            continue;
        };
        if let Some(owner) = parts
            .iter_mut()
            .find(|part| point_in_polygon(rep, &part.outline))
        {
            owner.holes.push(hole);
        }
        // A hole with no containing outer (degenerate/self-touching
        // slice geometry) is simply dropped; it contributes no area.
    }

    parts
}

/// Is `point` inside any part's comb boundary?
pub fn inside_combing(point: Point, parts: &[LayerPart]) -> bool {
    parts.iter().any(|part| {
        point_in_polygon(point, &part.comb_boundary)
            && !part.holes.iter().any(|h| point_in_polygon(point, h))
    })
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

    fn square_at(origin: Point, side: i64) -> Polygon {
        Polygon::new(vec![
            origin,
            Point::new(origin.x + side, origin.y),
            Point::new(origin.x + side, origin.y + side),
            Point::new(origin.x, origin.y + side),
        ])
    }

    #[test]
    fn associates_hole_with_its_outer() {
        let mut hole = square_at(Point::new(5_000, 5_000), 5_000);
        hole.ensure_cw();
        let layer = SliceLayer {
            print_z: 1_000,
            index: 0,
            contours: vec![square(20_000), hole],
        };
        let parts = partition_layer(&layer, 450);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].holes.len(), 1);
    }

    #[test]
    fn disjoint_outers_become_separate_parts() {
        let layer = SliceLayer {
            print_z: 1_000,
            index: 0,
            contours: vec![square(5_000), square_at(Point::new(50_000, 50_000), 5_000)],
        };
        let parts = partition_layer(&layer, 450);
        assert_eq!(parts.len(), 2);
    }
}
