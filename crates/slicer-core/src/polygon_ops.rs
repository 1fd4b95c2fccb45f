//! Narrow boolean-operation kernel standing in for an external
//! Clipper-style 2D library, deliberately out of scope here — see the
//! module docs on `geometry`.
//!
//! The rest of the core only calls through `union`/`difference`/
//! `intersection`/`erode`/`dilate`; the implementation here handles the
//! containment and nesting cases that dominate sliced-mesh geometry
//! (outers with nested holes, near-duplicate contours from adjacent
//! layers, fully-covered or fully-exposed regions) rather than general
//! self-intersecting polygon clipping. Swapping in a real clipping crate
//! later only touches this file.

use crate::geometry::{point_in_set, Polygon, PolygonSet};

/// Fraction of `inner`'s vertices that land inside `outer`.
fn vertex_coverage(inner: &Polygon, outer: &PolygonSet) -> f64 {
    if inner.points.is_empty() {
        return 0.0;
    }
    let covered = inner
        .points
        .iter()
        .filter(|&&p| point_in_set(p, outer))
        .count();
    covered as f64 / inner.points.len() as f64
}

/// Union of several raw contour sets into a canonical set of outers with
/// nested holes. Outers whose vertices are (near-)fully
/// covered by a larger outer are dropped as duplicates; everything else
/// passes through, including holes, which `partition` re-associates with
/// their parent outer.
pub fn union(sets: &[PolygonSet]) -> PolygonSet {
    let mut all: Vec<Polygon> = sets.iter().flat_map(|s| s.polygons.clone()).collect();
    all.sort_by(|a, b| {
        b.signed_area()
            .abs()
            .partial_cmp(&a.signed_area().abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<Polygon> = Vec::new();
    'outer: for candidate in all {
        if candidate.is_empty() {
            continue;
        }
        if candidate.is_ccw() {
            for existing in &kept {
                if !existing.is_ccw() {
                    continue;
                }
                let coverage = vertex_coverage(
                    &candidate,
                    &PolygonSet::from_polygons(vec![existing.clone()]),
                );
                if coverage > 0.999 {
                    // Fully-covered duplicate outer — drop it.
                    continue 'outer;
                }
            }
        }
        kept.push(candidate);
    }

    PolygonSet::from_polygons(kept)
}

/// `a` minus `b`, approximated via containment:
/// - a polygon of `a` with no vertex inside `b` is unaffected (kept whole);
/// - a polygon of `a` whose vertices are (near-)fully inside `b` is fully
///   subtracted (dropped);
/// - a polygon of `b` strictly inside a surviving polygon of `a` is kept
///   as an additional hole of the result (the common "subtract a smaller
///   nested region" case: cross-layer skin subtraction, support clearance
///   around a model outline);
/// - any other partial overlap is treated conservatively by keeping the
///   `a` polygon whole, which over-solidifies rather than leaving gaps.
pub fn difference(a: &PolygonSet, b: &PolygonSet) -> PolygonSet {
    if b.is_empty() {
        return a.clone();
    }

    let mut result = Vec::new();
    for pa in &a.polygons {
        if pa.is_empty() {
            continue;
        }
        let coverage = vertex_coverage(pa, b);
        if coverage > 0.999 {
            continue; // fully subtracted
        }
        result.push(pa.clone());
    }

    for pb in &b.polygons {
        if pb.is_empty() || !pb.is_ccw() {
            continue;
        }
        for pa in &mut result {
            if !pa.is_ccw() {
                continue;
            }
            let contained = vertex_coverage(pb, &PolygonSet::from_polygons(vec![pa.clone()]));
            if contained > 0.999 {
                let mut hole = pb.clone();
                hole.ensure_cw();
                // Represented as a sibling polygon in the same set; the
                // caller (LayerPartitioner) re-associates holes with
                // their parent outer by containment.
                result.push(hole);
            }
        }
    }

    PolygonSet::from_polygons(result)
}

/// Intersection of `a` and `b`, approximated via the same nesting rule as
/// `difference`: whichever polygon is the subset survives.
pub fn intersection(a: &PolygonSet, b: &PolygonSet) -> PolygonSet {
    if a.is_empty() || b.is_empty() {
        return PolygonSet::new();
    }
    let mut result = Vec::new();
    for pa in &a.polygons {
        if !pa.is_ccw() {
            continue;
        }
        for pb in &b.polygons {
            if !pb.is_ccw() {
                continue;
            }
            let a_in_b = vertex_coverage(pa, &PolygonSet::from_polygons(vec![pb.clone()]));
            let b_in_a = vertex_coverage(pb, &PolygonSet::from_polygons(vec![pa.clone()]));
            if a_in_b > 0.999 {
                result.push(pa.clone());
            } else if b_in_a > 0.999 {
                result.push(pb.clone());
            }
        }
    }
    PolygonSet::from_polygons(result)
}

/// Shrink every outer by `distance_um` and grow every hole by the same
/// amount (i.e. erode the solid region), dropping collapses. Used for
/// the support-sliver cleanup pass (erode then `dilate`).
pub fn erode(set: &PolygonSet, distance_um: f64) -> PolygonSet {
    set.offset(distance_um)
}

/// Inverse of `erode`: grow every outer and shrink every hole.
pub fn dilate(set: &PolygonSet, distance_um: f64) -> PolygonSet {
    set.offset(-distance_um)
}

/// Erode then dilate by the same distance — drops slivers narrower than
/// `2 * distance_um` without otherwise changing the outline
/// (used for support sliver cleanup).
pub fn open(set: &PolygonSet, distance_um: f64) -> PolygonSet {
    dilate(&erode(set, distance_um), distance_um)
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

    fn square_at(origin: Point, side: i64) -> Polygon {
        Polygon::new(vec![
            origin,
            Point::new(origin.x + side, origin.y),
            Point::new(origin.x + side, origin.y + side),
            Point::new(origin.x, origin.y + side),
        ])
    }

    #[test]
    fn union_drops_duplicate_outer() {
        let a = PolygonSet::from_polygons(vec![square(10_000)]);
        let b = PolygonSet::from_polygons(vec![square(10_000)]);
        let u = union(&[a, b]);
        assert_eq!(u.polygons.len(), 1);
    }

    #[test]
    fn difference_of_disjoint_keeps_a() {
        let a = PolygonSet::from_polygons(vec![square(10_000)]);
        let b = PolygonSet::from_polygons(vec![square_at(Point::new(50_000, 50_000), 10_000)]);
        let d = difference(&a, &b);
        assert_eq!(d.polygons.len(), 1);
    }

    #[test]
    fn difference_punches_nested_hole() {
        let outer = PolygonSet::from_polygons(vec![square(20_000)]);
        let inner = PolygonSet::from_polygons(vec![square_at(Point::new(5_000, 5_000), 5_000)]);
        let d = difference(&outer, &inner);
        assert_eq!(d.polygons.len(), 2);
        assert!(d.polygons[1].signed_area() < 0.0);
    }

    #[test]
    fn open_drops_tiny_sliver() {
        let sliver = PolygonSet::from_polygons(vec![square(100)]);
        let opened = open(&sliver, 200.0);
        assert!(opened.is_empty());
    }
}
