//! Slicer: plane-sweep intersection of triangles with each layer
//! plane, and chaining of the resulting segments into closed polygons.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::error::{Result, SlicerError};
use crate::geometry::{Point, Polygon};
use crate::mesh::MeshIndex;

/// One layer's raw (un-partitioned) contours from plane-sweep slicing.
#[derive(Debug, Clone)]
pub struct SliceLayer {
    /// Print Z of this layer, in µm (top of the layer).
    pub print_z: i64,
    /// Layer index, 0-based bottom to top.
    pub index: usize,
    /// Raw contours, winding not yet normalized beyond sign-of-area.
    pub contours: Vec<Polygon>,
}

/// Compute the ordered list of per-layer print-Z heights for a model of
/// the given total height, honoring a distinct first-layer thickness.
pub fn generate_layer_heights(
    model_height_um: i64,
    first_layer_thickness_um: i64,
    layer_thickness_um: i64,
) -> Vec<i64> {
    if model_height_um <= 0 || first_layer_thickness_um <= 0 || layer_thickness_um <= 0 {
        return Vec::new();
    }

    let mut heights = vec![first_layer_thickness_um];
    let mut z = first_layer_thickness_um;
    while z + layer_thickness_um <= model_height_um {
        z += layer_thickness_um;
        heights.push(z);
    }
    heights
}

/// One exit point of a triangle/plane intersection, tagged with the
/// triangle edge ordinal it lies on so the chain can continue via that
/// edge's neighbor.
#[derive(Debug, Clone, Copy)]
struct Exit {
    point: Point,
    edge: u8,
}

/// Intersect a single triangle against the plane at `z`, honoring the
/// "z-equal counts as above" tie-break so coplanar vertices are never
/// double-counted.
fn triangle_plane_intersection(mesh: &MeshIndex, tri_idx: usize, z: i64) -> Option<(Exit, Exit)> {
    let tri = &mesh.triangles[tri_idx];
    let verts: [[i64; 3]; 3] = [
        mesh.vertices[tri.v[0] as usize],
        mesh.vertices[tri.v[1] as usize],
        mesh.vertices[tri.v[2] as usize],
    ];
    let d: [i64; 3] = [verts[0][2] - z, verts[1][2] - z, verts[2][2] - z];
    // Tie-break: d == 0 counts as "above" (non-negative).
    let above = |v: i64| v >= 0;

    let mut exits: Vec<Exit> = Vec::with_capacity(2);
    for e in 0..3u8 {
        let a = e as usize;
        let b = (a + 1) % 3;
        if above(d[a]) == above(d[b]) {
            continue;
        }
        let da = d[a] as f64;
        let db = d[b] as f64;
        let t = da / (da - db);
        let x = verts[a][0] as f64 + t * (verts[b][0] - verts[a][0]) as f64;
        let y = verts[a][1] as f64 + t * (verts[b][1] - verts[a][1]) as f64;
        exits.push(Exit {
            point: Point::new(x.round() as i64, y.round() as i64),
            edge: e,
        });
    }

    if exits.len() == 2 {
        Some((exits[0], exits[1]))
    } else {
        None
    }
}

/// A per-triangle crossing segment plus the neighbor triangle reachable
/// through each endpoint's edge.
#[derive(Debug, Clone, Copy)]
struct Segment {
    p: [Point; 2],
    next_tri: [Option<u32>; 2],
    used: bool,
}

/// Slice one layer, chaining segments via triangle-face adjacency.
///
/// `repair_tolerance_um` is the distance within which open chain
/// endpoints are greedily stitched together when `repair_outlines` is
/// set; `None` discards open chains instead of closing them.
fn slice_layer_at(
    mesh: &MeshIndex,
    z: i64,
    index: usize,
    repair_tolerance_um: Option<i64>,
) -> SliceLayer {
    let mut by_tri: HashMap<u32, Segment> = HashMap::new();

    for (ti, tri) in mesh.triangles.iter().enumerate() {
        let vz: [i64; 3] = [
            mesh.vertices[tri.v[0] as usize][2],
            mesh.vertices[tri.v[1] as usize][2],
            mesh.vertices[tri.v[2] as usize][2],
        ];
        let (zmin, zmax) = (vz.iter().min().unwrap(), vz.iter().max().unwrap());
        if z < *zmin || z > *zmax {
            continue;
        }
        if let Some((e0, e1)) = triangle_plane_intersection(mesh, ti, z) {
            by_tri.insert(
                ti as u32,
                Segment {
                    p: [e0.point, e1.point],
                    next_tri: [tri.neighbor[e0.edge as usize], tri.neighbor[e1.edge as usize]],
                    used: false,
                },
            );
        }
    }

    let mut open_chains: Vec<Vec<Point>> = Vec::new();
    let mut closed: Vec<Polygon> = Vec::new();

    let tri_ids: Vec<u32> = by_tri.keys().copied().collect();
    for start_tri in tri_ids {
        let start_used = by_tri.get(&start_tri).map(|s| s.used).unwrap_or(true);
        if start_used {
            continue;
        }

        let first_seg = by_tri.get_mut(&start_tri).unwrap();
        first_seg.used = true;
        let start_point = first_seg.p[0];
        let mut chain = vec![first_seg.p[0], first_seg.p[1]];
        let mut cur_tri = start_tri;
        let mut cur_exit_slot = 1usize;
        let mut closed_loop = false;

        loop {
            let next_tri = by_tri.get(&cur_tri).unwrap().next_tri[cur_exit_slot];
            let Some(next_tri) = next_tri else {
                break; // dead end — open chain
            };
            let Some(next_seg) = by_tri.get_mut(&next_tri) else {
                break;
            };
            if next_seg.used {
                // Closes the loop if it connects back to the starting triangle.
                closed_loop = next_tri == start_tri;
                break;
            }
            next_seg.used = true;
            let exit_point = *chain.last().unwrap();
            // Whichever endpoint of the next segment is NOT the shared
            // entry point is where the chain continues.
            let exit_slot = if points_match(next_seg.p[0], exit_point) {
                1usize
            } else {
                0usize
            };
            chain.push(next_seg.p[exit_slot]);
            cur_tri = next_tri;
            cur_exit_slot = exit_slot;

            if points_match(*chain.last().unwrap(), start_point) {
                closed_loop = true;
                break;
            }
        }

        if closed_loop {
            chain.pop();
            if chain.len() >= 3 {
                closed.push(Polygon::new(chain));
            }
        } else if chain.len() >= 2 {
            open_chains.push(chain);
        }
    }

    if let Some(tol) = repair_tolerance_um {
        closed.extend(repair_open_chains(open_chains, tol));
    } else if !open_chains.is_empty() {
        tracing::warn!(
            layer = index,
            count = open_chains.len(),
            "discarding open contour chains (repair_outlines disabled)"
        );
    }

    for poly in &mut closed {
        if !poly.is_ccw() {
            poly.reverse();
        }
    }
    // Largest-area first is a convenient, deterministic canonical order
    // for downstream union/partition.
    closed.sort_by(|a, b| {
        b.signed_area()
            .abs()
            .partial_cmp(&a.signed_area().abs())
            .unwrap()
    });

    SliceLayer {
        print_z: z,
        index,
        contours: closed,
    }
}

fn points_match(a: Point, b: Point) -> bool {
    a.x == b.x && a.y == b.y
}

/// Greedily stitch open chain endpoints within `tolerance_um`, per
/// the repair-outlines option.
fn repair_open_chains(mut chains: Vec<Vec<Point>>, tolerance_um: i64) -> Vec<Polygon> {
    let mut closed = Vec::new();
    let tol = tolerance_um as f64;

    'outer: while let Some(mut chain) = chains.pop() {
        loop {
            let start = *chain.first().unwrap();
            let end = *chain.last().unwrap();
            if start.distance(end) <= tol && chain.len() >= 3 {
                closed.push(Polygon::new(chain));
                continue 'outer;
            }

            // Find nearest remaining chain endpoint to `end`.
            let mut best: Option<(usize, bool, f64)> = None;
            for (i, other) in chains.iter().enumerate() {
                let d_start = end.distance(*other.first().unwrap());
                let d_end = end.distance(*other.last().unwrap());
                if d_start <= tol && best.map(|(_, _, d)| d_start < d).unwrap_or(true) {
                    best = Some((i, false, d_start));
                }
                if d_end <= tol && best.map(|(_, _, d)| d_end < d).unwrap_or(true) {
                    best = Some((i, true, d_end));
                }
            }

            match best {
                Some((i, reversed, _)) => {
                    let mut other = chains.remove(i);
                    if reversed {
                        other.reverse();
                    }
                    chain.extend(other);
                }
                None => {
                    tracing::warn!(len = chain.len(), "open contour chain could not be repaired");
                    continue 'outer;
                }
            }
        }
    }

    closed
}

/// Slice a mesh at every requested layer height, in parallel (merged back
/// in ascending layer-index order).
pub fn slice_mesh(
    mesh: &MeshIndex,
    layer_zs: &[i64],
    repair_outlines: bool,
    extrusion_width_um: i64,
) -> Result<Vec<SliceLayer>> {
    if mesh.triangles.is_empty() {
        return Err(SlicerError::LoadError("mesh has no triangles".into()));
    }
    let tolerance = repair_outlines.then_some(extrusion_width_um);

    let layers: Vec<SliceLayer> = layer_zs
        .par_iter()
        .enumerate()
        .map(|(idx, &z)| slice_layer_at(mesh, z, idx, tolerance))
        .collect();

    Ok(layers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{MeshIndex, Placement, RotationMatrix};

    fn unit_cube_mm(size: f64) -> Vec<[[f64; 3]; 3]> {
        let s = size;
        let v = [
            [0.0, 0.0, 0.0],
            [s, 0.0, 0.0],
            [s, s, 0.0],
            [0.0, s, 0.0],
            [0.0, 0.0, s],
            [s, 0.0, s],
            [s, s, s],
            [0.0, s, s],
        ];
        let faces: [[usize; 3]; 12] = [
            [0, 2, 1],
            [0, 3, 2],
            [4, 5, 6],
            [4, 6, 7],
            [0, 1, 5],
            [0, 5, 4],
            [2, 3, 7],
            [2, 7, 6],
            [0, 4, 7],
            [0, 7, 3],
            [1, 2, 6],
            [1, 6, 5],
        ];
        faces
            .iter()
            .map(|f| [v[f[0]], v[f[1]], v[f[2]]])
            .collect()
    }

    #[test]
    fn layer_heights_cover_full_height() {
        // 20mm model, 300um first layer, 200um subsequent: matches S1.
        let heights = generate_layer_heights(20_000, 300, 200);
        assert_eq!(heights.len(), 99);
        assert_eq!(*heights.last().unwrap(), 20_000);
    }

    #[test]
    fn slices_cube_into_one_square_per_layer() {
        let tris = unit_cube_mm(20.0);
        let mesh = MeshIndex::build(
            &tris,
            &RotationMatrix::identity(),
            &Placement {
                center_in_xy: false,
                position_um: (0, 0),
                bottom_clip_um: 0,
                z_lift_um: 0,
            },
        )
        .unwrap();
        let heights = generate_layer_heights(20_000, 300, 200);
        let layers = slice_mesh(&mesh, &heights, false, 450).unwrap();
        assert_eq!(layers.len(), 99);
        for layer in &layers {
            assert_eq!(layer.contours.len(), 1);
            assert_eq!(layer.contours[0].len(), 4);
            assert!(layer.contours[0].is_ccw());
        }
    }

    #[test]
    fn winding_flip_produces_identical_contours() {
        let mut tris = unit_cube_mm(20.0);
        for tri in &mut tris {
            tri.swap(1, 2); // flip every facet's winding
        }
        let mesh = MeshIndex::build(
            &tris,
            &RotationMatrix::identity(),
            &Placement {
                center_in_xy: false,
                position_um: (0, 0),
                bottom_clip_um: 0,
                z_lift_um: 0,
            },
        )
        .unwrap();
        let layer = slice_layer_at(&mesh, 10_000, 0, None);
        assert_eq!(layer.contours.len(), 1);
        assert!(layer.contours[0].is_ccw());
    }
}
