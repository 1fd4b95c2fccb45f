//! SupportGenerator: per-layer support generation. Downward-facing
//! triangles are projected into XY columns, unioned per layer, cleared
//! of slivers, and propagated down to the build plate or the model
//! wherever no material exists to rest on.

use serde::{Deserialize, Serialize};
use crate::geometry::{Point, Polygon, PolygonSet};
use crate::mesh::MeshIndex;
use crate::polygon_ops;

/// Settings for support generation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SupportSettings {
    /// Overhang angle threshold, in degrees. Faces steeper than this
    /// (measured from horizontal) need support.
    pub overhang_angle_deg: f64,
    /// Z gap left between support and the model above it, in µm.
    pub z_distance_um: i64,
    /// XY clearance between support and the model, in µm.
    pub xy_distance_um: i64,
    /// Support structures narrower than this (after erode/dilate
    /// cleanup) are dropped as slivers, in µm.
    pub min_width_um: i64,
}

impl Default for SupportSettings {
    fn default() -> Self {
        Self {
            overhang_angle_deg: 45.0,
            z_distance_um: 200,
            xy_distance_um: 400,
            min_width_um: 800,
        }
    }
}

/// One downward-facing triangle's XY footprint and the Z span it covers.
struct OverhangFace {
    footprint: Polygon,
    z_min: i64,
    z_max: i64,
}

/// Per-face overhang predicate: true if the face's normal points down
/// steeper than `threshold_angle_deg` from horizontal.
fn is_overhang_face(mesh: &MeshIndex, tri_idx: usize, threshold_angle_deg: f64) -> bool {
    let tri = &mesh.triangles[tri_idx];
    let v0 = mesh.vertices[tri.v[0] as usize];
    let v1 = mesh.vertices[tri.v[1] as usize];
    let v2 = mesh.vertices[tri.v[2] as usize];

    let e1 = [
        (v1[0] - v0[0]) as f64,
        (v1[1] - v0[1]) as f64,
        (v1[2] - v0[2]) as f64,
    ];
    let e2 = [
        (v2[0] - v0[0]) as f64,
        (v2[1] - v0[1]) as f64,
        (v2[2] - v0[2]) as f64,
    ];
    let nx = e1[1] * e2[2] - e1[2] * e2[1];
    let ny = e1[2] * e2[0] - e1[0] * e2[2];
    let nz = e1[0] * e2[1] - e1[1] * e2[0];
    let len = (nx * nx + ny * ny + nz * nz).sqrt();
    if len < 1e-9 {
        return false;
    }
    let nz_norm = nz / len;

    // Angle from horizontal: 90deg = pointing straight down.
    let threshold_cos = (90.0 - threshold_angle_deg).to_radians().cos();
    nz_norm < -threshold_cos
}

fn collect_overhangs(mesh: &MeshIndex, settings: &SupportSettings) -> Vec<OverhangFace> {
    let mut faces = Vec::new();
    for ti in 0..mesh.triangles.len() {
        if !is_overhang_face(mesh, ti, settings.overhang_angle_deg) {
            continue;
        }
        let tri = &mesh.triangles[ti];
        let verts: Vec<Point> = tri
            .v
            .iter()
            .map(|&vi| {
                let v = mesh.vertices[vi as usize];
                Point::new(v[0], v[1])
            })
            .collect();
        let zs: Vec<i64> = tri
            .v
            .iter()
            .map(|&vi| mesh.vertices[vi as usize][2])
            .collect();
        let mut footprint = Polygon::new(verts);
        footprint.ensure_ccw();
        let Some(expanded) = footprint.offset(-(settings.xy_distance_um as f64)) else {
            continue;
        };
        faces.push(OverhangFace {
            footprint: expanded,
            z_min: *zs.iter().min().unwrap(),
            z_max: *zs.iter().max().unwrap(),
        });
    }
    faces
}

/// Generate support regions for every layer (same length/order as
/// `layer_zs` and `model_layers`).
///
/// `model_layers[i]` is the model's own solid region at `layer_zs[i]`,
/// used both to carve support away from the model (XY clearance already
/// applied to the overhang footprints) and to find where support can
/// rest without further propagation downward.
pub fn generate_support(
    mesh: &MeshIndex,
    layer_zs: &[i64],
    model_layers: &[PolygonSet],
    settings: &SupportSettings,
) -> Vec<PolygonSet> {
    let faces = collect_overhangs(mesh, settings);
    let erode_dist = settings.min_width_um as f64 / 2.0;

    let mut raw: Vec<PolygonSet> = layer_zs
        .iter()
        .map(|&z| {
            let active: Vec<Polygon> = faces
                .iter()
                .filter(|f| z >= f.z_min - settings.z_distance_um && z <= f.z_max)
                .map(|f| f.footprint.clone())
                .collect();
            if active.is_empty() {
                PolygonSet::new()
            } else {
                polygon_ops::union(&[PolygonSet::from_polygons(active)])
            }
        })
        .collect();

    for (i, region) in raw.iter_mut().enumerate() {
        if region.is_empty() {
            continue;
        }
        let cleared = polygon_ops::difference(region, &model_layers[i]);
        *region = polygon_ops::open(&cleared, erode_dist);
    }

    // Propagate support downward through any layer the model doesn't
    // occupy, so towers reach the build plate or the next solid layer.
    for i in (1..raw.len()).rev() {
        if raw[i].is_empty() {
            continue;
        }
        if !model_layers[i - 1].is_empty() {
            continue; // rests on the model here, no need to go lower
        }
        let extended = polygon_ops::union(&[raw[i - 1].clone(), raw[i].clone()]);
        raw[i - 1] = extended;
    }

    raw
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{Placement, RotationMatrix};

    #[test]
    fn default_settings_are_sane() {
        let s = SupportSettings::default();
        assert!((s.overhang_angle_deg - 45.0).abs() < 0.1);
        assert!(s.min_width_um > 0);
    }

    #[test]
    fn flat_downward_cap_is_detected_as_overhang() {
        // A single downward-facing triangle (CW as seen from above means
        // CCW from below => normal points down).
        let tris = vec![[[0.0, 0.0, 0.0], [0.0, 10.0, 0.0], [10.0, 0.0, 0.0]]];
        let mesh = MeshIndex::build(&tris, &RotationMatrix::identity(), &Placement::default())
            .unwrap();
        assert!(is_overhang_face(&mesh, 0, 45.0));
    }
}
