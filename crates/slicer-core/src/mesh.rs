//! MeshIndex: vertex welding and face-adjacency indexing.
//!
//! Uses a plain hash map keyed on the quantized position, no spatial
//! tree, generalized from a single triangle list to a multi-volume model
//! placed in world space.

use std::collections::HashMap;

use crate::error::{Result, SlicerError};

/// A 3x3 rotation matrix applied to incoming mesh vertices before
/// quantization.
#[derive(Debug, Clone, Copy)]
pub struct RotationMatrix(pub [[f64; 3]; 3]);

impl RotationMatrix {
    /// Identity rotation.
    pub fn identity() -> Self {
        Self([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])
    }

    fn apply(&self, v: [f64; 3]) -> [f64; 3] {
        let m = &self.0;
        [
            m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
            m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
            m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
        ]
    }
}

/// Where to place the model's origin once rotated.
#[derive(Debug, Clone, Copy)]
pub struct Placement {
    /// Target X,Y of the object's placement point, in µm.
    pub position_um: (i64, i64),
    /// When true, `position_um` is the XY bounding-box center; otherwise
    /// it is the translation applied directly to raw coordinates.
    pub center_in_xy: bool,
    /// Clip this many µm off the bottom of the model before slicing.
    pub bottom_clip_um: i64,
    /// Lift the model this many µm above the build plate, to leave room
    /// for a raft (or other sub-model structure) printed beneath it.
    pub z_lift_um: i64,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            position_um: (0, 0),
            center_in_xy: true,
            bottom_clip_um: 0,
            z_lift_um: 0,
        }
    }
}

/// One welded triangle: three vertex indices plus the neighbor triangle
/// across each edge (`None` when the edge is a mesh boundary).
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    /// Vertex indices into `MeshIndex::vertices`.
    pub v: [u32; 3],
    /// Neighboring triangle index across edge `i` (between `v[i]` and
    /// `v[(i+1)%3]`), or `None` if unmatched.
    pub neighbor: [Option<u32>; 3],
}

/// One welded, adjacency-indexed mesh, in integer micrometers.
#[derive(Debug, Clone)]
pub struct MeshIndex {
    /// Deduplicated vertex positions, in µm.
    pub vertices: Vec<[i64; 3]>,
    /// Welded triangles with face adjacency.
    pub triangles: Vec<Triangle>,
    /// Bounding box minimum, in µm.
    pub min: [i64; 3],
    /// Bounding box maximum, in µm.
    pub max: [i64; 3],
}

impl MeshIndex {
    /// Bounding box size, in µm.
    pub fn size(&self) -> [i64; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    /// Build a welded, adjacency-indexed mesh from raw float triangles.
    ///
    /// `triangles` is a flat list of `(v0, v1, v2)` positions in mm, not
    /// yet deduplicated or welded.
    pub fn build(
        triangles: &[[[f64; 3]; 3]],
        rotation: &RotationMatrix,
        placement: &Placement,
    ) -> Result<Self> {
        if triangles.is_empty() {
            return Err(SlicerError::LoadError("mesh has zero triangles".into()));
        }

        // Quantize (mm -> um) after rotation, before translation, so we
        // can compute the pre-translation bounds needed for centering.
        let mut quantized: Vec<[[i64; 3]; 3]> = Vec::with_capacity(triangles.len());
        let mut raw_min = [i64::MAX; 3];
        let mut raw_max = [i64::MIN; 3];

        for tri in triangles {
            let mut qtri = [[0i64; 3]; 3];
            for (vi, vert) in tri.iter().enumerate() {
                let rotated = rotation.apply(*vert);
                for axis in 0..3 {
                    let um = (rotated[axis] * 1000.0).round() as i64;
                    qtri[vi][axis] = um;
                    raw_min[axis] = raw_min[axis].min(um);
                    raw_max[axis] = raw_max[axis].max(um);
                }
            }
            quantized.push(qtri);
        }

        let dx = if placement.center_in_xy {
            placement.position_um.0 - (raw_min[0] + raw_max[0]) / 2
        } else {
            placement.position_um.0 - raw_min[0]
        };
        let dy = if placement.center_in_xy {
            placement.position_um.1 - (raw_min[1] + raw_max[1]) / 2
        } else {
            placement.position_um.1 - raw_min[1]
        };
        let dz = -raw_min[2] - placement.bottom_clip_um + placement.z_lift_um;

        for tri in &mut quantized {
            for vert in tri.iter_mut() {
                vert[0] += dx;
                vert[1] += dy;
                vert[2] += dz;
            }
        }

        let mut vertex_map: HashMap<(i64, i64, i64), u32> = HashMap::new();
        let mut vertices: Vec<[i64; 3]> = Vec::new();
        let mut tri_indices: Vec<[u32; 3]> = Vec::with_capacity(quantized.len());

        for tri in &quantized {
            let mut idx = [0u32; 3];
            for (vi, vert) in tri.iter().enumerate() {
                let key = (vert[0], vert[1], vert[2]);
                idx[vi] = *vertex_map.entry(key).or_insert_with(|| {
                    vertices.push(*vert);
                    (vertices.len() - 1) as u32
                });
            }
            tri_indices.push(idx);
        }

        let neighbors = compute_adjacency(&tri_indices);

        let triangles = tri_indices
            .iter()
            .zip(neighbors)
            .map(|(v, neighbor)| Triangle { v: *v, neighbor })
            .collect();

        let mut min = [i64::MAX; 3];
        let mut max = [i64::MIN; 3];
        for v in &vertices {
            for axis in 0..3 {
                min[axis] = min[axis].min(v[axis]);
                max[axis] = max[axis].max(v[axis]);
            }
        }

        Ok(Self {
            vertices,
            triangles,
            min,
            max,
        })
    }
}

/// For each triangle edge `(v_a, v_b)`, two triangles are neighbors iff
/// their vertex pairs match as an unordered multiset (i.e. the opposite
/// triangle references the same edge in reverse winding).
fn compute_adjacency(triangles: &[[u32; 3]]) -> Vec<[Option<u32>; 3]> {
    let mut edge_map: HashMap<(u32, u32), (u32, u8)> = HashMap::new();
    let mut neighbors = vec![[None; 3]; triangles.len()];

    for (ti, tri) in triangles.iter().enumerate() {
        for e in 0..3 {
            let a = tri[e];
            let b = tri[(e + 1) % 3];
            let key = (a.min(b), a.max(b));
            if let Some((other_ti, other_e)) = edge_map.remove(&key) {
                neighbors[ti][e] = Some(other_ti);
                neighbors[other_ti as usize][other_e as usize] = Some(ti as u32);
            } else {
                edge_map.insert(key, (ti as u32, e as u8));
            }
        }
    }

    neighbors
}

/// One input mesh mapped to a single extruder.
#[derive(Debug, Clone)]
pub struct Volume {
    /// Welded, adjacency-indexed triangle mesh.
    pub mesh: MeshIndex,
    /// Extruder index this volume prints with.
    pub extruder: u32,
}

/// An ordered sequence of volumes sharing a common origin.
#[derive(Debug, Clone)]
pub struct Model {
    /// The volumes making up this model.
    pub volumes: Vec<Volume>,
}

impl Model {
    /// Overall bounding box across all volumes: (min, max), in µm.
    pub fn bounds(&self) -> Option<([i64; 3], [i64; 3])> {
        let mut min = [i64::MAX; 3];
        let mut max = [i64::MIN; 3];
        let mut any = false;
        for vol in &self.volumes {
            any = true;
            for axis in 0..3 {
                min[axis] = min[axis].min(vol.mesh.min[axis]);
                max[axis] = max[axis].max(vol.mesh.max[axis]);
            }
        }
        any.then_some((min, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn welds_shared_vertices() {
        let tris = unit_cube_mm(10.0);
        let mesh = MeshIndex::build(&tris, &RotationMatrix::identity(), &Placement::default())
            .unwrap();
        // A cube has 8 distinct corners however many triangles reference them.
        assert_eq!(mesh.vertices.len(), 8);
        assert_eq!(mesh.triangles.len(), 12);
    }

    #[test]
    fn every_interior_edge_has_a_neighbor() {
        let tris = unit_cube_mm(10.0);
        let mesh = MeshIndex::build(&tris, &RotationMatrix::identity(), &Placement::default())
            .unwrap();
        for tri in &mesh.triangles {
            assert!(tri.neighbor.iter().all(|n| n.is_some()));
        }
    }

    #[test]
    fn bounds_are_in_micrometers() {
        let tris = unit_cube_mm(10.0);
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
        assert_eq!(mesh.size(), [10_000, 10_000, 10_000]);
    }

    #[test]
    fn empty_mesh_is_rejected() {
        let err = MeshIndex::build(&[], &RotationMatrix::identity(), &Placement::default());
        assert!(err.is_err());
    }
}
