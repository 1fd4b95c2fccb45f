#![warn(missing_docs)]

//! Mesh slicing and per-layer toolpath generation for the ffslicer FFF
//! pipeline.
//!
//! This crate is THE CORE: mesh indexing, plane-sweep slicing, per-layer
//! 2D polygon processing (partitioning, insets, skin, infill, support),
//! auxiliary print structures, and print-order optimization. It has no
//! opinion on G-code dialects or file I/O — see `slicer-gcode` and the
//! `slicer-cli` binary for those.

pub mod aux;
pub mod error;
pub mod geometry;
pub mod inset;
pub mod mesh;
pub mod partition;
pub mod path_order;
pub mod polygon_ops;
pub mod skin;
pub mod slice;

mod infill;
mod support;

pub use error::{Result, SlicerError};
pub use geometry::{Point, Polygon, PolygonSet};
pub use infill::{generate_infill, InfillPattern, InfillResult, InfillSettings};
pub use inset::{generate_insets, InsetSettings, PartInsets};
pub use mesh::{MeshIndex, Model, Placement, RotationMatrix, Triangle, Volume};
pub use partition::{partition_layer, LayerPart};
pub use path_order::{optimize_polygon_order, optimize_polyline_order, OrderedPolygon, SeamMode};
pub use skin::{compute_skin, SkinRegions, SkinSettings};
pub use slice::{generate_layer_heights, slice_mesh, SliceLayer};
pub use support::{generate_support, SupportSettings};
