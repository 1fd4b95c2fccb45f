//! Pipeline: the five-stage lifecycle (`pre_setup`,
//! `prepare_model`, `process_slice_data`, `write_gcode`, `finalize`)
//! that drives slicer-core's mesh/layer processing and slicer-gcode's
//! planning/emission into one finished G-code file.

use std::path::Path;

use rayon::prelude::*;
use tracing::{info, warn};

use slicer_core::{
    compute_skin, generate_infill, generate_insets, generate_layer_heights, generate_support,
    optimize_polygon_order, optimize_polyline_order, partition_layer, slice_mesh, InfillPattern,
    InfillSettings, InsetSettings, LayerPart, MeshIndex, Model, OrderedPolygon, Placement, Point,
    Polygon, PolygonSet, RotationMatrix, SkinSettings, SliceLayer, SlicerError, SupportSettings,
    Volume,
};
use slicer_core::aux::{
    generate_raft_outline, generate_skirt, generate_wipe_shield, generate_wipe_tower,
    RaftSettings, SkirtSettings, WipeShieldSettings, WipeTowerSettings,
};

use crate::config::PrintConfig;
use crate::session::Session;
use slicer_gcode::{PlannedPart, PlannerSettings, PrinterProfile};

/// One volume's sliced layers plus its per-layer part/geometry build-up.
pub struct VolumeSlice {
    /// Extruder this volume prints with.
    pub extruder: u32,
    /// Raw sliced contours, one per layer.
    pub raw_layers: Vec<SliceLayer>,
    /// Partitioned, inset, skinned, filled geometry, one per layer.
    pub layers: Vec<LayerGeometry>,
}

/// One layer's fully processed print geometry for one volume.
pub struct LayerGeometry {
    /// Parts on this layer.
    pub parts: Vec<LayerPart>,
    /// Per-part wall loops, outside-in: `walls[part][level]` is every loop
    /// (outline + holes) making up wall level `level`, level 0 being the
    /// outermost.
    pub walls: Vec<Vec<Vec<Polygon>>>,
    /// Per-part fill lines (solid skin + sparse infill combined).
    pub fill_lines: Vec<Vec<Vec<Point>>>,
}

/// One generated raft layer beneath the model: its absolute print Z and
/// solid-filled outline.
pub struct RaftLayer {
    /// Top-of-layer Z, in µm, measured from the build plate.
    pub z_um: i64,
    /// This layer's thickness, in µm.
    pub thickness_um: i64,
    /// Solid outline this layer fills edge to edge.
    pub outline: Polygon,
}

/// Everything needed to emit G-code: per-volume layer geometry plus the
/// cross-volume auxiliary structures.
pub struct SliceData {
    /// Print-Z of every layer, ascending.
    pub layer_zs: Vec<i64>,
    /// Per-volume sliced and processed geometry.
    pub volumes: Vec<VolumeSlice>,
    /// Support region per layer (empty `PolygonSet` where none needed).
    pub support_layers: Vec<PolygonSet>,
    /// Skirt loops, printed once around layer 0.
    pub skirt: Vec<Polygon>,
    /// Raft layers (base, interface, surface), bottom to top. Empty when
    /// `enable_raft` is off.
    pub raft: Vec<RaftLayer>,
    /// Wipe shield outline for each model layer, when enabled.
    pub wipe_shields: Vec<Option<Polygon>>,
}

/// Drives one model from loaded triangles through to finished G-code.
pub struct Pipeline {
    config: PrintConfig,
    profile: PrinterProfile,
}

impl Pipeline {
    /// Resolve the configured printer profile and hold onto the config.
    pub fn new(config: PrintConfig) -> Result<Self, SlicerError> {
        let profile = PrinterProfile::all_profiles()
            .into_iter()
            .find(|p| p.name == config.printer_profile)
            .ok_or_else(|| {
                SlicerError::ConfigOutOfRange(format!(
                    "unknown printer_profile: {}",
                    config.printer_profile
                ))
            })?;
        Ok(Self { config, profile })
    }

    /// The resolved printer profile this pipeline emits for.
    pub fn profile(&self) -> &PrinterProfile {
        &self.profile
    }

    /// Stage 1: validate configuration before touching any geometry.
    pub fn pre_setup(&self) -> Result<(), SlicerError> {
        self.config.validate()?;
        info!(profile = %self.profile.name, "pipeline configured");
        Ok(())
    }

    /// Map every relevant `PrintConfig` field onto a `PlannerSettings`,
    /// so the move planner honors the same speeds, retraction, and
    /// volumetric settings the rest of the pipeline was configured with.
    pub fn planner_settings(&self) -> PlannerSettings {
        let c = &self.config;
        PlannerSettings {
            wall_speed_mm_s: c.outside_perimeter_speed,
            infill_speed_mm_s: c.infill_speed,
            travel_speed_mm_s: c.travel_speed,
            first_layer_speed_mm_s: c.first_layer_speed,
            retract_length_mm: c.retraction_amount_um as f64 / 1000.0,
            retract_speed_mm_s: c.retraction_speed,
            combing_travel_threshold_mm: c.minimum_travel_to_cause_retraction_um as f64 / 1000.0,
            z_hop_mm: c.retraction_z_hop_um as f64 / 1000.0,
            extruder_switch_retract_mm: c.retraction_amount_on_extruder_switch_um as f64 / 1000.0,
            min_layer_time_s: c.minimum_layer_time_seconds,
            min_speed_mm_s: c.minimum_printing_speed,
            fan_full_at_layer: c.first_layer_to_allow_fan,
            line_width_mm: c.extrusion_width_um as f64 / 1000.0,
            layer_height_mm: c.layer_thickness_um as f64 / 1000.0,
            filament_diameter_mm: c.filament_diameter_um as f64 / 1000.0,
        }
    }

    /// Total raft stack height plus air gap, in µm — the model is lifted
    /// by this much to leave room for the raft beneath it.
    fn raft_lift_um(&self) -> i64 {
        if !self.config.enable_raft {
            return 0;
        }
        self.config.raft_base_thickness_um
            + self.config.raft_interface_thickness_um
            + self.config.raft_surface_layers as i64 * self.config.raft_surface_thickness_um
            + self.config.raft_air_gap_um
    }

    /// Stage 2: weld and place every volume's raw triangles.
    pub fn prepare_model(
        &self,
        volumes_raw: Vec<(Vec<[[f64; 3]; 3]>, u32)>,
    ) -> Result<Model, SlicerError> {
        let placement = Placement {
            position_um: (0, 0),
            center_in_xy: self.config.center_object_in_xy,
            bottom_clip_um: self.config.bottom_clip_amount_um,
            z_lift_um: self.raft_lift_um(),
        };
        let mut volumes = Vec::with_capacity(volumes_raw.len());
        for (triangles, extruder) in volumes_raw {
            let mesh = MeshIndex::build(&triangles, &RotationMatrix::identity(), &placement)?;
            volumes.push(Volume { mesh, extruder });
        }
        let model = Model { volumes };
        if let Some((min, max)) = model.bounds() {
            info!(
                size_x_mm = (max[0] - min[0]) as f64 / 1000.0,
                size_y_mm = (max[1] - min[1]) as f64 / 1000.0,
                size_z_mm = (max[2] - min[2]) as f64 / 1000.0,
                "model prepared"
            );
        }
        Ok(model)
    }

    /// Stage 3: slice every volume and build each layer's walls, skin,
    /// infill, support, skirt, and raft.
    pub fn process_slice_data(&self, model: &Model) -> Result<SliceData, SlicerError> {
        let Some((_, max)) = model.bounds() else {
            return Err(SlicerError::SliceFailed("model has no volumes".into()));
        };
        let layer_zs = generate_layer_heights(
            max[2],
            self.config.first_layer_thickness_um,
            self.config.layer_thickness_um,
        );
        if layer_zs.is_empty() {
            return Err(SlicerError::SliceFailed("model produced zero layers".into()));
        }

        let mut volumes = Vec::with_capacity(model.volumes.len());
        for volume in &model.volumes {
            let raw_layers = slice_mesh(
                &volume.mesh,
                &layer_zs,
                true,
                self.config.extrusion_width_um,
            )?;
            let layers = self.build_layer_geometry(&raw_layers);
            volumes.push(VolumeSlice {
                extruder: volume.extruder,
                raw_layers,
                layers,
            });
        }

        let model_layers = merge_model_layers(&volumes, layer_zs.len());

        let support_layers = if self.config.support_extruder >= 0 {
            let settings = SupportSettings {
                overhang_angle_deg: self.config.support_overhang_angle_deg,
                z_distance_um: self.config.support_z_distance_um,
                xy_distance_um: self.config.support_xy_distance_um,
                min_width_um: self.config.support_line_spacing_um,
            };
            generate_support(&model.volumes[0].mesh, &layer_zs, &model_layers, &settings)
        } else {
            vec![PolygonSet::new(); layer_zs.len()]
        };

        let layer0_footprint = model_layers
            .first()
            .cloned()
            .unwrap_or_default();

        let skirt = generate_skirt(
            &layer0_footprint,
            &SkirtSettings {
                line_count: self.config.number_of_skirt_loops,
                distance_um: self.config.skirt_distance_um,
                line_width_um: self.config.first_layer_extrusion_width_um,
            },
        );

        let raft = if self.config.enable_raft {
            generate_raft_outline(
                &layer0_footprint,
                &RaftSettings {
                    margin_um: self.config.raft_extra_distance_around_part_um,
                },
            )
            .map(|outline| self.build_raft_layers(outline))
            .unwrap_or_default()
        } else {
            Vec::new()
        };

        let wipe_shields = if self.config.wipe_shield_distance_from_shapes_um > 0 {
            model_layers
                .iter()
                .map(|footprint| {
                    generate_wipe_shield(
                        footprint,
                        &WipeShieldSettings {
                            distance_um: self.config.wipe_shield_distance_from_shapes_um,
                        },
                    )
                })
                .collect()
        } else {
            vec![None; layer_zs.len()]
        };

        info!(layers = layer_zs.len(), raft_layers = raft.len(), "slicing complete");

        Ok(SliceData {
            layer_zs,
            volumes,
            support_layers,
            skirt,
            raft,
            wipe_shields,
        })
    }

    /// Build the raft's base, interface, and surface layers, stacked
    /// bottom to top directly beneath the model's lifted first layer.
    fn build_raft_layers(&self, outline: Polygon) -> Vec<RaftLayer> {
        let c = &self.config;
        let mut layers = Vec::with_capacity(2 + c.raft_surface_layers as usize);
        let mut z = 0i64;

        z += c.raft_base_thickness_um;
        layers.push(RaftLayer { z_um: z, thickness_um: c.raft_base_thickness_um, outline: outline.clone() });

        z += c.raft_interface_thickness_um;
        layers.push(RaftLayer { z_um: z, thickness_um: c.raft_interface_thickness_um, outline: outline.clone() });

        for _ in 0..c.raft_surface_layers {
            z += c.raft_surface_thickness_um;
            layers.push(RaftLayer { z_um: z, thickness_um: c.raft_surface_thickness_um, outline: outline.clone() });
        }

        layers
    }

    fn build_layer_geometry(&self, raw_layers: &[SliceLayer]) -> Vec<LayerGeometry> {
        // Partition and inset every layer independently first (rayon),
        // then compute skin sequentially since it needs neighbor windows.
        let per_layer: Vec<(Vec<LayerPart>, Vec<slicer_core::PartInsets>, PolygonSet)> = raw_layers
            .par_iter()
            .map(|layer| {
                let inset_settings = InsetSettings {
                    wall_count: self.config.number_of_perimeters,
                    line_width_um: self.config.extrusion_width_um,
                    spiralize: self.config.continuous_spiral_outer_perimeter
                        && layer.index >= self.config.number_of_bottom_layers,
                };
                let parts = partition_layer(layer, self.config.extrusion_width_um);
                let insets: Vec<slicer_core::PartInsets> = parts
                    .iter()
                    .map(|part| generate_insets(part, &inset_settings))
                    .collect();
                let boundary = PolygonSet::from_polygons(
                    insets.iter().flat_map(|i| i.infill_boundary.clone()).collect(),
                );
                (parts, insets, boundary)
            })
            .collect();

        let boundaries: Vec<PolygonSet> = per_layer.iter().map(|(_, _, b)| b.clone()).collect();
        let skin_settings = SkinSettings {
            top_layers: self.config.number_of_top_layers,
            bottom_layers: self.config.number_of_bottom_layers,
        };

        per_layer
            .into_iter()
            .enumerate()
            .map(|(i, (parts, insets, boundary))| {
                let above = window_above(&boundaries, i, skin_settings.top_layers);
                let below = window_below(&boundaries, i, skin_settings.bottom_layers);
                let skin = compute_skin(&boundary, &above, &below, &skin_settings);

                let mut fill_lines = Vec::with_capacity(parts.len());
                for part_insets in &insets {
                    let part_boundary = PolygonSet::from_polygons(part_insets.infill_boundary.clone());
                    let solid_here = slicer_core::polygon_ops::intersection(&skin.solid, &part_boundary);
                    let sparse_here = slicer_core::polygon_ops::intersection(&skin.sparse, &part_boundary);

                    let mut lines = Vec::new();
                    if !solid_here.is_empty() {
                        lines.extend(
                            generate_infill(
                                &solid_here,
                                &InfillSettings {
                                    pattern: InfillPattern::Lines,
                                    density: 1.0,
                                    line_width_um: self.config.extrusion_width_um,
                                    layer_index: i,
                                    bridge_angle_deg: None,
                                    extend_into_perimeter_um: self.config.infill_extend_into_perimeter_um,
                                },
                            )
                            .lines,
                        );
                    }
                    if !sparse_here.is_empty() && self.config.infill_percent > 0.0 {
                        let pattern = match self.config.infill_type {
                            crate::config::InfillTypeOption::Grid => InfillPattern::Grid,
                            crate::config::InfillTypeOption::Lines => InfillPattern::Lines,
                        };
                        lines.extend(
                            generate_infill(
                                &sparse_here,
                                &InfillSettings {
                                    pattern,
                                    density: self.config.infill_percent,
                                    line_width_um: self.config.extrusion_width_um,
                                    layer_index: i,
                                    bridge_angle_deg: None,
                                    extend_into_perimeter_um: self.config.infill_extend_into_perimeter_um,
                                },
                            )
                            .lines,
                        );
                    }
                    fill_lines.push(lines);
                }

                let walls: Vec<Vec<Vec<Polygon>>> = insets
                    .into_iter()
                    .map(|part_insets| part_insets.insets)
                    .collect();

                LayerGeometry {
                    parts,
                    walls,
                    fill_lines,
                }
            })
            .collect()
    }

    /// Stage 4: walk every layer in order, planning and emitting moves.
    ///
    /// Each "segment" within a layer (raft/skirt, one per-volume batch of
    /// parts, a wipe-tower pass on an extruder switch, support) is planned
    /// with its own `plan_layer` call so a tool change can be emitted
    /// between segments; the planner's position state still carries over
    /// call to call, so travel/retraction stay continuous across
    /// segments. Minimum-layer-time derating is therefore computed per
    /// segment rather than for the whole layer — a deliberate
    /// simplification for the multi-extruder case.
    pub fn write_gcode(&self, data: &SliceData, session: &mut Session) -> String {
        session.emit_start(&self.profile, self.profile.default_print_temp, self.profile.default_bed_temp);

        for (ri, raft_layer) in data.raft.iter().enumerate() {
            let z_mm = raft_layer.z_um as f64 / 1000.0;
            session.emit_layer_change(ri, z_mm);
            session.emit_feature_type("SKIRT");
            if !self.plan_raft_layer(session, ri, z_mm, &raft_layer.outline) {
                warn!(raft_layer = ri, "raft layer produced no printable geometry");
            }
        }

        for (index, &z) in data.layer_zs.iter().enumerate() {
            let z_mm = z as f64 / 1000.0;
            session.emit_layer_change(index, z_mm);
            let mut printed_anything = false;

            if index == 0 {
                for loop_poly in &data.skirt {
                    let part = solo_part(loop_poly.clone());
                    session.emit_feature_type("SKIRT");
                    printed_anything |= self.plan_outline_segment(session, index, z_mm, &part);
                }
            }

            if let Some(Some(shield)) = data.wipe_shields.get(index) {
                let part = solo_part(shield.clone());
                printed_anything |= self.plan_outline_segment(session, index, z_mm, &part);
            }

            for volume in &data.volumes {
                let Some(layer) = volume.layers.get(index) else { continue };

                if session.set_extruder(volume.extruder) {
                    session.emit_tool_change(volume.extruder);
                    if let Some(tower) = generate_wipe_tower(&WipeTowerSettings {
                        size_um: self.config.wipe_tower_size_um,
                        position_um: (0, 0),
                    }) {
                        let part = solo_part(tower);
                        printed_anything |= self.plan_outline_segment(session, index, z_mm, &part);
                    }
                }

                for (pi, part) in layer.parts.iter().enumerate() {
                    let mut end = Point::origin();
                    for (level, level_polys) in layer.walls[pi].iter().enumerate() {
                        if level_polys.is_empty() {
                            continue;
                        }
                        let (walls, new_end) = optimize_polygon_order(
                            level_polys,
                            end,
                            slicer_core::SeamMode::Nearest,
                        );
                        end = new_end;
                        session.emit_feature_type(if level == 0 { "WALL-OUTER" } else { "WALL-INNER" });
                        let planned = [PlannedPart {
                            part,
                            walls,
                            fill_lines: Vec::new(),
                        }];
                        let moves = session.planner_mut().plan_layer(index, z_mm, &planned);
                        printed_anything |= !moves.is_empty();
                        for mv in &moves {
                            session.emitter_mut().emit(mv);
                        }
                    }

                    if !layer.fill_lines[pi].is_empty() {
                        let (fill, _) = optimize_polyline_order(&layer.fill_lines[pi], end);
                        session.emit_feature_type("FILL");
                        let planned = [PlannedPart {
                            part,
                            walls: Vec::new(),
                            fill_lines: fill,
                        }];
                        let moves = session.planner_mut().plan_layer(index, z_mm, &planned);
                        printed_anything |= !moves.is_empty();
                        for mv in &moves {
                            session.emitter_mut().emit(mv);
                        }
                    }
                }
            }

            if let Some(support) = data.support_layers.get(index) {
                if !support.is_empty() && self.config.support_extruder >= 0 {
                    if let Some(part) = solo_part_set(support.clone()) {
                        let lines = generate_infill(
                            support,
                            &InfillSettings {
                                pattern: InfillPattern::Lines,
                                density: 0.2,
                                line_width_um: self.config.extrusion_width_um,
                                layer_index: index,
                                bridge_angle_deg: None,
                                extend_into_perimeter_um: 0,
                            },
                        )
                        .lines;
                        session.emit_feature_type("SUPPORT");
                        let planned = [PlannedPart {
                            part: &part,
                            walls: Vec::new(),
                            fill_lines: lines,
                        }];
                        let moves = session.planner_mut().plan_layer(index, z_mm, &planned);
                        printed_anything |= !moves.is_empty();
                        for mv in &moves {
                            session.emitter_mut().emit(mv);
                        }
                    }
                }
            }

            if !printed_anything {
                warn!(layer = index, "layer produced no printable geometry");
            }
        }

        session.emit_end(&self.profile);
        session.finish()
    }

    /// Plan and emit one solid-filled raft layer: an outline wall plus
    /// 100% density fill, at index 0 planner settings (first-layer speed,
    /// no fan) regardless of its position in the raft stack.
    fn plan_raft_layer(&self, session: &mut Session, raft_index: usize, z_mm: f64, outline: &Polygon) -> bool {
        let part = solo_part(outline.clone());
        let boundary = PolygonSet::from_polygons(vec![outline.clone()]);
        let fill = generate_infill(
            &boundary,
            &InfillSettings {
                pattern: InfillPattern::Lines,
                density: 1.0,
                line_width_um: self.config.first_layer_extrusion_width_um,
                layer_index: raft_index,
                bridge_angle_deg: None,
                extend_into_perimeter_um: 0,
            },
        )
        .lines;
        let planned = [PlannedPart {
            part: &part,
            walls: vec![OrderedPolygon {
                polygon: outline.clone(),
                start_vertex: 0,
            }],
            fill_lines: fill,
        }];
        let moves = session.planner_mut().plan_layer(0, z_mm, &planned);
        let printed = !moves.is_empty();
        for mv in &moves {
            session.emitter_mut().emit(mv);
        }
        printed
    }

    /// Plan and emit a single outline-only segment (skirt loop, wipe
    /// tower, or wipe shield), returning whether it produced any moves.
    fn plan_outline_segment(
        &self,
        session: &mut Session,
        index: usize,
        z_mm: f64,
        part: &LayerPart,
    ) -> bool {
        let planned = [PlannedPart {
            part,
            walls: vec![OrderedPolygon {
                polygon: part.outline.clone(),
                start_vertex: 0,
            }],
            fill_lines: Vec::new(),
        }];
        let moves = session.planner_mut().plan_layer(index, z_mm, &planned);
        let printed = !moves.is_empty();
        for mv in &moves {
            session.emitter_mut().emit(mv);
        }
        printed
    }

    /// Stage 5: write the finished G-code text to disk.
    pub fn finalize(&self, gcode: &str, output_path: &Path) -> std::io::Result<()> {
        std::fs::write(output_path, gcode)?;
        info!(path = %output_path.display(), bytes = gcode.len(), "g-code written");
        Ok(())
    }
}

fn solo_part(outline: Polygon) -> LayerPart {
    let comb_boundary = outline.clone();
    LayerPart {
        outline,
        holes: Vec::new(),
        comb_boundary,
    }
}

fn solo_part_set(set: PolygonSet) -> Option<LayerPart> {
    let mut polys = set.polygons.into_iter();
    let outline = polys.next()?;
    Some(LayerPart {
        comb_boundary: outline.clone(),
        outline,
        holes: polys.collect(),
    })
}

fn merge_model_layers(volumes: &[VolumeSlice], layer_count: usize) -> Vec<PolygonSet> {
    (0..layer_count)
        .map(|i| {
            let mut polys = Vec::new();
            for volume in volumes {
                if let Some(layer) = volume.layers.get(i) {
                    for part in &layer.parts {
                        polys.extend(part.polygons().polygons);
                    }
                }
            }
            PolygonSet::from_polygons(polys)
        })
        .collect()
}

fn window_above(boundaries: &[PolygonSet], index: usize, count: usize) -> Vec<PolygonSet> {
    boundaries
        .iter()
        .skip(index + 1)
        .take(count)
        .cloned()
        .collect()
}

fn window_below(boundaries: &[PolygonSet], index: usize, count: usize) -> Vec<PolygonSet> {
    let start = index.saturating_sub(count);
    boundaries[start..index].iter().rev().cloned().collect()
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
        faces.iter().map(|f| [v[f[0]], v[f[1]], v[f[2]]]).collect()
    }

    #[test]
    fn full_pipeline_runs_on_a_cube() {
        let config = PrintConfig::default();
        let pipeline = Pipeline::new(config).unwrap();
        pipeline.pre_setup().unwrap();

        let model = pipeline
            .prepare_model(vec![(unit_cube_mm(20.0), 0)])
            .unwrap();
        let slice_data = pipeline.process_slice_data(&model).unwrap();
        assert!(!slice_data.layer_zs.is_empty());

        let mut session = Session::new(pipeline.profile().clone(), pipeline.planner_settings(), 0);
        let gcode = pipeline.write_gcode(&slice_data, &mut session);
        assert!(gcode.contains("G1"));
        assert!(gcode.contains(";TYPE:WALL-OUTER"));
        assert!(gcode.contains(";TYPE:FILL"));
    }

    #[test]
    fn planner_settings_maps_config_fields() {
        let mut config = PrintConfig::default();
        config.retraction_z_hop_um = 400;
        config.retraction_amount_on_extruder_switch_um = 1_500;
        let pipeline = Pipeline::new(config).unwrap();
        let settings = pipeline.planner_settings();
        assert_eq!(settings.z_hop_mm, 0.4);
        assert_eq!(settings.extruder_switch_retract_mm, 1.5);
        assert_eq!(settings.wall_speed_mm_s, 45.0);
    }

    #[test]
    fn enabling_raft_lifts_the_model_and_emits_base_layers() {
        let mut config = PrintConfig::default();
        config.enable_raft = true;
        let pipeline = Pipeline::new(config).unwrap();
        pipeline.pre_setup().unwrap();

        let model = pipeline
            .prepare_model(vec![(unit_cube_mm(20.0), 0)])
            .unwrap();
        let slice_data = pipeline.process_slice_data(&model).unwrap();
        assert_eq!(
            slice_data.raft.len(),
            2 + pipeline.config.raft_surface_layers as usize
        );
        // Every model layer print-Z is offset above the raft stack + air gap.
        assert!(slice_data.layer_zs[0] > pipeline.raft_lift_um());

        let mut session = Session::new(pipeline.profile().clone(), pipeline.planner_settings(), 0);
        let gcode = pipeline.write_gcode(&slice_data, &mut session);
        assert!(gcode.contains(";LAYER:0"));
    }
}
