//! `PrintConfig` — every slicing option in one place, overridable from
//! the command line and round-trippable to a JSON sidecar.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use slicer_core::SlicerError;

/// Sparse infill pattern name, as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InfillTypeOption {
    /// Straight parallel lines.
    Lines,
    /// Crossed parallel lines.
    Grid,
}

/// Support pattern name, as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SupportTypeOption {
    /// Crossed parallel lines.
    Grid,
    /// Straight parallel lines.
    Lines,
}

/// All options for one print, realized as a single
/// serializable struct. Every length is in µm, every speed in mm/s,
/// every angle in integer degrees, matching the rest of the crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintConfig {
    // Layers & extrusion.
    /// Z step for every layer above the first, µm.
    pub layer_thickness_um: i64,
    /// Z step for layer 0, µm.
    pub first_layer_thickness_um: i64,
    /// Nominal bead width for layers above the first, µm.
    pub extrusion_width_um: i64,
    /// Bead width for layer 0, µm.
    pub first_layer_extrusion_width_um: i64,

    // Shells.
    /// Number of wall loops per part.
    pub number_of_perimeters: u32,
    /// Number of solid top layers.
    pub number_of_top_layers: usize,
    /// Number of solid bottom layers.
    pub number_of_bottom_layers: usize,

    // Infill.
    /// Sparse infill density, 0.0-1.0.
    pub infill_percent: f64,
    /// Infill pattern.
    pub infill_type: InfillTypeOption,
    /// Infill line angle for layer 0, integer degrees.
    pub infill_starting_angle: i32,
    /// How far infill lines extend into the surrounding perimeter, µm.
    pub infill_extend_into_perimeter_um: i64,

    // Support.
    /// Extruder index for support material; -1 disables support.
    pub support_extruder: i32,
    /// Overhang angle past which a face requires support, degrees.
    pub support_overhang_angle_deg: f64,
    /// XY clearance between support and model, µm.
    pub support_xy_distance_um: i64,
    /// Z clearance between support and model, µm.
    pub support_z_distance_um: i64,
    /// Spacing between support lines, µm.
    pub support_line_spacing_um: i64,
    /// Support fill pattern.
    pub support_type: SupportTypeOption,

    // Spiralize.
    /// Print the outer wall as a single continuously rising loop above
    /// the solid bottom layers (vase mode). Infill and inner walls are
    /// skipped on every layer this applies to.
    pub continuous_spiral_outer_perimeter: bool,

    // Raft.
    /// Emit a raft beneath the model.
    pub enable_raft: bool,
    /// Margin the raft extends past the model footprint, µm.
    pub raft_extra_distance_around_part_um: i64,
    /// Thickness of each raft base layer, µm.
    pub raft_base_thickness_um: i64,
    /// Thickness of each raft interface layer, µm.
    pub raft_interface_thickness_um: i64,
    /// Number of solid surface layers printed atop the raft, directly
    /// beneath the model's first layer.
    pub raft_surface_layers: u32,
    /// Thickness of each raft surface layer, µm.
    pub raft_surface_thickness_um: i64,
    /// Gap left between the top of the raft and the model's first
    /// layer, µm.
    pub raft_air_gap_um: i64,

    // Skirt.
    /// Number of skirt loops.
    pub number_of_skirt_loops: u32,
    /// Distance from the model to the innermost skirt loop, µm.
    pub skirt_distance_um: i64,
    /// Minimum total skirt length, µm (extra loops added to reach it).
    pub skirt_min_length_um: i64,

    // Multi-material.
    /// Wipe tower footprint side length, µm; ≤1 disables it.
    pub wipe_tower_size_um: i64,
    /// Distance from the model outline to the wipe shield, µm.
    pub wipe_shield_distance_from_shapes_um: i64,

    // Retraction.
    /// Filament pulled back per retraction, µm.
    pub retraction_amount_um: i64,
    /// Retraction speed, mm/s.
    pub retraction_speed: f64,
    /// Z-hop height during retraction, µm (0 disables).
    pub retraction_z_hop_um: i64,
    /// Extra retraction pulled back on an extruder switch, µm.
    pub retraction_amount_on_extruder_switch_um: i64,
    /// Shortest travel, µm, that triggers a retraction.
    pub minimum_travel_to_cause_retraction_um: i64,

    // Speeds.
    /// Travel (non-printing) speed, mm/s.
    pub travel_speed: f64,
    /// Sparse infill speed, mm/s.
    pub infill_speed: f64,
    /// Outermost wall speed, mm/s.
    pub outside_perimeter_speed: f64,
    /// Inner wall speed, mm/s.
    pub inside_perimeters_speed: f64,
    /// Layer-0 speed override, mm/s.
    pub first_layer_speed: f64,
    /// Floor speed below which minimum-layer-time derating will not go.
    pub minimum_printing_speed: f64,

    // Cooling.
    /// Minimum time a layer must take, seconds.
    pub minimum_layer_time_seconds: f64,
    /// Layer index at which the cooling fan reaches full speed.
    pub first_layer_to_allow_fan: usize,

    // Volumetric.
    /// Filament diameter, µm.
    pub filament_diameter_um: i64,

    // Placement.
    /// Center the model in XY before slicing.
    pub center_object_in_xy: bool,
    /// Clip this many µm off the model's bottom before slicing.
    pub bottom_clip_amount_um: i64,

    // Machine.
    /// Printer profile name (`PrinterProfile::all_profiles` name field).
    pub printer_profile: String,
}

impl Default for PrintConfig {
    fn default() -> Self {
        Self {
            layer_thickness_um: 200,
            first_layer_thickness_um: 300,
            extrusion_width_um: 450,
            first_layer_extrusion_width_um: 450,

            number_of_perimeters: 3,
            number_of_top_layers: 3,
            number_of_bottom_layers: 3,

            infill_percent: 0.2,
            infill_type: InfillTypeOption::Grid,
            infill_starting_angle: 45,
            infill_extend_into_perimeter_um: 200,

            support_extruder: -1,
            support_overhang_angle_deg: 45.0,
            support_xy_distance_um: 400,
            support_z_distance_um: 200,
            support_line_spacing_um: 2_000,
            support_type: SupportTypeOption::Grid,

            continuous_spiral_outer_perimeter: false,

            enable_raft: false,
            raft_extra_distance_around_part_um: 3_000,
            raft_base_thickness_um: 300,
            raft_interface_thickness_um: 270,
            raft_surface_layers: 2,
            raft_surface_thickness_um: 220,
            raft_air_gap_um: 220,

            number_of_skirt_loops: 1,
            skirt_distance_um: 3_000,
            skirt_min_length_um: 0,

            wipe_tower_size_um: 0,
            wipe_shield_distance_from_shapes_um: 0,

            retraction_amount_um: 1_000,
            retraction_speed: 35.0,
            retraction_z_hop_um: 0,
            retraction_amount_on_extruder_switch_um: 0,
            minimum_travel_to_cause_retraction_um: 2_000,

            travel_speed: 150.0,
            infill_speed: 60.0,
            outside_perimeter_speed: 45.0,
            inside_perimeters_speed: 45.0,
            first_layer_speed: 20.0,
            minimum_printing_speed: 10.0,

            minimum_layer_time_seconds: 5.0,
            first_layer_to_allow_fan: 2,

            filament_diameter_um: 1_750,

            center_object_in_xy: true,
            bottom_clip_amount_um: 0,

            printer_profile: "Generic".into(),
        }
    }
}

impl PrintConfig {
    /// Apply one `key=value` override, as passed via repeated `-s` flags.
    /// Keys are the struct's field names.
    pub fn apply_override(&mut self, key: &str, value: &str) -> Result<(), SlicerError> {
        macro_rules! int {
            ($field:ident) => {{
                self.$field = value
                    .parse()
                    .map_err(|_| bad_value(key, value))?;
                return Ok(());
            }};
        }
        macro_rules! float {
            ($field:ident) => {{
                self.$field = value
                    .parse()
                    .map_err(|_| bad_value(key, value))?;
                return Ok(());
            }};
        }
        macro_rules! boolean {
            ($field:ident) => {{
                self.$field = parse_bool(value).ok_or_else(|| bad_value(key, value))?;
                return Ok(());
            }};
        }

        match key {
            "layer_thickness_um" => int!(layer_thickness_um),
            "first_layer_thickness_um" => int!(first_layer_thickness_um),
            "extrusion_width_um" => int!(extrusion_width_um),
            "first_layer_extrusion_width_um" => int!(first_layer_extrusion_width_um),
            "number_of_perimeters" => int!(number_of_perimeters),
            "number_of_top_layers" => int!(number_of_top_layers),
            "number_of_bottom_layers" => int!(number_of_bottom_layers),
            "infill_percent" => float!(infill_percent),
            "infill_type" => {
                self.infill_type = match value.to_ascii_uppercase().as_str() {
                    "LINES" => InfillTypeOption::Lines,
                    "GRID" => InfillTypeOption::Grid,
                    _ => return Err(bad_value(key, value)),
                };
            }
            "infill_starting_angle" => int!(infill_starting_angle),
            "infill_extend_into_perimeter_um" => int!(infill_extend_into_perimeter_um),
            "support_extruder" => int!(support_extruder),
            "support_overhang_angle_deg" => float!(support_overhang_angle_deg),
            "support_xy_distance_um" => int!(support_xy_distance_um),
            "support_z_distance_um" => int!(support_z_distance_um),
            "support_line_spacing_um" => int!(support_line_spacing_um),
            "support_type" => {
                self.support_type = match value.to_ascii_uppercase().as_str() {
                    "GRID" => SupportTypeOption::Grid,
                    "LINES" => SupportTypeOption::Lines,
                    _ => return Err(bad_value(key, value)),
                };
            }
            "continuous_spiral_outer_perimeter" => boolean!(continuous_spiral_outer_perimeter),
            "enable_raft" => boolean!(enable_raft),
            "raft_extra_distance_around_part_um" => int!(raft_extra_distance_around_part_um),
            "raft_base_thickness_um" => int!(raft_base_thickness_um),
            "raft_interface_thickness_um" => int!(raft_interface_thickness_um),
            "raft_surface_layers" => int!(raft_surface_layers),
            "raft_surface_thickness_um" => int!(raft_surface_thickness_um),
            "raft_air_gap_um" => int!(raft_air_gap_um),
            "number_of_skirt_loops" => int!(number_of_skirt_loops),
            "skirt_distance_um" => int!(skirt_distance_um),
            "skirt_min_length_um" => int!(skirt_min_length_um),
            "wipe_tower_size_um" => int!(wipe_tower_size_um),
            "wipe_shield_distance_from_shapes_um" => int!(wipe_shield_distance_from_shapes_um),
            "retraction_amount_um" => int!(retraction_amount_um),
            "retraction_speed" => float!(retraction_speed),
            "retraction_z_hop_um" => int!(retraction_z_hop_um),
            "retraction_amount_on_extruder_switch_um" => {
                int!(retraction_amount_on_extruder_switch_um)
            }
            "minimum_travel_to_cause_retraction_um" => {
                int!(minimum_travel_to_cause_retraction_um)
            }
            "travel_speed" => float!(travel_speed),
            "infill_speed" => float!(infill_speed),
            "outside_perimeter_speed" => float!(outside_perimeter_speed),
            "inside_perimeters_speed" => float!(inside_perimeters_speed),
            "first_layer_speed" => float!(first_layer_speed),
            "minimum_printing_speed" => float!(minimum_printing_speed),
            "minimum_layer_time_seconds" => float!(minimum_layer_time_seconds),
            "first_layer_to_allow_fan" => int!(first_layer_to_allow_fan),
            "filament_diameter_um" => int!(filament_diameter_um),
            "center_object_in_xy" => boolean!(center_object_in_xy),
            "bottom_clip_amount_um" => int!(bottom_clip_amount_um),
            "printer_profile" => self.printer_profile = value.to_string(),
            _ => return Err(SlicerError::UnsupportedOption(key.to_string())),
        }
        Ok(())
    }

    /// Apply every `key=value` pair parsed from repeated `-s` flags.
    pub fn apply_overrides(&mut self, overrides: &[(String, String)]) -> Result<(), SlicerError> {
        for (key, value) in overrides {
            self.apply_override(key, value)?;
        }
        Ok(())
    }

    /// Reject configurations that make geometry impossible.
    pub fn validate(&self) -> Result<(), SlicerError> {
        if self.layer_thickness_um <= 0 || self.first_layer_thickness_um <= 0 {
            return Err(SlicerError::ConfigOutOfRange(
                "layer thickness must be positive".into(),
            ));
        }
        if self.extrusion_width_um <= 0 || self.first_layer_extrusion_width_um <= 0 {
            return Err(SlicerError::ConfigOutOfRange(
                "extrusion width must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.infill_percent) {
            return Err(SlicerError::ConfigOutOfRange(
                "infill_percent must be between 0.0 and 1.0".into(),
            ));
        }
        if self.filament_diameter_um <= 0 {
            return Err(SlicerError::ConfigOutOfRange(
                "filament_diameter_um must be positive".into(),
            ));
        }
        if self.minimum_printing_speed <= 0.0 {
            return Err(SlicerError::ConfigOutOfRange(
                "minimum_printing_speed must be positive".into(),
            ));
        }
        if self.number_of_perimeters == 0 && self.infill_percent > 0.0 {
            return Err(SlicerError::ConfigOutOfRange(
                "infill requested with zero walls to bound it".into(),
            ));
        }
        if self.enable_raft
            && (self.raft_base_thickness_um <= 0 || self.raft_interface_thickness_um <= 0)
        {
            return Err(SlicerError::ConfigOutOfRange(
                "raft base/interface thickness must be positive when enable_raft is set".into(),
            ));
        }
        Ok(())
    }
}

fn bad_value(key: &str, value: &str) -> SlicerError {
    SlicerError::ConfigOutOfRange(format!("invalid value for {key}: {value}"))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a single `-s key=value` argument.
pub fn parse_override_arg(arg: &str) -> Result<(String, String), SlicerError> {
    let (key, value) = arg.split_once('=').ok_or_else(|| {
        SlicerError::ConfigOutOfRange(format!("expected key=value, got '{arg}'"))
    })?;
    Ok((key.to_string(), value.to_string()))
}

/// Parse every `-s key=value` argument, preserving first-to-last order
/// (later duplicates win, matching `apply_overrides`'s sequential apply).
pub fn parse_override_args(args: &[String]) -> Result<Vec<(String, String)>, SlicerError> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<(String, String)> = Vec::new();
    for arg in args {
        let (key, value) = parse_override_arg(arg)?;
        if let Some(&idx) = seen.get(&key) {
            out[idx].1 = value;
        } else {
            seen.insert(key.clone(), out.len());
            out.push((key, value));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(PrintConfig::default().validate().is_ok());
    }

    #[test]
    fn override_applies_by_key_name() {
        let mut cfg = PrintConfig::default();
        cfg.apply_override("number_of_perimeters", "5").unwrap();
        assert_eq!(cfg.number_of_perimeters, 5);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let mut cfg = PrintConfig::default();
        assert!(cfg.apply_override("not_a_real_key", "1").is_err());
    }

    #[test]
    fn out_of_range_infill_percent_fails_validate() {
        let mut cfg = PrintConfig::default();
        cfg.infill_percent = 1.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn repeated_key_last_value_wins() {
        let args = vec!["number_of_perimeters=2".to_string(), "number_of_perimeters=4".to_string()];
        let overrides = parse_override_args(&args).unwrap();
        assert_eq!(overrides, vec![("number_of_perimeters".to_string(), "4".to_string())]);
    }
}
