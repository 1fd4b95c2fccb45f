//! G-code dialect definitions.

use serde::{Deserialize, Serialize};

/// G-code flavor (dialect).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GcodeFlavor {
    /// RepRap firmware (Marlin-derived G-code with `M104`/`M109` etc).
    #[default]
    RepRap,
    /// Ultimaker's UltiGCode — temperature and material settings are
    /// stored on the printer, so the emitter omits `M104`/`M140`/`M200`.
    UltiGCode,
    /// BuildFilaments Dreamer (BFB) — uses `M108`/camera-style extruder
    /// select instead of `M104`/`T` tool-change.
    Bfb,
    /// MakerBot's dialect — `M135` tool select, no `G21`/`G90` assumed.
    MakerBot,
    /// Mach3 (CNC-derived) — uses `M03`/`M05` spindle-style camera
    /// commands in place of heater commands, and `A` instead of `E` for
    /// the extrusion axis.
    Mach3,
}

impl GcodeFlavor {
    /// Axis letter used for the extruder/filament axis.
    pub fn extrusion_axis(&self) -> char {
        match self {
            GcodeFlavor::Mach3 => 'A',
            _ => 'E',
        }
    }

    /// Whether this flavor expects `M104`/`M140`/`M109`/`M190` at all
    /// (UltiGCode keeps temperatures in printer-side material profiles).
    pub fn emits_temperature_commands(&self) -> bool {
        !matches!(self, GcodeFlavor::UltiGCode)
    }

    /// Tool/extruder-select command for switching to extruder `index`.
    pub fn tool_change(&self, index: u32) -> String {
        match self {
            GcodeFlavor::MakerBot => format!("M135 T{index}"),
            GcodeFlavor::Bfb => format!("M108 T{index}"),
            GcodeFlavor::Mach3 => format!("M06 T{index}"),
            _ => format!("T{index}"),
        }
    }

    /// Start G-code template for this flavor. `{print_temp}`/`{bed_temp}`
    /// are substituted by the emitter.
    pub fn start_gcode(&self) -> &'static str {
        match self {
            GcodeFlavor::RepRap => {
                "G28 ; home all axes\n\
                 G29 ; probe bed\n\
                 M104 S{print_temp} ; set nozzle temp\n\
                 M140 S{bed_temp} ; set bed temp\n\
                 M109 S{print_temp} ; wait for nozzle temp\n\
                 M190 S{bed_temp} ; wait for bed temp\n\
                 G92 E0 ; reset extruder\n"
            }
            GcodeFlavor::UltiGCode => {
                "G28 ; home all axes\n\
                 G92 E0 ; reset extruder\n"
            }
            GcodeFlavor::Bfb => {
                "M108 T0 ; select head\n\
                 G28 ; home\n\
                 M104 S{print_temp}\n\
                 M109 S{print_temp}\n\
                 G92 E0\n"
            }
            GcodeFlavor::MakerBot => {
                "M135 T0 ; select tool\n\
                 G162 X Y F2000 ; home XY\n\
                 G161 Z F900 ; home Z\n\
                 M104 S{print_temp} T0\n\
                 G92 E0\n"
            }
            GcodeFlavor::Mach3 => {
                "G28 ; home all axes\n\
                 M03 ; spindle/extruder on\n\
                 G92 A0 ; reset extrusion axis\n"
            }
        }
    }

    /// End G-code template for this flavor.
    pub fn end_gcode(&self) -> &'static str {
        match self {
            GcodeFlavor::RepRap => {
                "M104 S0 ; nozzle off\n\
                 M140 S0 ; bed off\n\
                 G91\n\
                 G1 E-2 F2700\n\
                 G1 Z10 F3000\n\
                 G90\n\
                 G1 X0 Y200 F3000\n\
                 M84 ; disable motors\n"
            }
            GcodeFlavor::UltiGCode => {
                "G91\n\
                 G1 E-2 F2700\n\
                 G1 Z10 F3000\n\
                 G90\n\
                 M84\n"
            }
            GcodeFlavor::Bfb => {
                "M104 S0\n\
                 G91\n\
                 G1 E-2 F2700\n\
                 G1 Z10 F3000\n\
                 G90\n\
                 M84\n"
            }
            GcodeFlavor::MakerBot => {
                "M104 S0 T0\n\
                 G91\n\
                 G1 E-2 F2700\n\
                 G1 Z10 F900\n\
                 G90\n\
                 M18\n"
            }
            GcodeFlavor::Mach3 => {
                "M05 ; spindle/extruder off\n\
                 G91\n\
                 G1 A-2 F2700\n\
                 G1 Z10 F3000\n\
                 G90\n"
            }
        }
    }

    /// Layer-change marker comment, if the dialect has a conventional one.
    pub fn layer_change_comment(&self, index: usize, z_mm: f64) -> String {
        match self {
            GcodeFlavor::MakerBot => format!("; <layer> {index} {z_mm:.3} </layer>"),
            _ => format!(";LAYER:{index}\n;Z:{z_mm:.3}"),
        }
    }
}
