//! GCodeEmitter: stateful, delta-tracking low-level G-code
//! formatting. Only axis/feedrate values that actually changed since
//! the last move are written, matching how the firmwares this crate
//! targets expect their motion commands.

use crate::flavor::GcodeFlavor;
use crate::printer::PrinterProfile;

/// One planned machine action.
#[derive(Debug, Clone)]
pub enum Move {
    /// Non-extruding travel move.
    Travel { x_mm: f64, y_mm: f64, z_mm: f64, feedrate_mm_s: f64 },
    /// Extruding move.
    Extrude {
        x_mm: f64,
        y_mm: f64,
        z_mm: f64,
        e_mm: f64,
        feedrate_mm_s: f64,
    },
    /// Pull filament back without moving the head.
    Retract { e_mm: f64, feedrate_mm_s: f64 },
    /// Push filament back out after a retraction.
    Unretract { e_mm: f64, feedrate_mm_s: f64 },
    /// Change the active hotend fan speed, 0-255.
    SetFanSpeed(u8),
    /// Set (and optionally wait for) a hotend temperature.
    SetToolTemp { extruder: u32, celsius: u32, wait: bool },
    /// Set (and optionally wait for) the bed temperature.
    SetBedTemp { celsius: u32, wait: bool },
    /// Switch active extruder.
    ToolChange(u32),
    /// A free-form comment line.
    Comment(String),
}

/// Tracks machine state and renders `Move`s into dialect-correct text.
pub struct GcodeEmitter {
    flavor: GcodeFlavor,
    out: String,
    pos: (f64, f64, f64),
    e_pos: f64,
    last_feedrate: Option<f64>,
    has_position: bool,
}

impl GcodeEmitter {
    /// Start a new emitter for the given machine profile.
    pub fn new(profile: &PrinterProfile) -> Self {
        Self {
            flavor: profile.flavor,
            out: String::new(),
            pos: (0.0, 0.0, 0.0),
            e_pos: 0.0,
            last_feedrate: None,
            has_position: false,
        }
    }

    /// Emit the dialect's start sequence, substituting temperatures.
    pub fn emit_start(&mut self, profile: &PrinterProfile, print_temp: u32, bed_temp: u32) {
        self.out
            .push_str(&format!(";Generated with ffslicer {}\n", env!("CARGO_PKG_VERSION")));

        if profile.flavor == GcodeFlavor::UltiGCode {
            // UltiGCode's header placeholders: the printer's own display
            // fills these in from the values it already has on-device,
            // so the slicer emits blanks rather than computed figures.
            self.out.push_str(";TYPE:UltiGCode\n");
            self.out.push_str(";TIME:0\n");
            self.out.push_str(";MATERIAL:0\n");
            self.out.push_str(";MATERIAL2:0\n");
        }

        let mut template = profile.flavor.start_gcode().to_string();
        if profile.flavor.emits_temperature_commands() {
            template = template
                .replace("{print_temp}", &print_temp.to_string())
                .replace("{bed_temp}", &bed_temp.to_string());
        } else {
            // UltiGCode keeps temperature on-device; strip the
            // placeholder lines entirely rather than leave raw braces.
            template = template
                .lines()
                .filter(|l| !l.contains('{'))
                .collect::<Vec<_>>()
                .join("\n");
        }
        self.out.push_str(&squeeze(&template));
        self.out.push('\n');
    }

    /// Emit the dialect's end sequence.
    pub fn emit_end(&mut self, profile: &PrinterProfile) {
        self.out.push_str(&squeeze(profile.flavor.end_gcode()));
        self.out.push('\n');
    }

    /// Emit a layer-change marker comment.
    pub fn emit_layer_change(&mut self, index: usize, z_mm: f64) {
        self.out
            .push_str(&self.flavor.layer_change_comment(index, z_mm));
        self.out.push('\n');
    }

    /// Emit one planned move.
    pub fn emit(&mut self, mv: &Move) {
        match *mv {
            Move::Travel { x_mm, y_mm, z_mm, feedrate_mm_s } => {
                self.write_motion("G0", Some((x_mm, y_mm, z_mm)), None, feedrate_mm_s);
            }
            Move::Extrude { x_mm, y_mm, z_mm, e_mm, feedrate_mm_s } => {
                self.write_motion("G1", Some((x_mm, y_mm, z_mm)), Some(e_mm), feedrate_mm_s);
            }
            Move::Retract { e_mm, feedrate_mm_s } => {
                let target = self.e_pos - e_mm;
                self.write_motion("G1", None, Some(target), feedrate_mm_s);
            }
            Move::Unretract { e_mm, feedrate_mm_s } => {
                let target = self.e_pos + e_mm;
                self.write_motion("G1", None, Some(target), feedrate_mm_s);
            }
            Move::SetFanSpeed(speed) => {
                self.out.push_str(&format!("M106 S{speed}\n"));
            }
            Move::SetToolTemp { extruder, celsius, wait } => {
                if !self.flavor.emits_temperature_commands() {
                    return;
                }
                let code = if wait { "M109" } else { "M104" };
                self.out.push_str(&format!("{code} T{extruder} S{celsius}\n"));
            }
            Move::SetBedTemp { celsius, wait } => {
                if !self.flavor.emits_temperature_commands() {
                    return;
                }
                let code = if wait { "M190" } else { "M140" };
                self.out.push_str(&format!("{code} S{celsius}\n"));
            }
            Move::ToolChange(index) => {
                self.out.push_str(&self.flavor.tool_change(index));
                self.out.push('\n');
            }
            Move::Comment(ref text) => {
                self.out.push(';');
                self.out.push_str(text);
                self.out.push('\n');
            }
        }
    }

    fn write_motion(
        &mut self,
        code: &str,
        xyz_mm: Option<(f64, f64, f64)>,
        e_mm: Option<f64>,
        feedrate_mm_s: f64,
    ) {
        let mut line = String::from(code);
        if let Some((x, y, z)) = xyz_mm {
            if !self.has_position || (x - self.pos.0).abs() > 1e-6 {
                line.push_str(&format!(" X{x:.3}"));
            }
            if !self.has_position || (y - self.pos.1).abs() > 1e-6 {
                line.push_str(&format!(" Y{y:.3}"));
            }
            if !self.has_position || (z - self.pos.2).abs() > 1e-6 {
                line.push_str(&format!(" Z{z:.3}"));
            }
            self.pos = (x, y, z);
            self.has_position = true;
        }
        if let Some(e) = e_mm {
            line.push_str(&format!(" {}{:.4}", self.flavor.extrusion_axis(), e));
            self.e_pos = e;
        }
        let feedrate_per_min = feedrate_mm_s * 60.0;
        if self.last_feedrate.map(|f| (f - feedrate_per_min).abs() > 1e-3).unwrap_or(true) {
            line.push_str(&format!(" F{feedrate_per_min:.1}"));
            self.last_feedrate = Some(feedrate_per_min);
        }
        self.out.push_str(&line);
        self.out.push('\n');
    }

    /// Consume the emitter, returning the accumulated G-code text.
    pub fn finish(self) -> String {
        self.out
    }
}

/// Collapse the multi-line, whitespace-indented templates in `flavor.rs`
/// into single trimmed lines.
fn squeeze(template: &str) -> String {
    template
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_feedrate_is_not_repeated() {
        let profile = PrinterProfile::generic();
        let mut e = GcodeEmitter::new(&profile);
        e.emit(&Move::Travel { x_mm: 0.0, y_mm: 0.0, z_mm: 0.2, feedrate_mm_s: 100.0 });
        e.emit(&Move::Travel { x_mm: 10.0, y_mm: 0.0, z_mm: 0.2, feedrate_mm_s: 100.0 });
        let text = e.finish();
        assert_eq!(text.matches('F').count(), 1);
    }

    #[test]
    fn ultigcode_omits_temperature_commands() {
        let profile = PrinterProfile::ultimaker();
        let mut e = GcodeEmitter::new(&profile);
        e.emit(&Move::SetToolTemp { extruder: 0, celsius: 210, wait: true });
        assert!(e.finish().is_empty());
    }

    #[test]
    fn mach3_uses_a_axis_for_extrusion() {
        let profile = PrinterProfile::mach3_gantry();
        let mut e = GcodeEmitter::new(&profile);
        e.emit(&Move::Extrude { x_mm: 1.0, y_mm: 1.0, z_mm: 0.2, e_mm: 0.5, feedrate_mm_s: 40.0 });
        let text = e.finish();
        assert!(text.contains('A'));
        assert!(!text.contains(" E"));
    }

    #[test]
    fn start_sequence_carries_a_version_header() {
        let profile = PrinterProfile::generic();
        let mut e = GcodeEmitter::new(&profile);
        e.emit_start(&profile, 210, 60);
        let text = e.finish();
        assert!(text.lines().next().unwrap().starts_with(";Generated with ffslicer"));
    }

    #[test]
    fn ultigcode_start_sequence_carries_header_placeholders() {
        let profile = PrinterProfile::ultimaker();
        let mut e = GcodeEmitter::new(&profile);
        e.emit_start(&profile, 210, 60);
        let text = e.finish();
        assert!(text.contains(";TYPE:UltiGCode"));
        assert!(text.contains(";TIME:"));
        assert!(text.contains(";MATERIAL:"));
        assert!(text.contains(";MATERIAL2:"));
    }

    #[test]
    fn feature_type_comment_has_no_space_after_semicolon() {
        let profile = PrinterProfile::generic();
        let mut e = GcodeEmitter::new(&profile);
        e.emit(&Move::Comment("TYPE:WALL-OUTER".into()));
        assert_eq!(e.finish(), ";TYPE:WALL-OUTER\n");
    }
}
