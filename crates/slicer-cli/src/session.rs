//! Print session state: the emitter and planner for one output file,
//! replacing what a global emitter/file-counter would otherwise track.
//!
//! The "is this the first file in this print job" distinction is an
//! explicit constructor argument (`file_index`) rather than an instance
//! counter, so repeated slices of the same process never depend on call
//! order for correct start/end G-code.

use slicer_gcode::{GcodeEmitter, GcodePlanner, Move, PlannerSettings, PrinterProfile};

/// Owns the G-code emitter and planner for one output file.
pub struct Session {
    emitter: GcodeEmitter,
    planner: GcodePlanner,
    current_extruder: Option<u32>,
    /// Zero for the first file produced by this process, incrementing for
    /// each subsequent one.
    file_index: usize,
}

impl Session {
    /// Start a new session for the `file_index`-th output file.
    pub fn new(profile: PrinterProfile, planner_settings: PlannerSettings, file_index: usize) -> Self {
        Self {
            emitter: GcodeEmitter::new(&profile),
            planner: GcodePlanner::new(planner_settings),
            current_extruder: None,
            file_index,
        }
    }

    /// Whether this is the first file this process has written.
    pub fn is_first_file(&self) -> bool {
        self.file_index == 0
    }

    /// Emit the dialect start sequence. Subsequent files in the same job
    /// still get a full start sequence — each is a standalone G-code file
    /// on its own SD card or print slot — but callers may use
    /// `is_first_file` to suppress job-level one-time setup elsewhere.
    pub fn emit_start(&mut self, profile: &PrinterProfile, print_temp: u32, bed_temp: u32) {
        self.emitter.emit_start(profile, print_temp, bed_temp);
    }

    /// Emit the dialect end sequence.
    pub fn emit_end(&mut self, profile: &PrinterProfile) {
        self.emitter.emit_end(profile);
    }

    /// Emit a layer-change marker comment.
    pub fn emit_layer_change(&mut self, index: usize, z_mm: f64) {
        self.emitter.emit_layer_change(index, z_mm);
    }

    /// Emit a `;TYPE:<feature>` feature-type marker.
    pub fn emit_feature_type(&mut self, feature: &str) {
        self.emitter.emit(&Move::Comment(format!("TYPE:{feature}")));
    }

    /// Switch the active extruder if `extruder` differs from the current
    /// one. Returns true the first time each distinct extruder is
    /// selected after a change, signaling the caller to interpose a
    /// wipe-tower pass before resuming extrusion.
    pub fn set_extruder(&mut self, extruder: u32) -> bool {
        if self.current_extruder == Some(extruder) {
            return false;
        }
        self.current_extruder = Some(extruder);
        true
    }

    /// Emit the tool-change command for a just-registered extruder switch,
    /// bracketed by the configured extra retraction if any.
    pub fn emit_tool_change(&mut self, extruder: u32) {
        for mv in self.planner.tool_change_moves(extruder) {
            self.emitter.emit(&mv);
        }
    }

    /// Mutable access to the planner, for per-segment `plan_layer` calls.
    pub fn planner_mut(&mut self) -> &mut GcodePlanner {
        &mut self.planner
    }

    /// Mutable access to the emitter, to render a planned segment's moves.
    pub fn emitter_mut(&mut self) -> &mut GcodeEmitter {
        &mut self.emitter
    }

    /// Consume the session, returning the finished G-code text.
    pub fn finish(self) -> String {
        self.emitter.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_file_is_index_zero() {
        let session = Session::new(PrinterProfile::generic(), PlannerSettings::default(), 0);
        assert!(session.is_first_file());
    }

    #[test]
    fn subsequent_file_is_not_first() {
        let session = Session::new(PrinterProfile::generic(), PlannerSettings::default(), 1);
        assert!(!session.is_first_file());
    }

    #[test]
    fn extruder_switch_reported_once() {
        let mut session = Session::new(PrinterProfile::generic(), PlannerSettings::default(), 0);
        assert!(session.set_extruder(0));
        assert!(!session.set_extruder(0));
        assert!(session.set_extruder(1));
    }
}
