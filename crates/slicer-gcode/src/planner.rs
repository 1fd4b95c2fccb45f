//! GCodePlanner: turns one layer's ordered geometry into a flat
//! sequence of planned moves — travel/extrude decisions, combing,
//! retraction policy, minimum-layer-time speed scaling, and fan
//! scheduling.

use slicer_core::{LayerPart, OrderedPolygon, Point};

use serde::{Deserialize, Serialize};
use crate::emitter::Move;

/// Settings controlling move planning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlannerSettings {
    /// Wall (inset) print speed, mm/s.
    pub wall_speed_mm_s: f64,
    /// Infill/skin print speed, mm/s.
    pub infill_speed_mm_s: f64,
    /// Non-printing travel speed, mm/s.
    pub travel_speed_mm_s: f64,
    /// First-layer print speed override, mm/s.
    pub first_layer_speed_mm_s: f64,
    /// Filament pulled back on every retraction, mm.
    pub retract_length_mm: f64,
    /// Retraction speed, mm/s.
    pub retract_speed_mm_s: f64,
    /// Travel moves shorter than this, mm, skip retraction if the move
    /// stays within the part's comb boundary.
    pub combing_travel_threshold_mm: f64,
    /// Z lift applied during a retracted travel move, mm (0 disables).
    pub z_hop_mm: f64,
    /// Extra filament pulled back (beyond `retract_length_mm`) when
    /// switching extruders, mm.
    pub extruder_switch_retract_mm: f64,
    /// Minimum time a layer must take, seconds; slower than this and
    /// print speeds are derated.
    pub min_layer_time_s: f64,
    /// Floor below which speed derating will not go, mm/s.
    pub min_speed_mm_s: f64,
    /// Layer index at which the part cooling fan reaches full speed.
    pub fan_full_at_layer: usize,
    /// Nominal line width, mm (extrusion cross-section width).
    pub line_width_mm: f64,
    /// Layer height, mm (extrusion cross-section height).
    pub layer_height_mm: f64,
    /// Filament diameter, mm (extrusion cross-section divisor).
    pub filament_diameter_mm: f64,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            wall_speed_mm_s: 45.0,
            infill_speed_mm_s: 60.0,
            travel_speed_mm_s: 150.0,
            first_layer_speed_mm_s: 20.0,
            retract_length_mm: 1.0,
            retract_speed_mm_s: 35.0,
            combing_travel_threshold_mm: 2.0,
            z_hop_mm: 0.0,
            extruder_switch_retract_mm: 0.0,
            min_layer_time_s: 5.0,
            min_speed_mm_s: 10.0,
            fan_full_at_layer: 2,
            line_width_mm: 0.45,
            layer_height_mm: 0.2,
            filament_diameter_mm: 1.75,
        }
    }
}

/// One part's already-ordered print geometry for a layer, in µm.
pub struct PlannedPart<'a> {
    /// The part this geometry belongs to (its comb boundary gates
    /// retraction skipping).
    pub part: &'a LayerPart,
    /// Wall loops, outside-in, each already seam-selected.
    pub walls: Vec<OrderedPolygon>,
    /// Skin/infill lines, already nearest-neighbor ordered.
    pub fill_lines: Vec<Vec<Point>>,
}

/// Stateful planner carrying position, fan, and extrusion totals across
/// layers.
pub struct GcodePlanner {
    settings: PlannerSettings,
    current_pos_mm: (f64, f64),
    e_total_mm: f64,
    last_fan: Option<u8>,
    retracted: bool,
}

impl GcodePlanner {
    /// Construct a planner starting at the origin.
    pub fn new(settings: PlannerSettings) -> Self {
        Self {
            settings,
            current_pos_mm: (0.0, 0.0),
            e_total_mm: 0.0,
            last_fan: None,
            retracted: false,
        }
    }

    /// Moves for an extruder switch: an extra retraction (beyond whatever
    /// the travel to this point already pulled back) bracketing the
    /// tool-change command itself, then unretracted once the new
    /// extruder is selected.
    pub fn tool_change_moves(&self, extruder: u32) -> Vec<Move> {
        let extra = self.settings.extruder_switch_retract_mm;
        let mut moves = Vec::with_capacity(3);
        if extra > 0.0 {
            moves.push(Move::Retract {
                e_mm: extra,
                feedrate_mm_s: self.settings.retract_speed_mm_s,
            });
        }
        moves.push(Move::ToolChange(extruder));
        if extra > 0.0 {
            moves.push(Move::Unretract {
                e_mm: extra,
                feedrate_mm_s: self.settings.retract_speed_mm_s,
            });
        }
        moves
    }

    /// Plan one layer's moves.
    pub fn plan_layer(&mut self, layer_index: usize, z_mm: f64, parts: &[PlannedPart]) -> Vec<Move> {
        let base_wall_speed = if layer_index == 0 {
            self.settings.first_layer_speed_mm_s
        } else {
            self.settings.wall_speed_mm_s
        };
        let base_infill_speed = if layer_index == 0 {
            self.settings.first_layer_speed_mm_s
        } else {
            self.settings.infill_speed_mm_s
        };

        let total_length_mm = parts
            .iter()
            .flat_map(|p| p.walls.iter().map(|w| loop_length_mm(&w.polygon.points)))
            .sum::<f64>()
            + parts
                .iter()
                .flat_map(|p| p.fill_lines.iter().map(|l| polyline_length_mm(l)))
                .sum::<f64>();

        let naive_time_s = moved_time(total_length_mm, base_wall_speed.min(base_infill_speed));
        let scale = if naive_time_s > 0.0 && naive_time_s < self.settings.min_layer_time_s {
            self.settings.min_layer_time_s / naive_time_s
        } else {
            1.0
        };
        let wall_speed = (base_wall_speed / scale).max(self.settings.min_speed_mm_s);
        let infill_speed = (base_infill_speed / scale).max(self.settings.min_speed_mm_s);

        let mut moves = Vec::new();
        let fan = if layer_index >= self.settings.fan_full_at_layer {
            255
        } else {
            (255 * layer_index / self.settings.fan_full_at_layer.max(1)) as u8
        };
        if self.last_fan != Some(fan) {
            moves.push(Move::SetFanSpeed(fan));
            self.last_fan = Some(fan);
        }

        for part in parts {
            for wall in &part.walls {
                self.visit_loop(wall, part.part, z_mm, wall_speed, &mut moves);
            }
            for line in &part.fill_lines {
                self.visit_polyline(line, part.part, z_mm, infill_speed, &mut moves);
            }
        }

        moves
    }

    fn visit_loop(
        &mut self,
        wall: &OrderedPolygon,
        part: &LayerPart,
        z_mm: f64,
        speed_mm_s: f64,
        moves: &mut Vec<Move>,
    ) {
        let n = wall.polygon.points.len();
        if n < 3 {
            return;
        }
        let order: Vec<usize> = (0..n).map(|i| (wall.start_vertex + i) % n).collect();

        let start = to_mm(wall.polygon.points[order[0]]);
        self.travel_to(start, part, z_mm, moves);

        for &idx in &order[1..] {
            let p = to_mm(wall.polygon.points[idx]);
            self.extrude_to(p, z_mm, speed_mm_s, moves);
        }
        // Close the loop.
        self.extrude_to(start, z_mm, speed_mm_s, moves);
    }

    fn visit_polyline(
        &mut self,
        line: &[Point],
        part: &LayerPart,
        z_mm: f64,
        speed_mm_s: f64,
        moves: &mut Vec<Move>,
    ) {
        let Some(&first) = line.first() else { return };
        self.travel_to(to_mm(first), part, z_mm, moves);
        for &p in &line[1..] {
            self.extrude_to(to_mm(p), z_mm, speed_mm_s, moves);
        }
    }

    fn travel_to(&mut self, to: (f64, f64), part: &LayerPart, z_mm: f64, moves: &mut Vec<Move>) {
        let dist = dist_mm(self.current_pos_mm, to);
        if dist < 1e-6 {
            return;
        }

        let needs_retract = dist > self.settings.combing_travel_threshold_mm
            && !self.path_stays_inside(part, self.current_pos_mm, to);

        if needs_retract && !self.retracted {
            moves.push(Move::Retract {
                e_mm: self.settings.retract_length_mm,
                feedrate_mm_s: self.settings.retract_speed_mm_s,
            });
            self.retracted = true;
        }

        let hop = needs_retract && self.settings.z_hop_mm > 0.0;
        if hop {
            moves.push(Move::Travel {
                x_mm: self.current_pos_mm.0,
                y_mm: self.current_pos_mm.1,
                z_mm: z_mm + self.settings.z_hop_mm,
                feedrate_mm_s: self.settings.travel_speed_mm_s,
            });
        }

        moves.push(Move::Travel {
            x_mm: to.0,
            y_mm: to.1,
            z_mm: if hop { z_mm + self.settings.z_hop_mm } else { z_mm },
            feedrate_mm_s: self.settings.travel_speed_mm_s,
        });
        self.current_pos_mm = to;

        if hop {
            moves.push(Move::Travel {
                x_mm: to.0,
                y_mm: to.1,
                z_mm,
                feedrate_mm_s: self.settings.travel_speed_mm_s,
            });
        }

        if needs_retract {
            moves.push(Move::Unretract {
                e_mm: self.settings.retract_length_mm,
                feedrate_mm_s: self.settings.retract_speed_mm_s,
            });
            self.retracted = false;
        }
    }

    fn extrude_to(&mut self, to: (f64, f64), z_mm: f64, speed_mm_s: f64, moves: &mut Vec<Move>) {
        let dist = dist_mm(self.current_pos_mm, to);
        if dist < 1e-6 {
            return;
        }
        self.e_total_mm += self.volumetric_length(dist);
        moves.push(Move::Extrude {
            x_mm: to.0,
            y_mm: to.1,
            z_mm,
            e_mm: self.e_total_mm,
            feedrate_mm_s: speed_mm_s,
        });
        self.current_pos_mm = to;
    }

    /// Length of filament consumed extruding `travel_mm` of a bead with
    /// the configured line width and layer height.
    fn volumetric_length(&self, travel_mm: f64) -> f64 {
        let bead_area = self.settings.line_width_mm * self.settings.layer_height_mm;
        let filament_area =
            std::f64::consts::PI * (self.settings.filament_diameter_mm / 2.0).powi(2);
        travel_mm * bead_area / filament_area
    }

    /// Whether a straight travel move from `from` to `to` stays inside
    /// the part's comb boundary the whole way (sampled, not exact).
    fn path_stays_inside(&self, part: &LayerPart, from: (f64, f64), to: (f64, f64)) -> bool {
        use slicer_core::geometry::point_in_polygon;
        const SAMPLES: usize = 6;
        for i in 0..=SAMPLES {
            let t = i as f64 / SAMPLES as f64;
            let x = from.0 + (to.0 - from.0) * t;
            let y = from.1 + (to.1 - from.1) * t;
            let p = Point::new((x * 1000.0).round() as i64, (y * 1000.0).round() as i64);
            if !point_in_polygon(p, &part.comb_boundary) {
                return false;
            }
        }
        true
    }
}

fn to_mm(p: Point) -> (f64, f64) {
    (p.x as f64 / 1000.0, p.y as f64 / 1000.0)
}

fn dist_mm(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

fn loop_length_mm(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 2 {
        return 0.0;
    }
    (0..n)
        .map(|i| {
            let a = to_mm(points[i]);
            let b = to_mm(points[(i + 1) % n]);
            dist_mm(a, b)
        })
        .sum()
}

fn polyline_length_mm(points: &[Point]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    points
        .windows(2)
        .map(|w| dist_mm(to_mm(w[0]), to_mm(w[1])))
        .sum()
}

fn moved_time(length_mm: f64, speed_mm_s: f64) -> f64 {
    if speed_mm_s <= 0.0 {
        0.0
    } else {
        length_mm / speed_mm_s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slicer_core::Polygon;

    fn square_part(side: i64) -> LayerPart {
        let outline = Polygon::new(vec![
            Point::new(0, 0),
            Point::new(side, 0),
            Point::new(side, side),
            Point::new(0, side),
        ]);
        LayerPart {
            comb_boundary: outline.clone(),
            outline,
            holes: Vec::new(),
        }
    }

    #[test]
    fn plans_a_single_wall_loop_without_panicking() {
        let part = square_part(10_000);
        let wall = OrderedPolygon {
            polygon: part.outline.clone(),
            start_vertex: 0,
        };
        let mut planner = GcodePlanner::new(PlannerSettings::default());
        let planned = vec![PlannedPart {
            part: &part,
            walls: vec![wall],
            fill_lines: Vec::new(),
        }];
        let moves = planner.plan_layer(0, 0.2, &planned);
        assert!(moves.iter().any(|m| matches!(m, Move::Extrude { .. })));
    }

    #[test]
    fn short_layer_derates_speed_below_configured_default() {
        let part = square_part(1_000);
        let wall = OrderedPolygon {
            polygon: part.outline.clone(),
            start_vertex: 0,
        };
        let mut settings = PlannerSettings::default();
        settings.min_layer_time_s = 1000.0; // force derating
        let mut planner = GcodePlanner::new(settings);
        let planned = vec![PlannedPart {
            part: &part,
            walls: vec![wall],
            fill_lines: Vec::new(),
        }];
        let moves = planner.plan_layer(1, 0.4, &planned);
        let fastest = moves
            .iter()
            .filter_map(|m| match m {
                Move::Extrude { feedrate_mm_s, .. } => Some(*feedrate_mm_s),
                _ => None,
            })
            .fold(0.0_f64, f64::max);
        assert!(fastest < settings.wall_speed_mm_s);
    }

    #[test]
    fn z_hop_lifts_and_drops_around_a_retracted_travel() {
        let part = square_part(10_000);
        let mut settings = PlannerSettings::default();
        settings.combing_travel_threshold_mm = 0.0; // force retraction on any travel
        settings.z_hop_mm = 0.4;
        let mut planner = GcodePlanner::new(settings);
        let far_part = square_part(10_000);
        let mut moves = Vec::new();
        planner.travel_to((50.0, 50.0), &far_part, 0.2, &mut moves);
        let z_values: Vec<f64> = moves
            .iter()
            .filter_map(|m| match m {
                Move::Travel { z_mm, .. } => Some(*z_mm),
                _ => None,
            })
            .collect();
        assert!(z_values.iter().any(|&z| (z - 0.6).abs() < 1e-9));
        assert_eq!(*z_values.last().unwrap(), 0.2);
    }

    #[test]
    fn tool_change_brackets_with_extra_retraction_when_configured() {
        let mut settings = PlannerSettings::default();
        settings.extruder_switch_retract_mm = 5.0;
        let planner = GcodePlanner::new(settings);
        let moves = planner.tool_change_moves(1);
        assert!(matches!(moves[0], Move::Retract { e_mm, .. } if e_mm == 5.0));
        assert!(matches!(moves[1], Move::ToolChange(1)));
        assert!(matches!(moves[2], Move::Unretract { e_mm, .. } if e_mm == 5.0));
    }

    #[test]
    fn tool_change_is_bare_without_extra_retraction() {
        let planner = GcodePlanner::new(PlannerSettings::default());
        let moves = planner.tool_change_moves(2);
        assert_eq!(moves.len(), 1);
        assert!(matches!(moves[0], Move::ToolChange(2)));
    }
}
