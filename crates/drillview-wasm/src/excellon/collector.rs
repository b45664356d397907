//! Turns decoded coordinate lines into drills and slots.
//!
//! Coordinates are modal: an axis missing from a line keeps its previous
//! value. `G85` slots keep their own modal position, separate from the one
//! shared by drills and routs.

use crate::geometry::Point;

use super::grammar::RoutMove;
use super::types::{Drill, Slot};

/// Largest `R<n>` repeat count that is expanded into drills.
pub const MAX_REPEAT_COUNT: u32 = 1_000_000;

/// What a coordinate line produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// This many drills were emitted.
    Drilled(usize),
    /// A `G00` opened a rout.
    RoutOpened,
    /// A `G01` closed the open rout into a slot.
    RoutClosed,
    /// The move belongs to a rout and emits nothing.
    RoutContinued,
    /// A coordinate was still unknown; nothing was emitted.
    MissingCoordinates,
}

/// Drills, slots and the modal positions used to build them.
#[derive(Debug, Clone, Default)]
pub struct FeatureCollector {
    drills: Vec<Drill>,
    slots: Vec<Slot>,
    current_x: Option<f64>,
    current_y: Option<f64>,
    slot_x: Option<f64>,
    slot_y: Option<f64>,
    rout_start: Option<Point>,
    routing_seen: bool,
    pending_repeat: u32,
}

impl FeatureCollector {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a repeat of the next drill `count` times.
    ///
    /// Returns `false` and disarms any pending repeat if `count` exceeds
    /// [`MAX_REPEAT_COUNT`].
    pub fn set_repeat(&mut self, count: u32) -> bool {
        if count > MAX_REPEAT_COUNT {
            self.pending_repeat = 0;
            return false;
        }
        self.pending_repeat = count;
        true
    }

    /// Applies a coordinate line with tool `tool` selected.
    ///
    /// With a repeat armed, the line's coordinates are a step: for `k` from
    /// the count down to 1, each axis present on the line lands at
    /// `k * step + previous`, and absent axes stay put.
    pub fn record_move(
        &mut self,
        x: Option<f64>,
        y: Option<f64>,
        rout: Option<RoutMove>,
        tool: &str,
    ) -> MoveOutcome {
        let repeat_base_x = x.and(self.current_x);
        let repeat_base_y = y.and(self.current_y);
        if x.is_some() {
            self.current_x = x;
        }
        if y.is_some() {
            self.current_y = y;
        }

        let (Some(px), Some(py)) = (self.current_x, self.current_y) else {
            return MoveOutcome::MissingCoordinates;
        };
        let point = Point::new(px, py);

        match (rout, self.rout_start) {
            (Some(RoutMove::Rapid), _) => {
                self.rout_start = Some(point);
                self.routing_seen = true;
                return MoveOutcome::RoutOpened;
            }
            (Some(RoutMove::Linear), Some(start)) => {
                self.slots.push(Slot {
                    start,
                    stop: point,
                    tool: tool.to_string(),
                });
                self.rout_start = None;
                return MoveOutcome::RoutClosed;
            }
            _ => {}
        }

        if self.routing_seen {
            return MoveOutcome::RoutContinued;
        }

        let count = std::mem::take(&mut self.pending_repeat);
        if count == 0 {
            self.push_drill(point, tool);
            return MoveOutcome::Drilled(1);
        }

        for step in (1..=count).rev() {
            let k = f64::from(step);
            let hit = Point::new(
                repeat_base_x.map_or(px, |base| k.mul_add(px, base)),
                repeat_base_y.map_or(py, |base| k.mul_add(py, base)),
            );
            self.push_drill(hit, tool);
        }
        MoveOutcome::Drilled(usize::try_from(count).unwrap_or(usize::MAX))
    }

    /// Applies a `G85` slot line. Returns `false` if a coordinate was unknown.
    ///
    /// Stop fields that are missing inherit the start fields of the same line.
    pub fn record_slot(
        &mut self,
        start: (Option<f64>, Option<f64>),
        stop: (Option<f64>, Option<f64>),
        tool: &str,
    ) -> bool {
        let start_point = self.advance_slot(start);
        let stop_point = self.advance_slot(stop);
        match (start_point, stop_point) {
            (Some(start), Some(stop)) => {
                self.slots.push(Slot {
                    start,
                    stop,
                    tool: tool.to_string(),
                });
                true
            }
            _ => false,
        }
    }

    fn advance_slot(&mut self, (x, y): (Option<f64>, Option<f64>)) -> Option<Point> {
        if x.is_some() {
            self.slot_x = x;
        }
        if y.is_some() {
            self.slot_y = y;
        }
        Some(Point::new(self.slot_x?, self.slot_y?))
    }

    fn push_drill(&mut self, point: Point, tool: &str) {
        self.drills.push(Drill {
            point,
            tool: tool.to_string(),
        });
    }

    /// Multiplies every collected and modal coordinate by `factor`.
    pub fn rescale(&mut self, factor: f64) {
        for drill in &mut self.drills {
            drill.point = Point::new(drill.point.x * factor, drill.point.y * factor);
        }
        for slot in &mut self.slots {
            slot.start = Point::new(slot.start.x * factor, slot.start.y * factor);
            slot.stop = Point::new(slot.stop.x * factor, slot.stop.y * factor);
        }
        for axis in [
            &mut self.current_x,
            &mut self.current_y,
            &mut self.slot_x,
            &mut self.slot_y,
        ] {
            *axis = axis.map(|value| value * factor);
        }
        self.rout_start = self
            .rout_start
            .map(|start| Point::new(start.x * factor, start.y * factor));
    }

    /// Drills collected so far.
    pub fn drills(&self) -> &[Drill] {
        &self.drills
    }

    /// Slots collected so far.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Returns `true` if a `G00` was left without its closing `G01`.
    pub const fn has_open_rout(&self) -> bool {
        self.rout_start.is_some()
    }

    /// Consumes the collector, discarding any unterminated rout.
    pub fn into_features(self) -> (Vec<Drill>, Vec<Slot>) {
        (self.drills, self.slots)
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn assert_point(actual: Point, x: f64, y: f64) {
        assert!(
            (actual.x - x).abs() < EPSILON && (actual.y - y).abs() < EPSILON,
            "expected ({x}, {y}), got ({}, {})",
            actual.x,
            actual.y
        );
    }

    #[test]
    fn ut_col_001_missing_axis_inherits_position() {
        let mut c = FeatureCollector::new();
        assert_eq!(c.record_move(Some(1.0), Some(2.0), None, "1"), MoveOutcome::Drilled(1));
        assert_eq!(c.record_move(Some(5.0), None, None, "1"), MoveOutcome::Drilled(1));
        assert_point(c.drills()[1].point, 5.0, 2.0);
    }

    #[test]
    fn ut_col_002_first_line_needs_both_axes() {
        let mut c = FeatureCollector::new();
        assert_eq!(
            c.record_move(Some(1.0), None, None, "1"),
            MoveOutcome::MissingCoordinates
        );
        assert!(c.drills().is_empty());
    }

    #[test]
    fn ut_col_003_repeat_counts_down_from_base() {
        let mut c = FeatureCollector::new();
        c.record_move(Some(10.0), Some(10.0), None, "1");
        assert!(c.set_repeat(3));
        assert_eq!(c.record_move(Some(1.0), Some(0.0), None, "1"), MoveOutcome::Drilled(3));

        let points: Vec<Point> = c.drills().iter().map(|d| d.point).collect();
        assert_eq!(points.len(), 4);
        assert_point(points[1], 13.0, 10.0);
        assert_point(points[2], 12.0, 10.0);
        assert_point(points[3], 11.0, 10.0);
    }

    #[test]
    fn ut_col_004_repeat_holds_absent_axis() {
        let mut c = FeatureCollector::new();
        c.record_move(Some(0.0), Some(5.0), None, "1");
        assert!(c.set_repeat(2));
        c.record_move(Some(2.0), None, None, "1");
        let points: Vec<Point> = c.drills().iter().map(|d| d.point).collect();
        assert_eq!(points.len(), 3);
        assert_point(points[1], 4.0, 5.0);
        assert_point(points[2], 2.0, 5.0);
    }

    #[test]
    fn ut_col_005_rout_becomes_slot() {
        let mut c = FeatureCollector::new();
        assert_eq!(
            c.record_move(Some(0.0), Some(0.0), Some(RoutMove::Rapid), "2"),
            MoveOutcome::RoutOpened
        );
        assert_eq!(
            c.record_move(Some(5.0), Some(0.0), Some(RoutMove::Linear), "2"),
            MoveOutcome::RoutClosed
        );
        assert_eq!(c.slots().len(), 1);
        assert_point(c.slots()[0].stop, 5.0, 0.0);
        assert_eq!(c.record_move(Some(7.0), Some(7.0), None, "2"), MoveOutcome::RoutContinued);
        assert!(c.drills().is_empty());
    }

    #[test]
    fn ut_col_006_slot_stop_inherits_start() {
        let mut c = FeatureCollector::new();
        assert!(c.record_slot((Some(1.0), Some(2.0)), (None, Some(4.0)), "1"));
        assert_point(c.slots()[0].stop, 1.0, 4.0);
        assert!(c.drills().is_empty());
    }

    #[test]
    fn ut_col_007_rescale_applies_to_modal_positions() {
        let mut c = FeatureCollector::new();
        c.record_move(Some(1.0), Some(1.0), None, "1");
        c.rescale(25.4);
        c.record_move(Some(50.8), None, None, "1");
        assert_point(c.drills()[0].point, 25.4, 25.4);
        assert_point(c.drills()[1].point, 50.8, 25.4);
    }

    #[test]
    fn bc_col_001_unterminated_rout_is_discarded() {
        let mut c = FeatureCollector::new();
        c.record_move(Some(0.0), Some(0.0), Some(RoutMove::Rapid), "2");
        assert!(c.has_open_rout());
        let (drills, slots) = c.into_features();
        assert!(drills.is_empty());
        assert!(slots.is_empty());
    }

    #[test]
    fn bc_col_002_slot_without_position_is_rejected() {
        let mut c = FeatureCollector::new();
        assert!(!c.record_slot((Some(1.0), None), (Some(2.0), None), "1"));
        assert!(c.slots().is_empty());
    }

    #[test]
    fn bc_col_003_repeat_above_cap_is_refused() {
        let mut c = FeatureCollector::new();
        c.record_move(Some(10.0), Some(10.0), None, "1");
        assert!(c.set_repeat(MAX_REPEAT_COUNT));
        assert!(!c.set_repeat(MAX_REPEAT_COUNT + 1));
        assert_eq!(c.record_move(Some(1.0), None, None, "1"), MoveOutcome::Drilled(1));
        assert_eq!(c.drills().len(), 2);
    }
}
