//! The parsed drill document, its solid geometry and in-place transforms.
//!
//! Drills and slots are the source of truth; per-tool solid geometry is
//! derived from them by [`ExcellonDocument::synthesize`]. Translate, mirror,
//! rotate and skew rewrite both with the same affine map.
//! Scaling also changes tool diameters, so it resynthesizes instead.

use serde::Deserialize;

use crate::error::ExcellonError;
use crate::geometry::{buffer_point, buffer_segment, Affine, BoundingBox, Geometry, MirrorAxis, Point};

use super::tools::ToolTable;
use super::types::{
    DigitFormats, Drill, ParseWarnings, Slot, ToolSummary, Units, ZeroSuppression,
};

/// A transform request, as sent by the viewer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TransformOp {
    /// See [`ExcellonDocument::scale`].
    Scale {
        /// X scale factor.
        x_factor: f64,
        /// Y scale factor; defaults to `x_factor`.
        y_factor: Option<f64>,
        /// Scale origin; defaults to `(0, 0)`.
        origin: Option<Point>,
    },
    /// See [`ExcellonDocument::translate`].
    Translate {
        /// X offset.
        dx: f64,
        /// Y offset.
        dy: f64,
    },
    /// See [`ExcellonDocument::mirror`].
    Mirror {
        /// Mirror axis.
        axis: MirrorAxis,
        /// A point on the mirror line; defaults to `(0, 0)`.
        #[serde(default)]
        point: Point,
    },
    /// See [`ExcellonDocument::rotate`].
    Rotate {
        /// Counter-clockwise angle in degrees.
        angle: f64,
        /// Rotation origin; defaults to the centre of the bounds.
        origin: Option<Point>,
    },
    /// See [`ExcellonDocument::skew`].
    Skew {
        /// Shear angle along X, in degrees.
        angle_x: f64,
        /// Shear angle along Y, in degrees.
        angle_y: f64,
        /// Skew origin; defaults to `(0, 0)`.
        origin: Option<Point>,
    },
    /// See [`ExcellonDocument::convert_units`].
    ConvertUnits {
        /// Target units.
        units: Units,
    },
}

/// An Excellon drill file in memory.
#[derive(Debug, Clone)]
pub struct ExcellonDocument {
    units: Units,
    zeros: ZeroSuppression,
    formats: DigitFormats,
    tools: ToolTable,
    drills: Vec<Drill>,
    slots: Vec<Slot>,
    circle_segments: u32,
    source: String,
    warnings: ParseWarnings,
}

/// Fields a finished parse hands to the document.
#[derive(Debug)]
pub(crate) struct DocumentParts {
    pub units: Units,
    pub zeros: ZeroSuppression,
    pub formats: DigitFormats,
    pub tools: ToolTable,
    pub drills: Vec<Drill>,
    pub slots: Vec<Slot>,
    pub circle_segments: u32,
    pub source: String,
    pub warnings: ParseWarnings,
}

impl ExcellonDocument {
    pub(crate) fn from_parts(parts: DocumentParts) -> Self {
        let mut doc = Self {
            units: parts.units,
            zeros: parts.zeros,
            formats: parts.formats,
            tools: parts.tools,
            drills: parts.drills,
            slots: parts.slots,
            circle_segments: parts.circle_segments,
            source: parts.source,
            warnings: parts.warnings,
        };
        doc.synthesize();
        doc
    }

    /// Units of every coordinate and diameter.
    pub const fn units(&self) -> Units {
        self.units
    }

    /// Zero suppression mode in effect at the end of the file.
    pub const fn zeros(&self) -> ZeroSuppression {
        self.zeros
    }

    /// Coordinate formats in effect at the end of the file.
    pub const fn formats(&self) -> DigitFormats {
        self.formats
    }

    /// The tool table.
    pub const fn tools(&self) -> &ToolTable {
        &self.tools
    }

    /// Drill hits in file order.
    pub fn drills(&self) -> &[Drill] {
        &self.drills
    }

    /// Slots and routs in file order.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// The unmodified input text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Diagnostics from parsing and the last synthesis.
    pub const fn warnings(&self) -> &ParseWarnings {
        &self.warnings
    }

    /// Rebuilds every tool's solid geometry from the drills and slots.
    ///
    /// Features without a resolvable tool are left out and counted in
    /// [`ParseWarnings::unresolved_features`]. Returns that count.
    pub fn synthesize(&mut self) -> usize {
        for tool in self.tools.iter_mut() {
            tool.solid_geometry.clear();
        }

        let segments = self.circle_segments;
        let mut unresolved = Vec::new();

        for drill in &self.drills {
            match self.tools.get_mut(&drill.tool).filter(|_| !drill.tool.is_empty()) {
                Some(tool) => {
                    let radius = tool.diameter / 2.0;
                    tool.solid_geometry
                        .push(buffer_point(drill.point, radius, segments));
                }
                None => unresolved.push(format!(
                    "drill at ({}, {}) has no usable tool `{}`; skipping",
                    drill.point.x, drill.point.y, drill.tool
                )),
            }
        }

        for slot in &self.slots {
            match self.tools.get_mut(&slot.tool).filter(|_| !slot.tool.is_empty()) {
                Some(tool) => {
                    let radius = tool.diameter / 2.0;
                    tool.solid_geometry
                        .push(buffer_segment(slot.start, slot.stop, radius, segments));
                }
                None => unresolved.push(format!(
                    "slot from ({}, {}) to ({}, {}) has no usable tool `{}`; skipping",
                    slot.start.x, slot.start.y, slot.stop.x, slot.stop.y, slot.tool
                )),
            }
        }

        for msg in &unresolved {
            log::warn!("{msg}");
        }
        self.warnings.unresolved_features = unresolved.len();
        self.warnings.unresolved_messages = unresolved;
        self.warnings.unresolved_features
    }

    /// Union of every tool's solid geometry.
    pub fn solid_geometry(&self) -> Geometry {
        Geometry::Collection(self.tools.iter().map(super::types::Tool::geometry).collect())
    }

    /// `(min_x, min_y, max_x, max_y)` of the solid geometry.
    ///
    /// A document without tools or geometry reports `(0, 0, 0, 0)`.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.bounding_box().as_tuple()
    }

    /// Bounding box of the solid geometry; see [`ExcellonDocument::bounds`].
    pub fn bounding_box(&self) -> BoundingBox {
        if self.tools.is_empty() {
            return BoundingBox::zero();
        }
        let mut bounds = BoundingBox::new();
        for tool in &self.tools {
            for polygon in &tool.solid_geometry {
                if let Some(b) = polygon.bounds() {
                    bounds.merge(&b);
                }
            }
        }
        if bounds.is_empty() {
            BoundingBox::zero()
        } else {
            bounds
        }
    }

    /// Feature counts per tool, in tool-table order.
    pub fn tool_summaries(&self) -> Vec<ToolSummary> {
        self.tools
            .iter()
            .map(|tool| ToolSummary {
                id: tool.id.clone(),
                diameter: tool.diameter,
                placeholder: tool.placeholder,
                drill_count: self.drills.iter().filter(|d| d.tool == tool.id).count(),
                slot_count: self.slots.iter().filter(|s| s.tool == tool.id).count(),
            })
            .collect()
    }

    /// Replaces a tool's diameter and rebuilds the geometry.
    ///
    /// # Errors
    ///
    /// Returns [`ExcellonError::UnresolvedTool`] if the tool is not defined,
    /// or [`ExcellonError::Format`] for a non-positive diameter.
    pub fn set_tool_diameter(&mut self, id: &str, diameter: f64) -> Result<(), ExcellonError> {
        if !diameter.is_finite() || diameter <= 0.0 {
            return Err(ExcellonError::Format(format!(
                "tool diameter must be positive, got {diameter}"
            )));
        }
        let tool = self
            .tools
            .get_mut(id)
            .ok_or_else(|| ExcellonError::UnresolvedTool {
                tool: id.to_string(),
            })?;
        tool.diameter = diameter;
        tool.placeholder = false;
        self.warnings.diameterless = self.tools.has_placeholders();
        self.synthesize();
        Ok(())
    }

    /// Scales coordinates and diameters about `origin` (default `(0, 0)`).
    ///
    /// `y_factor` defaults to `x_factor`. Diameters scale by `|x_factor|`.
    /// Scaling by zero on both axes is ignored.
    pub fn scale(&mut self, x_factor: f64, y_factor: Option<f64>, origin: Option<Point>) {
        let y_factor = y_factor.unwrap_or(x_factor);
        if x_factor == 0.0 && y_factor == 0.0 {
            return;
        }
        let affine = Affine::scale(x_factor, y_factor, origin.unwrap_or_default());
        self.transform_features(&affine);
        self.tools.scale_diameters(x_factor.abs());
        self.synthesize();
    }

    /// Moves everything by `(dx, dy)`.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        self.apply_affine(&Affine::translate(dx, dy));
    }

    /// Mirrors across the line through `point` parallel to `axis`.
    pub fn mirror(&mut self, axis: MirrorAxis, point: Point) {
        self.apply_affine(&Affine::mirror(axis, point));
    }

    /// Rotates counter-clockwise by `angle_deg` about `origin`, which
    /// defaults to the centre of the bounds.
    pub fn rotate(&mut self, angle_deg: f64, origin: Option<Point>) {
        if angle_deg == 0.0 {
            return;
        }
        let origin = origin.unwrap_or_else(|| self.bounding_box().center());
        self.apply_affine(&Affine::rotate(angle_deg, origin));
    }

    /// Shears by the given angles about `origin` (default `(0, 0)`).
    pub fn skew(&mut self, angle_x_deg: f64, angle_y_deg: f64, origin: Option<Point>) {
        if angle_x_deg == 0.0 && angle_y_deg == 0.0 {
            return;
        }
        self.apply_affine(&Affine::skew(angle_x_deg, angle_y_deg, origin.unwrap_or_default()));
    }

    /// Converts coordinates and diameters into `target` units.
    ///
    /// Returns the factor applied: 25.4 to metric, 1/25.4 to inch, 1 if the
    /// units already match.
    pub fn convert_units(&mut self, target: Units) -> f64 {
        let factor = self.units.factor_to(target);
        self.units = target;
        if (factor - 1.0).abs() > f64::EPSILON {
            self.scale(factor, None, None);
        }
        factor
    }

    /// Applies a transform request.
    pub fn apply(&mut self, op: &TransformOp) {
        match *op {
            TransformOp::Scale {
                x_factor,
                y_factor,
                origin,
            } => self.scale(x_factor, y_factor, origin),
            TransformOp::Translate { dx, dy } => self.translate(dx, dy),
            TransformOp::Mirror { axis, point } => self.mirror(axis, point),
            TransformOp::Rotate { angle, origin } => self.rotate(angle, origin),
            TransformOp::Skew {
                angle_x,
                angle_y,
                origin,
            } => self.skew(angle_x, angle_y, origin),
            TransformOp::ConvertUnits { units } => {
                self.convert_units(units);
            }
        }
    }

    fn apply_affine(&mut self, affine: &Affine) {
        self.transform_features(affine);
        for tool in self.tools.iter_mut() {
            for polygon in &mut tool.solid_geometry {
                polygon.transform(affine);
            }
        }
    }

    fn transform_features(&mut self, affine: &Affine) {
        for drill in &mut self.drills {
            drill.point = affine.apply(drill.point);
        }
        for slot in &mut self.slots {
            slot.start = affine.apply(slot.start);
            slot.stop = affine.apply(slot.stop);
        }
    }
}
