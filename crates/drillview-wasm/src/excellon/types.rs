//! Excellon drill file types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ExcellonError;
use crate::geometry::{Geometry, Point, Polygon};

/// Millimeters per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// Unit system for Excellon files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Metric (millimeters).
    Metric,
    /// Imperial (inches).
    Inch,
}

impl Units {
    /// Lowercase name used in metadata and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Inch => "inch",
        }
    }

    /// Factor that converts a length in `self` into `target`.
    pub fn factor_to(self, target: Self) -> f64 {
        match (self, target) {
            (Self::Inch, Self::Metric) => MM_PER_INCH,
            (Self::Metric, Self::Inch) => 1.0 / MM_PER_INCH,
            _ => 1.0,
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Zero suppression mode of implicit-decimal coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZeroSuppression {
    /// `LZ`: leading zeros are always written and trailing zeros may be
    /// dropped, so the decimal point sits `upper` digits from the left.
    Leading,
    /// `TZ`: trailing zeros are always written and leading zeros may be
    /// dropped, so the decimal point sits `lower` digits from the right.
    Trailing,
}

/// Fixed-point coordinate format: integer and fractional digit counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinateFormat {
    /// Integer digits.
    pub upper: u8,
    /// Fractional digits.
    pub lower: u8,
}

impl CoordinateFormat {
    /// Creates a format from its digit counts.
    pub const fn new(upper: u8, lower: u8) -> Self {
        Self { upper, lower }
    }
}

impl fmt::Display for CoordinateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.upper, self.lower)
    }
}

impl FromStr for CoordinateFormat {
    type Err = ExcellonError;

    /// Accepts `3.3`, `3:3` and digit templates such as `000.000`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        let Some((upper_raw, lower_raw)) = raw.split_once(['.', ':']) else {
            return Err(ExcellonError::Format(format!(
                "invalid coordinate format `{raw}`"
            )));
        };

        let is_template = |part: &str| !part.is_empty() && part.chars().all(|ch| ch == '0');
        let digits = |part: &str| -> Result<u8, ExcellonError> {
            if is_template(part) && part.len() > 1 {
                return u8::try_from(part.len())
                    .map_err(|_| ExcellonError::Format(format!("format `{raw}` is too long")));
            }
            part.parse::<u8>()
                .map_err(|err| ExcellonError::Format(format!("invalid format `{raw}`: {err}")))
        };

        if is_template(upper_raw) && is_template(lower_raw) {
            let upper = u8::try_from(upper_raw.len())
                .map_err(|_| ExcellonError::Format(format!("format `{raw}` is too long")))?;
            let lower = u8::try_from(lower_raw.len())
                .map_err(|_| ExcellonError::Format(format!("format `{raw}` is too long")))?;
            return Ok(Self::new(upper, lower));
        }

        Ok(Self::new(digits(upper_raw)?, digits(lower_raw)?))
    }
}

/// Coordinate formats tracked independently for each unit system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitFormats {
    /// Format used while the active units are metric.
    pub metric: CoordinateFormat,
    /// Format used while the active units are inches.
    pub inch: CoordinateFormat,
}

impl DigitFormats {
    /// Format for the given unit system.
    pub const fn for_units(&self, units: Units) -> CoordinateFormat {
        match units {
            Units::Metric => self.metric,
            Units::Inch => self.inch,
        }
    }

    /// Replaces the format of one unit system.
    pub fn set(&mut self, units: Units, format: CoordinateFormat) {
        match units {
            Units::Metric => self.metric = format,
            Units::Inch => self.inch = format,
        }
    }
}

/// A drilling tool and the solid geometry cut with it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tool {
    /// Normalized identifier (tool number without leading zeros).
    pub id: String,
    /// Drill diameter in the document's units.
    pub diameter: f64,
    /// `true` when the diameter is a synthetic placeholder.
    pub placeholder: bool,
    /// Circles and capsules cut by this tool.
    pub solid_geometry: Vec<Polygon>,
}

impl Tool {
    /// Creates a tool without geometry.
    pub const fn new(id: String, diameter: f64, placeholder: bool) -> Self {
        Self {
            id,
            diameter,
            placeholder,
            solid_geometry: Vec::new(),
        }
    }

    /// The tool's geometry as a collection.
    pub fn geometry(&self) -> Geometry {
        Geometry::Collection(
            self.solid_geometry
                .iter()
                .cloned()
                .map(Geometry::Polygon)
                .collect(),
        )
    }
}

/// A single drill hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Drill {
    /// Hole centre.
    pub point: Point,
    /// Tool identifier; empty when no tool was ever selected.
    pub tool: String,
}

/// A drilled slot or a routed path between two points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slot {
    /// Start of the slot centreline.
    pub start: Point,
    /// End of the slot centreline.
    pub stop: Point,
    /// Tool identifier; empty when no tool was ever selected.
    pub tool: String,
}

/// Per-tool feature counts, in tool-table order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSummary {
    /// Normalized tool identifier.
    pub id: String,
    /// Drill diameter in the document's units.
    pub diameter: f64,
    /// Whether the diameter is a placeholder.
    pub placeholder: bool,
    /// Number of drills using this tool.
    pub drill_count: usize,
    /// Number of slots using this tool.
    pub slot_count: usize,
}

/// Diagnostics collected while parsing and synthesizing geometry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseWarnings {
    /// Tools were given placeholder diameters the user must correct.
    pub diameterless: bool,
    /// Features dropped while parsing because coordinates were unusable.
    pub skipped_features: usize,
    /// Features left out of the last geometry synthesis for lack of a tool.
    pub unresolved_features: usize,
    /// Lines no dialect rule recognized.
    pub unresolved_lines: usize,
    /// Human-readable warning messages raised while parsing.
    pub messages: Vec<String>,
    /// One message per feature left out of the last geometry synthesis.
    pub unresolved_messages: Vec<String>,
}

impl ParseWarnings {
    /// Records a warning message.
    pub fn warn(&mut self, msg: String) {
        self.messages.push(msg);
    }

    /// Parse messages followed by the synthesis messages.
    pub fn all_messages(&self) -> impl Iterator<Item = &str> {
        self.messages
            .iter()
            .chain(&self.unresolved_messages)
            .map(String::as_str)
    }
}

/// Terminal status of a parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum ParseStatus {
    /// The file was parsed.
    Ok,
    /// The file is G-code, not an Excellon drill file.
    AbortedNotExcellon {
        /// 1-based line number of the G-code marker.
        line_number: usize,
    },
    /// The parse was cancelled by the caller.
    Cancelled,
    /// The parse failed on an unexpected condition.
    InternalError {
        /// 1-based line number, or 0 when no line was involved.
        line_number: usize,
        /// Text of the offending line.
        line: String,
        /// Description of the failure.
        cause: String,
    },
}

impl ParseStatus {
    /// Status corresponding to a parse result.
    pub fn from_result<T>(result: &Result<T, ExcellonError>) -> Self {
        match result {
            Ok(_) => Self::Ok,
            Err(err) => Self::from(err),
        }
    }
}

impl From<&ExcellonError> for ParseStatus {
    fn from(err: &ExcellonError) -> Self {
        match err {
            ExcellonError::DialectMismatch { line_number, .. } => Self::AbortedNotExcellon {
                line_number: *line_number,
            },
            ExcellonError::Cancelled { .. } => Self::Cancelled,
            ExcellonError::Internal {
                line_number,
                line,
                cause,
            } => Self::InternalError {
                line_number: *line_number,
                line: line.clone(),
                cause: cause.clone(),
            },
            other => Self::InternalError {
                line_number: 0,
                line: String::new(),
                cause: other.to_string(),
            },
        }
    }
}
