//! Line classification for the Excellon dialects.
//!
//! [`Grammar::classify`] turns one trimmed, uppercased line into a
//! [`Directive`]. Rules are tried in a fixed priority order and the first
//! match wins, so a line is never interpreted twice. The Allegro `;HEADER`
//! marker is case sensitive and is matched against the line as written.

use std::sync::OnceLock;

use regex::Regex;

use super::tools::normalize_id;
use super::types::{CoordinateFormat, Units, ZeroSuppression};

/// Raw X/Y fields of a coordinate line; `None` when the axis is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CoordFields<'a> {
    /// X token, possibly empty.
    pub x: Option<&'a str>,
    /// Y token, possibly empty.
    pub y: Option<&'a str>,
}

/// Routing mode carried by a coordinate line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutMove {
    /// `G00`: move to the start of a rout with the tool up.
    Rapid,
    /// `G01`: plunge and cut a straight rout.
    Linear,
}

/// Meaning of a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive<'a> {
    /// `G20`/`G21`: the file is G-code.
    GcodeMarker,
    /// `M48`: start of the header.
    HeaderStart,
    /// `;HEADER` comment: start of an Allegro header.
    AllegroHeaderStart,
    /// Allegro `;Holesize n. = v ... MILS|MM` tool comment.
    AllegroHoleSize {
        /// Raw diameter token.
        diameter: &'a str,
        /// Whether the size is in mils (otherwise millimeters).
        mils: bool,
    },
    /// Altium `;FILE_FORMAT=u:l` or `;Format: u.l` comment.
    FormatComment(CoordinateFormat),
    /// Any other comment.
    Comment,
    /// `M95` or `%`: end of the header.
    HeaderEnd,
    /// `M71` (metric) or `M72` (inch).
    MeasuringMode(Units),
    /// Header tool definition.
    ToolDefinition {
        /// Normalized tool identifier.
        id: String,
        /// Raw diameter token from the `C` field, if any.
        diameter: Option<&'a str>,
    },
    /// `INCH`/`METRIC` with optional zero mode and format.
    UnitsFormat {
        /// Declared unit system.
        units: Units,
        /// Declared zero suppression mode, if any.
        zeros: Option<ZeroSuppression>,
        /// Declared coordinate format, if any.
        format: Option<CoordinateFormat>,
    },
    /// A header line merely mentioning `INCH` or `METRIC`.
    BareUnits(Units),
    /// A header line merely mentioning `LZ` or `TZ`.
    BareZeros(ZeroSuppression),
    /// Body tool selection.
    ToolSelect {
        /// Normalized tool identifier.
        id: String,
        /// Inline `C` diameter token, used by headerless files.
        diameter: Option<&'a str>,
    },
    /// Allegro statement that advances to the next tool.
    AllegroToolChange,
    /// `G85` drilled slot.
    Slot {
        /// Fields before `G85`.
        start: CoordFields<'a>,
        /// Fields after `G85`.
        stop: CoordFields<'a>,
    },
    /// Coordinate line: drill hit or rout move.
    Move {
        /// Coordinate fields.
        coords: CoordFields<'a>,
        /// Raw `R` repeat count, if any.
        repeat: Option<&'a str>,
        /// Routing mode, if any.
        rout: Option<RoutMove>,
    },
    /// Blank line.
    Blank,
    /// Nothing recognized the line.
    Unrecognized,
}

/// Section of the file a line is read in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Section {
    /// Inside an `M48` or Allegro header.
    pub in_header: bool,
    /// The file is an Allegro export.
    pub allegro: bool,
}

/// Compiled line patterns.
#[derive(Debug)]
pub struct Grammar {
    gcode: Regex,
    allegro_header: Regex,
    allegro_holesize: Regex,
    altium_format: Regex,
    header_end: Regex,
    measuring_mode: Regex,
    tool_definition: Regex,
    tool_diameter: Regex,
    units_format: Regex,
    zeros: Regex,
    tool_select: Regex,
    allegro_absolute: Regex,
    allegro_stop: Regex,
    slot: Regex,
    x_field: Regex,
    y_field: Regex,
    repeat: Regex,
}

impl Grammar {
    /// Compiles the patterns.
    ///
    /// # Errors
    ///
    /// Returns the regex error if a pattern fails to compile.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            gcode: Regex::new(r"^G2[01]$")?,
            allegro_header: Regex::new(r";\s*HEADER")?,
            allegro_holesize: Regex::new(
                r"^;\s*HOLESIZE\s*\d+\.?\s*=\s*(\d+\.?\d*|\.\d+).*?(MILS|MM)",
            )?,
            altium_format: Regex::new(r"^;\s*(?:FILE_FORMAT)?(?:FORMAT)?\s*[=:]\s*(\d+)[:.](\d+)")?,
            header_end: Regex::new(r"^(?:M95|%)$")?,
            measuring_mode: Regex::new(r"^M7([12])$")?,
            tool_definition: Regex::new(r"^T(\d+)[CFSBHTZ]")?,
            tool_diameter: Regex::new(r"C,?(\d*\.?\d*)")?,
            units_format: Regex::new(r"^(INCH|METRIC)(?:,([TL])Z)?,?(\d*\.\d+)?")?,
            zeros: Regex::new(r"([LT])Z")?,
            tool_select: Regex::new(r"^T(\d+)(?:\D*?C(\d*\.?\d*))?")?,
            allegro_absolute: Regex::new(r"^G9[01]$")?,
            allegro_stop: Regex::new(r"^(?:G04|M09|M06|M00|M30)")?,
            slot: Regex::new(r"^([^G]+)G85(.*)$")?,
            x_field: Regex::new(r"X([-+]?\d*\.?\d*)")?,
            y_field: Regex::new(r"Y([-+]?\d*\.?\d*)")?,
            repeat: Regex::new(r"R(\d+)")?,
        })
    }

    /// The process-wide compiled grammar.
    ///
    /// # Errors
    ///
    /// Returns the regex error if a pattern fails to compile.
    pub fn shared() -> Result<&'static Self, regex::Error> {
        static GRAMMAR: OnceLock<Result<Grammar, regex::Error>> = OnceLock::new();
        GRAMMAR.get_or_init(Self::new).as_ref().map_err(Clone::clone)
    }

    /// Classifies one trimmed line. `line` is the uppercased text and
    /// `as_written` the same line in its original case.
    pub fn classify<'a>(
        &self,
        line: &'a str,
        as_written: &str,
        section: Section,
    ) -> Directive<'a> {
        if line.is_empty() {
            return Directive::Blank;
        }
        if self.gcode.is_match(line) {
            return Directive::GcodeMarker;
        }
        if line == "M48" {
            return Directive::HeaderStart;
        }
        if self.allegro_header.is_match(as_written) {
            return Directive::AllegroHeaderStart;
        }
        if line.starts_with(';') {
            return self.classify_comment(line);
        }
        if self.header_end.is_match(line) {
            return Directive::HeaderEnd;
        }
        if let Some(caps) = self.measuring_mode.captures(line) {
            let units = if caps.get(1).map(|m| m.as_str()) == Some("1") {
                Units::Metric
            } else {
                Units::Inch
            };
            return Directive::MeasuringMode(units);
        }

        if section.in_header {
            self.classify_header(line)
        } else {
            self.classify_body(line, section)
        }
    }

    fn classify_comment<'a>(&self, line: &'a str) -> Directive<'a> {
        if let Some(caps) = self.allegro_holesize.captures(line) {
            if let (Some(diameter), Some(unit)) = (caps.get(1), caps.get(2)) {
                return Directive::AllegroHoleSize {
                    diameter: diameter.as_str(),
                    mils: unit.as_str() == "MILS",
                };
            }
        }
        if let Some(caps) = self.altium_format.captures(line) {
            let upper = caps.get(1).and_then(|m| m.as_str().parse::<u8>().ok());
            let lower = caps.get(2).and_then(|m| m.as_str().parse::<u8>().ok());
            if let (Some(upper), Some(lower)) = (upper, lower) {
                return Directive::FormatComment(CoordinateFormat::new(upper, lower));
            }
        }
        Directive::Comment
    }

    fn classify_header<'a>(&self, line: &'a str) -> Directive<'a> {
        if let Some(id) = self
            .tool_definition
            .captures(line)
            .and_then(|caps| caps.get(1))
        {
            let fields = line.get(id.end()..).unwrap_or_default();
            let diameter = self
                .tool_diameter
                .captures(fields)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str())
                .filter(|raw| !raw.is_empty());
            return Directive::ToolDefinition {
                id: normalize_id(id.as_str()),
                diameter,
            };
        }
        if let Some(directive) = self.units_format(line) {
            return directive;
        }
        if line.contains("INCH") {
            return Directive::BareUnits(Units::Inch);
        }
        if line.contains("METRIC") {
            return Directive::BareUnits(Units::Metric);
        }
        if let Some(zeros) = self.zeros.captures(line).and_then(|caps| caps.get(1)) {
            return Directive::BareZeros(zeros_from(zeros.as_str()));
        }
        Directive::Unrecognized
    }

    fn classify_body<'a>(&self, line: &'a str, section: Section) -> Directive<'a> {
        if let Some(caps) = self.tool_select.captures(line) {
            if let Some(id) = caps.get(1) {
                let diameter = caps
                    .get(2)
                    .map(|m| m.as_str())
                    .filter(|raw| !raw.is_empty());
                return Directive::ToolSelect {
                    id: normalize_id(id.as_str()),
                    diameter,
                };
            }
        }

        if section.allegro
            && (self.allegro_absolute.is_match(line) || self.allegro_stop.is_match(line))
        {
            return Directive::AllegroToolChange;
        }

        if let Some(caps) = self.slot.captures(line) {
            if let (Some(start), Some(stop)) = (caps.get(1), caps.get(2)) {
                return Directive::Slot {
                    start: self.coord_fields(start.as_str()),
                    stop: self.coord_fields(stop.as_str()),
                };
            }
        }

        let coords = self.coord_fields(line);
        if coords.x.is_some() || coords.y.is_some() {
            let repeat = self
                .repeat
                .captures(line)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str());
            let rout = if line.contains("G00") {
                Some(RoutMove::Rapid)
            } else if line.contains("G01") {
                Some(RoutMove::Linear)
            } else {
                None
            };
            return Directive::Move {
                coords,
                repeat,
                rout,
            };
        }

        self.units_format(line).unwrap_or(Directive::Unrecognized)
    }

    fn units_format<'a>(&self, line: &'a str) -> Option<Directive<'a>> {
        let caps = self.units_format.captures(line)?;
        let units = match caps.get(1)?.as_str() {
            "METRIC" => Units::Metric,
            _ => Units::Inch,
        };
        let zeros = caps.get(2).map(|m| zeros_from(m.as_str()));
        let format = caps.get(3).and_then(|m| m.as_str().parse().ok());
        Some(Directive::UnitsFormat {
            units,
            zeros,
            format,
        })
    }

    fn coord_fields<'a>(&self, text: &'a str) -> CoordFields<'a> {
        let field = |re: &Regex| {
            re.captures(text)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str())
        };
        CoordFields {
            x: field(&self.x_field),
            y: field(&self.y_field),
        }
    }
}

fn zeros_from(letter: &str) -> ZeroSuppression {
    if letter == "T" {
        ZeroSuppression::Trailing
    } else {
        ZeroSuppression::Leading
    }
}
