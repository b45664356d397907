//! Excellon drill parser.
//!
//! Lines are classified one at a time by the [`Grammar`] and applied to the
//! parse context, tool table and feature collector. Malformed tokens and
//! unrecognized lines are logged and counted but never stop the parse; only
//! a G-code marker, cancellation or an internal failure does.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::ExcellonConfig;
use crate::error::ExcellonError;

use super::collector::{FeatureCollector, MoveOutcome, MAX_REPEAT_COUNT};
use super::context::ParseContext;
use super::document::{DocumentParts, ExcellonDocument};
use super::grammar::{CoordFields, Directive, Grammar, RoutMove};
use super::number::{decode, parse_literal};
use super::tools::{IncrementalPlaceholder, PlaceholderDiameter, ToolOrigin, ToolTable};
use super::types::{ParseWarnings, Units};

const DEFAULT_PLACEHOLDER: IncrementalPlaceholder = IncrementalPlaceholder::DEFAULT;

/// Parse an Excellon drill file with the default configuration.
///
/// # Errors
///
/// See [`ExcellonParser::parse`].
pub fn parse(data: &[u8]) -> Result<ExcellonDocument, ExcellonError> {
    ExcellonParser::new(ExcellonConfig::default()).parse(data)
}

/// Configurable Excellon parser.
#[derive(Debug)]
pub struct ExcellonParser<'a> {
    config: ExcellonConfig,
    placeholder: &'a dyn PlaceholderDiameter,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> ExcellonParser<'a> {
    /// Creates a parser using `config` and the default placeholder policy.
    pub fn new(config: ExcellonConfig) -> Self {
        Self {
            config,
            placeholder: &DEFAULT_PLACEHOLDER,
            cancel: None,
        }
    }

    /// Uses `placeholder` for tools declared without a diameter.
    #[must_use]
    pub fn with_placeholder(mut self, placeholder: &'a dyn PlaceholderDiameter) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// Aborts the parse once `flag` is set. Checked before every line.
    #[must_use]
    pub fn with_cancel_flag(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Parses raw file bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ExcellonError::InvalidInput`] for empty or non-UTF-8 input,
    /// and otherwise the errors of [`ExcellonParser::parse_lines`].
    pub fn parse(&self, data: &[u8]) -> Result<ExcellonDocument, ExcellonError> {
        if data.is_empty() {
            return Err(ExcellonError::InvalidInput("empty input".to_string()));
        }
        let text = std::str::from_utf8(data)
            .map_err(|err| ExcellonError::InvalidInput(format!("invalid UTF-8 input: {err}")))?;
        self.parse_str(text)
    }

    /// Parses file text.
    ///
    /// # Errors
    ///
    /// See [`ExcellonParser::parse_lines`].
    pub fn parse_str(&self, text: &str) -> Result<ExcellonDocument, ExcellonError> {
        self.parse_lines(text.lines())
    }

    /// Parses a sequence of lines.
    ///
    /// # Errors
    ///
    /// - [`ExcellonError::DialectMismatch`] if the file is G-code.
    /// - [`ExcellonError::Cancelled`] if the cancel flag was raised.
    /// - [`ExcellonError::Internal`] on an unexpected failure, with the line
    ///   being processed.
    pub fn parse_lines<I, S>(&self, lines: I) -> Result<ExcellonDocument, ExcellonError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let grammar = Grammar::shared().map_err(|err| ExcellonError::Internal {
            line_number: 0,
            line: String::new(),
            cause: err.to_string(),
        })?;
        let mut run = ParseRun::new(grammar, &self.config, self.placeholder);

        for (index, raw) in lines.into_iter().enumerate() {
            let line_number = index + 1;
            if self.cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                log::info!("parse cancelled before line {line_number}");
                return Err(ExcellonError::Cancelled { line_number });
            }
            let raw = raw.as_ref();
            run.source.push_str(raw);
            run.source.push('\n');
            run.process_line(line_number, raw)?;
        }

        Ok(run.finish())
    }
}

impl Default for ExcellonParser<'_> {
    fn default() -> Self {
        Self::new(ExcellonConfig::default())
    }
}

/// State of one parse.
struct ParseRun<'p> {
    grammar: &'p Grammar,
    config: &'p ExcellonConfig,
    placeholder: &'p dyn PlaceholderDiameter,
    ctx: ParseContext,
    tools: ToolTable,
    features: FeatureCollector,
    warnings: ParseWarnings,
    source: String,
}

impl<'p> ParseRun<'p> {
    fn new(
        grammar: &'p Grammar,
        config: &'p ExcellonConfig,
        placeholder: &'p dyn PlaceholderDiameter,
    ) -> Self {
        Self {
            grammar,
            config,
            placeholder,
            ctx: ParseContext::new(config),
            tools: ToolTable::new(),
            features: FeatureCollector::new(),
            warnings: ParseWarnings::default(),
            source: String::new(),
        }
    }

    fn process_line(&mut self, line_number: usize, raw: &str) -> Result<(), ExcellonError> {
        let trimmed = raw.trim();
        let line = trimmed.to_ascii_uppercase();

        match self.grammar.classify(&line, trimmed, self.ctx.section()) {
            Directive::Blank => {}
            Directive::GcodeMarker => {
                log::error!("line {line_number}: `{trimmed}` marks a G-code file; aborting");
                return Err(ExcellonError::DialectMismatch {
                    line_number,
                    line: trimmed.to_string(),
                });
            }
            Directive::HeaderStart => {
                self.ctx.in_header = true;
                self.ctx.header_seen = true;
                self.ctx.headerless = false;
            }
            Directive::AllegroHeaderStart => {
                log::debug!("line {line_number}: Allegro header");
                self.ctx.in_header = true;
                self.ctx.header_seen = true;
                self.ctx.allegro = true;
            }
            Directive::AllegroHoleSize { diameter, mils } => {
                self.allegro_hole_size(line_number, diameter, mils);
            }
            Directive::FormatComment(format) => {
                log::debug!("line {line_number}: coordinate format {format}");
                self.ctx.formats.metric = format;
                self.ctx.formats.inch = format;
            }
            Directive::Comment => {
                log::trace!("line {line_number}: comment");
            }
            Directive::HeaderEnd => self.end_header(line_number),
            Directive::MeasuringMode(units) | Directive::BareUnits(units) => {
                self.switch_units(units);
            }
            Directive::UnitsFormat {
                units,
                zeros,
                format,
            } => {
                if let Some(format) = format {
                    self.ctx.formats.set(units, format);
                }
                if let Some(zeros) = zeros {
                    self.ctx.zeros = zeros;
                }
                self.switch_units(units);
            }
            Directive::BareZeros(zeros) => self.ctx.zeros = zeros,
            Directive::ToolDefinition { id, diameter } => {
                let diameter = self.diameter(line_number, diameter);
                self.define_tool(&id, diameter);
            }
            Directive::ToolSelect { id, diameter } => {
                self.select_tool(line_number, id, diameter);
            }
            Directive::AllegroToolChange => {
                self.ctx.current_tool = self.ctx.next_allegro_tool();
                log::debug!(
                    "line {line_number}: Allegro tool change to {}",
                    self.ctx.current_tool
                );
            }
            Directive::Slot { start, stop } => self.slot(line_number, start, stop),
            Directive::Move {
                coords,
                repeat,
                rout,
            } => self.coordinate_move(line_number, coords, repeat, rout),
            Directive::Unrecognized => {
                self.warnings.unresolved_lines += 1;
                log::debug!("line {line_number}: `{trimmed}` ignored");
            }
        }
        Ok(())
    }

    fn warn(&mut self, msg: String) {
        log::warn!("{msg}");
        self.warnings.warn(msg);
    }

    fn diameter(&mut self, line_number: usize, raw: Option<&str>) -> Option<f64> {
        match parse_literal(raw?) {
            Ok(value) => Some(value),
            Err(err) => {
                self.warn(format!("line {line_number}: bad tool diameter: {err}"));
                None
            }
        }
    }

    fn define_tool(&mut self, id: &str, diameter: Option<f64>) {
        let origin = self
            .tools
            .define(id, diameter, self.ctx.units, self.placeholder);
        self.note_placeholder(id, origin);
    }

    fn note_placeholder(&mut self, id: &str, origin: ToolOrigin) {
        if origin != ToolOrigin::Placeholder {
            return;
        }
        self.warnings.diameterless = true;
        let diameter = self.tools.get(id).map_or(0.0, |tool| tool.diameter);
        self.warn(format!(
            "tool {id} has no diameter; using placeholder {diameter:.4} {}",
            self.ctx.units
        ));
    }

    fn allegro_hole_size(&mut self, line_number: usize, diameter: &str, mils: bool) {
        let in_mils = if let Some(in_mils) = self.ctx.allegro_mils {
            in_mils
        } else {
            self.ctx.allegro_mils = Some(mils);
            self.switch_units(if mils { Units::Inch } else { Units::Metric });
            mils
        };

        match parse_literal(diameter) {
            Ok(value) => {
                let diameter = if in_mils { value / 1000.0 } else { value };
                let id = self.ctx.next_allegro_tool();
                self.define_tool(&id, Some(diameter));
            }
            Err(err) => self.warn(format!("line {line_number}: bad hole size: {err}")),
        }
    }

    fn end_header(&mut self, line_number: usize) {
        if !self.ctx.in_header || self.tools.is_empty() {
            self.ctx.headerless = true;
            log::warn!(
                "line {line_number}: no tool table in header; tools are defined inline, units {}",
                self.config.units
            );
            self.switch_units(self.config.units);
        }
        self.ctx.in_header = false;
        if self.ctx.allegro {
            self.ctx.allegro_tool_counter = 0;
        }
    }

    fn select_tool(&mut self, line_number: usize, id: String, diameter: Option<&str>) {
        if self.ctx.defines_tools_inline() {
            let diameter = self.diameter(line_number, diameter);
            if let Some(origin) = self.tools.select_or_create_headerless(
                &id,
                diameter,
                self.ctx.units,
                self.placeholder,
            ) {
                self.note_placeholder(&id, origin);
            }
        } else if !self.tools.contains(&id) {
            log::debug!("line {line_number}: tool {id} selected but not defined");
        }
        self.ctx.current_tool = id;
    }

    fn decode_fields(
        &self,
        fields: CoordFields<'_>,
    ) -> Result<(Option<f64>, Option<f64>), ExcellonError> {
        let decode_axis = |token: Option<&str>| {
            token
                .map(|token| decode(token, self.ctx.zeros, self.ctx.units, &self.ctx.formats))
                .transpose()
        };
        Ok((decode_axis(fields.x)?, decode_axis(fields.y)?))
    }

    fn slot(&mut self, line_number: usize, start: CoordFields<'_>, stop: CoordFields<'_>) {
        let (start, stop) = match (self.decode_fields(start), self.decode_fields(stop)) {
            (Ok(start), Ok(stop)) => (start, stop),
            (Err(err), _) | (_, Err(err)) => {
                self.warnings.skipped_features += 1;
                self.warn(format!("line {line_number}: slot skipped: {err}"));
                return;
            }
        };

        if !self
            .features
            .record_slot(start, stop, &self.ctx.current_tool)
        {
            self.warnings.skipped_features += 1;
            self.warn(format!(
                "line {line_number}: slot is missing coordinates; skipping"
            ));
        }
    }

    fn coordinate_move(
        &mut self,
        line_number: usize,
        coords: CoordFields<'_>,
        repeat: Option<&str>,
        rout: Option<RoutMove>,
    ) {
        if let Some(raw) = repeat {
            let armed = raw
                .parse::<u32>()
                .is_ok_and(|count| self.features.set_repeat(count));
            if !armed {
                self.warnings.skipped_features += 1;
                self.warn(format!(
                    "line {line_number}: repeat count {raw} exceeds {MAX_REPEAT_COUNT}; skipping"
                ));
                return;
            }
        }

        let (x, y) = match self.decode_fields(coords) {
            Ok(axes) => axes,
            Err(err) => {
                self.warnings.skipped_features += 1;
                self.warn(format!("line {line_number}: coordinates skipped: {err}"));
                return;
            }
        };

        match self
            .features
            .record_move(x, y, rout, &self.ctx.current_tool)
        {
            MoveOutcome::MissingCoordinates => {
                self.warnings.skipped_features += 1;
                self.warn(format!(
                    "line {line_number}: missing coordinates; skipping"
                ));
            }
            outcome => log::trace!("line {line_number}: {outcome:?}"),
        }
    }

    fn switch_units(&mut self, target: Units) {
        if target == self.ctx.units {
            return;
        }
        let factor = self.ctx.units.factor_to(target);
        log::debug!(
            "units {} -> {target}: scaling collected features by {factor}",
            self.ctx.units
        );
        self.tools.scale_diameters(factor);
        self.features.rescale(factor);
        self.ctx.units = target;
    }

    fn finish(mut self) -> ExcellonDocument {
        if self.features.has_open_rout() {
            self.warn("unterminated G00 rout discarded".to_string());
        }
        if let Some(target) = self.config.target_units {
            self.switch_units(target);
        }
        log::info!(
            "parsed Excellon file: {} tools, zeros {:?}, units {}",
            self.tools.len(),
            self.ctx.zeros,
            self.ctx.units
        );

        self.warnings.diameterless = self.tools.has_placeholders();
        let (drills, slots) = self.features.into_features();
        ExcellonDocument::from_parts(DocumentParts {
            units: self.ctx.units,
            zeros: self.ctx.zeros,
            formats: self.ctx.formats,
            tools: self.tools,
            drills,
            slots,
            circle_segments: self.config.circle_segments,
            source: self.source,
            warnings: self.warnings,
        })
    }
}
