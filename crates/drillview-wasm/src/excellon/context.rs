//! Mutable state carried from line to line during one parse.

use crate::config::ExcellonConfig;

use super::grammar::Section;
use super::types::{DigitFormats, Units, ZeroSuppression};

/// Dialect and format state of a parse in progress.
///
/// Feature positions live in the
/// [`FeatureCollector`](super::collector::FeatureCollector); this holds
/// everything that changes how lines are read.
#[derive(Debug, Clone)]
pub struct ParseContext {
    /// Inside an `M48` or Allegro header.
    pub in_header: bool,
    /// An `M48` or Allegro header was opened at some point.
    pub header_seen: bool,
    /// The file has no usable header.
    pub headerless: bool,
    /// The file is an Allegro export.
    pub allegro: bool,
    /// Next Allegro tool number, counting from 1 in both header and body.
    pub allegro_tool_counter: u32,
    /// Units of the first Allegro hole size, once seen: `Some(true)` for mils.
    pub allegro_mils: Option<bool>,
    /// Active zero suppression mode.
    pub zeros: ZeroSuppression,
    /// Active units.
    pub units: Units,
    /// Per-unit coordinate formats.
    pub formats: DigitFormats,
    /// Currently selected tool; empty until the first selection.
    pub current_tool: String,
}

impl ParseContext {
    /// Starts from the configured defaults.
    pub fn new(config: &ExcellonConfig) -> Self {
        Self {
            in_header: false,
            header_seen: false,
            headerless: false,
            allegro: false,
            allegro_tool_counter: 0,
            allegro_mils: None,
            zeros: config.zeros,
            units: config.units,
            formats: config.formats(),
            current_tool: String::new(),
        }
    }

    /// Section used to classify the next line.
    pub const fn section(&self) -> Section {
        Section {
            in_header: self.in_header,
            allegro: self.allegro,
        }
    }

    /// Tools are defined inline by the body rather than by a header.
    pub const fn defines_tools_inline(&self) -> bool {
        self.headerless || !(self.header_seen || self.allegro)
    }

    /// Advances the Allegro tool counter and returns the new tool id.
    pub fn next_allegro_tool(&mut self) -> String {
        self.allegro_tool_counter = self.allegro_tool_counter.saturating_add(1);
        self.allegro_tool_counter.to_string()
    }
}
