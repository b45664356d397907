//! Parser configuration.
//!
//! Every field has a default matching the most common Excellon exports, so a
//! partial configuration (for example from JavaScript) only needs to name the
//! fields it overrides.

use serde::{Deserialize, Serialize};

use crate::excellon::types::{CoordinateFormat, DigitFormats, Units, ZeroSuppression};

/// Default full-circle resolution used when buffering drills and slots.
pub const DEFAULT_CIRCLE_SEGMENTS: u32 = 64;

/// Settings applied before the file declares its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExcellonConfig {
    /// Zero suppression mode assumed until the file declares one.
    pub zeros: ZeroSuppression,
    /// Coordinate format for metric files.
    pub metric_format: CoordinateFormat,
    /// Coordinate format for inch files.
    pub inch_format: CoordinateFormat,
    /// Units assumed until the file declares its own, and for headerless files.
    pub units: Units,
    /// Full-circle resolution for geometry buffering.
    pub circle_segments: u32,
    /// Units to convert the document into after parsing.
    pub target_units: Option<Units>,
}

impl ExcellonConfig {
    /// Initial per-unit coordinate formats.
    pub const fn formats(&self) -> DigitFormats {
        DigitFormats {
            metric: self.metric_format,
            inch: self.inch_format,
        }
    }
}

impl Default for ExcellonConfig {
    fn default() -> Self {
        Self {
            zeros: ZeroSuppression::Leading,
            metric_format: CoordinateFormat::new(3, 3),
            inch_format: CoordinateFormat::new(2, 4),
            units: Units::Inch,
            circle_segments: DEFAULT_CIRCLE_SEGMENTS,
            target_units: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ut_cfg_001_defaults() {
        let config = ExcellonConfig::default();
        assert_eq!(config.zeros, ZeroSuppression::Leading);
        assert_eq!(config.units, Units::Inch);
        assert_eq!(config.formats().metric, CoordinateFormat::new(3, 3));
        assert_eq!(config.formats().inch, CoordinateFormat::new(2, 4));
        assert_eq!(config.circle_segments, 64);
        assert!(config.target_units.is_none());
    }
}
