//! Tool table with insertion-ordered lookup by identifier.

use std::collections::HashMap;
use std::fmt;

use super::types::{Tool, Units, MM_PER_INCH};

/// Supplies diameters for tools the file never gives one.
pub trait PlaceholderDiameter: fmt::Debug {
    /// Placeholder diameter for tool `number`, expressed in `units`.
    fn diameter(&self, number: f64, units: Units) -> f64;
}

/// Placeholder policy growing linearly with the tool number, so distinct
/// tools stay visually distinguishable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IncrementalPlaceholder {
    /// Diameter of tool 1, in millimeters.
    pub base_mm: f64,
    /// Increment per tool number, in millimeters.
    pub step_mm: f64,
}

impl IncrementalPlaceholder {
    /// 1.0 mm for tool 1, growing by 0.01 mm per tool number.
    pub const DEFAULT: Self = Self {
        base_mm: 1.0,
        step_mm: 0.01,
    };
}

impl Default for IncrementalPlaceholder {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl PlaceholderDiameter for IncrementalPlaceholder {
    fn diameter(&self, number: f64, units: Units) -> f64 {
        let mm = self.step_mm.mul_add(number - 1.0, self.base_mm);
        match units {
            Units::Metric => mm,
            Units::Inch => mm / MM_PER_INCH,
        }
    }
}

/// How a tool's diameter was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolOrigin {
    /// The file declared the diameter.
    Declared,
    /// The diameter came from the placeholder policy.
    Placeholder,
}

/// Strips leading zeros from a tool number; `"00"` normalizes to `"0"`.
pub fn normalize_id(raw: &str) -> String {
    let trimmed = raw.trim().trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Tools keyed by normalized identifier, iterated in definition order.
#[derive(Debug, Clone, Default)]
pub struct ToolTable {
    tools: Vec<Tool>,
    index: HashMap<String, usize>,
}

impl ToolTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines or redefines tool `id`.
    ///
    /// A missing, zero or non-finite diameter is replaced by the placeholder
    /// policy's diameter for the tool number in `units`. Redefinition keeps
    /// the tool's position in the table.
    pub fn define(
        &mut self,
        id: &str,
        diameter: Option<f64>,
        units: Units,
        placeholder: &dyn PlaceholderDiameter,
    ) -> ToolOrigin {
        let id = normalize_id(id);
        let (diameter, origin) = match diameter.filter(|d| d.is_finite() && *d > 0.0) {
            Some(d) => (d, ToolOrigin::Declared),
            None => {
                let number = id.parse::<f64>().unwrap_or(1.0);
                (placeholder.diameter(number, units), ToolOrigin::Placeholder)
            }
        };
        let is_placeholder = origin == ToolOrigin::Placeholder;

        if let Some(tool) = self.get_mut(&id) {
            tool.diameter = diameter;
            tool.placeholder = is_placeholder;
        } else {
            self.index.insert(id.clone(), self.tools.len());
            self.tools.push(Tool::new(id, diameter, is_placeholder));
        }
        origin
    }

    /// Selects tool `id` in a headerless file, defining it on first use.
    ///
    /// An inline diameter always wins. Without one an existing tool is kept
    /// as is, and a new tool gets a placeholder. Returns `None` when the
    /// table was left unchanged.
    pub fn select_or_create_headerless(
        &mut self,
        id: &str,
        inline_diameter: Option<f64>,
        units: Units,
        placeholder: &dyn PlaceholderDiameter,
    ) -> Option<ToolOrigin> {
        if inline_diameter.is_none() && self.contains(id) {
            return None;
        }
        Some(self.define(id, inline_diameter, units, placeholder))
    }

    /// Looks up a tool by identifier (normalized before lookup).
    pub fn get(&self, id: &str) -> Option<&Tool> {
        self.index
            .get(&normalize_id(id))
            .and_then(|&slot| self.tools.get(slot))
    }

    /// Mutable lookup by identifier (normalized before lookup).
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Tool> {
        self.index
            .get(&normalize_id(id))
            .and_then(|&slot| self.tools.get_mut(slot))
    }

    /// Returns `true` if tool `id` is defined.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(&normalize_id(id))
    }

    /// Number of tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns `true` when no tool is defined.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Tools in definition order.
    pub fn iter(&self) -> std::slice::Iter<'_, Tool> {
        self.tools.iter()
    }

    /// Mutable iteration in definition order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Tool> {
        self.tools.iter_mut()
    }

    /// Multiplies every diameter by `factor`.
    pub fn scale_diameters(&mut self, factor: f64) {
        for tool in &mut self.tools {
            tool.diameter *= factor;
        }
    }

    /// Returns `true` if any tool carries a placeholder diameter.
    pub fn has_placeholders(&self) -> bool {
        self.tools.iter().any(|tool| tool.placeholder)
    }
}

impl<'a> IntoIterator for &'a ToolTable {
    type Item = &'a Tool;
    type IntoIter = std::slice::Iter<'a, Tool>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn diameter_of(table: &ToolTable, id: &str) -> f64 {
        table.get(id).map_or(f64::NAN, |tool| tool.diameter)
    }

    #[test]
    fn ut_tol_001_ids_are_normalized() {
        assert_eq!(normalize_id("01"), "1");
        assert_eq!(normalize_id("0010"), "10");
        assert_eq!(normalize_id("00"), "0");
        assert_eq!(normalize_id("7"), "7");
    }

    #[test]
    fn ut_tol_002_define_preserves_order_and_overwrites() {
        let mut table = ToolTable::new();
        let policy = IncrementalPlaceholder::DEFAULT;
        table.define("02", Some(0.5), Units::Metric, &policy);
        table.define("1", Some(0.8), Units::Metric, &policy);
        table.define("2", Some(0.6), Units::Metric, &policy);

        let ids: Vec<&str> = table.iter().map(|tool| tool.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);
        assert!((diameter_of(&table, "002") - 0.6).abs() < EPSILON);
    }

    #[test]
    fn ut_tol_003_missing_diameter_uses_placeholder() {
        let mut table = ToolTable::new();
        let policy = IncrementalPlaceholder::DEFAULT;
        assert_eq!(
            table.define("3", None, Units::Metric, &policy),
            ToolOrigin::Placeholder
        );
        assert_eq!(
            table.define("4", Some(0.0), Units::Inch, &policy),
            ToolOrigin::Placeholder
        );
        assert!((diameter_of(&table, "3") - 1.02).abs() < EPSILON);
        assert!((diameter_of(&table, "4") - 1.03 / 25.4).abs() < EPSILON);
        assert!(table.has_placeholders());
    }

    #[test]
    fn ut_tol_004_headerless_select_keeps_known_diameter() {
        let mut table = ToolTable::new();
        let policy = IncrementalPlaceholder::DEFAULT;
        assert_eq!(
            table.select_or_create_headerless("1", Some(0.9), Units::Metric, &policy),
            Some(ToolOrigin::Declared)
        );
        assert_eq!(
            table.select_or_create_headerless("1", None, Units::Metric, &policy),
            None
        );
        assert!((diameter_of(&table, "1") - 0.9).abs() < EPSILON);
        assert!(!table.has_placeholders());
    }

    #[test]
    fn ut_tol_005_scale_diameters() {
        let mut table = ToolTable::new();
        table.define("1", Some(0.1), Units::Inch, &IncrementalPlaceholder::DEFAULT);
        table.scale_diameters(25.4);
        assert!((diameter_of(&table, "1") - 2.54).abs() < EPSILON);
    }
}
