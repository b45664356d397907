//! Excellon drill file parsing, tool tables and drill documents.

pub mod collector;
pub mod context;
pub mod document;
pub mod grammar;
pub mod number;
pub mod parser;
pub mod tools;
pub mod types;

pub use document::{ExcellonDocument, TransformOp};
pub use parser::{parse, ExcellonParser};
pub use tools::{IncrementalPlaceholder, PlaceholderDiameter, ToolTable};
pub use types::{
    CoordinateFormat, DigitFormats, Drill, ParseStatus, ParseWarnings, Slot, Tool, ToolSummary,
    Units, ZeroSuppression,
};
