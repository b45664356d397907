//! Error types for the drill parsing and geometry pipeline.

use thiserror::Error;

/// Errors raised while building renderable mesh geometry.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// Vertex or index arithmetic overflowed the mesh buffers.
    #[error("mesh error: {0}")]
    MeshError(String),
}

/// Errors that can occur while interpreting an Excellon drill file.
///
/// Only [`ExcellonError::DialectMismatch`], [`ExcellonError::Cancelled`] and
/// [`ExcellonError::Internal`] ever abort a parse. The remaining variants are
/// raised by individual steps and absorbed by the driver, which logs them and
/// carries on with the next line.
#[derive(Debug, Error)]
pub enum ExcellonError {
    /// A coordinate or diameter token could not be decoded.
    #[error("format error: {0}")]
    Format(String),

    /// A drill or slot references a tool missing from the tool table.
    #[error("unresolved tool reference `{tool}`")]
    UnresolvedTool {
        /// The tool identifier that could not be resolved.
        tool: String,
    },

    /// The input is numeric-control G-code rather than a drill file.
    #[error("line {line_number}: `{line}` marks a G-code file, not an Excellon file")]
    DialectMismatch {
        /// 1-based line number of the G-code marker.
        line_number: usize,
        /// The offending line.
        line: String,
    },

    /// An unexpected failure while processing a line.
    #[error("internal error at line {line_number} (`{line}`): {cause}")]
    Internal {
        /// 1-based line number being processed.
        line_number: usize,
        /// The offending line.
        line: String,
        /// Description of the underlying failure.
        cause: String,
    },

    /// The parse was cancelled by the caller.
    #[error("parse cancelled before line {line_number}")]
    Cancelled {
        /// 1-based line number that was about to be processed.
        line_number: usize,
    },

    /// The raw input could not be read as text.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Mesh construction failed.
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}
