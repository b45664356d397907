//! Core geometry types and the `GeometryBuilder` accumulator.

use serde::{Deserialize, Serialize};

/// Converts a length to `u32`, saturating at `u32::MAX`.
pub fn saturate_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

/// 2D point in board coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Point {
    /// Creates a point from its coordinates.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    /// Minimum X coordinate.
    pub min_x: f64,
    /// Minimum Y coordinate.
    pub min_y: f64,
    /// Maximum X coordinate.
    pub max_x: f64,
    /// Maximum Y coordinate.
    pub max_y: f64,
}

impl BoundingBox {
    /// Creates an empty bounding box that will expand with the first `update` call.
    pub const fn new() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    /// Bounding box collapsed onto the origin, reported for empty documents.
    pub const fn zero() -> Self {
        Self {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 0.0,
            max_y: 0.0,
        }
    }

    /// Expands the bounding box to include the given point.
    pub fn update(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// Expands the bounding box to include another box.
    pub fn merge(&mut self, other: &Self) {
        if other.is_empty() {
            return;
        }
        self.update(other.min_x, other.min_y);
        self.update(other.max_x, other.max_y);
    }

    /// Returns `true` until at least one point has been added.
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    /// Centre of the box.
    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Returns the box as a `(min_x, min_y, max_x, max_y)` tuple.
    pub const fn as_tuple(&self) -> (f64, f64, f64, f64) {
        (self.min_x, self.min_y, self.max_x, self.max_y)
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::new()
    }
}

/// Triangulated output for a drill layer.
///
/// Positions are interleaved `[x0, y0, x1, y1, ...]` as `f32` for WebGL.
/// Indices reference into the positions array as a triangle list.
#[derive(Debug, Clone)]
pub struct LayerGeometry {
    /// Interleaved vertex positions `[x0, y0, x1, y1, ...]`.
    pub positions: Vec<f32>,
    /// Triangle-list indices into the positions array.
    pub indices: Vec<u32>,
    /// Number of vertices (`positions.len() / 2`).
    pub vertex_count: u32,
    /// Warning messages generated during conversion.
    pub warnings: Vec<String>,
}

/// Metadata returned to JavaScript for a parsed drill file.
#[derive(Debug, Clone, Serialize)]
pub struct LayerMeta {
    /// Axis-aligned bounding box of the solid geometry.
    pub bounds: BoundingBox,
    /// Number of vertices.
    pub vertex_count: u32,
    /// Number of triangle indices.
    pub index_count: u32,
    /// Number of drills.
    pub drill_count: u32,
    /// Number of slots.
    pub slot_count: u32,
    /// Number of tools in the tool table.
    pub tool_count: u32,
    /// Unit system of the coordinates, `"metric"` or `"inch"`.
    pub units: String,
    /// Whether tool diameters are placeholders the user must correct.
    pub diameterless: bool,
    /// Number of warnings.
    pub warning_count: u32,
    /// Warning messages.
    pub warnings: Vec<String>,
}

/// Accumulator for building layer geometry incrementally.
///
/// Passed by mutable reference to geometry conversion functions.
/// Vertices and indices are collected in flat `Vec`s to minimize allocations.
#[derive(Debug)]
pub struct GeometryBuilder {
    positions: Vec<f32>,
    indices: Vec<u32>,
    warnings: Vec<String>,
}

impl GeometryBuilder {
    /// Creates an empty builder.
    pub const fn new() -> Self {
        Self {
            positions: Vec::new(),
            indices: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Adds a vertex and returns its index.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn push_vertex(&mut self, x: f64, y: f64) -> u32 {
        let idx = self.positions.len() / 2;
        self.positions.push(x as f32);
        self.positions.push(y as f32);
        idx as u32
    }

    /// Adds a triangle from three vertex indices.
    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.push(a);
        self.indices.push(b);
        self.indices.push(c);
    }

    /// Records a warning message.
    pub fn warn(&mut self, msg: String) {
        self.warnings.push(msg);
    }

    /// Consumes the builder and produces a [`LayerGeometry`].
    pub fn build(self) -> LayerGeometry {
        let vertex_count = saturate_u32(self.positions.len() / 2);
        LayerGeometry {
            positions: self.positions,
            indices: self.indices,
            vertex_count,
            warnings: self.warnings,
        }
    }
}

impl Default for GeometryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn push_vertex_returns_sequential_indices() {
        let mut b = GeometryBuilder::new();
        assert_eq!(b.push_vertex(0.0, 0.0), 0);
        assert_eq!(b.push_vertex(1.0, 0.0), 1);
        assert_eq!(b.push_vertex(2.0, 0.0), 2);
        let geom = b.build();
        assert_eq!(geom.positions.len(), 6);
        assert_eq!(geom.vertex_count, 3);
    }

    #[test]
    fn push_triangle_adds_three_indices() {
        let mut b = GeometryBuilder::new();
        b.push_vertex(0.0, 0.0);
        b.push_vertex(1.0, 0.0);
        b.push_vertex(0.0, 1.0);
        b.push_triangle(0, 1, 2);
        let geom = b.build();
        assert_eq!(geom.indices, vec![0, 1, 2]);
    }

    #[test]
    fn bounding_box_updates_on_push() {
        let mut bounds = BoundingBox::new();
        bounds.update(1.0, 2.0);
        bounds.update(-3.0, 4.0);
        assert!((bounds.min_x - (-3.0)).abs() < f64::EPSILON);
        assert!((bounds.min_y - 2.0).abs() < f64::EPSILON);
        assert!((bounds.max_x - 1.0).abs() < f64::EPSILON);
        assert!((bounds.max_y - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_box_merge_is_noop() {
        let mut target = BoundingBox::new();
        target.update(1.0, 1.0);
        target.merge(&BoundingBox::new());
        assert_eq!(target.as_tuple(), (1.0, 1.0, 1.0, 1.0));
        assert!(BoundingBox::new().is_empty());
        assert!(!target.is_empty());
    }

    #[test]
    fn merge_and_center() {
        let mut a = BoundingBox::new();
        a.update(0.0, 0.0);
        let mut b = BoundingBox::new();
        b.update(4.0, 2.0);
        a.merge(&b);
        assert_eq!(a.as_tuple(), (0.0, 0.0, 4.0, 2.0));
        assert_eq!(a.center(), Point::new(2.0, 1.0));
    }

    #[test]
    fn warn_records_messages() {
        let mut b = GeometryBuilder::new();
        b.warn("first warning".to_string());
        b.warn("second warning".to_string());
        let geom = b.build();
        assert_eq!(geom.warnings.len(), 2);
        assert_eq!(geom.warnings[0], "first warning");
    }

    #[test]
    fn empty_builder_builds_empty_geometry() {
        let geom = GeometryBuilder::new().build();
        assert_eq!(geom.positions.len(), 0);
        assert_eq!(geom.indices.len(), 0);
        assert_eq!(geom.vertex_count, 0);
        assert!(geom.warnings.is_empty());
    }
}
