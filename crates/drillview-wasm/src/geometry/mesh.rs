//! Triangulation of solid drill geometry into renderable mesh buffers.
//!
//! Converts polygon rings into triangle geometry using the `earclip`
//! ear-clipping triangulation algorithm.

use crate::error::GeometryError;

use super::shape::{Geometry, Polygon};
use super::types::GeometryBuilder;

/// Triangulates every polygon in `geometry` into the builder.
///
/// # Errors
///
/// Returns [`GeometryError::MeshError`] if vertex index arithmetic overflows.
pub fn fill_geometry(builder: &mut GeometryBuilder, geometry: &Geometry) -> Result<(), GeometryError> {
    for polygon in geometry.polygons() {
        fill_polygon(builder, polygon)?;
    }
    Ok(())
}

/// Fills a single polygon ring by triangulating it.
///
/// # Errors
///
/// Returns [`GeometryError::MeshError`] if vertex index arithmetic overflows.
/// Degenerate rings (fewer than 3 points) are handled gracefully with a
/// warning and no geometry output.
pub fn fill_polygon(builder: &mut GeometryBuilder, polygon: &Polygon) -> Result<(), GeometryError> {
    if polygon.is_empty() {
        builder.warn(format!(
            "polygon has {} point(s); need at least 3; skipping",
            polygon.exterior.len()
        ));
        return Ok(());
    }

    let mut flat = Vec::with_capacity(polygon.exterior.len() * 2);
    for pt in &polygon.exterior {
        flat.push(pt.x);
        flat.push(pt.y);
    }

    let indices = earclip::earcut::earcut(&flat, &[], 2);

    if indices.is_empty() {
        builder.warn("earclip produced no triangles for polygon; skipping".to_string());
        return Ok(());
    }

    let base_vertex = emit_vertices(builder, &flat);
    emit_triangles(builder, &indices, base_vertex)
}

/// Push all vertices from the flat coordinate buffer and return the first vertex index.
fn emit_vertices(builder: &mut GeometryBuilder, flat: &[f64]) -> u32 {
    let mut first: Option<u32> = None;
    for pair in flat.chunks_exact(2) {
        if let [x, y] = *pair {
            let idx = builder.push_vertex(x, y);
            if first.is_none() {
                first = Some(idx);
            }
        }
    }
    first.unwrap_or(0)
}

/// Convert earclip triangle indices (relative to the flat buffer) into
/// `GeometryBuilder` triangle calls using the base vertex offset.
fn emit_triangles(
    builder: &mut GeometryBuilder,
    indices: &[usize],
    base_vertex: u32,
) -> Result<(), GeometryError> {
    for tri in indices.chunks_exact(3) {
        if let [ia, ib, ic] = *tri {
            let a = offset_index(base_vertex, ia)?;
            let b = offset_index(base_vertex, ib)?;
            let c = offset_index(base_vertex, ic)?;
            builder.push_triangle(a, b, c);
        }
    }
    Ok(())
}

fn offset_index(base: u32, offset: usize) -> Result<u32, GeometryError> {
    let offset_u32 =
        u32::try_from(offset).map_err(|_| GeometryError::MeshError("index overflow".into()))?;
    base.checked_add(offset_u32)
        .ok_or_else(|| GeometryError::MeshError("vertex index overflow".into()))
}
