//! Integration tests for drill geometry, transforms and mesh output.

use drillview_wasm::config::ExcellonConfig;
use drillview_wasm::excellon::{parse, TransformOp};
use drillview_wasm::geometry::{fill_geometry, GeometryBuilder, MirrorAxis, Point};
use drillview_wasm::{get_indices, get_positions, parse_excellon_internal, transform_excellon_internal};

fn assert_mesh_invariants(vertex_count: u32) {
    let positions = get_positions();
    let indices = get_indices();

    assert_eq!(
        positions.len(),
        vertex_count as usize * 2,
        "positions length should match vertex_count * 2"
    );
    assert_eq!(indices.len() % 3, 0, "indices should form a triangle list");

    let max_idx = positions.len() / 2;
    for idx in &indices {
        assert!(
            (*idx as usize) < max_idx,
            "index {} out of bounds for {} vertices",
            idx,
            max_idx
        );
    }
}

/// Parse KiCad drill file → valid mesh buffers.
#[test]
#[allow(clippy::expect_used)]
fn kicad_drill_mesh_invariants() {
    let data = include_bytes!("fixtures/kicad/board-PTH.drl");
    let meta = parse_excellon_internal(data, &ExcellonConfig::default())
        .expect("parse should succeed");
    assert_eq!(meta.vertex_count, 7 * 64, "one 64-gon per drill");
    assert_mesh_invariants(meta.vertex_count);
}

/// Slot capsules triangulate into the same mesh as drills.
#[test]
#[allow(clippy::expect_used)]
fn routed_slots_mesh_invariants() {
    let data = include_bytes!("fixtures/routed/slots.drl");
    let meta = parse_excellon_internal(data, &ExcellonConfig::default())
        .expect("parse should succeed");
    assert_eq!(meta.vertex_count, 3 * 66, "one capsule per slot");
    assert_eq!(meta.index_count, 3 * 64 * 3);
    assert_mesh_invariants(meta.vertex_count);
}

/// A coarser circle resolution shrinks the mesh.
#[test]
#[allow(clippy::expect_used)]
fn circle_resolution_is_configurable() {
    let data = include_bytes!("fixtures/kicad/board-PTH.drl");
    let config = ExcellonConfig {
        circle_segments: 16,
        ..ExcellonConfig::default()
    };
    let meta = parse_excellon_internal(data, &config).expect("parse should succeed");
    assert_eq!(meta.vertex_count, 7 * 16);
}

/// Rotating a quarter turn about the bounds centre swaps the extents.
#[test]
#[allow(clippy::expect_used)]
fn rotate_swaps_extents() {
    let data = include_bytes!("fixtures/routed/slots.drl");
    let before = parse_excellon_internal(data, &ExcellonConfig::default())
        .expect("parse should succeed");
    let after = transform_excellon_internal(&TransformOp::Rotate {
        angle: 90.0,
        origin: None,
    })
    .expect("transform should succeed");

    let width = |b: &drillview_wasm::geometry::BoundingBox| b.max_x - b.min_x;
    let height = |b: &drillview_wasm::geometry::BoundingBox| b.max_y - b.min_y;
    assert!((width(&after.bounds) - height(&before.bounds)).abs() < 1e-6);
    assert!((height(&after.bounds) - width(&before.bounds)).abs() < 1e-6);
    assert!((before.bounds.center().x - after.bounds.center().x).abs() < 1e-6);
    assert_mesh_invariants(after.vertex_count);
}

/// Mirror, skew and unit conversion leave geometry matching a fresh synthesis.
#[test]
#[allow(clippy::expect_used)]
fn transforms_keep_geometry_in_sync() {
    let mut doc = parse(include_bytes!("fixtures/kicad/board-PTH.drl"))
        .expect("parse should succeed");
    doc.mirror(MirrorAxis::Y, Point::new(0.0, 0.0));
    doc.skew(10.0, 0.0, None);
    doc.convert_units(drillview_wasm::excellon::Units::Inch);

    let stored = doc.solid_geometry();
    let mut fresh = doc.clone();
    fresh.synthesize();
    let rebuilt = fresh.solid_geometry();

    assert_eq!(stored, rebuilt, "unit conversion resynthesizes geometry");
    assert!(stored.bounds().is_some_and(|b| b.max_x < 0.0), "mirror flips X");

    let mut builder = GeometryBuilder::new();
    fill_geometry(&mut builder, &rebuilt).expect("mesh should build");
    let geom = builder.build();
    assert_eq!(geom.vertex_count, 7 * 64);
}
