//! Solid 2D shapes produced by buffering drill points and slot segments.
//!
//! A drill hit becomes a circle approximated by a regular polygon; a slot
//! becomes a capsule (a rectangle with semicircular endcaps). Shapes are
//! kept in a [`Geometry`] tree so bounds and transforms are a single
//! recursive walk.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use serde::Serialize;

use super::affine::Affine;
use super::types::{BoundingBox, Point};

const MIN_QUADRANT_SEGMENTS: u32 = 1;

/// A simple polygon described by its exterior ring.
///
/// The ring is implicitly closed: the last vertex connects back to the first.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Polygon {
    /// Ring vertices in counter-clockwise order.
    pub exterior: Vec<Point>,
}

impl Polygon {
    /// Returns `true` when the polygon encloses no area.
    pub fn is_empty(&self) -> bool {
        self.exterior.len() < 3
    }

    /// Bounding box of the ring, or `None` for an empty polygon.
    pub fn bounds(&self) -> Option<BoundingBox> {
        if self.exterior.is_empty() {
            return None;
        }
        let mut bounds = BoundingBox::new();
        for point in &self.exterior {
            bounds.update(point.x, point.y);
        }
        Some(bounds)
    }

    /// Signed area (positive for counter-clockwise rings).
    pub fn signed_area(&self) -> f64 {
        let n = self.exterior.len();
        let mut twice_area = 0.0;
        for (i, a) in self.exterior.iter().enumerate() {
            if let Some(b) = self.exterior.get((i + 1) % n) {
                twice_area += a.x.mul_add(b.y, -(b.x * a.y));
            }
        }
        twice_area / 2.0
    }

    /// Applies an affine transform to every vertex in place.
    pub fn transform(&mut self, affine: &Affine) {
        for point in &mut self.exterior {
            *point = affine.apply(*point);
        }
    }
}

/// Solid geometry: a single polygon or a nested collection of geometries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Geometry {
    /// A single solid polygon.
    Polygon(Polygon),
    /// A group of geometries.
    Collection(Vec<Geometry>),
}

impl Geometry {
    /// An empty collection.
    pub const fn empty() -> Self {
        Self::Collection(Vec::new())
    }

    /// Bounding box over every nested polygon, or `None` if there are none.
    pub fn bounds(&self) -> Option<BoundingBox> {
        match self {
            Self::Polygon(polygon) => polygon.bounds(),
            Self::Collection(children) => {
                let mut bounds = BoundingBox::new();
                for child in children {
                    if let Some(child_bounds) = child.bounds() {
                        bounds.merge(&child_bounds);
                    }
                }
                (!bounds.is_empty()).then_some(bounds)
            }
        }
    }

    /// Applies an affine transform to every vertex in place.
    pub fn transform(&mut self, affine: &Affine) {
        match self {
            Self::Polygon(polygon) => polygon.transform(affine),
            Self::Collection(children) => {
                for child in children {
                    child.transform(affine);
                }
            }
        }
    }

    /// Flattens the tree into its polygons, depth first.
    pub fn polygons(&self) -> Vec<&Polygon> {
        let mut out = Vec::new();
        self.collect_polygons(&mut out);
        out
    }

    fn collect_polygons<'a>(&'a self, out: &mut Vec<&'a Polygon>) {
        match self {
            Self::Polygon(polygon) => out.push(polygon),
            Self::Collection(children) => {
                for child in children {
                    child.collect_polygons(out);
                }
            }
        }
    }

    /// Number of polygons in the tree.
    pub fn polygon_count(&self) -> usize {
        match self {
            Self::Polygon(_) => 1,
            Self::Collection(children) => children.iter().map(Self::polygon_count).sum(),
        }
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Polygon> for Geometry {
    fn from(polygon: Polygon) -> Self {
        Self::Polygon(polygon)
    }
}

/// Segments used for each quarter circle, derived from a full-circle count.
///
/// A full circle is always built from a multiple of four segments so the
/// extreme points along both axes lie exactly on the circle.
pub fn quadrant_segments(circle_segments: u32) -> u32 {
    (circle_segments / 4).max(MIN_QUADRANT_SEGMENTS)
}

/// Buffers a point into a circle of the given `radius`.
///
/// `circle_segments` is the approximation resolution of a full circle.
/// A non-positive or non-finite radius yields an empty polygon.
pub fn buffer_point(center: Point, radius: f64, circle_segments: u32) -> Polygon {
    if !radius.is_finite() || radius <= 0.0 {
        return Polygon::default();
    }

    let segments = quadrant_segments(circle_segments) * 4;
    let exterior = (0..segments)
        .map(|i| {
            let angle = TAU * f64::from(i) / f64::from(segments);
            Point::new(
                radius.mul_add(angle.cos(), center.x),
                radius.mul_add(angle.sin(), center.y),
            )
        })
        .collect();

    Polygon { exterior }
}

/// Buffers the segment `from`-`to` into a capsule of the given `radius`.
///
/// The body is the rectangle swept by the segment, closed by a semicircle
/// at each end. A zero-length segment degrades to [`buffer_point`].
pub fn buffer_segment(from: Point, to: Point, radius: f64, circle_segments: u32) -> Polygon {
    if !radius.is_finite() || radius <= 0.0 {
        return Polygon::default();
    }

    let delta_x = to.x - from.x;
    let delta_y = to.y - from.y;
    let segment_length_sq = delta_x.mul_add(delta_x, delta_y * delta_y);
    if segment_length_sq <= f64::EPSILON * f64::EPSILON {
        return buffer_point(from, radius, circle_segments);
    }

    let direction_angle = delta_y.atan2(delta_x);
    let half_turn = quadrant_segments(circle_segments) * 2;

    let mut exterior = Vec::new();
    push_semi_circle(
        &mut exterior,
        to,
        radius,
        direction_angle - FRAC_PI_2,
        half_turn,
    );
    push_semi_circle(
        &mut exterior,
        from,
        radius,
        direction_angle + FRAC_PI_2,
        half_turn,
    );

    Polygon { exterior }
}

fn push_semi_circle(
    ring: &mut Vec<Point>,
    center: Point,
    radius: f64,
    start_angle: f64,
    segments: u32,
) {
    let segment_count = segments.max(1);
    let angle_step = PI / f64::from(segment_count);
    for idx in 0..=segment_count {
        let angle = angle_step.mul_add(f64::from(idx), start_angle);
        ring.push(Point::new(
            radius.mul_add(angle.cos(), center.x),
            radius.mul_add(angle.sin(), center.y),
        ));
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < EPSILON,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn ut_shp_001_point_buffer_has_requested_resolution() {
        let circle = buffer_point(Point::new(5.0, 5.0), 0.5, 64);
        assert_eq!(circle.exterior.len(), 64);
        let bounds = circle.bounds();
        assert!(bounds.is_some(), "circle must have bounds");
        if let Some(b) = bounds {
            assert_close(b.min_x, 4.5);
            assert_close(b.max_x, 5.5);
            assert_close(b.min_y, 4.5);
            assert_close(b.max_y, 5.5);
        }
    }

    #[test]
    fn ut_shp_002_low_resolution_is_clamped_to_a_square() {
        let circle = buffer_point(Point::new(0.0, 0.0), 1.0, 1);
        assert_eq!(circle.exterior.len(), 4);
        assert_close(circle.exterior[0].x, 1.0);
        assert_close(circle.exterior[1].y, 1.0);
    }

    #[test]
    fn ut_shp_003_segment_buffer_is_a_capsule() {
        let capsule = buffer_segment(Point::new(0.0, 0.0), Point::new(10.0, 0.0), 1.0, 64);
        assert_eq!(capsule.exterior.len(), 66);
        assert!(capsule.signed_area() > 0.0, "ring must be counter-clockwise");

        let bounds = capsule.bounds();
        assert!(bounds.is_some(), "capsule must have bounds");
        if let Some(b) = bounds {
            assert_close(b.min_x, -1.0);
            assert_close(b.max_x, 11.0);
            assert_close(b.min_y, -1.0);
            assert_close(b.max_y, 1.0);
        }

        let expected_area = 2.0f64.mul_add(10.0, PI);
        assert!((capsule.signed_area() - expected_area).abs() < 0.01);
    }

    #[test]
    fn ut_shp_004_zero_length_segment_is_a_circle() {
        let p = Point::new(2.0, 3.0);
        assert_eq!(buffer_segment(p, p, 1.0, 16), buffer_point(p, 1.0, 16));
    }

    #[test]
    fn ut_shp_005_nested_bounds_cover_all_children() {
        let tree = Geometry::Collection(vec![
            buffer_point(Point::new(0.0, 0.0), 1.0, 8).into(),
            Geometry::Collection(vec![
                Geometry::empty(),
                buffer_point(Point::new(10.0, -5.0), 1.0, 8).into(),
            ]),
        ]);

        assert_eq!(tree.polygon_count(), 2);
        assert_eq!(tree.polygons().len(), 2);
        let bounds = tree.bounds();
        assert!(bounds.is_some(), "tree must have bounds");
        if let Some(b) = bounds {
            assert_close(b.min_x, -1.0);
            assert_close(b.min_y, -6.0);
            assert_close(b.max_x, 11.0);
            assert_close(b.max_y, 1.0);
        }
    }

    #[test]
    fn ut_shp_006_transform_walks_the_tree() {
        let mut tree = Geometry::Collection(vec![buffer_point(Point::new(0.0, 0.0), 1.0, 4).into()]);
        tree.transform(&Affine::translate(5.0, 0.0));
        let bounds = tree.bounds();
        assert!(bounds.is_some(), "tree must have bounds");
        if let Some(b) = bounds {
            assert_close(b.min_x, 4.0);
            assert_close(b.max_x, 6.0);
        }
    }

    #[test]
    fn bc_shp_001_zero_radius_yields_empty_polygon() {
        assert!(buffer_point(Point::new(0.0, 0.0), 0.0, 64).is_empty());
        assert!(buffer_segment(Point::new(0.0, 0.0), Point::new(1.0, 0.0), -1.0, 64).is_empty());
        assert!(Polygon::default().bounds().is_none());
    }

    #[test]
    fn bc_shp_002_empty_tree_has_no_bounds() {
        assert!(Geometry::empty().bounds().is_none());
        assert!(Geometry::Collection(vec![Geometry::empty()]).bounds().is_none());
    }
}
