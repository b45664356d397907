//! 2D affine transforms used by the drill transform engine.
//!
//! Angles are in degrees. Every constructor takes an explicit origin so the
//! same transform can be applied to raw feature coordinates and to the solid
//! geometry derived from them.

use serde::Deserialize;

use super::types::Point;

/// Axis to mirror across.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum MirrorAxis {
    /// Mirror across a horizontal line: Y coordinates are flipped.
    X,
    /// Mirror across a vertical line: X coordinates are flipped.
    Y,
}

/// Affine map `x' = a*x + b*y + x_off`, `y' = d*x + e*y + y_off`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    a: f64,
    b: f64,
    d: f64,
    e: f64,
    x_off: f64,
    y_off: f64,
}

impl Affine {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        d: 0.0,
        e: 1.0,
        x_off: 0.0,
        y_off: 0.0,
    };

    /// Scales by `x_factor`/`y_factor` about `origin`.
    pub fn scale(x_factor: f64, y_factor: f64, origin: Point) -> Self {
        Self {
            a: x_factor,
            b: 0.0,
            d: 0.0,
            e: y_factor,
            x_off: (-origin.x).mul_add(x_factor, origin.x),
            y_off: (-origin.y).mul_add(y_factor, origin.y),
        }
    }

    /// Translates by `(dx, dy)`.
    pub const fn translate(dx: f64, dy: f64) -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            d: 0.0,
            e: 1.0,
            x_off: dx,
            y_off: dy,
        }
    }

    /// Mirrors across the line through `point` parallel to `axis`.
    pub fn mirror(axis: MirrorAxis, point: Point) -> Self {
        match axis {
            MirrorAxis::X => Self::scale(1.0, -1.0, point),
            MirrorAxis::Y => Self::scale(-1.0, 1.0, point),
        }
    }

    /// Rotates counter-clockwise by `angle_deg` about `origin`.
    pub fn rotate(angle_deg: f64, origin: Point) -> Self {
        let (sin, cos) = angle_deg.to_radians().sin_cos();
        Self {
            a: cos,
            b: -sin,
            d: sin,
            e: cos,
            x_off: origin.y.mul_add(sin, (-origin.x).mul_add(cos, origin.x)),
            y_off: (-origin.x).mul_add(sin, (-origin.y).mul_add(cos, origin.y)),
        }
    }

    /// Shears by `angle_x_deg` along X and `angle_y_deg` along Y about `origin`.
    pub fn skew(angle_x_deg: f64, angle_y_deg: f64, origin: Point) -> Self {
        let tan_x = angle_x_deg.to_radians().tan();
        let tan_y = angle_y_deg.to_radians().tan();
        Self {
            a: 1.0,
            b: tan_x,
            d: tan_y,
            e: 1.0,
            x_off: -origin.y * tan_x,
            y_off: -origin.x * tan_y,
        }
    }

    /// Maps a single point.
    pub fn apply(&self, point: Point) -> Point {
        Point::new(
            self.a.mul_add(point.x, self.b.mul_add(point.y, self.x_off)),
            self.d.mul_add(point.x, self.e.mul_add(point.y, self.y_off)),
        )
    }
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn assert_point(actual: Point, x: f64, y: f64) {
        assert!(
            (actual.x - x).abs() < EPSILON && (actual.y - y).abs() < EPSILON,
            "expected ({x}, {y}), got ({}, {})",
            actual.x,
            actual.y
        );
    }

    #[test]
    fn ut_aff_001_scale_about_origin_point() {
        let t = Affine::scale(2.0, 3.0, Point::new(1.0, 1.0));
        assert_point(t.apply(Point::new(2.0, 2.0)), 3.0, 4.0);
        assert_point(t.apply(Point::new(1.0, 1.0)), 1.0, 1.0);
    }

    #[test]
    fn ut_aff_002_translate() {
        assert_point(
            Affine::translate(-1.5, 2.0).apply(Point::new(1.0, 1.0)),
            -0.5,
            3.0,
        );
    }

    #[test]
    fn ut_aff_003_rotate_quarter_turn_counter_clockwise() {
        let t = Affine::rotate(90.0, Point::new(1.0, 0.0));
        assert_point(t.apply(Point::new(2.0, 0.0)), 1.0, 1.0);
        assert_point(t.apply(Point::new(1.0, 0.0)), 1.0, 0.0);
    }

    #[test]
    fn ut_aff_004_mirror_axes() {
        let p = Point::new(3.0, 4.0);
        assert_point(
            Affine::mirror(MirrorAxis::X, Point::new(0.0, 1.0)).apply(p),
            3.0,
            -2.0,
        );
        assert_point(
            Affine::mirror(MirrorAxis::Y, Point::new(1.0, 0.0)).apply(p),
            -1.0,
            4.0,
        );
    }

    #[test]
    fn ut_aff_005_skew_shears_relative_to_origin() {
        let t = Affine::skew(45.0, 0.0, Point::new(0.0, 1.0));
        assert_point(t.apply(Point::new(0.0, 1.0)), 0.0, 1.0);
        assert_point(t.apply(Point::new(0.0, 3.0)), 2.0, 3.0);
    }

    #[test]
    fn ut_aff_006_identity_is_default() {
        assert_eq!(Affine::default(), Affine::IDENTITY);
        assert_point(Affine::IDENTITY.apply(Point::new(7.0, -2.0)), 7.0, -2.0);
    }
}
