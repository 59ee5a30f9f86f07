//! Connection curves.

use kurbo::{CubicBez, ParamCurve};
use tc_core::geometry::Point;

fn kp(p: Point) -> kurbo::Point {
    kurbo::Point::new(p.x as f64, p.y as f64)
}

/// Cubic Bézier between two socket anchors.
///
/// Both control points sit on horizontals through their endpoints, half the
/// horizontal span away (never less than `min_bow`), so the curve leaves an
/// output to the right and enters an input from the left.
pub fn connection_curve(start: Point, end: Point, min_bow: f32) -> CubicBez {
    let bow = ((end.x - start.x).abs() / 2.0).max(min_bow) as f64;
    let p0 = kp(start);
    let p3 = kp(end);
    CubicBez::new(
        p0,
        kurbo::Point::new(p0.x + bow, p0.y),
        kurbo::Point::new(p3.x - bow, p3.y),
        p3,
    )
}

/// Point halfway along the curve, used to anchor hover labels.
pub fn curve_midpoint(curve: &CubicBez) -> Point {
    let m = curve.eval(0.5);
    Point::new(m.x as f32, m.y as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_exact() {
        let c = connection_curve(Point::new(160.0, 30.0), Point::new(400.0, 230.0), 40.0);
        assert_eq!((c.p0.x, c.p0.y), (160.0, 30.0));
        assert_eq!((c.p3.x, c.p3.y), (400.0, 230.0));
        assert_eq!((c.p1.x, c.p1.y), (280.0, 30.0));
        assert_eq!((c.p2.x, c.p2.y), (280.0, 230.0));
    }

    #[test]
    fn short_spans_keep_a_minimum_bow() {
        let c = connection_curve(Point::new(0.0, 0.0), Point::new(10.0, 100.0), 40.0);
        assert_eq!(c.p1.x, 40.0);
        assert_eq!(c.p2.x, -30.0);
    }

    #[test]
    fn midpoint_of_symmetric_curve() {
        let c = connection_curve(Point::new(0.0, 0.0), Point::new(200.0, 100.0), 40.0);
        let m = curve_midpoint(&c);
        assert!((m.x - 100.0).abs() < 1e-3);
        assert!((m.y - 50.0).abs() < 1e-3);
    }
}
