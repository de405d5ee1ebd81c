//! Cubic Bezier path in the ground plane.

use crate::Vec3;

/// Evaluates a cubic Bezier curve (Bernstein form) at `t`.
///
/// `t` is clamped to `[0, 1]`; the endpoints are returned verbatim so that
/// `t = 0` yields exactly `P0` and `t = 1` exactly `P3`.
pub fn cubic_bezier(t: f32, points: &[Vec3; 4]) -> Vec3 {
    if t <= 0.0 {
        return points[0];
    }
    if t >= 1.0 {
        return points[3];
    }

    let u = 1.0 - t;
    let b0 = u * u * u;
    let b1 = 3.0 * u * u * t;
    let b2 = 3.0 * u * t * t;
    let b3 = t * t * t;

    points[0] * b0 + points[1] * b1 + points[2] * b2 + points[3] * b3
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubicBezierPath {
    pub control_points: [Vec3; 4],
}

impl CubicBezierPath {
    pub const fn new(control_points: [Vec3; 4]) -> Self {
        Self { control_points }
    }

    #[inline]
    pub fn point(&self, t: f32) -> Vec3 {
        cubic_bezier(t, &self.control_points)
    }

    pub fn start(&self) -> Vec3 {
        self.control_points[0]
    }

    pub fn end(&self) -> Vec3 {
        self.control_points[3]
    }
}

impl Default for CubicBezierPath {
    /// S-shaped stage path from x = -10 to x = 10.
    fn default() -> Self {
        Self::new([
            Vec3::new(-10.0, 0.0, 0.0),
            Vec3::new(-3.0, 5.0, 0.0),
            Vec3::new(3.0, -5.0, 0.0),
            Vec3::new(10.0, 0.0, 0.0),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn odd_points() -> [Vec3; 4] {
        [
            Vec3::new(0.1, -0.7, 0.3),
            Vec3::new(3.3, 1.9, -2.0),
            Vec3::new(-4.2, 0.25, 7.0),
            Vec3::new(9.7, -3.1, 0.6),
        ]
    }

    #[test]
    fn endpoints_are_exact() {
        let p = odd_points();
        assert_eq!(cubic_bezier(0.0, &p), p[0]);
        assert_eq!(cubic_bezier(1.0, &p), p[3]);
    }

    #[test]
    fn midpoint_matches_bernstein_weights() {
        let p = odd_points();
        // At t = 0.5 the weights are 1/8, 3/8, 3/8, 1/8.
        let expected = (p[0] + p[1] * 3.0 + p[2] * 3.0 + p[3]) / 8.0;
        assert!((cubic_bezier(0.5, &p) - expected).length() < 1e-5);
    }

    #[test]
    fn out_of_range_parameter_clamps() {
        let p = odd_points();
        assert_eq!(cubic_bezier(-0.5, &p), p[0]);
        assert_eq!(cubic_bezier(1.5, &p), p[3]);
    }

    #[test]
    fn default_path_stays_on_ground_plane() {
        let path = CubicBezierPath::default();
        for i in 0..=20 {
            let t = i as f32 / 20.0;
            assert_eq!(path.point(t).z, 0.0);
        }
        assert_eq!(path.start(), Vec3::new(-10.0, 0.0, 0.0));
        assert_eq!(path.end(), Vec3::new(10.0, 0.0, 0.0));
    }
}
