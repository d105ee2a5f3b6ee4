//! Geometric utilities over normalized landmark positions.
//!
//! All functions are pure and allocation-free. Angles are in degrees unless a
//! name says otherwise. Image space has y growing downward, so "above" means
//! a smaller y.

use nalgebra::{Vector2, Vector3};

use crate::types::{PoseLandmark, Position3D};

/// Angle between two vectors in radians, 0 if either is degenerate
pub fn angle_between(v1: &Vector3<f64>, v2: &Vector3<f64>) -> f64 {
    let dot = v1.dot(v2);
    let norms = v1.norm() * v2.norm();
    if norms < 1e-10 {
        0.0
    } else {
        (dot / norms).clamp(-1.0, 1.0).acos()
    }
}

/// Angle at `p2` formed by rays to `p1` and `p3`, ignoring depth
pub fn angle_2d(p1: &Position3D, p2: &Position3D, p3: &Position3D) -> f64 {
    let v1 = Vector2::new(p1.x - p2.x, p1.y - p2.y);
    let v2 = Vector2::new(p3.x - p2.x, p3.y - p2.y);
    let norms = v1.norm() * v2.norm();
    if norms < 1e-10 {
        return 0.0;
    }
    (v1.dot(&v2) / norms).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Angle at `p2` formed by rays to `p1` and `p3`, using depth
pub fn angle_3d(p1: &Position3D, p2: &Position3D, p3: &Position3D) -> f64 {
    let v1 = Vector3::new(p1.x - p2.x, p1.y - p2.y, p1.z - p2.z);
    let v2 = Vector3::new(p3.x - p2.x, p3.y - p2.y, p3.z - p2.z);
    angle_between(&v1, &v2).to_degrees()
}

pub fn distance_2d(p1: &Position3D, p2: &Position3D) -> f64 {
    let dx = p1.x - p2.x;
    let dy = p1.y - p2.y;
    (dx * dx + dy * dy).sqrt()
}

pub fn distance_3d(p1: &Position3D, p2: &Position3D) -> f64 {
    let dx = p1.x - p2.x;
    let dy = p1.y - p2.y;
    let dz = p1.z - p2.z;
    (dx * dx + dy * dy + dz * dz).sqrt()
}

pub fn midpoint(p1: &Position3D, p2: &Position3D) -> Position3D {
    Position3D::new(
        (p1.x + p2.x) / 2.0,
        (p1.y + p2.y) / 2.0,
        (p1.z + p2.z) / 2.0,
    )
}

/// Signed vertical offset from `p1` to `p2` (positive when `p2` is lower)
pub fn vertical_distance(p1: &Position3D, p2: &Position3D) -> f64 {
    p2.y - p1.y
}

/// Signed horizontal offset from `p1` to `p2` (positive when `p2` is to the right)
pub fn horizontal_distance(p1: &Position3D, p2: &Position3D) -> f64 {
    p2.x - p1.x
}

pub fn is_angle_in_range(angle: f64, min: f64, max: f64) -> bool {
    angle >= min && angle <= max
}

/// Tilt of the segment `bottom → top` away from straight up, in degrees.
///
/// 0 for a perfectly upright segment, 90 for horizontal.
pub fn angle_from_vertical(top: &Position3D, bottom: &Position3D) -> f64 {
    let dx = top.x - bottom.x;
    let dy = bottom.y - top.y;
    if dx.abs() < 1e-10 && dy.abs() < 1e-10 {
        return 0.0;
    }
    dx.abs().atan2(dy).to_degrees()
}

/// Confidence gate: whether a landmark may be used at the given tier
pub fn is_visible(landmark: &PoseLandmark, threshold: f32) -> bool {
    landmark.confidence >= threshold && landmark.position.is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LandmarkId;
    use approx::assert_abs_diff_eq;
    use std::time::Instant;

    fn p(x: f64, y: f64) -> Position3D {
        Position3D::new(x, y, 0.0)
    }

    #[test]
    fn test_right_angle() {
        let angle = angle_2d(&p(0.0, 0.0), &p(0.5, 0.0), &p(0.5, 0.5));
        assert_abs_diff_eq!(angle, 90.0, epsilon = 1e-9);
    }

    #[test]
    fn test_straight_and_folded() {
        assert_abs_diff_eq!(angle_2d(&p(0.0, 0.0), &p(0.5, 0.0), &p(1.0, 0.0)), 180.0, epsilon = 1e-9);
        assert_abs_diff_eq!(angle_2d(&p(1.0, 0.0), &p(0.0, 0.0), &p(2.0, 0.0)), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_degenerate_angle_is_zero() {
        assert_eq!(angle_2d(&p(0.5, 0.5), &p(0.5, 0.5), &p(1.0, 1.0)), 0.0);
        assert_eq!(
            angle_3d(&Position3D::origin(), &Position3D::origin(), &Position3D::origin()),
            0.0
        );
    }

    #[test]
    fn test_angle_3d_uses_depth() {
        let a = Position3D::new(1.0, 0.0, 0.0);
        let b = Position3D::origin();
        let c = Position3D::new(0.0, 0.0, 1.0);
        assert_abs_diff_eq!(angle_3d(&a, &b, &c), 90.0, epsilon = 1e-9);
        // Projected onto the image plane the second ray collapses
        assert_eq!(angle_2d(&a, &b, &c), 0.0);
    }

    #[test]
    fn test_distances_and_projections() {
        let a = Position3D::new(0.0, 0.0, 0.0);
        let b = Position3D::new(3.0, 4.0, 12.0);
        assert_abs_diff_eq!(distance_2d(&a, &b), 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(distance_3d(&a, &b), 13.0, epsilon = 1e-12);
        assert_eq!(midpoint(&a, &b), Position3D::new(1.5, 2.0, 6.0));
        assert_eq!(vertical_distance(&a, &b), 4.0);
        assert_eq!(horizontal_distance(&b, &a), -3.0);
    }

    #[test]
    fn test_angle_in_range_inclusive() {
        assert!(is_angle_in_range(90.0, 90.0, 120.0));
        assert!(is_angle_in_range(120.0, 90.0, 120.0));
        assert!(!is_angle_in_range(120.1, 90.0, 120.0));
    }

    #[test]
    fn test_angle_from_vertical() {
        assert_abs_diff_eq!(angle_from_vertical(&p(0.5, 0.2), &p(0.5, 0.6)), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(angle_from_vertical(&p(0.9, 0.6), &p(0.5, 0.6)), 90.0, epsilon = 1e-9);
        assert_abs_diff_eq!(angle_from_vertical(&p(0.1, 0.2), &p(0.5, 0.6)), 45.0, epsilon = 1e-9);
    }

    #[test]
    fn test_visibility_gate() {
        let lm = PoseLandmark::new(LandmarkId::Nose, p(0.5, 0.5), 0.6);
        assert!(is_visible(&lm, 0.5));
        assert!(!is_visible(&lm, 0.7));
    }

    #[test]
    fn test_angle_throughput() {
        let start = Instant::now();
        let mut acc = 0.0;
        for i in 0..10_000 {
            let t = i as f64 * 1e-4;
            acc += angle_2d(&p(0.0, t), &p(0.5, 0.5), &p(1.0, 1.0 - t));
        }
        let per_call = start.elapsed().as_secs_f64() / 10_000.0;
        assert!(acc > 0.0);
        assert!(per_call < 10e-6, "angle took {per_call}s per call");
    }
}
