//! Oriented-rectangle geometry for trail segments
//!
//! Segments are squares rotated about their own centre. The narrow phase
//! moves the query circle into the rectangle's unrotated frame and measures
//! the distance to the clamped point.

use super::vec2::Vec2;

/// Corners of an `extent`-sized rectangle centred on `center` and rotated by
/// `angle`, in perimeter order
pub fn oriented_quad(center: Vec2, extent: Vec2, angle: f32) -> [Vec2; 4] {
    let half = extent * 0.5;
    [
        Vec2::new(center.x - half.x, center.y - half.y),
        Vec2::new(center.x + half.x, center.y - half.y),
        Vec2::new(center.x + half.x, center.y + half.y),
        Vec2::new(center.x - half.x, center.y + half.y),
    ]
    .map(|corner| corner.rotate_about(angle, center))
}

/// Whether a circle intersects a rotated rectangle
#[inline]
pub fn rect_intersects_circle(
    rect_center: Vec2,
    rect_extent: Vec2,
    rect_angle: f32,
    circle_center: Vec2,
    circle_radius: f32,
) -> bool {
    circle_offset_intersects_rect(
        circle_center - rect_center,
        rect_extent,
        rect_angle,
        circle_radius,
    )
}

/// Same test with the circle given relative to the rectangle centre
///
/// Callers on the torus pass the minimum-image displacement here.
pub fn circle_offset_intersects_rect(
    offset: Vec2,
    rect_extent: Vec2,
    rect_angle: f32,
    circle_radius: f32,
) -> bool {
    let local = offset.rotate(-rect_angle);
    let half = rect_extent * 0.5;
    let closest = local.clamp(-half, half);
    local.distance_sq_to(closest) <= circle_radius * circle_radius
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_4, PI, SQRT_2};

    #[test]
    fn test_circle_at_center_always_intersects() {
        let center = Vec2::new(40.0, 40.0);
        for angle in [0.0, 0.3, FRAC_PI_4, PI, 5.0] {
            for radius in [1e-4, 0.5, 3.0, 100.0] {
                assert!(rect_intersects_circle(
                    center,
                    Vec2::splat(5.0),
                    angle,
                    center,
                    radius
                ));
            }
        }
    }

    #[test]
    fn test_far_circle_never_intersects() {
        let center = Vec2::new(0.0, 0.0);
        let extent = Vec2::new(6.0, 4.0);
        let radius = 2.0;
        let reach = radius + 3.0 * SQRT_2 + 0.01;
        for i in 0..16 {
            let dir = Vec2::from_angle(i as f32 * PI / 8.0);
            for angle in [0.0, 0.7, FRAC_PI_4, 2.0] {
                assert!(!rect_intersects_circle(
                    center,
                    extent,
                    angle,
                    center + dir * reach,
                    radius
                ));
            }
        }
    }

    #[test]
    fn test_edge_contact_axis_aligned() {
        let extent = Vec2::splat(4.0);
        // Edge at x = 2, circle of radius 1 centred at x = 3 touches it
        assert!(rect_intersects_circle(
            Vec2::ZERO,
            extent,
            0.0,
            Vec2::new(3.0, 0.0),
            1.0
        ));
        assert!(!rect_intersects_circle(
            Vec2::ZERO,
            extent,
            0.0,
            Vec2::new(3.1, 0.0),
            1.0
        ));
    }

    #[test]
    fn test_rotation_reaches_corner() {
        // Rotated 45 degrees, the corner of a 4x4 square sits at distance 2*sqrt(2)
        let extent = Vec2::splat(4.0);
        let probe = Vec2::new(2.0 * SQRT_2 + 0.4, 0.0);
        assert!(rect_intersects_circle(Vec2::ZERO, extent, FRAC_PI_4, probe, 0.5));
        assert!(!rect_intersects_circle(Vec2::ZERO, extent, 0.0, probe, 0.5));
    }

    #[test]
    fn test_non_square_uses_height() {
        let extent = Vec2::new(10.0, 2.0);
        assert!(rect_intersects_circle(
            Vec2::ZERO,
            extent,
            0.0,
            Vec2::new(4.5, 0.0),
            0.1
        ));
        assert!(!rect_intersects_circle(
            Vec2::ZERO,
            extent,
            0.0,
            Vec2::new(0.0, 2.0),
            0.5
        ));
    }

    #[test]
    fn test_oriented_quad_unrotated() {
        let quad = oriented_quad(Vec2::new(10.0, 10.0), Vec2::splat(2.0), 0.0);
        assert_eq!(quad[0], Vec2::new(9.0, 9.0));
        assert_eq!(quad[1], Vec2::new(11.0, 9.0));
        assert_eq!(quad[2], Vec2::new(11.0, 11.0));
        assert_eq!(quad[3], Vec2::new(9.0, 11.0));
    }

    #[test]
    fn test_oriented_quad_rotated_keeps_center() {
        let center = Vec2::new(3.0, -2.0);
        let quad = oriented_quad(center, Vec2::splat(2.0), 0.6);
        let mean = quad.iter().fold(Vec2::ZERO, |acc, c| acc + *c) * 0.25;
        assert!(mean.approx_eq(center, 1e-4));
        for corner in quad {
            assert!((corner.distance_sq_to(center) - 2.0).abs() < 1e-4);
        }
    }
}
