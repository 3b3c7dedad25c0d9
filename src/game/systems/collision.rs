//! Trail collision
//!
//! Broad phase: the grid's 3x3 neighbourhood around the probe point.
//! Filter: gap segments, and the player's own segments still inside the
//! grace window. Narrow phase: circle against each remaining rotated square,
//! measured with the minimum-image displacement so the world seam is
//! invisible to collisions.

use crate::config::Settings;
use crate::game::player::{Dynamics, Player, PowerUps};
use crate::game::spatial::SegmentGrid;
use crate::game::trail::Segment;
use crate::util::geometry::circle_offset_intersects_rect;
use crate::util::vec2::Vec2;

/// Collision circle at the leading edge of a player's marker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Probe {
    pub player: Player,
    pub point: Vec2,
    pub radius: f32,
}

impl Probe {
    /// Probe half a trail width ahead of the player's position
    pub fn for_player(
        settings: &Settings,
        player: Player,
        dynamics: &Dynamics,
        power_ups: &PowerUps,
    ) -> Self {
        let width = settings.width_of(power_ups.size);
        let point = (dynamics.position + dynamics.velocity_direction * (width * 0.5))
            .wrap(settings.dimensions);
        Self {
            player,
            point,
            radius: width * 0.5,
        }
    }
}

/// Whether a segment can collide with `player` at time `now_ms`
#[inline]
pub fn is_collidable(segment: &Segment, player: Player, now_ms: f64, grace_ms: f64) -> bool {
    if segment.is_gap {
        return false;
    }
    !(segment.owner == player && segment.in_grace_period(now_ms, grace_ms))
}

/// Narrow-phase test of a segment against a circle on the torus
#[inline]
pub fn segment_intersects_position(
    segment: &Segment,
    point: Vec2,
    radius: f32,
    dimensions: Vec2,
) -> bool {
    let offset = segment.anchor.toroidal_delta(point, dimensions);
    circle_offset_intersects_rect(offset, segment.extent, segment.angle, radius)
}

/// Broad-phase candidates for `probe` that survive the gap and grace filters
pub fn candidate_segments<'a>(
    grid: &'a SegmentGrid,
    settings: &'a Settings,
    probe: Probe,
    now_ms: f64,
) -> impl Iterator<Item = &'a Segment> + 'a {
    grid.query_near(probe.point)
        .filter(move |s| is_collidable(s, probe.player, now_ms, settings.grace_ms))
}

/// First segment the probe hits, if any
pub fn first_hit<'a>(
    grid: &'a SegmentGrid,
    settings: &'a Settings,
    probe: Probe,
    now_ms: f64,
) -> Option<&'a Segment> {
    let dims = settings.dimensions;
    candidate_segments(grid, settings, probe, now_ms)
        .find(|s| segment_intersects_position(s, probe.point, probe.radius, dims))
}

/// Whether the probe's position is open, i.e. touches no collidable trail
pub fn is_valid_position(grid: &SegmentGrid, settings: &Settings, probe: Probe, now_ms: f64) -> bool {
    match first_hit(grid, settings, probe, now_ms) {
        None => true,
        Some(hit) => {
            if settings.debug {
                tracing::debug!(
                    player = %probe.player,
                    segment = hit.id,
                    owner = %hit.owner,
                    "Probe at ({:.1}, {:.1}) hit segment at ({:.1}, {:.1})",
                    probe.point.x,
                    probe.point.y,
                    hit.anchor.x,
                    hit.anchor.y
                );
            }
            false
        }
    }
}
