//! Trail emission
//!
//! Each tick, a living player's displacement is cut into square segments
//! spaced at most half a trail width apart, so no collider can pass between
//! two consecutive segments without touching one of them. Segments are
//! immutable once emitted.

use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::game::constants::clock::MS_PER_SECOND;
use crate::game::player::{Dynamics, Player, PowerUps};
use crate::game::spatial::{SegmentGrid, SpatialError};
use crate::util::geometry::oriented_quad;
use crate::util::vec2::Vec2;

/// Identifier assigned in emission order
pub type SegmentId = u64;

/// A piece of trail laid down by one player
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: SegmentId,
    pub owner: Player,
    /// Centre of the square, wrapped into the world
    pub anchor: Vec2,
    /// Width and height (equal for trail squares)
    pub extent: Vec2,
    /// Orientation, `atan2(velocity.x, velocity.y)` at emission
    pub angle: f32,
    /// Simulation clock at emission (ms)
    pub emitted_at_ms: f64,
    /// Gap segments never collide and are not drawn
    pub is_gap: bool,
    /// Corners after rotation, in perimeter order
    pub bounding_quad: [Vec2; 4],
}

impl Segment {
    pub fn new(
        id: SegmentId,
        owner: Player,
        anchor: Vec2,
        width: f32,
        angle: f32,
        emitted_at_ms: f64,
        is_gap: bool,
    ) -> Self {
        let extent = Vec2::splat(width);
        Self {
            id,
            owner,
            anchor,
            extent,
            angle,
            emitted_at_ms,
            is_gap,
            bounding_quad: oriented_quad(anchor, extent, angle),
        }
    }

    /// Whether this segment is still too fresh to hit its own emitter
    #[inline]
    pub fn in_grace_period(&self, now_ms: f64, grace_ms: f64) -> bool {
        now_ms - self.emitted_at_ms < grace_ms
    }
}

/// Whether trail emitted at `emitted_at_ms` falls in the periodic gap window
#[inline]
pub fn is_gap_time(emitted_at_ms: f64, gap_width_ms: f64, gap_frequency_ms: f64) -> bool {
    emitted_at_ms.rem_euclid(gap_frequency_ms) < gap_width_ms
}

/// Number of segments covering `units_travelled` of trail `width` wide
#[inline]
pub fn segment_count(width: f32, units_travelled: f32) -> usize {
    let segments_per_unit = 2.0 / width;
    let count = (segments_per_unit * units_travelled).ceil();
    if count.is_finite() && count > 0.0 {
        count as usize
    } else {
        0
    }
}

/// Timing of the tick being emitted
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickClock {
    /// Simulation clock at the start of the tick (ms)
    pub elapsed_ms: f64,
    /// Tick length (s)
    pub delta_time: f32,
}

/// Emit this tick's segments for one player into `grid`
///
/// Segments are interpolated from `previous_position` along the unwrapped
/// displacement `velocity * delta_time`, so a tick that crosses the world
/// seam still lays a continuous run. Each segment's emission time is
/// interpolated across the tick. Returns the number of segments added.
pub fn emit_segments(
    grid: &mut SegmentGrid,
    settings: &Settings,
    player: Player,
    dynamics: &Dynamics,
    power_ups: &PowerUps,
    clock: TickClock,
) -> Result<usize, SpatialError> {
    let width = settings.width_of(power_ups.size);
    let speed = settings.speed_of(power_ups.speed);
    let count = segment_count(width, speed * clock.delta_time);
    if count == 0 {
        return Ok(0);
    }

    let dims = settings.dimensions;
    let start = dynamics.previous_position;
    let displacement = dynamics.velocity * clock.delta_time;
    let angle = dynamics.velocity.x.atan2(dynamics.velocity.y);
    let tick_ms = clock.delta_time as f64 * MS_PER_SECOND;

    for i in 1..=count {
        let t = i as f32 / count as f32;
        let anchor = (start + displacement * t).wrap(dims);
        let emitted_at_ms = clock.elapsed_ms + tick_ms * (i as f64 / count as f64);
        let is_gap = is_gap_time(emitted_at_ms, settings.gap_width_ms, settings.gap_frequency_ms);

        let id = grid.len() as SegmentId;
        grid.insert(Segment::new(
            id,
            player,
            anchor,
            width,
            angle,
            emitted_at_ms,
            is_gap,
        ))?;
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::player::{SizeClass, SpeedClass};

    fn moved(from: Vec2, velocity: Vec2, dt: f32, dims: Vec2) -> Dynamics {
        let mut d = Dynamics::new(from, velocity, velocity.length());
        d.position = (from + velocity * dt).wrap(dims);
        d
    }

    #[test]
    fn test_segment_count() {
        // 2 segments per unit width: width 5, 10 units -> 4
        assert_eq!(segment_count(5.0, 10.0), 4);
        assert_eq!(segment_count(5.0, 10.1), 5);
        assert_eq!(segment_count(5.0, 0.0), 0);
        assert_eq!(segment_count(5.0, f32::NAN), 0);
    }

    #[test]
    fn test_gap_window() {
        assert!(is_gap_time(0.0, 300.0, 3000.0));
        assert!(is_gap_time(299.9, 300.0, 3000.0));
        assert!(!is_gap_time(300.0, 300.0, 3000.0));
        assert!(is_gap_time(3100.0, 300.0, 3000.0));
        assert!(!is_gap_time(100.0, 0.0, 3000.0));
    }

    #[test]
    fn test_grace_period() {
        let s = Segment::new(0, Player::Red, Vec2::ZERO, 5.0, 0.0, 1000.0, false);
        assert!(s.in_grace_period(1000.0, 250.0));
        assert!(s.in_grace_period(1249.0, 250.0));
        assert!(!s.in_grace_period(1250.0, 250.0));
    }

    #[test]
    fn test_emit_interpolates_positions_and_times() {
        let settings = Settings::default();
        let dims = settings.dimensions;
        let mut grid = SegmentGrid::new(dims, settings.min_cell_size);
        let dynamics = moved(Vec2::new(100.0, 100.0), Vec2::new(100.0, 0.0), 0.1, dims);
        let clock = TickClock {
            elapsed_ms: 1000.0,
            delta_time: 0.1,
        };

        let count = emit_segments(
            &mut grid,
            &settings,
            Player::Blue,
            &dynamics,
            &PowerUps::default(),
            clock,
        )
        .unwrap();

        // 10 units at width 5 -> 4 segments, 2.5 units apart
        assert_eq!(count, 4);
        let mut segments: Vec<_> = grid.iter().copied().collect();
        segments.sort_by_key(|s| s.id);
        for (i, s) in segments.iter().enumerate() {
            let t = (i + 1) as f32 / 4.0;
            assert!(s.anchor.approx_eq(Vec2::new(100.0 + 10.0 * t, 100.0), 1e-3));
            assert!((s.emitted_at_ms - (1000.0 + 100.0 * t as f64)).abs() < 1e-3);
            assert_eq!(s.owner, Player::Blue);
            assert_eq!(s.extent, Vec2::splat(5.0));
            assert!((s.angle - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
            assert!(!s.is_gap);
        }
    }

    #[test]
    fn test_emit_marks_gap_segments() {
        let settings = Settings::default();
        let dims = settings.dimensions;
        let mut grid = SegmentGrid::new(dims, settings.min_cell_size);
        let dynamics = moved(Vec2::new(100.0, 100.0), Vec2::new(100.0, 0.0), 0.1, dims);

        // Tick spans 240ms..340ms; the gap window closes at 300ms
        emit_segments(
            &mut grid,
            &settings,
            Player::Red,
            &dynamics,
            &PowerUps::default(),
            TickClock {
                elapsed_ms: 240.0,
                delta_time: 0.1,
            },
        )
        .unwrap();

        let mut segments: Vec<_> = grid.iter().copied().collect();
        segments.sort_by_key(|s| s.id);
        let gaps: Vec<bool> = segments.iter().map(|s| s.is_gap).collect();
        assert_eq!(gaps, vec![true, true, false, false]);
    }

    #[test]
    fn test_emit_across_seam_wraps_anchors() {
        let settings = Settings::default();
        let dims = settings.dimensions;
        let mut grid = SegmentGrid::new(dims, settings.min_cell_size);
        let dynamics = moved(Vec2::new(998.0, 500.0), Vec2::new(100.0, 0.0), 0.05, dims);

        let count = emit_segments(
            &mut grid,
            &settings,
            Player::Red,
            &dynamics,
            &PowerUps::default(),
            TickClock {
                elapsed_ms: 5000.0,
                delta_time: 0.05,
            },
        )
        .unwrap();

        assert_eq!(count, 2);
        for s in grid.iter() {
            assert!(s.anchor.x >= 0.0 && s.anchor.x < dims.x);
        }
        assert!(grid.iter().any(|s| s.anchor.x < 10.0));
    }

    #[test]
    fn test_emit_uses_power_ups() {
        let settings = Settings::default();
        let dims = settings.dimensions;
        let mut grid = SegmentGrid::new(dims, settings.min_cell_size);
        let power_ups = PowerUps {
            size: SizeClass::Huge,
            speed: SpeedClass::Fast,
            invincible: false,
        };
        let dynamics = moved(Vec2::new(100.0, 100.0), Vec2::new(0.0, 150.0), 0.1, dims);

        let count = emit_segments(
            &mut grid,
            &settings,
            Player::Green,
            &dynamics,
            &power_ups,
            TickClock {
                elapsed_ms: 500.0,
                delta_time: 0.1,
            },
        )
        .unwrap();

        // 15 units at width 10 -> 3 segments
        assert_eq!(count, 3);
        assert!(grid.iter().all(|s| s.extent == Vec2::splat(10.0)));
    }

    #[test]
    fn test_emit_zero_dt_adds_nothing() {
        let settings = Settings::default();
        let mut grid = SegmentGrid::new(settings.dimensions, settings.min_cell_size);
        let dynamics = Dynamics::new(Vec2::new(10.0, 10.0), Vec2::new(1.0, 0.0), 100.0);

        let count = emit_segments(
            &mut grid,
            &settings,
            Player::Red,
            &dynamics,
            &PowerUps::default(),
            TickClock {
                elapsed_ms: 0.0,
                delta_time: 0.0,
            },
        )
        .unwrap();

        assert_eq!(count, 0);
        assert!(grid.is_empty());
    }
}
