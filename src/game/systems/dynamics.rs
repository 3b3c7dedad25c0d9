use crate::game::player::{Dynamics, Player};
use crate::game::spatial::SpatialError;
use crate::game::state::GameState;
use crate::game::systems::collision::{self, Probe};
use crate::game::trail::{self, TickClock};
use crate::util::vec2::Vec2;

/// What one player's update did this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerStep {
    /// Dead or not in the session
    Inactive,
    /// Zero-length tick: steering refreshed, nothing moved
    Idle,
    /// Moved to an open position and laid `segments` of trail
    Moved { segments: usize },
    /// Moved into trail and died
    Died,
}

/// Steering acceleration for the current turn intent
pub fn steer(dynamics: &mut Dynamics, turning_speed: f32) {
    dynamics.acceleration = match dynamics.turn_intent {
        Some(direction) => {
            let heading = dynamics.velocity.normalize_or(dynamics.velocity_direction);
            heading.rotate(direction.rotation()) * turning_speed
        }
        None => Vec2::ZERO,
    };
}

/// Advance velocity and position by `dt`, pinning speed and wrapping position
///
/// When velocity and steering cancel exactly, the previous heading is kept.
pub fn integrate(dynamics: &mut Dynamics, speed: f32, dt: f32, dimensions: Vec2) {
    let steered = dynamics.velocity + dynamics.acceleration * dt;
    dynamics.velocity_direction = steered.normalize_or(dynamics.velocity_direction);
    dynamics.velocity = dynamics.velocity_direction * speed;
    dynamics.previous_position = dynamics.position;
    dynamics.position = (dynamics.position + dynamics.velocity * dt).wrap(dimensions);
}

/// Stop a player in place; the heading is kept for rendering
pub fn halt(dynamics: &mut Dynamics) {
    dynamics.velocity = Vec2::ZERO;
    dynamics.acceleration = Vec2::ZERO;
}

/// Run one player's tick: steer, integrate, validate, then emit trail
///
/// `dt` must already be guarded; non-positive values only refresh steering.
pub fn update(state: &mut GameState, player: Player, dt: f32) -> Result<PlayerStep, SpatialError> {
    let GameState {
        settings,
        grid,
        players,
        elapsed_ms,
        ..
    } = state;
    let entry = &mut players[player];

    if !entry.alive {
        return Ok(PlayerStep::Inactive);
    }

    steer(&mut entry.dynamics, settings.turning_speed);

    if dt <= 0.0 {
        return Ok(PlayerStep::Idle);
    }

    let speed = settings.speed_of(entry.power_ups.speed);
    integrate(&mut entry.dynamics, speed, dt, settings.dimensions);

    let probe = Probe::for_player(settings, player, &entry.dynamics, &entry.power_ups);
    if !collision::is_valid_position(grid, settings, probe, *elapsed_ms) {
        if entry.power_ups.invincible {
            tracing::debug!(player = %player, "Invincible player passed through trail");
        } else {
            halt(&mut entry.dynamics);
            entry.alive = false;
            return Ok(PlayerStep::Died);
        }
    }

    let segments = trail::emit_segments(
        grid,
        settings,
        player,
        &entry.dynamics,
        &entry.power_ups,
        TickClock {
            elapsed_ms: *elapsed_ms,
            delta_time: dt,
        },
    )?;

    Ok(PlayerStep::Moved { segments })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::game::player::{SpeedClass, TurnDirection};
    use crate::game::state::Spawn;
    use crate::game::trail::Segment;

    const DT: f32 = 1.0 / 60.0;

    fn solo(position: Vec2, heading: Vec2) -> GameState {
        GameState::with_roster(
            Settings::default(),
            &[Spawn {
                player: Player::Red,
                position,
                heading,
            }],
        )
    }

    #[test]
    fn test_steer_straight_has_no_acceleration() {
        let mut d = Dynamics::new(Vec2::new(10.0, 10.0), Vec2::new(1.0, 0.0), 100.0);
        d.acceleration = Vec2::new(5.0, 5.0);
        steer(&mut d, 500.0);
        assert_eq!(d.acceleration, Vec2::ZERO);
    }

    #[test]
    fn test_steer_is_perpendicular() {
        let mut d = Dynamics::new(Vec2::new(10.0, 10.0), Vec2::new(1.0, 0.0), 100.0);
        d.turn_intent = Some(TurnDirection::Left);
        steer(&mut d, 500.0);
        assert!(d.acceleration.approx_eq(Vec2::new(0.0, 500.0), 1e-3));
        assert!(d.acceleration.dot(d.velocity).abs() < 1e-2);

        d.turn_intent = Some(TurnDirection::Right);
        steer(&mut d, 500.0);
        assert!(d.acceleration.approx_eq(Vec2::new(0.0, -500.0), 1e-3));
    }

    #[test]
    fn test_integrate_pins_speed() {
        let mut d = Dynamics::new(Vec2::new(500.0, 500.0), Vec2::new(1.0, 0.0), 100.0);
        d.turn_intent = Some(TurnDirection::Left);
        for _ in 0..500 {
            steer(&mut d, 500.0);
            integrate(&mut d, 100.0, DT, Vec2::splat(1000.0));
            assert!((d.velocity.length() - 100.0).abs() < 1e-3);
            assert!((d.velocity_direction.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_integrate_wraps() {
        let mut d = Dynamics::new(Vec2::new(999.5, 0.2), Vec2::new(1.0, -1.0), 100.0);
        integrate(&mut d, 100.0, DT, Vec2::splat(1000.0));
        assert!(d.position.x >= 0.0 && d.position.x < 5.0);
        assert!(d.position.y > 995.0 && d.position.y < 1000.0);
        assert_eq!(d.previous_position, Vec2::new(999.5, 0.2));
    }

    #[test]
    fn test_integrate_zero_vector_keeps_heading() {
        let mut d = Dynamics::new(Vec2::new(100.0, 100.0), Vec2::new(0.0, 1.0), 100.0);
        d.velocity = Vec2::ZERO;
        d.acceleration = Vec2::ZERO;
        integrate(&mut d, 100.0, DT, Vec2::splat(1000.0));
        assert!(d.velocity_direction.approx_eq(Vec2::new(0.0, 1.0), 1e-4));
        assert!((d.velocity.length() - 100.0).abs() < 1e-3);
        assert!(d.position.is_finite());
    }

    #[test]
    fn test_update_moves_and_emits() {
        let mut state = solo(Vec2::new(100.0, 100.0), Vec2::new(1.0, 0.0));
        let step = update(&mut state, Player::Red, DT).unwrap();

        match step {
            PlayerStep::Moved { segments } => {
                assert!(segments > 0);
                assert_eq!(segments, state.grid.len());
            }
            other => panic!("expected a move, got {:?}", other),
        }
        let d = state.players[Player::Red].dynamics;
        assert!(d.position.approx_eq(Vec2::new(100.0 + 100.0 * DT, 100.0), 1e-3));
    }

    #[test]
    fn test_update_zero_dt_only_steers() {
        let mut state = solo(Vec2::new(100.0, 100.0), Vec2::new(1.0, 0.0));
        state.set_turn_intent(Player::Red, Some(TurnDirection::Left));

        let step = update(&mut state, Player::Red, 0.0).unwrap();

        assert_eq!(step, PlayerStep::Idle);
        let d = state.players[Player::Red].dynamics;
        assert_eq!(d.position, Vec2::new(100.0, 100.0));
        assert!(d.acceleration.length() > 0.0);
        assert!(state.grid.is_empty());
    }

    #[test]
    fn test_update_dead_is_noop() {
        let mut state = solo(Vec2::new(100.0, 100.0), Vec2::new(1.0, 0.0));
        state.players[Player::Red].alive = false;
        let before = state.players[Player::Red].dynamics;

        assert_eq!(update(&mut state, Player::Red, DT).unwrap(), PlayerStep::Inactive);
        assert_eq!(state.players[Player::Red].dynamics, before);
    }

    #[test]
    fn test_update_kills_on_foreign_trail() {
        let mut state = solo(Vec2::new(100.0, 100.0), Vec2::new(1.0, 0.0));
        state
            .grid
            .insert(Segment::new(0, Player::Blue, Vec2::new(105.0, 100.0), 5.0, 0.0, 0.0, false))
            .unwrap();

        assert_eq!(update(&mut state, Player::Red, DT).unwrap(), PlayerStep::Died);
        let entry = &state.players[Player::Red];
        assert!(!entry.alive);
        assert_eq!(entry.dynamics.velocity, Vec2::ZERO);
        assert_eq!(entry.dynamics.acceleration, Vec2::ZERO);
        // No trail is emitted on the fatal tick
        assert_eq!(state.grid.len(), 1);
    }

    #[test]
    fn test_invincible_survives_and_emits() {
        let mut state = solo(Vec2::new(100.0, 100.0), Vec2::new(1.0, 0.0));
        state.players[Player::Red].power_ups.invincible = true;
        state
            .grid
            .insert(Segment::new(0, Player::Blue, Vec2::new(105.0, 100.0), 5.0, 0.0, 0.0, false))
            .unwrap();

        let step = update(&mut state, Player::Red, DT).unwrap();
        assert!(matches!(step, PlayerStep::Moved { .. }));
        assert!(state.players[Player::Red].alive);
        assert!(state.grid.len() > 1);
    }

    #[test]
    fn test_speed_class_changes_magnitude() {
        let mut state = solo(Vec2::new(100.0, 100.0), Vec2::new(1.0, 0.0));
        state.players[Player::Red].power_ups.speed = SpeedClass::Fast;

        update(&mut state, Player::Red, DT).unwrap();
        let speed = state.players[Player::Red].dynamics.velocity.length();
        assert!((speed - state.settings.speed.fast).abs() < 1e-3);
    }
}
