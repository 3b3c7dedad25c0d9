//! Session state and the per-tick entry point
//!
//! `GameState` owns everything the simulation mutates: the settings it was
//! created with, the trail index, and one `PlayerState` per identity. Hosts
//! drive it with `update(dt)` and feed input through the key handlers.

use smallvec::SmallVec;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, Settings};
use crate::game::constants::{clock::MS_PER_SECOND, spawn};
use crate::game::player::{
    Dynamics, Player, PlayerMap, PowerUps, SpeedClass, TurnIntent, PLAYER_COUNT,
};
use crate::game::spatial::{SegmentGrid, SpatialError};
use crate::game::systems::collision::{self, Probe};
use crate::game::systems::dynamics::{self, PlayerStep};
use crate::game::trail::Segment;
use crate::util::vec2::Vec2;

/// Errors that abort a tick
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("Trail index rejected a segment: {0}")]
    Index(#[from] SpatialError),
}

/// Per-player simulation state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerState {
    pub dynamics: Dynamics,
    pub power_ups: PowerUps,
    pub alive: bool,
    /// Whether the player was part of the starting roster
    pub in_session: bool,
}

impl PlayerState {
    fn spawned(dynamics: Dynamics) -> Self {
        Self {
            dynamics,
            power_ups: PowerUps::default(),
            alive: true,
            in_session: true,
        }
    }

    fn absent(dynamics: Dynamics) -> Self {
        Self {
            dynamics,
            power_ups: PowerUps::default(),
            alive: false,
            in_session: false,
        }
    }
}

/// Starting placement for one player
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spawn {
    pub player: Player,
    pub position: Vec2,
    pub heading: Vec2,
}

impl Spawn {
    /// All players spread evenly on a ring around the centre, facing inwards
    pub fn ring(settings: &Settings) -> [Spawn; PLAYER_COUNT] {
        let centre = settings.dimensions * 0.5;
        let half_extent = settings.dimensions.x.min(settings.dimensions.y) * 0.5;
        let radius = spawn::PLACEMENT_AWAY_FROM_EDGE * half_extent;
        let step = std::f32::consts::TAU / PLAYER_COUNT as f32;

        Player::ALL.map(|player| {
            let position = centre + Vec2::from_angle(step * player.index() as f32) * radius;
            Spawn {
                player,
                position,
                heading: centre - position,
            }
        })
    }
}

/// Result of one `update` call
#[derive(Debug, Clone, PartialEq)]
pub struct TickSummary {
    /// Number of the tick just completed, starting at 1
    pub tick: u64,
    /// Simulation clock after the tick (ms)
    pub elapsed_ms: f64,
    /// Players that died during this tick, in update order
    pub deaths: SmallVec<[Player; PLAYER_COUNT]>,
    pub segments_emitted: usize,
}

/// Read-only snapshot of one player for rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerView<'a> {
    pub player: Player,
    pub position: Vec2,
    pub direction: Vec2,
    pub width: f32,
    pub alive: bool,
    pub colour: &'a str,
}

/// Candidate segments around a live player's probe, for debug overlays
#[derive(Debug, Clone)]
pub struct DebugHighlight<'a> {
    pub player: Player,
    pub probe: Probe,
    pub segments: Vec<&'a Segment>,
}

/// Complete simulation state for one session
#[derive(Debug, Clone)]
pub struct GameState {
    pub settings: Settings,
    pub grid: SegmentGrid,
    pub players: PlayerMap<PlayerState>,
    /// Completed `update` calls
    pub tick: u64,
    /// Simulation clock (ms)
    pub elapsed_ms: f64,
}

impl GameState {
    /// Session with all six players on the spawn ring
    ///
    /// `settings` must pass `Settings::validate`; in particular
    /// `min_cell_size` must cover the neighbour reach of the widest trail or
    /// collision queries can miss segments. Use `validated` to check first.
    pub fn new(settings: Settings) -> Self {
        let spawns = Spawn::ring(&settings);
        Self::with_roster(settings, &spawns)
    }

    /// Validate `settings`, then start a session with the listed players
    pub fn validated(settings: Settings, spawns: &[Spawn]) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self::with_roster(settings, spawns))
    }

    /// Session with only the listed players
    ///
    /// Players missing from `spawns` sit on their ring position, dead and out
    /// of the session. A later spawn for the same player replaces an earlier one.
    /// Same precondition on `settings` as `new`.
    pub fn with_roster(settings: Settings, spawns: &[Spawn]) -> Self {
        let dims = settings.dimensions;
        let normal_speed = settings.speed_of(SpeedClass::Normal);
        let ring = Spawn::ring(&settings);

        let mut players = PlayerMap::from_fn(|player| {
            let placeholder = ring[player.index()];
            PlayerState::absent(Dynamics::new(placeholder.position, placeholder.heading, 0.0))
        });

        for spawn in spawns {
            if !spawn.position.is_finite() {
                warn!(player = %spawn.player, "Ignoring spawn at a non-finite position");
                continue;
            }
            let position = spawn.position.wrap(dims);
            players[spawn.player] =
                PlayerState::spawned(Dynamics::new(position, spawn.heading, normal_speed));
        }

        let grid = SegmentGrid::new(dims, settings.min_cell_size);
        let (columns, rows) = grid.size_in_cells();
        info!(
            "Session started: {}x{} world, {}x{} cells, {} players",
            dims.x,
            dims.y,
            columns,
            rows,
            players.values().filter(|p| p.in_session).count()
        );

        Self {
            settings,
            grid,
            players,
            tick: 0,
            elapsed_ms: 0.0,
        }
    }

    /// Advance the simulation by `delta_time` seconds
    ///
    /// Players are stepped one after another in `Player::ALL` order, so a
    /// later player already sees trail laid by earlier players this tick.
    /// Negative or non-finite `delta_time` is treated as zero.
    pub fn update(&mut self, delta_time: f32) -> Result<TickSummary, SimulationError> {
        let dt = if delta_time.is_finite() && delta_time >= 0.0 {
            delta_time
        } else {
            warn!("Ignoring invalid delta time {}, stepping with 0", delta_time);
            0.0
        };

        let mut deaths = SmallVec::new();
        let mut segments_emitted = 0;

        for player in Player::ALL {
            match dynamics::update(self, player, dt)? {
                PlayerStep::Moved { segments } => segments_emitted += segments,
                PlayerStep::Died => {
                    let position = self.players[player].dynamics.position;
                    info!(
                        "{} died at ({:.1}, {:.1}) after {:.0}ms",
                        player, position.x, position.y, self.elapsed_ms
                    );
                    deaths.push(player);
                }
                PlayerStep::Inactive | PlayerStep::Idle => {}
            }
        }

        self.tick += 1;
        self.elapsed_ms += dt as f64 * MS_PER_SECOND;

        if self.settings.debug {
            debug!(
                tick = self.tick,
                segments = self.grid.len(),
                emitted = segments_emitted,
                "Tick complete"
            );
        }

        Ok(TickSummary {
            tick: self.tick,
            elapsed_ms: self.elapsed_ms,
            deaths,
            segments_emitted,
        })
    }

    /// Set a player's turn intent; `None` steers straight
    pub fn set_turn_intent(&mut self, player: Player, intent: TurnIntent) {
        self.players[player].dynamics.turn_intent = intent;
    }

    /// Apply a key press; returns whether the key was bound and handled
    ///
    /// Auto-repeat presses are ignored.
    pub fn handle_key_down(&mut self, key: &str, repeat: bool) -> bool {
        if repeat {
            return false;
        }
        match self.settings.binding(key) {
            Some(binding) => {
                self.set_turn_intent(binding.player, Some(binding.direction));
                true
            }
            None => false,
        }
    }

    /// Apply a key release; returns whether the key was bound and handled
    pub fn handle_key_up(&mut self, key: &str) -> bool {
        match self.settings.binding(key) {
            Some(binding) => {
                self.set_turn_intent(binding.player, None);
                true
            }
            None => false,
        }
    }

    pub fn is_alive(&self, player: Player) -> bool {
        self.players[player].alive
    }

    pub fn alive_count(&self) -> usize {
        self.players.values().filter(|p| p.alive).count()
    }

    /// Players that started in this session
    pub fn roster(&self) -> impl Iterator<Item = Player> + '_ {
        self.players
            .iter()
            .filter(|(_, state)| state.in_session)
            .map(|(player, _)| player)
    }

    /// Collision probe at a player's current position
    pub fn probe(&self, player: Player) -> Probe {
        let state = &self.players[player];
        Probe::for_player(&self.settings, player, &state.dynamics, &state.power_ups)
    }

    /// Whether a player's current position touches no collidable trail
    pub fn is_valid_position(&self, player: Player) -> bool {
        collision::is_valid_position(&self.grid, &self.settings, self.probe(player), self.elapsed_ms)
    }

    /// Visit every segment in the index
    pub fn for_each_segment<F>(&self, callback: F)
    where
        F: FnMut(&Segment),
    {
        self.grid.for_each(callback);
    }

    /// Rendering snapshot of every player in the session
    pub fn player_views(&self) -> impl Iterator<Item = PlayerView<'_>> + '_ {
        self.players
            .iter()
            .filter(|(_, state)| state.in_session)
            .map(move |(player, state)| PlayerView {
                player,
                position: state.dynamics.position,
                direction: state.dynamics.velocity_direction,
                width: self.settings.width_of(state.power_ups.size),
                alive: state.alive,
                colour: self.settings.colour_map[player].as_str(),
            })
    }

    /// Nearby collidable segments per live player; empty unless `debug` is set
    pub fn debug_highlights(&self) -> Vec<DebugHighlight<'_>> {
        if !self.settings.debug {
            return Vec::new();
        }

        self.players
            .iter()
            .filter(|(_, state)| state.alive)
            .map(|(player, _)| {
                let probe = self.probe(player);
                let segments =
                    collision::candidate_segments(&self.grid, &self.settings, probe, self.elapsed_ms)
                        .collect();
                DebugHighlight {
                    player,
                    probe,
                    segments,
                }
            })
            .collect()
    }
}
