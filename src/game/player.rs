//! Player identities and per-player state
//!
//! `Player` is a closed set; every per-player table is a `PlayerMap`, a
//! fixed-size array indexed by the enum.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::ops::{Index, IndexMut};

use crate::util::vec2::Vec2;

/// Number of player identities in a session
pub const PLAYER_COUNT: usize = 6;

/// One of the fixed player identities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Player {
    Red,
    Blue,
    Green,
    Yellow,
    Magenta,
    Cyan,
}

impl Player {
    /// All identities in update order
    pub const ALL: [Player; PLAYER_COUNT] = [
        Player::Red,
        Player::Blue,
        Player::Green,
        Player::Yellow,
        Player::Magenta,
        Player::Cyan,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Player::Red => "red",
            Player::Blue => "blue",
            Player::Green => "green",
            Player::Yellow => "yellow",
            Player::Magenta => "magenta",
            Player::Cyan => "cyan",
        }
    }
}

impl std::fmt::Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed-size table with one entry per `Player`
///
/// Serializes as a map keyed by lowercase player name.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerMap<T>([T; PLAYER_COUNT]);

impl<T> PlayerMap<T> {
    pub fn from_fn(mut f: impl FnMut(Player) -> T) -> Self {
        Self(Player::ALL.map(&mut f))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Player, &T)> {
        Player::ALL.into_iter().zip(self.0.iter())
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }

    /// Replace the entries for the listed players, keeping the rest
    pub fn overlay(&mut self, entries: impl IntoIterator<Item = (Player, T)>) {
        for (player, value) in entries {
            self[player] = value;
        }
    }
}

impl<T: Serialize> Serialize for PlayerMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(PLAYER_COUNT))?;
        for (player, value) in self.iter() {
            map.serialize_entry(&player, value)?;
        }
        map.end()
    }
}

impl<T: Clone> PlayerMap<T> {
    pub fn filled(value: T) -> Self {
        Self::from_fn(|_| value.clone())
    }
}

impl<T: Default> Default for PlayerMap<T> {
    fn default() -> Self {
        Self::from_fn(|_| T::default())
    }
}

impl<T> Index<Player> for PlayerMap<T> {
    type Output = T;

    #[inline]
    fn index(&self, player: Player) -> &T {
        &self.0[player.index()]
    }
}

impl<T> IndexMut<Player> for PlayerMap<T> {
    #[inline]
    fn index_mut(&mut self, player: Player) -> &mut T {
        &mut self.0[player.index()]
    }
}

/// Steering direction bound to a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnDirection {
    Left,
    Right,
}

impl TurnDirection {
    /// Rotation applied to the heading to get the steering acceleration
    pub fn rotation(self) -> f32 {
        match self {
            TurnDirection::Left => std::f32::consts::FRAC_PI_2,
            TurnDirection::Right => -std::f32::consts::FRAC_PI_2,
        }
    }
}

/// Current turn request for a player; `None` means straight ahead
pub type TurnIntent = Option<TurnDirection>;

/// Trail/marker width class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeClass {
    #[default]
    Normal,
    Huge,
    Tiny,
}

/// Velocity magnitude class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedClass {
    #[default]
    Normal,
    Fast,
    Slow,
}

/// Modifiers owned by game-mode logic outside the simulation core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PowerUps {
    pub size: SizeClass,
    pub speed: SpeedClass,
    /// Skip the death transition on collision
    pub invincible: bool,
}

/// Kinematic state of one player
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dynamics {
    pub position: Vec2,
    /// Position at the start of the current tick
    pub previous_position: Vec2,
    /// Magnitude pinned to the current speed class while alive
    pub velocity: Vec2,
    /// Unit heading, kept even when `velocity` is zeroed on death
    pub velocity_direction: Vec2,
    pub acceleration: Vec2,
    pub turn_intent: TurnIntent,
}

impl Dynamics {
    /// Stationary-start dynamics at `position` heading along `direction`
    pub fn new(position: Vec2, direction: Vec2, speed: f32) -> Self {
        let velocity_direction = direction.normalize_or(Vec2::new(1.0, 0.0));
        Self {
            position,
            previous_position: position,
            velocity: velocity_direction * speed,
            velocity_direction,
            acceleration: Vec2::ZERO,
            turn_intent: None,
        }
    }
}
