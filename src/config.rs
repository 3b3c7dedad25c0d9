use std::path::Path;

use hashbrown::HashMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::game::constants::{defaults, grid::NEIGHBOUR_REACH_FACTOR};
use crate::game::player::{Player, PlayerMap, SizeClass, SpeedClass, TurnDirection};
use crate::util::vec2::Vec2;

/// Errors raised while loading or validating settings
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read settings file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("World dimensions must be positive and finite, got {0}x{1}")]
    Dimensions(f32, f32),
    #[error("Speed for {0:?} must be positive and finite, got {1}")]
    Speed(SpeedClass, f32),
    #[error("Segment width for {0:?} must be positive and finite, got {1}")]
    Width(SizeClass, f32),
    #[error("Turning speed must be finite and non-negative, got {0}")]
    TurningSpeed(f32),
    #[error("Gap frequency must be positive, got {0}ms")]
    GapFrequency(f64),
    #[error("Gap width must be in [0, {frequency}), got {width}ms")]
    GapWidth { width: f64, frequency: f64 },
    #[error("Grace period must be non-negative, got {0}ms")]
    Grace(f64),
    #[error("Cell size {cell_size} is below the neighbour reach {required} of the widest trail")]
    CellSize { cell_size: f32, required: f32 },
}

/// Velocity magnitude per speed class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedTable {
    pub normal: f32,
    pub fast: f32,
    pub slow: f32,
}

impl SpeedTable {
    #[inline]
    pub fn get(&self, class: SpeedClass) -> f32 {
        match class {
            SpeedClass::Normal => self.normal,
            SpeedClass::Fast => self.fast,
            SpeedClass::Slow => self.slow,
        }
    }
}

impl Default for SpeedTable {
    fn default() -> Self {
        Self {
            normal: defaults::SPEED_NORMAL,
            fast: defaults::SPEED_FAST,
            slow: defaults::SPEED_SLOW,
        }
    }
}

/// Trail width per size class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WidthTable {
    pub normal: f32,
    pub huge: f32,
    pub tiny: f32,
}

impl WidthTable {
    #[inline]
    pub fn get(&self, class: SizeClass) -> f32 {
        match class {
            SizeClass::Normal => self.normal,
            SizeClass::Huge => self.huge,
            SizeClass::Tiny => self.tiny,
        }
    }

    /// Widest trail any player can lay
    pub fn max(&self) -> f32 {
        self.normal.max(self.huge).max(self.tiny)
    }
}

impl Default for WidthTable {
    fn default() -> Self {
        Self {
            normal: defaults::WIDTH_NORMAL,
            huge: defaults::WIDTH_HUGE,
            tiny: defaults::WIDTH_TINY,
        }
    }
}

/// A key bound to a player's steering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBinding {
    pub player: Player,
    pub direction: TurnDirection,
}

/// Static session configuration, immutable once the session starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// World size; both axes wrap
    pub dimensions: Vec2,
    pub speed: SpeedTable,
    pub segment_width: WidthTable,
    /// Magnitude of the steering acceleration
    pub turning_speed: f32,
    pub gap_width_ms: f64,
    pub gap_frequency_ms: f64,
    pub grace_ms: f64,
    /// Grid cells are at least this wide on both axes
    pub min_cell_size: f32,
    /// Entries given in a settings file override the defaults per player
    #[serde(deserialize_with = "colours_over_defaults")]
    pub colour_map: PlayerMap<String>,
    /// Key name to steering binding
    pub keys: HashMap<String, KeyBinding>,
    /// Enables diagnostic output; never changes simulation results
    pub debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dimensions: Vec2::new(defaults::WORLD_WIDTH, defaults::WORLD_HEIGHT),
            speed: SpeedTable::default(),
            segment_width: WidthTable::default(),
            turning_speed: defaults::TURNING_SPEED,
            gap_width_ms: defaults::GAP_WIDTH_MS,
            gap_frequency_ms: defaults::GAP_FREQUENCY_MS,
            grace_ms: defaults::GRACE_MS,
            min_cell_size: defaults::MIN_CELL_SIZE,
            colour_map: default_colour_map(),
            keys: default_keys(),
            debug: false,
        }
    }
}

fn default_colour_map() -> PlayerMap<String> {
    PlayerMap::from_fn(|p| default_colour(p).to_string())
}

fn colours_over_defaults<'de, D>(deserializer: D) -> Result<PlayerMap<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = HashMap::<Player, String>::deserialize(deserializer)?;
    let mut colours = default_colour_map();
    colours.overlay(entries);
    Ok(colours)
}

fn default_colour(player: Player) -> &'static str {
    match player {
        Player::Red => "#ff0000",
        Player::Blue => "#0000ff",
        Player::Green => "#00ff00",
        Player::Yellow => "#ffff00",
        Player::Magenta => "#ff00ff",
        Player::Cyan => "#00ffff",
    }
}

fn default_keys() -> HashMap<String, KeyBinding> {
    use TurnDirection::{Left, Right};

    let bindings = [
        ("a", Player::Red, Left),
        ("d", Player::Red, Right),
        ("j", Player::Blue, Left),
        ("k", Player::Blue, Right),
        ("o", Player::Green, Left),
        ("p", Player::Green, Right),
        ("z", Player::Yellow, Left),
        ("x", Player::Yellow, Right),
        ("t", Player::Magenta, Left),
        ("y", Player::Magenta, Right),
        ("v", Player::Cyan, Left),
        ("b", Player::Cyan, Right),
    ];

    bindings
        .into_iter()
        .map(|(key, player, direction)| (key.to_string(), KeyBinding { player, direction }))
        .collect()
}

impl Settings {
    /// Parse settings from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read settings from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Load settings from `SETTINGS_PATH` and environment overrides, or use defaults
    pub fn load_or_default() -> Self {
        let mut settings = match std::env::var("SETTINGS_PATH") {
            Ok(path) => match Self::from_file(&path) {
                Ok(loaded) => loaded,
                Err(e) => {
                    tracing::warn!("{}, using defaults", e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        };

        if let Ok(raw) = std::env::var("DEBUG") {
            match raw.as_str() {
                "1" | "true" => settings.debug = true,
                "0" | "false" => settings.debug = false,
                _ => tracing::warn!("Invalid DEBUG '{}', keeping {}", raw, settings.debug),
            }
        }

        if let Ok(grace) = std::env::var("GRACE_MS") {
            if let Ok(parsed) = grace.parse::<f64>() {
                if parsed >= 0.0 {
                    settings.grace_ms = parsed;
                } else {
                    tracing::warn!("GRACE_MS must be >= 0, using {}", settings.grace_ms);
                }
            } else {
                tracing::warn!("Invalid GRACE_MS '{}', using {}", grace, settings.grace_ms);
            }
        }

        if let Ok(cell) = std::env::var("MIN_CELL_SIZE") {
            if let Ok(parsed) = cell.parse::<f32>() {
                if parsed > 0.0 {
                    settings.min_cell_size = parsed;
                } else {
                    tracing::warn!("MIN_CELL_SIZE must be > 0, using {}", settings.min_cell_size);
                }
            } else {
                tracing::warn!("Invalid MIN_CELL_SIZE '{}', using {}", cell, settings.min_cell_size);
            }
        }

        if let Ok(turning) = std::env::var("TURNING_SPEED") {
            if let Ok(parsed) = turning.parse::<f32>() {
                settings.turning_speed = parsed;
            } else {
                tracing::warn!("Invalid TURNING_SPEED '{}', using {}", turning, settings.turning_speed);
            }
        }

        settings
    }

    /// Check the operating invariants the simulation relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        let Vec2 { x: w, y: h } = self.dimensions;
        if !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0) {
            return Err(ConfigError::Dimensions(w, h));
        }

        for class in [SpeedClass::Normal, SpeedClass::Fast, SpeedClass::Slow] {
            let speed = self.speed.get(class);
            if !(speed.is_finite() && speed > 0.0) {
                return Err(ConfigError::Speed(class, speed));
            }
        }

        for class in [SizeClass::Normal, SizeClass::Huge, SizeClass::Tiny] {
            let width = self.segment_width.get(class);
            if !(width.is_finite() && width > 0.0) {
                return Err(ConfigError::Width(class, width));
            }
        }

        if !(self.turning_speed.is_finite() && self.turning_speed >= 0.0) {
            return Err(ConfigError::TurningSpeed(self.turning_speed));
        }

        if !(self.gap_frequency_ms.is_finite() && self.gap_frequency_ms > 0.0) {
            return Err(ConfigError::GapFrequency(self.gap_frequency_ms));
        }
        if !(self.gap_width_ms >= 0.0 && self.gap_width_ms < self.gap_frequency_ms) {
            return Err(ConfigError::GapWidth {
                width: self.gap_width_ms,
                frequency: self.gap_frequency_ms,
            });
        }

        if !(self.grace_ms.is_finite() && self.grace_ms >= 0.0) {
            return Err(ConfigError::Grace(self.grace_ms));
        }

        let required = self.neighbour_reach();
        if !(self.min_cell_size >= required) {
            return Err(ConfigError::CellSize {
                cell_size: self.min_cell_size,
                required,
            });
        }

        Ok(())
    }

    /// Largest anchor-to-test-point distance at which a segment can still collide
    pub fn neighbour_reach(&self) -> f32 {
        self.segment_width.max() * NEIGHBOUR_REACH_FACTOR
    }

    #[inline]
    pub fn speed_of(&self, class: SpeedClass) -> f32 {
        self.speed.get(class)
    }

    #[inline]
    pub fn width_of(&self, class: SizeClass) -> f32 {
        self.segment_width.get(class)
    }

    /// Resolve a key name to its steering binding
    pub fn binding(&self, key: &str) -> Option<KeyBinding> {
        self.keys.get(key).copied()
    }
}
