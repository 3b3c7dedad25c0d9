/// Reference configuration values used by `Settings::default()`
pub mod defaults {
    /// World width in units
    pub const WORLD_WIDTH: f32 = 1000.0;
    /// World height in units
    pub const WORLD_HEIGHT: f32 = 1000.0;

    /// Velocity magnitude per speed class (units/s)
    pub const SPEED_NORMAL: f32 = 100.0;
    pub const SPEED_FAST: f32 = 150.0;
    pub const SPEED_SLOW: f32 = 60.0;

    /// Trail width per size class (units)
    pub const WIDTH_NORMAL: f32 = 5.0;
    pub const WIDTH_HUGE: f32 = 10.0;
    pub const WIDTH_TINY: f32 = 3.0;

    /// Steering acceleration magnitude (units/s²)
    pub const TURNING_SPEED: f32 = 500.0;

    /// Length of each gap window (ms of emission time)
    pub const GAP_WIDTH_MS: f64 = 300.0;
    /// Period of the gap duty cycle (ms of emission time)
    pub const GAP_FREQUENCY_MS: f64 = 3000.0;

    /// Window after emission during which a segment ignores its own emitter
    pub const GRACE_MS: f64 = 250.0;

    /// Lower bound on grid cell edge length (units)
    pub const MIN_CELL_SIZE: f32 = 20.0;
}

/// Spawn placement
pub mod spawn {
    /// Spawn ring radius as a fraction of half the shorter world side
    pub const PLACEMENT_AWAY_FROM_EDGE: f32 = 0.9;
}

/// Spatial index sizing
pub mod grid {
    /// Farthest a colliding segment anchor can sit from the collision test
    /// point, in multiples of the widest trail: the test circle radius (1/2)
    /// plus the half-diagonal of a square segment (√2/2)
    pub const NEIGHBOUR_REACH_FACTOR: f32 = (1.0 + std::f32::consts::SQRT_2) / 2.0;

    /// Initial capacity for each cell's segment list
    pub const CELL_INITIAL_CAPACITY: usize = 8;
}

/// Simulation clock
pub mod clock {
    /// Milliseconds per second of `delta_time`
    pub const MS_PER_SECOND: f64 = 1000.0;
    /// Default host frame step (60 Hz)
    pub const DEFAULT_FRAME_DT: f32 = 1.0 / 60.0;
}
