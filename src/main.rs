use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use trail_arena::config::Settings;
use trail_arena::game::constants::clock::DEFAULT_FRAME_DT;
use trail_arena::game::performance::PerformanceMonitor;
use trail_arena::game::state::{GameState, Spawn};

/// Simulated seconds when `SIM_SECONDS` is unset
const DEFAULT_SIM_SECONDS: f32 = 30.0;

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("Trail Arena v{}", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load_or_default();
    info!(
        "Settings loaded: {}x{} world, cell size {}, grace {}ms, debug={}",
        settings.dimensions.x,
        settings.dimensions.y,
        settings.min_cell_size,
        settings.grace_ms,
        settings.debug
    );

    let sim_seconds: f32 = match std::env::var("SIM_SECONDS") {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Invalid SIM_SECONDS '{}', using {}", raw, DEFAULT_SIM_SECONDS);
            DEFAULT_SIM_SECONDS
        }),
        Err(_) => DEFAULT_SIM_SECONDS,
    };
    let max_ticks = (sim_seconds / DEFAULT_FRAME_DT).ceil().max(0.0) as u64;

    let spawns = Spawn::ring(&settings);
    let mut state = GameState::validated(settings, &spawns)?;
    let mut monitor = PerformanceMonitor::new(DEFAULT_FRAME_DT);

    while state.tick < max_ticks && state.alive_count() > 0 {
        monitor.tick_start();
        let summary = state.update(DEFAULT_FRAME_DT)?;
        monitor.tick_end(state.grid.len());

        if !summary.deaths.is_empty() {
            info!(
                "Tick {}: {} alive after losing {:?}",
                summary.tick,
                state.alive_count(),
                summary.deaths
            );
        }
    }

    let stats = state.grid.stats();
    info!(
        "Stopped after {} ticks ({:.1}s): {} alive, {} segments in {}/{} cells (max {} per cell)",
        state.tick,
        state.elapsed_ms / 1000.0,
        state.alive_count(),
        stats.total_segments,
        stats.non_empty_cells,
        stats.columns * stats.rows,
        stats.max_per_cell
    );
    info!("Performance: {}", monitor.status_message());

    for view in state.player_views() {
        info!(
            "{} ({}) {} at ({:.1}, {:.1})",
            view.player,
            view.colour,
            if view.alive { "alive" } else { "dead" },
            view.position.x,
            view.position.y
        );
    }

    Ok(())
}
