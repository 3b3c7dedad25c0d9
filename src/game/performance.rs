//! Tick timing against a frame budget
//!
//! Hosts wrap each `GameState::update` in `tick_start`/`tick_end`. The trail
//! index only ever grows during a session, so the monitor also records the
//! segment count to relate slowdowns to index size.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Samples kept in the rolling window (~2s at 60Hz)
const WINDOW: usize = 120;

/// Samples required before the status moves off `Nominal`
const MIN_SAMPLES: usize = 10;

/// Budget usage level of recent ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PerformanceStatus {
    /// Under 30% of the frame budget
    Nominal,
    /// 30% to 70%
    Busy,
    /// 70% to 100%, frames are at risk
    Strained,
    /// Average tick exceeds the frame budget
    OverBudget,
}

impl PerformanceStatus {
    fn from_usage(ratio: f32) -> Self {
        if ratio < 0.3 {
            PerformanceStatus::Nominal
        } else if ratio < 0.7 {
            PerformanceStatus::Busy
        } else if ratio < 1.0 {
            PerformanceStatus::Strained
        } else {
            PerformanceStatus::OverBudget
        }
    }

    pub fn needs_attention(&self) -> bool {
        *self >= PerformanceStatus::Strained
    }
}

/// Rolling tick-duration monitor
pub struct PerformanceMonitor {
    samples: VecDeque<Duration>,
    frame_budget: Duration,
    status: PerformanceStatus,
    tick_start: Option<Instant>,
    last_segment_count: usize,
    worst_tick: Duration,
}

impl PerformanceMonitor {
    /// Monitor against the budget of one frame of `frame_dt` seconds
    pub fn new(frame_dt: f32) -> Self {
        let frame_budget = if frame_dt.is_finite() && frame_dt > 0.0 {
            Duration::from_secs_f32(frame_dt)
        } else {
            Duration::from_secs_f32(crate::game::constants::clock::DEFAULT_FRAME_DT)
        };

        Self {
            samples: VecDeque::with_capacity(WINDOW),
            frame_budget,
            status: PerformanceStatus::Nominal,
            tick_start: None,
            last_segment_count: 0,
            worst_tick: Duration::ZERO,
        }
    }

    pub fn tick_start(&mut self) {
        self.tick_start = Some(Instant::now());
    }

    /// Close the tick opened by `tick_start`; ignored if none is open
    pub fn tick_end(&mut self, segment_count: usize) {
        if let Some(start) = self.tick_start.take() {
            self.record(start.elapsed(), segment_count);
        }
    }

    /// Record one tick's duration
    pub fn record(&mut self, duration: Duration, segment_count: usize) {
        self.samples.push_back(duration);
        while self.samples.len() > WINDOW {
            self.samples.pop_front();
        }
        self.worst_tick = self.worst_tick.max(duration);
        self.last_segment_count = segment_count;

        if self.samples.len() >= MIN_SAMPLES {
            let previous = self.status;
            self.status = PerformanceStatus::from_usage(self.budget_usage());
            if self.status != previous && self.status.needs_attention() {
                tracing::warn!("Tick performance degraded: {}", self.status_message());
            }
        }
    }

    pub fn average_tick_duration(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }
        let sum: Duration = self.samples.iter().sum();
        sum / self.samples.len() as u32
    }

    pub fn p95_tick_duration(&self) -> Duration {
        let mut sorted: Vec<_> = self.samples.iter().copied().collect();
        sorted.sort_unstable();
        let idx = (sorted.len() as f32 * 0.95) as usize;
        sorted
            .get(idx.min(sorted.len().saturating_sub(1)))
            .copied()
            .unwrap_or(Duration::ZERO)
    }

    /// Slowest tick since the monitor was created
    pub fn worst_tick_duration(&self) -> Duration {
        self.worst_tick
    }

    pub fn status(&self) -> PerformanceStatus {
        self.status
    }

    /// Average tick as a fraction of the frame budget
    pub fn budget_usage(&self) -> f32 {
        self.average_tick_duration().as_secs_f32() / self.frame_budget.as_secs_f32()
    }

    pub fn last_segment_count(&self) -> usize {
        self.last_segment_count
    }

    pub fn status_message(&self) -> String {
        format!(
            "{:?} - {:.1}% budget (p95 {:?}), {} segments",
            self.status,
            self.budget_usage() * 100.0,
            self.p95_tick_duration(),
            self.last_segment_count
        )
    }
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new(crate::game::constants::clock::DEFAULT_FRAME_DT)
    }
}
