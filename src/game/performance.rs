//! Tick-time monitoring
//!
//! Tracks how much of the fixed-step budget each battle tick uses. The
//! runner logs the status periodically and warns when ticks overrun.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Performance status levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStatus {
    /// Comfortably inside the budget
    Nominal,
    /// Most of the budget is spent, frames are at risk
    Strained,
    /// Average tick exceeds the budget, the clock is skipping frames
    Overrun,
}

/// Rolling window of tick durations measured against the tick budget
pub struct TickMonitor {
    tick_durations: VecDeque<Duration>,
    max_samples: usize,
    /// Target tick duration (budget)
    target_tick_duration: Duration,
    /// Fraction of budget above which the status becomes `Strained`
    strained_threshold: f32,
    status: TickStatus,
    tick_start: Option<Instant>,
    /// Agent count at last measurement
    last_agent_count: usize,
}

impl TickMonitor {
    pub fn new(tick_rate: u32) -> Self {
        let target_tick_duration = Duration::from_secs_f32(1.0 / tick_rate.max(1) as f32);

        Self {
            tick_durations: VecDeque::with_capacity(120), // ~2 seconds at 60Hz
            max_samples: 120,
            target_tick_duration,
            strained_threshold: 0.7,
            status: TickStatus::Nominal,
            tick_start: None,
            last_agent_count: 0,
        }
    }

    /// Start timing a tick
    pub fn tick_start(&mut self) {
        self.tick_start = Some(Instant::now());
    }

    /// End timing a tick and record the duration
    pub fn tick_end(&mut self, agent_count: usize) {
        if let Some(start) = self.tick_start.take() {
            self.record_tick(start.elapsed());
            self.last_agent_count = agent_count;
        }
    }

    fn record_tick(&mut self, duration: Duration) {
        self.tick_durations.push_back(duration);
        while self.tick_durations.len() > self.max_samples {
            self.tick_durations.pop_front();
        }
        self.update_status();
    }

    fn update_status(&mut self) {
        if self.tick_durations.len() < 10 {
            // Not enough data yet
            return;
        }

        let ratio = self.budget_usage_percent() / 100.0;
        self.status = if ratio < self.strained_threshold {
            TickStatus::Nominal
        } else if ratio < 1.0 {
            TickStatus::Strained
        } else {
            TickStatus::Overrun
        };
    }

    pub fn average_tick_duration(&self) -> Duration {
        if self.tick_durations.is_empty() {
            return Duration::ZERO;
        }
        let sum: Duration = self.tick_durations.iter().sum();
        sum / self.tick_durations.len() as u32
    }

    /// Get the 95th percentile tick duration
    pub fn p95_tick_duration(&self) -> Duration {
        if self.tick_durations.is_empty() {
            return Duration::ZERO;
        }
        let mut sorted: Vec<_> = self.tick_durations.iter().copied().collect();
        sorted.sort();
        let idx = (sorted.len() as f32 * 0.95) as usize;
        sorted.get(idx.min(sorted.len() - 1)).copied().unwrap_or(Duration::ZERO)
    }

    pub fn status(&self) -> TickStatus {
        self.status
    }

    /// Budget usage as percentage (0-100+)
    pub fn budget_usage_percent(&self) -> f32 {
        let avg = self.average_tick_duration();
        (avg.as_secs_f32() / self.target_tick_duration.as_secs_f32()) * 100.0
    }

    /// Human-readable status line for periodic logging
    pub fn status_message(&self) -> String {
        format!(
            "{:?} - {:.1}% budget, p95 {:?}, {} agents",
            self.status,
            self.budget_usage_percent(),
            self.p95_tick_duration(),
            self.last_agent_count
        )
    }
}

impl Default for TickMonitor {
    fn default() -> Self {
        Self::new(60)
    }
}
