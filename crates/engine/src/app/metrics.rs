use std::time::Duration;

use tracing::warn;

pub const SLOW_TICK_ENV_VAR: &str = "PIPEWORLD_SLOW_TICK_MS";
const DEFAULT_SLOW_TICK_MS: f32 = 8.0;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub tick_count: u64,
    pub slow_tick_count: u64,
    pub average_tick_ms: f32,
    pub max_tick_ms: f32,
}

#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    slow_tick_threshold_ms: f32,
    ticks: u64,
    slow_ticks: u64,
    tick_time_sum_ms: f32,
    max_tick_ms: f32,
}

impl MetricsAccumulator {
    pub(crate) fn new(slow_tick_threshold_ms: f32) -> Self {
        Self {
            slow_tick_threshold_ms,
            ticks: 0,
            slow_ticks: 0,
            tick_time_sum_ms: 0.0,
            max_tick_ms: 0.0,
        }
    }

    pub(crate) fn with_threshold_from_env() -> Self {
        Self::new(slow_tick_threshold_ms_from_env())
    }

    pub(crate) fn record_tick(&mut self, tick_duration: Duration) {
        let tick_ms = tick_duration.as_secs_f32() * 1000.0;
        self.ticks = self.ticks.saturating_add(1);
        self.tick_time_sum_ms += tick_ms;
        if tick_ms > self.max_tick_ms {
            self.max_tick_ms = tick_ms;
        }
        if tick_ms > self.slow_tick_threshold_ms {
            self.slow_ticks = self.slow_ticks.saturating_add(1);
        }
    }

    pub(crate) fn snapshot(&self) -> LoopMetricsSnapshot {
        let average_tick_ms = if self.ticks == 0 {
            0.0
        } else {
            self.tick_time_sum_ms / self.ticks as f32
        };
        LoopMetricsSnapshot {
            tick_count: self.ticks,
            slow_tick_count: self.slow_ticks,
            average_tick_ms,
            max_tick_ms: self.max_tick_ms,
        }
    }
}

fn slow_tick_threshold_ms_from_env() -> f32 {
    match std::env::var(SLOW_TICK_ENV_VAR) {
        Ok(raw) => match raw.trim().parse::<f32>() {
            Ok(value) if value.is_finite() && value > 0.0 => value,
            _ => {
                warn!(
                    raw,
                    default_ms = DEFAULT_SLOW_TICK_MS,
                    "invalid slow tick threshold override; using default"
                );
                DEFAULT_SLOW_TICK_MS
            }
        },
        Err(_) => DEFAULT_SLOW_TICK_MS,
    }
}
