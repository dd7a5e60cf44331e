use crate::config::{DelayRange, SchedulerConfig};
use rand::Rng;
use std::time::Duration;

/// Draws the waits used by the main flow
#[derive(Debug, Clone)]
pub struct DelayPolicy {
    settle: DelayRange,
    advance: DelayRange,
    page_settle: Duration,
}

impl DelayPolicy {
    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self {
            settle: config.settle_delay_ms,
            advance: DelayRange::new(
                config.advance_delay_ms,
                config
                    .advance_delay_ms
                    .saturating_add(config.advance_jitter_ms),
            ),
            page_settle: config.page_settle_wait(),
        }
    }

    /// Wait before the first scan
    pub fn settle(&self) -> Duration {
        pick(self.settle)
    }

    /// Wait between a scan and the following advance
    pub fn advance(&self) -> Duration {
        pick(self.advance)
    }

    /// Fixed wait after an advance
    pub fn page_settle(&self) -> Duration {
        self.page_settle
    }
}

fn pick(range: DelayRange) -> Duration {
    let ms = if range.min >= range.max {
        range.min
    } else {
        rand::thread_rng().gen_range(range.min..=range.max)
    };
    Duration::from_millis(ms)
}
