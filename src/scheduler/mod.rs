//! The scan/advance state machine.
//!
//! One run walks `Idle -> Scanning -> (Advancing -> Scanning)* -> Done`.
//! An independent [`InterruptWatcher`] re-reads the overlay state on a fixed
//! cadence and toggles the shared [`PauseFlag`]; the main flow also re-checks
//! the overlay right before every scan and every advance, and while it is
//! present nothing is scanned or clicked.

pub mod delay;
pub mod state;
pub mod watcher;

#[cfg(test)]
mod tests;

pub use delay::DelayPolicy;
pub use state::{PauseEdge, PauseFlag, Phase, RunState};
pub use watcher::InterruptWatcher;

use crate::config::SchedulerConfig;
use crate::error::Result;
use crate::notify::{Notice, Notifier};
use crate::probe::{Navigator, PageProbe};
use crate::results::{PageResult, ResultLog, RunReport, StopReason};
use std::sync::Arc;
use tokio::time::sleep;

/// Drives a single run. Consumed by [`Scheduler::run`]; a new run needs a new scheduler.
pub struct Scheduler {
    config: SchedulerConfig,
    delays: DelayPolicy,
    probe: Arc<dyn PageProbe>,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
    pause: Arc<PauseFlag>,
}

impl Scheduler {
    pub fn new(
        config: SchedulerConfig,
        probe: Arc<dyn PageProbe>,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            delays: DelayPolicy::from_config(&config),
            config,
            probe,
            navigator,
            notifier,
            pause: Arc::new(PauseFlag::new()),
        }
    }

    /// Shared paused bit for this run
    pub fn pause_flag(&self) -> Arc<PauseFlag> {
        Arc::clone(&self.pause)
    }

    /// Runs until the page cap is reached or no next page exists
    pub async fn run(self) -> Result<RunReport> {
        let mut state = RunState::new();
        let mut results = ResultLog::new();

        let watcher = InterruptWatcher::spawn(
            Arc::clone(&self.probe),
            Arc::clone(&self.pause),
            Arc::clone(&self.notifier),
            self.config.interrupt_poll_interval(),
        );

        let outcome = self.drive(&mut state, &mut results).await;

        // Nothing may touch the page once the run is over
        watcher.stop().await;
        let stop_reason = outcome?;
        state.enter(Phase::Done);

        let report = RunReport {
            pages_scanned: state.pages_scanned(),
            advances: state.advances(),
            stop_reason,
            pages: results.into_pages(),
        };

        ::log::info!(
            "Run finished ({:?}): {} page(s) scanned, {} advance(s), {} item(s)",
            report.stop_reason,
            report.pages_scanned,
            report.advances,
            report.total_items()
        );
        self.notifier.notify(Notice::Finished {
            pages: report.pages_scanned,
            items: report.total_items(),
        });

        Ok(report)
    }

    async fn drive(&self, state: &mut RunState, results: &mut ResultLog) -> Result<StopReason> {
        let settle = self.delays.settle();
        ::log::info!("Waiting {:?} before the first scan", settle);
        sleep(settle).await;
        state.enter(Phase::Scanning);

        loop {
            match state.phase() {
                Phase::Scanning => {
                    self.hold_while_interrupted().await;

                    let items = self.probe.scan_available().await;
                    let page_index = state.pages_scanned() + 1;
                    results.append(PageResult::new(page_index, items.clone()))?;
                    state.record_scan();
                    ::log::info!("Scanned page {}: {} item(s)", page_index, items.len());
                    self.notifier.notify(Notice::PageScanned {
                        page: page_index,
                        items,
                    });

                    if state.pages_scanned() >= self.config.max_pages_to_check {
                        ::log::info!(
                            "Reached the limit of {} page(s)",
                            self.config.max_pages_to_check
                        );
                        return Ok(StopReason::PageCap);
                    }
                    if !self.probe.can_advance().await {
                        ::log::info!("No next page control on page {}", page_index);
                        return Ok(StopReason::NoNextPage);
                    }
                    state.enter(Phase::Advancing);
                }
                Phase::Advancing => {
                    let wait = self.delays.advance();
                    ::log::debug!("Advancing in {:?}", wait);
                    sleep(wait).await;

                    // The overlay may have appeared since the scan; only the advance is retried
                    self.hold_while_interrupted().await;

                    self.navigator.advance_page().await;
                    state.record_advance();
                    let to_page = state.pages_scanned() + 1;
                    ::log::info!("Advanced to page {}", to_page);
                    self.notifier.notify(Notice::Advancing { to_page });

                    sleep(self.delays.page_settle()).await;
                    state.enter(Phase::Scanning);
                }
                Phase::Idle | Phase::Done => {
                    unreachable!("drive loop never runs in {:?}", state.phase())
                }
            }
        }
    }

    /// Returns only after a direct overlay check comes back clear
    async fn hold_while_interrupted(&self) {
        loop {
            let interrupted = self.probe.is_interrupted().await;
            self.pause.observe(interrupted, self.notifier.as_ref());
            if !interrupted {
                return;
            }
            ::log::info!("Paused, waiting for the overlay to be dismissed");
            self.pause.wait_until_clear().await;
        }
    }
}
