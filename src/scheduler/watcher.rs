use crate::notify::Notifier;
use crate::probe::PageProbe;
use crate::scheduler::state::PauseFlag;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

/// Background task re-reading the overlay state on a fixed cadence,
/// independent of the main flow's phase
pub struct InterruptWatcher {
    handle: JoinHandle<()>,
}

impl InterruptWatcher {
    pub fn spawn(
        probe: Arc<dyn PageProbe>,
        pause: Arc<PauseFlag>,
        notifier: Arc<dyn Notifier>,
        every: Duration,
    ) -> Self {
        ::log::debug!("Starting interrupt watcher every {:?}", every);

        let handle = tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let interrupted = probe.is_interrupted().await;
                ::log::trace!("Watcher tick: interrupted = {}", interrupted);
                pause.observe(interrupted, notifier.as_ref());
            }
        });

        Self { handle }
    }

    /// Stops the task; no probe read happens after this returns
    pub async fn stop(self) {
        self.handle.abort();
        let _ = self.handle.await;
        ::log::debug!("Interrupt watcher stopped");
    }
}
