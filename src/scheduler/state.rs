use crate::notify::{Notice, Notifier};
use tokio::sync::watch;

/// Phase of the main scan/advance flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Scanning,
    Advancing,
    Done,
}

impl Phase {
    fn can_enter(self, next: Phase) -> bool {
        matches!(
            (self, next),
            (Phase::Idle, Phase::Scanning)
                | (Phase::Scanning, Phase::Advancing)
                | (Phase::Scanning, Phase::Done)
                | (Phase::Advancing, Phase::Scanning)
        )
    }
}

/// Counters and phase for a single run, owned by the scheduler.
///
/// The paused bit is not stored here: it is shared with the interrupt
/// watcher and lives in [`PauseFlag`].
#[derive(Debug)]
pub struct RunState {
    phase: Phase,
    pages_scanned: usize,
    advances: usize,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            pages_scanned: 0,
            advances: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn pages_scanned(&self) -> usize {
        self.pages_scanned
    }

    pub fn advances(&self) -> usize {
        self.advances
    }

    pub fn is_terminated(&self) -> bool {
        self.phase == Phase::Done
    }

    pub(crate) fn enter(&mut self, next: Phase) {
        debug_assert!(
            self.phase.can_enter(next),
            "illegal transition {:?} -> {:?}",
            self.phase,
            next
        );
        ::log::debug!("Phase {:?} -> {:?}", self.phase, next);
        self.phase = next;
    }

    pub(crate) fn record_scan(&mut self) {
        self.pages_scanned += 1;
    }

    pub(crate) fn record_advance(&mut self) {
        self.advances += 1;
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

/// Direction of a change of the paused bit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseEdge {
    Entered,
    Left,
}

/// Paused bit shared between the main flow and the interrupt watcher.
/// Last writer wins; every write is atomic with respect to the others.
#[derive(Debug)]
pub struct PauseFlag {
    tx: watch::Sender<bool>,
}

impl PauseFlag {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    pub fn is_paused(&self) -> bool {
        *self.tx.borrow()
    }

    /// Stores the latest observation and reports the edge if it flipped the bit
    pub fn set(&self, paused: bool) -> Option<PauseEdge> {
        let flipped = self.tx.send_if_modified(|current| {
            if *current == paused {
                false
            } else {
                *current = paused;
                true
            }
        });

        match (flipped, paused) {
            (false, _) => None,
            (true, true) => Some(PauseEdge::Entered),
            (true, false) => Some(PauseEdge::Left),
        }
    }

    /// Records an overlay check and notifies only on edges
    pub fn observe(&self, interrupted: bool, notifier: &dyn Notifier) {
        match self.set(interrupted) {
            Some(PauseEdge::Entered) => {
                ::log::warn!("Overlay detected, pausing until it is dismissed");
                notifier.notify(Notice::Paused);
            }
            Some(PauseEdge::Left) => {
                ::log::info!("Overlay cleared, resuming");
                notifier.notify(Notice::Resumed);
            }
            None => {}
        }
    }

    /// Resolves once the bit is clear
    pub async fn wait_until_clear(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait
        let _ = rx.wait_for(|paused| !*paused).await;
    }
}

impl Default for PauseFlag {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::ChannelNotifier;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_set_reports_edges_only() {
        let flag = PauseFlag::new();
        assert_eq!(flag.set(false), None);
        assert_eq!(flag.set(true), Some(PauseEdge::Entered));
        assert_eq!(flag.set(true), None);
        assert!(flag.is_paused());
        assert_eq!(flag.set(false), Some(PauseEdge::Left));
        assert!(!flag.is_paused());
    }

    #[test]
    fn test_observe_notifies_once_per_episode() {
        let flag = PauseFlag::new();
        let (notifier, mut rx) = ChannelNotifier::new();

        for _ in 0..5 {
            flag.observe(true, &notifier);
        }
        for _ in 0..3 {
            flag.observe(false, &notifier);
        }

        assert_eq!(rx.try_recv().unwrap(), Notice::Paused);
        assert_eq!(rx.try_recv().unwrap(), Notice::Resumed);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_clear() {
        let flag = Arc::new(PauseFlag::new());
        flag.set(true);

        let clearer = Arc::clone(&flag);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            clearer.set(false);
        });

        let started = tokio::time::Instant::now();
        flag.wait_until_clear().await;
        assert!(started.elapsed() >= Duration::from_secs(2));
        assert!(!flag.is_paused());
    }

    #[tokio::test]
    async fn test_wait_until_clear_when_not_paused() {
        PauseFlag::new().wait_until_clear().await;
    }

    #[test]
    fn test_legal_transitions() {
        let mut state = RunState::new();
        state.enter(Phase::Scanning);
        state.enter(Phase::Advancing);
        state.enter(Phase::Scanning);
        state.enter(Phase::Done);
        assert!(state.is_terminated());
        assert!(!Phase::Done.can_enter(Phase::Scanning));
        assert!(!Phase::Idle.can_enter(Phase::Advancing));
    }
}
