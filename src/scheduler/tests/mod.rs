
use crate::config::{DelayRange, SchedulerConfig};
use crate::notify::{ChannelNotifier, Notice};
use crate::probe::{Navigator, PageProbe};
use crate::results::AvailabilityItem;
use crate::scheduler::{PauseFlag, Scheduler};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

/// One week of the scripted calendar
pub struct Week {
    items: Vec<&'static str>,
    has_next: bool,
}

pub fn week(items: &[&'static str], has_next: bool) -> Week {
    Week {
        items: items.to_vec(),
        has_next,
    }
}

/// In-memory calendar that records every interaction and flags any scan or
/// advance that happens while an overlay is shown or the run is paused
pub struct ScriptedPage {
    weeks: Vec<Week>,
    position: AtomicUsize,
    overlay: Arc<AtomicBool>,
    pause: OnceLock<Arc<PauseFlag>>,
    scans: Mutex<Vec<usize>>,
    advances: AtomicUsize,
    reads: AtomicUsize,
    violations: AtomicUsize,
    overlay_after_scan: Mutex<HashMap<usize, Duration>>,
}

impl ScriptedPage {
    pub fn new(weeks: Vec<Week>) -> Arc<Self> {
        Arc::new(Self {
            weeks,
            position: AtomicUsize::new(0),
            overlay: Arc::new(AtomicBool::new(false)),
            pause: OnceLock::new(),
            scans: Mutex::new(Vec::new()),
            advances: AtomicUsize::new(0),
            reads: AtomicUsize::new(0),
            violations: AtomicUsize::new(0),
            overlay_after_scan: Mutex::new(HashMap::new()),
        })
    }

    pub fn overlay(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.overlay)
    }

    /// Show an overlay right after week `position` is scanned, for `shown_for`
    pub fn raise_overlay_after_scan(&self, position: usize, shown_for: Duration) {
        self.overlay_after_scan
            .lock()
            .unwrap()
            .insert(position, shown_for);
    }

    pub fn scanned_positions(&self) -> Vec<usize> {
        self.scans.lock().unwrap().clone()
    }

    pub fn advances(&self) -> usize {
        self.advances.load(Ordering::SeqCst)
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn violations(&self) -> usize {
        self.violations.load(Ordering::SeqCst)
    }

    fn check_not_blocked(&self) {
        let paused = self.pause.get().is_some_and(|p| p.is_paused());
        if paused || self.overlay.load(Ordering::SeqCst) {
            self.violations.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn current(&self) -> Option<&Week> {
        self.weeks.get(self.position.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl PageProbe for ScriptedPage {
    async fn is_interrupted(&self) -> bool {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.overlay.load(Ordering::SeqCst)
    }

    async fn can_advance(&self) -> bool {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.current().is_some_and(|w| w.has_next)
    }

    async fn scan_available(&self) -> Vec<AvailabilityItem> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check_not_blocked();

        let position = self.position.load(Ordering::SeqCst);
        self.scans.lock().unwrap().push(position);

        let items = self
            .current()
            .map(|w| {
                w.items
                    .iter()
                    .filter_map(|l| AvailabilityItem::new(l))
                    .collect()
            })
            .unwrap_or_default();

        let hook = self.overlay_after_scan.lock().unwrap().remove(&position);
        if let Some(shown_for) = hook {
            self.overlay.store(true, Ordering::SeqCst);
            let overlay = self.overlay();
            tokio::spawn(async move {
                tokio::time::sleep(shown_for).await;
                overlay.store(false, Ordering::SeqCst);
            });
        }

        items
    }
}

#[async_trait]
impl Navigator for ScriptedPage {
    async fn advance_page(&self) {
        self.check_not_blocked();
        self.advances.fetch_add(1, Ordering::SeqCst);
        self.position.fetch_add(1, Ordering::SeqCst);
    }
}

/// Default timings with a page cap
pub fn config_with_cap(max_pages_to_check: usize) -> SchedulerConfig {
    SchedulerConfig {
        max_pages_to_check,
        ..SchedulerConfig::default()
    }
}

/// Short fixed timings, handy where exact elapsed time matters
pub fn fast_config(max_pages_to_check: usize) -> SchedulerConfig {
    SchedulerConfig {
        max_pages_to_check,
        settle_delay_ms: DelayRange::fixed(100),
        advance_delay_ms: 100,
        advance_jitter_ms: 0,
        interrupt_poll_interval_ms: 50,
        page_settle_wait_ms: 100,
    }
}

pub fn scheduler_for(
    page: &Arc<ScriptedPage>,
    config: SchedulerConfig,
) -> (Scheduler, UnboundedReceiver<Notice>) {
    let (notifier, rx) = ChannelNotifier::new();
    let scheduler = Scheduler::new(
        config,
        Arc::clone(page) as Arc<dyn PageProbe>,
        Arc::clone(page) as Arc<dyn Navigator>,
        Arc::new(notifier),
    );
    let _ = page.pause.set(scheduler.pause_flag());
    (scheduler, rx)
}

pub fn drain(rx: &mut UnboundedReceiver<Notice>) -> Vec<Notice> {
    let mut notices = Vec::new();
    while let Ok(notice) = rx.try_recv() {
        notices.push(notice);
    }
    notices
}

pub fn pause_notices(notices: &[Notice]) -> Vec<Notice> {
    notices
        .iter()
        .filter(|n| matches!(n, Notice::Paused | Notice::Resumed))
        .cloned()
        .collect()
}

pub fn labels(items: &[AvailabilityItem]) -> Vec<&str> {
    items.iter().map(|i| i.as_str()).collect()
}
