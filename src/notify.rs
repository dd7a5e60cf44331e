use crate::results::AvailabilityItem;
use fantoccini::Client;
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

/// User-visible message emitted by the scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// An overlay appeared; the run is on hold
    Paused,
    /// The overlay cleared; the run continues
    Resumed,
    PageScanned {
        page: usize,
        items: Vec<AvailabilityItem>,
    },
    Advancing {
        to_page: usize,
    },
    Finished {
        pages: usize,
        items: usize,
    },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Paused => write!(f, "Popup detected. Paused, please dismiss it manually"),
            Notice::Resumed => write!(f, "Popup dismissed. Resuming"),
            Notice::PageScanned { page, items } if items.is_empty() => {
                write!(f, "Page {}: no dates available", page)
            }
            Notice::PageScanned { page, items } => {
                let labels: Vec<&str> = items.iter().map(|i| i.as_str()).collect();
                write!(f, "Page {}: available dates: {}", page, labels.join(", "))
            }
            Notice::Advancing { to_page } => {
                write!(f, "Checking availability on page {}...", to_page)
            }
            Notice::Finished { pages, items } => write!(
                f,
                "Finished checking {} page(s), {} available date(s) found",
                pages, items
            ),
        }
    }
}

/// Fire-and-forget sink for notices. Implementations must not block.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Drops every notice
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _notice: Notice) {}
}

/// Writes notices to the log
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        ::log::info!("{}", notice);
    }
}

/// Forwards notices into an unbounded channel
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notice>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notice: Notice) {
        // A closed receiver just means nobody is listening any more
        let _ = self.tx.send(notice);
    }
}

/// Sends each notice to every inner notifier
pub struct FanoutNotifier {
    sinks: Vec<Arc<dyn Notifier>>,
}

impl FanoutNotifier {
    pub fn new(sinks: Vec<Arc<dyn Notifier>>) -> Self {
        Self { sinks }
    }
}

impl Notifier for FanoutNotifier {
    fn notify(&self, notice: Notice) {
        for sink in &self.sinks {
            sink.notify(notice.clone());
        }
    }
}

const TOAST_SCRIPT: &str = r#"
const toast = document.createElement("div");
toast.textContent = arguments[0];
toast.style.cssText = "position:fixed;left:50%;bottom:30px;transform:translateX(-50%);"
    + "min-width:250px;padding:16px;background:#333;color:#fff;text-align:center;"
    + "border-radius:2px;font-size:17px;z-index:10000;";
document.body.appendChild(toast);
setTimeout(() => toast.remove(), 3000);
"#;

/// Whether a notice is worth a toast. The final summary is left to the log
/// and the report because the session closes right after the run.
fn shows_as_toast(notice: &Notice) -> bool {
    !matches!(notice, Notice::Finished { .. })
}

/// Shows notices as a transient toast inside the automated page
pub struct ToastNotifier {
    client: Client,
}

impl ToastNotifier {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl Notifier for ToastNotifier {
    fn notify(&self, notice: Notice) {
        if !shows_as_toast(&notice) {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            ::log::debug!("No runtime available, dropping toast: {}", notice);
            return;
        };
        let client = self.client.clone();
        let message = notice.to_string();
        handle.spawn(async move {
            if let Err(e) = client.execute(TOAST_SCRIPT, vec![json!(message)]).await {
                ::log::debug!("Failed to show toast: {}", e);
            }
        });
    }
}
