// Re-export modules
pub mod config;
pub mod error;
pub mod notify;
pub mod probe;
pub mod results;
pub mod scheduler;

// Re-export commonly used types for convenience
pub use config::FinderConfig;
pub use error::{Error, Result};
pub use notify::{Notice, Notifier};
pub use probe::{Navigator, PageProbe};
pub use results::{AvailabilityItem, PageResult, ResultLog, RunReport, StopReason};
pub use scheduler::Scheduler;

use notify::{FanoutNotifier, LogNotifier, ToastNotifier};
use probe::webdriver::{self, WebDriverPage};
use std::path::Path;
use std::sync::Arc;
use url::Url;

/// Builder for one slot search run against a live WebDriver session
pub struct Finder {
    config: FinderConfig,
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl Finder {
    /// Create a new Finder for the given calendar URL with default settings
    pub fn new(start_url: &str) -> Self {
        Self::from_config(FinderConfig::new(start_url))
    }

    /// Create a Finder from a complete configuration
    pub fn from_config(config: FinderConfig) -> Self {
        Self {
            config,
            notifiers: Vec::new(),
        }
    }

    /// Load configuration from a JSON file
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_config(FinderConfig::from_file(path)?))
    }

    /// Override the calendar URL
    pub fn with_start_url(mut self, start_url: &str) -> Self {
        self.config.start_url = start_url.to_string();
        self
    }

    /// Override the page cap
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.config.scheduler.max_pages_to_check = max_pages;
        self
    }

    /// Override the WebDriver endpoint
    pub fn with_webdriver_url(mut self, webdriver_url: &str) -> Self {
        self.config.webdriver_url = webdriver_url.to_string();
        self
    }

    /// Enable or disable in-page toasts
    pub fn with_toasts(mut self, enabled: bool) -> Self {
        self.config.toasts = enabled;
        self
    }

    /// Add a notifier that receives every notice in addition to the log
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Open the calendar, prefill the form and run the scheduler to completion
    pub async fn run(self) -> Result<RunReport> {
        let mut config = self.config;
        config.scheduler.validate()?;
        Url::parse(&config.start_url)?;

        // Override the WebDriver URL with an environment variable if provided
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                config.webdriver_url = webdriver_url;
            }
        }

        let client = webdriver::connect(&config.webdriver_url).await?;
        let page = match WebDriverPage::new(client.clone(), &config.selectors) {
            Ok(page) => Arc::new(page),
            Err(e) => {
                close_session(client).await;
                return Err(e);
            }
        };

        let mut sinks: Vec<Arc<dyn Notifier>> = vec![Arc::new(LogNotifier)];
        if config.toasts {
            sinks.push(Arc::new(ToastNotifier::new(client.clone())));
        }
        sinks.extend(self.notifiers);
        let notifier = Arc::new(FanoutNotifier::new(sinks));

        let outcome = run_session(&config, page, notifier).await;
        close_session(client).await;
        outcome
    }
}

async fn run_session(
    config: &FinderConfig,
    page: Arc<WebDriverPage>,
    notifier: Arc<dyn Notifier>,
) -> Result<RunReport> {
    page.open(&config.start_url).await?;
    page.prefill(&config.prefill).await?;
    if let Some(pattern) = &config.expected_title {
        page.check_title(pattern).await?;
    }

    let scheduler = Scheduler::new(
        config.scheduler.clone(),
        Arc::clone(&page) as Arc<dyn PageProbe>,
        page as Arc<dyn Navigator>,
        notifier,
    );
    scheduler.run().await
}

async fn close_session(client: fantoccini::Client) {
    if let Err(e) = client.close().await {
        ::log::warn!("Failed to close WebDriver session: {}", e);
    }
}
