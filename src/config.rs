use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// Inclusive millisecond bounds for a randomized wait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min: u64,
    pub max: u64,
}

impl DelayRange {
    pub fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    /// A range that always yields the same value
    pub fn fixed(ms: u64) -> Self {
        Self { min: ms, max: ms }
    }
}

/// Timing and limits for the scan/advance state machine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Stop after this many pages have been scanned
    #[serde(default = "default_max_pages_to_check")]
    pub max_pages_to_check: usize,

    /// Wait before the first scan of a run
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: DelayRange,

    /// Base wait between a scan and the following advance
    #[serde(default = "default_advance_delay")]
    pub advance_delay_ms: u64,

    /// Random extra added on top of `advance_delay_ms`
    #[serde(default = "default_advance_jitter")]
    pub advance_jitter_ms: u64,

    /// Cadence of the independent overlay check
    #[serde(default = "default_interrupt_poll_interval")]
    pub interrupt_poll_interval_ms: u64,

    /// Wait after an advance for the next page to load
    #[serde(default = "default_page_settle_wait")]
    pub page_settle_wait_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_pages_to_check: default_max_pages_to_check(),
            settle_delay_ms: default_settle_delay(),
            advance_delay_ms: default_advance_delay(),
            advance_jitter_ms: default_advance_jitter(),
            interrupt_poll_interval_ms: default_interrupt_poll_interval(),
            page_settle_wait_ms: default_page_settle_wait(),
        }
    }
}

impl SchedulerConfig {
    /// Reject settings the scheduler cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_pages_to_check == 0 {
            return Err(Error::Config(
                "max_pages_to_check must be at least 1".to_string(),
            ));
        }
        if self.settle_delay_ms.min > self.settle_delay_ms.max {
            return Err(Error::Config(format!(
                "settle_delay_ms min ({}) is greater than max ({})",
                self.settle_delay_ms.min, self.settle_delay_ms.max
            )));
        }
        if self
            .advance_delay_ms
            .checked_add(self.advance_jitter_ms)
            .is_none()
        {
            return Err(Error::Config(format!(
                "advance_delay_ms ({}) plus advance_jitter_ms ({}) overflows",
                self.advance_delay_ms, self.advance_jitter_ms
            )));
        }
        if self.interrupt_poll_interval_ms == 0 {
            return Err(Error::Config(
                "interrupt_poll_interval_ms must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn interrupt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.interrupt_poll_interval_ms)
    }

    pub fn page_settle_wait(&self) -> Duration {
        Duration::from_millis(self.page_settle_wait_ms)
    }
}

/// CSS selectors used to read the calendar page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Matches any blocking dialog
    #[serde(default = "default_overlay_selector")]
    pub overlay: String,

    /// Matches the "next week" control
    #[serde(default = "default_next_page_selector")]
    pub next_page: String,

    /// Matches every day cell on the current week
    #[serde(default = "default_day_cell_selector")]
    pub day_cell: String,

    /// Class a day cell must carry to count as available
    #[serde(default = "default_available_class")]
    pub available_class: String,

    /// Element inside an available cell whose text is the label
    #[serde(default = "default_label_selector")]
    pub label: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            overlay: default_overlay_selector(),
            next_page: default_next_page_selector(),
            day_cell: default_day_cell_selector(),
            available_class: default_available_class(),
            label: default_label_selector(),
        }
    }
}

/// One form interaction applied before the run starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum FormStep {
    /// Pick an option of a `<select>` by value
    Select { selector: String, value: String },
    /// Tick a checkbox or radio button
    Check { selector: String },
    /// Click a button or link
    Click { selector: String },
}

/// Top level configuration for a slot search run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinderConfig {
    /// Page holding the weekly calendar
    #[serde(default)]
    pub start_url: String,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub selectors: SelectorConfig,

    /// Regex the document title must match before scanning starts
    #[serde(default)]
    pub expected_title: Option<String>,

    /// Form steps run in order before the first scan
    #[serde(default)]
    pub prefill: Vec<FormStep>,

    /// Mirror notifications as in-page toasts
    #[serde(default = "default_toasts")]
    pub toasts: bool,
}

impl FinderConfig {
    /// Create a new configuration with default values
    pub fn new(start_url: &str) -> Self {
        Self {
            start_url: start_url.to_string(),
            webdriver_url: default_webdriver_url(),
            scheduler: SchedulerConfig::default(),
            selectors: SelectorConfig::default(),
            expected_title: None,
            prefill: Vec::new(),
            toasts: default_toasts(),
        }
    }

    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.scheduler.validate()?;
        Ok(config)
    }
}

fn default_max_pages_to_check() -> usize {
    16
}

fn default_settle_delay() -> DelayRange {
    DelayRange::new(5000, 10000)
}

fn default_advance_delay() -> u64 {
    3000
}

fn default_advance_jitter() -> u64 {
    1000
}

fn default_interrupt_poll_interval() -> u64 {
    1000
}

fn default_page_settle_wait() -> u64 {
    5000
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_overlay_selector() -> String {
    ".ui-dialog.ui-corner-all.ui-widget.ui-widget-content.ui-front, .popup-message".to_string()
}

fn default_next_page_selector() -> String {
    "#searchForWeeklySlotsNextWeek".to_string()
}

fn default_day_cell_selector() -> String {
    ".day.none, .day.nonenonotif".to_string()
}

fn default_available_class() -> String {
    "slotsavailable".to_string()
}

fn default_label_selector() -> String {
    "a".to_string()
}

fn default_toasts() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config = FinderConfig::from_json("{}").unwrap();
        assert_eq!(config.scheduler.max_pages_to_check, 16);
        assert_eq!(config.scheduler.settle_delay_ms, DelayRange::new(5000, 10000));
        assert_eq!(config.scheduler.advance_delay_ms, 3000);
        assert_eq!(config.scheduler.interrupt_poll_interval_ms, 1000);
        assert_eq!(config.scheduler.page_settle_wait_ms, 5000);
        assert_eq!(config.webdriver_url, "http://localhost:4444");
        assert_eq!(config.selectors.available_class, "slotsavailable");
        assert!(config.toasts);
        assert!(config.prefill.is_empty());
    }

    #[test]
    fn test_partial_scheduler_override() {
        let json = r#"{
            "start_url": "https://example.org/slots",
            "scheduler": { "max_pages_to_check": 4, "settle_delay_ms": { "min": 10, "max": 20 } }
        }"#;
        let config = FinderConfig::from_json(json).unwrap();
        assert_eq!(config.start_url, "https://example.org/slots");
        assert_eq!(config.scheduler.max_pages_to_check, 4);
        assert_eq!(config.scheduler.settle_delay_ms, DelayRange::new(10, 20));
        assert_eq!(config.scheduler.advance_delay_ms, 3000);
    }

    #[test]
    fn test_prefill_steps() {
        let json = r##"{
            "prefill": [
                { "action": "select", "selector": "#category", "value": "Tc-B" },
                { "action": "check", "selector": "#no-needs" },
                { "action": "click", "selector": "#submit" }
            ]
        }"##;
        let config = FinderConfig::from_json(json).unwrap();
        assert_eq!(
            config.prefill,
            vec![
                FormStep::Select {
                    selector: "#category".to_string(),
                    value: "Tc-B".to_string()
                },
                FormStep::Check {
                    selector: "#no-needs".to_string()
                },
                FormStep::Click {
                    selector: "#submit".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_rejects_inverted_range() {
        let json = r#"{ "scheduler": { "settle_delay_ms": { "min": 20, "max": 10 } } }"#;
        assert!(matches!(FinderConfig::from_json(json), Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_zero_page_cap() {
        let json = r#"{ "scheduler": { "max_pages_to_check": 0 } }"#;
        assert!(matches!(FinderConfig::from_json(json), Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_overflowing_advance_delay() {
        let json = r#"{ "scheduler": { "advance_delay_ms": 18446744073709551615, "advance_jitter_ms": 1 } }"#;
        assert!(matches!(FinderConfig::from_json(json), Err(Error::Config(_))));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            FinderConfig::from_json("{ not json"),
            Err(Error::Config(_))
        ));
    }
}
