use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Label of one bookable unit found on a page (e.g. a date string)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AvailabilityItem(String);

impl TryFrom<String> for AvailabilityItem {
    type Error = String;

    fn try_from(label: String) -> std::result::Result<Self, Self::Error> {
        Self::new(&label).ok_or_else(|| "availability label must not be blank".to_string())
    }
}

impl From<AvailabilityItem> for String {
    fn from(item: AvailabilityItem) -> Self {
        item.0
    }
}

impl AvailabilityItem {
    /// Trims the label; returns `None` when nothing is left
    pub fn new(label: &str) -> Option<Self> {
        let trimmed = label.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AvailabilityItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Items found on one scanned page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-based scan order
    #[serde(rename = "page")]
    pub page_index: usize,

    pub items: Vec<AvailabilityItem>,
}

impl PageResult {
    pub fn new(page_index: usize, items: Vec<AvailabilityItem>) -> Self {
        Self { page_index, items }
    }
}

/// Append-only log of page results, in scan order
#[derive(Debug, Default)]
pub struct ResultLog {
    pages: Vec<PageResult>,
}

impl ResultLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the next appended page must carry
    pub fn next_index(&self) -> usize {
        self.pages.len() + 1
    }

    /// Appends a page result. Any index other than `len + 1` is rejected
    /// and leaves the log untouched.
    pub fn append(&mut self, result: PageResult) -> Result<()> {
        let expected = self.next_index();
        if result.page_index != expected {
            return Err(Error::Sequence {
                expected,
                got: result.page_index,
            });
        }
        self.pages.push(result);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn pages(&self) -> &[PageResult] {
        &self.pages
    }

    pub fn into_pages(self) -> Vec<PageResult> {
        self.pages
    }
}

/// Why a run reached its terminal state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// `max_pages_to_check` pages were scanned
    PageCap,
    /// The last page had no actionable "next" control
    NoNextPage,
}

/// Structured outcome of a finished run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub pages: Vec<PageResult>,
    pub pages_scanned: usize,
    pub advances: usize,
    pub stop_reason: StopReason,
}

impl RunReport {
    pub fn total_items(&self) -> usize {
        self.pages.iter().map(|p| p.items.len()).sum()
    }

    /// Flattens the report into `(page, item)` rows, one per item
    pub fn rows(&self) -> Vec<(usize, &AvailabilityItem)> {
        self.pages
            .iter()
            .flat_map(|p| p.items.iter().map(move |item| (p.page_index, item)))
            .collect()
    }
}
