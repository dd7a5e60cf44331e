pub mod html;
pub mod webdriver;

use crate::results::AvailabilityItem;
use async_trait::async_trait;

/// Read-only view of the current page.
///
/// None of these queries fail: a missing element or an unreachable page is
/// an expected steady state and reads as "not found" / empty.
#[async_trait]
pub trait PageProbe: Send + Sync {
    /// True iff a blocking overlay is currently shown
    async fn is_interrupted(&self) -> bool;

    /// True iff an actionable "next page" control exists
    async fn can_advance(&self) -> bool;

    /// Labels of every item on the page marked as available
    async fn scan_available(&self) -> Vec<AvailabilityItem>;
}

/// The navigation side effect. Calling it twice advances twice.
#[async_trait]
pub trait Navigator: Send + Sync {
    async fn advance_page(&self);
}
