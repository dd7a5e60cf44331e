use crate::config::SelectorConfig;
use crate::error::{Error, Result};
use crate::results::AvailabilityItem;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Compiled selectors answering the three probe queries against an HTML snapshot
#[derive(Debug)]
pub struct CalendarSelectors {
    overlay: Selector,
    next_page: Selector,
    day_cell: Selector,
    label: Selector,
    available_class: String,
    hidden_style: Regex,
}

impl CalendarSelectors {
    /// Compile selectors from configuration
    pub fn new(config: &SelectorConfig) -> Result<Self> {
        Ok(Self {
            overlay: compile(&config.overlay)?,
            next_page: compile(&config.next_page)?,
            day_cell: compile(&config.day_cell)?,
            label: compile(&config.label)?,
            available_class: config.available_class.clone(),
            hidden_style: Regex::new(r"display\s*:\s*none")?,
        })
    }

    /// True if any overlay element is present and not hidden inline
    pub fn has_overlay(&self, html: &str) -> bool {
        let doc = Html::parse_document(html);
        let found = doc
            .select(&self.overlay)
            .any(|overlay| !self.is_hidden(&overlay));
        ::log::trace!("Overlay present: {}", found);
        found
    }

    /// True if the next-page control exists and is not disabled
    pub fn has_next_page(&self, html: &str) -> bool {
        let doc = Html::parse_document(html);
        doc.select(&self.next_page).any(|control| {
            let el = control.value();
            el.attr("disabled").is_none()
                && el.attr("aria-disabled") != Some("true")
                && !self.is_hidden(&control)
        })
    }

    /// Labels of all day cells carrying the available class and a non-empty label.
    /// Cells failing either test are skipped.
    pub fn available_items(&self, html: &str) -> Vec<AvailabilityItem> {
        let doc = Html::parse_document(html);

        let items: Vec<AvailabilityItem> = doc
            .select(&self.day_cell)
            .filter(|cell| cell.value().classes().any(|c| c == self.available_class))
            .filter_map(|cell| {
                let label = cell.select(&self.label).next()?;
                let text = label.text().collect::<String>();
                let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
                AvailabilityItem::new(&text)
            })
            .collect();

        ::log::debug!("HTML probe found {} available items", items.len());
        items
    }

    fn is_hidden(&self, element: &ElementRef<'_>) -> bool {
        element
            .value()
            .attr("style")
            .is_some_and(|style| self.hidden_style.is_match(style))
    }
}

fn compile(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Config(format!("invalid selector {css:?}: {e}")))
}
