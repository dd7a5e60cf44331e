use crate::config::{FormStep, SelectorConfig};
use crate::error::{Error, Result};
use crate::probe::html::CalendarSelectors;
use crate::probe::{Navigator, PageProbe};
use crate::results::AvailabilityItem;
use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder, Locator};
use regex::Regex;
use serde_json::json;

/// Alternative endpoints tried when the configured WebDriver is unreachable
const FALLBACK_URLS: [&str; 3] = [
    "http://localhost:9515", // ChromeDriver default
    "http://localhost:4444", // geckodriver / Selenium default
    "http://127.0.0.1:4444", // Try with IP instead of localhost
];

/// Sets a form field through the DOM so the page's own listeners fire
const SET_FIELD_SCRIPT: &str = r#"
const el = document.querySelector(arguments[0]);
if (!el) { return false; }
if (arguments[1] === null) { el.checked = true; } else { el.value = arguments[1]; }
for (const name of ["change", "input"]) {
    el.dispatchEvent(new Event(name, { bubbles: true }));
}
return true;
"#;

/// Connects to the WebDriver instance, falling back to common local endpoints
pub async fn connect(webdriver_url: &str) -> Result<Client> {
    match ClientBuilder::native().connect(webdriver_url).await {
        Ok(client) => {
            ::log::debug!("Connected to WebDriver at {}", webdriver_url);
            return Ok(client);
        }
        Err(e) => {
            ::log::error!("Failed to connect to WebDriver at {}: {}", webdriver_url, e);
        }
    }

    for url in FALLBACK_URLS.iter() {
        if *url == webdriver_url {
            continue;
        }

        ::log::info!("Trying fallback WebDriver URL: {}", url);
        if let Ok(client) = ClientBuilder::native().connect(url).await {
            ::log::debug!("Connected to fallback WebDriver at {}", url);
            return Ok(client);
        }
    }

    Err(Error::WebDriver(format!(
        "could not connect to {} or any fallback; make sure a WebDriver server is running \
         or set the WEBDRIVER_URL environment variable",
        webdriver_url
    )))
}

/// Calendar page driven through a live WebDriver session
pub struct WebDriverPage {
    client: Client,
    selectors: CalendarSelectors,
    next_page_css: String,
}

impl WebDriverPage {
    pub fn new(client: Client, config: &SelectorConfig) -> Result<Self> {
        Ok(Self {
            client,
            selectors: CalendarSelectors::new(config)?,
            next_page_css: config.next_page.clone(),
        })
    }

    /// Navigate to the calendar page
    pub async fn open(&self, url: &str) -> Result<()> {
        ::log::info!("Opening {}", url);
        self.client.goto(url).await?;
        Ok(())
    }

    /// Fails unless the document title matches `pattern`
    pub async fn check_title(&self, pattern: &str) -> Result<()> {
        let regex = Regex::new(pattern)?;
        let title = self.client.title().await?;
        if regex.is_match(&title) {
            ::log::debug!("Page title {:?} matches {:?}", title, pattern);
            Ok(())
        } else {
            Err(Error::TitleMismatch {
                pattern: pattern.to_string(),
                actual: title,
            })
        }
    }

    /// Apply form steps in order. Missing elements are logged and skipped.
    pub async fn prefill(&self, steps: &[FormStep]) -> Result<()> {
        for (i, step) in steps.iter().enumerate() {
            ::log::info!("Running form step {}: {:?}", i + 1, step);
            let applied = match step {
                FormStep::Select { selector, value } => {
                    self.set_field(selector, json!(value)).await?
                }
                FormStep::Check { selector } => {
                    self.set_field(selector, serde_json::Value::Null).await?
                }
                FormStep::Click { selector } => {
                    match self.client.find(Locator::Css(selector)).await {
                        Ok(element) => {
                            element.click().await?;
                            true
                        }
                        Err(_) => false,
                    }
                }
            };
            if !applied {
                ::log::warn!("Form step {} skipped: element not found", i + 1);
            }
        }
        Ok(())
    }

    pub async fn close(self) -> Result<()> {
        self.client.close().await?;
        Ok(())
    }

    async fn set_field(&self, selector: &str, value: serde_json::Value) -> Result<bool> {
        let found = self
            .client
            .execute(SET_FIELD_SCRIPT, vec![json!(selector), value])
            .await?;
        Ok(found.as_bool().unwrap_or(false))
    }

    /// Current page source, or `None` if the session could not provide it
    async fn source(&self, context: &str) -> Option<String> {
        match self.client.source().await {
            Ok(html) => Some(html),
            Err(e) => {
                handle_command_error(e, context);
                None
            }
        }
    }
}

#[async_trait]
impl PageProbe for WebDriverPage {
    async fn is_interrupted(&self) -> bool {
        match self.source("checking for overlay").await {
            Some(html) => self.selectors.has_overlay(&html),
            None => false,
        }
    }

    async fn can_advance(&self) -> bool {
        match self.source("looking for next page control").await {
            Some(html) => self.selectors.has_next_page(&html),
            None => false,
        }
    }

    async fn scan_available(&self) -> Vec<AvailabilityItem> {
        match self.source("scanning available items").await {
            Some(html) => self.selectors.available_items(&html),
            None => Vec::new(),
        }
    }
}

#[async_trait]
impl Navigator for WebDriverPage {
    async fn advance_page(&self) {
        match self.client.find(Locator::Css(&self.next_page_css)).await {
            Ok(element) => {
                if let Err(e) = element.click().await {
                    handle_command_error(e, "clicking next page control");
                } else {
                    ::log::debug!("Clicked next page control");
                }
            }
            Err(e) => handle_command_error(e, "finding next page control"),
        }
    }
}

/// Logs a WebDriver command failure that the caller degrades past
fn handle_command_error(error: fantoccini::error::CmdError, context: &str) {
    if error.to_string().contains("Unable to find session") {
        ::log::warn!("Lost WebDriver session while {}", context);
    } else {
        ::log::debug!("WebDriver command failed while {}: {}", context, error);
    }
}
