use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "slot-scout")]
#[command(about = "Walks a weekly booking calendar and reports available slots")]
#[command(version)]
pub struct Args {
    /// Calendar page to open (overrides start_url from the config file)
    pub url: Option<String>,

    /// Path to a JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Maximum number of weeks to check
    #[arg(short, long)]
    pub max_pages: Option<usize>,

    /// WebDriver endpoint (WEBDRIVER_URL takes precedence when set)
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Do not show notifications inside the page
    #[arg(long)]
    pub no_toasts: bool,

    /// Print the report as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}
