use clap::Parser;
use slot_scout::{Finder, RunReport};

mod args;
use args::Args;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    let finder = match build_finder(&args) {
        Ok(finder) => finder,
        Err(e) => {
            ::log::error!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    ::log::info!("Starting slot search on {}", finder.config().start_url);
    println!("Note: a WebDriver server (e.g., ChromeDriver) must be running.");
    println!(
        "Set WEBDRIVER_URL environment variable if not using {}",
        finder.config().webdriver_url
    );

    let start_time = std::time::Instant::now();
    let report = match finder.run().await {
        Ok(report) => report,
        Err(e) => {
            ::log::error!("Slot search failed: {}", e);
            std::process::exit(1);
        }
    };

    ::log::info!(
        "Search complete - {} page(s) in {:.2} seconds",
        report.pages_scanned,
        start_time.elapsed().as_secs_f64()
    );

    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                ::log::error!("Failed to serialize report: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        print_table(&report);
    }
}

fn build_finder(args: &Args) -> slot_scout::Result<Finder> {
    let mut finder = match &args.config {
        Some(path) => Finder::from_config_file(path)?,
        None => Finder::new(""),
    };

    if let Some(url) = &args.url {
        finder = finder.with_start_url(url);
    }
    if let Some(max_pages) = args.max_pages {
        finder = finder.with_max_pages(max_pages);
    }
    if let Some(webdriver_url) = &args.webdriver_url {
        finder = finder.with_webdriver_url(webdriver_url);
    }
    if args.no_toasts {
        finder = finder.with_toasts(false);
    }

    if finder.config().start_url.is_empty() {
        return Err(slot_scout::Error::Config(
            "no calendar URL given (pass it as an argument or set start_url)".to_string(),
        ));
    }
    Ok(finder)
}

fn print_table(report: &RunReport) {
    let rows = report.rows();
    if rows.is_empty() {
        println!("No available dates found in {} page(s)", report.pages_scanned);
        return;
    }

    println!("{:<8} Date", "Page");
    for (page, item) in rows {
        println!("{:<8} {}", format!("Page {}", page), item);
    }
}
