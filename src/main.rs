use std::process::ExitCode;
use std::time::Duration;
use tracing::{Level, error, info, warn};

use sales_intake_util::helpers::browser::WebDriverSession;
use sales_intake_util::helpers::download::HttpDownloader;
use sales_intake_util::helpers::pdf::LopdfRenderer;
use sales_intake_util::helpers::sheet::XlsxReader;
use sales_intake_util::{RunnerConfig, SalesRunner};

const CREDENTIALS_FILE: &str = "credentials.env";
const LOG_FILE: &str = "sales_intake.log";
const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:4444";
// Pacing between browser actions so the intranet sees human-speed input.
const ACTION_PACE: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() -> ExitCode {
    let credentials_loaded = dotenvy::from_filename(CREDENTIALS_FILE).is_ok();

    // Append-only run log; the guard flushes it on exit.
    let appender = tracing_appender::rolling::never(".", LOG_FILE);
    let (writer, _guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(false)
        .with_max_level(Level::INFO)
        .init();

    info!("Starting sales intake run");
    if !credentials_loaded {
        warn!("{CREDENTIALS_FILE} not found; relying on the process environment");
    }
    let config = RunnerConfig::from_env();

    let webdriver_url =
        std::env::var("WEBDRIVER_URL").unwrap_or_else(|_| DEFAULT_WEBDRIVER_URL.to_string());
    let browser = match WebDriverSession::connect(&webdriver_url, ACTION_PACE).await {
        Ok(session) => session,
        Err(e) => {
            error!("Could not start a browser session: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let mut runner = SalesRunner::new(
        Box::new(browser),
        Box::new(HttpDownloader::new()),
        Box::new(XlsxReader),
        Box::new(LopdfRenderer),
        config,
    );

    runner.process_sales_data().await;

    let error_count = runner.errors().len();
    info!(
        "Run finished: {} submitted, {} skipped, {} error(s)",
        runner.submitted(),
        runner.skipped(),
        error_count
    );

    if let Err(e) = runner.shutdown().await {
        warn!("Failed to close the browser session: {e:#}");
    }

    if error_count > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
