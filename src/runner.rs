use anyhow::{Context, Result, anyhow};
use std::path::Path;
use tracing::{error, info, warn};

use crate::helpers::browser::BrowserSession;
use crate::helpers::download::FileDownloader;
use crate::helpers::pdf::PdfRenderer;
use crate::helpers::sheet::SheetReader;
use crate::models::sales::SalesRecord;

// The intranet endpoints and output locations are fixed; only the
// credentials vary between runs.
pub const INTRANET_URL: &str = "https://robotsparebinindustries.com/";
pub const EXCEL_URL: &str = "https://robotsparebinindustries.com/SalesData.xlsx";
pub const EXCEL_FILE: &str = "SalesData.xlsx";
pub const SCREENSHOT_FILE: &str = "output/sales_summary.png";
pub const PDF_FILE: &str = "output/sales_results.pdf";

/// Configuration for one run, built once at startup and passed in.
#[derive(Clone, Debug, Default)]
pub struct RunnerConfig {
    pub username: String,
    pub password: String,
}

impl RunnerConfig {
    /// Reads `BOT_USERNAME` / `BOT_PASSWORD`. A missing value is warned
    /// about and left empty; the login form is filled with whatever we
    /// have, matching how the intranet treats bad credentials.
    pub fn from_env() -> Self {
        let read = |key: &str| match std::env::var(key) {
            Ok(value) => value,
            Err(_) => {
                warn!("{key} is not set; continuing with an empty value");
                String::new()
            }
        };

        Self {
            username: read("BOT_USERNAME"),
            password: read("BOT_PASSWORD"),
        }
    }
}

/// The workflow runner: drives the browser through the sales intake
/// procedure and guarantees a logout attempt at the end of every run.
pub struct SalesRunner {
    browser: Box<dyn BrowserSession>,
    downloader: Box<dyn FileDownloader>,
    sheets: Box<dyn SheetReader>,
    pdf: Box<dyn PdfRenderer>,
    config: RunnerConfig,
    errors: Vec<String>,
    submitted: usize,
    skipped: usize,
}

impl SalesRunner {
    pub fn new(
        browser: Box<dyn BrowserSession>,
        downloader: Box<dyn FileDownloader>,
        sheets: Box<dyn SheetReader>,
        pdf: Box<dyn PdfRenderer>,
        config: RunnerConfig,
    ) -> Self {
        info!("Creating new SalesRunner instance");
        Self {
            browser,
            downloader,
            sheets,
            pdf,
            config,
            errors: Vec::new(),
            submitted: 0,
            skipped: 0,
        }
    }

    /// Runs the whole procedure: open site, log in, download the
    /// spreadsheet, submit every row, capture the screenshot, export the
    /// PDF. Any failure along the way is logged and recorded on the
    /// runner instead of propagating; the logout attempt runs either way.
    pub async fn process_sales_data(&mut self) {
        match self.run_steps().await {
            Ok(()) => info!("Data processed successfully"),
            Err(e) => {
                error!("Error in processing: {e:#}");
                self.errors.push(format!("{e:#}"));
            }
        }

        if let Err(e) = self.log_out().await {
            error!("Error logging out: {e:#}");
            self.errors.push(format!("{e:#}"));
        }
    }

    async fn run_steps(&mut self) -> Result<()> {
        self.open_intranet_website().await?;
        self.log_in().await?;
        self.download_excel_file().await?;
        self.fill_form_with_excel_data().await?;
        self.collect_results().await?;
        self.export_as_pdf().await?;
        Ok(())
    }

    async fn open_intranet_website(&self) -> Result<()> {
        info!("Opening intranet website");
        self.browser
            .goto(INTRANET_URL)
            .await
            .context("Failed to open the intranet website")
    }

    async fn log_in(&self) -> Result<()> {
        info!("Logging in as {}", self.config.username);
        self.browser.fill("#username", &self.config.username).await?;
        self.browser.fill("#password", &self.config.password).await?;
        self.browser
            .click_text("Log in")
            .await
            .context("Failed to log in")
    }

    async fn download_excel_file(&self) -> Result<()> {
        match self
            .downloader
            .download(EXCEL_URL, Path::new(EXCEL_FILE))
            .await
        {
            Ok(()) => {
                info!("Excel file downloaded successfully");
                Ok(())
            }
            Err(e) => {
                error!("Failed to download Excel file: {e:#}");
                Err(e)
            }
        }
    }

    /// Reads the downloaded workbook and submits every row. A row that
    /// fails to convert or submit is logged and skipped; a workbook that
    /// cannot be read at all aborts the batch.
    pub async fn fill_form_with_excel_data(&mut self) -> Result<()> {
        let rows = match self.sheets.read_rows(Path::new(EXCEL_FILE)) {
            Ok(rows) => rows,
            Err(e) => {
                error!("Error processing Excel file: {e:#}");
                return Err(e);
            }
        };

        for row in &rows {
            let outcome = match SalesRecord::try_from(row) {
                Ok(record) => self.fill_and_submit_sales_form(&record).await,
                Err(e) => Err(anyhow!(e)),
            };
            match outcome {
                Ok(()) => self.submitted += 1,
                Err(_) => {
                    warn!("Skipping row: {row}");
                    self.skipped += 1;
                }
            }
        }
        Ok(())
    }

    /// Fills the four sales-form fields and clicks Submit.
    pub async fn fill_and_submit_sales_form(&self, record: &SalesRecord) -> Result<()> {
        let submit = async {
            self.browser.fill("#firstname", &record.first_name).await?;
            self.browser.fill("#lastname", &record.last_name).await?;
            self.browser
                .select_option("#salestarget", &record.sales_target)
                .await?;
            self.browser.fill("#salesresult", &record.sales).await?;
            self.browser.click_text("Submit").await
        };

        match submit.await {
            Ok(()) => {
                info!("Successfully submitted data for {}", record.full_name());
                Ok(())
            }
            Err(e) => {
                error!("Error submitting data for {}: {e:#}", record.full_name());
                Err(e)
            }
        }
    }

    async fn collect_results(&self) -> Result<()> {
        self.browser
            .screenshot(Path::new(SCREENSHOT_FILE))
            .await?;
        info!("Screenshot saved successfully");
        Ok(())
    }

    async fn export_as_pdf(&self) -> Result<()> {
        let sales_results_html = self.browser.inner_html("#sales-results").await?;
        self.pdf
            .render_html(&sales_results_html, Path::new(PDF_FILE))?;
        info!("PDF export completed");
        Ok(())
    }

    async fn log_out(&self) -> Result<()> {
        self.browser.click_text("Log out").await?;
        info!("Logged out successfully");
        Ok(())
    }

    /// Errors recorded during the run, in order of occurrence.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn submitted(&self) -> usize {
        self.submitted
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Closes the browser session. Call after `process_sales_data` so the
    /// session never outlives the run.
    pub async fn shutdown(mut self) -> Result<()> {
        self.browser.close().await
    }
}
