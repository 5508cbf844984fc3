use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use thirtyfour::components::SelectElement;
use thirtyfour::{By, DesiredCapabilities, WebDriver};
use tokio::time::sleep;
use tracing::{error, info};

/// The single browser session every workflow step drives. Object-safe so
/// the runner can hold it behind a box and tests can substitute a double.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    async fn goto(&self, url: &str) -> Result<()>;
    /// Clears the element matching the CSS selector and types `value`.
    async fn fill(&self, selector: &str, value: &str) -> Result<()>;
    /// Picks the option with the given value in a `<select>` element.
    async fn select_option(&self, selector: &str, value: &str) -> Result<()>;
    /// Clicks the button or link whose visible text is exactly `text`.
    async fn click_text(&self, text: &str) -> Result<()>;
    async fn screenshot(&self, dest: &Path) -> Result<()>;
    async fn inner_html(&self, selector: &str) -> Result<String>;
    async fn close(&mut self) -> Result<()>;
}

/// Real session backed by a WebDriver server (chromedriver/geckodriver).
/// Applies a fixed pacing delay after every action so the remote site is
/// never hammered faster than a human would click.
pub struct WebDriverSession {
    driver: Option<WebDriver>,
    pace: Duration,
}

impl WebDriverSession {
    pub async fn connect(server_url: &str, pace: Duration) -> Result<Self> {
        info!("Connecting to WebDriver server at {server_url}");

        let caps = DesiredCapabilities::chrome();
        match WebDriver::new(server_url, caps).await {
            Ok(driver) => {
                info!("Browser session established");
                Ok(Self {
                    driver: Some(driver),
                    pace,
                })
            }
            Err(e) => {
                error!("Failed to establish browser session: {e}");
                Err(e).context("Failed to establish browser session")
            }
        }
    }

    fn driver(&self) -> Result<&WebDriver> {
        self.driver
            .as_ref()
            .context("Browser session already closed")
    }

    async fn pace(&self) {
        if !self.pace.is_zero() {
            sleep(self.pace).await;
        }
    }
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    async fn goto(&self, url: &str) -> Result<()> {
        self.driver()?
            .goto(url)
            .await
            .with_context(|| format!("Failed to navigate to {url}"))?;
        self.pace().await;
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        let element = self
            .driver()?
            .find(By::Css(selector))
            .await
            .with_context(|| format!("No element matches {selector}"))?;
        element.clear().await?;
        element
            .send_keys(value)
            .await
            .with_context(|| format!("Failed to fill {selector}"))?;
        self.pace().await;
        Ok(())
    }

    async fn select_option(&self, selector: &str, value: &str) -> Result<()> {
        let element = self
            .driver()?
            .find(By::Css(selector))
            .await
            .with_context(|| format!("No element matches {selector}"))?;
        let select = SelectElement::new(&element)
            .await
            .with_context(|| format!("{selector} is not a select element"))?;
        select
            .select_by_value(value)
            .await
            .with_context(|| format!("No option with value {value} in {selector}"))?;
        self.pace().await;
        Ok(())
    }

    async fn click_text(&self, text: &str) -> Result<()> {
        let xpath = format!("//*[self::button or self::a][normalize-space()='{text}']");
        self.driver()?
            .find(By::XPath(xpath.as_str()))
            .await
            .with_context(|| format!("No clickable element with text '{text}'"))?
            .click()
            .await
            .with_context(|| format!("Failed to click '{text}'"))?;
        self.pace().await;
        Ok(())
    }

    async fn screenshot(&self, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        self.driver()?
            .screenshot(dest)
            .await
            .with_context(|| format!("Failed to save screenshot to {}", dest.display()))
    }

    async fn inner_html(&self, selector: &str) -> Result<String> {
        self.driver()?
            .find(By::Css(selector))
            .await
            .with_context(|| format!("No element matches {selector}"))?
            .inner_html()
            .await
            .with_context(|| format!("Failed to read the content of {selector}"))
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(driver) = self.driver.take() {
            driver.quit().await.context("Failed to quit the browser")?;
            info!("Browser session closed");
        }
        Ok(())
    }
}
