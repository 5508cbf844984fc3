use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use tracing::{error, info};

/// Fetches a remote file to a local path, replacing anything already there.
#[async_trait]
pub trait FileDownloader: Send + Sync {
    async fn download(&self, url: &str, dest: &Path) -> Result<()>;
}

pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for HttpDownloader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileDownloader for HttpDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        info!("Downloading {url}");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to request {url}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("Download of {url} returned status {status}: {body}");
            bail!("Download of {url} returned status {status}");
        }

        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read the body of {url}"))?;

        if let Some(parent) = dest.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        tokio::fs::write(dest, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", dest.display()))?;

        info!("Saved {} bytes to {}", bytes.len(), dest.display());
        Ok(())
    }
}
