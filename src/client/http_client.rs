use crate::config::ApiConfig;
use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Thin reqwest wrapper. One attempt per call; failures go back to the caller.
pub struct HttpClient {
    inner: reqwest::Client,
    base: Url,
}

impl HttpClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .cookie_store(true)
            .build()
            .context("Failed to build HTTP client")?;

        // trailing slash so join() appends instead of replacing the last segment
        let mut base = config.base_url.trim_end_matches('/').to_string();
        base.push('/');
        let base = Url::parse(&base)
            .with_context(|| format!("Invalid API base URL {}", config.base_url))?;

        Ok(Self { inner, base })
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base.join(path.trim_start_matches('/'))
    }

    /// POST a JSON body; returns status and raw body text.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<(StatusCode, String), reqwest::Error> {
        debug!("POST {}", url);
        let resp = self.inner.post(url).json(body).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        Ok((status, text))
    }

    pub async fn get_text(&self, url: Url) -> Result<(StatusCode, String), reqwest::Error> {
        debug!("GET {}", url);
        let resp = self.inner.get(url).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        Ok((status, text))
    }
}
