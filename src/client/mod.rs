pub mod http_client;

use crate::config::ApiConfig;
use crate::error::DashboardError;
use crate::models::{AnalysisRequest, AnalysisResult, SearchResponse, SymbolMatch};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, info, warn};

use self::http_client::HttpClient;

// ── Service trait ─────────────────────────────────────────────────────────────

/// Swappable remote analysis / symbol-lookup service.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, DashboardError>;
    async fn search(&self, query: &str) -> Result<Vec<SymbolMatch>, DashboardError>;
}

// ── HTTP implementation ───────────────────────────────────────────────────────

pub struct HttpAnalysisClient {
    client: HttpClient,
}

impl HttpAnalysisClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        Ok(Self { client: HttpClient::new(config)? })
    }
}

#[async_trait]
impl AnalysisService for HttpAnalysisClient {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, DashboardError> {
        let url = self
            .client
            .endpoint("api/analyze")
            .map_err(|e| DashboardError::Transport(e.to_string()))?;

        info!("Analyzing {} vs {} ({})", request.ticker_a, request.ticker_b, request.period);
        let (status, body) = self
            .client
            .post_json(url, request)
            .await
            .map_err(|e| DashboardError::Transport(e.to_string()))?;

        debug!("/api/analyze → {} ({} bytes)", status, body.len());
        interpret_analysis_response(status, &body)
    }

    async fn search(&self, query: &str) -> Result<Vec<SymbolMatch>, DashboardError> {
        let mut url = self
            .client
            .endpoint("api/search")
            .map_err(|e| DashboardError::Search(e.to_string()))?;
        url.query_pairs_mut().append_pair("q", query);

        let (status, body) = self.client.get_text(url).await.map_err(|e| {
            warn!("Search '{}' failed: {}", query, e);
            DashboardError::Search(e.to_string())
        })?;
        interpret_search_response(status, &body)
    }
}

// ── Response interpretation ───────────────────────────────────────────────────

/// A body `error` message wins over the generic status message; a success
/// status with an `error` field is still a failure.
pub fn interpret_analysis_response(status: StatusCode, body: &str) -> Result<AnalysisResult, DashboardError> {
    let value: Option<serde_json::Value> = serde_json::from_str(body).ok();

    let body_error = value
        .as_ref()
        .and_then(|v| v.get("error"))
        .and_then(|e| e.as_str())
        .map(str::trim)
        .filter(|e| !e.is_empty());

    if let Some(msg) = body_error {
        return Err(DashboardError::Service(msg.to_string()));
    }
    if !status.is_success() {
        return Err(DashboardError::Service(format!(
            "Analysis failed (HTTP {})",
            status.as_u16()
        )));
    }

    let value = value.ok_or_else(|| {
        DashboardError::Transport("response body is not valid JSON".to_string())
    })?;
    serde_json::from_value(value)
        .map_err(|e| DashboardError::Transport(format!("unexpected response shape: {}", e)))
}

pub fn interpret_search_response(status: StatusCode, body: &str) -> Result<Vec<SymbolMatch>, DashboardError> {
    if !status.is_success() {
        return Err(DashboardError::Search(format!("HTTP {}", status.as_u16())));
    }
    let parsed: SearchResponse =
        serde_json::from_str(body).map_err(|e| DashboardError::Search(e.to_string()))?;
    Ok(parsed.results)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
