use thiserror::Error;

/// User-visible failures of the dashboard. Every variant is shown inline and
/// cleared by the next successful action of the same kind.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DashboardError {
    /// Empty or identical tickers; raised before any network call.
    #[error("{0}")]
    Validation(String),

    /// Non-2xx status or an explicit `error` field in the response body.
    #[error("{0}")]
    Service(String),

    /// The request never produced a usable response.
    #[error("Request failed: {0}")]
    Transport(String),

    /// Symbol lookup failure. Degrades to a placeholder row, never blocks submission.
    #[error("Search failed: {0}")]
    Search(String),
}

impl DashboardError {
    pub fn kind(&self) -> &'static str {
        match self {
            DashboardError::Validation(_) => "validation",
            DashboardError::Service(_) => "service",
            DashboardError::Transport(_) => "transport",
            DashboardError::Search(_) => "search",
        }
    }
}
