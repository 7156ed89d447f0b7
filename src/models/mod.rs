use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::DashboardError;

// ── Lookback period ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[default]
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
}

impl Period {
    pub const ALL: [Period; 6] = [
        Period::OneMonth,
        Period::ThreeMonths,
        Period::SixMonths,
        Period::OneYear,
        Period::TwoYears,
        Period::FiveYears,
    ];

    /// Wire value sent to `/api/analyze` and stored in history.
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
            Period::FiveYears => "5y",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Period::OneMonth => "1 Month",
            Period::ThreeMonths => "3 Months",
            Period::SixMonths => "6 Months",
            Period::OneYear => "1 Year",
            Period::TwoYears => "2 Years",
            Period::FiveYears => "5 Years",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        Period::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown period '{}' (expected 1mo, 3mo, 6mo, 1y, 2y or 5y)", s))
    }
}

// ── Request ───────────────────────────────────────────────────────────────────

/// One validated submission. Tickers are trimmed, uppercased and distinct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisRequest {
    pub ticker_a: String,
    pub ticker_b: String,
    pub period: Period,
}

impl AnalysisRequest {
    pub fn new(ticker_a: &str, ticker_b: &str, period: Period) -> Result<Self, DashboardError> {
        let ticker_a = normalise_symbol(ticker_a);
        let ticker_b = normalise_symbol(ticker_b);

        if ticker_a.is_empty() || ticker_b.is_empty() {
            return Err(DashboardError::Validation(
                "Please enter both ticker symbols.".to_string(),
            ));
        }
        if ticker_a == ticker_b {
            return Err(DashboardError::Validation(
                "Please enter two different ticker symbols.".to_string(),
            ));
        }

        Ok(Self { ticker_a, ticker_b, period })
    }
}

pub fn normalise_symbol(s: &str) -> String {
    s.trim().to_uppercase()
}

// ── Signal direction ──────────────────────────────────────────────────────────

/// Direction of a combined or statistical signal. Anything the service sends
/// besides `FAVOR_A` / `FAVOR_B` (including legacy `N/A`) reads as neutral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalDirection {
    FavorA,
    FavorB,
    #[default]
    Neutral,
}

impl SignalDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalDirection::FavorA => "FAVOR_A",
            SignalDirection::FavorB => "FAVOR_B",
            SignalDirection::Neutral => "NEUTRAL",
        }
    }
}

impl From<String> for SignalDirection {
    fn from(s: String) -> Self {
        SignalDirection::from(s.as_str())
    }
}

impl From<&str> for SignalDirection {
    fn from(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "FAVOR_A" => SignalDirection::FavorA,
            "FAVOR_B" => SignalDirection::FavorB,
            _ => SignalDirection::Neutral,
        }
    }
}

// ── Analysis payload ──────────────────────────────────────────────────────────

/// Numeric series from the service. `None` marks "no point" (warm-up windows etc.).
pub type Series = Vec<Option<f64>>;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PriceSeries {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub dates: Vec<String>,
    #[serde(default)]
    pub prices: Series,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RatioSeries {
    #[serde(default)]
    pub dates: Vec<String>,
    #[serde(default)]
    pub values: Series,
    #[serde(default)]
    pub ma_50: Series,
    #[serde(default)]
    pub ma_200: Series,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReturnsSeries {
    #[serde(default)]
    pub dates: Vec<String>,
    #[serde(default)]
    pub returns_a: Series,
    #[serde(default)]
    pub returns_b: Series,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ValueSeries {
    #[serde(default)]
    pub dates: Vec<String>,
    #[serde(default)]
    pub values: Series,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Bollinger {
    #[serde(default)]
    pub upper: Series,
    #[serde(default)]
    pub middle: Series,
    #[serde(default)]
    pub lower: Series,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Rsi {
    #[serde(default)]
    pub values: Series,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Macd {
    #[serde(default)]
    pub macd_line: Series,
    #[serde(default)]
    pub signal_line: Series,
    #[serde(default)]
    pub histogram: Series,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Confirmation {
    #[serde(default)]
    pub direction: String,
    #[serde(default)]
    pub signals: Vec<String>,
    pub rsi_value: Option<f64>,
    pub macd_hist: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Technicals {
    pub bollinger: Option<Bollinger>,
    #[serde(default)]
    pub rsi: Rsi,
    #[serde(default)]
    pub macd: Macd,
    pub confirmation: Option<Confirmation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IndividualRsi {
    #[serde(default)]
    pub rsi_a: Series,
    #[serde(default)]
    pub rsi_b: Series,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RelativeReturn {
    pub return_a: Option<f64>,
    pub return_b: Option<f64>,
    pub differential: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Cointegration {
    pub p_value: Option<f64>,
    pub is_cointegrated: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Statistics {
    pub current_ratio: Option<f64>,
    pub ratio_ma_50: Option<f64>,
    pub ratio_ma_200: Option<f64>,
    pub ratio_above_ma_50: Option<bool>,
    pub ratio_above_ma_200: Option<bool>,
    pub momentum_roc: Option<f64>,
    pub momentum_direction: Option<String>,
    /// Keyed by period label ("1mo", "3mo", "6mo").
    #[serde(default)]
    pub relative_returns: BTreeMap<String, RelativeReturn>,
    pub correlation: Option<f64>,
    pub hurst_exponent: Option<f64>,
    pub adf_pvalue: Option<f64>,
    pub is_stationary: Option<bool>,
    pub current_zscore: Option<f64>,
    pub cointegration: Option<Cointegration>,
}

/// Statistical-only signal. Older payloads carried only this block.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StatSignal {
    #[serde(default)]
    pub direction: SignalDirection,
    pub conviction: Option<f64>,
    pub strength: Option<f64>,
    #[serde(default)]
    pub detail: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CombinedSignal {
    #[serde(default)]
    pub direction: SignalDirection,
    #[serde(default)]
    pub conviction: f64,
    #[serde(default)]
    pub detail: String,
    pub stat_pct: Option<f64>,
    pub ai_conviction: Option<f64>,
    pub tech_confirms: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AiRecommendation {
    pub recommendation: Option<String>,
    #[serde(default)]
    pub risk_factors: Vec<String>,
    pub signal: Option<String>,
    pub conviction: Option<f64>,
    #[serde(default)]
    pub available: bool,
    pub model_used: Option<String>,
}

/// Full `/api/analyze` success payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    #[serde(default)]
    pub ticker_a: PriceSeries,
    #[serde(default)]
    pub ticker_b: PriceSeries,
    #[serde(default)]
    pub statistics: Statistics,
    #[serde(default)]
    pub ratio: RatioSeries,
    #[serde(default)]
    pub zscore: ValueSeries,
    #[serde(default)]
    pub returns: ReturnsSeries,
    /// 60-day rolling correlation of the two price series.
    pub correlation_rolling: Option<ValueSeries>,
    pub technicals: Option<Technicals>,
    pub individual_rsi: Option<IndividualRsi>,
    pub signal: Option<StatSignal>,
    pub ai_recommendation: Option<AiRecommendation>,
    pub combined: Option<CombinedSignal>,
}

impl AnalysisResult {
    /// `(direction, conviction)` used for the banner and the history entry:
    /// combined signal first, then the legacy statistical signal, else neutral/0.
    pub fn verdict(&self) -> (SignalDirection, f64) {
        if let Some(c) = &self.combined {
            return (c.direction, c.conviction);
        }
        if let Some(s) = &self.signal {
            return (s.direction, s.conviction.unwrap_or(0.0));
        }
        (SignalDirection::Neutral, 0.0)
    }

    pub fn signal_detail(&self) -> Option<&str> {
        self.combined
            .as_ref()
            .map(|c| c.detail.as_str())
            .filter(|d| !d.is_empty())
            .or_else(|| {
                self.signal
                    .as_ref()
                    .map(|s| s.detail.as_str())
                    .filter(|d| !d.is_empty())
            })
    }
}

// ── Symbol search ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SymbolMatch {
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    pub exchange: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl SymbolMatch {
    /// Venue shown next to the name: exchange, else the quote type.
    pub fn venue(&self) -> &str {
        self.exchange
            .as_deref()
            .filter(|e| !e.is_empty())
            .or(self.kind.as_deref())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SymbolMatch>,
}

// ── History ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub ticker_a: String,
    pub ticker_b: String,
    pub period: String,
    pub signal: String,
    pub conviction: f64,
    pub date: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn same_key(&self, ticker_a: &str, ticker_b: &str, period: &str) -> bool {
        self.ticker_a == ticker_a && self.ticker_b == ticker_b && self.period == period
    }
}
