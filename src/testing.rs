//! Shared fixtures and fakes for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::autocomplete::{DropdownView, TickerInput};
use crate::client::AnalysisService;
use crate::error::DashboardError;
use crate::history::HistoryRow;
use crate::models::{AnalysisRequest, AnalysisResult, SymbolMatch};
use crate::orchestrator::FormState;
use crate::render::charts::{ChartDescriptor, ChartKey};
use crate::render::panels::{AiPanel, SignalBadge, SignalBanner};
use crate::render::stats::StatMetric;
use crate::view::{ChartInstanceId, DashboardView};

/// `/api/analyze` response for AAPL vs MSFT over twelve sessions.
pub const SAMPLE_PAYLOAD: &str = r##"{
  "ticker_a": {
    "symbol": "AAPL",
    "name": "Apple Inc.",
    "dates": [
      "2025-01-02",
      "2025-01-03",
      "2025-01-04",
      "2025-01-05",
      "2025-01-06",
      "2025-01-07",
      "2025-01-08",
      "2025-01-09",
      "2025-01-10",
      "2025-01-11",
      "2025-01-12",
      "2025-01-13"
    ],
    "prices": [
      180.0,
      181.3,
      182.6,
      183.9,
      185.2,
      186.5,
      187.8,
      189.1,
      190.4,
      191.7,
      193.0,
      194.3
    ]
  },
  "ticker_b": {
    "symbol": "MSFT",
    "name": "Microsoft Corporation",
    "dates": [
      "2025-01-02",
      "2025-01-03",
      "2025-01-04",
      "2025-01-05",
      "2025-01-06",
      "2025-01-07",
      "2025-01-08",
      "2025-01-09",
      "2025-01-10",
      "2025-01-11",
      "2025-01-12",
      "2025-01-13"
    ],
    "prices": [
      400.0,
      400.6,
      401.2,
      401.8,
      402.4,
      403.0,
      403.6,
      404.2,
      404.8,
      405.4,
      406.0,
      406.6
    ]
  },
  "statistics": {
    "current_ratio": 0.4779,
    "ratio_ma_50": 0.4612,
    "ratio_ma_200": 0.4521,
    "ratio_above_ma_50": true,
    "ratio_above_ma_200": true,
    "momentum_roc": 2.41,
    "momentum_direction": "UP",
    "relative_returns": {
      "1mo": {
        "return_a": 4.2,
        "return_b": 1.1,
        "differential": null
      },
      "3mo": {
        "return_a": 8.5,
        "return_b": 3.2,
        "differential": 5.3
      },
      "6mo": {
        "return_a": 12.0,
        "return_b": 10.4,
        "differential": 1.6
      }
    },
    "correlation": 0.8123,
    "hurst_exponent": 0.4321,
    "adf_pvalue": 0.0412,
    "is_stationary": true,
    "current_zscore": 1.27,
    "cointegration": {
      "p_value": 0.0831,
      "is_cointegrated": false
    }
  },
  "ratio": {
    "dates": [
      "2025-01-02",
      "2025-01-03",
      "2025-01-04",
      "2025-01-05",
      "2025-01-06",
      "2025-01-07",
      "2025-01-08",
      "2025-01-09",
      "2025-01-10",
      "2025-01-11",
      "2025-01-12",
      "2025-01-13"
    ],
    "values": [
      0.45,
      0.4526,
      0.4551,
      0.4577,
      0.4602,
      0.4628,
      0.4653,
      0.4678,
      0.4704,
      0.4729,
      0.4754,
      0.4779
    ],
    "ma_50": [
      null,
      null,
      null,
      null,
      0.46,
      0.46,
      0.46,
      0.46,
      0.46,
      0.46,
      0.46,
      0.46
    ],
    "ma_200": [
      null,
      null,
      null,
      null,
      null,
      null,
      null,
      null,
      null,
      null,
      null,
      null
    ]
  },
  "zscore": {
    "dates": [
      "2025-01-02",
      "2025-01-03",
      "2025-01-04",
      "2025-01-05",
      "2025-01-06",
      "2025-01-07",
      "2025-01-08",
      "2025-01-09",
      "2025-01-10",
      "2025-01-11",
      "2025-01-12",
      "2025-01-13"
    ],
    "values": [
      null,
      null,
      -0.6,
      -0.4,
      -0.2,
      0.0,
      0.2,
      0.4,
      0.6,
      0.8,
      1.0,
      1.2
    ]
  },
  "correlation_rolling": {
    "dates": [
      "2025-01-02",
      "2025-01-03",
      "2025-01-04",
      "2025-01-05",
      "2025-01-06",
      "2025-01-07",
      "2025-01-08",
      "2025-01-09",
      "2025-01-10",
      "2025-01-11",
      "2025-01-12",
      "2025-01-13"
    ],
    "values": [
      null,
      null,
      null,
      null,
      0.82,
      0.79,
      0.75,
      0.71,
      0.68,
      0.7,
      0.73,
      0.77
    ]
  },
  "returns": {
    "dates": [
      "2025-01-02",
      "2025-01-03",
      "2025-01-04",
      "2025-01-05",
      "2025-01-06",
      "2025-01-07",
      "2025-01-08",
      "2025-01-09",
      "2025-01-10",
      "2025-01-11",
      "2025-01-12",
      "2025-01-13"
    ],
    "returns_a": [
      0.0,
      0.7,
      1.4,
      2.1,
      2.8,
      3.5,
      4.2,
      4.9,
      5.6,
      6.3,
      7.0,
      7.7
    ],
    "returns_b": [
      0.0,
      0.15,
      0.3,
      0.45,
      0.6,
      0.75,
      0.9,
      1.05,
      1.2,
      1.35,
      1.5,
      1.65
    ]
  },
  "technicals": {
    "bollinger": {
      "upper": [
        null,
        null,
        null,
        0.47,
        0.47,
        0.47,
        0.47,
        0.47,
        0.47,
        0.47,
        0.47,
        0.47
      ],
      "middle": [
        null,
        null,
        null,
        0.46,
        0.46,
        0.46,
        0.46,
        0.46,
        0.46,
        0.46,
        0.46,
        0.46
      ],
      "lower": [
        null,
        null,
        null,
        0.45,
        0.45,
        0.45,
        0.45,
        0.45,
        0.45,
        0.45,
        0.45,
        0.45
      ]
    },
    "rsi": {
      "values": [
        null,
        null,
        null,
        52.5,
        54.0,
        55.5,
        57.0,
        58.5,
        60.0,
        61.5,
        63.0,
        64.5
      ]
    },
    "macd": {
      "macd_line": [
        null,
        null,
        0.002,
        0.003,
        0.004,
        0.005,
        0.006,
        0.007,
        0.008,
        0.009000000000000001,
        0.01,
        0.011
      ],
      "signal_line": [
        null,
        null,
        0.0016,
        0.0024000000000000002,
        0.0032,
        0.004,
        0.0048000000000000004,
        0.0056,
        0.0064,
        0.007200000000000001,
        0.008,
        0.0088
      ],
      "histogram": [
        null,
        null,
        -0.0006,
        -0.0004,
        -0.0002,
        0.0,
        0.0002,
        0.0004,
        0.0006,
        0.0008,
        0.001,
        0.0012
      ]
    },
    "confirmation": {
      "direction": "FAVORS_A",
      "signals": [
        "RSI bullish (61.5)",
        "MACD histogram positive",
        "Ratio inside Bollinger bands"
      ],
      "rsi_value": 61.5,
      "macd_hist": 0.0012,
      "favors_a_count": 2,
      "favors_b_count": 0
    }
  },
  "individual_rsi": {
    "rsi_a": [
      null,
      null,
      null,
      55.0,
      55.0,
      55.0,
      55.0,
      55.0,
      55.0,
      55.0,
      55.0,
      55.0
    ],
    "rsi_b": [
      null,
      null,
      null,
      47.0,
      47.0,
      47.0,
      47.0,
      47.0,
      47.0,
      47.0,
      47.0,
      47.0
    ]
  },
  "signal": {
    "direction": "FAVOR_A",
    "conviction": 64,
    "strength": 1.27,
    "detail": "Z-score 1.27 above mean; momentum UP"
  },
  "ai_recommendation": {
    "signal": "FAVOR_A",
    "conviction": 70,
    "recommendation": "AAPL shows stronger relative momentum against MSFT.",
    "risk_factors": [
      "Earnings next week",
      "High sector correlation"
    ],
    "available": true,
    "model_used": "gpt-4o-mini"
  },
  "combined": {
    "direction": "FAVOR_A",
    "conviction": 66,
    "detail": "Stats and AI agree on AAPL",
    "stat_pct": 64,
    "ai_conviction": 70,
    "tech_confirms": true
  }
}"##;

pub fn sample_result() -> AnalysisResult {
    serde_json::from_str(SAMPLE_PAYLOAD).unwrap()
}

// ── Recording view ────────────────────────────────────────────────────────────

/// Records everything applied to it. Mounting a second live chart on a canvas
/// key panics.
#[derive(Debug, Default)]
pub struct RecordingView {
    next_id: u64,
    live: HashMap<ChartInstanceId, ChartKey>,
    pub mounted: Vec<ChartKey>,
    pub unmounted: Vec<ChartInstanceId>,
    pub stats: Vec<StatMetric>,
    pub badges: Vec<SignalBadge>,
    pub banner: Option<SignalBanner>,
    pub ai: Option<AiPanel>,
    pub forms: Vec<FormState>,
    pub history: Vec<HistoryRow>,
    pub dropdowns: HashMap<TickerInput, DropdownView>,
    pub inputs: HashMap<TickerInput, String>,
}

impl RecordingView {
    pub fn live_on(&self, key: ChartKey) -> usize {
        self.live.values().filter(|k| **k == key).count()
    }

    pub fn live_total(&self) -> usize {
        self.live.len()
    }

    pub fn last_form(&self) -> Option<&FormState> {
        self.forms.last()
    }
}

impl DashboardView for RecordingView {
    fn mount_chart(&mut self, chart: &ChartDescriptor) -> ChartInstanceId {
        assert_eq!(self.live_on(chart.key), 0, "canvas {:?} already bound", chart.key);
        self.next_id += 1;
        let id = ChartInstanceId(self.next_id);
        self.live.insert(id, chart.key);
        self.mounted.push(chart.key);
        id
    }

    fn unmount_chart(&mut self, id: ChartInstanceId) {
        assert!(self.live.remove(&id).is_some(), "unknown chart {:?}", id);
        self.unmounted.push(id);
    }

    fn apply_stats(&mut self, rows: &[StatMetric]) {
        self.stats = rows.to_vec();
    }

    fn apply_badges(&mut self, badges: &[SignalBadge]) {
        self.badges = badges.to_vec();
    }

    fn apply_banner(&mut self, banner: &SignalBanner) {
        self.banner = Some(banner.clone());
    }

    fn apply_ai(&mut self, panel: &AiPanel) {
        self.ai = Some(panel.clone());
    }

    fn apply_form(&mut self, form: &FormState) {
        self.forms.push(form.clone());
    }

    fn apply_history(&mut self, rows: &[HistoryRow]) {
        self.history = rows.to_vec();
    }

    fn apply_dropdown(&mut self, input: TickerInput, dropdown: &DropdownView) {
        self.dropdowns.insert(input, dropdown.clone());
    }

    fn set_input_value(&mut self, input: TickerInput, value: &str) {
        self.inputs.insert(input, value.to_string());
    }
}

// ── Fake service ──────────────────────────────────────────────────────────────

pub struct FakeService {
    analysis: Result<AnalysisResult, DashboardError>,
    matches: Vec<SymbolMatch>,
    search_error: Option<String>,
    gate: Option<Arc<Notify>>,
    analyze_calls: AtomicUsize,
    requests: Mutex<Vec<AnalysisRequest>>,
    queries: Mutex<Vec<String>>,
}

impl FakeService {
    pub fn ok() -> Self {
        Self::with_analysis(Ok(sample_result()))
    }

    pub fn failing(err: DashboardError) -> Self {
        Self::with_analysis(Err(err))
    }

    fn with_analysis(analysis: Result<AnalysisResult, DashboardError>) -> Self {
        Self {
            analysis,
            matches: Vec::new(),
            search_error: None,
            gate: None,
            analyze_calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn with_matches(mut self, symbols: &[&str]) -> Self {
        self.matches = symbols
            .iter()
            .map(|s| SymbolMatch {
                symbol: s.to_string(),
                name: format!("{} Corp", s),
                exchange: Some("NMS".into()),
                kind: Some("EQUITY".into()),
            })
            .collect();
        self
    }

    pub fn with_search_error(mut self, message: &str) -> Self {
        self.search_error = Some(message.to_string());
        self
    }

    /// Hold every analysis request until the gate is notified.
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn analyze_calls(&self) -> usize {
        self.analyze_calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<AnalysisRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnalysisService for FakeService {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, DashboardError> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.analysis.clone()
    }

    async fn search(&self, query: &str) -> Result<Vec<SymbolMatch>, DashboardError> {
        self.queries.lock().unwrap().push(query.to_string());
        match &self.search_error {
            Some(message) => Err(DashboardError::Search(message.clone())),
            None => Ok(self.matches.clone()),
        }
    }
}
