//! Chart descriptors: what series and encodings each canvas receives.
//! The charting backend only draws what is described here.

use serde::Serialize;

use crate::config::ChartsConfig;
use crate::formatting::thin_indices;
use crate::models::{
    AnalysisResult, Bollinger, IndividualRsi, Macd, PriceSeries, RatioSeries, ReturnsSeries,
    Series, ValueSeries,
};

// ── Palette ───────────────────────────────────────────────────────────────────

pub const COLOR_A: &str = "#3b82f6";
pub const COLOR_B: &str = "#f59e0b";
pub const COLOR_RATIO: &str = "#a855f7";
pub const COLOR_MA_50: &str = "#22d3ee";
pub const COLOR_MA_200: &str = "#f472b6";
pub const COLOR_BAND: &str = "#94a3b8";
pub const COLOR_UP: &str = "#22c55e";
pub const COLOR_DOWN: &str = "#ef4444";
pub const COLOR_NEUTRAL: &str = "#64748b";
pub const COLOR_GRID: &str = "#475569";

// ── Descriptor types ──────────────────────────────────────────────────────────

/// Canvas a chart is bound to. At most one live chart per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ChartKey {
    PriceA,
    PriceB,
    Ratio,
    Returns,
    ZScore,
    Correlation,
    Rsi,
    Macd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SeriesKind {
    Line,
    Bar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Fill {
    None,
    /// Area between the line and the axis origin.
    Origin,
    /// Area between this dataset and the one drawn before it.
    Previous,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub label: String,
    pub kind: SeriesKind,
    pub values: Series,
    pub color: String,
    pub fill: Fill,
    pub dashed: bool,
    pub line_width: f32,
    /// Per-point colors (bar series only).
    pub point_colors: Option<Vec<String>>,
}

impl Dataset {
    fn line(label: impl Into<String>, values: &Series, color: &str) -> Self {
        Self {
            label: label.into(),
            kind: SeriesKind::Line,
            values: values.clone(),
            color: color.to_string(),
            fill: Fill::None,
            dashed: false,
            line_width: 2.0,
            point_colors: None,
        }
    }

    fn filled(mut self, fill: Fill) -> Self {
        self.fill = fill;
        self
    }

    fn dashed(mut self) -> Self {
        self.dashed = true;
        self.line_width = 1.5;
        self
    }

    fn thin(mut self) -> Self {
        self.line_width = 1.0;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceLine {
    pub value: f64,
    pub label: Option<String>,
    pub color: String,
    pub dashed: bool,
}

impl ReferenceLine {
    fn new(value: f64, label: Option<&str>, color: &str) -> Self {
        Self {
            value,
            label: label.map(str::to_string),
            color: color.to_string(),
            dashed: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct YAxis {
    /// `None` means auto-scaled.
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub tick_suffix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDescriptor {
    pub key: ChartKey,
    pub title: String,
    /// Full x-axis, one label per data point.
    pub labels: Vec<String>,
    /// Positions in `labels` shown on the axis; all points are still plotted.
    pub tick_indices: Vec<usize>,
    /// Drawn in order; earlier datasets sit behind later ones.
    pub datasets: Vec<Dataset>,
    pub reference_lines: Vec<ReferenceLine>,
    pub y_axis: YAxis,
}

impl ChartDescriptor {
    fn new(key: ChartKey, title: impl Into<String>, dates: &[String], max_labels: usize) -> Self {
        Self {
            key,
            title: title.into(),
            labels: dates.to_vec(),
            tick_indices: thin_indices(dates.len(), max_labels),
            datasets: Vec::new(),
            reference_lines: Vec::new(),
            y_axis: YAxis::default(),
        }
    }

    pub fn visible_labels(&self) -> Vec<&str> {
        self.tick_indices
            .iter()
            .filter_map(|&i| self.labels.get(i).map(String::as_str))
            .collect()
    }

    pub fn dataset(&self, label: &str) -> Option<&Dataset> {
        self.datasets.iter().find(|d| d.label == label)
    }
}

// ── Builders ──────────────────────────────────────────────────────────────────

pub fn price_chart(key: ChartKey, series: &PriceSeries, color: &str, max_labels: usize) -> ChartDescriptor {
    let title = if series.name.is_empty() || series.name == series.symbol {
        series.symbol.clone()
    } else {
        format!("{} ({})", series.symbol, series.name)
    };
    let mut chart = ChartDescriptor::new(key, title, &series.dates, max_labels);
    chart
        .datasets
        .push(Dataset::line(series.symbol.clone(), &series.prices, color).filled(Fill::Origin));
    chart
}

pub fn ratio_chart(
    ratio: &RatioSeries,
    bollinger: Option<&Bollinger>,
    title: &str,
    max_labels: usize,
) -> ChartDescriptor {
    let mut chart = ChartDescriptor::new(ChartKey::Ratio, title, &ratio.dates, max_labels);
    chart.datasets.push(Dataset::line("Ratio", &ratio.values, COLOR_RATIO));
    chart.datasets.push(Dataset::line("50d MA", &ratio.ma_50, COLOR_MA_50).dashed());
    chart.datasets.push(Dataset::line("200d MA", &ratio.ma_200, COLOR_MA_200).dashed());

    if let Some(bb) = bollinger {
        chart.datasets.push(Dataset::line("BB Upper", &bb.upper, COLOR_BAND).thin());
        chart
            .datasets
            .push(Dataset::line("BB Lower", &bb.lower, COLOR_BAND).thin().filled(Fill::Previous));
    }
    chart
}

pub fn returns_chart(
    returns: &ReturnsSeries,
    symbol_a: &str,
    symbol_b: &str,
    max_labels: usize,
) -> ChartDescriptor {
    let mut chart =
        ChartDescriptor::new(ChartKey::Returns, "Cumulative Returns", &returns.dates, max_labels);
    chart
        .datasets
        .push(Dataset::line(symbol_a, &returns.returns_a, COLOR_A).filled(Fill::Origin));
    chart
        .datasets
        .push(Dataset::line(symbol_b, &returns.returns_b, COLOR_B).filled(Fill::Origin));
    chart.reference_lines.push(ReferenceLine::new(0.0, None, COLOR_GRID));
    chart.y_axis.tick_suffix = Some("%".to_string());
    chart
}

pub fn zscore_chart(zscore: &ValueSeries, max_labels: usize) -> ChartDescriptor {
    let mut chart = ChartDescriptor::new(ChartKey::ZScore, "Ratio Z-Score", &zscore.dates, max_labels);
    chart.datasets.push(Dataset::line("Z-Score", &zscore.values, COLOR_RATIO));
    chart.reference_lines = vec![
        ReferenceLine::new(-2.0, Some("−2σ"), COLOR_DOWN),
        ReferenceLine::new(-1.0, None, COLOR_GRID),
        ReferenceLine::new(0.0, None, COLOR_GRID),
        ReferenceLine::new(1.0, None, COLOR_GRID),
        ReferenceLine::new(2.0, Some("+2σ"), COLOR_UP),
    ];
    chart
}

/// Rolling Pearson correlation of the two price series, fixed to [-1, 1].
pub fn correlation_chart(correlation: &ValueSeries, max_labels: usize) -> ChartDescriptor {
    let mut chart = ChartDescriptor::new(ChartKey::Correlation, "Rolling Correlation (60d)", &correlation.dates, max_labels);
    chart.datasets.push(Dataset::line("Correlation", &correlation.values, COLOR_RATIO));
    chart.reference_lines.push(ReferenceLine::new(0.0, None, COLOR_GRID));
    chart.y_axis.min = Some(-1.0);
    chart.y_axis.max = Some(1.0);
    chart
}

pub fn rsi_chart(
    dates: &[String],
    rsi: &Series,
    individual: Option<&IndividualRsi>,
    symbols: (&str, &str),
    max_labels: usize,
) -> ChartDescriptor {
    let mut chart = ChartDescriptor::new(ChartKey::Rsi, "Ratio RSI (14)", dates, max_labels);
    chart.datasets.push(Dataset::line("RSI", rsi, COLOR_RATIO));
    if let Some(ind) = individual {
        chart
            .datasets
            .push(Dataset::line(format!("{} RSI", symbols.0), &ind.rsi_a, COLOR_A).thin());
        chart
            .datasets
            .push(Dataset::line(format!("{} RSI", symbols.1), &ind.rsi_b, COLOR_B).thin());
    }
    chart.reference_lines = vec![
        ReferenceLine::new(30.0, Some("Oversold"), COLOR_UP),
        ReferenceLine::new(50.0, None, COLOR_GRID),
        ReferenceLine::new(70.0, Some("Overbought"), COLOR_DOWN),
    ];
    chart.y_axis.min = Some(0.0);
    chart.y_axis.max = Some(100.0);
    chart
}

/// Bar color for one histogram value: up, down, or neutral for a gap.
pub fn histogram_color(value: Option<f64>) -> &'static str {
    match value {
        Some(v) if v >= 0.0 => COLOR_UP,
        Some(_) => COLOR_DOWN,
        None => COLOR_NEUTRAL,
    }
}

pub fn macd_chart(dates: &[String], macd: &Macd, max_labels: usize) -> ChartDescriptor {
    let mut chart = ChartDescriptor::new(ChartKey::Macd, "Ratio MACD (12, 26, 9)", dates, max_labels);

    let colors = macd
        .histogram
        .iter()
        .map(|v| histogram_color(*v).to_string())
        .collect();
    // bars first so the lines draw over them
    chart.datasets.push(Dataset {
        label: "Histogram".to_string(),
        kind: SeriesKind::Bar,
        values: macd.histogram.clone(),
        color: COLOR_NEUTRAL.to_string(),
        fill: Fill::None,
        dashed: false,
        line_width: 0.0,
        point_colors: Some(colors),
    });
    chart.datasets.push(Dataset::line("MACD", &macd.macd_line, COLOR_A).thin());
    chart.datasets.push(Dataset::line("Signal", &macd.signal_line, COLOR_B).thin());
    chart
}

/// Every chart for one payload, in canvas order. RSI and MACD need the
/// technicals block and are skipped without it.
pub fn build_all(result: &AnalysisResult, limits: &ChartsConfig) -> Vec<ChartDescriptor> {
    let sym_a = result.ticker_a.symbol.as_str();
    let sym_b = result.ticker_b.symbol.as_str();
    let technicals = result.technicals.as_ref();

    let mut charts = vec![
        price_chart(ChartKey::PriceA, &result.ticker_a, COLOR_A, limits.price_label_count),
        price_chart(ChartKey::PriceB, &result.ticker_b, COLOR_B, limits.price_label_count),
        ratio_chart(
            &result.ratio,
            technicals.and_then(|t| t.bollinger.as_ref()),
            &format!("{} / {} Ratio", sym_a, sym_b),
            limits.ratio_label_count,
        ),
        returns_chart(&result.returns, sym_a, sym_b, limits.series_label_count),
        zscore_chart(&result.zscore, limits.series_label_count),
    ];

    if let Some(corr) = &result.correlation_rolling {
        charts.push(correlation_chart(corr, limits.series_label_count));
    }

    if let Some(t) = technicals {
        charts.push(rsi_chart(
            &result.ratio.dates,
            &t.rsi.values,
            result.individual_rsi.as_ref(),
            (sym_a, sym_b),
            limits.series_label_count,
        ));
        charts.push(macd_chart(&result.ratio.dates, &t.macd, limits.series_label_count));
    }

    charts
}

// ── Tests ─────────────────────────────────────────────────────────────────────
