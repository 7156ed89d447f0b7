//! Statistics grid: ordered, display-only metrics with directional coloring.

use serde::Serialize;

use crate::formatting::{fmt_fixed, fmt_flag, fmt_signed_pct, Polarity, MISSING};
use crate::models::{RelativeReturn, Statistics};

/// Return-differential periods, most preferred first.
pub const RETURN_PERIODS: [&str; 3] = ["1mo", "3mo", "6mo"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatMetric {
    pub label: String,
    pub value: String,
    pub polarity: Polarity,
    pub tooltip: String,
}

impl StatMetric {
    fn new(label: impl Into<String>, value: String, polarity: Polarity, tooltip: &str) -> Self {
        Self {
            label: label.into(),
            value,
            polarity,
            tooltip: tooltip.to_string(),
        }
    }

    fn context(label: impl Into<String>, value: String, tooltip: &str) -> Self {
        Self::new(label, value, Polarity::Neutral, tooltip)
    }
}

fn period_label(period: &str) -> &str {
    match period {
        "1mo" => "1M",
        "3mo" => "3M",
        "6mo" => "6M",
        other => other,
    }
}

/// First period in [`RETURN_PERIODS`] whose differential is present.
pub fn preferred_differential(stats: &Statistics) -> Option<(&'static str, f64)> {
    RETURN_PERIODS.iter().find_map(|&p| {
        stats
            .relative_returns
            .get(p)
            .and_then(|r| r.differential)
            .map(|d| (p, d))
    })
}

fn ma_flag(label: &str, above: Option<bool>, tooltip: &str) -> StatMetric {
    StatMetric::new(
        label,
        fmt_flag(above, "Above ↑", "Below ↓"),
        Polarity::from_flag(above),
        tooltip,
    )
}

fn momentum_direction(direction: Option<&str>) -> StatMetric {
    let polarity = match direction {
        Some("UP") => Polarity::Good,
        Some("DOWN") => Polarity::Bad,
        _ => Polarity::Neutral,
    };
    StatMetric::new(
        "Momentum",
        direction.unwrap_or(MISSING).to_string(),
        polarity,
        "Slope of the ratio over the momentum window",
    )
}

pub fn build_stats(stats: &Statistics, symbol_a: &str, symbol_b: &str) -> Vec<StatMetric> {
    let mut rows = vec![
        StatMetric::context("Current Ratio", fmt_fixed(stats.current_ratio, 4), "Price of A divided by price of B"),
        StatMetric::context("50d MA", fmt_fixed(stats.ratio_ma_50, 4), "50-day moving average of the ratio"),
        StatMetric::context("200d MA", fmt_fixed(stats.ratio_ma_200, 4), "200-day moving average of the ratio"),
        ma_flag("vs 50d MA", stats.ratio_above_ma_50, "Ratio above its 50-day average favors A"),
        ma_flag("vs 200d MA", stats.ratio_above_ma_200, "Ratio above its 200-day average favors A"),
        StatMetric::new(
            "Momentum ROC",
            fmt_signed_pct(stats.momentum_roc, 2),
            Polarity::from_sign(stats.momentum_roc),
            "Rate of change of the ratio; positive favors A",
        ),
        momentum_direction(stats.momentum_direction.as_deref()),
    ];

    rows.push(match preferred_differential(stats) {
        Some((period, diff)) => StatMetric::new(
            format!("Return Diff ({})", period_label(period)),
            fmt_signed_pct(Some(diff), 1),
            Polarity::from_sign(Some(diff)),
            "Return of A minus return of B",
        ),
        None => StatMetric::context("Return Diff", MISSING.to_string(), "Return of A minus return of B"),
    });

    rows.extend([
        StatMetric::context("Correlation", fmt_fixed(stats.correlation, 4), "Pearson correlation of prices"),
        StatMetric::context("Z-Score", fmt_fixed(stats.current_zscore, 2), "Distance of the ratio from its rolling mean"),
        StatMetric::context("Hurst Exponent", fmt_fixed(stats.hurst_exponent, 4), "Above 0.5 trends, below 0.5 mean-reverts"),
        StatMetric::context("ADF p-value", fmt_fixed(stats.adf_pvalue, 4), "Above 0.05: ratio is non-stationary"),
        StatMetric::context(
            "Cointegration p",
            fmt_fixed(stats.cointegration.as_ref().and_then(|c| c.p_value), 4),
            "Engle-Granger cointegration test",
        ),
    ]);

    let empty = RelativeReturn::default();
    for period in RETURN_PERIODS {
        let r = stats.relative_returns.get(period).unwrap_or(&empty);
        let label = period_label(period);
        rows.push(StatMetric::context(
            format!("{} {} Return", symbol_a, label),
            fmt_signed_pct(r.return_a, 1),
            "Needs comparison with the other side",
        ));
        rows.push(StatMetric::context(
            format!("{} {} Return", symbol_b, label),
            fmt_signed_pct(r.return_b, 1),
            "Needs comparison with the other side",
        ));
    }

    rows
}

// ── Tests ─────────────────────────────────────────────────────────────────────
