//! Pure display helpers: number formatting, directional polarity and
//! axis-label thinning. No state.

use serde::Serialize;

pub const MISSING: &str = "N/A";

// ── Polarity ──────────────────────────────────────────────────────────────────

/// Which side a displayed fact favors. `Good` favors ticker A (green),
/// `Bad` favors ticker B (red).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Good,
    Bad,
    #[default]
    Neutral,
}

impl Polarity {
    /// Sign of a number; zero and missing are neutral.
    pub fn from_sign(v: Option<f64>) -> Self {
        match v {
            Some(x) if x > 0.0 => Polarity::Good,
            Some(x) if x < 0.0 => Polarity::Bad,
            _ => Polarity::Neutral,
        }
    }

    pub fn from_flag(v: Option<bool>) -> Self {
        match v {
            Some(true) => Polarity::Good,
            Some(false) => Polarity::Bad,
            None => Polarity::Neutral,
        }
    }
}

// ── Numbers ───────────────────────────────────────────────────────────────────

/// `1.23456, 4` → "1.2346" | `None` → "N/A"
pub fn fmt_fixed(v: Option<f64>, decimals: usize) -> String {
    match v {
        Some(x) if x.is_finite() => format!("{:.*}", decimals, x),
        _ => MISSING.to_string(),
    }
}

/// `2.1, 1` → "+2.1%" | `-0.5, 2` → "-0.50%"
pub fn fmt_signed_pct(v: Option<f64>, decimals: usize) -> String {
    match v {
        Some(x) if x.is_finite() => format!("{:+.*}%", decimals, x),
        _ => MISSING.to_string(),
    }
}

pub fn fmt_flag(v: Option<bool>, yes: &str, no: &str) -> String {
    match v {
        Some(true) => yes.to_string(),
        Some(false) => no.to_string(),
        None => MISSING.to_string(),
    }
}

/// Conviction as a whole percentage, clamped to 0–100.
pub fn fmt_percent(v: f64) -> String {
    format!("{}%", v.clamp(0.0, 100.0).round() as i64)
}

// ── Axis labels ───────────────────────────────────────────────────────────────

/// Indices of the axis labels to keep so at most `max_labels` remain.
/// `len <= max_labels` keeps everything; otherwise every `ceil(len / max_labels)`-th
/// label starting at 0.
pub fn thin_indices(len: usize, max_labels: usize) -> Vec<usize> {
    if len <= max_labels || max_labels == 0 {
        return (0..len).collect();
    }
    let step = len.div_ceil(max_labels);
    (0..len).step_by(step).collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
