//! Conviction → wording and color tiers. Shared by the live banner and the
//! history rows.

use serde::Serialize;

use crate::formatting::Polarity;
use crate::models::SignalDirection;

pub const STRONG_THRESHOLD: f64 = 75.0;
pub const FAVOR_THRESHOLD: f64 = 55.0;

/// Convictions written before the 0–100 scale used 1–5.
const LEGACY_SCALE_MAX: f64 = 5.0;
const LEGACY_SCALE_FACTOR: f64 = 20.0;

// ── Wording tier ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Strength {
    Strong,
    Moderate,
    Weak,
}

impl Strength {
    pub fn from_conviction(conviction: f64) -> Self {
        if conviction >= STRONG_THRESHOLD {
            Strength::Strong
        } else if conviction >= FAVOR_THRESHOLD {
            Strength::Moderate
        } else {
            Strength::Weak
        }
    }

    pub fn prefix(&self) -> Option<&'static str> {
        match self {
            Strength::Strong => Some("STRONGLY FAVORS"),
            Strength::Moderate => Some("FAVORS"),
            Strength::Weak => None,
        }
    }
}

// ── Meter tier ────────────────────────────────────────────────────────────────

/// Five-step color ladder for the conviction meter, reddest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum MeterTier {
    VeryLow,
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl MeterTier {
    pub fn from_conviction(conviction: f64) -> Self {
        if conviction <= 20.0 {
            MeterTier::VeryLow
        } else if conviction <= 40.0 {
            MeterTier::Low
        } else if conviction <= 60.0 {
            MeterTier::Moderate
        } else if conviction <= 80.0 {
            MeterTier::High
        } else {
            MeterTier::VeryHigh
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            MeterTier::VeryLow => "#ef4444",
            MeterTier::Low => "#f97316",
            MeterTier::Moderate => "#eab308",
            MeterTier::High => "#84cc16",
            MeterTier::VeryHigh => "#22c55e",
        }
    }
}

// ── Classification ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalClass {
    /// "STRONGLY FAVORS AAPL", "FAVORS MSFT" or "NEUTRAL".
    pub label: String,
    /// Direction after conviction gating; weak signals are neutral.
    pub effective: SignalDirection,
    pub strength: Strength,
    pub polarity: Polarity,
    pub conviction: f64,
    /// Meter fill width in percent.
    pub meter_width: f64,
    pub meter: MeterTier,
}

pub struct SignalClassifier;

impl SignalClassifier {
    /// Conviction gates the wording: below 55 the signal reads NEUTRAL even
    /// when a direction is reported.
    pub fn classify(
        direction: SignalDirection,
        conviction: f64,
        ticker_a: &str,
        ticker_b: &str,
    ) -> SignalClass {
        let conviction = if conviction.is_finite() { conviction } else { 0.0 };
        let strength = Strength::from_conviction(conviction);

        let (label, effective) = match (strength.prefix(), direction) {
            (Some(prefix), SignalDirection::FavorA) => {
                (format!("{} {}", prefix, ticker_a), SignalDirection::FavorA)
            }
            (Some(prefix), SignalDirection::FavorB) => {
                (format!("{} {}", prefix, ticker_b), SignalDirection::FavorB)
            }
            _ => ("NEUTRAL".to_string(), SignalDirection::Neutral),
        };

        let polarity = match effective {
            SignalDirection::FavorA => Polarity::Good,
            SignalDirection::FavorB => Polarity::Bad,
            SignalDirection::Neutral => Polarity::Neutral,
        };

        SignalClass {
            label,
            effective,
            strength,
            polarity,
            conviction,
            meter_width: conviction.clamp(0.0, 100.0),
            meter: MeterTier::from_conviction(conviction),
        }
    }

    /// Legacy records stored conviction on a 1–5 scale; `(0, 5]` is scaled ×20.
    pub fn normalise_conviction(stored: f64) -> f64 {
        if stored > 0.0 && stored <= LEGACY_SCALE_MAX {
            stored * LEGACY_SCALE_FACTOR
        } else {
            stored
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
