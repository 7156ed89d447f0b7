//! Technical-signal badges, signal banner and AI recommendation panel.

use serde::Serialize;

use crate::formatting::{fmt_fixed, fmt_percent, Polarity};
use crate::models::{AiRecommendation, AnalysisResult, Confirmation, SignalDirection};
use crate::signal::{SignalClass, SignalClassifier};

pub const AI_PLACEHOLDER: &str = "No AI recommendation available for this analysis.";

const FAVORS_A_KEYWORDS: [&str; 4] = ["positive", "strong", "bullish", "above upper"];
const FAVORS_B_KEYWORDS: [&str; 4] = ["negative", "weak", "bearish", "below lower"];

// ── Badges ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalBadge {
    pub text: String,
    pub polarity: Polarity,
    /// Overall-direction badge vs. one individual signal.
    pub overall: bool,
}

/// Keyword heuristic on free-form signal text. Favors-B keywords are checked
/// first, so "strongly negative" reads as favoring B.
pub fn badge_polarity(text: &str) -> Polarity {
    let lower = text.to_lowercase();
    if FAVORS_B_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Polarity::Bad
    } else if FAVORS_A_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Polarity::Good
    } else {
        Polarity::Neutral
    }
}

pub fn build_badges(confirmation: &Confirmation, symbol_a: &str, symbol_b: &str) -> Vec<SignalBadge> {
    let (wording, polarity) = match confirmation.direction.as_str() {
        "FAVORS_A" => (format!("Technicals favor {}", symbol_a), Polarity::Good),
        "FAVORS_B" => (format!("Technicals favor {}", symbol_b), Polarity::Bad),
        _ => ("Technicals neutral".to_string(), Polarity::Neutral),
    };

    let mut detail = Vec::new();
    if let Some(rsi) = confirmation.rsi_value {
        detail.push(format!("RSI {}", fmt_fixed(Some(rsi), 1)));
    }
    if let Some(hist) = confirmation.macd_hist {
        detail.push(format!("MACD hist {}", fmt_fixed(Some(hist), 4)));
    }
    let text = if detail.is_empty() {
        wording
    } else {
        format!("{} ({})", wording, detail.join(", "))
    };

    let mut badges = vec![SignalBadge { text, polarity, overall: true }];
    badges.extend(confirmation.signals.iter().map(|s| SignalBadge {
        text: s.clone(),
        polarity: badge_polarity(s),
        overall: false,
    }));
    badges
}

// ── Banner ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalBanner {
    pub class: SignalClass,
    pub conviction_text: String,
    pub detail: Option<String>,
    /// "Stats 64% · AI 70%" when the service reports the split.
    pub breakdown: Option<String>,
    pub tech_confirms: Option<bool>,
}

pub fn build_banner(result: &AnalysisResult) -> SignalBanner {
    let (direction, conviction) = result.verdict();
    let class = SignalClassifier::classify(
        direction,
        conviction,
        &result.ticker_a.symbol,
        &result.ticker_b.symbol,
    );

    let combined = result.combined.as_ref();
    let breakdown = combined.and_then(|c| match (c.stat_pct, c.ai_conviction) {
        (Some(s), Some(a)) if a > 0.0 => Some(format!("Stats {} · AI {}", fmt_percent(s), fmt_percent(a))),
        (Some(s), _) => Some(format!("Stats {}", fmt_percent(s))),
        _ => None,
    });

    SignalBanner {
        conviction_text: fmt_percent(class.conviction),
        class,
        detail: result.signal_detail().map(str::to_string),
        breakdown,
        tech_confirms: combined.and_then(|c| c.tech_confirms),
    }
}

// ── AI panel ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AiPanel {
    pub recommendation: String,
    /// `None` hides the risk section entirely.
    pub risks: Option<Vec<String>>,
    /// The model's own call, e.g. "AI: FAVORS AAPL (70%)".
    pub verdict: Option<String>,
    pub model: Option<String>,
}

pub fn build_ai_panel(ai: Option<&AiRecommendation>, symbol_a: &str, symbol_b: &str) -> AiPanel {
    let Some(ai) = ai else {
        return AiPanel {
            recommendation: AI_PLACEHOLDER.to_string(),
            risks: None,
            verdict: None,
            model: None,
        };
    };

    let recommendation = ai
        .recommendation
        .clone()
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| AI_PLACEHOLDER.to_string());

    let verdict = match (ai.available, ai.signal.as_deref(), ai.conviction) {
        (true, Some(signal), Some(conv)) if conv > 0.0 => {
            let class = SignalClassifier::classify(SignalDirection::from(signal), conv, symbol_a, symbol_b);
            Some(format!("AI: {} ({})", class.label, fmt_percent(conv)))
        }
        _ => None,
    };

    AiPanel {
        recommendation,
        risks: if ai.risk_factors.is_empty() { None } else { Some(ai.risk_factors.clone()) },
        verdict,
        model: ai.model_used.clone(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
