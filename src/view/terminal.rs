//! Plain-text binding of [`DashboardView`] for the command line.

use std::collections::BTreeMap;

use crate::autocomplete::{DropdownView, TickerInput};
use crate::formatting::Polarity;
use crate::history::HistoryRow;
use crate::orchestrator::FormState;
use crate::render::charts::{ChartDescriptor, ChartKey, SeriesKind};
use crate::render::panels::{AiPanel, SignalBadge, SignalBanner};
use crate::render::stats::StatMetric;
use crate::view::{ChartInstanceId, DashboardView};

const RULE: &str = "─────────────────────────────────────────────────────────";
const SPARK_WIDTH: usize = 48;
const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

fn marker(polarity: Polarity) -> &'static str {
    match polarity {
        Polarity::Good => "▲",
        Polarity::Bad => "▼",
        Polarity::Neutral => "·",
    }
}

/// One-line sketch of a series, at most `width` cells; gaps stay blank.
pub fn sparkline(values: &[Option<f64>], width: usize) -> String {
    if values.is_empty() || width == 0 {
        return String::new();
    }
    let step = values.len().div_ceil(width);
    let sampled: Vec<Option<f64>> = values.iter().step_by(step).copied().collect();

    let finite = sampled.iter().flatten().filter(|v| v.is_finite());
    let (lo, hi) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    let span = hi - lo;

    sampled
        .iter()
        .map(|v| match v {
            Some(x) if x.is_finite() => {
                let level = if span > 0.0 { ((x - lo) / span * 7.0).round() as usize } else { 3 };
                SPARK_LEVELS[level.min(7)]
            }
            _ => ' ',
        })
        .collect()
}

#[derive(Debug, Default)]
pub struct TerminalView {
    next_id: u64,
    live: BTreeMap<u64, ChartKey>,
}

impl TerminalView {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn live_charts(&self) -> usize {
        self.live.len()
    }
}

impl DashboardView for TerminalView {
    fn mount_chart(&mut self, chart: &ChartDescriptor) -> ChartInstanceId {
        self.next_id += 1;
        self.live.insert(self.next_id, chart.key);

        println!("{}", RULE);
        println!("  {}", chart.title);
        for ds in &chart.datasets {
            let last = ds.values.iter().rev().flatten().next();
            let tag = match ds.kind {
                SeriesKind::Bar => "bars",
                SeriesKind::Line if ds.dashed => "dash",
                SeriesKind::Line => "line",
            };
            println!(
                "  {:<14} {} {} last {}",
                ds.label,
                tag,
                sparkline(&ds.values, SPARK_WIDTH),
                last.map(|v| format!("{:.4}", v)).unwrap_or_else(|| "—".into())
            );
        }
        let refs: Vec<String> = chart
            .reference_lines
            .iter()
            .map(|r| match &r.label {
                Some(label) => format!("{} {}", r.value, label),
                None => r.value.to_string(),
            })
            .collect();
        if !refs.is_empty() {
            println!("  ref: {}", refs.join(" | "));
        }
        let axis = chart.visible_labels();
        if let (Some(first), Some(last)) = (axis.first(), axis.last()) {
            println!("  x: {} … {} ({} ticks)", first, last, axis.len());
        }
        ChartInstanceId(self.next_id)
    }

    fn unmount_chart(&mut self, id: ChartInstanceId) {
        self.live.remove(&id.0);
    }

    fn apply_stats(&mut self, rows: &[StatMetric]) {
        println!("{}", RULE);
        println!("  Statistics");
        println!("{}", RULE);
        for row in rows {
            println!("  {} {:<22}: {}", marker(row.polarity), row.label, row.value);
        }
    }

    fn apply_badges(&mut self, badges: &[SignalBadge]) {
        if badges.is_empty() {
            return;
        }
        println!("{}", RULE);
        for badge in badges {
            let indent = if badge.overall { "" } else { "  " };
            println!("  {}{} {}", indent, marker(badge.polarity), badge.text);
        }
    }

    fn apply_banner(&mut self, banner: &SignalBanner) {
        let filled = (banner.class.meter_width / 5.0).round() as usize;
        println!("{}", RULE);
        println!("  {} {}  ({})", marker(banner.class.polarity), banner.class.label, banner.conviction_text);
        println!("  [{:<20}] {}", "█".repeat(filled.min(20)), banner.class.meter.color());
        if let Some(breakdown) = &banner.breakdown {
            let confirm = match banner.tech_confirms {
                Some(true) => " · technicals confirm",
                _ => "",
            };
            println!("  {}{}", breakdown, confirm);
        }
        if let Some(detail) = &banner.detail {
            println!("  {}", detail);
        }
    }

    fn apply_ai(&mut self, panel: &AiPanel) {
        println!("{}", RULE);
        match &panel.model {
            Some(model) => println!("  AI recommendation ({})", model),
            None => println!("  AI recommendation"),
        }
        if let Some(verdict) = &panel.verdict {
            println!("  {}", verdict);
        }
        println!("  {}", panel.recommendation);
        if let Some(risks) = &panel.risks {
            println!("  Risks:");
            for risk in risks {
                println!("    - {}", risk);
            }
        }
        println!("{}", RULE);
    }

    fn apply_form(&mut self, form: &FormState) {
        if form.loading {
            println!("  Analyzing…");
        }
        if let Some(err) = &form.error {
            println!("  ✗ {}", err);
        }
    }

    fn apply_history(&mut self, rows: &[HistoryRow]) {
        println!("{}", RULE);
        println!("  History");
        println!("{}", RULE);
        if rows.is_empty() {
            println!("  (empty)");
        }
        for row in rows {
            println!(
                "  [{}] {:<16} {:<4} {} {} {}  {}",
                row.index,
                row.pair,
                row.period,
                marker(row.class.polarity),
                row.class.label,
                row.conviction_text,
                row.date.format("%Y-%m-%d %H:%M")
            );
        }
    }

    fn apply_dropdown(&mut self, input: TickerInput, dropdown: &DropdownView) {
        match dropdown {
            DropdownView::Hidden => {}
            DropdownView::Placeholder(text) => println!("  [{:?}] {}", input, text),
            DropdownView::Rows(rows) => {
                for (i, row) in rows.iter().enumerate() {
                    let cursor = if row.highlighted { ">" } else { " " };
                    println!("  [{:?}] {}{} {:<8} {} ({})", input, cursor, i, row.symbol, row.name, row.venue);
                }
            }
        }
    }

    fn set_input_value(&mut self, input: TickerInput, value: &str) {
        println!("  {:?} = {}", input, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::ResultRenderer;
    use crate::config::ChartsConfig;
    use crate::testing::sample_result;

    #[test]
    fn test_sparkline_scales_and_keeps_gaps() {
        let line = sparkline(&[Some(0.0), None, Some(5.0), Some(10.0)], 10);
        assert_eq!(line, "▁ ▅█");
        assert_eq!(sparkline(&[Some(2.0); 3], 10), "▄▄▄");
        assert_eq!(sparkline(&vec![Some(1.0); 100], 10).chars().count(), 10);
        assert_eq!(sparkline(&[], 10), "");
    }

    #[test]
    fn test_rerender_releases_charts() {
        let mut view = TerminalView::new();
        let mut renderer = ResultRenderer::new(ChartsConfig::default());
        renderer.render(&sample_result(), &mut view);
        renderer.render(&sample_result(), &mut view);
        assert_eq!(view.live_charts(), 8);
    }
}
