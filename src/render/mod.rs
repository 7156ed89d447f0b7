//! ResultRenderer: one analysis payload → the complete visual state.
//!
//! ## Render pass
//!
//! `render()` is a total rebuild and may be called any number of times:
//!   1. Destroy every live chart (ChartRegistry), then mount the new ones
//!   2. Statistics grid
//!   3. Technical-signal badges
//!   4. Signal banner + conviction meter
//!   5. AI recommendation panel

pub mod charts;
pub mod panels;
pub mod registry;
pub mod stats;

use tracing::debug;

use crate::config::ChartsConfig;
use crate::models::AnalysisResult;
use crate::view::DashboardView;

use self::charts::build_all;
use self::panels::{build_ai_panel, build_badges, build_banner, SignalBanner};
use self::registry::ChartRegistry;
use self::stats::build_stats;

pub struct ResultRenderer {
    registry: ChartRegistry,
    limits: ChartsConfig,
}

impl ResultRenderer {
    pub fn new(limits: ChartsConfig) -> Self {
        Self {
            registry: ChartRegistry::new(),
            limits,
        }
    }

    #[cfg(test)]
    pub fn registry(&self) -> &ChartRegistry {
        &self.registry
    }

    /// Returns the banner so callers can log or persist the verdict.
    pub fn render<V: DashboardView + ?Sized>(&mut self, result: &AnalysisResult, view: &mut V) -> SignalBanner {
        let sym_a = result.ticker_a.symbol.as_str();
        let sym_b = result.ticker_b.symbol.as_str();

        self.registry.destroy_all(view);
        let charts = build_all(result, &self.limits);
        for chart in &charts {
            self.registry.replace(chart, view);
        }
        debug!("Mounted {} charts for {}/{}", self.registry.len(), sym_a, sym_b);

        view.apply_stats(&build_stats(&result.statistics, sym_a, sym_b));

        let badges = result
            .technicals
            .as_ref()
            .and_then(|t| t.confirmation.as_ref())
            .map(|c| build_badges(c, sym_a, sym_b))
            .unwrap_or_default();
        view.apply_badges(&badges);

        let banner = build_banner(result);
        view.apply_banner(&banner);

        view.apply_ai(&build_ai_panel(result.ai_recommendation.as_ref(), sym_a, sym_b));

        banner
    }

    /// Tear down all charts (e.g. when results are hidden).
    pub fn clear<V: DashboardView + ?Sized>(&mut self, view: &mut V) {
        self.registry.destroy_all(view);
    }
}
