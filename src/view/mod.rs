pub mod terminal;

use crate::autocomplete::{DropdownView, TickerInput};
use crate::history::HistoryRow;
use crate::orchestrator::FormState;
use crate::render::charts::ChartDescriptor;
use crate::render::panels::{AiPanel, SignalBadge, SignalBanner};
use crate::render::stats::StatMetric;

/// Opaque id of one live chart instance handed out by the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChartInstanceId(pub u64);

// ── Rendering port ────────────────────────────────────────────────────────────

/// Everything the core decides to show goes through this trait; the concrete
/// binding (terminal, browser, test recorder) only draws it.
pub trait DashboardView: Send {
    /// Create a chart instance on the descriptor's canvas.
    fn mount_chart(&mut self, chart: &ChartDescriptor) -> ChartInstanceId;
    fn unmount_chart(&mut self, id: ChartInstanceId);

    fn apply_stats(&mut self, rows: &[StatMetric]);
    fn apply_badges(&mut self, badges: &[SignalBadge]);
    fn apply_banner(&mut self, banner: &SignalBanner);
    fn apply_ai(&mut self, panel: &AiPanel);

    fn apply_form(&mut self, form: &FormState);
    fn apply_history(&mut self, rows: &[HistoryRow]);

    fn apply_dropdown(&mut self, input: TickerInput, dropdown: &DropdownView);
    fn set_input_value(&mut self, input: TickerInput, value: &str);
}
