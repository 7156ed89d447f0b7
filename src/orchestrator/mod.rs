//! Submission flow: validate, fetch, render, record.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

use crate::client::AnalysisService;
use crate::config::ChartsConfig;
use crate::error::DashboardError;
use crate::history::{HistoryRow, HistoryStore};
use crate::models::{AnalysisRequest, HistoryEntry, Period};
use crate::render::panels::SignalBanner;
use crate::render::ResultRenderer;
use crate::storage::KeyValueStore;
use crate::utils::Timer;
use crate::view::DashboardView;

/// Visible state of the form around the submit control.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormState {
    pub loading: bool,
    pub submit_enabled: bool,
    pub error: Option<String>,
    pub results_visible: bool,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            loading: false,
            submit_enabled: true,
            error: None,
            results_visible: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Rendered(SignalBanner),
    /// Another submission was outstanding; this one was dropped.
    Ignored,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct AnalysisOrchestrator<S, V, K>
where
    S: AnalysisService,
    V: DashboardView,
    K: KeyValueStore,
{
    service: Arc<S>,
    view: Arc<Mutex<V>>,
    renderer: Mutex<ResultRenderer>,
    history: Mutex<HistoryStore<K>>,
    form: Mutex<FormState>,
    busy: AtomicBool,
}

/// Restores the submit control and clears the busy flag on every exit path.
struct BusyGuard<'a, S, V, K>
where
    S: AnalysisService,
    V: DashboardView,
    K: KeyValueStore,
{
    owner: &'a AnalysisOrchestrator<S, V, K>,
}

impl<S, V, K> Drop for BusyGuard<'_, S, V, K>
where
    S: AnalysisService,
    V: DashboardView,
    K: KeyValueStore,
{
    fn drop(&mut self) {
        self.owner.update_form(|f| {
            f.loading = false;
            f.submit_enabled = true;
        });
        self.owner.busy.store(false, Ordering::SeqCst);
    }
}

impl<S, V, K> AnalysisOrchestrator<S, V, K>
where
    S: AnalysisService,
    V: DashboardView,
    K: KeyValueStore,
{
    pub fn new(service: Arc<S>, view: Arc<Mutex<V>>, history: HistoryStore<K>, charts: ChartsConfig) -> Self {
        Self {
            service,
            view,
            renderer: Mutex::new(ResultRenderer::new(charts)),
            history: Mutex::new(history),
            form: Mutex::new(FormState::default()),
            busy: AtomicBool::new(false),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    fn update_form(&self, change: impl FnOnce(&mut FormState)) {
        let snapshot = {
            let mut form = lock(&self.form);
            change(&mut form);
            form.clone()
        };
        lock(&self.view).apply_form(&snapshot);
    }

    /// Submit one analysis. While another submission is outstanding the call
    /// is dropped without touching any state.
    pub async fn submit(&self, ticker_a: &str, ticker_b: &str, period: Period) -> Result<SubmitOutcome, DashboardError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Submission ignored: request already in flight");
            return Ok(SubmitOutcome::Ignored);
        }
        let _guard = BusyGuard { owner: self };

        let request = match AnalysisRequest::new(ticker_a, ticker_b, period) {
            Ok(r) => r,
            Err(e) => {
                self.update_form(|f| f.error = Some(e.to_string()));
                return Err(e);
            }
        };

        self.update_form(|f| {
            f.error = None;
            f.results_visible = false;
            f.loading = true;
            f.submit_enabled = false;
        });
        {
            let mut view = lock(&self.view);
            lock(&self.renderer).clear(&mut *view);
        }

        let fetched = {
            let _timer = Timer::start(format!("analysis {} vs {} ({})", request.ticker_a, request.ticker_b, request.period));
            self.service.analyze(&request).await
        };

        let result = match fetched {
            Ok(r) => r,
            Err(e) => {
                warn!("Analysis {} vs {} failed: {}", request.ticker_a, request.ticker_b, e);
                self.update_form(|f| f.error = Some(e.to_string()));
                return Err(e);
            }
        };

        let banner = {
            let mut view = lock(&self.view);
            lock(&self.renderer).render(&result, &mut *view)
        };
        self.update_form(|f| f.results_visible = true);

        let (direction, conviction) = result.verdict();
        info!(
            "{} vs {} ({}): {} @ {}",
            request.ticker_a,
            request.ticker_b,
            request.period,
            direction.as_str(),
            conviction
        );
        {
            let mut history = lock(&self.history);
            history.add(&request.ticker_a, &request.ticker_b, request.period.as_str(), direction, conviction);
            let rows = history.rows();
            lock(&self.view).apply_history(&rows);
        }

        Ok(SubmitOutcome::Rendered(banner))
    }

    pub fn history_rows(&self) -> Vec<HistoryRow> {
        lock(&self.history).rows()
    }

    /// Push the persisted history to the view.
    pub fn refresh_history(&self) -> Vec<HistoryRow> {
        let rows = self.history_rows();
        lock(&self.view).apply_history(&rows);
        rows
    }

    pub fn remove_history(&self, index: usize) -> Option<HistoryEntry> {
        let removed = lock(&self.history).remove(index);
        self.refresh_history();
        removed
    }

    /// Entry to replay; the caller writes its tickers back into the inputs
    /// before resubmitting with [`Self::replay`].
    pub fn history_entry(&self, index: usize) -> Option<HistoryEntry> {
        lock(&self.history).get(index)
    }

    /// Re-submit a history entry with its stored period.
    pub async fn replay(&self, entry: &HistoryEntry) -> Result<SubmitOutcome, DashboardError> {
        let period = entry.period.parse::<Period>().unwrap_or_else(|e| {
            warn!("Stored period unusable ({}), using default", e);
            Period::default()
        });
        self.submit(&entry.ticker_a, &entry.ticker_b, period).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::testing::{FakeService, RecordingView};
    use tokio::sync::Notify;

    type Orchestrator = AnalysisOrchestrator<FakeService, RecordingView, MemoryStore>;

    fn orchestrator(service: FakeService) -> (Arc<Orchestrator>, Arc<FakeService>, Arc<Mutex<RecordingView>>) {
        let service = Arc::new(service);
        let view = Arc::new(Mutex::new(RecordingView::default()));
        let orch = AnalysisOrchestrator::new(
            Arc::clone(&service),
            Arc::clone(&view),
            HistoryStore::new(MemoryStore::new(), "history"),
            ChartsConfig::default(),
        );
        (Arc::new(orch), service, view)
    }

    #[test]
    fn test_validation_never_reaches_network() {
        let (orch, service, view) = orchestrator(FakeService::ok());

        let same = tokio_test::block_on(orch.submit("aapl", " AAPL ", Period::OneYear)).unwrap_err();
        assert_eq!(same, DashboardError::Validation("Please enter two different ticker symbols.".into()));

        let empty = tokio_test::block_on(orch.submit("", "MSFT", Period::OneYear)).unwrap_err();
        assert_eq!(empty.kind(), "validation");

        assert_eq!(service.analyze_calls(), 0);
        let view = view.lock().unwrap();
        let form = view.last_form().unwrap();
        assert_eq!(form.error.as_deref(), Some("Please enter both ticker symbols."));
        assert!(form.submit_enabled);
        assert!(!form.loading);
        assert!(!orch.is_busy());
    }

    #[tokio::test]
    async fn test_success_renders_and_records_history() {
        let (orch, service, view) = orchestrator(FakeService::ok());

        let outcome = orch.submit("aapl", "msft", Period::SixMonths).await.unwrap();
        let SubmitOutcome::Rendered(banner) = outcome else {
            panic!("expected a render");
        };
        assert_eq!(banner.class.label, "FAVORS AAPL");
        assert_eq!(service.requests()[0].ticker_a, "AAPL");

        let rows = orch.history_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].pair, "AAPL vs MSFT");
        assert_eq!(rows[0].period, "6mo");

        let view = view.lock().unwrap();
        assert_eq!(view.live_total(), 8);
        assert_eq!(view.history.len(), 1);
        let form = view.last_form().unwrap();
        assert!(form.results_visible && form.submit_enabled && !form.loading);
        assert_eq!(form.error, None);
        // loading state shown while the request was outstanding
        assert!(view.forms.iter().any(|f| f.loading && !f.submit_enabled && !f.results_visible));
    }

    #[tokio::test]
    async fn test_service_error_is_shown_and_nothing_renders() {
        let (orch, _service, view) =
            orchestrator(FakeService::failing(DashboardError::Service("No data returned for: ZZZZ".into())));

        let err = orch.submit("ZZZZ", "MSFT", Period::OneYear).await.unwrap_err();
        assert_eq!(err.to_string(), "No data returned for: ZZZZ");

        let view = view.lock().unwrap();
        assert_eq!(view.live_total(), 0);
        assert!(view.banner.is_none());
        let form = view.last_form().unwrap();
        assert_eq!(form.error.as_deref(), Some("No data returned for: ZZZZ"));
        assert!(form.submit_enabled && !form.loading && !form.results_visible);
        assert!(orch.history_rows().is_empty());
    }

    #[tokio::test]
    async fn test_second_submit_while_busy_is_dropped() {
        let gate = Arc::new(Notify::new());
        let (orch, service, _view) = orchestrator(FakeService::ok().with_gate(Arc::clone(&gate)));

        let first = tokio::spawn({
            let orch = Arc::clone(&orch);
            async move { orch.submit("AAPL", "MSFT", Period::OneYear).await }
        });
        while !orch.is_busy() {
            tokio::task::yield_now().await;
        }

        let second = orch.submit("GOOG", "META", Period::OneYear).await.unwrap();
        assert_eq!(second, SubmitOutcome::Ignored);

        gate.notify_one();
        assert!(matches!(first.await.unwrap(), Ok(SubmitOutcome::Rendered(_))));
        assert_eq!(service.analyze_calls(), 1);
        assert!(!orch.is_busy());

        // ready for the next manual submission
        gate.notify_one();
        assert!(orch.submit("GOOG", "META", Period::OneYear).await.is_ok());
        assert_eq!(service.analyze_calls(), 2);
    }

    #[tokio::test]
    async fn test_history_dedup_and_replay() {
        let (orch, service, _view) = orchestrator(FakeService::ok());
        orch.submit("AAPL", "MSFT", Period::OneYear).await.unwrap();
        orch.submit("KO", "PEP", Period::TwoYears).await.unwrap();
        orch.submit("aapl", "msft", Period::OneYear).await.unwrap();

        let rows = orch.history_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].pair, "AAPL vs MSFT");

        let entry = orch.history_entry(1).unwrap();
        orch.replay(&entry).await.unwrap();
        let last = service.requests().pop().unwrap();
        assert_eq!((last.ticker_a.as_str(), last.period), ("KO", Period::TwoYears));
        assert_eq!(orch.history_rows()[0].pair, "KO vs PEP");

        assert!(orch.remove_history(0).is_some());
        assert_eq!(orch.history_rows().len(), 1);
        assert!(orch.remove_history(5).is_none());
    }
}
