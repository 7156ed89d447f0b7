use std::collections::BTreeMap;
use tracing::debug;

use crate::render::charts::{ChartDescriptor, ChartKey};
use crate::view::{ChartInstanceId, DashboardView};

/// Live chart instances keyed by canvas. A canvas never has two live instances.
#[derive(Debug, Default)]
pub struct ChartRegistry {
    live: BTreeMap<ChartKey, ChartInstanceId>,
}

impl ChartRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Destroy every registered instance.
    pub fn destroy_all<V: DashboardView + ?Sized>(&mut self, view: &mut V) {
        let n = self.live.len();
        for (_, id) in std::mem::take(&mut self.live) {
            view.unmount_chart(id);
        }
        if n > 0 {
            debug!("Destroyed {} charts", n);
        }
    }

    /// Mount a chart, destroying whatever was live on the same canvas first.
    pub fn replace<V: DashboardView + ?Sized>(&mut self, chart: &ChartDescriptor, view: &mut V) {
        if let Some(old) = self.live.remove(&chart.key) {
            view.unmount_chart(old);
        }
        let id = view.mount_chart(chart);
        self.live.insert(chart.key, id);
    }

    #[cfg(test)]
    pub fn live(&self, key: ChartKey) -> Option<ChartInstanceId> {
        self.live.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::charts::zscore_chart;
    use crate::models::ValueSeries;
    use crate::testing::RecordingView;

    #[test]
    fn test_replace_destroys_previous_instance() {
        let mut view = RecordingView::default();
        let mut reg = ChartRegistry::new();
        let chart = zscore_chart(&ValueSeries::default(), 8);

        reg.replace(&chart, &mut view);
        let first = reg.live(ChartKey::ZScore).unwrap();
        reg.replace(&chart, &mut view);
        let second = reg.live(ChartKey::ZScore).unwrap();

        assert_ne!(first, second);
        assert_eq!(view.unmounted, vec![first]);
        assert_eq!(view.live_on(ChartKey::ZScore), 1);
    }

    #[test]
    fn test_destroy_all() {
        let mut view = RecordingView::default();
        let mut reg = ChartRegistry::new();
        reg.replace(&zscore_chart(&ValueSeries::default(), 8), &mut view);
        reg.destroy_all(&mut view);
        assert!(reg.is_empty());
        assert_eq!(view.live_total(), 0);
        // second call is a no-op
        reg.destroy_all(&mut view);
        assert_eq!(view.unmounted.len(), 1);
    }
}
