//! Bounded, deduplicated, most-recent-first log of past analyses.
//!
//! Every mutation reads the whole record from the durable store, modifies it
//! and writes the whole record back; nothing is cached between calls.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::formatting::fmt_percent;
use crate::models::{HistoryEntry, SignalDirection};
use crate::signal::{SignalClass, SignalClassifier};
use crate::storage::{KeyValueStore, StorageError};

pub const MAX_HISTORY: usize = 10;

// ── Display row ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRow {
    pub index: usize,
    pub pair: String,
    pub period: String,
    pub class: SignalClass,
    pub conviction_text: String,
    pub date: DateTime<Utc>,
}

impl HistoryRow {
    pub fn from_entry(index: usize, entry: &HistoryEntry) -> Self {
        let conviction = SignalClassifier::normalise_conviction(entry.conviction);
        let class = SignalClassifier::classify(
            SignalDirection::from(entry.signal.as_str()),
            conviction,
            &entry.ticker_a,
            &entry.ticker_b,
        );
        Self {
            index,
            pair: format!("{} vs {}", entry.ticker_a, entry.ticker_b),
            period: entry.period.clone(),
            conviction_text: fmt_percent(conviction),
            class,
            date: entry.date,
        }
    }
}

// ── Store ─────────────────────────────────────────────────────────────────────

pub struct HistoryStore<K: KeyValueStore> {
    store: K,
    key: String,
}

impl<K: KeyValueStore> HistoryStore<K> {
    pub fn new(store: K, key: impl Into<String>) -> Self {
        Self { store, key: key.into() }
    }

    /// Current entries. An absent or unreadable record is an empty history.
    pub fn list(&self) -> Vec<HistoryEntry> {
        match self.read() {
            Ok(entries) => entries,
            Err(e) => {
                warn!("History record unreadable, treating as empty: {}", e);
                Vec::new()
            }
        }
    }

    pub fn rows(&self) -> Vec<HistoryRow> {
        self.list()
            .iter()
            .enumerate()
            .map(|(i, e)| HistoryRow::from_entry(i, e))
            .collect()
    }

    pub fn get(&self, index: usize) -> Option<HistoryEntry> {
        self.list().into_iter().nth(index)
    }

    pub fn add(
        &mut self,
        ticker_a: &str,
        ticker_b: &str,
        period: &str,
        signal: SignalDirection,
        conviction: f64,
    ) -> Vec<HistoryEntry> {
        self.add_at(ticker_a, ticker_b, period, signal, conviction, Utc::now())
    }

    /// Remove any entry with the same `(ticker_a, ticker_b, period)`, insert the
    /// new one at the front, keep the first [`MAX_HISTORY`].
    pub(crate) fn add_at(
        &mut self,
        ticker_a: &str,
        ticker_b: &str,
        period: &str,
        signal: SignalDirection,
        conviction: f64,
        now: DateTime<Utc>,
    ) -> Vec<HistoryEntry> {
        let mut entries = self.list();
        entries.retain(|e| !e.same_key(ticker_a, ticker_b, period));
        entries.insert(
            0,
            HistoryEntry {
                ticker_a: ticker_a.to_string(),
                ticker_b: ticker_b.to_string(),
                period: period.to_string(),
                signal: signal.as_str().to_string(),
                conviction,
                date: now,
            },
        );
        entries.truncate(MAX_HISTORY);

        self.persist(&entries);
        debug!("History: {} entries after add {}/{} {}", entries.len(), ticker_a, ticker_b, period);
        entries
    }

    /// Out-of-range indices leave the history untouched.
    pub fn remove(&mut self, index: usize) -> Option<HistoryEntry> {
        let mut entries = self.list();
        if index >= entries.len() {
            return None;
        }
        let removed = entries.remove(index);
        self.persist(&entries);
        Some(removed)
    }

    fn read(&self) -> Result<Vec<HistoryEntry>, StorageError> {
        match self.store.get(&self.key)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    fn persist(&mut self, entries: &[HistoryEntry]) {
        let result = serde_json::to_string(entries)
            .map_err(StorageError::from)
            .and_then(|raw| self.store.set(&self.key, &raw));
        if let Err(e) = result {
            warn!("Failed to persist history: {}", e);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, Repository};
    use chrono::TimeZone;

    fn store() -> HistoryStore<MemoryStore> {
        HistoryStore::new(MemoryStore::new(), "history")
    }

    fn ts(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, minute, 0).unwrap()
    }

    #[test]
    fn test_repeat_moves_to_front_without_growing() {
        let mut h = store();
        h.add_at("AAPL", "MSFT", "6mo", SignalDirection::FavorA, 70.0, ts(0));
        h.add_at("NVDA", "AMD", "1y", SignalDirection::FavorB, 80.0, ts(1));
        h.add_at("SPY", "QQQ", "1y", SignalDirection::Neutral, 0.0, ts(2));

        let after = h.add_at("AAPL", "MSFT", "6mo", SignalDirection::FavorB, 60.0, ts(3));
        assert_eq!(after.len(), 3);
        assert_eq!(after[0].ticker_a, "AAPL");
        assert_eq!(after[0].signal, "FAVOR_B");
        assert_eq!(after[0].date, ts(3));
        assert_eq!(after[1].ticker_a, "SPY");
        assert_eq!(after[2].ticker_a, "NVDA");
    }

    #[test]
    fn test_same_pair_different_period_is_distinct() {
        let mut h = store();
        h.add("AAPL", "MSFT", "6mo", SignalDirection::FavorA, 70.0);
        h.add("AAPL", "MSFT", "1y", SignalDirection::FavorA, 70.0);
        h.add("MSFT", "AAPL", "1y", SignalDirection::FavorA, 70.0);
        assert_eq!(h.list().len(), 3);
    }

    #[test]
    fn test_cap_and_uniqueness_hold_under_any_sequence() {
        let mut h = store();
        let tickers = ["A", "B", "C", "D", "E", "F", "G"];
        let periods = ["1mo", "6mo", "1y"];
        for i in 0..60 {
            let a = tickers[i % tickers.len()];
            let b = tickers[(i * 3 + 1) % tickers.len()];
            let p = periods[i % periods.len()];
            let entries = h.add(a, b, p, SignalDirection::Neutral, 0.0);

            assert!(entries.len() <= MAX_HISTORY);
            for (x, e) in entries.iter().enumerate() {
                assert!(entries[x + 1..]
                    .iter()
                    .all(|o| !o.same_key(&e.ticker_a, &e.ticker_b, &e.period)));
            }
            assert!(entries[0].same_key(a, b, p));
        }
    }

    #[test]
    fn test_truncation_drops_oldest() {
        let mut h = store();
        for i in 0..12u32 {
            h.add_at(&format!("T{}", i), "SPY", "1y", SignalDirection::FavorA, 60.0, ts(i));
        }
        let list = h.list();
        assert_eq!(list.len(), MAX_HISTORY);
        assert_eq!(list[0].ticker_a, "T11");
        assert_eq!(list[9].ticker_a, "T2");
    }

    #[test]
    fn test_remove() {
        let mut h = store();
        h.add("AAPL", "MSFT", "1y", SignalDirection::FavorA, 70.0);
        h.add("NVDA", "AMD", "1y", SignalDirection::FavorA, 70.0);

        let removed = h.remove(1).unwrap();
        assert_eq!(removed.ticker_a, "AAPL");
        assert_eq!(h.list().len(), 1);
        assert!(h.remove(5).is_none());
        assert_eq!(h.list().len(), 1);
    }

    #[test]
    fn test_corrupt_or_absent_record_is_empty() {
        let mut kv = MemoryStore::new();
        kv.set("history", "{not json").unwrap();
        let mut h = HistoryStore::new(kv, "history");
        assert!(h.list().is_empty());

        // a write over the corrupt record starts a fresh list
        h.add("AAPL", "MSFT", "1y", SignalDirection::FavorA, 70.0);
        assert_eq!(h.list().len(), 1);

        assert!(HistoryStore::new(MemoryStore::new(), "missing").list().is_empty());
    }

    #[test]
    fn test_reads_through_to_store() {
        let mut repo = Repository::open_in_memory().unwrap();
        repo.run_migrations().unwrap();
        repo.set(
            "history",
            r#"[{"tickerA":"AAPL","tickerB":"MSFT","period":"6mo","signal":"FAVOR_A","conviction":3,"date":"2025-01-05T10:00:00Z"}]"#,
        )
        .unwrap();

        let h = HistoryStore::new(repo, "history");
        let rows = h.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].pair, "AAPL vs MSFT");
        assert_eq!(rows[0].conviction_text, "60%");
        assert_eq!(rows[0].class.label, "FAVORS AAPL");
    }

    #[test]
    fn test_legacy_and_modern_conviction_share_a_tier() {
        let legacy = HistoryRow::from_entry(0, &legacy_entry());
        let modern = HistoryRow::from_entry(1, &HistoryEntry { conviction: 60.0, ..legacy_entry() });
        assert_eq!(legacy.conviction_text, "60%");
        assert_eq!(modern.conviction_text, "60%");
        assert_eq!(legacy.class.label, modern.class.label);
        assert_eq!(legacy.class.meter, modern.class.meter);
    }

    fn legacy_entry() -> HistoryEntry {
        HistoryEntry {
            ticker_a: "AAPL".into(),
            ticker_b: "MSFT".into(),
            period: "1y".into(),
            signal: "FAVOR_B".into(),
            conviction: 3.0,
            date: ts(0),
        }
    }
}
