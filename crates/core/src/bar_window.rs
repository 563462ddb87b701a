//! Per-symbol rolling ordered bar buffer (spec §4.1).

use crate::error::EngineError;
use crate::models::Bar;
use std::collections::{HashMap, VecDeque};

/// Large enough to cover every detector's longest lookback (pivot
/// confirmation, 20-bar volume rolling mean, 100+ bar phase windows).
pub const DEFAULT_WINDOW_CAPACITY: usize = 512;

/// An append-only, bounded ring of bars for one (symbol, timeframe) pair.
#[derive(Debug, Clone)]
pub struct BarWindow {
    capacity: usize,
    bars: VecDeque<Bar>,
}

impl BarWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            bars: VecDeque::with_capacity(capacity),
        }
    }

    /// Admits `bar`, evicting the oldest if at capacity. Fails if `bar`'s
    /// timestamp is not strictly after the last admitted bar.
    pub fn append(&mut self, bar: Bar) -> Result<(), EngineError> {
        if let Some(last) = self.bars.back() {
            if bar.ts_utc <= last.ts_utc {
                return Err(EngineError::InvalidBar {
                    symbol: bar.symbol,
                    timeframe: bar.timeframe.0,
                    last_ts: last.ts_utc.to_rfc3339(),
                    ts: bar.ts_utc.to_rfc3339(),
                });
            }
        }
        if self.bars.len() == self.capacity {
            self.bars.pop_front();
        }
        self.bars.push_back(bar);
        Ok(())
    }

    /// Snapshot of the last `n` bars in chronological order, or all bars
    /// when `n` is `None`.
    pub fn get_bars(&self, n: Option<usize>) -> Vec<Bar> {
        match n {
            None => self.bars.iter().cloned().collect(),
            Some(n) => {
                let skip = self.bars.len().saturating_sub(n);
                self.bars.iter().skip(skip).cloned().collect()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

/// Tracks one `BarWindow` per (symbol, timeframe) pair.
#[derive(Debug, Default)]
pub struct BarWindowManager {
    windows: HashMap<(String, String), BarWindow>,
    capacity: usize,
}

impl BarWindowManager {
    pub fn new(capacity: usize) -> Self {
        Self {
            windows: HashMap::new(),
            capacity,
        }
    }

    pub fn append(&mut self, bar: Bar) -> Result<(), EngineError> {
        let key = (bar.symbol.clone(), bar.timeframe.0.clone());
        let capacity = self.capacity;
        let window = self
            .windows
            .entry(key)
            .or_insert_with(|| BarWindow::new(capacity));
        window.append(bar)
    }

    pub fn get_bars(&self, symbol: &str, timeframe: &str, n: Option<usize>) -> Vec<Bar> {
        self.windows
            .get(&(symbol.to_string(), timeframe.to_string()))
            .map(|w| w.get_bars(n))
            .unwrap_or_default()
    }
}

impl Default for BarWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn bar(ts_min: i64, close: rust_decimal::Decimal) -> Bar {
        Bar {
            symbol: "TEST".into(),
            timeframe: crate::models::Timeframe::new("1d"),
            ts_utc: Utc.timestamp_opt(1_700_000_000 + ts_min * 60, 0).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: dec!(1000),
        }
    }

    #[test]
    fn appends_in_order() {
        let mut w = BarWindow::new(10);
        w.append(bar(0, dec!(100))).unwrap();
        w.append(bar(1, dec!(101))).unwrap();
        assert_eq!(w.len(), 2);
        let snap = w.get_bars(None);
        assert_eq!(snap[0].close, dec!(100));
        assert_eq!(snap[1].close, dec!(101));
    }

    #[test]
    fn rejects_out_of_order() {
        let mut w = BarWindow::new(10);
        w.append(bar(5, dec!(100))).unwrap();
        let err = w.append(bar(1, dec!(101))).unwrap_err();
        assert!(matches!(err, EngineError::InvalidBar { .. }));
    }

    #[test]
    fn rejects_duplicate_timestamp() {
        let mut w = BarWindow::new(10);
        w.append(bar(5, dec!(100))).unwrap();
        assert!(w.append(bar(5, dec!(101))).is_err());
    }

    #[test]
    fn evicts_oldest_at_capacity() {
        let mut w = BarWindow::new(2);
        w.append(bar(0, dec!(1))).unwrap();
        w.append(bar(1, dec!(2))).unwrap();
        w.append(bar(2, dec!(3))).unwrap();
        let snap = w.get_bars(None);
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].close, dec!(2));
        assert_eq!(snap[1].close, dec!(3));
    }

    #[test]
    fn get_bars_last_n() {
        let mut w = BarWindow::new(10);
        for i in 0..5 {
            w.append(bar(i, Decimal::from(i))).unwrap();
        }
        let snap = w.get_bars(Some(2));
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].close, Decimal::from(3));
        assert_eq!(snap[1].close, Decimal::from(4));
    }

    #[test]
    fn manager_keys_by_symbol_and_timeframe() {
        let mut mgr = BarWindowManager::new(10);
        mgr.append(bar(0, dec!(1))).unwrap();
        assert_eq!(mgr.get_bars("TEST", "1d", None).len(), 1);
        assert_eq!(mgr.get_bars("OTHER", "1d", None).len(), 0);
    }
}
