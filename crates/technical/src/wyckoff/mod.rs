//! Wyckoff trading-range detection pipeline (spec §4.2-4.9): volume
//! analysis, pivots, clustering, levels, zones, range detection, event
//! detectors, and phase classification, wired into one entry point.

pub mod cluster;
pub mod config;
pub mod events;
pub mod levels;
pub mod phase;
pub mod pivot;
pub mod range_detector;
pub mod volume;
pub mod zones;

pub use config::DetectionConfig;
pub use events::detect_all as detect_events;
pub use phase::classify_phase;
pub use range_detector::detect_ranges;
pub use volume::{analyze as analyze_volume, VolumeAnalysis};

use jejakcuan_core::{AssetClass, Bar, PhaseClassification, RangeStatus, TradingRange};

/// Full per-symbol read: detects trading ranges, then events and phase for
/// the most advanced (highest `end_index`) non-archived range. Downstream
/// signal building only cares about the active/forming range closest to
/// the live edge, so this is the shape most callers want; callers needing
/// every range can call [`detect_ranges`] directly.
pub struct WyckoffRead {
    pub ranges: Vec<TradingRange>,
    pub active_range: Option<TradingRange>,
    pub phase: Option<PhaseClassification>,
}

pub fn read(bars: &[Bar], symbol: &str, timeframe: &jejakcuan_core::Timeframe, asset_class: AssetClass, config: &DetectionConfig) -> WyckoffRead {
    let ranges = detect_ranges(bars, symbol, timeframe, config);
    let analyses = analyze_volume(bars, config);

    let active_range = ranges
        .iter()
        .filter(|r| r.status != RangeStatus::Archived && r.is_admitted_for_patterns())
        .max_by_key(|r| r.end_index)
        .cloned();

    let phase = active_range.as_ref().map(|range| {
        let events = detect_events(bars, &analyses, range, asset_class, config);
        classify_phase(bars, range, &events, None, config)
    });

    WyckoffRead { ranges, active_range, phase }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use jejakcuan_core::Timeframe;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn bar(i: i64, base: Decimal, volume: Decimal) -> Bar {
        Bar {
            symbol: "T".into(),
            timeframe: Timeframe::new("1d"),
            ts_utc: Utc.timestamp_opt(1_700_000_000 + i * 86400, 0).unwrap(),
            open: base,
            high: base + dec!(1),
            low: base - dec!(1),
            close: base,
            volume,
        }
    }

    #[test]
    fn read_on_flat_noise_finds_no_admitted_range() {
        let config = DetectionConfig::default();
        let bars: Vec<Bar> = (0..60).map(|i| bar(i, dec!(100) + Decimal::from(i % 3), dec!(1000))).collect();
        let result = read(&bars, "T", &Timeframe::new("1d"), AssetClass::Stock, &config);
        assert!(result.active_range.is_none());
        assert!(result.phase.is_none());
    }
}
