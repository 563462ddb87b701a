//! Pivot Detector (spec §4.3): swing highs/lows via lookback confirmation.

use super::config::DetectionConfig;
use jejakcuan_core::{Bar, Pivot, PivotType};
use rust_decimal::Decimal;

/// A bar at index `i` is a pivot high iff its high is strictly greater
/// than the highs of bars `i-lookback..i` and `i+1..=i+lookback`; mirror
/// for pivot low. Pivots are only returned once `lookback` subsequent
/// bars have arrived, so the result lags the live edge of `bars` by
/// `lookback` bars.
pub fn detect(bars: &[Bar], config: &DetectionConfig) -> Vec<Pivot> {
    let lookback = config.pivot_lookback;
    let mut pivots = Vec::new();

    if bars.len() < lookback * 2 + 1 {
        return pivots;
    }

    for i in lookback..bars.len() - lookback {
        let window_high = &bars[i - lookback..=i + lookback];
        let window_low = window_high;

        let is_high = window_high
            .iter()
            .enumerate()
            .all(|(j, b)| j == lookback || bars[i].high > b.high);
        if is_high {
            pivots.push(Pivot {
                index: i,
                ts_utc: bars[i].ts_utc,
                price: bars[i].high,
                pivot_type: PivotType::High,
                strength: pivot_strength(bars, i, lookback, true),
            });
        }

        let is_low = window_low
            .iter()
            .enumerate()
            .all(|(j, b)| j == lookback || bars[i].low < b.low);
        if is_low {
            pivots.push(Pivot {
                index: i,
                ts_utc: bars[i].ts_utc,
                price: bars[i].low,
                pivot_type: PivotType::Low,
                strength: pivot_strength(bars, i, lookback, false),
            });
        }
    }

    pivots
}

/// How far the pivot stands out from its neighborhood, normalized to the
/// pivot price. Used only to rank pivots within a cluster, not as a gate.
fn pivot_strength(bars: &[Bar], i: usize, lookback: usize, is_high: bool) -> Decimal {
    let window = &bars[i.saturating_sub(lookback)..(i + lookback + 1).min(bars.len())];
    let pivot_price = if is_high { bars[i].high } else { bars[i].low };
    if pivot_price.is_zero() {
        return Decimal::ZERO;
    }
    let extreme = if is_high {
        window.iter().map(|b| b.high).fold(pivot_price, |a, b| if b > a { b } else { a })
    } else {
        window.iter().map(|b| b.low).fold(pivot_price, |a, b| if b < a { b } else { a })
    };
    ((pivot_price - extreme) / pivot_price).abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use jejakcuan_core::Timeframe;
    use rust_decimal_macros::dec;

    fn bar(i: i64, high: Decimal, low: Decimal) -> Bar {
        Bar {
            symbol: "T".into(),
            timeframe: Timeframe::new("1d"),
            ts_utc: Utc.timestamp_opt(1_700_000_000 + i * 60, 0).unwrap(),
            open: (high + low) / dec!(2),
            high,
            low,
            close: (high + low) / dec!(2),
            volume: dec!(1000),
        }
    }

    #[test]
    fn detects_pivot_high_with_default_lookback() {
        let config = DetectionConfig::default();
        let mut bars: Vec<Bar> = (0..5).map(|i| bar(i, dec!(100), dec!(95))).collect();
        bars.push(bar(5, dec!(110), dec!(96))); // pivot high
        bars.extend((6..11).map(|i| bar(i, dec!(100), dec!(95))));

        let pivots = detect(&bars, &config);
        assert!(pivots
            .iter()
            .any(|p| p.index == 5 && p.pivot_type == PivotType::High));
    }

    #[test]
    fn detects_pivot_low_with_default_lookback() {
        let config = DetectionConfig::default();
        let mut bars: Vec<Bar> = (0..5).map(|i| bar(i, dec!(100), dec!(95))).collect();
        bars.push(bar(5, dec!(99), dec!(80))); // pivot low
        bars.extend((6..11).map(|i| bar(i, dec!(100), dec!(95))));

        let pivots = detect(&bars, &config);
        assert!(pivots
            .iter()
            .any(|p| p.index == 5 && p.pivot_type == PivotType::Low));
    }

    #[test]
    fn empty_when_too_few_bars() {
        let config = DetectionConfig::default();
        let bars: Vec<Bar> = (0..3).map(|i| bar(i, dec!(100), dec!(95))).collect();
        assert!(detect(&bars, &config).is_empty());
    }
}
