//! Volume Analyzer (spec §4.2): per-bar volume_ratio, spread_ratio,
//! close_position against a rolling N-bar mean.

use super::config::DetectionConfig;
use jejakcuan_core::Bar;
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct VolumeAnalysis {
    /// `None` until `volume_lookback` prior bars are available; downstream
    /// detectors must treat a `None` as non-triggering, never as zero.
    pub volume_ratio: Option<Decimal>,
    pub spread_ratio: Option<Decimal>,
    pub close_position: Decimal,
}

/// Computes one `VolumeAnalysis` per bar in `bars`, given the full
/// preceding history needed to fill the rolling window for the earliest
/// bars in the slice. `bars` must be ordered chronologically.
pub fn analyze(bars: &[Bar], config: &DetectionConfig) -> Vec<VolumeAnalysis> {
    let n = config.volume_lookback;
    let mut out = Vec::with_capacity(bars.len());

    for i in 0..bars.len() {
        let close_position = bars[i].close_position();

        if i < n {
            out.push(VolumeAnalysis {
                volume_ratio: None,
                spread_ratio: None,
                close_position,
            });
            continue;
        }

        let window = &bars[i - n..i];
        let avg_volume = mean(window.iter().map(|b| b.volume));
        let avg_spread = mean(window.iter().map(|b| b.spread()));

        let volume_ratio = if avg_volume.is_zero() {
            None
        } else {
            Some((bars[i].volume / avg_volume).round_dp(4))
        };
        let spread_ratio = if avg_spread.is_zero() {
            None
        } else {
            Some((bars[i].spread() / avg_spread).round_dp(4))
        };

        out.push(VolumeAnalysis {
            volume_ratio,
            spread_ratio,
            close_position,
        });
    }

    out
}

fn mean(values: impl Iterator<Item = Decimal> + Clone) -> Decimal {
    let count = values.clone().count();
    if count == 0 {
        return Decimal::ZERO;
    }
    values.sum::<Decimal>() / Decimal::from(count as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use jejakcuan_core::Timeframe;
    use rust_decimal_macros::dec;

    fn bar(i: i64, close: Decimal, high: Decimal, low: Decimal, volume: Decimal) -> Bar {
        Bar {
            symbol: "T".into(),
            timeframe: Timeframe::new("1d"),
            ts_utc: Utc.timestamp_opt(1_700_000_000 + i * 60, 0).unwrap(),
            open: close,
            high,
            low,
            close,
            volume,
        }
    }

    #[test]
    fn null_until_lookback_satisfied() {
        let config = DetectionConfig::default();
        let bars: Vec<_> = (0..5)
            .map(|i| bar(i, dec!(100), dec!(101), dec!(99), dec!(1000)))
            .collect();
        let analyses = analyze(&bars, &config);
        assert!(analyses.iter().all(|a| a.volume_ratio.is_none()));
    }

    #[test]
    fn volume_ratio_is_positive_with_four_fractional_digits() {
        let config = DetectionConfig::default();
        let mut bars: Vec<_> = (0..20)
            .map(|i| bar(i, dec!(100), dec!(101), dec!(99), dec!(1000)))
            .collect();
        bars.push(bar(20, dec!(100), dec!(101), dec!(99), dec!(3333)));
        let analyses = analyze(&bars, &config);
        let last = analyses.last().unwrap();
        assert_eq!(last.volume_ratio, Some(dec!(3.3330)));
    }

    #[test]
    fn close_position_bounded_in_unit_interval() {
        let b = bar(0, dec!(104), dec!(105), dec!(99), dec!(1000));
        assert!(b.close_position() >= Decimal::ZERO && b.close_position() <= Decimal::ONE);
    }
}
