//! Folds a stream of price ticks into fixed-width OHLCV bars, one
//! accumulator per (symbol, timeframe). TwelveData's WebSocket streams
//! raw trade prices, not bars, so every bar-shaped `BarSource`
//! ultimately bottoms out here.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use jejakcuan_core::{Bar, Timeframe};
use rust_decimal::Decimal;

struct InFlightBar {
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    volume: Decimal,
    bucket_start: DateTime<Utc>,
}

/// Aggregates ticks into bars of a single timeframe, keyed by symbol.
/// A bar closes (and is returned) the moment a tick arrives whose
/// timestamp falls into the next bucket -- there is no wall-clock
/// timer, so a silent symbol simply never closes its last bar until a
/// new tick for it arrives.
pub struct TickAggregator {
    timeframe: Timeframe,
    bucket_width: Duration,
    inflight: HashMap<String, InFlightBar>,
}

impl TickAggregator {
    pub fn new(timeframe: Timeframe, bucket_width: Duration) -> Self {
        Self {
            timeframe,
            bucket_width,
            inflight: HashMap::new(),
        }
    }

    fn bucket_start(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        let width_secs = self.bucket_width.num_seconds().max(1);
        let epoch_secs = ts.timestamp();
        let bucket_secs = (epoch_secs / width_secs) * width_secs;
        DateTime::from_timestamp(bucket_secs, 0).unwrap_or(ts)
    }

    /// Feeds one tick. Returns a completed bar if this tick rolled the
    /// symbol into a new bucket.
    pub fn on_tick(
        &mut self,
        symbol: &str,
        price: Decimal,
        volume: Decimal,
        ts: DateTime<Utc>,
    ) -> Option<Bar> {
        let bucket_start = self.bucket_start(ts);

        match self.inflight.get_mut(symbol) {
            Some(bar) if bar.bucket_start == bucket_start => {
                bar.high = bar.high.max(price);
                bar.low = bar.low.min(price);
                bar.close = price;
                bar.volume += volume;
                None
            }
            Some(bar) => {
                let completed = self.finish(symbol, bar);
                self.inflight.insert(
                    symbol.to_string(),
                    InFlightBar {
                        open: price,
                        high: price,
                        low: price,
                        close: price,
                        volume,
                        bucket_start,
                    },
                );
                Some(completed)
            }
            None => {
                self.inflight.insert(
                    symbol.to_string(),
                    InFlightBar {
                        open: price,
                        high: price,
                        low: price,
                        close: price,
                        volume,
                        bucket_start,
                    },
                );
                None
            }
        }
    }

    fn finish(&self, symbol: &str, bar: &InFlightBar) -> Bar {
        Bar {
            symbol: symbol.to_string(),
            timeframe: self.timeframe.clone(),
            ts_utc: bar.bucket_start,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn ticks_within_one_bucket_accumulate_without_emitting() {
        let mut agg = TickAggregator::new(Timeframe::new("1m"), Duration::minutes(1));
        assert!(agg.on_tick("BBCA", dec!(9500), dec!(10), ts(0)).is_none());
        assert!(agg.on_tick("BBCA", dec!(9550), dec!(5), ts(30)).is_none());
    }

    #[test]
    fn a_tick_in_the_next_bucket_closes_the_prior_bar() {
        let mut agg = TickAggregator::new(Timeframe::new("1m"), Duration::minutes(1));
        agg.on_tick("BBCA", dec!(9500), dec!(10), ts(0));
        agg.on_tick("BBCA", dec!(9600), dec!(5), ts(30));
        let bar = agg
            .on_tick("BBCA", dec!(9400), dec!(20), ts(61))
            .expect("bucket rolled over");

        assert_eq!(bar.open, dec!(9500));
        assert_eq!(bar.high, dec!(9600));
        assert_eq!(bar.low, dec!(9500));
        assert_eq!(bar.close, dec!(9600));
        assert_eq!(bar.volume, dec!(15));
    }

    #[test]
    fn symbols_aggregate_independently() {
        let mut agg = TickAggregator::new(Timeframe::new("1m"), Duration::minutes(1));
        agg.on_tick("BBCA", dec!(9500), dec!(10), ts(0));
        agg.on_tick("TLKM", dec!(3200), dec!(100), ts(0));
        assert!(agg.on_tick("BBCA", dec!(9550), dec!(5), ts(10)).is_none());
        assert!(agg.on_tick("TLKM", dec!(3210), dec!(50), ts(10)).is_none());
    }
}
