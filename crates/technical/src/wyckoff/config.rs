//! Tunable thresholds for the detection pipeline (spec §4, SPEC_FULL §4).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[derive(Debug, Clone)]
pub struct DetectionConfig {
    pub volume_lookback: usize,
    pub pivot_lookback: usize,
    pub pivot_tolerance_pct: Decimal,
    pub min_range_width_pct: Decimal,
    pub min_range_duration_bars: usize,
    /// Candidate ranges scoring below this are discarded outright before
    /// levels/zones are ever computed for them.
    pub min_range_quality: u8,
    /// Surviving ranges below this stay FORMING rather than becoming ACTIVE.
    pub range_active_quality: u8,
    pub range_active_duration: usize,

    pub zone_volume_ratio_min: Decimal,
    pub zone_spread_ratio_max: Decimal,
    pub zone_invalidation_volume: Decimal,

    pub sc_volume_threshold: Decimal,
    pub sc_spread_threshold: Decimal,

    pub ar_min_rally_pct: Decimal,

    pub st_max_distance_pct: Decimal,
    pub st_min_volume_reduction_pct: Decimal,
    pub st_max_penetration_pct: Decimal,
    pub st_min_bar_separation: usize,

    pub spring_max_penetration_pct: Decimal,
    pub spring_max_volume_ratio: Decimal,
    pub spring_max_recovery_bars: usize,
    pub spring_invalidation_window_bars: usize,
    pub spring_invalidation_break_pct: Decimal,
    pub spring_stop_pct: Decimal,

    pub sos_volume_stock: Decimal,
    pub sos_volume_forex: Decimal,

    pub lps_stop_pct: Decimal,
    pub sos_direct_stop_pct: Decimal,
    pub lps_wait_bars: usize,
    pub sos_direct_min_confidence: u8,
    pub sos_direct_min_volume: Decimal,

    pub utad_volume_forex: Decimal,
    pub utad_volume_stock: Decimal,
    pub utad_max_penetration_pct: Decimal,
    pub utad_stop_pct: Decimal,

    pub phase_b_min_duration: usize,
    pub phase_e_sustained_closes: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            volume_lookback: 20,
            pivot_lookback: 5,
            pivot_tolerance_pct: dec!(0.02),
            min_range_width_pct: dec!(0.03),
            min_range_duration_bars: 10,
            min_range_quality: 70,
            range_active_quality: 70,
            range_active_duration: 15,

            zone_volume_ratio_min: dec!(1.3),
            zone_spread_ratio_max: dec!(0.8),
            zone_invalidation_volume: dec!(1.5),

            sc_volume_threshold: dec!(2.0),
            sc_spread_threshold: dec!(1.5),

            ar_min_rally_pct: dec!(0.03),

            st_max_distance_pct: dec!(0.05),
            st_min_volume_reduction_pct: dec!(0.20),
            st_max_penetration_pct: dec!(0.02),
            st_min_bar_separation: 2,

            spring_max_penetration_pct: dec!(0.05),
            spring_max_volume_ratio: dec!(0.70),
            spring_max_recovery_bars: 5,
            spring_invalidation_window_bars: 10,
            spring_invalidation_break_pct: dec!(0.05),
            spring_stop_pct: dec!(0.02),

            sos_volume_stock: dec!(1.5),
            sos_volume_forex: dec!(1.8),

            lps_stop_pct: dec!(0.03),
            sos_direct_stop_pct: dec!(0.05),
            lps_wait_bars: 10,
            sos_direct_min_confidence: 80,
            sos_direct_min_volume: dec!(2.0),

            utad_volume_forex: dec!(2.5),
            utad_volume_stock: dec!(2.0),
            utad_max_penetration_pct: dec!(0.05),
            utad_stop_pct: dec!(0.02),

            phase_b_min_duration: 10,
            phase_e_sustained_closes: 10,
        }
    }
}
