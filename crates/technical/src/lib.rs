//! Wyckoff detection pipeline for the trading-signal engine.
//!
//! This crate implements the technical side of pattern detection:
//! - Volume analysis (rolling volume/spread ratios, close position)
//! - Pivot detection, range clustering, Creek/Ice/Jump levels
//! - Supply/demand zone mapping
//! - Trading range detection with overlap arbitration
//! - The seven Wyckoff event detectors (SC, AR, ST, Spring, SOS, LPS, UTAD)
//! - Phase classification (A-E)

pub mod wyckoff;

pub use wyckoff::{
    analyze_volume, detect_events, detect_ranges, read, classify_phase, DetectionConfig, VolumeAnalysis, WyckoffRead,
};
