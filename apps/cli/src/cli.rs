//! Argument surface for the regression-test runner, grounded on
//! `original_source/backend/scripts/run_regression_test.py`'s
//! `parse_arguments()` (via its unit tests in
//! `tests/unit/scripts/test_run_regression_test.py`).

use clap::Parser;
use std::path::PathBuf;

const DEFAULT_SYMBOLS: &str = "AAPL,MSFT,GOOGL,TSLA,NVDA,META,AMZN,SPY,QQQ,DIA";
const DEFAULT_START_DATE: &str = "2020-01-01";

/// Run a regression test across a symbol universe and compare aggregate
/// trade metrics against the last established baseline.
#[derive(Debug, Parser)]
#[command(name = "jejakcuan-cli", version, about)]
pub struct Args {
    /// Comma-separated symbol universe to test.
    #[arg(long, default_value = DEFAULT_SYMBOLS)]
    pub symbols: String,

    /// Inclusive start of the evaluation window, `YYYY-MM-DD`.
    #[arg(long, default_value = DEFAULT_START_DATE)]
    pub start_date: String,

    /// Inclusive end of the evaluation window, `YYYY-MM-DD`. Defaults to
    /// yesterday when omitted.
    #[arg(long)]
    pub end_date: Option<String>,

    /// Replace the stored baseline with this run's metrics, provided the
    /// run did not FAIL.
    #[arg(long)]
    pub establish_baseline: bool,

    /// Emit an alert banner to stderr when the run regresses.
    #[arg(long)]
    pub alert: bool,

    /// Write the full result as JSON to this path.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Disable ANSI color codes in stdout output.
    #[arg(long)]
    pub no_color: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_arguments() {
        let args = Args::parse_from(["jejakcuan-cli"]);
        assert_eq!(args.symbols, DEFAULT_SYMBOLS);
        assert_eq!(args.start_date, DEFAULT_START_DATE);
        assert_eq!(args.end_date, None);
        assert!(!args.establish_baseline);
        assert!(!args.alert);
        assert_eq!(args.output, None);
        assert!(!args.no_color);
    }

    #[test]
    fn combined_flags() {
        let args = Args::parse_from([
            "jejakcuan-cli",
            "--symbols",
            "SPY,QQQ",
            "--establish-baseline",
            "--alert",
            "--output",
            "test.json",
            "--no-color",
        ]);
        assert_eq!(args.symbols, "SPY,QQQ");
        assert!(args.establish_baseline);
        assert!(args.alert);
        assert_eq!(args.output, Some(PathBuf::from("test.json")));
        assert!(args.no_color);
    }
}
