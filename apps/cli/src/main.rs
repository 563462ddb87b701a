//! Regression-test runner binary. Connects to the same Postgres
//! database the API serves from, aggregates closed-position metrics
//! for a symbol universe and date window, and compares them against a
//! stored baseline -- grounded on `original_source/backend/scripts/
//! run_regression_test.py`'s `main()` flow and exit-code contract
//! (0=PASS, 1=FAIL, 2=BASELINE_NOT_SET, 3=error).

use chrono::{Days, NaiveDate, Utc};
use clap::Parser;
use jejakcuan_cli::baseline;
use jejakcuan_cli::cli::Args;
use jejakcuan_cli::engine::{RegressionTestConfig, RegressionTestEngine};
use jejakcuan_cli::output::{print_degraded_metrics, print_header, print_metrics, print_status};
use jejakcuan_db::PostgresPositionRepository;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jejakcuan_cli=info".into()),
        )
        .init();

    let args = Args::parse();
    let use_color = !args.no_color;

    match run(&args, use_color).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("regression test failed to run: {err}");
            ExitCode::from(3)
        }
    }
}

async fn run(args: &Args, use_color: bool) -> anyhow::Result<ExitCode> {
    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
    let pool = jejakcuan_db::create_pool(&database_url).await?;
    let engine = RegressionTestEngine::new(PostgresPositionRepository::new(pool));

    let start_date: NaiveDate = args.start_date.parse()?;
    let end_date: NaiveDate = match &args.end_date {
        Some(raw) => raw.parse()?,
        None => (Utc::now().date_naive() - Days::new(1)),
    };

    let config = RegressionTestConfig {
        symbols: args.symbols.split(',').map(|s| s.trim().to_uppercase()).collect(),
        start_date,
        end_date,
        regression_thresholds: RegressionTestConfig::default_thresholds(),
    };

    print_header("Wyckoff Engine Regression Test", use_color);
    let baseline_path = baseline::default_path();
    let result = engine.run(&config, &baseline_path).await?;

    print_status(result.status, use_color);
    print_metrics(&result.aggregate_metrics, use_color);
    print_degraded_metrics(&result.degraded_metrics, &result.comparisons, use_color);

    if args.alert && result.regression_detected {
        eprintln!("ALERT: regression detected against the stored baseline");
    }

    let exit_code: u8 = match result.status {
        "PASS" => 0,
        "FAIL" => 1,
        "BASELINE_NOT_SET" => 2,
        _ => 3,
    };

    if args.establish_baseline {
        if result.status == "FAIL" {
            println!("Cannot establish baseline from FAIL test");
        } else {
            let version = std::env::var("GIT_COMMIT_SHA").unwrap_or_else(|_| "dev".to_string());
            engine.establish_baseline(&result, &version, &baseline_path)?;
        }
    }

    if let Some(output_path) = &args.output {
        let json = serde_json::json!({
            "test_id": result.test_id,
            "test_run_time": result.test_run_time,
            "status": result.status,
            "aggregate_metrics": result.aggregate_metrics,
            "per_symbol_metrics": result.per_symbol_metrics,
            "regression_detected": result.regression_detected,
            "degraded_metrics": result.degraded_metrics,
        });
        std::fs::write(output_path, serde_json::to_string_pretty(&json)?)?;
    }

    Ok(ExitCode::from(exit_code))
}
