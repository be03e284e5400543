//! CLI integration tests for configuration loading and scan orchestration.
//!
//! Tests cover:
//! - Engine config built from INI files on disk, with defaults for missing keys
//! - Malformed and out-of-range config values
//! - Snapshot source selection (built-in samples vs CSV file)
//! - Report writing for a full scan

mod common;

use common::*;
use gatekeeper::adapters::csv_report_adapter::CsvReportAdapter;
use gatekeeper::adapters::file_config_adapter::FileConfigAdapter;
use gatekeeper::adapters::markdown_report_adapter::MarkdownReportAdapter;
use gatekeeper::cli;
use gatekeeper::domain::candidate::CandidateType;
use gatekeeper::domain::config::EngineConfig;
use gatekeeper::domain::decision::Verdict;
use gatekeeper::domain::entry::MovingAverage;
use gatekeeper::domain::error::EngineError;
use gatekeeper::domain::pipeline::DecisionEngine;
use gatekeeper::domain::regime::Regime;
use gatekeeper::domain::scan::{run_scan, ScanStatus, ScanSummary};
use gatekeeper::domain::snapshot::PortfolioContext;
use std::io::Write;
use std::path::PathBuf;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const VALID_INI: &str = r#"
[regime]
risk_on_max_vix = 19.0
risk_off_min_vix = 26.0

[gates]
min_avg_volume = 300000
max_volatility = 0.40

[entry.trend_pullback]
volume_multiple = 1.5
support = ma_200

[sizing]
max_weight = 0.05
tranche_count = 4

[portfolio]
existing_weight = 0.01
available_capital = 0.5
"#;

mod config_loading {
    use super::*;

    #[test]
    fn reads_every_section() {
        let file = write_temp_ini(VALID_INI);
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        let config = cli::build_engine_config(&adapter).unwrap();

        assert_eq!(config.regime.risk_on_max_vix, 19.0);
        assert_eq!(config.regime.risk_off_min_vix, 26.0);
        assert_eq!(config.gates.min_avg_volume, 300_000.0);
        assert_eq!(config.gates.max_volatility, 0.40);

        let tp = config.entry.for_type(CandidateType::TrendPullback);
        assert_eq!(tp.volume_multiple, 1.5);
        assert_eq!(tp.support, MovingAverage::Ma200);
        assert_eq!(
            config.entry.for_type(CandidateType::MeanReversion),
            EngineConfig::default().entry.for_type(CandidateType::MeanReversion)
        );

        assert_eq!(config.sizing.max_weight, 0.05);
        assert_eq!(config.sizing.tranche_count, 4);
        assert_eq!(config.sizing.first_tranche_fraction, 0.25);
    }

    #[test]
    fn empty_file_yields_defaults() {
        let file = write_temp_ini("");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            cli::build_engine_config(&adapter).unwrap(),
            EngineConfig::default()
        );
        assert_eq!(
            cli::build_portfolio_context(&adapter).unwrap(),
            PortfolioContext::default()
        );
    }

    #[test]
    fn portfolio_section() {
        let file = write_temp_ini(VALID_INI);
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        let portfolio = cli::build_portfolio_context(&adapter).unwrap();
        assert_eq!(portfolio.existing_weight, 0.01);
        assert_eq!(portfolio.available_capital, 0.5);
    }

    #[test]
    fn non_numeric_value_is_config_error() {
        let file = write_temp_ini("[gates]\nmin_avg_volume = lots\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        let err = cli::build_engine_config(&adapter).unwrap_err();
        assert!(err.is_config_error());
        assert!(err.to_string().contains("min_avg_volume"));
    }

    #[test]
    fn unknown_support_average_is_config_error() {
        let file = write_temp_ini("[entry.defensive_income]\nsupport = ma_100\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        match cli::build_engine_config(&adapter) {
            Err(EngineError::ConfigInvalid { section, key, .. }) => {
                assert_eq!(section, "entry.defensive_income");
                assert_eq!(key, "support");
            }
            other => panic!("expected ConfigInvalid, got: {other:?}"),
        }
    }

    #[test]
    fn negative_tranche_count_is_config_error() {
        let file = write_temp_ini("[sizing]\ntranche_count = -2\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert!(matches!(
            cli::build_sizing_config(&adapter),
            Err(EngineError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn out_of_range_portfolio_is_config_error() {
        let file = write_temp_ini("[portfolio]\navailable_capital = 1.5\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        let err = cli::build_portfolio_context(&adapter).unwrap_err();
        assert!(err.to_string().contains("available_capital"));
    }

    #[test]
    fn inverted_regime_thresholds_refused_by_engine() {
        let file = write_temp_ini("[regime]\nrisk_on_max_vix = 30\nrisk_off_min_vix = 20\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        let config = cli::build_engine_config(&adapter).unwrap();
        assert!(DecisionEngine::new(config).is_err());
    }

    #[test]
    fn resolve_engine_reads_file() {
        let file = write_temp_ini(VALID_INI);
        let path = PathBuf::from(file.path());
        let (engine, portfolio) = cli::resolve_engine(Some(&path)).unwrap();
        assert_eq!(engine.config().sizing.max_weight, 0.05);
        assert_eq!(portfolio.available_capital, 0.5);
    }

    #[test]
    fn resolve_engine_without_file_uses_defaults() {
        let (engine, portfolio) = cli::resolve_engine(None).unwrap();
        assert_eq!(*engine.config(), EngineConfig::default());
        assert_eq!(portfolio, PortfolioContext::default());
    }

    #[test]
    fn resolve_engine_missing_file_fails() {
        let path = PathBuf::from("/nonexistent/gatekeeper.ini");
        assert!(cli::resolve_engine(Some(&path)).is_err());
    }
}

mod sources {
    use super::*;

    const SNAPSHOT_CSV: &str = "ticker,price,avg_volume,volume,volatility_annual,ma_50,ma_200,drawdown_6m,dividend_yield,earnings_risk,regulatory_risk,business_clarity,sector_defensive,existing_weight
ABC,52,500000,650000,0.2,50,45,-0.12,0.01,false,false,true,false,
DEF,28,350000,300000,0.22,30,32,-0.35,0.04,false,false,true,true,0.08
";

    #[test]
    fn sample_source_by_default() {
        let source = cli::build_source(None, Some(Regime::RiskOff), PortfolioContext::default())
            .unwrap();
        let snapshot = source.snapshot("pg").unwrap();
        assert_eq!(snapshot.instrument.ticker, "PG");
        assert!(snapshot.market.vix > 25.0);
    }

    #[test]
    fn csv_source_uses_portfolio_and_override() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("snapshots.csv");
        std::fs::write(&path, SNAPSHOT_CSV).unwrap();
        let portfolio = PortfolioContext {
            existing_weight: 0.02,
            available_capital: 0.9,
        };

        let source = cli::build_source(Some(&path), None, portfolio).unwrap();
        assert_eq!(source.portfolio("ABC").unwrap(), portfolio);
        assert_eq!(source.portfolio("DEF").unwrap().existing_weight, 0.08);
    }

    #[test]
    fn missing_csv_is_source_error() {
        let path = PathBuf::from("/nonexistent/snapshots.csv");
        let result = cli::build_source(Some(&path), None, PortfolioContext::default());
        assert!(matches!(result, Err(EngineError::SnapshotSource { .. })));
    }
}

mod scan_reports {
    use super::*;

    #[test]
    fn writes_csv_and_markdown() {
        let engine = DecisionEngine::new(EngineConfig::default()).unwrap();
        let source = MockSnapshotPort::new()
            .with_instrument(trend_pullback("ABC"))
            .with_instrument(ambiguous("BOTH"));
        let tickers: Vec<String> = ["ABC", "BOTH", "GONE"].iter().map(|t| t.to_string()).collect();
        let rows = run_scan(&engine, &source, &tickers).unwrap();
        let summary = ScanSummary::from_rows(&rows);

        let dir = tempfile::TempDir::new().unwrap();
        let out = dir.path().join("results");
        let csv = CsvReportAdapter::new();
        let markdown = MarkdownReportAdapter::new(engine.config().entry);
        let paths =
            cli::write_reports(&[&csv, &markdown], &rows, &summary, &out, "scan_test").unwrap();

        assert_eq!(paths, vec![out.join("scan_test.csv"), out.join("scan_test.md")]);
        let csv_text = std::fs::read_to_string(&paths[0]).unwrap();
        assert_eq!(csv_text.lines().count(), 4);
        assert!(csv_text.contains("ABC,APPROVE,TREND_PULLBACK,,NONE,"));
        assert!(csv_text.contains("GONE,DATA_ERROR"));

        let md = std::fs::read_to_string(&paths[1]).unwrap();
        assert!(md.contains("| BOTH | WAIT |"));
        assert!(md.contains("- DATA_ERROR: 1"));
        assert!(!md.contains("no ticker was approved"));
    }

    #[test]
    fn demo_snapshots_approve_then_wait() {
        let engine = DecisionEngine::new(EngineConfig::default()).unwrap();
        let snapshots = cli::demo_snapshots();
        let verdicts: Vec<Verdict> = engine
            .evaluate_all(&snapshots)
            .into_iter()
            .map(|d| d.unwrap().verdict)
            .collect();
        assert_eq!(verdicts, vec![Verdict::Approve, Verdict::Wait]);
    }

    #[test]
    fn validate_accepts_valid_file() {
        let file = write_temp_ini(VALID_INI);
        let code = cli::run_validate(&PathBuf::from(file.path()));
        assert_eq!(code, std::process::ExitCode::SUCCESS);
    }

    #[test]
    fn summary_counts_every_status() {
        let engine = DecisionEngine::new(EngineConfig::default()).unwrap();
        let source = MockSnapshotPort::new().with_instrument(unclassifiable("NOPE"));
        let rows = run_scan(&engine, &source, &["NOPE".to_string()]).unwrap();
        let summary = ScanSummary::from_rows(&rows);
        assert_eq!(summary.statuses.len(), ScanStatus::ALL.len());
        assert_eq!(summary.count(ScanStatus::Decided(Verdict::Wait)), 1);
        assert!(!summary.has_approvals());
    }
}
