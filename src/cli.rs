//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::console_renderer::{render_json, render_text};
use crate::adapters::csv_adapter::CsvSnapshotAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::markdown_report_adapter::MarkdownReportAdapter;
use crate::adapters::sample_adapter::{sample_market, SampleSnapshotAdapter};
use crate::domain::candidate::{CandidateType, ClassificationThresholds};
use crate::domain::config::EngineConfig;
use crate::domain::config_validation::validate_engine_config;
use crate::domain::entry::{EntryConfig, MovingAverage};
use crate::domain::error::EngineError;
use crate::domain::gate::GateThresholds;
use crate::domain::pipeline::DecisionEngine;
use crate::domain::regime::{Regime, RegimeThresholds};
use crate::domain::scan::{run_scan as scan_universe, ScanSummary};
use crate::domain::sizing::SizingConfig;
use crate::domain::snapshot::{InputSnapshot, InstrumentSnapshot, PortfolioContext};
use crate::domain::universe::load_tickers;
use crate::ports::config_port::ConfigPort;
use crate::ports::report_port::ReportPort;
use crate::ports::snapshot_port::SnapshotPort;

#[derive(Parser, Debug)]
#[command(name = "gatekeeper", about = "Rule-based trade decision engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate one ticker and print the decision
    Evaluate {
        #[arg(short, long)]
        ticker: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// CSV file of instrument snapshots; built-in samples when omitted
        #[arg(short, long)]
        snapshots: Option<PathBuf>,
        /// RISK_ON, NEUTRAL or RISK_OFF sample market
        #[arg(long)]
        market_regime: Option<Regime>,
        #[arg(long)]
        json: bool,
    },
    /// Evaluate a list of tickers and write CSV and Markdown reports
    Scan {
        /// Comma-separated tickers, or a file with one ticker per line
        #[arg(long)]
        tickers: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        snapshots: Option<PathBuf>,
        #[arg(long)]
        market_regime: Option<Regime>,
        #[arg(short, long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Validate an engine configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Evaluate two built-in sample instruments
    Demo,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Evaluate {
            ticker,
            config,
            snapshots,
            market_regime,
            json,
        } => run_evaluate(
            &ticker,
            config.as_ref(),
            snapshots.as_ref(),
            market_regime,
            json,
        ),
        Command::Scan {
            tickers,
            config,
            snapshots,
            market_regime,
            output_dir,
        } => run_scan(
            &tickers,
            config.as_ref(),
            snapshots.as_ref(),
            market_regime,
            &output_dir,
        ),
        Command::Validate { config } => run_validate(&config),
        Command::Demo => run_demo(),
    }
}

fn fail(e: &EngineError) -> ExitCode {
    eprintln!("error: {e}");
    e.into()
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| fail(&e))
}

pub fn build_regime_thresholds(adapter: &dyn ConfigPort) -> Result<RegimeThresholds, EngineError> {
    let d = RegimeThresholds::default();
    Ok(RegimeThresholds {
        risk_on_max_vix: adapter.get_double("regime", "risk_on_max_vix", d.risk_on_max_vix)?,
        risk_off_min_vix: adapter.get_double("regime", "risk_off_min_vix", d.risk_off_min_vix)?,
    })
}

pub fn build_gate_thresholds(adapter: &dyn ConfigPort) -> Result<GateThresholds, EngineError> {
    let d = GateThresholds::default();
    Ok(GateThresholds {
        min_avg_volume: adapter.get_double("gates", "min_avg_volume", d.min_avg_volume)?,
        max_volatility: adapter.get_double("gates", "max_volatility", d.max_volatility)?,
    })
}

pub fn build_classification_thresholds(
    adapter: &dyn ConfigPort,
) -> Result<ClassificationThresholds, EngineError> {
    let d = ClassificationThresholds::default();
    let get = |key: &str, default: f64| adapter.get_double("classification", key, default);
    Ok(ClassificationThresholds {
        trend_pullback_drawdown_min: get(
            "trend_pullback_drawdown_min",
            d.trend_pullback_drawdown_min,
        )?,
        trend_pullback_drawdown_max: get(
            "trend_pullback_drawdown_max",
            d.trend_pullback_drawdown_max,
        )?,
        mean_reversion_drawdown_max: get(
            "mean_reversion_drawdown_max",
            d.mean_reversion_drawdown_max,
        )?,
        defensive_drawdown_min: get("defensive_drawdown_min", d.defensive_drawdown_min)?,
        defensive_max_volatility: get("defensive_max_volatility", d.defensive_max_volatility)?,
        defensive_price_band_low: get("defensive_price_band_low", d.defensive_price_band_low)?,
        defensive_price_band_high: get("defensive_price_band_high", d.defensive_price_band_high)?,
        defensive_max_ma_50_distance: get(
            "defensive_max_ma_50_distance",
            d.defensive_max_ma_50_distance,
        )?,
        defensive_max_volume_ratio: get(
            "defensive_max_volume_ratio",
            d.defensive_max_volume_ratio,
        )?,
    })
}

pub fn build_entry_config(adapter: &dyn ConfigPort) -> Result<EntryConfig, EngineError> {
    let mut config = EntryConfig::default();
    for candidate in CandidateType::ALL {
        let section = format!("entry.{}", candidate.key());
        let t = config.for_type_mut(candidate);
        t.volume_multiple = adapter.get_double(&section, "volume_multiple", t.volume_multiple)?;
        t.max_volatility = adapter.get_double(&section, "max_volatility", t.max_volatility)?;
        if let Some(raw) = adapter.get_string(&section, "support") {
            t.support = raw
                .parse::<MovingAverage>()
                .map_err(|reason| EngineError::config_invalid(&section, "support", reason))?;
        }
    }
    Ok(config)
}

pub fn build_sizing_config(adapter: &dyn ConfigPort) -> Result<SizingConfig, EngineError> {
    let d = SizingConfig::default();
    let raw_count = adapter.get_int("sizing", "tranche_count", d.tranche_count as i64)?;
    let tranche_count = usize::try_from(raw_count).map_err(|_| {
        EngineError::config_invalid("sizing", "tranche_count", "tranche_count must be positive")
    })?;
    // An unset first tranche follows the configured count, not the default one.
    let first_default = 1.0 / tranche_count.max(1) as f64;
    Ok(SizingConfig {
        max_weight: adapter.get_double("sizing", "max_weight", d.max_weight)?,
        target_volatility: adapter.get_double("sizing", "target_volatility", d.target_volatility)?,
        tranche_count,
        first_tranche_fraction: adapter.get_double(
            "sizing",
            "first_tranche_fraction",
            first_default,
        )?,
        risk_cap: adapter.get_double("sizing", "risk_cap", d.risk_cap)?,
    })
}

/// Read every engine section; missing keys take their defaults.
pub fn build_engine_config(adapter: &dyn ConfigPort) -> Result<EngineConfig, EngineError> {
    Ok(EngineConfig {
        regime: build_regime_thresholds(adapter)?,
        gates: build_gate_thresholds(adapter)?,
        classification: build_classification_thresholds(adapter)?,
        entry: build_entry_config(adapter)?,
        sizing: build_sizing_config(adapter)?,
    })
}

pub fn build_portfolio_context(adapter: &dyn ConfigPort) -> Result<PortfolioContext, EngineError> {
    let d = PortfolioContext::default();
    let existing_weight = adapter.get_double("portfolio", "existing_weight", d.existing_weight)?;
    let available_capital =
        adapter.get_double("portfolio", "available_capital", d.available_capital)?;
    for (key, value) in [
        ("existing_weight", existing_weight),
        ("available_capital", available_capital),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(EngineError::config_invalid(
                "portfolio",
                key,
                format!("{key} must be between 0 and 1"),
            ));
        }
    }
    Ok(PortfolioContext {
        existing_weight,
        available_capital,
    })
}

/// Build a validated engine and portfolio context, from defaults when no file is given.
pub fn resolve_engine(
    config_path: Option<&PathBuf>,
) -> Result<(DecisionEngine, PortfolioContext), ExitCode> {
    let Some(path) = config_path else {
        return DecisionEngine::new(EngineConfig::default())
            .map(|engine| (engine, PortfolioContext::default()))
            .map_err(|e| fail(&e));
    };
    eprintln!("Loading config from {}", path.display());
    let adapter = load_config(path)?;
    let config = build_engine_config(&adapter).map_err(|e| fail(&e))?;
    let portfolio = build_portfolio_context(&adapter).map_err(|e| fail(&e))?;
    let engine = DecisionEngine::new(config).map_err(|e| fail(&e))?;
    Ok((engine, portfolio))
}

pub fn build_source(
    snapshots: Option<&PathBuf>,
    regime: Option<Regime>,
    portfolio: PortfolioContext,
) -> Result<Box<dyn SnapshotPort>, EngineError> {
    match snapshots {
        Some(path) => {
            eprintln!("Loading snapshots from {}", path.display());
            let adapter = CsvSnapshotAdapter::from_file(path, sample_market(regime))?
                .with_portfolio(portfolio);
            Ok(Box::new(adapter))
        }
        None => Ok(Box::new(
            SampleSnapshotAdapter::new()
                .with_regime(regime)
                .with_portfolio(portfolio),
        )),
    }
}

fn run_evaluate(
    ticker: &str,
    config_path: Option<&PathBuf>,
    snapshots: Option<&PathBuf>,
    regime: Option<Regime>,
    json: bool,
) -> ExitCode {
    let (engine, portfolio) = match resolve_engine(config_path) {
        Ok(e) => e,
        Err(code) => return code,
    };
    let source = match build_source(snapshots, regime, portfolio) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    let snapshot = match source.snapshot(ticker) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    let decision = match engine.evaluate(&snapshot) {
        Ok(d) => d,
        Err(e) => return fail(&e),
    };

    print!("{}", render_text(&format!("Ticker {}", decision.ticker), &decision));
    if json {
        match render_json(&decision, regime) {
            Ok(text) => {
                println!("(4) JSON");
                println!("{text}");
            }
            Err(e) => return fail(&e),
        }
    }
    ExitCode::SUCCESS
}

/// Write one report per adapter into `dir`, returning the paths written.
pub fn write_reports(
    reports: &[&dyn ReportPort],
    rows: &[crate::domain::scan::ScanRow],
    summary: &ScanSummary,
    dir: &Path,
    stem: &str,
) -> Result<Vec<PathBuf>, EngineError> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(reports.len());
    for report in reports {
        let path = dir.join(format!("{stem}.{}", report.extension()));
        report.write(rows, summary, &path)?;
        written.push(path);
    }
    Ok(written)
}

fn run_scan(
    tickers_arg: &str,
    config_path: Option<&PathBuf>,
    snapshots: Option<&PathBuf>,
    regime: Option<Regime>,
    output_dir: &Path,
) -> ExitCode {
    let tickers = match load_tickers(tickers_arg) {
        Ok(t) => t,
        Err(e) => return fail(&EngineError::from(e)),
    };
    let (engine, portfolio) = match resolve_engine(config_path) {
        Ok(e) => e,
        Err(code) => return code,
    };
    let source = match build_source(snapshots, regime, portfolio) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    eprintln!("Scanning {} tickers...", tickers.len());
    let rows = match scan_universe(&engine, source.as_ref(), &tickers) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };
    let summary = ScanSummary::from_rows(&rows);

    eprintln!("\n=== Scan Summary ===");
    for (status, count) in &summary.statuses {
        eprintln!("  {:<11} {}", status.as_str(), count);
    }

    let stem = format!("scan_{}", chrono::Local::now().format("%Y%m%d_%H%M"));
    let csv = CsvReportAdapter::new();
    let markdown = MarkdownReportAdapter::new(engine.config().entry);
    match write_reports(&[&csv, &markdown], &rows, &summary, output_dir, &stem) {
        Ok(paths) => {
            for path in paths {
                println!("Saved: {}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

pub fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let config = match build_engine_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    if let Err(e) = validate_engine_config(&config) {
        return fail(&e);
    }
    if let Err(e) = build_portfolio_context(&adapter) {
        return fail(&e);
    }
    let sizing = &config.sizing;
    eprintln!("Config is valid");
    eprintln!(
        "  Regime:  RISK_ON below VIX {:.1}, RISK_OFF above VIX {:.1}",
        config.regime.risk_on_max_vix, config.regime.risk_off_min_vix
    );
    eprintln!(
        "  Gates:   avg volume >= {:.0}, volatility <= {:.2}",
        config.gates.min_avg_volume, config.gates.max_volatility
    );
    eprintln!(
        "  Sizing:  max weight {:.2}%, {} tranches, risk cap {:.2}%",
        sizing.max_weight * 100.0,
        sizing.tranche_count,
        sizing.risk_cap * 100.0
    );
    ExitCode::SUCCESS
}

/// Two fixed instruments against the risk-on sample market: one approves, one waits.
pub fn demo_snapshots() -> Vec<InputSnapshot> {
    let market = sample_market(Some(Regime::RiskOn));
    let abc = InstrumentSnapshot {
        ticker: "ABC".into(),
        price: 52.0,
        avg_volume: 500_000.0,
        volume: 750_000.0,
        volatility_annual: 0.28,
        ma_50: 50.0,
        ma_200: 45.0,
        drawdown_6m: -0.12,
        dividend_yield: 0.01,
        earnings_risk: false,
        regulatory_risk: false,
        business_clarity: Some(true),
        sector_defensive: false,
    };
    let def = InstrumentSnapshot {
        ticker: "DEF".into(),
        price: 28.0,
        avg_volume: 350_000.0,
        volume: 300_000.0,
        volatility_annual: 0.22,
        ma_50: 30.0,
        ma_200: 32.0,
        drawdown_6m: -0.35,
        dividend_yield: 0.04,
        earnings_risk: false,
        regulatory_risk: false,
        business_clarity: Some(true),
        sector_defensive: true,
    };
    [abc, def]
        .into_iter()
        .map(|i| InputSnapshot::new(market.clone(), i, PortfolioContext::default()))
        .collect()
}

fn run_demo() -> ExitCode {
    let engine = match DecisionEngine::new(EngineConfig::default()) {
        Ok(e) => e,
        Err(e) => return fail(&e),
    };
    let snapshots = demo_snapshots();
    for (snapshot, result) in snapshots.iter().zip(engine.evaluate_all(&snapshots)) {
        match result {
            Ok(decision) => print!(
                "{}",
                render_text(&format!("Sample {}", snapshot.instrument.ticker), &decision)
            ),
            Err(e) => return fail(&e),
        }
    }
    ExitCode::SUCCESS
}
