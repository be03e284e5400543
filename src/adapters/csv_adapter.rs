//! CSV file snapshot adapter.
//!
//! One instrument per row, keyed by ticker. The header must name the
//! `InstrumentSnapshot` fields; `business_clarity` may be left empty when no
//! assessment exists, and the optional `existing_weight` column overrides the
//! portfolio context for that ticker.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use crate::domain::error::EngineError;
use crate::domain::snapshot::{InstrumentSnapshot, MarketSnapshot, PortfolioContext};
use crate::ports::snapshot_port::SnapshotPort;

#[derive(Debug, Deserialize)]
struct InstrumentRow {
    ticker: String,
    price: f64,
    avg_volume: f64,
    volume: f64,
    volatility_annual: f64,
    ma_50: f64,
    ma_200: f64,
    drawdown_6m: f64,
    #[serde(default)]
    dividend_yield: f64,
    #[serde(deserialize_with = "any_case_bool")]
    earnings_risk: bool,
    #[serde(deserialize_with = "any_case_bool")]
    regulatory_risk: bool,
    #[serde(default, deserialize_with = "any_case_opt_bool")]
    business_clarity: Option<bool>,
    #[serde(deserialize_with = "any_case_bool")]
    sector_defensive: bool,
    #[serde(default)]
    existing_weight: Option<f64>,
}

fn parse_bool<E: serde::de::Error>(raw: &str) -> Result<bool, E> {
    match raw.trim().to_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(E::custom(format!("expected true or false, got {raw:?}"))),
    }
}

/// Spreadsheet and Python exports write `True`/`FALSE`.
fn any_case_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_bool(&raw)
}

fn any_case_opt_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => parse_bool(&raw).map(Some),
        _ => Ok(None),
    }
}

pub struct CsvSnapshotAdapter {
    market: MarketSnapshot,
    portfolio: PortfolioContext,
    instruments: HashMap<String, (InstrumentSnapshot, Option<f64>)>,
}

impl CsvSnapshotAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P, market: MarketSnapshot) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| EngineError::SnapshotSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        Self::from_reader(content.as_bytes(), market)
    }

    pub fn from_reader<R: std::io::Read>(
        reader: R,
        market: MarketSnapshot,
    ) -> Result<Self, EngineError> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut instruments = HashMap::new();

        for result in rdr.deserialize() {
            let row: InstrumentRow = result.map_err(|e| EngineError::SnapshotSource {
                reason: format!("CSV parse error: {}", e),
            })?;
            let ticker = row.ticker.trim().to_uppercase();
            if ticker.is_empty() {
                return Err(EngineError::SnapshotSource {
                    reason: "row with empty ticker".into(),
                });
            }
            let instrument = InstrumentSnapshot {
                ticker: ticker.clone(),
                price: row.price,
                avg_volume: row.avg_volume,
                volume: row.volume,
                volatility_annual: row.volatility_annual,
                ma_50: row.ma_50,
                ma_200: row.ma_200,
                drawdown_6m: row.drawdown_6m,
                dividend_yield: row.dividend_yield,
                earnings_risk: row.earnings_risk,
                regulatory_risk: row.regulatory_risk,
                business_clarity: row.business_clarity,
                sector_defensive: row.sector_defensive,
            };
            if instruments
                .insert(ticker.clone(), (instrument, row.existing_weight))
                .is_some()
            {
                return Err(EngineError::SnapshotSource {
                    reason: format!("duplicate ticker {ticker}"),
                });
            }
        }

        Ok(Self {
            market,
            portfolio: PortfolioContext::default(),
            instruments,
        })
    }

    pub fn with_portfolio(mut self, portfolio: PortfolioContext) -> Self {
        self.portfolio = portfolio;
        self
    }

    fn lookup(&self, ticker: &str) -> Result<&(InstrumentSnapshot, Option<f64>), EngineError> {
        self.instruments
            .get(&ticker.trim().to_uppercase())
            .ok_or_else(|| EngineError::SnapshotNotFound {
                ticker: ticker.to_string(),
            })
    }
}

impl SnapshotPort for CsvSnapshotAdapter {
    fn market(&self) -> Result<MarketSnapshot, EngineError> {
        Ok(self.market.clone())
    }

    fn instrument(&self, ticker: &str) -> Result<InstrumentSnapshot, EngineError> {
        self.lookup(ticker).map(|(instrument, _)| instrument.clone())
    }

    fn portfolio(&self, ticker: &str) -> Result<PortfolioContext, EngineError> {
        let (_, existing_weight) = self.lookup(ticker)?;
        Ok(PortfolioContext {
            existing_weight: existing_weight.unwrap_or(self.portfolio.existing_weight),
            ..self.portfolio
        })
    }
}
