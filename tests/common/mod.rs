#![allow(dead_code)]

use gatekeeper::domain::error::EngineError;
use gatekeeper::domain::snapshot::{
    InputSnapshot, InstrumentSnapshot, MarketSnapshot, PortfolioContext,
};
use gatekeeper::ports::snapshot_port::SnapshotPort;
use std::collections::HashMap;

pub fn risk_on_market() -> MarketSnapshot {
    MarketSnapshot {
        index_price: 4200.0,
        index_ma_200: 4000.0,
        vix: 18.0,
        rate_trend_up: true,
    }
}

pub fn risk_off_market() -> MarketSnapshot {
    MarketSnapshot {
        index_price: 3800.0,
        index_ma_200: 4000.0,
        vix: 28.0,
        rate_trend_up: false,
    }
}

/// Trend pullback that clears every gate and every entry trigger.
pub fn trend_pullback(ticker: &str) -> InstrumentSnapshot {
    InstrumentSnapshot {
        ticker: ticker.to_string(),
        price: 52.0,
        avg_volume: 500_000.0,
        volume: 650_000.0,
        volatility_annual: 0.2,
        ma_50: 50.0,
        ma_200: 45.0,
        drawdown_6m: -0.12,
        dividend_yield: 0.01,
        earnings_risk: false,
        regulatory_risk: false,
        business_clarity: Some(true),
        sector_defensive: false,
    }
}

/// Qualifies as both TREND_PULLBACK and DEFENSIVE_INCOME.
pub fn ambiguous(ticker: &str) -> InstrumentSnapshot {
    InstrumentSnapshot {
        ticker: ticker.to_string(),
        price: 105.0,
        avg_volume: 1_000_000.0,
        volume: 1_000_000.0,
        volatility_annual: 0.18,
        ma_50: 102.0,
        ma_200: 100.0,
        drawdown_6m: -0.10,
        dividend_yield: 0.03,
        earnings_risk: false,
        regulatory_risk: false,
        business_clarity: Some(true),
        sector_defensive: true,
    }
}

/// Above its long-term average but drawn down too far for any type.
pub fn unclassifiable(ticker: &str) -> InstrumentSnapshot {
    InstrumentSnapshot {
        drawdown_6m: -0.25,
        ..trend_pullback(ticker)
    }
}

pub fn input(instrument: InstrumentSnapshot) -> InputSnapshot {
    InputSnapshot::new(risk_on_market(), instrument, PortfolioContext::default())
}

pub struct MockSnapshotPort {
    pub market: Option<MarketSnapshot>,
    pub instruments: HashMap<String, InstrumentSnapshot>,
    pub errors: HashMap<String, String>,
}

impl MockSnapshotPort {
    pub fn new() -> Self {
        Self {
            market: Some(risk_on_market()),
            instruments: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_instrument(mut self, instrument: InstrumentSnapshot) -> Self {
        self.instruments
            .insert(instrument.ticker.clone(), instrument);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }

    pub fn without_market(mut self) -> Self {
        self.market = None;
        self
    }
}

impl SnapshotPort for MockSnapshotPort {
    fn market(&self) -> Result<MarketSnapshot, EngineError> {
        self.market.clone().ok_or_else(|| EngineError::SnapshotSource {
            reason: "market feed unavailable".into(),
        })
    }

    fn instrument(&self, ticker: &str) -> Result<InstrumentSnapshot, EngineError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(EngineError::SnapshotSource {
                reason: reason.clone(),
            });
        }
        self.instruments
            .get(ticker)
            .cloned()
            .ok_or_else(|| EngineError::SnapshotNotFound {
                ticker: ticker.to_string(),
            })
    }
}
