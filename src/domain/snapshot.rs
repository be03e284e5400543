//! Input snapshot: one instrument at one point in time.
//!
//! A snapshot is immutable for the duration of an evaluation. Callers must
//! run [`InputSnapshot::validate`] (the pipeline does) before any rule sees it.

use serde::{Deserialize, Serialize};

use crate::domain::error::EngineError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub index_price: f64,
    pub index_ma_200: f64,
    pub vix: f64,
    pub rate_trend_up: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSnapshot {
    pub ticker: String,
    pub price: f64,
    pub avg_volume: f64,
    pub volume: f64,
    pub volatility_annual: f64,
    pub ma_50: f64,
    pub ma_200: f64,
    pub drawdown_6m: f64,
    pub dividend_yield: f64,
    pub earnings_risk: bool,
    pub regulatory_risk: bool,
    /// `None` when no business-clarity assessment exists yet.
    pub business_clarity: Option<bool>,
    pub sector_defensive: bool,
}

impl InstrumentSnapshot {
    /// Price relative to the 200-day moving average.
    pub fn price_to_ma_200(&self) -> f64 {
        self.price / self.ma_200
    }

    /// Absolute distance from the 50-day moving average, as a fraction of it.
    pub fn ma_50_distance(&self) -> f64 {
        (self.price - self.ma_50).abs() / self.ma_50
    }

    /// Latest volume relative to average volume; 0 when there is no average.
    pub fn volume_ratio(&self) -> f64 {
        if self.avg_volume > 0.0 {
            self.volume / self.avg_volume
        } else {
            0.0
        }
    }

    pub fn has_pending_event(&self) -> bool {
        self.earnings_risk || self.regulatory_risk
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioContext {
    /// Weight already held in this instrument.
    pub existing_weight: f64,
    /// Fraction of capital still deployable.
    pub available_capital: f64,
}

impl Default for PortfolioContext {
    fn default() -> Self {
        PortfolioContext {
            existing_weight: 0.0,
            available_capital: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSnapshot {
    pub market: MarketSnapshot,
    pub instrument: InstrumentSnapshot,
    pub portfolio: PortfolioContext,
}

impl InputSnapshot {
    pub fn new(
        market: MarketSnapshot,
        instrument: InstrumentSnapshot,
        portfolio: PortfolioContext,
    ) -> Self {
        InputSnapshot {
            market,
            instrument,
            portfolio,
        }
    }

    /// Reject snapshots that would produce a misleading decision.
    pub fn validate(&self) -> Result<(), EngineError> {
        let m = &self.market;
        positive("market.index_price", m.index_price)?;
        positive("market.index_ma_200", m.index_ma_200)?;
        non_negative("market.vix", m.vix)?;

        let i = &self.instrument;
        if i.ticker.trim().is_empty() {
            return Err(EngineError::invalid_input(
                "instrument.ticker",
                "must not be empty",
            ));
        }
        positive("instrument.price", i.price)?;
        non_negative("instrument.avg_volume", i.avg_volume)?;
        non_negative("instrument.volume", i.volume)?;
        non_negative("instrument.volatility_annual", i.volatility_annual)?;
        positive("instrument.ma_50", i.ma_50)?;
        positive("instrument.ma_200", i.ma_200)?;
        finite("instrument.drawdown_6m", i.drawdown_6m)?;
        if !(-1.0..=0.0).contains(&i.drawdown_6m) {
            return Err(EngineError::invalid_input(
                "instrument.drawdown_6m",
                "must be between -1 and 0",
            ));
        }
        non_negative("instrument.dividend_yield", i.dividend_yield)?;

        let p = &self.portfolio;
        unit_interval("portfolio.existing_weight", p.existing_weight)?;
        unit_interval("portfolio.available_capital", p.available_capital)?;
        Ok(())
    }
}

fn finite(field: &str, value: f64) -> Result<(), EngineError> {
    if !value.is_finite() {
        return Err(EngineError::invalid_input(field, "must be a finite number"));
    }
    Ok(())
}

fn positive(field: &str, value: f64) -> Result<(), EngineError> {
    finite(field, value)?;
    if value <= 0.0 {
        return Err(EngineError::invalid_input(field, "must be positive"));
    }
    Ok(())
}

fn non_negative(field: &str, value: f64) -> Result<(), EngineError> {
    finite(field, value)?;
    if value < 0.0 {
        return Err(EngineError::invalid_input(field, "must be non-negative"));
    }
    Ok(())
}

fn unit_interval(field: &str, value: f64) -> Result<(), EngineError> {
    finite(field, value)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(EngineError::invalid_input(field, "must be between 0 and 1"));
    }
    Ok(())
}
