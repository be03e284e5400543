//! Built-in sample snapshots for demos and offline runs.
//!
//! PG, TSLA and MSFT have fixed profiles; any other ticker gets a generic
//! trend-pullback profile under its own name.

use crate::domain::error::EngineError;
use crate::domain::regime::Regime;
use crate::domain::snapshot::{InstrumentSnapshot, MarketSnapshot, PortfolioContext};
use crate::ports::snapshot_port::SnapshotPort;

#[derive(Debug, Clone, Default)]
pub struct SampleSnapshotAdapter {
    regime: Option<Regime>,
    portfolio: PortfolioContext,
}

impl SampleSnapshotAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve the sample market for `regime` instead of the default risk-on tape.
    pub fn with_regime(mut self, regime: Option<Regime>) -> Self {
        self.regime = regime;
        self
    }

    pub fn with_portfolio(mut self, portfolio: PortfolioContext) -> Self {
        self.portfolio = portfolio;
        self
    }
}

pub fn sample_market(regime: Option<Regime>) -> MarketSnapshot {
    let (index_price, vix, rate_trend_up) = match regime {
        Some(Regime::RiskOn) | None => (4200.0, 18.0, true),
        Some(Regime::Neutral) => (4050.0, 22.0, true),
        Some(Regime::RiskOff) => (3800.0, 28.0, false),
    };
    MarketSnapshot {
        index_price,
        index_ma_200: 4000.0,
        vix,
        rate_trend_up,
    }
}

pub fn sample_instrument(ticker: &str) -> InstrumentSnapshot {
    let ticker = ticker.trim().to_uppercase();
    match ticker.as_str() {
        "PG" => InstrumentSnapshot {
            ticker,
            price: 150.0,
            avg_volume: 4_200_000.0,
            volume: 4_800_000.0,
            volatility_annual: 0.18,
            ma_50: 148.0,
            ma_200: 140.0,
            drawdown_6m: -0.08,
            dividend_yield: 0.035,
            earnings_risk: false,
            regulatory_risk: false,
            business_clarity: Some(true),
            sector_defensive: true,
        },
        "TSLA" => InstrumentSnapshot {
            ticker,
            price: 220.0,
            avg_volume: 8_000_000.0,
            volume: 9_000_000.0,
            volatility_annual: 0.6,
            ma_50: 240.0,
            ma_200: 260.0,
            drawdown_6m: -0.4,
            dividend_yield: 0.0,
            earnings_risk: true,
            regulatory_risk: false,
            business_clarity: Some(true),
            sector_defensive: false,
        },
        "MSFT" => InstrumentSnapshot {
            ticker,
            price: 410.0,
            avg_volume: 3_000_000.0,
            volume: 3_200_000.0,
            volatility_annual: 0.22,
            ma_50: 405.0,
            ma_200: 390.0,
            drawdown_6m: -0.12,
            dividend_yield: 0.008,
            earnings_risk: false,
            regulatory_risk: false,
            business_clarity: Some(true),
            sector_defensive: false,
        },
        _ => InstrumentSnapshot {
            ticker,
            price: 52.0,
            avg_volume: 500_000.0,
            volume: 600_000.0,
            volatility_annual: 0.28,
            ma_50: 50.0,
            ma_200: 45.0,
            drawdown_6m: -0.12,
            dividend_yield: 0.01,
            earnings_risk: false,
            regulatory_risk: false,
            business_clarity: Some(true),
            sector_defensive: false,
        },
    }
}

impl SnapshotPort for SampleSnapshotAdapter {
    fn market(&self) -> Result<MarketSnapshot, EngineError> {
        Ok(sample_market(self.regime))
    }

    fn instrument(&self, ticker: &str) -> Result<InstrumentSnapshot, EngineError> {
        Ok(sample_instrument(ticker))
    }

    fn portfolio(&self, _ticker: &str) -> Result<PortfolioContext, EngineError> {
        Ok(self.portfolio)
    }
}
