//! Snapshot source port trait.

use crate::domain::error::EngineError;
use crate::domain::snapshot::{InputSnapshot, InstrumentSnapshot, MarketSnapshot, PortfolioContext};

/// Supplies the point-in-time data one evaluation needs.
pub trait SnapshotPort {
    fn market(&self) -> Result<MarketSnapshot, EngineError>;

    fn instrument(&self, ticker: &str) -> Result<InstrumentSnapshot, EngineError>;

    /// Portfolio context for `ticker`; an empty book by default.
    fn portfolio(&self, _ticker: &str) -> Result<PortfolioContext, EngineError> {
        Ok(PortfolioContext::default())
    }

    fn snapshot(&self, ticker: &str) -> Result<InputSnapshot, EngineError> {
        Ok(InputSnapshot::new(
            self.market()?,
            self.instrument(ticker)?,
            self.portfolio(ticker)?,
        ))
    }
}
