//! Market regime classification from index trend and volatility index.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::snapshot::MarketSnapshot;

pub const RULE_ID: &str = "market_regime";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Regime {
    RiskOn,
    Neutral,
    RiskOff,
}

impl Regime {
    pub const ALL: [Regime; 3] = [Regime::RiskOn, Regime::Neutral, Regime::RiskOff];

    pub fn as_str(&self) -> &'static str {
        match self {
            Regime::RiskOn => "RISK_ON",
            Regime::Neutral => "NEUTRAL",
            Regime::RiskOff => "RISK_OFF",
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Regime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "RISK_ON" => Ok(Regime::RiskOn),
            "NEUTRAL" => Ok(Regime::Neutral),
            "RISK_OFF" => Ok(Regime::RiskOff),
            other => Err(format!("unknown regime: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegimeThresholds {
    /// VIX must be strictly below this for RISK_ON.
    pub risk_on_max_vix: f64,
    /// VIX must be strictly above this for RISK_OFF.
    pub risk_off_min_vix: f64,
}

impl Default for RegimeThresholds {
    fn default() -> Self {
        RegimeThresholds {
            risk_on_max_vix: 20.0,
            risk_off_min_vix: 25.0,
        }
    }
}

/// Classify the market and describe why.
pub fn classify(market: &MarketSnapshot, thresholds: &RegimeThresholds) -> (Regime, String) {
    let above_trend = market.index_price > market.index_ma_200;
    let below_trend = market.index_price < market.index_ma_200;

    if above_trend && market.vix < thresholds.risk_on_max_vix {
        (
            Regime::RiskOn,
            format!(
                "index above its 200-day average and VIX {:.1} below {:.1}",
                market.vix, thresholds.risk_on_max_vix
            ),
        )
    } else if below_trend && market.vix > thresholds.risk_off_min_vix {
        (
            Regime::RiskOff,
            format!(
                "index below its 200-day average and VIX {:.1} above {:.1}",
                market.vix, thresholds.risk_off_min_vix
            ),
        )
    } else {
        // Mixed or indeterminate signals, including an index sitting exactly on its average.
        (
            Regime::Neutral,
            format!(
                "trend and volatility signals are mixed (VIX {:.1})",
                market.vix
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn market(index_price: f64, vix: f64) -> MarketSnapshot {
        MarketSnapshot {
            index_price,
            index_ma_200: 4000.0,
            vix,
            rate_trend_up: true,
        }
    }

    #[test]
    fn risk_on_above_trend_low_vix() {
        let (regime, reason) = classify(&market(4200.0, 18.0), &RegimeThresholds::default());
        assert_eq!(regime, Regime::RiskOn);
        assert!(reason.contains("above"));
    }

    #[test]
    fn risk_off_below_trend_high_vix() {
        let (regime, _) = classify(&market(3800.0, 28.0), &RegimeThresholds::default());
        assert_eq!(regime, Regime::RiskOff);
    }

    #[test]
    fn neutral_when_signals_mixed() {
        let t = RegimeThresholds::default();
        assert_eq!(classify(&market(4050.0, 22.0), &t).0, Regime::Neutral);
        assert_eq!(classify(&market(3800.0, 18.0), &t).0, Regime::Neutral);
        assert_eq!(classify(&market(4200.0, 28.0), &t).0, Regime::Neutral);
    }

    #[test]
    fn neutral_on_exact_boundaries() {
        let t = RegimeThresholds::default();
        assert_eq!(classify(&market(4000.0, 10.0), &t).0, Regime::Neutral);
        assert_eq!(classify(&market(4200.0, 20.0), &t).0, Regime::Neutral);
        assert_eq!(classify(&market(3800.0, 25.0), &t).0, Regime::Neutral);
    }

    #[test]
    fn thresholds_are_configurable() {
        let t = RegimeThresholds {
            risk_on_max_vix: 30.0,
            risk_off_min_vix: 35.0,
        };
        assert_eq!(classify(&market(4200.0, 28.0), &t).0, Regime::RiskOn);
    }

    #[test]
    fn parse_regime_labels() {
        assert_eq!("risk_on".parse::<Regime>().unwrap(), Regime::RiskOn);
        assert_eq!("NEUTRAL".parse::<Regime>().unwrap(), Regime::Neutral);
        assert_eq!(" RISK_OFF ".parse::<Regime>().unwrap(), Regime::RiskOff);
        assert!("sideways".parse::<Regime>().is_err());
    }
}
