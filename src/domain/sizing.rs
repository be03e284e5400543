//! Position sizing: volatility-scaled weight ceiling and tranche plan.

use std::fmt;

use serde::Serialize;

use crate::domain::candidate::CandidateType;
use crate::domain::reason_log::{Outcome, ReasonLog, Stage};
use crate::domain::regime::Regime;
use crate::domain::snapshot::InputSnapshot;

pub const RULE_ID: &str = "position_capacity";

/// Floor applied to volatility before scaling so near-zero readings cannot blow up the weight.
const MIN_VOLATILITY: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingConfig {
    /// Absolute weight ceiling, regardless of volatility.
    pub max_weight: f64,
    pub target_volatility: f64,
    pub tranche_count: usize,
    /// Share of `max_weight` placed in the first tranche.
    pub first_tranche_fraction: f64,
    pub risk_cap: f64,
}

impl Default for SizingConfig {
    fn default() -> Self {
        SizingConfig {
            max_weight: 0.08,
            target_volatility: 0.2,
            tranche_count: 3,
            first_tranche_fraction: 1.0 / 3.0,
            risk_cap: 0.02,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvalidationCondition {
    RegimeDeterioration,
    VolatilityBreach,
    LongTrendBreak,
    MediumTrendBreak,
}

impl InvalidationCondition {
    pub fn id(&self) -> &'static str {
        match self {
            InvalidationCondition::RegimeDeterioration => "regime_deterioration",
            InvalidationCondition::VolatilityBreach => "volatility_breach",
            InvalidationCondition::LongTrendBreak => "long_trend_break",
            InvalidationCondition::MediumTrendBreak => "medium_trend_break",
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            InvalidationCondition::RegimeDeterioration => {
                "market regime deteriorates from the regime at entry"
            }
            InvalidationCondition::VolatilityBreach => {
                "annual volatility spikes above the volatility gate ceiling"
            }
            InvalidationCondition::LongTrendBreak => "price closes below its 200-day average",
            InvalidationCondition::MediumTrendBreak => "price loses its 50-day average again",
        }
    }
}

impl fmt::Display for InvalidationCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionPlan {
    pub max_weight: f64,
    pub tranche_count: usize,
    pub tranche_weights: Vec<f64>,
    pub risk_cap: f64,
    pub invalidation_conditions: Vec<InvalidationCondition>,
}

impl PositionPlan {
    pub fn has_capacity(&self) -> bool {
        self.max_weight > 0.0
    }
}

/// Volatility-scaled ceiling, before portfolio headroom is applied.
pub fn volatility_scaled_weight(volatility: f64, config: &SizingConfig) -> f64 {
    let volatility = volatility.max(MIN_VOLATILITY);
    let scaled = config.max_weight * (config.target_volatility / volatility);
    scaled.min(config.max_weight)
}

/// Split `max_weight` into tranches; the last tranche absorbs rounding so the
/// weights always sum to `max_weight`.
pub fn tranche_weights(max_weight: f64, tranche_count: usize, first_fraction: f64) -> Vec<f64> {
    if tranche_count <= 1 {
        return vec![max_weight];
    }
    let first = max_weight * first_fraction;
    let rest = (max_weight - first) / (tranche_count - 1) as f64;
    let mut weights = Vec::with_capacity(tranche_count);
    weights.push(first);
    weights.extend(std::iter::repeat_n(rest, tranche_count - 2));
    let allocated: f64 = weights.iter().sum();
    weights.push(max_weight - allocated);
    weights
}

fn invalidation_conditions(candidate: CandidateType) -> Vec<InvalidationCondition> {
    let trend = match candidate {
        CandidateType::TrendPullback | CandidateType::DefensiveIncome => {
            InvalidationCondition::LongTrendBreak
        }
        CandidateType::MeanReversion => InvalidationCondition::MediumTrendBreak,
    };
    vec![
        InvalidationCondition::RegimeDeterioration,
        InvalidationCondition::VolatilityBreach,
        trend,
    ]
}

/// Build the position plan and append one capacity entry to the log.
pub fn size(
    snapshot: &InputSnapshot,
    regime: Regime,
    candidate: CandidateType,
    config: &SizingConfig,
    log: &mut ReasonLog,
) -> PositionPlan {
    let volatility = snapshot.instrument.volatility_annual;
    let scaled = volatility_scaled_weight(volatility, config);
    let headroom = (config.max_weight - snapshot.portfolio.existing_weight).max(0.0);
    let max_weight = scaled
        .min(headroom)
        .min(snapshot.portfolio.available_capital)
        .max(0.0);

    let plan = PositionPlan {
        max_weight,
        tranche_count: config.tranche_count,
        tranche_weights: tranche_weights(
            max_weight,
            config.tranche_count,
            config.first_tranche_fraction,
        ),
        risk_cap: config.risk_cap,
        invalidation_conditions: invalidation_conditions(candidate),
    };

    if plan.has_capacity() {
        log.record(
            Stage::Sizing,
            RULE_ID,
            Outcome::Pass,
            format!(
                "max weight {:.2}% at volatility {:.2} in {regime}, {} tranches",
                max_weight * 100.0,
                volatility,
                config.tranche_count
            ),
        );
    } else {
        log.record(
            Stage::Sizing,
            RULE_ID,
            Outcome::Wait,
            format!(
                "no capacity: existing weight {:.2}%, available capital {:.2}%",
                snapshot.portfolio.existing_weight * 100.0,
                snapshot.portfolio.available_capital * 100.0
            ),
        );
    }
    plan
}
