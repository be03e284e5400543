//! Entry triggers, one rule set per candidate type.
//!
//! A confirmation that has not happened yet (volume, moving-average support)
//! is pending; a breached entry volatility ceiling is failed. Stage outcome:
//! all met is PASS, otherwise any pending is WAIT, otherwise REJECT.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::candidate::CandidateType;
use crate::domain::reason_log::{Outcome, ReasonLog, Stage};
use crate::domain::snapshot::InstrumentSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovingAverage {
    Ma50,
    Ma200,
}

impl MovingAverage {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovingAverage::Ma50 => "ma_50",
            MovingAverage::Ma200 => "ma_200",
        }
    }

    pub fn value(&self, stock: &InstrumentSnapshot) -> f64 {
        match self {
            MovingAverage::Ma50 => stock.ma_50,
            MovingAverage::Ma200 => stock.ma_200,
        }
    }
}

impl std::str::FromStr for MovingAverage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ma_50" | "ma50" => Ok(MovingAverage::Ma50),
            "ma_200" | "ma200" => Ok(MovingAverage::Ma200),
            other => Err(format!("unknown moving average: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryThresholds {
    /// Volume must reach this multiple of average volume.
    pub volume_multiple: f64,
    /// Price must close above this average.
    pub support: MovingAverage,
    pub max_volatility: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryConfig {
    pub trend_pullback: EntryThresholds,
    pub mean_reversion: EntryThresholds,
    pub defensive_income: EntryThresholds,
}

impl EntryConfig {
    pub fn for_type(&self, candidate: CandidateType) -> &EntryThresholds {
        match candidate {
            CandidateType::TrendPullback => &self.trend_pullback,
            CandidateType::MeanReversion => &self.mean_reversion,
            CandidateType::DefensiveIncome => &self.defensive_income,
        }
    }

    pub fn for_type_mut(&mut self, candidate: CandidateType) -> &mut EntryThresholds {
        match candidate {
            CandidateType::TrendPullback => &mut self.trend_pullback,
            CandidateType::MeanReversion => &mut self.mean_reversion,
            CandidateType::DefensiveIncome => &mut self.defensive_income,
        }
    }
}

impl Default for EntryConfig {
    fn default() -> Self {
        EntryConfig {
            trend_pullback: EntryThresholds {
                volume_multiple: 1.2,
                support: MovingAverage::Ma50,
                max_volatility: 0.45,
            },
            mean_reversion: EntryThresholds {
                volume_multiple: 1.3,
                support: MovingAverage::Ma50,
                max_volatility: 0.45,
            },
            defensive_income: EntryThresholds {
                volume_multiple: 1.0,
                support: MovingAverage::Ma200,
                max_volatility: 0.25,
            },
        }
    }
}

/// The kind of confirmation a trigger looks for; shared across candidate types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    VolumeConfirmation,
    MovingAverageSupport,
    VolatilityCeiling,
}

impl TriggerKind {
    pub const ALL: [TriggerKind; 3] = [
        TriggerKind::VolumeConfirmation,
        TriggerKind::MovingAverageSupport,
        TriggerKind::VolatilityCeiling,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerKind::VolumeConfirmation => "volume_confirmation",
            TriggerKind::MovingAverageSupport => "moving_average_support",
            TriggerKind::VolatilityCeiling => "volatility_ceiling",
        }
    }

    /// Parse the trigger kind back out of a rule id such as `trend_pullback.volume_confirmation`.
    pub fn from_rule_id(rule: &str) -> Option<TriggerKind> {
        let suffix = rule.rsplit('.').next()?;
        TriggerKind::ALL.into_iter().find(|k| k.as_str() == suffix)
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryCheck {
    Met,
    Pending,
    Failed,
}

impl EntryCheck {
    fn outcome(self) -> Outcome {
        match self {
            EntryCheck::Met => Outcome::Pass,
            EntryCheck::Pending => Outcome::Wait,
            EntryCheck::Failed => Outcome::Reject,
        }
    }
}

type TriggerFn = fn(&InstrumentSnapshot, &EntryThresholds) -> (EntryCheck, String);

#[derive(Clone, Copy)]
pub struct EntryRule {
    pub candidate: CandidateType,
    pub kind: TriggerKind,
    check: TriggerFn,
}

impl EntryRule {
    pub fn id(&self) -> String {
        format!("{}.{}", self.candidate.key(), self.kind)
    }
}

impl fmt::Debug for EntryRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryRule").field("id", &self.id()).finish()
    }
}

fn volume_confirmation(stock: &InstrumentSnapshot, t: &EntryThresholds) -> (EntryCheck, String) {
    let required = stock.avg_volume * t.volume_multiple;
    if stock.volume >= required {
        (
            EntryCheck::Met,
            format!(
                "volume {:.0} confirms at {:.1}x average",
                stock.volume, t.volume_multiple
            ),
        )
    } else {
        (
            EntryCheck::Pending,
            format!(
                "volume {:.0} short of {:.1}x average ({:.0})",
                stock.volume, t.volume_multiple, required
            ),
        )
    }
}

fn moving_average_support(
    stock: &InstrumentSnapshot,
    t: &EntryThresholds,
) -> (EntryCheck, String) {
    let average = t.support.value(stock);
    if stock.price > average {
        (
            EntryCheck::Met,
            format!(
                "price {:.2} holds above {} {:.2}",
                stock.price,
                t.support.as_str(),
                average
            ),
        )
    } else {
        (
            EntryCheck::Pending,
            format!(
                "price {:.2} has not reclaimed {} {:.2}",
                stock.price,
                t.support.as_str(),
                average
            ),
        )
    }
}

fn volatility_ceiling(stock: &InstrumentSnapshot, t: &EntryThresholds) -> (EntryCheck, String) {
    if stock.volatility_annual <= t.max_volatility {
        (
            EntryCheck::Met,
            format!(
                "volatility {:.2} within entry ceiling {:.2}",
                stock.volatility_annual, t.max_volatility
            ),
        )
    } else {
        (
            EntryCheck::Failed,
            format!(
                "volatility {:.2} breaches entry ceiling {:.2}",
                stock.volatility_annual, t.max_volatility
            ),
        )
    }
}

/// Entry rule set owned by a candidate type, in evaluation order.
pub fn rules_for(candidate: CandidateType) -> Vec<EntryRule> {
    let rule = |kind: TriggerKind, check: TriggerFn| EntryRule {
        candidate,
        kind,
        check,
    };
    match candidate {
        CandidateType::TrendPullback | CandidateType::MeanReversion => vec![
            rule(TriggerKind::VolumeConfirmation, volume_confirmation),
            rule(TriggerKind::MovingAverageSupport, moving_average_support),
            rule(TriggerKind::VolatilityCeiling, volatility_ceiling),
        ],
        // Defensive names confirm on the long-term trend before volume.
        CandidateType::DefensiveIncome => vec![
            rule(TriggerKind::MovingAverageSupport, moving_average_support),
            rule(TriggerKind::VolumeConfirmation, volume_confirmation),
            rule(TriggerKind::VolatilityCeiling, volatility_ceiling),
        ],
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EntrySignal {
    pub triggered: bool,
    pub conditions_met: Vec<String>,
    pub conditions_pending: Vec<String>,
    pub conditions_failed: Vec<String>,
}

impl EntrySignal {
    pub fn outcome(&self) -> Outcome {
        if self.triggered {
            Outcome::Pass
        } else if !self.conditions_pending.is_empty() {
            Outcome::Wait
        } else {
            Outcome::Reject
        }
    }
}

/// Evaluate every entry rule of the candidate type, logging each one.
pub fn evaluate(
    stock: &InstrumentSnapshot,
    candidate: CandidateType,
    config: &EntryConfig,
    log: &mut ReasonLog,
) -> EntrySignal {
    let thresholds = config.for_type(candidate);
    let mut signal = EntrySignal::default();
    for rule in rules_for(candidate) {
        let (check, reason) = (rule.check)(stock, thresholds);
        let id = rule.id();
        log.record(Stage::Entry, id.clone(), check.outcome(), reason);
        match check {
            EntryCheck::Met => signal.conditions_met.push(id),
            EntryCheck::Pending => signal.conditions_pending.push(id),
            EntryCheck::Failed => signal.conditions_failed.push(id),
        }
    }
    signal.triggered = signal.conditions_pending.is_empty() && signal.conditions_failed.is_empty();
    signal
}
