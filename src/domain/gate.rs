//! Veto gates.
//!
//! Every gate runs and is logged, in definition order, even after one of them
//! has vetoed. The stage outcome is the dominant outcome across all gates; any
//! non-PASS outcome halts the pipeline.

use serde::Serialize;

use crate::domain::reason_log::{Outcome, ReasonLog, Stage};
use crate::domain::regime::Regime;
use crate::domain::snapshot::InputSnapshot;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateThresholds {
    pub min_avg_volume: f64,
    pub max_volatility: f64,
}

impl Default for GateThresholds {
    fn default() -> Self {
        GateThresholds {
            min_avg_volume: 200_000.0,
            max_volatility: 0.45,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateRule {
    LiquidityFloor,
    VolatilityCeiling,
    RegimeMismatch,
    PendingEvent,
    BusinessClarity,
}

impl GateRule {
    /// Evaluation order.
    pub const ALL: [GateRule; 5] = [
        GateRule::LiquidityFloor,
        GateRule::VolatilityCeiling,
        GateRule::RegimeMismatch,
        GateRule::PendingEvent,
        GateRule::BusinessClarity,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            GateRule::LiquidityFloor => "liquidity_floor",
            GateRule::VolatilityCeiling => "volatility_ceiling",
            GateRule::RegimeMismatch => "regime_mismatch",
            GateRule::PendingEvent => "pending_event",
            GateRule::BusinessClarity => "business_clarity",
        }
    }

    fn check(
        &self,
        snapshot: &InputSnapshot,
        regime: Regime,
        thresholds: &GateThresholds,
    ) -> (Outcome, String) {
        let stock = &snapshot.instrument;
        match self {
            GateRule::LiquidityFloor => {
                if stock.avg_volume < thresholds.min_avg_volume {
                    (
                        Outcome::Reject,
                        format!(
                            "average volume {:.0} below liquidity floor {:.0}",
                            stock.avg_volume, thresholds.min_avg_volume
                        ),
                    )
                } else {
                    (Outcome::Pass, "liquidity floor met".to_string())
                }
            }
            GateRule::VolatilityCeiling => {
                if stock.volatility_annual > thresholds.max_volatility {
                    (
                        Outcome::Wait,
                        format!(
                            "annual volatility {:.2} above ceiling {:.2}",
                            stock.volatility_annual, thresholds.max_volatility
                        ),
                    )
                } else {
                    (Outcome::Pass, "volatility within ceiling".to_string())
                }
            }
            GateRule::RegimeMismatch => {
                if regime == Regime::RiskOff && !stock.sector_defensive {
                    (
                        Outcome::Reject,
                        "non-defensive instrument in a RISK_OFF regime".to_string(),
                    )
                } else {
                    (Outcome::Pass, format!("instrument fits {regime} regime"))
                }
            }
            GateRule::PendingEvent => {
                if !stock.has_pending_event() {
                    return (Outcome::Pass, "no pending events".to_string());
                }
                let reason = match (stock.earnings_risk, stock.regulatory_risk) {
                    (true, true) => "earnings and regulatory events pending",
                    (true, false) => "earnings event pending",
                    _ => "regulatory event pending",
                };
                (Outcome::Wait, reason.to_string())
            }
            GateRule::BusinessClarity => match stock.business_clarity {
                Some(true) => (Outcome::Pass, "business model is clear".to_string()),
                Some(false) => (
                    Outcome::Reject,
                    "business model cannot be explained".to_string(),
                ),
                None => (
                    Outcome::Wait,
                    "business-clarity signal missing".to_string(),
                ),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateResult {
    pub rule: GateRule,
    pub passed: bool,
    pub outcome: Outcome,
    pub failure_reason: Option<String>,
}

/// Run all gates and append one log entry per gate.
pub fn evaluate(
    snapshot: &InputSnapshot,
    regime: Regime,
    thresholds: &GateThresholds,
    log: &mut ReasonLog,
) -> (Outcome, Vec<GateResult>) {
    let mut results = Vec::with_capacity(GateRule::ALL.len());
    for rule in GateRule::ALL {
        let (outcome, reason) = rule.check(snapshot, regime, thresholds);
        log.record(Stage::Gate, rule.id(), outcome, reason.clone());
        let passed = outcome == Outcome::Pass;
        results.push(GateResult {
            rule,
            passed,
            outcome,
            failure_reason: (!passed).then_some(reason),
        });
    }
    let verdict = Outcome::dominant(results.iter().map(|r| r.outcome));
    (verdict, results)
}
