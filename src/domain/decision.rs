//! Final decision record and its assembly from stage outcomes.

use std::fmt;

use serde::Serialize;

use crate::domain::candidate::CandidateType;
use crate::domain::entry::EntrySignal;
use crate::domain::gate::GateResult;
use crate::domain::reason_log::{Outcome, ReasonLog, Stage};
use crate::domain::regime::Regime;
use crate::domain::sizing::{InvalidationCondition, PositionPlan};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Approve,
    Wait,
    Reject,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Approve => "APPROVE",
            Verdict::Wait => "WAIT",
            Verdict::Reject => "REJECT",
        }
    }

    fn from_outcome(outcome: Outcome) -> Verdict {
        match outcome {
            Outcome::Pass => Verdict::Approve,
            Outcome::Wait => Verdict::Wait,
            Outcome::Reject => Verdict::Reject,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Prohibition {
    SingleIndicatorEntry,
    DiscretionaryOverride,
}

impl Prohibition {
    pub const ALL: [Prohibition; 2] = [
        Prohibition::SingleIndicatorEntry,
        Prohibition::DiscretionaryOverride,
    ];

    pub fn describe(&self) -> &'static str {
        match self {
            Prohibition::SingleIndicatorEntry => "no entries justified by a single indicator",
            Prohibition::DiscretionaryOverride => "no emotional or discretionary overrides",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionPlan {
    pub candidate_type: CandidateType,
    pub primary_entry_condition: String,
    pub additional_entry_conditions: Vec<String>,
    pub max_weight: f64,
    pub tranche_weights: Vec<f64>,
    pub risk_cap: f64,
    pub invalidation_conditions: Vec<InvalidationCondition>,
    pub prohibitions: Vec<Prohibition>,
}

impl ActionPlan {
    fn build(candidate: CandidateType, entry: &EntrySignal, plan: &PositionPlan) -> ActionPlan {
        let first = plan.tranche_weights.first().copied().unwrap_or(plan.max_weight);
        let mut additional = entry.conditions_met.clone();
        if plan.tranche_count > 1 {
            additional.push(format!(
                "re-confirm all {candidate} entry conditions before each of the remaining {} tranches",
                plan.tranche_count - 1
            ));
        }
        ActionPlan {
            candidate_type: candidate,
            primary_entry_condition: format!(
                "enter first tranche of {:.2}% while {candidate} entry conditions hold",
                first * 100.0
            ),
            additional_entry_conditions: additional,
            max_weight: plan.max_weight,
            tranche_weights: plan.tranche_weights.clone(),
            risk_cap: plan.risk_cap,
            invalidation_conditions: plan.invalidation_conditions.clone(),
            prohibitions: Prohibition::ALL.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageOutcome {
    pub stage: Stage,
    pub outcome: Outcome,
}

impl StageOutcome {
    pub fn new(stage: Stage, outcome: Outcome) -> Self {
        StageOutcome { stage, outcome }
    }
}

/// Artifacts produced by the stages that ran.
#[derive(Debug, Clone, Default)]
pub struct StageOutputs {
    pub gate_results: Vec<GateResult>,
    pub candidate_type: Option<CandidateType>,
    pub entry_signal: Option<EntrySignal>,
    pub position_plan: Option<PositionPlan>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub ticker: String,
    pub verdict: Verdict,
    pub regime: Regime,
    pub candidate_type: Option<CandidateType>,
    /// One result per gate, in evaluation order.
    pub gate_results: Vec<GateResult>,
    /// Stage that stopped the pipeline; `None` on approval.
    pub halted_at: Option<Stage>,
    pub reason_log: ReasonLog,
    pub action_plan: Option<ActionPlan>,
}

/// Resolve stage outcomes into a decision: REJECT dominates WAIT dominates APPROVE.
pub fn assemble(
    ticker: &str,
    regime: Regime,
    stage_outcomes: &[StageOutcome],
    outputs: StageOutputs,
    reason_log: ReasonLog,
) -> Decision {
    let mut verdict =
        Verdict::from_outcome(Outcome::dominant(stage_outcomes.iter().map(|s| s.outcome)));
    let halted_at = stage_outcomes
        .iter()
        .find(|s| s.outcome != Outcome::Pass)
        .map(|s| s.stage);

    let action_plan = match (&outputs.candidate_type, &outputs.entry_signal, &outputs.position_plan) {
        (Some(candidate), Some(entry), Some(plan)) if verdict == Verdict::Approve => {
            Some(ActionPlan::build(*candidate, entry, plan))
        }
        _ => None,
    };
    // A pipeline that stopped short of sizing cannot approve.
    if verdict == Verdict::Approve && action_plan.is_none() {
        verdict = Verdict::Wait;
    }

    Decision {
        ticker: ticker.to_string(),
        verdict,
        regime,
        candidate_type: outputs.candidate_type,
        gate_results: outputs.gate_results,
        halted_at,
        reason_log,
        action_plan,
    }
}
