//! Text and JSON rendering of a single decision.
//!
//! Text output always prints (1) Decision, (2) Reason Log, (3) Action Plan,
//! in that order.

use serde::Serialize;

use crate::domain::decision::{ActionPlan, Decision, Verdict};
use crate::domain::error::EngineError;
use crate::domain::reason_log::Stage;
use crate::domain::regime::Regime;

const RULE: &str = "============================================================";

/// What to do next when there is no action plan.
pub fn follow_up(decision: &Decision) -> Vec<&'static str> {
    match (decision.verdict, decision.halted_at) {
        (Verdict::Approve, _) => Vec::new(),
        (Verdict::Reject, Some(Stage::Entry)) => {
            vec!["entry conditions cannot be met; no new buying"]
        }
        (Verdict::Reject, _) => vec!["no new buying"],
        (Verdict::Wait, Some(Stage::Classification)) => {
            vec!["re-evaluate once a single candidate type is established"]
        }
        (Verdict::Wait, Some(Stage::Entry)) => vec![
            "hold until the first entry conditions are confirmed",
            "re-check volume and moving-average conditions before entering",
        ],
        (Verdict::Wait, Some(Stage::Sizing)) => {
            vec!["no position capacity; re-evaluate when weight headroom frees up"]
        }
        (Verdict::Wait, _) => vec!["re-evaluate when conditions improve"],
    }
}

fn render_plan(out: &mut String, plan: &ActionPlan) {
    out.push_str(&format!("- candidate type: {}\n", plan.candidate_type));
    out.push_str(&format!("- primary entry: {}\n", plan.primary_entry_condition));
    for condition in &plan.additional_entry_conditions {
        out.push_str(&format!("- additional entry: {condition}\n"));
    }
    out.push_str(&format!("- max weight: {:.2}%\n", plan.max_weight * 100.0));
    let tranches: Vec<String> = plan
        .tranche_weights
        .iter()
        .map(|w| format!("{:.2}%", w * 100.0))
        .collect();
    out.push_str(&format!("- tranches: {}\n", tranches.join(" / ")));
    out.push_str(&format!("- risk cap: {:.2}% of capital\n", plan.risk_cap * 100.0));
    for condition in &plan.invalidation_conditions {
        out.push_str(&format!("- invalidate if: {}\n", condition.describe()));
    }
    for prohibition in &plan.prohibitions {
        out.push_str(&format!("- prohibited: {}\n", prohibition.describe()));
    }
}

pub fn render_text(title: &str, decision: &Decision) -> String {
    let mut out = format!("{RULE}\n{title}\n(1) Decision\n{}\n(2) Reason Log\n", decision.verdict);
    for entry in &decision.reason_log {
        out.push_str(&format!("- {entry}\n"));
    }
    out.push_str("(3) Action Plan\n");
    match &decision.action_plan {
        Some(plan) => render_plan(&mut out, plan),
        None => {
            for step in follow_up(decision) {
                out.push_str(&format!("- {step}\n"));
            }
        }
    }
    out
}

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    decision: &'a Decision,
    follow_up: Vec<&'static str>,
    market_regime_override: Option<Regime>,
}

pub fn render_json(decision: &Decision, regime_override: Option<Regime>) -> Result<String, EngineError> {
    let report = JsonReport {
        decision,
        follow_up: follow_up(decision),
        market_regime_override: regime_override,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}
