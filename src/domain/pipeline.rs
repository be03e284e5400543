//! The evaluation pipeline.
//!
//! Regime -> Gate -> Classification -> Entry -> Sizing -> Decision, strictly
//! in that order. A stage runs only if every stage before it passed; the first
//! WAIT or REJECT ends the run and the decision is assembled from what ran.
//!
//! The engine holds only validated, read-only configuration. Each call owns
//! its own reason log, so one engine can serve concurrent callers.

use tracing::{debug, info};

use crate::domain::candidate::{self, ClassificationResult};
use crate::domain::config::EngineConfig;
use crate::domain::config_validation::validate_engine_config;
use crate::domain::decision::{self, Decision, StageOutcome, StageOutputs};
use crate::domain::entry;
use crate::domain::error::EngineError;
use crate::domain::gate;
use crate::domain::reason_log::{Outcome, ReasonLog, Stage};
use crate::domain::regime;
use crate::domain::sizing;
use crate::domain::snapshot::InputSnapshot;

/// Where a run currently stands; `Done` is the only terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Start,
    RegimeSet,
    Gated,
    Classified,
    EntryEvaluated,
    Sized,
    Done,
}

impl PipelineState {
    /// State reached when `stage` passes.
    fn after(stage: Stage) -> PipelineState {
        match stage {
            Stage::Regime => PipelineState::RegimeSet,
            Stage::Gate => PipelineState::Gated,
            Stage::Classification => PipelineState::Classified,
            Stage::Entry => PipelineState::EntryEvaluated,
            Stage::Sizing => PipelineState::Sized,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DecisionEngine {
    config: EngineConfig,
}

impl DecisionEngine {
    /// Validate the configuration up front; an invalid one never evaluates anything.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        validate_engine_config(&config)?;
        Ok(DecisionEngine { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn evaluate(&self, snapshot: &InputSnapshot) -> Result<Decision, EngineError> {
        snapshot.validate()?;
        let mut run = Run::new(snapshot.instrument.ticker.as_str());
        let cfg = &self.config;

        let (regime, regime_reason) = regime::classify(&snapshot.market, &cfg.regime);
        run.log
            .record(Stage::Regime, regime::RULE_ID, Outcome::Pass, regime_reason);
        run.advance(Stage::Regime, Outcome::Pass);

        let (gate_outcome, gate_results) =
            gate::evaluate(snapshot, regime, &cfg.gates, &mut run.log);
        run.outputs.gate_results = gate_results;
        if !run.advance(Stage::Gate, gate_outcome) {
            return Ok(run.finish(regime));
        }

        let classification =
            candidate::classify(&snapshot.instrument, &cfg.classification, &mut run.log);
        let candidate_type = match classification {
            ClassificationResult::Matched(t) => t,
            ClassificationResult::Ambiguous(_) | ClassificationResult::Unmatched => {
                run.advance(Stage::Classification, Outcome::Wait);
                return Ok(run.finish(regime));
            }
        };
        run.outputs.candidate_type = Some(candidate_type);
        run.advance(Stage::Classification, Outcome::Pass);

        let signal = entry::evaluate(&snapshot.instrument, candidate_type, &cfg.entry, &mut run.log);
        let entry_outcome = signal.outcome();
        run.outputs.entry_signal = Some(signal);
        if !run.advance(Stage::Entry, entry_outcome) {
            return Ok(run.finish(regime));
        }

        let plan = sizing::size(snapshot, regime, candidate_type, &cfg.sizing, &mut run.log);
        let sizing_outcome = if plan.has_capacity() {
            Outcome::Pass
        } else {
            Outcome::Wait
        };
        run.outputs.position_plan = Some(plan);
        run.advance(Stage::Sizing, sizing_outcome);
        Ok(run.finish(regime))
    }

    /// Evaluate independent snapshots one after another.
    pub fn evaluate_all<'a, I>(&self, snapshots: I) -> Vec<Result<Decision, EngineError>>
    where
        I: IntoIterator<Item = &'a InputSnapshot>,
    {
        snapshots.into_iter().map(|s| self.evaluate(s)).collect()
    }
}

/// Per-call scratch state; never shared between evaluations.
struct Run<'a> {
    ticker: &'a str,
    state: PipelineState,
    outcomes: Vec<StageOutcome>,
    outputs: StageOutputs,
    log: ReasonLog,
}

impl<'a> Run<'a> {
    fn new(ticker: &'a str) -> Self {
        Run {
            ticker,
            state: PipelineState::Start,
            outcomes: Vec::with_capacity(5),
            outputs: StageOutputs::default(),
            log: ReasonLog::new(),
        }
    }

    /// Record a stage outcome; returns whether the pipeline may continue.
    fn advance(&mut self, stage: Stage, outcome: Outcome) -> bool {
        self.outcomes.push(StageOutcome::new(stage, outcome));
        if outcome == Outcome::Pass {
            self.state = PipelineState::after(stage);
            debug!(ticker = self.ticker, %stage, state = ?self.state, "stage passed");
            true
        } else {
            debug!(ticker = self.ticker, %stage, %outcome, "pipeline halted");
            self.state = PipelineState::Done;
            false
        }
    }

    fn finish(self, regime: regime::Regime) -> Decision {
        let decision =
            decision::assemble(self.ticker, regime, &self.outcomes, self.outputs, self.log);
        info!(
            ticker = decision.ticker.as_str(),
            verdict = %decision.verdict,
            halted_at = ?decision.halted_at,
            "decision assembled"
        );
        decision
    }
}

/// Validate `config` and evaluate a single snapshot against it.
pub fn evaluate(snapshot: &InputSnapshot, config: &EngineConfig) -> Result<Decision, EngineError> {
    DecisionEngine::new(*config)?.evaluate(snapshot)
}
