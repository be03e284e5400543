//! Universe scan: one decision per ticker, plus aggregate statistics.
//!
//! Tickers are evaluated one after another. A ticker whose data cannot be
//! fetched or validated becomes a `DATA_ERROR` row; it never stops the scan
//! and is never reported as a verdict.

use std::collections::HashMap;
use std::fmt;

use tracing::warn;

use crate::domain::candidate::CandidateType;
use crate::domain::decision::{Decision, Verdict};
use crate::domain::entry::TriggerKind;
use crate::domain::error::EngineError;
use crate::domain::pipeline::DecisionEngine;
use crate::domain::reason_log::{Outcome, Stage};
use crate::domain::regime::Regime;
use crate::domain::snapshot::{InputSnapshot, InstrumentSnapshot};
use crate::ports::snapshot_port::SnapshotPort;

pub const TOP_WAIT_REASONS: usize = 5;
pub const TOP_TRIGGER_FAILS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanStatus {
    Decided(Verdict),
    DataError,
}

impl ScanStatus {
    pub const ALL: [ScanStatus; 4] = [
        ScanStatus::Decided(Verdict::Approve),
        ScanStatus::Decided(Verdict::Wait),
        ScanStatus::Decided(Verdict::Reject),
        ScanStatus::DataError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::Decided(v) => v.as_str(),
            ScanStatus::DataError => "DATA_ERROR",
        }
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a ticker got stuck, coarser than [`Stage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockStage {
    None,
    Data,
    HardGate,
    Candidate,
    EntryTrigger,
    Sizing,
}

impl BlockStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockStage::None => "NONE",
            BlockStage::Data => "DATA",
            BlockStage::HardGate => "HARD_GATE",
            BlockStage::Candidate => "CANDIDATE",
            BlockStage::EntryTrigger => "ENTRY_TRIGGER",
            BlockStage::Sizing => "SIZING",
        }
    }

    pub fn from_halt(halted_at: Option<Stage>) -> BlockStage {
        match halted_at {
            None => BlockStage::None,
            Some(Stage::Regime | Stage::Gate) => BlockStage::HardGate,
            Some(Stage::Classification) => BlockStage::Candidate,
            Some(Stage::Entry) => BlockStage::EntryTrigger,
            Some(Stage::Sizing) => BlockStage::Sizing,
        }
    }
}

impl fmt::Display for BlockStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyMetrics {
    pub price_to_ma200: f64,
    pub volatility_annual: f64,
    pub drawdown_6m: f64,
    pub volume_ratio: f64,
    pub ma50_distance: f64,
}

impl KeyMetrics {
    pub fn from_instrument(stock: &InstrumentSnapshot) -> Self {
        KeyMetrics {
            price_to_ma200: stock.price_to_ma_200(),
            volatility_annual: stock.volatility_annual,
            drawdown_6m: stock.drawdown_6m,
            volume_ratio: stock.volume_ratio(),
            ma50_distance: stock.ma_50_distance(),
        }
    }
}

impl fmt::Display for KeyMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "price_to_ma200={:.4}, volatility_annual={:.4}, drawdown_6m={:.4}, volume_ratio={:.4}, ma50_distance={:.4}",
            self.price_to_ma200,
            self.volatility_annual,
            self.drawdown_6m,
            self.volume_ratio,
            self.ma50_distance
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerResult {
    pub kind: TriggerKind,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanRow {
    pub ticker: String,
    pub status: ScanStatus,
    pub regime: Option<Regime>,
    pub candidate_type: Option<CandidateType>,
    /// First WAIT reason, for WAIT rows; the failure text for DATA_ERROR rows.
    pub wait_reason: Option<String>,
    pub block_stage: BlockStage,
    pub metrics: Option<KeyMetrics>,
    pub entry_triggers: Vec<TriggerResult>,
}

impl ScanRow {
    pub fn from_decision(decision: &Decision, stock: &InstrumentSnapshot) -> Self {
        let wait_reason = (decision.verdict == Verdict::Wait)
            .then(|| top_wait_reason(decision))
            .flatten();
        let entry_triggers = decision
            .reason_log
            .for_stage(Stage::Entry)
            .filter_map(|e| {
                TriggerKind::from_rule_id(&e.rule).map(|kind| TriggerResult {
                    kind,
                    passed: e.outcome == Outcome::Pass,
                })
            })
            .collect();
        ScanRow {
            ticker: decision.ticker.clone(),
            status: ScanStatus::Decided(decision.verdict),
            regime: Some(decision.regime),
            candidate_type: decision.candidate_type,
            wait_reason,
            block_stage: BlockStage::from_halt(decision.halted_at),
            metrics: Some(KeyMetrics::from_instrument(stock)),
            entry_triggers,
        }
    }

    pub fn data_error(ticker: &str, error: &EngineError) -> Self {
        ScanRow {
            ticker: ticker.to_string(),
            status: ScanStatus::DataError,
            regime: None,
            candidate_type: None,
            wait_reason: Some(error.to_string()),
            block_stage: BlockStage::Data,
            metrics: None,
            entry_triggers: Vec::new(),
        }
    }

    fn blocked_at_entry(&self) -> bool {
        self.status == ScanStatus::Decided(Verdict::Wait)
            && self.block_stage == BlockStage::EntryTrigger
    }
}

/// First WAIT entry in the log as `rule: reason`, headline only.
fn top_wait_reason(decision: &Decision) -> Option<String> {
    decision
        .reason_log
        .iter()
        .find(|e| e.outcome == Outcome::Wait)
        .map(|e| {
            let headline = e.reason.split(" | ").next().unwrap_or(&e.reason);
            format!("{}: {}", e.rule, headline)
        })
}

/// Evaluate every ticker against the same market snapshot.
///
/// Only a failure to read the market snapshot aborts the scan.
pub fn run_scan(
    engine: &DecisionEngine,
    source: &dyn SnapshotPort,
    tickers: &[String],
) -> Result<Vec<ScanRow>, EngineError> {
    let market = source.market()?;
    let mut rows = Vec::with_capacity(tickers.len());

    for ticker in tickers {
        let evaluated = source
            .instrument(ticker)
            .and_then(|instrument| {
                let portfolio = source.portfolio(ticker)?;
                Ok(InputSnapshot::new(market.clone(), instrument, portfolio))
            })
            .and_then(|snapshot| {
                let decision = engine.evaluate(&snapshot)?;
                Ok(ScanRow::from_decision(&decision, &snapshot.instrument))
            });
        let row = match evaluated {
            Ok(row) => row,
            Err(e) => {
                warn!(ticker = ticker.as_str(), error = %e, "scan row recorded as data error");
                ScanRow::data_error(ticker, &e)
            }
        };
        rows.push(row);
    }
    Ok(rows)
}

/// PASS/FAIL tallies for one trigger kind across rows blocked at entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerTally {
    pub kind: TriggerKind,
    pub passed: usize,
    pub failed: usize,
    /// Rows where this was the only failing trigger, so relaxing it alone would approve.
    pub sole_failure: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerAnalysis {
    pub rows: usize,
    pub tallies: Vec<TriggerTally>,
    pub top_fails: Vec<(TriggerKind, usize)>,
}

impl TriggerAnalysis {
    pub fn from_rows(rows: &[ScanRow]) -> Option<TriggerAnalysis> {
        let blocked: Vec<&ScanRow> = rows.iter().filter(|r| r.blocked_at_entry()).collect();
        if blocked.is_empty() {
            return None;
        }

        let mut tallies: Vec<TriggerTally> = TriggerKind::ALL
            .iter()
            .map(|&kind| TriggerTally {
                kind,
                passed: 0,
                failed: 0,
                sole_failure: 0,
            })
            .collect();

        for row in &blocked {
            let failing: Vec<TriggerKind> = row
                .entry_triggers
                .iter()
                .filter(|t| !t.passed)
                .map(|t| t.kind)
                .collect();
            for trigger in &row.entry_triggers {
                if let Some(tally) = tallies.iter_mut().find(|t| t.kind == trigger.kind) {
                    if trigger.passed {
                        tally.passed += 1;
                    } else {
                        tally.failed += 1;
                    }
                }
            }
            if let [only] = failing.as_slice() {
                if let Some(tally) = tallies.iter_mut().find(|t| t.kind == *only) {
                    tally.sole_failure += 1;
                }
            }
        }

        let mut top_fails: Vec<(TriggerKind, usize)> = tallies
            .iter()
            .filter(|t| t.failed > 0)
            .map(|t| (t.kind, t.failed))
            .collect();
        top_fails.sort_by(|a, b| b.1.cmp(&a.1));
        top_fails.truncate(TOP_TRIGGER_FAILS);

        Some(TriggerAnalysis {
            rows: blocked.len(),
            tallies,
            top_fails,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanSummary {
    pub total: usize,
    /// Every status in fixed order, zero counts included.
    pub statuses: Vec<(ScanStatus, usize)>,
    pub candidates: Vec<(CandidateType, usize)>,
    pub wait_reasons: Vec<(String, usize)>,
    pub block_stages: Vec<(BlockStage, usize)>,
    pub entry_triggers: Option<TriggerAnalysis>,
}

impl ScanSummary {
    pub fn from_rows(rows: &[ScanRow]) -> Self {
        let statuses = ScanStatus::ALL
            .iter()
            .map(|&s| (s, rows.iter().filter(|r| r.status == s).count()))
            .collect();
        let candidates = most_common(rows.iter().filter_map(|r| r.candidate_type));
        let mut wait_reasons = most_common(
            rows.iter()
                .filter(|r| r.status == ScanStatus::Decided(Verdict::Wait))
                .filter_map(|r| r.wait_reason.clone()),
        );
        wait_reasons.truncate(TOP_WAIT_REASONS);
        let block_stages = most_common(rows.iter().map(|r| r.block_stage));

        ScanSummary {
            total: rows.len(),
            statuses,
            candidates,
            wait_reasons,
            block_stages,
            entry_triggers: TriggerAnalysis::from_rows(rows),
        }
    }

    pub fn count(&self, status: ScanStatus) -> usize {
        self.statuses
            .iter()
            .find(|(s, _)| *s == status)
            .map_or(0, |(_, n)| *n)
    }

    pub fn has_approvals(&self) -> bool {
        self.count(ScanStatus::Decided(Verdict::Approve)) > 0
    }
}

/// Count occurrences, most frequent first; ties keep first-seen order.
fn most_common<T, I>(items: I) -> Vec<(T, usize)>
where
    T: Eq + std::hash::Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut index: HashMap<T, usize> = HashMap::new();
    let mut counts: Vec<(T, usize)> = Vec::new();
    for item in items {
        match index.get(&item) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(item.clone(), counts.len());
                counts.push((item, 1));
            }
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::reason_log::ReasonLog;

    fn instrument() -> InstrumentSnapshot {
        InstrumentSnapshot {
            ticker: "SCN".into(),
            price: 110.0,
            avg_volume: 1_000_000.0,
            volume: 1_500_000.0,
            volatility_annual: 0.2,
            ma_50: 100.0,
            ma_200: 100.0,
            drawdown_6m: -0.1,
            dividend_yield: 0.0,
            earnings_risk: false,
            regulatory_risk: false,
            business_clarity: Some(true),
            sector_defensive: false,
        }
    }

    fn decision(verdict: Verdict, halted_at: Option<Stage>, log: ReasonLog) -> Decision {
        Decision {
            ticker: "SCN".into(),
            verdict,
            regime: Regime::RiskOn,
            candidate_type: Some(CandidateType::TrendPullback),
            gate_results: Vec::new(),
            halted_at,
            reason_log: log,
            action_plan: None,
        }
    }

    fn entry_wait_row(volume: bool, support: bool, volatility: bool) -> ScanRow {
        let mut log = ReasonLog::new();
        let outcome = |ok: bool, miss: Outcome| if ok { Outcome::Pass } else { miss };
        log.record(
            Stage::Entry,
            "trend_pullback.volume_confirmation",
            outcome(volume, Outcome::Wait),
            "volume",
        );
        log.record(
            Stage::Entry,
            "trend_pullback.moving_average_support",
            outcome(support, Outcome::Wait),
            "support",
        );
        log.record(
            Stage::Entry,
            "trend_pullback.volatility_ceiling",
            outcome(volatility, Outcome::Reject),
            "vol",
        );
        ScanRow::from_decision(
            &decision(Verdict::Wait, Some(Stage::Entry), log),
            &instrument(),
        )
    }

    #[test]
    fn block_stage_from_halt() {
        assert_eq!(BlockStage::from_halt(None), BlockStage::None);
        assert_eq!(BlockStage::from_halt(Some(Stage::Gate)), BlockStage::HardGate);
        assert_eq!(
            BlockStage::from_halt(Some(Stage::Classification)),
            BlockStage::Candidate
        );
        assert_eq!(
            BlockStage::from_halt(Some(Stage::Entry)),
            BlockStage::EntryTrigger
        );
        assert_eq!(BlockStage::from_halt(Some(Stage::Sizing)), BlockStage::Sizing);
    }

    #[test]
    fn wait_row_takes_first_wait_reason() {
        let mut log = ReasonLog::new();
        log.record(Stage::Gate, "liquidity_floor", Outcome::Pass, "ok");
        log.record(
            Stage::Classification,
            "candidate_classification",
            Outcome::Wait,
            "no qualifying type | TREND_PULLBACK: x (FAIL)",
        );
        let row = ScanRow::from_decision(
            &decision(Verdict::Wait, Some(Stage::Classification), log),
            &instrument(),
        );
        assert_eq!(
            row.wait_reason.as_deref(),
            Some("candidate_classification: no qualifying type")
        );
        assert_eq!(row.block_stage, BlockStage::Candidate);
    }

    #[test]
    fn reject_row_has_no_wait_reason() {
        let mut log = ReasonLog::new();
        log.record(Stage::Gate, "liquidity_floor", Outcome::Reject, "thin");
        let row = ScanRow::from_decision(
            &decision(Verdict::Reject, Some(Stage::Gate), log),
            &instrument(),
        );
        assert_eq!(row.wait_reason, None);
        assert_eq!(row.status.as_str(), "REJECT");
    }

    #[test]
    fn key_metrics_format() {
        let m = KeyMetrics::from_instrument(&instrument());
        assert_eq!(
            m.to_string(),
            "price_to_ma200=1.1000, volatility_annual=0.2000, drawdown_6m=-0.1000, volume_ratio=1.5000, ma50_distance=0.1000"
        );
    }

    #[test]
    fn data_error_row() {
        let err = EngineError::SnapshotNotFound {
            ticker: "ZZZ".into(),
        };
        let row = ScanRow::data_error("ZZZ", &err);
        assert_eq!(row.status, ScanStatus::DataError);
        assert_eq!(row.block_stage, BlockStage::Data);
        assert_eq!(row.wait_reason.as_deref(), Some("no snapshot for ZZZ"));
        assert!(row.metrics.is_none());
    }

    #[test]
    fn summary_counts_every_status() {
        let rows = vec![
            entry_wait_row(false, true, true),
            ScanRow::data_error("X", &EngineError::SnapshotSource { reason: "x".into() }),
        ];
        let summary = ScanSummary::from_rows(&rows);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.count(ScanStatus::Decided(Verdict::Wait)), 1);
        assert_eq!(summary.count(ScanStatus::DataError), 1);
        assert_eq!(summary.count(ScanStatus::Decided(Verdict::Approve)), 0);
        assert!(!summary.has_approvals());
        assert_eq!(summary.statuses.len(), 4);
    }

    #[test]
    fn trigger_analysis_counts_sole_failures() {
        let rows = vec![
            entry_wait_row(false, true, true),
            entry_wait_row(false, true, true),
            entry_wait_row(false, false, true),
            entry_wait_row(true, true, false),
        ];
        let analysis = TriggerAnalysis::from_rows(&rows).unwrap();
        assert_eq!(analysis.rows, 4);

        let volume = analysis.tallies[0];
        assert_eq!(volume.kind, TriggerKind::VolumeConfirmation);
        assert_eq!((volume.passed, volume.failed), (1, 3));
        assert_eq!(volume.sole_failure, 2);

        let support = analysis.tallies[1];
        assert_eq!((support.passed, support.failed, support.sole_failure), (3, 1, 0));

        let ceiling = analysis.tallies[2];
        assert_eq!(ceiling.sole_failure, 1);

        assert_eq!(analysis.top_fails[0], (TriggerKind::VolumeConfirmation, 3));
        assert_eq!(analysis.top_fails.len(), 3);
    }

    #[test]
    fn no_entry_waits_means_no_analysis() {
        let rows = vec![ScanRow::data_error(
            "X",
            &EngineError::SnapshotSource { reason: "x".into() },
        )];
        assert!(TriggerAnalysis::from_rows(&rows).is_none());
    }

    #[test]
    fn most_common_keeps_first_seen_on_ties() {
        let counts = most_common(["b", "a", "a", "c", "b"]);
        assert_eq!(counts, vec![("b", 2), ("a", 2), ("c", 1)]);
    }
}
