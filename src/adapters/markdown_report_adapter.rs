//! Markdown scan report adapter.
//!
//! Renders the summary table, the distribution statistics and, when any
//! ticker was held at entry, the per-trigger breakdown.

use std::fs;
use std::path::Path;

use crate::domain::candidate::CandidateType;
use crate::domain::entry::{EntryConfig, TriggerKind};
use crate::domain::error::EngineError;
use crate::domain::scan::{ScanRow, ScanSummary, TriggerAnalysis};
use crate::ports::report_port::ReportPort;

/// Markdown tables break on pipes and newlines inside cells.
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

pub fn format_table(rows: &[ScanRow]) -> String {
    let mut out = String::new();
    out.push_str("| Ticker | Decision | Candidate Type | WAIT Reason | Block Stage | Key Metrics |\n");
    out.push_str("| --- | --- | --- | --- | --- | --- |\n");
    for row in rows {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            row.ticker,
            row.status,
            row.candidate_type.map_or("", |c| c.as_str()),
            cell(row.wait_reason.as_deref().unwrap_or("")),
            row.block_stage,
            row.metrics.map(|m| m.to_string()).unwrap_or_default(),
        ));
    }
    out
}

fn format_trigger_analysis(analysis: &TriggerAnalysis, entry: &EntryConfig) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} ticker(s) held at ENTRY_TRIGGER.\n\n#### PASS/FAIL by trigger\n\n",
        analysis.rows
    ));
    for t in &analysis.tallies {
        out.push_str(&format!("- {}: PASS {} / FAIL {}\n", t.kind, t.passed, t.failed));
    }

    out.push_str("\n#### Most frequent failures\n\n");
    if analysis.top_fails.is_empty() {
        out.push_str("- none\n");
    }
    for (kind, count) in &analysis.top_fails {
        out.push_str(&format!("- {kind}: {count}\n"));
    }

    out.push_str("\n#### Approvals if one trigger were relaxed\n\n");
    for t in &analysis.tallies {
        out.push_str(&format!("- relax {}: {}\n", t.kind, t.sole_failure));
    }

    out.push_str("\n#### Trigger thresholds\n\n");
    for candidate in CandidateType::ALL {
        let th = entry.for_type(candidate);
        out.push_str(&format!(
            "- {candidate}: volume >= {:.1}x average, price > {}, volatility <= {:.2}\n",
            th.volume_multiple,
            th.support.as_str(),
            th.max_volatility
        ));
    }
    out.push_str(&format!(
        "- A relaxation counts only rows where that trigger was the sole failure among {}.\n",
        TriggerKind::ALL.len()
    ));
    out
}

pub fn format_markdown(rows: &[ScanRow], summary: &ScanSummary, entry: &EntryConfig) -> String {
    let mut out = String::from("# Scan Results\n\n## Summary Table\n\n");
    out.push_str(&format_table(rows));

    out.push_str("\n## Statistics\n\n### Decision distribution\n\n");
    for (status, count) in &summary.statuses {
        out.push_str(&format!("- {status}: {count}\n"));
    }

    out.push_str("\n### Candidate type distribution\n\n");
    if summary.candidates.is_empty() {
        out.push_str("- no candidate types\n");
    }
    for (candidate, count) in &summary.candidates {
        out.push_str(&format!("- {candidate}: {count}\n"));
    }

    out.push_str("\n### Top WAIT reasons\n\n");
    if summary.wait_reasons.is_empty() {
        out.push_str("- no WAIT reasons\n");
    }
    for (reason, count) in &summary.wait_reasons {
        out.push_str(&format!("- {}: {count}\n", cell(reason)));
    }

    out.push_str("\n### Block stage distribution\n\n");
    for (stage, count) in &summary.block_stages {
        out.push_str(&format!("- {stage}: {count}\n"));
    }

    if !summary.has_approvals() {
        out.push_str(
            "\n> **Warning:** no ticker was approved. Entry triggers may be too strict for this universe.\n",
        );
    }

    out.push_str("\n### ENTRY_TRIGGER WAIT analysis\n\n");
    match &summary.entry_triggers {
        Some(analysis) => out.push_str(&format_trigger_analysis(analysis, entry)),
        None => out.push_str("- no ticker was held at ENTRY_TRIGGER\n"),
    }
    out
}

#[derive(Debug, Default)]
pub struct MarkdownReportAdapter {
    entry: EntryConfig,
}

impl MarkdownReportAdapter {
    /// `entry` is the configuration the scan ran with, quoted in the trigger notes.
    pub fn new(entry: EntryConfig) -> Self {
        Self { entry }
    }
}

impl ReportPort for MarkdownReportAdapter {
    fn extension(&self) -> &'static str {
        "md"
    }

    fn write(
        &self,
        rows: &[ScanRow],
        summary: &ScanSummary,
        output_path: &Path,
    ) -> Result<(), EngineError> {
        fs::write(output_path, format_markdown(rows, summary, &self.entry))?;
        Ok(())
    }
}
