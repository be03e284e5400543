//! Append-only audit trail of every rule evaluated during one call.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Regime,
    Gate,
    Classification,
    Entry,
    Sizing,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Regime => "REGIME",
            Stage::Gate => "GATE",
            Stage::Classification => "CLASSIFICATION",
            Stage::Entry => "ENTRY",
            Stage::Sizing => "SIZING",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single rule, and of a stage as a whole.
///
/// Ordered by severity so the dominant outcome of a set is its maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Pass,
    Wait,
    Reject,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Pass => "PASS",
            Outcome::Wait => "WAIT",
            Outcome::Reject => "REJECT",
        }
    }

    /// REJECT dominates WAIT dominates PASS; an empty set is PASS.
    pub fn dominant<I: IntoIterator<Item = Outcome>>(outcomes: I) -> Outcome {
        outcomes.into_iter().max().unwrap_or(Outcome::Pass)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReasonLogEntry {
    pub stage: Stage,
    pub rule: String,
    pub outcome: Outcome,
    pub reason: String,
}

impl fmt::Display for ReasonLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}: {}",
            self.stage, self.rule, self.outcome, self.reason
        )
    }
}

/// Entries can be appended and read, never edited or removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ReasonLog {
    entries: Vec<ReasonLogEntry>,
}

impl ReasonLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        stage: Stage,
        rule: impl Into<String>,
        outcome: Outcome,
        reason: impl Into<String>,
    ) {
        self.entries.push(ReasonLogEntry {
            stage,
            rule: rule.into(),
            outcome,
            reason: reason.into(),
        });
    }

    pub fn entries(&self) -> &[ReasonLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReasonLogEntry> {
        self.entries.iter()
    }

    pub fn for_stage(&self, stage: Stage) -> impl Iterator<Item = &ReasonLogEntry> {
        self.entries.iter().filter(move |e| e.stage == stage)
    }

    /// First entry whose outcome is not PASS.
    pub fn first_blocking(&self) -> Option<&ReasonLogEntry> {
        self.entries.iter().find(|e| e.outcome != Outcome::Pass)
    }
}

impl<'a> IntoIterator for &'a ReasonLog {
    type Item = &'a ReasonLogEntry;
    type IntoIter = std::slice::Iter<'a, ReasonLogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
