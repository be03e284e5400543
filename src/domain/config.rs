//! Engine configuration: every threshold the rule stages read.
//!
//! Read-only during evaluation and safe to share between concurrent calls.

use crate::domain::candidate::ClassificationThresholds;
use crate::domain::entry::EntryConfig;
use crate::domain::gate::GateThresholds;
use crate::domain::regime::RegimeThresholds;
use crate::domain::sizing::SizingConfig;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EngineConfig {
    pub regime: RegimeThresholds,
    pub gates: GateThresholds,
    pub classification: ClassificationThresholds,
    pub entry: EntryConfig,
    pub sizing: SizingConfig,
}
