//! Scan report port trait.

use std::path::Path;

use crate::domain::error::EngineError;
use crate::domain::scan::{ScanRow, ScanSummary};

/// Port for writing scan reports.
pub trait ReportPort {
    /// File extension the adapter writes, without the dot.
    fn extension(&self) -> &'static str;

    fn write(
        &self,
        rows: &[ScanRow],
        summary: &ScanSummary,
        output_path: &Path,
    ) -> Result<(), EngineError>;
}
