//! CSV scan report adapter: one row per ticker.

use std::path::Path;

use serde::Serialize;

use crate::domain::error::EngineError;
use crate::domain::scan::{ScanRow, ScanSummary};
use crate::ports::report_port::ReportPort;

#[derive(Serialize)]
struct ReportRecord<'a> {
    ticker: &'a str,
    decision: &'static str,
    candidate_type: &'static str,
    wait_reason_top: &'a str,
    block_stage: &'static str,
    key_metrics: String,
}

impl<'a> From<&'a ScanRow> for ReportRecord<'a> {
    fn from(row: &'a ScanRow) -> Self {
        ReportRecord {
            ticker: &row.ticker,
            decision: row.status.as_str(),
            candidate_type: row.candidate_type.map_or("", |c| c.as_str()),
            wait_reason_top: row.wait_reason.as_deref().unwrap_or(""),
            block_stage: row.block_stage.as_str(),
            key_metrics: row.metrics.map(|m| m.to_string()).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn write_to<W: std::io::Write>(&self, rows: &[ScanRow], writer: W) -> Result<(), EngineError> {
        let mut wtr = csv::Writer::from_writer(writer);
        for row in rows {
            wtr.serialize(ReportRecord::from(row))
                .map_err(|e| EngineError::Io(std::io::Error::other(e)))?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl ReportPort for CsvReportAdapter {
    fn extension(&self) -> &'static str {
        "csv"
    }

    fn write(
        &self,
        rows: &[ScanRow],
        _summary: &ScanSummary,
        output_path: &Path,
    ) -> Result<(), EngineError> {
        let file = std::fs::File::create(output_path)?;
        self.write_to(rows, file)
    }
}
