pub mod format;
pub mod model;
pub mod text;
pub mod workbook;
pub mod writer;

use std::path::PathBuf;

use tracing::debug;

use crate::config::{interval_label, Config};
use crate::error::Result;
use crate::types::{AnalysisSummary, MarketSnapshot};

/// Writes the workbook and the text report for one cycle.
#[derive(Debug, Clone)]
pub struct Renderer {
    workbook_path: PathBuf,
    report_path: PathBuf,
    update_label: String,
}

impl Renderer {
    pub fn new(cfg: &Config) -> Self {
        Self {
            workbook_path: cfg.workbook_path.clone(),
            report_path: cfg.report_path.clone(),
            update_label: interval_label(cfg.update_interval),
        }
    }

    pub fn workbook_path(&self) -> &std::path::Path {
        &self.workbook_path
    }

    pub fn report_path(&self) -> &std::path::Path {
        &self.report_path
    }

    /// Render both targets in memory first, then replace each file atomically.
    pub fn render(&self, snapshot: &MarketSnapshot, summary: &AnalysisSummary) -> Result<()> {
        let workbook = workbook::render(snapshot, summary, &self.update_label)?;
        let report = text::render(summary, &self.update_label);

        writer::write_atomic(&self.workbook_path, &workbook)?;
        writer::write_atomic(&self.report_path, report.as_bytes())?;

        debug!(
            workbook = %self.workbook_path.display(),
            report = %self.report_path.display(),
            bytes = workbook.len(),
            "Outputs replaced",
        );
        Ok(())
    }
}
