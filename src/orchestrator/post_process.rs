//! Post-run processing utilities.
//!
//! Handles exports requested on the command line after a run completes.

use crate::model::RunRecord;
use crate::storage;
use std::path::PathBuf;
use tracing::warn;

/// Where finished runs should be written, if anywhere.
#[derive(Debug, Clone, Default)]
pub(crate) struct ExportTargets {
    pub json: Option<PathBuf>,
    pub markdown: Option<PathBuf>,
}

/// Result of post-run processing, ready for presentation layers.
pub(crate) struct ProcessedRun {
    pub export_messages: Vec<String>,
}

/// Process a completed run: write the requested exports and collect status lines.
pub(crate) fn process_run_completion(targets: &ExportTargets, record: &RunRecord) -> ProcessedRun {
    let mut export_messages = Vec::new();
    if let Some(export_path) = targets.json.as_deref() {
        match storage::export_json(export_path, record) {
            Ok(_) => export_messages.push(format!("Exported JSON: {}", export_path.display())),
            Err(e) => {
                warn!(error = %e, "json export failed");
                export_messages.push(format!("Export JSON failed: {e:#}"));
            }
        }
    }
    if let Some(export_path) = targets.markdown.as_deref() {
        match record.result.as_ref() {
            Some(result) => match storage::export_markdown(export_path, &record.config, result) {
                Ok(_) => {
                    export_messages.push(format!("Exported Markdown: {}", export_path.display()))
                }
                Err(e) => {
                    warn!(error = %e, "markdown export failed");
                    export_messages.push(format!("Export Markdown failed: {e:#}"));
                }
            },
            None => export_messages.push("Export Markdown skipped: no result".to_string()),
        }
    }

    ProcessedRun { export_messages }
}
