//! Text summary builder for CLI output.
//!
//! Formats a finished run record as human-readable lines for text mode.

use crate::model::{RunRecord, RunStatus, Workflow};
use anyhow::{Context, Result};

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Build a text summary from a finished run.
pub(crate) fn build_text_summary(record: &RunRecord) -> Result<TextSummary> {
    let result = record
        .result
        .as_ref()
        .context("run finished without a result")?;
    let cfg = &record.config;
    let mut lines = Vec::new();

    lines.push(format!(
        "Workflow: {} ({}) run {}",
        cfg.workflow.label(),
        cfg.workflow,
        record.run
    ));
    if cfg.workflow == Workflow::BulkRna {
        lines.push(format!("Input: {}", cfg.input_path));
    }
    if cfg.workflow == Workflow::DiffExpression {
        lines.push(format!(
            "Method: {}  p < {}  |log2FC| > {}",
            cfg.stat_method, cfg.p_value_threshold, cfg.log2fc_threshold
        ));
    }
    let status = match result.status {
        RunStatus::Success => "Success",
        RunStatus::Error => "Error",
    };
    lines.push(format!(
        "Status: {status} at {} ({} log lines, model {})",
        result.completion_timestamp,
        record.logs.len(),
        record.settings.model
    ));

    if let Some(files) = result.file_manifest.as_deref() {
        lines.push(String::new());
        lines.push(format!("Output files ({}):", files.len()));
        let width = files.iter().map(|f| f.name.len()).max().unwrap_or(0);
        for f in files {
            lines.push(format!("  {:<width$}  {:<6} {}", f.name, f.kind, f.size));
        }
    }

    lines.push(String::new());
    lines.extend(result.report_text.lines().map(str::to_string));

    Ok(TextSummary { lines })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnalysisConfig, AnalysisResult, RunId, RunSettings, StatMethod};
    use crate::report::{error_result, file_manifest};

    fn record(workflow: Workflow, result: Option<AnalysisResult>) -> RunRecord {
        RunRecord {
            run: RunId(2),
            settings: RunSettings::default(),
            config: AnalysisConfig {
                workflow,
                stat_method: StatMethod::TTest,
                ..Default::default()
            },
            logs: Vec::new(),
            result,
        }
    }

    #[test]
    fn success_lists_manifest_then_report() {
        let r = record(
            Workflow::DiffExpression,
            Some(AnalysisResult {
                report_text: "## Summary\n150 genes".into(),
                file_manifest: Some(file_manifest(Workflow::DiffExpression)),
                completion_timestamp: "12:00:00".into(),
                status: RunStatus::Success,
            }),
        );
        let lines = build_text_summary(&r).unwrap().lines;
        assert_eq!(lines[0], "Workflow: Diff. Expression (DIFF_EXPRESSION) run #2");
        assert_eq!(lines[1], "Method: T-Test  p < 0.05  |log2FC| > 1");
        assert!(lines.iter().any(|l| l == "Output files (6):"));
        assert!(lines
            .iter()
            .any(|l| l.starts_with("  KEGG_pathways.xlsx") && l.ends_with("Excel  320 KB")));
        assert_eq!(lines.last().map(String::as_str), Some("150 genes"));
    }

    #[test]
    fn error_result_has_no_manifest_section() {
        let r = record(Workflow::BulkRna, Some(error_result(&"boom")));
        let lines = build_text_summary(&r).unwrap().lines;
        assert!(lines[2].starts_with("Status: Error"));
        assert!(!lines.iter().any(|l| l.starts_with("Output files")));
        assert!(lines.iter().any(|l| l == "### Workflow Error"));
    }

    #[test]
    fn missing_result_is_an_error() {
        assert!(build_text_summary(&record(Workflow::SingleCell, None)).is_err());
    }
}
