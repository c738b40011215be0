use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::mpsc as std_mpsc;
use std::sync::OnceLock;
use std::time::Duration;

use super::state::UiState;
use crate::model::RunRecord;

// Global clipboard manager channel - initialized once on first use
static CLIPBOARD_SENDER: OnceLock<std_mpsc::Sender<String>> = OnceLock::new();

/// File stem for exports of a run, e.g. `biovisio-diff_expression-run3-14-05-09`.
pub fn export_stem(record: &RunRecord) -> String {
    let stamp = record
        .result
        .as_ref()
        .map(|r| r.completion_timestamp.replace(':', "-"))
        .unwrap_or_else(|| "pending".to_string());
    format!(
        "biovisio-{}-run{}-{}",
        record.config.workflow.id().to_lowercase(),
        record.run.0,
        stamp
    )
}

fn current_record(state: &UiState) -> Result<RunRecord> {
    state
        .session
        .record(&state.settings)
        .filter(|r| r.result.is_some())
        .ok_or_else(|| anyhow::anyhow!("No completed run to export yet."))
}

/// Export the current run record as JSON into the working directory.
/// Returns the absolute path of the exported file.
pub fn export_run_json(state: &UiState) -> Result<PathBuf> {
    let record = current_record(state)?;
    let current_dir = std::env::current_dir().context("get current directory")?;
    let path = current_dir.join(format!("{}.json", export_stem(&record)));
    crate::storage::export_json(&path, &record)?;
    Ok(path)
}

/// Export the current report as Markdown into the working directory.
pub fn export_run_markdown(state: &UiState) -> Result<PathBuf> {
    let record = current_record(state)?;
    let result = record
        .result
        .as_ref()
        .context("run has no result")?;
    let current_dir = std::env::current_dir().context("get current directory")?;
    let path = current_dir.join(format!("{}.md", export_stem(&record)));
    crate::storage::export_markdown(&path, &record.config, result)?;
    Ok(path)
}

/// Run an export and put the outcome on the info line.
pub fn export_and_show_path(
    state: &mut UiState,
    label: &str,
    export: fn(&UiState) -> Result<PathBuf>,
) {
    match export(state) {
        Ok(p) => {
            state.last_exported_path = Some(p.to_string_lossy().to_string());
            state.info = format!("Exported {label}: {}", p.display());
        }
        Err(e) => {
            state.info = format!("{label} export failed: {e:#}");
        }
    }
}

/// Copy the current report text to the clipboard.
pub fn copy_report(state: &mut UiState) {
    let Some(result) = state.session.result() else {
        state.info = "No report to copy yet.".into();
        return;
    };
    match copy_to_clipboard(&result.report_text) {
        Ok(_) => state.info = "✓ Report copied to clipboard".into(),
        Err(e) => state.info = format!("Clipboard copy failed: {e:#}"),
    }
}

/// Initialize the clipboard manager thread if not already initialized.
/// Each clipboard instance is kept alive briefly so clipboard managers on Linux can
/// read the contents before it is dropped.
fn init_clipboard_manager() -> Result<&'static std_mpsc::Sender<String>> {
    CLIPBOARD_SENDER.get_or_init(|| {
        let (tx, rx) = std_mpsc::channel::<String>();

        std::thread::spawn(move || {
            use arboard::Clipboard;

            for text in rx {
                if let Ok(mut clipboard) = Clipboard::new() {
                    if clipboard.set_text(&text).is_ok() {
                        std::thread::sleep(Duration::from_secs(2));
                    }
                }
            }
        });

        tx
    });

    CLIPBOARD_SENDER
        .get()
        .ok_or_else(|| anyhow::anyhow!("Failed to initialize clipboard manager"))
}

/// Queue text for the clipboard without blocking the UI thread.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let sender = init_clipboard_manager()?;
    sender
        .send(text.to_string())
        .map_err(|_| anyhow::anyhow!("Clipboard manager channel closed"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnalysisConfig, AnalysisResult, RunId, RunSettings, RunStatus, Workflow};

    #[test]
    fn stem_names_workflow_run_and_time() {
        let record = RunRecord {
            run: RunId(3),
            settings: RunSettings::default(),
            config: AnalysisConfig {
                workflow: Workflow::DiffExpression,
                ..Default::default()
            },
            logs: Vec::new(),
            result: Some(AnalysisResult {
                report_text: String::new(),
                file_manifest: None,
                completion_timestamp: "14:05:09".into(),
                status: RunStatus::Success,
            }),
        };
        assert_eq!(export_stem(&record), "biovisio-diff_expression-run3-14-05-09");
    }

    #[test]
    fn exports_need_a_finished_run() {
        let mut state = UiState::default();
        assert!(export_run_json(&state).is_err());
        state.session.begin_run();
        export_and_show_path(&mut state, "JSON", export_run_json);
        assert!(state.info.contains("No completed run"));
        assert!(state.last_exported_path.is_none());
    }
}
