//! File exports for finished runs.

use crate::model::{AnalysisConfig, AnalysisResult, RunRecord};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    Ok(())
}

/// Write a run record as pretty JSON.
pub fn export_json(path: &Path, record: &RunRecord) -> Result<()> {
    ensure_parent(path)?;
    let data = serde_json::to_vec_pretty(record).context("serialize run record")?;
    std::fs::write(path, data).with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), "exported run record");
    Ok(())
}

/// Write the report of a run as a Markdown document.
pub fn export_markdown(path: &Path, config: &AnalysisConfig, result: &AnalysisResult) -> Result<()> {
    ensure_parent(path)?;
    let md = crate::report::to_markdown(config, result);
    std::fs::write(path, md).with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), "exported markdown report");
    Ok(())
}
