//! Report requester.
//!
//! Turns an [`AnalysisConfig`] into a prompt, asks the text-generation service for
//! prose, and pairs the answer with the workflow's static file manifest. Every
//! service failure becomes an error-status result; nothing here returns `Err`.

mod manifest;
mod prompt;

pub use manifest::file_manifest;
pub use prompt::{content_request, system_instruction};

use crate::model::{local_time_string, AnalysisConfig, AnalysisResult, RunSettings, RunStatus};
use crate::provider::{GenerationRequest, ProviderError, TextGenerator};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Used when the service answers with empty text.
pub const FALLBACK_REPORT: &str = "Analysis complete.";

#[derive(Clone)]
pub struct ReportRequester {
    generator: Arc<dyn TextGenerator>,
    model: String,
    temperature: f32,
    timeout: Duration,
}

impl ReportRequester {
    pub fn new(generator: Arc<dyn TextGenerator>, settings: &RunSettings) -> Self {
        Self {
            generator,
            model: settings.model.clone(),
            temperature: settings.temperature,
            timeout: settings.request_timeout,
        }
    }

    pub fn build_request(&self, config: &AnalysisConfig) -> GenerationRequest {
        GenerationRequest {
            model: self.model.clone(),
            contents: content_request(config.workflow),
            system_instruction: system_instruction(config),
            temperature: self.temperature,
        }
    }

    /// One outbound call per invocation; identical configs are not cached.
    pub async fn request(&self, config: &AnalysisConfig) -> AnalysisResult {
        let request = self.build_request(config);
        let outcome = match tokio::time::timeout(self.timeout, self.generator.generate(&request)).await
        {
            Ok(res) => res,
            Err(_) => Err(ProviderError::Timeout),
        };

        match outcome {
            Ok(response) => {
                info!(
                    provider = self.generator.name(),
                    workflow = %config.workflow,
                    chars = response.text.len(),
                    "report generated"
                );
                let report_text = if response.text.is_empty() {
                    FALLBACK_REPORT.to_string()
                } else {
                    response.text
                };
                AnalysisResult {
                    report_text,
                    file_manifest: Some(file_manifest(config.workflow)),
                    completion_timestamp: local_time_string(),
                    status: RunStatus::Success,
                }
            }
            Err(e) => {
                warn!(provider = self.generator.name(), error = %e, "report generation failed");
                error_result(&e)
            }
        }
    }
}

/// The Error-status result shown inline in the results panel.
pub fn error_result(err: &dyn std::fmt::Display) -> AnalysisResult {
    AnalysisResult {
        report_text: format!("### Workflow Error\n\nFailed to execute pipeline. Details: {err}"),
        file_manifest: None,
        completion_timestamp: local_time_string(),
        status: RunStatus::Error,
    }
}

/// Render a result as a standalone Markdown document for export.
pub fn to_markdown(config: &AnalysisConfig, result: &AnalysisResult) -> String {
    let mut md = String::new();
    md.push_str(&format!("# {} Analysis Report\n\n", config.workflow.label()));
    md.push_str(&format!("- **Workflow**: {}\n", config.workflow));
    md.push_str(&format!("- **Input**: {}\n", config.input_path));
    if config.workflow == crate::model::Workflow::DiffExpression {
        md.push_str(&format!("- **Method**: {}\n", config.stat_method));
        md.push_str(&format!(
            "- **Thresholds**: p < {}, log2FC > {}\n",
            config.p_value_threshold, config.log2fc_threshold
        ));
    }
    md.push_str(&format!(
        "- **Status**: {:?} at {}\n\n",
        result.status, result.completion_timestamp
    ));

    if let Some(files) = result.file_manifest.as_ref() {
        md.push_str("## Output Files\n\n| Name | Type | Size |\n|---|---|---|\n");
        for f in files {
            md.push_str(&format!("| {} | {} | {} |\n", f.name, f.kind, f.size));
        }
        md.push('\n');
    }

    md.push_str("## Report\n\n");
    md.push_str(result.report_text.trim_end());
    md.push('\n');
    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{StatMethod, Workflow};
    use crate::provider::testing::{MissingKeyGenerator, StaticGenerator};

    fn requester(generator: Arc<dyn TextGenerator>) -> ReportRequester {
        ReportRequester::new(generator, &RunSettings::default())
    }

    fn names(result: &AnalysisResult) -> Vec<String> {
        result
            .file_manifest
            .as_ref()
            .map(|f| f.iter().map(|e| e.name.clone()).collect())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn diff_expression_gets_the_six_file_manifest() {
        let r = requester(Arc::new(StaticGenerator::new("report")));
        let cfg = AnalysisConfig {
            workflow: Workflow::DiffExpression,
            ..Default::default()
        };
        let result = r.request(&cfg).await;
        assert_eq!(result.status, RunStatus::Success);
        assert_eq!(result.file_manifest, Some(file_manifest(Workflow::DiffExpression)));
        assert_eq!(
            names(&result),
            vec![
                "all_genes_matrix.csv",
                "up_regulated_genes.csv",
                "down_regulated_genes.csv",
                "GO_enrichment.xlsx",
                "KEGG_pathways.xlsx",
                "Reactome_analysis.csv",
            ]
        );
        let files = result.file_manifest.unwrap();
        assert_eq!(files[3].kind, "Excel");
        assert_eq!(files[3].size, "450 KB");
    }

    #[tokio::test]
    async fn bulk_and_single_cell_get_three_file_manifests() {
        let r = requester(Arc::new(StaticGenerator::new("report")));
        let bulk = r.request(&AnalysisConfig::default()).await;
        assert_eq!(
            names(&bulk),
            vec!["gene_count_matrix.txt", "multiqc_report.html", "alignment_stats.json"]
        );

        let sc = r
            .request(&AnalysisConfig {
                workflow: Workflow::SingleCell,
                ..Default::default()
            })
            .await;
        assert_eq!(
            names(&sc),
            vec!["filtered_feature_bc_matrix.h5", "web_summary.html", "cloupe.cloupe"]
        );
        assert_eq!(sc.file_manifest.unwrap()[0].size, "45 MB");
    }

    #[tokio::test]
    async fn missing_credential_yields_error_result() {
        let r = requester(Arc::new(MissingKeyGenerator));
        let result = r.request(&AnalysisConfig::default()).await;
        assert_eq!(result.status, RunStatus::Error);
        assert!(result.report_text.contains("Workflow Error"));
        assert!(result
            .report_text
            .contains("API Key not found in environment variables"));
        assert!(result.file_manifest.is_none());
    }

    #[tokio::test]
    async fn empty_service_text_uses_fallback() {
        let r = requester(Arc::new(StaticGenerator::new("")));
        let result = r.request(&AnalysisConfig::default()).await;
        assert_eq!(result.report_text, FALLBACK_REPORT);
        assert_eq!(result.status, RunStatus::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_service_times_out_into_error_result() {
        let slow = StaticGenerator::new("late").with_delay(Duration::from_secs(120));
        let r = requester(Arc::new(slow));
        let result = r.request(&AnalysisConfig::default()).await;
        assert_eq!(result.status, RunStatus::Error);
        assert!(result.report_text.contains("timed out"));
    }

    #[tokio::test]
    async fn request_carries_template_and_low_temperature() {
        let generator = Arc::new(StaticGenerator::new("ok"));
        let r = requester(generator.clone());
        let cfg = AnalysisConfig {
            workflow: Workflow::DiffExpression,
            stat_method: StatMethod::Wilcoxon,
            ..Default::default()
        };
        r.request(&cfg).await;
        r.request(&cfg).await;
        // No caching: identical configs hit the service twice.
        assert_eq!(generator.request_count(), 2);

        let sent = generator.last_request().unwrap();
        assert_eq!(sent.model, "gemini-2.5-flash");
        assert!((sent.temperature - 0.3).abs() < f32::EPSILON);
        assert!(sent.system_instruction.contains("Wilcoxon"));
        assert_eq!(
            sent.contents,
            "Generate a bioinformatics analysis report for workflow: DIFF_EXPRESSION"
        );
    }

    #[test]
    fn markdown_export_includes_manifest_table() {
        let cfg = AnalysisConfig {
            workflow: Workflow::DiffExpression,
            ..Default::default()
        };
        let result = AnalysisResult {
            report_text: "## Summary\n150 genes.".into(),
            file_manifest: Some(file_manifest(Workflow::DiffExpression)),
            completion_timestamp: "12:00:00".into(),
            status: RunStatus::Success,
        };
        let md = to_markdown(&cfg, &result);
        assert!(md.starts_with("# Diff. Expression Analysis Report"));
        assert!(md.contains("| KEGG_pathways.xlsx | Excel | 320 KB |"));
        assert!(md.contains("- **Method**: DESeq2"));
        assert!(md.ends_with("150 genes.\n"));
    }
}
