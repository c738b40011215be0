//! Scripted stage messages for each workflow.

use crate::model::{AnalysisConfig, Workflow};

pub const REPORT_STAGE: &str = "Generating final report and output tables...";

pub fn opening_message(workflow: Workflow) -> String {
    format!("Initializing {workflow} pipeline...")
}

/// The ordered stage list for a run. Only the differential expression script
/// reads the configuration (method name and p-value threshold).
pub fn stage_messages(config: &AnalysisConfig) -> Vec<String> {
    match config.workflow {
        Workflow::BulkRna => [
            "Scanning fastq.gz files in directory...",
            "Running FastQC on 12 samples...",
            "Trimming adapters with fastp...",
            "Aligning reads using STAR...",
            "Indexing BAM files with samtools...",
            "Quantifying gene expression...",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
        Workflow::SingleCell => [
            "Validating 10x Genomics directory structure...",
            "Running Cellranger count...",
            "Correcting barcodes and UMIs...",
            "Generating feature-barcode matrix...",
            "Performing dimensionality reduction (PCA/tSNE)...",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
        Workflow::DiffExpression => vec![
            "Loading expression matrix...".to_string(),
            "Checking group assignments...".to_string(),
            format!("Running {} statistics...", config.stat_method),
            format!("Filtering results (p < {})...", config.p_value_threshold),
            "Performing GO Enrichment Analysis...".to_string(),
            "Performing KEGG Pathway Analysis...".to_string(),
        ],
    }
}
