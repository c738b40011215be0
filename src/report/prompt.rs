//! Prompt templates, one per workflow.

use crate::model::{AnalysisConfig, Workflow};

const BASE_INSTRUCTION: &str = "You are an expert senior bioinformatician. You have just completed a complex analysis pipeline.";

/// System instruction for a run, with thresholds and method substituted in.
pub fn system_instruction(config: &AnalysisConfig) -> String {
    match config.workflow {
        Workflow::BulkRna => format!(
            "{BASE_INSTRUCTION} The user ran an upstream Bulk RNA-Seq pipeline (FastQC -> Fastp -> STAR -> Samtools). \
             Summarize the typical output files expected (Expression Matrix, BAM files) and provide a brief quality \
             control report template assuming high-quality data (Q30 > 90%). Format as Markdown."
        ),
        Workflow::SingleCell => format!(
            "{BASE_INSTRUCTION} The user ran a Single Cell RNA-Seq pipeline (Cellranger/BGI). \
             Explain the generated outputs (Barcodes, Features, Matrix) and interpret a hypothetical clustering \
             result showing 5 distinct cell populations. Format as Markdown."
        ),
        Workflow::DiffExpression => format!(
            "{BASE_INSTRUCTION} The user ran Differential Expression Analysis using {method}. \
             Thresholds: P-value < {p}, Log2FC > {fc}.\n\
             Generate a scientific summary of the results assuming 150 significant genes were found (100 Up, 50 Down).\n\
             Briefly interpret the biological significance of top GO terms: 'Cell Cycle' and 'Immune Response'.",
            method = config.stat_method,
            p = config.p_value_threshold,
            fc = config.log2fc_threshold,
        ),
    }
}

/// The short user-turn content accompanying the system instruction.
pub fn content_request(workflow: Workflow) -> String {
    format!("Generate a bioinformatics analysis report for workflow: {workflow}")
}
