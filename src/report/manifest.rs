use crate::model::{FileEntry, Workflow};

/// The static "generated files" listing for a workflow.
pub fn file_manifest(workflow: Workflow) -> Vec<FileEntry> {
    match workflow {
        Workflow::DiffExpression => vec![
            FileEntry::new("all_genes_matrix.csv", "CSV", "12.4 MB"),
            FileEntry::new("up_regulated_genes.csv", "CSV", "1.2 MB"),
            FileEntry::new("down_regulated_genes.csv", "CSV", "0.8 MB"),
            FileEntry::new("GO_enrichment.xlsx", "Excel", "450 KB"),
            FileEntry::new("KEGG_pathways.xlsx", "Excel", "320 KB"),
            FileEntry::new("Reactome_analysis.csv", "CSV", "210 KB"),
        ],
        Workflow::BulkRna => vec![
            FileEntry::new("gene_count_matrix.txt", "TXT", "8.5 MB"),
            FileEntry::new("multiqc_report.html", "HTML", "2.1 MB"),
            FileEntry::new("alignment_stats.json", "JSON", "15 KB"),
        ],
        Workflow::SingleCell => vec![
            FileEntry::new("filtered_feature_bc_matrix.h5", "HDF5", "45 MB"),
            FileEntry::new("web_summary.html", "HTML", "3.5 MB"),
            FileEntry::new("cloupe.cloupe", "Loupe", "12 MB"),
        ],
    }
}
