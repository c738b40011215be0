use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// The canned pipeline categories a user can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Workflow {
    BulkRna,
    SingleCell,
    DiffExpression,
}

impl Workflow {
    pub const ALL: [Workflow; 3] = [
        Workflow::BulkRna,
        Workflow::SingleCell,
        Workflow::DiffExpression,
    ];

    /// Identifier used in log lines and prompts.
    pub fn id(self) -> &'static str {
        match self {
            Workflow::BulkRna => "BULK_RNA",
            Workflow::SingleCell => "SINGLE_CELL",
            Workflow::DiffExpression => "DIFF_EXPRESSION",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Workflow::BulkRna => "Bulk RNA-Seq",
            Workflow::SingleCell => "Single Cell",
            Workflow::DiffExpression => "Diff. Expression",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Workflow::BulkRna => Workflow::SingleCell,
            Workflow::SingleCell => Workflow::DiffExpression,
            Workflow::DiffExpression => Workflow::BulkRna,
        }
    }
}

impl fmt::Display for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatMethod {
    #[serde(rename = "DESeq2")]
    DESeq2,
    #[serde(rename = "T-Test")]
    TTest,
    #[serde(rename = "Wilcoxon")]
    Wilcoxon,
    #[serde(rename = "Mann-Whitney U")]
    MannWhitneyU,
}

impl StatMethod {
    pub const ALL: [StatMethod; 4] = [
        StatMethod::DESeq2,
        StatMethod::TTest,
        StatMethod::Wilcoxon,
        StatMethod::MannWhitneyU,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StatMethod::DESeq2 => "DESeq2",
            StatMethod::TTest => "T-Test",
            StatMethod::Wilcoxon => "Wilcoxon",
            StatMethod::MannWhitneyU => "Mann-Whitney U",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for StatMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parse a numeric threshold the way a browser number input does:
/// anything that is not a number becomes NaN instead of being rejected.
pub fn parse_threshold(text: &str) -> f64 {
    text.trim().parse::<f64>().unwrap_or(f64::NAN)
}

/// User-editable parameters of the Analysis screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub workflow: Workflow,
    pub input_path: String,
    pub p_value_threshold: f64,
    pub log2fc_threshold: f64,
    pub stat_method: StatMethod,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            workflow: Workflow::BulkRna,
            input_path: "/data/projects/sample_01".to_string(),
            p_value_threshold: 0.05,
            log2fc_threshold: 1.0,
            stat_method: StatMethod::DESeq2,
        }
    }
}

/// One line of simulated console output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub message: String,
}

impl LogEntry {
    pub fn now(message: impl Into<String>) -> Self {
        Self {
            timestamp: local_time_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.timestamp, self.message)
    }
}

/// Wall-clock time as HH:MM:SS, local offset when the platform allows it.
pub fn local_time_string() -> String {
    let now = time::OffsetDateTime::now_local().unwrap_or_else(|_| time::OffsetDateTime::now_utc());
    now.format(time::macros::format_description!("[hour]:[minute]:[second]"))
        .unwrap_or_else(|_| "--:--:--".into())
}

/// A static "generated output file" shown in the results panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub size: String,
}

impl FileEntry {
    pub fn new(name: &str, kind: &str, size: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.to_string(),
            size: size.to_string(),
        }
    }

    /// Spreadsheet-like outputs get a table icon in the results panel.
    pub fn is_tabular(&self) -> bool {
        self.kind == "Excel" || self.kind == "CSV"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub report_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_manifest: Option<Vec<FileEntry>>,
    pub completion_timestamp: String,
    pub status: RunStatus,
}

/// Identifies one simulator run; events from other runs are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunId(pub u64);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub enum PipelineEvent {
    RunStarted {
        workflow: Workflow,
    },
    Log(LogEntry),
    RunCompleted {
        // Boxed so log events stay small.
        result: Box<AnalysisResult>,
    },
    RunFailed {
        reason: String,
    },
    RunCancelled,
    /// Status text for the UI that does not belong in the console.
    Info(String),
}

/// A pipeline event tagged with the run that produced it.
#[derive(Debug, Clone)]
pub struct RunEvent {
    pub run: RunId,
    pub event: PipelineEvent,
}

impl RunEvent {
    pub fn new(run: RunId, event: PipelineEvent) -> Self {
        Self { run, event }
    }
}

/// Runtime settings shared by the simulator and the report requester.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSettings {
    pub model: String,
    pub api_base_url: String,
    pub temperature: f32,
    #[serde(with = "humantime_serde")]
    pub stage_delay: Duration,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            api_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            temperature: 0.3,
            stage_delay: Duration::from_millis(800),
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Everything worth keeping about a finished run, used for JSON export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run: RunId,
    pub settings: RunSettings,
    pub config: AnalysisConfig,
    pub logs: Vec<LogEntry>,
    pub result: Option<AnalysisResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_parsing_yields_nan_for_garbage() {
        assert_eq!(parse_threshold("0.05"), 0.05);
        assert_eq!(parse_threshold(" 1.5 "), 1.5);
        assert!(parse_threshold("abc").is_nan());
        assert!(parse_threshold("").is_nan());
    }

    #[test]
    fn stat_method_cycles_through_all_values() {
        let mut m = StatMethod::DESeq2;
        for _ in 0..StatMethod::ALL.len() {
            m = m.next();
        }
        assert_eq!(m, StatMethod::DESeq2);
        assert_eq!(StatMethod::DESeq2.prev(), StatMethod::MannWhitneyU);
    }

    #[test]
    fn result_serializes_with_wire_names() {
        let r = AnalysisResult {
            report_text: "ok".into(),
            file_manifest: Some(vec![FileEntry::new("a.csv", "CSV", "1 MB")]),
            completion_timestamp: "12:00:00".into(),
            status: RunStatus::Success,
        };
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["status"], "SUCCESS");
        assert_eq!(v["file_manifest"][0]["type"], "CSV");

        let err = AnalysisResult {
            file_manifest: None,
            status: RunStatus::Error,
            ..r
        };
        let v = serde_json::to_value(&err).unwrap();
        assert!(v.get("file_manifest").is_none());
    }

    #[test]
    fn log_entry_display_matches_console_format() {
        let e = LogEntry {
            timestamp: "10:11:12".into(),
            message: "Aligning reads using STAR...".into(),
        };
        assert_eq!(e.to_string(), "[10:11:12] Aligning reads using STAR...");
    }
}
