//! Analysis screen state.
//!
//! One owned [`AnalysisSession`] per Analysis screen holds the configuration, the
//! console log, the latest result, and the simulator's lifecycle state. Events
//! from any run other than the current one are dropped.

use crate::model::{
    AnalysisConfig, AnalysisResult, LogEntry, PipelineEvent, RunEvent, RunId, RunRecord,
    RunSettings, RunStatus,
};
use tracing::debug;

pub const COMPLETED_MARKER: &str = "Pipeline completed successfully.";
pub const FAILED_MARKER: &str = "Error: Pipeline failed.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatorState {
    Idle,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone)]
pub struct AnalysisSession {
    pub config: AnalysisConfig,
    state: SimulatorState,
    current_run: Option<RunId>,
    next_run: u64,
    logs: Vec<LogEntry>,
    result: Option<AnalysisResult>,
    /// Configuration snapshot taken when the current run started.
    run_config: Option<AnalysisConfig>,
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

impl AnalysisSession {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            state: SimulatorState::Idle,
            current_run: None,
            next_run: 1,
            logs: Vec::new(),
            result: None,
            run_config: None,
        }
    }

    pub fn state(&self) -> SimulatorState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SimulatorState::Running
    }

    /// The start control is disabled while a run is in flight.
    pub fn can_start(&self) -> bool {
        !self.is_running()
    }

    pub fn current_run(&self) -> Option<RunId> {
        self.current_run
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    /// Start a new run: clears logs and result immediately and returns the run id
    /// plus the configuration snapshot to hand to the simulator. Returns `None`
    /// while a run is already in flight.
    pub fn begin_run(&mut self) -> Option<(RunId, AnalysisConfig)> {
        if !self.can_start() {
            return None;
        }
        let run = RunId(self.next_run);
        self.next_run += 1;
        self.current_run = Some(run);
        self.state = SimulatorState::Running;
        self.logs.clear();
        self.result = None;
        self.run_config = Some(self.config.clone());
        Some((run, self.config.clone()))
    }

    /// Apply an event. Returns false when it was discarded as stale.
    ///
    /// An Error-status result counts as a failure: the session moves to Failed and
    /// logs the failure marker, while the result stays available for display.
    pub fn apply(&mut self, ev: RunEvent) -> bool {
        if self.current_run != Some(ev.run) {
            debug!(run = %ev.run, current = ?self.current_run, "discarding stale event");
            return false;
        }
        if self.state != SimulatorState::Running {
            // Late events after a terminal transition of the same run.
            return false;
        }
        match ev.event {
            PipelineEvent::RunStarted { .. } | PipelineEvent::Info(_) => {}
            PipelineEvent::Log(entry) => self.logs.push(entry),
            PipelineEvent::RunCompleted { result } => {
                let ok = result.status == RunStatus::Success;
                self.result = Some(*result);
                if ok {
                    self.logs.push(LogEntry::now(COMPLETED_MARKER));
                    self.state = SimulatorState::Completed;
                } else {
                    self.logs.push(LogEntry::now(FAILED_MARKER));
                    self.state = SimulatorState::Failed;
                }
            }
            PipelineEvent::RunFailed { reason } => {
                debug!(%reason, "run failed");
                self.logs.push(LogEntry::now(FAILED_MARKER));
                self.state = SimulatorState::Failed;
            }
            PipelineEvent::RunCancelled => {
                self.logs.push(LogEntry::now("Run cancelled."));
                self.state = SimulatorState::Idle;
                self.current_run = None;
            }
        }
        true
    }

    /// Snapshot of the latest run for export.
    pub fn record(&self, settings: &RunSettings) -> Option<RunRecord> {
        // A cancelled run clears current_run; nothing left to export then.
        let run = self.current_run?;
        Some(RunRecord {
            run,
            settings: settings.clone(),
            config: self.run_config.clone().unwrap_or_else(|| self.config.clone()),
            logs: self.logs.clone(),
            result: self.result.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FileEntry, Workflow};

    fn log(run: RunId, msg: &str) -> RunEvent {
        RunEvent::new(
            run,
            PipelineEvent::Log(LogEntry {
                timestamp: "00:00:00".into(),
                message: msg.into(),
            }),
        )
    }

    fn completed(run: RunId, status: RunStatus) -> RunEvent {
        RunEvent::new(
            run,
            PipelineEvent::RunCompleted {
                result: Box::new(AnalysisResult {
                    report_text: "done".into(),
                    file_manifest: Some(vec![FileEntry::new("a", "CSV", "1 KB")]),
                    completion_timestamp: "00:00:01".into(),
                    status,
                }),
            },
        )
    }

    fn messages(s: &AnalysisSession) -> Vec<&str> {
        s.logs().iter().map(|e| e.message.as_str()).collect()
    }

    #[test]
    fn starts_idle_with_empty_log() {
        let s = AnalysisSession::default();
        assert_eq!(s.state(), SimulatorState::Idle);
        assert!(s.logs().is_empty());
        assert!(s.result().is_none());
        assert!(s.can_start());
    }

    #[test]
    fn begin_run_clears_previous_logs_and_result_synchronously() {
        let mut s = AnalysisSession::default();
        let (run, _) = s.begin_run().unwrap();
        s.apply(log(run, "stage"));
        s.apply(completed(run, RunStatus::Success));
        assert_eq!(s.state(), SimulatorState::Completed);
        assert!(s.result().is_some());

        let (next, _) = s.begin_run().unwrap();
        assert_ne!(run, next);
        assert!(s.logs().is_empty());
        assert!(s.result().is_none());
        assert_eq!(s.state(), SimulatorState::Running);
    }

    #[test]
    fn start_is_refused_while_running() {
        let mut s = AnalysisSession::default();
        assert!(s.begin_run().is_some());
        assert!(!s.can_start());
        assert!(s.begin_run().is_none());
    }

    #[test]
    fn stale_events_are_discarded() {
        let mut s = AnalysisSession::default();
        let (first, _) = s.begin_run().unwrap();
        s.apply(RunEvent::new(first, PipelineEvent::RunCancelled));
        let (second, _) = s.begin_run().unwrap();

        assert!(!s.apply(log(first, "late from first run")));
        assert!(s.apply(log(second, "fresh")));
        assert_eq!(messages(&s), vec!["fresh"]);
    }

    #[test]
    fn success_appends_completion_marker() {
        let mut s = AnalysisSession::default();
        let (run, _) = s.begin_run().unwrap();
        s.apply(log(run, "a"));
        s.apply(completed(run, RunStatus::Success));
        assert_eq!(messages(&s), vec!["a", COMPLETED_MARKER]);
        assert!(s.can_start());
    }

    #[test]
    fn error_result_transitions_to_failed_but_keeps_result() {
        let mut s = AnalysisSession::default();
        let (run, _) = s.begin_run().unwrap();
        s.apply(completed(run, RunStatus::Error));
        assert_eq!(s.state(), SimulatorState::Failed);
        assert_eq!(messages(&s), vec![FAILED_MARKER]);
        assert_eq!(s.result().map(|r| r.status), Some(RunStatus::Error));
    }

    #[test]
    fn run_failure_appends_single_failure_entry() {
        let mut s = AnalysisSession::default();
        let (run, _) = s.begin_run().unwrap();
        s.apply(RunEvent::new(
            run,
            PipelineEvent::RunFailed {
                reason: "join error".into(),
            },
        ));
        // A duplicate terminal event is ignored.
        assert!(!s.apply(RunEvent::new(
            run,
            PipelineEvent::RunFailed {
                reason: "again".into(),
            },
        )));
        assert_eq!(messages(&s), vec![FAILED_MARKER]);
        assert!(s.result().is_none());
    }

    #[test]
    fn run_snapshot_ignores_later_config_edits() {
        let mut s = AnalysisSession::default();
        let (run, snapshot) = s.begin_run().unwrap();
        s.config.workflow = Workflow::SingleCell;
        assert_eq!(snapshot.workflow, Workflow::BulkRna);
        s.apply(completed(run, RunStatus::Success));
        let record = s.record(&RunSettings::default()).unwrap();
        assert_eq!(record.run, run);
        assert_eq!(record.config.workflow, Workflow::BulkRna);
        assert_eq!(record.logs.len(), 1);
    }
}
