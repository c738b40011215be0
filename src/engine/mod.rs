//! Pipeline simulator.
//!
//! Reveals a workflow's scripted stage messages one at a time on a fixed delay,
//! then asks the report requester for the result. No real work happens here.

mod stages;

pub use stages::{opening_message, stage_messages, REPORT_STAGE};

use crate::model::{AnalysisConfig, AnalysisResult, LogEntry, PipelineEvent, RunEvent, RunId};
use crate::report::ReportRequester;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub enum EngineControl {
    /// Abort the run at the next stage boundary or during the report request.
    Cancel,
}

#[derive(Debug)]
pub enum RunOutcome {
    Finished(AnalysisResult),
    Cancelled,
}

pub struct PipelineSimulator {
    stage_delay: Duration,
    requester: ReportRequester,
}

impl PipelineSimulator {
    pub fn new(stage_delay: Duration, requester: ReportRequester) -> Self {
        Self {
            stage_delay,
            requester,
        }
    }

    pub async fn run(
        self,
        run: RunId,
        config: AnalysisConfig,
        event_tx: mpsc::UnboundedSender<RunEvent>,
        mut control_rx: mpsc::UnboundedReceiver<EngineControl>,
    ) -> RunOutcome {
        let emit = |event: PipelineEvent| {
            let _ = event_tx.send(RunEvent::new(run, event));
        };
        let log = |message: String| {
            debug!(%run, %message, "stage");
            emit(PipelineEvent::Log(LogEntry::now(message)));
        };

        info!(%run, workflow = %config.workflow, "pipeline run started");
        emit(PipelineEvent::RunStarted {
            workflow: config.workflow,
        });
        log(opening_message(config.workflow));

        // Once every control sender is gone the run can no longer be cancelled.
        let mut control_open = true;

        for stage in stage_messages(&config) {
            if wait_or_cancel(self.stage_delay, &mut control_rx, &mut control_open).await {
                info!(%run, "pipeline run cancelled");
                return RunOutcome::Cancelled;
            }
            log(stage);
        }

        log(REPORT_STAGE.to_string());

        let request = self.requester.request(&config);
        tokio::pin!(request);
        loop {
            tokio::select! {
                result = &mut request => {
                    info!(%run, status = ?result.status, "pipeline run finished");
                    return RunOutcome::Finished(result);
                }
                ctrl = control_rx.recv(), if control_open => {
                    match ctrl {
                        Some(EngineControl::Cancel) => {
                            info!(%run, "pipeline run cancelled during report request");
                            return RunOutcome::Cancelled;
                        }
                        None => control_open = false,
                    }
                }
            }
        }
    }
}

/// Sleep for `delay`; returns true if a cancel arrived first.
async fn wait_or_cancel(
    delay: Duration,
    control_rx: &mut mpsc::UnboundedReceiver<EngineControl>,
    control_open: &mut bool,
) -> bool {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            _ = &mut sleep => return false,
            ctrl = control_rx.recv(), if *control_open => {
                match ctrl {
                    Some(EngineControl::Cancel) => return true,
                    None => *control_open = false,
                }
            }
        }
    }
}
