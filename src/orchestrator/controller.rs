//! Run lifecycle controller.
//!
//! Owns start/cancel orchestration and emits run-tagged events for presentation layers.
//! At most one simulator run is in flight; overlapping starts are refused.

use crate::engine::{EngineControl, PipelineSimulator, RunOutcome};
use crate::model::{AnalysisConfig, PipelineEvent, RunEvent, RunId, RunSettings};
use crate::provider::TextGenerator;
use crate::report::ReportRequester;
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::time::Duration;
use tracing::{info, warn};

/// Commands emitted by UI layers to control runs.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    Start { run: RunId, config: AnalysisConfig },
    Cancel,
    Quit,
}

/// Internal handle for a running simulator task.
struct RunCtx {
    run: RunId,
    ctrl_tx: UnboundedSender<EngineControl>,
    handle: Option<tokio::task::JoinHandle<RunOutcome>>,
}

/// Spawn a new simulator run and return its control handle.
fn start_run(
    settings: &RunSettings,
    generator: &Arc<dyn TextGenerator>,
    run: RunId,
    config: AnalysisConfig,
    event_tx: UnboundedSender<RunEvent>,
) -> RunCtx {
    let (ctrl_tx, ctrl_rx) = tokio::sync::mpsc::unbounded_channel::<EngineControl>();
    let requester = ReportRequester::new(generator.clone(), settings);
    let simulator = PipelineSimulator::new(settings.stage_delay, requester);
    let handle = tokio::spawn(async move { simulator.run(run, config, event_tx, ctrl_rx).await });
    RunCtx {
        run,
        ctrl_tx,
        handle: Some(handle),
    }
}

/// Orchestrate simulator runs based on UI commands and emit events back to presentation layers.
pub(crate) async fn run_controller(
    settings: RunSettings,
    generator: Arc<dyn TextGenerator>,
    event_tx: UnboundedSender<RunEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut run_ctx: Option<RunCtx> = None;
    let mut quit_pending = false;
    // Cancel watchdog: if a cancel takes too long, emit a status message to keep UI feedback alive.
    let mut cancel_deadline: Option<tokio::time::Instant> = None;
    let mut watchdog = tokio::time::interval(Duration::from_millis(500));

    let send = |run: RunId, event: PipelineEvent| {
        let _ = event_tx.send(RunEvent::new(run, event));
    };

    let res = loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Start { run, config }) => {
                        if let Some(ctx) = &run_ctx {
                            warn!(requested = %run, active = %ctx.run, "start refused: run in progress");
                            send(ctx.run, PipelineEvent::Info("Run already in progress".into()));
                        } else {
                            run_ctx = Some(start_run(&settings, &generator, run, config, event_tx.clone()));
                        }
                    }
                    Some(UiCommand::Cancel) => {
                        if let Some(ctx) = &run_ctx {
                            let _ = ctx.ctrl_tx.send(EngineControl::Cancel);
                            send(ctx.run, PipelineEvent::Info("Cancelling…".into()));
                            cancel_deadline = Some(tokio::time::Instant::now() + Duration::from_secs(3));
                        }
                    }
                    Some(UiCommand::Quit) | None => {
                        // Quit waits for the current run to wind down so the UI can finalize cleanly.
                        quit_pending = true;
                        if let Some(ctx) = &run_ctx {
                            let _ = ctx.ctrl_tx.send(EngineControl::Cancel);
                            cancel_deadline = Some(tokio::time::Instant::now() + Duration::from_secs(3));
                        } else {
                            break Ok(());
                        }
                    }
                }
            }
            // Do not take the JoinHandle before this branch wins; otherwise it can be dropped
            // if another select branch is chosen, and we'll never observe completion.
            maybe_done = async {
                if let Some(ctx) = &mut run_ctx {
                    if let Some(h) = ctx.handle.as_mut() {
                        return Some((ctx.run, h.await));
                    }
                }
                futures::future::pending().await
            } => {
                if let Some((run, join_res)) = maybe_done {
                    match join_res {
                        Ok(RunOutcome::Finished(r)) => {
                            send(run, PipelineEvent::RunCompleted { result: Box::new(r) });
                        }
                        Ok(RunOutcome::Cancelled) => {
                            send(run, PipelineEvent::RunCancelled);
                        }
                        Err(e) => {
                            warn!(%run, error = %e, "simulator task failed");
                            send(run, PipelineEvent::RunFailed { reason: format!("Run join failed: {e}") });
                        }
                    }
                    info!(%run, "run finished");
                    run_ctx = None;
                    cancel_deadline = None;
                    if quit_pending {
                        break Ok(());
                    }
                }
            }
            // If cancel stalls (e.g., a request in flight), keep the user informed.
            _ = watchdog.tick() => {
                if let Some(deadline) = cancel_deadline {
                    if tokio::time::Instant::now() >= deadline {
                        if let Some(ctx) = &run_ctx {
                            send(ctx.run, PipelineEvent::Info("Still cancelling…".into()));
                        }
                        cancel_deadline = None;
                    }
                }
            }
        }
    };

    res
}
