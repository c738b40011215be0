use crate::chart::{parse_points, ChartKind, PlotEditor};
use crate::model::{
    parse_threshold, AnalysisConfig, PipelineEvent, RunEvent, RunRecord, RunSettings, RunStatus,
    StatMethod, Workflow,
};
use crate::orchestrator::{self, ExportTargets, UiCommand};
use crate::provider::{GeminiProvider, TextGenerator};
use crate::session::AnalysisSession;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WorkflowArg {
    BulkRna,
    SingleCell,
    DiffExpression,
}

impl From<WorkflowArg> for Workflow {
    fn from(w: WorkflowArg) -> Self {
        match w {
            WorkflowArg::BulkRna => Workflow::BulkRna,
            WorkflowArg::SingleCell => Workflow::SingleCell,
            WorkflowArg::DiffExpression => Workflow::DiffExpression,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatMethodArg {
    Deseq2,
    TTest,
    Wilcoxon,
    MannWhitneyU,
}

impl From<StatMethodArg> for StatMethod {
    fn from(m: StatMethodArg) -> Self {
        match m {
            StatMethodArg::Deseq2 => StatMethod::DESeq2,
            StatMethodArg::TTest => StatMethod::TTest,
            StatMethodArg::Wilcoxon => StatMethod::Wilcoxon,
            StatMethodArg::MannWhitneyU => StatMethod::MannWhitneyU,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChartKindArg {
    Scatter,
    Bar,
    Line,
}

impl From<ChartKindArg> for ChartKind {
    fn from(k: ChartKindArg) -> Self {
        match k {
            ChartKindArg::Scatter => ChartKind::Scatter,
            ChartKindArg::Bar => ChartKind::Bar,
            ChartKindArg::Line => ChartKind::Line,
        }
    }
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "biovisio",
    version,
    about = "Simulated bioinformatics pipelines with AI-written reports and terminal charts"
)]
pub struct Cli {
    /// Print the run record as JSON and exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Print a text summary and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Validate a chart JSON file and exit
    #[arg(long, value_name = "FILE")]
    pub validate_chart: Option<PathBuf>,

    /// Pipeline to run
    #[arg(long, value_enum, default_value_t = WorkflowArg::BulkRna)]
    pub workflow: WorkflowArg,

    /// Input directory shown to the pipeline
    #[arg(long, default_value = "/data/projects/sample_01")]
    pub input_path: String,

    /// P-value cutoff (non-numeric input becomes NaN)
    #[arg(long, default_value = "0.05")]
    pub p_value: String,

    /// Log2 fold-change cutoff (non-numeric input becomes NaN)
    #[arg(long, default_value = "1.0")]
    pub log2fc: String,

    /// Statistical method for differential expression
    #[arg(long, value_enum, default_value_t = StatMethodArg::Deseq2)]
    pub stat_method: StatMethodArg,

    /// Generative model used for reports
    #[arg(long, default_value = "gemini-2.5-flash")]
    pub model: String,

    /// Base URL of the generation API
    #[arg(long, default_value = "https://generativelanguage.googleapis.com/v1beta")]
    pub api_base_url: String,

    /// Delay between revealed pipeline stages
    #[arg(long, default_value = "800ms")]
    pub stage_delay: humantime::Duration,

    /// Timeout for the report request
    #[arg(long, default_value = "60s")]
    pub request_timeout: humantime::Duration,

    /// Initial chart type (and the type used by --validate-chart)
    #[arg(long, value_enum, default_value_t = ChartKindArg::Scatter)]
    pub chart_kind: ChartKindArg,

    /// Load the initial chart JSON text from a file
    #[arg(long, value_name = "FILE")]
    pub chart_data: Option<PathBuf>,

    /// Export the run record as JSON after a headless run
    #[arg(long, value_name = "FILE")]
    pub export_json: Option<PathBuf>,

    /// Export the report as Markdown after a headless run
    #[arg(long, value_name = "FILE")]
    pub export_markdown: Option<PathBuf>,

    /// Write logs to a file (the only way to see logs in TUI mode)
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// True when no interactive terminal UI will be started.
    pub fn is_headless(&self) -> bool {
        self.json || self.text || self.validate_chart.is_some() || !cfg!(feature = "tui")
    }
}

pub async fn run(args: Cli) -> Result<()> {
    if args.json && args.text {
        return Err(anyhow::anyhow!("--json and --text cannot be used together"));
    }

    if let Some(path) = args.validate_chart.as_deref() {
        return validate_chart(path, args.chart_kind.into());
    }

    if !args.json && !args.text {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            return run_headless(args, false).await;
        }
    }

    let json = args.json;
    run_headless(args, json).await
}

/// Build `RunSettings` from CLI arguments.
pub fn build_settings(args: &Cli) -> RunSettings {
    RunSettings {
        model: args.model.clone(),
        api_base_url: args.api_base_url.clone(),
        stage_delay: Duration::from(args.stage_delay),
        request_timeout: Duration::from(args.request_timeout),
        ..RunSettings::default()
    }
}

/// Build the initial `AnalysisConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> AnalysisConfig {
    AnalysisConfig {
        workflow: args.workflow.into(),
        input_path: args.input_path.clone(),
        p_value_threshold: parse_threshold(&args.p_value),
        log2fc_threshold: parse_threshold(&args.log2fc),
        stat_method: args.stat_method.into(),
    }
}

/// The chart editor as it should look at startup.
pub fn initial_editor(args: &Cli) -> Result<PlotEditor> {
    let mut editor = PlotEditor::new(args.chart_kind.into());
    if let Some(path) = args.chart_data.as_deref() {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read chart data {}", path.display()))?;
        editor.set_text(text);
    }
    Ok(editor)
}

fn export_targets(args: &Cli) -> ExportTargets {
    ExportTargets {
        json: args.export_json.clone(),
        markdown: args.export_markdown.clone(),
    }
}

/// Parse a chart file with the editor's rules; an invalid file is an error.
fn validate_chart(path: &std::path::Path, kind: ChartKind) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read chart data {}", path.display()))?;
    let points = parse_points(kind, &text)
        .with_context(|| format!("{} is not valid {} data", path.display(), kind.label()))?;
    println!("{}: {} points, valid for {}", path.display(), points.len(), kind.label());
    Ok(())
}

/// Run one pipeline without the TUI. Stage lines stream to stderr in text mode;
/// the summary or JSON record goes to stdout at the end.
async fn run_headless(args: Cli, json: bool) -> Result<()> {
    let settings = build_settings(&args);
    let generator: Arc<dyn TextGenerator> =
        Arc::new(GeminiProvider::from_env(&settings).context("create generation client")?);

    let (out_tx, out_handle) = spawn_output_writer();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<RunEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();
    let controller = tokio::spawn(orchestrator::run_controller(
        settings.clone(),
        generator,
        event_tx,
        cmd_rx,
    ));

    let mut session = AnalysisSession::new(build_config(&args));
    let (run, config) = session
        .begin_run()
        .context("a fresh session always accepts a run")?;
    info!(%run, workflow = %config.workflow, "headless run");
    let _ = cmd_tx.send(UiCommand::Start { run, config });

    // Ctrl-C cancels the run once; the controller reports the cancellation back.
    let mut watch_ctrl_c = true;
    loop {
        tokio::select! {
            ev = event_rx.recv() => {
                let Some(ev) = ev else { break };
                if !json {
                    match &ev.event {
                        PipelineEvent::Log(entry) => {
                            let _ = out_tx.send(OutputLine::Stderr(entry.to_string()));
                        }
                        PipelineEvent::Info(msg) => {
                            let _ = out_tx.send(OutputLine::Stderr(msg.clone()));
                        }
                        _ => {}
                    }
                }
                session.apply(ev);
                if !session.is_running() {
                    break;
                }
            }
            signal = tokio::signal::ctrl_c(), if watch_ctrl_c => {
                watch_ctrl_c = false;
                if ctrl_c_cancels(&signal) {
                    let _ = cmd_tx.send(UiCommand::Cancel);
                }
            }
        }
    }
    let _ = cmd_tx.send(UiCommand::Quit);
    controller
        .await
        .context("controller task failed")?
        .context("controller failed")?;

    let Some(record) = session.record(&settings) else {
        drop(out_tx);
        let _ = out_handle.await;
        return Err(anyhow::anyhow!("pipeline run {run} cancelled"));
    };

    let processed = orchestrator::process_run_completion(&export_targets(&args), &record);
    for msg in processed.export_messages {
        let _ = out_tx.send(OutputLine::Stderr(msg));
    }

    if json {
        let out = serde_json::to_string_pretty(&record)?;
        let _ = out_tx.send(OutputLine::Stdout(out));
    } else {
        let summary = crate::text_summary::build_text_summary(&record)?;
        for line in summary.lines {
            let _ = out_tx.send(OutputLine::Stdout(line));
        }
    }

    drop(out_tx);
    let _ = out_handle.await;

    finish_status(&record)
}

/// A run whose report failed is reported as an error after its output is printed.
/// Only a delivered signal cancels; a listener that failed to install is logged
/// and the run continues.
fn ctrl_c_cancels(signal: &std::io::Result<()>) -> bool {
    match signal {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "cannot listen for Ctrl-C");
            false
        }
    }
}

fn finish_status(record: &RunRecord) -> Result<()> {
    match record.result.as_ref().map(|r| r.status) {
        Some(RunStatus::Success) => Ok(()),
        Some(RunStatus::Error) => Err(anyhow::anyhow!("pipeline run {} failed", record.run)),
        None => Err(anyhow::anyhow!("pipeline run {} produced no result", record.run)),
    }
}
