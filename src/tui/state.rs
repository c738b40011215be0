use crate::chart::{ChartKind, PlotEditor};
use crate::model::{parse_threshold, PipelineEvent, RunEvent, RunSettings, Workflow};
use crate::session::AnalysisSession;

pub const BULK_TOOLS: [&str; 4] = [
    "FastQC (Quality Control)",
    "Fastp (Trimming)",
    "STAR (Alignment)",
    "Samtools (Sorting)",
];
pub const PLATFORMS: [&str; 3] = [
    "10x Genomics (Cellranger)",
    "BGI (DNBelab C4)",
    "Smart-seq2",
];
pub const GENOMES: [&str; 2] = ["Human (GRCh38)", "Mouse (mm10)"];
pub const GROUPING_FILE: &str = "group_metadata.csv";

/// The active screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Home,
    Analysis,
    Plotting,
    Help,
}

impl View {
    pub const ALL: [View; 4] = [View::Home, View::Analysis, View::Plotting, View::Help];

    pub fn title(self) -> &'static str {
        match self {
            View::Home => "Dashboard",
            View::Analysis => "Sequence Analysis",
            View::Plotting => "Visualization",
            View::Help => "Help",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|v| *v == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }
}

/// A focusable control on the Analysis screen. Which ones exist depends on the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    InputPath,
    Tool(usize),
    Platform,
    Genome,
    StatMethod,
    PValue,
    Log2Fc,
}

impl Field {
    pub fn for_workflow(workflow: Workflow) -> Vec<Field> {
        match workflow {
            Workflow::BulkRna => {
                let mut fields = vec![Field::InputPath];
                fields.extend((0..BULK_TOOLS.len()).map(Field::Tool));
                fields
            }
            Workflow::SingleCell => vec![Field::Platform, Field::Genome],
            Workflow::DiffExpression => vec![Field::StatMethod, Field::PValue, Field::Log2Fc],
        }
    }

    pub fn is_text(self) -> bool {
        matches!(self, Field::InputPath | Field::PValue | Field::Log2Fc)
    }
}

/// Cosmetic per-workflow options. None of these reach the simulator or the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayOptions {
    pub tools: [bool; BULK_TOOLS.len()],
    pub platform: usize,
    pub genome: usize,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            tools: [true; BULK_TOOLS.len()],
            platform: 0,
            genome: 0,
        }
    }
}

pub struct UiState {
    pub view: View,
    pub info: String,
    pub settings: RunSettings,
    pub session: AnalysisSession,
    pub options: DisplayOptions,
    pub focus: usize,
    /// Text field currently receiving keystrokes.
    pub editing: Option<Field>,
    pub p_value_text: String,
    pub log2fc_text: String,
    pub editor: PlotEditor,
    pub editing_chart: bool,
    pub last_exported_path: Option<String>,
    pub tick: u64,
}

impl Default for UiState {
    fn default() -> Self {
        Self::new(
            RunSettings::default(),
            AnalysisSession::default(),
            PlotEditor::default(),
        )
    }
}

impl UiState {
    pub fn new(settings: RunSettings, session: AnalysisSession, editor: PlotEditor) -> Self {
        let p_value_text = session.config.p_value_threshold.to_string();
        let log2fc_text = session.config.log2fc_threshold.to_string();
        Self {
            view: View::Home,
            info: String::new(),
            settings,
            session,
            options: DisplayOptions::default(),
            focus: 0,
            editing: None,
            p_value_text,
            log2fc_text,
            editor,
            editing_chart: false,
            last_exported_path: None,
            tick: 0,
        }
    }

    pub fn fields(&self) -> Vec<Field> {
        Field::for_workflow(self.session.config.workflow)
    }

    pub fn focused_field(&self) -> Option<Field> {
        self.fields().get(self.focus).copied()
    }

    pub fn set_workflow(&mut self, workflow: Workflow) {
        self.session.config.workflow = workflow;
        self.focus = 0;
        self.editing = None;
        self.info = format!("Workflow: {}", workflow.label());
    }

    pub fn focus_next(&mut self) {
        let n = self.fields().len();
        if n > 0 {
            self.focus = (self.focus + 1) % n;
        }
    }

    pub fn focus_prev(&mut self) {
        let n = self.fields().len();
        if n > 0 {
            self.focus = (self.focus + n - 1) % n;
        }
    }

    /// Enter on the focused field: toggle a checkbox or start/stop text entry.
    pub fn activate_focused(&mut self) {
        match self.focused_field() {
            Some(Field::Tool(i)) => self.options.tools[i] = !self.options.tools[i],
            Some(f) if f.is_text() => {
                self.editing = if self.editing == Some(f) { None } else { Some(f) };
            }
            Some(_) => self.cycle_focused(true),
            None => {}
        }
    }

    /// Left/right on a selector.
    pub fn cycle_focused(&mut self, forward: bool) {
        let field = self.focused_field();
        let cfg = &mut self.session.config;
        match field {
            Some(Field::StatMethod) => {
                cfg.stat_method = if forward {
                    cfg.stat_method.next()
                } else {
                    cfg.stat_method.prev()
                };
            }
            Some(Field::Platform) => {
                self.options.platform = step(self.options.platform, PLATFORMS.len(), forward);
            }
            Some(Field::Genome) => {
                self.options.genome = step(self.options.genome, GENOMES.len(), forward);
            }
            _ => {}
        }
    }

    pub fn field_text(&self, field: Field) -> &str {
        match field {
            Field::InputPath => &self.session.config.input_path,
            Field::PValue => &self.p_value_text,
            Field::Log2Fc => &self.log2fc_text,
            _ => "",
        }
    }

    pub fn edit_push(&mut self, c: char) {
        if let Some(field) = self.editing {
            self.field_buffer(field).push(c);
            self.sync_thresholds();
        }
    }

    pub fn edit_pop(&mut self) {
        if let Some(field) = self.editing {
            self.field_buffer(field).pop();
            self.sync_thresholds();
        }
    }

    fn field_buffer(&mut self, field: Field) -> &mut String {
        match field {
            Field::PValue => &mut self.p_value_text,
            Field::Log2Fc => &mut self.log2fc_text,
            _ => &mut self.session.config.input_path,
        }
    }

    // Thresholds follow the text verbatim; unparsable input becomes NaN.
    fn sync_thresholds(&mut self) {
        self.session.config.p_value_threshold = parse_threshold(&self.p_value_text);
        self.session.config.log2fc_threshold = parse_threshold(&self.log2fc_text);
    }

    pub fn set_chart_kind(&mut self, kind: ChartKind) {
        self.editor.set_kind(kind);
        self.editing_chart = false;
        self.info = format!("Loaded {} sample", kind.label());
    }

    /// Route a controller event: status text goes to the info line, the rest to the session.
    pub fn apply_event(&mut self, ev: RunEvent) {
        if self.session.current_run() == Some(ev.run) {
            match &ev.event {
                PipelineEvent::Info(msg) => self.info = msg.clone(),
                PipelineEvent::RunStarted { workflow } => {
                    self.info = format!("Run {} running: {}", ev.run, workflow.label());
                }
                _ => {}
            }
        }
        let terminal = matches!(
            ev.event,
            PipelineEvent::RunCompleted { .. }
                | PipelineEvent::RunFailed { .. }
                | PipelineEvent::RunCancelled
        );
        let run = ev.run;
        if self.session.apply(ev) && terminal {
            self.info = match self.session.state() {
                crate::session::SimulatorState::Completed => format!("Run {run} completed"),
                crate::session::SimulatorState::Failed => format!("Run {run} failed"),
                _ => format!("Run {run} cancelled"),
            };
        }
    }
}

fn step(idx: usize, len: usize, forward: bool) -> usize {
    if forward {
        (idx + 1) % len
    } else {
        (idx + len - 1) % len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnalysisResult, RunId, RunStatus, StatMethod};

    #[test]
    fn views_cycle_through_all_screens() {
        let mut v = View::Home;
        let mut seen = Vec::new();
        for _ in 0..View::ALL.len() {
            seen.push(v);
            v = v.next();
        }
        assert_eq!(seen, View::ALL.to_vec());
        assert_eq!(v, View::Home);
    }

    #[test]
    fn fields_depend_on_workflow() {
        let mut s = UiState::default();
        assert_eq!(s.fields().len(), 5);
        s.focus = 3;
        s.set_workflow(Workflow::DiffExpression);
        assert_eq!(s.focus, 0);
        assert_eq!(s.focused_field(), Some(Field::StatMethod));
    }

    #[test]
    fn threshold_edits_parse_on_every_keystroke() {
        let mut s = UiState::default();
        s.set_workflow(Workflow::DiffExpression);
        s.focus_next();
        assert_eq!(s.focused_field(), Some(Field::PValue));
        s.activate_focused();
        assert_eq!(s.editing, Some(Field::PValue));

        s.edit_pop();
        s.edit_pop();
        assert_eq!(s.p_value_text, "0.");
        assert_eq!(s.session.config.p_value_threshold, 0.0);
        s.edit_push('x');
        assert!(s.session.config.p_value_threshold.is_nan());
        s.edit_pop();
        s.edit_push('1');
        assert_eq!(s.session.config.p_value_threshold, 0.1);
    }

    #[test]
    fn selectors_cycle_and_checkboxes_toggle() {
        let mut s = UiState::default();
        s.focus = 1;
        s.activate_focused();
        assert!(!s.options.tools[0]);

        s.set_workflow(Workflow::DiffExpression);
        s.cycle_focused(false);
        assert_eq!(s.session.config.stat_method, StatMethod::MannWhitneyU);

        s.set_workflow(Workflow::SingleCell);
        s.cycle_focused(true);
        assert_eq!(PLATFORMS[s.options.platform], "BGI (DNBelab C4)");
    }

    #[test]
    fn decorative_options_leave_config_untouched() {
        let mut s = UiState::default();
        let before = s.session.config.clone();
        s.focus = 2;
        s.activate_focused();
        s.set_workflow(Workflow::SingleCell);
        s.cycle_focused(true);
        s.focus_next();
        s.cycle_focused(true);
        assert_eq!(
            s.session.config,
            crate::model::AnalysisConfig {
                workflow: Workflow::SingleCell,
                ..before
            }
        );
    }

    #[test]
    fn terminal_event_updates_info_line() {
        let mut s = UiState::default();
        let (run, _) = s.session.begin_run().unwrap();
        s.apply_event(RunEvent::new(run, PipelineEvent::Info("Cancelling…".into())));
        assert_eq!(s.info, "Cancelling…");
        s.apply_event(RunEvent::new(
            run,
            PipelineEvent::RunCompleted {
                result: Box::new(AnalysisResult {
                    report_text: "ok".into(),
                    file_manifest: None,
                    completion_timestamp: "10:00:00".into(),
                    status: RunStatus::Success,
                }),
            },
        ));
        assert_eq!(s.info, "Run #1 completed");
    }

    #[test]
    fn run_start_names_the_workflow_on_the_info_line() {
        let mut s = UiState::default();
        s.session.config.workflow = Workflow::SingleCell;
        let (run, cfg) = s.session.begin_run().unwrap();
        s.apply_event(RunEvent::new(
            run,
            PipelineEvent::RunStarted { workflow: cfg.workflow },
        ));
        assert_eq!(s.info, format!("Run #1 running: {}", Workflow::SingleCell.label()));

        // A stale run's start event leaves the line alone.
        s.apply_event(RunEvent::new(
            RunId(99),
            PipelineEvent::RunStarted { workflow: Workflow::BulkRna },
        ));
        assert!(s.info.contains(Workflow::SingleCell.label()));
    }
}
