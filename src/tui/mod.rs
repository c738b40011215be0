mod charts;
mod export;
mod help;
mod report;
mod state;

use crate::cli::Cli;
use crate::model::RunEvent;
use crate::orchestrator::{self, UiCommand};
use crate::provider::{GeminiProvider, TextGenerator};
use crate::session::AnalysisSession;
use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent,
        KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
    Terminal,
};
use state::{Field, UiState, View, BULK_TOOLS, GENOMES, GROUPING_FILE, PLATFORMS};
use std::sync::Arc;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::chart::ChartKind;
use crate::model::Workflow;

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

pub async fn run(args: Cli) -> Result<()> {
    let settings = crate::cli::build_settings(&args);
    let config = crate::cli::build_config(&args);
    let editor = crate::cli::initial_editor(&args)?;
    let generator: Arc<dyn TextGenerator> =
        Arc::new(GeminiProvider::from_env(&settings).context("create generation client")?);

    // Unbounded channels avoid backpressure between the controller and the UI thread.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<RunEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    let state = UiState::new(settings.clone(), AnalysisSession::new(config), editor);

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_handle = std::thread::spawn(move || run_threaded(state, event_rx, cmd_tx));

    let res = orchestrator::run_controller(settings, generator, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    mut state: UiState,
    mut event_rx: UnboundedReceiver<RunEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        // UiState is owned by this thread only; drain events without blocking.
        while let Ok(ev) = event_rx.try_recv() {
            state.apply_event(ev);
        }

        if last_tick.elapsed() >= tick_rate {
            state.tick = state.tick.wrapping_add(1);
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        if !event::poll(Duration::from_millis(10)).unwrap_or(false) {
            continue;
        }
        let action = match event::read() {
            Ok(Event::Key(k)) if k.kind == KeyEventKind::Press => handle_key(&mut state, k),
            Ok(Event::Paste(text)) => {
                handle_paste(&mut state, &text);
                Action::None
            }
            _ => Action::None,
        };
        match action {
            Action::None => {}
            Action::Command(cmd) => {
                let _ = cmd_tx.send(cmd);
            }
            Action::Quit => {
                let _ = cmd_tx.send(UiCommand::Quit);
                break Ok(());
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, DisableBracketedPaste, LeaveAlternateScreen).ok();
    res
}

#[derive(Debug)]
enum Action {
    None,
    Quit,
    Command(UiCommand),
}

fn is_quit(k: &KeyEvent) -> bool {
    k.modifiers.contains(KeyModifiers::CONTROL) && k.code == KeyCode::Char('c')
}

fn handle_paste(state: &mut UiState, text: &str) {
    if state.view == View::Plotting && state.editing_chart {
        state.editor.insert_str(text);
    } else if state.editing.is_some() {
        // Text fields are single-line.
        for c in text.chars().filter(|c| !c.is_control()) {
            state.edit_push(c);
        }
    }
}

fn handle_key(state: &mut UiState, k: KeyEvent) -> Action {
    if is_quit(&k) {
        return Action::Quit;
    }

    if state.editing_chart {
        match k.code {
            KeyCode::Esc => state.editing_chart = false,
            KeyCode::Char('u') if k.modifiers.contains(KeyModifiers::CONTROL) => {
                state.editor.set_text("");
            }
            KeyCode::Char(c) if !k.modifiers.contains(KeyModifiers::CONTROL) => {
                state.editor.insert_char(c);
            }
            KeyCode::Enter => {
                state.editor.insert_char('\n');
            }
            KeyCode::Tab => {
                state.editor.insert_str("  ");
            }
            KeyCode::Backspace => {
                state.editor.backspace();
            }
            _ => {}
        }
        return Action::None;
    }

    if state.editing.is_some() {
        match k.code {
            KeyCode::Esc | KeyCode::Enter => state.editing = None,
            KeyCode::Backspace => state.edit_pop(),
            KeyCode::Char(c) if !k.modifiers.contains(KeyModifiers::CONTROL) => state.edit_push(c),
            _ => {}
        }
        return Action::None;
    }

    match k.code {
        KeyCode::Char('q') => return Action::Quit,
        KeyCode::Tab => {
            state.view = state.view.next();
            return Action::None;
        }
        KeyCode::Char('?') => {
            state.view = View::Help;
            return Action::None;
        }
        KeyCode::Char('h') => {
            state.view = View::Home;
            return Action::None;
        }
        _ => {}
    }

    match state.view {
        View::Home => match k.code {
            KeyCode::Enter | KeyCode::Char('a') => state.view = View::Analysis,
            KeyCode::Char('p') => state.view = View::Plotting,
            _ => {}
        },
        View::Analysis => return handle_analysis_key(state, k),
        View::Plotting => match k.code {
            KeyCode::Char('1') => state.set_chart_kind(ChartKind::Scatter),
            KeyCode::Char('2') => state.set_chart_kind(ChartKind::Bar),
            KeyCode::Char('3') => state.set_chart_kind(ChartKind::Line),
            KeyCode::Char('0') => {
                state.editor.reset_to_sample();
                state.info = "Reset to sample data".into();
            }
            KeyCode::Char('e') | KeyCode::Enter => state.editing_chart = true,
            _ => {}
        },
        View::Help => {}
    }
    Action::None
}

fn handle_analysis_key(state: &mut UiState, k: KeyEvent) -> Action {
    match k.code {
        KeyCode::Char('w') => {
            let next = state.session.config.workflow.next();
            state.set_workflow(next);
        }
        KeyCode::Up | KeyCode::Char('k') => state.focus_prev(),
        KeyCode::Down | KeyCode::Char('j') => state.focus_next(),
        KeyCode::Enter | KeyCode::Char(' ') => state.activate_focused(),
        KeyCode::Left => state.cycle_focused(false),
        KeyCode::Right => state.cycle_focused(true),
        KeyCode::Char('r') => {
            return match state.session.begin_run() {
                Some((run, config)) => {
                    state.info = format!("Run {run} started: {}", config.workflow.label());
                    Action::Command(UiCommand::Start { run, config })
                }
                None => {
                    state.info = "Run already in progress".into();
                    Action::None
                }
            };
        }
        KeyCode::Char('x') => {
            if state.session.is_running() {
                return Action::Command(UiCommand::Cancel);
            }
            state.info = "No run in progress".into();
        }
        KeyCode::Char('s') => export::export_and_show_path(state, "JSON", export::export_run_json),
        KeyCode::Char('m') => {
            export::export_and_show_path(state, "Markdown", export::export_run_markdown)
        }
        KeyCode::Char('y') => export::copy_report(state),
        _ => {}
    }
    Action::None
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)].as_ref())
        .split(area);

    let tabs = Tabs::new(View::ALL.iter().map(|v| Line::from(v.title())).collect::<Vec<_>>())
        .select(state.view.index())
        .block(Block::default().borders(Borders::ALL).title("BioVisio"))
        .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match state.view {
        View::Home => draw_home(chunks[1], f),
        View::Analysis => draw_analysis(chunks[1], f, state),
        View::Plotting => charts::draw_plotting(chunks[1], f, state),
        View::Help => help::draw_help(chunks[1], f),
    }

    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(" ", Style::default()),
            Span::styled(state.info.clone(), Style::default().fg(Color::Gray)),
        ])),
        chunks[2],
    );
}

fn draw_home(area: Rect, f: &mut ratatui::Frame) {
    let accent = Style::default()
        .fg(Color::Indexed(63))
        .add_modifier(Modifier::BOLD);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Biological Insights,",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled("Visualized.", accent)),
        Line::from(""),
        Line::from("Accelerate your bioinformatics workflow with AI-powered sequence analysis"),
        Line::from("and publication-ready visualization tools."),
        Line::from(""),
        Line::from(vec![
            Span::styled("[a] ", Style::default().fg(Color::Magenta)),
            Span::styled("Analyze Sequences", accent),
            Span::raw("  Translation, motifs, structure prediction, and AI summaries."),
        ]),
        Line::from(vec![
            Span::styled("[p] ", Style::default().fg(Color::Magenta)),
            Span::styled("Create Plots", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::raw("       Volcano plots, heatmaps, and growth curves in seconds."),
        ]),
    ];
    f.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL)),
        area,
    );
}

fn draw_analysis(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage(28),
                Constraint::Percentage(32),
                Constraint::Percentage(40),
            ]
            .as_ref(),
        )
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(6), Constraint::Length(3)].as_ref())
        .split(cols[0]);

    let pipelines: Vec<Line> = Workflow::ALL
        .iter()
        .map(|w| {
            if *w == state.session.config.workflow {
                Line::from(Span::styled(
                    format!("› {}", w.label()),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(format!("  {}", w.label()))
            }
        })
        .collect();
    f.render_widget(
        Paragraph::new(pipelines).block(Block::default().borders(Borders::ALL).title("Pipelines [w]")),
        left[0],
    );

    f.render_widget(
        Paragraph::new(config_lines(state))
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Configuration")),
        left[1],
    );

    let (label, style) = if state.session.can_start() {
        (
            "[r] Run Analysis".to_string(),
            Style::default().fg(Color::White).bg(Color::Indexed(63)),
        )
    } else {
        (
            format!("{} Running...  [x] cancel", SPINNER[(state.tick as usize) % SPINNER.len()]),
            Style::default().fg(Color::DarkGray),
        )
    };
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(label, style)))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL)),
        left[2],
    );

    let console = report::console_lines(&state.session);
    let visible = cols[1].height.saturating_sub(2) as usize;
    let scroll = console.len().saturating_sub(visible);
    let console_title = if state.session.is_running() {
        format!("Pipeline Console {}", SPINNER[(state.tick as usize) % SPINNER.len()])
    } else {
        "Pipeline Console".to_string()
    };
    f.render_widget(
        Paragraph::new(console)
            .wrap(Wrap { trim: false })
            .scroll((u16::try_from(scroll).unwrap_or(u16::MAX), 0))
            .block(Block::default().borders(Borders::ALL).title(console_title)),
        cols[1],
    );

    let results_title = if state.session.result().is_some() && !state.session.is_running() {
        "Results Output ✓ Done"
    } else {
        "Results Output"
    };
    f.render_widget(
        Paragraph::new(report::result_lines(&state.session))
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title(results_title)),
        cols[2],
    );
}

/// Configuration panel lines for the selected workflow.
fn config_lines(state: &UiState) -> Vec<Line<'static>> {
    let mut out = Vec::new();
    let cfg = &state.session.config;
    for (i, field) in state.fields().into_iter().enumerate() {
        let focused = i == state.focus;
        let editing = state.editing == Some(field);
        let marker = if focused { "› " } else { "  " };
        let value_style = if editing {
            Style::default().fg(Color::Yellow)
        } else if focused {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let cursor = if editing { "▏" } else { "" };
        let (label, value) = match field {
            Field::InputPath => ("Input Directory", format!("{}{cursor}", state.field_text(field))),
            Field::Tool(t) => {
                let mark = if state.options.tools[t] { "[x]" } else { "[ ]" };
                ("", format!("{mark} {}", BULK_TOOLS[t]))
            }
            Field::Platform => ("Platform", format!("‹ {} ›", PLATFORMS[state.options.platform])),
            Field::Genome => ("Reference Genome", format!("‹ {} ›", GENOMES[state.options.genome])),
            Field::StatMethod => ("Statistical Method", format!("‹ {} ›", cfg.stat_method)),
            Field::PValue => ("P-value Cutoff", format!("{}{cursor}", state.field_text(field))),
            Field::Log2Fc => ("Log2FC Cutoff", format!("{}{cursor}", state.field_text(field))),
        };
        if field == Field::StatMethod {
            out.push(Line::from(Span::styled(
                "Expression Matrix: Upload or Select Server File",
                Style::default().fg(Color::DarkGray),
            )));
        }
        if field == Field::Tool(0) {
            out.push(Line::from(Span::styled(
                "Pipeline Tools",
                Style::default().fg(Color::Gray),
            )));
        }
        let mut spans = vec![Span::styled(marker, Style::default().fg(Color::Magenta))];
        if !label.is_empty() {
            spans.push(Span::styled(format!("{label}: "), Style::default().fg(Color::Gray)));
        }
        spans.push(Span::styled(value, value_style));
        out.push(Line::from(spans));
        if field == Field::InputPath {
            out.push(Line::from(Span::styled(
                "  Contains subfolders with *.fastq.gz",
                Style::default().fg(Color::DarkGray),
            )));
        }
    }
    if cfg.workflow == Workflow::DiffExpression {
        out.push(Line::from(vec![
            Span::styled("  Grouping Info: ", Style::default().fg(Color::Gray)),
            Span::raw(GROUPING_FILE),
        ]));
    }
    out
}
