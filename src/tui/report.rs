//! Results panel: file manifest plus the report rendered from Markdown.

use crate::model::{AnalysisResult, FileEntry, RunStatus};
use crate::session::{AnalysisSession, SimulatorState};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

pub const NO_RESULTS: &str = "No results generated yet.";
pub const PROCESSING: &str = "Processing biological data...";
pub const WAITING: &str = "Waiting for job submission...";
pub const PROCESS_COMPLETED: &str = "> Process Completed.";

/// Lines for the console panel.
pub fn console_lines(session: &AnalysisSession) -> Vec<Line<'static>> {
    if session.logs().is_empty() {
        return vec![Line::from(Span::styled(
            WAITING,
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        ))];
    }
    let mut out: Vec<Line<'static>> = session
        .logs()
        .iter()
        .map(|e| {
            Line::from(vec![
                Span::styled(format!("[{}]", e.timestamp), Style::default().fg(Color::DarkGray)),
                Span::raw(" "),
                Span::raw(e.message.clone()),
            ])
        })
        .collect();
    if !session.is_running() {
        out.push(Line::from(""));
        out.push(Line::from(Span::styled(
            PROCESS_COMPLETED,
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )));
    }
    out
}

/// Lines for the results panel, by simulator state.
pub fn result_lines(session: &AnalysisSession) -> Vec<Line<'static>> {
    match (session.state(), session.result()) {
        (SimulatorState::Running, _) => vec![Line::from(Span::styled(
            PROCESSING,
            Style::default().fg(Color::Gray),
        ))],
        (_, Some(result)) => rendered_result(result),
        (_, None) => vec![Line::from(Span::styled(
            NO_RESULTS,
            Style::default().fg(Color::DarkGray),
        ))],
    }
}

fn rendered_result(result: &AnalysisResult) -> Vec<Line<'static>> {
    let mut out = Vec::new();
    if let Some(files) = result.file_manifest.as_deref() {
        out.extend(manifest_lines(files));
        out.push(Line::from(""));
    }
    let title_color = match result.status {
        RunStatus::Success => Color::Cyan,
        RunStatus::Error => Color::Red,
    };
    out.push(Line::from(Span::styled(
        format!("Analysis Report  ({})", result.completion_timestamp),
        Style::default()
            .fg(title_color)
            .add_modifier(Modifier::BOLD),
    )));
    out.push(Line::from(""));
    out.extend(markdown_lines(&result.report_text));
    out
}

pub fn manifest_lines(files: &[FileEntry]) -> Vec<Line<'static>> {
    files
        .iter()
        .map(|f| {
            let icon = if f.is_tabular() { "▦" } else { "▤" };
            Line::from(vec![
                Span::styled(format!("{icon} "), Style::default().fg(Color::Blue)),
                Span::styled(f.name.clone(), Style::default().fg(Color::White)),
                Span::styled(
                    format!("  {} • {}", f.kind, f.size),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        })
        .collect()
}

/// Minimal Markdown: ATX headings, bullet and numbered lists, `**bold**` and `` `code` ``.
pub fn markdown_lines(text: &str) -> Vec<Line<'static>> {
    let mut out = Vec::new();
    let mut in_code = false;
    for raw in text.lines() {
        let line = raw.trim_end();
        if line.trim_start().starts_with("```") {
            in_code = !in_code;
            continue;
        }
        if in_code {
            out.push(Line::from(Span::styled(
                format!("  {line}"),
                Style::default().fg(Color::Yellow),
            )));
            continue;
        }
        let trimmed = line.trim_start();
        let level = trimmed.chars().take_while(|c| *c == '#').count();
        if (1..=6).contains(&level) && trimmed[level..].starts_with(' ') {
            let color = if level <= 2 { Color::Magenta } else { Color::Cyan };
            out.push(Line::from(Span::styled(
                trimmed[level..].trim().to_string(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )));
            continue;
        }
        if let Some(item) = trimmed
            .strip_prefix("- ")
            .or_else(|| trimmed.strip_prefix("* "))
        {
            let indent = " ".repeat(line.len() - trimmed.len());
            let mut spans = vec![Span::raw(format!("{indent}  • "))];
            spans.extend(inline_spans(item));
            out.push(Line::from(spans));
            continue;
        }
        out.push(Line::from(inline_spans(line)));
    }
    out
}

fn inline_spans(text: &str) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let bold = rest.find("**");
        let code = rest.find('`');
        let (start, marker) = match (bold, code) {
            (Some(b), Some(c)) if c < b => (c, "`"),
            (Some(b), _) => (b, "**"),
            (None, Some(c)) => (c, "`"),
            (None, None) => break,
        };
        let after = &rest[start + marker.len()..];
        let Some(end) = after.find(marker) else {
            break;
        };
        if start > 0 {
            spans.push(Span::raw(rest[..start].to_string()));
        }
        let style = if marker == "**" {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Yellow)
        };
        spans.push(Span::styled(after[..end].to_string(), style));
        rest = &after[end + marker.len()..];
    }
    if !rest.is_empty() {
        spans.push(Span::raw(rest.to_string()));
    }
    spans
}
