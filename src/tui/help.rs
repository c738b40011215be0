use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

const GLOBAL_KEYS: [(&str, &str); 4] = [
    ("q / Ctrl-C", "Quit"),
    ("tab", "Switch screens"),
    ("?", "Show this help"),
    ("h", "Home"),
];

const ANALYSIS_KEYS: [(&str, &str); 9] = [
    ("w", "Cycle workflow"),
    ("↑/↓", "Move between fields"),
    ("enter", "Edit text field / toggle checkbox"),
    ("←/→", "Change selection"),
    ("r", "Run analysis"),
    ("x", "Cancel the running analysis"),
    ("s", "Save run record as JSON"),
    ("m", "Save report as Markdown"),
    ("y", "Copy report to clipboard"),
];

const PLOTTING_KEYS: [(&str, &str); 5] = [
    ("1 / 2 / 3", "Volcano / Bar / Line (loads the sample)"),
    ("e", "Edit JSON (typing and paste re-render live)"),
    ("esc", "Stop editing"),
    ("ctrl-u", "Clear the JSON text (while editing)"),
    ("0", "Reset to the sample data"),
];

fn key_lines(keys: &[(&str, &str)]) -> Vec<Line<'static>> {
    keys.iter()
        .map(|(key, what)| {
            Line::from(vec![
                Span::raw("  "),
                Span::styled(format!("{key:<12}"), Style::default().fg(Color::Magenta)),
                Span::raw(what.to_string()),
            ])
        })
        .collect()
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let mut lines = vec![Line::from("Keybinds:")];
    lines.extend(key_lines(&GLOBAL_KEYS));
    lines.push(Line::from(""));
    lines.push(Line::from("Sequence Analysis:"));
    lines.extend(key_lines(&ANALYSIS_KEYS));
    lines.push(Line::from(""));
    lines.push(Line::from("Visualization:"));
    lines.extend(key_lines(&PLOTTING_KEYS));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::raw("Reports need "),
        Span::styled("GEMINI_API_KEY", Style::default().fg(Color::Cyan)),
        Span::raw(" (or "),
        Span::styled("API_KEY", Style::default().fg(Color::Cyan)),
        Span::raw(") in the environment."),
    ]));

    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
