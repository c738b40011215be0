use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, Paragraph, Wrap,
    },
    Frame,
};

use super::state::UiState;
use crate::chart::{
    BarPoint, ChartData, ChartKind, LinePoint, ParseStatus, ScatterPoint, FOLD_CHANGE_GUIDE,
    SIGNIFICANCE_GUIDE,
};

pub const SIGNIFICANT_COLOR: Color = Color::Red;
pub const DEFAULT_POINT_COLOR: Color = Color::Gray;
pub const CONTROL_COLOR: Color = Color::Gray;
pub const TREATED_COLOR: Color = Color::Indexed(63);
pub const LINE_COLOR: Color = Color::Green;

pub const NO_POINTS: &str = "No plottable points in the current data.";

pub fn point_color(significant: bool) -> Color {
    if significant {
        SIGNIFICANT_COLOR
    } else {
        DEFAULT_POINT_COLOR
    }
}

pub fn bar_color(control: bool) -> Color {
    if control {
        CONTROL_COLOR
    } else {
        TREATED_COLOR
    }
}

/// Axis bounds covering every point and both guides, with a little padding.
pub fn scatter_bounds(points: &[ScatterPoint]) -> ([f64; 2], [f64; 2]) {
    let mut x = [FOLD_CHANGE_GUIDE, FOLD_CHANGE_GUIDE];
    let mut y = [0.0, SIGNIFICANCE_GUIDE];
    for p in points.iter().filter(|p| p.x.is_finite() && p.y.is_finite()) {
        x = [x[0].min(p.x), x[1].max(p.x)];
        y = [y[0].min(p.y), y[1].max(p.y)];
    }
    let pad = |[lo, hi]: [f64; 2]| {
        let span = (hi - lo).max(1.0);
        [lo - span * 0.05, hi + span * 0.05]
    };
    (pad(x), pad(y))
}

/// Split scatter points into (significant, other) coordinate lists.
pub fn split_by_significance(points: &[ScatterPoint]) -> (Vec<(f64, f64)>, Vec<(f64, f64)>) {
    let mut sig = Vec::new();
    let mut other = Vec::new();
    for p in points {
        if p.significant {
            sig.push((p.x, p.y));
        } else {
            other.push((p.x, p.y));
        }
    }
    (sig, other)
}

fn axis_labels(bounds: [f64; 2]) -> Vec<Span<'static>> {
    let mid = (bounds[0] + bounds[1]) / 2.0;
    vec![
        Span::raw(format!("{:.1}", bounds[0])),
        Span::raw(format!("{:.1}", mid)),
        Span::raw(format!("{:.1}", bounds[1])),
    ]
}

pub fn draw_plotting(area: Rect, f: &mut Frame, state: &UiState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)].as_ref())
        .split(area);

    draw_editor(cols[0], f, state);

    let kind = state.editor.kind();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Visualization Output - {} ({})", kind.label(), kind.subtitle()));
    let data = state.editor.data();
    if data.is_empty() {
        f.render_widget(
            Paragraph::new(NO_POINTS)
                .style(Style::default().fg(Color::DarkGray))
                .block(block),
            cols[1],
        );
        return;
    }
    match data {
        ChartData::Scatter(points) => draw_scatter(cols[1], f, &points, block),
        ChartData::Bar(points) => draw_bars(cols[1], f, &points, block),
        ChartData::Line(points) => draw_line_series(cols[1], f, &points, block),
    }
}

fn draw_editor(area: Rect, f: &mut Frame, state: &UiState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(3), Constraint::Length(3)].as_ref())
        .split(area);

    let kind_lines: Vec<Line> = ChartKind::ALL
        .iter()
        .enumerate()
        .map(|(i, k)| {
            let selected = *k == state.editor.kind();
            let marker = if selected { "●" } else { "○" };
            let style = if selected {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(format!("{} ", i + 1), Style::default().fg(Color::Magenta)),
                Span::styled(format!("{marker} {}", k.label()), style),
            ])
        })
        .collect();
    f.render_widget(
        Paragraph::new(kind_lines).block(Block::default().borders(Borders::ALL).title("Chart Type")),
        rows[0],
    );

    let title = if state.editing_chart {
        "Data Source (JSON) [editing, Esc to stop]"
    } else {
        "Data Source (JSON) [e to edit]"
    };
    let border = if state.editing_chart {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    // Keep the cursor end of the text in view while typing.
    let text = state.editor.text();
    let visible = rows[1].height.saturating_sub(2) as usize;
    let total = text.lines().count() + usize::from(text.ends_with('\n'));
    let scroll = if state.editing_chart {
        total.saturating_sub(visible)
    } else {
        0
    };
    f.render_widget(
        Paragraph::new(text.to_string())
            .style(Style::default().fg(Color::Gray))
            .scroll((u16::try_from(scroll).unwrap_or(u16::MAX), 0))
            .block(Block::default().borders(Borders::ALL).border_style(border).title(title)),
        rows[1],
    );

    let status_color = if state.editor.status().is_valid() {
        Color::Green
    } else {
        Color::Red
    };
    f.render_widget(
        Paragraph::new(parse_status_line(state.editor.status(), state.editor.points().len()))
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(status_color))
                    .title("Status"),
            ),
        rows[2],
    );
}

pub fn parse_status_line(status: &ParseStatus, points: usize) -> Line<'static> {
    match status {
        ParseStatus::Valid => Line::from(Span::styled(
            format!("✓ Valid JSON, {points} points"),
            Style::default().fg(Color::Green),
        )),
        ParseStatus::Invalid(e) => Line::from(vec![
            Span::styled("✗ ", Style::default().fg(Color::Red)),
            Span::raw(format!("{e} (showing last valid data)")),
        ]),
    }
}

fn draw_scatter(area: Rect, f: &mut Frame, points: &[ScatterPoint], block: Block) {
    let (x_bounds, y_bounds) = scatter_bounds(points);
    let (sig, other) = split_by_significance(points);
    let v_guide = [(FOLD_CHANGE_GUIDE, y_bounds[0]), (FOLD_CHANGE_GUIDE, y_bounds[1])];
    let h_guide = [(x_bounds[0], SIGNIFICANCE_GUIDE), (x_bounds[1], SIGNIFICANCE_GUIDE)];

    let datasets = vec![
        Dataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::DarkGray))
            .data(&v_guide),
        Dataset::default()
            .name("p=0.05")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(SIGNIFICANT_COLOR))
            .data(&h_guide),
        Dataset::default()
            .name("Not Significant")
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(point_color(false)))
            .data(&other),
        Dataset::default()
            .name("Significant")
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(point_color(true)))
            .data(&sig),
    ];

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .title("Log2 Fold Change")
                .style(Style::default().fg(Color::Gray))
                .bounds(x_bounds)
                .labels(axis_labels(x_bounds)),
        )
        .y_axis(
            Axis::default()
                .title("-Log10 P-value")
                .style(Style::default().fg(Color::Gray))
                .bounds(y_bounds)
                .labels(axis_labels(y_bounds)),
        );
    f.render_widget(chart, area);
}

/// Tallest bar height handed to the widget; real values are scaled into this range.
const BAR_SCALE: f64 = 10_000.0;

/// Widget heights for each bar, proportional to the largest positive finite value.
/// Negative and non-finite values draw as empty bars.
pub fn bar_heights(points: &[BarPoint]) -> Vec<u64> {
    let max = points
        .iter()
        .map(|p| p.value)
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);
    points
        .iter()
        .map(|p| {
            if max > 0.0 && p.value.is_finite() && p.value > 0.0 {
                ((p.value / max) * BAR_SCALE).round() as u64
            } else {
                0
            }
        })
        .collect()
}

/// Label printed on a bar: whole numbers as is, large or tiny magnitudes in
/// scientific notation.
pub fn bar_value_text(v: f64) -> String {
    let abs = v.abs();
    if !v.is_finite() || abs >= 1e6 || (abs > 0.0 && abs < 1e-2) {
        format!("{v:.1e}")
    } else if v.fract() == 0.0 {
        format!("{v}")
    } else {
        format!("{v:.2}")
    }
}

fn draw_bars(area: Rect, f: &mut Frame, points: &[BarPoint], block: Block) {
    let bars: Vec<Bar> = points
        .iter()
        .zip(bar_heights(points))
        .map(|(p, height)| {
            Bar::default()
                .value(height)
                .text_value(bar_value_text(p.value))
                .label(Line::from(p.name.clone()))
                .style(Style::default().fg(bar_color(p.control)))
                .value_style(Style::default().fg(Color::Black).bg(bar_color(p.control)))
        })
        .collect();

    let inner_width = area.width.saturating_sub(2).max(1);
    let n = u16::try_from(points.len().max(1)).unwrap_or(u16::MAX);
    let bar_width = (inner_width / n).saturating_sub(1).clamp(1, 12);

    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width)
        .bar_gap(1);
    f.render_widget(chart, area);
}

fn draw_line_series(area: Rect, f: &mut Frame, points: &[LinePoint], block: Block) {
    // Names are ordinal labels; the x axis is the point index.
    let data: Vec<(f64, f64)> = points
        .iter()
        .enumerate()
        .map(|(i, p)| (i as f64, p.value))
        .collect();
    let x_max = (points.len().saturating_sub(1)).max(1) as f64;
    let y_max = points
        .iter()
        .map(|p| p.value)
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);
    let y_min = points
        .iter()
        .map(|p| p.value)
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::min);
    let y_bounds = [y_min, if y_max > y_min { y_max * 1.1 } else { y_min + 1.0 }];

    let x_labels: Vec<Span> = match (points.first(), points.last()) {
        (Some(first), Some(last)) if points.len() > 2 => vec![
            Span::raw(first.name.clone()),
            Span::raw(points[points.len() / 2].name.clone()),
            Span::raw(last.name.clone()),
        ],
        (Some(first), Some(last)) => vec![Span::raw(first.name.clone()), Span::raw(last.name.clone())],
        _ => Vec::new(),
    };

    let datasets = vec![Dataset::default()
        .name("value")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(LINE_COLOR))
        .data(&data)];
    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, x_max])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds(y_bounds)
                .labels(axis_labels(y_bounds)),
        );
    f.render_widget(chart, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{samples, ChartParseError};
    use ratatui::{backend::TestBackend, Terminal};

    fn scatter(points: &[(f64, f64, Option<&str>)]) -> Vec<ScatterPoint> {
        points
            .iter()
            .enumerate()
            .map(|(i, (x, y, cat))| ScatterPoint {
                name: format!("g{i}"),
                x: *x,
                y: *y,
                significant: *cat == Some("Significant"),
            })
            .collect()
    }

    #[test]
    fn significant_points_use_the_significant_color() {
        let pts = scatter(&[
            (3.0, 4.0, Some("Significant")),
            (0.5, 0.2, Some("Not Significant")),
            (1.0, 1.0, None),
        ]);
        let colors: Vec<Color> = pts.iter().map(|p| point_color(p.significant)).collect();
        assert_eq!(colors, vec![SIGNIFICANT_COLOR, DEFAULT_POINT_COLOR, DEFAULT_POINT_COLOR]);
        let (sig, other) = split_by_significance(&pts);
        assert_eq!(sig, vec![(3.0, 4.0)]);
        assert_eq!(other.len(), 2);
    }

    #[test]
    fn control_bars_are_distinguished() {
        assert_eq!(bar_color(true), CONTROL_COLOR);
        assert_ne!(bar_color(false), CONTROL_COLOR);
    }

    #[test]
    fn scatter_bounds_always_include_guides() {
        let pts = scatter(&[(1.0, 0.2, None), (2.0, 0.5, None)]);
        let (x, y) = scatter_bounds(&pts);
        assert!(x[0] < FOLD_CHANGE_GUIDE && x[1] > 2.0);
        assert!(y[1] > SIGNIFICANCE_GUIDE);

        let (x, y) = scatter_bounds(&[]);
        assert!(x[0] < 0.0 && x[1] > 0.0);
        assert!(y[0] < 0.0 && y[1] > SIGNIFICANCE_GUIDE);
    }

    #[test]
    fn status_line_reports_parse_errors() {
        let ok = parse_status_line(&ParseStatus::Valid, 6);
        assert_eq!(ok.spans[0].content, "✓ Valid JSON, 6 points");
        let bad = parse_status_line(&ParseStatus::Invalid(ChartParseError::NotAnArray), 6);
        assert!(bad.spans[1].content.contains("must be a JSON array"));
    }

    #[test]
    fn every_chart_kind_renders() {
        for kind in ChartKind::ALL {
            let mut state = UiState::default();
            state.set_chart_kind(kind);
            let backend = TestBackend::new(120, 40);
            let mut terminal = Terminal::new(backend).unwrap();
            terminal
                .draw(|f| draw_plotting(f.area(), f, &state))
                .unwrap();
            let buffer = terminal.backend().buffer().clone();
            let rendered: String = buffer.content().iter().map(|c| c.symbol()).collect();
            assert!(rendered.contains(kind.label()), "{kind:?}");
        }
        assert_eq!(samples::expression().len(), 6);
    }

    fn render_edited(kind: ChartKind, text: &str) -> String {
        let mut state = UiState::default();
        state.set_chart_kind(kind);
        assert_eq!(state.editor.set_text(text), &ParseStatus::Valid, "{text}");
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal
            .draw(|f| draw_plotting(f.area(), f, &state))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    fn bars(values: &[f64]) -> Vec<BarPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| BarPoint {
                name: format!("b{i}"),
                value: *v,
                control: false,
            })
            .collect()
    }

    #[test]
    fn bar_heights_scale_to_the_largest_value() {
        assert_eq!(
            bar_heights(&bars(&[1e19, 5e18, -3.0, 0.0])),
            vec![10_000, 5_000, 0, 0]
        );
        assert_eq!(bar_heights(&bars(&[-1.0, -2.0])), vec![0, 0]);
        assert!(bar_heights(&[]).is_empty());
    }

    #[test]
    fn bar_labels_show_the_real_value() {
        assert_eq!(bar_value_text(120.0), "120");
        assert_eq!(bar_value_text(-40.0), "-40");
        assert_eq!(bar_value_text(0.8), "0.80");
        assert_eq!(bar_value_text(1e19), "1.0e19");
        assert_eq!(bar_value_text(0.001), "1.0e-3");
    }

    #[test]
    fn huge_bar_values_render() {
        let rendered = render_edited(
            ChartKind::Bar,
            r#"[{"name":"a","value":1e19},{"name":"b","value":1}]"#,
        );
        assert!(rendered.contains("1.0e19"));
    }

    #[test]
    fn negative_bar_values_render_as_empty_bars() {
        let rendered = render_edited(
            ChartKind::Bar,
            r#"[{"name":"down","value":-40},{"name":"up","value":10}]"#,
        );
        assert!(rendered.contains(ChartKind::Bar.label()));
        render_edited(ChartKind::Bar, r#"[{"name":"down","value":-1}]"#);
    }

    #[test]
    fn single_line_point_renders() {
        let rendered = render_edited(ChartKind::Line, r#"[{"name":"0h","value":2.5}]"#);
        // y axis runs from 0 to 2.5 * 1.1
        assert!(rendered.contains("2.8"));
    }

    #[test]
    fn huge_scatter_and_line_values_render() {
        render_edited(ChartKind::Scatter, r#"[{"name":"g","x":1e308,"y":1e308}]"#);
        render_edited(ChartKind::Line, r#"[{"name":"t","value":1e308}]"#);
    }

    #[test]
    fn empty_array_shows_placeholder_for_every_kind() {
        for kind in ChartKind::ALL {
            let rendered = render_edited(kind, "[]");
            assert!(rendered.contains(NO_POINTS), "{kind:?}");
            assert!(rendered.contains("Valid JSON, 0 points"), "{kind:?}");
        }
    }
}
