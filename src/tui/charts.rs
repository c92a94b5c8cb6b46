use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Row, Table},
    Frame,
};

use crate::model::{LineSeries, ResultRow, SeriesStats};
use crate::text_summary::format_value;

/// Helper function to render the stats line (min, max, mean, final)
fn render_stats_text<'a>(stats: SeriesStats, color: Color) -> Line<'a> {
    let mut spans = Vec::new();
    for (label, value) in [
        ("min", stats.min),
        ("max", stats.max),
        ("mean", stats.mean),
        ("final", stats.last),
    ] {
        if !spans.is_empty() {
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled(label, Style::default().fg(Color::Gray)));
        spans.push(Span::styled(
            format!(" {:.3}", value),
            Style::default().fg(color),
        ));
    }
    Line::from(spans)
}

/// Axis bounds over finite values, widened when the data is flat.
pub fn bounds(values: impl Iterator<Item = f64>, pad_fraction: f64) -> [f64; 2] {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return [0.0, 1.0];
    }
    let span = hi - lo;
    if span <= f64::EPSILON * hi.abs().max(1.0) {
        let pad = lo.abs().max(1.0) * 0.5;
        return [lo - pad, hi + pad];
    }
    let pad = span * pad_fraction;
    [lo - pad, hi + pad]
}

/// Render one series as a line chart with its stats inside the same bordered box.
pub fn render_series_chart(f: &mut Frame, area: Rect, series: &LineSeries, color: Color) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(series.title.clone(), Style::default().fg(color)));

    // NaN cells stay in the table but cannot be drawn.
    let points: Vec<(f64, f64)> = series
        .points
        .iter()
        .copied()
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();

    if points.is_empty() {
        let empty = Paragraph::new("No data available").block(block);
        f.render_widget(empty, area);
        return;
    }

    // Get inner area (accounting for borders)
    let inner = if area.width > 2 && area.height > 2 {
        Rect {
            x: area.x + 1,
            y: area.y + 1,
            width: area.width.saturating_sub(2),
            height: area.height.saturating_sub(2),
        }
    } else {
        area
    };

    // Split inner area into chart (top) and stats (bottom)
    let chart_stats = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(4), Constraint::Length(1)].as_ref())
        .split(inner);

    let x = bounds(points.iter().map(|(x, _)| *x), 0.0);
    let y = bounds(points.iter().map(|(_, y)| *y), 0.1);

    let ds = Dataset::default()
        .graph_type(GraphType::Line)
        .marker(symbols::Marker::Braille)
        .style(Style::default().fg(color))
        .data(&points);

    let axis_style = Style::default().fg(Color::Gray);
    let chart = Chart::new(vec![ds])
        .x_axis(
            Axis::default()
                .title(series.x_label.clone())
                .style(axis_style)
                .bounds(x)
                .labels(vec![format_value(x[0]), format_value(x[1])]),
        )
        .y_axis(
            Axis::default()
                .title(series.y_label.clone())
                .style(axis_style)
                .bounds(y)
                .labels(vec![
                    format!("{:.2}", y[0]),
                    format!("{:.2}", (y[0] + y[1]) / 2.0),
                    format!("{:.2}", y[1]),
                ]),
        );
    f.render_widget(chart, chart_stats[0]);

    if let Some(stats) = series.stats {
        f.render_widget(
            Paragraph::new(render_stats_text(stats, color)).alignment(Alignment::Center),
            chart_stats[1],
        );
    }

    f.render_widget(block, area);
}

/// First rows of the canonical table.
pub fn render_preview_table(f: &mut Frame, area: Rect, preview: &[ResultRow], row_count: usize) {
    let block = Block::default().borders(Borders::ALL).title(format!(
        "Raw data (first {} of {} rows)",
        preview.len(),
        row_count
    ));

    if preview.is_empty() {
        f.render_widget(Paragraph::new("No rows").block(block), area);
        return;
    }

    let header = Row::new(vec!["Time", "InputVoltage", "OutputVoltage"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    let rows: Vec<Row> = preview
        .iter()
        .map(|r| {
            Row::new(vec![
                format_value(r.time),
                format_value(r.input_voltage),
                format_value(r.output_voltage),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(33),
            Constraint::Percentage(33),
            Constraint::Percentage(34),
        ],
    )
    .header(header)
    .block(block);
    f.render_widget(table, area);
}
