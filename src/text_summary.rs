//! Text summary builder for CLI output.
//!
//! Formats the same redraw instructions the TUI consumes as plain lines.

use crate::model::{LineSeries, RunViews};

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Compact numeric cell: fixed-point for ordinary magnitudes, scientific otherwise.
pub(crate) fn format_value(v: f64) -> String {
    if !v.is_finite() {
        return v.to_string();
    }
    let a = v.abs();
    if a == 0.0 || (1e-3..1e6).contains(&a) {
        format!("{v:.6}")
    } else {
        format!("{v:.4e}")
    }
}

fn series_line(series: &LineSeries) -> String {
    match series.stats {
        Some(s) => format!(
            "{}: min {} max {} mean {} final {}",
            series.title,
            format_value(s.min),
            format_value(s.max),
            format_value(s.mean),
            format_value(s.last)
        ),
        None => format!("{}: no data", series.title),
    }
}

pub(crate) fn build_text_summary(views: &RunViews) -> TextSummary {
    let mut lines = vec![
        views.status.clone(),
        format!("Rows: {}", views.row_count),
        series_line(&views.output_series),
        series_line(&views.input_series),
    ];

    if !views.preview.is_empty() {
        lines.push(format!(
            "First {} of {} rows:",
            views.preview.len(),
            views.row_count
        ));
        lines.push(format!("{:>14} {:>14} {:>14}", "Time", "InputVoltage", "OutputVoltage"));
        for row in &views.preview {
            lines.push(format!(
                "{:>14} {:>14} {:>14}",
                format_value(row.time),
                format_value(row.input_voltage),
                format_value(row.output_voltage)
            ));
        }
    }

    TextSummary { lines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ResultRow, SeriesStats};

    fn views(preview: Vec<ResultRow>) -> RunViews {
        RunViews {
            output_series: LineSeries {
                title: "Circuit response v_s(t)".into(),
                points: vec![(0.0, 1.0), (0.1, 3.0)],
                stats: Some(SeriesStats {
                    min: 1.0,
                    max: 3.0,
                    mean: 2.0,
                    last: 3.0,
                }),
                ..Default::default()
            },
            input_series: LineSeries {
                title: "Excitation source v_e(t)".into(),
                ..Default::default()
            },
            row_count: preview.len(),
            preview,
            status: "Last simulation: x".into(),
            effective_h: 1e-4,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn values_switch_to_scientific_for_tiny_magnitudes() {
        assert_eq!(format_value(0.0), "0.000000");
        assert_eq!(format_value(2.5), "2.500000");
        assert_eq!(format_value(1e-6), "1.0000e-6");
        assert_eq!(format_value(f64::NAN), "NaN");
    }

    #[test]
    fn summary_lists_stats_and_preview() {
        let rows = vec![
            ResultRow {
                time: 0.0,
                input_voltage: 0.0,
                output_voltage: 1.0,
            },
            ResultRow {
                time: 0.1,
                input_voltage: 1.0,
                output_voltage: 3.0,
            },
        ];
        let s = build_text_summary(&views(rows));
        assert_eq!(s.lines[0], "Last simulation: x");
        assert_eq!(s.lines[1], "Rows: 2");
        assert!(s.lines[2].contains("final 3.000000"));
        assert_eq!(s.lines[3], "Excitation source v_e(t): no data");
        assert_eq!(s.lines[4], "First 2 of 2 rows:");
        assert_eq!(s.lines.len(), 8);
    }

    #[test]
    fn empty_run_has_no_preview_block() {
        let s = build_text_summary(&views(Vec::new()));
        assert_eq!(s.lines.len(), 4);
    }
}
