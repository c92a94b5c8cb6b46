//! Post-run processing utilities.
//!
//! Turns a completed run into redraw instructions: two line series, a row
//! preview, a status string and the effective step size. Everything here is
//! a pure function of its inputs.

use crate::engine::{ingest, EngineRun};
use crate::metrics;
use crate::model::{LineSeries, RunReport, RunViews, SimulationRequest, SimulationResult};
use crate::validate::Validated;
use std::path::Path;
use time::{OffsetDateTime, UtcOffset};

/// Immutable presentation settings shared by every redraw.
#[derive(Debug, Clone)]
pub(crate) struct ViewConfig {
    pub output_title: &'static str,
    pub input_title: &'static str,
    pub time_label: &'static str,
    pub output_label: &'static str,
    pub input_label: &'static str,
    pub preview_rows: usize,
    /// Local offset for status timestamps, captured once at startup.
    pub utc_offset: UtcOffset,
}

impl ViewConfig {
    pub fn new(utc_offset: UtcOffset) -> Self {
        Self {
            output_title: "Circuit response v_s(t)",
            input_title: "Excitation source v_e(t)",
            time_label: "Time (s)",
            output_label: "v_s(t) (V)",
            input_label: "v_e(t) (V)",
            preview_rows: 10,
            utc_offset,
        }
    }

    pub fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.utc_offset)
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self::new(UtcOffset::UTC)
    }
}

/// Validation output plus what the engine produced for it.
#[derive(Debug, Clone)]
pub(crate) struct CompletedRun {
    pub validated: Validated,
    pub run: EngineRun,
}

pub(crate) fn format_timestamp(now: OffsetDateTime) -> String {
    let fmt = time::macros::format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    now.format(&fmt).unwrap_or_else(|_| "now".into())
}

pub(crate) fn format_status(
    request: &SimulationRequest,
    warnings: &[String],
    now: OffsetDateTime,
) -> String {
    let mut status = format!(
        "Last simulation: {} | method={}, h={}, tmax={}, source={}",
        format_timestamp(now),
        request.method.label(),
        request.h,
        request.t_max,
        request.source_type.label(),
    );
    if !warnings.is_empty() {
        status.push_str(" | Warnings: ");
        status.push_str(&warnings.join("; "));
    }
    status
}

fn series(
    title: &str,
    x_label: &str,
    y_label: &str,
    time: &[f64],
    values: &[f64],
) -> LineSeries {
    let points: Vec<(f64, f64)> = time.iter().copied().zip(values.iter().copied()).collect();
    let stats = metrics::compute_series_stats(&points);
    LineSeries {
        title: title.to_string(),
        x_label: x_label.to_string(),
        y_label: y_label.to_string(),
        points,
        stats,
    }
}

fn views_for_result(
    cfg: &ViewConfig,
    result: &SimulationResult,
    status: String,
    effective_h: f64,
    warnings: Vec<String>,
) -> RunViews {
    RunViews {
        output_series: series(
            cfg.output_title,
            cfg.time_label,
            cfg.output_label,
            &result.time,
            &result.output_voltage,
        ),
        input_series: series(
            cfg.input_title,
            cfg.time_label,
            cfg.input_label,
            &result.time,
            &result.input_voltage,
        ),
        preview: result.head(cfg.preview_rows),
        row_count: result.len(),
        status,
        effective_h,
        warnings,
    }
}

/// Map a completed run to its redraw instructions.
pub(crate) fn build_views(cfg: &ViewConfig, completed: &CompletedRun, now: OffsetDateTime) -> RunViews {
    let request = &completed.validated.request;
    let warnings = completed.run.outcome.warnings.clone();
    let status = format_status(request, &warnings, now);
    views_for_result(cfg, &completed.run.result, status, request.h, warnings)
}

/// Views shown before any run: the artifact left by a previous session, if any.
pub(crate) fn initial_views(cfg: &ViewConfig, artifact: &Path) -> RunViews {
    let default_h = SimulationRequest::default().h;
    match ingest::load_existing(artifact) {
        Some(result) => views_for_result(
            cfg,
            &result,
            format!("Loaded existing results: {}", artifact.display()),
            default_h,
            Vec::new(),
        ),
        None => views_for_result(
            cfg,
            &SimulationResult::empty(),
            "No simulation run yet".to_string(),
            default_h,
            Vec::new(),
        ),
    }
}

pub(crate) fn build_report(completed: &CompletedRun, views: &RunViews) -> RunReport {
    RunReport {
        request: completed.validated.request.clone(),
        defaulted_fields: completed
            .validated
            .defaulted
            .iter()
            .map(|s| s.to_string())
            .collect(),
        tokens: completed
            .run
            .sequence
            .values()
            .into_iter()
            .map(str::to_string)
            .collect(),
        status: views.status.clone(),
        effective_h: views.effective_h,
        exit_code: completed.run.outcome.exit_code(),
        warnings: views.warnings.clone(),
        result: completed.run.result.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InvocationOutcome, ResultRow, SourceType};
    use crate::protocol;
    use time::macros::datetime;

    fn completed(result: SimulationResult, warnings: Vec<String>) -> CompletedRun {
        let request = SimulationRequest {
            h: 2e-4,
            source_type: SourceType::Square,
            ..Default::default()
        };
        let mut outcome = InvocationOutcome::not_launched(String::new());
        outcome.warnings = warnings;
        CompletedRun {
            run: EngineRun {
                sequence: protocol::encode(&request),
                outcome,
                result,
            },
            validated: Validated {
                request,
                defaulted: Vec::new(),
            },
        }
    }

    fn table(rows: usize) -> SimulationResult {
        let mut r = SimulationResult::empty();
        for i in 0..rows {
            let t = i as f64 * 1e-4;
            r.push_row(ResultRow {
                time: t,
                input_voltage: 5.0,
                output_voltage: i as f64,
            });
        }
        r
    }

    #[test]
    fn status_embeds_timestamp_and_parameters() {
        let now = datetime!(2024-03-05 14:07:09 UTC);
        let s = format_status(&SimulationRequest::default(), &[], now);
        assert_eq!(
            s,
            "Last simulation: 2024-03-05 14:07:09 | method=RK4, h=0.0001, tmax=0.05, source=Sinusoidal"
        );
    }

    #[test]
    fn status_lists_warnings() {
        let now = datetime!(2024-03-05 14:07:09 UTC);
        let s = format_status(
            &SimulationRequest::default(),
            &["a".to_string(), "b".to_string()],
            now,
        );
        assert!(s.ends_with(" | Warnings: a; b"));
    }

    #[test]
    fn views_preview_first_ten_rows() {
        let cfg = ViewConfig::default();
        let views = build_views(&cfg, &completed(table(25), Vec::new()), cfg.now());
        assert_eq!(views.preview.len(), 10);
        assert_eq!(views.row_count, 25);
        assert_eq!(views.output_series.points.len(), 25);
        assert_eq!(views.input_series.points[3], (3e-4, 5.0));
        assert_eq!(views.output_series.stats.map(|s| s.last), Some(24.0));
        assert_eq!(views.effective_h, 2e-4);
        assert!(views.status.contains("source=Square"));
    }

    #[test]
    fn empty_result_still_yields_valid_views() {
        let cfg = ViewConfig::default();
        let warnings = vec!["Binary not found: ./be-sim".to_string()];
        let views = build_views(&cfg, &completed(SimulationResult::empty(), warnings), cfg.now());
        assert!(views.preview.is_empty());
        assert!(views.output_series.points.is_empty());
        assert!(views.input_series.stats.is_none());
        assert_eq!(views.output_series.title, "Circuit response v_s(t)");
        assert!(views.status.contains("Warnings: Binary not found"));
    }

    #[test]
    fn initial_views_without_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let views = initial_views(&ViewConfig::default(), &dir.path().join("none.csv"));
        assert_eq!(views.status, "No simulation run yet");
        assert_eq!(views.row_count, 0);
    }

    #[test]
    fn initial_views_show_previous_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("circuit_output.csv");
        std::fs::write(&path, "temps,Vin,Vout\n0,1,0\n0.1,1,0.5\n").unwrap();
        let views = initial_views(&ViewConfig::default(), &path);
        assert_eq!(views.row_count, 2);
        assert!(views.status.starts_with("Loaded existing results"));
    }

    #[test]
    fn report_carries_request_and_table() {
        let run = completed(table(3), vec!["w".to_string()]);
        let cfg = ViewConfig::default();
        let views = build_views(&cfg, &run, cfg.now());
        let report = build_report(&run, &views);
        assert_eq!(report.result.len(), 3);
        assert_eq!(report.warnings, vec!["w".to_string()]);
        assert_eq!(report.exit_code, None);
        assert_eq!(report.request.h, 2e-4);
        // Square source on circuit A: 2 + 2 + 1 + 4 + 1 + 2 prompt answers.
        assert_eq!(report.tokens.len(), 12);
        assert_eq!(&report.tokens[..2], ["n", "A"]);
        assert_eq!(report.tokens[4], "4");
        assert_eq!(&report.tokens[10..], ["1000", "0.000001"]);
    }
}
