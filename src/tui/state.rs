use super::form::ParamForm;
use crate::model::{RunState, RunViews};
use ratatui::{
    style::Color,
    style::Style,
    text::{Line, Span},
};

pub struct UiState {
    pub form: ParamForm,
    pub views: RunViews,
    pub run_state: RunState,
    pub info: String,
    pub show_help: bool,
    pub runs_completed: u32,
}

impl UiState {
    pub fn new(form: ParamForm, views: RunViews) -> Self {
        Self {
            form,
            views,
            run_state: RunState::Idle,
            info: String::new(),
            show_help: false,
            runs_completed: 0,
        }
    }

    /// Replace every view with the result of a finished run and go back to Idle.
    pub fn apply_views(&mut self, views: RunViews) {
        self.run_state = RunState::Idle;
        self.runs_completed += 1;
        self.form.set_h(views.effective_h);
        self.info = if views.warnings.is_empty() {
            format!("Simulation complete ({} rows)", views.row_count)
        } else {
            format!(
                "Simulation finished with {} warning(s)",
                views.warnings.len()
            )
        };
        self.views = views;
    }
}

/// Marker the status line puts in front of run warnings.
const WARNINGS_MARKER: &str = "Warnings:";

/// Split one wrapped chunk at the start of the warnings, which render yellow.
/// `offset` is the chunk's char position within the whole value.
fn status_spans(chunk: &[char], offset: usize, warn_at: Option<usize>) -> Vec<Span<'static>> {
    let split = warn_at.map_or(chunk.len(), |w| w.saturating_sub(offset).min(chunk.len()));
    let (plain, warn) = chunk.split_at(split);
    let mut spans = Vec::new();
    if !plain.is_empty() {
        spans.push(Span::raw(plain.iter().collect::<String>()));
    }
    if !warn.is_empty() {
        spans.push(Span::styled(
            warn.iter().collect::<String>(),
            Style::default().fg(Color::Yellow),
        ));
    }
    spans
}

/// Push `label: value` wrapped to the inner width of a bordered panel.
/// Continuation lines are indented by two columns.
pub fn push_wrapped_status_kv(out: &mut Vec<Line<'static>>, label: &str, value: &str, width: u16) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }

    let inner = usize::from(width.saturating_sub(2)).max(1);
    let label_text = format!("{label}:");
    let first_indent = label_text.chars().count() + 1;
    let warn_at = value
        .find(WARNINGS_MARKER)
        .map(|byte| value[..byte].chars().count());

    let chars: Vec<char> = value.chars().collect();
    let mut pos = 0;
    while pos < chars.len() {
        let indent = if pos == 0 { first_indent } else { 2 };
        let end = (pos + inner.saturating_sub(indent).max(1)).min(chars.len());

        let mut spans = if pos == 0 {
            vec![
                Span::styled(label_text.clone(), Style::default().fg(Color::Gray)),
                Span::raw(" "),
            ]
        } else {
            vec![Span::raw("  ")]
        };
        spans.extend(status_spans(&chars[pos..end], pos, warn_at));
        out.push(Line::from(spans));
        pos = end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LineSeries;
    use crate::tui::form::FieldKey;

    fn views(h: f64, warnings: Vec<String>) -> RunViews {
        RunViews {
            output_series: LineSeries::default(),
            input_series: LineSeries::default(),
            preview: Vec::new(),
            row_count: 0,
            status: "Last simulation".into(),
            effective_h: h,
            warnings,
        }
    }

    #[test]
    fn completed_run_returns_to_idle_and_echoes_h() {
        let mut state = UiState::new(ParamForm::default(), views(1e-4, Vec::new()));
        state.run_state = RunState::Running;
        state.apply_views(views(2e-4, vec!["Engine exited with code 1".into()]));
        assert_eq!(state.run_state, RunState::Idle);
        assert_eq!(state.form.value(FieldKey::H), "2e-4");
        assert_eq!(state.info, "Simulation finished with 1 warning(s)");
        assert_eq!(state.runs_completed, 1);
    }

    #[test]
    fn status_wraps_to_width() {
        let mut lines = Vec::new();
        push_wrapped_status_kv(&mut lines, "Status", &"x".repeat(50), 24);
        assert!(lines.len() > 1);
        push_wrapped_status_kv(&mut lines, "Info", "  ", 24);
        let before = lines.len();
        push_wrapped_status_kv(&mut lines, "Info", "", 24);
        assert_eq!(lines.len(), before);
    }

    #[test]
    fn wrapped_lines_fit_inside_borders() {
        let mut lines = Vec::new();
        push_wrapped_status_kv(&mut lines, "Status", &"x".repeat(50), 24);
        for line in &lines {
            assert!(line.width() <= 22, "{line:?}");
        }
        let text: String = lines
            .iter()
            .flat_map(|l| l.spans.iter().map(|s| s.content.to_string()))
            .collect::<String>()
            .replace(' ', "")
            .replace("Status:", "");
        assert_eq!(text, "x".repeat(50));
    }

    #[test]
    fn warnings_are_highlighted() {
        let mut lines = Vec::new();
        let status = "Last simulation: 2024-03-05 14:07:09 | Warnings: Engine exited with code 2";
        push_wrapped_status_kv(&mut lines, "Status", status, 40);
        let yellow: String = lines
            .iter()
            .flat_map(|l| l.spans.iter())
            .filter(|s| s.style.fg == Some(Color::Yellow))
            .map(|s| s.content.to_string())
            .collect();
        assert!(yellow.starts_with("Warnings:"), "{yellow:?}");
        assert!(yellow.ends_with("code 2"));
        let plain: String = lines[0]
            .spans
            .iter()
            .filter(|s| s.style.fg.is_none())
            .map(|s| s.content.to_string())
            .collect();
        assert!(plain.contains("Last simulation"));
    }

    #[test]
    fn status_without_warnings_is_unstyled() {
        let mut lines = Vec::new();
        push_wrapped_status_kv(&mut lines, "Info", "Simulation complete (501 rows)", 80);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].spans[2..].iter().all(|s| s.style.fg.is_none()));
    }
}
