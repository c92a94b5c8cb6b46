mod charts;
mod form;
mod help;
mod state;

use crate::cli::{build_config, build_raw_params, Cli};
use crate::model::{RunState, SimEvent};
use crate::orchestrator::{self, UiCommand, ViewConfig};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use form::{FieldKey, ParamForm};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Terminal,
};
use state::{push_wrapped_status_kv, UiState};
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(args: Cli, view_cfg: ViewConfig) -> Result<()> {
    let (event_tx, event_rx) = mpsc::unbounded_channel::<SimEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    let cfg = build_config(&args);
    let form = ParamForm::from_raw(&build_raw_params(&args)?);
    // Show whatever a previous session left behind until the first run.
    let ui_state = UiState::new(form, orchestrator::initial_views(&view_cfg, &cfg.artifact));

    if args.run_on_launch {
        let _ = cmd_tx.send(UiCommand::Run(Box::new(ui_state.form.to_raw())));
    }

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_handle = std::thread::spawn(move || run_threaded(ui_state, event_rx, cmd_tx));

    let res = orchestrator::run_controller(&cfg, &view_cfg, event_tx, cmd_rx).await;

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
pub fn run_threaded(
    mut state: UiState,
    mut event_rx: UnboundedReceiver<SimEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = match Terminal::new(backend) {
        Ok(t) => t,
        Err(e) => {
            restore_terminal(&mut io::stdout());
            return Err(e).context("create terminal");
        }
    };
    terminal.clear().ok();

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();
    let mut dirty = true;

    let res = loop {
        // Drain events without blocking to keep UI responsive.
        while let Ok(ev) = event_rx.try_recv() {
            apply_event(&mut state, ev);
            dirty = true;
        }

        if dirty || last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
            dirty = false;
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match (k.modifiers, k.code) {
                    (_, KeyCode::Char('q')) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                    (_, KeyCode::Char('r')) | (_, KeyCode::Enter) => {
                        // The controller rejects this while a run is in flight.
                        let _ = cmd_tx.send(UiCommand::Run(Box::new(state.form.to_raw())));
                        if state.run_state == RunState::Idle {
                            state.info = "Run requested…".into();
                        }
                    }
                    (_, KeyCode::Char('?')) => {
                        state.show_help = !state.show_help;
                    }
                    (_, KeyCode::Esc) => {
                        state.show_help = false;
                    }
                    (_, KeyCode::Up) => state.form.select_prev(),
                    (_, KeyCode::Down) | (_, KeyCode::Tab) => state.form.select_next(),
                    (_, KeyCode::BackTab) => state.form.select_prev(),
                    (_, KeyCode::Left) => {
                        state.form.cycle(false);
                    }
                    (_, KeyCode::Right) => {
                        state.form.cycle(true);
                    }
                    (_, KeyCode::Backspace) => state.form.backspace(),
                    (_, KeyCode::Char(ch)) => {
                        state.form.type_char(ch);
                    }
                    _ => {}
                }
                dirty = true;
            }
        }
    };

    restore_terminal(terminal.backend_mut());
    terminal.show_cursor().ok();
    res
}

/// Leave raw mode and the alternate screen; best effort.
fn restore_terminal<W: io::Write>(out: &mut W) {
    disable_raw_mode().ok();
    execute!(out, LeaveAlternateScreen).ok();
}

fn apply_event(state: &mut UiState, ev: SimEvent) {
    match ev {
        SimEvent::RunStarted => {
            state.run_state = RunState::Running;
            state.info = "Running simulation…".into();
        }
        SimEvent::Info(info) => {
            state.info = info.to_message();
        }
        SimEvent::RunCompleted { views } => state.apply_views(*views),
    }
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    draw_header(chunks[0], f, state);

    if state.show_help {
        help::draw_help(chunks[1], f);
        return;
    }

    let main = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(66), Constraint::Percentage(34)].as_ref())
        .split(chunks[1]);

    let plots = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
        .split(main[0]);
    charts::render_series_chart(f, plots[0], &state.views.output_series, Color::Green);
    charts::render_series_chart(f, plots[1], &state.views.input_series, Color::Cyan);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(FieldKey::ORDER.len() as u16 + 2),
                Constraint::Min(5),
                Constraint::Length(7),
            ]
            .as_ref(),
        )
        .split(main[1]);
    draw_form(side[0], f, state);
    charts::render_preview_table(f, side[1], &state.views.preview, state.views.row_count);
    draw_status(side[2], f, state);
}

fn draw_header(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let (label, color) = match state.run_state {
        RunState::Idle => ("Idle", Color::Green),
        RunState::Running => ("Running", Color::Yellow),
    };
    let line = Line::from(vec![
        Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::raw(format!("  runs: {}  ", state.runs_completed)),
        Span::styled("r", Style::default().fg(Color::Magenta)),
        Span::raw(" run  "),
        Span::styled("?", Style::default().fg(Color::Magenta)),
        Span::raw(" help  "),
        Span::styled("q", Style::default().fg(Color::Magenta)),
        Span::raw(" quit"),
    ]);
    let p = Paragraph::new(line)
        .block(Block::default().borders(Borders::ALL).title("circuit-dash"));
    f.render_widget(p, area);
}

fn draw_form(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let circuit = state.form.circuit();
    let source = state.form.source();
    let selected = state.form.selected_key();

    let lines: Vec<Line> = FieldKey::ORDER
        .iter()
        .map(|&key| {
            let is_selected = key == selected;
            let relevant = form::is_relevant(key, circuit, source);
            let value = state.form.value(key);

            let label_style = if !relevant {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().fg(Color::Gray)
            };
            let mut value_style = if relevant {
                Style::default()
            } else {
                Style::default().fg(Color::DarkGray)
            };
            if is_selected {
                value_style = value_style.fg(Color::Yellow).add_modifier(Modifier::BOLD);
            }

            let shown = match (key, key.choices().is_some(), is_selected) {
                (FieldKey::Circuit, _, sel) => {
                    let desc = circuit.map(|c| c.describe()).unwrap_or("?");
                    let text = format!("{value} - {desc}");
                    if sel {
                        format!("◂ {text} ▸")
                    } else {
                        text
                    }
                }
                (_, true, true) => format!("◂ {value} ▸"),
                (_, false, true) => format!("{value}_"),
                _ => value.to_string(),
            };

            Line::from(vec![
                Span::styled(
                    if is_selected { "› " } else { "  " },
                    Style::default().fg(Color::Yellow),
                ),
                Span::styled(format!("{:<15}", key.label()), label_style),
                Span::styled(shown, value_style),
            ])
        })
        .collect();

    let p = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Parameters"));
    f.render_widget(p, area);
}

fn draw_status(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let mut lines: Vec<Line<'static>> = Vec::new();
    push_wrapped_status_kv(&mut lines, "Status", &state.views.status, area.width);
    push_wrapped_status_kv(&mut lines, "Info", &state.info, area.width);
    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(p, area);
}
