use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn key_line(key: &'static str, pad: usize, what: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(key, Style::default().fg(Color::Magenta)),
        Span::raw(" ".repeat(pad)),
        Span::raw(what),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("q", Style::default().fg(Color::Magenta)),
            Span::raw(" / "),
            Span::styled("Ctrl-C", Style::default().fg(Color::Magenta)),
            Span::raw("  Quit (waits for a running simulation)"),
        ]),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("r", Style::default().fg(Color::Magenta)),
            Span::raw(" / "),
            Span::styled("Enter", Style::default().fg(Color::Magenta)),
            Span::raw("   Run simulation"),
        ]),
        key_line("↑/↓", 9, "Select parameter"),
        key_line("←/→", 9, "Cycle circuit, method or source"),
        key_line("0-9 . - e", 3, "Edit numeric parameter"),
        key_line("Backspace", 3, "Delete last character"),
        key_line("?", 11, "Toggle this help"),
        Line::from(""),
        Line::from("Circuits:"),
        Line::from("  A  RC low-pass            (R, C)"),
        Line::from("  B  RC with diode          (R1, R2, C)"),
        Line::from("  C  series RLC             (R, C, L)"),
        Line::from("  D  parallel RLC           (R, C, L)"),
        Line::from(""),
        Line::from(vec![
            Span::raw("Invalid or blank values fall back to defaults; "),
            Span::styled("dimmed", Style::default().fg(Color::DarkGray)),
            Span::raw(" fields are ignored by the selected circuit or source."),
        ]),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
