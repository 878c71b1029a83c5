use crate::state::{control_key, App, CONTROL_KEYS};
use crate::theme;
use candash_core::{ControlButton, TableView, CHANNELS};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};

pub fn render(f: &mut Frame, app: &App) {
    let area = f.size();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Min(8),
            Constraint::Length(8),
        ])
        .split(area);

    render_header(f, app, layout[0]);
    render_controls(f, app, layout[1]);
    render_tables(f, app, layout[2]);
    render_messages(f, app, layout[3]);

    if app.show_help {
        render_help(f, area);
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let status_color = theme::connection_color(&app.connection);
    let mut spans = vec![
        Span::styled(app.connection.label(), Style::default().fg(status_color)),
        Span::raw("  "),
        Span::styled(
            format!("server: {}", app.config.server_addr),
            theme::MUTED_STYLE,
        ),
    ];
    if let Some(note) = app.status_note.as_deref() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(note.to_string(), theme::MUTED_STYLE));
    }

    let p = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(Span::styled("Status", theme::TITLE_STYLE)),
    );
    f.render_widget(p, area);
}

fn render_controls(f: &mut Frame, app: &App, area: Rect) {
    let mut logging_spans: Vec<Span> = Vec::new();
    if app.controls.auto_engaged() {
        logging_spans.push(Span::styled(
            "auto logging active".to_string(),
            theme::MUTED_STYLE,
        ));
    } else if app.controls.logging.is_empty() {
        logging_spans.push(Span::styled("-".to_string(), theme::MUTED_STYLE));
    } else {
        for button in &app.controls.logging {
            logging_spans.push(button_span(*button));
            logging_spans.push(Span::raw("  "));
        }
    }
    for (channel, state) in CHANNELS.iter().zip(app.controls.logging_state.iter()) {
        logging_spans.push(Span::styled(
            format!("  {channel}: "),
            theme::MUTED_STYLE,
        ));
        logging_spans.push(Span::styled(
            state.label(),
            Style::default().fg(theme::tri_state_color(*state)),
        ));
    }

    let mut autolog_spans: Vec<Span> = Vec::new();
    for button in &app.controls.autolog {
        autolog_spans.push(button_span(*button));
        autolog_spans.push(Span::raw("  "));
    }
    for (channel, state) in CHANNELS.iter().zip(app.controls.autolog_state.iter()) {
        autolog_spans.push(Span::styled(
            format!("  {channel}: "),
            theme::MUTED_STYLE,
        ));
        autolog_spans.push(Span::styled(
            state.label(),
            Style::default().fg(theme::tri_state_color(*state)),
        ));
    }

    let p = Paragraph::new(vec![Line::from(logging_spans), Line::from(autolog_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .title(Span::styled("Controls", theme::TITLE_STYLE)),
    );
    f.render_widget(p, area);
}

fn button_span(button: ControlButton) -> Span<'static> {
    Span::styled(
        format!("[{}] {}", control_key(button), button.label()),
        theme::BUTTON_STYLE,
    )
}

fn render_tables(f: &mut Frame, app: &App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(22),
            Constraint::Percentage(33),
            Constraint::Percentage(45),
        ])
        .split(area);

    render_table(f, &app.fps_table, "FPS", &["Channel", "Rate"], columns[0]);
    render_table(f, &app.system_table, "System", &["Item", "Value"], columns[1]);
    render_table(
        f,
        &app.vehicle_table,
        "Vehicle",
        &["Message", "Signal", "Value"],
        columns[2],
    );
}

fn render_table(f: &mut Frame, view: &TableView, title: &str, headers: &[&str], area: Rect) {
    let rows: Vec<Row> = view
        .rows()
        .iter()
        .enumerate()
        .map(|(index, row)| {
            Row::new(
                row.cells
                    .iter()
                    .map(|cell| Cell::from(cell.clone()))
                    .collect::<Vec<_>>(),
            )
            .style(theme::zebra_row_style(index))
        })
        .collect();

    let widths: Vec<Constraint> = headers
        .iter()
        .enumerate()
        .map(|(index, _)| {
            if index + 1 == headers.len() {
                Constraint::Min(8)
            } else {
                Constraint::Percentage((100 / headers.len()) as u16)
            }
        })
        .collect();

    let header_cells: Vec<&str> = headers.to_vec();
    let table = Table::new(rows, widths)
        .header(Row::new(header_cells).style(theme::HEADER_STYLE))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(title.to_string(), theme::TITLE_STYLE)),
        );
    f.render_widget(table, area);
}

fn render_messages(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled("Messages", theme::TITLE_STYLE));
    let inner = block.inner(area);
    f.render_widget(block, area);

    // Follow the tail: show the newest lines that fit.
    let visible = inner.height as usize;
    let start = app.messages.len().saturating_sub(visible);
    let lines: Vec<Line> = app.messages[start..]
        .iter()
        .map(|text| Line::from(text.clone()))
        .collect();
    let p = Paragraph::new(lines).wrap(Wrap { trim: true });
    f.render_widget(p, inner);
}

fn render_help(f: &mut Frame, area: Rect) {
    let width = area.width.min(44);
    let height = area.height.min(12);
    let popup = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    };
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Help")
        .border_style(Style::default().fg(Color::Yellow));
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let mut text: Vec<Line> = CONTROL_KEYS
        .iter()
        .map(|(key, button)| {
            Line::from(vec![
                Span::styled(key.to_string(), Style::default().fg(Color::Cyan)),
                Span::raw(format!("   {}", button.label())),
            ])
        })
        .collect();
    text.push(Line::from(vec![
        Span::styled("?", Style::default().fg(Color::Cyan)),
        Span::raw("   Toggle help"),
    ]));
    text.push(Line::from(vec![
        Span::styled("q", Style::default().fg(Color::Cyan)),
        Span::raw("   Quit"),
    ]));
    let p = Paragraph::new(text).wrap(Wrap { trim: true });
    f.render_widget(p, inner);
}
