use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use task_core::view::{render, ConfirmView, FormView, StatusView, TaskRow, EMPTY_TEXT, LOADING_TEXT};
use task_core::Notice;

use crate::app::{Focus, Screen};

const LIST_HINTS: &str = "[space] done/undo  [e] edit  [d] delete  [r] refresh  [n] new  [q] quit";

pub fn draw(frame: &mut Frame, screen: &Screen) {
    let view = render(&screen.store);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(3), Constraint::Length(1)])
        .split(frame.area());

    draw_form(frame, chunks[0], &view.form, screen.focus);
    draw_status(frame, chunks[1], &view.status, screen);
    draw_footer(frame, chunks[2], view.notice.as_ref(), screen.focus);

    if let Some(confirm) = &view.confirm {
        draw_confirm(frame, confirm);
    }
}

fn border(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

fn input_line<'a>(label: &'a str, value: &'a str, focused: bool) -> Line<'a> {
    let mut spans = vec![
        Span::styled(label, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(value),
    ];
    if focused {
        spans.push(Span::styled("_", Style::default().fg(Color::Cyan)));
    }
    Line::from(spans)
}

fn draw_form(frame: &mut Frame, area: Rect, form: &FormView, focus: Focus) {
    let mut hints = vec![Span::raw(format!("[enter] {}", form.submit.label))];
    if let Some(cancel) = &form.cancel {
        hints.push(Span::raw(format!("  [esc] {}", cancel.label)));
    }
    hints.push(Span::styled("  [tab] next field", Style::default().fg(Color::DarkGray)));

    let lines = vec![
        input_line("Title: ", &form.title, focus == Focus::Title),
        input_line("Description: ", &form.description, focus == Focus::Description),
        Line::from(hints),
    ];

    let block = Block::default()
        .title(form.heading.as_str())
        .borders(Borders::ALL)
        .border_style(border(focus != Focus::List));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn row_item(row: &TaskRow) -> ListItem<'_> {
    let (marker, title_style) = if row.completed {
        ("✓ ", Style::default().fg(Color::Green).add_modifier(Modifier::CROSSED_OUT))
    } else {
        ("· ", Style::default().fg(Color::White))
    };
    let mut spans = vec![
        Span::raw(marker),
        Span::styled(row.title.as_str(), title_style),
    ];
    if let Some(description) = &row.description {
        spans.push(Span::styled(format!(" - {description}"), Style::default().fg(Color::Gray)));
    }
    spans.push(Span::styled(
        format!("  (created {})", row.created),
        Style::default().fg(Color::DarkGray),
    ));
    ListItem::new(Line::from(spans))
}

fn draw_status(frame: &mut Frame, area: Rect, status: &StatusView, screen: &Screen) {
    let block = Block::default()
        .title("Tasks")
        .borders(Borders::ALL)
        .border_style(border(screen.focus == Focus::List));

    match status {
        StatusView::Loading => {
            frame.render_widget(Paragraph::new(LOADING_TEXT).block(block), area);
        }
        StatusView::Failed { message, retry } => {
            let lines = vec![
                Line::from(Span::styled(
                    format!("Error: {message}"),
                    Style::default().fg(Color::Red),
                )),
                Line::from(format!("[r] {}", retry.label)),
            ];
            frame.render_widget(
                Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
                area,
            );
        }
        StatusView::Empty => {
            frame.render_widget(Paragraph::new(EMPTY_TEXT).block(block), area);
        }
        StatusView::List(rows) => {
            let items: Vec<ListItem> = rows.iter().map(row_item).collect();
            let list = List::new(items)
                .block(block)
                .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED));
            let mut state = ListState::default();
            if screen.focus == Focus::List {
                state.select(Some(screen.selected));
            }
            frame.render_stateful_widget(list, area, &mut state);
        }
    }
}

fn draw_footer(frame: &mut Frame, area: Rect, notice: Option<&Notice>, focus: Focus) {
    let line = match notice {
        Some(Notice::Error(text)) => Line::from(Span::styled(text.as_str(), Style::default().fg(Color::Red))),
        Some(Notice::Info(text)) => Line::from(Span::styled(text.as_str(), Style::default().fg(Color::Green))),
        None if focus == Focus::List => Line::from(Span::styled(LIST_HINTS, Style::default().fg(Color::DarkGray))),
        None => Line::from(Span::styled(
            "[tab] switch to list  [ctrl-c] quit",
            Style::default().fg(Color::DarkGray),
        )),
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn draw_confirm(frame: &mut Frame, confirm: &ConfirmView) {
    let area = centered(frame.area(), 44, 4);
    let lines = vec![
        Line::from(confirm.prompt.as_str()),
        Line::from(format!(
            "[y] {}  [n] {}",
            confirm.confirm.label, confirm.decline.label
        )),
    ];
    let block = Block::default()
        .title("Confirm")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: true }), area);
}
