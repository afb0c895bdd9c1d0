use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use crate::app::App;

mod colors {
    use ratatui::style::Color;

    pub const SURFACE0: Color = Color::Rgb(49, 50, 68);
    pub const SURFACE1: Color = Color::Rgb(69, 71, 90);
    pub const TEXT: Color = Color::Rgb(205, 214, 244);
    pub const SUBTEXT0: Color = Color::Rgb(166, 173, 200);
    pub const LAVENDER: Color = Color::Rgb(180, 190, 254);
    pub const BLUE: Color = Color::Rgb(137, 180, 250);
    pub const GREEN: Color = Color::Rgb(166, 227, 161);
    pub const YELLOW: Color = Color::Rgb(249, 226, 175);
}

/// Render the entire UI.
pub fn render(frame: &mut Frame, app: &App) {
    let bound_height = app.bound_lines().len().max(1) as u16 + 2;
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(bound_height),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, app, layout[0]);
    render_input(frame, app, layout[1]);
    render_results(frame, app, layout[2]);
    render_bound(frame, app, layout[3]);
    render_status_bar(frame, app, layout[4]);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let header = Line::from(vec![
        Span::styled(
            " uclases ",
            Style::default().fg(colors::LAVENDER).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" {} ", app.url), Style::default().fg(colors::SUBTEXT0)),
        Span::styled(format!(" [{}] ", app.mode), Style::default().fg(colors::BLUE)),
    ]);
    frame.render_widget(
        Paragraph::new(header).style(Style::default().bg(colors::SURFACE0)),
        area,
    );
}

fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::BLUE))
        .title(format!(" Search (min {}) ", app.min_length()));
    let input = Paragraph::new(Line::from(vec![
        Span::styled(app.input_text().to_string(), Style::default().fg(colors::TEXT)),
        Span::styled("█", Style::default().fg(colors::LAVENDER)),
    ]))
    .block(block);
    frame.render_widget(input, area);
}

fn render_results(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::SURFACE1))
        .title(" Results ");

    if !app.is_open() {
        frame.render_widget(block, area);
        return;
    }

    if let Some(placeholder) = app.placeholder() {
        let empty = Paragraph::new(Span::styled(
            placeholder,
            Style::default()
                .fg(colors::SUBTEXT0)
                .add_modifier(Modifier::ITALIC),
        ))
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = app
        .rows()
        .iter()
        .map(|row| {
            let mut spans = vec![Span::styled(
                row.item.label.clone(),
                Style::default().fg(colors::TEXT),
            )];
            if let Some(description) = row.item.visible_description() {
                spans.push(Span::styled(
                    format!("  {description}"),
                    Style::default().fg(colors::SUBTEXT0),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(colors::SURFACE1).add_modifier(Modifier::BOLD))
        .highlight_symbol("▶ ");
    let mut state = ListState::default().with_selected(app.highlight);
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_bound(frame: &mut Frame, app: &App, area: Rect) {
    let lines: Vec<Line> = app
        .bound_lines()
        .into_iter()
        .filter(|line| line.selected || !line.value.is_empty())
        .map(|line| {
            let marker = if line.selected { "[x]" } else { "[ ]" };
            let style = if line.selected {
                Style::default().fg(colors::GREEN)
            } else {
                Style::default().fg(colors::SUBTEXT0)
            };
            Line::from(Span::styled(
                format!("{marker} {} = {}", line.value, line.label),
                style,
            ))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::SURFACE1))
        .title(" Bound field ");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status = Line::from(vec![
        Span::styled(
            format!(" {} ", app.status_message),
            Style::default().fg(colors::YELLOW),
        ),
        Span::styled(
            " ↑↓ move  ⏎ select  Esc close  ^U clear  ^C quit ",
            Style::default().fg(colors::SUBTEXT0),
        ),
    ]);
    frame.render_widget(
        Paragraph::new(status).style(Style::default().bg(colors::SURFACE0)),
        area,
    );
}
