use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use voicedash_core::utils::{format_date, truncate_string};

use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(5)])
        .split(area);

    render_counts(frame, app, chunks[0]);

    let lists = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    render_recent_assistants(frame, app, lists[0]);
    render_recent_calls(frame, app, lists[1]);
}

fn render_counts(frame: &mut Frame, app: &App, area: Rect) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

    let counts = [
        ("Assistants", app.dashboard.assistant_count),
        ("Calls", app.dashboard.call_count),
        ("Phone Numbers", app.dashboard.phone_number_count),
    ];

    for ((label, count), card) in counts.iter().zip(cards.iter()) {
        let value = if app.is_loading() {
            "...".to_string()
        } else {
            count.to_string()
        };
        let lines = vec![
            Line::from(Span::styled(format!(" {}", value), styles::title_style())),
            Line::from(Span::styled(format!(" {}", label), styles::muted_style())),
        ];
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(styles::border_style(false));
        frame.render_widget(Paragraph::new(lines).block(block), *card);
    }
}

fn render_recent_assistants(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![];
    for assistant in &app.dashboard.recent_assistants {
        lines.push(Line::from(vec![
            Span::styled(
                format!(" {:<24}", truncate_string(&assistant.name, 24)),
                styles::list_item_style(),
            ),
            Span::styled(assistant.created_display(), styles::muted_style()),
        ]));
    }
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(" No assistants yet", styles::muted_style())));
    }

    let block = Block::default()
        .title(" Recent Assistants ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_recent_calls(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![];
    for call in &app.dashboard.recent_calls {
        let started = call
            .started_at
            .as_deref()
            .or(call.created_at.as_deref())
            .map(format_date)
            .unwrap_or_else(|| "-".to_string());
        lines.push(Line::from(vec![
            Span::styled(format!(" {:<10}", call.type_display()), styles::list_item_style()),
            Span::styled(
                format!("{:<12}", call.status_display()),
                styles::call_status_style(call.status_display()),
            ),
            Span::styled(format!("{:<9}", call.duration_display()), styles::list_item_style()),
            Span::styled(started, styles::muted_style()),
        ]));
    }
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(" No calls yet", styles::muted_style())));
    }

    let block = Block::default()
        .title(" Recent Calls ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}
