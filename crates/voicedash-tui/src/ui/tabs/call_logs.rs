use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use voicedash_core::logs::conversation_span;
use voicedash_core::utils::{format_timestamp, pluralize, truncate_string};

use crate::app::{App, LogPane};
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(5)])
        .split(area);

    render_stats(frame, app, rows[0]);

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(22),
            Constraint::Percentage(28),
            Constraint::Percentage(50),
        ])
        .split(rows[1]);

    render_assistants(frame, app, chunks[0]);
    render_conversations(frame, app, chunks[1]);
    render_messages(frame, app, chunks[2]);
}

fn render_stats(frame: &mut Frame, app: &App, area: Rect) {
    let text = if app.is_loading() {
        " Loading call logs...".to_string()
    } else {
        let stats = app.log_stats();
        format!(
            " {} active | {} | {} | {} from callers",
            pluralize(stats.active_assistants, "assistant"),
            pluralize(stats.total_conversations, "conversation"),
            pluralize(stats.total_messages, "message"),
            stats.user_messages,
        )
    };
    frame.render_widget(Paragraph::new(Span::styled(text, styles::muted_style())), area);
}

fn pane_block(title: String, focused: bool) -> Block<'static> {
    Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused))
}

fn render_assistants(frame: &mut Frame, app: &App, area: Rect) {
    let names = app.log_assistant_names();
    let width = (area.width as usize).saturating_sub(10).max(6);

    let items: Vec<ListItem> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let count = app.conversation_log.get(*name).map(Vec::len).unwrap_or(0);
            let style = if i == app.log_assistant_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            ListItem::new(Line::from(vec![
                Span::raw(truncate_string(name, width)),
                Span::styled(format!(" ({})", count), styles::muted_style()),
            ]))
            .style(style)
        })
        .collect();

    let block = pane_block(
        format!(" Assistants ({}) ", names.len()),
        app.log_pane == LogPane::Assistants,
    );

    if items.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(" No call logs", styles::muted_style())).block(block),
            area,
        );
        return;
    }

    let mut state = ListState::default();
    state.select(Some(app.log_assistant_selection));
    frame.render_stateful_widget(List::new(items).block(block), area, &mut state);
}

fn render_conversations(frame: &mut Frame, app: &App, area: Rect) {
    let conversations = app.selected_conversations();

    let total: usize = conversations.iter().map(Vec::len).sum();
    let mut entries = vec![format!("All messages ({})", total)];
    for (i, conversation) in conversations.iter().enumerate() {
        let started = conversation_span(conversation)
            .map(|(start, _)| format_timestamp(Some(start)))
            .unwrap_or_else(|| "Unknown time".to_string());
        entries.push(format!("#{} {} ({})", i + 1, started, conversation.len()));
    }

    let items: Vec<ListItem> = entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            let style = if i == app.log_conversation_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            ListItem::new(Line::from(entry)).style(style)
        })
        .collect();

    let block = pane_block(
        format!(" Conversations ({}) ", conversations.len()),
        app.log_pane == LogPane::Conversations,
    );

    let mut state = ListState::default();
    state.select(Some(app.log_conversation_selection));
    frame.render_stateful_widget(List::new(items).block(block), area, &mut state);
}

fn render_messages(frame: &mut Frame, app: &App, area: Rect) {
    let messages = app.visible_messages();

    let mut lines = vec![];
    for message in &messages {
        lines.push(Line::from(vec![
            Span::styled(format!("{} ", message.role), styles::role_style(message.role)),
            Span::styled(message.time_display(), styles::muted_style()),
        ]));
        lines.push(Line::from(message.message.clone()));
        lines.push(Line::from(""));
    }
    if lines.is_empty() {
        lines.push(Line::from(Span::styled("No messages", styles::muted_style())));
    }

    let title = match app.log_conversation_selection {
        0 => " All messages ".to_string(),
        n => format!(" Conversation #{} ", n),
    };
    let block = pane_block(title, app.log_pane == LogPane::Messages);

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.message_scroll.min(u16::MAX as usize) as u16, 0));
    frame.render_widget(paragraph, area);
}
