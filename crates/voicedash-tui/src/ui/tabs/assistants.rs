use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use voicedash_core::utils::truncate_string;

use crate::app::{App, Focus};
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    render_list(frame, app, chunks[0]);
    render_detail(frame, app, chunks[1]);
}

fn render_list(frame: &mut Frame, app: &App, area: Rect) {
    let assistants = app.filtered_assistants();
    let name_width = (area.width as usize).saturating_sub(6).max(8);

    let items: Vec<ListItem> = assistants
        .iter()
        .enumerate()
        .map(|(i, assistant)| {
            let name = if assistant.name.is_empty() {
                "(unnamed)"
            } else {
                assistant.name.as_str()
            };
            let style = if i == app.assistant_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            ListItem::new(Line::from(truncate_string(name, name_width))).style(style)
        })
        .collect();

    let title = if app.is_loading() {
        " Assistants (loading...) ".to_string()
    } else {
        format!(" Assistants ({}) ", assistants.len())
    };

    let focused = matches!(app.focus, Focus::List);
    let block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    if items.is_empty() {
        let hint = if app.search_query.is_empty() {
            " No assistants. Press [n] to create one."
        } else {
            " No assistants match the search"
        };
        let paragraph = Paragraph::new(Line::from(Span::styled(hint, styles::muted_style()))).block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let list = List::new(items).block(block);
    let mut state = ListState::default();
    state.select(Some(app.assistant_selection));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_detail(frame: &mut Frame, app: &App, area: Rect) {
    let focused = matches!(app.focus, Focus::Detail);

    let (title, lines) = match app.selected_assistant() {
        Some(assistant) => {
            let mut lines = vec![
                field_line("ID", &assistant.id),
                field_line("Voice", assistant.voice_id().unwrap_or("Not set")),
                field_line("Created", &assistant.created_display()),
            ];
            if let Some(model) = assistant.model.as_ref().and_then(|m| m.model.as_deref()) {
                lines.push(field_line("Model", model));
            }
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("First message", styles::highlight_style())));
            lines.push(Line::from(
                assistant.first_message.clone().unwrap_or_else(|| "Not set".to_string()),
            ));
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("Prompt", styles::highlight_style())));
            match assistant.system_prompt() {
                Some(prompt) => lines.extend(prompt.lines().map(|l| Line::from(l.to_string()))),
                None => lines.push(Line::from(Span::styled("No prompt", styles::muted_style()))),
            }
            (format!(" {} ", assistant.name), lines)
        }
        None => (
            " No Assistant Selected ".to_string(),
            vec![Line::from(Span::styled(
                "Select an assistant from the list",
                styles::muted_style(),
            ))],
        ),
    };

    let block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn field_line(label: &str, value: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<10}", label), styles::muted_style()),
        Span::raw(value.to_string()),
    ])
}
