use ratatui::{
    layout::{Constraint, Rect},
    text::Span,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let numbers = app.filtered_phone_numbers();

    let title = if app.is_loading() {
        " Phone Numbers (loading...) ".to_string()
    } else {
        format!(" Phone Numbers ({}) ", numbers.len())
    };
    let block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    if numbers.is_empty() {
        let hint = if app.search_query.is_empty() {
            " No phone numbers. Press [n] to add one."
        } else {
            " No phone numbers match the search"
        };
        frame.render_widget(
            Paragraph::new(Span::styled(hint, styles::muted_style())).block(block),
            area,
        );
        return;
    }

    let header = Row::new(vec!["Number", "Provider", "Credential", "Created"])
        .style(styles::highlight_style());

    let rows: Vec<Row> = numbers
        .iter()
        .enumerate()
        .map(|(i, phone)| {
            let style = if i == app.phone_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            Row::new(vec![
                Cell::from(phone.display_number()),
                Cell::from(phone.provider.to_string()),
                Cell::from(phone.credential_id.clone().unwrap_or_else(|| "-".to_string())),
                Cell::from(phone.created_display()),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(22),
            Constraint::Length(16),
            Constraint::Min(12),
            Constraint::Length(14),
        ],
    )
    .header(header)
    .block(block);

    let mut state = TableState::default();
    state.select(Some(app.phone_selection));
    frame.render_stateful_widget(table, area, &mut state);
}
