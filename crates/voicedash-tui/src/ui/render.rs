use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use voicedash_core::auth::{guard, GuardDecision, Route};

use crate::app::{App, AppState, Editor, EntryMode};
use crate::form::{FieldKind, Form};

use super::styles;
use super::tabs::{assistants, call_logs, dashboard, phone_numbers};

/// Width of the text box in form dialogs
const FIELD_WIDTH: usize = 32;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(3), // Tabs
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_tabs(frame, app, chunks[1]);
    render_main_content(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    // Render overlays
    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::Editing => {
            if let Some(editor) = &app.editor {
                render_editor_overlay(frame, editor);
            }
        }
        AppState::ConfirmingDelete => render_delete_overlay(frame, app),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        _ => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!("  voicedash  {}", app.route.path());
    let user_hint = match app.session.subject() {
        Some(sub) if app.session.is_authenticated() => format!("{}  [?] Help", sub),
        _ => "[?] Help".to_string(),
    };

    let title_line = Line::from(vec![
        Span::styled(title.clone(), styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize).saturating_sub(title.chars().count() + user_hint.chars().count() + 2),
        )),
        Span::styled(user_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::raw(" ")];

    if app.route == Route::Entry {
        let modes = [
            ("Sign in", app.entry_mode == EntryMode::Login),
            ("Create account", app.entry_mode == EntryMode::Register),
        ];
        for (i, (label, selected)) in modes.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" | ", styles::muted_style()));
            }
            spans.push(Span::styled(*label, styles::tab_style(*selected)));
        }
    } else {
        for (i, route) in Route::PROTECTED.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" | ", styles::muted_style()));
            }
            let label = format!("[{}] {}", i + 1, route.title());
            if *route == app.route {
                spans.push(Span::styled(label, styles::tab_style(true)));
            } else {
                spans.push(Span::styled(label, styles::muted_style()));
            }
        }
    }

    if app.state == AppState::Searching || !app.search_query.is_empty() {
        spans.push(Span::raw("   "));
        spans.push(Span::styled(format!("/{}", app.search_query), styles::search_style()));
        if app.state == AppState::Searching {
            spans.push(Span::styled("▌", styles::search_style()));
        }
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match guard(&app.session, app.route) {
        GuardDecision::Pending => {
            let placeholder = Paragraph::new(Span::styled("  Checking session...", styles::muted_style()));
            frame.render_widget(placeholder, area);
        }
        // Nothing protected is drawn; the next frame lands on the entry screen
        GuardDecision::Redirect(_) => {}
        GuardDecision::Render => match app.route {
            Route::Entry => render_entry(frame, app, area),
            Route::Dashboard => dashboard::render(frame, app, area),
            Route::Assistants => assistants::render(frame, app, area),
            Route::PhoneNumbers => phone_numbers::render(frame, app, area),
            Route::CallLogs => call_logs::render(frame, app, area),
        },
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = match (app.route, app.state) {
        (_, AppState::Editing) => "[Tab] next field | [Enter] save | [Esc] cancel",
        (Route::Entry, _) => "[Tab] next field | [Ctrl+R] sign in/register | [Esc] quit",
        (Route::Assistants | Route::PhoneNumbers, _) => "[n]ew [e]dit [d]elete | [r]efresh | [L]ogout | [q]uit",
        _ => "[r]efresh | [L]ogout | [q]uit",
    };

    let (left_text, left_style) = match &app.notice {
        Some(notice) if notice.is_error => (format!(" {} ", notice.text), styles::error_style()),
        Some(notice) => (format!(" {} ", notice.text), styles::success_style()),
        None if app.session.is_authenticated() => (
            format!(" Session expires in {} min ", app.session.minutes_until_expiry()),
            styles::muted_style(),
        ),
        None => (" Not signed in ".to_string(), styles::muted_style()),
    };

    let right_text = format!(" {} ", shortcuts);
    let padding_len = (area.width as usize)
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.chars().count());

    let status_line = Line::from(vec![
        Span::styled(left_text, left_style),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    frame.render_widget(
        Paragraph::new(status_line).style(styles::status_bar_style()),
        area,
    );
}

/// Lines for a form: one row per field, then the submit button and any error
fn form_lines(form: &Form, button: &str) -> Vec<Line<'static>> {
    let mut lines = vec![];

    for (i, field) in form.fields.iter().enumerate() {
        let focused = form.focus == i;
        let style = if focused {
            styles::selected_style()
        } else {
            styles::list_item_style()
        };
        let shown = match field.kind {
            FieldKind::Secret => "*".repeat(field.value.chars().count()),
            FieldKind::Text | FieldKind::LongText => field.value.clone(),
        };
        // Keep the tail visible while typing
        let skip = shown.chars().count().saturating_sub(FIELD_WIDTH - 1);
        let visible: String = shown.chars().skip(skip).collect();
        let cursor = if focused { "▌" } else { "" };
        let marker = if field.required { "*" } else { " " };

        lines.push(Line::from(vec![
            Span::styled(format!(" {:>14}{} [", field.label, marker), styles::muted_style()),
            Span::styled(format!("{:<width$}", format!("{}{}", visible, cursor), width = FIELD_WIDTH), style),
            Span::styled("]", styles::muted_style()),
        ]));
    }

    lines.push(Line::from(""));
    let label = if form.on_button() {
        format!(" ▶ {} ◀ ", button)
    } else {
        format!("   {}   ", button)
    };
    let button_style = if form.on_button() {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    lines.push(Line::from(vec![
        Span::raw(" ".repeat(22)),
        Span::raw("["),
        Span::styled(label, button_style),
        Span::raw("]"),
    ]));

    if let Some(ref error) = form.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!(" {}", error), styles::error_style())));
    }

    lines
}

fn render_entry(frame: &mut Frame, app: &App, area: Rect) {
    let form = app.entry_form();
    let (title, button, switch_hint) = match app.entry_mode {
        EntryMode::Login => (" Sign in to your account ", "Login", " No account? Press Ctrl+R to register"),
        EntryMode::Register => (" Create an account ", "Sign Up", " Have an account? Press Ctrl+R to sign in"),
    };

    let mut lines = vec![Line::from("")];
    lines.extend(form_lines(form, button));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(switch_hint, styles::muted_style())));

    let height = lines.len() as u16 + 2;
    let dialog = centered_rect_fixed(58, height, area);

    let block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), dialog);
}

fn render_editor_overlay(frame: &mut Frame, editor: &Editor) {
    let mut lines = vec![Line::from("")];

    if let Editor::PhoneNumber { provider, .. } = editor {
        let hint = if editor.is_new() {
            "  [←/→] change"
        } else {
            "  (fixed)"
        };
        lines.push(Line::from(vec![
            Span::styled(format!(" {:>14}  ", "Provider"), styles::muted_style()),
            Span::styled(provider.to_string(), styles::highlight_style()),
            Span::styled(hint, styles::muted_style()),
        ]));
    }

    lines.extend(form_lines(editor.form(), "Save"));

    // Show the whole prompt while it is being edited
    let form = editor.form();
    if let Some(field) = form.fields.get(form.focus) {
        if field.kind == FieldKind::LongText && !field.value.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(format!(" {}", field.label), styles::highlight_style())));
            lines.push(Line::from(format!(" {}", field.value)));
        }
    }

    let frame_area = frame.area();
    let height = (lines.len() as u16 + 6).min(frame_area.height);
    let area = centered_rect_fixed(60, height, frame_area);
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(format!(" {} ", editor.title()))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), area);
}

fn render_delete_overlay(frame: &mut Frame, app: &App) {
    let Some(target) = &app.pending_delete else {
        return;
    };
    let area = centered_rect_fixed(56, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!(" Delete {}?", target.description()),
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(" Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to delete, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 26, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let help_text = vec![
        Line::from(Span::styled(
            format!("  voicedash {}", version),
            styles::title_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_line("1-4", "Switch screens"),
        help_line("←/→", "Prev/next screen or pane"),
        help_line("Tab", "Switch focus"),
        help_line("↑/↓", "Navigate list"),
        help_line("PgUp/PgDn", "Scroll a page"),
        help_line("Esc", "Go back / clear search"),
        Line::from(""),
        Line::from(Span::styled(" Actions", styles::highlight_style())),
        help_line("/", "Search"),
        help_line("n", "New assistant or phone number"),
        help_line("e / Enter", "Edit selected"),
        help_line("d", "Delete selected"),
        help_line("r", "Refresh from server"),
        help_line("L", "Log out"),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(Span::styled(" Forms", styles::highlight_style())),
        help_line("Tab/↓", "Next field"),
        help_line("Enter", "Next field / submit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}
