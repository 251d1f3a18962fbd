//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use voicedash_core::auth::Route;

use crate::app::{clamp_selection, App, AppState, Focus, LogPane, PAGE_SCROLL_SIZE};
use crate::form::Form;

/// Move a selection by `delta`, staying inside `len` items
fn step(current: usize, len: usize, delta: isize) -> usize {
    let next = if delta < 0 {
        current.saturating_sub(delta.unsigned_abs())
    } else {
        current.saturating_add(delta as usize)
    };
    clamp_selection(next, len)
}

/// List movement shared by every list: arrows, page keys, home/end
fn list_delta(code: KeyCode) -> Option<isize> {
    match code {
        KeyCode::Up | KeyCode::Char('k') => Some(-1),
        KeyCode::Down | KeyCode::Char('j') => Some(1),
        KeyCode::PageUp => Some(-(PAGE_SCROLL_SIZE as isize)),
        KeyCode::PageDown => Some(PAGE_SCROLL_SIZE as isize),
        KeyCode::Home => Some(isize::MIN),
        KeyCode::End => Some(isize::MAX),
        _ => None,
    }
}

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        AppState::Quitting => return Ok(true),
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            return Ok(false);
        }
        AppState::ConfirmingQuit => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.state = AppState::Quitting;
                    return Ok(true);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::ConfirmingDelete => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.confirm_delete().await;
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.cancel_delete();
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::Editing => {
            handle_editor_input(app, key).await;
            return Ok(false);
        }
        AppState::Searching => {
            handle_search_input(app, key);
            return Ok(false);
        }
        AppState::Normal => {}
    }

    if app.route == Route::Entry {
        return handle_entry_input(app, key).await;
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
            return Ok(false);
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
            return Ok(false);
        }
        KeyCode::Char('/') => {
            app.state = AppState::Searching;
            return Ok(false);
        }
        KeyCode::Char('r') => {
            app.refresh();
            return Ok(false);
        }
        KeyCode::Char('L') => {
            app.logout();
            return Ok(false);
        }
        KeyCode::Char(c @ '1'..='4') => {
            let index = c as usize - '1' as usize;
            app.navigate(Route::PROTECTED[index]);
            return Ok(false);
        }
        KeyCode::Esc if !app.search_query.is_empty() => {
            app.search_query.clear();
            return Ok(false);
        }
        _ => {}
    }

    match app.route {
        Route::Assistants => handle_assistants_input(app, key),
        Route::PhoneNumbers => handle_phone_numbers_input(app, key),
        Route::CallLogs => handle_call_logs_input(app, key),
        Route::Dashboard | Route::Entry => handle_route_arrows(app, key),
    }
    Ok(false)
}

/// Left/right switch screens where they have no other meaning
fn handle_route_arrows(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Left => app.navigate(app.route.prev()),
        KeyCode::Right => app.navigate(app.route.next()),
        _ => {}
    }
}

fn handle_search_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Normal;
            app.search_query.clear();
        }
        KeyCode::Enter => {
            // Keep search query active
            app.state = AppState::Normal;
        }
        KeyCode::Backspace => {
            app.search_query.pop();
        }
        KeyCode::Char(c) => {
            app.search_query.push(c);
        }
        _ => return,
    }
    // Reset selection when search changes
    app.assistant_selection = 0;
    app.phone_selection = 0;
    app.select_log_assistant(0);
}

/// Field editing shared by the entry screen and dialogs.
/// Returns true when Enter was pressed on the submit button.
fn edit_form(form: &mut Form, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Down | KeyCode::Tab => form.focus_next(),
        KeyCode::Up | KeyCode::BackTab => form.focus_prev(),
        KeyCode::Enter => {
            if form.on_button() {
                return true;
            }
            form.focus_next();
        }
        KeyCode::Backspace => form.pop_char(),
        KeyCode::Char(c) => form.push_char(c),
        _ => {}
    }
    false
}

async fn handle_entry_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    if key.code == KeyCode::Esc {
        app.state = AppState::Quitting;
        return Ok(true);
    }
    if key.code == KeyCode::Char('r') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.toggle_entry_mode();
        return Ok(false);
    }
    if edit_form(app.entry_form_mut(), key) {
        app.submit_entry().await;
    }
    Ok(false)
}

async fn handle_editor_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_edit(),
        KeyCode::Left | KeyCode::Right => {
            if let Some(editor) = app.editor.as_mut() {
                editor.cycle_provider();
            }
        }
        _ => {
            let submit = match app.editor.as_mut() {
                Some(editor) => edit_form(editor.form_mut(), key),
                None => false,
            };
            if submit {
                app.save_editor().await;
            }
        }
    }
}

fn handle_assistants_input(app: &mut App, key: KeyEvent) {
    if let Some(delta) = list_delta(key.code) {
        let len = app.filtered_assistants().len();
        app.assistant_selection = step(app.assistant_selection, len, delta);
        return;
    }
    match key.code {
        KeyCode::Tab => {
            app.focus = match app.focus {
                Focus::List => Focus::Detail,
                Focus::Detail => Focus::List,
            };
        }
        KeyCode::Char('n') => app.start_create(),
        KeyCode::Char('e') | KeyCode::Enter => app.start_edit(),
        KeyCode::Char('d') | KeyCode::Delete => app.request_delete(),
        _ => handle_route_arrows(app, key),
    }
}

fn handle_phone_numbers_input(app: &mut App, key: KeyEvent) {
    if let Some(delta) = list_delta(key.code) {
        let len = app.filtered_phone_numbers().len();
        app.phone_selection = step(app.phone_selection, len, delta);
        return;
    }
    match key.code {
        KeyCode::Char('n') => app.start_create(),
        KeyCode::Char('e') | KeyCode::Enter => app.start_edit(),
        KeyCode::Char('d') | KeyCode::Delete => app.request_delete(),
        _ => handle_route_arrows(app, key),
    }
}

fn handle_call_logs_input(app: &mut App, key: KeyEvent) {
    if let Some(delta) = list_delta(key.code) {
        match app.log_pane {
            LogPane::Assistants => {
                let len = app.log_assistant_names().len();
                app.select_log_assistant(step(app.log_assistant_selection, len, delta));
            }
            LogPane::Conversations => {
                // +1 for "All messages"
                let len = app.selected_conversations().len() + 1;
                app.select_log_conversation(step(app.log_conversation_selection, len, delta));
            }
            LogPane::Messages => {
                // Three rows per message: header, text, spacer
                let len = app.visible_messages().len() * 3;
                app.message_scroll = step(app.message_scroll, len, delta);
            }
        }
        return;
    }
    match key.code {
        KeyCode::Right | KeyCode::Enter | KeyCode::Tab => {
            app.log_pane = match app.log_pane {
                LogPane::Assistants => LogPane::Conversations,
                LogPane::Conversations | LogPane::Messages => LogPane::Messages,
            };
        }
        KeyCode::Left | KeyCode::Esc | KeyCode::BackTab => match app.log_pane {
            LogPane::Assistants => {
                if key.code == KeyCode::Left {
                    app.navigate(app.route.prev());
                }
            }
            LogPane::Conversations => app.log_pane = LogPane::Assistants,
            LogPane::Messages => app.log_pane = LogPane::Conversations,
        },
        _ => {}
    }
}
