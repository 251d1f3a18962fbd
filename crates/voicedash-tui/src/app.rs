//! Application state management for voicedash.
//!
//! This module contains the core `App` struct that manages all application state,
//! including UI state, fetched data, the session, and background task coordination.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use voicedash_core::api::{settle, ApiOutcome};
use voicedash_core::auth::{guard, GuardDecision, Route};
use voicedash_core::logs::{flatten_conversations, latest_conversation, LogStats};
use voicedash_core::models::{
    upsert_assistant, upsert_phone_number, Assistant, AssistantDraft, AssistantPatch,
    Conversation, ConversationLog, DashboardSummary, Message, PhoneNumber, PhoneNumberDraft,
    PhoneNumberPatch, Provider,
};
use voicedash_core::utils::contains_ignore_case;
use voicedash_core::{ApiClient, ApiError, Config, Session};

use crate::form::{Form, LOGIN_EMAIL, LOGIN_PASSWORD};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Number of items to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

/// How long a status bar notice stays up.
const NOTICE_TTL: Duration = Duration::from_secs(5);

// ============================================================================
// UI State Types
// ============================================================================

/// Current UI focus area (list panel or detail panel)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    List,
    Detail,
}

/// Panes of the call log screen, left to right
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogPane {
    Assistants,
    Conversations,
    Messages,
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Searching,
    ShowingHelp,
    Editing,
    ConfirmingDelete,
    ConfirmingQuit,
    Quitting,
}

/// Which form the entry screen shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryMode {
    Login,
    Register,
}

/// Create/edit dialog. `id` is None when creating.
#[derive(Debug, Clone, PartialEq)]
pub enum Editor {
    Assistant {
        id: Option<String>,
        form: Form,
    },
    PhoneNumber {
        id: Option<String>,
        provider: Provider,
        form: Form,
    },
}

impl Editor {
    pub fn form(&self) -> &Form {
        match self {
            Editor::Assistant { form, .. } | Editor::PhoneNumber { form, .. } => form,
        }
    }

    pub fn form_mut(&mut self) -> &mut Form {
        match self {
            Editor::Assistant { form, .. } | Editor::PhoneNumber { form, .. } => form,
        }
    }

    pub fn is_new(&self) -> bool {
        match self {
            Editor::Assistant { id, .. } | Editor::PhoneNumber { id, .. } => id.is_none(),
        }
    }

    pub fn title(&self) -> &'static str {
        match (self, self.is_new()) {
            (Editor::Assistant { .. }, true) => "New Assistant",
            (Editor::Assistant { .. }, false) => "Edit Assistant",
            (Editor::PhoneNumber { .. }, true) => "New Phone Number",
            (Editor::PhoneNumber { .. }, false) => "Edit Phone Number",
        }
    }

    /// Providers are fixed once a number exists
    pub fn cycle_provider(&mut self) {
        if let Editor::PhoneNumber { id: None, provider, .. } = self {
            *provider = provider.next();
        }
    }
}

/// Item awaiting delete confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    Assistant { id: String, name: String },
    PhoneNumber { id: String, number: String },
}

impl DeleteTarget {
    pub fn description(&self) -> String {
        match self {
            DeleteTarget::Assistant { name, .. } => format!("assistant \"{}\"", name),
            DeleteTarget::PhoneNumber { number, .. } => format!("phone number {}", number),
        }
    }
}

/// Transient status bar message
#[derive(Debug, Clone)]
pub struct Notice {
    pub text: String,
    pub is_error: bool,
    shown_at: Instant,
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent through the MPSC channel from background loads.
enum TaskResult {
    Dashboard(Result<DashboardSummary, ApiError>),
    Assistants(Result<Vec<Assistant>, ApiError>),
    PhoneNumbers(Result<Vec<PhoneNumber>, ApiError>),
    Messages(Result<ConversationLog, ApiError>),
}

impl TaskResult {
    fn route(&self) -> Route {
        match self {
            TaskResult::Dashboard(_) => Route::Dashboard,
            TaskResult::Assistants(_) => Route::Assistants,
            TaskResult::PhoneNumbers(_) => Route::PhoneNumbers,
            TaskResult::Messages(_) => Route::CallLogs,
        }
    }
}

/// A task result tagged with the session epoch it was started under
struct TaskMessage {
    epoch: u64,
    result: TaskResult,
}

// ============================================================================
// Main Application Struct
// ============================================================================

/// Main application state container
pub struct App {
    // Core services
    pub config: Config,
    config_path: Option<PathBuf>,
    pub session: Session,
    pub api: ApiClient,

    // UI State
    pub state: AppState,
    pub route: Route,
    pub focus: Focus,
    pub search_query: String,

    // Entry screen
    pub entry_mode: EntryMode,
    pub login_form: Form,
    pub register_form: Form,

    // Dialogs
    pub editor: Option<Editor>,
    pub pending_delete: Option<DeleteTarget>,

    // Fetched data
    pub dashboard: DashboardSummary,
    pub assistants: Vec<Assistant>,
    pub phone_numbers: Vec<PhoneNumber>,
    pub conversation_log: ConversationLog,
    pub loading: HashSet<Route>,

    // Selection indices
    pub assistant_selection: usize,
    pub phone_selection: usize,
    pub log_pane: LogPane,
    pub log_assistant_selection: usize,
    /// 0 is the "All messages" timeline, n is conversation n-1
    pub log_conversation_selection: usize,
    pub message_scroll: usize,
    // Call-log selection to put back once a refresh lands
    kept_log_selection: Option<(String, usize)>,

    pub notice: Option<Notice>,

    // Bumped whenever the session ends so late results are dropped
    epoch: u64,
    task_rx: mpsc::Receiver<TaskMessage>,
    task_tx: mpsc::Sender<TaskMessage>,
}

impl App {
    /// Create the application. The session is not restored yet, so the
    /// first frame shows the startup placeholder until [`App::start`] runs.
    pub fn new(config: Config, config_path: Option<PathBuf>, session: Session, api: ApiClient) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let login_form = Form::login(config.last_email.as_deref());

        Self {
            config,
            config_path,
            session,
            api,

            state: AppState::Normal,
            route: Route::Dashboard,
            focus: Focus::List,
            search_query: String::new(),

            entry_mode: EntryMode::Login,
            login_form,
            register_form: Form::register(),

            editor: None,
            pending_delete: None,

            dashboard: DashboardSummary::default(),
            assistants: Vec::new(),
            phone_numbers: Vec::new(),
            conversation_log: ConversationLog::new(),
            loading: HashSet::new(),

            assistant_selection: 0,
            phone_selection: 0,
            log_pane: LogPane::Assistants,
            log_assistant_selection: 0,
            log_conversation_selection: 0,
            message_scroll: 0,
            kept_log_selection: None,

            notice: None,

            epoch: 0,
            task_rx: rx,
            task_tx: tx,
        }
    }

    /// Run the startup session check and open the first screen.
    pub fn start(&mut self) {
        self.session.restore();
        if self.session.is_authenticated() {
            info!(sub = ?self.session.subject(), "Resuming session");
            self.navigate(Route::Dashboard);
        } else {
            self.route = Route::Entry;
        }
    }

    // =========================================================================
    // Routing
    // =========================================================================

    /// Apply the route guard. Called every frame so an expired or cleared
    /// session is noticed without waiting for a request to fail.
    /// A token that expired mid-session is discarded so the next launch
    /// does not restore it.
    pub fn enforce_guard(&mut self) -> GuardDecision {
        let decision = guard(&self.session, self.route);
        if let GuardDecision::Redirect(target) = decision {
            debug!(from = ?self.route, to = ?target, "Route guard redirect");
            if self.session.token().is_some() {
                self.session.invalidate();
            }
            self.leave_session(target);
        }
        decision
    }

    /// Switch screens and load that screen's data.
    pub fn navigate(&mut self, route: Route) {
        debug!(?route, "Navigating");
        self.route = route;
        self.focus = Focus::List;
        self.state = AppState::Normal;
        self.search_query.clear();
        self.spawn_load(route);
    }

    /// Reload the current screen
    pub fn refresh(&mut self) {
        if self.route == Route::CallLogs {
            self.kept_log_selection = self
                .selected_log_assistant()
                .map(|name| (name.to_string(), self.log_conversation_selection));
        }
        self.spawn_load(self.route);
    }

    /// Drop all session-scoped state and go to `route`.
    fn leave_session(&mut self, route: Route) {
        self.epoch += 1;
        self.route = route;
        self.state = AppState::Normal;
        self.focus = Focus::List;
        self.search_query.clear();
        self.editor = None;
        self.pending_delete = None;
        self.loading.clear();

        self.dashboard = DashboardSummary::default();
        self.assistants.clear();
        self.phone_numbers.clear();
        self.conversation_log.clear();
        self.assistant_selection = 0;
        self.phone_selection = 0;
        self.log_pane = LogPane::Assistants;
        self.log_assistant_selection = 0;
        self.log_conversation_selection = 0;
        self.message_scroll = 0;
        self.kept_log_selection = None;

        self.entry_mode = EntryMode::Login;
        self.login_form.clear_secrets();
        self.login_form.error = None;
        self.register_form = Form::register();
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub fn entry_form(&self) -> &Form {
        match self.entry_mode {
            EntryMode::Login => &self.login_form,
            EntryMode::Register => &self.register_form,
        }
    }

    pub fn entry_form_mut(&mut self) -> &mut Form {
        match self.entry_mode {
            EntryMode::Login => &mut self.login_form,
            EntryMode::Register => &mut self.register_form,
        }
    }

    pub fn toggle_entry_mode(&mut self) {
        self.entry_mode = match self.entry_mode {
            EntryMode::Login => EntryMode::Register,
            EntryMode::Register => EntryMode::Login,
        };
        self.entry_form_mut().error = None;
    }

    /// Submit whichever entry form is showing
    pub async fn submit_entry(&mut self) {
        match self.entry_mode {
            EntryMode::Login => self.attempt_login().await,
            EntryMode::Register => self.attempt_register().await,
        }
    }

    /// Attempt login with the credentials from the login form
    pub async fn attempt_login(&mut self) {
        if let Some(label) = self.login_form.missing_required() {
            self.login_form.error = Some(format!("{} is required", label));
            return;
        }
        self.login_form.error = None;

        let email = self.login_form.value(LOGIN_EMAIL).trim().to_string();
        let password = self.login_form.value(LOGIN_PASSWORD).to_string();

        match self.api.login(&email, &password).await {
            Ok(token) => {
                self.remember_email(email);
                self.start_session(&token, "Login successful".to_string());
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                self.login_form.error = Some(entry_error_message(&e, "Login failed"));
            }
        }
    }

    /// Attempt registration with the register form; success signs in.
    pub async fn attempt_register(&mut self) {
        if let Some(label) = self.register_form.missing_required() {
            self.register_form.error = Some(format!("{} is required", label));
            return;
        }
        self.register_form.error = None;

        let request = self.register_form.register_request();
        match self.api.register(&request).await {
            Ok(response) => {
                self.remember_email(request.email);
                let greeting = response
                    .msg
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "Registration successful".to_string());
                self.start_session(&response.access_token, greeting);
            }
            Err(e) => {
                error!(error = %e, "Registration failed");
                self.register_form.error = Some(entry_error_message(
                    &e,
                    "Registration failed. Please try again later.",
                ));
            }
        }
    }

    fn start_session(&mut self, token: &str, greeting: String) {
        match self.session.login(token) {
            Ok(route) => {
                self.login_form.clear_secrets();
                self.register_form = Form::register();
                self.entry_mode = EntryMode::Login;
                self.epoch += 1;
                self.notify(greeting);
                self.navigate(route);
            }
            Err(e) => {
                warn!(error = %e, "Server issued a token that could not be read");
                self.entry_form_mut().error =
                    Some("Signed in, but the server's token could not be read".to_string());
            }
        }
    }

    fn remember_email(&mut self, email: String) {
        self.config.last_email = Some(email);
        if let Some(path) = &self.config_path {
            if let Err(e) = self.config.save_to(path) {
                warn!(error = %e, "Failed to save config");
            }
        }
    }

    pub fn logout(&mut self) {
        let route = self.session.logout();
        self.leave_session(route);
        self.notify("Logged out".to_string());
    }

    // =========================================================================
    // Notices
    // =========================================================================

    pub fn notify(&mut self, text: String) {
        self.notice = Some(Notice {
            text,
            is_error: false,
            shown_at: Instant::now(),
        });
    }

    pub fn notify_error(&mut self, text: String) {
        self.notice = Some(Notice {
            text,
            is_error: true,
            shown_at: Instant::now(),
        });
    }

    /// Expire old notices
    pub fn tick(&mut self) {
        if self
            .notice
            .as_ref()
            .is_some_and(|n| n.shown_at.elapsed() >= NOTICE_TTL)
        {
            self.notice = None;
        }
    }

    // =========================================================================
    // Background loads
    // =========================================================================

    fn spawn_load(&mut self, route: Route) {
        if !route.is_protected() {
            return;
        }
        self.loading.insert(route);

        let api = self.api.clone();
        let tx = self.task_tx.clone();
        let epoch = self.epoch;

        tokio::spawn(async move {
            let result = match route {
                Route::Dashboard => TaskResult::Dashboard(api.fetch_dashboard().await),
                Route::Assistants => TaskResult::Assistants(api.list_assistants().await),
                Route::PhoneNumbers => TaskResult::PhoneNumbers(api.list_phone_numbers().await),
                Route::CallLogs => TaskResult::Messages(api.fetch_messages().await),
                Route::Entry => return,
            };
            if let Err(e) = tx.send(TaskMessage { epoch, result }).await {
                error!(error = %e, "Failed to send task result - channel closed");
            }
        });
    }

    /// Check for completed background tasks and process results
    pub fn check_background_tasks(&mut self) {
        let mut messages = Vec::new();
        while let Ok(message) = self.task_rx.try_recv() {
            messages.push(message);
        }
        for message in messages {
            self.process_task_message(message);
        }
    }

    fn process_task_message(&mut self, message: TaskMessage) {
        if message.epoch != self.epoch {
            debug!("Dropping result from an earlier session");
            return;
        }
        self.loading.remove(&message.result.route());

        match message.result {
            TaskResult::Dashboard(result) => {
                self.dashboard = self.settle_load(result, "Failed to load dashboard");
            }
            TaskResult::Assistants(result) => {
                self.assistants = self.settle_load(result, "Failed to load assistants");
                self.assistant_selection = clamp_selection(self.assistant_selection, self.assistants.len());
            }
            TaskResult::PhoneNumbers(result) => {
                self.phone_numbers = self.settle_load(result, "Failed to load phone numbers");
                self.phone_selection = clamp_selection(self.phone_selection, self.phone_numbers.len());
            }
            TaskResult::Messages(result) => {
                self.conversation_log = self.settle_load(result, "Failed to load call logs");
                match self.kept_log_selection.take() {
                    Some((name, conversation)) => self.restore_log_selection(&name, conversation),
                    None => self.select_log_assistant(0),
                }
            }
        }
    }

    /// Settle a load result; failures leave the screen empty.
    fn settle_load<T: Default>(&mut self, result: Result<T, ApiError>, fallback: &str) -> T {
        match settle(&mut self.session, result, fallback) {
            ApiOutcome::Success(value) => value,
            ApiOutcome::Failed(notice) => {
                self.notify_error(notice);
                T::default()
            }
            ApiOutcome::Unauthorized(route) => {
                self.leave_session(route);
                T::default()
            }
        }
    }

    /// Settle a mutation result; failures are shown in the open dialog.
    fn settle_action<T>(&mut self, result: Result<T, ApiError>, fallback: &str) -> Option<T> {
        match settle(&mut self.session, result, fallback) {
            ApiOutcome::Success(value) => Some(value),
            ApiOutcome::Failed(notice) => {
                match self.editor.as_mut() {
                    Some(editor) => editor.form_mut().error = Some(notice),
                    None => self.notify_error(notice),
                }
                None
            }
            ApiOutcome::Unauthorized(route) => {
                self.leave_session(route);
                None
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.contains(&self.route)
    }

    // =========================================================================
    // Assistants
    // =========================================================================

    pub fn filtered_assistants(&self) -> Vec<&Assistant> {
        self.assistants
            .iter()
            .filter(|a| {
                self.search_query.is_empty()
                    || contains_ignore_case(&a.name, &self.search_query)
                    || contains_ignore_case(&a.id, &self.search_query)
                    || a.system_prompt()
                        .map(|p| contains_ignore_case(p, &self.search_query))
                        .unwrap_or(false)
            })
            .collect()
    }

    pub fn selected_assistant(&self) -> Option<&Assistant> {
        self.filtered_assistants().get(self.assistant_selection).copied()
    }

    // =========================================================================
    // Phone numbers
    // =========================================================================

    pub fn filtered_phone_numbers(&self) -> Vec<&PhoneNumber> {
        self.phone_numbers
            .iter()
            .filter(|p| {
                self.search_query.is_empty()
                    || contains_ignore_case(&p.number, &self.search_query)
                    || contains_ignore_case(p.provider.as_str(), &self.search_query)
            })
            .collect()
    }

    pub fn selected_phone_number(&self) -> Option<&PhoneNumber> {
        self.filtered_phone_numbers().get(self.phone_selection).copied()
    }

    // =========================================================================
    // Create / edit / delete
    // =========================================================================

    /// Open an empty create dialog for the current screen
    pub fn start_create(&mut self) {
        let editor = match self.route {
            Route::Assistants => Editor::Assistant {
                id: None,
                form: Form::assistant(&AssistantDraft::default()),
            },
            Route::PhoneNumbers => Editor::PhoneNumber {
                id: None,
                provider: Provider::default(),
                form: Form::phone_number(&PhoneNumberDraft::default()),
            },
            _ => return,
        };
        self.editor = Some(editor);
        self.state = AppState::Editing;
    }

    /// Open the edit dialog for the selected item
    pub fn start_edit(&mut self) {
        let editor = match self.route {
            Route::Assistants => self.selected_assistant().map(|a| Editor::Assistant {
                id: Some(a.id.clone()),
                form: Form::assistant(&a.to_draft()),
            }),
            Route::PhoneNumbers => self.selected_phone_number().map(|p| Editor::PhoneNumber {
                id: Some(p.id.clone()),
                provider: p.provider,
                form: Form::phone_number(&p.to_draft()),
            }),
            _ => None,
        };
        if let Some(editor) = editor {
            self.editor = Some(editor);
            self.state = AppState::Editing;
        }
    }

    pub fn cancel_edit(&mut self) {
        self.editor = None;
        self.state = AppState::Normal;
    }

    /// Validate and send the open dialog
    pub async fn save_editor(&mut self) {
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        if let Some(label) = editor.form().missing_required() {
            editor.form_mut().error = Some(format!("{} is required", label));
            return;
        }
        editor.form_mut().error = None;

        match editor.clone() {
            Editor::Assistant { id, form } => {
                let draft = form.assistant_draft();
                let result = match id.as_deref() {
                    Some(id) => self.api.update_assistant(id, &AssistantPatch::from(draft)).await,
                    None => self.api.create_assistant(&draft).await,
                };
                if let Some(assistant) = self.settle_action(result, "Failed to save assistant") {
                    info!(id = %assistant.id, "Assistant saved");
                    upsert_assistant(&mut self.assistants, assistant);
                    self.cancel_edit();
                    self.notify("Assistant saved".to_string());
                }
            }
            Editor::PhoneNumber { id, provider, form } => {
                let draft = form.phone_number_draft(provider);
                let result = match id.as_deref() {
                    Some(id) => {
                        self.api
                            .update_phone_number(id, &PhoneNumberPatch::from(draft))
                            .await
                    }
                    None => self.api.create_phone_number(&draft).await,
                };
                if let Some(phone) = self.settle_action(result, "Failed to save phone number") {
                    info!(id = %phone.id, "Phone number saved");
                    upsert_phone_number(&mut self.phone_numbers, phone);
                    self.cancel_edit();
                    self.notify("Phone number saved".to_string());
                }
            }
        }
    }

    /// Ask for confirmation before deleting the selected item
    pub fn request_delete(&mut self) {
        let target = match self.route {
            Route::Assistants => self.selected_assistant().map(|a| DeleteTarget::Assistant {
                id: a.id.clone(),
                name: a.name.clone(),
            }),
            Route::PhoneNumbers => self.selected_phone_number().map(|p| DeleteTarget::PhoneNumber {
                id: p.id.clone(),
                number: p.display_number(),
            }),
            _ => None,
        };
        if let Some(target) = target {
            self.pending_delete = Some(target);
            self.state = AppState::ConfirmingDelete;
        }
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
        self.state = AppState::Normal;
    }

    pub async fn confirm_delete(&mut self) {
        let Some(target) = self.pending_delete.take() else {
            return;
        };
        self.state = AppState::Normal;

        match target {
            DeleteTarget::Assistant { id, .. } => {
                let result = self.api.delete_assistant(&id).await;
                if self.settle_action(result, "Failed to delete assistant").is_some() {
                    info!(%id, "Assistant deleted");
                    self.assistants.retain(|a| a.id != id);
                    self.assistant_selection =
                        clamp_selection(self.assistant_selection, self.filtered_assistants().len());
                    self.notify("Assistant deleted".to_string());
                }
            }
            DeleteTarget::PhoneNumber { id, .. } => {
                let result = self.api.delete_phone_number(&id).await;
                if self.settle_action(result, "Failed to delete phone number").is_some() {
                    info!(%id, "Phone number deleted");
                    self.phone_numbers.retain(|p| p.id != id);
                    self.phone_selection =
                        clamp_selection(self.phone_selection, self.filtered_phone_numbers().len());
                    self.notify("Phone number deleted".to_string());
                }
            }
        }
    }

    // =========================================================================
    // Call logs
    // =========================================================================

    /// Assistant names in the log, filtered by the search query
    pub fn log_assistant_names(&self) -> Vec<&str> {
        self.conversation_log
            .keys()
            .map(String::as_str)
            .filter(|name| self.search_query.is_empty() || contains_ignore_case(name, &self.search_query))
            .collect()
    }

    pub fn selected_log_assistant(&self) -> Option<&str> {
        self.log_assistant_names()
            .get(self.log_assistant_selection)
            .copied()
    }

    pub fn selected_conversations(&self) -> &[Conversation] {
        self.selected_log_assistant()
            .and_then(|name| self.conversation_log.get(name))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Select an assistant and preselect its most recent conversation.
    pub fn select_log_assistant(&mut self, index: usize) {
        self.log_assistant_selection = clamp_selection(index, self.log_assistant_names().len());
        self.log_conversation_selection = latest_conversation(self.selected_conversations())
            .map(|i| i + 1)
            .unwrap_or(0);
        self.message_scroll = 0;
    }

    /// Reselect `name` after a reload, falling back to the first assistant
    /// when it is gone.
    fn restore_log_selection(&mut self, name: &str, conversation: usize) {
        match self.log_assistant_names().iter().position(|n| *n == name) {
            Some(index) => {
                self.log_assistant_selection = index;
                self.log_conversation_selection =
                    clamp_selection(conversation, self.selected_conversations().len() + 1);
            }
            None => self.select_log_assistant(0),
        }
    }

    pub fn select_log_conversation(&mut self, index: usize) {
        // +1 for the "All messages" entry
        self.log_conversation_selection =
            clamp_selection(index, self.selected_conversations().len() + 1);
        self.message_scroll = 0;
    }

    /// Messages for the selected conversation, or the assistant's whole
    /// timeline when "All messages" is selected. Always time ordered.
    pub fn visible_messages(&self) -> Vec<Message> {
        let conversations = self.selected_conversations();
        match self.log_conversation_selection {
            0 => flatten_conversations(conversations),
            n => conversations
                .get(n - 1)
                .map(|c| flatten_conversations(std::slice::from_ref(c)))
                .unwrap_or_default(),
        }
    }

    pub fn log_stats(&self) -> LogStats {
        LogStats::from_log(&self.conversation_log)
    }
}

/// Keep a selection index inside a list of `len` items
pub fn clamp_selection(index: usize, len: usize) -> usize {
    index.min(len.saturating_sub(1))
}

/// User-facing message for a failed login or registration
fn entry_error_message(error: &ApiError, fallback: &str) -> String {
    match error {
        ApiError::Unauthorized => "Invalid email or password".to_string(),
        ApiError::NetworkError(_) => {
            "Unable to connect to server. Check the API URL and your connection.".to_string()
        }
        other => other.detail().unwrap_or(fallback).to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use voicedash_core::auth::{MemoryTokenStore, TokenStore};

    use super::*;

    fn token(exp_offset: i64) -> String {
        let claims = serde_json::json!({
            "sub": "ada@example.com",
            "exp": Utc::now().timestamp() + exp_offset,
        });
        encode(&Header::default(), &claims, &EncodingKey::from_secret(b"secret")).unwrap()
    }

    fn app_with(server: &mockito::Server, store: Arc<dyn TokenStore>) -> App {
        let session = Session::new(store.clone());
        let api = ApiClient::new(&server.url(), store).unwrap();
        App::new(Config::default(), None, session, api)
    }

    /// Wait for one background result and apply it
    async fn recv_task(app: &mut App) {
        let message = app.task_rx.recv().await.unwrap();
        app.process_task_message(message);
    }

    fn fill(form: &mut Form, values: &[&str]) {
        for (field, value) in form.fields.iter_mut().zip(values) {
            field.value = value.to_string();
        }
    }

    #[tokio::test]
    async fn test_startup_with_expired_token_shows_entry() {
        let server = mockito::Server::new_async().await;
        let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::with_token(token(-10)));
        let mut app = app_with(&server, store.clone());

        assert_eq!(app.enforce_guard(), GuardDecision::Pending);
        app.start();
        assert_eq!(app.route, Route::Entry);
        assert_eq!(app.enforce_guard(), GuardDecision::Render);
        assert!(store.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_startup_with_valid_token_loads_dashboard() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/assistants")
            .with_body(r#"[{"id": "a1", "name": "Front Desk"}]"#)
            .create_async()
            .await;
        server.mock("GET", "/calls").with_body("[]").create_async().await;
        server.mock("GET", "/phone-numbers").with_body("[]").create_async().await;

        let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::with_token(token(3600)));
        let mut app = app_with(&server, store);
        app.start();
        assert_eq!(app.route, Route::Dashboard);
        assert!(app.is_loading());

        recv_task(&mut app).await;
        assert!(!app.is_loading());
        assert_eq!(app.dashboard.assistant_count, 1);
        assert_eq!(app.dashboard.recent_assistants[0].name, "Front Desk");
    }

    #[tokio::test]
    async fn test_login_navigates_to_dashboard() {
        let mut server = mockito::Server::new_async().await;
        let jwt = token(3600);
        server
            .mock("POST", "/login")
            .with_body(serde_json::json!({ "access_token": jwt }).to_string())
            .create_async()
            .await;

        let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::new());
        let mut app = app_with(&server, store.clone());
        app.start();
        assert_eq!(app.route, Route::Entry);

        fill(&mut app.login_form, &["ada@example.com", "hunter2"]);
        app.attempt_login().await;

        assert_eq!(app.route, Route::Dashboard);
        assert!(app.session.is_authenticated());
        assert_eq!(store.load().unwrap().as_deref(), Some(jwt.as_str()));
        assert_eq!(app.login_form.value(LOGIN_PASSWORD), "");
        assert_eq!(app.config.last_email.as_deref(), Some("ada@example.com"));
    }

    #[tokio::test]
    async fn test_login_rejected_shows_form_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/login")
            .with_status(401)
            .with_body(r#"{"detail": "Incorrect email or password"}"#)
            .create_async()
            .await;

        let mut app = app_with(&server, Arc::new(MemoryTokenStore::new()));
        app.start();
        fill(&mut app.login_form, &["ada@example.com", "wrong"]);
        app.attempt_login().await;

        assert_eq!(app.route, Route::Entry);
        assert_eq!(app.login_form.error.as_deref(), Some("Invalid email or password"));
    }

    #[tokio::test]
    async fn test_login_requires_fields() {
        let server = mockito::Server::new_async().await;
        let mut app = app_with(&server, Arc::new(MemoryTokenStore::new()));
        app.start();
        app.attempt_login().await;
        assert_eq!(app.login_form.error.as_deref(), Some("Email is required"));
    }

    #[tokio::test]
    async fn test_register_surfaces_backend_detail() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/register")
            .with_status(400)
            .with_body(r#"{"detail": "Email already registered"}"#)
            .create_async()
            .await;

        let mut app = app_with(&server, Arc::new(MemoryTokenStore::new()));
        app.start();
        app.toggle_entry_mode();
        fill(&mut app.register_form, &["ada@example.com", "ada", "pw", "pw"]);
        app.submit_entry().await;

        assert_eq!(app.route, Route::Entry);
        assert_eq!(app.register_form.error.as_deref(), Some("Email already registered"));
    }

    #[tokio::test]
    async fn test_unauthorized_load_clears_session_without_notice() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/phone-numbers")
            .with_status(401)
            .create_async()
            .await;

        let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::with_token(token(3600)));
        let mut app = app_with(&server, store.clone());
        app.session.restore();
        app.navigate(Route::PhoneNumbers);
        recv_task(&mut app).await;

        assert_eq!(app.route, Route::Entry);
        assert!(!app.session.is_authenticated());
        assert!(store.load().unwrap().is_none());
        assert!(app.notice.is_none());
    }

    #[tokio::test]
    async fn test_failed_load_notifies_and_empties_list() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/assistants")
            .with_status(500)
            .with_body("Internal Server Error")
            .create_async()
            .await;

        let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::with_token(token(3600)));
        let mut app = app_with(&server, store);
        app.session.restore();
        app.assistants = vec![serde_json::from_str(r#"{"id": "stale"}"#).unwrap()];
        app.navigate(Route::Assistants);
        recv_task(&mut app).await;

        assert_eq!(app.route, Route::Assistants);
        assert!(app.assistants.is_empty());
        let notice = app.notice.as_ref().unwrap();
        assert!(notice.is_error);
        assert_eq!(notice.text, "Failed to load assistants");
    }

    #[tokio::test]
    async fn test_results_from_old_session_are_dropped() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/assistants")
            .with_body(r#"[{"id": "a1"}]"#)
            .create_async()
            .await;

        let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::with_token(token(3600)));
        let mut app = app_with(&server, store);
        app.session.restore();
        app.navigate(Route::Assistants);
        app.logout();
        recv_task(&mut app).await;

        assert_eq!(app.route, Route::Entry);
        assert!(app.assistants.is_empty());
    }

    #[tokio::test]
    async fn test_create_and_delete_assistant() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/assistants")
            .with_body(r#"{"id": "a9", "name": "Sales"}"#)
            .create_async()
            .await;
        server
            .mock("DELETE", "/assistants/a9")
            .with_body("")
            .create_async()
            .await;

        let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::with_token(token(3600)));
        let mut app = app_with(&server, store);
        app.session.restore();
        app.route = Route::Assistants;

        app.start_create();
        assert_eq!(app.state, AppState::Editing);
        app.save_editor().await;
        assert_eq!(
            app.editor.as_ref().unwrap().form().error.as_deref(),
            Some("Name is required")
        );

        fill(app.editor.as_mut().unwrap().form_mut(), &["Sales", "Sell."]);
        app.save_editor().await;
        assert!(app.editor.is_none());
        assert_eq!(app.assistants.len(), 1);

        app.request_delete();
        assert_eq!(app.state, AppState::ConfirmingDelete);
        app.confirm_delete().await;
        assert!(app.assistants.is_empty());
        assert_eq!(app.state, AppState::Normal);
    }

    #[tokio::test]
    async fn test_save_failure_keeps_dialog_open() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("PATCH", "/phone-numbers/pn1")
            .with_status(422)
            .with_body(r#"{"detail": [{"msg": "invalid phone number"}]}"#)
            .create_async()
            .await;

        let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::with_token(token(3600)));
        let mut app = app_with(&server, store);
        app.session.restore();
        app.route = Route::PhoneNumbers;
        app.phone_numbers = vec![serde_json::from_str(
            r#"{"id": "pn1", "number": "+14155551234", "provider": "twilio"}"#,
        )
        .unwrap()];

        app.start_edit();
        let editor = app.editor.as_mut().unwrap();
        editor.cycle_provider();
        assert!(matches!(editor, Editor::PhoneNumber { provider: Provider::Twilio, .. }));

        app.save_editor().await;
        assert_eq!(app.state, AppState::Editing);
        assert_eq!(
            app.editor.as_ref().unwrap().form().error.as_deref(),
            Some("invalid phone number")
        );
    }

    #[tokio::test]
    async fn test_call_logs_preselect_latest_conversation() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/messages")
            .with_body(
                r#"{"Bot1": [[{"role": "user", "message": "old", "time": 10}],
                             [{"role": "user", "message": "hi", "time": 50},
                              {"role": "assistant", "message": "hello", "time": 40}]],
                    "Bot2": []}"#,
            )
            .create_async()
            .await;

        let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::with_token(token(3600)));
        let mut app = app_with(&server, store);
        app.session.restore();
        app.navigate(Route::CallLogs);
        recv_task(&mut app).await;

        assert_eq!(app.selected_log_assistant(), Some("Bot1"));
        assert_eq!(app.log_conversation_selection, 2);
        let texts: Vec<String> = app.visible_messages().into_iter().map(|m| m.message).collect();
        assert_eq!(texts, vec!["hello", "hi"]);

        app.select_log_conversation(0);
        assert_eq!(app.visible_messages().len(), 3);

        app.select_log_assistant(1);
        assert_eq!(app.selected_log_assistant(), Some("Bot2"));
        assert_eq!(app.log_conversation_selection, 0);
        assert!(app.visible_messages().is_empty());

        let stats = app.log_stats();
        assert_eq!(stats.active_assistants, 1);
        assert_eq!(stats.total_messages, 3);
    }

    #[tokio::test]
    async fn test_refresh_keeps_call_log_selection() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", "/messages")
            .with_body(
                r#"{"Bot1": [[{"role": "user", "message": "a", "time": 1}]],
                    "Bot2": [[{"role": "user", "message": "old", "time": 10}],
                             [{"role": "user", "message": "new", "time": 50}]]}"#,
            )
            .create_async()
            .await;

        let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::with_token(token(3600)));
        let mut app = app_with(&server, store);
        app.session.restore();
        app.navigate(Route::CallLogs);
        recv_task(&mut app).await;

        app.select_log_assistant(1);
        app.select_log_conversation(1);
        assert_eq!(app.selected_log_assistant(), Some("Bot2"));

        app.refresh();
        recv_task(&mut app).await;
        assert_eq!(app.selected_log_assistant(), Some("Bot2"));
        assert_eq!(app.log_conversation_selection, 1);

        // Assistant gone after reload
        first.remove_async().await;
        server
            .mock("GET", "/messages")
            .with_body(r#"{"Bot1": [[{"role": "user", "message": "a", "time": 1}]]}"#)
            .create_async()
            .await;
        app.refresh();
        recv_task(&mut app).await;
        assert_eq!(app.selected_log_assistant(), Some("Bot1"));
        assert_eq!(app.log_conversation_selection, 1);
    }

    #[tokio::test]
    async fn test_guard_redirects_when_token_expires_mid_session() {
        let server = mockito::Server::new_async().await;
        let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::new());
        let mut app = app_with(&server, store.clone());
        app.start();
        app.session.login(&token(-1)).unwrap();
        assert!(store.load().unwrap().is_some());
        app.route = Route::Assistants;

        assert_eq!(app.enforce_guard(), GuardDecision::Redirect(Route::Entry));
        assert_eq!(app.route, Route::Entry);
        assert!(app.session.token().is_none());
        assert!(store.load().unwrap().is_none());

        // A later launch finds nothing to restore
        let mut next = Session::new(store.clone());
        next.restore();
        assert!(!next.is_authenticated());
        assert_eq!(app.enforce_guard(), GuardDecision::Render);
    }

    #[test]
    fn test_clamp_selection() {
        assert_eq!(clamp_selection(5, 3), 2);
        assert_eq!(clamp_selection(1, 3), 1);
        assert_eq!(clamp_selection(4, 0), 0);
    }
}
