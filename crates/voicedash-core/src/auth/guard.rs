use super::Session;

/// Screens of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Public entry screen (login / register)
    Entry,
    Dashboard,
    Assistants,
    PhoneNumbers,
    CallLogs,
}

impl Route {
    /// Protected screens in navigation order.
    pub const PROTECTED: [Route; 4] = [
        Route::Dashboard,
        Route::Assistants,
        Route::PhoneNumbers,
        Route::CallLogs,
    ];

    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Entry)
    }

    /// URL-style path for this screen, shown in the title bar.
    pub fn path(&self) -> &'static str {
        match self {
            Route::Entry => "/",
            Route::Dashboard => "/dashboard",
            Route::Assistants => "/assistants",
            Route::PhoneNumbers => "/phone-numbers",
            Route::CallLogs => "/call-logs",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Entry => "Sign in",
            Route::Dashboard => "Dashboard",
            Route::Assistants => "Assistants",
            Route::PhoneNumbers => "Phone Numbers",
            Route::CallLogs => "Call Logs",
        }
    }

    /// Next protected screen (wrapping around)
    pub fn next(&self) -> Self {
        match self {
            Route::Entry => Route::Dashboard,
            Route::Dashboard => Route::Assistants,
            Route::Assistants => Route::PhoneNumbers,
            Route::PhoneNumbers => Route::CallLogs,
            Route::CallLogs => Route::Dashboard,
        }
    }

    /// Previous protected screen (wrapping around)
    pub fn prev(&self) -> Self {
        match self {
            Route::Entry => Route::CallLogs,
            Route::Dashboard => Route::CallLogs,
            Route::Assistants => Route::Dashboard,
            Route::PhoneNumbers => Route::Assistants,
            Route::CallLogs => Route::PhoneNumbers,
        }
    }
}

/// What the UI should do with a route given the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Startup check still running: show a placeholder
    Pending,
    /// No valid session: navigate here and render nothing
    Redirect(Route),
    /// Render the requested screen
    Render,
}

/// Decide whether `route` may be rendered.
///
/// Cheap enough to run on every frame, which is how changes in session
/// state are picked up.
pub fn guard(session: &Session, route: Route) -> GuardDecision {
    if !route.is_protected() {
        return GuardDecision::Render;
    }
    if session.is_loading() {
        return GuardDecision::Pending;
    }
    if !session.is_authenticated() {
        return GuardDecision::Redirect(Route::Entry);
    }
    GuardDecision::Render
}
