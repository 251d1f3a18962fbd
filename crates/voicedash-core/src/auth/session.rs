use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::guard::Route;
use super::store::TokenStore;
use super::token::{Claims, Credential};
use super::AuthError;

/// Session context for the dashboard.
///
/// Owns the in-memory credential and a handle to the persistent token store.
/// It is created once at startup and passed explicitly to the UI and to
/// result settling; nothing reaches it through globals.
pub struct Session {
    store: Arc<dyn TokenStore>,
    credential: Option<Credential>,
    loading: bool,
}

impl Session {
    /// Create a session that has not yet looked at persisted state.
    /// `is_loading()` stays true until [`Session::restore`] runs.
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self {
            store,
            credential: None,
            loading: true,
        }
    }

    /// Shared handle to the token store, for the API client.
    pub fn store(&self) -> Arc<dyn TokenStore> {
        Arc::clone(&self.store)
    }

    /// Startup check: hydrate from the persisted token if it is still valid,
    /// otherwise discard it. Never fails; problems mean "logged out".
    pub fn restore(&mut self) {
        self.restore_at(Utc::now().timestamp());
    }

    pub fn restore_at(&mut self, now: i64) {
        self.credential = None;

        match self.store.load() {
            Ok(Some(token)) => match Credential::decode(&token) {
                Ok(credential) if !credential.is_expired_at(now) => {
                    debug!(sub = %credential.claims.sub, "Restored session from stored token");
                    self.credential = Some(credential);
                }
                Ok(credential) => {
                    debug!(exp = credential.claims.exp, "Stored token expired, discarding");
                    self.discard_stored();
                }
                Err(e) => {
                    debug!(error = %e, "Stored token undecodable, discarding");
                    self.discard_stored();
                }
            },
            Ok(None) => debug!("No stored token"),
            Err(e) => warn!(error = %e, "Failed to read stored token"),
        }

        self.loading = false;
    }

    /// Persist `token` and make it the current session.
    ///
    /// The raw token is written before decoding, so an undecodable token is
    /// still stored but leaves the in-memory session empty; the next startup
    /// discards it.
    pub fn login(&mut self, token: &str) -> Result<Route, AuthError> {
        if let Err(e) = self.store.save(token) {
            warn!(error = %e, "Failed to persist token");
        }

        match Credential::decode(token) {
            Ok(credential) => {
                info!(sub = %credential.claims.sub, "Logged in");
                self.credential = Some(credential);
                self.loading = false;
                Ok(Route::Dashboard)
            }
            Err(e) => {
                self.credential = None;
                Err(e)
            }
        }
    }

    /// Drop the session and return the public entry route.
    pub fn logout(&mut self) -> Route {
        info!("Logged out");
        self.credential = None;
        self.discard_stored();
        Route::Entry
    }

    /// Called when the credential stops being usable: the backend answered
    /// 401, or it expired while the app was running. Removes the stored
    /// token once and returns the public entry route.
    pub fn invalidate(&mut self) -> Route {
        warn!("Credential no longer valid, clearing session");
        self.credential = None;
        self.discard_stored();
        Route::Entry
    }

    /// True iff a token is present and its expiry has not passed.
    /// Derived on every call; nothing watches the clock.
    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated_at(Utc::now().timestamp())
    }

    pub fn is_authenticated_at(&self, now: i64) -> bool {
        self.credential
            .as_ref()
            .map(|c| !c.is_expired_at(now))
            .unwrap_or(false)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn token(&self) -> Option<&str> {
        self.credential.as_ref().map(|c| c.token.as_str())
    }

    pub fn claims(&self) -> Option<&Claims> {
        self.credential.as_ref().map(|c| &c.claims)
    }

    pub fn subject(&self) -> Option<&str> {
        self.claims().map(|c| c.sub.as_str())
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.claims().and_then(|c| c.expires_at())
    }

    /// Minutes left on the token, for the status bar.
    pub fn minutes_until_expiry(&self) -> i64 {
        self.expires_at()
            .map(|exp| (exp - Utc::now()).num_minutes().max(0))
            .unwrap_or(0)
    }

    fn discard_stored(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear stored token");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::auth::store::MemoryTokenStore;
    use crate::auth::token::test_token;

    /// Memory store that counts clears.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryTokenStore,
        clears: AtomicUsize,
    }

    impl TokenStore for CountingStore {
        fn load(&self) -> anyhow::Result<Option<String>> {
            self.inner.load()
        }
        fn save(&self, token: &str) -> anyhow::Result<()> {
            self.inner.save(token)
        }
        fn clear(&self) -> anyhow::Result<()> {
            self.clears.fetch_add(1, Ordering::SeqCst);
            self.inner.clear()
        }
    }

    fn now() -> i64 {
        Utc::now().timestamp()
    }

    #[test]
    fn test_expired_token_is_not_authenticated() {
        let store = Arc::new(MemoryTokenStore::new());
        let mut session = Session::new(store);
        for offset in [1, 10, 3600, 86_400 * 365] {
            let token = test_token("ada@example.com", now() - offset);
            let _ = session.login(&token);
            assert!(!session.is_authenticated(), "exp = now - {}", offset);
        }
    }

    #[test]
    fn test_unexpired_token_is_authenticated_after_login() {
        let store = Arc::new(MemoryTokenStore::new());
        let mut session = Session::new(store);
        for offset in [60, 3600, 86_400 * 365] {
            let token = test_token("ada@example.com", now() + offset);
            assert_eq!(session.login(&token).unwrap(), Route::Dashboard);
            assert!(session.is_authenticated());
        }
    }

    #[test]
    fn test_expiry_equal_to_now_is_authenticated() {
        let mut session = Session::new(Arc::new(MemoryTokenStore::new()));
        session.login(&test_token("x", 1_000)).unwrap();
        assert!(session.is_authenticated_at(1_000));
        assert!(!session.is_authenticated_at(1_001));
    }

    #[test]
    fn test_expiry_detected_lazily() {
        let mut session = Session::new(Arc::new(MemoryTokenStore::new()));
        session.login(&test_token("x", 1_000)).unwrap();
        assert!(session.is_authenticated_at(999));
        // Same session, later clock: no timer needed
        assert!(!session.is_authenticated_at(2_000));
        assert!(session.token().is_some());
    }

    #[test]
    fn test_login_persists_raw_token() {
        let store = Arc::new(MemoryTokenStore::new());
        let mut session = Session::new(store.clone());
        let token = test_token("ada@example.com", now() + 600);
        session.login(&token).unwrap();

        assert_eq!(store.load().unwrap(), Some(token.clone()));
        assert_eq!(session.token(), Some(token.as_str()));
        assert_eq!(session.subject(), Some("ada@example.com"));
        assert!(!session.is_loading());
    }

    #[test]
    fn test_malformed_login_is_no_session() {
        let store = Arc::new(MemoryTokenStore::new());
        let mut session = Session::new(store.clone());

        assert!(session.login("abc").is_err());
        assert!(!session.is_authenticated());
        assert_eq!(store.load().unwrap().as_deref(), Some("abc"));

        // Next startup throws it away
        let mut next = Session::new(store.clone());
        next.restore();
        assert!(!next.is_authenticated());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_logout_clears_everything() {
        let store = Arc::new(MemoryTokenStore::new());
        let mut session = Session::new(store.clone());
        session.login(&test_token("ada@example.com", now() + 600)).unwrap();

        assert_eq!(session.logout(), Route::Entry);
        assert_eq!(store.load().unwrap(), None);
        assert!(!session.is_authenticated());
        assert!(session.token().is_none());
    }

    #[test]
    fn test_restore_hydrates_valid_token() {
        let token = test_token("ada@example.com", now() + 600);
        let store = Arc::new(MemoryTokenStore::with_token(token.clone()));
        let mut session = Session::new(store.clone());
        assert!(session.is_loading());

        session.restore();
        assert!(!session.is_loading());
        assert!(session.is_authenticated());
        assert_eq!(store.load().unwrap(), Some(token));
    }

    #[test]
    fn test_restore_discards_expired_token() {
        let store = Arc::new(MemoryTokenStore::with_token(test_token("x", now() - 10)));
        let mut session = Session::new(store.clone());
        session.restore();

        assert!(!session.is_loading());
        assert!(!session.is_authenticated());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_restore_with_nothing_stored() {
        let store = Arc::new(CountingStore::default());
        let mut session = Session::new(store.clone());
        session.restore();
        assert!(!session.is_authenticated());
        assert_eq!(store.clears.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_invalidate_clears_store_once() {
        let store = Arc::new(CountingStore::default());
        let mut session = Session::new(store.clone());
        session.login(&test_token("x", now() + 600)).unwrap();

        assert_eq!(session.invalidate(), Route::Entry);
        assert_eq!(store.clears.load(Ordering::SeqCst), 1);
        assert_eq!(store.load().unwrap(), None);
        assert!(!session.is_authenticated());
    }
}
