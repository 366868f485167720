//! Application state management for Classbook.
//!
//! This module contains the core `App` struct that manages UI state, the
//! login form, the authenticated session, cached bookings, and coordination
//! with background tasks (session bootstrap and bookings refresh).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use classbook_core::api::{AuthError, StudioClient};
use classbook_core::auth::{BootstrapError, PersistedTokens, Session, Submission, TokenStore};
use classbook_core::cache::CacheManager;
use classbook_core::config::Config;
use classbook_core::models::{sort_by_start, Booking};

use crate::login::{self, AuthEvent, BootstrapRun};

// ============================================================================
// Constants
// ============================================================================

/// Maximum length for username input.
/// Usernames are email addresses; 64 chars covers nearly all of them.
const MAX_USERNAME_LENGTH: usize = 64;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Number of rows to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

/// Environment variables that prefill the login form
const USERNAME_ENV: &str = "CLASSBOOK_USERNAME";
const PASSWORD_ENV: &str = "CLASSBOOK_PASSWORD";

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    LoggingIn,
    Authenticating,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFocus {
    Username,
    Password,
    Button,
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Messages from background tasks back to the UI loop.
pub enum BackgroundResult {
    /// Progress and outcome of bootstrap run `generation`
    Auth { generation: u64, event: AuthEvent },
    /// Bookings fetched successfully
    Bookings(Vec<Booking>),
    /// A bookings refresh failed
    Error(String),
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    pub store: Arc<dyn TokenStore>,
    pub api: StudioClient,
    pub cache: CacheManager,

    // UI State
    pub state: AppState,
    /// State to return to when the help or quit overlay closes
    resume_state: AppState,

    // Login form state
    pub login_username: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,

    /// The bootstrap run currently allowed to drive the UI
    bootstrap: Option<BootstrapRun>,
    /// Generation of the most recently spawned run
    bootstrap_generation: u64,

    // Session and data
    pub session: Option<Session>,
    pub bookings: Vec<Booking>,
    pub bookings_age: Option<String>,
    pub booking_selection: usize,
    pub fetching: bool,

    /// Set after a failure that may succeed if tried again
    pub retry_available: bool,

    // Background task channel
    bg_rx: mpsc::UnboundedReceiver<BackgroundResult>,
    bg_tx: mpsc::UnboundedSender<BackgroundResult>,

    // Status message
    pub status_message: Option<String>,
}

impl App {
    /// Create a new application instance
    pub fn new() -> Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };

        let cache_dir = config.cache_dir().unwrap_or_else(|_| PathBuf::from("./cache"));
        debug!(?cache_dir, storage = ?config.token_storage, "Cache directory configured");

        let store = config.token_store(&cache_dir);
        let api = StudioClient::new()?.with_booking_window(config.booking_window_days());
        let cache = CacheManager::new(cache_dir)?;

        Ok(Self::with_services(config, store, api, cache))
    }

    /// Assemble the app around already constructed services.
    pub fn with_services(
        config: Config,
        store: Arc<dyn TokenStore>,
        api: StudioClient,
        cache: CacheManager,
    ) -> Self {
        let (bg_tx, bg_rx) = mpsc::unbounded_channel();

        let login_username = std::env::var(USERNAME_ENV)
            .ok()
            .or_else(|| config.last_username.clone())
            .unwrap_or_default();
        let login_password = std::env::var(PASSWORD_ENV).unwrap_or_default();

        Self {
            config,
            store,
            api,
            cache,

            state: AppState::Normal,
            resume_state: AppState::Normal,

            login_username,
            login_password,
            login_focus: LoginFocus::Username,
            login_error: None,
            bootstrap: None,
            bootstrap_generation: 0,

            session: None,
            bookings: Vec::new(),
            bookings_age: None,
            booking_selection: 0,
            fetching: false,
            retry_available: false,

            bg_rx,
            bg_tx,

            status_message: None,
        }
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Greeting shown once logged in.
    pub fn greeting(&self) -> Option<String> {
        self.session
            .as_ref()
            .map(|s| format!("Thanks for logging in {}!", s.first_name()))
    }

    /// Account shown in the title bar: the member's email, else the login name.
    pub fn account_label(&self) -> Option<&str> {
        self.session
            .as_ref()
            .map(|s| s.email().unwrap_or(&s.username))
    }

    // =========================================================================
    // State and overlays
    // =========================================================================

    fn is_overlay(state: AppState) -> bool {
        matches!(state, AppState::ShowingHelp | AppState::ConfirmingQuit)
    }

    /// Move to `next`, or queue it behind an open help or quit overlay.
    fn set_state(&mut self, next: AppState) {
        if Self::is_overlay(self.state) {
            self.resume_state = next;
        } else {
            self.state = next;
        }
    }

    pub fn open_overlay(&mut self, overlay: AppState) {
        if !Self::is_overlay(self.state) {
            self.resume_state = self.state;
        }
        self.state = overlay;
    }

    pub fn close_overlay(&mut self) {
        if Self::is_overlay(self.state) {
            self.state = self.resume_state;
        }
    }

    /// Start a fresh bootstrap run, aborting any previous one. Events from
    /// older runs are dropped in `check_background_tasks`.
    pub fn start_bootstrap(&mut self) {
        if let Some(previous) = self.bootstrap.take() {
            previous.abort();
        }
        self.bootstrap_generation += 1;
        info!(generation = self.bootstrap_generation, "Starting session bootstrap");
        self.retry_available = false;
        self.bootstrap = Some(login::spawn_bootstrap(
            self.bootstrap_generation,
            Arc::clone(&self.store),
            Arc::new(self.api.clone()),
            self.bg_tx.clone(),
        ));
        if self.status_message.is_none() {
            self.status_message = Some("Checking for a saved session...".to_string());
        }
    }

    /// Show the login overlay
    pub fn start_login(&mut self) {
        self.set_state(AppState::LoggingIn);
        self.login_focus = if self.login_username.is_empty() {
            LoginFocus::Username
        } else {
            LoginFocus::Password
        };
    }

    /// Submit the login form to the bootstrap task
    pub fn submit_login(&mut self) {
        if self.login_username.trim().is_empty() || self.login_password.is_empty() {
            self.login_error = Some("Username and password required".to_string());
            return;
        }

        let submission = Submission::new(self.login_username.trim(), self.login_password.clone());
        let sent = self
            .bootstrap
            .as_ref()
            .map(|run| run.submit_tx.send(submission).is_ok())
            .unwrap_or(false);

        if !sent {
            // The bootstrap task is gone; start over and keep the form up
            warn!("Bootstrap task not running, restarting");
            self.login_error = Some("Login service restarted, please submit again".to_string());
            self.start_bootstrap();
            return;
        }

        self.login_error = None;
        self.state = AppState::Authenticating;
    }

    /// Retry after a transient failure
    pub fn retry(&mut self) {
        if self.retry_available {
            self.status_message = None;
            self.start_bootstrap();
        }
    }

    /// Forget saved tokens and cached bookings, then ask for credentials again.
    pub fn logout(&mut self) {
        info!("Logging out");
        // Stop an in-flight login first so it cannot write tokens back
        if let Some(run) = self.bootstrap.take() {
            run.abort();
        }
        if let Err(e) = PersistedTokens::clear(self.store.as_ref()) {
            warn!(error = %e, "Failed to clear saved tokens");
        }
        if let Err(e) = self.cache.clear_bookings() {
            warn!(error = %e, "Failed to clear cached bookings");
        }
        self.session = None;
        self.bookings.clear();
        self.bookings_age = None;
        self.booking_selection = 0;
        self.login_password.clear();
        self.status_message = Some("Logged out".to_string());
        self.start_bootstrap();
    }

    /// Cancel a pending login (the bootstrap sees its form closed).
    pub fn cancel_login(&mut self) {
        self.bootstrap = None;
    }

    fn handle_auth_event(&mut self, event: AuthEvent) {
        match event {
            AuthEvent::ShowForm => {
                debug!("Bootstrap requested the login form");
                self.status_message = None;
                self.start_login();
            }
            AuthEvent::Status(status) => {
                if !status.is_terminal() && self.state != AppState::LoggingIn {
                    self.set_state(AppState::Authenticating);
                }
                self.status_message = Some(status.to_string());
            }
            AuthEvent::Finished(Ok(session)) => self.on_logged_in(session),
            AuthEvent::Finished(Err(e)) => self.on_login_failed(e),
        }
    }

    fn on_logged_in(&mut self, session: Session) {
        info!(member = %session.member_uuid(), "Session ready");
        self.bootstrap = None;
        self.login_password.clear();
        self.login_error = None;
        self.set_state(AppState::Normal);

        if self.config.last_username.as_deref() != Some(session.username.as_str()) {
            self.config.last_username = Some(session.username.clone());
            if let Err(e) = self.config.save() {
                warn!(error = %e, "Failed to save config");
            }
        }

        self.session = Some(session);
        self.refresh_bookings();
    }

    fn on_login_failed(&mut self, e: BootstrapError) {
        self.bootstrap = None;

        if matches!(e, BootstrapError::Cancelled) {
            debug!("Bootstrap cancelled");
            return;
        }

        error!(error = %e, "Bootstrap failed");

        if e.from_saved_tokens() {
            if e.is_retryable() {
                // Keep the saved tokens; the service may just be unreachable
                self.set_state(AppState::Normal);
                self.retry_available = true;
                self.status_message = Some(format!("Error: {} - press [r] to retry", e));
                return;
            }

            if let Err(clear_err) = PersistedTokens::clear(self.store.as_ref()) {
                warn!(error = %clear_err, "Failed to clear rejected tokens");
            }
            // Unreadable tokens are just a miss; anything else was rejected
            self.login_error = match e {
                BootstrapError::Auth {
                    source: AuthError::MalformedToken(_),
                    ..
                } => None,
                _ => Some("Your saved session has expired, please log in again".to_string()),
            };
        } else if e.is_retryable() {
            // Keep the password so Enter on the button retries right away
            self.login_error = Some(format!("{} - press Enter to try again", e));
        } else {
            self.login_password.clear();
            self.login_error = Some(e.to_string());
        }

        self.status_message = None;
        self.set_state(AppState::Normal);
        self.start_bootstrap();
    }

    // =========================================================================
    // Bookings
    // =========================================================================

    /// Load bookings from cache for display behind the login form
    pub fn load_from_cache(&mut self) {
        match self.cache.load_bookings() {
            Ok(Some(cached)) => {
                self.bookings_age = Some(if cached.is_stale() {
                    format!("{} (stale)", cached.age_display())
                } else {
                    cached.age_display()
                });
                self.bookings = cached.data;
                sort_by_start(&mut self.bookings);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Ignoring unreadable bookings cache"),
        }
    }

    /// Fetch bookings in the background
    pub fn refresh_bookings(&mut self) {
        let Some(session) = self.session.clone() else {
            self.status_message = Some("Log in to refresh bookings".to_string());
            return;
        };
        if session.is_expired() {
            // The saved refresh token renews it; bookings follow on success
            info!("Session expired, renewing before fetching bookings");
            self.session = None;
            self.status_message = Some("Session expired, renewing...".to_string());
            self.start_bootstrap();
            return;
        }
        if self.fetching {
            return;
        }

        self.fetching = true;
        self.status_message = Some("Refreshing bookings...".to_string());

        let api = self.api.clone();
        let tx = self.bg_tx.clone();
        tokio::spawn(async move {
            let result = match api.fetch_bookings(&session).await {
                Ok(bookings) => BackgroundResult::Bookings(bookings),
                Err(e) => {
                    error!(error = %e, "Failed to fetch bookings");
                    BackgroundResult::Error(e.to_string())
                }
            };
            if tx.send(result).is_err() {
                debug!("UI closed before bookings arrived");
            }
        });
    }

    fn on_bookings(&mut self, mut bookings: Vec<Booking>) {
        self.fetching = false;
        sort_by_start(&mut bookings);
        if let Err(e) = self.cache.save_bookings(&bookings) {
            warn!(error = %e, "Failed to cache bookings");
        }
        info!(count = bookings.len(), "Bookings updated");
        self.bookings = bookings;
        self.bookings_age = Some("just now".to_string());
        self.booking_selection = self
            .booking_selection
            .min(self.bookings.len().saturating_sub(1));
        self.status_message = None;
    }

    /// Drain results from background tasks.
    pub fn check_background_tasks(&mut self) {
        while let Ok(result) = self.bg_rx.try_recv() {
            match result {
                BackgroundResult::Auth { generation, event } => {
                    if generation == self.bootstrap_generation && self.bootstrap.is_some() {
                        self.handle_auth_event(event);
                    } else {
                        debug!(generation, current = self.bootstrap_generation, "Dropping event from a replaced bootstrap run");
                    }
                }
                BackgroundResult::Bookings(bookings) => self.on_bookings(bookings),
                BackgroundResult::Error(msg) => {
                    self.fetching = false;
                    self.status_message = Some(format!("Error: {}", msg));
                }
            }
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn select_next(&mut self, step: usize) {
        let last = self.bookings.len().saturating_sub(1);
        self.booking_selection = (self.booking_selection + step).min(last);
    }

    pub fn select_prev(&mut self, step: usize) {
        self.booking_selection = self.booking_selection.saturating_sub(step);
    }

    pub fn select_first(&mut self) {
        self.booking_selection = 0;
    }

    pub fn select_last(&mut self) {
        self.booking_selection = self.bookings.len().saturating_sub(1);
    }
}

// ============================================================================
// Input validation
// ============================================================================

fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a username character should be accepted
pub fn can_add_username_char(current_len: usize, c: char) -> bool {
    current_len < MAX_USERNAME_LENGTH && is_valid_input_char(c)
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use classbook_core::auth::store::{ACCESS_TOKEN, ID_TOKEN, USERNAME};
    use classbook_core::auth::{CredentialMethod, MemoryTokenStore, Tokens};
    use classbook_core::models::Member;

    fn test_app(store: Arc<MemoryTokenStore>) -> (App, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheManager::new(dir.path().to_path_buf()).unwrap();
        let mut app = App::with_services(
            Config::default(),
            store,
            StudioClient::new().unwrap(),
            cache,
        );
        app.login_username = String::new();
        app.login_password = String::new();
        (app, dir)
    }

    fn booking(name: &str, start: &str) -> Booking {
        serde_json::from_str(&format!(
            r#"{{"status":"Booked","class":{{"name":"{}","startDateTime":"{}"}}}}"#,
            name, start
        ))
        .unwrap()
    }

    fn session() -> Session {
        Session {
            username: "a@b.com".into(),
            member: Member {
                member_uuid: "m-1".into(),
                first_name: "Ada".into(),
                email: None,
            },
            tokens: Tokens {
                access_token: "AT".into(),
                id_token: "IT".into(),
                refresh_token: None,
            },
            expires_at: None,
        }
    }

    #[test]
    fn test_account_label_prefers_email() {
        let (mut app, _dir) = test_app(Arc::new(MemoryTokenStore::new()));
        assert_eq!(app.account_label(), None);

        app.session = Some(session());
        assert_eq!(app.account_label(), Some("a@b.com"));

        let mut with_email = session();
        with_email.member.email = Some("ada@studio.com".into());
        app.session = Some(with_email);
        assert_eq!(app.account_label(), Some("ada@studio.com"));
    }

    #[test]
    fn test_can_add_username_char() {
        assert!(can_add_username_char(0, 'a'));
        assert!(can_add_username_char(63, '@'));
        assert!(!can_add_username_char(64, 'a'));
        assert!(!can_add_username_char(0, '\x00'));
        assert!(!can_add_username_char(0, '\n'));
        assert!(!can_add_username_char(0, '\t'));
    }

    #[test]
    fn test_can_add_password_char() {
        assert!(can_add_password_char(0, 'a'));
        assert!(can_add_password_char(127, '!'));
        assert!(!can_add_password_char(128, 'a'));
        assert!(!can_add_password_char(0, '\r'));
    }

    #[tokio::test]
    async fn test_submit_requires_both_fields() {
        let (mut app, _dir) = test_app(Arc::new(MemoryTokenStore::new()));
        app.state = AppState::LoggingIn;
        app.login_username = "a@b.com".into();

        app.submit_login();

        assert_eq!(app.login_error.as_deref(), Some("Username and password required"));
        assert_eq!(app.state, AppState::LoggingIn);
    }

    #[tokio::test]
    async fn test_show_form_event_opens_login() {
        let (mut app, _dir) = test_app(Arc::new(MemoryTokenStore::new()));
        app.handle_auth_event(AuthEvent::ShowForm);
        assert_eq!(app.state, AppState::LoggingIn);
        assert_eq!(app.login_focus, LoginFocus::Username);
    }

    #[tokio::test]
    async fn test_rejected_saved_tokens_are_cleared() {
        let store = Arc::new(MemoryTokenStore::with_values([
            (ACCESS_TOKEN, "AT1"),
            (ID_TOKEN, "IT1"),
            (USERNAME, "a@b.com"),
        ]));
        let (mut app, _dir) = test_app(store.clone());

        app.on_login_failed(BootstrapError::Auth {
            method: CredentialMethod::Tokens,
            source: AuthError::TokenExpired,
        });

        assert!(store.snapshot().is_empty());
        assert!(app
            .login_error
            .as_deref()
            .is_some_and(|m| m.contains("expired")));
        assert!(app.bootstrap.is_some());
    }

    #[tokio::test]
    async fn test_network_failure_with_saved_tokens_offers_retry() {
        let store = Arc::new(MemoryTokenStore::with_values([
            (ACCESS_TOKEN, "AT1"),
            (ID_TOKEN, "IT1"),
            (USERNAME, "a@b.com"),
        ]));
        let (mut app, _dir) = test_app(store.clone());

        app.on_login_failed(BootstrapError::Auth {
            method: CredentialMethod::Tokens,
            source: AuthError::Network("connection refused".into()),
        });

        assert!(app.retry_available);
        assert_eq!(store.snapshot().len(), 3);
        assert!(app.bootstrap.is_none());
    }

    #[tokio::test]
    async fn test_malformed_saved_tokens_are_a_quiet_miss() {
        let store = Arc::new(MemoryTokenStore::with_values([
            (ACCESS_TOKEN, "AT1"),
            (ID_TOKEN, "not-a-jwt"),
            (USERNAME, "a@b.com"),
        ]));
        let (mut app, _dir) = test_app(store.clone());

        app.on_login_failed(BootstrapError::Auth {
            method: CredentialMethod::Tokens,
            source: AuthError::MalformedToken("expected 3 segments".into()),
        });

        assert!(store.snapshot().is_empty());
        assert_eq!(app.login_error, None);
        assert!(app.bootstrap.is_some());
    }

    #[tokio::test]
    async fn test_results_from_a_replaced_run_are_ignored() {
        let store = Arc::new(MemoryTokenStore::new());
        let (mut app, _dir) = test_app(store.clone());
        app.start_bootstrap();
        let replaced = app.bootstrap_generation;

        app.logout();
        assert_ne!(app.bootstrap_generation, replaced);

        let stale = |event| BackgroundResult::Auth {
            generation: replaced,
            event,
        };
        app.bg_tx
            .send(stale(AuthEvent::Finished(Ok(session()))))
            .unwrap();
        app.bg_tx
            .send(stale(AuthEvent::Finished(Err(BootstrapError::Cancelled))))
            .unwrap();
        app.check_background_tasks();

        assert!(app.session.is_none());
        assert!(app.bootstrap.is_some());
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_current_run_result_is_applied() {
        let (mut app, _dir) = test_app(Arc::new(MemoryTokenStore::new()));
        app.start_bootstrap();
        let current = app.bootstrap_generation;

        app.bg_tx
            .send(BackgroundResult::Auth {
                generation: current,
                event: AuthEvent::ShowForm,
            })
            .unwrap();
        app.check_background_tasks();

        assert_eq!(app.state, AppState::LoggingIn);
    }

    #[tokio::test]
    async fn test_result_behind_quit_overlay_is_resumed() {
        let (mut app, _dir) = test_app(Arc::new(MemoryTokenStore::new()));
        app.state = AppState::Authenticating;
        app.open_overlay(AppState::ConfirmingQuit);

        app.handle_auth_event(AuthEvent::ShowForm);
        assert_eq!(app.state, AppState::ConfirmingQuit);

        app.close_overlay();
        assert_eq!(app.state, AppState::LoggingIn);
    }

    #[tokio::test]
    async fn test_expired_session_is_renewed_before_fetching() {
        let (mut app, _dir) = test_app(Arc::new(MemoryTokenStore::new()));
        let mut expired = session();
        expired.expires_at = Some(Utc::now() - Duration::minutes(5));
        app.session = Some(expired);

        app.refresh_bookings();

        assert!(!app.fetching);
        assert!(app.session.is_none());
        assert!(app.bootstrap.is_some());
    }

    #[tokio::test]
    async fn test_invalid_password_clears_field() {
        let (mut app, _dir) = test_app(Arc::new(MemoryTokenStore::new()));
        app.login_username = "a@b.com".into();
        app.login_password = "wrong".into();

        app.on_login_failed(BootstrapError::Auth {
            method: CredentialMethod::Password,
            source: AuthError::InvalidCredentials("Incorrect username or password.".into()),
        });

        assert!(app.login_password.is_empty());
        assert_eq!(app.login_username, "a@b.com");
        assert_eq!(
            app.login_error.as_deref(),
            Some("Incorrect username or password.")
        );
    }

    #[tokio::test]
    async fn test_bookings_are_sorted_and_cached() {
        let (mut app, _dir) = test_app(Arc::new(MemoryTokenStore::new()));
        app.session = Some(session());
        app.fetching = true;

        app.on_bookings(vec![
            booking("Later", "2024-05-03T09:00:00"),
            booking("Sooner", "2024-05-01T09:00:00"),
        ]);

        assert!(!app.fetching);
        assert_eq!(app.bookings[0].class_name(), "Sooner");
        assert_eq!(app.bookings_age.as_deref(), Some("just now"));
        let cached = app.cache.load_bookings().unwrap().unwrap();
        assert_eq!(cached.data.len(), 2);
    }

    #[tokio::test]
    async fn test_selection_bounds() {
        let (mut app, _dir) = test_app(Arc::new(MemoryTokenStore::new()));
        app.bookings = vec![
            booking("A", "2024-05-01T09:00:00"),
            booking("B", "2024-05-02T09:00:00"),
            booking("C", "2024-05-03T09:00:00"),
        ];

        app.select_next(PAGE_SCROLL_SIZE);
        assert_eq!(app.booking_selection, 2);
        app.select_prev(1);
        assert_eq!(app.booking_selection, 1);
        app.select_prev(PAGE_SCROLL_SIZE);
        assert_eq!(app.booking_selection, 0);
        app.select_last();
        assert_eq!(app.booking_selection, 2);
        app.select_first();
        assert_eq!(app.booking_selection, 0);
    }

    #[tokio::test]
    async fn test_logout_clears_everything() {
        let store = Arc::new(MemoryTokenStore::with_values([
            (ACCESS_TOKEN, "AT1"),
            (ID_TOKEN, "IT1"),
            (USERNAME, "a@b.com"),
        ]));
        let (mut app, _dir) = test_app(store.clone());
        app.session = Some(session());
        app.on_bookings(vec![booking("A", "2024-05-01T09:00:00")]);

        app.logout();

        assert!(store.snapshot().is_empty());
        assert!(app.session.is_none());
        assert!(app.bookings.is_empty());
        assert!(app.cache.load_bookings().unwrap().is_none());
        assert!(app.bootstrap.is_some());
    }
}
