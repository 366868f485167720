//! Session bootstrap: turn whatever credentials are available into an
//! authenticated session.
//!
//! The flow is a small state machine:
//!
//! ```text
//! Idle -> NeedCredentials -> Authenticating -> Authenticated
//!                                          \-> Failed
//! ```
//!
//! `NeedCredentials` is only entered when nothing resolves on the first try;
//! the bootstrapper then shows the login form once and awaits its next
//! submission. Authentication runs exactly once per bootstrap and is never
//! retried here. Retrying is the caller's decision.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::credentials::{CredentialMethod, CredentialSource, Submission};
use super::resolver::CredentialResolver;
use super::session::{AppSession, Session};
use super::store::{PersistedTokens, TokenStore};
use crate::api::AuthError;

/// Exchanges a credential source for a session.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, source: &CredentialSource) -> Result<Session, AuthError>;
}

/// The login form as seen by the bootstrapper.
#[async_trait]
pub trait LoginForm: Send {
    /// Render the form. Called at most once per `AppSession`.
    fn show(&mut self);

    /// Wait for the user to submit the form. `None` means the form was
    /// closed and no submission will ever arrive.
    async fn next_submission(&mut self) -> Option<Submission>;
}

/// Receives user-facing progress updates during bootstrap.
pub trait StatusSink: Send {
    fn report(&mut self, status: BootstrapStatus);
}

impl StatusSink for Vec<BootstrapStatus> {
    fn report(&mut self, status: BootstrapStatus) {
        self.push(status);
    }
}

impl<F> StatusSink for F
where
    F: FnMut(BootstrapStatus) + Send,
{
    fn report(&mut self, status: BootstrapStatus) {
        self(status)
    }
}

/// Progress reported to the user while bootstrapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapStatus {
    LoggingIn,
    Refreshing,
    LoggedIn { first_name: String },
    Failed { message: String, retryable: bool },
}

impl BootstrapStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BootstrapStatus::LoggedIn { .. } | BootstrapStatus::Failed { .. }
        )
    }
}

impl fmt::Display for BootstrapStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootstrapStatus::LoggingIn => write!(f, "Logging in..."),
            BootstrapStatus::Refreshing => write!(f, "Refreshing session..."),
            BootstrapStatus::LoggedIn { first_name } => write!(f, "Logged in as {}", first_name),
            BootstrapStatus::Failed { message, .. } => write!(f, "Error: {}", message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    Idle,
    NeedCredentials,
    Authenticating,
    Authenticated,
    Failed,
}

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("{source}")]
    Auth {
        method: CredentialMethod,
        #[source]
        source: AuthError,
    },

    #[error("Login cancelled")]
    Cancelled,
}

impl BootstrapError {
    pub fn is_retryable(&self) -> bool {
        match self {
            BootstrapError::Auth { source, .. } => source.is_retryable(),
            BootstrapError::Cancelled => false,
        }
    }

    /// The saved tokens were the credentials that failed.
    pub fn from_saved_tokens(&self) -> bool {
        matches!(
            self,
            BootstrapError::Auth {
                method: CredentialMethod::Tokens,
                ..
            }
        )
    }
}

pub struct Bootstrapper {
    resolver: CredentialResolver,
    store: Arc<dyn TokenStore>,
    authenticator: Arc<dyn Authenticator>,
    state: BootstrapState,
}

impl Bootstrapper {
    pub fn new(store: Arc<dyn TokenStore>, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            resolver: CredentialResolver::new(Arc::clone(&store)),
            store,
            authenticator,
            state: BootstrapState::Idle,
        }
    }

    pub fn state(&self) -> BootstrapState {
        self.state
    }

    fn transition(&mut self, next: BootstrapState) {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, "Bootstrap state change");
            self.state = next;
        }
    }

    /// Resolve credentials (waiting on the form if needed) and log in.
    pub async fn bootstrap<F, S>(
        &mut self,
        session: &mut AppSession,
        form: &mut F,
        status: &mut S,
    ) -> Result<Session, BootstrapError>
    where
        F: LoginForm + ?Sized,
        S: StatusSink + ?Sized,
    {
        let source = loop {
            if let Some(source) = self.resolver.resolve(session) {
                break source;
            }

            self.transition(BootstrapState::NeedCredentials);
            if session.show_form(form) {
                debug!("Login form shown, waiting for submission");
            }

            match form.next_submission().await {
                Some(submission) if submission.is_complete() => {
                    session.record_submission(submission);
                }
                Some(_) => {
                    debug!("Ignoring incomplete form submission");
                }
                None => {
                    info!("Login form closed before submission");
                    return Err(BootstrapError::Cancelled);
                }
            }
        };

        session.dismiss_form();
        self.transition(BootstrapState::Authenticating);

        let method = source.method();
        status.report(match method {
            CredentialMethod::Password => BootstrapStatus::LoggingIn,
            CredentialMethod::Tokens => BootstrapStatus::Refreshing,
        });
        info!(username = %source.username(), %method, "Authenticating");

        match self.authenticator.authenticate(&source).await {
            Ok(mut authenticated) => {
                if authenticated.username.is_empty() {
                    authenticated.username = source.username().to_string();
                }

                if let Err(e) =
                    PersistedTokens::from_session(&authenticated).save(self.store.as_ref())
                {
                    warn!(error = %e, store = self.store.name(), "Failed to persist tokens");
                }

                status.report(BootstrapStatus::LoggedIn {
                    first_name: authenticated.first_name().to_string(),
                });
                self.transition(BootstrapState::Authenticated);
                info!(%method, "Login successful");
                Ok(authenticated)
            }
            Err(e) => {
                error!(error = %e, %method, "Login failed");
                status.report(BootstrapStatus::Failed {
                    message: e.to_string(),
                    retryable: e.is_retryable(),
                });
                self.transition(BootstrapState::Failed);
                Err(BootstrapError::Auth { method, source: e })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::{FormState, Tokens};
    use crate::auth::store::{MemoryTokenStore, ACCESS_TOKEN, ID_TOKEN, REFRESH_TOKEN, USERNAME};
    use crate::models::Member;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct MockAuthenticator {
        fail_with: Option<fn() -> AuthError>,
        calls: Mutex<Vec<CredentialSource>>,
    }

    impl MockAuthenticator {
        fn succeeding() -> Arc<Self> {
            Arc::new(Self {
                fail_with: None,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn failing(f: fn() -> AuthError) -> Arc<Self> {
            Arc::new(Self {
                fail_with: Some(f),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<CredentialSource> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Authenticator for MockAuthenticator {
        async fn authenticate(&self, source: &CredentialSource) -> Result<Session, AuthError> {
            self.calls.lock().unwrap().push(source.clone());
            if let Some(f) = self.fail_with {
                return Err(f());
            }
            Ok(Session {
                username: source.username().to_string(),
                member: Member {
                    member_uuid: "m-1".into(),
                    first_name: "Ada".into(),
                    email: Some(source.username().to_string()),
                },
                tokens: Tokens {
                    access_token: "AT-new".into(),
                    id_token: "IT-new".into(),
                    refresh_token: None,
                },
                expires_at: None,
            })
        }
    }

    /// Form that replays a fixed list of submissions.
    #[derive(Default)]
    struct ScriptedForm {
        shown: usize,
        submissions: VecDeque<Submission>,
    }

    impl ScriptedForm {
        fn with(submissions: impl IntoIterator<Item = Submission>) -> Self {
            Self {
                shown: 0,
                submissions: submissions.into_iter().collect(),
            }
        }
    }

    #[async_trait]
    impl LoginForm for ScriptedForm {
        fn show(&mut self) {
            self.shown += 1;
        }

        async fn next_submission(&mut self) -> Option<Submission> {
            self.submissions.pop_front()
        }
    }

    #[tokio::test]
    async fn test_password_login_persists_tokens() {
        let store = Arc::new(MemoryTokenStore::new());
        let auth = MockAuthenticator::succeeding();
        let mut bootstrapper = Bootstrapper::new(store.clone(), auth.clone());
        let mut session = AppSession::new();
        let mut form = ScriptedForm::with([Submission::new("a@b.com", "pw")]);
        let mut statuses: Vec<BootstrapStatus> = Vec::new();

        let result = bootstrapper
            .bootstrap(&mut session, &mut form, &mut statuses)
            .await
            .unwrap();

        assert_eq!(result.first_name(), "Ada");
        assert_eq!(bootstrapper.state(), BootstrapState::Authenticated);
        assert_eq!(form.shown, 1);
        assert_eq!(session.form_state(), FormState::Dismissed);

        let saved = store.snapshot();
        assert_eq!(saved.get(ACCESS_TOKEN).map(String::as_str), Some("AT-new"));
        assert_eq!(saved.get(ID_TOKEN).map(String::as_str), Some("IT-new"));
        assert_eq!(saved.get(USERNAME).map(String::as_str), Some("a@b.com"));

        assert_eq!(
            statuses,
            vec![
                BootstrapStatus::LoggingIn,
                BootstrapStatus::LoggedIn {
                    first_name: "Ada".into()
                },
            ]
        );
        assert_eq!(statuses[1].to_string(), "Logged in as Ada");
    }

    #[tokio::test]
    async fn test_failed_password_login_leaves_store_untouched() {
        // A partial set never resolves, so the form is used
        let seed = [(USERNAME, "old@b.com"), (REFRESH_TOKEN, "RT-old")];
        let store = Arc::new(MemoryTokenStore::with_values(seed));
        let before = store.snapshot();
        let auth = MockAuthenticator::failing(|| {
            AuthError::InvalidCredentials("Incorrect username or password.".into())
        });
        let mut bootstrapper = Bootstrapper::new(store.clone(), auth.clone());
        let mut session = AppSession::new();
        let mut form = ScriptedForm::with([Submission::new("a@b.com", "wrong")]);
        let mut statuses: Vec<BootstrapStatus> = Vec::new();

        let err = bootstrapper
            .bootstrap(&mut session, &mut form, &mut statuses)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            BootstrapError::Auth {
                method: CredentialMethod::Password,
                source: AuthError::InvalidCredentials(_)
            }
        ));
        assert!(!err.is_retryable());
        assert_eq!(store.snapshot(), before);
        assert_eq!(bootstrapper.state(), BootstrapState::Failed);
        assert_eq!(auth.calls().len(), 1);
        assert_eq!(
            statuses.last().map(ToString::to_string).as_deref(),
            Some("Error: Incorrect username or password.")
        );
    }

    #[tokio::test]
    async fn test_failed_token_login_leaves_store_untouched() {
        let seed = [
            (ACCESS_TOKEN, "AT-stale"),
            (ID_TOKEN, "IT-stale"),
            (USERNAME, "a@b.com"),
            (REFRESH_TOKEN, "RT-stale"),
        ];
        let store = Arc::new(MemoryTokenStore::with_values(seed));
        let before = store.snapshot();
        let auth = MockAuthenticator::failing(|| AuthError::TokenExpired);
        let mut bootstrapper = Bootstrapper::new(store.clone(), auth.clone());
        let mut session = AppSession::new();
        let mut form = ScriptedForm::default();
        let mut statuses: Vec<BootstrapStatus> = Vec::new();

        let err = bootstrapper
            .bootstrap(&mut session, &mut form, &mut statuses)
            .await
            .unwrap_err();

        assert!(err.from_saved_tokens());
        assert_eq!(form.shown, 0);
        assert_eq!(store.snapshot(), before);
        assert_eq!(before.len(), 4);
        assert_eq!(bootstrapper.state(), BootstrapState::Failed);
    }

    #[tokio::test]
    async fn test_incomplete_submission_keeps_waiting() {
        let store = Arc::new(MemoryTokenStore::new());
        let auth = MockAuthenticator::succeeding();
        let mut bootstrapper = Bootstrapper::new(store, auth.clone());
        let mut session = AppSession::new();
        let mut form = ScriptedForm::with([
            Submission::new("a@b.com", ""),
            Submission::new("", "pw"),
            Submission::new("a@b.com", "pw"),
        ]);
        let mut statuses: Vec<BootstrapStatus> = Vec::new();

        bootstrapper
            .bootstrap(&mut session, &mut form, &mut statuses)
            .await
            .unwrap();

        assert_eq!(form.shown, 1);
        assert_eq!(
            auth.calls(),
            vec![CredentialSource::Password {
                username: "a@b.com".into(),
                password: "pw".into(),
            }]
        );
    }

    #[tokio::test]
    async fn test_closed_form_cancels() {
        let store = Arc::new(MemoryTokenStore::new());
        let auth = MockAuthenticator::succeeding();
        let mut bootstrapper = Bootstrapper::new(store.clone(), auth.clone());
        let mut session = AppSession::new();
        let mut form = ScriptedForm::default();
        let mut statuses: Vec<BootstrapStatus> = Vec::new();

        let err = bootstrapper
            .bootstrap(&mut session, &mut form, &mut statuses)
            .await
            .unwrap_err();

        assert!(matches!(err, BootstrapError::Cancelled));
        assert_eq!(bootstrapper.state(), BootstrapState::NeedCredentials);
        assert!(auth.calls().is_empty());
        assert!(statuses.is_empty());
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_network_failure_is_retryable() {
        let store = Arc::new(MemoryTokenStore::new());
        let auth = MockAuthenticator::failing(|| AuthError::Network("connection refused".into()));
        let mut bootstrapper = Bootstrapper::new(store, auth);
        let mut session = AppSession::new();
        let mut form = ScriptedForm::with([Submission::new("a@b.com", "pw")]);
        let mut statuses: Vec<BootstrapStatus> = Vec::new();

        let err = bootstrapper
            .bootstrap(&mut session, &mut form, &mut statuses)
            .await
            .unwrap_err();

        assert!(err.is_retryable());
        assert!(matches!(
            statuses.last(),
            Some(BootstrapStatus::Failed { retryable: true, .. })
        ));
    }
}
