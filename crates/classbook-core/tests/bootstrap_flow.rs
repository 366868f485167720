//! End-to-end login flows through the public API, with a recording
//! authenticator standing in for the studio service.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use classbook_core::api::AuthError;
use classbook_core::auth::store::{ACCESS_TOKEN, ID_TOKEN, USERNAME};
use classbook_core::auth::{
    AppSession, Authenticator, BootstrapState, BootstrapStatus, Bootstrapper, CredentialResolver,
    CredentialSource, FormState, LoginForm, MemoryTokenStore, PersistedTokens, Session,
    Submission, Tokens,
};
use classbook_core::models::Member;

#[derive(Default)]
struct RecordingAuthenticator {
    calls: Mutex<Vec<CredentialSource>>,
}

impl RecordingAuthenticator {
    fn calls(&self) -> Vec<CredentialSource> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Authenticator for RecordingAuthenticator {
    async fn authenticate(&self, source: &CredentialSource) -> Result<Session, AuthError> {
        self.calls.lock().unwrap().push(source.clone());
        let (access_token, id_token) = match source {
            CredentialSource::Tokens {
                access_token,
                id_token,
                ..
            } => (access_token.clone(), id_token.clone()),
            CredentialSource::Password { .. } => ("AT-fresh".to_string(), "IT-fresh".to_string()),
        };
        Ok(Session {
            username: source.username().to_string(),
            member: Member {
                member_uuid: "m-1".into(),
                first_name: "Ada".into(),
                email: Some(source.username().to_string()),
            },
            tokens: Tokens {
                access_token,
                id_token,
                refresh_token: None,
            },
            expires_at: None,
        })
    }
}

/// Form fed by a channel, like the TUI's login overlay.
struct ChannelForm {
    shown: Arc<AtomicUsize>,
    submissions: mpsc::UnboundedReceiver<Submission>,
}

#[async_trait]
impl LoginForm for ChannelForm {
    fn show(&mut self) {
        self.shown.fetch_add(1, Ordering::SeqCst);
    }

    async fn next_submission(&mut self) -> Option<Submission> {
        self.submissions.recv().await
    }
}

fn channel_form() -> (ChannelForm, Arc<AtomicUsize>, mpsc::UnboundedSender<Submission>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let shown = Arc::new(AtomicUsize::new(0));
    (
        ChannelForm {
            shown: Arc::clone(&shown),
            submissions: rx,
        },
        shown,
        tx,
    )
}

#[tokio::test]
async fn cached_tokens_skip_the_form() {
    let store = Arc::new(MemoryTokenStore::with_values([
        (ACCESS_TOKEN, "AT1"),
        (ID_TOKEN, "IT1"),
        (USERNAME, "a@b.com"),
    ]));
    let auth = Arc::new(RecordingAuthenticator::default());
    let mut bootstrapper = Bootstrapper::new(store.clone(), auth.clone());
    let (mut form, shown, _tx) = channel_form();
    let mut session = AppSession::new();
    let mut statuses: Vec<BootstrapStatus> = Vec::new();

    let result = bootstrapper
        .bootstrap(&mut session, &mut form, &mut statuses)
        .await
        .unwrap();

    assert_eq!(shown.load(Ordering::SeqCst), 0);
    assert_eq!(result.tokens.access_token, "AT1");
    assert_eq!(
        auth.calls(),
        vec![CredentialSource::Tokens {
            username: "a@b.com".into(),
            access_token: "AT1".into(),
            id_token: "IT1".into(),
            refresh_token: None,
        }]
    );
    assert!(auth
        .calls()
        .iter()
        .all(|c| matches!(c, CredentialSource::Tokens { .. })));
    assert_eq!(statuses.first(), Some(&BootstrapStatus::Refreshing));
}

#[tokio::test]
async fn submitted_form_resolves_exactly_once() {
    let store = Arc::new(MemoryTokenStore::new());
    let auth = Arc::new(RecordingAuthenticator::default());
    let mut bootstrapper = Bootstrapper::new(store.clone(), auth.clone());
    let (mut form, shown, tx) = channel_form();
    let mut session = AppSession::new();
    let mut statuses: Vec<BootstrapStatus> = Vec::new();

    let submit = async {
        // Let the bootstrapper reach the wait before submitting
        tokio::task::yield_now().await;
        tx.send(Submission::new("a@b.com", "pw")).unwrap();
    };
    let (result, ()) = futures::join!(
        bootstrapper.bootstrap(&mut session, &mut form, &mut statuses),
        submit
    );
    let result = result.unwrap();

    assert_eq!(result.first_name(), "Ada");
    assert_eq!(shown.load(Ordering::SeqCst), 1);
    assert_eq!(
        auth.calls(),
        vec![CredentialSource::Password {
            username: "a@b.com".into(),
            password: "pw".into(),
        }]
    );
    assert_eq!(bootstrapper.state(), BootstrapState::Authenticated);

    // The submission is consumed and the form stays dismissed
    assert_eq!(session.form_state(), FormState::Dismissed);
    let empty = CredentialResolver::new(Arc::new(MemoryTokenStore::new()));
    assert_eq!(empty.resolve(&mut session), None);
    assert!(!session.show_form(&mut form));
    assert_eq!(shown.load(Ordering::SeqCst), 1);

    // The next run finds the persisted tokens instead
    let saved = PersistedTokens::load(store.as_ref()).unwrap();
    assert_eq!(saved.username, "a@b.com");
    assert_eq!(saved.access_token, "AT-fresh");
    assert_eq!(saved.id_token, "IT-fresh");
}

#[tokio::test]
async fn repeated_misses_show_the_form_once() {
    let resolver = CredentialResolver::new(Arc::new(MemoryTokenStore::new()));
    let (mut form, shown, _tx) = channel_form();
    let mut session = AppSession::new();

    for _ in 0..5 {
        assert_eq!(resolver.resolve(&mut session), None);
        session.show_form(&mut form);
    }
    assert_eq!(shown.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn dropping_the_form_sender_cancels() {
    let store = Arc::new(MemoryTokenStore::new());
    let auth = Arc::new(RecordingAuthenticator::default());
    let mut bootstrapper = Bootstrapper::new(store.clone(), auth.clone());
    let (mut form, _shown, tx) = channel_form();
    drop(tx);

    let mut session = AppSession::new();
    let mut statuses: Vec<BootstrapStatus> = Vec::new();
    let err = bootstrapper
        .bootstrap(&mut session, &mut form, &mut statuses)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Login cancelled");
    assert!(auth.calls().is_empty());
    assert!(store.snapshot().is_empty());
}
