//! Runs the session bootstrap in the background and bridges it to the UI
//! loop through channels.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use classbook_core::auth::{
    Authenticator, AppSession, BootstrapError, BootstrapStatus, Bootstrapper, LoginForm, Session,
    Submission, TokenStore,
};

use crate::app::BackgroundResult;

/// Bootstrap progress as seen by the UI.
pub enum AuthEvent {
    /// Nothing resolved; open the login overlay
    ShowForm,
    Status(BootstrapStatus),
    Finished(Result<Session, BootstrapError>),
}

/// Handle on a spawned bootstrap run.
pub struct BootstrapRun {
    /// Events from this run are tagged with it; older runs are ignored
    pub generation: u64,
    /// Form submissions; dropping it cancels a run waiting on the form
    pub submit_tx: mpsc::UnboundedSender<Submission>,
    task: JoinHandle<()>,
}

impl BootstrapRun {
    /// Stop the run before it can persist anything.
    pub fn abort(&self) {
        self.task.abort();
    }
}

fn auth_event(generation: u64, event: AuthEvent) -> BackgroundResult {
    BackgroundResult::Auth { generation, event }
}

/// Login form backed by the UI: showing it posts an event, submissions
/// arrive from the overlay's Enter key.
struct ChannelForm {
    generation: u64,
    events: mpsc::UnboundedSender<BackgroundResult>,
    submissions: mpsc::UnboundedReceiver<Submission>,
}

#[async_trait]
impl LoginForm for ChannelForm {
    fn show(&mut self) {
        let _ = self.events.send(auth_event(self.generation, AuthEvent::ShowForm));
    }

    async fn next_submission(&mut self) -> Option<Submission> {
        self.submissions.recv().await
    }
}

/// Spawn one bootstrap run.
pub fn spawn_bootstrap(
    generation: u64,
    store: Arc<dyn TokenStore>,
    authenticator: Arc<dyn Authenticator>,
    events: mpsc::UnboundedSender<BackgroundResult>,
) -> BootstrapRun {
    let (submit_tx, submit_rx) = mpsc::unbounded_channel();

    let task = tokio::spawn(async move {
        let mut bootstrapper = Bootstrapper::new(store, authenticator);
        let mut session = AppSession::new();
        let mut form = ChannelForm {
            generation,
            events: events.clone(),
            submissions: submit_rx,
        };
        let status_events = events.clone();
        let mut status = move |s: BootstrapStatus| {
            let _ = status_events.send(auth_event(generation, AuthEvent::Status(s)));
        };

        let result = bootstrapper
            .bootstrap(&mut session, &mut form, &mut status)
            .await;

        if events
            .send(auth_event(generation, AuthEvent::Finished(result)))
            .is_err()
        {
            debug!("UI closed before bootstrap finished");
        }
    });

    BootstrapRun {
        generation,
        submit_tx,
        task,
    }
}
