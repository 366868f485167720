use std::sync::Arc;

use tracing::debug;

use super::credentials::CredentialSource;
use super::session::AppSession;
use super::store::{PersistedTokens, TokenStore};

/// Decides which credentials, if any, are available right now.
///
/// Persisted tokens win over a form submission, so a returning user with a
/// saved session never sees the form.
#[derive(Clone)]
pub struct CredentialResolver {
    store: Arc<dyn TokenStore>,
}

impl CredentialResolver {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    pub fn resolve(&self, session: &mut AppSession) -> Option<CredentialSource> {
        if let Some(tokens) = PersistedTokens::load(self.store.as_ref()) {
            debug!(username = %tokens.username, store = self.store.name(), "Resolved saved tokens");
            return Some(CredentialSource::Tokens {
                username: tokens.username,
                access_token: tokens.access_token,
                id_token: tokens.id_token,
                refresh_token: tokens.refresh_token,
            });
        }

        if let Some((username, password)) = session.take_credentials() {
            debug!(%username, "Resolved form submission");
            return Some(CredentialSource::Password { username, password });
        }

        None
    }
}
