use std::fmt;

use chrono::{DateTime, Utc};

use super::bootstrap::LoginForm;
use super::credentials::Submission;
use crate::models::Member;

/// Display state of the login form within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormState {
    #[default]
    Hidden,
    Shown,
    Dismissed,
}

/// Ephemeral per-run state: form values entered during this visit.
///
/// Owned by whoever drives the bootstrap and dropped with it.
#[derive(Default)]
pub struct AppSession {
    username: String,
    password: String,
    form: FormState,
}

impl AppSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the values from a form submission.
    pub fn record_submission(&mut self, submission: Submission) {
        self.username = submission.username.trim().to_string();
        self.password = submission.password;
    }

    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }

    /// Take the submitted username and password, leaving the fields empty.
    pub fn take_credentials(&mut self) -> Option<(String, String)> {
        if !self.has_credentials() {
            return None;
        }
        Some((
            std::mem::take(&mut self.username),
            std::mem::take(&mut self.password),
        ))
    }

    /// Show the form unless it has already been shown this run.
    /// Returns true if the form was rendered by this call.
    pub fn show_form<F: LoginForm + ?Sized>(&mut self, form: &mut F) -> bool {
        if self.form != FormState::Hidden {
            return false;
        }
        form.show();
        self.form = FormState::Shown;
        true
    }

    pub fn dismiss_form(&mut self) {
        if self.form == FormState::Shown {
            self.form = FormState::Dismissed;
        }
    }

    /// Allow the form to be shown again, e.g. when the caller retries a login.
    pub fn reset_form(&mut self) {
        self.form = FormState::Hidden;
    }

    pub fn form_state(&self) -> FormState {
        self.form
    }
}

impl fmt::Debug for AppSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppSession")
            .field("username", &self.username)
            .field("has_password", &!self.password.is_empty())
            .field("form", &self.form)
            .finish()
    }
}

/// Renewable tokens issued at login.
#[derive(Clone, PartialEq, Eq)]
pub struct Tokens {
    pub access_token: String,
    pub id_token: String,
    pub refresh_token: Option<String>,
}

impl fmt::Debug for Tokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tokens")
            .field("access_token", &"<redacted>")
            .field("id_token", &"<redacted>")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .finish()
    }
}

/// An authenticated session with the studio API.
#[derive(Debug, Clone)]
pub struct Session {
    pub username: String,
    pub member: Member,
    pub tokens: Tokens,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn first_name(&self) -> &str {
        &self.member.first_name
    }

    pub fn email(&self) -> Option<&str> {
        self.member.email.as_deref()
    }

    pub fn member_uuid(&self) -> &str {
        &self.member.member_uuid
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.map(|t| Utc::now() >= t).unwrap_or(false)
    }
}
