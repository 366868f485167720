use std::fmt;

/// A resolved set of credentials ready to exchange for a session.
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Entered into the login form during this run
    Password { username: String, password: String },
    /// Loaded from the persisted token store
    Tokens {
        username: String,
        access_token: String,
        id_token: String,
        refresh_token: Option<String>,
    },
}

/// Which kind of credentials a login attempt used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialMethod {
    Password,
    Tokens,
}

impl fmt::Display for CredentialMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialMethod::Password => write!(f, "password"),
            CredentialMethod::Tokens => write!(f, "saved tokens"),
        }
    }
}

impl CredentialSource {
    pub fn username(&self) -> &str {
        match self {
            CredentialSource::Password { username, .. } => username,
            CredentialSource::Tokens { username, .. } => username,
        }
    }

    pub fn method(&self) -> CredentialMethod {
        match self {
            CredentialSource::Password { .. } => CredentialMethod::Password,
            CredentialSource::Tokens { .. } => CredentialMethod::Tokens,
        }
    }
}

// Secrets stay out of logs and panic messages.
impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            CredentialSource::Tokens {
                username,
                refresh_token,
                ..
            } => f
                .debug_struct("Tokens")
                .field("username", username)
                .field("access_token", &"<redacted>")
                .field("id_token", &"<redacted>")
                .field("has_refresh_token", &refresh_token.is_some())
                .finish(),
        }
    }
}

/// Values submitted through the login form.
#[derive(Clone, PartialEq, Eq)]
pub struct Submission {
    pub username: String,
    pub password: String,
}

impl Submission {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Both fields are required; a blank submission never resolves.
    pub fn is_complete(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for Submission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Submission")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
