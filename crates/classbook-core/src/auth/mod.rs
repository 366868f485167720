//! Authentication module: credential resolution and session bootstrap.
//!
//! This module provides:
//! - `CredentialResolver`: picks saved tokens or a fresh form submission
//! - `Bootstrapper`: waits for credentials and exchanges them for a `Session`
//! - `TokenStore`: persisted tokens (file, OS keychain, or in-memory)
//! - `AppSession`: per-run form state
//!
//! Tokens are written to the store only after a successful login.

pub mod bootstrap;
pub mod credentials;
pub mod jwt;
pub mod keychain;
pub mod resolver;
pub mod session;
pub mod store;

pub use bootstrap::{
    Authenticator, BootstrapError, BootstrapState, BootstrapStatus, Bootstrapper, LoginForm,
    StatusSink,
};
pub use credentials::{CredentialMethod, CredentialSource, Submission};
pub use keychain::KeychainTokenStore;
pub use resolver::CredentialResolver;
pub use session::{AppSession, FormState, Session, Tokens};
pub use store::{FileTokenStore, MemoryTokenStore, PersistedTokens, TokenStore};
