//! REST API client module for the studio services.
//!
//! This module provides the `StudioClient` for logging in through the
//! studio's Cognito user pool and fetching the member's class bookings.
//!
//! Data endpoints authenticate with the id token issued at login.

pub mod client;
pub mod error;

pub use client::StudioClient;
pub use error::{ApiError, AuthError};
