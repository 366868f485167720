//! API client for the studio's login service and member REST API.
//!
//! Login goes through the studio's Cognito user pool (`InitiateAuth`), which
//! hands back access, id and refresh tokens. The member API accepts the id
//! token as a bearer token.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Local, NaiveDate, TimeDelta};
use reqwest::{header, Client};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{ApiError, AuthError};
use crate::auth::jwt::decode_claims;
use crate::auth::{Authenticator, CredentialSource, Session, Tokens};
use crate::models::{Booking, Member};

// ============================================================================
// Constants
// ============================================================================

/// Cognito identity provider endpoint for the studio's user pool region
const COGNITO_URL: &str = "https://cognito-idp.us-east-1.amazonaws.com/";

/// Public app client id of the studio's user pool
const COGNITO_CLIENT_ID: &str = "65knvqta6p37efc2l3eh26pl5o";

/// Base URL for member data endpoints
const API_BASE_URL: &str = "https://api.orangetheory.co";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default number of days ahead to list bookings for.
pub const DEFAULT_BOOKING_WINDOW_DAYS: i64 = 30;

/// Longest booking window accepted, in days.
pub const MAX_BOOKING_WINDOW_DAYS: i64 = 366;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

#[derive(Debug, Deserialize)]
struct InitiateAuthResponse {
    #[serde(rename = "AuthenticationResult")]
    authentication_result: Option<AuthenticationResult>,
    #[serde(rename = "ChallengeName")]
    challenge_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthenticationResult {
    #[serde(rename = "AccessToken")]
    access_token: String,
    #[serde(rename = "IdToken")]
    id_token: String,
    #[serde(rename = "RefreshToken")]
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CognitoErrorBody {
    #[serde(rename = "__type", default)]
    kind: String,
    #[serde(default, alias = "Message")]
    message: Option<String>,
}

/// Which `InitiateAuth` flow a request used; error mapping differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthFlow {
    UserPassword,
    RefreshToken,
}

impl AuthFlow {
    fn as_str(&self) -> &'static str {
        match self {
            AuthFlow::UserPassword => "USER_PASSWORD_AUTH",
            AuthFlow::RefreshToken => "REFRESH_TOKEN_AUTH",
        }
    }
}

/// API client for the studio services.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct StudioClient {
    client: Client,
    booking_window_days: i64,
}

impl StudioClient {
    /// Create a new API client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            booking_window_days: DEFAULT_BOOKING_WINDOW_DAYS,
        })
    }

    /// Set how many days ahead `fetch_bookings` looks.
    pub fn with_booking_window(mut self, days: i64) -> Self {
        self.booking_window_days = days.clamp(1, MAX_BOOKING_WINDOW_DAYS);
        self
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    async fn initiate_auth(
        &self,
        flow: AuthFlow,
        parameters: serde_json::Value,
    ) -> Result<AuthenticationResult, AuthError> {
        let body = serde_json::json!({
            "AuthFlow": flow.as_str(),
            "ClientId": COGNITO_CLIENT_ID,
            "AuthParameters": parameters,
        });

        let response = self
            .client
            .post(COGNITO_URL)
            .header(header::CONTENT_TYPE, "application/x-amz-json-1.1")
            .header("X-Amz-Target", "AWSCognitoIdentityProviderService.InitiateAuth")
            .body(body.to_string())
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(Self::map_cognito_error(flow, status, &text));
        }

        let parsed: InitiateAuthResponse = serde_json::from_str(&text).map_err(|e| {
            AuthError::Api(ApiError::InvalidResponse(format!(
                "Failed to parse login response: {}",
                e
            )))
        })?;

        match parsed.authentication_result {
            Some(result) => Ok(result),
            None => Err(AuthError::InvalidCredentials(format!(
                "Login requires an unsupported challenge ({})",
                parsed.challenge_name.as_deref().unwrap_or("unknown")
            ))),
        }
    }

    /// Translate a Cognito error body into an `AuthError`.
    fn map_cognito_error(flow: AuthFlow, status: reqwest::StatusCode, body: &str) -> AuthError {
        let parsed: Option<CognitoErrorBody> = serde_json::from_str(body).ok();
        let Some(err) = parsed else {
            return AuthError::Api(ApiError::from_status(status, body));
        };

        // "__type" may carry a namespace prefix: "com.amazon...#NotAuthorizedException"
        let kind = err.kind.rsplit('#').next().unwrap_or_default();
        let message = err.message.unwrap_or_else(|| kind.to_string());

        match (flow, kind) {
            (AuthFlow::RefreshToken, "NotAuthorizedException") => AuthError::TokenExpired,
            (
                _,
                "NotAuthorizedException"
                | "UserNotFoundException"
                | "UserNotConfirmedException"
                | "PasswordResetRequiredException",
            ) => AuthError::InvalidCredentials(message),
            (_, "TooManyRequestsException") => AuthError::Api(ApiError::RateLimited),
            _ => AuthError::Api(ApiError::from_status(status, &message)),
        }
    }

    /// Build a session from freshly issued or saved tokens.
    fn session_from_tokens(username: &str, tokens: Tokens) -> Result<Session, AuthError> {
        let claims = decode_claims(&tokens.id_token)?;
        let username = if username.is_empty() {
            claims.email.clone().unwrap_or_default()
        } else {
            username.to_string()
        };
        Ok(Session {
            username,
            member: Member::from(&claims),
            expires_at: claims.expires_at(),
            tokens,
        })
    }

    /// Log in with a username and password
    pub async fn login_with_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let result = self
            .initiate_auth(
                AuthFlow::UserPassword,
                serde_json::json!({ "USERNAME": username, "PASSWORD": password }),
            )
            .await?;

        Self::session_from_tokens(
            username,
            Tokens {
                access_token: result.access_token,
                id_token: result.id_token,
                refresh_token: result.refresh_token,
            },
        )
    }

    /// Resume a session from saved tokens, renewing them if they have expired.
    pub async fn login_with_tokens(
        &self,
        username: &str,
        tokens: Tokens,
    ) -> Result<Session, AuthError> {
        let claims = decode_claims(&tokens.id_token)?;
        if !claims.is_expired() {
            debug!("Saved id token still valid");
            return Self::session_from_tokens(username, tokens);
        }

        let Some(refresh_token) = tokens.refresh_token.clone() else {
            return Err(AuthError::TokenExpired);
        };

        debug!("Saved id token expired, refreshing");
        let result = self
            .initiate_auth(
                AuthFlow::RefreshToken,
                serde_json::json!({ "REFRESH_TOKEN": refresh_token }),
            )
            .await?;

        Self::session_from_tokens(
            username,
            Tokens {
                access_token: result.access_token,
                id_token: result.id_token,
                // Cognito only rotates the refresh token on some pool settings
                refresh_token: result.refresh_token.or(Some(refresh_token)),
            },
        )
    }

    // =========================================================================
    // Data
    // =========================================================================

    async fn get_text(&self, url: &str, token: &str) -> Result<String> {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self
                .client
                .get(url)
                .bearer_auth(token)
                .header(header::ACCEPT, "application/json")
                .send()
                .await
                .with_context(|| format!("Failed to send GET request to {}", url))?;

            let status = response.status();
            if status.is_success() {
                return response
                    .text()
                    .await
                    .with_context(|| format!("Failed to read response from {}", url));
            }

            if status.as_u16() == 429 {
                retries += 1;
                if retries > MAX_RATE_LIMIT_RETRIES {
                    return Err(ApiError::RateLimited.into());
                }
                warn!(url = url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms *= 2;
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body).into());
        }
    }

    /// Fetch the member's booked classes from today through the booking window
    pub async fn fetch_bookings(&self, session: &Session) -> Result<Vec<Booking>> {
        let today = Local::now().date_naive();
        let until = self
            .window_end(today)
            .ok_or_else(|| ApiError::InvalidResponse("Booking window out of range".to_string()))?;
        let url = format!(
            "{}/member/members/{}/bookings?startDate={}&endDate={}&statuses=Booked&includeCanceled=false&expand=false",
            API_BASE_URL,
            session.member_uuid(),
            today.format("%Y-%m-%d"),
            until.format("%Y-%m-%d"),
        );

        debug!(from = %today, to = %until, "Fetching bookings");
        let text = self.get_text(&url, &session.tokens.id_token).await?;
        let bookings = Self::parse_bookings(&text)?;
        debug!(count = bookings.len(), "Bookings received");
        Ok(bookings)
    }

    /// Last day of the booking window starting at `from`.
    fn window_end(&self, from: NaiveDate) -> Option<NaiveDate> {
        TimeDelta::try_days(self.booking_window_days).and_then(|d| from.checked_add_signed(d))
    }

    /// Parse a bookings payload, accepting a bare array or a wrapper object.
    pub fn parse_bookings(text: &str) -> Result<Vec<Booking>> {
        if let Ok(bookings) = serde_json::from_str::<Vec<Booking>>(text) {
            return Ok(bookings);
        }

        #[derive(Deserialize)]
        struct Wrapper {
            #[serde(default, alias = "bookings")]
            data: Option<Vec<Booking>>,
        }

        match serde_json::from_str::<Wrapper>(text) {
            Ok(Wrapper { data: Some(bookings) }) => Ok(bookings),
            Ok(Wrapper { data: None }) => Ok(Vec::new()),
            Err(e) => Err(ApiError::InvalidResponse(format!(
                "Failed to parse bookings: {} (response starts with: {})",
                e,
                text.chars().take(200).collect::<String>()
            ))
            .into()),
        }
    }
}

#[async_trait]
impl Authenticator for StudioClient {
    async fn authenticate(&self, source: &CredentialSource) -> Result<Session, AuthError> {
        match source {
            CredentialSource::Password { username, password } => {
                self.login_with_password(username, password).await
            }
            CredentialSource::Tokens {
                username,
                access_token,
                id_token,
                refresh_token,
            } => {
                self.login_with_tokens(
                    username,
                    Tokens {
                        access_token: access_token.clone(),
                        id_token: id_token.clone(),
                        refresh_token: refresh_token.clone(),
                    },
                )
                .await
            }
        }
    }
}
