//! Line-oriented mode (`--plain`): prompts on the terminal, prints the
//! bookings table to stdout and exits.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{info, warn};

use classbook_core::api::StudioClient;
use classbook_core::auth::{
    AppSession, BootstrapError, BootstrapStatus, Bootstrapper, LoginForm, PersistedTokens,
    Session, Submission, TokenStore,
};
use classbook_core::config::Config;
use classbook_core::models::{sort_by_start, BOOKING_COLUMNS};
use classbook_core::utils::humanize;

/// Incomplete submissions tolerated before giving up
const MAX_PROMPTS: usize = 3;

/// Prompts for credentials on the controlling terminal.
struct PromptForm {
    prefill: Option<Submission>,
    default_username: Option<String>,
    prompts: usize,
}

impl PromptForm {
    fn new(prefill: Option<Submission>, default_username: Option<String>) -> Self {
        Self {
            prefill,
            default_username,
            prompts: 0,
        }
    }
}

#[async_trait]
impl LoginForm for PromptForm {
    fn show(&mut self) {
        eprintln!("Log in to see your upcoming classes.");
    }

    async fn next_submission(&mut self) -> Option<Submission> {
        if let Some(submission) = self.prefill.take() {
            return Some(submission);
        }
        if self.prompts >= MAX_PROMPTS {
            return None;
        }
        self.prompts += 1;

        let default_username = self.default_username.clone();
        let prompted = tokio::task::spawn_blocking(move || prompt(default_username.as_deref())).await;
        match prompted {
            Ok(Ok(submission)) => submission,
            Ok(Err(e)) => {
                warn!(error = %e, "Failed to read credentials");
                None
            }
            Err(e) => {
                warn!(error = %e, "Credential prompt task failed");
                None
            }
        }
    }
}

/// Read a username and password. `Ok(None)` on end of input.
fn prompt(default_username: Option<&str>) -> io::Result<Option<Submission>> {
    let mut stderr = io::stderr();
    match default_username {
        Some(name) => write!(stderr, "Username [{}]: ", name)?,
        None => write!(stderr, "Username: ")?,
    }
    stderr.flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let username = match line.trim() {
        "" => default_username.unwrap_or_default().to_string(),
        typed => typed.to_string(),
    };

    let password = rpassword::prompt_password("Password: ")?;
    Ok(Some(Submission::new(username, password)))
}

fn env_submission() -> Option<Submission> {
    let username = std::env::var("CLASSBOOK_USERNAME").ok()?;
    let password = std::env::var("CLASSBOOK_PASSWORD").ok()?;
    let submission = Submission::new(username, password);
    submission.is_complete().then_some(submission)
}

async fn login(
    config: &Config,
    store: Arc<dyn TokenStore>,
    api: &StudioClient,
) -> Result<Session, BootstrapError> {
    let mut form = PromptForm::new(env_submission(), config.last_username.clone());
    let mut status = |s: BootstrapStatus| eprintln!("{}", s);

    // A rejected saved session gets one more go with the prompt
    let mut session = AppSession::new();
    for attempt in 0..2 {
        let mut bootstrapper = Bootstrapper::new(Arc::clone(&store), Arc::new(api.clone()));
        match bootstrapper.bootstrap(&mut session, &mut form, &mut status).await {
            Err(e) if attempt == 0 && e.from_saved_tokens() && !e.is_retryable() => {
                warn!(error = %e, "Saved session rejected, clearing tokens");
                if let Err(clear_err) = PersistedTokens::clear(store.as_ref()) {
                    warn!(error = %clear_err, "Failed to clear saved tokens");
                }
                session.reset_form();
            }
            result => return result,
        }
    }
    Err(BootstrapError::Cancelled)
}

pub async fn run() -> Result<()> {
    let mut config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        Config::default()
    });
    let cache_dir = config.cache_dir()?;
    let store = config.token_store(&cache_dir);
    let api = StudioClient::new()?.with_booking_window(config.booking_window_days());

    let session = login(&config, store, &api).await?;
    info!(member = %session.member_uuid(), "Logged in");

    if config.last_username.as_deref() != Some(session.username.as_str()) {
        config.last_username = Some(session.username.clone());
        if let Err(e) = config.save() {
            warn!(error = %e, "Failed to save config");
        }
    }

    println!("Thanks for logging in {}!", session.first_name());

    let mut bookings = api
        .fetch_bookings(&session)
        .await
        .context("Failed to fetch bookings")?;
    sort_by_start(&mut bookings);

    let headers: Vec<String> = BOOKING_COLUMNS.iter().map(|k| humanize(k)).collect();
    let rows: Vec<Vec<String>> = bookings.iter().map(|b| b.to_row().to_vec()).collect();
    print!("{}", format_table(&headers, &rows));
    Ok(())
}

/// Lay out rows as left-aligned columns separated by two spaces.
fn format_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |cells: &[String]| -> String {
        let line = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("  ");
        format!("{}\n", line.trim_end())
    };

    let mut out = format_row(headers);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&format_row(&rule));
    for row in rows {
        out.push_str(&format_row(row));
    }
    out
}
