//! Push notifications used by the profile tools.
//!
//! Delivery is best effort: failures are logged and never reach the caller,
//! and `notify` returns before the HTTP request completes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::runtime::Handle;
use tracing::{debug, error, warn};

use crate::config::Credentials;

pub const PUSHOVER_URL: &str = "https://api.pushover.net/1/messages.json";

pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);

    /// Deliveries started but not finished yet.
    fn pending(&self) -> usize {
        0
    }
}

/// Fallback when no push credentials are configured: the message only goes
/// to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        warn!(target: "notify", %message, "Pushover credentials not available");
    }
}

#[derive(Serialize)]
struct PushoverPayload<'a> {
    user: &'a str,
    token: &'a str,
    message: &'a str,
}

#[derive(Clone)]
pub struct PushoverNotifier {
    client: reqwest::Client,
    user: String,
    token: String,
    url: String,
    in_flight: Arc<AtomicUsize>,
}

impl std::fmt::Debug for PushoverNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushoverNotifier").field("url", &self.url).finish_non_exhaustive()
    }
}

impl PushoverNotifier {
    pub fn new(user: impl Into<String>, token: impl Into<String>) -> Self {
        let client = http_client(USER_AGENT);
        Self {
            client,
            user: user.into(),
            token: token.into(),
            url: PUSHOVER_URL.to_string(),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Point at a different endpoint (local test servers).
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    async fn send(&self, message: &str) -> Result<(), reqwest::Error> {
        let payload = PushoverPayload { user: &self.user, token: &self.token, message };
        let resp = self.client.post(&self.url).form(&payload).send().await?;
        let status = resp.status();
        if status.is_success() {
            debug!(target: "notify", %status, "pushover notification sent");
        } else {
            let body = resp.text().await.unwrap_or_default();
            error!(target: "notify", %status, %body, "pushover rejected notification");
        }
        Ok(())
    }
}

impl Notifier for PushoverNotifier {
    fn notify(&self, message: &str) {
        let Ok(handle) = Handle::try_current() else {
            warn!(target: "notify", %message, "no async runtime; notification dropped");
            return;
        };
        debug!(target: "notify", %message, "push");
        let this = self.clone();
        let message = message.to_string();
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        handle.spawn(async move {
            if let Err(e) = this.send(&message).await {
                error!(target: "notify", error = %e, "error sending pushover notification");
            }
            this.in_flight.fetch_sub(1, Ordering::SeqCst);
        });
    }

    fn pending(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

const USER_AGENT: &str = "profile_chat_pushover/0.1";

/// Client with a 10s timeout. A builder failure is logged and the default
/// client (no timeout) is used instead.
fn http_client(user_agent: &str) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap_or_else(|e| {
            warn!(target: "notify", error = %e, "failed to build pushover client; using defaults without timeout");
            reqwest::Client::default()
        })
}

/// Pushover when both credentials are present, otherwise log-only.
pub fn notifier_from_credentials(credentials: &Credentials) -> Arc<dyn Notifier> {
    match credentials.pushover() {
        Some((user, token)) => Arc::new(PushoverNotifier::new(user, token)),
        None => Arc::new(LogNotifier),
    }
}
