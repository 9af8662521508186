use std::{
    fmt,
    sync::{Arc, Mutex},
    time::Duration,
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::error::RemoteError;

// ── Types ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Fatal => "fatal",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stack {
    Frontend,
    Backend,
}

/// Body of `POST <endpoint>/logs`.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub stack: Stack,
    pub level: LogLevel,
    pub package: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

struct Remote {
    http: reqwest::Client,
    logs_url: String,
    token: String,
}

/// Logging client for the evaluation service.
///
/// Built once at startup with the access token (if any). Every event is
/// written to `tracing`; when a token is present the event is also shipped
/// to the service in a background task. Delivery failures never reach the
/// caller.
#[derive(Clone)]
pub struct Telemetry {
    stack: Stack,
    remote: Option<Arc<Remote>>,
    pending: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Telemetry")
            .field("stack", &self.stack)
            .field("remote", &self.remote.as_ref().map(|r| r.logs_url.as_str()))
            .finish()
    }
}

// ── Public API ─────────────────────────────────────────────────────────────

impl Telemetry {
    /// Local `tracing` output only.
    pub fn disabled() -> Self {
        Self {
            stack: Stack::Backend,
            remote: None,
            pending: Arc::default(),
        }
    }

    /// Ship events to `<endpoint>/logs` when `token` is present.
    ///
    /// Requests use a 3-second timeout so a slow service can't pile up
    /// background tasks.
    pub fn new(endpoint: &str, token: Option<String>) -> Self {
        let Some(token) = token.filter(|t| !t.trim().is_empty()) else {
            tracing::warn!("No access token available for logging to evaluation service");
            return Self::disabled();
        };

        let http = match reqwest::Client::builder()
            .timeout(Duration::from_secs(3))
            .build()
        {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("telemetry disabled, could not build HTTP client: {}", e);
                return Self::disabled();
            }
        };

        Self {
            stack: Stack::Backend,
            remote: Some(Arc::new(Remote {
                http,
                logs_url: format!("{}/logs", endpoint.trim_end_matches('/')),
                token,
            })),
            pending: Arc::default(),
        }
    }

    pub fn is_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub fn debug(&self, package: &str, message: impl Into<String>) {
        self.emit(LogLevel::Debug, package, message);
    }

    pub fn info(&self, package: &str, message: impl Into<String>) {
        self.emit(LogLevel::Info, package, message);
    }

    pub fn warn(&self, package: &str, message: impl Into<String>) {
        self.emit(LogLevel::Warn, package, message);
    }

    pub fn error(&self, package: &str, message: impl Into<String>) {
        self.emit(LogLevel::Error, package, message);
    }

    pub fn fatal(&self, package: &str, message: impl Into<String>) {
        self.emit(LogLevel::Fatal, package, message);
    }

    /// Record an event locally and, if possible, queue it for delivery.
    pub fn emit(&self, level: LogLevel, package: &str, message: impl Into<String>) {
        let message = message.into();

        match level {
            LogLevel::Debug => tracing::debug!(package, "{}", message),
            LogLevel::Info => tracing::info!(package, "{}", message),
            LogLevel::Warn => tracing::warn!(package, "{}", message),
            LogLevel::Error | LogLevel::Fatal => tracing::error!(package, %level, "{}", message),
        }

        let Some(remote) = self.remote.clone() else {
            return;
        };

        // Outside a runtime there is nowhere to run the request; local output
        // above is all we get.
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let entry = LogEntry {
            stack: self.stack,
            level,
            package: package.to_owned(),
            message,
            timestamp: Utc::now(),
        };

        let task = handle.spawn(async move {
            if let Err(e) = send(&remote, &entry).await {
                tracing::debug!("Failed to send log: {}", e);
            }
        });

        if let Ok(mut pending) = self.pending.lock() {
            pending.retain(|t| !t.is_finished());
            pending.push(task);
        }
    }

    /// Deliver one entry and wait for the acknowledgement.
    pub async fn send(&self, entry: &LogEntry) -> Result<(), RemoteError> {
        match &self.remote {
            Some(remote) => send(remote, entry).await,
            None => Err(RemoteError::MissingToken),
        }
    }

    /// Wait up to `timeout` for queued deliveries to finish.
    pub async fn flush(&self, timeout: Duration) {
        let tasks: Vec<JoinHandle<()>> = match self.pending.lock() {
            Ok(mut pending) => pending.drain(..).collect(),
            Err(_) => return,
        };

        if tasks.is_empty() {
            return;
        }

        let count = tasks.len();
        let wait = async {
            for task in tasks {
                let _ = task.await;
            }
        };

        if tokio::time::timeout(timeout, wait).await.is_err() {
            tracing::debug!("gave up waiting on {} log delivery task(s)", count);
        }
    }

    #[cfg(test)]
    fn pending_len(&self) -> usize {
        self.pending.lock().map(|p| p.len()).unwrap_or(0)
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::disabled()
    }
}

// ── Internal helpers ───────────────────────────────────────────────────────

async fn send(remote: &Remote, entry: &LogEntry) -> Result<(), RemoteError> {
    let resp = remote
        .http
        .post(&remote.logs_url)
        .bearer_auth(&remote.token)
        .json(entry)
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(RemoteError::Rejected { status, body });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_entry_wire_shape() {
        let entry = LogEntry {
            stack: Stack::Frontend,
            level: LogLevel::Warn,
            package: "component".into(),
            message: "Shortcode collision detected".into(),
            timestamp: Utc::now(),
        };

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["stack"], "frontend");
        assert_eq!(value["level"], "warn");
        assert_eq!(value["package"], "component");
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn blank_token_disables_remote() {
        assert!(!Telemetry::new("http://localhost/eval", None).is_remote());
        assert!(!Telemetry::new("http://localhost/eval", Some("  ".into())).is_remote());
        assert!(Telemetry::new("http://localhost/eval/", Some("tok".into())).is_remote());
    }

    #[test]
    fn emit_without_runtime_stays_local() {
        let telemetry = Telemetry::new("http://127.0.0.1:9", Some("tok".into()));
        telemetry.info("service", "no runtime here");
        assert_eq!(telemetry.pending_len(), 0);
    }

    #[tokio::test]
    async fn disabled_client_queues_nothing() {
        let telemetry = Telemetry::disabled();
        telemetry.error("store", "Failed to store URLs");
        assert_eq!(telemetry.pending_len(), 0);

        let entry = LogEntry {
            stack: Stack::Backend,
            level: LogLevel::Info,
            package: "api".into(),
            message: "hello".into(),
            timestamp: Utc::now(),
        };
        assert!(matches!(
            telemetry.send(&entry).await,
            Err(RemoteError::MissingToken)
        ));
    }

    #[tokio::test]
    async fn failed_delivery_is_swallowed() {
        // Nothing listens on the discard port; the send fails and is dropped.
        let telemetry = Telemetry::new("http://127.0.0.1:9", Some("tok".into()));
        telemetry.warn("handler", "best effort");
        assert_eq!(telemetry.pending_len(), 1);

        telemetry.flush(Duration::from_secs(5)).await;
        assert_eq!(telemetry.pending_len(), 0);
    }
}
