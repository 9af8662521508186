use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A shortened link as persisted in the records slot.
///
/// Field names on the wire are camelCase so existing `shortened_urls`
/// documents load unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlRecord {
    pub id: i64,
    pub long_url: String,
    pub shortcode: String,
    #[serde(default)]
    pub short_url: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(rename = "validity")]
    pub validity_minutes: i64,
    #[serde(default)]
    pub clicks: u64,
    #[serde(default)]
    pub click_details: Vec<ClickDetail>,
}

impl UrlRecord {
    /// `true` once `now` is strictly past `expires_at`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Time left before expiry, or `None` if already expired.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        if self.is_expired(now) {
            None
        } else {
            Some(self.expires_at - now)
        }
    }
}

/// A single recorded visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickDetail {
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub user_agent: String,
}

/// Where a visit came from. Copied into a [`ClickDetail`] when tracked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visit {
    pub source: String,
    pub user_agent: String,
}

impl Visit {
    pub fn new(source: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            user_agent: user_agent.into(),
        }
    }
}

/// Input to [`crate::service::LinkService::create`].
#[derive(Debug, Clone, Default)]
pub struct NewLink {
    pub long_url: String,
    pub custom_code: Option<String>,
    /// Falls back to the service's default validity when `None`.
    pub validity_minutes: Option<i64>,
}

impl NewLink {
    pub fn new(long_url: impl Into<String>) -> Self {
        Self {
            long_url: long_url.into(),
            ..Self::default()
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.custom_code = Some(code.into());
        self
    }

    pub fn with_validity(mut self, minutes: i64) -> Self {
        self.validity_minutes = Some(minutes);
        self
    }
}
