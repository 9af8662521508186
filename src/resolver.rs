use std::{sync::Arc, time::Duration};

use crate::{
    clock::{Clock, SystemClock},
    models::Visit,
    store::RecordStore,
    telemetry::Telemetry,
    tracker::ClickTracker,
};

/// How long the "redirecting" notice is shown before navigating.
pub const DEFAULT_REDIRECT_DELAY: Duration = Duration::from_millis(2000);

/// Outcome of looking up a shortcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// No record uses this shortcode.
    NotFound { shortcode: String },
    /// The record exists but its validity window has passed. The destination
    /// is exposed for display only.
    Expired { long_url: String },
    /// Navigate to `long_url` once `delay` has elapsed. The click has already
    /// been recorded.
    Found { long_url: String, delay: Duration },
    /// The store could not be read.
    Error { message: String },
}

impl Resolution {
    /// Destination to navigate to, only for [`Resolution::Found`].
    pub fn destination(&self) -> Option<&str> {
        match self {
            Resolution::Found { long_url, .. } => Some(long_url),
            _ => None,
        }
    }
}

/// Shortcode lookup for visitors.
pub struct RedirectResolver {
    store: Arc<dyn RecordStore>,
    tracker: ClickTracker,
    clock: Arc<dyn Clock>,
    telemetry: Telemetry,
    delay: Duration,
}

impl RedirectResolver {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            tracker: ClickTracker::new(store.clone()),
            store,
            clock: Arc::new(SystemClock),
            telemetry: Telemetry::disabled(),
            delay: DEFAULT_REDIRECT_DELAY,
        }
    }

    /// Shares the clock with the click tracker.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.tracker = self.tracker.with_clock(clock.clone());
        self.clock = clock;
        self
    }

    pub fn with_telemetry(mut self, telemetry: Telemetry) -> Self {
        self.tracker = self.tracker.with_telemetry(telemetry.clone());
        self.telemetry = telemetry;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Classify `shortcode` and, if it is live, record the visit.
    ///
    /// 1. Load the record list (a read failure ends in `Error`).
    /// 2. Missing shortcode ends in `NotFound`.
    /// 3. Past `expires_at` ends in `Expired`; no click is recorded.
    /// 4. Otherwise track the click exactly once and return `Found`.
    pub fn resolve(&self, shortcode: &str, visit: &Visit) -> Resolution {
        self.telemetry.info(
            "component",
            format!("Attempting redirect for shortcode: {shortcode}"),
        );

        let records = match self.store.load() {
            Ok(r) => r,
            Err(e) => {
                self.telemetry.error(
                    "component",
                    format!("Redirect error for shortcode {shortcode}: {e}"),
                );
                return Resolution::Error {
                    message: "An error occurred while processing the redirect".into(),
                };
            }
        };

        let Some(record) = records.into_iter().find(|r| r.shortcode == shortcode) else {
            self.telemetry
                .warn("component", format!("Shortcode not found: {shortcode}"));
            return Resolution::NotFound {
                shortcode: shortcode.to_owned(),
            };
        };

        if record.is_expired(self.clock.now()) {
            self.telemetry.warn(
                "component",
                format!("Expired shortcode accessed: {shortcode}"),
            );
            return Resolution::Expired {
                long_url: record.long_url,
            };
        }

        self.tracker.track(shortcode, visit);

        self.telemetry.info(
            "component",
            format!("Successful redirect for shortcode: {shortcode}"),
        );
        Resolution::Found {
            long_url: record.long_url,
            delay: self.delay,
        }
    }
}
