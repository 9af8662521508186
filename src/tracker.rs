use std::sync::Arc;

use crate::{
    clock::{Clock, SystemClock},
    models::{ClickDetail, Visit},
    store::{self, RecordStore},
    telemetry::Telemetry,
};

/// Records visits against stored links.
///
/// Each call is a full read-modify-write of the record list; two trackers
/// writing at once will lose one of the updates.
pub struct ClickTracker {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    telemetry: Telemetry,
}

impl ClickTracker {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            telemetry: Telemetry::disabled(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_telemetry(mut self, telemetry: Telemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Bump the click counter for `shortcode` and append one click detail.
    ///
    /// Best-effort: an unknown shortcode or a storage failure is logged and
    /// otherwise ignored.
    pub fn track(&self, shortcode: &str, visit: &Visit) {
        let mut records = store::load_or_empty(self.store.as_ref());

        let Some(record) = records.iter_mut().find(|r| r.shortcode == shortcode) else {
            self.telemetry.warn(
                "component",
                format!("Click not tracked, unknown shortcode: {shortcode}"),
            );
            return;
        };

        record.clicks += 1;
        record.click_details.push(ClickDetail {
            timestamp: self.clock.now(),
            source: visit.source.clone(),
            user_agent: visit.user_agent.clone(),
        });

        if store::save_or_log(self.store.as_ref(), &records) {
            self.telemetry.info(
                "component",
                format!("Click tracked for shortcode: {shortcode}"),
            );
        } else {
            self.telemetry.error(
                "component",
                format!("Failed to track click for shortcode: {shortcode}"),
            );
        }
    }
}
