//! Link creation.
//!
//! Composes the generator, the validator, and the record store. Every check
//! runs against a single snapshot of the store and nothing is written unless
//! all of them pass.

use std::sync::Arc;

use chrono::Duration;

use crate::{
    clock::{Clock, SystemClock},
    error::ValidationError,
    models::{NewLink, UrlRecord},
    shortcode,
    store::{self, RecordStore},
    telemetry::Telemetry,
    validate,
};

/// Default validity window for new links, in minutes.
pub const DEFAULT_VALIDITY_MINUTES: i64 = 30;

/// How many random codes to draw before giving up on a generated shortcode.
pub const MAX_GENERATE_ATTEMPTS: usize = 10;

/// Produces a candidate shortcode of the given length.
type CodeGenerator = dyn Fn(usize) -> String + Send + Sync;

pub struct LinkService {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    telemetry: Telemetry,
    base_url: String,
    default_validity: i64,
    code_length: usize,
    generate_code: Arc<CodeGenerator>,
}

impl LinkService {
    pub fn new(store: Arc<dyn RecordStore>, base_url: &str) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            telemetry: Telemetry::disabled(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            default_validity: DEFAULT_VALIDITY_MINUTES,
            code_length: shortcode::DEFAULT_LENGTH,
            generate_code: Arc::new(shortcode::generate),
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

    pub fn with_default_validity(mut self, minutes: i64) -> Self {
        self.default_validity = minutes;
        self
    }

    #[cfg(test)]
    fn with_code_length(mut self, len: usize) -> Self {
        self.code_length = len;
        self
    }

    #[cfg(test)]
    fn with_code_generator(
        mut self,
        generate: impl Fn(usize) -> String + Send + Sync + 'static,
    ) -> Self {
        self.generate_code = Arc::new(generate);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `<base-origin>/<shortcode>`
    pub fn short_url(&self, code: &str) -> String {
        format!("{}/{}", self.base_url, code)
    }

    /// Validate `link`, assign a shortcode and expiry, and append the new
    /// record to the store.
    ///
    /// Checks run in order: URL, custom shortcode syntax, shortcode
    /// uniqueness, validity range. A generated shortcode that collides is
    /// redrawn up to [`MAX_GENERATE_ATTEMPTS`] times; a custom one is
    /// rejected outright.
    pub fn create(&self, link: NewLink) -> Result<UrlRecord, ValidationError> {
        let long_url = link.long_url.trim();
        if long_url.is_empty() {
            self.telemetry.warn("component", "Empty URL submitted");
            return Err(ValidationError::EmptyUrl);
        }
        if !validate::is_valid_url(long_url) {
            self.telemetry.error("component", "Invalid URL entered by user");
            return Err(ValidationError::InvalidUrl(long_url.to_owned()));
        }

        // Only an empty code counts as absent; surrounding whitespace fails
        // the syntax check like any other non-alphanumeric character.
        let custom_code = link.custom_code.as_deref().filter(|s| !s.is_empty());

        if let Some(code) = custom_code {
            if !validate::is_valid_shortcode(code) {
                self.telemetry
                    .warn("component", "Invalid shortcode format entered");
                return Err(ValidationError::InvalidShortcode(code.to_owned()));
            }
        }

        let mut records = store::load_or_empty(self.store.as_ref());

        let shortcode = match custom_code {
            Some(code) => {
                if !validate::is_unique(code, &records) {
                    self.telemetry.warn("component", "Shortcode collision detected");
                    return Err(ValidationError::ShortcodeTaken(code.to_owned()));
                }
                code.to_owned()
            }
            None => self.generate_unique_code(&records)?,
        };

        let validity_minutes = link.validity_minutes.unwrap_or(self.default_validity);
        if !validate::is_valid_validity(validity_minutes) {
            self.telemetry
                .warn("component", "Invalid validity period entered");
            return Err(ValidationError::ValidityOutOfRange(validity_minutes));
        }

        let created_at = self.clock.now();
        let expires_at = created_at + Duration::minutes(validity_minutes);

        // Millisecond timestamps make good ids until two links land in the
        // same millisecond.
        let last_id = records.iter().map(|r| r.id).max().unwrap_or(i64::MIN);
        let id = created_at.timestamp_millis().max(last_id.saturating_add(1));

        let record = UrlRecord {
            id,
            long_url: long_url.to_owned(),
            short_url: self.short_url(&shortcode),
            shortcode,
            created_at,
            expires_at,
            validity_minutes,
            clicks: 0,
            click_details: Vec::new(),
        };

        records.push(record.clone());
        if store::save_or_log(self.store.as_ref(), &records) {
            self.telemetry.info(
                "component",
                format!("URL shortened successfully: {}", record.shortcode),
            );
        } else {
            self.telemetry.error("component", "Failed to store URLs");
        }

        Ok(record)
    }

    /// Every stored record, oldest first.
    pub fn list(&self) -> Vec<UrlRecord> {
        store::load_or_empty(self.store.as_ref())
    }

    /// Look up one record by shortcode.
    pub fn get(&self, code: &str) -> Option<UrlRecord> {
        self.list().into_iter().find(|r| r.shortcode == code)
    }

    fn generate_unique_code(&self, existing: &[UrlRecord]) -> Result<String, ValidationError> {
        let mut attempts = 1;
        let mut code = (self.generate_code)(self.code_length);

        while !validate::is_unique(&code, existing) {
            tracing::debug!("generated shortcode '{}' collided (attempt {})", code, attempts);
            if attempts == MAX_GENERATE_ATTEMPTS {
                self.telemetry.warn("component", "Shortcode collision detected");
                return Err(ValidationError::ShortcodeTaken(code));
            }
            attempts += 1;
            code = (self.generate_code)(self.code_length);
        }

        Ok(code)
    }
}
