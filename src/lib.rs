//! A small local URL shortener.
//!
//! Short codes map to long URLs in a flat record list that is loaded and
//! rewritten whole through a [`store::RecordStore`]. [`service::LinkService`]
//! creates links, [`resolver::RedirectResolver`] turns a shortcode into a
//! destination, and [`tracker::ClickTracker`] counts visits.

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod resolver;
pub mod service;
pub mod shortcode;
pub mod stats;
pub mod store;
pub mod telemetry;
pub mod tracker;
pub mod validate;

pub use error::{Field, RemoteError, StorageError, ValidationError};
pub use models::{ClickDetail, NewLink, UrlRecord, Visit};
pub use resolver::{RedirectResolver, Resolution};
pub use service::LinkService;
pub use store::{JsonFileStore, MemoryStore, RecordStore};
pub use tracker::ClickTracker;
