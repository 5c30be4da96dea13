use crate::dates::DateRangeError;
use crate::driver::DriverError;
use crate::event::RecordError;
use crate::types::SiteSection;
use std::time::Duration;
use thiserror::Error;

/// Crawl-aborting failures. Anything surfacing as a `CrawlError` unwinds the
/// whole navigation loop.
#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("section not identifiable after {attempts} attempts")]
    SectionNotIdentifiable { attempts: u32 },

    #[error("authentication timed out after {waited:?} waiting for the PIN to be entered")]
    AuthenticationTimeout { waited: Duration },

    #[error("viewport not found after {attempts} attempts")]
    ViewportNotFound { attempts: u32 },

    #[error("last tile reference not found after {attempts} attempts")]
    LastReferenceNotFound { attempts: u32 },

    #[error("unexpected site section: {0}")]
    UnexpectedSection(SiteSection),

    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, CrawlError>;

/// Per-tile failures. Recorded as FAILED for the affected aspect and never
/// propagated past the extraction pipeline.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("image capture failed: {0}")]
    Capture(#[source] DriverError),

    #[error("tile markup unavailable: {0}")]
    Markup(#[source] DriverError),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error(transparent)]
    DateRange(#[from] DateRangeError),

    #[error(transparent)]
    Record(#[from] RecordError),
}
