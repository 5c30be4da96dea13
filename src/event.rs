use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("Event 'Name' must not be empty")]
    EmptyName,

    #[error("Event 'Start Date' cannot be null")]
    MissingStartDate,

    #[error("Event 'End Date' cannot be null")]
    MissingEndDate,

    #[error("Event 'End Date' ({end}) must be greater or equal to 'Start Date' ({start})")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },

    #[error("Event '{field}' is not a valid URL: {value}")]
    InvalidUrl { field: &'static str, value: String },
}

/// Nature of an event, driven by the governing-body tag shown on its tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Social,
    /// Sanctioned by the WSDC.
    Competitive,
}

/// Unvalidated event fields, as read from a tile.
#[derive(Debug, Clone, Default)]
pub struct EventDraft {
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub city: String,
    pub country: String,
    pub full_location: Option<String>,
    pub facebook_url: Option<String>,
    pub website_url: Option<String>,
    pub banner_url: Option<String>,
    pub image_file: String,
    pub kind: Option<EventKind>,
}

/// A validated event. Only obtainable through [`EventDraft::build`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    id: String,
    name: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    city: String,
    country: String,
    full_location: Option<String>,
    facebook_url: Option<Url>,
    website_url: Option<Url>,
    banner_url: Option<Url>,
    image_file: String,
    kind: EventKind,
}

fn optional_url(field: &'static str, value: Option<String>) -> Result<Option<Url>, RecordError> {
    match value {
        Some(v) if !v.trim().is_empty() => Url::parse(v.trim())
            .map(Some)
            .map_err(|_| RecordError::InvalidUrl { field, value: v }),
        _ => Ok(None),
    }
}

/// `WESTIE_CAMP-20240112-20240114` for "Westie Camp" from 12 to 14 January 2024.
pub fn derive_id(name: &str, start: NaiveDate, end: NaiveDate) -> String {
    format!(
        "{}-{}-{}",
        name.replace(' ', "_"),
        start.format("%Y%m%d"),
        end.format("%Y%m%d")
    )
    .to_uppercase()
}

impl EventDraft {
    pub fn build(self) -> Result<EventRecord, RecordError> {
        if self.name.trim().is_empty() {
            return Err(RecordError::EmptyName);
        }
        let start = self.start_date.ok_or(RecordError::MissingStartDate)?;
        let end = self.end_date.ok_or(RecordError::MissingEndDate)?;
        if end < start {
            return Err(RecordError::EndBeforeStart { start, end });
        }

        Ok(EventRecord {
            id: derive_id(&self.name, start, end),
            name: self.name,
            start_date: start,
            end_date: end,
            city: self.city,
            country: self.country,
            full_location: self.full_location.filter(|l| !l.trim().is_empty()),
            facebook_url: optional_url("Facebook URL", self.facebook_url)?,
            website_url: optional_url("Website URL", self.website_url)?,
            banner_url: optional_url("Banner URL", self.banner_url)?,
            image_file: self.image_file,
            kind: self.kind.unwrap_or(EventKind::Social),
        })
    }
}

impl EventRecord {
    /// Upsert key for the event store.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn full_location(&self) -> Option<&str> {
        self.full_location.as_deref()
    }

    pub fn facebook_url(&self) -> Option<&Url> {
        self.facebook_url.as_ref()
    }

    pub fn website_url(&self) -> Option<&Url> {
        self.website_url.as_ref()
    }

    pub fn banner_url(&self) -> Option<&Url> {
        self.banner_url.as_ref()
    }

    /// Path component of the banner URL, empty when there is none.
    pub fn banner_resource(&self) -> &str {
        self.banner_url.as_ref().map(Url::path).unwrap_or("")
    }

    pub fn image_file(&self) -> &str {
        &self.image_file
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn is_competitive(&self) -> bool {
        self.kind == EventKind::Competitive
    }
}
