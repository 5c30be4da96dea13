use crate::driver::WebElement;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of an event card as assigned by the listing's virtualization.
/// Only stable within one listing session.
pub type TileIndex = u32;

/// Vertical placement of a tile relative to the scrolling viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelativePosition {
    Above,
    OverlappingTop,
    Inside,
    OverlappingBottom,
    Below,
}

/// Outcome of one aspect (data, image or combined) of a tile-processing attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingResult {
    #[default]
    NotStarted,
    Successful,
    Skipped,
    Failed,
}

impl fmt::Display for ProcessingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProcessingResult::NotStarted => "NOT_STARTED",
            ProcessingResult::Successful => "SUCCESSFUL",
            ProcessingResult::Skipped => "SKIPPED",
            ProcessingResult::Failed => "FAILED",
        };
        // Padded so per-tile log lines stay aligned
        f.pad(label)
    }
}

/// Screens of the application the navigator knows how to recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SiteSection {
    LoginEmail,
    LoginPin,
    Home,
    Events,
    Lessons,
    Unknown,
}

impl fmt::Display for SiteSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SiteSection::LoginEmail => "LOGIN_EMAIL",
            SiteSection::LoginPin => "LOGIN_PIN",
            SiteSection::Home => "HOME",
            SiteSection::Events => "EVENTS",
            SiteSection::Lessons => "LESSONS",
            SiteSection::Unknown => "UNKNOWN",
        };
        f.write_str(label)
    }
}

/// A result together with the human-readable reason behind it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepResult {
    pub result: ProcessingResult,
    pub reason: String,
}

impl StepResult {
    pub fn new(result: ProcessingResult, reason: impl Into<String>) -> Self {
        Self {
            result,
            reason: reason.into(),
        }
    }
}

/// Combined, data and image results of the latest `process` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileOutcome {
    pub combined: StepResult,
    pub data: StepResult,
    pub image: StepResult,
}

/// Core trait every tile processing strategy must implement.
///
/// The collector holds an ordered list of processors and, for each pass, lets
/// every processor scan the full visible tile list before moving to the next.
#[async_trait::async_trait]
pub trait EventProcessor: Send {
    /// Identifier used in logs and metrics
    fn name(&self) -> &'static str;

    /// Process one eligible tile. Returns true when at least one aspect was
    /// attempted, whether it succeeded or not.
    async fn process(
        &mut self,
        tile: &dyn WebElement,
        position: RelativePosition,
        index: TileIndex,
        reset: bool,
    ) -> bool;

    /// Whether tiles at `position` (and, by document order, everything after
    /// them) are still worth scanning during the current pass.
    fn has_more(&self, position: RelativePosition) -> bool;

    /// Clear pass-scoped transient state.
    fn reset_batch(&mut self);

    fn last_outcome(&self) -> &TileOutcome;
}
