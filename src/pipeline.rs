//! Per-tile extraction: the data aspect (event record from static markup) and
//! the image aspect (PNG capture of the visible tile), each cached once per
//! tile index for the lifetime of one crawl.

use crate::constants::{messages, selectors, IMAGE_EXTENSION, SANCTIONED_TAG};
use crate::dates::parse_date_range;
use crate::driver::WebElement;
use crate::error::ExtractionError;
use crate::event::{EventDraft, EventKind, EventRecord};
use crate::types::{
    EventProcessor, ProcessingResult, RelativePosition, StepResult, TileIndex, TileOutcome,
};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::BTreeMap;
use tracing::debug;

static TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(selectors::TILE_TITLE).expect("valid selector"));
static SUBTITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(selectors::TILE_SUBTITLE).expect("valid selector"));
static DATES: Lazy<Selector> =
    Lazy::new(|| Selector::parse(selectors::TILE_DATES).expect("valid selector"));
static TAG: Lazy<Selector> =
    Lazy::new(|| Selector::parse(selectors::TILE_TAG).expect("valid selector"));

/// Everything extracted during one crawl, keyed by tile index.
///
/// Each index is populated at most once; later attempts for the same index
/// never overwrite it. A new crawl must start from a fresh session.
#[derive(Debug, Default)]
pub struct ExtractionSession {
    images: BTreeMap<TileIndex, Vec<u8>>,
    records: BTreeMap<TileIndex, EventRecord>,
}

impl ExtractionSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_image(&self, index: TileIndex) -> bool {
        self.images.contains_key(&index)
    }

    pub fn has_record(&self, index: TileIndex) -> bool {
        self.records.contains_key(&index)
    }

    /// Returns false, leaving the cache untouched, if `index` is already set.
    pub fn insert_image(&mut self, index: TileIndex, image: Vec<u8>) -> bool {
        if self.has_image(index) {
            return false;
        }
        self.images.insert(index, image);
        true
    }

    /// Returns false, leaving the cache untouched, if `index` is already set.
    pub fn insert_record(&mut self, index: TileIndex, record: EventRecord) -> bool {
        if self.has_record(index) {
            return false;
        }
        self.records.insert(index, record);
        true
    }

    pub fn images(&self) -> &BTreeMap<TileIndex, Vec<u8>> {
        &self.images
    }

    pub fn records(&self) -> &BTreeMap<TileIndex, EventRecord> {
        &self.records
    }

    pub fn into_parts(self) -> (BTreeMap<TileIndex, EventRecord>, BTreeMap<TileIndex, Vec<u8>>) {
        (self.records, self.images)
    }
}

/// Overall result of a tile from its data and image results.
///
/// Any combination that is neither both-skipped nor has a success or failure
/// (e.g. both NOT_STARTED) is reported as FAILED.
pub fn combine(data: ProcessingResult, image: ProcessingResult) -> ProcessingResult {
    use ProcessingResult::*;
    if data == Skipped && image == Skipped {
        Skipped
    } else if data == Successful || image == Successful {
        Successful
    } else {
        Failed
    }
}

fn text_of(fragment: &Html, selector: &Selector) -> String {
    fragment
        .select(selector)
        .next()
        .map(|el| el.text().collect::<Vec<_>>().join(" "))
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
}

/// Build an event record from the outer HTML of a tile.
pub fn parse_tile_markup(html: &str, index: TileIndex) -> Result<EventRecord, ExtractionError> {
    let fragment = Html::parse_fragment(html);

    let title = text_of(&fragment, &TITLE);
    let subtitle = text_of(&fragment, &SUBTITLE);
    let dates = text_of(&fragment, &DATES);
    let tag = text_of(&fragment, &TAG);

    // "City, Country"
    let (city, country) = subtitle.split_once(',').ok_or_else(|| {
        ExtractionError::MissingField(format!("city/country separator in '{subtitle}'"))
    })?;

    let range = parse_date_range(&dates)?;

    let kind = if tag.eq_ignore_ascii_case(SANCTIONED_TAG) {
        EventKind::Competitive
    } else {
        EventKind::Social
    };

    let draft = EventDraft {
        name: title,
        start_date: range.start,
        end_date: range.end,
        city: city.trim().to_string(),
        country: country.trim().to_string(),
        image_file: format!("{index}.{IMAGE_EXTENSION}"),
        kind: Some(kind),
        ..Default::default()
    };
    Ok(draft.build()?)
}

/// Extracts both the event data and the banner capture of each tile.
#[derive(Debug, Default)]
pub struct CombinedExtractor {
    session: ExtractionSession,
    outcome: TileOutcome,
}

impl CombinedExtractor {
    pub fn new(session: ExtractionSession) -> Self {
        Self {
            session,
            outcome: TileOutcome::default(),
        }
    }

    pub fn session(&self) -> &ExtractionSession {
        &self.session
    }

    pub fn into_session(self) -> ExtractionSession {
        self.session
    }

    async fn capture(tile: &dyn WebElement) -> Result<Vec<u8>, ExtractionError> {
        let area = tile
            .find_all(selectors::TILE_IMAGE)
            .await
            .map_err(ExtractionError::Capture)?
            .into_iter()
            .next()
            .ok_or_else(|| ExtractionError::MissingField("tile image area".to_string()))?;
        area.screenshot().await.map_err(ExtractionError::Capture)
    }

    async fn extract_image(
        &mut self,
        tile: &dyn WebElement,
        position: RelativePosition,
        index: TileIndex,
    ) -> StepResult {
        if self.session.has_image(index) {
            return StepResult::new(ProcessingResult::Skipped, messages::IMAGE_ALREADY_EXTRACTED);
        }

        let reason = match position {
            RelativePosition::Inside => {
                debug!(tile = index, "Processing event: element is visible");
                return match Self::capture(tile).await {
                    Ok(image) => {
                        self.session.insert_image(index, image);
                        StepResult::new(ProcessingResult::Successful, messages::IMAGE_EXTRACTED)
                    }
                    Err(e) => StepResult::new(
                        ProcessingResult::Failed,
                        format!("{}: {}", messages::IMAGE_FAILED, e),
                    ),
                };
            }
            RelativePosition::Above => messages::NOT_VISIBLE_YET,
            RelativePosition::OverlappingTop => messages::NOT_FULLY_VISIBLE_YET,
            RelativePosition::OverlappingBottom => messages::NOT_VISIBLE_ANYMORE,
            RelativePosition::Below => messages::NOT_FULLY_VISIBLE_ANYMORE,
        };
        StepResult::new(ProcessingResult::Skipped, reason)
    }

    async fn extract_data(&mut self, tile: &dyn WebElement, index: TileIndex) -> StepResult {
        if self.session.has_record(index) {
            return StepResult::new(ProcessingResult::Skipped, messages::DATA_ALREADY_EXTRACTED);
        }

        let parsed = match tile.outer_html().await {
            Ok(html) => parse_tile_markup(&html, index),
            Err(e) => Err(ExtractionError::Markup(e)),
        };
        match parsed {
            Ok(record) => {
                debug!(tile = index, id = record.id(), "Event parsed");
                self.session.insert_record(index, record);
                StepResult::new(ProcessingResult::Successful, messages::DATA_EXTRACTED)
            }
            Err(e) => StepResult::new(
                ProcessingResult::Failed,
                format!("{}: {}", messages::DATA_FAILED, e),
            ),
        }
    }
}

fn attempted(step: &StepResult) -> bool {
    matches!(
        step.result,
        ProcessingResult::Successful | ProcessingResult::Failed
    )
}

#[async_trait::async_trait]
impl EventProcessor for CombinedExtractor {
    fn name(&self) -> &'static str {
        "combined_extractor"
    }

    async fn process(
        &mut self,
        tile: &dyn WebElement,
        position: RelativePosition,
        index: TileIndex,
        reset: bool,
    ) -> bool {
        if reset {
            self.reset_batch();
        }

        let image = self.extract_image(tile, position, index).await;
        let data = self.extract_data(tile, index).await;

        let result = combine(data.result, image.result);
        let combined = StepResult::new(
            result,
            format!(
                "Result: {:<11} - Data: {:<11} - Image: {:<11}",
                result, data.result, image.result
            ),
        );

        let any_attempted = attempted(&image) || attempted(&data);
        self.outcome = TileOutcome {
            combined,
            data,
            image,
        };
        any_attempted
    }

    fn has_more(&self, position: RelativePosition) -> bool {
        !matches!(
            position,
            RelativePosition::Below | RelativePosition::OverlappingBottom
        )
    }

    fn reset_batch(&mut self) {
        self.outcome = TileOutcome::default();
    }

    fn last_outcome(&self) -> &TileOutcome {
        &self.outcome
    }
}
