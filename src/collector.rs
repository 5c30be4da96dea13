//! Drives one listing screen: scan the visible tiles, hand them to every
//! processor, scroll, and stop once the trailing tile no longer changes.

use crate::config::CrawlSettings;
use crate::constants::{selectors, TILE_INDEX_ATTR};
use crate::driver::{wait, Driver, DriverError, WebElement};
use crate::error::{CrawlError, Result};
use crate::metrics;
use crate::retry::RetryPolicy;
use crate::types::{EventProcessor, ProcessingResult, TileIndex};
use crate::viewport;
use serde_json::json;
use tracing::{debug, error, info, trace, warn};

const HIDE_SCRIPT: &str = "arguments[0].style.visibility = 'hidden';";
const NO_POINTER_SCRIPT: &str = "arguments[0].style.pointerEvents = 'none';";
const SCROLL_SCRIPT: &str =
    "arguments[0].scrollBy({top: arguments[1], left: 0, behavior: 'smooth'});";

pub struct ScrollingCollector<'a> {
    driver: &'a dyn Driver,
    settings: &'a CrawlSettings,
    lookup: RetryPolicy,
}

impl<'a> ScrollingCollector<'a> {
    pub fn new(driver: &'a dyn Driver, settings: &'a CrawlSettings) -> Self {
        Self {
            driver,
            settings,
            lookup: settings.lookup_policy(),
        }
    }

    /// Run scroll passes until the list converges. Returns the number of passes.
    pub async fn collect(&self, processors: &mut [&mut dyn EventProcessor]) -> Result<u32> {
        info!("Starting event collection");
        let mut passes = 0;

        loop {
            passes += 1;
            self.hide_hud().await;

            for processor in processors.iter_mut() {
                self.scan(&mut **processor).await?;
            }

            let before = self.last_reference().await?;
            self.scroll().await?;
            let after = self.last_reference().await?;
            metrics::record_pass();

            if before == after {
                info!(passes, "End of list reached");
                return Ok(passes);
            }
            debug!(pass = passes, before = %before, after = %after, "List advanced");
        }
    }

    /// One processor over the tiles currently in the document.
    async fn scan(&self, processor: &mut dyn EventProcessor) -> Result<()> {
        let tiles = self.driver.find_elements(selectors::EVENT_TILES).await?;
        trace!(processor = processor.name(), count = tiles.len(), "Scanning tiles");

        for tile in tiles {
            let Some(index) = eligible_index(tile.as_ref()).await else {
                continue;
            };

            let rect = match tile.rect().await {
                Ok(rect) => rect,
                Err(e) => {
                    debug!(tile = index, "Tile moved before it could be measured: {}", e);
                    continue;
                }
            };
            let viewport = viewport::locate(
                self.driver,
                &self.lookup,
                self.settings.element_timeout(),
                self.settings.poll_interval(),
            )
            .await?;
            let position = viewport::classify(&rect, &viewport);

            if !processor.has_more(position) {
                trace!(tile = index, ?position, "Nothing more to process in this pass");
                break;
            }

            processor.process(tile.as_ref(), position, index, true).await;
            log_outcome(processor, index);
        }
        Ok(())
    }

    /// Text of the trailing tile, used to detect that the list stopped growing.
    async fn last_reference(&self) -> Result<String> {
        let timeout = self.settings.element_timeout();
        let poll = self.settings.poll_interval();
        self.lookup
            .run("last tile lookup", DriverError::is_stale, || async move {
                let tile = wait::visible(self.driver, selectors::LAST_EVENT_TILE, timeout, poll).await?;
                tile.text().await
            })
            .await
            .map_err(|e| CrawlError::LastReferenceNotFound {
                attempts: e.attempts(),
            })
    }

    async fn scroll(&self) -> Result<()> {
        let container = wait::visible(
            self.driver,
            selectors::LIST_CONTAINER,
            self.settings.element_timeout(),
            self.settings.poll_interval(),
        )
        .await?;
        self.driver
            .run_script(
                SCROLL_SCRIPT,
                vec![container.script_handle(), json!(self.settings.scroll_step)],
            )
            .await?;
        tokio::time::sleep(self.settings.scroll_settle()).await;
        Ok(())
    }

    /// Hide the overlays drawn on top of the tiles so captures stay clean.
    async fn hide_hud(&self) {
        let overlays = [
            (selectors::FAVORITE_TOGGLES, HIDE_SCRIPT),
            (selectors::FILTERS_BUTTON, HIDE_SCRIPT),
            (selectors::IMAGES, NO_POINTER_SCRIPT),
        ];
        for (locator, script) in overlays {
            let elements = match self.driver.find_elements(locator).await {
                Ok(elements) => elements,
                Err(e) => {
                    warn!("Could not look up {}: {}", locator, e);
                    continue;
                }
            };
            for element in elements {
                if let Err(e) = self
                    .driver
                    .run_script(script, vec![element.script_handle()])
                    .await
                {
                    warn!("Could not clean up {}: {}", locator, e);
                }
            }
        }
    }
}

/// Index of a tile that carries an identity and an image area, `None` otherwise.
async fn eligible_index(tile: &dyn WebElement) -> Option<TileIndex> {
    let index = tile
        .attribute(TILE_INDEX_ATTR)
        .await
        .ok()
        .flatten()?
        .trim()
        .parse::<TileIndex>()
        .ok()?;
    match tile.find_all(selectors::TILE_IMAGE).await {
        Ok(areas) if !areas.is_empty() => Some(index),
        _ => None,
    }
}

fn log_outcome(processor: &dyn EventProcessor, index: TileIndex) {
    let outcome = processor.last_outcome();
    let combined = outcome.combined.result;
    metrics::record_tile(processor.name(), combined);

    if combined == ProcessingResult::Failed {
        error!(
            tile = index,
            result = %combined,
            data = %outcome.data.result,
            image = %outcome.image.result,
            data_reason = %outcome.data.reason,
            image_reason = %outcome.image.reason,
            "Tile {:04}: {}",
            index,
            outcome.combined.reason
        );
    } else {
        info!(
            tile = index,
            result = %combined,
            data = %outcome.data.result,
            image = %outcome.image.result,
            data_reason = %outcome.data.reason,
            image_reason = %outcome.image.reason,
            "Tile {:04}: {}",
            index,
            outcome.combined.reason
        );
    }
}
