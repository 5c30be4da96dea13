use crate::constants::selectors;
use crate::driver::{wait, Driver, DriverError, Rect};
use crate::error::{CrawlError, Result};
use crate::retry::RetryPolicy;
use crate::types::RelativePosition;
use std::time::Duration;

/// Classify `event` against `viewport` along the vertical axis.
///
/// Boundaries are inclusive: a tile whose bottom edge touches the viewport's
/// top edge is ABOVE, one whose top edge touches the viewport's bottom edge is
/// BELOW.
pub fn classify(event: &Rect, viewport: &Rect) -> RelativePosition {
    if event.bottom() <= viewport.y {
        return RelativePosition::Above;
    }
    if event.y >= viewport.bottom() {
        return RelativePosition::Below;
    }
    if event.bottom() > viewport.y && event.y < viewport.y {
        return RelativePosition::OverlappingTop;
    }
    if event.y < viewport.bottom() && event.bottom() > viewport.bottom() {
        return RelativePosition::OverlappingBottom;
    }
    RelativePosition::Inside
}

/// Bounding box of the live scrolling viewport.
///
/// Stale handles are retried up to the policy's ceiling; any other failure,
/// or running out of attempts, aborts the crawl.
pub async fn locate(
    driver: &dyn Driver,
    policy: &RetryPolicy,
    timeout: Duration,
    poll: Duration,
) -> Result<Rect> {
    policy
        .run("viewport lookup", DriverError::is_stale, || async move {
            let element = wait::visible(driver, selectors::VIEWPORT, timeout, poll).await?;
            element.rect().await
        })
        .await
        .map_err(|e| CrawlError::ViewportNotFound {
            attempts: e.attempts(),
        })
}
