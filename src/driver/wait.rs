//! Bounded waits on UI conditions.
//!
//! Every suspension point of a crawl goes through [`until`]: a condition is
//! probed repeatedly until it holds or the deadline passes. Stale or missing
//! elements observed while probing just mean "not yet".

use super::{Driver, DriverError, DriverResult, Locator, WebElement};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::trace;

/// Probe `condition` every `poll` until it yields a value or `timeout`
/// elapses. The condition is always probed at least once.
pub async fn until<T, F, Fut>(
    what: &str,
    timeout: Duration,
    poll: Duration,
    mut condition: F,
) -> DriverResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = DriverResult<Option<T>>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        match condition().await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {}
            Err(e @ (DriverError::StaleElement(_) | DriverError::NoSuchElement(_))) => {
                trace!("Waiting for {}: {}", what, e);
            }
            Err(e) => return Err(e),
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(DriverError::Timeout(what.to_string()));
        }
        sleep(poll.min(deadline - now)).await;
    }
}

/// First displayed element matching `locator`, if any, without waiting.
pub async fn first_displayed(
    driver: &dyn Driver,
    locator: Locator,
) -> DriverResult<Option<Box<dyn WebElement>>> {
    for element in driver.find_elements(locator).await? {
        if element.is_displayed().await? {
            return Ok(Some(element));
        }
    }
    Ok(None)
}

/// Wait for an element matching `locator` to be displayed.
pub async fn visible(
    driver: &dyn Driver,
    locator: Locator,
    timeout: Duration,
    poll: Duration,
) -> DriverResult<Box<dyn WebElement>> {
    let what = format!("{locator} to be visible");
    until(&what, timeout, poll, || first_displayed(driver, locator)).await
}

/// Wait until no element matches `locator` anymore.
pub async fn absent(
    driver: &dyn Driver,
    locator: Locator,
    timeout: Duration,
    poll: Duration,
) -> DriverResult<()> {
    let what = format!("{locator} to disappear");
    until(&what, timeout, poll, || async move {
        let found = driver.find_elements(locator).await?;
        Ok(found.is_empty().then_some(()))
    })
    .await
}

/// Whether any of `locators` becomes visible within `timeout`.
pub async fn any_visible(
    driver: &dyn Driver,
    locators: &[Locator],
    timeout: Duration,
    poll: Duration,
) -> DriverResult<bool> {
    let outcome = until("any section marker", timeout, poll, || async move {
        for locator in locators {
            if first_displayed(driver, *locator).await?.is_some() {
                return Ok(Some(()));
            }
        }
        Ok(None)
    })
    .await;

    match outcome {
        Ok(()) => Ok(true),
        Err(DriverError::Timeout(_)) => Ok(false),
        Err(e) => Err(e),
    }
}
