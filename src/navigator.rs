//! Screen-level state machine: recognise where the session landed, log in or
//! navigate as needed, and run the collector once the events listing shows up.

use crate::collector::ScrollingCollector;
use crate::config::CrawlSettings;
use crate::constants::selectors;
use crate::driver::{wait, Driver, DriverError, Locator};
use crate::error::{CrawlError, Result};
use crate::retry::RetryBudget;
use crate::types::{EventProcessor, SiteSection};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Markers probed to recognise a section, in resolution order.
const SECTION_MARKERS: [(SiteSection, Locator); 5] = [
    (SiteSection::Home, selectors::HOME_PAGE),
    (SiteSection::LoginEmail, selectors::LOGIN_EMAIL_INPUT),
    (SiteSection::LoginPin, selectors::LOGIN_PIN_INPUT),
    (SiteSection::Events, selectors::EVENTS_PAGE),
    (SiteSection::Lessons, selectors::LESSONS_PAGE),
];

/// How a navigation run ended when it did not abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The events listing was crawled to the end.
    Completed { passes: u32 },
    /// Landed on a section the crawler does not handle.
    NotImplemented(SiteSection),
}

pub struct Navigator<'a> {
    driver: &'a dyn Driver,
    settings: &'a CrawlSettings,
    email: &'a str,
}

impl<'a> Navigator<'a> {
    pub fn new(driver: &'a dyn Driver, settings: &'a CrawlSettings, email: &'a str) -> Self {
        Self {
            driver,
            settings,
            email,
        }
    }

    /// Which section is on screen, `Unknown` if no marker shows up in time.
    pub async fn identify(&self) -> Result<SiteSection> {
        let locators: Vec<Locator> = SECTION_MARKERS.iter().map(|(_, l)| *l).collect();
        let found = wait::any_visible(
            self.driver,
            &locators,
            self.settings.section_probe(),
            self.settings.poll_interval(),
        )
        .await?;
        if !found {
            return Ok(SiteSection::Unknown);
        }

        for (section, locator) in SECTION_MARKERS {
            if wait::first_displayed(self.driver, locator).await?.is_some() {
                return Ok(section);
            }
        }
        // A marker was visible a moment ago but none resolves now
        Err(CrawlError::UnexpectedSection(SiteSection::Unknown))
    }

    pub async fn run(
        &self,
        processors: &mut [&mut dyn EventProcessor],
    ) -> Result<NavigationOutcome> {
        info!("Analysing current page");
        let mut budget = RetryBudget::new(self.settings.section_policy());

        loop {
            let section = self.identify().await?;
            if section != SiteSection::Unknown {
                budget.reset();
            }

            match section {
                SiteSection::Unknown => match budget.spend() {
                    Some(pause) => {
                        warn!(attempt = budget.used(), "Failed to identify page, waiting a bit more");
                        sleep(pause).await;
                    }
                    None => {
                        error!(attempts = budget.used(), "Giving up on identifying the page");
                        return Err(CrawlError::SectionNotIdentifiable {
                            attempts: budget.used(),
                        });
                    }
                },
                SiteSection::LoginEmail => {
                    info!("Login page found, no current session");
                    self.login().await?;
                }
                SiteSection::LoginPin => {
                    debug!("PIN input page found, authentication ongoing");
                    sleep(self.settings.poll_interval()).await;
                }
                SiteSection::Home => {
                    info!("Landing page found, already authenticated");
                    self.open_events().await?;
                }
                SiteSection::Events => {
                    info!("Event page found");
                    let collector = ScrollingCollector::new(self.driver, self.settings);
                    let passes = collector.collect(processors).await?;
                    return Ok(NavigationOutcome::Completed { passes });
                }
                SiteSection::Lessons => {
                    warn!("Lessons page found, not implemented");
                    return Ok(NavigationOutcome::NotImplemented(section));
                }
            }
        }
    }

    /// Type the email, submit, then hold until the PIN has been entered by hand.
    async fn login(&self) -> Result<()> {
        let timeout = self.settings.element_timeout();
        let poll = self.settings.poll_interval();

        let email_input = wait::visible(self.driver, selectors::LOGIN_EMAIL_INPUT, timeout, poll).await?;
        email_input.send_keys(self.email).await?;
        let button = wait::visible(self.driver, selectors::LOGIN_EMAIL_BUTTON, timeout, poll).await?;
        button.click().await?;

        wait::visible(self.driver, selectors::LOGIN_PIN_INPUT, timeout, poll).await?;
        let deadline = self.settings.authentication_timeout();
        info!(
            "Manual PIN input needed, you have {}s to check the mailbox and enter it",
            deadline.as_secs()
        );

        match wait::absent(self.driver, selectors::LOGIN_PIN_INPUT, deadline, poll).await {
            Ok(()) => {
                debug!("Manual PIN input detected");
                Ok(())
            }
            Err(DriverError::Timeout(_)) => {
                Err(CrawlError::AuthenticationTimeout { waited: deadline })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn open_events(&self) -> Result<()> {
        info!("Opening events");
        let tile = wait::visible(
            self.driver,
            selectors::HOME_EVENTS_TILE,
            self.settings.element_timeout(),
            self.settings.poll_interval(),
        )
        .await?;
        tile.click().await?;
        Ok(())
    }
}
