use crate::config::Config;
use crate::driver::webdriver::FantocciniDriver;
use crate::driver::Driver;
use crate::error::Result;
use crate::metrics;
use crate::navigator::{NavigationOutcome, Navigator};
use crate::pipeline::{CombinedExtractor, ExtractionSession};
use crate::session::{self, CookieStore};
use crate::storage::EventSink;
use crate::types::{EventProcessor, SiteSection};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlOutcome {
    Completed,
    NotImplemented(SiteSection),
}

impl CrawlOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrawlOutcome::Completed => "completed",
            CrawlOutcome::NotImplemented(_) => "not_implemented",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub run_id: Uuid,
    pub outcome: CrawlOutcome,
    pub passes: u32,
    pub records: usize,
    pub images: usize,
    pub duration: Duration,
}

impl fmt::Display for CrawlReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run {}: {} after {} passes, {} events, {} images in {:.1}s",
            self.run_id,
            self.outcome.as_str(),
            self.passes,
            self.records,
            self.images,
            self.duration.as_secs_f64()
        )
    }
}

/// One crawl of the events listing, from an open browser session to the
/// exported records.
pub struct Crawler {
    config: Config,
    sink: Option<Arc<dyn EventSink>>,
}

impl Crawler {
    pub fn new(config: Config) -> Self {
        Self { config, sink: None }
    }

    /// Export extracted records and images once the listing has been crawled.
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Open a WebDriver session for the configured browser and crawl.
    pub async fn run(&self) -> Result<CrawlReport> {
        let driver = FantocciniDriver::connect(&self.config.browser).await?;
        self.run_with_driver(&driver).await
    }

    /// Crawl through an already open session. Cookies are saved and the
    /// session closed on every exit path.
    pub async fn run_with_driver(&self, driver: &dyn Driver) -> Result<CrawlReport> {
        let run_id = Uuid::new_v4();
        let started = Instant::now();
        info!(%run_id, url = %self.config.site.url, "Starting crawl");

        let store = CookieStore::new(&self.config.output.cookies_file);
        let mut extractor = CombinedExtractor::new(ExtractionSession::new());

        let outcome = self.crawl(driver, &store, &mut extractor).await;

        session::persist(driver, &store).await;
        if let Err(e) = driver.close().await {
            warn!("Could not close the browser session: {}", e);
        }

        let navigation = match outcome {
            Ok(navigation) => navigation,
            Err(e) => {
                error!(%run_id, "Crawl aborted: {}", e);
                metrics::record_run("failed");
                return Err(e);
            }
        };

        let session = extractor.into_session();
        let (outcome, passes) = match navigation {
            NavigationOutcome::Completed { passes } => (CrawlOutcome::Completed, passes),
            NavigationOutcome::NotImplemented(section) => (CrawlOutcome::NotImplemented(section), 0),
        };

        // A run that never reached the listing must not replace the last export
        if let (Some(sink), CrawlOutcome::Completed) = (&self.sink, outcome) {
            let records: Vec<_> = session.records().values().cloned().collect();
            sink.store_events(&records).await?;
            sink.store_images(session.images()).await?;
        }

        let report = CrawlReport {
            run_id,
            outcome,
            passes,
            records: session.records().len(),
            images: session.images().len(),
            duration: started.elapsed(),
        };
        metrics::record_run(outcome.as_str());
        info!("Finished crawl, {}", report);
        Ok(report)
    }

    async fn crawl(
        &self,
        driver: &dyn Driver,
        store: &CookieStore,
        extractor: &mut CombinedExtractor,
    ) -> Result<NavigationOutcome> {
        let url = &self.config.site.url;
        driver.navigate(url).await?;
        // Cookies only apply to the domain currently loaded
        if session::restore(driver, store).await > 0 {
            driver.navigate(url).await?;
        }

        let navigator = Navigator::new(driver, &self.config.crawl, &self.config.site.email);
        let processor: &mut dyn EventProcessor = extractor;
        navigator.run(&mut [processor]).await
    }
}
