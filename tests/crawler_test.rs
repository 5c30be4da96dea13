mod common;

#[cfg(test)]
mod tests {
    use super::common::{fast_settings, FakeDriver, FakeTile, Page, PNG};
    use anyhow::Result;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;
    use std::fs;
    use std::sync::Arc;
    use tempfile::tempdir;
    use westie_crawler::config::Config;
    use westie_crawler::crawler::{CrawlOutcome, Crawler};
    use westie_crawler::error::CrawlError;
    use westie_crawler::event::{EventDraft, EventRecord};
    use westie_crawler::session::{CookieStore, SessionCookie};
    use westie_crawler::storage::{EventSink, FileSink, InMemorySink};
    use westie_crawler::types::SiteSection;

    fn config(root: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.site.email = "dancer@example.com".to_string();
        config.crawl = fast_settings();
        config.output.dir = root.join("out");
        config.output.cookies_file = root.join("cookies.json");
        config
    }

    fn cookie(name: &str) -> SessionCookie {
        SessionCookie {
            name: name.to_string(),
            value: "secret".to_string(),
            domain: Some("westie.app".to_string()),
            path: Some("/".to_string()),
            expiry: Some(1_893_456_000),
            secure: true,
        }
    }

    fn record(name: &str, day: u32) -> Result<EventRecord> {
        Ok(EventDraft {
            name: name.to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, day),
            end_date: NaiveDate::from_ymd_opt(2024, 1, day + 2),
            city: "Paris".to_string(),
            country: "France".to_string(),
            image_file: format!("{day}.png"),
            ..Default::default()
        }
        .build()?)
    }

    #[tokio::test]
    async fn test_full_crawl_exports_and_keeps_session() -> Result<()> {
        let dir = tempdir()?;
        let config = config(dir.path());
        CookieStore::new(&config.output.cookies_file).save(&[cookie("sid")])?;

        let driver = FakeDriver::on(Page::Home).with(|s| {
            s.listing = vec![vec![FakeTile::new(0, 200.0), FakeTile::new(1, 400.0)]];
        });
        let sink = Arc::new(InMemorySink::new());
        let crawler = Crawler::new(config.clone()).with_sink(sink.clone());

        let report = crawler.run_with_driver(&driver).await?;

        assert_eq!(report.outcome, CrawlOutcome::Completed);
        assert_eq!(report.passes, 1);
        assert_eq!(report.records, 2);
        assert_eq!(report.images, 2);
        assert_eq!(sink.event_count(), 2);
        assert_eq!(sink.image(1), Some(PNG.to_vec()));
        assert!(sink.event("EVENT_0-20240112-20240114").is_some());

        // Restored cookies need a reload to take effect
        assert_eq!(driver.snapshot(|s| s.navigations.len()), 2);
        assert_eq!(driver.snapshot(|s| s.closes), 1);
        let saved = CookieStore::new(&config.output.cookies_file).load()?;
        assert_eq!(saved, vec![cookie("sid")]);
        Ok(())
    }

    #[tokio::test]
    async fn test_fatal_error_still_cleans_up() -> Result<()> {
        let dir = tempdir()?;
        let config = config(dir.path());
        let driver = FakeDriver::on(Page::Blank).with(|s| s.cookies = vec![cookie("sid")]);
        let sink = Arc::new(InMemorySink::new());
        let crawler = Crawler::new(config.clone()).with_sink(sink.clone());

        let err = crawler.run_with_driver(&driver).await.unwrap_err();

        assert!(matches!(err, CrawlError::SectionNotIdentifiable { .. }));
        assert_eq!(driver.snapshot(|s| s.closes), 1);
        assert_eq!(driver.snapshot(|s| s.navigations.len()), 1);
        assert_eq!(
            CookieStore::new(&config.output.cookies_file).load()?,
            vec![cookie("sid")]
        );
        assert_eq!(sink.event_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_lessons_page_reports_not_implemented() -> Result<()> {
        let dir = tempdir()?;
        let driver = FakeDriver::on(Page::Lessons);
        let report = Crawler::new(config(dir.path()))
            .run_with_driver(&driver)
            .await?;

        assert_eq!(
            report.outcome,
            CrawlOutcome::NotImplemented(SiteSection::Lessons)
        );
        assert_eq!(report.records, 0);
        assert_eq!(driver.snapshot(|s| s.closes), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_lessons_page_keeps_previous_export() -> Result<()> {
        let dir = tempdir()?;
        let config = config(dir.path());
        let images_dir = config.output.images_dir();
        fs::create_dir_all(&images_dir)?;
        fs::write(images_dir.join("12.png"), PNG)?;
        let events_path = config.output.dir.join("events.json");
        fs::write(&events_path, r#"[{"previous": true}]"#)?;

        let sink = Arc::new(FileSink::new(&config.output.dir, &images_dir));
        let driver = FakeDriver::on(Page::Lessons);
        let report = Crawler::new(config.clone())
            .with_sink(sink)
            .run_with_driver(&driver)
            .await?;

        assert_eq!(
            report.outcome,
            CrawlOutcome::NotImplemented(SiteSection::Lessons)
        );
        assert_eq!(fs::read(images_dir.join("12.png"))?, PNG.to_vec());
        assert_eq!(fs::read_to_string(&events_path)?, r#"[{"previous": true}]"#);
        Ok(())
    }

    #[tokio::test]
    async fn test_file_sink_replaces_previous_images() -> Result<()> {
        let dir = tempdir()?;
        let images_dir = dir.path().join("images");
        fs::create_dir_all(&images_dir)?;
        fs::write(images_dir.join("41.png"), b"old")?;
        fs::write(images_dir.join("notes.txt"), b"keep")?;

        let sink = FileSink::new(dir.path(), &images_dir);
        let mut images = BTreeMap::new();
        images.insert(1, PNG.to_vec());
        images.insert(2, PNG.to_vec());
        sink.store_images(&images).await?;

        assert!(!images_dir.join("41.png").exists());
        assert!(images_dir.join("notes.txt").exists());
        assert_eq!(fs::read(sink.image_path(1))?, PNG.to_vec());
        assert_eq!(fs::read(images_dir.join("2.png"))?, PNG.to_vec());
        Ok(())
    }

    #[tokio::test]
    async fn test_file_sink_writes_events_sorted_by_identity() -> Result<()> {
        let dir = tempdir()?;
        let sink = FileSink::new(dir.path().join("out"), dir.path().join("out/images"));
        let records = vec![record("Zouk Fest", 5)?, record("Atlantic Swing", 1)?];

        sink.store_events(&records).await?;

        let written: Vec<EventRecord> =
            serde_json::from_str(&fs::read_to_string(sink.events_path())?)?;
        let ids: Vec<&str> = written.iter().map(|r| r.id()).collect();
        assert_eq!(
            ids,
            vec!["ATLANTIC_SWING-20240101-20240103", "ZOUK_FEST-20240105-20240107"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_file_sink_keeps_latest_record_per_identity() -> Result<()> {
        let dir = tempdir()?;
        let sink = FileSink::new(dir.path(), dir.path().join("images"));
        let moved = EventDraft {
            name: "Zouk Fest".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 5),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 7),
            city: "Lyon".to_string(),
            country: "France".to_string(),
            full_location: Some("Salle Rameau, Lyon".to_string()),
            image_file: "8.png".to_string(),
            ..Default::default()
        };
        let records = vec![record("Zouk Fest", 5)?, moved.build()?];

        sink.store_events(&records).await?;

        let written: Vec<EventRecord> =
            serde_json::from_str(&fs::read_to_string(sink.events_path())?)?;
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].city(), "Lyon");
        assert_eq!(written[0], records[1]);
        Ok(())
    }

    #[tokio::test]
    async fn test_memory_sink_upserts_by_identity() -> Result<()> {
        let sink = InMemorySink::new();
        sink.store_events(&[record("Zouk Fest", 5)?]).await?;
        sink.store_events(&[record("Zouk Fest", 5)?, record("Atlantic Swing", 1)?])
            .await?;

        assert_eq!(sink.event_count(), 2);
        Ok(())
    }

    #[test]
    fn test_missing_cookie_file_is_empty() -> Result<()> {
        let dir = tempdir()?;
        let store = CookieStore::new(dir.path().join("nested/cookies.json"));
        assert!(store.load()?.is_empty());

        store.save(&[cookie("sid"), cookie("csrf")])?;
        assert_eq!(store.load()?.len(), 2);
        Ok(())
    }
}
