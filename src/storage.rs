use crate::constants::IMAGE_EXTENSION;
use crate::error::Result;
use crate::event::EventRecord;
use crate::types::TileIndex;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::fs;
use tracing::{debug, info};

pub const EVENTS_FILE: &str = "events.json";

/// Downstream consumer of a finished crawl
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Upsert records keyed by their derived identity.
    async fn store_events(&self, records: &[EventRecord]) -> Result<()>;

    async fn store_images(&self, images: &BTreeMap<TileIndex, Vec<u8>>) -> Result<()>;
}

/// Writes `events.json` and one PNG per tile under the output directory.
pub struct FileSink {
    dir: PathBuf,
    images_dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>, images_dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            images_dir: images_dir.into(),
        }
    }

    pub fn events_path(&self) -> PathBuf {
        self.dir.join(EVENTS_FILE)
    }

    pub fn image_path(&self, index: TileIndex) -> PathBuf {
        self.images_dir.join(format!("{index}.{IMAGE_EXTENSION}"))
    }

    /// Remove captures left over from a previous crawl.
    async fn clear_images(&self) -> Result<usize> {
        let mut removed = 0;
        let mut entries = fs::read_dir(&self.images_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if has_image_extension(&path) {
                fs::remove_file(&path).await?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case(IMAGE_EXTENSION))
        .unwrap_or(false)
}

#[async_trait]
impl EventSink for FileSink {
    async fn store_events(&self, records: &[EventRecord]) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;

        // Later records win for a repeated identity
        let by_id: BTreeMap<&str, &EventRecord> =
            records.iter().map(|r| (r.id(), r)).collect();
        let sorted: Vec<&EventRecord> = by_id.into_values().collect();

        let path = self.events_path();
        fs::write(&path, serde_json::to_string_pretty(&sorted)?).await?;
        info!("Saved {} events to {}", sorted.len(), path.display());
        Ok(())
    }

    async fn store_images(&self, images: &BTreeMap<TileIndex, Vec<u8>>) -> Result<()> {
        fs::create_dir_all(&self.images_dir).await?;
        let removed = self.clear_images().await?;
        debug!("Removed {} previous images", removed);

        for (index, image) in images {
            let path = self.image_path(*index);
            fs::write(&path, image).await?;
            debug!(
                tile = index,
                sha256 = %hex::encode(Sha256::digest(image)),
                "Saved image {}",
                path.display()
            );
        }
        info!("Saved {} images to {}", images.len(), self.images_dir.display());
        Ok(())
    }
}

/// In-memory sink for tests and dry runs
#[derive(Default)]
pub struct InMemorySink {
    events: Arc<Mutex<HashMap<String, EventRecord>>>,
    images: Arc<Mutex<BTreeMap<TileIndex, Vec<u8>>>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event(&self, id: &str) -> Option<EventRecord> {
        self.events.lock().unwrap().get(id).cloned()
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn image(&self, index: TileIndex) -> Option<Vec<u8>> {
        self.images.lock().unwrap().get(&index).cloned()
    }

    pub fn image_count(&self) -> usize {
        self.images.lock().unwrap().len()
    }
}

#[async_trait]
impl EventSink for InMemorySink {
    async fn store_events(&self, records: &[EventRecord]) -> Result<()> {
        let mut events = self.events.lock().unwrap();
        for record in records {
            events.insert(record.id().to_string(), record.clone());
        }
        debug!("Stored {} events in memory", records.len());
        Ok(())
    }

    async fn store_images(&self, images: &BTreeMap<TileIndex, Vec<u8>>) -> Result<()> {
        let mut stored = self.images.lock().unwrap();
        stored.extend(images.iter().map(|(k, v)| (*k, v.clone())));
        Ok(())
    }
}
