use crate::driver::Driver;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One browser cookie in the persisted shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub domain: Option<String>,
    pub path: Option<String>,
    /// Unix timestamp in seconds; `None` for session cookies.
    pub expiry: Option<i64>,
    pub secure: bool,
}

/// JSON file holding the cookies of the previous crawl.
#[derive(Debug, Clone)]
pub struct CookieStore {
    path: PathBuf,
}

impl CookieStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty store.
    pub fn load(&self) -> Result<Vec<SessionCookie>> {
        if !self.path.exists() {
            debug!("No cookie file at {}", self.path.display());
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, cookies: &[SessionCookie]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(cookies)?)?;
        Ok(())
    }
}

/// Inject previously saved cookies into the session. Never fails the crawl.
pub async fn restore(driver: &dyn Driver, store: &CookieStore) -> usize {
    let cookies = match store.load() {
        Ok(cookies) => cookies,
        Err(e) => {
            warn!("Could not load previously saved cookies: {}", e);
            return 0;
        }
    };

    let mut restored = 0;
    for cookie in cookies {
        let name = cookie.name.clone();
        match driver.add_cookie(cookie).await {
            Ok(()) => restored += 1,
            Err(e) => warn!("Could not restore cookie '{}': {}", name, e),
        }
    }
    info!("Restored {} session cookies", restored);
    restored
}

/// Save the session's current cookies. Never fails the crawl.
pub async fn persist(driver: &dyn Driver, store: &CookieStore) {
    let cookies = match driver.cookies().await {
        Ok(cookies) => cookies,
        Err(e) => {
            warn!("Could not read session cookies: {}", e);
            return;
        }
    };
    match store.save(&cookies) {
        Ok(()) => info!("Saved {} session cookies to {}", cookies.len(), store.path().display()),
        Err(e) => warn!("Could not save session cookies: {}", e),
    }
}
