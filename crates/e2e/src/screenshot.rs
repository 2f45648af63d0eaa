//! Failure screenshots

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::driver::Browser;
use crate::error::E2eResult;

/// A screenshot written to disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenshotRecord {
    pub path: PathBuf,
    pub sha256: String,
}

/// `<dir>/<case>_<YYYYmmdd_HHMMSS>.png`
pub fn failure_path<Tz: TimeZone>(dir: &Path, case: &str, at: &DateTime<Tz>) -> PathBuf
where
    Tz::Offset: std::fmt::Display,
{
    dir.join(format!("{}_{}.png", case, at.format("%Y%m%d_%H%M%S")))
}

/// Hash a file on disk
pub fn hash_file(path: &Path) -> E2eResult<String> {
    let data = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

/// Save the current page for a failed case
pub async fn capture_failure<B: Browser>(browser: &B, dir: &Path, case: &str) -> E2eResult<ScreenshotRecord> {
    std::fs::create_dir_all(dir)?;
    let path = failure_path(dir, case, &Local::now());
    browser.screenshot(&path).await?;
    let sha256 = hash_file(&path)?;
    info!("Screenshot saved: {}", path.display());
    Ok(ScreenshotRecord { path, sha256 })
}
