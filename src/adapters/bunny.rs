//! BunnyCDN Storage asset mirror.
//!
//! Media is fetched with `yt-dlp` into a scratch directory, uploaded to the
//! storage zone with a `PUT`, then removed locally. Objects are always named
//! `<video_id>.mp4` and served from the zone's pull host.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, warn};

use super::AssetMirror;
use crate::core::SyncError;

/// Fixed extension of every stored asset
pub const ASSET_EXTENSION: &str = "mp4";

fn default_region() -> String {
    "la".to_string()
}

/// Configuration for the BunnyCDN mirror
#[derive(Clone, Serialize, Deserialize)]
pub struct BunnyConfig {
    pub storage_zone: String,
    pub api_key: String,
    /// Storage endpoint region prefix (default: "la")
    #[serde(default = "default_region")]
    pub storage_region: String,
    /// Public host serving the zone (default: "<zone>.b-cdn.net")
    #[serde(default)]
    pub public_host: Option<String>,
}

impl std::fmt::Debug for BunnyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BunnyConfig")
            .field("storage_zone", &self.storage_zone)
            .field("api_key", &"<redacted>")
            .field("storage_region", &self.storage_region)
            .field("public_host", &self.public_host)
            .finish()
    }
}

/// Entry of a storage zone directory listing
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StorageObject {
    pub object_name: String,
    #[serde(default)]
    pub length: u64,
    #[serde(default)]
    pub is_directory: bool,
}

/// Where downloaded media is staged before upload
enum Scratch {
    Dir(PathBuf),
    Temp(TempDir),
}

impl Scratch {
    fn path(&self) -> &Path {
        match self {
            Scratch::Dir(path) => path,
            Scratch::Temp(dir) => dir.path(),
        }
    }
}

/// BunnyCDN storage zone as an asset mirror
pub struct BunnyMirror {
    storage_zone: String,
    api_key: String,
    storage_region: String,
    public_host: String,
    scratch: Scratch,
    downloader: String,
    client: reqwest::Client,
}

impl BunnyMirror {
    /// Create a mirror staging downloads in `scratch_dir`, or in a fresh
    /// temporary directory when `None`
    pub fn new(config: BunnyConfig, scratch_dir: Option<PathBuf>) -> Result<Self> {
        let scratch = match scratch_dir {
            Some(dir) => Scratch::Dir(dir),
            None => Scratch::Temp(
                tempfile::tempdir().context("Failed to create scratch directory")?,
            ),
        };
        let public_host = config
            .public_host
            .unwrap_or_else(|| format!("{}.b-cdn.net", config.storage_zone));
        let downloader = std::env::var("YTDLP_PATH").unwrap_or_else(|_| "yt-dlp".to_string());

        Ok(Self {
            storage_zone: config.storage_zone,
            api_key: config.api_key,
            storage_region: config.storage_region,
            public_host,
            scratch,
            downloader,
            client: reqwest::Client::new(),
        })
    }

    /// Use a custom downloader binary
    pub fn with_downloader(mut self, downloader: impl Into<String>) -> Self {
        self.downloader = downloader.into();
        self
    }

    /// Stored object name for a video
    pub fn object_name(video_id: &str) -> String {
        format!("{}.{}", video_id, ASSET_EXTENSION)
    }

    fn storage_url(&self, object: &str) -> String {
        format!(
            "https://{}.storage.bunnycdn.com/{}/{}",
            self.storage_region, self.storage_zone, object
        )
    }

    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    /// List the zone root
    pub async fn list_objects(&self) -> Result<Vec<StorageObject>> {
        let response = self
            .client
            .get(self.storage_url(""))
            .header("AccessKey", &self.api_key)
            .header("accept", "application/json")
            .send()
            .await
            .context("Failed to list BunnyCDN storage")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("BunnyCDN listing error ({}): {}", status, text);
        }

        response
            .json()
            .await
            .context("Failed to parse BunnyCDN listing")
    }

    /// Look up the stored object for a video
    pub async fn find_object(&self, video_id: &str) -> Result<Option<StorageObject>> {
        let name = Self::object_name(video_id);
        Ok(self
            .list_objects()
            .await?
            .into_iter()
            .find(|o| !o.is_directory && o.object_name == name))
    }

    async fn download(&self, video_id: &str, source_locator: &str) -> Result<PathBuf> {
        let target = self.scratch.path().join(Self::object_name(video_id));
        tokio::fs::create_dir_all(self.scratch.path())
            .await
            .with_context(|| {
                format!("Failed to create scratch dir: {}", self.scratch.path().display())
            })?;

        debug!(video_id, target = %target.display(), "Downloading media");
        let output = Command::new(&self.downloader)
            .args(["--format", "best"])
            .args(["--merge-output-format", ASSET_EXTENSION])
            .args(["--retries", "10"])
            .args(["--socket-timeout", "60"])
            .arg("--output")
            .arg(&target)
            .arg(source_locator)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.downloader))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "Download of {} failed with exit code {}: {}",
                source_locator,
                output.status.code().unwrap_or(-1),
                stderr.trim()
            );
        }

        if !target.exists() {
            anyhow::bail!("Downloader produced no file at {}", target.display());
        }
        Ok(target)
    }

    async fn upload(&self, video_id: &str, path: &Path) -> Result<()> {
        let object = Self::object_name(video_id);
        let file = tokio::fs::File::open(path)
            .await
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let length = file
            .metadata()
            .await
            .with_context(|| format!("Failed to stat {}", path.display()))?
            .len();

        debug!(video_id, bytes = length, "Uploading media");
        let response = self
            .client
            .put(self.storage_url(&object))
            .header("AccessKey", &self.api_key)
            .header("Content-Type", "application/octet-stream")
            .header("Content-Length", length)
            .body(reqwest::Body::from(file))
            .send()
            .await
            .with_context(|| format!("Failed to upload {}", object))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("BunnyCDN upload error ({}): {}", status, text);
        }
        Ok(())
    }
}

#[async_trait]
impl AssetMirror for BunnyMirror {
    fn name(&self) -> &str {
        "bunnycdn"
    }

    async fn exists(&self, video_id: &str) -> Result<bool, SyncError> {
        self.find_object(video_id)
            .await
            .map(|found| found.is_some())
            .map_err(|e| SyncError::mirror_failure(video_id, e))
    }

    async fn mirror(&self, video_id: &str, source_locator: &str) -> Result<String, SyncError> {
        let path = self
            .download(video_id, source_locator)
            .await
            .map_err(|e| SyncError::mirror_failure(video_id, e))?;

        let uploaded = self.upload(video_id, &path).await;

        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!(video_id, path = %path.display(), error = %e, "Failed to remove scratch file");
        }

        uploaded.map_err(|e| SyncError::mirror_failure(video_id, e))?;
        Ok(self.derive_url(video_id))
    }

    fn derive_url(&self, video_id: &str) -> String {
        format!("https://{}/{}", self.public_host, Self::object_name(video_id))
    }
}
