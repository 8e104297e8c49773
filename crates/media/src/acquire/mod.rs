//! Fetching source artifacts into the temp area.
//!
//! Two origins: the chat platform's own file store, and external URLs on
//! an allow-list handed to a [`Downloader`]. Both enforce the per-file size
//! ceiling unless the caller is privileged, and neither retries.

mod allowlist;
mod ytdlp;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use {
    async_trait::async_trait,
    tracing::{info, warn},
    url::Url,
};

#[cfg(feature = "metrics")]
use reelsmith_metrics::{acquire as acquire_metrics, counter, labels};

pub use {allowlist::DomainAllowlist, ytdlp::YtDlpDownloader};

use crate::{
    error::{AcquireError, Result},
    job::Artifact,
    temp::TempArea,
};

/// Reference to a file hosted by the chat platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub id: String,
    /// Size announced with the message, if any.
    pub declared_size: Option<u64>,
    pub file_name: Option<String>,
}

/// What the platform reports about a file before download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub size: Option<u64>,
    /// Platform-side path, used for download and extension detection.
    pub path: String,
}

/// The chat platform's file store.
#[async_trait]
pub trait PlatformFileStore: Send + Sync {
    async fn metadata(&self, file: &FileRef) -> Result<RemoteFile>;
    async fn download(&self, remote: &RemoteFile, destination: &Path) -> Result<()>;
}

/// The external URL downloader.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Download `url` into `output_template` (which may contain `%(ext)s`)
    /// and return the resolved path. `max_bytes` asks the tool to skip
    /// larger files.
    async fn fetch(&self, url: &Url, output_template: &Path, max_bytes: Option<u64>) -> Result<PathBuf>;
}

#[derive(Clone)]
pub struct SourceAcquirer {
    files: Arc<dyn PlatformFileStore>,
    downloader: Arc<dyn Downloader>,
    allowlist: DomainAllowlist,
    temp: TempArea,
    max_bytes: u64,
}

impl SourceAcquirer {
    pub fn new(
        files: Arc<dyn PlatformFileStore>,
        downloader: Arc<dyn Downloader>,
        allowlist: DomainAllowlist,
        temp: TempArea,
        max_bytes: u64,
    ) -> Self {
        Self {
            files,
            downloader,
            allowlist,
            temp,
            max_bytes,
        }
    }

    #[must_use]
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Validate a URL submission without touching the network.
    pub fn check_url(&self, raw: &str) -> std::result::Result<Url, AcquireError> {
        self.allowlist.check(raw).ok_or_else(|| {
            warn!(url = raw, "rejected url submission");
            record_rejection("unsupported_url");
            AcquireError::UnsupportedUrl {
                url: raw.to_string(),
            }
        })
    }

    /// Fetch a platform-hosted file. Oversized files are denied from their
    /// metadata before any byte is downloaded.
    pub async fn fetch_from_platform(
        &self,
        file: &FileRef,
        privileged: bool,
    ) -> std::result::Result<Artifact, AcquireError> {
        let remote = self
            .files
            .metadata(file)
            .await
            .map_err(|e| self.unreachable(e))?;

        if let Some(size) = remote.size.or(file.declared_size) {
            self.enforce_ceiling(size, privileged)?;
        }

        let extension = extension_of(&remote.path)
            .or_else(|| file.file_name.as_deref().and_then(extension_of))
            .unwrap_or_else(|| "mp4".to_string());
        let destination = self.temp.allocate(&extension);

        if let Err(e) = self.files.download(&remote, &destination).await {
            self.temp.cleanup(&destination);
            return Err(self.unreachable(e));
        }

        let artifact = self.verify(destination, privileged)?;
        record_acquired("platform", artifact.size);
        info!(path = %artifact.path.display(), size = artifact.size, "acquired platform file");
        Ok(artifact)
    }

    /// Download an allow-listed URL. The on-disk size is re-checked after
    /// download since most hosts do not announce it.
    pub async fn fetch_from_url(
        &self,
        url: &Url,
        privileged: bool,
    ) -> std::result::Result<Artifact, AcquireError> {
        let url = self.check_url(url.as_str())?;
        let template = self.temp.allocate_template();
        let stem = template
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.split('.').next())
            .unwrap_or_default()
            .to_string();
        let limit = (!privileged).then_some(self.max_bytes);

        let path = match self.downloader.fetch(&url, &template, limit).await {
            Ok(path) if self.temp.contains(&path) && path.is_file() => path,
            Ok(path) => {
                self.temp.cleanup_stem(&stem);
                return Err(self.unreachable(crate::Error::Message(format!(
                    "downloader produced no file in the temp area (reported {})",
                    path.display()
                ))));
            },
            Err(crate::Error::SizeLimitExceeded { limit }) => {
                self.temp.cleanup_stem(&stem);
                warn!(%url, limit, "url source over size limit");
                record_rejection("too_large");
                return Err(AcquireError::OverLimit { limit });
            },
            Err(e) => {
                self.temp.cleanup_stem(&stem);
                return Err(self.unreachable(e));
            },
        };

        let artifact = self.verify(path, privileged)?;
        record_acquired("url", artifact.size);
        info!(%url, path = %artifact.path.display(), size = artifact.size, "acquired url");
        Ok(artifact)
    }

    fn enforce_ceiling(&self, size: u64, privileged: bool) -> std::result::Result<(), AcquireError> {
        if privileged || size <= self.max_bytes {
            return Ok(());
        }
        warn!(size, limit = self.max_bytes, "source over size limit");
        record_rejection("too_large");
        Err(AcquireError::Denied {
            size,
            limit: self.max_bytes,
        })
    }

    /// Check the file on disk, deleting it if it breaks the ceiling.
    fn verify(&self, path: PathBuf, privileged: bool) -> std::result::Result<Artifact, AcquireError> {
        let size = match std::fs::metadata(&path) {
            Ok(meta) => meta.len(),
            Err(e) => {
                self.temp.cleanup(&path);
                return Err(self.unreachable(crate::Error::external("stat downloaded file", e)));
            },
        };
        if let Err(denied) = self.enforce_ceiling(size, privileged) {
            self.temp.cleanup(&path);
            return Err(denied);
        }
        Ok(Artifact { path, size })
    }

    fn unreachable(&self, error: crate::Error) -> AcquireError {
        warn!(error = %error, "source unreachable");
        record_rejection("unreachable");
        AcquireError::Unreachable(error)
    }
}

/// Lowercased alphanumeric extension of a path-like string.
fn extension_of(name: &str) -> Option<String> {
    let ext = Path::new(name).extension()?.to_str()?;
    let valid = !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then(|| ext.to_ascii_lowercase())
}

#[cfg(feature = "metrics")]
fn record_rejection(kind: &'static str) {
    counter!(acquire_metrics::REJECTED_TOTAL, labels::ERROR_TYPE => kind).increment(1);
}

#[cfg(not(feature = "metrics"))]
fn record_rejection(_kind: &'static str) {}

#[cfg(feature = "metrics")]
fn record_acquired(origin: &'static str, size: u64) {
    counter!(acquire_metrics::ACQUIRED_TOTAL, labels::ORIGIN => origin).increment(1);
    counter!(acquire_metrics::BYTES_TOTAL, labels::ORIGIN => origin).increment(size);
}

#[cfg(not(feature = "metrics"))]
fn record_acquired(_origin: &'static str, _size: u64) {}
