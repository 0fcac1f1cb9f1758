//! Split-by-size ingestion.
//!
//! One call to [`Ingestor::split_by_size`] takes an upload from byte stream
//! to a list of segment URLs: persist, probe, plan, segment, locate. The
//! persisted input is transient and is removed however the call ends.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::Stream;
use tracing::Instrument;

use ms_av::plan::validate_target;
use ms_av::{MediaProber, SegmentPlan, Segmenter};
use ms_core::config::Config;
use ms_core::{IngestError, MediaAsset, StorageError};

use crate::locator::LocatorTemplate;
use crate::upload::{file_stream, persist_stream, BodyError};

/// Default longest gap between two upload chunks.
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(120);

/// Runs the split-by-size pipeline against one storage directory.
///
/// Cheap to share behind an `Arc`; concurrent calls only ever touch files
/// carrying their own asset id.
pub struct Ingestor {
    prober: Arc<dyn MediaProber>,
    segmenter: Arc<dyn Segmenter>,
    storage_dir: PathBuf,
    locator: LocatorTemplate,
    fallback_segment_secs: f64,
    upload_idle_timeout: Duration,
}

impl Ingestor {
    pub fn new(
        prober: Arc<dyn MediaProber>,
        segmenter: Arc<dyn Segmenter>,
        storage_dir: PathBuf,
        locator: LocatorTemplate,
    ) -> Self {
        Self {
            prober,
            segmenter,
            storage_dir,
            locator,
            fallback_segment_secs: ms_av::plan::DEFAULT_SEGMENT_SECS,
            upload_idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    /// Build an ingestor with storage, locator and limits taken from `config`.
    pub fn from_config(
        config: &Config,
        prober: Arc<dyn MediaProber>,
        segmenter: Arc<dyn Segmenter>,
    ) -> Self {
        Self::new(
            prober,
            segmenter,
            config.storage.dir(),
            LocatorTemplate::from_server_config(&config.server),
        )
        .with_fallback_secs(config.split.fallback_segment_secs)
        .with_upload_idle_timeout(config.split.upload_idle_timeout())
    }

    pub fn with_fallback_secs(mut self, secs: f64) -> Self {
        self.fallback_segment_secs = secs;
        self
    }

    pub fn with_upload_idle_timeout(mut self, timeout: Duration) -> Self {
        self.upload_idle_timeout = timeout;
        self
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Split an uploaded stream into chunks of roughly `target_size_mb`.
    ///
    /// `file_name` is the client-supplied name; only its extension is kept.
    /// Returns one URL per segment in sequence order. Either every locator is
    /// returned or an error is; never a partial list.
    pub async fn split_by_size<S, E>(
        &self,
        file_name: &str,
        stream: S,
        target_size_mb: i64,
    ) -> Result<Vec<String>, IngestError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: BodyError,
    {
        // Reject before touching the disk.
        validate_target(target_size_mb)?;

        tokio::fs::create_dir_all(&self.storage_dir)
            .await
            .map_err(|source| StorageError::Write {
                path: self.storage_dir.clone(),
                source,
            })?;

        let asset = MediaAsset::new(&self.storage_dir, file_name);
        let span = tracing::info_span!("split", asset_id = %asset.id, target_size_mb);

        let guard = InputGuard::new(asset.path.clone());
        let result = self
            .run(&asset, stream, target_size_mb)
            .instrument(span)
            .await;
        guard.remove().await;

        result
    }

    /// Split a file already on the local filesystem.
    ///
    /// The file is copied into storage through the same streaming path as an
    /// upload; the original is left untouched.
    pub async fn split_local_file(
        &self,
        path: &Path,
        target_size_mb: i64,
    ) -> Result<Vec<String>, IngestError> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|source| StorageError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.split_by_size(&file_name, file_stream(file), target_size_mb)
            .await
    }

    async fn run<S, E>(
        &self,
        asset: &MediaAsset,
        stream: S,
        target_size_mb: i64,
    ) -> Result<Vec<String>, IngestError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: BodyError,
    {
        let bytes = persist_stream(&asset.path, stream, self.upload_idle_timeout).await?;
        tracing::info!(bytes, "Stored upload as {}", asset.input_name());

        let bitrate = match self.prober.probe(&asset.path).await {
            Ok(probe) => {
                tracing::debug!(
                    duration_secs = probe.duration_secs,
                    size_bytes = probe.size_bytes,
                    bitrate = probe.bitrate(),
                    "Probed input"
                );
                Some(probe.bitrate())
            }
            Err(e) if e.is_unusable_output() => {
                tracing::warn!(
                    "Unusable probe output ({e}); using {}s segments",
                    self.fallback_segment_secs
                );
                None
            }
            Err(e) => return Err(e.into()),
        };

        let plan =
            SegmentPlan::for_target_with_fallback(target_size_mb, bitrate, self.fallback_segment_secs)?;

        let segments = self
            .segmenter
            .segment(&asset.id, &asset.path, &plan, &asset.output_pattern())
            .await?;

        let locators: Vec<String> = segments.iter().map(|s| self.locator.locate(s)).collect();

        tracing::info!(
            segments = locators.len(),
            segment_secs = plan.segment_secs,
            fallback = plan.is_fallback,
            "Split complete"
        );
        Ok(locators)
    }
}

/// Removes the transient input file when dropped.
///
/// [`InputGuard::remove`] is the normal path; the drop impl covers
/// cancellation, where the request future is dropped mid-flight.
struct InputGuard {
    path: Option<PathBuf>,
}

impl InputGuard {
    fn new(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    async fn remove(mut self) {
        if let Some(path) = self.path.take() {
            log_removal(&path, tokio::fs::remove_file(&path).await);
        }
    }
}

impl Drop for InputGuard {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            log_removal(&path, std::fs::remove_file(&path));
        }
    }
}

fn log_removal(path: &Path, result: io::Result<()>) {
    match result {
        Ok(()) => tracing::debug!("Removed input {}", path.display()),
        // Persisting may have failed before the file was created.
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to remove input {}: {e}", path.display()),
    }
}
