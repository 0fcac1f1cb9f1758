//! Fixed-duration segmentation using ffmpeg `-c copy`.
//!
//! Outputs land next to the input, named from the asset's output pattern, and
//! are discovered afterwards by listing the directory for the asset prefix.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use ms_core::{AssetId, SegmentError, SegmentFile};

use crate::command::ToolCommand;
use crate::plan::SegmentPlan;
use crate::tools::{Tool, ToolRegistry};

/// Something that can split a media file into fixed-duration segments.
#[async_trait]
pub trait Segmenter: Send + Sync {
    /// Human-readable name identifying this segmenter implementation.
    fn name(&self) -> &'static str;

    /// Split `input` according to `plan`, writing files matching
    /// `output_pattern`, and return them in sequence order.
    ///
    /// The input file is left in place.
    async fn segment(
        &self,
        asset_id: &AssetId,
        input: &Path,
        plan: &SegmentPlan,
        output_pattern: &Path,
    ) -> Result<Vec<SegmentFile>, SegmentError>;
}

/// A segmenter backed by the `ffmpeg` segment muxer.
#[derive(Debug, Clone)]
pub struct FfmpegSegmenter {
    ffmpeg_path: PathBuf,
    timeout: Duration,
}

impl FfmpegSegmenter {
    /// Create a new segmenter using the given ffmpeg path.
    pub fn new(ffmpeg_path: PathBuf, timeout: Duration) -> Self {
        Self {
            ffmpeg_path,
            timeout,
        }
    }

    /// Create a segmenter from a discovered tool registry.
    pub fn from_registry(tools: &ToolRegistry, timeout: Duration) -> ms_core::Result<Self> {
        let ffmpeg = tools.require(Tool::Ffmpeg)?;
        Ok(Self::new(ffmpeg.to_path_buf(), timeout))
    }

    /// Build the ffmpeg invocation for one split.
    pub fn command(&self, input: &Path, plan: &SegmentPlan, output_pattern: &Path) -> ToolCommand {
        ToolCommand::new(&self.ffmpeg_path)
            .args(["-hide_banner", "-nostdin", "-i"])
            .arg(input)
            .args(["-c", "copy", "-map", "0"])
            .arg("-segment_time")
            .arg(plan.segment_time_arg())
            .args(["-f", "segment", "-reset_timestamps", "1"])
            .arg(output_pattern)
            .deadline(self.timeout)
    }
}

#[async_trait]
impl Segmenter for FfmpegSegmenter {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn segment(
        &self,
        asset_id: &AssetId,
        input: &Path,
        plan: &SegmentPlan,
        output_pattern: &Path,
    ) -> Result<Vec<SegmentFile>, SegmentError> {
        tracing::info!(
            asset_id = %asset_id,
            segment_secs = plan.segment_secs,
            "Segmenting {:?} -> {:?}",
            input,
            output_pattern
        );

        self.command(input, plan, output_pattern)
            .run()
            .await
            .map_err(|e| SegmentError::Tool(e.to_string()))?;

        let dir = output_pattern.parent().unwrap_or_else(|| Path::new("."));
        collect_segments(dir, asset_id, input)
    }
}

/// List the segments of `asset_id` in `dir`, in sequence order.
///
/// Selects regular files carrying the asset prefix, excluding `input`, and
/// sorts them by name; the zero-padded sequence makes that temporal order.
pub fn collect_segments(
    dir: &Path,
    asset_id: &AssetId,
    input: &Path,
) -> Result<Vec<SegmentFile>, SegmentError> {
    let listing_err = |source| SegmentError::Listing {
        dir: dir.to_path_buf(),
        source,
    };

    let prefix = asset_id.file_prefix();
    let input_name = input.file_name();

    let mut segments = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(listing_err)? {
        let entry = entry.map_err(listing_err)?;
        let name = entry.file_name();
        if Some(name.as_os_str()) == input_name {
            continue;
        }
        let Some(name) = name.to_str() else {
            continue;
        };
        if !name.starts_with(&prefix) {
            continue;
        }
        if !entry.file_type().map_err(listing_err)?.is_file() {
            continue;
        }
        segments.push(SegmentFile {
            file_name: name.to_string(),
            path: entry.path(),
            asset_id: asset_id.clone(),
        });
    }

    segments.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(segments)
}
