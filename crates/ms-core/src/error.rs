//! Error types for mediasplit.
//!
//! Each stage of the segmentation engine has its own error enum so callers
//! can tell an unusable probe result apart from a failed `ffmpeg` run. The
//! ingestion pipeline folds them into [`IngestError`], and the application
//! wide [`Error`] carries enough context for API handlers to derive an HTTP
//! status code via [`Error::http_status`].

use std::path::PathBuf;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Component errors
// ---------------------------------------------------------------------------

/// Failure while extracting duration and size from a media file.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// The probe process could not be spawned, timed out, or exited non-zero.
    #[error("probe tool failed: {0}")]
    Tool(String),

    /// The probe printed fewer than the two expected lines.
    #[error("probe produced {lines} output line(s), expected 2")]
    InsufficientOutput {
        /// Number of non-empty lines actually produced.
        lines: usize,
    },

    /// A line of probe output was not a number.
    #[error("probe {field} is not a number: {value:?}")]
    Malformed {
        /// Which value failed to parse ("duration" or "size").
        field: &'static str,
        /// The raw text.
        value: String,
    },

    /// Duration parsed to zero or a negative number.
    #[error("probe reported non-positive duration {0}")]
    NonPositiveDuration(f64),
}

impl ProbeError {
    /// Whether the tool ran but its output cannot be used for bitrate math.
    ///
    /// These cases fall back to the fixed segment duration instead of
    /// aborting the request.
    pub fn is_unusable_output(&self) -> bool {
        !matches!(self, ProbeError::Tool(_))
    }
}

/// Failure while deriving a segment duration.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// The requested chunk size was zero or negative.
    #[error("target size must be a positive number of megabytes, got {0}")]
    NonPositiveTarget(i64),
}

/// Failure while splitting a file into segments.
#[derive(Debug, thiserror::Error)]
pub enum SegmentError {
    /// The segmenter could not be spawned, timed out, or exited non-zero.
    #[error("segmenter failed: {0}")]
    Tool(String),

    /// The segmenter succeeded but its output directory could not be listed.
    #[error("failed to list segments in {}: {source}", .dir.display())]
    Listing {
        /// Directory that was being listed.
        dir: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// Failure while persisting an incoming upload.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// An input file with the generated name already exists.
    #[error("asset name collision at {}", .0.display())]
    Collision(PathBuf),

    /// Writing to the storage directory failed (disk full, permissions, ...).
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        /// Path being written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The client stream returned an error mid-transfer.
    #[error("failed to read upload: {0}")]
    Upload(String),

    /// The upload was cut off for exceeding the configured body limit.
    #[error("upload too large: {0}")]
    TooLarge(String),

    /// No bytes arrived on the upload stream within the idle timeout.
    #[error("upload stalled for more than {0:?}")]
    UploadTimeout(Duration),
}

/// Failure of a single split-by-size request.
///
/// Wraps the originating component error; no partial result accompanies it.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    #[error("probe: {0}")]
    Probe(#[from] ProbeError),

    #[error("plan: {0}")]
    Plan(#[from] PlanError),

    #[error("segment: {0}")]
    Segment(#[from] SegmentError),
}

impl IngestError {
    /// Short machine-readable code returned to API callers.
    pub fn code(&self) -> &'static str {
        match self {
            IngestError::Storage(StorageError::Upload(_) | StorageError::UploadTimeout(_)) => {
                "UPLOAD_ERROR"
            }
            IngestError::Storage(StorageError::TooLarge(_)) => "PAYLOAD_TOO_LARGE",
            IngestError::Storage(_) => "STORAGE_ERROR",
            IngestError::Probe(_) => "PROBE_ERROR",
            IngestError::Plan(_) => "PLAN_ERROR",
            IngestError::Segment(_) => "SEGMENT_ERROR",
        }
    }

    /// HTTP status code for this failure.
    pub fn http_status(&self) -> u16 {
        match self {
            IngestError::Storage(StorageError::Upload(_)) => 400,
            IngestError::Storage(StorageError::UploadTimeout(_)) => 408,
            IngestError::Storage(StorageError::TooLarge(_)) => 413,
            IngestError::Storage(_) => 500,
            IngestError::Probe(_) => 422,
            IngestError::Plan(_) => 400,
            IngestError::Segment(SegmentError::Tool(_)) => 502,
            IngestError::Segment(SegmentError::Listing { .. }) => 500,
        }
    }

    /// Message safe to show to API callers.
    ///
    /// Tool diagnostics and filesystem paths are only logged.
    pub fn public_message(&self) -> String {
        match self {
            IngestError::Storage(StorageError::Upload(_)) => "failed to read upload".into(),
            IngestError::Storage(e @ StorageError::UploadTimeout(_)) => e.to_string(),
            IngestError::Storage(StorageError::TooLarge(_)) => {
                "upload exceeds the configured size limit".into()
            }
            IngestError::Storage(_) => "failed to store upload".into(),
            IngestError::Probe(_) => "media file could not be probed".into(),
            IngestError::Plan(e) => e.to_string(),
            IngestError::Segment(SegmentError::Tool(_)) => "media file could not be split".into(),
            IngestError::Segment(SegmentError::Listing { .. }) => {
                "split output could not be collected".into()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Application error
// ---------------------------------------------------------------------------

/// Unified error type for everything outside a single ingestion.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Request data or configuration failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// An external tool (ffmpeg, ffprobe) returned an error.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// A split-by-size request failed.
    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::Io { .. } => 500,
            Error::Tool { .. } => 502,
            Error::Ingest(e) => e.http_status(),
            Error::Internal(_) => 500,
        }
    }

    /// Short machine-readable code for API error envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::Io { .. } => "IO_ERROR",
            Error::Tool { .. } => "TOOL_ERROR",
            Error::Ingest(e) => e.code(),
            Error::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_display() {
        let err = Error::tool("ffmpeg", "exit code 1");
        assert_eq!(err.to_string(), "Tool error [ffmpeg]: exit code 1");
        assert_eq!(err.http_status(), 502);
        assert_eq!(err.code(), "TOOL_ERROR");
    }

    #[test]
    fn validation_display() {
        let err = Error::Validation("port is required".into());
        assert_eq!(err.to_string(), "Validation error: port is required");
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn io_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn ingest_codes() {
        let probe = IngestError::from(ProbeError::Tool("boom".into()));
        assert_eq!(probe.code(), "PROBE_ERROR");
        assert_eq!(probe.http_status(), 422);

        let plan = IngestError::from(PlanError::NonPositiveTarget(0));
        assert_eq!(plan.code(), "PLAN_ERROR");
        assert_eq!(plan.http_status(), 400);

        let segment = IngestError::from(SegmentError::Tool("exit 1".into()));
        assert_eq!(segment.code(), "SEGMENT_ERROR");
        assert_eq!(segment.http_status(), 502);

        let storage = IngestError::from(StorageError::Collision(PathBuf::from("/x")));
        assert_eq!(storage.code(), "STORAGE_ERROR");
        assert_eq!(storage.http_status(), 500);

        let upload = IngestError::from(StorageError::Upload("reset".into()));
        assert_eq!(upload.code(), "UPLOAD_ERROR");
        assert_eq!(upload.http_status(), 400);
    }

    #[test]
    fn ingest_error_passes_through_app_error() {
        let err = Error::from(IngestError::from(PlanError::NonPositiveTarget(-3)));
        assert_eq!(err.http_status(), 400);
        assert_eq!(err.code(), "PLAN_ERROR");
        assert!(err.to_string().contains("-3"));
    }

    #[test]
    fn public_message_hides_tool_output() {
        let err = IngestError::from(SegmentError::Tool(
            "/data/media/x_input.mp4: Invalid data found".into(),
        ));
        assert!(!err.public_message().contains("/data"));
        assert!(err.to_string().contains("/data"));
    }

    #[test]
    fn unusable_probe_output() {
        assert!(!ProbeError::Tool("x".into()).is_unusable_output());
        assert!(ProbeError::InsufficientOutput { lines: 1 }.is_unusable_output());
        assert!(ProbeError::NonPositiveDuration(0.0).is_unusable_output());
        assert!(ProbeError::Malformed {
            field: "size",
            value: "N/A".into()
        }
        .is_unusable_output());
    }

    #[test]
    fn oversized_upload_is_413() {
        let err = IngestError::from(StorageError::TooLarge("length limit exceeded".into()));
        assert_eq!(err.http_status(), 413);
        assert_eq!(err.code(), "PAYLOAD_TOO_LARGE");
        assert!(!err.public_message().contains("length limit"));
    }
}
