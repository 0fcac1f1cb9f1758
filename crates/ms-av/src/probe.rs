//! Duration and size probing.
//!
//! [`FfprobeProber`] shells out to
//! `ffprobe -v error -show_entries format=duration,size -of default=noprint_wrappers=1:nokey=1`
//! which prints the two values on separate lines, and turns them into a
//! [`ProbeResult`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use ms_core::ProbeError;
use serde::Serialize;

use crate::command::ToolCommand;
use crate::tools::{Tool, ToolRegistry};

/// Container-level duration and size of a media file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProbeResult {
    /// Duration in seconds, always > 0.
    pub duration_secs: f64,
    /// File size in bytes as reported by the probe.
    pub size_bytes: f64,
}

impl ProbeResult {
    /// Build a result, rejecting durations that would break bitrate math.
    pub fn new(duration_secs: f64, size_bytes: f64) -> Result<Self, ProbeError> {
        if !(duration_secs > 0.0) {
            return Err(ProbeError::NonPositiveDuration(duration_secs));
        }
        Ok(Self {
            duration_secs,
            size_bytes,
        })
    }

    /// Average bitrate in bits per second: `size * 8 / duration`.
    pub fn bitrate(&self) -> f64 {
        self.size_bytes * 8.0 / self.duration_secs
    }
}

/// Something that can report duration and size for a media file.
///
/// Implementations must be safe to share across threads (`Send + Sync`).
#[async_trait]
pub trait MediaProber: Send + Sync {
    /// Human-readable name identifying this prober implementation.
    fn name(&self) -> &'static str;

    /// Probe the file at `path`.
    async fn probe(&self, path: &Path) -> Result<ProbeResult, ProbeError>;
}

/// A prober backed by the `ffprobe` CLI.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    ffprobe_path: PathBuf,
    timeout: Duration,
}

impl FfprobeProber {
    /// Create a new prober using the given ffprobe path.
    pub fn new(ffprobe_path: PathBuf, timeout: Duration) -> Self {
        Self {
            ffprobe_path,
            timeout,
        }
    }

    /// Create a prober from a discovered tool registry.
    pub fn from_registry(tools: &ToolRegistry, timeout: Duration) -> ms_core::Result<Self> {
        let ffprobe = tools.require(Tool::Ffprobe)?;
        Ok(Self::new(ffprobe.to_path_buf(), timeout))
    }
}

#[async_trait]
impl MediaProber for FfprobeProber {
    fn name(&self) -> &'static str {
        "ffprobe"
    }

    async fn probe(&self, path: &Path) -> Result<ProbeResult, ProbeError> {
        let output = ToolCommand::new(&self.ffprobe_path)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration,size",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(path)
            .deadline(self.timeout)
            .run()
            .await
            .map_err(|e| ProbeError::Tool(e.to_string()))?;

        parse_probe_output(&output.stdout)
    }
}

/// Parse the two-line `<duration>\n<size>\n` probe output.
pub fn parse_probe_output(stdout: &str) -> Result<ProbeResult, ProbeError> {
    let lines: Vec<&str> = stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let [duration, size, ..] = lines.as_slice() else {
        return Err(ProbeError::InsufficientOutput { lines: lines.len() });
    };

    let duration_secs = parse_number("duration", duration)?;
    let size_bytes = parse_number("size", size)?;
    ProbeResult::new(duration_secs, size_bytes)
}

fn parse_number(field: &'static str, value: &str) -> Result<f64, ProbeError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ProbeError::Malformed {
            field,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_duration_and_size() {
        let result = parse_probe_output("100.000000\n100000000\n").unwrap();
        assert_eq!(result.duration_secs, 100.0);
        assert_eq!(result.size_bytes, 100_000_000.0);
        assert_eq!(result.bitrate(), 8_000_000.0);
    }

    #[test]
    fn bitrate_is_exact() {
        let result = ProbeResult::new(3.0, 1_000.0).unwrap();
        assert_eq!(result.bitrate(), 1_000.0 * 8.0 / 3.0);
    }

    #[test]
    fn tolerates_crlf_and_blank_lines() {
        let result = parse_probe_output("\r\n12.5\r\n\r\n4096\r\n").unwrap();
        assert_eq!(result.duration_secs, 12.5);
        assert_eq!(result.size_bytes, 4096.0);
    }

    #[test]
    fn single_line_is_insufficient() {
        let err = parse_probe_output("12.5\n").unwrap_err();
        assert!(matches!(err, ProbeError::InsufficientOutput { lines: 1 }));
        assert!(err.is_unusable_output());
    }

    #[test]
    fn empty_output_is_insufficient() {
        let err = parse_probe_output("").unwrap_err();
        assert!(matches!(err, ProbeError::InsufficientOutput { lines: 0 }));
    }

    #[test]
    fn not_available_is_malformed() {
        let err = parse_probe_output("N/A\n2048\n").unwrap_err();
        assert!(matches!(
            err,
            ProbeError::Malformed {
                field: "duration",
                ..
            }
        ));
    }

    #[test]
    fn zero_and_negative_duration_rejected() {
        assert!(matches!(
            parse_probe_output("0\n2048\n").unwrap_err(),
            ProbeError::NonPositiveDuration(_)
        ));
        assert!(matches!(
            parse_probe_output("-1.5\n2048\n").unwrap_err(),
            ProbeError::NonPositiveDuration(_)
        ));
    }

    #[cfg(unix)]
    fn fake_ffprobe(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("ffprobe");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn ffprobe_prober_reads_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_ffprobe(dir.path(), "printf '100.0\\n100000000\\n'");
        let prober = FfprobeProber::new(bin, Duration::from_secs(10));

        let result = prober.probe(Path::new("/tmp/whatever.mp4")).await.unwrap();
        assert_eq!(result.bitrate(), 8_000_000.0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn ffprobe_prober_failure_is_tool_error() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_ffprobe(dir.path(), "echo 'moov atom not found' >&2; exit 1");
        let prober = FfprobeProber::new(bin, Duration::from_secs(10));

        let err = prober.probe(Path::new("/tmp/broken.mp4")).await.unwrap_err();
        assert!(matches!(err, ProbeError::Tool(ref m) if m.contains("moov atom not found")));
        assert!(!err.is_unusable_output());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn ffprobe_prober_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_ffprobe(dir.path(), "sleep 10");
        let prober = FfprobeProber::new(bin, Duration::from_millis(100));

        let err = prober.probe(Path::new("/tmp/slow.mp4")).await.unwrap_err();
        assert!(matches!(err, ProbeError::Tool(ref m) if m.contains("exceeding")));
    }
}
