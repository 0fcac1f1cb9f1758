//! # ms-av
//!
//! External media toolchain adapters for the mediasplit engine.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- find and cache paths to ffmpeg
//!   and ffprobe.
//! - **Command execution** ([`ToolCommand`]) -- bounded child process runs;
//!   the child is killed when its deadline passes.
//! - **Probing** ([`MediaProber`], [`FfprobeProber`]) -- duration and size of
//!   a media file, and the average bitrate derived from them.
//! - **Planning** ([`SegmentPlan`]) -- segment duration that makes each chunk
//!   approximate a target size.
//! - **Segmentation** ([`Segmenter`], [`FfmpegSegmenter`]) -- stream-copy
//!   split into fixed-duration chunks, collected in sequence order.

pub mod command;
pub mod plan;
pub mod probe;
pub mod segment;
pub mod tools;

// ---- Re-exports for convenience ----

pub use command::{RunError, ToolCommand, ToolOutput};
pub use plan::SegmentPlan;
pub use probe::{FfprobeProber, MediaProber, ProbeResult};
pub use segment::{collect_segments, FfmpegSegmenter, Segmenter};
pub use tools::{Tool, ToolInfo, ToolRegistry, VERSION_DEADLINE};
