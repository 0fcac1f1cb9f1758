//! Segment duration planning.
//!
//! The segmenter splits by time, not by bytes, so a target chunk size is
//! turned into a duration using the file's average bitrate. Chunks of
//! variable-bitrate media will drift around the target; that is expected.

use ms_core::PlanError;
use serde::Serialize;

/// Segment duration used when no usable bitrate is known.
pub const DEFAULT_SEGMENT_SECS: f64 = 60.0;

const BITS_PER_MEGABYTE: f64 = 8.0 * 1024.0 * 1024.0;

/// How long each output segment should be.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SegmentPlan {
    /// Segment duration in seconds, always > 0.
    pub segment_secs: f64,
    /// Whether the duration came from the fallback rather than a bitrate.
    pub is_fallback: bool,
}

impl SegmentPlan {
    /// Plan with the built-in 60 second fallback.
    pub fn for_target(target_size_mb: i64, bitrate: Option<f64>) -> Result<Self, PlanError> {
        Self::for_target_with_fallback(target_size_mb, bitrate, DEFAULT_SEGMENT_SECS)
    }

    /// Derive the segment duration for `target_size_mb` at `bitrate` bits/s.
    ///
    /// `segment_secs = target_size_mb * 8 * 1024 * 1024 / bitrate`. A missing,
    /// zero, negative or non-finite bitrate yields `fallback_secs`.
    pub fn for_target_with_fallback(
        target_size_mb: i64,
        bitrate: Option<f64>,
        fallback_secs: f64,
    ) -> Result<Self, PlanError> {
        validate_target(target_size_mb)?;

        let plan = match bitrate.filter(|b| b.is_finite() && *b > 0.0) {
            Some(bps) => Self {
                segment_secs: target_size_mb as f64 * BITS_PER_MEGABYTE / bps,
                is_fallback: false,
            },
            None => Self::fallback(fallback_secs),
        };

        // A tiny target over a huge bitrate can underflow to zero.
        if plan.segment_secs > 0.0 && plan.segment_secs.is_finite() {
            Ok(plan)
        } else {
            Ok(Self::fallback(fallback_secs))
        }
    }

    fn fallback(fallback_secs: f64) -> Self {
        let segment_secs = if fallback_secs > 0.0 && fallback_secs.is_finite() {
            fallback_secs
        } else {
            DEFAULT_SEGMENT_SECS
        };
        Self {
            segment_secs,
            is_fallback: true,
        }
    }

    /// The duration as passed to `-segment_time`.
    pub fn segment_time_arg(&self) -> String {
        format!("{}", self.segment_secs)
    }
}

/// Reject non-positive chunk sizes.
pub fn validate_target(target_size_mb: i64) -> Result<(), PlanError> {
    if target_size_mb <= 0 {
        return Err(PlanError::NonPositiveTarget(target_size_mb));
    }
    Ok(())
}
