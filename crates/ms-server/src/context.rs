//! Shared application state.
//!
//! [`AppContext`] is handed to every route handler via Axum state. It only
//! holds `Arc`s, so cloning it per request is cheap.

use std::sync::Arc;

use ms_av::{FfmpegSegmenter, FfprobeProber, ToolRegistry};
use ms_core::config::Config;
use ms_pipeline::Ingestor;

/// Application context shared by all request handlers.
#[derive(Clone)]
pub struct AppContext {
    /// Immutable configuration snapshot.
    pub config: Arc<Config>,
    /// Discovered external tools.
    pub tools: Arc<ToolRegistry>,
    /// The split-by-size pipeline.
    pub ingestor: Arc<Ingestor>,
}

impl AppContext {
    pub fn new(config: Config, tools: Arc<ToolRegistry>, ingestor: Ingestor) -> Self {
        Self {
            config: Arc::new(config),
            tools,
            ingestor: Arc::new(ingestor),
        }
    }

    /// Wire the ffprobe/ffmpeg adapters found in `tools` into an ingestor.
    ///
    /// Fails if either tool is missing, since no request could succeed.
    pub fn from_config(config: Config, tools: Arc<ToolRegistry>) -> ms_core::Result<Self> {
        let prober = FfprobeProber::from_registry(&tools, config.split.probe_timeout())?;
        let segmenter = FfmpegSegmenter::from_registry(&tools, config.split.segment_timeout())?;
        let ingestor = Ingestor::from_config(&config, Arc::new(prober), Arc::new(segmenter));
        Ok(Self::new(config, tools, ingestor))
    }
}
