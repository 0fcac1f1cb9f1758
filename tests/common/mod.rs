//! Shared test harness for integration tests.
//!
//! [`TestHarness`] wires stub probe/segment adapters into a real
//! [`AppContext`] backed by a temporary storage directory, and can start Axum
//! on a random port for HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use ms_av::{MediaProber, ProbeResult, SegmentPlan, Segmenter, ToolRegistry};
use ms_core::config::Config;
use ms_core::{AssetId, ProbeError, SegmentError, SegmentFile};
use ms_pipeline::Ingestor;
use ms_server::context::AppContext;
use ms_server::router::build_router;

/// What the stub prober reports.
#[derive(Debug, Clone, Copy)]
pub enum Probe {
    Media { duration_secs: f64, size_bytes: f64 },
    ToolFailure,
    Unusable,
}

pub struct StubProber(pub Probe);

#[async_trait]
impl MediaProber for StubProber {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn probe(&self, _path: &Path) -> Result<ProbeResult, ProbeError> {
        match self.0 {
            Probe::Media {
                duration_secs,
                size_bytes,
            } => ProbeResult::new(duration_secs, size_bytes),
            Probe::ToolFailure => Err(ProbeError::Tool("Invalid data found when processing input".into())),
            Probe::Unusable => Err(ProbeError::InsufficientOutput { lines: 0 }),
        }
    }
}

/// Writes `ceil(duration / segment_secs)` chunks next to the input.
pub struct StubSegmenter {
    pub duration_secs: f64,
    pub plans: Mutex<Vec<SegmentPlan>>,
}

impl StubSegmenter {
    pub fn new(duration_secs: f64) -> Self {
        Self {
            duration_secs,
            plans: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Segmenter for StubSegmenter {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn segment(
        &self,
        asset_id: &AssetId,
        input: &Path,
        plan: &SegmentPlan,
        output_pattern: &Path,
    ) -> Result<Vec<SegmentFile>, SegmentError> {
        self.plans.lock().unwrap().push(*plan);
        let count = (self.duration_secs / plan.segment_secs).ceil() as usize;
        let pattern = output_pattern.to_string_lossy().into_owned();
        for i in 0..count {
            let path = pattern.replace("%03d", &format!("{i:03}"));
            std::fs::write(path, format!("chunk {i}")).unwrap();
        }
        ms_av::collect_segments(output_pattern.parent().unwrap(), asset_id, input)
    }
}

/// Test harness wrapping an [`AppContext`] with stub media adapters.
pub struct TestHarness {
    pub ctx: AppContext,
    pub segmenter: Arc<StubSegmenter>,
    pub storage: tempfile::TempDir,
}

impl TestHarness {
    /// Build a harness whose locators point at `base_url`.
    pub fn new(base_url: String, probe: Probe) -> Self {
        let storage = tempfile::tempdir().expect("failed to create storage dir");

        let mut config = Config::default();
        config.server.base_url = base_url;
        config.storage.root = storage.path().to_path_buf();
        config.storage.subdir = None;

        let duration = match probe {
            Probe::Media { duration_secs, .. } => duration_secs,
            _ => 100.0,
        };
        let segmenter = Arc::new(StubSegmenter::new(duration));
        let ingestor = Ingestor::from_config(&config, Arc::new(StubProber(probe)), segmenter.clone());

        let ctx = AppContext::new(config, Arc::new(ToolRegistry::default()), ingestor);
        Self {
            ctx,
            segmenter,
            storage,
        }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server(probe: Probe) -> (Self, SocketAddr) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        let harness = Self::new(format!("http://{addr}"), probe);
        let app = build_router(harness.ctx.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }

    pub fn storage_dir(&self) -> PathBuf {
        self.storage.path().to_path_buf()
    }

    /// File names currently in storage, sorted.
    pub fn stored_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.storage.path())
            .expect("failed to list storage")
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

/// 100 MB over 100 s: 8 Mbit/s.
pub const HUNDRED_MEGS: Probe = Probe::Media {
    duration_secs: 100.0,
    size_bytes: 100_000_000.0,
};
