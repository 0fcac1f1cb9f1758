//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON. Every section
//! defaults sensibly so a completely empty `{}` file is valid. Deployment
//! specific values (port, public URL, storage location) can be overlaid from
//! `MEDIASPLIT_*` environment variables with [`Config::apply_env`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;
use crate::Error;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "MEDIASPLIT_";

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub split: SplitConfig,
    pub retention: RetentionConfig,
    pub tools: ToolsConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path.
    ///
    /// Unlike [`Config::load_or_default`] a missing or invalid file is an
    /// error.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Overlay values from `MEDIASPLIT_*` process environment variables.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Overlay values using `lookup` to resolve variable names.
    ///
    /// Recognised: `HOST`, `PORT`, `BASE_URL`, `BASE_PATH`, `STORAGE_DIR`,
    /// `FFMPEG_PATH`, `FFPROBE_PATH` (all prefixed with [`ENV_PREFIX`]).
    /// Unparseable values are logged and ignored.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(host) = var("HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("PORT") {
            match port.parse() {
                Ok(p) => self.server.port = p,
                Err(e) => tracing::warn!("Ignoring {ENV_PREFIX}PORT={port:?}: {e}"),
            }
        }
        if let Some(url) = var("BASE_URL") {
            self.server.base_url = url;
        }
        if let Some(path) = var("BASE_PATH") {
            self.server.base_path = path;
        }
        if let Some(dir) = var("STORAGE_DIR") {
            self.storage.root = PathBuf::from(dir);
        }
        if let Some(p) = var("FFMPEG_PATH") {
            self.tools.ffmpeg_path = Some(PathBuf::from(p));
        }
        if let Some(p) = var("FFPROBE_PATH") {
            self.tools.ffprobe_path = Some(PathBuf::from(p));
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        if self.server.base_url.is_empty() {
            warnings.push("server.base_url is empty; locators will be relative paths".into());
        } else if !self.server.base_url.contains("://") {
            warnings.push(format!(
                "server.base_url '{}' has no scheme; locators will not be absolute URLs",
                self.server.base_url
            ));
        }

        if !self.server.base_path.is_empty() && !self.server.base_path.starts_with('/') {
            warnings.push(format!(
                "server.base_path '{}' should start with '/'",
                self.server.base_path
            ));
        }

        if self.server.static_mount.trim_matches('/').is_empty() {
            warnings.push("server.static_mount is empty; segments cannot be served".into());
        }

        if self.split.default_size_mb == 0 {
            warnings.push("split.default_size_mb is 0; requests without a size will fail".into());
        }

        if self.split.fallback_segment_secs <= 0.0 {
            warnings.push("split.fallback_segment_secs must be positive".into());
        }

        if self.retention.max_age_hours == 0 {
            warnings.push(
                "retention.max_age_hours is 0; every stored file is deleted on the next sweep"
                    .into(),
            );
        }

        for (key, value) in [
            ("max_age_hours", self.retention.max_age_hours),
            ("sweep_interval_hours", self.retention.sweep_interval_hours),
        ] {
            if value > MAX_RETENTION_HOURS {
                warnings.push(format!(
                    "retention.{key} ({value}) exceeds {MAX_RETENTION_HOURS}; clamped"
                ));
            }
        }

        if self.retention.sweep_interval_hours == 0 {
            warnings.push("retention.sweep_interval_hours is 0; sweeping is disabled".into());
        }

        if self.retention.sweep_interval_hours > self.retention.max_age_hours
            && self.retention.max_age_hours > 0
        {
            warnings.push(format!(
                "retention.sweep_interval_hours ({}) exceeds max_age_hours ({}); files will outlive their retention window",
                self.retention.sweep_interval_hours, self.retention.max_age_hours
            ));
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Scheme and authority clients use to reach this server, e.g.
    /// `https://media.example.com`.
    pub base_url: String,
    /// Path prefix the whole service is mounted under (`""` or `/something`).
    pub base_path: String,
    /// Path segment under `base_path` that serves stored segments.
    pub static_mount: String,
    /// Upper bound on an upload body; `None` leaves it unbounded.
    pub max_upload_mb: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            base_url: "http://localhost:8080".into(),
            base_path: String::new(),
            static_mount: "media".into(),
            max_upload_mb: None,
        }
    }
}

impl ServerConfig {
    /// `base_path` with any trailing slash removed.
    pub fn normalized_base_path(&self) -> &str {
        self.base_path.trim_end_matches('/')
    }

    /// Route prefix that serves stored segments, e.g. `/api-root/media`.
    pub fn static_route(&self) -> String {
        format!(
            "{}/{}",
            self.normalized_base_path(),
            self.static_mount.trim_matches('/')
        )
    }

    /// Everything a locator has before the segment file name.
    pub fn locator_prefix(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.static_route())
    }
}

/// Where uploads and segments live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub root: PathBuf,
    /// Optional fixed sub-folder under `root`.
    pub subdir: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./data"),
            subdir: Some("media".into()),
        }
    }
}

impl StorageConfig {
    /// The managed directory: `root`, or `root/subdir` when set.
    pub fn dir(&self) -> PathBuf {
        match self.subdir.as_deref().map(|s| s.trim_matches('/')) {
            Some(sub) if !sub.is_empty() => self.root.join(sub),
            _ => self.root.clone(),
        }
    }
}

/// Split-by-size defaults and external process limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Chunk size used when a request does not specify one.
    pub default_size_mb: u32,
    /// Segment duration used when no usable bitrate is known.
    pub fallback_segment_secs: f64,
    pub probe_timeout_secs: u64,
    pub segment_timeout_secs: u64,
    /// Longest gap between two chunks of an upload body.
    pub upload_idle_timeout_secs: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            default_size_mb: 25,
            fallback_segment_secs: 60.0,
            probe_timeout_secs: 60,
            segment_timeout_secs: 1800,
            upload_idle_timeout_secs: 120,
        }
    }
}

impl SplitConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn segment_timeout(&self) -> Duration {
        Duration::from_secs(self.segment_timeout_secs)
    }

    pub fn upload_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_idle_timeout_secs)
    }
}

/// Retention sweep settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    pub max_age_hours: u64,
    pub sweep_interval_hours: u64,
    pub sweep_on_startup: bool,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_age_hours: 24,
            sweep_interval_hours: 12,
            sweep_on_startup: true,
        }
    }
}

/// Largest retention setting honoured, in hours (ten years). Larger values
/// are clamped.
pub const MAX_RETENTION_HOURS: u64 = 10 * 365 * 24;

fn hours(value: u64) -> Duration {
    Duration::from_secs(value.min(MAX_RETENTION_HOURS).saturating_mul(3600))
}

impl RetentionConfig {
    pub fn max_age(&self) -> Duration {
        hours(self.max_age_hours)
    }

    pub fn sweep_interval(&self) -> Duration {
        hours(self.sweep_interval_hours)
    }
}

/// Paths to external CLI tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
}
