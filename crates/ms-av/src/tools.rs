//! Locating ffmpeg and ffprobe.
//!
//! Both are required for splitting. [`ToolRegistry::discover`] prefers an
//! explicitly configured path and otherwise searches `PATH`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ms_core::config::ToolsConfig;
use serde::Serialize;

use crate::command::ToolCommand;

/// How long `<tool> -version` may run before the tool is reported without a
/// version.
pub const VERSION_DEADLINE: Duration = Duration::from_secs(5);

/// The external programs the engine drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Ffmpeg,
    Ffprobe,
}

impl Tool {
    pub const ALL: [Tool; 2] = [Tool::Ffmpeg, Tool::Ffprobe];

    pub fn binary_name(self) -> &'static str {
        match self {
            Tool::Ffmpeg => "ffmpeg",
            Tool::Ffprobe => "ffprobe",
        }
    }

    fn configured(self, config: &ToolsConfig) -> Option<&Path> {
        match self {
            Tool::Ffmpeg => config.ffmpeg_path.as_deref(),
            Tool::Ffprobe => config.ffprobe_path.as_deref(),
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary_name())
    }
}

/// Availability of one tool, as reported by `check-tools` and the admin API.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ToolInfo {
    pub name: String,
    pub available: bool,
    /// First line of `<tool> -version`.
    pub version: Option<String>,
    #[schema(value_type = Option<String>)]
    pub path: Option<PathBuf>,
}

/// Resolved executable paths.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    ffmpeg: Option<PathBuf>,
    ffprobe: Option<PathBuf>,
}

impl ToolRegistry {
    pub fn discover(config: &ToolsConfig) -> Self {
        let mut registry = Self::default();
        for tool in Tool::ALL {
            let found = match tool.configured(config) {
                Some(path) if path.exists() => Some(path.to_path_buf()),
                Some(path) => {
                    tracing::warn!(
                        "Configured {tool} path {} does not exist; searching PATH",
                        path.display()
                    );
                    which::which(tool.binary_name()).ok()
                }
                None => which::which(tool.binary_name()).ok(),
            };
            match &found {
                Some(path) => tracing::debug!("Resolved {tool} to {}", path.display()),
                None => tracing::debug!("{tool} not found"),
            }
            *registry.slot(tool) = found;
        }
        registry
    }

    /// A registry with fixed paths, bypassing discovery.
    pub fn with_paths(paths: impl IntoIterator<Item = (Tool, PathBuf)>) -> Self {
        let mut registry = Self::default();
        for (tool, path) in paths {
            *registry.slot(tool) = Some(path);
        }
        registry
    }

    fn slot(&mut self, tool: Tool) -> &mut Option<PathBuf> {
        match tool {
            Tool::Ffmpeg => &mut self.ffmpeg,
            Tool::Ffprobe => &mut self.ffprobe,
        }
    }

    pub fn path(&self, tool: Tool) -> Option<&Path> {
        match tool {
            Tool::Ffmpeg => self.ffmpeg.as_deref(),
            Tool::Ffprobe => self.ffprobe.as_deref(),
        }
    }

    /// Path of `tool`, or [`ms_core::Error::Tool`] if it was not found.
    pub fn require(&self, tool: Tool) -> ms_core::Result<&Path> {
        self.path(tool).ok_or_else(|| {
            ms_core::Error::tool(
                tool.binary_name(),
                format!("{tool} not found; install it or set tools.{tool}_path"),
            )
        })
    }

    /// Availability of every tool, with versions from `-version`.
    pub async fn check_all(&self) -> Vec<ToolInfo> {
        self.check_all_within(VERSION_DEADLINE).await
    }

    /// [`check_all`](Self::check_all) with an explicit deadline per tool.
    pub async fn check_all_within(&self, deadline: Duration) -> Vec<ToolInfo> {
        let mut infos = Vec::with_capacity(Tool::ALL.len());
        for tool in Tool::ALL {
            let path = self.path(tool).map(Path::to_path_buf);
            let version = match &path {
                Some(path) => version_line(path, deadline).await,
                None => None,
            };
            infos.push(ToolInfo {
                name: tool.binary_name().to_string(),
                available: path.is_some(),
                version,
                path,
            });
        }
        infos
    }
}

async fn version_line(path: &Path, deadline: Duration) -> Option<String> {
    match ToolCommand::new(path).arg("-version").deadline(deadline).run().await {
        Ok(output) => output.stdout.lines().next().map(str::to_string),
        Err(e) => {
            tracing::warn!("Could not read version of {}: {e}", path.display());
            None
        }
    }
}
