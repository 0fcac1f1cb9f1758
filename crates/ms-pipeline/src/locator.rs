//! Public URLs for stored segments.

use ms_core::config::ServerConfig;
use ms_core::SegmentFile;

/// Turns segment file names into client-facing URLs.
///
/// A locator is `<base_url><base_path>/<static_mount>/<file_name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorTemplate {
    prefix: String,
}

impl LocatorTemplate {
    /// Use `prefix` verbatim; the file name is appended after a `/`.
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into().trim_end_matches('/').to_string();
        Self { prefix }
    }

    pub fn from_server_config(server: &ServerConfig) -> Self {
        Self::new(server.locator_prefix())
    }

    pub fn locate(&self, segment: &SegmentFile) -> String {
        self.locate_name(&segment.file_name)
    }

    pub fn locate_name(&self, file_name: &str) -> String {
        format!("{}/{}", self.prefix, file_name)
    }
}
