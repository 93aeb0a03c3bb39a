//! File-backed source catalog.
//!
//! Sources live in a TOML file of `[[sources]]` tables:
//!
//! ```toml
//! [[sources]]
//! name = "Example"
//! base_url = "https://example.org"
//! search_type = "GET"
//! search_endpoint = "/?s=%QUERY%"
//!
//! [sources.selectors]
//! container = "div.result-item article"
//! title = "div.title a"
//! link = "div.title a"
//! poster = "img"
//! poster_attribute = "data-src"
//! ```
//!
//! The file is re-read on every search so edits take effect without a
//! restart.

use async_trait::async_trait;
use scour_search::{SearchError, SourceCatalog, SourceDefinition};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
struct SourcesFile {
    #[serde(default)]
    sources: Vec<SourceDefinition>,
}

/// Parse the contents of a sources file.
///
/// # Errors
///
/// Returns [`SearchError::Catalog`] if `content` is not a valid sources file.
pub fn parse_sources(content: &str) -> scour_search::Result<Vec<SourceDefinition>> {
    parse(content).map_err(|e| SearchError::Catalog(e.to_string()))
}

fn parse(content: &str) -> Result<Vec<SourceDefinition>, toml::de::Error> {
    toml::from_str::<SourcesFile>(content).map(|file| file.sources)
}

/// Catalog reading a TOML sources file.
#[derive(Debug, Clone)]
pub struct FileCatalog {
    path: PathBuf,
}

impl FileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SourceCatalog for FileCatalog {
    async fn list_active(&self) -> scour_search::Result<Vec<SourceDefinition>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| SearchError::Catalog(format!("{}: {e}", self.path.display())))?;
        let sources = parse(&content)
            .map_err(|e| SearchError::Catalog(format!("{}: {e}", self.path.display())))?;

        let total = sources.len();
        let active: Vec<_> = sources.into_iter().filter(|s| s.is_active).collect();
        tracing::debug!(
            path = %self.path.display(),
            total,
            active = active.len(),
            "loaded source catalog"
        );
        Ok(active)
    }
}
