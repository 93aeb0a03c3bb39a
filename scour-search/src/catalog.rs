//! Read-only access to the set of configured sources.
//!
//! Storage and editing of source definitions live outside this crate; the
//! orchestrator only ever reads through [`SourceCatalog`].

use crate::error::Result;
use crate::types::SourceDefinition;
use async_trait::async_trait;

/// Supplies the active source definitions for a search.
///
/// Called once per search, so implementations backed by a file or database
/// pick up edits without a restart.
#[async_trait]
pub trait SourceCatalog: Send + Sync {
    /// Returns every source whose `is_active` flag is set.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SearchError::Catalog`] if the backing store cannot be
    /// read.
    async fn list_active(&self) -> Result<Vec<SourceDefinition>>;
}

/// In-memory catalog over a fixed list of sources.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    sources: Vec<SourceDefinition>,
}

impl StaticCatalog {
    pub fn new(sources: Vec<SourceDefinition>) -> Self {
        Self { sources }
    }
}

#[async_trait]
impl SourceCatalog for StaticCatalog {
    async fn list_active(&self) -> Result<Vec<SourceDefinition>> {
        Ok(self
            .sources
            .iter()
            .filter(|s| s.is_active)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SearchType, SelectorSet};

    fn source(name: &str, is_active: bool) -> SourceDefinition {
        SourceDefinition {
            name: name.into(),
            base_url: "https://example.org".into(),
            is_active,
            search_type: SearchType::Get,
            search_endpoint: "/?s=%QUERY%".into(),
            post_payload_template: None,
            requires_bypass: false,
            selectors: SelectorSet {
                container: "article".into(),
                title: "h2".into(),
                link: "a".into(),
                poster: "img".into(),
                poster_attribute: "src".into(),
            },
        }
    }

    #[tokio::test]
    async fn static_catalog_filters_inactive() {
        let catalog = StaticCatalog::new(vec![
            source("A", true),
            source("B", false),
            source("C", true),
        ]);
        let active = catalog.list_active().await.expect("should list");
        let names: Vec<&str> = active.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["A", "C"]);
    }

    #[tokio::test]
    async fn empty_catalog_lists_nothing() {
        let catalog = StaticCatalog::default();
        assert!(catalog.list_active().await.expect("should list").is_empty());
    }
}
