//! Source lookup by id.

use std::sync::Arc;

use serde::Serialize;

use super::cache::ContentCache;
use super::config::ScraperOptions;
use super::decoder::{DecoderTable, SiteDecoder};
use super::source::Source;
use crate::error::{Result, ScrapeError};

/// Summary of a registered source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInfo {
    pub id: String,
    pub name: String,
    pub base_url: String,
}

/// Creates sources from a decoder table.
///
/// Owns one content cache shared by every source it creates, unless the
/// options carry their own.
pub struct SourceRegistry {
    decoders: DecoderTable,
    cache: Arc<ContentCache>,
}

impl SourceRegistry {
    /// Registry over the built-in sites.
    pub fn new() -> Result<Self> {
        Ok(Self::with_decoders(DecoderTable::builtin()?))
    }

    pub fn with_decoders(decoders: DecoderTable) -> Self {
        Self::with_cache(decoders, Arc::new(ContentCache::new()))
    }

    pub fn with_cache(decoders: DecoderTable, cache: Arc<ContentCache>) -> Self {
        Self { decoders, cache }
    }

    /// Create a source for `id`.
    pub fn create_source(&self, id: &str, options: &ScraperOptions) -> Result<Source> {
        let decoder = self
            .decoders
            .get(id)
            .ok_or_else(|| ScrapeError::UnknownSource { id: id.to_string() })?;
        let cache = options.cache.clone().unwrap_or_else(|| self.cache.clone());
        Source::new(decoder, options, cache)
    }

    /// Registered ids in declaration order.
    pub fn available_sources(&self) -> Vec<String> {
        self.decoders.ids()
    }

    pub fn source_info(&self) -> Vec<SourceInfo> {
        self.decoders
            .iter()
            .map(|d| SourceInfo {
                id: d.id.clone(),
                name: d.name.clone(),
                base_url: d.base_url.clone(),
            })
            .collect()
    }

    pub fn decoder(&self, id: &str) -> Option<Arc<SiteDecoder>> {
        self.decoders.get(id)
    }

    pub fn cache(&self) -> &Arc<ContentCache> {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_sources_in_declaration_order() {
        let registry = SourceRegistry::new().unwrap();
        let ids = registry.available_sources();

        assert_eq!(ids.first().map(String::as_str), Some("novelbin"));
        for id in ["novelbin", "royalroad", "scribblehub", "freewebnovel", "empirenovel", "ao3"] {
            assert!(ids.iter().any(|i| i == id), "missing {id}");
        }
        assert_eq!(ids, SourceRegistry::new().unwrap().available_sources());
    }

    #[test]
    fn test_unknown_source() {
        let registry = SourceRegistry::new().unwrap();
        let err = registry
            .create_source("doesNotExist", &ScraperOptions::default())
            .err()
            .unwrap();

        assert!(matches!(err, ScrapeError::UnknownSource { ref id } if id == "doesNotExist"));
    }

    #[test]
    fn test_sources_share_registry_cache() {
        let registry = SourceRegistry::new().unwrap();
        let options = ScraperOptions::default();

        let a = registry.create_source("novelbin", &options).unwrap();
        let b = registry.create_source("royalroad", &options).unwrap();
        assert!(Arc::ptr_eq(a.fetcher().cache(), b.fetcher().cache()));
        assert!(Arc::ptr_eq(a.fetcher().cache(), registry.cache()));

        let own = Arc::new(ContentCache::new());
        let c = registry
            .create_source("ao3", &options.clone().with_cache(own.clone()))
            .unwrap();
        assert!(Arc::ptr_eq(c.fetcher().cache(), &own));
        assert_eq!(c.base_url(), "https://archiveofourown.org");

        let ao3 = registry.decoder("ao3").unwrap();
        assert_eq!(ao3.language.as_deref(), Some("en"));
        assert!(std::ptr::eq(c.decoder(), ao3.as_ref()));
        assert!(registry.decoder("doesNotExist").is_none());
    }

    #[test]
    fn test_source_info_serializes_camel_case() {
        let registry = SourceRegistry::new().unwrap();
        let json = serde_json::to_value(&registry.source_info()[0]).unwrap();
        assert_eq!(json["id"], "novelbin");
        assert_eq!(json["baseUrl"], "https://novelbin.com");
    }
}
