//! Per-site CSS selector tables.
//!
//! The built-in table lives in `decoders.toml` and is compiled into the
//! binary. Config files can replace a built-in entry by id or append new
//! sites; the merged table is validated before any source is created.

use std::collections::HashSet;
use std::sync::Arc;

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScrapeError};

const BUILTIN_DECODERS: &str = include_str!("decoders.toml");

/// How a site builds its search URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SearchRoute {
    /// `<base><path>?<param>=<query>` plus fixed extra pairs.
    Query {
        path: String,
        param: String,
        #[serde(default)]
        extra: Vec<(String, String)>,
    },
    /// `<base><prefix><query>`.
    Path { prefix: String },
}

impl SearchRoute {
    /// Build the absolute search URL for `query`.
    pub fn build(&self, base_url: &str, query: &str) -> String {
        let encoded = urlencoding::encode(query);
        match self {
            SearchRoute::Query { path, param, extra } => {
                let mut url = format!("{}{}?{}={}", base_url, path, param, encoded);
                for (key, value) in extra {
                    url.push('&');
                    url.push_str(key);
                    url.push('=');
                    url.push_str(&urlencoding::encode(value));
                }
                url
            }
            SearchRoute::Path { prefix } => format!("{}{}{}", base_url, prefix, encoded),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSelectors {
    pub container: String,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NovelSelectors {
    pub title: String,
    pub cover: String,
    pub author: String,
    pub description: String,
    pub genres: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterSelectors {
    pub title: String,
    pub content: String,
    /// Element carrying the publication date, in a `datetime` attribute or as text.
    #[serde(default)]
    pub published: Option<String>,
}

/// Selectors grouped by extraction stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selectors {
    pub search: SearchSelectors,
    pub novel: NovelSelectors,
    pub chapter_list: String,
    pub chapter: ChapterSelectors,
}

/// Static extraction config for one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteDecoder {
    pub id: String,
    pub name: String,
    pub base_url: String,
    /// Original language of works on this site, when uniform.
    #[serde(default)]
    pub language: Option<String>,
    pub search_route: SearchRoute,
    pub selectors: Selectors,
}

impl SiteDecoder {
    /// Check that every selector is present and parses.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| ScrapeError::InvalidDecoder {
            source_id: self.id.clone(),
            reason,
        };

        if self.id.trim().is_empty() {
            return Err(invalid("empty id".to_string()));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(invalid(format!("base_url {:?} is not absolute", self.base_url)));
        }
        if self.base_url.ends_with('/') {
            return Err(invalid("base_url must not end with '/'".to_string()));
        }

        let s = &self.selectors;
        let required = [
            ("search.container", &s.search.container),
            ("search.title", &s.search.title),
            ("search.url", &s.search.url),
            ("novel.title", &s.novel.title),
            ("novel.cover", &s.novel.cover),
            ("novel.author", &s.novel.author),
            ("novel.description", &s.novel.description),
            ("novel.genres", &s.novel.genres),
            ("novel.status", &s.novel.status),
            ("chapter_list", &s.chapter_list),
            ("chapter.title", &s.chapter.title),
            ("chapter.content", &s.chapter.content),
        ];
        let optional = [
            ("search.cover", s.search.cover.as_ref()),
            ("search.author", s.search.author.as_ref()),
            ("chapter.published", s.chapter.published.as_ref()),
        ];

        let present = required
            .into_iter()
            .map(|(field, sel)| (field, Some(sel)))
            .chain(optional);
        for (field, selector) in present {
            let Some(selector) = selector else {
                continue;
            };
            if selector.trim().is_empty() {
                return Err(invalid(format!("selector {} is empty", field)));
            }
            if let Err(e) = Selector::parse(selector) {
                return Err(invalid(format!(
                    "selector {} ({:?}) does not parse: {}",
                    field, selector, e
                )));
            }
        }

        Ok(())
    }

    /// Absolute search URL for `query`.
    pub fn search_url(&self, query: &str) -> String {
        self.search_route.build(&self.base_url, query)
    }
}

#[derive(Debug, Deserialize)]
struct DecoderFile {
    #[serde(default)]
    decoders: Vec<SiteDecoder>,
}

/// Ordered, validated set of site decoders.
#[derive(Debug, Clone)]
pub struct DecoderTable {
    decoders: Vec<Arc<SiteDecoder>>,
}

impl DecoderTable {
    /// The compiled-in table.
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_DECODERS)
    }

    /// Parse a `[[decoders]]` TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let file: DecoderFile = toml::from_str(input)
            .map_err(|e| ScrapeError::Config(format!("Failed to parse decoder table: {}", e)))?;
        Self::new(file.decoders)
    }

    /// Build a table from decoders in order, validating each.
    pub fn new(decoders: Vec<SiteDecoder>) -> Result<Self> {
        let table = Self {
            decoders: decoders.into_iter().map(Arc::new).collect(),
        };
        table.validate()?;
        Ok(table)
    }

    /// Validate every decoder and reject duplicate ids.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for decoder in &self.decoders {
            decoder.validate()?;
            if !seen.insert(decoder.id.as_str()) {
                return Err(ScrapeError::InvalidDecoder {
                    source_id: decoder.id.clone(),
                    reason: "duplicate id".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Apply overrides: matching ids are replaced in place, new ids appended.
    pub fn merge(mut self, overrides: Vec<SiteDecoder>) -> Result<Self> {
        for decoder in overrides {
            match self.decoders.iter().position(|d| d.id == decoder.id) {
                Some(index) => self.decoders[index] = Arc::new(decoder),
                None => self.decoders.push(Arc::new(decoder)),
            }
        }
        self.validate()?;
        Ok(self)
    }

    pub fn get(&self, id: &str) -> Option<Arc<SiteDecoder>> {
        self.decoders.iter().find(|d| d.id == id).cloned()
    }

    /// Ids in declaration order.
    pub fn ids(&self) -> Vec<String> {
        self.decoders.iter().map(|d| d.id.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<SiteDecoder>> {
        self.decoders.iter()
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }
}
