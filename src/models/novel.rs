//! Novel and chapter records produced by extraction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Publication status of a novel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NovelStatus {
    Ongoing,
    Completed,
    Hiatus,
}

impl NovelStatus {
    /// Match free-form status text by case-insensitive substring.
    ///
    /// Checked in priority order ongoing, completed, hiatus. Anything else is
    /// `None`; the status is never guessed.
    pub fn from_text(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        if lower.contains("ongoing") {
            Some(Self::Ongoing)
        } else if lower.contains("completed") {
            Some(Self::Completed)
        } else if lower.contains("hiatus") {
            Some(Self::Hiatus)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ongoing => "ongoing",
            Self::Completed => "completed",
            Self::Hiatus => "hiatus",
        }
    }
}

/// Novel metadata scraped from a source.
///
/// Created fresh for every extraction call. Fields missing from the markup
/// stay `None` (or empty, for genres).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedNovel {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<NovelStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_language: Option<String>,
    /// Canonical identity of the novel within its source.
    pub source_url: String,
}

impl ScrapedNovel {
    /// Create a record with only the required fields set.
    pub fn new(title: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            source_url: source_url.into(),
            ..Default::default()
        }
    }
}

/// A single chapter scraped from a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedChapter {
    pub chapter_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub content: String,
    pub source_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}
