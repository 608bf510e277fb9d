//! Selector-driven extraction over parsed markup.
//!
//! Everything here is synchronous and works on a borrowed [`Html`], which is
//! not `Send`; parse, extract and drop before the next await. Missing markup
//! yields empty or absent values, never errors.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::decoder::SiteDecoder;
use crate::models::{NovelStatus, ScrapedChapter, ScrapedNovel};

static URL_CHAPTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)chapter[_-]?(\d+)").unwrap());
static TITLE_CHAPTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)chapter\s*(\d+)").unwrap());
static BR_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
static P_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</p>").unwrap());
static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static NOISE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script, style, .ads, .advertisement").unwrap());

/// Resolve a possibly-relative link against `base_url`.
///
/// Absolute http(s) links pass through, protocol-relative links get `https:`,
/// root-relative links get `base_url` prefixed. Anything else is returned as is.
pub fn resolve_url(base_url: &str, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else if url.starts_with("//") {
        format!("https:{}", url)
    } else if url.starts_with('/') {
        format!("{}{}", base_url, url)
    } else {
        url.to_string()
    }
}

/// Chapter number from the URL, then the title, else 1.
pub fn extract_chapter_number(url: &str, title: Option<&str>) -> u32 {
    let from = |re: &Regex, text: &str| {
        re.captures(text)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .filter(|n| *n > 0)
    };

    from(&URL_CHAPTER, url)
        .or_else(|| title.and_then(|t| from(&TITLE_CHAPTER, t)))
        .unwrap_or(1)
}

/// Turn chapter markup into plain text.
pub fn clean_content(html: &str) -> String {
    let text = BR_TAG.replace_all(html, "\n");
    let text = P_CLOSE.replace_all(&text, "\n\n");
    let text = ANY_TAG.replace_all(&text, "");
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

/// Parse a publication timestamp: RFC 3339 or a bare `YYYY-MM-DD` date.
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let date = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn first<'a>(scope: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let sel = selector(css)?;
    scope.select(&sel).next()
}

fn first_text(doc: &Html, css: &str) -> String {
    first(doc, css).map(element_text).unwrap_or_default()
}

fn first_attr(doc: &Html, css: &str, attr: &str) -> Option<String> {
    first(doc, css).and_then(|el| el.value().attr(attr).map(str::to_string))
}

fn all_texts(doc: &Html, css: &str) -> Vec<String> {
    let Some(sel) = selector(css) else {
        return Vec::new();
    };
    doc.select(&sel)
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect()
}

fn image_src(el: ElementRef<'_>) -> Option<String> {
    let value = el.value();
    value
        .attr("src")
        .or_else(|| value.attr("data-src"))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Search results. Entries without both a title and a link are skipped.
pub fn search_results(doc: &Html, decoder: &SiteDecoder) -> Vec<ScrapedNovel> {
    let search = &decoder.selectors.search;
    let (Some(container), Some(title_sel), Some(url_sel)) = (
        selector(&search.container),
        selector(&search.title),
        selector(&search.url),
    ) else {
        return Vec::new();
    };
    let cover_sel = search.cover.as_deref().and_then(selector);
    let author_sel = search.author.as_deref().and_then(selector);

    let mut novels = Vec::new();
    for item in doc.select(&container) {
        let title = item
            .select(&title_sel)
            .next()
            .map(element_text)
            .unwrap_or_default();
        let href = item
            .select(&url_sel)
            .next()
            .and_then(|el| el.value().attr("href"))
            .unwrap_or_default();
        if title.is_empty() || href.is_empty() {
            continue;
        }

        let mut novel = ScrapedNovel::new(title, resolve_url(&decoder.base_url, href));
        novel.cover_image = cover_sel
            .as_ref()
            .and_then(|sel| item.select(sel).next())
            .and_then(image_src)
            .map(|src| resolve_url(&decoder.base_url, &src));
        novel.author = author_sel
            .as_ref()
            .and_then(|sel| item.select(sel).next())
            .map(element_text)
            .and_then(non_empty);
        novel.original_language = decoder.language.clone();
        novels.push(novel);
    }
    novels
}

/// Novel metadata from a detail page.
pub fn novel_details(doc: &Html, decoder: &SiteDecoder, url: &str) -> ScrapedNovel {
    let sel = &decoder.selectors.novel;

    let mut novel = ScrapedNovel::new(first_text(doc, &sel.title), url);
    novel.author = non_empty(first_text(doc, &sel.author));
    novel.cover_image = first(doc, &sel.cover)
        .and_then(image_src)
        .map(|src| resolve_url(&decoder.base_url, &src));
    novel.description = non_empty(first_text(doc, &sel.description));
    novel.genres = all_texts(doc, &sel.genres);
    novel.status = NovelStatus::from_text(&all_texts(doc, &sel.status).join(" "));
    novel.original_language = decoder.language.clone();
    novel
}

/// Absolute chapter URLs in page order.
pub fn chapter_links(doc: &Html, decoder: &SiteDecoder) -> Vec<String> {
    let Some(sel) = selector(&decoder.selectors.chapter_list) else {
        return Vec::new();
    };
    doc.select(&sel)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| !href.is_empty())
        .map(|href| resolve_url(&decoder.base_url, href))
        .collect()
}

/// Inner markup of the content block with ads, scripts and styles removed.
fn content_markup(doc: &Html, css: &str) -> String {
    let Some(block) = first(doc, css) else {
        return String::new();
    };
    let mut fragment = Html::parse_fragment(&block.inner_html());
    let noise: Vec<_> = fragment.select(&NOISE).map(|el| el.id()).collect();
    for id in noise {
        if let Some(mut node) = fragment.tree.get_mut(id) {
            node.detach();
        }
    }
    fragment.root_element().inner_html()
}

/// Chapter body and metadata.
pub fn chapter_details(doc: &Html, decoder: &SiteDecoder, url: &str) -> ScrapedChapter {
    let sel = &decoder.selectors.chapter;

    let title = non_empty(first_text(doc, &sel.title));
    let published_at = sel.published.as_deref().and_then(|css| {
        first_attr(doc, css, "datetime")
            .or_else(|| non_empty(first_text(doc, css)))
            .and_then(|raw| parse_published(&raw))
    });

    ScrapedChapter {
        chapter_number: extract_chapter_number(url, title.as_deref()),
        title,
        content: clean_content(&content_markup(doc, &sel.content)),
        source_url: url.to_string(),
        published_at,
    }
}
