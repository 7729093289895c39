//! Publish date and description of a candidate's own page.
//!
//! The date is looked up through [`DATE_CHAIN`], an ordered list of
//! extractors; the first one that yields a non-empty value wins.

use scraper::{Html, Selector};
use std::time::Duration;
use warta_core::{Candidate, EnrichedCandidate, Metadata};

use crate::browser::PageDriver;
use crate::dom::{collapse_whitespace, rendered_text};
use crate::jsonld::{extract_date_published, StructuredDate};
use crate::logging::Logger;

pub const DATE_META_NAMES: &[&str] = &[
    "article:published_time",
    "og:article:published_time",
    "date",
    "published_time",
    "pubdate",
    "publish-date",
    "original-publish-date",
];

pub const DATE_ELEMENT_SELECTORS: &[&str] = &[
    "time",
    ".time",
    ".date",
    ".post-date",
    ".meta-date",
    r#"span[class*="date"]"#,
];

pub const DESCRIPTION_META_NAMES: &[&str] = &["description", "og:description", "twitter:description"];

pub type DateExtractor = fn(&Html) -> Option<String>;

pub const DATE_CHAIN: &[(&str, DateExtractor)] = &[
    ("json-ld", date_from_json_ld),
    ("meta", date_from_meta),
    ("element", date_from_element),
];

fn date_from_json_ld(document: &Html) -> Option<String> {
    match extract_date_published(document) {
        StructuredDate::Found(date) => Some(date),
        StructuredDate::Malformed => {
            tracing::debug!("JSON-LD present but unreadable, falling back");
            None
        }
        StructuredDate::NotFound => None,
    }
}

/// Non-empty `content` of the first `<meta>` whose property or name is in `names`.
pub fn meta_content(document: &Html, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        let css = format!(r#"meta[property="{0}"], meta[name="{0}"]"#, name);
        let selector = Selector::parse(&css).ok()?;
        document
            .select(&selector)
            .filter_map(|el| el.value().attr("content"))
            .map(str::trim)
            .find(|content| !content.is_empty())
            .map(str::to_string)
    })
}

fn date_from_meta(document: &Html) -> Option<String> {
    meta_content(document, DATE_META_NAMES)
}

fn date_from_element(document: &Html) -> Option<String> {
    DATE_ELEMENT_SELECTORS.iter().find_map(|css| {
        let selector = Selector::parse(css).ok()?;
        let element = document.select(&selector).next()?;
        let value = match element.value().attr("datetime").map(str::trim) {
            Some(datetime) if !datetime.is_empty() => datetime.to_string(),
            _ => collapse_whitespace(&rendered_text(element)),
        };
        (!value.is_empty()).then_some(value)
    })
}

/// Runs the date chain and the description lookup over a parsed page.
pub fn extract_metadata(document: &Html) -> Metadata {
    let date = DATE_CHAIN.iter().find_map(|(source, extractor)| {
        let date = extractor(document)?;
        tracing::trace!("Date from {}: {}", source, date);
        Some(date)
    });

    Metadata {
        date,
        description: meta_content(document, DESCRIPTION_META_NAMES),
    }
}

pub fn extract_metadata_html(html: &str) -> Metadata {
    let document = Html::parse_document(html);
    extract_metadata(&document)
}

fn shorten(title: &str, max_chars: usize) -> String {
    match title.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &title[..cut]),
        None => title.to_string(),
    }
}

/// Visits at most `limit` candidates one after another on `page`. A page that
/// fails to load leaves its candidate with empty metadata; nothing here aborts
/// the batch.
pub async fn extract(
    page: &mut dyn PageDriver,
    candidates: &[Candidate],
    limit: usize,
    timeout: Duration,
    logger: &Logger,
) -> Vec<EnrichedCandidate> {
    let total = candidates.len().min(limit);
    let mut enriched = Vec::with_capacity(total);

    let mut index = 0;
    while index < total {
        let candidate = &candidates[index];
        let log = logger.clone().with_prefix(format!("[{}/{}]", index + 1, total));
        log.debug(&format!("Processing {}", shorten(&candidate.title, 30)));

        let metadata = match page.open(&candidate.url, timeout).await {
            Ok(html) => extract_metadata_html(&html),
            Err(e) => {
                log.warn(&format!("Failed to open detail page, using listing data: {}", e));
                Metadata::default()
            }
        };

        enriched.push(EnrichedCandidate {
            candidate: candidate.clone(),
            metadata,
        });
        index += 1;
    }

    enriched
}
