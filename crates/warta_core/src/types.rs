use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Placeholder stored when a publish date or snippet is not available.
pub const NOT_AVAILABLE: &str = "N/A";

/// A link harvested from a listing page that looks like an article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub title: String,
    pub url: String,
    pub raw_date_text: String,
    pub snippet: String,
}

impl Candidate {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            raw_date_text: String::new(),
            snippet: NOT_AVAILABLE.to_string(),
        }
    }
}

/// What could be recovered from a candidate's own page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub date: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedCandidate {
    pub candidate: Candidate,
    pub metadata: Metadata,
}

impl EnrichedCandidate {
    /// Raw date text to normalize: page metadata wins over the listing text.
    pub fn raw_date(&self) -> &str {
        match self.metadata.date.as_deref() {
            Some(date) if !date.trim().is_empty() => date,
            _ => &self.candidate.raw_date_text,
        }
    }

    pub fn snippet(&self) -> &str {
        match self.metadata.description.as_deref() {
            Some(desc) if !desc.trim().is_empty() => desc,
            _ if !self.candidate.snippet.is_empty() => &self.candidate.snippet,
            _ => NOT_AVAILABLE,
        }
    }
}

/// Inclusive calendar-day window a crawl keeps articles from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidInput(format!(
                "start date {} is after end date {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Builds a range from request strings (`YYYY-MM-DD` or RFC 3339).
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_day(start)?, parse_day(end)?)
    }

    /// Day-granularity test: the whole of `start` and `end` are inside.
    pub fn contains(&self, moment: &NaiveDateTime) -> bool {
        let day = moment.date();
        self.start <= day && day <= self.end
    }
}

fn parse_day(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.date_naive()))
        .map_err(|_| Error::InvalidInput(format!("invalid date: {:?}", value)))
}

/// A persisted article row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub publish_date: String,
    pub content_snippet: String,
}

/// Insert-side article; storage fills the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewArticle {
    pub title: String,
    pub url: String,
    pub publish_date: Option<String>,
    pub content_snippet: Option<String>,
}

impl NewArticle {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    /// Title and url are both required.
    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty() && !self.url.trim().is_empty()
    }

    pub fn publish_date_or_default(&self) -> &str {
        match self.publish_date.as_deref() {
            Some(date) if !date.is_empty() => date,
            _ => NOT_AVAILABLE,
        }
    }

    pub fn content_snippet_or_default(&self) -> &str {
        self.content_snippet.as_deref().unwrap_or("")
    }

    /// Row as it would be stored under `id`.
    pub fn to_article(&self, id: i64) -> Article {
        Article {
            id,
            title: self.title.clone(),
            url: self.url.clone(),
            publish_date: self.publish_date_or_default().to_string(),
            content_snippet: self.content_snippet_or_default().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkInsertResult {
    pub inserted_count: usize,
    pub skipped_count: usize,
    pub inserted: Vec<Article>,
}

pub const MAX_PAGE_SIZE: i64 = 500;
pub const DEFAULT_PAGE_SIZE: i64 = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleQuery {
    pub limit: i64,
    pub offset: i64,
    pub search: Option<String>,
    pub from_id: i64,
}

impl Default for ArticleQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
            search: None,
            from_id: 0,
        }
    }
}

impl ArticleQuery {
    /// Title substring to match, ignoring blank searches.
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticlePage {
    pub data: Vec<Article>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Outcome of one crawl, as reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeResult {
    pub success: bool,
    pub message: String,
    pub count: usize,
    pub skipped: usize,
    pub total_found: usize,
}

impl ScrapeResult {
    pub fn empty(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            count: 0,
            skipped: 0,
            total_found: 0,
        }
    }
}
