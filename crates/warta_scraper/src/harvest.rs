//! Finds article-looking links on a listing page.
//!
//! Nothing here knows about particular sites. A link becomes a [`Candidate`]
//! when it survives every rule of [`LINK_RULES`], checked in order.

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;
use warta_core::Candidate;

use crate::dom::{rendered_text, select_first};

/// Containers that usually hold the article list, tried in this order.
pub const MAIN_SELECTORS: &[&str] = &[
    "#main",
    "#content",
    ".main-content",
    ".post-listing",
    ".td-main-content",
    ".l-content",
    ".jeg_main_content",
    "main",
    "#primary",
];

const MIN_TITLE_CHARS: usize = 20;
const MIN_WORDS: usize = 4;
const MIN_WORDS_INDEX_TITLE: usize = 8;
const STALE_YEARS: i32 = 6;

/// Titles starting with these are usually category or region index pages.
const INDEX_PREFIXES: &[&str] = &[
    "kabupaten", "kota", "provinsi", "kategori", "tag", "indeks", "topik", "category", "topic",
    "index",
];

pub const TITLE_BLACKLIST: &[&str] = &[
    "template", "blogger", "theme", "wordpress", "jasa", "iklan", "promo", "login", "signup",
    "policy",
];

const ARTICLE_PATH_MARKERS: &[&str] = &["/berita/", "/read/", "/detail/", "/news/", "/artikel/", "/view/"];

lazy_static! {
    static ref TIME_MARKER: Regex =
        Regex::new(r"(?i)^(\d+)\s*(menit|jam|hari|minutes?|hours?|days?)\s*(lalu|ago)").unwrap();
    static ref TIME_MARKER_PREFIX: Regex =
        Regex::new(r"(?i)^(\d+)\s*(menit|jam|hari|minutes?|hours?|days?)\s*(lalu|ago)\s*-?\s*").unwrap();
    static ref NUMERIC_ID_SEGMENT: Regex = Regex::new(r"/\d{5,}/").unwrap();
    static ref SHORT_ID: Regex = Regex::new(r"/d-\d+").unwrap();
}

/// One anchor under evaluation.
#[derive(Debug)]
pub struct LinkContext<'a> {
    pub title: &'a str,
    pub url: &'a Url,
    pub current_year: i32,
    lower_title: String,
    lower_url: String,
}

impl<'a> LinkContext<'a> {
    pub fn new(title: &'a str, url: &'a Url, current_year: i32) -> Self {
        Self {
            title,
            url,
            current_year,
            lower_title: title.to_lowercase(),
            lower_url: url.as_str().to_lowercase(),
        }
    }
}

pub type LinkRule = fn(&LinkContext<'_>) -> bool;

pub const LINK_RULES: &[(&str, LinkRule)] = &[
    ("title-length", has_long_title),
    ("http-scheme", is_http),
    ("stale-year", is_not_stale),
    ("word-count", has_enough_words),
    ("blacklist", is_not_blacklisted),
    ("article-signal", has_article_signal),
];

fn has_long_title(link: &LinkContext<'_>) -> bool {
    link.title.chars().count() >= MIN_TITLE_CHARS
}

fn is_http(link: &LinkContext<'_>) -> bool {
    matches!(link.url.scheme(), "http" | "https")
}

fn is_not_stale(link: &LinkContext<'_>) -> bool {
    (link.current_year - STALE_YEARS..link.current_year)
        .all(|year| !link.lower_url.contains(&format!("/{}/", year)))
}

fn has_enough_words(link: &LinkContext<'_>) -> bool {
    let words = link.title.split_whitespace().count();
    let minimum = if INDEX_PREFIXES.iter().any(|p| link.lower_title.starts_with(p)) {
        MIN_WORDS_INDEX_TITLE
    } else {
        MIN_WORDS
    };
    words >= minimum
}

fn is_not_blacklisted(link: &LinkContext<'_>) -> bool {
    !TITLE_BLACKLIST.iter().any(|term| link.lower_title.contains(term))
}

fn has_article_signal(link: &LinkContext<'_>) -> bool {
    let url = link.url.as_str();
    ARTICLE_PATH_MARKERS.iter().any(|m| link.lower_url.contains(m))
        || link.lower_url.contains(&format!("/{}/", link.current_year))
        || NUMERIC_ID_SEGMENT.is_match(url)
        || SHORT_ID.is_match(url)
}

/// Name of the first rule the link breaks, if any.
pub fn rejection(link: &LinkContext<'_>) -> Option<&'static str> {
    LINK_RULES
        .iter()
        .find(|(_, rule)| !rule(link))
        .map(|(name, _)| *name)
}

/// Headline for an anchor: the longest rendered line that is not a bare
/// "2 jam lalu" marker, with any leading marker stripped.
pub fn link_title(rendered: &str) -> String {
    let longest = rendered
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !(line.chars().count() < 30 && TIME_MARKER.is_match(line)))
        .fold(None::<&str>, |best, line| match best {
            Some(b) if b.chars().count() >= line.chars().count() => Some(b),
            _ => Some(line),
        });

    let title = longest.unwrap_or_else(|| rendered.trim());
    TIME_MARKER_PREFIX.replace(title, "").trim().to_string()
}

/// Candidates from a parsed listing page, in document order.
pub fn harvest(document: &Html, base: &Url, current_year: i32) -> Vec<Candidate> {
    let Ok(anchors) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let scope = MAIN_SELECTORS
        .iter()
        .find_map(|css| select_first(document, css).map(|el| (*css, el)));
    let links: Vec<_> = match scope {
        Some((css, container)) => {
            tracing::debug!("Scoped link harvest to {}", css);
            container.select(&anchors).collect()
        }
        None => {
            tracing::debug!("No main container found, harvesting the whole document");
            document.select(&anchors).collect()
        }
    };
    tracing::debug!("Found {} raw links in scope", links.len());

    let mut candidates = Vec::new();
    for anchor in links {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Ok(url) = base.join(href.trim()) else {
            continue;
        };
        let title = link_title(&rendered_text(anchor));

        let link = LinkContext::new(&title, &url, current_year);
        match rejection(&link) {
            None => candidates.push(Candidate::new(title.clone(), url.to_string())),
            Some(rule) => tracing::trace!("Rejected {} ({})", url, rule),
        }
    }
    candidates
}

/// Parses `html` and harvests it. The parsed tree never leaves this call.
pub fn harvest_html(html: &str, base: &Url, current_year: i32) -> Vec<Candidate> {
    let document = Html::parse_document(html);
    harvest(&document, base, current_year)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://warta.example.id/indeks").unwrap()
    }

    fn check(title: &str, url: &str) -> Option<&'static str> {
        let url = Url::parse(url).unwrap();
        rejection(&LinkContext::new(title, &url, 2026))
    }

    #[test]
    fn test_short_title_rejected_regardless_of_url() {
        assert_eq!(check("Ini", "https://x.id/berita/2026/123456/ini"), Some("title-length"));
    }

    #[test]
    fn test_stale_year_rejected() {
        assert_eq!(
            check(
                "Pemerintah daerah resmikan jembatan baru di desa",
                "https://x.id/berita/2023/jembatan-baru"
            ),
            Some("stale-year")
        );
    }

    #[test]
    fn test_index_titles_need_more_words() {
        assert_eq!(
            check("Kabupaten Bogor terkini hari ini", "https://x.id/berita/bogor"),
            Some("word-count")
        );
        assert_eq!(
            check(
                "Kota Bogor siapkan anggaran baru untuk perbaikan jalan rusak",
                "https://x.id/berita/bogor"
            ),
            None
        );
    }

    #[test]
    fn test_long_titles_still_need_four_words() {
        assert_eq!(
            check("Pemberdayaan masyarakat pesisir", "https://x.id/berita/2026/p"),
            Some("word-count")
        );
    }

    #[test]
    fn test_headline_wrapped_across_source_lines() {
        let html = "<div id=\"content\"><a href=\"https://x.id/berita/2026/banjir\">\n Banjir merendam empat desa\n di pesisir utara Jawa\n</a></div>";
        let candidates = harvest_html(html, &base(), 2026);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Banjir merendam empat desa di pesisir utara Jawa");
    }

    #[test]
    fn test_blacklisted_title_rejected() {
        assert_eq!(
            check("Promo spesial akhir tahun untuk pembaca setia", "https://x.id/berita/promo"),
            Some("blacklist")
        );
    }

    #[test]
    fn test_article_signals() {
        let title = "Warga gotong royong bersihkan sungai dari sampah";
        assert_eq!(check(title, "https://x.id/2026/03/sungai"), None);
        assert_eq!(check(title, "https://x.id/daerah/123456/sungai"), None);
        assert_eq!(check(title, "https://news.x.id/d-7712345/sungai"), None);
        assert_eq!(check(title, "https://x.id/tentang-kami"), Some("article-signal"));
        assert_eq!(check(title, "mailto:redaksi@x.id"), Some("http-scheme"));
    }

    #[test]
    fn test_link_title_drops_time_marker() {
        assert_eq!(
            link_title("2 jam lalu\nBanjir merendam empat desa di pesisir utara"),
            "Banjir merendam empat desa di pesisir utara"
        );
        assert_eq!(
            link_title("5 menit lalu - Harga beras naik menjelang ramadan"),
            "Harga beras naik menjelang ramadan"
        );
    }

    #[test]
    fn test_listing_yields_one_candidate() {
        let html = r#"
            <html><body>
              <nav><a href="/berita/2026/menu">Menu utama situs berita daerah terkini</a></nav>
              <div id="content">
                <a href="/2026/01/15/banjir-desa">Banjir merendam empat desa di pesisir</a>
                <a href="/berita/pemberdayaan">Pemberdayaan Masyarakat</a>
                <a href="/2022/old-story">Cerita lama yang masih banyak dibaca orang</a>
              </div>
            </body></html>"#;

        let candidates = harvest_html(html, &base(), 2026);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].url, "https://warta.example.id/2026/01/15/banjir-desa");
        assert_eq!(candidates[0].title, "Banjir merendam empat desa di pesisir");
        assert_eq!(candidates[0].raw_date_text, "");
        assert_eq!(candidates[0].snippet, "N/A");
    }

    #[test]
    fn test_whole_document_without_container() {
        let html = r#"<body><a href="https://x.id/read/99/gempa">Gempa magnitudo lima guncang wilayah selatan</a></body>"#;
        let candidates = harvest_html(html, &base(), 2026);
        assert_eq!(candidates.len(), 1);
    }
}
