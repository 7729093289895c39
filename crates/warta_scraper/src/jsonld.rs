use scraper::{Html, Selector};
use serde_json::Value;

/// Outcome of looking for a publish date in a page's JSON-LD blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuredDate {
    Found(String),
    NotFound,
    /// No date found and at least one block failed to parse.
    Malformed,
}

impl StructuredDate {
    pub fn found(self) -> Option<String> {
        match self {
            StructuredDate::Found(date) => Some(date),
            _ => None,
        }
    }
}

fn date_published(value: &Value) -> Option<&str> {
    value
        .get("datePublished")
        .and_then(|d| d.as_str())
        .map(str::trim)
        .filter(|d| !d.is_empty())
}

/// `datePublished` of the node itself, else of the first `@graph` entry exposing it.
fn date_in_node(node: &Value) -> Option<&str> {
    date_published(node).or_else(|| {
        node.get("@graph")
            .and_then(|graph| graph.as_array())
            .and_then(|entries| entries.iter().find_map(date_published))
    })
}

fn date_in_block(json: &Value) -> Option<&str> {
    match json {
        Value::Array(items) => items.iter().find_map(date_in_node),
        other => date_in_node(other),
    }
}

/// Publish date declared in `script[type="application/ld+json"]`. A block that
/// fails to parse is skipped; the remaining blocks are still searched.
pub fn extract_date_published(document: &Html) -> StructuredDate {
    let Ok(script_selector) = Selector::parse("script[type='application/ld+json']") else {
        return StructuredDate::NotFound;
    };

    let mut malformed = false;
    for script in document.select(&script_selector) {
        let text = script.text().collect::<String>();
        match serde_json::from_str::<Value>(text.trim()) {
            Ok(json) => {
                if let Some(date) = date_in_block(&json) {
                    return StructuredDate::Found(date.to_string());
                }
            }
            Err(e) => {
                tracing::debug!("Skipping malformed JSON-LD block: {}", e);
                malformed = true;
            }
        }
    }

    if malformed {
        StructuredDate::Malformed
    } else {
        StructuredDate::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(blocks: &[&str]) -> Html {
        let scripts: String = blocks
            .iter()
            .map(|b| format!(r#"<script type="application/ld+json">{}</script>"#, b))
            .collect();
        Html::parse_document(&format!("<html><head>{}</head><body></body></html>", scripts))
    }

    #[test]
    fn test_direct_date() {
        let doc = page(&[r#"{"@type":"NewsArticle","datePublished":"2024-01-15T08:30:00+07:00"}"#]);
        assert_eq!(
            extract_date_published(&doc),
            StructuredDate::Found("2024-01-15T08:30:00+07:00".to_string())
        );
    }

    #[test]
    fn test_graph_entry() {
        let doc = page(&[
            r#"{"@graph":[{"@type":"WebSite"},{"@type":"Article","datePublished":"2024-02-01"}]}"#,
        ]);
        assert_eq!(extract_date_published(&doc).found().as_deref(), Some("2024-02-01"));
    }

    #[test]
    fn test_top_level_array() {
        let doc = page(&[r#"[{"@type":"BreadcrumbList"},{"datePublished":"2024-03-03"}]"#]);
        assert_eq!(extract_date_published(&doc).found().as_deref(), Some("2024-03-03"));
    }

    #[test]
    fn test_malformed_block_is_skipped() {
        let doc = page(&[r#"{"datePublished": "#, r#"{"datePublished":"2024-04-04"}"#]);
        assert_eq!(extract_date_published(&doc).found().as_deref(), Some("2024-04-04"));

        let doc = page(&[r#"{not json"#]);
        assert_eq!(extract_date_published(&doc), StructuredDate::Malformed);
    }

    #[test]
    fn test_no_blocks() {
        assert_eq!(extract_date_published(&page(&[])), StructuredDate::NotFound);
    }
}
