use chrono::NaiveDateTime;
use warta_core::{DateRange, EnrichedCandidate, NewArticle};

use crate::dates::{format_for_display, normalize, NormalizedDate};

const RAW_PREFIX_CHARS: usize = 20;

/// `publish_date` recorded when the raw text could not be read as a date.
pub fn unparseable_marker(raw: &str) -> String {
    if raw.is_empty() {
        return "N/A (Raw: None)".to_string();
    }
    let prefix: String = raw.chars().take(RAW_PREFIX_CHARS).collect();
    format!("N/A (Raw: {})", prefix)
}

/// Applies the date window. In-range articles carry a display-formatted date,
/// out-of-range ones are dropped, and undatable ones are kept with a marker so
/// nothing is silently lost.
pub fn assemble(enriched: &[EnrichedCandidate], range: &DateRange, now: NaiveDateTime) -> Vec<NewArticle> {
    enriched
        .iter()
        .filter_map(|item| {
            let raw = item.raw_date();
            let publish_date = match normalize(raw, now) {
                NormalizedDate::Parsed(moment) if range.contains(&moment) => format_for_display(&moment),
                NormalizedDate::Parsed(moment) => {
                    tracing::debug!("Skipped {} (date out of range: {})", item.candidate.url, moment.date());
                    return None;
                }
                NormalizedDate::Unparseable => unparseable_marker(raw),
            };

            Some(NewArticle {
                title: item.candidate.title.clone(),
                url: item.candidate.url.clone(),
                publish_date: Some(publish_date),
                content_snippet: Some(item.snippet().to_string()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use warta_core::{Candidate, Metadata};

    fn enriched(url: &str, date: Option<&str>, description: Option<&str>) -> EnrichedCandidate {
        EnrichedCandidate {
            candidate: Candidate::new("Judul berita yang cukup panjang", url),
            metadata: Metadata {
                date: date.map(str::to_string),
                description: description.map(str::to_string),
            },
        }
    }

    fn january() -> DateRange {
        DateRange::parse("2024-01-01", "2024-01-31").unwrap()
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 20).unwrap().and_hms_opt(9, 0, 0).unwrap()
    }

    #[test]
    fn test_range_boundaries() {
        let items = vec![
            enriched("https://x.id/1", Some("2024-01-31 23:59:00"), Some("Akhir bulan")),
            enriched("https://x.id/2", Some("2024-02-01 00:00:00"), None),
            enriched("https://x.id/3", Some("2024-01-01T00:00:00+07:00"), None),
        ];
        let articles = assemble(&items, &january(), now());
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].publish_date.as_deref(), Some("31-01-2024 23:59"));
        assert_eq!(articles[0].content_snippet.as_deref(), Some("Akhir bulan"));
        assert_eq!(articles[1].url, "https://x.id/3");
        assert_eq!(articles[1].content_snippet.as_deref(), Some("N/A"));
    }

    #[test]
    fn test_unparseable_dates_are_kept() {
        let items = vec![
            enriched("https://x.id/1", Some("Diterbitkan oleh redaksi kami"), None),
            enriched("https://x.id/2", None, None),
        ];
        let articles = assemble(&items, &january(), now());
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].publish_date.as_deref(), Some("N/A (Raw: Diterbitkan oleh red)"));
        assert_eq!(articles[1].publish_date.as_deref(), Some("N/A (Raw: None)"));
    }

    #[test]
    fn test_relative_date_resolved_against_now() {
        let items = vec![enriched("https://x.id/1", Some("3 jam lalu"), None)];
        let articles = assemble(&items, &january(), now());
        assert_eq!(articles[0].publish_date.as_deref(), Some("20-01-2024 06:00"));
    }
}
