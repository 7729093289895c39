use std::collections::HashSet;
use warta_core::Candidate;

const MIN_TITLE_CHARS: usize = 15;

/// Domain-looking fragments that mark a title as a site name rather than a headline.
const DOMAIN_FRAGMENTS: &[&str] = &[".com", ".id", ".co.id", "tribun"];

const JUNK_WORDS: &[&str] = &[
    "template", "blogger", "theme", "wordpress", "jasa", "iklan", "promo", "login", "signup",
];

fn is_headline(candidate: &Candidate) -> bool {
    let title = candidate.title.to_lowercase();
    let url = candidate.url.to_lowercase();

    title.chars().count() >= MIN_TITLE_CHARS
        && !DOMAIN_FRAGMENTS.iter().any(|f| title.contains(f))
        && !JUNK_WORDS
            .iter()
            .any(|w| title.contains(w) || url.contains(w))
}

/// Second pass over harvested links: drops leftovers that look like site
/// furniture and keeps only the first candidate per URL.
pub fn filter_candidates(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(is_headline)
        .filter(|c| seen.insert(c.url.clone()))
        .collect()
}
