//! Turns the free-form date text found on news pages into a timestamp.
//!
//! Handles relative phrases ("2 jam lalu", "yesterday"), Indonesian and
//! English month names, and the usual numeric layouts. Times are kept as the
//! publisher's wall-clock time; UTC offsets are read past and discarded.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use lazy_static::lazy_static;
use regex::{Captures, Regex};

/// `DD-MM-YYYY HH:MM`, the form stored in `publish_date`.
pub const DISPLAY_FORMAT: &str = "%d-%m-%Y %H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizedDate {
    Parsed(NaiveDateTime),
    Unparseable,
}

impl NormalizedDate {
    pub fn parsed(&self) -> Option<NaiveDateTime> {
        match self {
            NormalizedDate::Parsed(moment) => Some(*moment),
            NormalizedDate::Unparseable => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Relative {
    Hours,
    Minutes,
    Days,
    Yesterday,
    Today,
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &[
    "%d %B %Y",
    "%d %b %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%d-%m-%Y",
];

lazy_static! {
    static ref RELATIVE_PATTERNS: Vec<(Regex, Relative)> = vec![
        (Regex::new(r"(?i)(\d+)\s*(?:jam|hours?)\s*(?:ago|lalu)").unwrap(), Relative::Hours),
        (Regex::new(r"(?i)(\d+)\s*(?:menit|minutes?|mins?)\s*(?:ago|lalu)").unwrap(), Relative::Minutes),
        (Regex::new(r"(?i)(\d+)\s*(?:hari|days?)\s*(?:ago|lalu)").unwrap(), Relative::Days),
        (Regex::new(r"(?i)kemarin|yesterday").unwrap(), Relative::Yesterday),
        (Regex::new(r"(?i)hari\s*ini|today").unwrap(), Relative::Today),
    ];
    static ref WEEKDAYS: Regex = Regex::new(
        r"\b(senin|selasa|rabu|kamis|jum'?at|sabtu|minggu|ahad|monday|tuesday|wednesday|thursday|friday|saturday|sunday|mon|tue|wed|thu|fri|sat|sun)\b|\bpukul\b"
    )
    .unwrap();
    static ref INDONESIAN_MONTHS: Regex = Regex::new(
        r"\b(januari|februari|pebruari|maret|mei|juni|juli|agustus|oktober|desember|peb|agu|agt|ags|okt|des)\b"
    )
    .unwrap();
    static ref TIMEZONES: Regex = Regex::new(r"\b(wib|wita|wit|gmt|utc)\b").unwrap();
    static ref ISO_T: Regex = Regex::new(r"(\d)t(\d)").unwrap();
    static ref TIME_TAIL: Regex =
        Regex::new(r"^[\s,\-|]*(\d{1,2})[:.](\d{2})(?:[:.](\d{2}))?").unwrap();
    static ref EMBEDDED_DATE: Regex =
        Regex::new(r"\b(\d{1,2})\s+([a-z]{3,9})\.?,?\s+(\d{4})\b|\b(\d{4})-(\d{1,2})-(\d{1,2})\b").unwrap();
}

fn english_month(indonesian: &str) -> &'static str {
    match indonesian {
        "januari" => "january",
        "februari" | "pebruari" | "peb" => "february",
        "maret" => "march",
        "mei" => "may",
        "juni" => "june",
        "juli" => "july",
        "agustus" | "agu" | "agt" | "ags" => "august",
        "oktober" | "okt" => "october",
        "desember" | "des" => "december",
        _ => "",
    }
}

fn relative(raw: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let (captures, kind) = RELATIVE_PATTERNS
        .iter()
        .find_map(|(pattern, kind)| pattern.captures(raw).map(|c| (c, *kind)))?;
    let amount = || captures.get(1)?.as_str().parse::<i64>().ok();

    let delta = match kind {
        Relative::Hours => Duration::try_hours(amount()?)?,
        Relative::Minutes => Duration::try_minutes(amount()?)?,
        Relative::Days => Duration::try_days(amount()?)?,
        Relative::Yesterday => Duration::try_days(1)?,
        Relative::Today => Duration::zero(),
    };
    now.checked_sub_signed(delta)
}

/// Lowercased text with weekday names, `pukul` and zone abbreviations removed
/// and Indonesian month names rewritten in English.
fn clean(raw: &str) -> String {
    let text = raw.to_lowercase();
    let text = WEEKDAYS.replace_all(&text, " ");
    let text = INDONESIAN_MONTHS.replace_all(&text, |caps: &Captures| english_month(&caps[1]).to_string());
    let text = TIMEZONES.replace_all(&text, " ");
    let text = ISO_T.replace_all(&text, "${1}T${2}");

    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, ',' | '.' | '-' | '/' | '|'))
        .to_string()
}

/// `HH:MM[:SS]` at the start of `rest`, midnight when there is none.
fn time_tail(rest: &str) -> NaiveTime {
    TIME_TAIL
        .captures(rest)
        .and_then(|caps| {
            let hour = caps[1].parse().ok()?;
            let minute = caps[2].parse().ok()?;
            let second = caps.get(3).map_or(Some(0), |s| s.as_str().parse().ok())?;
            NaiveTime::from_hms_opt(hour, minute, second)
        })
        .unwrap_or(NaiveTime::MIN)
}

/// Numeric fields accept short widths, so a match must not stop inside a number
/// ("15-01-2024" read as `%Y-%m-%d` would leave "24" behind).
fn ends_cleanly(rest: &str) -> bool {
    !rest.starts_with(|c: char| c.is_ascii_digit())
}

fn plausible(date: NaiveDate) -> bool {
    (1970..=2100).contains(&date.year())
}

fn absolute(text: &str) -> Option<NaiveDateTime> {
    let datetime = DATETIME_FORMATS.iter().find_map(|format| {
        let (moment, rest) = NaiveDateTime::parse_and_remainder(text, format).ok()?;
        (ends_cleanly(rest) && plausible(moment.date())).then_some(moment)
    });

    datetime.or_else(|| {
        DATE_FORMATS.iter().find_map(|format| {
            let (date, rest) = NaiveDate::parse_and_remainder(text, format).ok()?;
            (ends_cleanly(rest) && plausible(date)).then(|| date.and_time(time_tail(rest)))
        })
    })
}

fn embedded(text: &str) -> Option<NaiveDateTime> {
    EMBEDDED_DATE.captures_iter(text).find_map(|caps| {
        let whole = caps.get(0)?;
        let date = if caps.get(1).is_some() {
            let spelled = format!("{} {} {}", &caps[1], &caps[2], &caps[3]);
            NaiveDate::parse_from_str(&spelled, "%d %B %Y").ok()?
        } else {
            NaiveDate::from_ymd_opt(caps[4].parse().ok()?, caps[5].parse().ok()?, caps[6].parse().ok()?)?
        };
        plausible(date).then(|| date.and_time(time_tail(&text[whole.end()..])))
    })
}

/// Resolves `raw` relative to `now`. Text no strategy understands is
/// `Unparseable`, which is an outcome rather than an error.
pub fn normalize(raw: &str, now: NaiveDateTime) -> NormalizedDate {
    let raw = raw.trim();
    if raw.is_empty() {
        return NormalizedDate::Unparseable;
    }

    if let Some(moment) = relative(raw, now) {
        return NormalizedDate::Parsed(moment);
    }

    let cleaned = clean(raw);
    let resolved = absolute(&cleaned)
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_local()))
        .or_else(|| DateTime::parse_from_rfc2822(raw).ok().map(|dt| dt.naive_local()))
        .or_else(|| embedded(&cleaned));

    match resolved {
        Some(moment) => NormalizedDate::Parsed(moment),
        None => NormalizedDate::Unparseable,
    }
}

pub fn format_for_display(moment: &NaiveDateTime) -> String {
    moment.format(DISPLAY_FORMAT).to_string()
}
