//! Deterministic extractors - pure functions over raw question text.
//!
//! These back both parse paths: the heuristic parser is built on them,
//! and the generative path uses them to backfill fields the model
//! omitted. Russian month names are matched declension-insensitively by
//! stem, numbers tolerate human thousands separators (space, NBSP,
//! underscore, dot, comma).

use chrono::{Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

/// Integer with human separators: `10 000`, `10,000`, `10_000`, NBSP.
pub fn parse_human_int(s: &str) -> Option<i64> {
    let cleaned: String = s
        .replace('\u{a0}', " ")
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '\t' | '_' | '.' | ','))
        .collect();
    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    cleaned.parse().ok()
}

static THRESHOLD_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    // Priority order matters: the first matching phrase wins.
    [
        r"(?:больше|более)\s+([0-9][0-9\s_.,]*)",
        r">\s*([0-9][0-9\s_.,]*)",
        r"не\s*менее\s+([0-9][0-9\s_.,]*)",
        r"минимум\s+([0-9][0-9\s_.,]*)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("threshold regex"))
    .collect()
});

/// Numeric threshold from phrases like «больше 10 000», «не менее 5».
pub fn extract_threshold(text: &str) -> Option<i64> {
    let t = text.to_lowercase().replace('\u{a0}', " ");
    for re in THRESHOLD_PATTERNS.iter() {
        if let Some(c) = re.captures(&t) {
            if let Some(n) = parse_human_int(&c[1]) {
                return Some(n);
            }
        }
    }
    None
}

static RE_MIN_PHRASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bне\s*менее\b").expect("min-phrase regex"));

/// «не менее N» asks for an inclusive bound (gte rather than gt).
pub fn has_min_phrase(text: &str) -> bool {
    RE_MIN_PHRASE.is_match(&text.to_lowercase())
}

// Creator token: 32-hex, 36-char UUID with dashes, or bare digits.
const ID_TOKEN: &str = r"[0-9a-f]{32}|[0-9a-f-]{36}|\d+";

static CREATOR_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        format!(r"(?:креатор|creator)?\s*(?:с\s*)?id\s+({ID_TOKEN})"),
        format!(r"\bid\s+({ID_TOKEN})\b"),
        format!(r"\bcreator[_\s]?id\s*=?\s*({ID_TOKEN})\b"),
    ]
    .iter()
    .map(|p| Regex::new(p).expect("creator regex"))
    .collect()
});

/// Opaque creator identifier from «креатор с id ...», «creator_id = ...».
pub fn extract_creator_id(text: &str) -> Option<String> {
    let t = text.to_lowercase().replace('\u{a0}', " ");
    for re in CREATOR_PATTERNS.iter() {
        if let Some(c) = re.captures(&t) {
            return Some(c[1].to_string());
        }
    }
    None
}

static RE_PUBLICATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"опубликовал|опубликован|дата\s+публикации").expect("publication regex")
});

/// Publication semantics only exist on the `videos` relation; the
/// validator forces the entity there when these phrases appear.
pub fn mentions_publication(text: &str) -> bool {
    RE_PUBLICATION.is_match(&text.to_lowercase())
}

// Russian month stems, declension-insensitive. «март» must precede «ма»
// so that «марта» does not resolve to May.
const RU_MONTH_STEMS: [(&str, u32); 12] = [
    ("январ", 1),
    ("феврал", 2),
    ("март", 3),
    ("апрел", 4),
    ("ма", 5),
    ("июн", 6),
    ("июл", 7),
    ("август", 8),
    ("сентябр", 9),
    ("октябр", 10),
    ("ноябр", 11),
    ("декабр", 12),
];

fn month_num(word: &str) -> Option<u32> {
    let w = word.to_lowercase();
    RU_MONTH_STEMS
        .iter()
        .find(|(stem, _)| w.starts_with(stem))
        .map(|&(_, n)| n)
}

/// First and last calendar day of a month, inclusive.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let (ny, nm) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let last = NaiveDate::from_ymd_opt(ny, nm, 1)? - Duration::days(1);
    Some((first, last))
}

/// Partial date record: at most one of {`date`} or {`date_from`,
/// `date_to`} is populated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedDates {
    pub date: Option<NaiveDate>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl ExtractedDates {
    fn exact(date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            ..Default::default()
        }
    }

    fn range(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            date_from: Some(from),
            date_to: Some(to),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.date.is_none() && self.date_from.is_none() && self.date_to.is_none()
    }
}

static RE_MONTH_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bв\s+([а-яё]+)\s+(\d{4})\s+года?\b").expect("month-year regex"));
static RE_RANGE_SAME_MONTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bс\s+(\d{1,2})\s+по\s+(\d{1,2})\s+([а-яё]+)\s+(\d{4})\b")
        .expect("same-month range regex")
});
static RE_RANGE_CROSS_MONTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bс\s+(\d{1,2})\s+([а-яё]+)\s+(\d{4})\s+по\s+(\d{1,2})\s+([а-яё]+)\s+(\d{4})\b")
        .expect("cross-month range regex")
});
static RE_SINGLE_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})\s+([а-яё]+)\s+(\d{4})\b").expect("single date regex"));
static RE_ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4}-\d{2}-\d{2})\b").expect("iso date regex"));
static RE_YEAR_MONTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{2})\b").expect("year-month regex"));

fn date_of(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Date or date range from Russian phrases or bare ISO tokens.
///
/// Patterns are tried in priority order: month phrase, same-month range,
/// cross-month range, single spelled date, bare ISO dates, bare
/// `YYYY-MM`. A pattern that matches but names an impossible calendar
/// day falls through to the next one.
pub fn extract_dates(text: &str) -> ExtractedDates {
    let t = text.to_lowercase();

    // «в июне 2025 года» -> whole-month range
    if let Some(c) = RE_MONTH_YEAR.captures(&t) {
        if let (Some(m), Ok(y)) = (month_num(&c[1]), c[2].parse::<i32>()) {
            if let Some((from, to)) = month_bounds(y, m) {
                return ExtractedDates::range(from, to);
            }
        }
    }

    // «с 1 по 5 ноября 2025»
    if let Some(c) = RE_RANGE_SAME_MONTH.captures(&t) {
        if let (Ok(d1), Ok(d2), Some(m), Ok(y)) = (
            c[1].parse::<u32>(),
            c[2].parse::<u32>(),
            month_num(&c[3]),
            c[4].parse::<i32>(),
        ) {
            if let (Some(from), Some(to)) = (date_of(y, m, d1), date_of(y, m, d2)) {
                return ExtractedDates::range(from, to);
            }
        }
    }

    // «с 1 ноября 2025 по 5 декабря 2025»
    if let Some(c) = RE_RANGE_CROSS_MONTH.captures(&t) {
        if let (Ok(d1), Some(m1), Ok(y1), Ok(d2), Some(m2), Ok(y2)) = (
            c[1].parse::<u32>(),
            month_num(&c[2]),
            c[3].parse::<i32>(),
            c[4].parse::<u32>(),
            month_num(&c[5]),
            c[6].parse::<i32>(),
        ) {
            if let (Some(from), Some(to)) = (date_of(y1, m1, d1), date_of(y2, m2, d2)) {
                return ExtractedDates::range(from, to);
            }
        }
    }

    // «28 ноября 2025»
    if let Some(c) = RE_SINGLE_DATE.captures(&t) {
        if let (Ok(d), Some(m), Ok(y)) = (
            c[1].parse::<u32>(),
            month_num(&c[2]),
            c[3].parse::<i32>(),
        ) {
            if let Some(date) = date_of(y, m, d) {
                return ExtractedDates::exact(date);
            }
        }
    }

    // Bare ISO dates: two or more form a range, one is an exact day.
    let iso: Vec<NaiveDate> = RE_ISO_DATE
        .captures_iter(&t)
        .filter_map(|c| NaiveDate::parse_from_str(&c[1], "%Y-%m-%d").ok())
        .collect();
    if iso.len() >= 2 {
        return ExtractedDates::range(iso[0], iso[1]);
    }
    if let Some(&d) = iso.first() {
        return ExtractedDates::exact(d);
    }

    // Bare YYYY-MM token expands to that month, but only a token that is
    // not the prefix of a full ISO date.
    if let Some((y, m)) = find_year_month(&t) {
        if let Some((from, to)) = month_bounds(y, m) {
            return ExtractedDates::range(from, to);
        }
    }

    ExtractedDates::default()
}

fn find_year_month(t: &str) -> Option<(i32, u32)> {
    for c in RE_YEAR_MONTH.captures_iter(t) {
        let whole = c.get(0).expect("match 0");
        let rest = &t[whole.end()..];
        // Skip "2025-11" inside "2025-11-01".
        if rest.starts_with('-') && rest[1..].starts_with(|ch: char| ch.is_ascii_digit()) {
            continue;
        }
        if let (Ok(y), Ok(m)) = (c[1].parse::<i32>(), c[2].parse::<u32>()) {
            return Some((y, m));
        }
    }
    None
}
