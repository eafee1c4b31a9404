use std::sync::OnceLock;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Which reading wins for an all-numeric date such as `03/04/2024`.
/// The other reading is still tried when the preferred one is not a real date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DateOrder {
    #[default]
    DayFirst,
    MonthFirst,
}

/// Where the OCR confusion table (`O→0`, `I/l→1`, `S→5`, `Z→2`) is applied.
///
/// `WholeToken` rewrites the token before any format is tried, which breaks
/// month names like `Oct`, `Sep` or `July`. `NumericOnly` feeds the rewritten
/// token to the numeric formats and the untouched token to the textual ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OcrScope {
    #[default]
    WholeToken,
    NumericOnly,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateOptions {
    pub order: DateOrder,
    pub ocr_scope: OcrScope,
}

/// A date located inside a larger piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateMatch {
    pub date: NaiveDate,
    /// Byte range of the matched text within the searched string.
    pub start: usize,
    pub end: usize,
}

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

const MONTHS: [(&str, &str); 12] = [
    ("january", "jan"),
    ("february", "feb"),
    ("march", "mar"),
    ("april", "apr"),
    ("may", "may"),
    ("june", "jun"),
    ("july", "jul"),
    ("august", "aug"),
    ("september", "sep"),
    ("october", "oct"),
    ("november", "nov"),
    ("december", "dec"),
];

fn re(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static date pattern"))
}

fn iso_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    re(&RE, r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$")
}

fn full_year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    re(&RE, r"^([0-9]{1,2})[/\-.]([0-9]{1,2})[/\-.]([0-9]{4})$")
}

fn short_year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    re(&RE, r"^([0-9]{1,2})[/\-.]([0-9]{1,2})[/\-.]([0-9]{2})$")
}

/// Per month: ("5 Jan 2024", "Jan 5 2024") shapes, full name tried before the abbreviation.
fn month_res() -> &'static [(Regex, Regex)] {
    static RES: OnceLock<Vec<(Regex, Regex)>> = OnceLock::new();
    RES.get_or_init(|| {
        MONTHS
            .iter()
            .map(|(full, abbr)| {
                let day_first = format!(r"(?i)([0-9]{{1,2}})[\s,]+(?:{full}|{abbr})[\s,]+([0-9]{{4}})");
                let month_first = format!(r"(?i)(?:{full}|{abbr})[\s,]+([0-9]{{1,2}})[\s,]+([0-9]{{4}})");
                (
                    Regex::new(&day_first).expect("static month pattern"),
                    Regex::new(&month_first).expect("static month pattern"),
                )
            })
            .collect()
    })
}

/// Shapes searched for inside free text, most specific first.
fn embedded_res() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        let months = "jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec";
        [
            r"[0-9]{4}-[0-9]{2}-[0-9]{2}".to_string(),
            r"[0-9]{1,2}[/\-.][0-9]{1,2}[/\-.][0-9]{4}".to_string(),
            r"[0-9]{1,2}[/\-.][0-9]{1,2}[/\-.][0-9]{2}".to_string(),
            format!(r"(?i)[0-9]{{1,2}}\s+(?:{months})[a-z]*\s+[0-9]{{4}}"),
            format!(r"(?i)(?:{months})[a-z]*\s+[0-9]{{1,2}}\s+[0-9]{{4}}"),
        ]
        .iter()
        .map(|p| Regex::new(p).expect("static embedded date pattern"))
        .collect()
    })
}

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

pub fn fix_ocr_confusions(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            'O' | 'o' => '0',
            'I' | 'l' => '1',
            'S' => '5',
            'Z' => '2',
            other => other,
        })
        .collect()
}

/// Parse a single date token. `None` means the date is unknown, not an error.
pub fn normalize(raw: &str, opts: &DateOptions) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let fixed = fix_ocr_confusions(raw);
    let textual = match opts.ocr_scope {
        OcrScope::WholeToken => fixed.as_str(),
        OcrScope::NumericOnly => raw,
    };

    first_success(&numeric_parsers(opts.order), &fixed)
        .or_else(|| first_success(&TEXTUAL_PARSERS, textual))
}

/// Find the first date embedded in `text`, falling back to reading the whole
/// text as one token.
pub fn find(text: &str, opts: &DateOptions) -> Option<DateMatch> {
    for pattern in embedded_res() {
        if let Some(m) = pattern.find(text) {
            if let Some(date) = normalize(m.as_str(), opts) {
                return Some(DateMatch {
                    date,
                    start: m.start(),
                    end: m.end(),
                });
            }
        }
    }
    normalize(text, opts).map(|date| DateMatch {
        date,
        start: 0,
        end: text.len(),
    })
}

// ---------------------------------------------------------------------------
// Format cascade
// ---------------------------------------------------------------------------

type DateParser = fn(&str) -> Option<NaiveDate>;

fn first_success(parsers: &[DateParser], input: &str) -> Option<NaiveDate> {
    parsers.iter().find_map(|parse| parse(input))
}

fn numeric_parsers(order: DateOrder) -> [DateParser; 5] {
    match order {
        DateOrder::DayFirst => [
            parse_iso,
            parse_day_month_year,
            parse_month_day_year,
            parse_day_month_short_year,
            parse_month_day_short_year,
        ],
        DateOrder::MonthFirst => [
            parse_iso,
            parse_month_day_year,
            parse_day_month_year,
            parse_month_day_short_year,
            parse_day_month_short_year,
        ],
    }
}

const TEXTUAL_PARSERS: [DateParser; 2] = [parse_month_name, parse_fallback];

fn calendar_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    if !(1..=31).contains(&day) || !(1..=12).contains(&month) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_iso(s: &str) -> Option<NaiveDate> {
    if !iso_re().is_match(s) {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn numeric_groups(re: &Regex, s: &str) -> Option<(u32, u32, i32)> {
    let caps = re.captures(s)?;
    let a = caps[1].parse().ok()?;
    let b = caps[2].parse().ok()?;
    let y = caps[3].parse().ok()?;
    Some((a, b, y))
}

fn expand_short_year(yy: i32) -> i32 {
    if yy < 50 {
        2000 + yy
    } else {
        1900 + yy
    }
}

fn parse_day_month_year(s: &str) -> Option<NaiveDate> {
    let (d, m, y) = numeric_groups(full_year_re(), s)?;
    calendar_date(y, m, d)
}

fn parse_month_day_year(s: &str) -> Option<NaiveDate> {
    let (m, d, y) = numeric_groups(full_year_re(), s)?;
    calendar_date(y, m, d)
}

fn parse_day_month_short_year(s: &str) -> Option<NaiveDate> {
    let (d, m, yy) = numeric_groups(short_year_re(), s)?;
    calendar_date(expand_short_year(yy), m, d)
}

fn parse_month_day_short_year(s: &str) -> Option<NaiveDate> {
    let (m, d, yy) = numeric_groups(short_year_re(), s)?;
    calendar_date(expand_short_year(yy), m, d)
}

fn parse_month_name(s: &str) -> Option<NaiveDate> {
    for (i, (day_first, month_first)) in month_res().iter().enumerate() {
        let month = i as u32 + 1;
        if let Some(caps) = day_first.captures(s) {
            let day = caps[1].parse().ok()?;
            let year = caps[2].parse().ok()?;
            if let Some(date) = calendar_date(year, month, day) {
                return Some(date);
            }
        }
        if let Some(caps) = month_first.captures(s) {
            let day = caps[1].parse().ok()?;
            let year = caps[2].parse().ok()?;
            if let Some(date) = calendar_date(year, month, day) {
                return Some(date);
            }
        }
    }
    None
}

const FALLBACK_DATE_FORMATS: &[&str] = &[
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%Y-%m-%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B, %Y",
    "%a %b %d %Y",
    "%A, %B %d, %Y",
    "%a, %d %b %Y",
];

const FALLBACK_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Last resort for layouts the explicit formats miss. Only years strictly
/// between 2000 and 2100 are believed.
fn parse_fallback(s: &str) -> Option<NaiveDate> {
    let date = FALLBACK_DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .or_else(|| {
            FALLBACK_DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
        .or_else(|| DateTime::parse_from_rfc2822(s).ok().map(|dt| dt.date_naive()))?;
    (date.year() > 2000 && date.year() < 2100).then_some(date)
}
