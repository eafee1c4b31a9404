use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::amounts;
use crate::dates::{self, DateMatch, DateOptions};
use crate::models::ImportCandidate;

const HEADER_WORDS: &[&str] = &["date", "amount", "payment", "day", "total", "sum"];
const EXCERPT_CHARS: usize = 50;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// How the space-separated scan picks the amount token.
///
/// `Independent` takes the first date window and the first amount token
/// separately, so a leading date like `05/01/2024` is also read as amount 5.
/// `DateAware` skips the tokens the resolved date was read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    #[default]
    Independent,
    DateAware,
}

#[derive(Debug, Clone, Copy)]
pub struct ImportOptions {
    pub dates: DateOptions,
    pub scan_mode: ScanMode,
    /// Date given to lines where an amount was found but no date.
    pub today: NaiveDate,
}

// ---------------------------------------------------------------------------
// Single line
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineFailure {
    NothingFound,
    NoAmount,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    Header,
    Parsed {
        date: NaiveDate,
        amount: Decimal,
        date_defaulted: bool,
    },
    Failed(LineFailure),
}

#[derive(Debug, Default)]
struct Resolved {
    date: Option<NaiveDate>,
    /// The exact text the date was read from.
    date_text: Option<String>,
    amount: Option<Decimal>,
}

impl Resolved {
    fn complete(&self) -> bool {
        self.date.is_some() && self.amount.is_some()
    }
}

type Strategy = fn(&str, &ImportOptions, &mut Resolved);

const STRATEGIES: [(&str, Strategy); 3] = [
    ("delimited", delimited),
    ("tokens", space_tokens),
    ("whole_line", whole_line),
];

pub fn is_header(line: &str) -> bool {
    let word: String = line.trim().chars().take_while(|c| c.is_alphabetic()).collect();
    !word.is_empty() && HEADER_WORDS.iter().any(|h| word.eq_ignore_ascii_case(h))
}

pub fn parse_line(line: &str, opts: &ImportOptions) -> LineOutcome {
    let line = line.trim();
    if is_header(line) {
        return LineOutcome::Header;
    }

    let mut resolved = Resolved::default();
    for (name, strategy) in STRATEGIES {
        if resolved.complete() {
            break;
        }
        strategy(line, opts, &mut resolved);
        debug!(strategy = name, date = ?resolved.date, amount = ?resolved.amount, "line strategy");
    }

    match (resolved.date, resolved.amount) {
        (Some(date), Some(amount)) => LineOutcome::Parsed {
            date,
            amount,
            date_defaulted: false,
        },
        (None, Some(amount)) => LineOutcome::Parsed {
            date: opts.today,
            amount,
            date_defaulted: true,
        },
        (None, None) => LineOutcome::Failed(LineFailure::NothingFound),
        (Some(_), None) => LineOutcome::Failed(LineFailure::NoAmount),
    }
}

fn delimited(line: &str, opts: &ImportOptions, resolved: &mut Resolved) {
    let delimiter = if line.contains(',') {
        ','
    } else if line.contains('\t') {
        '\t'
    } else {
        return;
    };
    let fields: Vec<&str> = line.split(delimiter).map(str::trim).collect();

    if resolved.date.is_none() {
        if let Some(m) = fields.first().and_then(|f| dates::find(f, &opts.dates)) {
            resolved.date = Some(m.date);
            resolved.date_text = Some(fields[0][m.start..m.end].to_string());
        }
    }
    if resolved.amount.is_none() {
        resolved.amount = fields.iter().skip(1).take(3).find_map(|f| amounts::extract(f));
    }
}

/// Join `tokens[start..start + 3]` with single spaces, returning the byte span
/// of each token within the joined text.
fn window(tokens: &[&str], start: usize) -> (String, Vec<(usize, usize)>) {
    let end = (start + 3).min(tokens.len());
    let mut text = String::new();
    let mut spans = Vec::with_capacity(end - start);
    for (j, token) in tokens[start..end].iter().enumerate() {
        if j > 0 {
            text.push(' ');
        }
        let from = text.len();
        text.push_str(token);
        spans.push((from, text.len()));
    }
    (text, spans)
}

fn space_tokens(line: &str, opts: &ImportOptions, resolved: &mut Resolved) {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    // Token indices the resolved date was read from (DateAware only).
    let mut date_tokens = 0..0;

    for i in 0..tokens.len() {
        if resolved.date.is_none() {
            let (text, spans) = window(&tokens, i);
            if let Some(DateMatch { date, start, end }) = dates::find(&text, &opts.dates) {
                resolved.date = Some(date);
                resolved.date_text = Some(text[start..end].to_string());
                let covered: Vec<usize> = spans
                    .iter()
                    .enumerate()
                    .filter(|(_, (s, e))| *s < end && *e > start)
                    .map(|(j, _)| i + j)
                    .collect();
                if let (Some(first), Some(last)) = (covered.first(), covered.last()) {
                    date_tokens = *first..*last + 1;
                }
            }
        }

        if resolved.amount.is_none() {
            let holds_date = date_tokens.contains(&i)
                || resolved
                    .date_text
                    .as_deref()
                    .is_some_and(|t| tokens[i].contains(t));
            if opts.scan_mode == ScanMode::DateAware && holds_date {
                continue;
            }
            resolved.amount = amounts::extract(tokens[i]);
        }
    }
}

fn whole_line(line: &str, opts: &ImportOptions, resolved: &mut Resolved) {
    if resolved.date.is_none() {
        if let Some(m) = dates::find(line, &opts.dates) {
            resolved.date = Some(m.date);
            resolved.date_text = Some(line[m.start..m.end].to_string());
        }
    }
    if resolved.amount.is_none() {
        resolved.amount = match (&resolved.date_text, opts.scan_mode) {
            (Some(date_text), ScanMode::DateAware) => amounts::extract(&line.replacen(date_text.as_str(), " ", 1)),
            _ => amounts::extract(line),
        };
    }
}

// ---------------------------------------------------------------------------
// Whole text
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    NothingFound,
    NoAmount,
    DateDefaulted,
}

/// An error or warning tied to one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIssue {
    pub line_number: usize,
    pub kind: IssueKind,
    pub excerpt: String,
}

impl fmt::Display for LineIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            IssueKind::NothingFound => write!(
                f,
                "Line {}: Could not find date or amount in: \"{}\"",
                self.line_number, self.excerpt
            ),
            IssueKind::NoAmount => write!(
                f,
                "Line {}: Could not find amount in: \"{}\"",
                self.line_number, self.excerpt
            ),
            IssueKind::DateDefaulted => write!(
                f,
                "Line {}: Could not parse date, using today's date",
                self.line_number
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    /// Nothing parsed and nothing failed: blank or header-only input.
    Empty,
    AllFailed,
    Partial,
    Clean,
}

#[derive(Debug, Default, Clone)]
pub struct ImportReport {
    pub candidates: Vec<ImportCandidate>,
    pub errors: Vec<LineIssue>,
    pub warnings: Vec<LineIssue>,
}

impl ImportReport {
    pub fn total(&self) -> Decimal {
        self.candidates.iter().map(|c| c.amount).sum()
    }

    pub fn outcome(&self) -> ImportOutcome {
        match (self.candidates.is_empty(), self.errors.is_empty()) {
            (true, true) => ImportOutcome::Empty,
            (true, false) => ImportOutcome::AllFailed,
            (false, false) => ImportOutcome::Partial,
            (false, true) => ImportOutcome::Clean,
        }
    }
}

fn excerpt(line: &str) -> String {
    line.chars().take(EXCERPT_CHARS).collect()
}

/// Parse pasted or OCR'd text into payment candidates. Blank lines are
/// dropped before numbering, so line numbers count non-blank lines from 1.
pub fn parse_text(text: &str, opts: &ImportOptions) -> ImportReport {
    let mut report = ImportReport::default();

    let lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
    for (idx, line) in lines.enumerate() {
        let line_number = idx + 1;
        let issue = |kind| LineIssue {
            line_number,
            kind,
            excerpt: excerpt(line),
        };
        match parse_line(line, opts) {
            LineOutcome::Header => debug!(line_number, "skipped header line"),
            LineOutcome::Parsed {
                date,
                amount,
                date_defaulted,
            } => {
                if date_defaulted {
                    report.warnings.push(issue(IssueKind::DateDefaulted));
                }
                report.candidates.push(ImportCandidate {
                    date,
                    amount,
                    line_number,
                    original: line.to_string(),
                });
            }
            LineOutcome::Failed(LineFailure::NothingFound) => report.errors.push(issue(IssueKind::NothingFound)),
            LineOutcome::Failed(LineFailure::NoAmount) => report.errors.push(issue(IssueKind::NoAmount)),
        }
    }

    report.candidates.sort_by_key(|c| c.date);
    debug!(
        candidates = report.candidates.len(),
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "parsed import text"
    );
    report
}
