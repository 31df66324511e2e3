use std::iter::Flatten;

use regex::{Regex, RegexBuilder};
use tracing::trace;

/// Labels of the columns of the transaction table, repeated at the top of every page
pub const DEFAULT_HEADER_LABELS: [&str; 6] = [
    "Date",
    "Number",
    "Description",
    "Withdrawals",
    "Deposits",
    "Balance",
];

/// Page footers, e.g. `Page 1 of 2`
pub const DEFAULT_FOOTER_PATTERNS: [&str; 1] = [r"^page\s+\d+\s+of\s+\d+$"];

/// The text rows of one page, top to bottom
pub type Page = Vec<String>;

/// Column labels identifying header rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLabels {
    labels: Vec<String>,
}

impl Default for HeaderLabels {
    fn default() -> Self {
        Self::new(DEFAULT_HEADER_LABELS)
    }
}

impl HeaderLabels {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            labels: labels
                .into_iter()
                .map(|label| label.as_ref().trim().to_lowercase())
                .filter(|label| !label.is_empty())
                .collect(),
        }
    }

    /// A row is a header when each of its words is one of the labels or the beginning of one
    /// (headers get truncated, or wrapped over several rows). A lone word must be a whole label,
    /// so that `DEPOSIT` or `BAL` can still continue a description.
    pub fn is_header(&self, row: &str) -> bool {
        let words: Vec<String> = row
            .split_whitespace()
            .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
            .filter(|word| !word.is_empty())
            .collect();
        match words.as_slice() {
            [] => true,
            [word] => self.labels.contains(word),
            _ => words
                .iter()
                .all(|word| self.labels.iter().any(|label| label.starts_with(word.as_str()))),
        }
    }
}

/// Patterns of page footers, matched case-insensitively against the trimmed row
#[derive(Debug, Clone)]
pub struct FooterPatterns {
    patterns: Vec<Regex>,
}

impl Default for FooterPatterns {
    fn default() -> Self {
        Self::new(DEFAULT_FOOTER_PATTERNS).expect("default footer patterns")
    }
}

impl FooterPatterns {
    pub fn new<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|pattern| {
                RegexBuilder::new(pattern.as_ref())
                    .case_insensitive(true)
                    .build()
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_footer(&self, row: &str) -> bool {
        let row = row.trim();
        self.patterns.iter().any(|pattern| pattern.is_match(row))
    }
}

/// Tells the rows of the transaction table from the page furniture around it
#[derive(Debug, Clone, Default)]
pub struct RowFilter {
    pub labels: HeaderLabels,
    pub footers: FooterPatterns,
}

impl RowFilter {
    /// Blank rows, headers and footers
    pub fn is_noise(&self, row: &str) -> bool {
        self.labels.is_header(row) || self.footers.is_footer(row)
    }
}

/// Iterator over the rows of all pages which may hold a transaction
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct CandidateRows<'a, I> {
    rows: I,
    filter: &'a RowFilter,
}

impl<I: Iterator<Item = String>> Iterator for CandidateRows<'_, I> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        let filter = self.filter;
        self.rows.by_ref().find(|row| {
            let noise = filter.is_noise(row);
            if noise {
                trace!(row = %row, "Skipping noise row");
            }
            !noise
        })
    }
}

/// Chains the rows of every page in document order, leaving out headers, footers and blank rows
pub fn candidate_rows<P, R>(
    pages: P,
    filter: &RowFilter,
) -> CandidateRows<'_, Flatten<P::IntoIter>>
where
    P: IntoIterator<Item = R>,
    R: IntoIterator<Item = String>,
{
    CandidateRows {
        rows: pages.into_iter().flatten(),
        filter,
    }
}
