use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

/// Format used for dates in the CSV file
pub const DISPLAY_FORMAT: &str = "%m/%d/%Y";

/// Statements only use two-digit years, all of which are assumed to be in this century
pub const DEFAULT_CENTURY: i32 = 2000;

const MONTH_FIELD: &str = "month";
const DAY_FIELD: &str = "day";
const YEAR_FIELD: &str = "year";

static MMDDYY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(?P<{MONTH_FIELD}>\d{{2}})(?P<{DAY_FIELD}>\d{{2}})(?P<{YEAR_FIELD}>\d{{2}})$"
    ))
    .expect("regex")
});

/// Turns `MMDDYY` tokens into calendar dates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateNormalizer {
    century: i32,
}

impl Default for DateNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_CENTURY)
    }
}

impl DateNormalizer {
    pub fn new(century: i32) -> Self {
        Self { century }
    }

    /// Whether the token has the shape of a date (six digits), valid or not
    pub fn is_date_shaped(token: &str) -> bool {
        MMDDYY_REGEX.is_match(token)
    }

    /// Returns `None` when the token is not six digits or does not name an existing day
    pub fn normalize(&self, token: &str) -> Option<NaiveDate> {
        let groups = MMDDYY_REGEX.captures(token)?;
        let month: u32 = groups[MONTH_FIELD].parse().ok()?;
        let day: u32 = groups[DAY_FIELD].parse().ok()?;
        let year: i32 = groups[YEAR_FIELD].parse().ok()?;
        NaiveDate::from_ymd_opt(self.century + year, month, day)
    }
}

pub fn display(date: NaiveDate) -> String {
    date.format(DISPLAY_FORMAT).to_string()
}
