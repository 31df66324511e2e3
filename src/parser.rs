use rust_decimal::Decimal;
use tracing::warn;

use crate::date::DateNormalizer;
use crate::error::RowRejection;
use crate::ledger::Transaction;
use crate::money::{is_amount_shaped, parse_amount};

/// Comma-separated amount columns which may follow the description: deposit and balance
const MAX_COMMA_COLUMNS: usize = 2;
/// Whitespace-separated amounts which may end a row: withdrawal, deposit and balance
const MAX_TRAILING_AMOUNTS: usize = 3;

/// Outcome of reading a single candidate row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowParse {
    Transaction(Transaction),
    /// Text without date nor amount, continuing the description of the previous transaction
    Continuation(String),
    Rejected(RowRejection),
}

/// Reads one row of the transaction table
///
/// A transaction row looks like `MMDDYY [number] description [withdrawal] [deposit] balance`.
/// Amount columns are separated either by whitespace, or by commas when some columns are empty
/// (`010224 1003 GROCERY MART ,40.00,1,235.00`). Only the very first token may be a date: a
/// six-digit token anywhere else is a check or reference number.
///
/// Whitespace alone does not tell which column an amount sits in: two trailing amounts are
/// always read as withdrawal and balance, even on a deposit row.
pub fn parse_row(row: &str, normalizer: &DateNormalizer) -> RowParse {
    let row = row.trim();
    let Some(leading) = row.split_whitespace().next() else {
        return RowParse::Rejected(RowRejection::NoLeadingDate(row.to_owned()));
    };

    if !DateNormalizer::is_date_shaped(leading) {
        return if row.split_whitespace().any(is_amount_shaped) {
            RowParse::Rejected(RowRejection::NoLeadingDate(row.to_owned()))
        } else {
            RowParse::Continuation(row.split_whitespace().collect::<Vec<_>>().join(" "))
        };
    }
    let Some(date) = normalizer.normalize(leading) else {
        return RowParse::Rejected(RowRejection::InvalidDate(leading.to_owned()));
    };

    let (head, columns) = split_amount_columns(&row[leading.len()..]);
    let mut tokens: Vec<&str> = head.split_whitespace().collect();

    let number = if tokens
        .first()
        .is_some_and(|token| token.bytes().all(|b| b.is_ascii_digit()))
    {
        Some(tokens.remove(0).to_owned())
    } else {
        None
    };

    let (withdrawal, deposit, balance) = if columns.is_empty() {
        let count = tokens
            .iter()
            .rev()
            .take(MAX_TRAILING_AMOUNTS)
            .take_while(|token| is_amount_shaped(token))
            .count();
        let amounts = tokens.split_off(tokens.len() - count);
        match *amounts.as_slice() {
            [withdrawal, deposit, balance] => (Some(withdrawal), Some(deposit), Some(balance)),
            [withdrawal, balance] => (Some(withdrawal), None, Some(balance)),
            [balance] => (None, None, Some(balance)),
            _ => (None, None, None),
        }
    } else {
        let withdrawal = if tokens.last().is_some_and(|token| is_amount_shaped(token)) {
            tokens.pop()
        } else {
            None
        };
        let deposit = if columns.len() == MAX_COMMA_COLUMNS {
            columns.first().copied()
        } else {
            None
        };
        (withdrawal, deposit, columns.last().copied())
    };

    let withdrawal = read_amount(withdrawal, "withdrawal", row, false);
    let deposit = read_amount(deposit, "deposit", row, false);
    let balance = read_amount(balance, "balance", row, true);

    if withdrawal.is_none() && deposit.is_none() && balance.is_none() {
        return RowParse::Rejected(RowRejection::NoAmount(row.to_owned()));
    }
    if withdrawal.is_some() && deposit.is_some() {
        return RowParse::Rejected(RowRejection::ConflictingAmounts(row.to_owned()));
    }

    RowParse::Transaction(Transaction {
        date,
        number,
        description: tokens.join(" "),
        withdrawal,
        deposit,
        balance,
    })
}

/// A malformed amount leaves its column empty, the rest of the row is still used
fn read_amount(
    token: Option<&str>,
    column: &str,
    row: &str,
    allow_negative: bool,
) -> Option<Decimal> {
    let token = token.filter(|token| !token.is_empty())?;
    match parse_amount(token) {
        Ok(amount) if allow_negative || !amount.is_sign_negative() => Some(amount),
        Ok(amount) => {
            warn!(%amount, column, row, "Ignoring negative amount");
            None
        }
        Err(err) => {
            warn!(%err, column, row, "Ignoring malformed amount");
            None
        }
    }
}

/// Splits off up to two comma-separated amount columns from the end of the text
///
/// Columns are peeled from the right for as long as they are empty or look like an amount, so
/// that commas inside descriptions stay where they are.
fn split_amount_columns(text: &str) -> (&str, Vec<&str>) {
    let mut head = text;
    let mut columns = Vec::new();
    while columns.len() < MAX_COMMA_COLUMNS {
        let Some(separator) = last_column_separator(head) else {
            break;
        };
        let column = head[separator + 1..].trim();
        if !column.is_empty() && !is_amount_shaped(column) {
            break;
        }
        columns.insert(0, column);
        head = &head[..separator];
    }
    (head, columns)
}

fn last_column_separator(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    (0..bytes.len())
        .rev()
        .find(|&i| bytes[i] == b',' && !is_thousands_separator(bytes, i))
}

/// `1,234.00` but not `1.00,234.00` nor `12,3456.00`
fn is_thousands_separator(bytes: &[u8], i: usize) -> bool {
    let run_start = bytes[..i]
        .iter()
        .rposition(|b| !b.is_ascii_digit())
        .map_or(0, |position| position + 1);
    let after_fraction = run_start > 0 && bytes[run_start - 1] == b'.';
    let group = bytes
        .get(i + 1..i + 4)
        .is_some_and(|group| group.iter().all(u8::is_ascii_digit));
    let closed = bytes.get(i + 4).map_or(true, |b| !b.is_ascii_digit());
    (1..=3).contains(&(i - run_start)) && !after_fraction && group && closed
}

/// Iterator which turns candidate rows into transactions
///
/// Statements wrap long descriptions: a row holding only text is appended to the description
/// of the transaction right before it. A transaction is therefore only yielded once the next
/// row is known not to continue it.
///
/// Rows which cannot be read are yielded as errors, and do not stop the iteration.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct TransactionParser<I> {
    rows: I,
    normalizer: DateNormalizer,
    pending: Option<Transaction>,
    queued_rejection: Option<RowRejection>,
}

impl<I> TransactionParser<I> {
    fn new(rows: I, normalizer: DateNormalizer) -> Self {
        Self {
            rows,
            normalizer,
            pending: None,
            queued_rejection: None,
        }
    }
}

impl<I> Iterator for TransactionParser<I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    type Item = Result<Transaction, RowRejection>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(rejection) = self.queued_rejection.take() {
            return Some(Err(rejection));
        }
        for row in self.rows.by_ref() {
            match parse_row(row.as_ref(), &self.normalizer) {
                RowParse::Transaction(transaction) => {
                    if let Some(previous) = self.pending.replace(transaction) {
                        return Some(Ok(previous));
                    }
                }
                RowParse::Continuation(text) => match self.pending.as_mut() {
                    Some(transaction) => {
                        if !transaction.description.is_empty() {
                            transaction.description.push(' ');
                        }
                        transaction.description.push_str(&text);
                    }
                    None => return Some(Err(RowRejection::OrphanContinuation(text))),
                },
                RowParse::Rejected(rejection) => match self.pending.take() {
                    Some(previous) => {
                        self.queued_rejection = Some(rejection);
                        return Some(Ok(previous));
                    }
                    None => return Some(Err(rejection)),
                },
            }
        }
        self.pending.take().map(Ok)
    }
}

pub trait IteratorExt {
    fn transactions(self, normalizer: DateNormalizer) -> TransactionParser<Self>
    where
        Self: Sized;
}

impl<I> IteratorExt for I
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    fn transactions(self, normalizer: DateNormalizer) -> TransactionParser<I> {
        TransactionParser::new(self, normalizer)
    }
}
