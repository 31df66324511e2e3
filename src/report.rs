use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use color_eyre::eyre::Context;
use color_eyre::Result;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::date;
use crate::grouping::Group;
use crate::ledger::{Ledger, Transaction};
use crate::money::format_amount;

pub const LEDGER_HEADERS: [&str; 6] = [
    "Date",
    "Number",
    "Description",
    "Withdrawals",
    "Deposits",
    "Balance",
];
pub const SUMMARY_HEADERS: [&str; 5] = [
    "Match Type",
    "Description",
    "Count",
    "Total Withdrawals",
    "Total Deposits",
];

/// Lets spreadsheet applications detect the encoding
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerRow {
    pub date: String,
    pub number: String,
    pub description: String,
    pub withdrawals: String,
    pub deposits: String,
    pub balance: String,
}

impl From<&Transaction> for LedgerRow {
    fn from(transaction: &Transaction) -> Self {
        let amount = |value: Option<Decimal>| value.map(format_amount).unwrap_or_default();
        Self {
            date: date::display(transaction.date),
            number: transaction.number.clone().unwrap_or_default(),
            description: transaction.description.clone(),
            withdrawals: amount(transaction.withdrawal),
            deposits: amount(transaction.deposit),
            balance: amount(transaction.balance),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub match_type: &'static str,
    pub description: String,
    pub count: usize,
    pub total_withdrawals: String,
    pub total_deposits: String,
}

impl From<&Group<'_>> for SummaryRow {
    fn from(group: &Group<'_>) -> Self {
        Self {
            match_type: group.kind.label(),
            description: group.key.clone(),
            count: group.count(),
            total_withdrawals: format_amount(group.total_withdrawals),
            total_deposits: format_amount(group.total_deposits),
        }
    }
}

/// The sorted ledger followed by the summaries of its groups, formatted for output
///
/// The CSV file and the console output are both rendered from this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub ledger: Vec<LedgerRow>,
    pub summaries: Vec<SummaryRow>,
}

impl Report {
    pub fn assemble(ledger: &Ledger, groups: &[Group<'_>]) -> Self {
        Self {
            ledger: ledger.transactions().iter().map(LedgerRow::from).collect(),
            summaries: groups.iter().map(SummaryRow::from).collect(),
        }
    }

    /// Ledger rows, a blank row, then the summary rows, each section with its own header
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .has_headers(false)
            .from_writer(writer);
        writer.write_record(LEDGER_HEADERS)?;
        for row in &self.ledger {
            writer.serialize(row)?;
        }
        writer.write_record([""; LEDGER_HEADERS.len()])?;
        writer.write_record(SUMMARY_HEADERS)?;
        for row in &self.summaries {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Writes to a sibling file, renamed to `path` once complete
    pub fn save(&self, path: &Path) -> Result<()> {
        let partial_path = path.with_extension("csv.partial");
        if let Err(err) = self.write_file(&partial_path) {
            let _ = fs::remove_file(&partial_path);
            return Err(err);
        }
        fs::rename(&partial_path, path)
            .with_context(|| format!("Could not move {partial_path:?} to {path:?}"))
    }

    fn write_file(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("Could not create {path:?}"))?;
        let mut file = BufWriter::new(file);
        file.write_all(UTF8_BOM)?;
        self.write_csv(&mut file)
            .with_context(|| format!("Could not write CSV to {path:?}"))?;
        file.into_inner()?.sync_all()?;
        Ok(())
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.summaries.is_empty() {
            return writeln!(f, "No groups found for summarization.");
        }
        writeln!(f, "Summary Totals:")?;
        for summary in &self.summaries {
            writeln!(f)?;
            writeln!(
                f,
                "{}: {} ({} transactions)",
                summary.match_type, summary.description, summary.count
            )?;
            writeln!(f, "  Total Withdrawals: ${}", summary.total_withdrawals)?;
            writeln!(f, "  Total Deposits: ${}", summary.total_deposits)?;
        }
        Ok(())
    }
}
