#![warn(clippy::unwrap_used)]
#![doc = include_str!("../README.md")]

mod date;
mod discover;
mod document;
mod error;
mod extract;
mod grouping;
mod ledger;
mod money;
mod parser;
mod report;

use std::io;
use std::path::{Path, PathBuf};

use clap::Parser;
use color_eyre::eyre::{bail, Context};
use color_eyre::Result;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use date::{DateNormalizer, DEFAULT_CENTURY};
use discover::{locate_input, Terminal};
use document::Document;
use error::StatementError;
use extract::{
    candidate_rows, FooterPatterns, HeaderLabels, Page, RowFilter, DEFAULT_FOOTER_PATTERNS,
    DEFAULT_HEADER_LABELS,
};
use grouping::{group_ledger, Membership};
use ledger::Ledger;
use parser::IteratorExt;
use report::Report;

/// Converts a WSFS bank statement PDF to CSV, with totals of similar transactions
#[derive(Debug, Parser)]
struct Args {
    /// A WSFS statement PDF, looked up in the current directory when omitted
    input: Option<PathBuf>,
    /// CSV destination file [default: the input file with a .csv extension]
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Column header label of the transaction table, rows made only of labels are skipped
    #[arg(long = "header-label", value_name = "LABEL", default_values = DEFAULT_HEADER_LABELS)]
    header_labels: Vec<String>,
    /// Regular expression of page footer rows, matched case-insensitively
    #[arg(
        long = "footer-pattern",
        value_name = "REGEX",
        default_values = DEFAULT_FOOTER_PATTERNS
    )]
    footer_patterns: Vec<String>,
    /// First year of the century the two-digit statement years belong to
    #[arg(long, default_value_t = DEFAULT_CENTURY)]
    century: i32,
    /// Whether transactions in an exact match may also be part of a partial match
    #[arg(long, value_enum, default_value_t = Membership::Independent)]
    membership: Membership,
    /// Prints the raw lines found in the document
    #[arg(long)]
    print_lines: bool,
}

/// How rows are read and grouped
#[derive(Debug, Clone, Default)]
struct Settings {
    filter: RowFilter,
    normalizer: DateNormalizer,
    membership: Membership,
}

/// Runs the rows of all pages through the extractor and the parser, dropping unreadable rows
fn extract_ledger(pages: Vec<Page>, settings: &Settings) -> Ledger {
    let mut rejected = 0usize;
    let ledger: Ledger = candidate_rows(pages, &settings.filter)
        .transactions(settings.normalizer)
        .filter_map(|parsed| match parsed {
            Ok(transaction) => Some(transaction),
            Err(rejection) => {
                rejected += 1;
                debug!(%rejection, "Skipping row");
                None
            }
        })
        .collect();
    info!(accepted = ledger.len(), rejected, "Parsed rows");
    ledger
}

/// Sorted ledger and summaries of one document
fn summarize(
    pages: Vec<Page>,
    settings: &Settings,
    path: &Path,
) -> Result<Report, StatementError> {
    let ledger = extract_ledger(pages, settings);
    if ledger.is_empty() {
        return Err(StatementError::NoTransactionsFound {
            path: path.to_owned(),
        });
    }
    let ledger = ledger.sorted();
    let groups = group_ledger(&ledger, settings.membership)?;
    info!(groups = groups.len(), "Grouped transactions");
    Ok(Report::assemble(&ledger, &groups))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let Args {
        input,
        output,
        header_labels,
        footer_patterns,
        century,
        membership,
        print_lines,
    } = Args::parse();
    let footers =
        FooterPatterns::new(&footer_patterns).context("Could not parse the footer patterns")?;
    let settings = Settings {
        filter: RowFilter {
            labels: HeaderLabels::new(header_labels),
            footers,
        },
        normalizer: DateNormalizer::new(century),
        membership,
    };

    let directory =
        std::env::current_dir().context("Could not determine the current directory")?;
    let input = locate_input(
        input,
        &directory,
        &mut Terminal::new(io::stdin().lock(), io::stdout()),
    )?;
    let output = output.unwrap_or_else(|| input.with_extension("csv"));
    if output == input {
        bail!("The output file {output:?} would overwrite the input file");
    }

    let document = Document::open(&input)?;
    let pages = document.pages()?;
    if print_lines {
        for line in pages.iter().flatten() {
            println!("{line}");
        }
    }

    let report = summarize(pages, &settings, document.path())?;
    report
        .save(&output)
        .with_context(|| format!("Could not save {output:?}"))?;

    println!("\n{report}");
    println!("Data saved to {}", output.display());
    Ok(())
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::report::SummaryRow;

    fn pages(pages: &[&[&str]]) -> Vec<Page> {
        pages
            .iter()
            .map(|rows| rows.iter().map(|row| row.to_string()).collect())
            .collect()
    }

    fn statement_path() -> PathBuf {
        PathBuf::from("statement.pdf")
    }

    #[test]
    fn should_sort_and_summarize_a_statement() {
        let report = summarize(
            pages(&[&[
                "Date Number Description Withdrawals Deposits Balance",
                "010324  1001  COFFEE SHOP  5.00    ,1200.00",
                "010524  1002  COFFEE SHOP  5.00   ,1195.00",
                "010224  1003  GROCERY MART     ,40.00,1235.00",
            ]]),
            &Settings::default(),
            &statement_path(),
        )
        .expect("report");

        assert_eq!(
            vec![
                ("01/03/2024", "COFFEE SHOP"),
                ("01/05/2024", "COFFEE SHOP"),
                ("01/02/2024", "GROCERY MART"),
            ],
            report
                .ledger
                .iter()
                .map(|row| (row.date.as_str(), row.description.as_str()))
                .collect::<Vec<_>>()
        );
        assert_eq!(
            vec![SummaryRow {
                match_type: "Exact match",
                description: "COFFEE SHOP".to_owned(),
                count: 2,
                total_withdrawals: "10.00".to_owned(),
                total_deposits: "0.00".to_owned(),
            }],
            report.summaries
        );
    }

    #[test]
    fn should_group_partial_matches_across_pages() {
        let report = summarize(
            pages(&[
                &[
                    "Date Number Description Withdrawals Deposits Balance",
                    "010824 AMAZON MKTPL 123 19.99 ,980.01",
                    "010924 AMAZON PRIME 14.99 ,965.02",
                ],
                &[
                    "Date Number Description Withdrawals Deposits Balance",
                    "011224 AMAZON MKTPL 456 5.01 ,960.01",
                ],
            ]),
            &Settings::default(),
            &statement_path(),
        )
        .expect("report");

        assert_eq!(
            vec![SummaryRow {
                match_type: "Partial match",
                description: "AMAZON MKTPL".to_owned(),
                count: 2,
                total_withdrawals: "25.00".to_owned(),
                total_deposits: "0.00".to_owned(),
            }],
            report.summaries
        );
    }

    #[test]
    fn should_continue_descriptions_over_a_page_break() {
        let report = summarize(
            pages(&[
                &["013024 ONLINE TRANSFER TO 100.00 ,900.00"],
                &[
                    "Date Number Description Withdrawals Deposits Balance",
                    "SAVINGS 4821",
                    "013124 INTEREST ,0.12,900.12",
                ],
            ]),
            &Settings::default(),
            &statement_path(),
        )
        .expect("report");

        assert_eq!(
            vec!["INTEREST", "ONLINE TRANSFER TO SAVINGS 4821"],
            report
                .ledger
                .iter()
                .map(|row| row.description.as_str())
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn should_leave_page_footers_out_of_descriptions() {
        let report = summarize(
            pages(&[
                &[
                    "Date Number Description Withdrawals Deposits Balance",
                    "010324 1001 COFFEE SHOP 5.00 ,1200.00",
                    "Page 1 of 2",
                ],
                &[
                    "Date Number Description Withdrawals Deposits Balance",
                    "010524 1002 COFFEE SHOP 5.00 ,1195.00",
                    "Page 2 of 2",
                ],
            ]),
            &Settings::default(),
            &statement_path(),
        )
        .expect("report");

        assert_eq!(
            vec!["COFFEE SHOP", "COFFEE SHOP"],
            report
                .ledger
                .iter()
                .map(|row| row.description.as_str())
                .collect::<Vec<_>>()
        );
        assert_eq!(
            vec![SummaryRow {
                match_type: "Exact match",
                description: "COFFEE SHOP".to_owned(),
                count: 2,
                total_withdrawals: "10.00".to_owned(),
                total_deposits: "0.00".to_owned(),
            }],
            report.summaries
        );
    }

    #[test]
    fn should_continue_over_a_footer_and_a_page_break() {
        let report = summarize(
            pages(&[
                &["011024 MOBILE 25.00 ,975.00", "Page 1 of 2"],
                &[
                    "Date Number Description Withdrawals Deposits Balance",
                    "DEPOSIT",
                    "011124 ATM 20.00 ,955.00",
                    "Page 2 of 2",
                ],
            ]),
            &Settings::default(),
            &statement_path(),
        )
        .expect("report");

        assert_eq!(
            vec![("01/11/2024", "ATM"), ("01/10/2024", "MOBILE DEPOSIT")],
            report
                .ledger
                .iter()
                .map(|row| (row.date.as_str(), row.description.as_str()))
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn should_not_continue_a_transaction_after_a_rejected_row_on_the_next_page() {
        let report = summarize(
            pages(&[
                &["011024 ATM 20.00 ,955.00", "Page 1 of 2"],
                &[
                    "Beginning Balance 955.00",
                    "BRANCH 12",
                    "011124 ATM 20.00 ,935.00",
                ],
            ]),
            &Settings::default(),
            &statement_path(),
        )
        .expect("report");

        assert_eq!(
            vec!["ATM", "ATM"],
            report
                .ledger
                .iter()
                .map(|row| row.description.as_str())
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn should_skip_rows_with_an_invalid_date() {
        let report = summarize(
            pages(&[&[
                "131599 1001 COFFEE SHOP 5.00 ,1200.00",
                "010524 1002 COFFEE SHOP 5.00 ,1195.00",
            ]]),
            &Settings::default(),
            &statement_path(),
        )
        .expect("report");

        assert_eq!(1, report.ledger.len());
        assert_eq!("01/05/2024", report.ledger[0].date);
        assert!(report.summaries.is_empty());
    }

    #[test]
    fn should_fail_without_any_transaction() {
        let result = summarize(
            pages(&[
                &["Date Number Description Withdrawals Deposits Balance", ""],
                &["Beginning Balance 1,000.00", "131599 COFFEE SHOP 5.00 ,995.00"],
            ]),
            &Settings::default(),
            &statement_path(),
        );
        assert!(matches!(
            result,
            Err(StatementError::NoTransactionsFound { path }) if path == statement_path()
        ));
    }

    #[test]
    fn should_fail_on_an_empty_document() {
        assert!(matches!(
            summarize(Vec::new(), &Settings::default(), &statement_path()),
            Err(StatementError::NoTransactionsFound { .. })
        ));
    }
}
