use chrono::NaiveDate;
use rust_decimal::Decimal;

/// One row of the transaction table of a statement
///
/// A transaction is either a withdrawal or a deposit, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub date: NaiveDate,
    pub number: Option<String>,
    pub description: String,
    pub withdrawal: Option<Decimal>,
    pub deposit: Option<Decimal>,
    pub balance: Option<Decimal>,
}

/// All transactions of one statement, in document order until sorted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    transactions: Vec<Transaction>,
}

impl Ledger {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Orders by description (byte-wise, case-sensitive), then date
    ///
    /// The sort is stable: transactions equal on both keys keep their document order.
    pub fn sorted(mut self) -> Self {
        self.transactions.sort_by(|a, b| {
            a.description
                .cmp(&b.description)
                .then_with(|| a.date.cmp(&b.date))
        });
        self
    }
}

impl FromIterator<Transaction> for Ledger {
    fn from_iter<T: IntoIterator<Item = Transaction>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
pub(crate) mod test {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    pub(crate) fn transaction(
        (year, month, day): (i32, u32, u32),
        number: &str,
        description: &str,
        withdrawal: Option<Decimal>,
        deposit: Option<Decimal>,
    ) -> Transaction {
        Transaction {
            date: NaiveDate::from_ymd_opt(year, month, day).expect("valid date"),
            number: Some(number.to_owned()).filter(|n| !n.is_empty()),
            description: description.to_owned(),
            withdrawal,
            deposit,
            balance: None,
        }
    }

    fn descriptions_and_numbers(ledger: &Ledger) -> Vec<(&str, Option<&str>)> {
        ledger
            .transactions()
            .iter()
            .map(|t| (t.description.as_str(), t.number.as_deref()))
            .collect()
    }

    #[test]
    fn should_sort_by_description_then_date() {
        let ledger = Ledger::new(vec![
            transaction((2024, 1, 5), "1002", "COFFEE SHOP", Some(dec!(5.00)), None),
            transaction((2024, 1, 2), "1003", "GROCERY MART", None, Some(dec!(40.00))),
            transaction((2024, 1, 3), "1001", "COFFEE SHOP", Some(dec!(5.00)), None),
        ])
        .sorted();
        assert_eq!(
            vec![
                ("COFFEE SHOP", Some("1001")),
                ("COFFEE SHOP", Some("1002")),
                ("GROCERY MART", Some("1003")),
            ],
            descriptions_and_numbers(&ledger)
        );
    }

    #[test]
    fn should_compare_descriptions_case_sensitively() {
        let ledger = Ledger::new(vec![
            transaction((2024, 1, 1), "1", "amazon", None, None),
            transaction((2024, 1, 1), "2", "Zelle", None, None),
            transaction((2024, 1, 1), "3", "AMAZON", None, None),
        ])
        .sorted();
        assert_eq!(
            vec![
                ("AMAZON", Some("3")),
                ("Zelle", Some("2")),
                ("amazon", Some("1")),
            ],
            descriptions_and_numbers(&ledger)
        );
    }

    #[test]
    fn should_keep_document_order_for_full_ties() {
        let ledger = Ledger::new(vec![
            transaction((2024, 3, 1), "3", "ATM", Some(dec!(20.00)), None),
            transaction((2024, 3, 1), "1", "ATM", Some(dec!(40.00)), None),
            transaction((2024, 3, 1), "2", "ATM", Some(dec!(60.00)), None),
        ])
        .sorted();
        assert_eq!(
            vec![("ATM", Some("3")), ("ATM", Some("1")), ("ATM", Some("2"))],
            descriptions_and_numbers(&ledger)
        );
    }

    #[test]
    fn should_be_idempotent() {
        let sorted = Ledger::new(vec![
            transaction((2024, 2, 9), "", "PAYROLL", None, Some(dec!(1500.00))),
            transaction((2024, 1, 9), "", "PAYROLL", None, Some(dec!(1500.00))),
            transaction((2024, 1, 4), "", "CHECK 123456", Some(dec!(80.00)), None),
            transaction((2024, 1, 4), "", "ATM", Some(dec!(20.00)), None),
        ])
        .sorted();
        assert_eq!(sorted, sorted.clone().sorted());
    }
}
