use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use clap::ValueEnum;
use rust_decimal::Decimal;

use crate::error::StatementError;
use crate::ledger::{Ledger, Transaction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Identical descriptions
    Exact,
    /// Same first two words
    Partial,
}

impl MatchKind {
    pub fn label(self) -> &'static str {
        match self {
            MatchKind::Exact => "Exact match",
            MatchKind::Partial => "Partial match",
        }
    }
}

/// Whether a transaction found in an exact match may also be part of a partial match
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Membership {
    /// Both passes see every transaction
    #[default]
    Independent,
    /// Partial matches only consider transactions left out of exact matches
    Exclusive,
}

/// Two or more transactions with the same description, or the same first two words
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group<'a> {
    pub key: String,
    pub kind: MatchKind,
    pub members: Vec<&'a Transaction>,
    pub total_withdrawals: Decimal,
    pub total_deposits: Decimal,
}

impl<'a> Group<'a> {
    fn new(
        key: String,
        kind: MatchKind,
        members: Vec<&'a Transaction>,
    ) -> Result<Self, StatementError> {
        let overflow = |key: &str| StatementError::AmountOverflow {
            key: key.to_owned(),
        };
        let total_withdrawals = total(&members, |t| t.withdrawal).ok_or_else(|| overflow(&key))?;
        let total_deposits = total(&members, |t| t.deposit).ok_or_else(|| overflow(&key))?;
        Ok(Self {
            key,
            kind,
            members,
            total_withdrawals,
            total_deposits,
        })
    }

    pub fn count(&self) -> usize {
        self.members.len()
    }
}

/// Exact sum of one amount column, `None` when it does not fit a `Decimal`
fn total(
    members: &[&Transaction],
    amount: impl Fn(&Transaction) -> Option<Decimal>,
) -> Option<Decimal> {
    members
        .iter()
        .filter_map(|t| amount(t))
        .try_fold(Decimal::ZERO, Decimal::checked_add)
        .map(|sum| sum.round_dp(2))
}

/// First two words of the description, or the whole description when it is shorter
pub fn partial_key(description: &str) -> String {
    let words: Vec<&str> = description.split_whitespace().take(2).collect();
    if words.len() < 2 {
        description.to_owned()
    } else {
        words.join(" ")
    }
}

/// Finds the exact matches, then the partial matches, of a sorted ledger
///
/// Within each kind, groups come in the order their key first shows up in the ledger.
/// Transactions which match nothing else are not part of any group.
pub fn group_ledger(
    ledger: &Ledger,
    membership: Membership,
) -> Result<Vec<Group<'_>>, StatementError> {
    let transactions = ledger.transactions();

    let exact: Vec<Group<'_>> = buckets(transactions, |t| t.description.as_str())
        .into_iter()
        .filter(|(_, members)| members.len() >= 2)
        .map(|(key, members)| Group::new(key.to_owned(), MatchKind::Exact, members))
        .collect::<Result<_, _>>()?;

    let candidates: Vec<&Transaction> = match membership {
        Membership::Independent => transactions.iter().collect(),
        Membership::Exclusive => {
            let claimed: HashSet<&str> = exact.iter().map(|group| group.key.as_str()).collect();
            transactions
                .iter()
                .filter(|t| !claimed.contains(t.description.as_str()))
                .collect()
        }
    };

    let partial: Vec<Group<'_>> = buckets(candidates, |t| partial_key(&t.description))
        .into_iter()
        .filter(|(_, members)| {
            members.len() >= 2
                && members
                    .iter()
                    .any(|t| t.description != members[0].description)
        })
        .map(|(key, members)| Group::new(key, MatchKind::Partial, members))
        .collect::<Result<_, _>>()?;

    Ok(exact.into_iter().chain(partial).collect())
}

/// Buckets transactions by key, in order of first appearance
fn buckets<'a, K, F>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
    key: F,
) -> Vec<(K, Vec<&'a Transaction>)>
where
    K: Eq + Hash + Clone,
    F: Fn(&'a Transaction) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut buckets: Vec<(K, Vec<&'a Transaction>)> = Vec::new();
    for transaction in transactions {
        let key = key(transaction);
        match index.get(&key) {
            Some(&position) => buckets[position].1.push(transaction),
            None => {
                index.insert(key.clone(), buckets.len());
                buckets.push((key, vec![transaction]));
            }
        }
    }
    buckets
}
