//! Query predicates over transaction snapshots.

use std::{borrow::Borrow, cmp::Ordering};

use chrono::NaiveDate;

use crate::ledger::{PaymentMethod, Transaction, TransactionKind};

/// Independently optional criteria, combined with logical AND.
///
/// Empty category or payment-method sets place no constraint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    pub kind: Option<TransactionKind>,
    pub categories: Vec<String>,
    pub payment_methods: Vec<PaymentMethod>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    /// Case-insensitive substring over description and notes.
    pub text: Option<String>,
}

impl TransactionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn payment_methods(mut self, methods: impl IntoIterator<Item = PaymentMethod>) -> Self {
        self.payment_methods = methods.into_iter().collect();
        self
    }

    pub fn between(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.date_from = Some(from);
        self.date_to = Some(to);
        self
    }

    pub fn amount_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_amount = min;
        self.max_amount = max;
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn matches(&self, txn: &Transaction) -> bool {
        if self.kind.is_some_and(|kind| txn.kind != kind) {
            return false;
        }
        if !self.categories.is_empty() && !self.categories.iter().any(|c| *c == txn.category) {
            return false;
        }
        if !self.payment_methods.is_empty() && !self.payment_methods.contains(&txn.payment_method)
        {
            return false;
        }
        if self.date_from.is_some_and(|from| txn.date < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| txn.date > to) {
            return false;
        }
        if self.min_amount.is_some_and(|min| txn.amount < min) {
            return false;
        }
        if self.max_amount.is_some_and(|max| txn.amount > max) {
            return false;
        }
        match self.text.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                contains_ci(&txn.description, &needle)
                    || txn
                        .notes
                        .as_deref()
                        .is_some_and(|notes| contains_ci(notes, &needle))
            }
            _ => true,
        }
    }
}

/// Transactions satisfying `criteria`, in snapshot order.
pub fn filter<'a>(transactions: &'a [Transaction], criteria: &TransactionFilter) -> Vec<&'a Transaction> {
    transactions.iter().filter(|txn| criteria.matches(txn)).collect()
}

/// Free-text search over description, notes, category and payment method,
/// further constrained by `criteria`. A blank query matches everything.
pub fn search<'a>(
    transactions: &'a [Transaction],
    query: &str,
    criteria: &TransactionFilter,
) -> Vec<&'a Transaction> {
    let needle = query.trim().to_lowercase();
    transactions
        .iter()
        .filter(|txn| criteria.matches(txn))
        .filter(|txn| needle.is_empty() || search_hit(txn, &needle))
        .collect()
}

fn search_hit(txn: &Transaction, needle: &str) -> bool {
    contains_ci(&txn.description, needle)
        || txn.notes.as_deref().is_some_and(|n| contains_ci(n, needle))
        || contains_ci(&txn.category, needle)
        || txn.payment_method.as_str().contains(needle)
        || contains_ci(txn.payment_method.label(), needle)
}

fn contains_ci(haystack: &str, lowered_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowered_needle)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionSort {
    #[default]
    DateDesc,
    DateAsc,
    AmountDesc,
    AmountAsc,
    Description,
}

/// Stable sort; newest-created first breaks date ties.
pub fn sort_transactions<T: Borrow<Transaction>>(items: &mut [T], order: TransactionSort) {
    items.sort_by(|a, b| {
        let (a, b) = (a.borrow(), b.borrow());
        match order {
            TransactionSort::DateDesc => b
                .date
                .cmp(&a.date)
                .then_with(|| b.created_at.cmp(&a.created_at)),
            TransactionSort::DateAsc => a
                .date
                .cmp(&b.date)
                .then_with(|| a.created_at.cmp(&b.created_at)),
            TransactionSort::AmountDesc => b.amount.partial_cmp(&a.amount).unwrap_or(Ordering::Equal),
            TransactionSort::AmountAsc => a.amount.partial_cmp(&b.amount).unwrap_or(Ordering::Equal),
            TransactionSort::Description => a
                .description
                .to_lowercase()
                .cmp(&b.description.to_lowercase()),
        }
    });
}
