use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A single income or expense record owned by the transaction store.
///
/// `amount` is always positive; the direction of the flow comes from `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub description: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn is_income(&self) -> bool {
        self.kind == TransactionKind::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }

    /// Amount with the sign implied by the transaction kind.
    pub fn signed_amount(&self) -> f64 {
        self.kind.sign() * self.amount
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    pub fn sign(self) -> f64 {
        match self {
            TransactionKind::Income => 1.0,
            TransactionKind::Expense => -1.0,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(format!("unknown transaction type `{other}`")),
        }
    }
}

/// How a transaction was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Debit,
    Credit,
    Bank,
    Digital,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::Cash,
        PaymentMethod::Debit,
        PaymentMethod::Credit,
        PaymentMethod::Bank,
        PaymentMethod::Digital,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Debit => "debit",
            PaymentMethod::Credit => "credit",
            PaymentMethod::Bank => "bank",
            PaymentMethod::Digital => "digital",
        }
    }

    /// Human-facing label.
    pub fn label(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Debit => "Debit Card",
            PaymentMethod::Credit => "Credit Card",
            PaymentMethod::Bank => "Bank Transfer",
            PaymentMethod::Digital => "Digital Wallet",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    /// Accepts either the short name (`credit`) or the label (`Credit Card`).
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        PaymentMethod::ALL
            .into_iter()
            .find(|method| {
                method.as_str() == normalized || method.label().to_ascii_lowercase() == normalized
            })
            .ok_or_else(|| format!("unknown payment method `{}`", value.trim()))
    }
}

/// Input for creating a transaction. Missing ids and timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDraft {
    pub id: Option<String>,
    pub description: String,
    pub amount: f64,
    pub kind: TransactionKind,
    pub category: String,
    pub date: NaiveDate,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TransactionDraft {
    pub fn new(
        description: impl Into<String>,
        amount: f64,
        kind: TransactionKind,
        category: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: None,
            description: description.into(),
            amount,
            kind,
            category: category.into(),
            date,
            payment_method: None,
            notes: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_payment_method(mut self, method: PaymentMethod) -> Self {
        self.payment_method = Some(method);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

impl From<&Transaction> for TransactionDraft {
    fn from(txn: &Transaction) -> Self {
        Self {
            id: Some(txn.id.clone()),
            description: txn.description.clone(),
            amount: txn.amount,
            kind: txn.kind,
            category: txn.category.clone(),
            date: txn.date,
            payment_method: Some(txn.payment_method),
            notes: txn.notes.clone(),
            created_at: Some(txn.created_at),
            updated_at: Some(txn.updated_at),
        }
    }
}

/// Partial update. Present fields replace the stored ones; absent fields are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionPatch {
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub kind: Option<TransactionKind>,
    pub category: Option<String>,
    pub date: Option<NaiveDate>,
    pub payment_method: Option<PaymentMethod>,
    /// `Some("")` clears the notes.
    pub notes: Option<String>,
}

impl TransactionPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Shallow-merges the patch over `base`, producing the candidate record.
    pub fn merged_onto(&self, base: &Transaction) -> Transaction {
        let mut candidate = base.clone();
        if let Some(description) = &self.description {
            candidate.description = description.clone();
        }
        if let Some(amount) = self.amount {
            candidate.amount = amount;
        }
        if let Some(kind) = self.kind {
            candidate.kind = kind;
        }
        if let Some(category) = &self.category {
            candidate.category = category.clone();
        }
        if let Some(date) = self.date {
            candidate.date = date;
        }
        if let Some(method) = self.payment_method {
            candidate.payment_method = method;
        }
        if let Some(notes) = &self.notes {
            candidate.notes = (!notes.is_empty()).then(|| notes.clone());
        }
        candidate
    }
}
