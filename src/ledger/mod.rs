//! Ledger domain models: transactions, categories, and budgets.

pub mod budget;
pub mod category;
pub mod transaction;

pub use budget::Budget;
pub use category::{default_categories, Category};
pub use transaction::{
    PaymentMethod, Transaction, TransactionDraft, TransactionKind, TransactionPatch,
};
