//! Transaction store, query helpers, and the derived-view services.

pub mod events;
pub mod filter;
pub mod services;
pub mod store;
pub mod validation;

pub use events::{ChangeKind, EventKind, StoreEvent, StoreObserver, SubscriptionId};
pub use filter::{sort_transactions, TransactionFilter, TransactionSort};
pub use store::TransactionStore;
