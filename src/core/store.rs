//! The transaction store: sole owner of the canonical collections.
//!
//! Every mutation builds a candidate collection, validates it, writes the whole
//! document through the key-value backend and only then swaps it in and notifies
//! subscribers. A failed validation or write leaves the store untouched.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    config::Config,
    errors::{Result, TrackerError, ValidationErrors},
    exchange::{ImportMode, ImportReport, ImportRow, ParsedImport, RowError},
    ledger::{default_categories, Budget, Category, Transaction, TransactionDraft, TransactionPatch},
    storage::{
        backup::{prune_oldest, Backup, BACKUP_FORMAT_VERSION},
        KeyValueStore, MemoryStore, StorageError, BACKUPS_KEY, BUDGETS_KEY, CATEGORIES_KEY,
        SETTINGS_KEY, TRANSACTIONS_KEY,
    },
    utils::time::{Clock, SystemClock},
};

use super::{
    events::{ChangeKind, EventKind, Observers, StoreEvent, StoreObserver, SubscriptionId},
    filter::{self, TransactionFilter},
    validation::{sanitize_patch, sanitize_transaction, validate_transaction},
};

/// Documents a restore replaces together.
const RESTORED_KEYS: [&str; 4] = [CATEGORIES_KEY, BUDGETS_KEY, SETTINGS_KEY, TRANSACTIONS_KEY];

pub struct TransactionStore {
    backend: Box<dyn KeyValueStore>,
    clock: Box<dyn Clock>,
    transactions: Vec<Transaction>,
    categories: Vec<Category>,
    budgets: Vec<Budget>,
    config: Config,
    observers: Observers,
}

impl TransactionStore {
    /// Loads whatever snapshots the backend holds. Nothing is written on open.
    pub fn open(
        backend: impl KeyValueStore + 'static,
        clock: impl Clock + 'static,
    ) -> Result<Self> {
        let transactions = load_document(&backend, TRANSACTIONS_KEY)?.unwrap_or_default();
        let categories =
            load_document(&backend, CATEGORIES_KEY)?.unwrap_or_else(default_categories);
        let budgets = load_document(&backend, BUDGETS_KEY)?.unwrap_or_default();
        let config = load_document(&backend, SETTINGS_KEY)?.unwrap_or_default();
        Ok(Self {
            backend: Box::new(backend),
            clock: Box::new(clock),
            transactions,
            categories,
            budgets,
            config,
            observers: Observers::default(),
        })
    }

    /// Empty store over an unbounded [`MemoryStore`] and the system clock.
    pub fn in_memory() -> Self {
        Self {
            backend: Box::new(MemoryStore::new()),
            clock: Box::new(SystemClock),
            transactions: Vec::new(),
            categories: default_categories(),
            budgets: Vec::new(),
            config: Config::default(),
            observers: Observers::default(),
        }
    }

    /// Read-only snapshot in insertion order.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn get(&self, id: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|txn| txn.id == id)
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }

    pub fn budgets(&self) -> &[Budget] {
        &self.budgets
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn backend(&self) -> &dyn KeyValueStore {
        self.backend.as_ref()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Validates, sanitizes, appends and persists a new transaction.
    pub fn add(&mut self, draft: TransactionDraft) -> Result<Transaction> {
        let candidate = self.build_candidate(draft)?;
        if self.get(&candidate.id).is_some() {
            let mut errors = ValidationErrors::new();
            errors.add("id", "A transaction with this id already exists");
            return Err(errors.into());
        }

        let mut next = self.transactions.clone();
        next.push(candidate.clone());
        self.commit_transactions(next, ChangeKind::Added(candidate.id.clone()))?;
        debug!(id = %candidate.id, "transaction added");
        Ok(candidate)
    }

    /// Merges `patch` onto the stored record and re-validates the merged result.
    pub fn update(&mut self, id: &str, mut patch: TransactionPatch) -> Result<Transaction> {
        let index = self
            .position(id)
            .ok_or_else(|| TrackerError::NotFound(id.to_string()))?;

        sanitize_patch(&mut patch);
        let mut candidate = patch.merged_onto(&self.transactions[index]);
        candidate.updated_at = self.clock.now();
        validate_transaction(&candidate, self.clock.today())?;

        let mut next = self.transactions.clone();
        next[index] = candidate.clone();
        self.commit_transactions(next, ChangeKind::Updated(id.to_string()))?;
        debug!(id, "transaction updated");
        Ok(candidate)
    }

    /// Removes a transaction, returning its id. Unknown ids are an error.
    pub fn delete(&mut self, id: &str) -> Result<String> {
        let index = self
            .position(id)
            .ok_or_else(|| TrackerError::NotFound(id.to_string()))?;
        let mut next = self.transactions.clone();
        let removed = next.remove(index);
        self.commit_transactions(next, ChangeKind::Deleted(removed.id.clone()))?;
        debug!(id, "transaction deleted");
        Ok(removed.id)
    }

    /// Removes every transaction. Returns how many were dropped.
    pub fn clear(&mut self) -> Result<usize> {
        self.auto_backup("clear");
        let count = self.transactions.len();
        self.commit_transactions(Vec::new(), ChangeKind::Cleared)?;
        info!(count, "transactions cleared");
        Ok(count)
    }

    pub fn filter(&self, criteria: &TransactionFilter) -> Vec<&Transaction> {
        filter::filter(&self.transactions, criteria)
    }

    pub fn search(&self, query: &str, criteria: &TransactionFilter) -> Vec<&Transaction> {
        filter::search(&self.transactions, query, criteria)
    }

    pub fn subscribe(
        &mut self,
        kind: EventKind,
        observer: impl StoreObserver + 'static,
    ) -> SubscriptionId {
        self.observers.subscribe(kind, Box::new(observer))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn add_category(&mut self, category: Category) -> Result<()> {
        let mut errors = ValidationErrors::new();
        if category.id.trim().is_empty() {
            errors.add("id", "Category id is required");
        } else if self.category(&category.id).is_some() {
            errors.add("id", format!("Category `{}` already exists", category.id));
        }
        if category.name.trim().is_empty() {
            errors.add("name", "Category name is required");
        }
        errors.into_result()?;

        let mut next = self.categories.clone();
        next.push(category);
        self.write_document(CATEGORIES_KEY, &next)?;
        self.categories = next;
        self.notify(ChangeKind::Categories);
        Ok(())
    }

    /// Transactions referencing the category are left as they are.
    pub fn remove_category(&mut self, id: &str) -> Result<Category> {
        let index = self
            .categories
            .iter()
            .position(|category| category.id == id)
            .ok_or_else(|| TrackerError::NotFound(id.to_string()))?;
        let mut next = self.categories.clone();
        let removed = next.remove(index);
        self.write_document(CATEGORIES_KEY, &next)?;
        self.categories = next;
        self.notify(ChangeKind::Categories);
        Ok(removed)
    }

    /// Inserts or replaces the budget for the same category and month.
    pub fn set_budget(&mut self, budget: Budget) -> Result<()> {
        let mut errors = ValidationErrors::new();
        if budget.category.trim().is_empty() {
            errors.add("category", "Category is required");
        }
        if !budget.amount.is_finite() || budget.amount <= 0.0 {
            errors.add("amount", "Budget amount must be greater than 0");
        }
        if !(1..=12).contains(&budget.month) {
            errors.add("month", "Month must be between 1 and 12");
        }
        errors.into_result()?;

        let mut next = self.budgets.clone();
        match next.iter_mut().find(|existing| existing.same_slot(&budget)) {
            Some(existing) => *existing = budget,
            None => next.push(budget),
        }
        self.write_document(BUDGETS_KEY, &next)?;
        self.budgets = next;
        self.notify(ChangeKind::Budgets);
        Ok(())
    }

    pub fn remove_budget(&mut self, category: &str, month: u32, year: i32) -> Result<Budget> {
        let probe = Budget::new(category, 0.0, month, year);
        let index = self
            .budgets
            .iter()
            .position(|budget| budget.same_slot(&probe))
            .ok_or_else(|| TrackerError::NotFound(format!("{category} {year}-{month:02}")))?;
        let mut next = self.budgets.clone();
        let removed = next.remove(index);
        self.write_document(BUDGETS_KEY, &next)?;
        self.budgets = next;
        self.notify(ChangeKind::Budgets);
        Ok(removed)
    }

    pub fn update_config(&mut self, config: Config) -> Result<()> {
        self.write_document(SETTINGS_KEY, &config)?;
        self.config = config;
        self.notify(ChangeKind::Settings);
        Ok(())
    }

    /// Snapshots every collection under the `backups` key, pruning the oldest
    /// beyond the configured retention.
    pub fn create_backup(&mut self) -> Result<Backup> {
        let backup = Backup {
            timestamp: self.clock.now(),
            transactions: self.transactions.clone(),
            categories: self.categories.clone(),
            budgets: self.budgets.clone(),
            settings: self.config.clone(),
            version: BACKUP_FORMAT_VERSION.to_string(),
        };
        let mut backups = self.stored_backups()?;
        backups.push(backup.clone());
        let pruned = prune_oldest(&mut backups, self.config.storage.backup_retention);
        self.write_document(BACKUPS_KEY, &backups)?;
        info!(
            kept = backups.len(),
            pruned,
            transactions = backup.transactions.len(),
            "backup created"
        );
        Ok(backup)
    }

    /// Stored backups, newest first.
    pub fn list_backups(&self) -> Result<Vec<Backup>> {
        let mut backups = self.stored_backups()?;
        backups.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(backups)
    }

    /// Replaces every collection with the newest backup taken at `timestamp`.
    pub fn restore_backup(&mut self, timestamp: DateTime<Utc>) -> Result<()> {
        let backup = self
            .list_backups()?
            .into_iter()
            .find(|backup| backup.timestamp == timestamp)
            .ok_or_else(|| TrackerError::NotFound(format!("backup {}", timestamp.to_rfc3339())))?;

        let previous = RESTORED_KEYS
            .iter()
            .map(|key| -> Result<(&'static str, Option<String>)> {
                Ok((*key, self.backend.get(key)?))
            })
            .collect::<Result<Vec<_>>>()?;
        let mut transactions = backup.transactions.clone();
        if let Err(err) = self.write_restored(&mut transactions, &backup) {
            self.roll_back(previous);
            return Err(err);
        }

        self.transactions = transactions;
        self.categories = backup.categories;
        self.budgets = backup.budgets;
        self.config = backup.settings;
        info!(%timestamp, "backup restored");
        self.notify(ChangeKind::Restored);
        Ok(())
    }

    fn write_restored(&mut self, transactions: &mut Vec<Transaction>, backup: &Backup) -> Result<()> {
        self.write_document(CATEGORIES_KEY, &backup.categories)?;
        self.write_document(BUDGETS_KEY, &backup.budgets)?;
        self.write_document(SETTINGS_KEY, &backup.settings)?;
        self.persist_transactions(transactions)?;
        Ok(())
    }

    /// Puts back raw documents captured before a multi-document write.
    fn roll_back(&mut self, previous: Vec<(&str, Option<String>)>) {
        for (key, raw) in previous.into_iter().rev() {
            let outcome = match raw {
                Some(raw) => self.backend.set(key, &raw),
                None => self.backend.remove(key),
            };
            if let Err(err) = outcome {
                warn!(%err, key, "failed to roll back document");
            }
        }
    }

    /// Validates each parsed row independently and commits the accepted ones
    /// in a single write. Parse failures carry over into the report.
    pub fn import(&mut self, batch: ParsedImport, mode: ImportMode) -> Result<ImportReport> {
        if mode == ImportMode::Replace {
            self.auto_backup("replace import");
        }

        let mut next = match mode {
            ImportMode::Replace => Vec::new(),
            ImportMode::Append | ImportMode::Merge => self.transactions.clone(),
        };
        let mut ids: HashSet<String> = next.iter().map(|txn| txn.id.clone()).collect();
        let mut report = ImportReport {
            errors: batch.errors,
            ..ImportReport::default()
        };

        for ImportRow { row, draft } in batch.rows {
            let candidate = match self.build_candidate(draft) {
                Ok(candidate) => candidate,
                Err(err) => {
                    report.errors.push(RowError {
                        row,
                        message: err.to_string(),
                    });
                    continue;
                }
            };
            if ids.contains(&candidate.id) {
                report.duplicates += 1;
                continue;
            }
            if mode == ImportMode::Merge && next.iter().any(|txn| same_entry(txn, &candidate)) {
                report.duplicates += 1;
                continue;
            }
            ids.insert(candidate.id.clone());
            next.push(candidate);
            report.imported += 1;
        }

        report.errors.sort_by_key(|error| error.row);

        if report.imported > 0 || mode == ImportMode::Replace {
            self.commit_transactions(next, ChangeKind::Imported(report.imported))?;
        }
        info!(
            imported = report.imported,
            duplicates = report.duplicates,
            errors = report.errors.len(),
            ?mode,
            "import finished"
        );
        Ok(report)
    }

    fn build_candidate(&self, draft: TransactionDraft) -> Result<Transaction> {
        let now = self.clock.now();
        let id = draft
            .id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let mut candidate = Transaction {
            id,
            description: draft.description,
            amount: draft.amount,
            kind: draft.kind,
            category: draft.category,
            date: draft.date,
            payment_method: draft.payment_method.unwrap_or_default(),
            notes: draft.notes,
            created_at: draft.created_at.unwrap_or(now),
            updated_at: draft.updated_at.unwrap_or(now),
        };
        sanitize_transaction(&mut candidate);
        validate_transaction(&candidate, self.clock.today())?;
        Ok(candidate)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.transactions.iter().position(|txn| txn.id == id)
    }

    /// A last-resort truncation that drops the added or updated record itself
    /// still commits, but the call reports it as a persistence failure.
    fn commit_transactions(&mut self, mut next: Vec<Transaction>, change: ChangeKind) -> Result<()> {
        let dropped = self.persist_transactions(&mut next)?;
        self.transactions = next;
        if dropped > 0 {
            if let Some(id) = expected_record(&change) {
                if self.position(id).is_none() {
                    let message = format!(
                        "storage full: transaction `{id}` was dropped while truncating history"
                    );
                    self.notify(ChangeKind::Truncated(dropped));
                    return Err(TrackerError::Persistence(message));
                }
            }
            self.notify(ChangeKind::Truncated(dropped));
        }
        self.notify(change);
        Ok(())
    }

    /// Writes the transaction document, reclaiming space on quota failures:
    /// first by pruning backups, then, as a last resort, by keeping only the
    /// most recent `history_cap` records.
    /// Returns how many records were dropped.
    fn persist_transactions(&mut self, next: &mut Vec<Transaction>) -> Result<usize> {
        let json = serde_json::to_string(&*next)?;
        match self.set_with_reclaim(TRANSACTIONS_KEY, &json) {
            Ok(()) => return Ok(0),
            Err(err) if err.is_quota_exceeded() => {}
            Err(err) => return Err(err.into()),
        }

        let cap = self.config.storage.history_cap;
        if next.len() <= cap {
            return Err(TrackerError::Persistence(format!(
                "storage full: {} transactions do not fit after pruning backups",
                next.len()
            )));
        }
        let dropped = truncate_history(next, cap);
        warn!(dropped, cap, "storage quota exceeded; truncating transaction history");
        let json = serde_json::to_string(&*next)?;
        self.backend.set(TRANSACTIONS_KEY, &json)?;
        Ok(dropped)
    }

    fn write_document<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.set_with_reclaim(key, &json).map_err(TrackerError::from)
    }

    /// One write, and on quota failure one retry after pruning stored backups.
    fn set_with_reclaim(&mut self, key: &str, json: &str) -> std::result::Result<(), StorageError> {
        match self.backend.set(key, json) {
            Err(err) if err.is_quota_exceeded() => {
                warn!(key, "storage quota exceeded; pruning old backups");
                if key == BACKUPS_KEY {
                    return Err(err);
                }
                let keep = self.config.storage.emergency_backup_retention;
                if self.prune_stored_backups(keep)? == 0 {
                    return Err(err);
                }
                self.backend.set(key, json)
            }
            other => other,
        }
    }

    fn prune_stored_backups(&mut self, keep: usize) -> std::result::Result<usize, StorageError> {
        let Some(raw) = self.backend.get(BACKUPS_KEY)? else {
            return Ok(0);
        };
        let mut backups: Vec<Backup> = match serde_json::from_str(&raw) {
            Ok(backups) => backups,
            Err(err) => {
                warn!(%err, "discarding unreadable backups document");
                self.backend.remove(BACKUPS_KEY)?;
                return Ok(1);
            }
        };
        let pruned = prune_oldest(&mut backups, keep);
        if pruned > 0 {
            let json = serde_json::to_string(&backups)
                .map_err(|err| StorageError::Backend(err.to_string()))?;
            self.backend.set(BACKUPS_KEY, &json)?;
        }
        Ok(pruned)
    }

    fn stored_backups(&self) -> Result<Vec<Backup>> {
        Ok(load_document(self.backend.as_ref(), BACKUPS_KEY)?.unwrap_or_default())
    }

    fn auto_backup(&mut self, reason: &str) {
        if !self.config.auto_backup {
            return;
        }
        if let Err(err) = self.create_backup() {
            warn!(%err, reason, "automatic backup failed");
        }
    }

    fn notify(&mut self, change: ChangeKind) {
        self.observers.notify(&StoreEvent::data_changed(change));
    }
}

impl std::fmt::Debug for TransactionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionStore")
            .field("transactions", &self.transactions.len())
            .field("categories", &self.categories.len())
            .field("budgets", &self.budgets.len())
            .field("observers", &self.observers)
            .finish()
    }
}

fn load_document<T: DeserializeOwned>(
    backend: &(impl KeyValueStore + ?Sized),
    key: &str,
) -> Result<Option<T>> {
    match backend.get(key)? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|err| TrackerError::Persistence(format!("`{key}` snapshot is corrupt: {err}"))),
        None => Ok(None),
    }
}

/// The record a change expects to find in the committed collection.
fn expected_record(change: &ChangeKind) -> Option<&str> {
    match change {
        ChangeKind::Added(id) | ChangeKind::Updated(id) => Some(id),
        _ => None,
    }
}

fn same_entry(a: &Transaction, b: &Transaction) -> bool {
    a.description == b.description && a.amount == b.amount && a.date == b.date
}

/// Keeps the `cap` most recent records (by date, then creation time), preserving
/// their relative order. Returns how many were dropped.
fn truncate_history(transactions: &mut Vec<Transaction>, cap: usize) -> usize {
    if transactions.len() <= cap {
        return 0;
    }
    let mut ranked: Vec<usize> = (0..transactions.len()).collect();
    ranked.sort_by(|&a, &b| {
        let (a, b) = (&transactions[a], &transactions[b]);
        b.date
            .cmp(&a.date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    let keep: HashSet<usize> = ranked.into_iter().take(cap).collect();
    let dropped = transactions.len() - cap;
    let mut index = 0;
    transactions.retain(|_| {
        let kept = keep.contains(&index);
        index += 1;
        kept
    });
    dropped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ledger::{PaymentMethod, TransactionKind},
        utils::time::FixedClock,
    };
    use std::sync::{Arc, Mutex};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn store() -> TransactionStore {
        TransactionStore::open(MemoryStore::new(), FixedClock::on(today())).unwrap()
    }

    fn coffee() -> TransactionDraft {
        TransactionDraft::new("Coffee", 4.5, TransactionKind::Expense, "food", today())
    }

    #[test]
    fn add_assigns_id_timestamps_and_defaults() {
        let mut store = store();
        let txn = store.add(coffee()).unwrap();
        assert!(!txn.id.is_empty());
        assert_eq!(txn.payment_method, PaymentMethod::Cash);
        assert_eq!(txn.created_at, store.clock().now());
        assert_eq!(store.len(), 1);
        assert!(store.backend().get(TRANSACTIONS_KEY).unwrap().is_some());
    }

    #[test]
    fn add_sanitizes_text_fields() {
        let mut store = store();
        let txn = store
            .add(coffee().with_notes("<script>javascript:x</script>"))
            .unwrap();
        assert_eq!(txn.notes.as_deref(), Some("scriptx/script"));
    }

    #[test]
    fn add_rejects_invalid_without_mutating() {
        let mut store = store();
        let mut draft = coffee();
        draft.amount = -1.0;
        let err = store.add(draft).unwrap_err();
        assert!(err.validation_errors().unwrap().contains("amount"));
        assert!(store.is_empty());
        assert!(store.backend().get(TRANSACTIONS_KEY).unwrap().is_none());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut store = store();
        store.add(coffee().with_id("fixed")).unwrap();
        let err = store.add(coffee().with_id("fixed")).unwrap_err();
        assert!(err.validation_errors().unwrap().contains("id"));
    }

    #[test]
    fn update_revalidates_merged_record() {
        let mut store = store();
        let txn = store.add(coffee()).unwrap();
        let bad = TransactionPatch {
            date: Some(today().succ_opt().unwrap()),
            ..TransactionPatch::default()
        };
        let err = store.update(&txn.id, bad).unwrap_err();
        assert!(err.validation_errors().unwrap().contains("date"));
        assert_eq!(store.get(&txn.id).unwrap(), &txn);

        let good = TransactionPatch {
            amount: Some(5.25),
            description: Some("<b>Latte</b>".into()),
            ..TransactionPatch::default()
        };
        let updated = store.update(&txn.id, good).unwrap();
        assert_eq!(updated.amount, 5.25);
        assert_eq!(updated.description, "bLatte/b");
        assert_eq!(updated.created_at, txn.created_at);
    }

    #[test]
    fn update_and_delete_unknown_ids_fail() {
        let mut store = store();
        assert!(matches!(
            store.update("missing", TransactionPatch::default()),
            Err(TrackerError::NotFound(id)) if id == "missing"
        ));
        assert!(matches!(store.delete("missing"), Err(TrackerError::NotFound(_))));
    }

    #[test]
    fn notifies_only_after_successful_commits() {
        let mut store = store();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let sub = store.subscribe(EventKind::DataChanged, move |event: &StoreEvent| {
            sink.lock().unwrap().push(event.change.clone());
        });

        let txn = store.add(coffee()).unwrap();
        let mut invalid = coffee();
        invalid.description = String::new();
        assert!(store.add(invalid).is_err());
        store.delete(&txn.id).unwrap();
        assert!(store.unsubscribe(sub));
        store.add(coffee()).unwrap();

        assert_eq!(
            *events.lock().unwrap(),
            vec![ChangeKind::Added(txn.id.clone()), ChangeKind::Deleted(txn.id)]
        );
    }

    #[test]
    fn quota_failure_keeps_state_and_skips_notification() {
        let mut store = TransactionStore::open(MemoryStore::with_quota(64), FixedClock::on(today()))
            .unwrap();
        let notified = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&notified);
        store.subscribe(EventKind::DataChanged, move |_: &StoreEvent| {
            *counter.lock().unwrap() += 1;
        });
        let err = store.add(coffee()).unwrap_err();
        assert!(matches!(err, TrackerError::Persistence(_)));
        assert!(store.is_empty());
        assert_eq!(*notified.lock().unwrap(), 0);
    }

    #[test]
    fn truncate_history_keeps_most_recent_in_original_order() {
        let mut store = store();
        let mut items = Vec::new();
        for (day, id) in [(3, "c"), (1, "a"), (2, "b"), (4, "d")] {
            let date = NaiveDate::from_ymd_opt(2025, 1, day).unwrap();
            let txn = store
                .build_candidate(
                    TransactionDraft::new("Entry", 1.0, TransactionKind::Expense, "food", date)
                        .with_id(id),
                )
                .unwrap();
            items.push(txn);
        }
        assert_eq!(truncate_history(&mut items, 2), 2);
        let ids: Vec<_> = items.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "d"]);
    }

    #[test]
    fn categories_and_budgets_round_trip_through_backend() {
        let mut store = store();
        store
            .add_category(Category::new("pets", "Pets", TransactionKind::Expense))
            .unwrap();
        assert!(store.add_category(Category::new("pets", "Again", TransactionKind::Expense)).is_err());
        store.set_budget(Budget::new("food", 300.0, 6, 2025)).unwrap();
        store.set_budget(Budget::new("food", 350.0, 6, 2025)).unwrap();
        assert_eq!(store.budgets().len(), 1);
        assert_eq!(store.budgets()[0].amount, 350.0);
        assert!(store.set_budget(Budget::new("food", 10.0, 13, 2025)).is_err());

        let raw_categories = store.backend().get(CATEGORIES_KEY).unwrap().unwrap();
        assert!(raw_categories.contains("\"pets\""));

        store.remove_category("pets").unwrap();
        assert!(store.category("pets").is_none());
        assert!(matches!(store.remove_budget("food", 7, 2025), Err(TrackerError::NotFound(_))));
        store.remove_budget("food", 6, 2025).unwrap();
        assert!(store.budgets().is_empty());
    }
}
