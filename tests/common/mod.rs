#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicI64, Ordering},
    Mutex,
};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use finance_core::{
    config::ConfigManager,
    core::TransactionStore,
    ledger::{TransactionDraft, TransactionKind},
    storage::{JsonFileStore, MemoryStore},
    utils::time::{Clock, FixedClock},
};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
}

/// Clock starting at noon on [`today`] that advances one second per reading,
/// so successive backups get distinct timestamps.
#[derive(Debug)]
pub struct SteppingClock {
    start: DateTime<Utc>,
    ticks: AtomicI64,
}

impl SteppingClock {
    pub fn new() -> Self {
        Self {
            start: FixedClock::on(today()).now(),
            ticks: AtomicI64::new(0),
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        self.start + Duration::seconds(self.ticks.fetch_add(1, Ordering::SeqCst))
    }
}

pub fn memory_store() -> TransactionStore {
    TransactionStore::open(MemoryStore::new(), SteppingClock::new()).expect("open memory store")
}

/// Creates an isolated base directory for each test.
pub fn temp_base() -> std::path::PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// Opens a file-backed store plus config manager rooted in a fresh temp directory.
pub fn setup_test_env() -> (TransactionStore, ConfigManager) {
    let base = temp_base();
    let config_manager =
        ConfigManager::with_base_dir(base).expect("create config manager for temp dir");
    let store = open_file_store(&config_manager);
    (store, config_manager)
}

pub fn open_file_store(config_manager: &ConfigManager) -> TransactionStore {
    let backend = JsonFileStore::new(config_manager.data_dir()).expect("create json backend");
    TransactionStore::open(backend, FixedClock::on(today())).expect("open file store")
}

pub fn expense(description: &str, amount: f64, category: &str, date: NaiveDate) -> TransactionDraft {
    TransactionDraft::new(description, amount, TransactionKind::Expense, category, date)
}

pub fn income(description: &str, amount: f64, category: &str, date: NaiveDate) -> TransactionDraft {
    TransactionDraft::new(description, amount, TransactionKind::Income, category, date)
}

pub fn days_ago(days: i64) -> NaiveDate {
    today() - Duration::days(days)
}
