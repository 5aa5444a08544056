use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    ledger::{Budget, Category, Transaction},
};

pub const BACKUP_FORMAT_VERSION: &str = "1.0";

/// Whole-store snapshot kept under the `backups` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    pub timestamp: DateTime<Utc>,
    pub transactions: Vec<Transaction>,
    pub categories: Vec<Category>,
    pub budgets: Vec<Budget>,
    pub settings: Config,
    pub version: String,
}

/// Drops the oldest backups until at most `keep` remain. Returns how many were removed.
pub fn prune_oldest(backups: &mut Vec<Backup>, keep: usize) -> usize {
    if backups.len() <= keep {
        return 0;
    }
    backups.sort_by_key(|backup| backup.timestamp);
    let excess = backups.len() - keep;
    backups.drain(..excess);
    excess
}
