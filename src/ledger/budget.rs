use serde::{Deserialize, Serialize};

/// A monthly spending limit for one category. Utilization is always computed on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub category: String,
    pub amount: f64,
    pub month: u32,
    pub year: i32,
}

impl Budget {
    pub fn new(category: impl Into<String>, amount: f64, month: u32, year: i32) -> Self {
        Self {
            category: category.into(),
            amount,
            month,
            year,
        }
    }

    /// Budgets are keyed by category and calendar month.
    pub fn same_slot(&self, other: &Budget) -> bool {
        self.category == other.category && self.month == other.month && self.year == other.year
    }
}
