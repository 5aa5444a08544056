use chrono::Datelike;
use serde::Serialize;

use crate::ledger::{Budget, Transaction};

use super::summary_service::percent;

/// Percentage of a budget at which spending is flagged as near the limit.
pub const NEAR_LIMIT_PERCENT: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BudgetStatus {
    UnderBudget,
    NearLimit,
    OverBudget,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetUtilization {
    pub budget: Budget,
    pub spent: f64,
    pub remaining: f64,
    pub percentage: f64,
    pub status: BudgetStatus,
}

pub struct BudgetService;

impl BudgetService {
    /// Spending against each budget set for `month`/`year`, in budget order.
    pub fn utilization(
        budgets: &[Budget],
        transactions: &[Transaction],
        month: u32,
        year: i32,
    ) -> Vec<BudgetUtilization> {
        budgets
            .iter()
            .filter(|budget| budget.month == month && budget.year == year)
            .map(|budget| {
                let spent: f64 = transactions
                    .iter()
                    .filter(|txn| {
                        txn.is_expense()
                            && txn.category == budget.category
                            && txn.date.month() == month
                            && txn.date.year() == year
                    })
                    .map(|txn| txn.amount)
                    .sum();
                let percentage = percent(spent, budget.amount);
                BudgetUtilization {
                    budget: budget.clone(),
                    spent,
                    remaining: budget.amount - spent,
                    percentage,
                    status: Self::status(percentage),
                }
            })
            .collect()
    }

    pub fn status(percentage: f64) -> BudgetStatus {
        if percentage > 100.0 {
            BudgetStatus::OverBudget
        } else if percentage >= NEAR_LIMIT_PERCENT {
            BudgetStatus::NearLimit
        } else {
            BudgetStatus::UnderBudget
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{PaymentMethod, TransactionKind};
    use chrono::{NaiveDate, Utc};

    fn spend(category: &str, amount: f64, month: u32) -> Transaction {
        let now = Utc::now();
        Transaction {
            id: format!("{category}-{month}-{amount}"),
            description: "Spend".into(),
            amount,
            kind: TransactionKind::Expense,
            category: category.into(),
            date: NaiveDate::from_ymd_opt(2025, month, 3).unwrap(),
            payment_method: PaymentMethod::Debit,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn statuses_follow_thresholds() {
        assert_eq!(BudgetService::status(10.0), BudgetStatus::UnderBudget);
        assert_eq!(BudgetService::status(80.0), BudgetStatus::NearLimit);
        assert_eq!(BudgetService::status(100.0), BudgetStatus::NearLimit);
        assert_eq!(BudgetService::status(100.5), BudgetStatus::OverBudget);
    }

    #[test]
    fn only_counts_matching_month_and_category() {
        let budgets = vec![
            Budget::new("food", 200.0, 5, 2025),
            Budget::new("bills", 100.0, 5, 2025),
            Budget::new("food", 200.0, 6, 2025),
        ];
        let txns = vec![
            spend("food", 90.0, 5),
            spend("food", 80.0, 5),
            spend("food", 500.0, 4),
            spend("bills", 120.0, 5),
        ];
        let report = BudgetService::utilization(&budgets, &txns, 5, 2025);
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].spent, 170.0);
        assert_eq!(report[0].remaining, 30.0);
        assert_eq!(report[0].status, BudgetStatus::NearLimit);
        assert_eq!(report[1].status, BudgetStatus::OverBudget);
        assert_eq!(report[1].remaining, -20.0);
    }
}
