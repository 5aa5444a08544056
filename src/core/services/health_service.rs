use std::fmt;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::ledger::{Transaction, TransactionKind};
use crate::utils::time::same_month;

use super::summary_service::{percent, SummaryService};

/// Months of income history considered for stability.
pub const INCOME_HISTORY_MONTHS: usize = 6;
/// Window, in days, for the average daily expense.
pub const DEBT_WINDOW_DAYS: i64 = 30;

const BASE_SCORE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 90.0 => Grade::APlus,
            s if s >= 80.0 => Grade::A,
            s if s >= 70.0 => Grade::B,
            s if s >= 60.0 => Grade::C,
            s if s >= 50.0 => Grade::D,
            _ => Grade::F,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthMetrics {
    /// Percent of this month's income not spent.
    pub savings_rate: f64,
    /// Percent of this month's expense in the largest category.
    pub expense_concentration: f64,
    /// Population variance of monthly income over the trailing six months.
    pub income_variance: f64,
    pub debt_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub score: f64,
    pub grade: Grade,
    pub feedback: Vec<String>,
    pub metrics: HealthMetrics,
}

pub struct HealthService;

impl HealthService {
    /// Heuristic score for the calendar month containing `today`.
    pub fn score(transactions: &[Transaction], today: NaiveDate) -> HealthReport {
        let metrics = Self::metrics(transactions, today);
        let mut score = BASE_SCORE;
        let mut feedback = Vec::new();

        let (delta, note) = match metrics.savings_rate {
            rate if rate >= 20.0 => (30.0, "Excellent savings rate"),
            rate if rate >= 10.0 => (20.0, "Good savings rate"),
            rate if rate >= 5.0 => (10.0, "Savings rate could be improved"),
            _ => (-10.0, "Try to save at least 5% of your income"),
        };
        score += delta;
        feedback.push(note.to_string());

        let (delta, note) = match metrics.expense_concentration {
            share if share <= 30.0 => (20.0, "Spending is well diversified"),
            share if share <= 50.0 => (10.0, "Spending is moderately concentrated"),
            _ => (-10.0, "Most spending falls in a single category"),
        };
        score += delta;
        feedback.push(note.to_string());

        let (delta, note) = match metrics.income_variance {
            variance if variance <= 0.1 => (25.0, "Income is very stable"),
            variance if variance <= 0.3 => (15.0, "Income is fairly stable"),
            _ => (-15.0, "Income varies considerably month to month"),
        };
        score += delta;
        feedback.push(note.to_string());

        let (delta, note) = match metrics.debt_ratio {
            ratio if ratio <= 0.3 => (25.0, "Expenses are low relative to income"),
            ratio if ratio <= 0.5 => (15.0, "Expenses are manageable relative to income"),
            _ => (-25.0, "Expenses are high relative to income"),
        };
        score += delta;
        feedback.push(note.to_string());

        let score = score.clamp(0.0, 100.0);
        HealthReport {
            score,
            grade: Grade::from_score(score),
            feedback,
            metrics,
        }
    }

    pub fn metrics(transactions: &[Transaction], today: NaiveDate) -> HealthMetrics {
        let this_month: Vec<Transaction> = transactions
            .iter()
            .filter(|txn| same_month(txn.date, today))
            .cloned()
            .collect();
        let income = SummaryService::total_by_type(&this_month, TransactionKind::Income);
        let expense = SummaryService::total_by_type(&this_month, TransactionKind::Expense);

        let savings_rate = if income > 0.0 {
            (income - expense) / income * 100.0
        } else {
            0.0
        };

        let largest = SummaryService::category_totals(&this_month, Some(TransactionKind::Expense))
            .first()
            .map_or(0.0, |entry| entry.total);
        let expense_concentration = percent(largest, expense);

        let monthly_income: Vec<f64> =
            SummaryService::monthly_trends(transactions, INCOME_HISTORY_MONTHS, today)
                .into_iter()
                .map(|trend| trend.income)
                .collect();
        let income_variance = SummaryService::variance(&monthly_income);

        let window_start = today - Duration::days(DEBT_WINDOW_DAYS);
        let recent_expense: f64 = transactions
            .iter()
            .filter(|txn| txn.is_expense() && txn.date > window_start && txn.date <= today)
            .map(|txn| txn.amount)
            .sum();
        let monthly_expense = recent_expense / DEBT_WINDOW_DAYS as f64 * 30.0;
        let divisor = if income > 0.0 { income } else { 1.0 };

        HealthMetrics {
            savings_rate,
            expense_concentration,
            income_variance,
            debt_ratio: monthly_expense / divisor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::PaymentMethod;
    use chrono::Utc;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 20).unwrap()
    }

    fn txn(kind: TransactionKind, amount: f64, category: &str, date: NaiveDate) -> Transaction {
        let now = Utc::now();
        Transaction {
            id: format!("{category}-{date}-{amount}"),
            description: "Entry".into(),
            amount,
            kind,
            category: category.into(),
            date,
            payment_method: PaymentMethod::Cash,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn grade_bands() {
        assert_eq!(Grade::from_score(100.0), Grade::APlus);
        assert_eq!(Grade::from_score(85.0), Grade::A);
        assert_eq!(Grade::from_score(70.0), Grade::B);
        assert_eq!(Grade::from_score(60.0), Grade::C);
        assert_eq!(Grade::from_score(55.0), Grade::D);
        assert_eq!(Grade::from_score(0.0), Grade::F);
        assert_eq!(Grade::APlus.to_string(), "A+");
    }

    #[test]
    fn empty_history_scores_within_bounds() {
        let report = HealthService::score(&[], today());
        // -10 savings, +20 concentration, +25 variance, +25 debt
        assert_eq!(report.score, 100.0);
        assert_eq!(report.grade, Grade::APlus);
        assert_eq!(report.feedback.len(), 4);
        assert_eq!(report.metrics.savings_rate, 0.0);
    }

    #[test]
    fn zero_income_with_heavy_spending_scores_low() {
        let data = vec![
            txn(TransactionKind::Expense, 5000.0, "bills", today()),
            txn(TransactionKind::Income, 900.0, "salary", NaiveDate::from_ymd_opt(2025, 2, 1).unwrap()),
        ];
        let report = HealthService::score(&data, today());
        assert_eq!(report.metrics.savings_rate, 0.0);
        assert_eq!(report.metrics.expense_concentration, 100.0);
        assert!((report.metrics.debt_ratio - 5000.0).abs() < 1e-6);
        assert!(report.metrics.income_variance > 0.3);
        // 100 - 10 - 10 - 15 - 25
        assert_eq!(report.score, 40.0);
        assert_eq!(report.grade, Grade::F);
    }

    #[test]
    fn healthy_month_scores_high() {
        let data = vec![
            txn(TransactionKind::Income, 4000.0, "salary", today()),
            txn(TransactionKind::Expense, 400.0, "food", today()),
            txn(TransactionKind::Expense, 400.0, "bills", today()),
            txn(TransactionKind::Expense, 300.0, "transport", today()),
        ];
        let metrics = HealthService::metrics(&data, today());
        assert!((metrics.savings_rate - 72.5).abs() < 1e-9);
        assert!((metrics.debt_ratio - 1100.0 / 4000.0).abs() < 1e-9);
        let report = HealthService::score(&data, today());
        assert!((0.0..=100.0).contains(&report.score));
    }
}
