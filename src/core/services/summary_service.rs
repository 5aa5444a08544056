use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::ledger::{PaymentMethod, Transaction, TransactionKind};
use crate::utils::time::{month_key, month_label, month_start, same_month, shift_month};

/// Number of categories reported in [`Statistics::top_categories`].
pub const TOP_CATEGORY_COUNT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStat {
    pub category: String,
    pub kind: TransactionKind,
    pub total: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonthStat {
    pub income: f64,
    pub expense: f64,
    pub net: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentMethodStat {
    pub method: PaymentMethod,
    pub total: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Statistics {
    pub total_income: f64,
    pub total_expense: f64,
    pub net: f64,
    pub count: usize,
    pub income_count: usize,
    pub expense_count: usize,
    /// First-seen order.
    pub by_category: Vec<CategoryStat>,
    /// Keyed by `YYYY-MM`.
    pub by_month: BTreeMap<String, MonthStat>,
    /// First-seen order.
    pub by_payment_method: Vec<PaymentMethodStat>,
    pub income_percentage: f64,
    pub expense_percentage: f64,
    pub top_categories: Vec<CategoryTotal>,
    pub average_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTrend {
    pub month: String,
    pub label: String,
    pub income: f64,
    pub expense: f64,
    pub net: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseRatio {
    pub category: String,
    pub amount: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearOverYear {
    pub year: i32,
    pub income: f64,
    pub expense: f64,
    pub previous_income: f64,
    pub previous_expense: f64,
    pub income_growth: f64,
    pub expense_growth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeSummary {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub income: f64,
    pub expense: f64,
    pub balance: f64,
    pub count: usize,
}

/// Pure rollups over a transaction snapshot.
pub struct SummaryService;

impl SummaryService {
    pub fn balance(transactions: &[Transaction]) -> f64 {
        Self::total_by_type(transactions, TransactionKind::Income)
            - Self::total_by_type(transactions, TransactionKind::Expense)
    }

    pub fn total_by_type(transactions: &[Transaction], kind: TransactionKind) -> f64 {
        transactions
            .iter()
            .filter(|txn| txn.kind == kind)
            .map(|txn| txn.amount)
            .sum()
    }

    /// Per-category sums, largest first. Equal sums keep first-seen order.
    pub fn category_totals(
        transactions: &[Transaction],
        kind: Option<TransactionKind>,
    ) -> Vec<CategoryTotal> {
        let mut totals: Vec<CategoryTotal> = Vec::new();
        for txn in transactions
            .iter()
            .filter(|txn| kind.map_or(true, |kind| txn.kind == kind))
        {
            match totals.iter_mut().find(|entry| entry.category == txn.category) {
                Some(entry) => entry.total += txn.amount,
                None => totals.push(CategoryTotal {
                    category: txn.category.clone(),
                    total: txn.amount,
                }),
            }
        }
        sort_desc(&mut totals);
        totals
    }

    pub fn statistics(transactions: &[Transaction]) -> Statistics {
        let mut stats = Statistics {
            count: transactions.len(),
            ..Statistics::default()
        };

        for txn in transactions {
            let month = stats.by_month.entry(month_key(txn.date)).or_default();
            match txn.kind {
                TransactionKind::Income => {
                    stats.total_income += txn.amount;
                    stats.income_count += 1;
                    month.income += txn.amount;
                }
                TransactionKind::Expense => {
                    stats.total_expense += txn.amount;
                    stats.expense_count += 1;
                    month.expense += txn.amount;
                }
            }
            month.net = month.income - month.expense;

            // Keyed on category alone; the first transaction seen fixes the kind.
            match stats
                .by_category
                .iter_mut()
                .find(|entry| entry.category == txn.category)
            {
                Some(entry) => {
                    entry.total += txn.amount;
                    entry.count += 1;
                }
                None => stats.by_category.push(CategoryStat {
                    category: txn.category.clone(),
                    kind: txn.kind,
                    total: txn.amount,
                    count: 1,
                }),
            }

            match stats
                .by_payment_method
                .iter_mut()
                .find(|entry| entry.method == txn.payment_method)
            {
                Some(entry) => {
                    entry.total += txn.amount;
                    entry.count += 1;
                }
                None => stats.by_payment_method.push(PaymentMethodStat {
                    method: txn.payment_method,
                    total: txn.amount,
                    count: 1,
                }),
            }
        }

        stats.net = stats.total_income - stats.total_expense;
        let flow = stats.total_income + stats.total_expense;
        if flow > 0.0 {
            stats.income_percentage = percent(stats.total_income, flow);
            stats.expense_percentage = percent(stats.total_expense, flow);
        }
        if stats.count > 0 {
            stats.average_amount = flow / stats.count as f64;
        }

        let mut top: Vec<CategoryTotal> = stats
            .by_category
            .iter()
            .map(|entry| CategoryTotal {
                category: entry.category.clone(),
                total: entry.total,
            })
            .collect();
        sort_desc(&mut top);
        top.truncate(TOP_CATEGORY_COUNT);
        stats.top_categories = top;
        stats
    }

    /// One entry per month for the `months` months ending with `today`'s month,
    /// oldest first. Months without activity are reported as zeros.
    pub fn monthly_trends(
        transactions: &[Transaction],
        months: usize,
        today: NaiveDate,
    ) -> Vec<MonthlyTrend> {
        let current = month_start(today);
        (0..months)
            .rev()
            .map(|back| {
                let start = shift_month(current, -(back as i32));
                let (income, expense) = transactions
                    .iter()
                    .filter(|txn| same_month(txn.date, start))
                    .fold((0.0, 0.0), |(income, expense), txn| match txn.kind {
                        TransactionKind::Income => (income + txn.amount, expense),
                        TransactionKind::Expense => (income, expense + txn.amount),
                    });
                MonthlyTrend {
                    month: month_key(start),
                    label: month_label(start),
                    income,
                    expense,
                    net: income - expense,
                }
            })
            .collect()
    }

    /// Share of total expense per category. Empty when there is no expense.
    pub fn expense_ratios(transactions: &[Transaction]) -> Vec<ExpenseRatio> {
        let total = Self::total_by_type(transactions, TransactionKind::Expense);
        if total == 0.0 {
            return Vec::new();
        }
        Self::category_totals(transactions, Some(TransactionKind::Expense))
            .into_iter()
            .map(|entry| ExpenseRatio {
                percentage: percent(entry.total, total),
                category: entry.category,
                amount: entry.total,
            })
            .collect()
    }

    /// Compares `year` (the year of `today` when omitted) with the one before it.
    pub fn year_over_year_growth(
        transactions: &[Transaction],
        year: Option<i32>,
        today: NaiveDate,
    ) -> YearOverYear {
        let year = year.unwrap_or_else(|| today.year());
        let totals = |year: i32, kind: TransactionKind| -> f64 {
            transactions
                .iter()
                .filter(|txn| txn.kind == kind && txn.date.year() == year)
                .map(|txn| txn.amount)
                .sum()
        };
        let income = totals(year, TransactionKind::Income);
        let expense = totals(year, TransactionKind::Expense);
        let previous_income = totals(year - 1, TransactionKind::Income);
        let previous_expense = totals(year - 1, TransactionKind::Expense);
        YearOverYear {
            year,
            income,
            expense,
            previous_income,
            previous_expense,
            income_growth: growth(income, previous_income),
            expense_growth: growth(expense, previous_expense),
        }
    }

    /// Population variance. Zero for an empty series.
    pub fn variance(values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        values.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / n
    }

    /// Totals for the inclusive window `from..=to`.
    pub fn date_range_summary(
        transactions: &[Transaction],
        from: NaiveDate,
        to: NaiveDate,
    ) -> RangeSummary {
        let window: Vec<Transaction> = transactions
            .iter()
            .filter(|txn| txn.date >= from && txn.date <= to)
            .cloned()
            .collect();
        let income = Self::total_by_type(&window, TransactionKind::Income);
        let expense = Self::total_by_type(&window, TransactionKind::Expense);
        RangeSummary {
            from,
            to,
            income,
            expense,
            balance: income - expense,
            count: window.len(),
        }
    }
}

/// Percentage change from `previous` to `current`.
pub fn growth(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        if current > 0.0 {
            100.0
        } else {
            0.0
        }
    } else {
        (current - previous) / previous * 100.0
    }
}

pub(crate) fn percent(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part / whole * 100.0
    }
}

fn sort_desc(totals: &mut [CategoryTotal]) {
    totals.sort_by(|a, b| b.total.total_cmp(&a.total));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn txn(kind: TransactionKind, amount: f64, category: &str, date: NaiveDate) -> Transaction {
        let now = Utc::now();
        Transaction {
            id: format!("{category}-{amount}-{date}"),
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

    fn sample() -> Vec<Transaction> {
        use TransactionKind::{Expense, Income};
        vec![
            txn(Income, 3000.0, "salary", date(2025, 3, 1)),
            txn(Expense, 100.0, "food", date(2025, 3, 4)),
            txn(Expense, 250.0, "bills", date(2025, 3, 5)),
            txn(Expense, 150.0, "food", date(2025, 1, 9)),
            txn(Expense, 250.0, "transport", date(2025, 2, 9)),
        ]
    }

    #[test]
    fn balance_is_income_minus_expense() {
        let data = sample();
        assert_eq!(SummaryService::balance(&data), 3000.0 - 750.0);
        assert_eq!(SummaryService::balance(&[]), 0.0);
    }

    #[test]
    fn category_totals_sort_desc_with_stable_ties() {
        let totals = SummaryService::category_totals(&sample(), Some(TransactionKind::Expense));
        let names: Vec<_> = totals.iter().map(|t| t.category.as_str()).collect();
        assert_eq!(names, vec!["food", "bills", "transport"]);
        let sum: f64 = totals.iter().map(|t| t.total).sum();
        assert_eq!(sum, SummaryService::total_by_type(&sample(), TransactionKind::Expense));
    }

    #[test]
    fn statistics_single_pass() {
        let stats = SummaryService::statistics(&sample());
        assert_eq!(stats.count, 5);
        assert_eq!(stats.income_count, 1);
        assert_eq!(stats.expense_count, 4);
        assert_eq!(stats.by_month["2025-03"].net, 2650.0);
        assert_eq!(stats.by_month.len(), 3);
        assert_eq!(stats.by_payment_method.len(), 1);
        assert_eq!(stats.top_categories[0].category, "salary");
        assert!((stats.income_percentage + stats.expense_percentage - 100.0).abs() < 1e-9);
        assert_eq!(stats.average_amount, 3750.0 / 5.0);
    }

    #[test]
    fn empty_statistics_are_zero() {
        let stats = SummaryService::statistics(&[]);
        assert_eq!(stats.average_amount, 0.0);
        assert_eq!(stats.income_percentage, 0.0);
        assert!(stats.top_categories.is_empty());
    }

    #[test]
    fn monthly_trends_fill_gaps_oldest_first() {
        let trends = SummaryService::monthly_trends(&sample(), 4, date(2025, 3, 20));
        let months: Vec<_> = trends.iter().map(|t| t.month.as_str()).collect();
        assert_eq!(months, vec!["2024-12", "2025-01", "2025-02", "2025-03"]);
        assert_eq!(trends[0].income, 0.0);
        assert_eq!(trends[0].expense, 0.0);
        assert_eq!(trends[3].label, "Mar 2025");
        assert_eq!(trends[3].expense, 350.0);
    }

    #[test]
    fn expense_ratios_empty_without_expense() {
        let income_only = vec![txn(TransactionKind::Income, 10.0, "salary", date(2025, 1, 1))];
        assert!(SummaryService::expense_ratios(&income_only).is_empty());
        let ratios = SummaryService::expense_ratios(&sample());
        assert_eq!(ratios[0].category, "food");
        assert!((ratios[0].percentage - 250.0 / 750.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn growth_edge_cases() {
        assert_eq!(growth(0.0, 0.0), 0.0);
        assert_eq!(growth(50.0, 0.0), 100.0);
        assert_eq!(growth(150.0, 100.0), 50.0);
        assert_eq!(growth(50.0, 100.0), -50.0);

        let mut data = sample();
        data.push(txn(TransactionKind::Income, 1500.0, "salary", date(2024, 6, 1)));
        let yoy = SummaryService::year_over_year_growth(&data, Some(2025), date(2026, 2, 1));
        assert_eq!(yoy.year, 2025);
        assert_eq!(yoy.income_growth, 100.0);
        assert_eq!(yoy.expense_growth, 100.0);

        let current = SummaryService::year_over_year_growth(&data, None, date(2025, 9, 30));
        assert_eq!(current, yoy);
    }

    #[test]
    fn variance_is_population_variance() {
        assert_eq!(SummaryService::variance(&[]), 0.0);
        assert_eq!(SummaryService::variance(&[7.0]), 0.0);
        assert!((SummaryService::variance(&[1.0, 2.0, 3.0]) - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn date_range_is_inclusive() {
        let summary =
            SummaryService::date_range_summary(&sample(), date(2025, 3, 1), date(2025, 3, 4));
        assert_eq!(summary.count, 2);
        assert_eq!(summary.balance, 2900.0);
    }
}
