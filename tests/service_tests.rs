mod common;

use common::{days_ago, expense, income, memory_store, today};
use finance_core::{
    core::services::{
        BudgetService, BudgetStatus, HealthService, ProjectionService, SummaryService,
        DEFAULT_COMPOUNDS_PER_YEAR,
    },
    ledger::Budget,
};

#[test]
fn compound_interest_example() {
    let result =
        ProjectionService::compound_interest(1000.0, 5.0, 2, DEFAULT_COMPOUNDS_PER_YEAR).unwrap();
    let expected = 1000.0 * (1.0f64 + 0.05 / 12.0).powi(24);
    assert!((result.amount - expected).abs() < 1e-6);
    assert!((result.amount - 1104.94).abs() < 0.01);
}

#[test]
fn zero_rate_loan_example() {
    let schedule = ProjectionService::loan_amortization(1200.0, 0.0, 1).unwrap();
    assert_eq!(schedule.payments.len(), 12);
    for payment in &schedule.payments {
        assert_eq!(payment.payment, 100.0);
        assert_eq!(payment.interest, 0.0);
        assert_eq!(payment.principal, 100.0);
    }
}

#[test]
fn health_score_stays_in_bounds_for_extreme_inputs() {
    let mut store = memory_store();
    assert!((0.0..=100.0).contains(&HealthService::score(store.transactions(), today()).score));

    store.add(expense("Car repair", 999_999.0, "transport", today())).unwrap();
    let report = HealthService::score(store.transactions(), today());
    assert!((0.0..=100.0).contains(&report.score));

    store.add(income("Bonus", 1_000_000.0, "salary", days_ago(40))).unwrap();
    store.add(income("Tip", 0.01, "other-income", today())).unwrap();
    let report = HealthService::score(store.transactions(), today());
    assert!((0.0..=100.0).contains(&report.score));
    assert_eq!(report.feedback.len(), 4);
}

#[test]
fn trends_and_budgets_over_store_snapshot() {
    let mut store = memory_store();
    store.add(income("Salary", 3000.0, "salary", today())).unwrap();
    store.add(expense("Groceries", 170.0, "food", today())).unwrap();
    store.add(expense("Old groceries", 50.0, "food", days_ago(70))).unwrap();
    store.set_budget(Budget::new("food", 200.0, 6, 2025)).unwrap();

    let trends = SummaryService::monthly_trends(store.transactions(), 6, today());
    assert_eq!(trends.len(), 6);
    assert_eq!(trends.last().unwrap().label, "Jun 2025");
    assert_eq!(trends.iter().filter(|t| t.expense == 0.0).count(), 4);

    let usage = BudgetService::utilization(store.budgets(), store.transactions(), 6, 2025);
    assert_eq!(usage.len(), 1);
    assert_eq!(usage[0].status, BudgetStatus::NearLimit);
    assert_eq!(usage[0].spent, 170.0);
}
