pub mod budget_service;
pub mod health_service;
pub mod projection_service;
pub mod summary_service;

pub use budget_service::{BudgetService, BudgetStatus, BudgetUtilization};
pub use health_service::{Grade, HealthMetrics, HealthReport, HealthService};
pub use projection_service::{
    CompoundInterest, LoanPayment, LoanSchedule, MonthlyProjection, ProjectionService,
    RetirementProjection, RetirementSnapshot, YearlyBalance, DEFAULT_COMPOUNDS_PER_YEAR,
    MAX_COMPOUNDS_PER_YEAR, MAX_PROJECTION_YEARS,
};
pub use summary_service::{
    CategoryStat, CategoryTotal, ExpenseRatio, MonthStat, MonthlyTrend, PaymentMethodStat,
    RangeSummary, Statistics, SummaryService, YearOverYear,
};
