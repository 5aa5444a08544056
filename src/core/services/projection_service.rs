//! Forward-looking numeric simulations.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::errors::{Result, ValidationErrors};
use crate::ledger::{Transaction, TransactionKind};
use crate::utils::time::{days_in_month, same_month};

pub const DEFAULT_COMPOUNDS_PER_YEAR: u32 = 12;
/// Longest horizon, in years, any projection accepts.
pub const MAX_PROJECTION_YEARS: u32 = 100;
/// Daily compounding is the finest frequency accepted.
pub const MAX_COMPOUNDS_PER_YEAR: u32 = 366;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyProjection {
    pub days_elapsed: u32,
    pub days_in_month: u32,
    pub income_to_date: f64,
    pub expense_to_date: f64,
    pub daily_income: f64,
    pub daily_expense: f64,
    pub projected_income: f64,
    pub projected_expense: f64,
    pub projected_net: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyBalance {
    pub year: u32,
    pub amount: f64,
    pub interest: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompoundInterest {
    pub principal: f64,
    pub amount: f64,
    pub interest: f64,
    pub yearly: Vec<YearlyBalance>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoanPayment {
    pub month: u32,
    pub payment: f64,
    pub interest: f64,
    pub principal: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoanSchedule {
    pub monthly_payment: f64,
    pub total_paid: f64,
    pub total_interest: f64,
    pub payments: Vec<LoanPayment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetirementSnapshot {
    pub age: u32,
    pub year: u32,
    pub total: f64,
    pub contributions: f64,
    pub growth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetirementProjection {
    pub final_balance: f64,
    pub total_contributions: f64,
    pub total_growth: f64,
    pub snapshots: Vec<RetirementSnapshot>,
}

pub struct ProjectionService;

impl ProjectionService {
    /// Extrapolates the current month's daily averages to month end.
    pub fn monthly_projection(transactions: &[Transaction], today: NaiveDate) -> MonthlyProjection {
        let days_elapsed = today.day().max(1);
        let month_days = days_in_month(today.year(), today.month());
        let (income, expense) = transactions
            .iter()
            .filter(|txn| same_month(txn.date, today) && txn.date <= today)
            .fold((0.0, 0.0), |(income, expense), txn| match txn.kind {
                TransactionKind::Income => (income + txn.amount, expense),
                TransactionKind::Expense => (income, expense + txn.amount),
            });
        let daily_income = income / days_elapsed as f64;
        let daily_expense = expense / days_elapsed as f64;
        let projected_income = daily_income * month_days as f64;
        let projected_expense = daily_expense * month_days as f64;
        MonthlyProjection {
            days_elapsed,
            days_in_month: month_days,
            income_to_date: income,
            expense_to_date: expense,
            daily_income,
            daily_expense,
            projected_income,
            projected_expense,
            projected_net: projected_income - projected_expense,
        }
    }

    /// `principal * (1 + r/n)^(n*years)` with a cumulative entry for each whole year.
    pub fn compound_interest(
        principal: f64,
        annual_rate_percent: f64,
        years: u32,
        compounds_per_year: u32,
    ) -> Result<CompoundInterest> {
        let mut errors = ValidationErrors::new();
        check_amount(&mut errors, "principal", principal);
        check_rate(&mut errors, annual_rate_percent);
        if !(1..=MAX_COMPOUNDS_PER_YEAR).contains(&compounds_per_year) {
            errors.add(
                "compoundsPerYear",
                format!("Compounding frequency must be between 1 and {MAX_COMPOUNDS_PER_YEAR}"),
            );
        }
        check_years(&mut errors, "years", years);
        errors.into_result()?;

        let periodic = annual_rate_percent / 100.0 / compounds_per_year as f64;
        let amount_after = |years: u32| {
            principal * (1.0 + periodic).powf((compounds_per_year * years) as f64)
        };
        let yearly = (1..=years)
            .map(|year| {
                let amount = amount_after(year);
                YearlyBalance {
                    year,
                    amount,
                    interest: amount - principal,
                }
            })
            .collect();
        let amount = amount_after(years);
        Ok(CompoundInterest {
            principal,
            amount,
            interest: amount - principal,
            yearly,
        })
    }

    /// Fixed-payment schedule, one row per month. A zero rate pays down straight-line.
    pub fn loan_amortization(
        principal: f64,
        annual_rate_percent: f64,
        years: u32,
    ) -> Result<LoanSchedule> {
        let mut errors = ValidationErrors::new();
        check_amount(&mut errors, "principal", principal);
        check_rate(&mut errors, annual_rate_percent);
        if years == 0 {
            errors.add("years", "Loan term must be at least 1 year");
        } else {
            check_years(&mut errors, "years", years);
        }
        errors.into_result()?;

        let months = years * 12;
        let rate = annual_rate_percent / 100.0 / 12.0;
        let monthly_payment = annuity_payment(principal, rate, months);

        let mut balance = principal;
        let payments: Vec<LoanPayment> = (1..=months)
            .map(|month| {
                let interest = balance * rate;
                let principal_part = monthly_payment - interest;
                balance = (balance - principal_part).max(0.0);
                LoanPayment {
                    month,
                    payment: monthly_payment,
                    interest,
                    principal: principal_part,
                    balance,
                }
            })
            .collect();

        let total_paid = monthly_payment * months as f64;
        Ok(LoanSchedule {
            monthly_payment,
            total_paid,
            total_interest: total_paid - principal,
            payments,
        })
    }

    /// Monthly loop: contribute, then grow. One snapshot per completed year.
    pub fn retirement_projection(
        current_age: u32,
        retirement_age: u32,
        current_savings: f64,
        monthly_contribution: f64,
        expected_annual_return_percent: f64,
    ) -> Result<RetirementProjection> {
        let mut errors = ValidationErrors::new();
        if retirement_age <= current_age {
            errors.add("retirementAge", "Retirement age must be after the current age");
        }
        check_amount(&mut errors, "currentSavings", current_savings);
        check_amount(&mut errors, "monthlyContribution", monthly_contribution);
        check_rate(&mut errors, expected_annual_return_percent);
        if retirement_age > current_age {
            check_years(&mut errors, "retirementAge", retirement_age - current_age);
        }
        errors.into_result()?;

        let years = retirement_age - current_age;
        let monthly_rate = expected_annual_return_percent / 100.0 / 12.0;
        let mut total = current_savings;
        let mut contributions = 0.0;
        let mut snapshots = Vec::with_capacity(years as usize);

        for month in 1..=years * 12 {
            total += monthly_contribution;
            contributions += monthly_contribution;
            total *= 1.0 + monthly_rate;
            if month % 12 == 0 {
                let year = month / 12;
                snapshots.push(RetirementSnapshot {
                    age: current_age + year,
                    year,
                    total,
                    contributions,
                    growth: total - current_savings - contributions,
                });
            }
        }

        Ok(RetirementProjection {
            final_balance: total,
            total_contributions: contributions,
            total_growth: total - current_savings - contributions,
            snapshots,
        })
    }
}

/// Level payment that clears `principal` over `months`. Falls back to
/// straight-line when the rate is too small to move the compounding factor,
/// and to interest-only when the factor overflows.
fn annuity_payment(principal: f64, monthly_rate: f64, months: u32) -> f64 {
    if monthly_rate > 0.0 {
        let factor = (1.0 + monthly_rate).powf(months as f64);
        if factor.is_infinite() {
            return principal * monthly_rate;
        }
        let growth = factor - 1.0;
        if growth > 0.0 {
            return principal * monthly_rate * factor / growth;
        }
    }
    principal / months as f64
}

fn check_years(errors: &mut ValidationErrors, field: &str, years: u32) {
    if years > MAX_PROJECTION_YEARS {
        errors.add(
            field,
            format!("Projection horizon cannot exceed {MAX_PROJECTION_YEARS} years"),
        );
    }
}

fn check_amount(errors: &mut ValidationErrors, field: &str, value: f64) {
    if !value.is_finite() || value < 0.0 {
        errors.add(field, "Amount must be a non-negative number");
    }
}

fn check_rate(errors: &mut ValidationErrors, percent: f64) {
    if !percent.is_finite() || percent < 0.0 {
        errors.add("rate", "Rate must be a non-negative percentage");
    }
}
