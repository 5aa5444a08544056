//! Free-text normalization and full-record validation for transactions.
//!
//! Sanitization is display-safety normalization only; it is not an injection defense.

use chrono::{Months, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    errors::ValidationErrors,
    ledger::{Transaction, TransactionPatch},
};

pub const MAX_TEXT_LENGTH: usize = 1000;
pub const MIN_DESCRIPTION_LENGTH: usize = 2;
pub const MAX_DESCRIPTION_LENGTH: usize = 100;
pub const MAX_NOTES_LENGTH: usize = 500;
pub const MAX_AMOUNT: f64 = 1_000_000.0;
pub const MAX_AGE_MONTHS: u32 = 120;

static UNSAFE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"(?i)javascript\s*:", r"(?i)\bon[a-z]{3,}\s*="]
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
});

/// Strips angle brackets, `javascript:` prefixes and inline handler assignments
/// (`onclick=`), trims, and truncates to [`MAX_TEXT_LENGTH`] characters.
pub fn sanitize_text(input: &str) -> String {
    let mut text: String = input.chars().filter(|c| !matches!(c, '<' | '>')).collect();
    // Removing one match can splice together another (`javajavascript:script:`).
    loop {
        let mut changed = false;
        for pattern in UNSAFE_PATTERNS.iter() {
            if pattern.is_match(&text) {
                text = pattern.replace_all(&text, "").into_owned();
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    text.trim().chars().take(MAX_TEXT_LENGTH).collect()
}

/// Normalizes every free-text field of a record about to be created.
pub fn sanitize_transaction(txn: &mut Transaction) {
    txn.description = sanitize_text(&txn.description);
    txn.category = sanitize_text(&txn.category);
    txn.notes = txn.notes.as_deref().map(sanitize_text).filter(|n| !n.is_empty());
}

/// Normalizes only the text fields present in a patch.
pub fn sanitize_patch(patch: &mut TransactionPatch) {
    if let Some(description) = patch.description.as_mut() {
        *description = sanitize_text(description);
    }
    if let Some(category) = patch.category.as_mut() {
        *category = sanitize_text(category);
    }
    if let Some(notes) = patch.notes.as_mut() {
        *notes = sanitize_text(notes);
    }
}

/// Earliest date accepted relative to `today`.
pub fn earliest_allowed_date(today: NaiveDate) -> NaiveDate {
    today
        .checked_sub_months(Months::new(MAX_AGE_MONTHS))
        .unwrap_or(NaiveDate::MIN)
}

/// Validates a complete candidate record against `today`.
pub fn validate_transaction(txn: &Transaction, today: NaiveDate) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if txn.id.trim().is_empty() {
        errors.add("id", "Identifier cannot be empty");
    }

    let description_len = txn.description.trim().chars().count();
    if description_len == 0 {
        errors.add("description", "Description is required");
    } else if description_len < MIN_DESCRIPTION_LENGTH {
        errors.add(
            "description",
            format!("Description must be at least {MIN_DESCRIPTION_LENGTH} characters"),
        );
    } else if description_len > MAX_DESCRIPTION_LENGTH {
        errors.add(
            "description",
            format!("Description must be {MAX_DESCRIPTION_LENGTH} characters or fewer"),
        );
    }

    if !txn.amount.is_finite() || txn.amount <= 0.0 {
        errors.add("amount", "Amount must be greater than 0");
    } else if txn.amount > MAX_AMOUNT {
        errors.add("amount", "Amount cannot exceed 1,000,000");
    }

    if txn.category.trim().is_empty() {
        errors.add("category", "Category is required");
    }

    if txn.date > today {
        errors.add("date", "Date cannot be in the future");
    } else if txn.date < earliest_allowed_date(today) {
        errors.add("date", "Date cannot be more than 10 years in the past");
    }

    if let Some(notes) = &txn.notes {
        if notes.chars().count() > MAX_NOTES_LENGTH {
            errors.add(
                "notes",
                format!("Notes must be {MAX_NOTES_LENGTH} characters or fewer"),
            );
        }
    }

    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{PaymentMethod, TransactionKind};
    use chrono::Utc;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn valid() -> Transaction {
        let now = Utc::now();
        Transaction {
            id: "abc".into(),
            description: "Coffee".into(),
            amount: 4.5,
            kind: TransactionKind::Expense,
            category: "food".into(),
            date: today(),
            payment_method: PaymentMethod::Cash,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn strips_markup_and_script_fragments() {
        assert_eq!(sanitize_text("<b>Lunch</b>"), "bLunch/b");
        assert_eq!(sanitize_text("JavaScript:alert(1)"), "alert(1)");
        assert_eq!(sanitize_text("img onerror=boom"), "img boom");
        assert_eq!(sanitize_text("javajavascript:script:x"), "x");
        assert_eq!(sanitize_text("  padded  "), "padded");
    }

    #[test]
    fn ordinary_words_survive() {
        assert_eq!(sanitize_text("Donation to charity"), "Donation to charity");
        assert_eq!(sanitize_text("one = two"), "one = two");
    }

    #[test]
    fn truncates_long_text() {
        let long = "x".repeat(MAX_TEXT_LENGTH + 50);
        assert_eq!(sanitize_text(&long).chars().count(), MAX_TEXT_LENGTH);
    }

    #[test]
    fn accepts_valid_record() {
        assert!(validate_transaction(&valid(), today()).is_ok());
    }

    #[test]
    fn reports_each_failing_field() {
        let mut txn = valid();
        txn.description = "x".into();
        txn.amount = 0.0;
        txn.category = "  ".into();
        txn.notes = Some("n".repeat(MAX_NOTES_LENGTH + 1));
        let errors = validate_transaction(&txn, today()).unwrap_err();
        for field in ["description", "amount", "category", "notes"] {
            assert!(errors.contains(field), "missing error for {field}");
        }
        assert!(!errors.contains("date"));
    }

    #[test]
    fn amount_bounds() {
        let mut txn = valid();
        txn.amount = MAX_AMOUNT;
        assert!(validate_transaction(&txn, today()).is_ok());
        txn.amount = MAX_AMOUNT + 0.01;
        assert!(validate_transaction(&txn, today()).is_err());
        txn.amount = f64::NAN;
        assert!(validate_transaction(&txn, today()).is_err());
    }

    #[test]
    fn date_window_is_relative_to_today() {
        let mut txn = valid();
        txn.date = today().succ_opt().unwrap();
        let errors = validate_transaction(&txn, today()).unwrap_err();
        assert_eq!(errors.get("date"), Some("Date cannot be in the future"));

        txn.date = NaiveDate::from_ymd_opt(2015, 6, 15).unwrap();
        assert!(validate_transaction(&txn, today()).is_ok());
        txn.date = NaiveDate::from_ymd_opt(2015, 6, 14).unwrap();
        assert!(validate_transaction(&txn, today()).is_err());
    }

    #[test]
    fn patch_sanitizes_only_present_fields() {
        let mut patch = TransactionPatch {
            notes: Some("<i>memo</i>".into()),
            ..TransactionPatch::default()
        };
        sanitize_patch(&mut patch);
        assert_eq!(patch.notes.as_deref(), Some("imemo/i"));
        assert!(patch.description.is_none());
    }
}
