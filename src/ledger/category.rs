use serde::{Deserialize, Serialize};

use super::transaction::TransactionKind;

/// Categorises transactions for reporting. Transactions reference categories by `id`
/// without referential checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(default)]
    pub color: String,
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: TransactionKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            icon: String::new(),
            kind,
            color: String::new(),
        }
    }

    pub fn with_style(mut self, icon: impl Into<String>, color: impl Into<String>) -> Self {
        self.icon = icon.into();
        self.color = color.into();
        self
    }
}

/// Built-in category table seeded into a fresh store.
pub fn default_categories() -> Vec<Category> {
    use TransactionKind::{Expense, Income};

    [
        ("salary", "Salary", "💼", Income, "#10b981"),
        ("freelance", "Freelance", "💻", Income, "#06b6d4"),
        ("investment", "Investments", "📈", Income, "#8b5cf6"),
        ("other-income", "Other Income", "💰", Income, "#84cc16"),
        ("food", "Food & Dining", "🍔", Expense, "#ef4444"),
        ("transport", "Transportation", "🚗", Expense, "#f97316"),
        ("shopping", "Shopping", "🛍️", Expense, "#ec4899"),
        ("entertainment", "Entertainment", "🎬", Expense, "#a855f7"),
        ("bills", "Bills & Utilities", "📄", Expense, "#eab308"),
        ("healthcare", "Healthcare", "🏥", Expense, "#14b8a6"),
        ("education", "Education", "📚", Expense, "#3b82f6"),
        ("other-expense", "Other Expenses", "📦", Expense, "#6b7280"),
    ]
    .into_iter()
    .map(|(id, name, icon, kind, color)| Category::new(id, name, kind).with_style(icon, color))
    .collect()
}
