//! JSON and CSV interchange for transaction snapshots.
//!
//! Parsing only turns a payload into drafts; validation and deduplication
//! happen in [`TransactionStore::import`](crate::core::store::TransactionStore::import).

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use csv::{ReaderBuilder, StringRecord, Trim, Writer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{
    core::store::TransactionStore,
    errors::{Result, TrackerError},
    ledger::{Budget, Category, PaymentMethod, Transaction, TransactionDraft, TransactionKind},
};

pub const EXPORT_FORMAT_VERSION: &str = "1.0";

pub const CSV_HEADER: [&str; 7] = [
    "Date",
    "Description",
    "Type",
    "Category",
    "Amount",
    "Payment Method",
    "Notes",
];

/// Full snapshot written by [`export_json`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub budgets: Vec<Budget>,
}

impl ExportDocument {
    pub fn from_store(store: &TransactionStore) -> Self {
        Self {
            version: EXPORT_FORMAT_VERSION.to_string(),
            exported_at: store.clock().now(),
            transactions: store.transactions().to_vec(),
            categories: store.categories().to_vec(),
            budgets: store.budgets().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportMode {
    /// Keep existing records; skip incoming ids that already exist.
    #[default]
    Append,
    /// Like `Append`, also skipping exact description + amount + date matches.
    Merge,
    /// Discard existing transactions before importing.
    Replace,
}

/// A parsed row. `row` is 1-based within the payload's data rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRow {
    pub row: usize,
    pub draft: TransactionDraft,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub row: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedImport {
    pub rows: Vec<ImportRow>,
    pub errors: Vec<RowError>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub duplicates: usize,
    pub errors: Vec<RowError>,
}

/// Pretty-printed JSON of the store's full snapshot.
pub fn export_json(store: &TransactionStore) -> Result<String> {
    Ok(serde_json::to_string_pretty(&ExportDocument::from_store(store))?)
}

pub fn export_csv(transactions: &[Transaction]) -> Result<String> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER).map_err(csv_error)?;
    for txn in transactions {
        let date = txn.date.to_string();
        let amount = txn.amount.to_string();
        writer
            .write_record([
                date.as_str(),
                txn.description.as_str(),
                txn.kind.as_str(),
                txn.category.as_str(),
                amount.as_str(),
                txn.payment_method.as_str(),
                txn.notes.as_deref().unwrap_or_default(),
            ])
            .map_err(csv_error)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| TrackerError::Format(format!("CSV export failed: {err}")))?;
    String::from_utf8(bytes).map_err(|err| TrackerError::Format(format!("CSV export failed: {err}")))
}

/// Parses JSON (an export document or a bare array) and falls back to CSV.
pub fn parse_import(payload: &str) -> Result<ParsedImport> {
    if payload.trim().is_empty() {
        return Err(TrackerError::Format("import payload is empty".into()));
    }
    match serde_json::from_str::<Value>(payload) {
        Ok(value) => parse_json(value),
        Err(json_err) => {
            debug!(%json_err, "payload is not JSON; trying CSV");
            parse_csv(payload)
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonRow {
    #[serde(default)]
    id: Option<String>,
    description: String,
    amount: f64,
    #[serde(rename = "type")]
    kind: TransactionKind,
    category: String,
    date: NaiveDate,
    #[serde(default)]
    payment_method: Option<PaymentMethod>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl From<JsonRow> for TransactionDraft {
    fn from(row: JsonRow) -> Self {
        Self {
            id: row.id,
            description: row.description,
            amount: row.amount,
            kind: row.kind,
            category: row.category,
            date: row.date,
            payment_method: row.payment_method,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn parse_json(value: Value) -> Result<ParsedImport> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("transactions") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(TrackerError::Format(
                    "JSON document has no `transactions` array".into(),
                ))
            }
        },
        _ => {
            return Err(TrackerError::Format(
                "JSON payload must be an array or an export document".into(),
            ))
        }
    };

    let mut parsed = ParsedImport::default();
    for (index, item) in items.into_iter().enumerate() {
        let row = index + 1;
        match serde_json::from_value::<JsonRow>(item) {
            Ok(json) => parsed.rows.push(ImportRow {
                row,
                draft: json.into(),
            }),
            Err(err) => parsed.errors.push(RowError {
                row,
                message: err.to_string(),
            }),
        }
    }
    Ok(parsed)
}

/// Column positions, looked up by case-insensitive header name.
struct CsvColumns(HashMap<String, usize>);

impl CsvColumns {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let columns: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(index, name)| (name.trim().to_ascii_lowercase(), index))
            .collect();
        let missing: Vec<&str> = ["date", "description", "amount"]
            .into_iter()
            .filter(|name| !columns.contains_key(*name))
            .collect();
        if !missing.is_empty() {
            return Err(TrackerError::Format(format!(
                "payload is neither JSON nor CSV with the expected columns (missing {})",
                missing.join(", ")
            )));
        }
        Ok(Self(columns))
    }

    fn get<'r>(&self, record: &'r StringRecord, name: &str) -> Option<&'r str> {
        self.0
            .get(name)
            .and_then(|&index| record.get(index))
            .filter(|value| !value.is_empty())
    }
}

fn parse_csv(payload: &str) -> Result<ParsedImport> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(payload.as_bytes());
    let headers = reader
        .headers()
        .map_err(|err| TrackerError::Format(err.to_string()))?
        .clone();
    let columns = CsvColumns::from_headers(&headers)?;

    let mut parsed = ParsedImport::default();
    for (index, record) in reader.records().enumerate() {
        let row = index + 1;
        let outcome = record
            .map_err(|err| err.to_string())
            .and_then(|record| csv_draft(&columns, &record));
        match outcome {
            Ok(draft) => parsed.rows.push(ImportRow { row, draft }),
            Err(message) => parsed.errors.push(RowError { row, message }),
        }
    }
    Ok(parsed)
}

fn csv_draft(columns: &CsvColumns, record: &StringRecord) -> std::result::Result<TransactionDraft, String> {
    let date_raw = columns.get(record, "date").ok_or("missing date")?;
    let date = NaiveDate::parse_from_str(date_raw, "%Y-%m-%d")
        .map_err(|err| format!("invalid date `{date_raw}`: {err}"))?;
    let description = columns.get(record, "description").unwrap_or_default();
    let amount_raw = columns.get(record, "amount").ok_or("missing amount")?;
    let amount: f64 = amount_raw
        .parse()
        .map_err(|_| format!("invalid amount `{amount_raw}`"))?;
    let kind = match columns.get(record, "type") {
        Some(raw) => raw.parse::<TransactionKind>()?,
        None => TransactionKind::Expense,
    };
    let category = columns.get(record, "category").unwrap_or_default();

    let mut draft = TransactionDraft::new(description, amount, kind, category, date);
    if let Some(method) = columns.get(record, "payment method") {
        draft.payment_method = Some(method.parse::<PaymentMethod>()?);
    }
    draft.notes = columns.get(record, "notes").map(str::to_string);
    draft.id = columns.get(record, "id").map(str::to_string);
    Ok(draft)
}

fn csv_error(err: csv::Error) -> TrackerError {
    TrackerError::Format(format!("CSV export failed: {err}"))
}
