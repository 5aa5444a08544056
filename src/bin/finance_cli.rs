use std::{env, error::Error, fmt::Display, fs, process, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use finance_core::{
    config::ConfigManager,
    core::{
        services::{HealthService, ProjectionService, SummaryService, DEFAULT_COMPOUNDS_PER_YEAR},
        sort_transactions, TransactionFilter, TransactionSort, TransactionStore,
    },
    exchange::{self, ImportMode},
    init,
    ledger::{PaymentMethod, TransactionDraft, TransactionKind},
    storage::JsonFileStore,
    utils::time::SystemClock,
};

type CliResult<T> = Result<T, Box<dyn Error>>;

fn main() {
    init();

    if let Err(err) = run() {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

fn run() -> CliResult<()> {
    let mut args = env::args().skip(1);
    let command = args.next().unwrap_or_else(|| usage_exit());
    let rest: Vec<String> = args.collect();

    match command.as_str() {
        "loan" => {
            let schedule = ProjectionService::loan_amortization(
                required(&rest, 0, "principal")?,
                required(&rest, 1, "rate")?,
                required(&rest, 2, "years")?,
            )?;
            println!("{}", serde_json::to_string_pretty(&schedule)?);
            return Ok(());
        }
        "compound" => {
            let result = ProjectionService::compound_interest(
                required(&rest, 0, "principal")?,
                required(&rest, 1, "rate")?,
                required(&rest, 2, "years")?,
                optional(&rest, 3)?.unwrap_or(DEFAULT_COMPOUNDS_PER_YEAR),
            )?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            return Ok(());
        }
        "retire" => {
            let projection = ProjectionService::retirement_projection(
                required(&rest, 0, "current age")?,
                required(&rest, 1, "retirement age")?,
                required(&rest, 2, "current savings")?,
                required(&rest, 3, "monthly contribution")?,
                required(&rest, 4, "annual return")?,
            )?;
            println!("{}", serde_json::to_string_pretty(&projection)?);
            return Ok(());
        }
        _ => {}
    }

    let mut store = open_store()?;
    let today = store.today();

    match command.as_str() {
        "add" => {
            let date = match rest.get(4) {
                Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")?,
                None => today,
            };
            let mut draft = TransactionDraft::new(
                required::<String>(&rest, 0, "description")?,
                required(&rest, 1, "amount")?,
                required::<TransactionKind>(&rest, 2, "type")?,
                required::<String>(&rest, 3, "category")?,
                date,
            );
            draft.payment_method = optional::<PaymentMethod>(&rest, 5)?;
            let txn = store.add(draft)?;
            println!("Added {}", txn.id);
        }
        "list" => {
            let mut criteria = TransactionFilter::new();
            if let Some(category) = rest.first() {
                criteria = criteria.categories([category.as_str()]);
            }
            let mut found = store.filter(&criteria);
            sort_transactions(&mut found, TransactionSort::DateDesc);
            for txn in found {
                println!(
                    "{}  {}  {:>10.2}  {:<8} {:<14} {}",
                    txn.id,
                    txn.date,
                    txn.signed_amount(),
                    txn.kind.as_str(),
                    txn.category,
                    txn.description
                );
            }
        }
        "delete" => {
            let id = required::<String>(&rest, 0, "id")?;
            println!("Deleted {}", store.delete(&id)?);
        }
        "summary" => {
            let stats = SummaryService::statistics(store.transactions());
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        "health" => {
            let report = HealthService::score(store.transactions(), today);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        "trends" => {
            let months = optional(&rest, 0)?.unwrap_or(6);
            for trend in SummaryService::monthly_trends(store.transactions(), months, today) {
                println!(
                    "{}  income {:>10.2}  expense {:>10.2}  net {:>10.2}",
                    trend.label, trend.income, trend.expense, trend.net
                );
            }
        }
        "export" => match rest.first().map(String::as_str) {
            Some("csv") => print!("{}", exchange::export_csv(store.transactions())?),
            Some("json") | None => println!("{}", exchange::export_json(&store)?),
            Some(other) => return Err(format!("unknown export format `{other}`").into()),
        },
        "import" => {
            let path = required::<String>(&rest, 0, "file")?;
            let mode = match rest.get(1).map(String::as_str) {
                Some("--merge") => ImportMode::Merge,
                Some("--replace") => ImportMode::Replace,
                _ => ImportMode::Append,
            };
            let payload = fs::read_to_string(&path)?;
            let report = store.import(exchange::parse_import(&payload)?, mode)?;
            println!(
                "Imported {}, skipped {} duplicates, {} errors",
                report.imported,
                report.duplicates,
                report.errors.len()
            );
            for error in &report.errors {
                eprintln!("  row {}: {}", error.row, error.message);
            }
        }
        "backup" => match rest.first().map(String::as_str) {
            Some("list") => {
                for backup in store.list_backups()? {
                    println!(
                        "{}  {} transactions",
                        backup.timestamp.to_rfc3339(),
                        backup.transactions.len()
                    );
                }
            }
            Some("restore") => {
                let raw = required::<String>(&rest, 1, "timestamp")?;
                let timestamp = DateTime::parse_from_rfc3339(&raw)?.with_timezone(&Utc);
                store.restore_backup(timestamp)?;
                println!("Restored backup {raw}");
            }
            _ => {
                let backup = store.create_backup()?;
                println!("Backup created at {}", backup.timestamp.to_rfc3339());
            }
        },
        _ => usage_exit(),
    }

    Ok(())
}

fn open_store() -> CliResult<TransactionStore> {
    let manager = ConfigManager::new()?;
    let config = manager.load()?;
    let backend = JsonFileStore::new(manager.data_dir())?;
    let mut store = TransactionStore::open(backend, SystemClock)?;
    if store.config() != &config {
        store.update_config(config)?;
    }
    Ok(store)
}

fn required<T>(args: &[String], index: usize, name: &str) -> CliResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = args.get(index).ok_or_else(|| format!("missing <{name}>"))?;
    raw.parse::<T>()
        .map_err(|err| format!("invalid <{name}> `{raw}`: {err}").into())
}

fn optional<T>(args: &[String], index: usize) -> CliResult<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    args.get(index)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|err| format!("invalid argument `{raw}`: {err}").into())
        })
        .transpose()
}

fn usage_exit() -> ! {
    eprintln!(
        "Usage: finance_cli <command>\n\
         Commands:\n  \
         add <description> <amount> <income|expense> <category> [YYYY-MM-DD] [payment]\n  \
         list [category]\n  \
         delete <id>\n  \
         summary | health | trends [months]\n  \
         export [json|csv]\n  \
         import <file> [--merge|--replace]\n  \
         backup [list | restore <timestamp>]\n  \
         loan <principal> <rate%> <years>\n  \
         compound <principal> <rate%> <years> [compounds/year]\n  \
         retire <age> <retirement age> <savings> <monthly> <return%>"
    );
    process::exit(1);
}
