use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use crate::models::{Category, Transaction};

const HEADER: [&str; 8] = [
    "date",
    "kind",
    "amount",
    "currency",
    "category",
    "description",
    "notes",
    "recurring_id",
];

/// Write transactions as CSV in the order given. Returns the row count.
pub(crate) fn write_csv<W: Write>(
    writer: W,
    transactions: &[Transaction],
    categories: &[Category],
) -> Result<usize> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(HEADER)?;

    for txn in transactions {
        let category = txn
            .category_id
            .and_then(|id| Category::find_by_id(categories, id))
            .map(|c| c.name.as_str())
            .unwrap_or("");
        let recurring_id = txn.recurring_id.map(|id| id.to_string()).unwrap_or_default();
        wtr.write_record([
            txn.date.format("%Y-%m-%d").to_string().as_str(),
            txn.kind.as_str(),
            txn.amount.to_string().as_str(),
            txn.currency.as_str(),
            category,
            txn.description.as_str(),
            txn.notes.as_str(),
            recurring_id.as_str(),
        ])?;
    }

    wtr.flush()?;
    Ok(transactions.len())
}

pub(crate) fn export_to_file(
    path: &Path,
    transactions: &[Transaction],
    categories: &[Category],
) -> Result<usize> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create export file: {}", path.display()))?;
    write_csv(file, transactions, categories)
}
