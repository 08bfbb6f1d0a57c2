use thiserror::Error;

use crate::schema::SheetSchema;
use crate::store::{StoreError, Workbook};

#[derive(Debug, Error)]
pub enum UpsertError {
    #[error("record key is empty after normalization")]
    EmptyKey,
    #[error("sheet '{0}' has no key column")]
    NoKeyColumn(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created { row: usize },
    Updated { row: usize },
}

impl UpsertOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            UpsertOutcome::Created { .. } => "created",
            UpsertOutcome::Updated { .. } => "updated",
        }
    }

    pub fn row(&self) -> usize {
        match self {
            UpsertOutcome::Created { row } | UpsertOutcome::Updated { row } => *row,
        }
    }
}

// Keys are compared as text, never as numbers. "090402" submitted against a
// stored 090402 must match; 90402 must not grow or lose digits on the way in.
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_string()
}

// Scan the key column, first exact match wins, overwrite in place or append.
// The store has no key constraint, so this linear scan is the only uniqueness
// enforcement the sheet gets. Duplicate keys left behind by older corrupted
// writes resolve to the first occurrence; later duplicates are never touched.
pub fn upsert_record(
    book: &Workbook,
    schema: &SheetSchema,
    mut cells: Vec<String>,
) -> Result<UpsertOutcome, UpsertError> {
    let key_col = schema
        .key_column
        .ok_or_else(|| UpsertError::NoKeyColumn(schema.name.to_string()))?;

    let key = normalize_key(&cells[key_col]);
    if key.is_empty() {
        return Err(UpsertError::EmptyKey);
    }
    cells[key_col] = key.clone();

    let rows = book.load_all(schema)?;
    for (i, row) in rows.iter().enumerate() {
        if normalize_key(&row[key_col]) == key {
            // Data index 0 sits at grid row 2, below the header.
            let grid_row = i + 2;
            book.overwrite_row(schema, grid_row, &cells)?;
            return Ok(UpsertOutcome::Updated { row: grid_row });
        }
    }

    let grid_row = book.append_row(schema, &cells)?;
    Ok(UpsertOutcome::Created { row: grid_row })
}
