use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::schema::SheetSchema;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("field '{0}' must be a scalar value")]
    NonScalar(String),
}

// Everything that reaches a sheet is text. Strings pass through verbatim so
// numeric-looking values ("0012345") keep their digits; JSON numbers and
// booleans are rendered to their literal token. Submitting income as a JSON
// number instead of text is what mangles long digit strings upstream, so the
// UI contract is text-first and this coercion is only a fallback.
pub fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

// Builds the full ordered cell list for a sheet from a submitted object.
// Missing fields become empty cells; unknown fields are ignored, the sheet
// width is what gets written.
pub fn cells_from_object(
    schema: &SheetSchema,
    record: &Map<String, Value>,
) -> Result<Vec<String>, RecordError> {
    let mut cells = Vec::with_capacity(schema.width());
    for column in schema.columns {
        match record.get(*column) {
            None => cells.push(String::new()),
            Some(v) => {
                cells.push(cell_text(v).ok_or_else(|| RecordError::NonScalar(column.to_string()))?)
            }
        }
    }
    Ok(cells)
}

// Positional zip of the compiled header onto one data row.
pub fn object_from_cells(schema: &SheetSchema, cells: &[String]) -> Value {
    let mut obj = Map::new();
    for (i, column) in schema.columns.iter().enumerate() {
        let cell = cells.get(i).map(|s| s.as_str()).unwrap_or("");
        obj.insert(column.to_string(), json!(cell));
    }
    Value::Object(obj)
}

pub fn objects_from_rows(schema: &SheetSchema, rows: &[Vec<String>]) -> Vec<Value> {
    rows.iter().map(|r| object_from_cells(schema, r)).collect()
}
